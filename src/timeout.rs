//! Per-attempt deadline backed by the `async-io` timer.
//!
//! The attempt future is raced against a timer; when the timer wins the
//! attempt is dropped, which closes its connection, and the call fails with
//! [`Error::Timeout`].

use core::{future::Future, time::Duration};

use async_io::Timer;
use futures_util::{
    future::{self, Either},
    pin_mut,
};

use crate::{Error, Result};

pub(crate) async fn with_timeout<F, T>(duration: Option<Duration>, attempt: F) -> Result<T>
where
    F: Future<Output = Result<T>>,
{
    let Some(duration) = duration else {
        return attempt.await;
    };

    let timer = Timer::after(duration);
    pin_mut!(attempt);
    pin_mut!(timer);

    match future::select(attempt, timer).await {
        Either::Left((result, _)) => result,
        Either::Right(_) => Err(Error::Timeout { duration }),
    }
}
