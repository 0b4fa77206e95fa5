//! Transports.
//!
//! A call is carried by one of two transports picked from the URL scheme:
//! [`Transport::Plain`] for `http` and [`Transport::Secure`] for `https`.
//! Both open their connection through a [`Connect`] agent and speak HTTP/1.1
//! over it with hyper.

mod io;
mod tls;

use core::{fmt::Debug, future::Future, pin::Pin};
use std::sync::Arc;

use futures_io::{AsyncRead, AsyncWrite};
use futures_util::{
    future::{self, Either},
    pin_mut,
};
use http_body_util::Full;
use hyper::body::Bytes;
use tracing::trace;

use crate::{Error, Result, collect, resolve::Endpoint};

use self::io::HyperIo;

/// A bidirectional byte stream usable as an HTTP connection.
pub trait Io: AsyncRead + AsyncWrite + Send + Unpin {}

impl<T: AsyncRead + AsyncWrite + Send + Unpin> Io for T {}

/// Boxed connection returned by a [`Connect`] agent.
pub type Connection = Box<dyn Io>;

/// Boxed future returned by [`Connect::connect`].
pub type ConnectFuture<'a> = Pin<Box<dyn Future<Output = std::io::Result<Connection>> + Send + 'a>>;

/// Opens connections on behalf of the client.
///
/// Agents are owned by the caller and may be shared between calls; the client
/// only ever asks them for a connection.
pub trait Connect: Debug + Send + Sync {
    /// Open a connection to `host:port`.
    fn connect<'a>(&'a self, host: &'a str, port: u16) -> ConnectFuture<'a>;
}

/// Shared connection agent.
pub type Agent = Arc<dyn Connect>;

/// Agent opening plain TCP connections.
#[derive(Debug, Clone, Copy, Default)]
pub struct TcpConnector;

impl Connect for TcpConnector {
    fn connect<'a>(&'a self, host: &'a str, port: u16) -> ConnectFuture<'a> {
        Box::pin(async move {
            let stream = async_net::TcpStream::connect((host, port)).await?;
            Ok(Box::new(stream) as Connection)
        })
    }
}

/// The transport carrying an attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Transport {
    /// Cleartext HTTP.
    Plain,
    /// HTTP over TLS.
    Secure,
}

impl Transport {
    /// Pick the transport for a URL scheme.
    ///
    /// # Errors
    ///
    /// Returns [`Error::UnsupportedScheme`] for anything but `http` and `https`.
    pub fn for_scheme(scheme: &str) -> Result<Self> {
        match scheme {
            "http" => Ok(Self::Plain),
            "https" => Ok(Self::Secure),
            other => Err(Error::UnsupportedScheme(other.to_owned())),
        }
    }

    /// Connect to `endpoint`, send `request` and buffer the whole response.
    pub(crate) async fn send(
        self,
        endpoint: &Endpoint,
        agent: Option<&Agent>,
        request: http::Request<Full<Bytes>>,
    ) -> Result<http::Response<Bytes>> {
        trace!(host = %endpoint.host, port = endpoint.port, transport = ?self, "connecting");
        let connection = match agent {
            Some(agent) => agent.connect(&endpoint.host, endpoint.port).await,
            None => TcpConnector.connect(&endpoint.host, endpoint.port).await,
        }
        .map_err(Error::transport)?;

        match self {
            Self::Plain => exchange(connection, request).await,
            Self::Secure => {
                let stream = tls::handshake(connection, &endpoint.host).await?;
                exchange(stream, request).await
            }
        }
    }
}

/// Run one HTTP/1.1 exchange over `io`.
///
/// The connection task is polled alongside the exchange so no executor is
/// needed; it is dropped once the response body has been buffered.
async fn exchange<T: Io + 'static>(
    io: T,
    request: http::Request<Full<Bytes>>,
) -> Result<http::Response<Bytes>> {
    let (mut sender, connection) = hyper::client::conn::http1::handshake(HyperIo::new(io))
        .await
        .map_err(Error::transport)?;

    let exchange = async move {
        let response = sender.send_request(request).await.map_err(Error::transport)?;
        collect::buffer(response).await
    };

    pin_mut!(connection);
    pin_mut!(exchange);

    match future::select(connection, exchange).await {
        Either::Left((Ok(()), exchange)) => exchange.await,
        Either::Left((Err(err), _)) => Err(Error::transport(err)),
        Either::Right((result, _)) => result,
    }
}
