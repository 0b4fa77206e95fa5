//! # Minimal asynchronous HTTP(S) client
//! Zenfetch issues a request, optionally through an HTTP/HTTPS proxy,
//! optionally follows redirects up to a budget, validates the status and
//! decodes the buffered body as text, bytes or JSON.
//!
//! - Proxy support with `Proxy-Authorization` from the proxy URL credentials
//! - Bounded redirect following (`303` switches to `GET`)
//! - Per-attempt timeout
//! - Pluggable connection agent
//! - Runtime agnostic: no executor is required
//!
//! # Quick start
//! ```rust,no_run
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! use zenfetch::{Format, RequestOptions, request};
//!
//! let response = request(
//!     RequestOptions::new("https://example.com/api")
//!         .follow(5)
//!         .format(Format::Json),
//! )
//! .await?;
//! println!("{:?}", response.json_value());
//! # Ok(())
//! # }
//! ```

pub mod backend;
mod client;
mod collect;
mod encode;
mod error;
mod options;
mod pipeline;
pub mod redirect;
mod resolve;
mod timeout;

pub use backend::{Agent, Connect, TcpConnector, Transport};
pub use client::{Client, RequestBuilder};
pub use collect::{Data, Response};
pub use error::{Error, ErrorKind};
pub use http::{HeaderMap, HeaderValue, Method, StatusCode, header};
pub use options::{Body, Defaults, Format, RequestOptions, Validator};
pub use pipeline::request;

/// Result type used throughout zenfetch.
pub type Result<T, E = Error> = core::result::Result<T, E>;

/// A client with no defaults.
#[must_use]
pub fn client() -> Client {
    Client::default()
}

/// Issue a `GET` and decode the body as text.
///
/// # Errors
///
/// See [`Error`].
pub async fn get(url: impl Into<String>) -> Result<Response> {
    request(RequestOptions::new(url)).await
}

/// Issue a `POST` with an optional body.
///
/// # Errors
///
/// See [`Error`].
pub async fn post(url: impl Into<String>, body: Option<Body>) -> Result<Response> {
    let mut options = RequestOptions::new(url).method(Method::POST);
    options.body = body;
    request(options).await
}

/// Issue a `PUT` with an optional body.
///
/// # Errors
///
/// See [`Error`].
pub async fn put(url: impl Into<String>, body: Option<Body>) -> Result<Response> {
    let mut options = RequestOptions::new(url).method(Method::PUT);
    options.body = body;
    request(options).await
}

/// Issue a `DELETE`.
///
/// # Errors
///
/// See [`Error`].
pub async fn delete(url: impl Into<String>) -> Result<Response> {
    request(RequestOptions::new(url).method(Method::DELETE)).await
}
