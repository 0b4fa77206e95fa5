//! Options describing a single call.

use core::{fmt, time::Duration};
use std::sync::Arc;

use http::{HeaderMap, HeaderValue, Method, StatusCode, header::HeaderName};
use hyper::body::Bytes;

use crate::backend::Agent;

/// Predicate deciding whether a response status counts as success.
pub type Validator = Arc<dyn Fn(StatusCode) -> bool + Send + Sync>;

/// How the response body is decoded.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum Format {
    /// UTF-8 text (invalid sequences are replaced).
    #[default]
    Text,
    /// Raw bytes, untouched.
    Binary,
    /// UTF-8 text parsed as JSON.
    Json,
}

/// Request body.
///
/// Text and bytes are sent as-is. A [`Body::Json`] value is serialized according
/// to the `Content-Type` header, which defaults to `application/json`.
#[derive(Debug, Clone, PartialEq)]
pub enum Body {
    /// Text sent verbatim.
    Text(String),
    /// Bytes sent verbatim.
    Bytes(Bytes),
    /// Structured value serialized before sending.
    Json(serde_json::Value),
}

impl From<String> for Body {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

impl From<&str> for Body {
    fn from(value: &str) -> Self {
        Self::Text(value.to_owned())
    }
}

impl From<Vec<u8>> for Body {
    fn from(value: Vec<u8>) -> Self {
        Self::Bytes(value.into())
    }
}

impl From<Bytes> for Body {
    fn from(value: Bytes) -> Self {
        Self::Bytes(value)
    }
}

impl From<serde_json::Value> for Body {
    fn from(value: serde_json::Value) -> Self {
        Self::Json(value)
    }
}

/// Everything needed to issue one call.
///
/// Defaults: `GET`, no headers, no proxy, no timeout, no redirects followed,
/// [`Format::Text`], the built-in TCP connector and the `2xx` validator.
#[derive(Clone)]
pub struct RequestOptions {
    /// Absolute target URL.
    pub url: String,
    /// HTTP method.
    pub method: Method,
    /// Request headers.
    pub headers: HeaderMap,
    /// Optional `http`/`https` proxy URL, possibly carrying credentials.
    pub proxy: Option<String>,
    /// Status predicate; `None` accepts `200..300`.
    pub validate: Option<Validator>,
    /// Per-attempt timeout.
    pub timeout: Option<Duration>,
    /// Redirect budget; `None` never follows redirects.
    pub follow: Option<u32>,
    /// How the response body is decoded.
    pub format: Format,
    /// Connection agent used to open connections.
    pub agent: Option<Agent>,
    /// Request body.
    pub body: Option<Body>,
}

impl RequestOptions {
    /// Options for a `GET` of `url` with every other field defaulted.
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            method: Method::GET,
            headers: HeaderMap::new(),
            proxy: None,
            validate: None,
            timeout: None,
            follow: None,
            format: Format::default(),
            agent: None,
            body: None,
        }
    }

    /// Build options from a target, a method and a set of partial options.
    pub fn from_defaults(
        url: impl Into<String>,
        method: Method,
        body: Option<Body>,
        defaults: Defaults,
    ) -> Self {
        Self {
            url: url.into(),
            method,
            headers: defaults.headers.unwrap_or_default(),
            proxy: defaults.proxy,
            validate: defaults.validate,
            timeout: defaults.timeout,
            follow: defaults.follow,
            format: defaults.format.unwrap_or_default(),
            agent: defaults.agent,
            body,
        }
    }

    /// Set the HTTP method.
    #[must_use]
    pub fn method(mut self, method: Method) -> Self {
        self.method = method;
        self
    }

    /// Insert a header, replacing any previous value.
    #[must_use]
    pub fn header(mut self, name: HeaderName, value: HeaderValue) -> Self {
        self.headers.insert(name, value);
        self
    }

    /// Route the call through a proxy.
    #[must_use]
    pub fn proxy(mut self, proxy: impl Into<String>) -> Self {
        self.proxy = Some(proxy.into());
        self
    }

    /// Replace the status validator.
    #[must_use]
    pub fn validate(mut self, validate: impl Fn(StatusCode) -> bool + Send + Sync + 'static) -> Self {
        self.validate = Some(Arc::new(validate));
        self
    }

    /// Abort each attempt after `timeout`.
    #[must_use]
    pub const fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Follow up to `max` redirects.
    #[must_use]
    pub const fn follow(mut self, max: u32) -> Self {
        self.follow = Some(max);
        self
    }

    /// Decode the response body as `format`.
    #[must_use]
    pub const fn format(mut self, format: Format) -> Self {
        self.format = format;
        self
    }

    /// Open connections through `agent`.
    #[must_use]
    pub fn agent(mut self, agent: Agent) -> Self {
        self.agent = Some(agent);
        self
    }

    /// Attach a body.
    #[must_use]
    pub fn body(mut self, body: impl Into<Body>) -> Self {
        self.body = Some(body.into());
        self
    }

    /// Attach a structured body.
    #[must_use]
    pub fn json(self, value: serde_json::Value) -> Self {
        self.body(Body::Json(value))
    }
}

impl fmt::Debug for RequestOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RequestOptions")
            .field("url", &self.url)
            .field("method", &self.method)
            .field("headers", &self.headers)
            .field("proxy", &self.proxy)
            .field("validate", &self.validate.is_some())
            .field("timeout", &self.timeout)
            .field("follow", &self.follow)
            .field("format", &self.format)
            .field("agent", &self.agent)
            .field("body", &self.body)
            .finish()
    }
}

/// Partial options shared by every call of a [`Client`](crate::Client).
///
/// Unset fields fall back to the [`RequestOptions`] defaults.
#[derive(Clone, Default)]
pub struct Defaults {
    /// Proxy URL.
    pub proxy: Option<String>,
    /// Header map; replaces, never merges with, lower-priority headers.
    pub headers: Option<HeaderMap>,
    /// Status predicate.
    pub validate: Option<Validator>,
    /// Per-attempt timeout.
    pub timeout: Option<Duration>,
    /// Redirect budget.
    pub follow: Option<u32>,
    /// Response format.
    pub format: Option<Format>,
    /// Connection agent.
    pub agent: Option<Agent>,
}

impl Defaults {
    /// Shallow-merge `overrides` on top of `self`; every field set in
    /// `overrides` wins.
    #[must_use]
    pub fn merge(&self, overrides: Self) -> Self {
        Self {
            proxy: overrides.proxy.or_else(|| self.proxy.clone()),
            headers: overrides.headers.or_else(|| self.headers.clone()),
            validate: overrides.validate.or_else(|| self.validate.clone()),
            timeout: overrides.timeout.or(self.timeout),
            follow: overrides.follow.or(self.follow),
            format: overrides.format.or(self.format),
            agent: overrides.agent.or_else(|| self.agent.clone()),
        }
    }
}

impl fmt::Debug for Defaults {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Defaults")
            .field("proxy", &self.proxy)
            .field("headers", &self.headers)
            .field("validate", &self.validate.is_some())
            .field("timeout", &self.timeout)
            .field("follow", &self.follow)
            .field("format", &self.format)
            .field("agent", &self.agent)
            .finish()
    }
}
