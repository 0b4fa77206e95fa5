use core::{future::IntoFuture, pin::Pin, time::Duration};
use std::{future::Future, sync::Arc};

use http::{HeaderMap, HeaderValue, Method, StatusCode, header::HeaderName};
use hyper::body::Bytes;
use serde::de::DeserializeOwned;

use crate::{
    Agent, Body, Data, Defaults, Format, RequestOptions, Response, Result, pipeline,
};

/// A client holding defaults applied to every call it issues.
///
/// The defaults can be changed between calls through [`Client::defaults_mut`];
/// each call reads them when it is awaited.
#[derive(Debug, Clone, Default)]
pub struct Client {
    defaults: Defaults,
}

impl Client {
    /// Create a client with the given defaults.
    #[must_use]
    pub const fn new(defaults: Defaults) -> Self {
        Self { defaults }
    }

    /// The current defaults.
    pub const fn defaults(&self) -> &Defaults {
        &self.defaults
    }

    /// Mutable access to the defaults.
    pub const fn defaults_mut(&mut self) -> &mut Defaults {
        &mut self.defaults
    }

    /// Start a call with the given method.
    pub fn method(&self, method: Method, url: impl Into<String>) -> RequestBuilder<'_> {
        RequestBuilder {
            client: self,
            url: url.into(),
            method,
            body: None,
            overrides: Defaults::default(),
        }
    }

    /// Start a `GET` call.
    pub fn get(&self, url: impl Into<String>) -> RequestBuilder<'_> {
        self.method(Method::GET, url)
    }

    /// Start a `POST` call.
    pub fn post(&self, url: impl Into<String>) -> RequestBuilder<'_> {
        self.method(Method::POST, url)
    }

    /// Start a `PUT` call.
    pub fn put(&self, url: impl Into<String>) -> RequestBuilder<'_> {
        self.method(Method::PUT, url)
    }

    /// Start a `PATCH` call.
    pub fn patch(&self, url: impl Into<String>) -> RequestBuilder<'_> {
        self.method(Method::PATCH, url)
    }

    /// Start a `DELETE` call.
    pub fn delete(&self, url: impl Into<String>) -> RequestBuilder<'_> {
        self.method(Method::DELETE, url)
    }

    /// Start a `HEAD` call.
    pub fn head(&self, url: impl Into<String>) -> RequestBuilder<'_> {
        self.method(Method::HEAD, url)
    }

    /// Issue a call with `overrides` shallow-merged over the defaults.
    ///
    /// # Errors
    ///
    /// See [`crate::Error`].
    pub async fn request(
        &self,
        method: Method,
        url: impl Into<String>,
        body: Option<Body>,
        overrides: Defaults,
    ) -> Result<Response> {
        let options =
            RequestOptions::from_defaults(url, method, body, self.defaults.merge(overrides));
        pipeline::request(options).await
    }
}

/// A call being configured; await it to send.
#[derive(Debug)]
pub struct RequestBuilder<'a> {
    client: &'a Client,
    url: String,
    method: Method,
    body: Option<Body>,
    overrides: Defaults,
}

impl<'a> IntoFuture for RequestBuilder<'a> {
    type Output = Result<Response>;

    type IntoFuture = Pin<Box<dyn Future<Output = Result<Response>> + Send + 'a>>;

    fn into_future(self) -> Self::IntoFuture {
        Box::pin(async move {
            self.client
                .request(self.method, self.url, self.body, self.overrides)
                .await
        })
    }
}

impl RequestBuilder<'_> {
    /// Insert a header into this call's header map.
    ///
    /// The first header set on a call starts from the client's default headers,
    /// so defaults are kept unless overwritten.
    #[must_use]
    pub fn header(mut self, name: HeaderName, value: HeaderValue) -> Self {
        let defaults = &self.client.defaults;
        self.overrides
            .headers
            .get_or_insert_with(|| defaults.headers.clone().unwrap_or_default())
            .insert(name, value);
        self
    }

    /// Replace the whole header map for this call.
    #[must_use]
    pub fn headers(mut self, headers: HeaderMap) -> Self {
        self.overrides.headers = Some(headers);
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

    /// Route this call through a proxy.
    #[must_use]
    pub fn proxy(mut self, proxy: impl Into<String>) -> Self {
        self.overrides.proxy = Some(proxy.into());
        self
    }

    /// Abort each attempt after `timeout`.
    #[must_use]
    pub const fn timeout(mut self, timeout: Duration) -> Self {
        self.overrides.timeout = Some(timeout);
        self
    }

    /// Follow up to `max` redirects.
    #[must_use]
    pub const fn follow(mut self, max: u32) -> Self {
        self.overrides.follow = Some(max);
        self
    }

    /// Decode the response body as `format`.
    #[must_use]
    pub const fn format(mut self, format: Format) -> Self {
        self.overrides.format = Some(format);
        self
    }

    /// Replace the status validator.
    #[must_use]
    pub fn validate(mut self, validate: impl Fn(StatusCode) -> bool + Send + Sync + 'static) -> Self {
        self.overrides.validate = Some(Arc::new(validate));
        self
    }

    /// Open connections through `agent`.
    #[must_use]
    pub fn agent(mut self, agent: Agent) -> Self {
        self.overrides.agent = Some(agent);
        self
    }

    /// The options this call would be issued with, given the current defaults.
    #[must_use]
    pub fn options(self) -> RequestOptions {
        RequestOptions::from_defaults(
            self.url,
            self.method,
            self.body,
            self.client.defaults.merge(self.overrides),
        )
    }

    /// Send the call, decode the body as text and return it.
    ///
    /// # Errors
    ///
    /// See [`crate::Error`].
    pub async fn text(self) -> Result<String> {
        let response = self.format(Format::Text).await?;
        match response.into_data() {
            Data::Text(text) => Ok(text),
            Data::Binary(bytes) => Ok(String::from_utf8_lossy(&bytes).into_owned()),
            Data::Json(value) => Ok(value.to_string()),
        }
    }

    /// Send the call and return the raw body bytes.
    ///
    /// # Errors
    ///
    /// See [`crate::Error`].
    pub async fn bytes(self) -> Result<Bytes> {
        let response = self.format(Format::Binary).await?;
        match response.into_data() {
            Data::Binary(bytes) => Ok(bytes),
            Data::Text(text) => Ok(Bytes::from(text)),
            Data::Json(value) => Ok(Bytes::from(value.to_string())),
        }
    }

    /// Send the call and deserialize the JSON body into `T`.
    ///
    /// # Errors
    ///
    /// See [`crate::Error`].
    pub async fn json_body<T: DeserializeOwned>(self) -> Result<T> {
        let response = self.format(Format::Json).await?;
        response.json()
    }
}
