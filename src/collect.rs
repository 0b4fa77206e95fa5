//! Response buffering and decoding.

use http::{HeaderMap, StatusCode, response::Parts};
use http_body_util::BodyExt;
use hyper::body::Bytes;
use serde::de::DeserializeOwned;

use crate::{Error, Format, Result};

/// Decoded response body.
#[derive(Debug, Clone, PartialEq)]
pub enum Data {
    /// Body decoded as UTF-8 text.
    Text(String),
    /// Raw body bytes.
    Binary(Bytes),
    /// Body parsed as JSON.
    Json(serde_json::Value),
}

/// A completed response.
#[derive(Debug)]
pub struct Response {
    status: StatusCode,
    status_text: Option<String>,
    headers: HeaderMap,
    data: Data,
    raw: Parts,
}

impl Response {
    /// Status code.
    pub const fn status(&self) -> StatusCode {
        self.status
    }

    /// Reason phrase sent by the server, or the canonical one for the status.
    pub fn status_text(&self) -> Option<&str> {
        self.status_text.as_deref()
    }

    /// Response headers.
    pub const fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    /// Decoded body.
    pub const fn data(&self) -> &Data {
        &self.data
    }

    /// Consume the response and return the decoded body.
    pub fn into_data(self) -> Data {
        self.data
    }

    /// Underlying response head as received (version, extensions, ...).
    pub const fn raw(&self) -> &Parts {
        &self.raw
    }

    /// Body text, when decoded as [`Format::Text`].
    pub fn text(&self) -> Option<&str> {
        match &self.data {
            Data::Text(text) => Some(text),
            _ => None,
        }
    }

    /// Body bytes, when decoded as [`Format::Binary`].
    pub const fn bytes(&self) -> Option<&Bytes> {
        match &self.data {
            Data::Binary(bytes) => Some(bytes),
            _ => None,
        }
    }

    /// Body value, when decoded as [`Format::Json`].
    pub const fn json_value(&self) -> Option<&serde_json::Value> {
        match &self.data {
            Data::Json(value) => Some(value),
            _ => None,
        }
    }

    /// Deserialize the body into `T`, whatever format it was decoded as.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Parse`] if the body does not match `T`.
    pub fn json<T: DeserializeOwned>(&self) -> Result<T> {
        let value = match &self.data {
            Data::Json(value) => T::deserialize(value)?,
            Data::Text(text) => serde_json::from_str(text)?,
            Data::Binary(bytes) => serde_json::from_slice(bytes)?,
        };
        Ok(value)
    }
}

/// Read every body chunk into one buffer.
pub(crate) async fn buffer<B>(response: http::Response<B>) -> Result<http::Response<Bytes>>
where
    B: hyper::body::Body<Data = Bytes> + Unpin,
    B::Error: Into<Box<dyn std::error::Error + Send + Sync>>,
{
    let (parts, mut body) = response.into_parts();
    let mut buffer = Vec::new();
    while let Some(frame) = body.frame().await {
        let frame = frame.map_err(Error::transport)?;
        if let Ok(chunk) = frame.into_data() {
            buffer.extend_from_slice(&chunk);
        }
    }
    Ok(http::Response::from_parts(parts, Bytes::from(buffer)))
}

/// Decode a buffered response into a [`Response`].
pub(crate) fn decode(response: http::Response<Bytes>, format: Format) -> Result<Response> {
    let (parts, body) = response.into_parts();
    let data = match format {
        Format::Binary => Data::Binary(body),
        Format::Json => Data::Json(serde_json::from_str(&String::from_utf8_lossy(&body))?),
        Format::Text => Data::Text(String::from_utf8_lossy(&body).into_owned()),
    };

    let status_text = parts
        .extensions
        .get::<hyper::ext::ReasonPhrase>()
        .and_then(|reason| core::str::from_utf8(reason.as_bytes()).ok())
        .or_else(|| parts.status.canonical_reason())
        .map(str::to_owned);

    Ok(Response {
        status: parts.status,
        status_text,
        headers: parts.headers.clone(),
        data,
        raw: parts,
    })
}

#[cfg(test)]
pub(crate) fn response(status: StatusCode, data: Data) -> Response {
    let (raw, ()) = http::Response::builder()
        .status(status)
        .body(())
        .unwrap()
        .into_parts();
    Response {
        status,
        status_text: status.canonical_reason().map(str::to_owned),
        headers: HeaderMap::new(),
        data,
        raw,
    }
}
