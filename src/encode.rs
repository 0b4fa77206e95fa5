//! Request body serialization.

use http::{
    HeaderMap, HeaderValue,
    header::{CONTENT_LENGTH, CONTENT_TYPE},
};
use hyper::body::Bytes;

use crate::{Body, Error, Result};

const JSON: &str = "application/json";
const FORM: &str = "application/x-www-form-urlencoded";

/// Serialize `body` and set `Content-Length` (and, for structured bodies, a
/// default `Content-Type`). Returns `None` without touching `headers` when
/// there is no body.
///
/// A structured body with a form content type is URL-encoded and the
/// resulting string is then JSON-encoded, so it is sent as a quoted JSON
/// string.
pub(crate) fn encode(body: Option<&Body>, headers: &mut HeaderMap) -> Result<Option<Bytes>> {
    let Some(body) = body else {
        return Ok(None);
    };

    let bytes = match body {
        Body::Text(text) => Bytes::from(text.clone()),
        Body::Bytes(bytes) => bytes.clone(),
        Body::Json(value) => {
            let content_type = headers
                .entry(CONTENT_TYPE)
                .or_insert_with(|| HeaderValue::from_static(JSON));
            let encoded = if is_form(content_type) {
                let form = serde_urlencoded::to_string(value)
                    .map_err(|err| Error::Encode(err.to_string()))?;
                serde_json::to_vec(&form)
            } else {
                serde_json::to_vec(value)
            };
            Bytes::from(encoded.map_err(|err| Error::Encode(err.to_string()))?)
        }
    };

    headers.insert(CONTENT_LENGTH, HeaderValue::from(bytes.len()));
    Ok(Some(bytes))
}

fn is_form(content_type: &HeaderValue) -> bool {
    content_type
        .to_str()
        .ok()
        .and_then(|value| value.split(';').next())
        .is_some_and(|essence| essence.trim().eq_ignore_ascii_case(FORM))
}
