//! Redirect and status validation policy.

use http::{HeaderMap, Method, StatusCode, header::LOCATION};
use url::Url;

use crate::{Error, Response, Result, Validator};

/// Status codes that trigger a redirect when following is enabled.
pub const REDIRECT_CODES: [StatusCode; 5] = [
    StatusCode::MOVED_PERMANENTLY,
    StatusCode::FOUND,
    StatusCode::SEE_OTHER,
    StatusCode::TEMPORARY_REDIRECT,
    StatusCode::PERMANENT_REDIRECT,
];

/// Whether `status` is one of [`REDIRECT_CODES`].
pub fn is_redirect(status: StatusCode) -> bool {
    REDIRECT_CODES.contains(&status)
}

/// Validator used when none is configured: accepts `200..300`.
pub fn default_validator(status: StatusCode) -> bool {
    (200..300).contains(&status.as_u16())
}

/// What to do with a received response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Step {
    /// Issue another attempt.
    Redirect { location: String, method: Method },
    /// Validate; the call ends here.
    Finish,
}

/// Classify a response head, counting redirects against `follow`.
pub(crate) fn classify(
    follow: Option<u32>,
    redirects: &mut u32,
    method: &Method,
    status: StatusCode,
    headers: &HeaderMap,
) -> Result<Step> {
    let Some(max) = follow else {
        return Ok(Step::Finish);
    };
    if !is_redirect(status) {
        return Ok(Step::Finish);
    }

    *redirects += 1;
    if *redirects > max {
        return Err(Error::TooManyRedirects { max });
    }

    let method = if status == StatusCode::SEE_OTHER {
        Method::GET
    } else {
        method.clone()
    };
    let location = headers
        .get(LOCATION)
        .and_then(|value| value.to_str().ok())
        .unwrap_or_default()
        .to_owned();

    Ok(Step::Redirect { location, method })
}

/// URL for the next attempt.
///
/// Relative locations are resolved against `current`. An empty location stays
/// empty and fails to parse on the next attempt.
pub(crate) fn next_url(current: &Url, location: &str) -> String {
    if location.is_empty() || Url::parse(location).is_ok() {
        return location.to_owned();
    }
    current
        .join(location)
        .map_or_else(|_| location.to_owned(), String::from)
}

/// Whether `next` points at a different host than `current`.
///
/// A `next` that does not parse counts as the same host; the following attempt
/// fails on it anyway.
pub(crate) fn leaves_host(current: &Url, next: &str) -> bool {
    Url::parse(next).is_ok_and(|next| next.host_str() != current.host_str())
}

/// Accept or reject a terminal response.
pub(crate) fn validate(response: Response, validator: Option<&Validator>) -> Result<Response> {
    let status = response.status();
    let accepted = validator.map_or_else(|| default_validator(status), |validate| validate(status));
    if accepted {
        Ok(response)
    } else {
        Err(Error::Validation {
            status,
            response: Box::new(response),
        })
    }
}
