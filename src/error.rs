//! Unified error type for zenfetch.
//!
//! Every failure of a call surfaces as one [`Error`] value returned from the
//! call's future. The variants separate:
//! - configuration problems detected before any I/O (unsupported scheme, bad URL)
//! - network transport and TLS failures
//! - the per-attempt timeout
//! - redirect budget exhaustion
//! - decoding failures of the response body
//! - validation failures, which carry the full [`Response`]

use core::time::Duration;
use std::error::Error as StdError;

use http::StatusCode;
use thiserror::Error;

use crate::Response;

/// Unified error type for all zenfetch operations.
#[derive(Debug, Error)]
pub enum Error {
    /// The URL (or proxy URL) uses a scheme other than `http` or `https`.
    #[error("unsupported scheme: {0}")]
    UnsupportedScheme(String),

    /// The URL could not be parsed into an absolute URI.
    #[error("invalid URL {url:?}: {reason}")]
    InvalidUrl {
        /// The offending URL as given.
        url: String,
        /// Why parsing failed.
        reason: String,
    },

    /// The outbound request could not be constructed.
    #[error("invalid request: {0}")]
    InvalidRequest(String),

    /// The request body could not be serialized.
    #[error("failed to encode request body: {0}")]
    Encode(String),

    /// Network transport layer error (connection failed, reset, DNS, ...).
    #[error("transport error: {0}")]
    Transport(#[source] Box<dyn StdError + Send + Sync>),

    /// TLS setup or handshake error.
    #[error("TLS error: {0}")]
    Tls(#[source] Box<dyn StdError + Send + Sync>),

    /// The attempt did not complete within the configured timeout.
    #[error("request timed out after {duration:?}")]
    Timeout {
        /// The configured timeout.
        duration: Duration,
    },

    /// More redirects were received than the configured budget allows.
    #[error("too many redirects (max {max})")]
    TooManyRedirects {
        /// The configured redirect budget.
        max: u32,
    },

    /// The response body could not be decoded as JSON.
    #[error("failed to parse response body: {0}")]
    Parse(#[from] serde_json::Error),

    /// The response was received but its status was rejected by the validator.
    #[error("response status {status} rejected by validator")]
    Validation {
        /// Status code of the rejected response.
        status: StatusCode,
        /// The fully decoded response.
        response: Box<Response>,
    },
}

impl Error {
    pub(crate) fn transport(error: impl Into<Box<dyn StdError + Send + Sync>>) -> Self {
        Self::Transport(error.into())
    }

    pub(crate) fn tls(error: impl Into<Box<dyn StdError + Send + Sync>>) -> Self {
        Self::Tls(error.into())
    }

    pub(crate) fn invalid_url(url: &str, reason: impl ToString) -> Self {
        Self::InvalidUrl {
            url: url.to_owned(),
            reason: reason.to_string(),
        }
    }

    /// Check if this is a network transport error.
    pub const fn is_network_error(&self) -> bool {
        matches!(self, Self::Transport(_) | Self::Tls(_))
    }

    /// Check if this is a timeout error.
    pub const fn is_timeout(&self) -> bool {
        matches!(self, Self::Timeout { .. })
    }

    /// Check if the redirect budget was exhausted.
    pub const fn is_redirect_error(&self) -> bool {
        matches!(self, Self::TooManyRedirects { .. })
    }

    /// Check if the URL or its scheme was rejected before any I/O.
    pub const fn is_request_error(&self) -> bool {
        matches!(
            self,
            Self::UnsupportedScheme(_)
                | Self::InvalidUrl { .. }
                | Self::InvalidRequest(_)
                | Self::Encode(_)
        )
    }

    /// Check if the response status was rejected by the validator.
    pub const fn is_validation_error(&self) -> bool {
        matches!(self, Self::Validation { .. })
    }

    /// Status code of the rejected response (validation errors only).
    pub const fn status(&self) -> Option<StatusCode> {
        match self {
            Self::Validation { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// The decoded response attached to a validation error.
    pub fn response(&self) -> Option<&Response> {
        match self {
            Self::Validation { response, .. } => Some(response),
            _ => None,
        }
    }

    /// Take the decoded response out of a validation error.
    ///
    /// # Errors
    ///
    /// Returns `self` unchanged for every other kind of error.
    pub fn into_response(self) -> Result<Response, Self> {
        match self {
            Self::Validation { response, .. } => Ok(*response),
            other => Err(other),
        }
    }

    /// Get the error category.
    pub const fn kind(&self) -> ErrorKind {
        match self {
            Self::UnsupportedScheme(_) => ErrorKind::UnsupportedScheme,
            Self::InvalidUrl { .. } | Self::InvalidRequest(_) | Self::Encode(_) => {
                ErrorKind::Request
            }
            Self::Transport(_) => ErrorKind::Transport,
            Self::Tls(_) => ErrorKind::Tls,
            Self::Timeout { .. } => ErrorKind::Timeout,
            Self::TooManyRedirects { .. } => ErrorKind::Redirect,
            Self::Parse(_) => ErrorKind::Parse,
            Self::Validation { .. } => ErrorKind::Validation,
        }
    }
}

/// Error category labels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// Unsupported URL scheme
    UnsupportedScheme,
    /// Request construction error
    Request,
    /// Transport/network error
    Transport,
    /// TLS error
    Tls,
    /// Timeout error
    Timeout,
    /// Redirect budget exhausted
    Redirect,
    /// Response body parsing error
    Parse,
    /// Status rejected by the validator
    Validation,
}

impl std::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::UnsupportedScheme => write!(f, "unsupported_scheme"),
            Self::Request => write!(f, "request"),
            Self::Transport => write!(f, "transport"),
            Self::Tls => write!(f, "tls"),
            Self::Timeout => write!(f, "timeout"),
            Self::Redirect => write!(f, "redirect"),
            Self::Parse => write!(f, "parse"),
            Self::Validation => write!(f, "validation"),
        }
    }
}
