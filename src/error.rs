use http::StatusCode;
use std::fmt;
use thiserror::Error;

/// The HE.NET report endpoint an upstream failure came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpstreamService {
    Bgp,
    Whois,
}

impl fmt::Display for UpstreamService {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            UpstreamService::Bgp => write!(f, "HE.NET BGP"),
            UpstreamService::Whois => write!(f, "HE.NET WHOIS"),
        }
    }
}

/// Rejected client input. Always answered with HTTP 400.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("ASN parameter is required")]
    MissingAsn,

    #[error("Invalid ASN format. ASN must be numeric.")]
    InvalidAsn,

    #[error("Content-Type must be application/json")]
    UnsupportedContentType,

    #[error("Request body must be valid JSON")]
    InvalidJson,

    #[error("Request body must contain a \"prefixes\" array")]
    MissingPrefixes,

    #[error("\"prefixes\" must be an array of strings")]
    PrefixesNotArray,

    #[error("Prefixes array cannot be empty")]
    EmptyPrefixes,

    #[error("Maximum {max} prefixes allowed per request")]
    TooManyPrefixes { max: usize },

    #[error("Prefix at index {index} must be a string")]
    NonStringPrefix { index: usize },
}

/// Failure talking to one of the HE.NET endpoints.
#[derive(Error, Debug)]
pub enum UpstreamError {
    /// DNS, connection or body-read failure.
    #[error("Failed to fetch {service} data")]
    Transport {
        service: UpstreamService,
        #[source]
        source: reqwest::Error,
    },

    #[error("Failed to fetch {service} data: HTTP error! status: {status}")]
    Status { service: UpstreamService, status: u16 },

    /// The body was not the shape the adapters accept.
    #[error("Failed to decode {service} response: {reason}")]
    Decode {
        service: UpstreamService,
        reason: String,
    },
}

/// Everything a request handler can fail with.
#[derive(Error, Debug)]
pub enum ApiError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    Upstream(#[from] UpstreamError),

    #[error("API endpoint not found")]
    NotFound,

    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::Validation(_) => StatusCode::BAD_REQUEST,
            ApiError::NotFound => StatusCode::NOT_FOUND,
            ApiError::Upstream(_) | ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Message placed in the envelope's `error` field.
    pub fn client_message(&self) -> String {
        let message = self.to_string();
        if message.trim().is_empty() {
            "Internal server error".to_string()
        } else {
            message
        }
    }
}
