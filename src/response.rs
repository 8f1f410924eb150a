use crate::error::ApiError;
use http::{
    header::{
        HeaderMap, HeaderValue, ACCESS_CONTROL_ALLOW_HEADERS, ACCESS_CONTROL_ALLOW_METHODS,
        ACCESS_CONTROL_ALLOW_ORIGIN, CONTENT_TYPE,
    },
    StatusCode,
};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Uniform body of every JSON response this service sends.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ApiEnvelope<T = Value> {
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl ApiEnvelope {
    pub fn success(data: Value, message: Option<String>) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
            message,
        }
    }

    pub fn failure(error: impl Into<String>) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(error.into()),
            message: None,
        }
    }
}

impl<T> ApiEnvelope<T> {
    /// Unwraps a decoded envelope into its payload.
    pub fn into_result(self) -> anyhow::Result<T> {
        if !self.success {
            let reason = self
                .error
                .filter(|e| !e.is_empty())
                .unwrap_or_else(|| "API request failed".to_string());
            anyhow::bail!(reason);
        }
        self.data
            .ok_or_else(|| anyhow::anyhow!("API response is missing `data`"))
    }
}

/// CORS headers attached to every response, preflight included.
pub fn cors_headers() -> HeaderMap {
    let mut headers = HeaderMap::new();
    headers.insert(ACCESS_CONTROL_ALLOW_ORIGIN, HeaderValue::from_static("*"));
    headers.insert(
        ACCESS_CONTROL_ALLOW_METHODS,
        HeaderValue::from_static("GET, POST, OPTIONS"),
    );
    headers.insert(
        ACCESS_CONTROL_ALLOW_HEADERS,
        HeaderValue::from_static("Content-Type, Authorization"),
    );
    headers
}

/// A finished response, independent of the Workers runtime types.
#[derive(Debug, Clone)]
pub struct ApiReply {
    pub status: StatusCode,
    pub headers: HeaderMap,
    /// `None` only for preflight responses
    pub body: Option<ApiEnvelope>,
}

impl ApiReply {
    pub fn preflight() -> Self {
        Self {
            status: StatusCode::OK,
            headers: cors_headers(),
            body: None,
        }
    }

    pub fn json(status: StatusCode, envelope: ApiEnvelope) -> Self {
        let mut headers = cors_headers();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        Self {
            status,
            headers,
            body: Some(envelope),
        }
    }

    pub fn success(data: Value, message: Option<String>) -> Self {
        Self::json(StatusCode::OK, ApiEnvelope::success(data, message))
    }

    pub fn error(status: StatusCode, message: impl Into<String>) -> Self {
        Self::json(status, ApiEnvelope::failure(message))
    }

    pub fn from_error(err: &ApiError) -> Self {
        Self::error(err.status(), err.client_message())
    }

    /// Serialized body text, or `None` for an empty body.
    pub fn body_text(&self) -> serde_json::Result<Option<String>> {
        self.body.as_ref().map(serde_json::to_string).transpose()
    }
}
