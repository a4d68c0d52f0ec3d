//! Error responses for the HTTP surface.

use super::ServerSettings;
use crate::resolver::RejectionReason;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;
use thiserror::Error;

/// Everything a request can fail with
///
/// Every variant renders as a JSON body with `error` and `message` keys.
/// Filesystem paths never appear in a response.
#[derive(Debug, Error)]
pub enum ApiError {
    /// The resolver refused the technology or filename
    #[error("request rejected: {reason}")]
    Rejected {
        reason: RejectionReason,
        technology: String,
    },

    /// A path segment could not be decoded
    #[error("malformed path segment: {detail}")]
    MalformedSegment { detail: String },

    /// The path is valid but no payload exists there
    #[error("payload not found: {technology}/{filename}")]
    PayloadNotFound {
        technology: &'static str,
        filename: String,
    },

    /// No route matched
    #[error("route not found: {method} {uri}")]
    RouteNotFound { method: String, uri: String },

    #[error("rate limit exceeded")]
    RateLimited { message: &'static str },

    /// Reading a validated payload failed before headers were sent
    #[error("failed to read payload")]
    Stream,

    /// Anything else; `detail` is only shown outside production
    #[error("internal error: {detail}")]
    Internal { detail: String, expose: bool },
}

#[derive(Debug, Serialize)]
struct ErrorBody {
    error: &'static str,
    message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    reason: Option<&'static str>,
}

impl ApiError {
    pub fn internal(settings: &ServerSettings, detail: impl Into<String>) -> Self {
        Self::Internal {
            detail: detail.into(),
            expose: !settings.production,
        }
    }

    /// - Rejections and undecodable segments: 400 Bad Request
    /// - Missing payload or route: 404 Not Found
    /// - Rate limit: 429 Too Many Requests
    /// - Stream and internal failures: 500 Internal Server Error
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::Rejected { .. } | Self::MalformedSegment { .. } => StatusCode::BAD_REQUEST,
            Self::PayloadNotFound { .. } | Self::RouteNotFound { .. } => StatusCode::NOT_FOUND,
            Self::RateLimited { .. } => StatusCode::TOO_MANY_REQUESTS,
            Self::Stream | Self::Internal { .. } => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn body(&self) -> ErrorBody {
        let (error, message) = match self {
            Self::Rejected { reason, technology } => rejection_text(reason, technology),
            Self::MalformedSegment { .. } => (
                "Invalid path",
                "Path segments must be valid UTF-8.".to_string(),
            ),
            Self::PayloadNotFound {
                technology,
                filename,
            } => (
                "File not found",
                format!(
                    "Payload file \"{}\" does not exist in the {} directory.",
                    filename, technology
                ),
            ),
            Self::RouteNotFound { method, uri } => (
                "Not Found",
                format!("The route {} {} does not exist.", method, uri),
            ),
            Self::RateLimited { message } => ("Too Many Requests", message.to_string()),
            Self::Stream => (
                "Internal Server Error",
                "Internal error reading file.".to_string(),
            ),
            Self::Internal { detail, expose } => (
                "Internal Server Error",
                if *expose {
                    detail.clone()
                } else {
                    "Something went wrong.".to_string()
                },
            ),
        };

        let reason = match self {
            Self::Rejected { reason, .. } => Some(reason.as_str()),
            Self::MalformedSegment { .. } => Some("invalid_encoding"),
            _ => None,
        };

        ErrorBody {
            error,
            message,
            reason,
        }
    }
}

fn rejection_text(reason: &RejectionReason, technology: &str) -> (&'static str, String) {
    match reason {
        RejectionReason::UnknownTechnology => (
            "Invalid technology",
            format!(
                "Technology \"{}\" is not supported. Use a valid technology path.",
                technology
            ),
        ),
        RejectionReason::MissingFilename => (
            "Missing filename",
            "A filename must be provided in the path.".to_string(),
        ),
        RejectionReason::ForbiddenPattern { .. } => (
            "Invalid filename",
            "Filename contains forbidden characters.".to_string(),
        ),
        RejectionReason::HiddenFile => (
            "Invalid filename",
            "Access to hidden files is not allowed.".to_string(),
        ),
        RejectionReason::ExtensionMismatch => (
            "Invalid file extension",
            format!(
                "File extension does not match technology \"{}\".",
                technology
            ),
        ),
        RejectionReason::ContainmentFailure => (
            "Invalid path",
            "Could not resolve a safe file path.".to_string(),
        ),
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status_code(), Json(self.body())).into_response()
    }
}
