use axum::extract::rejection::QueryRejection;
use axum::http::{Method, StatusCode, header};
use axum::response::{IntoResponse, Response};
use serde::Serialize;
use std::path::PathBuf;

use crate::middleware::insert_rate_limit_headers;
use crate::rate_limit::Rejection;
use crate::response::PrettyJson;

// Errors surfaced to API callers. Every variant is recovered at the
// HTTP boundary and rendered as `{ error, message }`.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    // page / perPage / id failed validation
    #[error("{message}")]
    InvalidArgument { title: &'static str, message: String },

    // id lookup or filtered random draw matched nothing
    #[error("{message}")]
    NotFound { title: &'static str, message: String },

    #[error("Invalid page number. Total number of pages: {total_pages}")]
    OutOfRange { page: usize, total_pages: usize },

    #[error("You have sent too many requests. Please wait for a while.")]
    RateLimited(Rejection),

    #[error("The '{0}' method is not supported for this endpoint")]
    MethodNotAllowed(Method),
}

impl ApiError {
    pub fn bad_request(message: impl Into<String>) -> Self {
        ApiError::InvalidArgument {
            title: "Bad Request",
            message: message.into(),
        }
    }

    pub fn invalid_id() -> Self {
        ApiError::InvalidArgument {
            title: "Invalid ID Format",
            message: "ID must be a number".to_string(),
        }
    }

    pub fn quote_not_found(id: i64) -> Self {
        ApiError::NotFound {
            title: "Quote Not Found",
            message: format!("No quote exists with ID: {}", id),
        }
    }

    pub fn no_match() -> Self {
        ApiError::NotFound {
            title: "No Quotes Found",
            message: "No quotes found matching the criteria".to_string(),
        }
    }

    pub fn route_not_found(path: &str) -> Self {
        ApiError::NotFound {
            title: "Not Found",
            message: format!("No endpoint exists at '{}'", path),
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::InvalidArgument { .. } | ApiError::OutOfRange { .. } => {
                StatusCode::BAD_REQUEST
            }
            ApiError::NotFound { .. } => StatusCode::NOT_FOUND,
            ApiError::RateLimited(_) => StatusCode::TOO_MANY_REQUESTS,
            ApiError::MethodNotAllowed(_) => StatusCode::METHOD_NOT_ALLOWED,
        }
    }

    pub fn title(&self) -> &'static str {
        match self {
            ApiError::InvalidArgument { title, .. } | ApiError::NotFound { title, .. } => *title,
            ApiError::OutOfRange { .. } => "Bad Request",
            ApiError::RateLimited(_) => "Rate Limit Exceeded",
            ApiError::MethodNotAllowed(_) => "Method Not Allowed",
        }
    }
}

// query strings axum could not decode
impl From<QueryRejection> for ApiError {
    fn from(rejection: QueryRejection) -> Self {
        ApiError::bad_request(rejection.body_text())
    }
}

#[derive(Serialize)]
struct ErrorBody {
    error: &'static str,
    message: String,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = ErrorBody {
            error: self.title(),
            message: self.to_string(),
        };
        let mut response = (self.status(), PrettyJson(body)).into_response();

        if let ApiError::RateLimited(rejection) = &self {
            let headers = response.headers_mut();
            insert_rate_limit_headers(headers, rejection.limit, 0, rejection.reset_at);
            headers.insert(header::RETRY_AFTER, rejection.retry_after_secs.into());
        }
        response
    }
}

// Failures while loading the quote collection at startup
#[derive(Debug, thiserror::Error)]
pub enum LoadError {
    #[error("failed to read quotes file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("malformed quotes data: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("duplicate quote id {0}")]
    DuplicateId(i64),
}

#[derive(Debug, thiserror::Error)]
pub enum StartupError {
    #[error(transparent)]
    Load(#[from] LoadError),

    #[error("failed to bind {addr}: {source}")]
    Bind {
        addr: String,
        #[source]
        source: std::io::Error,
    },

    #[error("server error: {0}")]
    Serve(#[source] std::io::Error),
}
