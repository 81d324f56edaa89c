use axum::http::{Method, StatusCode, Uri};
use crate::error::ApiError;

// known route, unsupported method
pub async fn method_not_allowed(method: Method) -> ApiError {
    ApiError::MethodNotAllowed(method)
}

pub async fn not_found(uri: Uri) -> ApiError {
    ApiError::route_not_found(uri.path())
}

// Plain OPTIONS requests; CORS preflights are answered by the cors layer
pub async fn preflight() -> StatusCode {
    StatusCode::OK
}
