use axum::{
    extract::Request,
    http::{header::CONTENT_TYPE, Method},
    middleware::Next,
    response::Response,
};

use crate::error::AppError;

fn carries_body(method: &Method) -> bool {
    matches!(*method, Method::POST | Method::PUT | Method::PATCH)
}

/// Reject POST/PUT/PATCH requests that are not declared as JSON.
pub async fn require_json(request: Request, next: Next) -> Result<Response, AppError> {
    if carries_body(request.method()) {
        let is_json = request
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .is_some_and(|ct| ct.contains("application/json"));

        if !is_json {
            tracing::debug!(method = %request.method(), uri = %request.uri(), "Rejected non-JSON body");
            return Err(AppError::UnsupportedContentType);
        }
    }

    Ok(next.run(request).await)
}
