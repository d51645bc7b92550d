use axum::extract::{Request, State};
use axum::http::StatusCode;
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use serde::Serialize;

use crate::auth::jwt::verify_token;
use crate::state::AppState;

#[derive(Serialize)]
struct ErrorBody { error: String, code: &'static str }

/// Verifies the bearer token and attaches the caller's [`Session`] to the
/// request.
///
/// [`Session`]: crate::auth::session::Session
pub async fn require_auth(State(state): State<AppState>, mut req: Request, next: Next) -> Response {
    let auth_header = match req.headers()
        .get(http::header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok()) {
        Some(h) => h,
        None => return unauthorized("Missing Authorization header"),
    };

    // Expect "Bearer <token>"
    let token = match auth_header.strip_prefix("Bearer ") {
        Some(t) => t.trim(),
        None => return unauthorized("Invalid Authorization format"),
    };

    let session = match verify_token(token, &state.config.jwt_secret) {
        Ok(s) => s,
        Err(e) => {
            tracing::debug!(error = %e, "Rejected bearer token");
            return unauthorized("Invalid or expired token");
        }
    };

    req.extensions_mut().insert(session);
    next.run(req).await
}

fn unauthorized(msg: &str) -> Response {
    let body = axum::Json(ErrorBody { error: msg.to_string(), code: "unauthorized" });
    (StatusCode::UNAUTHORIZED, body).into_response()
}
