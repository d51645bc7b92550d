use axum::{extract::State, Json};
use axum::extract::Extension;

use crate::auth::jwt::{sign_token, TOKEN_TTL_HOURS};
use crate::auth::session::{LoginOutcome, Module, Session};
use crate::dtos::user::{LoginRequest, LoginResponse, MeResponse};
use crate::error::AppError;
use crate::state::AppState;

pub async fn login_user(
    State(state): State<AppState>,
    Json(payload): Json<LoginRequest>
) -> Result<Json<LoginResponse>, AppError> {
    if payload.email.trim().is_empty() {
        return Err(AppError::validation("Email required"));
    }

    let session = match state.users.login(&payload.email, &payload.password)? {
        LoginOutcome::Success(session) => session,
        LoginOutcome::InvalidCredentials => {
            tracing::warn!(email = %payload.email.trim(), "Login rejected");
            return Err(AppError::validation("Invalid credentials"));
        }
    };

    let token = sign_token(&session, &state.config.jwt_secret)?;
    tracing::info!(user_id = %session.user_id, role = %session.role, "User logged in");

    Ok(Json(LoginResponse {
        access_token: token,
        token_type: "Bearer",
        expires_in_seconds: (TOKEN_TTL_HOURS * 60 * 60) as usize,
        user: session,
    }))
}

pub async fn get_me(Extension(session): Extension<Session>) -> Json<MeResponse> {
    let modules = Module::ALL.into_iter().filter(|m| session.can(*m)).collect();
    Json(MeResponse { user: session, modules })
}
