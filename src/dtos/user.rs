use serde::{Deserialize, Serialize};

use crate::auth::session::{Module, Session};

#[derive(Deserialize)]
pub struct LoginRequest {
    pub email: String,
    #[serde(default)]
    pub password: String,
}

#[derive(Serialize)]
pub struct LoginResponse {
    pub access_token: String,
    pub token_type: &'static str,
    pub expires_in_seconds: usize,
    pub user: Session,
}

/// The signed-in user and the modules their role opens.
#[derive(Serialize)]
pub struct MeResponse {
    #[serde(flatten)]
    pub user: Session,
    pub modules: Vec<Module>,
}
