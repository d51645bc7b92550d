use chrono::{Utc, Duration};
use jsonwebtoken::{encode, decode, Header, Validation, EncodingKey, DecodingKey, Algorithm};
use serde::{Serialize, Deserialize};
use crate::auth::session::{Role, Session};
use crate::error::AppError;

pub const TOKEN_TTL_HOURS: i64 = 8;

#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String,
    pub name: String,
    pub email: String,
    pub role: Role,
    pub exp: usize,
    pub iat: usize,
}

impl From<Claims> for Session {
    fn from(claims: Claims) -> Self {
        Session { user_id: claims.sub, name: claims.name, email: claims.email, role: claims.role }
    }
}

pub fn sign_token(session: &Session, secret: &str) -> Result<String, AppError> {
    let now = Utc::now();
    let exp = now + Duration::hours(TOKEN_TTL_HOURS);
    let claims = Claims {
        sub: session.user_id.clone(),
        name: session.name.clone(),
        email: session.email.clone(),
        role: session.role,
        iat: now.timestamp() as usize,
        exp: exp.timestamp() as usize,
    };
    encode(&Header::new(Algorithm::HS256), &claims, &EncodingKey::from_secret(secret.as_bytes()))
        .map_err(|e| AppError::internal(format!("Token signing failed: {e}")))
}

pub fn verify_token(token: &str, secret: &str) -> Result<Session, AppError> {
    decode::<Claims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &Validation::new(Algorithm::HS256)
    )
    .map(|d| d.claims.into())
    .map_err(|e| AppError::validation(format!("Invalid or expired token: {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn token_round_trips_the_session() {
        let session = Session {
            user_id: "2".into(),
            name: "Dispatch Manager".into(),
            email: "dispatcher@bilty.com".into(),
            role: Role::Dispatcher,
        };
        let token = sign_token(&session, "test-secret").expect("sign");
        assert_eq!(verify_token(&token, "test-secret").ok(), Some(session));
        assert!(verify_token(&token, "other-secret").is_err());
    }
}
