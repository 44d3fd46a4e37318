// src/services/auth.rs

use jsonwebtoken::{decode, DecodingKey, Validation};

use crate::{
    common::error::AppError,
    models::auth::{Claims, User},
    services::user_service::UserService,
};

/// Bearer token validation. Tokens are issued elsewhere; this service only
/// checks them and loads the user they name.
#[derive(Clone)]
pub struct AuthService {
    user_service: UserService,
    jwt_secret: String,
}

impl AuthService {
    pub fn new(user_service: UserService, jwt_secret: String) -> Self {
        Self { user_service, jwt_secret }
    }

    pub async fn validate_token(&self, token: &str) -> Result<User, AppError> {
        let claims = decode_claims(token, &self.jwt_secret)?;
        self.user_service.find_active(claims.sub).await
    }
}

fn decode_claims(token: &str, secret: &str) -> Result<Claims, AppError> {
    decode::<Claims>(token, &DecodingKey::from_secret(secret.as_bytes()), &Validation::default())
        .map(|data| data.claims)
        .map_err(|e| {
            tracing::debug!("rejected bearer token: {e}");
            AppError::InvalidToken
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, Utc};
    use jsonwebtoken::{encode, EncodingKey, Header};

    fn token(sub: i64, expires_in: Duration, secret: &str) -> String {
        let now = Utc::now();
        let claims = Claims {
            sub,
            exp: (now + expires_in).timestamp() as usize,
            iat: now.timestamp() as usize,
        };
        encode(&Header::default(), &claims, &EncodingKey::from_secret(secret.as_bytes())).unwrap()
    }

    #[test]
    fn valid_token_yields_subject() {
        let claims = decode_claims(&token(7, Duration::hours(1), "s3cret"), "s3cret").unwrap();
        assert_eq!(claims.sub, 7);
    }

    #[test]
    fn wrong_secret_and_expired_tokens_are_rejected() {
        assert!(matches!(
            decode_claims(&token(7, Duration::hours(1), "other"), "s3cret"),
            Err(AppError::InvalidToken)
        ));
        assert!(matches!(
            decode_claims(&token(7, Duration::hours(-2), "s3cret"), "s3cret"),
            Err(AppError::InvalidToken)
        ));
        assert!(matches!(decode_claims("not-a-jwt", "s3cret"), Err(AppError::InvalidToken)));
    }
}
