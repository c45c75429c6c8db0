use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};

use super::repository::{UserId, UserRecord};

/// Issued tokens stay valid for seven days.
pub const TOKEN_VALIDITY_DAYS: i64 = 7;

/// Claims carried by an access token.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String,
    pub username: String,
    pub exp: usize,
}

impl Claims {
    pub fn user_id(&self) -> UserId {
        UserId(self.sub.clone())
    }
}

#[derive(Debug, thiserror::Error)]
pub enum TokenError {
    #[error("failed to sign token: {0}")]
    Sign(String),
    #[error("invalid or expired token")]
    Invalid,
}

/// Signs and verifies HS256 access tokens.
#[derive(Clone)]
pub struct TokenSigner {
    secret: String,
}

impl TokenSigner {
    pub fn new(secret: impl Into<String>) -> Self {
        Self {
            secret: secret.into(),
        }
    }

    pub fn issue(&self, user: &UserRecord) -> Result<String, TokenError> {
        let expires_at = Utc::now() + Duration::days(TOKEN_VALIDITY_DAYS);
        let claims = Claims {
            sub: user.id.0.clone(),
            username: user.username.clone(),
            exp: expires_at.timestamp() as usize,
        };
        encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(self.secret.as_bytes()),
        )
        .map_err(|err| TokenError::Sign(err.to_string()))
    }

    pub fn verify(&self, token: &str) -> Result<Claims, TokenError> {
        decode::<Claims>(
            token,
            &DecodingKey::from_secret(self.secret.as_bytes()),
            &Validation::default(),
        )
        .map(|data| data.claims)
        .map_err(|_| TokenError::Invalid)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_user() -> UserRecord {
        UserRecord {
            id: UserId("user-000001".to_string()),
            username: "renter".to_string(),
            password_hash: "unused".to_string(),
        }
    }

    #[test]
    fn issued_tokens_round_trip() {
        let signer = TokenSigner::new("secret");
        let token = signer.issue(&sample_user()).expect("token issues");
        let claims = signer.verify(&token).expect("token verifies");
        assert_eq!(claims.sub, "user-000001");
        assert_eq!(claims.username, "renter");
    }

    #[test]
    fn tokens_signed_with_another_secret_are_rejected() {
        let signer = TokenSigner::new("secret");
        let other = TokenSigner::new("different");
        let token = signer.issue(&sample_user()).expect("token issues");
        assert!(matches!(other.verify(&token), Err(TokenError::Invalid)));
    }

    #[test]
    fn garbage_tokens_are_rejected() {
        let signer = TokenSigner::new("secret");
        assert!(matches!(
            signer.verify("not-a-token"),
            Err(TokenError::Invalid)
        ));
    }
}
