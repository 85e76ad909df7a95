//! JWT issuance and validation.
//!
//! Tokens are HS256-signed with the server secret. Two kinds exist:
//!
//! - **access**: presented as `Authorization: Bearer <token>` on API calls.
//! - **refresh**: exchanged at `/jwt/refresh/` for a new access token; never
//!   accepted as a bearer credential.
//!
//! Every token carries a random `jti` so two tokens minted in the same second
//! for the same user still differ.

use std::time::Duration;

use chrono::Utc;
use jsonwebtoken::{
    decode, encode, errors::ErrorKind, Algorithm, DecodingKey, EncodingKey, Header, Validation,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use yatube::UserId;
use yatube_api::TokenPair;

use crate::config::ServerConfig;

const JWT_ALGORITHM: Algorithm = Algorithm::HS256;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TokenType {
    Access,
    Refresh,
}

/// Claims carried by every token.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub token_type: TokenType,
    pub user_id: UserId,
    pub jti: String,
    /// Issued at (Unix timestamp).
    pub iat: i64,
    /// Expiration time (Unix timestamp).
    pub exp: i64,
}

#[derive(Debug, thiserror::Error)]
pub enum TokenError {
    #[error("token is expired")]
    Expired,

    #[error("token is invalid: {0}")]
    Invalid(String),

    #[error("token has wrong type: expected {expected:?}")]
    WrongType { expected: TokenType },

    #[error("failed to sign token: {0}")]
    Encode(String),
}

impl From<jsonwebtoken::errors::Error> for TokenError {
    fn from(e: jsonwebtoken::errors::Error) -> Self {
        match e.kind() {
            ErrorKind::ExpiredSignature => TokenError::Expired,
            _ => TokenError::Invalid(e.to_string()),
        }
    }
}

/// Signs and validates tokens with a shared secret.
pub struct TokenService {
    encoding: EncodingKey,
    decoding: DecodingKey,
    validation: Validation,
    access_ttl: Duration,
    refresh_ttl: Duration,
}

impl TokenService {
    pub fn new(secret: &str, access_ttl: Duration, refresh_ttl: Duration) -> Self {
        let mut validation = Validation::new(JWT_ALGORITHM);
        validation.leeway = 0;
        Self {
            encoding: EncodingKey::from_secret(secret.as_bytes()),
            decoding: DecodingKey::from_secret(secret.as_bytes()),
            validation,
            access_ttl,
            refresh_ttl,
        }
    }

    pub fn from_config(config: &ServerConfig) -> Self {
        Self::new(
            &config.jwt_secret,
            config.access_token_ttl,
            config.refresh_token_ttl,
        )
    }

    /// Mint a single token of the given type for `user_id`.
    pub fn issue(&self, user_id: UserId, token_type: TokenType) -> Result<String, TokenError> {
        let ttl = match token_type {
            TokenType::Access => self.access_ttl,
            TokenType::Refresh => self.refresh_ttl,
        };
        let now = Utc::now().timestamp();
        let claims = Claims {
            token_type,
            user_id,
            jti: Uuid::new_v4().simple().to_string(),
            iat: now,
            exp: now.saturating_add(i64::try_from(ttl.as_secs()).unwrap_or(i64::MAX)),
        };
        encode(&Header::new(JWT_ALGORITHM), &claims, &self.encoding)
            .map_err(|e| TokenError::Encode(e.to_string()))
    }

    /// Mint a refresh/access pair, as returned by `/jwt/create/`.
    pub fn issue_pair(&self, user_id: UserId) -> Result<TokenPair, TokenError> {
        Ok(TokenPair {
            refresh: self.issue(user_id, TokenType::Refresh)?,
            access: self.issue(user_id, TokenType::Access)?,
        })
    }

    /// Check signature and expiry of a token of either type.
    pub fn verify(&self, token: &str) -> Result<Claims, TokenError> {
        Ok(decode::<Claims>(token, &self.decoding, &self.validation)?.claims)
    }

    /// Validate a bearer credential. Refresh tokens are rejected.
    pub fn decode_access(&self, token: &str) -> Result<Claims, TokenError> {
        self.expect_type(token, TokenType::Access)
    }

    /// Validate a token presented at `/jwt/refresh/`. Access tokens are rejected.
    pub fn decode_refresh(&self, token: &str) -> Result<Claims, TokenError> {
        self.expect_type(token, TokenType::Refresh)
    }

    fn expect_type(&self, token: &str, expected: TokenType) -> Result<Claims, TokenError> {
        let claims = self.verify(token)?;
        if claims.token_type != expected {
            return Err(TokenError::WrongType { expected });
        }
        Ok(claims)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn service() -> TokenService {
        TokenService::new(
            "test-secret",
            Duration::from_secs(60),
            Duration::from_secs(600),
        )
    }

    #[test]
    fn pair_has_distinct_typed_tokens() {
        let svc = service();
        let pair = svc.issue_pair(UserId(7)).unwrap();
        assert_ne!(pair.access, pair.refresh);

        let access = svc.decode_access(&pair.access).unwrap();
        assert_eq!(access.user_id, UserId(7));
        assert_eq!(access.token_type, TokenType::Access);
        assert_eq!(access.exp - access.iat, 60);

        let refresh = svc.verify(&pair.refresh).unwrap();
        assert_eq!(refresh.token_type, TokenType::Refresh);
        assert_eq!(refresh.exp - refresh.iat, 600);
    }

    #[test]
    fn refresh_token_is_not_a_bearer_credential() {
        let svc = service();
        let pair = svc.issue_pair(UserId(1)).unwrap();
        assert!(matches!(
            svc.decode_access(&pair.refresh),
            Err(TokenError::WrongType { expected: TokenType::Access })
        ));
    }

    #[test]
    fn only_refresh_tokens_decode_as_refresh() {
        let svc = service();
        let pair = svc.issue_pair(UserId(3)).unwrap();
        assert_eq!(svc.decode_refresh(&pair.refresh).unwrap().user_id, UserId(3));
        assert!(matches!(
            svc.decode_refresh(&pair.access),
            Err(TokenError::WrongType { expected: TokenType::Refresh })
        ));
    }

    #[test]
    fn tokens_from_another_secret_are_invalid() {
        let other = TokenService::new("other", Duration::from_secs(60), Duration::from_secs(60));
        let token = other.issue(UserId(1), TokenType::Access).unwrap();
        assert!(matches!(service().verify(&token), Err(TokenError::Invalid(_))));
        assert!(matches!(service().verify("garbage"), Err(TokenError::Invalid(_))));
    }

    #[test]
    fn expired_token_is_rejected() {
        let svc = service();
        let now = Utc::now().timestamp();
        let claims = Claims {
            token_type: TokenType::Access,
            user_id: UserId(1),
            jti: "x".into(),
            iat: now - 120,
            exp: now - 60,
        };
        let token = encode(&Header::new(JWT_ALGORITHM), &claims, &svc.encoding).unwrap();
        assert!(matches!(svc.verify(&token), Err(TokenError::Expired)));
    }
}
