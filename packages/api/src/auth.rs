//! JWT endpoint bodies: `/jwt/create/`, `/jwt/refresh/`, `/jwt/verify/`.
//!
//! Request fields are `Option` so a missing key becomes a field-level
//! validation message rather than a JSON parse failure.

use serde::{Deserialize, Serialize};

/// `POST /jwt/create/`: exchange credentials for a token pair.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct TokenObtainRequest {
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub password: Option<String>,
}

/// Response of `POST /jwt/create/`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct TokenPair {
    pub refresh: String,
    pub access: String,
}

/// `POST /jwt/refresh/`: exchange a refresh token for a new access token.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct TokenRefreshRequest {
    #[serde(default)]
    pub refresh: Option<String>,
}

/// Response of `POST /jwt/refresh/`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct AccessToken {
    pub access: String,
}

/// `POST /jwt/verify/`: check that a token (of either type) is valid.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct TokenVerifyRequest {
    #[serde(default)]
    pub token: Option<String>,
}
