//! Bearer credential validation.
//!
//! Token issuance lives in the external identity service; this module only
//! validates HS256 access tokens and exposes the claims handlers rely on.

use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use secrecy::{ExposeSecret, Secret};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::AppError;

/// Staff/student role attached to every access token.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Role {
    Admin,
    BranchAdmin,
    Staff,
    Student,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Admin => "ADMIN",
            Role::BranchAdmin => "BRANCH_ADMIN",
            Role::Staff => "STAFF",
            Role::Student => "STUDENT",
        }
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Claims carried by an access token.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthClaims {
    /// Subject (user ID).
    pub sub: String,
    /// Role the user holds.
    pub role: Role,
    /// Branch affiliation; None for Admin and students without one.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub branch_id: Option<String>,
    /// Expiration time (Unix timestamp).
    pub exp: i64,
    /// Issued at (Unix timestamp).
    pub iat: i64,
    /// JWT ID.
    pub jti: String,
}

/// Validates (and, for tests, mints) access tokens against the shared secret.
#[derive(Clone)]
pub struct JwtAuth {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
}

impl JwtAuth {
    pub fn new(secret: &Secret<String>) -> Self {
        let bytes = secret.expose_secret().as_bytes();
        Self {
            encoding_key: EncodingKey::from_secret(bytes),
            decoding_key: DecodingKey::from_secret(bytes),
        }
    }

    pub fn validate(&self, token: &str) -> Result<AuthClaims, AppError> {
        let data = decode::<AuthClaims>(
            token,
            &self.decoding_key,
            &Validation::new(Algorithm::HS256),
        )?;
        Ok(data.claims)
    }

    /// Mint a short-lived token. The identity service owns issuance in
    /// production; this exists for integration tests and local tooling.
    pub fn issue(
        &self,
        user_id: &str,
        role: Role,
        branch_id: Option<String>,
    ) -> Result<String, AppError> {
        let now = Utc::now();
        let claims = AuthClaims {
            sub: user_id.to_string(),
            role,
            branch_id,
            exp: (now + Duration::hours(1)).timestamp(),
            iat: now.timestamp(),
            jti: Uuid::new_v4().to_string(),
        };
        let token = encode(&Header::new(Algorithm::HS256), &claims, &self.encoding_key)?;
        Ok(token)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn issued_token_round_trips() {
        let auth = JwtAuth::new(&Secret::new("test-secret".to_string()));
        let token = auth
            .issue("user-1", Role::BranchAdmin, Some("branch-1".to_string()))
            .unwrap();

        let claims = auth.validate(&token).unwrap();
        assert_eq!(claims.sub, "user-1");
        assert_eq!(claims.role, Role::BranchAdmin);
        assert_eq!(claims.branch_id.as_deref(), Some("branch-1"));
    }

    #[test]
    fn wrong_secret_is_rejected() {
        let auth = JwtAuth::new(&Secret::new("test-secret".to_string()));
        let other = JwtAuth::new(&Secret::new("other-secret".to_string()));

        let token = auth.issue("user-1", Role::Staff, None).unwrap();
        assert!(other.validate(&token).is_err());
    }
}
