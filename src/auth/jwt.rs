//! JWT token handling for ClassCafe sessions
//!
//! Security notes:
//! - Tokens are signed with HS256 (HMAC-SHA256)
//! - Default expiry is 7 days
//! - In production, JWT_SECRET should be a strong random value from environment

use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use std::time::{SystemTime, UNIX_EPOCH};

use crate::db::schemas::UserRole;
use crate::types::CafeError;

/// Payload stored in JWT token
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// User document id (hex ObjectId)
    pub sub: String,
    /// Login identifier
    pub email: String,
    /// Role granted at login
    pub role: UserRole,
    /// Issued at (Unix timestamp)
    pub iat: u64,
    /// Expiration time (Unix timestamp)
    pub exp: u64,
}

/// JWT validator and generator
#[derive(Clone)]
pub struct JwtValidator {
    secret: String,
    expiry_seconds: u64,
}

impl JwtValidator {
    /// Create a new JWT validator
    ///
    /// Returns an error if the secret is empty or too short
    pub fn new(secret: String, expiry_seconds: u64) -> Result<Self, CafeError> {
        if secret.is_empty() {
            return Err(CafeError::Config(
                "JWT_SECRET is required in production mode".into(),
            ));
        }

        if secret.len() < 32 {
            return Err(CafeError::Config(
                "JWT_SECRET must be at least 32 characters".into(),
            ));
        }

        Ok(Self {
            secret,
            expiry_seconds,
        })
    }

    /// Create a validator for dev mode (fixed insecure secret)
    pub fn new_dev() -> Self {
        Self {
            secret: "dev-mode-secret-not-for-production-use-123456".into(),
            expiry_seconds: 7 * 24 * 60 * 60,
        }
    }

    /// Generate a JWT token for an authenticated user
    pub fn generate_token(
        &self,
        user_id: &str,
        email: &str,
        role: UserRole,
    ) -> Result<(String, u64), CafeError> {
        let now = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map_err(|e| CafeError::Auth(format!("System time error: {}", e)))?
            .as_secs();

        let expires_at = now + self.expiry_seconds;
        let claims = Claims {
            sub: user_id.to_string(),
            email: email.to_string(),
            role,
            iat: now,
            exp: expires_at,
        };

        let token = encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(self.secret.as_bytes()),
        )
        .map_err(|e| CafeError::Auth(format!("Failed to generate token: {}", e)))?;

        Ok((token, expires_at))
    }

    /// Validate a token and return its claims
    pub fn validate_token(&self, token: &str) -> Result<Claims, CafeError> {
        let data = decode::<Claims>(
            token,
            &DecodingKey::from_secret(self.secret.as_bytes()),
            &Validation::default(),
        )
        .map_err(|e| CafeError::Unauthorized(format!("Invalid token: {}", e)))?;

        Ok(data.claims)
    }
}

/// Extract token from Authorization header.
/// Supports "Bearer <token>" format and raw tokens.
pub fn extract_token_from_header(auth_header: Option<&str>) -> Option<&str> {
    let header = auth_header?;

    // Support "Bearer <token>" format
    if let Some(token) = header.strip_prefix("Bearer ") {
        let token = token.trim();
        if !token.is_empty() {
            return Some(token);
        }
    }

    // Also support raw token (for flexibility)
    if !header.contains(' ') {
        let token = header.trim();
        if !token.is_empty() {
            return Some(token);
        }
    }

    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generate_and_validate() {
        let jwt = JwtValidator::new_dev();
        let (token, expires_at) = jwt
            .generate_token("64f0c2a5b1e8d90012345678", "alice@kaist.ac.kr", UserRole::Student)
            .unwrap();

        let claims = jwt.validate_token(&token).unwrap();
        assert_eq!(claims.sub, "64f0c2a5b1e8d90012345678");
        assert_eq!(claims.email, "alice@kaist.ac.kr");
        assert_eq!(claims.role, UserRole::Student);
        assert_eq!(claims.exp, expires_at);
        assert!(claims.exp > claims.iat);
    }

    #[test]
    fn test_wrong_secret_rejected() {
        let issuing = JwtValidator::new("a".repeat(32), 3600).unwrap();
        let verifying = JwtValidator::new("b".repeat(32), 3600).unwrap();

        let (token, _) = issuing
            .generate_token("64f0c2a5b1e8d90012345678", "bob@kaist.ac.kr", UserRole::Admin)
            .unwrap();

        assert!(verifying.validate_token(&token).is_err());
    }

    #[test]
    fn test_short_secret_rejected() {
        assert!(JwtValidator::new("short".into(), 3600).is_err());
        assert!(JwtValidator::new(String::new(), 3600).is_err());
    }

    #[test]
    fn test_extract_token_from_header() {
        // Bearer format
        assert_eq!(
            extract_token_from_header(Some("Bearer abc123")),
            Some("abc123")
        );

        // Raw token
        assert_eq!(extract_token_from_header(Some("abc123")), Some("abc123"));

        // Empty cases
        assert_eq!(extract_token_from_header(None), None);
        assert_eq!(extract_token_from_header(Some("")), None);
        assert_eq!(extract_token_from_header(Some("Bearer ")), None);

        // Invalid format
        assert_eq!(extract_token_from_header(Some("Basic abc123")), None);
    }
}
