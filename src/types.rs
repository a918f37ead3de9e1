//! Error types for ClassCafe

use hyper::StatusCode;

/// Main error type for ClassCafe operations
#[derive(Debug, thiserror::Error)]
pub enum CafeError {
    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Forbidden: {0}")]
    Forbidden(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Insufficient funds: {0}")]
    InsufficientFunds(String),

    #[error("Database error: {0}")]
    Database(String),

    #[error("Internal error: {0}")]
    Internal(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Authentication error: {0}")]
    Auth(String),
}

impl CafeError {
    /// Convert error to HTTP status code
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            Self::Forbidden(_) => StatusCode::FORBIDDEN,
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::Conflict(_) => StatusCode::CONFLICT,
            Self::InsufficientFunds(_) => StatusCode::PAYMENT_REQUIRED,
            Self::Database(_) => StatusCode::SERVICE_UNAVAILABLE,
            Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::Config(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::Auth(_) => StatusCode::UNAUTHORIZED,
        }
    }

    /// Machine-readable code for API clients
    pub fn code(&self) -> &'static str {
        match self {
            Self::BadRequest(_) => "BAD_REQUEST",
            Self::Unauthorized(_) => "UNAUTHORIZED",
            Self::Forbidden(_) => "FORBIDDEN",
            Self::NotFound(_) => "NOT_FOUND",
            Self::Conflict(_) => "CONFLICT",
            Self::InsufficientFunds(_) => "INSUFFICIENT_FUNDS",
            Self::Database(_) => "DB_ERROR",
            Self::Internal(_) => "INTERNAL",
            Self::Config(_) => "CONFIG_ERROR",
            Self::Auth(_) => "AUTH_ERROR",
        }
    }

    /// True when a `Database` error came from a unique-index violation.
    ///
    /// The driver surfaces write errors as strings by the time they reach
    /// route code, so this matches the server's E11000 code in the message.
    pub fn is_duplicate_key(&self) -> bool {
        matches!(
            self,
            Self::Database(msg) if msg.contains("E11000") || msg.contains("duplicate key")
        )
    }
}

// Implement From conversions for common error types

impl From<std::io::Error> for CafeError {
    fn from(err: std::io::Error) -> Self {
        Self::Internal(err.to_string())
    }
}

impl From<serde_json::Error> for CafeError {
    fn from(err: serde_json::Error) -> Self {
        Self::BadRequest(format!("JSON error: {}", err))
    }
}

impl From<hyper::Error> for CafeError {
    fn from(err: hyper::Error) -> Self {
        Self::Internal(format!("HTTP error: {}", err))
    }
}

impl From<mongodb::error::Error> for CafeError {
    fn from(err: mongodb::error::Error) -> Self {
        Self::Database(err.to_string())
    }
}

impl From<jsonwebtoken::errors::Error> for CafeError {
    fn from(err: jsonwebtoken::errors::Error) -> Self {
        Self::Unauthorized(format!("JWT error: {}", err))
    }
}

impl From<bson::oid::Error> for CafeError {
    fn from(err: bson::oid::Error) -> Self {
        Self::BadRequest(format!("Invalid id: {}", err))
    }
}

/// Result type alias for ClassCafe operations
pub type Result<T> = std::result::Result<T, CafeError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_policy_errors_are_distinguishable() {
        let funds = CafeError::InsufficientFunds("need 5 coins".into());
        let gate = CafeError::Forbidden("not the top contributor".into());
        assert_eq!(funds.status_code(), StatusCode::PAYMENT_REQUIRED);
        assert_eq!(gate.status_code(), StatusCode::FORBIDDEN);
        assert_ne!(funds.code(), gate.code());
    }

    #[test]
    fn test_store_errors_do_not_leak_detail_code() {
        let err = CafeError::from(mongodb::error::Error::custom("socket reset".to_string()));
        assert_eq!(err.code(), "DB_ERROR");
        assert_eq!(err.status_code(), StatusCode::SERVICE_UNAVAILABLE);
    }

    #[test]
    fn test_duplicate_key_detection() {
        let dup = CafeError::Database(
            "E11000 duplicate key error collection: classcafe.users index: email_1".into(),
        );
        assert!(dup.is_duplicate_key());

        let other = CafeError::Database("server selection timeout".into());
        assert!(!other.is_duplicate_key());

        // Only Database errors qualify, whatever the message says
        let conflict = CafeError::Conflict("E11000".into());
        assert!(!conflict.is_duplicate_key());
    }
}
