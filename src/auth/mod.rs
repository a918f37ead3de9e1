//! Authentication and authorization for ClassCafe
//!
//! Provides:
//! - JWT token generation and validation
//! - Password hashing with Argon2
//! - Request identity extraction and role checks

pub mod identity;
pub mod jwt;
pub mod password;

pub use identity::{authenticate, Identity};
pub use jwt::{extract_token_from_header, Claims, JwtValidator};
pub use password::{hash_password, verify_password};
