//! Request identity extraction
//!
//! Every protected route resolves the bearer token into an [`Identity`]
//! before touching the store; admin routes additionally require the admin
//! role.

use bson::oid::ObjectId;
use hyper::Request;

use crate::auth::jwt::{extract_token_from_header, JwtValidator};
use crate::db::schemas::UserRole;
use crate::types::CafeError;

/// Authenticated caller of the current request
#[derive(Debug, Clone)]
pub struct Identity {
    pub user_id: ObjectId,
    pub email: String,
    pub role: UserRole,
}

impl Identity {
    pub fn is_admin(&self) -> bool {
        self.role == UserRole::Admin
    }

    /// Reject non-admin callers
    pub fn require_admin(&self) -> Result<(), CafeError> {
        if self.is_admin() {
            Ok(())
        } else {
            Err(CafeError::Forbidden("Admin access required".into()))
        }
    }
}

/// Authenticate a request from its Authorization header
pub fn authenticate<B>(req: &Request<B>, jwt: &JwtValidator) -> Result<Identity, CafeError> {
    let header = req
        .headers()
        .get(hyper::header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok());

    let token = extract_token_from_header(header)
        .ok_or_else(|| CafeError::Unauthorized("No token provided".into()))?;

    let claims = jwt.validate_token(token)?;

    let user_id = ObjectId::parse_str(&claims.sub)
        .map_err(|_| CafeError::Unauthorized("Malformed subject in token".into()))?;

    Ok(Identity {
        user_id,
        email: claims.email,
        role: claims.role,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request_with_auth(value: Option<&str>) -> Request<()> {
        let mut builder = Request::builder().uri("/api/courses/my");
        if let Some(v) = value {
            builder = builder.header(hyper::header::AUTHORIZATION, v);
        }
        builder.body(()).unwrap()
    }

    #[test]
    fn test_authenticate_round_trip() {
        let jwt = JwtValidator::new_dev();
        let id = ObjectId::new();
        let (token, _) = jwt
            .generate_token(&id.to_hex(), "carol@kaist.ac.kr", UserRole::Student)
            .unwrap();

        let req = request_with_auth(Some(&format!("Bearer {}", token)));
        let identity = authenticate(&req, &jwt).unwrap();
        assert_eq!(identity.user_id, id);
        assert_eq!(identity.email, "carol@kaist.ac.kr");
        assert!(!identity.is_admin());
        assert!(identity.require_admin().is_err());
    }

    #[test]
    fn test_missing_header_rejected() {
        let jwt = JwtValidator::new_dev();
        let req = request_with_auth(None);
        assert!(matches!(
            authenticate(&req, &jwt),
            Err(CafeError::Unauthorized(_))
        ));
    }

    #[test]
    fn test_garbage_token_rejected() {
        let jwt = JwtValidator::new_dev();
        let req = request_with_auth(Some("Bearer not-a-jwt"));
        assert!(authenticate(&req, &jwt).is_err());
    }

    #[test]
    fn test_admin_guard() {
        let identity = Identity {
            user_id: ObjectId::new(),
            email: "ta@kaist.ac.kr".into(),
            role: UserRole::Admin,
        };
        assert!(identity.require_admin().is_ok());
    }
}
