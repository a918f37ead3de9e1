//! HTTP routes for authentication
//!
//! - POST /auth/register - Create an account and get a JWT token
//! - POST /auth/login    - Authenticate and get a JWT token
//! - GET  /auth/me       - Current user's profile and coin balance

use bson::doc;
use hyper::{Method, Request, Response, StatusCode};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{info, warn};

use crate::auth::{authenticate, hash_password, verify_password};
use crate::db::schemas::{UserDoc, UserRole, USER_COLLECTION};
use crate::routes::{
    cors_preflight, json_response, method_not_allowed, not_found, parse_json_body, respond,
    BoxBody, ErrorResponse,
};
use crate::server::AppState;
use crate::types::CafeError;

#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    pub email: String,
    pub username: String,
    pub password: String,
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthResponse {
    pub token: String,
    pub user_id: String,
    pub email: String,
    pub username: String,
    pub expires_at: u64,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MeResponse {
    pub user_id: String,
    pub email: String,
    pub username: String,
    pub role: UserRole,
    pub coins: i64,
}

/// POST /auth/register
async fn handle_register(
    req: Request<hyper::body::Incoming>,
    state: Arc<AppState>,
) -> Result<Response<BoxBody>, CafeError> {
    let body: RegisterRequest = parse_json_body(req).await?;

    if body.email.is_empty() || body.username.is_empty() || body.password.is_empty() {
        return Err(CafeError::BadRequest(
            "Missing required fields: email, username, password".into(),
        ));
    }
    if body.password.len() < 8 {
        return Err(CafeError::BadRequest(
            "Password must be at least 8 characters".into(),
        ));
    }

    let users = state.mongo.collection::<UserDoc>(USER_COLLECTION).await?;

    if users.find_one(doc! { "email": &body.email }).await?.is_some() {
        return Err(CafeError::Conflict(
            "An account with this email already exists".into(),
        ));
    }

    let password_hash = hash_password(&body.password)?;
    let user = UserDoc::new(body.email.clone(), body.username.clone(), password_hash);

    let user_id = match users.insert_one(user).await {
        Ok(id) => id,
        // Registration race on the unique email index
        Err(e) if e.is_duplicate_key() => {
            return Err(CafeError::Conflict(
                "An account with this email already exists".into(),
            ));
        }
        Err(e) => return Err(e),
    };

    info!(email = %body.email, "Registered new user");

    let (token, expires_at) =
        state
            .jwt
            .generate_token(&user_id.to_hex(), &body.email, UserRole::Student)?;

    Ok(json_response(
        StatusCode::CREATED,
        &AuthResponse {
            token,
            user_id: user_id.to_hex(),
            email: body.email,
            username: body.username,
            expires_at,
        },
    ))
}

/// POST /auth/login
async fn handle_login(
    req: Request<hyper::body::Incoming>,
    state: Arc<AppState>,
) -> Result<Response<BoxBody>, CafeError> {
    let body: LoginRequest = parse_json_body(req).await?;

    if body.email.is_empty() || body.password.is_empty() {
        return Err(CafeError::BadRequest(
            "Missing required fields: email, password".into(),
        ));
    }

    let users = state.mongo.collection::<UserDoc>(USER_COLLECTION).await?;

    // Generic error in both branches to prevent user enumeration
    let user = match users.find_one(doc! { "email": &body.email }).await? {
        Some(u) => u,
        None => {
            warn!(email = %body.email, "Login failed: user not found");
            return Err(CafeError::Unauthorized("Invalid credentials".into()));
        }
    };

    if !verify_password(&body.password, &user.password_hash)? {
        warn!(email = %body.email, "Login failed: bad password");
        return Err(CafeError::Unauthorized("Invalid credentials".into()));
    }

    let user_id = user
        ._id
        .ok_or_else(|| CafeError::Internal("User document missing id".into()))?;
    let (token, expires_at) = state
        .jwt
        .generate_token(&user_id.to_hex(), &user.email, user.role)?;

    info!(email = %user.email, "User logged in");

    Ok(json_response(
        StatusCode::OK,
        &AuthResponse {
            token,
            user_id: user_id.to_hex(),
            email: user.email,
            username: user.username,
            expires_at,
        },
    ))
}

/// GET /auth/me
async fn handle_me(
    req: Request<hyper::body::Incoming>,
    state: Arc<AppState>,
) -> Result<Response<BoxBody>, CafeError> {
    let identity = authenticate(&req, &state.jwt)?;

    let users = state.mongo.collection::<UserDoc>(USER_COLLECTION).await?;
    let user = users
        .find_one(doc! { "_id": identity.user_id })
        .await?
        .ok_or_else(|| CafeError::NotFound("User not found".into()))?;

    Ok(json_response(
        StatusCode::OK,
        &MeResponse {
            user_id: identity.user_id.to_hex(),
            email: user.email,
            username: user.username,
            role: user.role,
            coins: user.coins,
        },
    ))
}

/// Handle auth-related HTTP requests.
///
/// Returns Some(response) if the request was handled, None if not an
/// auth route.
pub async fn handle_auth_request(
    req: Request<hyper::body::Incoming>,
    state: Arc<AppState>,
) -> Option<Response<BoxBody>> {
    let path = req.uri().path();
    let method = req.method();

    if !path.starts_with("/auth") {
        return None;
    }

    if method == Method::OPTIONS {
        return Some(cors_preflight());
    }

    let path = path.split('?').next().unwrap_or(path).to_string();

    let response = match (method.clone(), path.as_str()) {
        (Method::POST, "/auth/register") => respond(handle_register(req, state).await),
        (Method::POST, "/auth/login") => respond(handle_login(req, state).await),
        (Method::GET, "/auth/me") => respond(handle_me(req, state).await),

        (_, "/auth/register") | (_, "/auth/login") | (_, "/auth/me") => method_not_allowed(),

        _ => not_found(&path),
    };

    Some(response)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_register_request_parses() {
        let json = r#"{"email":"a@example.edu","username":"ada","password":"hunter22"}"#;
        let req: RegisterRequest = serde_json::from_str(json).unwrap();
        assert_eq!(req.username, "ada");
    }

    #[test]
    fn test_error_response_shape() {
        let resp = ErrorResponse {
            error: "Invalid credentials".into(),
            code: Some("UNAUTHORIZED".into()),
        };
        let json = serde_json::to_string(&resp).unwrap();
        assert!(json.contains("UNAUTHORIZED"));
    }
}
