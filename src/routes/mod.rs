//! HTTP routes for ClassCafe
//!
//! Each area module exposes a `handle_*_request` dispatcher that returns
//! `Some(response)` when it owns the path, `None` otherwise. Shared
//! response plumbing lives here.

pub mod admin;
pub mod auth_routes;
pub mod avatar;
pub mod bulletin;
pub mod courses;
pub mod cron;
pub mod forum;
pub mod health;

pub use admin::handle_admin_request;
pub use auth_routes::handle_auth_request;
pub use avatar::handle_avatar_request;
pub use bulletin::handle_meme_request;
pub use courses::handle_course_request;
pub use cron::handle_cron_request;
pub use forum::handle_forum_request;
pub use health::health_check;

use bson::{doc, oid::ObjectId};
use bytes::Bytes;
use http_body_util::{BodyExt, Full, Limited};
use hyper::body::Body;
use hyper::{Request, Response, StatusCode};
use serde::{Deserialize, Serialize};

use crate::db::schemas::{CourseDoc, EnrollmentDoc, COURSE_COLLECTION, ENROLLMENT_COLLECTION};
use crate::server::AppState;
use crate::types::CafeError;

pub type BoxBody = http_body_util::combinators::BoxBody<Bytes, hyper::Error>;

/// Maximum accepted JSON body size
const MAX_BODY_BYTES: usize = 65536;

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct SuccessResponse {
    pub success: bool,
    pub message: String,
}

pub fn json_response<T: Serialize>(status: StatusCode, body: &T) -> Response<BoxBody> {
    let json = serde_json::to_string(body).unwrap_or_else(|_| "{}".to_string());

    Response::builder()
        .status(status)
        .header("Content-Type", "application/json")
        .header("Access-Control-Allow-Origin", "*")
        .header("Access-Control-Allow-Methods", "GET, POST, PUT, DELETE, OPTIONS")
        .header("Access-Control-Allow-Headers", "Content-Type, Authorization, X-Cron-Key")
        .body(full_body(json))
        .unwrap_or_else(|_| Response::new(empty_body()))
}

/// Map an error onto the wire: status from the taxonomy, stable code,
/// store detail never leaked past the log line
pub fn error_response(err: &CafeError) -> Response<BoxBody> {
    let message = match err {
        CafeError::Database(_) | CafeError::Internal(_) => "Internal error".to_string(),
        other => other.to_string(),
    };
    json_response(
        err.status_code(),
        &ErrorResponse {
            error: message,
            code: Some(err.code().to_string()),
        },
    )
}

pub fn cors_preflight() -> Response<BoxBody> {
    Response::builder()
        .status(StatusCode::NO_CONTENT)
        .header("Access-Control-Allow-Origin", "*")
        .header("Access-Control-Allow-Methods", "GET, POST, PUT, DELETE, OPTIONS")
        .header("Access-Control-Allow-Headers", "Content-Type, Authorization, X-Cron-Key")
        .header("Access-Control-Max-Age", "86400")
        .body(empty_body())
        .unwrap_or_else(|_| Response::new(empty_body()))
}

pub fn full_body(data: impl Into<Bytes>) -> BoxBody {
    Full::new(data.into())
        .map_err(|never| match never {})
        .boxed()
}

pub fn empty_body() -> BoxBody {
    Full::new(Bytes::new())
        .map_err(|never| match never {})
        .boxed()
}

/// Read a JSON request body. The size cap is enforced while reading, so
/// an oversized payload is rejected without buffering it whole.
pub async fn parse_json_body<T, B>(req: Request<B>) -> Result<T, CafeError>
where
    T: for<'de> Deserialize<'de>,
    B: Body,
    B::Error: Into<Box<dyn std::error::Error + Send + Sync>>,
{
    let bytes = Limited::new(req.into_body(), MAX_BODY_BYTES)
        .collect()
        .await
        .map_err(|e| CafeError::BadRequest(format!("Failed to read body: {}", e)))?
        .to_bytes();

    serde_json::from_slice(&bytes)
        .map_err(|e| CafeError::BadRequest(format!("Invalid JSON: {}", e)))
}

/// Parse a path segment as an ObjectId
pub fn parse_object_id(segment: &str) -> Result<ObjectId, CafeError> {
    ObjectId::parse_str(segment)
        .map_err(|_| CafeError::BadRequest(format!("Invalid id: {}", segment)))
}

/// Resolve a course by hex id or by course code
pub async fn resolve_course(state: &AppState, key: &str) -> Result<CourseDoc, CafeError> {
    let courses = state.mongo.collection::<CourseDoc>(COURSE_COLLECTION).await?;

    let filter = match ObjectId::parse_str(key) {
        Ok(id) => doc! { "_id": id },
        Err(_) => doc! { "course_code": key },
    };

    courses
        .find_one(filter)
        .await?
        .ok_or_else(|| CafeError::NotFound(format!("Course not found: {}", key)))
}

/// Membership predicate: the caller must be enrolled in the course
pub async fn require_enrollment(
    state: &AppState,
    user_id: ObjectId,
    course_id: ObjectId,
) -> Result<EnrollmentDoc, CafeError> {
    let enrollments = state
        .mongo
        .collection::<EnrollmentDoc>(ENROLLMENT_COLLECTION)
        .await?;

    enrollments
        .find_one(doc! { "user_id": user_id, "course_id": course_id })
        .await?
        .ok_or_else(|| CafeError::Forbidden("You are not enrolled in this course".into()))
}

/// Unwrap a handler result into a response, logging server-side failures
pub fn respond(result: Result<Response<BoxBody>, CafeError>) -> Response<BoxBody> {
    match result {
        Ok(response) => response,
        Err(e) => {
            if matches!(e, CafeError::Database(_) | CafeError::Internal(_)) {
                tracing::error!(error = %e, "Request failed");
            }
            error_response(&e)
        }
    }
}

pub fn method_not_allowed() -> Response<BoxBody> {
    json_response(
        StatusCode::METHOD_NOT_ALLOWED,
        &ErrorResponse {
            error: "Method not allowed".into(),
            code: None,
        },
    )
}

pub fn not_found(path: &str) -> Response<BoxBody> {
    json_response(
        StatusCode::NOT_FOUND,
        &ErrorResponse {
            error: format!("No such endpoint: {}", path),
            code: Some("NOT_FOUND".into()),
        },
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn json_request(body: String) -> Request<Full<Bytes>> {
        Request::builder()
            .header("Content-Type", "application/json")
            .body(Full::new(Bytes::from(body)))
            .unwrap()
    }

    #[test]
    fn test_parse_json_body_reads_payload() {
        let req = json_request(r#"{"content":"hello"}"#.to_string());
        let parsed: serde_json::Value = tokio_test::block_on(parse_json_body(req)).unwrap();
        assert_eq!(parsed["content"], "hello");
    }

    #[test]
    fn test_parse_json_body_rejects_oversized_payload() {
        let huge = format!(r#"{{"content":"{}"}}"#, "x".repeat(MAX_BODY_BYTES));
        let req = json_request(huge);
        let result: Result<serde_json::Value, _> = tokio_test::block_on(parse_json_body(req));
        match result {
            Err(CafeError::BadRequest(_)) => {}
            other => panic!("expected BadRequest, got {:?}", other.map(|_| ())),
        }
    }

    #[test]
    fn test_parse_json_body_rejects_invalid_json() {
        let req = json_request("not json".to_string());
        let result: Result<serde_json::Value, _> = tokio_test::block_on(parse_json_body(req));
        assert!(result.is_err());
    }
}
