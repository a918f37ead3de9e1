//! Administrative HTTP routes
//!
//! - POST /admin/courses - Create a course
//! - POST /admin/items   - Create an avatar shop item
//!
//! All routes require an admin role on the bearer token.

use hyper::{Method, Request, Response, StatusCode};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::info;

use crate::auth::authenticate;
use crate::db::schemas::{AvatarItemDoc, CourseDoc, AVATAR_ITEM_COLLECTION, COURSE_COLLECTION};
use crate::routes::{
    cors_preflight, json_response, method_not_allowed, not_found, parse_json_body, respond,
    BoxBody,
};
use crate::server::AppState;
use crate::types::CafeError;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateCourseRequest {
    pub course_code: String,
    pub title: String,
    pub semester: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateItemRequest {
    pub name: String,
    pub category: String,
    pub price: i64,
    pub image_url: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreatedResponse {
    pub id: String,
}

/// POST /admin/courses
async fn handle_create_course(
    req: Request<hyper::body::Incoming>,
    state: Arc<AppState>,
) -> Result<Response<BoxBody>, CafeError> {
    let identity = authenticate(&req, &state.jwt)?;
    identity.require_admin()?;

    let body: CreateCourseRequest = parse_json_body(req).await?;
    if body.course_code.trim().is_empty() || body.title.trim().is_empty() {
        return Err(CafeError::BadRequest(
            "Missing required fields: courseCode, title".into(),
        ));
    }

    let courses = state.mongo.collection::<CourseDoc>(COURSE_COLLECTION).await?;
    let course = CourseDoc::new(body.course_code.clone(), body.title, body.semester);

    let id = match courses.insert_one(course).await {
        Ok(id) => id,
        Err(e) if e.is_duplicate_key() => {
            return Err(CafeError::Conflict(format!(
                "Course code already exists: {}",
                body.course_code
            )));
        }
        Err(e) => return Err(e),
    };

    info!(course = %body.course_code, "Course created");
    Ok(json_response(
        StatusCode::CREATED,
        &CreatedResponse { id: id.to_hex() },
    ))
}

/// POST /admin/items
async fn handle_create_item(
    req: Request<hyper::body::Incoming>,
    state: Arc<AppState>,
) -> Result<Response<BoxBody>, CafeError> {
    let identity = authenticate(&req, &state.jwt)?;
    identity.require_admin()?;

    let body: CreateItemRequest = parse_json_body(req).await?;
    if body.name.trim().is_empty() {
        return Err(CafeError::BadRequest("Item name cannot be empty".into()));
    }
    if body.price < 0 {
        return Err(CafeError::BadRequest("Item price cannot be negative".into()));
    }

    let items = state
        .mongo
        .collection::<AvatarItemDoc>(AVATAR_ITEM_COLLECTION)
        .await?;
    let item = AvatarItemDoc::new(body.name.clone(), body.category, body.price, body.image_url);
    let id = items.insert_one(item).await?;

    info!(item = %body.name, "Shop item created");
    Ok(json_response(
        StatusCode::CREATED,
        &CreatedResponse { id: id.to_hex() },
    ))
}

/// Handle /admin/* requests.
///
/// Returns Some(response) if the request was handled, None otherwise.
pub async fn handle_admin_request(
    req: Request<hyper::body::Incoming>,
    state: Arc<AppState>,
) -> Option<Response<BoxBody>> {
    let path = req.uri().path().to_string();
    let method = req.method().clone();

    if !path.starts_with("/admin") {
        return None;
    }

    if method == Method::OPTIONS {
        return Some(cors_preflight());
    }

    let response = match (method, path.as_str()) {
        (Method::POST, "/admin/courses") => respond(handle_create_course(req, state).await),
        (Method::POST, "/admin/items") => respond(handle_create_item(req, state).await),
        (_, "/admin/courses") | (_, "/admin/items") => method_not_allowed(),
        _ => not_found(&path),
    };

    Some(response)
}
