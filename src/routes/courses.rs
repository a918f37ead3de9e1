//! HTTP routes for course catalog and enrollment
//!
//! - GET  /courses               - List courses, optional ?q= search
//! - GET  /courses/mine          - Courses the caller is enrolled in
//! - POST /courses/{key}/join    - Enroll the caller (key = id or code)

use bson::{doc, Bson};
use hyper::{Method, Request, Response, StatusCode};
use serde::Serialize;
use std::sync::Arc;
use tracing::info;

use crate::auth::authenticate;
use crate::db::schemas::{
    CourseDoc, EnrollmentDoc, COURSE_COLLECTION, ENROLLMENT_COLLECTION,
};
use crate::routes::{
    cors_preflight, json_response, method_not_allowed, not_found, resolve_course, respond,
    BoxBody, SuccessResponse,
};
use crate::server::AppState;
use crate::types::CafeError;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CourseView {
    pub course_id: String,
    pub course_code: String,
    pub title: String,
    pub semester: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EnrolledCourseView {
    #[serde(flatten)]
    pub course: CourseView,
    pub is_top_contributor: bool,
}

impl CourseView {
    fn from_doc(doc: &CourseDoc) -> Self {
        Self {
            course_id: doc._id.map(|id| id.to_hex()).unwrap_or_default(),
            course_code: doc.course_code.clone(),
            title: doc.title.clone(),
            semester: doc.semester.clone(),
        }
    }
}

/// GET /courses?q=term
async fn handle_list(
    state: Arc<AppState>,
    query: Option<&str>,
) -> Result<Response<BoxBody>, CafeError> {
    let courses = state.mongo.collection::<CourseDoc>(COURSE_COLLECTION).await?;

    let filter = match query.and_then(search_term) {
        Some(term) => {
            let pattern = regex_escape(&term);
            doc! {
                "$or": [
                    { "course_code": { "$regex": &pattern, "$options": "i" } },
                    { "title": { "$regex": &pattern, "$options": "i" } },
                ]
            }
        }
        None => doc! {},
    };

    let found = courses
        .find_sorted(filter, Some(doc! { "course_code": 1 }), Some(100))
        .await?;
    let views: Vec<CourseView> = found.iter().map(CourseView::from_doc).collect();

    Ok(json_response(StatusCode::OK, &views))
}

/// GET /courses/mine
async fn handle_mine(
    req: Request<hyper::body::Incoming>,
    state: Arc<AppState>,
) -> Result<Response<BoxBody>, CafeError> {
    let identity = authenticate(&req, &state.jwt)?;

    let enrollments = state
        .mongo
        .collection::<EnrollmentDoc>(ENROLLMENT_COLLECTION)
        .await?;
    let courses = state.mongo.collection::<CourseDoc>(COURSE_COLLECTION).await?;

    let mine = enrollments
        .find_many(doc! { "user_id": identity.user_id })
        .await?;

    let course_ids: Vec<Bson> = mine.iter().map(|e| Bson::ObjectId(e.course_id)).collect();
    let found = courses
        .find_many(doc! { "_id": { "$in": course_ids } })
        .await?;

    let views: Vec<EnrolledCourseView> = found
        .iter()
        .map(|c| {
            let is_top = mine
                .iter()
                .any(|e| Some(e.course_id) == c._id && e.is_top_contributor);
            EnrolledCourseView {
                course: CourseView::from_doc(c),
                is_top_contributor: is_top,
            }
        })
        .collect();

    Ok(json_response(StatusCode::OK, &views))
}

/// POST /courses/{key}/join
async fn handle_join(
    req: Request<hyper::body::Incoming>,
    state: Arc<AppState>,
    course_key: &str,
) -> Result<Response<BoxBody>, CafeError> {
    let identity = authenticate(&req, &state.jwt)?;
    let course = resolve_course(&state, course_key).await?;
    let course_id = course
        ._id
        .ok_or_else(|| CafeError::Internal("Course document missing id".into()))?;

    let enrollments = state
        .mongo
        .collection::<EnrollmentDoc>(ENROLLMENT_COLLECTION)
        .await?;

    let existing = enrollments
        .find_one(doc! { "user_id": identity.user_id, "course_id": course_id })
        .await?;
    if existing.is_some() {
        return Err(CafeError::Conflict(format!(
            "Already enrolled in {}",
            course.course_code
        )));
    }

    let enrollment = EnrollmentDoc::new(identity.user_id, course_id);
    match enrollments.insert_one(enrollment).await {
        Ok(_) => {}
        // Join race on the unique (user, course) index
        Err(e) if e.is_duplicate_key() => {
            return Err(CafeError::Conflict(format!(
                "Already enrolled in {}",
                course.course_code
            )));
        }
        Err(e) => return Err(e),
    }

    info!(user = %identity.user_id, course = %course.course_code, "User enrolled");

    Ok(json_response(
        StatusCode::CREATED,
        &SuccessResponse {
            success: true,
            message: format!("Enrolled in {}", course.course_code),
        },
    ))
}

/// Extract and percent-decode the `q=` search term from a query string.
/// A `+` means a space per form encoding. Empty terms count as absent.
fn search_term(query: &str) -> Option<String> {
    let raw = query
        .split('&')
        .find_map(|pair| pair.strip_prefix("q="))?;
    let decoded = urlencoding::decode(&raw.replace('+', " "))
        .map(|cow| cow.into_owned())
        .unwrap_or_else(|_| raw.to_string());
    if decoded.trim().is_empty() {
        None
    } else {
        Some(decoded)
    }
}

/// Escape regex metacharacters for safe substring search
fn regex_escape(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    for c in input.chars() {
        if "\\.^$|?*+()[]{}".contains(c) {
            out.push('\\');
        }
        out.push(c);
    }
    out
}

/// Handle /courses/* requests.
///
/// Returns Some(response) if the request was handled, None otherwise.
pub async fn handle_course_request(
    req: Request<hyper::body::Incoming>,
    state: Arc<AppState>,
) -> Option<Response<BoxBody>> {
    let path = req.uri().path().to_string();
    let method = req.method().clone();

    if !path.starts_with("/courses") {
        return None;
    }

    if method == Method::OPTIONS {
        return Some(cors_preflight());
    }

    let query = req.uri().query().map(|q| q.to_string());
    let segments: Vec<&str> = path.trim_matches('/').split('/').collect();

    let response = match (method, segments.as_slice()) {
        (Method::GET, ["courses"]) => respond(handle_list(state, query.as_deref()).await),
        (Method::GET, ["courses", "mine"]) => respond(handle_mine(req, state).await),
        (Method::POST, ["courses", key, "join"]) => {
            let key = key.to_string();
            respond(handle_join(req, state, &key).await)
        }
        (_, ["courses"]) | (_, ["courses", "mine"]) | (_, ["courses", _, "join"]) => {
            method_not_allowed()
        }
        _ => return forum_fallthrough(req, state, &path).await,
    };

    Some(response)
}

/// Course-scoped forum and meme paths share the /courses prefix; hand
/// them to their own dispatchers before giving up.
async fn forum_fallthrough(
    req: Request<hyper::body::Incoming>,
    state: Arc<AppState>,
    path: &str,
) -> Option<Response<BoxBody>> {
    if crate::routes::forum::owns_path(path) {
        return crate::routes::forum::handle_forum_request(req, state).await;
    }
    if crate::routes::bulletin::owns_path(path) {
        return crate::routes::bulletin::handle_meme_request(req, state).await;
    }
    Some(not_found(path))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_regex_escape_neutralizes_metacharacters() {
        assert_eq!(regex_escape("CS.101"), "CS\\.101");
        assert_eq!(regex_escape("a+b"), "a\\+b");
        assert_eq!(regex_escape("plain"), "plain");
    }

    #[test]
    fn test_search_term_percent_decodes() {
        assert_eq!(search_term("q=CS%20101"), Some("CS 101".to_string()));
        assert_eq!(search_term("q=intro+to+rust"), Some("intro to rust".to_string()));
        assert_eq!(search_term("q=C%2B%2B"), Some("C++".to_string()));
    }

    #[test]
    fn test_search_term_ignores_other_keys_and_empties() {
        assert_eq!(search_term("q=algo&page=2"), Some("algo".to_string()));
        assert_eq!(search_term("page=2"), None);
        assert_eq!(search_term("q="), None);
        assert_eq!(search_term("q=%20%20"), None);
    }
}
