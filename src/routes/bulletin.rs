//! HTTP routes for the course meme board
//!
//! - GET  /courses/{key}/memes - List memes, newest first
//! - POST /courses/{key}/memes - Post a meme (costs coins, gated)
//!
//! Posting is a privilege, not a reward: the reward engine debits the
//! configured cost and enforces the top-contributor gate atomically.

use bson::doc;
use hyper::{Method, Request, Response, StatusCode};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::auth::authenticate;
use crate::db::schemas::{MemePostDoc, MEME_POST_COLLECTION};
use crate::routes::{
    cors_preflight, json_response, method_not_allowed, parse_json_body, require_enrollment,
    resolve_course, respond, BoxBody,
};
use crate::server::AppState;
use crate::types::CafeError;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PostMemeRequest {
    pub image_url: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MemeView {
    pub meme_id: String,
    pub user_id: String,
    pub image_url: String,
    pub created_at: Option<bson::DateTime>,
}

impl MemeView {
    fn from_doc(doc: &MemePostDoc) -> Self {
        Self {
            meme_id: doc._id.map(|id| id.to_hex()).unwrap_or_default(),
            user_id: doc.user_id.to_hex(),
            image_url: doc.image_url.clone(),
            created_at: doc.metadata.created_at,
        }
    }
}

/// GET /courses/{key}/memes
async fn handle_list(
    req: Request<hyper::body::Incoming>,
    state: Arc<AppState>,
    course_key: &str,
) -> Result<Response<BoxBody>, CafeError> {
    let identity = authenticate(&req, &state.jwt)?;
    let course = resolve_course(&state, course_key).await?;
    let course_id = course
        ._id
        .ok_or_else(|| CafeError::Internal("Course document missing id".into()))?;
    require_enrollment(&state, identity.user_id, course_id).await?;

    let memes = state
        .mongo
        .collection::<MemePostDoc>(MEME_POST_COLLECTION)
        .await?;
    let found = memes
        .find_sorted(
            doc! { "course_id": course_id },
            Some(doc! { "metadata.created_at": -1 }),
            Some(100),
        )
        .await?;

    let views: Vec<MemeView> = found.iter().map(MemeView::from_doc).collect();
    Ok(json_response(StatusCode::OK, &views))
}

/// POST /courses/{key}/memes
async fn handle_post(
    req: Request<hyper::body::Incoming>,
    state: Arc<AppState>,
    course_key: &str,
) -> Result<Response<BoxBody>, CafeError> {
    let identity = authenticate(&req, &state.jwt)?;
    let course = resolve_course(&state, course_key).await?;
    let course_id = course
        ._id
        .ok_or_else(|| CafeError::Internal("Course document missing id".into()))?;

    let body: PostMemeRequest = parse_json_body(req).await?;
    if body.image_url.trim().is_empty() {
        return Err(CafeError::BadRequest("Image URL cannot be empty".into()));
    }

    // Enrollment, top-contributor gate, and balance check all happen
    // inside the engine's transaction
    let meme = state
        .rewards
        .post_meme(identity.user_id, course_id, body.image_url)
        .await?;

    Ok(json_response(StatusCode::CREATED, &MemeView::from_doc(&meme)))
}

/// True when the path belongs to the meme board dispatcher
pub fn owns_path(path: &str) -> bool {
    let segments: Vec<&str> = path.trim_matches('/').split('/').collect();
    matches!(segments.as_slice(), ["courses", _, "memes"])
}

/// Handle meme board HTTP requests.
///
/// Returns Some(response) if the request was handled, None otherwise.
pub async fn handle_meme_request(
    req: Request<hyper::body::Incoming>,
    state: Arc<AppState>,
) -> Option<Response<BoxBody>> {
    let path = req.uri().path().to_string();
    let method = req.method().clone();

    if !owns_path(&path) {
        return None;
    }

    if method == Method::OPTIONS {
        return Some(cors_preflight());
    }

    let segments: Vec<String> = path
        .trim_matches('/')
        .split('/')
        .map(|s| s.to_string())
        .collect();

    let response = match (method, segments.as_slice()) {
        (Method::GET, [_, key, _]) => {
            let key = key.to_string();
            respond(handle_list(req, state, &key).await)
        }
        (Method::POST, [_, key, _]) => {
            let key = key.to_string();
            respond(handle_post(req, state, &key).await)
        }
        _ => method_not_allowed(),
    };

    Some(response)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_owns_path() {
        assert!(owns_path("/courses/cs101/memes"));
        assert!(!owns_path("/courses/cs101/posts"));
        assert!(!owns_path("/memes"));
    }
}
