//! HTTP routes for the per-course forum
//!
//! - GET  /courses/{key}/posts    - List posts, newest first
//! - POST /courses/{key}/posts    - Create a post (awards coins)
//! - GET  /posts/{id}/replies     - List a post's replies, oldest first
//! - POST /posts/{id}/replies     - Create a reply (milestone coins)
//! - POST /posts/{id}/like        - Toggle a like on a post
//! - POST /replies/{id}/like      - Toggle a like on a reply
//!
//! Creation paths go through the reward engine so content and coins
//! move in the same transaction.

use bson::doc;
use hyper::{Method, Request, Response, StatusCode};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::auth::authenticate;
use crate::db::schemas::{
    LikeTarget, PostDoc, ReplyDoc, POST_COLLECTION, REPLY_COLLECTION,
};
use crate::routes::{
    cors_preflight, json_response, method_not_allowed, not_found, parse_json_body,
    parse_object_id, require_enrollment, resolve_course, respond, BoxBody,
};
use crate::server::AppState;
use crate::types::CafeError;

#[derive(Debug, Deserialize)]
pub struct CreatePostRequest {
    pub content: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateReplyRequest {
    pub content: String,
    pub parent_id: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PostView {
    pub post_id: String,
    pub user_id: String,
    pub content: String,
    pub created_at: Option<bson::DateTime>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReplyView {
    pub reply_id: String,
    pub user_id: String,
    pub parent_id: Option<String>,
    pub content: String,
    pub created_at: Option<bson::DateTime>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LikeView {
    pub liked: bool,
    pub coins_awarded: i64,
}

impl PostView {
    fn from_doc(doc: &PostDoc) -> Self {
        Self {
            post_id: doc._id.map(|id| id.to_hex()).unwrap_or_default(),
            user_id: doc.user_id.to_hex(),
            content: doc.content.clone(),
            created_at: doc.metadata.created_at,
        }
    }
}

impl ReplyView {
    fn from_doc(doc: &ReplyDoc) -> Self {
        Self {
            reply_id: doc._id.map(|id| id.to_hex()).unwrap_or_default(),
            user_id: doc.user_id.to_hex(),
            parent_id: doc.parent_id.map(|id| id.to_hex()),
            content: doc.content.clone(),
            created_at: doc.metadata.created_at,
        }
    }
}

/// GET /courses/{key}/posts
async fn handle_list_posts(
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

    let posts = state.mongo.collection::<PostDoc>(POST_COLLECTION).await?;
    let found = posts
        .find_sorted(
            doc! { "course_id": course_id },
            Some(doc! { "metadata.created_at": -1 }),
            Some(100),
        )
        .await?;

    let views: Vec<PostView> = found.iter().map(PostView::from_doc).collect();
    Ok(json_response(StatusCode::OK, &views))
}

/// POST /courses/{key}/posts
async fn handle_create_post(
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

    let body: CreatePostRequest = parse_json_body(req).await?;
    if body.content.trim().is_empty() {
        return Err(CafeError::BadRequest("Post content cannot be empty".into()));
    }

    let post = state
        .rewards
        .create_post(identity.user_id, course_id, body.content)
        .await?;

    Ok(json_response(StatusCode::CREATED, &PostView::from_doc(&post)))
}

/// GET /posts/{id}/replies
async fn handle_list_replies(
    req: Request<hyper::body::Incoming>,
    state: Arc<AppState>,
    post_id: &str,
) -> Result<Response<BoxBody>, CafeError> {
    let identity = authenticate(&req, &state.jwt)?;
    let post_id = parse_object_id(post_id)?;

    let posts = state.mongo.collection::<PostDoc>(POST_COLLECTION).await?;
    let post = posts
        .find_one(doc! { "_id": post_id })
        .await?
        .ok_or_else(|| CafeError::NotFound("Post not found".into()))?;
    require_enrollment(&state, identity.user_id, post.course_id).await?;

    let replies = state.mongo.collection::<ReplyDoc>(REPLY_COLLECTION).await?;
    let found = replies
        .find_sorted(
            doc! { "post_id": post_id },
            Some(doc! { "metadata.created_at": 1 }),
            None,
        )
        .await?;

    let views: Vec<ReplyView> = found.iter().map(ReplyView::from_doc).collect();
    Ok(json_response(StatusCode::OK, &views))
}

/// POST /posts/{id}/replies
async fn handle_create_reply(
    req: Request<hyper::body::Incoming>,
    state: Arc<AppState>,
    post_id: &str,
) -> Result<Response<BoxBody>, CafeError> {
    let identity = authenticate(&req, &state.jwt)?;
    let post_id = parse_object_id(post_id)?;

    let posts = state.mongo.collection::<PostDoc>(POST_COLLECTION).await?;
    let post = posts
        .find_one(doc! { "_id": post_id })
        .await?
        .ok_or_else(|| CafeError::NotFound("Post not found".into()))?;
    require_enrollment(&state, identity.user_id, post.course_id).await?;

    let body: CreateReplyRequest = parse_json_body(req).await?;
    if body.content.trim().is_empty() {
        return Err(CafeError::BadRequest("Reply content cannot be empty".into()));
    }
    let parent_id = body
        .parent_id
        .as_deref()
        .map(parse_object_id)
        .transpose()?;

    let reply = state
        .rewards
        .create_reply(identity.user_id, post_id, parent_id, body.content)
        .await?;

    Ok(json_response(
        StatusCode::CREATED,
        &ReplyView::from_doc(&reply),
    ))
}

/// POST /posts/{id}/like and POST /replies/{id}/like
async fn handle_toggle_like(
    req: Request<hyper::body::Incoming>,
    state: Arc<AppState>,
    target: LikeTarget,
) -> Result<Response<BoxBody>, CafeError> {
    let identity = authenticate(&req, &state.jwt)?;

    // Enrollment gate: the like target must live in a course the caller
    // is a member of
    let course_id = match target {
        LikeTarget::Post(id) => {
            let posts = state.mongo.collection::<PostDoc>(POST_COLLECTION).await?;
            posts
                .find_one(doc! { "_id": id })
                .await?
                .ok_or_else(|| CafeError::NotFound("Post not found".into()))?
                .course_id
        }
        LikeTarget::Reply(id) => {
            let replies = state.mongo.collection::<ReplyDoc>(REPLY_COLLECTION).await?;
            replies
                .find_one(doc! { "_id": id })
                .await?
                .ok_or_else(|| CafeError::NotFound("Reply not found".into()))?
                .course_id
        }
    };
    require_enrollment(&state, identity.user_id, course_id).await?;

    let outcome = state.rewards.toggle_like(identity.user_id, target).await?;

    Ok(json_response(
        StatusCode::OK,
        &LikeView {
            liked: outcome.liked,
            coins_awarded: outcome.coins_awarded,
        },
    ))
}

/// True when the path belongs to the forum dispatcher
pub fn owns_path(path: &str) -> bool {
    let segments: Vec<&str> = path.trim_matches('/').split('/').collect();
    matches!(
        segments.as_slice(),
        ["courses", _, "posts"]
            | ["posts", _, "replies"]
            | ["posts", _, "like"]
            | ["replies", _, "like"]
    )
}

/// Handle forum HTTP requests.
///
/// Returns Some(response) if the request was handled, None otherwise.
pub async fn handle_forum_request(
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
    let segments: Vec<&str> = segments.iter().map(|s| s.as_str()).collect();

    let response = match (method, segments.as_slice()) {
        (Method::GET, ["courses", key, "posts"]) => {
            let key = key.to_string();
            respond(handle_list_posts(req, state, &key).await)
        }
        (Method::POST, ["courses", key, "posts"]) => {
            let key = key.to_string();
            respond(handle_create_post(req, state, &key).await)
        }
        (Method::GET, ["posts", id, "replies"]) => {
            let id = id.to_string();
            respond(handle_list_replies(req, state, &id).await)
        }
        (Method::POST, ["posts", id, "replies"]) => {
            let id = id.to_string();
            respond(handle_create_reply(req, state, &id).await)
        }
        (Method::POST, ["posts", id, "like"]) => match parse_object_id(id) {
            Ok(target_id) => {
                respond(handle_toggle_like(req, state, LikeTarget::Post(target_id)).await)
            }
            Err(e) => crate::routes::error_response(&e),
        },
        (Method::POST, ["replies", id, "like"]) => match parse_object_id(id) {
            Ok(target_id) => {
                respond(handle_toggle_like(req, state, LikeTarget::Reply(target_id)).await)
            }
            Err(e) => crate::routes::error_response(&e),
        },
        (_, _) if owns_path(&path) => method_not_allowed(),
        _ => not_found(&path),
    };

    Some(response)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_owns_path() {
        assert!(owns_path("/courses/cs101/posts"));
        assert!(owns_path("/posts/abc/replies"));
        assert!(owns_path("/posts/abc/like"));
        assert!(owns_path("/replies/abc/like"));
        assert!(!owns_path("/courses/cs101/memes"));
        assert!(!owns_path("/courses"));
    }

    #[test]
    fn test_create_reply_request_accepts_missing_parent() {
        let json = r#"{"content":"nice point"}"#;
        let req: CreateReplyRequest = serde_json::from_str(json).unwrap();
        assert!(req.parent_id.is_none());
    }
}
