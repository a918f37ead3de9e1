//! Like document schema
//!
//! A like belongs to exactly one of a post or a reply. Uniqueness per
//! (user, target) is enforced with partial unique indexes so the same
//! user cannot like the same target twice, even under concurrent toggles.

use bson::{doc, oid::ObjectId, Document};
use mongodb::options::IndexOptions;
use serde::{Deserialize, Serialize};

use crate::db::mongo::{IntoIndexes, MutMetadata};
use crate::db::schemas::Metadata;

/// Collection name for likes
pub const LIKE_COLLECTION: &str = "likes";

/// The content a like attaches to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LikeTarget {
    Post(ObjectId),
    Reply(ObjectId),
}

impl LikeTarget {
    /// Filter matching this user's like on this target
    pub fn filter_for(&self, user_id: ObjectId) -> Document {
        match *self {
            LikeTarget::Post(id) => doc! { "user_id": user_id, "post_id": id },
            LikeTarget::Reply(id) => doc! { "user_id": user_id, "reply_id": id },
        }
    }
}

/// Like document stored in MongoDB
#[derive(Serialize, Deserialize, Clone, Debug, Default)]
pub struct LikeDoc {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub _id: Option<ObjectId>,

    #[serde(default)]
    pub metadata: Metadata,

    pub user_id: ObjectId,

    /// Set when the like targets a post
    #[serde(skip_serializing_if = "Option::is_none")]
    pub post_id: Option<ObjectId>,

    /// Set when the like targets a reply
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reply_id: Option<ObjectId>,
}

impl LikeDoc {
    pub fn new(user_id: ObjectId, target: LikeTarget) -> Self {
        let (post_id, reply_id) = match target {
            LikeTarget::Post(id) => (Some(id), None),
            LikeTarget::Reply(id) => (None, Some(id)),
        };
        Self {
            _id: None,
            metadata: Metadata::new(),
            user_id,
            post_id,
            reply_id,
        }
    }
}

impl IntoIndexes for LikeDoc {
    fn into_indices() -> Vec<(Document, Option<IndexOptions>)> {
        vec![
            (
                doc! { "user_id": 1, "post_id": 1 },
                Some(
                    IndexOptions::builder()
                        .unique(true)
                        .partial_filter_expression(doc! { "post_id": { "$exists": true } })
                        .name("user_post_unique".to_string())
                        .build(),
                ),
            ),
            (
                doc! { "user_id": 1, "reply_id": 1 },
                Some(
                    IndexOptions::builder()
                        .unique(true)
                        .partial_filter_expression(doc! { "reply_id": { "$exists": true } })
                        .name("user_reply_unique".to_string())
                        .build(),
                ),
            ),
            // Like counts per target
            (
                doc! { "post_id": 1 },
                Some(
                    IndexOptions::builder()
                        .name("post_index".to_string())
                        .build(),
                ),
            ),
            (
                doc! { "reply_id": 1 },
                Some(
                    IndexOptions::builder()
                        .name("reply_index".to_string())
                        .build(),
                ),
            ),
        ]
    }
}

impl MutMetadata for LikeDoc {
    fn mut_metadata(&mut self) -> &mut Metadata {
        &mut self.metadata
    }
}
