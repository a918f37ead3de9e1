//! Reply document schema
//!
//! Replies form a tree under a post via `parent_id`. The course id is
//! denormalized from the parent post so the ranking engine can count a
//! student's replies per course without a join.

use bson::{doc, oid::ObjectId, Document};
use mongodb::options::IndexOptions;
use serde::{Deserialize, Serialize};

use crate::db::mongo::{IntoIndexes, MutMetadata};
use crate::db::schemas::Metadata;

/// Collection name for replies
pub const REPLY_COLLECTION: &str = "replies";

/// Reply document stored in MongoDB
#[derive(Serialize, Deserialize, Clone, Debug, Default)]
pub struct ReplyDoc {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub _id: Option<ObjectId>,

    #[serde(default)]
    pub metadata: Metadata,

    pub user_id: ObjectId,

    pub post_id: ObjectId,

    /// Course of the parent post
    pub course_id: ObjectId,

    /// Parent reply for nested threads; None for top-level replies
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parent_id: Option<ObjectId>,

    pub content: String,
}

impl ReplyDoc {
    pub fn new(
        user_id: ObjectId,
        post_id: ObjectId,
        course_id: ObjectId,
        parent_id: Option<ObjectId>,
        content: String,
    ) -> Self {
        Self {
            _id: None,
            metadata: Metadata::new(),
            user_id,
            post_id,
            course_id,
            parent_id,
            content,
        }
    }
}

impl IntoIndexes for ReplyDoc {
    fn into_indices() -> Vec<(Document, Option<IndexOptions>)> {
        vec![
            // Thread listing
            (
                doc! { "post_id": 1, "metadata.created_at": 1 },
                Some(
                    IndexOptions::builder()
                        .name("post_created_index".to_string())
                        .build(),
                ),
            ),
            // Reward recounts (global) and ranking counts (per course)
            (
                doc! { "user_id": 1, "course_id": 1 },
                Some(
                    IndexOptions::builder()
                        .name("user_course_index".to_string())
                        .build(),
                ),
            ),
        ]
    }
}

impl MutMetadata for ReplyDoc {
    fn mut_metadata(&mut self) -> &mut Metadata {
        &mut self.metadata
    }
}
