//! Forum post document schema

use bson::{doc, oid::ObjectId, Document};
use mongodb::options::IndexOptions;
use serde::{Deserialize, Serialize};

use crate::db::mongo::{IntoIndexes, MutMetadata};
use crate::db::schemas::Metadata;

/// Collection name for forum posts
pub const POST_COLLECTION: &str = "posts";

/// Forum post document stored in MongoDB
#[derive(Serialize, Deserialize, Clone, Debug, Default)]
pub struct PostDoc {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub _id: Option<ObjectId>,

    #[serde(default)]
    pub metadata: Metadata,

    pub user_id: ObjectId,

    pub course_id: ObjectId,

    pub content: String,
}

impl PostDoc {
    pub fn new(user_id: ObjectId, course_id: ObjectId, content: String) -> Self {
        Self {
            _id: None,
            metadata: Metadata::new(),
            user_id,
            course_id,
            content,
        }
    }
}

impl IntoIndexes for PostDoc {
    fn into_indices() -> Vec<(Document, Option<IndexOptions>)> {
        vec![
            // Course feed, newest first
            (
                doc! { "course_id": 1, "metadata.created_at": -1 },
                Some(
                    IndexOptions::builder()
                        .name("course_created_index".to_string())
                        .build(),
                ),
            ),
            // Per-user activity counts for ranking
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

impl MutMetadata for PostDoc {
    fn mut_metadata(&mut self) -> &mut Metadata {
        &mut self.metadata
    }
}
