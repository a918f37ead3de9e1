//! Meme/notice board document schema

use bson::{doc, oid::ObjectId, Document};
use mongodb::options::IndexOptions;
use serde::{Deserialize, Serialize};

use crate::db::mongo::{IntoIndexes, MutMetadata};
use crate::db::schemas::Metadata;

/// Collection name for meme board posts
pub const MEME_POST_COLLECTION: &str = "meme_posts";

/// Meme board post stored in MongoDB. The image itself lives on an
/// external image host; only the URL is stored.
#[derive(Serialize, Deserialize, Clone, Debug, Default)]
pub struct MemePostDoc {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub _id: Option<ObjectId>,

    #[serde(default)]
    pub metadata: Metadata,

    pub user_id: ObjectId,

    pub course_id: ObjectId,

    pub image_url: String,
}

impl MemePostDoc {
    pub fn new(user_id: ObjectId, course_id: ObjectId, image_url: String) -> Self {
        Self {
            _id: None,
            metadata: Metadata::new(),
            user_id,
            course_id,
            image_url,
        }
    }
}

impl IntoIndexes for MemePostDoc {
    fn into_indices() -> Vec<(Document, Option<IndexOptions>)> {
        vec![(
            doc! { "course_id": 1, "metadata.created_at": -1 },
            Some(
                IndexOptions::builder()
                    .name("course_created_index".to_string())
                    .build(),
            ),
        )]
    }
}

impl MutMetadata for MemePostDoc {
    fn mut_metadata(&mut self) -> &mut Metadata {
        &mut self.metadata
    }
}
