//! Course document schema

use bson::{doc, oid::ObjectId, Document};
use mongodb::options::IndexOptions;
use serde::{Deserialize, Serialize};

use crate::db::mongo::{IntoIndexes, MutMetadata};
use crate::db::schemas::Metadata;

/// Collection name for courses
pub const COURSE_COLLECTION: &str = "courses";

/// Course document stored in MongoDB.
/// Created by admins only; immutable afterwards.
#[derive(Serialize, Deserialize, Clone, Debug, Default)]
pub struct CourseDoc {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub _id: Option<ObjectId>,

    #[serde(default)]
    pub metadata: Metadata,

    /// Unique course code, e.g. "CS473"
    pub course_code: String,

    pub title: String,

    /// Term the course runs in, e.g. "Fall 2025"
    pub semester: String,
}

impl CourseDoc {
    pub fn new(course_code: String, title: String, semester: String) -> Self {
        Self {
            _id: None,
            metadata: Metadata::new(),
            course_code,
            title,
            semester,
        }
    }
}

impl IntoIndexes for CourseDoc {
    fn into_indices() -> Vec<(Document, Option<IndexOptions>)> {
        vec![(
            doc! { "course_code": 1 },
            Some(
                IndexOptions::builder()
                    .unique(true)
                    .name("course_code_unique".to_string())
                    .build(),
            ),
        )]
    }
}

impl MutMetadata for CourseDoc {
    fn mut_metadata(&mut self) -> &mut Metadata {
        &mut self.metadata
    }
}
