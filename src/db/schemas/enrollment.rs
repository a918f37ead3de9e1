//! Enrollment document schema
//!
//! One document per (user, course) pair. Carries the two ranking flags:
//! `is_top_contributor` marks this cycle's winner (at most one true per
//! course), `has_won_before` is the rotation history used to avoid repeat
//! winners. Both flags are mutated only by the ranking engine.

use bson::{doc, oid::ObjectId, Document};
use mongodb::options::IndexOptions;
use serde::{Deserialize, Serialize};

use crate::db::mongo::{IntoIndexes, MutMetadata};
use crate::db::schemas::Metadata;

/// Collection name for enrollments
pub const ENROLLMENT_COLLECTION: &str = "enrollments";

/// Enrollment document stored in MongoDB
#[derive(Serialize, Deserialize, Clone, Debug, Default)]
pub struct EnrollmentDoc {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub _id: Option<ObjectId>,

    #[serde(default)]
    pub metadata: Metadata,

    pub user_id: ObjectId,

    pub course_id: ObjectId,

    /// Winner of the current ranking cycle
    #[serde(default)]
    pub is_top_contributor: bool,

    /// Has won at least once in the current rotation
    #[serde(default)]
    pub has_won_before: bool,
}

impl EnrollmentDoc {
    pub fn new(user_id: ObjectId, course_id: ObjectId) -> Self {
        Self {
            _id: None,
            metadata: Metadata::new(),
            user_id,
            course_id,
            is_top_contributor: false,
            has_won_before: false,
        }
    }
}

impl IntoIndexes for EnrollmentDoc {
    fn into_indices() -> Vec<(Document, Option<IndexOptions>)> {
        vec![
            // One enrollment per (user, course)
            (
                doc! { "user_id": 1, "course_id": 1 },
                Some(
                    IndexOptions::builder()
                        .unique(true)
                        .name("user_course_unique".to_string())
                        .build(),
                ),
            ),
            // Per-course scans during ranking cycles
            (
                doc! { "course_id": 1 },
                Some(
                    IndexOptions::builder()
                        .name("course_index".to_string())
                        .build(),
                ),
            ),
        ]
    }
}

impl MutMetadata for EnrollmentDoc {
    fn mut_metadata(&mut self) -> &mut Metadata {
        &mut self.metadata
    }
}
