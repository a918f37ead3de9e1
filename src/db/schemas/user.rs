//! User document schema
//!
//! Stores credentials, role, coin balance, and the avatar configuration.

use bson::{doc, oid::ObjectId, Document};
use mongodb::options::IndexOptions;
use serde::{Deserialize, Serialize};

use crate::db::mongo::{IntoIndexes, MutMetadata};
use crate::db::schemas::Metadata;

/// Collection name for users
pub const USER_COLLECTION: &str = "users";

/// User role for authorization
#[derive(Serialize, Deserialize, Clone, Copy, Debug, Default, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum UserRole {
    #[default]
    Student,
    Admin,
}

/// User document stored in MongoDB
#[derive(Serialize, Deserialize, Clone, Debug, Default)]
pub struct UserDoc {
    /// MongoDB document ID
    #[serde(skip_serializing_if = "Option::is_none")]
    pub _id: Option<ObjectId>,

    /// Common metadata (created_at, updated_at, is_deleted)
    #[serde(default)]
    pub metadata: Metadata,

    /// Login identifier
    pub email: String,

    /// Display name shown on forum content
    pub username: String,

    /// Argon2 password hash
    pub password_hash: String,

    /// Role (student or admin)
    #[serde(default)]
    pub role: UserRole,

    /// Coin balance. Mutated only inside reward/purchase transactions and
    /// never allowed below zero.
    #[serde(default)]
    pub coins: i64,

    /// Opaque avatar configuration set by the client
    #[serde(default)]
    pub avatar_config: Document,
}

impl UserDoc {
    /// Create a new user document with an empty wallet
    pub fn new(email: String, username: String, password_hash: String) -> Self {
        Self {
            _id: None,
            metadata: Metadata::new(),
            email,
            username,
            password_hash,
            role: UserRole::Student,
            coins: 0,
            avatar_config: Document::new(),
        }
    }

    pub fn is_admin(&self) -> bool {
        self.role == UserRole::Admin
    }
}

impl IntoIndexes for UserDoc {
    fn into_indices() -> Vec<(Document, Option<IndexOptions>)> {
        vec![(
            doc! { "email": 1 },
            Some(
                IndexOptions::builder()
                    .unique(true)
                    .name("email_unique".to_string())
                    .build(),
            ),
        )]
    }
}

impl MutMetadata for UserDoc {
    fn mut_metadata(&mut self) -> &mut Metadata {
        &mut self.metadata
    }
}
