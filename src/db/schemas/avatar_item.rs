//! Avatar shop schemas
//!
//! `avatar_items` is the catalog; `user_items` records which user owns
//! which item (unique per pair, purchases debit coins transactionally).

use bson::{doc, oid::ObjectId, Document};
use mongodb::options::IndexOptions;
use serde::{Deserialize, Serialize};

use crate::db::mongo::{IntoIndexes, MutMetadata};
use crate::db::schemas::Metadata;

/// Collection name for the shop catalog
pub const AVATAR_ITEM_COLLECTION: &str = "avatar_items";

/// Collection name for owned items
pub const USER_ITEM_COLLECTION: &str = "user_items";

/// Shop catalog entry
#[derive(Serialize, Deserialize, Clone, Debug, Default)]
pub struct AvatarItemDoc {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub _id: Option<ObjectId>,

    #[serde(default)]
    pub metadata: Metadata,

    pub name: String,

    /// Slot the item occupies, e.g. "hat", "accessory"
    pub category: String,

    pub price: i64,

    pub image_url: String,
}

impl AvatarItemDoc {
    pub fn new(name: String, category: String, price: i64, image_url: String) -> Self {
        Self {
            _id: None,
            metadata: Metadata::new(),
            name,
            category,
            price,
            image_url,
        }
    }
}

impl IntoIndexes for AvatarItemDoc {
    fn into_indices() -> Vec<(Document, Option<IndexOptions>)> {
        vec![(
            doc! { "category": 1 },
            Some(
                IndexOptions::builder()
                    .name("category_index".to_string())
                    .build(),
            ),
        )]
    }
}

impl MutMetadata for AvatarItemDoc {
    fn mut_metadata(&mut self) -> &mut Metadata {
        &mut self.metadata
    }
}

/// Ownership record created when a user buys an item
#[derive(Serialize, Deserialize, Clone, Debug, Default)]
pub struct UserItemDoc {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub _id: Option<ObjectId>,

    #[serde(default)]
    pub metadata: Metadata,

    pub user_id: ObjectId,

    pub item_id: ObjectId,
}

impl UserItemDoc {
    pub fn new(user_id: ObjectId, item_id: ObjectId) -> Self {
        Self {
            _id: None,
            metadata: Metadata::new(),
            user_id,
            item_id,
        }
    }
}

impl IntoIndexes for UserItemDoc {
    fn into_indices() -> Vec<(Document, Option<IndexOptions>)> {
        vec![(
            doc! { "user_id": 1, "item_id": 1 },
            Some(
                IndexOptions::builder()
                    .unique(true)
                    .name("user_item_unique".to_string())
                    .build(),
            ),
        )]
    }
}

impl MutMetadata for UserItemDoc {
    fn mut_metadata(&mut self) -> &mut Metadata {
        &mut self.metadata
    }
}
