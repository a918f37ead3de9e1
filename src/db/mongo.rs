//! MongoDB client and collection wrapper

use bson::{doc, oid::ObjectId, DateTime, Document};
use mongodb::{
    options::IndexOptions,
    results::{DeleteResult, UpdateResult},
    Client, ClientSession, Collection, IndexModel,
};
use serde::{de::DeserializeOwned, Serialize};
use std::fmt::Debug;
use tracing::{error, info};

use crate::db::schemas::Metadata;
use crate::types::CafeError;

/// Trait for schemas that provide index definitions
pub trait IntoIndexes {
    fn into_indices() -> Vec<(Document, Option<IndexOptions>)>;
}

/// Trait for schemas with mutable metadata
pub trait MutMetadata {
    fn mut_metadata(&mut self) -> &mut Metadata;
}

/// MongoDB client wrapper
#[derive(Clone)]
pub struct MongoClient {
    client: Client,
    db_name: String,
}

impl MongoClient {
    /// Create a new MongoDB client
    pub async fn new(uri: &str, db_name: &str) -> Result<Self, CafeError> {
        info!("Connecting to MongoDB at {}", uri);

        // Use serverSelectionTimeoutMS to avoid hanging on unreachable MongoDB
        let timeout_uri = if uri.contains('?') {
            format!("{}&serverSelectionTimeoutMS=3000&connectTimeoutMS=3000", uri)
        } else {
            format!("{}?serverSelectionTimeoutMS=3000&connectTimeoutMS=3000", uri)
        };

        let client = Client::with_uri_str(&timeout_uri)
            .await
            .map_err(|e| CafeError::Database(format!("Failed to connect to MongoDB: {}", e)))?;

        // Verify connection with timeout
        client
            .database(db_name)
            .run_command(doc! { "ping": 1 })
            .await
            .map_err(|e| CafeError::Database(format!("MongoDB ping failed: {}", e)))?;

        info!("Connected to MongoDB database '{}'", db_name);

        Ok(Self {
            client,
            db_name: db_name.to_string(),
        })
    }

    /// Get a typed collection, applying its declared indexes
    pub async fn collection<T>(&self, name: &str) -> Result<MongoCollection<T>, CafeError>
    where
        T: Serialize + DeserializeOwned + Unpin + Send + Sync + IntoIndexes + MutMetadata,
    {
        MongoCollection::new(&self.client, &self.db_name, name).await
    }

    /// Start a client session for multi-document transactions
    pub async fn start_session(&self) -> Result<ClientSession, CafeError> {
        self.client
            .start_session()
            .await
            .map_err(|e| CafeError::Database(format!("Failed to start session: {}", e)))
    }

    /// Get the raw MongoDB client
    pub fn inner(&self) -> &Client {
        &self.client
    }

    /// Get the database name
    pub fn db_name(&self) -> &str {
        &self.db_name
    }
}

/// Check whether a driver error is a unique index violation (E11000).
/// Used to translate duplicate-key races into domain conflicts.
pub fn is_duplicate_key_error(err: &mongodb::error::Error) -> bool {
    let text = err.to_string();
    text.contains("E11000") || text.contains("duplicate key")
}

/// Typed MongoDB collection with automatic indexing
#[derive(Debug, Clone)]
pub struct MongoCollection<T>
where
    T: Serialize + DeserializeOwned + Unpin + Send + Sync,
{
    inner: Collection<T>,
}

impl<T> MongoCollection<T>
where
    T: Serialize + DeserializeOwned + Unpin + Send + Sync + IntoIndexes + MutMetadata,
{
    /// Create a new collection and apply indexes
    pub async fn new(
        client: &Client,
        db_name: &str,
        collection_name: &str,
    ) -> Result<Self, CafeError> {
        let collection = client.database(db_name).collection::<T>(collection_name);
        let mongo_collection = MongoCollection { inner: collection };

        // Apply indexes
        mongo_collection.apply_indexes().await?;

        Ok(mongo_collection)
    }

    /// Apply schema-defined indexes
    async fn apply_indexes(&self) -> Result<(), CafeError> {
        let schema_indices = T::into_indices();

        if schema_indices.is_empty() {
            return Ok(());
        }

        let indices: Vec<IndexModel> = schema_indices
            .into_iter()
            .map(|(keys, opts)| IndexModel::builder().keys(keys).options(opts).build())
            .collect();

        self.inner
            .create_indexes(indices)
            .await
            .map_err(|e| CafeError::Database(format!("Failed to create indexes: {}", e)))?;

        Ok(())
    }

    /// Insert a document, setting metadata timestamps
    pub async fn insert_one(&self, mut item: T) -> Result<ObjectId, CafeError> {
        let metadata = item.mut_metadata();
        metadata.is_deleted = false;
        metadata.created_at = Some(DateTime::now());
        metadata.updated_at = Some(DateTime::now());

        let result = self
            .inner
            .insert_one(item)
            .await
            .map_err(|e| CafeError::Database(format!("Insert failed: {}", e)))?;

        result
            .inserted_id
            .as_object_id()
            .ok_or_else(|| CafeError::Database("Failed to get inserted ID".into()))
    }

    /// Find one document by filter
    pub async fn find_one(&self, filter: Document) -> Result<Option<T>, CafeError> {
        // Add is_deleted check
        let mut full_filter = filter;
        full_filter.insert("metadata.is_deleted", doc! { "$ne": true });

        self.inner
            .find_one(full_filter)
            .await
            .map_err(|e| CafeError::Database(format!("Find failed: {}", e)))
    }

    /// Find many documents by filter
    pub async fn find_many(&self, filter: Document) -> Result<Vec<T>, CafeError> {
        self.find_sorted(filter, None, None).await
    }

    /// Find many documents with optional sort and limit
    pub async fn find_sorted(
        &self,
        filter: Document,
        sort: Option<Document>,
        limit: Option<i64>,
    ) -> Result<Vec<T>, CafeError> {
        use futures_util::StreamExt;

        // Add is_deleted check
        let mut full_filter = filter;
        full_filter.insert("metadata.is_deleted", doc! { "$ne": true });

        let mut find = self.inner.find(full_filter);
        if let Some(sort) = sort {
            find = find.sort(sort);
        }
        if let Some(limit) = limit {
            find = find.limit(limit);
        }

        let cursor = find
            .await
            .map_err(|e| CafeError::Database(format!("Find failed: {}", e)))?;

        let results: Vec<T> = cursor
            .filter_map(|doc| async {
                match doc {
                    Ok(d) => Some(d),
                    Err(e) => {
                        error!("Error reading document: {}", e);
                        None
                    }
                }
            })
            .collect()
            .await;

        Ok(results)
    }

    /// Count documents matching a filter
    pub async fn count(&self, filter: Document) -> Result<u64, CafeError> {
        let mut full_filter = filter;
        full_filter.insert("metadata.is_deleted", doc! { "$ne": true });

        self.inner
            .count_documents(full_filter)
            .await
            .map_err(|e| CafeError::Database(format!("Count failed: {}", e)))
    }

    /// Update one document, refreshing its metadata timestamp
    pub async fn update_one(
        &self,
        filter: Document,
        update: Document,
    ) -> Result<UpdateResult, CafeError> {
        self.inner
            .update_one(filter, with_updated_stamp(update))
            .await
            .map_err(|e| CafeError::Database(format!("Update failed: {}", e)))
    }

    /// Update every matching document, refreshing their metadata timestamps
    pub async fn update_many(
        &self,
        filter: Document,
        update: Document,
    ) -> Result<UpdateResult, CafeError> {
        self.inner
            .update_many(filter, with_updated_stamp(update))
            .await
            .map_err(|e| CafeError::Database(format!("Update failed: {}", e)))
    }

    /// Hard-delete one document (used for like toggles)
    pub async fn delete_one(&self, filter: Document) -> Result<DeleteResult, CafeError> {
        self.inner
            .delete_one(filter)
            .await
            .map_err(|e| CafeError::Database(format!("Delete failed: {}", e)))
    }

    /// Get the underlying collection for transactional operations
    pub fn inner(&self) -> &Collection<T> {
        &self.inner
    }
}

/// Fold a `metadata.updated_at` refresh into an update document, merging
/// into an existing `$set` clause or adding one.
fn with_updated_stamp(mut update: Document) -> Document {
    let stamp = bson::Bson::DateTime(DateTime::now());
    match update.get_document_mut("$set") {
        Ok(set) => {
            set.insert("metadata.updated_at", stamp);
        }
        Err(_) => {
            update.insert("$set", doc! { "metadata.updated_at": stamp });
        }
    }
    update
}

#[cfg(test)]
mod tests {
    // Transactional behavior is exercised against a running MongoDB replica
    // set in deployment; unit tests cover the pure pieces of the wrapper.
    use super::*;

    #[test]
    fn test_updated_stamp_merges_into_existing_set() {
        let update = with_updated_stamp(doc! { "$set": { "avatar_config": { "hat": "cap" } } });
        let set = update.get_document("$set").unwrap();
        assert!(set.get("avatar_config").is_some());
        assert!(matches!(
            set.get("metadata.updated_at"),
            Some(bson::Bson::DateTime(_))
        ));
    }

    #[test]
    fn test_updated_stamp_added_alongside_other_operators() {
        let update = with_updated_stamp(doc! { "$inc": { "coins": 1 } });
        assert!(update.get_document("$inc").is_ok());
        let set = update.get_document("$set").unwrap();
        assert!(matches!(
            set.get("metadata.updated_at"),
            Some(bson::Bson::DateTime(_))
        ));
    }
}
