//! MongoDB access layer
//!
//! Client wrapper, typed collections with declared indexes, and the
//! document schemas for every ClassCafe collection.

pub mod mongo;
pub mod schemas;

pub use mongo::{IntoIndexes, MongoClient, MongoCollection, MutMetadata};
