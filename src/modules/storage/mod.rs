//! Storage module for asset content
//!
//! Provides the [`ContentStore`] abstraction with a MinIO/S3-compatible
//! client and an in-memory implementation.

mod content_store;
mod minio_client;

pub use content_store::{sanitize_filename, ContentStore, InMemoryContentStore, StoredContent};
pub use minio_client::MinIOClient;
