//! Content store abstraction for uploaded asset bytes
//!
//! The catalog only keeps an opaque reference to stored content. Production
//! deployments use [`super::MinIOClient`]; [`InMemoryContentStore`] backs
//! tests and the `memory` content backend.

use std::collections::HashMap;
use std::sync::{PoisonError, RwLock};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::core::error::{AppError, Result};

/// Content fetched back from a store
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredContent {
    pub bytes: Vec<u8>,
    pub length: i64,
}

impl StoredContent {
    pub fn new(bytes: Vec<u8>) -> Self {
        let length = bytes.len() as i64;
        Self { bytes, length }
    }
}

#[async_trait]
pub trait ContentStore: Send + Sync {
    /// Store `bytes` and return the reference under which they can be fetched.
    ///
    /// `key_hint` is usually the original filename; stores are free to
    /// decorate it to keep references unique.
    async fn put(&self, key_hint: &str, bytes: Vec<u8>, content_type: &str) -> Result<String>;

    /// Fetch stored content, `None` when nothing lives under `content_ref`
    async fn get(&self, content_ref: &str) -> Result<Option<StoredContent>>;

    async fn exists(&self, content_ref: &str) -> Result<bool>;
}

/// Replace anything outside `[A-Za-z0-9._-]` so filenames are safe object keys
pub fn sanitize_filename(name: &str) -> String {
    let base = name.rsplit(['/', '\\']).next().unwrap_or(name);
    let cleaned: String = base
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '_') {
                c
            } else {
                '_'
            }
        })
        .collect();

    let trimmed = cleaned.trim_matches('.');
    if trimmed.is_empty() {
        "file".to_string()
    } else {
        trimmed.to_string()
    }
}

/// Build a date-partitioned object key: `{prefix}/YYYY/MM/DD/{uuid}-{filename}`
pub fn content_key(prefix: &str, key_hint: &str, now: DateTime<Utc>) -> String {
    format!(
        "{}/{}/{}-{}",
        prefix.trim_end_matches('/'),
        now.format("%Y/%m/%d"),
        Uuid::now_v7(),
        sanitize_filename(key_hint)
    )
}

fn poison_err<T>(_: PoisonError<T>) -> AppError {
    AppError::Internal("content store lock poisoned".to_string())
}

/// Process-local content store. Contents vanish with the process.
#[derive(Debug, Default)]
pub struct InMemoryContentStore {
    objects: RwLock<HashMap<String, StoredContent>>,
}

impl InMemoryContentStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Drop an object behind the catalog's back. Used to simulate drift.
    #[cfg(test)]
    pub fn evict(&self, content_ref: &str) {
        if let Ok(mut objects) = self.objects.write() {
            objects.remove(content_ref);
        }
    }
}

#[async_trait]
impl ContentStore for InMemoryContentStore {
    async fn put(&self, key_hint: &str, bytes: Vec<u8>, _content_type: &str) -> Result<String> {
        let key = content_key("assets", key_hint, Utc::now());
        self.objects
            .write()
            .map_err(poison_err)?
            .insert(key.clone(), StoredContent::new(bytes));
        Ok(key)
    }

    async fn get(&self, content_ref: &str) -> Result<Option<StoredContent>> {
        Ok(self
            .objects
            .read()
            .map_err(poison_err)?
            .get(content_ref)
            .cloned())
    }

    async fn exists(&self, content_ref: &str) -> Result<bool> {
        Ok(self
            .objects
            .read()
            .map_err(poison_err)?
            .contains_key(content_ref))
    }
}
