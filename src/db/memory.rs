use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;
use tokio::sync::RwLock;

use super::{DocumentStore, FindQuery, Page, StoreError};

/// In-process document store. Backs development runs without Postgres and every test.
#[derive(Clone, Default)]
pub struct MemoryStore {
    collections: Arc<RwLock<HashMap<String, Vec<Value>>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parses a seed document of the form `{ "<collection>": [doc, ...] }`.
    pub fn from_seed_json(raw: &str) -> Result<Self, StoreError> {
        let collections: HashMap<String, Vec<Value>> = serde_json::from_str(raw)?;
        Ok(Self {
            collections: Arc::new(RwLock::new(collections)),
        })
    }

    pub async fn from_seed_file(path: &Path) -> Result<Self, StoreError> {
        let raw = tokio::fs::read_to_string(path).await?;
        let store = Self::from_seed_json(&raw)?;
        tracing::info!(
            path = %path.display(),
            documents = store.len().await,
            "Seeded in-memory document store"
        );
        Ok(store)
    }

    pub async fn insert_many(&self, collection: &str, docs: impl IntoIterator<Item = Value>) {
        self.collections
            .write()
            .await
            .entry(collection.to_string())
            .or_default()
            .extend(docs);
    }

    /// Total documents across all collections.
    pub async fn len(&self) -> usize {
        self.collections.read().await.values().map(Vec::len).sum()
    }
}

#[async_trait]
impl DocumentStore for MemoryStore {
    async fn find(&self, query: FindQuery) -> Result<Page, StoreError> {
        let collections = self.collections.read().await;
        let Some(docs) = collections.get(&query.collection) else {
            return Ok(Page::new(Vec::new(), 0, query.page, query.limit));
        };

        let mut matched: Vec<&Value> = docs
            .iter()
            .filter(|doc| query.filter.as_ref().map_or(true, |f| f.matches(doc)))
            .collect();
        if let Some(sort) = &query.sort {
            // Stable, so ties keep insertion order
            matched.sort_by(|a, b| sort.compare(a, b));
        }

        let total = matched.len() as u64;
        let offset = query.offset() as usize;
        let page_docs: Vec<Value> = if query.limit == 0 {
            matched.into_iter().cloned().collect()
        } else {
            matched
                .into_iter()
                .skip(offset)
                .take(query.limit as usize)
                .cloned()
                .collect()
        };

        Ok(Page::new(page_docs, total, query.page, query.limit))
    }

    fn backend(&self) -> &'static str {
        "memory"
    }
}
