//! Read-only access to the document collections the CMS writes.

use async_trait::async_trait;

pub mod memory;
pub mod pool;
pub mod postgres;
pub mod query;

pub use memory::MemoryStore;
pub use postgres::PgStore;
pub use query::{FindQuery, Page, Sort, Where};

pub const DAY_ENTRIES: &str = "day-entries";
pub const GARMIN_DIVES: &str = "garmin-dives";

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("invalid document JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("seed file: {0}")]
    Io(#[from] std::io::Error),

    #[error("{0}")]
    Backend(String),
}

/// Paginated lookup over a named collection.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    async fn find(&self, query: FindQuery) -> Result<Page, StoreError>;

    /// Name used in logs and readiness output.
    fn backend(&self) -> &'static str;
}
