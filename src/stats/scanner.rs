use chrono::NaiveDate;
use serde::de::DeserializeOwned;

use crate::db::{DocumentStore, FindQuery, Sort, StoreError, Where};

/// Walks every document of a collection whose date falls in `[start, end]`,
/// page by page in ascending date order.
///
/// Paging stops once `page * limit` reaches the total the store reported for the
/// current page. The total is re-read on every page, so documents written during a
/// scan can be skipped or seen twice; the analytics endpoints accept that.
pub struct DateRangeScanner<'a> {
    store: &'a dyn DocumentStore,
    collection: &'a str,
    start: NaiveDate,
    end: NaiveDate,
    page_size: u32,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ScanSummary {
    pub pages: u32,
    pub visited: u64,
    /// Documents that did not deserialize into the requested type
    pub skipped: u64,
}

/// Document attribute holding the day a document belongs to.
const DATE_FIELD: &str = "date";

impl<'a> DateRangeScanner<'a> {
    pub fn new(
        store: &'a dyn DocumentStore,
        collection: &'a str,
        start: NaiveDate,
        end: NaiveDate,
        page_size: u32,
    ) -> Self {
        Self {
            store,
            collection,
            start,
            end,
            page_size,
        }
    }

    /// Deserializes each document as `T` and hands it to `visit`. Malformed
    /// documents are logged and skipped; store errors abort the scan.
    pub async fn for_each<T, F>(&self, mut visit: F) -> Result<ScanSummary, StoreError>
    where
        T: DeserializeOwned,
        F: FnMut(T),
    {
        let mut summary = ScanSummary::default();
        let mut page = 1u32;

        loop {
            let query = FindQuery::new(self.collection)
                .filter(Some(Where::date_between(DATE_FIELD, self.start, self.end)))
                .sort(Sort::asc(DATE_FIELD))
                .page(page)
                .limit(self.page_size);
            let result = self.store.find(query).await?;
            summary.pages += 1;
            let has_more = result.has_more();

            tracing::debug!(
                collection = self.collection,
                page,
                returned = result.docs.len(),
                total_docs = result.total_docs,
                "Scanned page"
            );

            for doc in result.docs {
                match serde_json::from_value::<T>(doc) {
                    Ok(item) => {
                        summary.visited += 1;
                        visit(item);
                    }
                    Err(e) => {
                        summary.skipped += 1;
                        tracing::warn!(
                            collection = self.collection,
                            error = %e,
                            "Skipping malformed document"
                        );
                    }
                }
            }

            if !has_more {
                break;
            }
            page += 1;
        }

        Ok(summary)
    }

    /// Collects one optional value per document, dropping the `None`s.
    pub async fn collect<T, V, F>(&self, mut extract: F) -> Result<Vec<V>, StoreError>
    where
        T: DeserializeOwned,
        F: FnMut(&T) -> Option<V>,
    {
        let mut values = Vec::new();
        self.for_each(|item: T| values.extend(extract(&item)))
            .await?;
        Ok(values)
    }
}
