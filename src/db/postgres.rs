use async_trait::async_trait;
use serde_json::Value;
use sqlx::types::Json;
use sqlx::{PgPool, Postgres, QueryBuilder};

use super::{DocumentStore, FindQuery, Page, StoreError, Where};
use crate::dates::format_date_only;

/// Documents live in one `documents` table as JSONB, keyed by collection and id.
#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl DocumentStore for PgStore {
    async fn find(&self, query: FindQuery) -> Result<Page, StoreError> {
        let mut count = QueryBuilder::<Postgres>::new("SELECT COUNT(*) FROM documents");
        push_scope(&mut count, &query);
        let total_docs: i64 = count
            .build_query_scalar::<i64>()
            .fetch_one(&self.pool)
            .await?;

        let mut select = QueryBuilder::<Postgres>::new("SELECT data FROM documents");
        push_scope(&mut select, &query);
        match &query.sort {
            Some(sort) => {
                select.push(" ORDER BY (data ->> ");
                select.push_bind(sort.field.clone());
                select.push(r#") COLLATE "C""#);
                select.push(if sort.descending {
                    " DESC NULLS LAST"
                } else {
                    " ASC NULLS FIRST"
                });
                select.push(", id ASC");
            }
            None => {
                select.push(" ORDER BY id ASC");
            }
        }
        if query.limit > 0 {
            select.push(" LIMIT ");
            select.push_bind(query.limit as i64);
            select.push(" OFFSET ");
            select.push_bind(query.offset() as i64);
        }

        let docs: Vec<Value> = select
            .build_query_scalar::<Json<Value>>()
            .fetch_all(&self.pool)
            .await?
            .into_iter()
            .map(|Json(doc)| doc)
            .collect();

        tracing::trace!(
            collection = %query.collection,
            page = query.page,
            returned = docs.len(),
            total_docs,
            "Fetched document page"
        );

        Ok(Page::new(
            docs,
            total_docs.max(0) as u64,
            query.page,
            query.limit,
        ))
    }

    fn backend(&self) -> &'static str {
        "postgres"
    }
}

fn push_scope(qb: &mut QueryBuilder<'_, Postgres>, query: &FindQuery) {
    qb.push(" WHERE collection = ");
    qb.push_bind(query.collection.clone());
    if let Some(filter) = &query.filter {
        qb.push(" AND ");
        push_where(qb, filter);
    }
}

fn push_where(qb: &mut QueryBuilder<'_, Postgres>, filter: &Where) {
    match filter {
        // Stored dates are UTC ISO strings, so the first ten characters are the day.
        Where::DateBetween { field, start, end } => {
            qb.push("LEFT(data ->> ");
            qb.push_bind(field.clone());
            qb.push(", 10) BETWEEN ");
            qb.push_bind(format_date_only(*start));
            qb.push(" AND ");
            qb.push_bind(format_date_only(*end));
        }
        Where::Equals { field, value } => {
            qb.push("(data ->> ");
            qb.push_bind(field.clone());
            qb.push(") = ");
            qb.push_bind(value.clone());
        }
        Where::Like { field, pattern } => {
            qb.push("(data ->> ");
            qb.push_bind(field.clone());
            qb.push(") ILIKE ");
            qb.push_bind(format!("%{}%", escape_like(pattern)));
        }
        Where::GreaterThan { field, value } => {
            qb.push("(data ->> ");
            qb.push_bind(field.clone());
            qb.push(r#") COLLATE "C" > "#);
            qb.push_bind(value.clone());
        }
        Where::LessThan { field, value } => {
            qb.push("(data ->> ");
            qb.push_bind(field.clone());
            qb.push(r#") COLLATE "C" < "#);
            qb.push_bind(value.clone());
        }
        Where::And(clauses) => push_group(qb, clauses, " AND ", "TRUE"),
        Where::Or(clauses) => push_group(qb, clauses, " OR ", "FALSE"),
    }
}

fn push_group(
    qb: &mut QueryBuilder<'_, Postgres>,
    clauses: &[Where],
    separator: &str,
    empty: &str,
) {
    if clauses.is_empty() {
        qb.push(empty);
        return;
    }
    qb.push("(");
    for (i, clause) in clauses.iter().enumerate() {
        if i > 0 {
            qb.push(separator);
        }
        push_where(qb, clause);
    }
    qb.push(")");
}

fn escape_like(pattern: &str) -> String {
    let mut escaped = String::with_capacity(pattern.len());
    for c in pattern.chars() {
        if matches!(c, '\\' | '%' | '_') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}
