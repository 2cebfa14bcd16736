use std::borrow::Cow;
use std::cmp::Ordering;

use chrono::NaiveDate;
use serde::Serialize;
use serde_json::Value;

use crate::dates::parse_stored_date;

/// Filter tree evaluated against top-level document fields.
#[derive(Debug, Clone, PartialEq)]
pub enum Where {
    /// Inclusive on both ends, compared on the calendar date of the stored value.
    DateBetween {
        field: String,
        start: NaiveDate,
        end: NaiveDate,
    },
    Equals {
        field: String,
        value: String,
    },
    /// Case-insensitive substring match.
    Like {
        field: String,
        pattern: String,
    },
    GreaterThan {
        field: String,
        value: String,
    },
    LessThan {
        field: String,
        value: String,
    },
    And(Vec<Where>),
    Or(Vec<Where>),
}

impl Where {
    pub fn date_between(field: &str, start: NaiveDate, end: NaiveDate) -> Self {
        Where::DateBetween {
            field: field.to_string(),
            start,
            end,
        }
    }

    pub fn equals(field: &str, value: impl Into<String>) -> Self {
        Where::Equals {
            field: field.to_string(),
            value: value.into(),
        }
    }

    pub fn like(field: &str, pattern: impl Into<String>) -> Self {
        Where::Like {
            field: field.to_string(),
            pattern: pattern.into(),
        }
    }

    pub fn greater_than(field: &str, value: impl Into<String>) -> Self {
        Where::GreaterThan {
            field: field.to_string(),
            value: value.into(),
        }
    }

    pub fn less_than(field: &str, value: impl Into<String>) -> Self {
        Where::LessThan {
            field: field.to_string(),
            value: value.into(),
        }
    }

    /// Collapses a list of clauses: none → `None`, one → itself, many → `And`.
    pub fn all(mut clauses: Vec<Where>) -> Option<Self> {
        match clauses.len() {
            0 => None,
            1 => clauses.pop(),
            _ => Some(Where::And(clauses)),
        }
    }

    pub fn matches(&self, doc: &Value) -> bool {
        match self {
            Where::DateBetween { field, start, end } => field_text(doc, field)
                .and_then(|raw| parse_stored_date(&raw))
                .map(|date| date >= *start && date <= *end)
                .unwrap_or(false),
            Where::Equals { field, value } => {
                field_text(doc, field).map_or(false, |text| text == value.as_str())
            }
            Where::Like { field, pattern } => field_text(doc, field).map_or(false, |text| {
                text.to_lowercase().contains(&pattern.to_lowercase())
            }),
            Where::GreaterThan { field, value } => {
                field_text(doc, field).map_or(false, |text| &*text > value.as_str())
            }
            Where::LessThan { field, value } => {
                field_text(doc, field).map_or(false, |text| &*text < value.as_str())
            }
            Where::And(clauses) => clauses.iter().all(|c| c.matches(doc)),
            Where::Or(clauses) => clauses.iter().any(|c| c.matches(doc)),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Sort {
    pub field: String,
    pub descending: bool,
}

impl Sort {
    pub fn asc(field: &str) -> Self {
        Self {
            field: field.to_string(),
            descending: false,
        }
    }

    pub fn desc(field: &str) -> Self {
        Self {
            field: field.to_string(),
            descending: true,
        }
    }

    /// Documents missing the field sort first in ascending order.
    pub fn compare(&self, a: &Value, b: &Value) -> Ordering {
        let ordering = field_text(a, &self.field).cmp(&field_text(b, &self.field));
        if self.descending {
            ordering.reverse()
        } else {
            ordering
        }
    }
}

#[derive(Debug, Clone)]
pub struct FindQuery {
    pub collection: String,
    pub filter: Option<Where>,
    pub sort: Option<Sort>,
    /// 1-based
    pub page: u32,
    /// 0 disables pagination and returns every match
    pub limit: u32,
}

impl FindQuery {
    pub fn new(collection: &str) -> Self {
        Self {
            collection: collection.to_string(),
            filter: None,
            sort: None,
            page: 1,
            limit: 0,
        }
    }

    pub fn filter(mut self, filter: Option<Where>) -> Self {
        self.filter = filter;
        self
    }

    pub fn sort(mut self, sort: Sort) -> Self {
        self.sort = Some(sort);
        self
    }

    pub fn page(mut self, page: u32) -> Self {
        self.page = page.max(1);
        self
    }

    pub fn limit(mut self, limit: u32) -> Self {
        self.limit = limit;
        self
    }

    /// Rows to skip before the requested page.
    pub fn offset(&self) -> u64 {
        if self.limit == 0 {
            0
        } else {
            (self.page.max(1) as u64 - 1) * self.limit as u64
        }
    }
}

/// One page of raw documents plus the paging totals reported by the store.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Page {
    pub docs: Vec<Value>,
    pub total_docs: u64,
    pub limit: u32,
    pub page: u32,
    pub total_pages: u32,
    pub has_next_page: bool,
    pub has_prev_page: bool,
}

impl Page {
    pub fn new(docs: Vec<Value>, total_docs: u64, page: u32, limit: u32) -> Self {
        let total_pages = if limit == 0 {
            u32::from(total_docs > 0)
        } else {
            total_docs.div_ceil(limit as u64) as u32
        };
        Self {
            docs,
            total_docs,
            limit,
            page,
            total_pages,
            has_next_page: page < total_pages,
            has_prev_page: page > 1,
        }
    }

    /// True while documents beyond this page remain, by the store's reported total.
    pub fn has_more(&self) -> bool {
        self.limit > 0 && (self.page as u64) * (self.limit as u64) < self.total_docs
    }
}

/// Text form of a top-level field, used for filtering and sorting.
pub fn field_text<'a>(doc: &'a Value, field: &str) -> Option<Cow<'a, str>> {
    match doc.get(field)? {
        Value::String(s) => Some(Cow::Borrowed(s.as_str())),
        Value::Number(n) => Some(Cow::Owned(n.to_string())),
        Value::Bool(b) => Some(Cow::Owned(b.to_string())),
        _ => None,
    }
}
