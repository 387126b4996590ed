//! Queries and query results

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// Locale value that requests every locale at once
pub const ALL_LOCALES: &str = "*";

/// System fields every `select` is widened with
///
/// Resolved models always report `id`, `type` and `updatedAt`, and the type
/// is read from the content type link.
pub const SYSTEM_FIELDS: [&str; 4] = ["sys.id", "sys.type", "sys.updatedAt", "sys.contentType"];

/// Filter key used for single-record lookups
pub const ID_FILTER: &str = "sys.id";

/// An entries query forwarded to a content source
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Query {
    /// Restrict to one content type
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content_type: Option<String>,
    /// Field paths to return (empty means all fields)
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub select: Vec<String>,
    /// Locale code, or `*` for every locale
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub locale: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub skip: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub limit: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub order: Option<String>,
    /// Link depth the source should include
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub include: Option<u8>,
    /// Free-form filters (`fields.slug` → `hello-world`)
    #[serde(default, skip_serializing_if = "IndexMap::is_empty")]
    pub filters: IndexMap<String, String>,
}

impl Query {
    pub fn new() -> Self {
        Self::default()
    }

    /// A one-item query for a record ID
    pub fn by_id(id: impl Into<String>) -> Self {
        Self::new().filter(ID_FILTER, id).limit(1)
    }

    pub fn content_type(mut self, content_type: impl Into<String>) -> Self {
        self.content_type = Some(content_type.into());
        self
    }

    pub fn select<I, S>(mut self, fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.select = fields.into_iter().map(Into::into).collect();
        self
    }

    pub fn locale(mut self, locale: impl Into<String>) -> Self {
        self.locale = Some(locale.into());
        self
    }

    /// Request every locale (multi-locale mode)
    pub fn all_locales(self) -> Self {
        self.locale(ALL_LOCALES)
    }

    pub fn skip(mut self, skip: u64) -> Self {
        self.skip = Some(skip);
        self
    }

    pub fn limit(mut self, limit: u64) -> Self {
        self.limit = Some(limit);
        self
    }

    pub fn order(mut self, order: impl Into<String>) -> Self {
        self.order = Some(order.into());
        self
    }

    pub fn include(mut self, depth: u8) -> Self {
        self.include = Some(depth);
        self
    }

    /// Add a filter
    pub fn filter(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.filters.insert(key.into(), value.into());
        self
    }

    /// Check if this query runs in multi-locale mode
    pub fn is_multi_locale(&self) -> bool {
        self.locale.as_deref() == Some(ALL_LOCALES)
    }

    /// Widen a non-empty `select` with the system fields
    ///
    /// An empty `select` already returns everything and is left alone.
    pub fn with_system_fields(mut self) -> Self {
        if self.select.is_empty() {
            return self;
        }
        for field in SYSTEM_FIELDS.iter().rev() {
            if !self.select.iter().any(|s| s == field) {
                self.select.insert(0, field.to_string());
            }
        }
        self
    }
}

/// One page of resolved items with its pagination echo
#[derive(Debug, Clone, Serialize)]
pub struct QueryResult<T> {
    pub items: T,
    pub skip: u64,
    pub limit: u64,
    pub total: u64,
}
