//! Content sources
//!
//! A [`ContentSource`] delivers already-fetched payloads; pagination,
//! transport and authentication are its business, not the resolver's.

use anyhow::Result;
use async_trait::async_trait;

use crate::models::{LocaleCatalog, Payload};
use crate::query::{Query, ID_FILTER};

/// Supplies raw payloads and the locale catalog
#[async_trait]
pub trait ContentSource: Send + Sync {
    /// Fetch one page of entries matching `query`
    async fn fetch_entries(&self, query: &Query) -> Result<Payload>;

    /// Fetch the locales declared by the space
    async fn fetch_locales(&self) -> Result<LocaleCatalog>;
}

/// A source serving a fixed payload
///
/// Only the `sys.id` filter is honoured; every other query parameter is
/// ignored. Used for offline payload files and tests.
#[derive(Debug, Clone, Default)]
pub struct StaticSource {
    payload: Payload,
    locales: LocaleCatalog,
}

impl StaticSource {
    pub fn new(payload: Payload, locales: LocaleCatalog) -> Self {
        Self { payload, locales }
    }
}

#[async_trait]
impl ContentSource for StaticSource {
    async fn fetch_entries(&self, query: &Query) -> Result<Payload> {
        let mut payload = self.payload.clone();
        if let Some(id) = query.filters.get(ID_FILTER) {
            payload.items.retain(|item| item.id() == id);
            payload.total = payload.items.len() as u64;
        }
        Ok(payload)
    }

    async fn fetch_locales(&self) -> Result<LocaleCatalog> {
        Ok(self.locales.clone())
    }
}
