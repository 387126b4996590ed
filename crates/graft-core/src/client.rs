//! Query entry points
//!
//! The `Client` ties a [`ContentSource`] to the resolution pipeline:
//!
//! ```text
//! payload → LinkIndex::build → EntryResolver → (locale "*") flatten_locales
//! ```
//!
//! ## Usage
//!
//! ```ignore
//! let client = Client::new(source);
//!
//! let post = client.get_model("e1").await?;
//! println!("{}", post.to_json()[0]);
//!
//! let page = client
//!     .get_models(Query::new().content_type("post").all_locales(), QueryOptions::default())
//!     .await?;
//! ```

use std::sync::Arc;

use serde_json::Value;
use tracing::{debug, info};

use crate::error::{ResolveError, ResolveResult};
use crate::graph::{ContentGraph, Model, ModelId};
use crate::index::LinkIndex;
use crate::locale::flatten_locales;
use crate::media::{Diagnostics, MediaResolver, MediaTransform, TracingDiagnostics};
use crate::query::{Query, QueryResult};
use crate::resolver::EntryResolver;
use crate::source::ContentSource;

/// Per-query options
#[derive(Clone, Default)]
pub struct QueryOptions {
    /// Hook applied to every resolved media descriptor
    pub media_transform: Option<Arc<dyn MediaTransform>>,
}

impl QueryOptions {
    pub fn with_media_transform(mut self, transform: Arc<dyn MediaTransform>) -> Self {
        self.media_transform = Some(transform);
        self
    }
}

/// A resolved graph and the top-level models of a query
#[derive(Debug, Clone)]
pub struct Resolution {
    graph: ContentGraph,
    roots: Vec<ModelId>,
}

impl Resolution {
    pub fn new(graph: ContentGraph, roots: Vec<ModelId>) -> Self {
        Self { graph, roots }
    }

    pub fn graph(&self) -> &ContentGraph {
        &self.graph
    }

    /// Top-level model handles, in item order
    pub fn roots(&self) -> &[ModelId] {
        &self.roots
    }

    /// Top-level models, in item order
    pub fn models(&self) -> impl Iterator<Item = &Model> + '_ {
        self.roots.iter().map(|id| self.graph.model(*id))
    }

    pub fn len(&self) -> usize {
        self.roots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.roots.is_empty()
    }

    /// Expand every top-level model into nested JSON
    pub fn to_json(&self) -> Vec<Value> {
        self.roots.iter().map(|id| self.graph.expand(*id)).collect()
    }
}

/// Items of a query result
#[derive(Debug, Clone)]
pub enum QueryItems {
    /// Single-locale query: the resolved graph
    Models(Resolution),
    /// Multi-locale query: locale code → flattened models
    Localized(indexmap::IndexMap<String, Vec<Value>>),
}

impl QueryItems {
    /// Render the items as JSON
    pub fn to_json(&self) -> Value {
        match self {
            QueryItems::Models(resolution) => Value::Array(resolution.to_json()),
            QueryItems::Localized(by_locale) => Value::Object(
                by_locale
                    .iter()
                    .map(|(locale, models)| (locale.clone(), Value::Array(models.clone())))
                    .collect(),
            ),
        }
    }
}

/// Resolves queries against a content source
pub struct Client<S> {
    source: S,
    diagnostics: Arc<dyn Diagnostics>,
}

impl<S: ContentSource> Client<S> {
    /// Create a client reporting swallowed failures through `tracing`
    pub fn new(source: S) -> Self {
        Self {
            source,
            diagnostics: Arc::new(TracingDiagnostics),
        }
    }

    /// Set the diagnostics sink for swallowed failures
    pub fn with_diagnostics(mut self, diagnostics: Arc<dyn Diagnostics>) -> Self {
        self.diagnostics = diagnostics;
        self
    }

    /// Get the content source
    pub fn source(&self) -> &S {
        &self.source
    }

    /// Resolve a single record by ID
    pub async fn get_model(&self, id: &str) -> ResolveResult<Resolution> {
        self.get_model_with(id, QueryOptions::default()).await
    }

    /// Resolve a single record by ID with explicit options
    pub async fn get_model_with(
        &self,
        id: &str,
        options: QueryOptions,
    ) -> ResolveResult<Resolution> {
        let result = self.get_models(Query::by_id(id), options).await?;

        match result.items {
            QueryItems::Models(resolution) if !resolution.is_empty() => Ok(resolution),
            _ => Err(ResolveError::NotFound { id: id.to_string() }),
        }
    }

    /// Resolve a page of records
    ///
    /// `select` is widened with the system fields. A `*` locale resolves every
    /// locale and returns one flattened model list per locale.
    pub async fn get_models(
        &self,
        query: Query,
        options: QueryOptions,
    ) -> ResolveResult<QueryResult<QueryItems>> {
        let query = query.with_system_fields();
        let multi_locale = query.is_multi_locale();

        let payload = self.source.fetch_entries(&query).await?;
        let item_ids = payload.item_ids();
        let (skip, limit, total) = (payload.skip, payload.limit, payload.total);
        debug!(
            "Fetched {} items ({} assets, {} entries included)",
            payload.items.len(),
            payload.includes.assets.len(),
            payload.includes.entries.len()
        );

        let media = MediaResolver::new()
            .with_transform(options.media_transform)
            .with_diagnostics(self.diagnostics.clone());
        let index = LinkIndex::build(payload, multi_locale, &media).await?;

        let mut resolver = EntryResolver::new(index, multi_locale);
        let roots = resolver.resolve_items(&item_ids);
        let graph = resolver.into_graph();

        let items = if multi_locale {
            let catalog = self.source.fetch_locales().await?;
            info!(
                "Flattening {} models into {} locales",
                roots.len(),
                catalog.items.len()
            );
            QueryItems::Localized(flatten_locales(&catalog.items, &graph, &roots))
        } else {
            QueryItems::Models(Resolution::new(graph, roots))
        };

        Ok(QueryResult {
            items,
            skip,
            limit,
            total,
        })
    }
}
