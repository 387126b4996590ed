//! Link index
//!
//! Maps every record ID in a payload to a [`LinkSlot`]. Assets are resolved
//! while the index is built; entries are stored deferred and resolved on
//! first reference.
//!
//! ## Precedence
//!
//! Slots are written in the order included assets, included entries,
//! top-level items. A later write for the same ID replaces the earlier slot,
//! so top-level items win over their included copies. Top-level items that
//! are assets are resolved as media like included ones.

use std::collections::HashMap;

use futures_util::future::join_all;
use indexmap::IndexMap;
use tracing::debug;

use crate::error::ResolveResult;
use crate::graph::{ContentGraph, MediaId, Model, ModelId, Node};
use crate::media::{MediaResolver, ResolvedAsset};
use crate::models::{Includes, Payload, RawRecord};

/// Something a resolved slot points at
#[derive(Debug, Clone, PartialEq)]
pub enum Link {
    Entry(ModelId),
    Media(MediaId),
    /// Multi-locale asset: one media value per produced locale
    LocalizedMedia(IndexMap<String, MediaId>),
}

impl Link {
    /// The node a reference to this link resolves to
    ///
    /// With a locale, localized media is narrowed to that variant and a
    /// variant that was never produced yields `None`.
    pub fn at_locale(&self, locale: Option<&str>) -> Option<Node> {
        match (self, locale) {
            (Link::Entry(id), _) => Some(Node::Entry(*id)),
            (Link::Media(id), _) => Some(Node::Media(*id)),
            (Link::LocalizedMedia(variants), Some(locale)) => {
                variants.get(locale).map(|id| Node::Media(*id))
            }
            (Link::LocalizedMedia(variants), None) => Some(Node::Locales(
                variants
                    .iter()
                    .map(|(locale, id)| (locale.clone(), Node::Media(*id)))
                    .collect(),
            )),
        }
    }
}

/// Resolution state of one record
#[derive(Debug, Clone, PartialEq)]
pub enum LinkSlot {
    /// Raw record awaiting resolution
    Deferred(RawRecord),
    /// Fields are being resolved; the model already exists in the graph
    Resolving(ModelId),
    Resolved(Link),
}

/// ID → slot index plus the graph resolved values are stored in
#[derive(Debug, Default)]
pub struct LinkIndex {
    slots: HashMap<String, LinkSlot>,
    graph: ContentGraph,
}

impl LinkIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build the index for a payload
    ///
    /// Included assets and asset items are resolved concurrently through
    /// `media`. In single-locale mode the first failing asset (in payload
    /// order) fails the build.
    pub async fn build(
        payload: Payload,
        multi_locale: bool,
        media: &MediaResolver,
    ) -> ResolveResult<Self> {
        let Payload {
            items, includes, ..
        } = payload;
        let Includes {
            assets: included_assets,
            entries: included_entries,
        } = includes;
        let (item_assets, item_entries): (Vec<RawRecord>, Vec<RawRecord>) =
            items.into_iter().partition(RawRecord::is_asset);

        let assets: Vec<&RawRecord> = included_assets.iter().chain(&item_assets).collect();
        let resolved = join_all(
            assets
                .iter()
                .map(|asset| media.resolve_asset(asset, multi_locale)),
        )
        .await;
        let mut resolved = assets.into_iter().zip(resolved);

        let mut index = Self::new();
        for (asset, result) in resolved.by_ref().take(included_assets.len()) {
            index.insert_asset(asset.id(), result?);
        }
        for record in included_entries {
            index.insert_deferred(record);
        }
        for (asset, result) in resolved {
            index.insert_asset(asset.id(), result?);
        }
        for record in item_entries {
            index.insert_deferred(record);
        }

        debug!(
            "Built link index: {} slots, {} media",
            index.len(),
            index.graph.media_count()
        );
        Ok(index)
    }

    /// Store a resolved asset
    pub fn insert_asset(&mut self, id: &str, asset: ResolvedAsset) {
        let link = match asset {
            ResolvedAsset::Single(value) => Link::Media(self.graph.insert_media(value)),
            ResolvedAsset::Localized(variants) => Link::LocalizedMedia(
                variants
                    .into_iter()
                    .map(|(locale, value)| (locale, self.graph.insert_media(value)))
                    .collect(),
            ),
        };
        self.slots.insert(id.to_string(), LinkSlot::Resolved(link));
    }

    /// Store a record for later resolution
    pub fn insert_deferred(&mut self, record: RawRecord) {
        self.slots
            .insert(record.id().to_string(), LinkSlot::Deferred(record));
    }

    /// Get the slot for an ID
    pub fn get(&self, id: &str) -> Option<&LinkSlot> {
        self.slots.get(id)
    }

    /// Number of slots
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// Move a deferred slot to `Resolving`
    ///
    /// Allocates the model with its metadata and hands back the raw record
    /// whose fields still need resolving. Returns `None` unless the slot is
    /// `Deferred`.
    pub(crate) fn begin_resolution(&mut self, id: &str) -> Option<(ModelId, RawRecord)> {
        let slot = self.slots.get_mut(id)?;
        let LinkSlot::Deferred(record) = slot else {
            return None;
        };

        let model_id = self.graph.insert_model(Model::new(
            record.id(),
            record.model_type(),
            record.sys.updated_at,
        ));

        match std::mem::replace(slot, LinkSlot::Resolving(model_id)) {
            LinkSlot::Deferred(record) => Some((model_id, record)),
            _ => None,
        }
    }

    /// Mark a resolving slot as resolved
    pub(crate) fn complete_resolution(&mut self, id: &str, model_id: ModelId) {
        self.slots
            .insert(id.to_string(), LinkSlot::Resolved(Link::Entry(model_id)));
    }

    /// The graph resolved values are stored in
    pub fn graph(&self) -> &ContentGraph {
        &self.graph
    }

    pub(crate) fn graph_mut(&mut self) -> &mut ContentGraph {
        &mut self.graph
    }

    /// Consume the index, keeping the resolved graph
    pub fn into_graph(self) -> ContentGraph {
        self.graph
    }
}
