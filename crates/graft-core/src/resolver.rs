//! Entry resolution
//!
//! Walks deferred entries field by field and dereferences links through the
//! [`LinkIndex`]. Each record is resolved at most once: the slot moves
//! `Deferred → Resolving → Resolved` and every later reference reuses the
//! same [`ModelId`].
//!
//! ## Cycles
//!
//! A deferred reference allocates its model and marks the slot `Resolving`
//! before any field is visited; the record itself is queued. A reference
//! back to a record that is still resolving returns the in-progress model
//! instead of descending again, so `A → B → A` terminates with both models
//! pointing at each other.
//!
//! Queued records are drained in a loop, so the call stack does not grow
//! with the depth of a link chain.
//!
//! ## Omission
//!
//! Unknown IDs, missing locale variants and JSON `null` resolve to nothing.
//! Such fields are left out of the model; such sequence elements are
//! dropped.

use std::collections::VecDeque;

use indexmap::IndexMap;
use serde_json::Value;
use tracing::debug;

use crate::graph::{ContentGraph, ModelId, Node};
use crate::index::{LinkIndex, LinkSlot};
use crate::models::{FieldValue, LinkRef, RawRecord};

/// Resolves entries against one query's link index
pub struct EntryResolver {
    index: LinkIndex,
    multi_locale: bool,
    /// Models allocated but whose fields are not resolved yet
    pending: VecDeque<(ModelId, RawRecord)>,
}

impl EntryResolver {
    pub fn new(index: LinkIndex, multi_locale: bool) -> Self {
        Self {
            index,
            multi_locale,
            pending: VecDeque::new(),
        }
    }

    /// Resolve the top-level items, in order
    ///
    /// IDs that do not resolve to an entry (assets, unknown IDs) are skipped.
    pub fn resolve_items(&mut self, ids: &[String]) -> Vec<ModelId> {
        let roots: Vec<ModelId> = ids
            .iter()
            .filter_map(|id| match self.resolve_reference(&LinkRef::entry(id.as_str()), None) {
                Some(Node::Entry(model)) => Some(model),
                _ => None,
            })
            .collect();

        debug!(
            "Resolved {} of {} items ({} models)",
            roots.len(),
            ids.len(),
            self.index.graph().model_count()
        );
        roots
    }

    /// Resolve every field of a raw entry
    pub fn resolve_entry(&mut self, record: &RawRecord) -> IndexMap<String, Node> {
        let fields = self.entry_fields(record);
        self.drain();
        fields
    }

    /// Resolve one field value
    ///
    /// The locale is passed down to references so localized media resolve to
    /// the matching variant.
    pub fn resolve_field_value_at_locale(
        &mut self,
        value: &FieldValue,
        locale: Option<&str>,
    ) -> Option<Node> {
        let node = self.field_value(value, locale);
        self.drain();
        node
    }

    /// Dereference a link
    ///
    /// Returns `None` for IDs missing from the index (broken or unpublished
    /// links) and for localized media without a variant for `locale`.
    pub fn resolve_reference(&mut self, link: &LinkRef, locale: Option<&str>) -> Option<Node> {
        let node = self.reference(link, locale);
        self.drain();
        node
    }

    /// Finish resolution, keeping the graph
    pub fn into_graph(mut self) -> ContentGraph {
        self.drain();
        self.index.into_graph()
    }

    /// Resolve the fields of every queued model
    fn drain(&mut self) {
        while let Some((model_id, record)) = self.pending.pop_front() {
            let fields = self.entry_fields(&record);
            self.index.graph_mut().model_mut(model_id).fields = fields;
            self.index.complete_resolution(record.id(), model_id);
        }
    }

    fn entry_fields(&mut self, record: &RawRecord) -> IndexMap<String, Node> {
        let mut fields = IndexMap::new();

        for (key, raw) in &record.fields {
            let resolved = if self.multi_locale {
                self.localized_field(raw)
            } else {
                self.field_value(&FieldValue::from_json(raw), None)
            };

            if let Some(node) = resolved {
                fields.insert(key.clone(), node);
            }
        }

        fields
    }

    /// Resolve a multi-locale field, keeping only locales that yield a value
    fn localized_field(&mut self, raw: &Value) -> Option<Node> {
        let value = FieldValue::from_localized_json(raw);
        self.field_value(&value, None)
    }

    fn field_value(&mut self, value: &FieldValue, locale: Option<&str>) -> Option<Node> {
        match value {
            FieldValue::Sequence(items) => Some(Node::List(
                items
                    .iter()
                    .filter_map(|item| self.field_value(item, locale))
                    .collect(),
            )),
            FieldValue::Reference(link) => self.reference(link, locale),
            FieldValue::Scalar(Value::Null) => None,
            FieldValue::Scalar(value) => Some(Node::Scalar(value.clone())),
            FieldValue::Locales(by_locale) => {
                let variants: IndexMap<String, Node> = by_locale
                    .iter()
                    .filter_map(|(code, value)| {
                        self.field_value(value, Some(code.as_str()))
                            .map(|node| (code.clone(), node))
                    })
                    .collect();
                (!variants.is_empty()).then_some(Node::Locales(variants))
            }
        }
    }

    fn reference(&mut self, link: &LinkRef, locale: Option<&str>) -> Option<Node> {
        match self.index.get(&link.id)? {
            LinkSlot::Deferred(_) => {}
            LinkSlot::Resolving(model) => return Some(Node::Entry(*model)),
            LinkSlot::Resolved(target) => return target.at_locale(locale),
        }

        let (model_id, record) = self.index.begin_resolution(&link.id)?;
        self.pending.push_back((model_id, record));
        Some(Node::Entry(model_id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::media::ResolvedAsset;
    use serde_json::json;

    fn link(kind: &str, id: &str) -> Value {
        json!({"sys": {"type": "Link", "linkType": kind, "id": id}})
    }

    fn record(id: &str, fields: Value) -> RawRecord {
        serde_json::from_value(json!({
            "sys": {
                "id": id,
                "type": "Entry",
                "contentType": {"sys": {"type": "Link", "linkType": "ContentType", "id": "post"}}
            },
            "fields": fields
        }))
        .unwrap()
    }

    fn resolver(records: Vec<RawRecord>, multi_locale: bool) -> EntryResolver {
        let mut index = LinkIndex::new();
        for r in records {
            index.insert_deferred(r);
        }
        EntryResolver::new(index, multi_locale)
    }

    #[test]
    fn test_scalars_pass_through() {
        let mut resolver = resolver(
            vec![record(
                "e1",
                json!({"title": "Hi", "views": 3, "draft": false, "location": {"lat": 1.5, "lon": 2.5}}),
            )],
            false,
        );

        let roots = resolver.resolve_items(&["e1".to_string()]);
        let graph = resolver.into_graph();
        let model = graph.model(roots[0]);

        assert_eq!(model.id, "e1");
        assert_eq!(model.model_type, "post");
        assert_eq!(model.field("title"), Some(&Node::Scalar(json!("Hi"))));
        assert_eq!(model.field("views"), Some(&Node::Scalar(json!(3))));
        assert_eq!(model.field("draft"), Some(&Node::Scalar(json!(false))));
        assert_eq!(
            model.field("location"),
            Some(&Node::Scalar(json!({"lat": 1.5, "lon": 2.5})))
        );
    }

    #[test]
    fn test_idempotent_resolution() {
        let mut resolver = resolver(
            vec![
                record("e1", json!({"author": link("Entry", "p1"), "editor": link("Entry", "p1")})),
                record("e2", json!({"author": link("Entry", "p1")})),
                record("p1", json!({"name": "Ada"})),
            ],
            false,
        );

        let roots = resolver.resolve_items(&["e1".to_string(), "e2".to_string()]);
        let graph = resolver.into_graph();

        let first = graph.model(roots[0]);
        let second = graph.model(roots[1]);
        let Some(Node::Entry(author)) = first.field("author") else {
            panic!("author should resolve");
        };
        assert_eq!(first.field("editor"), Some(&Node::Entry(*author)));
        assert_eq!(second.field("author"), Some(&Node::Entry(*author)));

        // p1 resolved once: three models in total
        assert_eq!(graph.model_count(), 3);
    }

    #[test]
    fn test_missing_link_is_omitted() {
        let mut resolver = resolver(
            vec![record("e1", json!({"title": "Hi", "related": link("Entry", "gone"), "note": null}))],
            false,
        );

        let roots = resolver.resolve_items(&["e1".to_string()]);
        let graph = resolver.into_graph();
        let model = graph.model(roots[0]);

        assert!(model.field("related").is_none());
        assert!(model.field("note").is_none());
        assert_eq!(model.fields.len(), 1);
    }

    #[test]
    fn test_array_compaction() {
        let mut resolver = resolver(
            vec![
                record(
                    "e1",
                    json!({"related": [link("Entry", "e2"), link("Entry", "gone")]}),
                ),
                record("e2", json!({"title": "Second"})),
            ],
            false,
        );

        let roots = resolver.resolve_items(&["e1".to_string()]);
        let graph = resolver.into_graph();
        let Some(Node::List(related)) = graph.model(roots[0]).field("related") else {
            panic!("related should be a list");
        };

        assert_eq!(related.len(), 1);
        let Node::Entry(second) = related[0] else {
            panic!("expected an entry");
        };
        assert_eq!(graph.model(second).id, "e2");
    }

    #[test]
    fn test_cycle_terminates() {
        let mut resolver = resolver(
            vec![
                record("e1", json!({"title": "One", "next": link("Entry", "e2")})),
                record("e2", json!({"title": "Two", "next": link("Entry", "e1")})),
            ],
            false,
        );

        let roots = resolver.resolve_items(&["e1".to_string(), "e2".to_string()]);
        let graph = resolver.into_graph();

        assert_eq!(graph.model_count(), 2);
        let (one, two) = (roots[0], roots[1]);
        assert_eq!(graph.model(one).field("next"), Some(&Node::Entry(two)));
        assert_eq!(graph.model(two).field("next"), Some(&Node::Entry(one)));
        // The back-reference shares the fully populated model
        assert_eq!(
            graph.model(one).field("title"),
            Some(&Node::Scalar(json!("One")))
        );
    }

    #[test]
    fn test_self_reference() {
        let mut resolver = resolver(vec![record("e1", json!({"parent": link("Entry", "e1")}))], false);

        let roots = resolver.resolve_items(&["e1".to_string()]);
        let graph = resolver.into_graph();
        assert_eq!(graph.model(roots[0]).field("parent"), Some(&Node::Entry(roots[0])));
    }

    #[test]
    fn test_multi_locale_fields() {
        let mut index = LinkIndex::new();
        let mut variants = IndexMap::new();
        variants.insert("en-US".to_string(), json!({"url": "/en.png"}));
        index.insert_asset("a1", ResolvedAsset::Localized(variants));
        index.insert_deferred(record(
            "e1",
            json!({
                "title": {"en-US": "Hello", "fr": "Bonjour"},
                "hero": {"en-US": link("Asset", "a1"), "fr": link("Asset", "a1")},
                "related": {"en-US": link("Entry", "gone")}
            }),
        ));

        let mut resolver = EntryResolver::new(index, true);
        let roots = resolver.resolve_items(&["e1".to_string()]);
        let graph = resolver.into_graph();
        let model = graph.model(roots[0]);

        let Some(Node::Locales(title)) = model.field("title") else {
            panic!("title should be localized");
        };
        assert_eq!(title["fr"], Node::Scalar(json!("Bonjour")));

        // Only the variant that exists survives
        let Some(Node::Locales(hero)) = model.field("hero") else {
            panic!("hero should be localized");
        };
        assert_eq!(hero.len(), 1);
        let Node::Media(media) = hero["en-US"] else {
            panic!("expected media");
        };
        assert_eq!(graph.media(media)["url"], json!("/en.png"));

        // No locale resolved: field omitted
        assert!(model.field("related").is_none());
    }

    #[test]
    fn test_long_link_chain() {
        let depth = 100_000;
        let records = (0..depth)
            .map(|i| {
                let fields = if i + 1 < depth {
                    json!({"n": i, "next": link("Entry", &format!("e{}", i + 1))})
                } else {
                    json!({"n": i})
                };
                record(&format!("e{}", i), fields)
            })
            .collect();
        let mut resolver = resolver(records, false);

        let roots = resolver.resolve_items(&["e0".to_string()]);
        let graph = resolver.into_graph();
        assert_eq!(graph.model_count(), depth);

        // Walk to the end of the chain; every link is populated
        let mut current = roots[0];
        for _ in 1..depth {
            let Some(Node::Entry(next)) = graph.model(current).field("next") else {
                panic!("chain broken at {}", graph.model(current).id);
            };
            current = *next;
        }
        assert_eq!(
            graph.model(current).field("n"),
            Some(&Node::Scalar(json!(depth - 1)))
        );
    }

    #[test]
    fn test_resolve_reference_populates_target() {
        let mut resolver = resolver(
            vec![
                record("e1", json!({"next": link("Entry", "e2")})),
                record("e2", json!({"title": "Two"})),
            ],
            false,
        );

        let Some(Node::Entry(one)) = resolver.resolve_reference(&LinkRef::entry("e1"), None) else {
            panic!("e1 should resolve");
        };
        let graph = resolver.into_graph();
        let Some(Node::Entry(two)) = graph.model(one).field("next") else {
            panic!("next should resolve");
        };
        assert_eq!(graph.model(*two).field("title"), Some(&Node::Scalar(json!("Two"))));
    }

    #[test]
    fn test_top_level_asset_id_is_skipped() {
        let mut index = LinkIndex::new();
        index.insert_asset("a1", ResolvedAsset::Single(json!({"url": "/x.png"})));
        let mut resolver = EntryResolver::new(index, false);

        assert!(resolver.resolve_items(&["a1".to_string()]).is_empty());
    }
}
