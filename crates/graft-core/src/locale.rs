//! Locale flattening
//!
//! Projects a multi-locale graph into one plain JSON tree per locale. At
//! every field the value for the target locale is used, falling back to the
//! default locale, and the field is left unset when neither exists.
//!
//! The walk is breadth-first over an explicit queue, so deeply nested content
//! does not grow the call stack. Output objects are allocated in a flat
//! arena while the queue drains and assembled into JSON at the end.
//!
//! Models reachable through several paths are copied once per path. A model
//! reached again inside its own subtree is written as an `{id, type}` stub.

use std::collections::VecDeque;

use indexmap::IndexMap;
use serde_json::{Map, Value};

use crate::graph::{ContentGraph, ModelId, Node};
use crate::models::{default_locale_code, Locale};

/// Flatten every root for every declared locale
///
/// Returns locale code → flattened roots, in declaration and root order.
pub fn flatten_locales(
    locales: &[Locale],
    graph: &ContentGraph,
    roots: &[ModelId],
) -> IndexMap<String, Vec<Value>> {
    let flattener = LocaleFlattener::new(graph, default_locale_code(locales));

    locales
        .iter()
        .map(|locale| {
            let models = roots
                .iter()
                .map(|root| flattener.flatten(*root, &locale.code))
                .collect();
            (locale.code.clone(), models)
        })
        .collect()
}

/// An output value under construction
enum Slot {
    Value(Value),
    /// Index into the object arena
    Object(usize),
    Array(Vec<Slot>),
}

/// A model waiting to be written into an arena object
struct Pending {
    out: usize,
    model: ModelId,
    ancestors: Vec<ModelId>,
}

/// Flattens models of one graph
pub struct LocaleFlattener<'g> {
    graph: &'g ContentGraph,
    default_locale: String,
}

impl<'g> LocaleFlattener<'g> {
    pub fn new(graph: &'g ContentGraph, default_locale: impl Into<String>) -> Self {
        Self {
            graph,
            default_locale: default_locale.into(),
        }
    }

    /// Flatten one model for one locale
    pub fn flatten(&self, root: ModelId, locale: &str) -> Value {
        let mut objects: Vec<Vec<(String, Slot)>> = vec![Vec::new()];
        let mut queue = VecDeque::new();
        queue.push_back(Pending {
            out: 0,
            model: root,
            ancestors: Vec::new(),
        });

        while let Some(Pending {
            out,
            model,
            mut ancestors,
        }) = queue.pop_front()
        {
            let source = self.graph.model(model);
            ancestors.push(model);

            let mut entries: Vec<(String, Slot)> = source
                .header()
                .into_iter()
                .map(|(key, value)| (key, Slot::Value(value)))
                .collect();

            for (key, node) in &source.fields {
                if let Some(selected) = self.select(node, locale) {
                    let slot = self.place(selected, locale, &ancestors, &mut objects, &mut queue);
                    entries.push((key.clone(), slot));
                }
            }

            objects[out] = entries;
        }

        assemble(Slot::Object(0), &mut objects)
    }

    /// Pick the value for `locale`, else the default locale
    fn select<'n>(&self, node: &'n Node, locale: &str) -> Option<&'n Node> {
        match node {
            Node::Locales(variants) => variants
                .get(locale)
                .or_else(|| variants.get(&self.default_locale)),
            other => Some(other),
        }
    }

    /// Turn a selected node into an output slot, queueing nested models
    fn place(
        &self,
        node: &Node,
        locale: &str,
        ancestors: &[ModelId],
        objects: &mut Vec<Vec<(String, Slot)>>,
        queue: &mut VecDeque<Pending>,
    ) -> Slot {
        match node {
            Node::Scalar(value) => Slot::Value(value.clone()),
            Node::Media(id) => Slot::Value(self.graph.media(*id).clone()),
            Node::Entry(id) if ancestors.contains(id) => {
                let model = self.graph.model(*id);
                let mut stub = Map::new();
                stub.insert("id".to_string(), Value::String(model.id.clone()));
                stub.insert("type".to_string(), Value::String(model.model_type.clone()));
                Slot::Value(Value::Object(stub))
            }
            Node::Entry(id) => {
                objects.push(Vec::new());
                let out = objects.len() - 1;
                queue.push_back(Pending {
                    out,
                    model: *id,
                    ancestors: ancestors.to_vec(),
                });
                Slot::Object(out)
            }
            Node::List(items) => Slot::Array(
                items
                    .iter()
                    .filter_map(|item| self.select(item, locale))
                    .map(|item| self.place(item, locale, ancestors, objects, queue))
                    .collect(),
            ),
            Node::Locales(_) => match self.select(node, locale) {
                Some(selected) => self.place(selected, locale, ancestors, objects, queue),
                None => Slot::Value(Value::Null),
            },
        }
    }
}

/// Build the final JSON out of the object arena
fn assemble(slot: Slot, objects: &mut Vec<Vec<(String, Slot)>>) -> Value {
    match slot {
        Slot::Value(value) => value,
        Slot::Object(index) => {
            let entries = std::mem::take(&mut objects[index]);
            Value::Object(
                entries
                    .into_iter()
                    .map(|(key, slot)| (key, assemble(slot, objects)))
                    .collect(),
            )
        }
        Slot::Array(items) => Value::Array(
            items
                .into_iter()
                .map(|slot| assemble(slot, objects))
                .collect(),
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::Model;
    use serde_json::json;

    fn localized(pairs: &[(&str, Node)]) -> Node {
        Node::Locales(
            pairs
                .iter()
                .map(|(locale, node)| (locale.to_string(), node.clone()))
                .collect(),
        )
    }

    fn scalar(value: Value) -> Node {
        Node::Scalar(value)
    }

    fn locales() -> Vec<Locale> {
        vec![Locale::default_locale("en-US"), Locale::new("fr")]
    }

    #[test]
    fn test_locale_fallback() {
        let mut graph = ContentGraph::new();
        let mut post = Model::new("e1", "post", None);
        post.fields.insert(
            "title".to_string(),
            localized(&[("en-US", scalar(json!("Hello"))), ("fr", scalar(json!("Bonjour")))]),
        );
        post.fields.insert(
            "slug".to_string(),
            localized(&[("en-US", scalar(json!("hello")))]),
        );
        let root = graph.insert_model(post);

        let flat = flatten_locales(&locales(), &graph, &[root]);

        assert_eq!(
            flat["en-US"],
            vec![json!({"id": "e1", "type": "post", "title": "Hello", "slug": "hello"})]
        );
        assert_eq!(
            flat["fr"],
            vec![json!({"id": "e1", "type": "post", "title": "Bonjour", "slug": "hello"})]
        );
    }

    #[test]
    fn test_missing_in_both_locales_is_unset() {
        let mut graph = ContentGraph::new();
        let mut post = Model::new("e1", "post", None);
        post.fields.insert(
            "subtitle".to_string(),
            localized(&[("de", scalar(json!("Hallo")))]),
        );
        let root = graph.insert_model(post);

        let flat = LocaleFlattener::new(&graph, "en-US").flatten(root, "fr");
        assert_eq!(flat, json!({"id": "e1", "type": "post"}));
    }

    #[test]
    fn test_nested_models_and_media() {
        let mut graph = ContentGraph::new();
        let en_logo = graph.insert_media(json!({"url": "/en.png"}));
        let fr_logo = graph.insert_media(json!({"url": "/fr.png"}));

        let mut tag_a = Model::new("t1", "tag", None);
        tag_a.fields.insert(
            "label".to_string(),
            localized(&[("en-US", scalar(json!("News"))), ("fr", scalar(json!("Actualités")))]),
        );
        let tag_a = graph.insert_model(tag_a);

        let mut tag_b = Model::new("t2", "tag", None);
        tag_b
            .fields
            .insert("label".to_string(), localized(&[("en-US", scalar(json!("Tech")))]));
        let tag_b = graph.insert_model(tag_b);

        let mut post = Model::new("e1", "post", None);
        post.fields.insert(
            "logo".to_string(),
            localized(&[("en-US", Node::Media(en_logo)), ("fr", Node::Media(fr_logo))]),
        );
        post.fields.insert(
            "tags".to_string(),
            localized(&[(
                "en-US",
                Node::List(vec![
                    Node::Entry(tag_a),
                    scalar(json!("loose")),
                    Node::Entry(tag_b),
                ]),
            )]),
        );
        let root = graph.insert_model(post);

        let flat = LocaleFlattener::new(&graph, "en-US").flatten(root, "fr");
        assert_eq!(
            flat,
            json!({
                "id": "e1",
                "type": "post",
                "logo": {"url": "/fr.png"},
                "tags": [
                    {"id": "t1", "type": "tag", "label": "Actualités"},
                    "loose",
                    {"id": "t2", "type": "tag", "label": "Tech"}
                ]
            })
        );
    }

    #[test]
    fn test_shared_model_copied_per_path() {
        let mut graph = ContentGraph::new();
        let mut author = Model::new("p1", "person", None);
        author
            .fields
            .insert("name".to_string(), localized(&[("en-US", scalar(json!("Ada")))]));
        let author = graph.insert_model(author);

        let mut post = Model::new("e1", "post", None);
        post.fields
            .insert("author".to_string(), localized(&[("en-US", Node::Entry(author))]));
        post.fields
            .insert("editor".to_string(), localized(&[("en-US", Node::Entry(author))]));
        let root = graph.insert_model(post);

        let flat = LocaleFlattener::new(&graph, "en-US").flatten(root, "en-US");
        assert_eq!(flat["author"], flat["editor"]);
        assert_eq!(flat["author"]["name"], json!("Ada"));
    }

    #[test]
    fn test_cycle_is_stubbed() {
        let mut graph = ContentGraph::new();
        let a = graph.insert_model(Model::new("e1", "page", None));
        let b = graph.insert_model(Model::new("e2", "page", None));
        graph
            .model_mut(a)
            .fields
            .insert("next".to_string(), localized(&[("en-US", Node::Entry(b))]));
        graph
            .model_mut(b)
            .fields
            .insert("next".to_string(), localized(&[("en-US", Node::Entry(a))]));

        let flat = flatten_locales(&locales(), &graph, &[a, b]);
        assert_eq!(
            flat["fr"][0],
            json!({
                "id": "e1",
                "type": "page",
                "next": {"id": "e2", "type": "page", "next": {"id": "e1", "type": "page"}}
            })
        );
        assert_eq!(flat["fr"].len(), 2);
    }

    #[test]
    fn test_output_per_declared_locale() {
        let mut graph = ContentGraph::new();
        let root = graph.insert_model(Model::new("e1", "post", None));

        let flat = flatten_locales(
            &[Locale::new("fr"), Locale::new("de")],
            &graph,
            &[root],
        );
        let codes: Vec<&str> = flat.keys().map(String::as_str).collect();
        assert_eq!(codes, vec!["fr", "de"]);
    }
}
