//! Resolved content graph
//!
//! Models and media live in an arena owned by [`ContentGraph`] and refer to
//! each other by index. Every referrer of a record holds the same
//! [`ModelId`], so shared records are shared by identity and reference
//! cycles are representable without reference counting.

use chrono::{DateTime, SecondsFormat, Utc};
use indexmap::IndexMap;
use serde_json::{Map, Value};

/// Handle to a resolved model inside a [`ContentGraph`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ModelId(usize);

/// Handle to a resolved media value inside a [`ContentGraph`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct MediaId(usize);

/// A resolved field value
#[derive(Debug, Clone, PartialEq)]
pub enum Node {
    /// Primitive or opaque JSON value, passed through unchanged
    Scalar(Value),
    /// A referenced entry
    Entry(ModelId),
    /// A referenced asset (descriptor or transformed value)
    Media(MediaId),
    /// Resolved sequence, unresolvable elements already dropped
    List(Vec<Node>),
    /// Per-locale values (multi-locale mode)
    Locales(IndexMap<String, Node>),
}

/// A resolved entry
#[derive(Debug, Clone, PartialEq)]
pub struct Model {
    pub id: String,
    pub model_type: String,
    pub updated_at: Option<DateTime<Utc>>,
    pub fields: IndexMap<String, Node>,
}

impl Model {
    /// Create a model carrying only its metadata
    pub fn new(
        id: impl Into<String>,
        model_type: impl Into<String>,
        updated_at: Option<DateTime<Utc>>,
    ) -> Self {
        Self {
            id: id.into(),
            model_type: model_type.into(),
            updated_at,
            fields: IndexMap::new(),
        }
    }

    /// The `id`/`type`/`updatedAt` keys every output object starts with
    pub fn header(&self) -> Map<String, Value> {
        let mut out = Map::new();
        out.insert("id".to_string(), Value::String(self.id.clone()));
        out.insert("type".to_string(), Value::String(self.model_type.clone()));
        if let Some(updated_at) = self.updated_at {
            out.insert(
                "updatedAt".to_string(),
                Value::String(updated_at.to_rfc3339_opts(SecondsFormat::Millis, true)),
            );
        }
        out
    }

    /// Get a field by name
    pub fn field(&self, name: &str) -> Option<&Node> {
        self.fields.get(name)
    }
}

/// Arena of resolved models and media
#[derive(Debug, Clone, Default)]
pub struct ContentGraph {
    models: Vec<Model>,
    media: Vec<Value>,
}

impl ContentGraph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a model, returning its handle
    pub fn insert_model(&mut self, model: Model) -> ModelId {
        self.models.push(model);
        ModelId(self.models.len() - 1)
    }

    /// Add a media value, returning its handle
    pub fn insert_media(&mut self, media: Value) -> MediaId {
        self.media.push(media);
        MediaId(self.media.len() - 1)
    }

    /// Get a model by handle
    pub fn model(&self, id: ModelId) -> &Model {
        &self.models[id.0]
    }

    pub(crate) fn model_mut(&mut self, id: ModelId) -> &mut Model {
        &mut self.models[id.0]
    }

    /// Get a media value by handle
    pub fn media(&self, id: MediaId) -> &Value {
        &self.media[id.0]
    }

    /// Number of resolved models
    pub fn model_count(&self) -> usize {
        self.models.len()
    }

    /// Number of resolved media values
    pub fn media_count(&self) -> usize {
        self.media.len()
    }

    /// Expand a model into nested JSON
    ///
    /// Referenced entries are inlined. A model that appears again inside its
    /// own subtree is emitted as its header only, so cyclic graphs expand to
    /// finite trees.
    ///
    /// The output nests one level per link, and rendering recurses the same
    /// way: expansion depth is bounded by the stack. Resolution itself is
    /// not.
    pub fn expand(&self, id: ModelId) -> Value {
        let mut path = Vec::new();
        self.expand_model(id, &mut path)
    }

    fn expand_model(&self, id: ModelId, path: &mut Vec<ModelId>) -> Value {
        let model = self.model(id);
        let mut out = model.header();
        if path.contains(&id) {
            return Value::Object(out);
        }

        path.push(id);
        for (key, node) in &model.fields {
            out.insert(key.clone(), self.expand_node(node, path));
        }
        path.pop();

        Value::Object(out)
    }

    fn expand_node(&self, node: &Node, path: &mut Vec<ModelId>) -> Value {
        match node {
            Node::Scalar(value) => value.clone(),
            Node::Entry(id) => self.expand_model(*id, path),
            Node::Media(id) => self.media(*id).clone(),
            Node::List(items) => {
                Value::Array(items.iter().map(|n| self.expand_node(n, path)).collect())
            }
            Node::Locales(variants) => Value::Object(
                variants
                    .iter()
                    .map(|(locale, n)| (locale.clone(), self.expand_node(n, path)))
                    .collect(),
            ),
        }
    }
}
