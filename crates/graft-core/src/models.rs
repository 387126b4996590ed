//! Raw payload data structures
//!
//! Records arrive in the delivery API's JSON shape: a `sys` block carrying
//! identity metadata and a `fields` map. Field values stay as raw JSON until
//! the resolver classifies them into a [`FieldValue`].

use chrono::{DateTime, Utc};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::ResolveResult;

/// Record kinds as reported by `sys.type`
pub mod kinds {
    pub const ENTRY: &str = "Entry";
    pub const ASSET: &str = "Asset";
    pub const LINK: &str = "Link";
}

/// Locale code used when the catalog does not flag a default
pub const FALLBACK_LOCALE: &str = "en-US";

/// System metadata attached to every record
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Sys {
    /// Unique identifier
    pub id: String,
    /// Record kind (`Entry` or `Asset`)
    #[serde(rename = "type")]
    pub kind: String,
    /// Published revision
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub revision: Option<u64>,
    /// Last update time
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
    /// Content type link (entries only)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content_type: Option<LinkMarker>,
}

/// A `{ "sys": { "type": "Link", ... } }` marker
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LinkMarker {
    pub sys: LinkRef,
}

/// The `sys` part of a link marker: names another record by id
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "camelCase")]
pub struct LinkRef {
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub link_type: Option<String>,
}

impl LinkRef {
    /// Create a link to an entry
    pub fn entry(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            link_type: Some(kinds::ENTRY.to_string()),
        }
    }

    /// Recognize a link marker in a raw field value
    ///
    /// Returns `None` for anything that is not an object whose `sys.type` is
    /// `Link` with a string `id`.
    pub fn from_marker(value: &Value) -> Option<Self> {
        let sys = value.get("sys")?;
        if sys.get("type")?.as_str()? != kinds::LINK {
            return None;
        }
        Some(Self {
            id: sys.get("id")?.as_str()?.to_string(),
            link_type: sys
                .get("linkType")
                .and_then(Value::as_str)
                .map(str::to_string),
        })
    }
}

/// A raw content record (entry or asset)
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RawRecord {
    pub sys: Sys,
    #[serde(default)]
    pub fields: IndexMap<String, Value>,
}

impl RawRecord {
    /// Get the record ID
    pub fn id(&self) -> &str {
        &self.sys.id
    }

    /// Check if this record is a media asset
    pub fn is_asset(&self) -> bool {
        self.sys.kind == kinds::ASSET
    }

    /// The type reported on resolved models
    ///
    /// Entries report their content type id; records without one fall back
    /// to the raw `sys.type`.
    pub fn model_type(&self) -> &str {
        self.sys
            .content_type
            .as_ref()
            .map(|ct| ct.sys.id.as_str())
            .unwrap_or(&self.sys.kind)
    }
}

/// Records pulled in alongside the top-level items
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct Includes {
    #[serde(rename = "Asset", default)]
    pub assets: Vec<RawRecord>,
    #[serde(rename = "Entry", default)]
    pub entries: Vec<RawRecord>,
}

/// One page of records as delivered by a content source
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct Payload {
    #[serde(default)]
    pub items: Vec<RawRecord>,
    #[serde(default)]
    pub includes: Includes,
    #[serde(default)]
    pub skip: u64,
    #[serde(default)]
    pub limit: u64,
    #[serde(default)]
    pub total: u64,
}

impl Payload {
    /// Parse a payload from its JSON text
    pub fn from_json_str(json: &str) -> ResolveResult<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// IDs of the top-level items, in delivery order
    pub fn item_ids(&self) -> Vec<String> {
        self.items.iter().map(|r| r.sys.id.clone()).collect()
    }
}

/// A locale declared by the content space
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Locale {
    pub code: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default)]
    pub default: bool,
}

impl Locale {
    pub fn new(code: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            name: None,
            default: false,
        }
    }

    /// Create the default locale
    pub fn default_locale(code: impl Into<String>) -> Self {
        Self {
            default: true,
            ..Self::new(code)
        }
    }
}

/// The list of locales a space declares
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct LocaleCatalog {
    #[serde(default)]
    pub items: Vec<Locale>,
}

impl LocaleCatalog {
    /// Code of the locale flagged as default, or [`FALLBACK_LOCALE`]
    pub fn default_code(&self) -> &str {
        default_locale_code(&self.items)
    }
}

/// Code of the locale flagged as default, or [`FALLBACK_LOCALE`]
pub fn default_locale_code(locales: &[Locale]) -> &str {
    locales
        .iter()
        .find(|l| l.default)
        .map(|l| l.code.as_str())
        .unwrap_or(FALLBACK_LOCALE)
}

/// A classified raw field value
///
/// `Locales` only appears in multi-locale mode, where every field holds a
/// locale code → value map. JSON objects that are not link markers (a
/// location, a rich text document) are opaque scalars.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
    Scalar(Value),
    Reference(LinkRef),
    Sequence(Vec<FieldValue>),
    Locales(IndexMap<String, FieldValue>),
}

impl FieldValue {
    /// Classify a single-locale field value
    pub fn from_json(value: &Value) -> Self {
        match value {
            Value::Array(items) => Self::Sequence(items.iter().map(Self::from_json).collect()),
            other => match LinkRef::from_marker(other) {
                Some(link) => Self::Reference(link),
                None => Self::Scalar(other.clone()),
            },
        }
    }

    /// Classify a multi-locale field value (`{ "en-US": .., "fr": .. }`)
    ///
    /// Anything that is not a locale map is classified as a plain value.
    pub fn from_localized_json(value: &Value) -> Self {
        match value {
            Value::Object(map) if LinkRef::from_marker(value).is_none() => Self::Locales(
                map.iter()
                    .map(|(locale, v)| (locale.clone(), Self::from_json(v)))
                    .collect(),
            ),
            other => Self::from_json(other),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ResolveError;
    use serde_json::json;

    #[test]
    fn test_payload_from_json_str() {
        let payload = Payload::from_json_str(
            r#"{"items": [{"sys": {"id": "e1", "type": "Entry"}}], "total": 1}"#,
        )
        .unwrap();
        assert_eq!(payload.item_ids(), vec!["e1"]);
        assert!(payload.includes.entries.is_empty());

        // Items must carry a sys block
        let err = Payload::from_json_str(r#"{"items": [{"fields": {}}]}"#).unwrap_err();
        assert!(matches!(err, ResolveError::MalformedPayload(_)));
    }

    #[test]
    fn test_link_marker_detection() {
        let marker = json!({"sys": {"type": "Link", "linkType": "Asset", "id": "a1"}});
        let link = LinkRef::from_marker(&marker).unwrap();
        assert_eq!(link.id, "a1");
        assert_eq!(link.link_type.as_deref(), Some(kinds::ASSET));

        // Not a link: wrong sys.type
        assert!(LinkRef::from_marker(&json!({"sys": {"type": "Entry", "id": "e1"}})).is_none());
        // Not a link: plain object
        assert!(LinkRef::from_marker(&json!({"lat": 1.0, "lon": 2.0})).is_none());
        assert!(LinkRef::from_marker(&json!("a1")).is_none());
    }

    #[test]
    fn test_field_value_classification() {
        let value = json!([
            "text",
            {"sys": {"type": "Link", "linkType": "Entry", "id": "e2"}},
            {"lat": 1.0}
        ]);

        let FieldValue::Sequence(items) = FieldValue::from_json(&value) else {
            panic!("expected a sequence");
        };
        assert_eq!(items[0], FieldValue::Scalar(json!("text")));
        assert_eq!(items[1], FieldValue::Reference(LinkRef::entry("e2")));
        assert_eq!(items[2], FieldValue::Scalar(json!({"lat": 1.0})));
    }

    #[test]
    fn test_localized_classification() {
        let value = json!({"en-US": "Hello", "fr": "Bonjour"});
        let FieldValue::Locales(map) = FieldValue::from_localized_json(&value) else {
            panic!("expected a locale map");
        };
        assert_eq!(map.len(), 2);
        assert_eq!(map["fr"], FieldValue::Scalar(json!("Bonjour")));

        // A bare link marker is never read as a locale map
        let link = json!({"sys": {"type": "Link", "id": "e1"}});
        assert!(matches!(
            FieldValue::from_localized_json(&link),
            FieldValue::Reference(_)
        ));
    }

    #[test]
    fn test_model_type() {
        let entry: RawRecord = serde_json::from_value(json!({
            "sys": {
                "id": "e1",
                "type": "Entry",
                "contentType": {"sys": {"type": "Link", "linkType": "ContentType", "id": "post"}}
            },
            "fields": {}
        }))
        .unwrap();
        assert_eq!(entry.model_type(), "post");
        assert!(!entry.is_asset());

        let asset: RawRecord =
            serde_json::from_value(json!({"sys": {"id": "a1", "type": "Asset"}})).unwrap();
        assert_eq!(asset.model_type(), "Asset");
        assert!(asset.is_asset());
        assert!(asset.fields.is_empty());
    }

    #[test]
    fn test_payload_deserialization() {
        let payload: Payload = serde_json::from_value(json!({
            "items": [{"sys": {"id": "e1", "type": "Entry", "revision": 3,
                               "updatedAt": "2024-05-01T10:00:00.000Z"}}],
            "includes": {"Asset": [{"sys": {"id": "a1", "type": "Asset"}}]},
            "skip": 0,
            "limit": 100,
            "total": 1
        }))
        .unwrap();

        assert_eq!(payload.item_ids(), vec!["e1"]);
        assert_eq!(payload.items[0].sys.revision, Some(3));
        assert!(payload.items[0].sys.updated_at.is_some());
        assert_eq!(payload.includes.assets.len(), 1);
        assert!(payload.includes.entries.is_empty());
        assert_eq!(payload.total, 1);
    }

    #[test]
    fn test_default_locale_code() {
        let catalog = LocaleCatalog {
            items: vec![Locale::new("fr"), Locale::default_locale("de-DE")],
        };
        assert_eq!(catalog.default_code(), "de-DE");

        let catalog = LocaleCatalog {
            items: vec![Locale::new("fr")],
        };
        assert_eq!(catalog.default_code(), FALLBACK_LOCALE);
    }
}
