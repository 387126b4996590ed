//! Media resolution
//!
//! Turns raw asset records into [`MediaDescriptor`]s and runs them through
//! the caller's optional [`MediaTransform`] hook.
//!
//! ## Failure policy
//!
//! - Single-locale: a hook failure propagates and fails the query.
//! - Multi-locale: each locale variant is resolved on its own; a failing
//!   variant is reported to [`Diagnostics`] and left out, the other locales
//!   still resolve.

use std::future::Future;
use std::sync::Arc;

use async_trait::async_trait;
use futures_util::future::join_all;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::warn;

use crate::error::{ResolveError, ResolveResult};
use crate::models::{RawRecord, Sys};

/// Field holding the file descriptor on an asset
const FILE_FIELD: &str = "file";

/// Pixel dimensions of an image asset
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct Dimensions {
    pub width: u64,
    pub height: u64,
}

/// A resolved media asset
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct MediaDescriptor {
    pub id: String,
    pub url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub content_type: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dimensions: Option<Dimensions>,
    pub size: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<u64>,
}

/// The asset `file` field as delivered
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct AssetFile {
    url: String,
    content_type: String,
    #[serde(default)]
    details: FileDetails,
}

#[derive(Debug, Default, Deserialize)]
struct FileDetails {
    #[serde(default)]
    size: u64,
    #[serde(default)]
    image: Option<Dimensions>,
}

impl MediaDescriptor {
    /// Build a descriptor from an asset's metadata and (single-locale) fields
    pub fn from_fields(sys: &Sys, fields: &IndexMap<String, Value>) -> ResolveResult<Self> {
        let file = fields
            .get(FILE_FIELD)
            .ok_or_else(|| ResolveError::malformed_asset(&sys.id, "missing file"))?;
        let file: AssetFile = serde_json::from_value(file.clone())
            .map_err(|e| ResolveError::malformed_asset(&sys.id, e))?;

        Ok(Self {
            id: sys.id.clone(),
            url: file.url,
            description: fields
                .get("description")
                .and_then(Value::as_str)
                .map(str::to_string),
            content_type: file.content_type,
            dimensions: file.details.image,
            size: file.details.size,
            version: sys.revision,
        })
    }
}

/// Caller-supplied hook applied to every resolved media descriptor
///
/// The hook may reshape the descriptor into any JSON value (signed URLs,
/// responsive image sets, ...). Closures returning a future implement it.
#[async_trait]
pub trait MediaTransform: Send + Sync {
    async fn transform(&self, media: MediaDescriptor) -> anyhow::Result<Value>;
}

#[async_trait]
impl<F, Fut> MediaTransform for F
where
    F: Fn(MediaDescriptor) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = anyhow::Result<Value>> + Send + 'static,
{
    async fn transform(&self, media: MediaDescriptor) -> anyhow::Result<Value> {
        (self)(media).await
    }
}

/// Sink for failures that are swallowed during resolution
pub trait Diagnostics: Send + Sync {
    /// A locale variant of an asset failed to resolve and was omitted
    fn media_failed(&self, asset_id: &str, locale: &str, error: &ResolveError);
}

/// Reports swallowed failures as `tracing` warnings
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingDiagnostics;

impl Diagnostics for TracingDiagnostics {
    fn media_failed(&self, asset_id: &str, locale: &str, error: &ResolveError) {
        warn!(asset = asset_id, locale, "Dropping media variant: {}", error);
    }
}

/// A resolved asset as stored in the link index
#[derive(Debug, Clone, PartialEq)]
pub enum ResolvedAsset {
    Single(Value),
    /// Locale code → variant; locales without a file or with a failed
    /// transform are absent
    Localized(IndexMap<String, Value>),
}

/// Resolves raw assets into media values
#[derive(Clone)]
pub struct MediaResolver {
    transform: Option<Arc<dyn MediaTransform>>,
    diagnostics: Arc<dyn Diagnostics>,
}

impl Default for MediaResolver {
    fn default() -> Self {
        Self {
            transform: None,
            diagnostics: Arc::new(TracingDiagnostics),
        }
    }
}

impl MediaResolver {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the media transform hook
    pub fn with_transform(mut self, transform: Option<Arc<dyn MediaTransform>>) -> Self {
        self.transform = transform;
        self
    }

    /// Set the diagnostics sink for swallowed failures
    pub fn with_diagnostics(mut self, diagnostics: Arc<dyn Diagnostics>) -> Self {
        self.diagnostics = diagnostics;
        self
    }

    /// Resolve an asset in the requested mode
    pub async fn resolve_asset(
        &self,
        asset: &RawRecord,
        multi_locale: bool,
    ) -> ResolveResult<ResolvedAsset> {
        if multi_locale {
            Ok(ResolvedAsset::Localized(self.resolve_localized(asset).await))
        } else {
            self.resolve(&asset.sys, &asset.fields)
                .await
                .map(ResolvedAsset::Single)
        }
    }

    /// Resolve one set of single-locale asset fields
    pub async fn resolve(&self, sys: &Sys, fields: &IndexMap<String, Value>) -> ResolveResult<Value> {
        let descriptor = MediaDescriptor::from_fields(sys, fields)?;

        match &self.transform {
            Some(transform) => {
                let id = descriptor.id.clone();
                transform
                    .transform(descriptor)
                    .await
                    .map_err(|source| ResolveError::MediaTransform { id, source })
            }
            None => Ok(serde_json::to_value(descriptor)?),
        }
    }

    /// Resolve every locale variant of a multi-locale asset
    ///
    /// Variants are resolved concurrently; each writes its own locale slot.
    pub async fn resolve_localized(&self, asset: &RawRecord) -> IndexMap<String, Value> {
        let groups = pivot_locales(&asset.fields);

        let jobs = groups
            .into_iter()
            .filter(|(_, fields)| fields.contains_key(FILE_FIELD))
            .map(|(locale, fields)| async move {
                let result = self.resolve(&asset.sys, &fields).await;
                (locale, result)
            });

        let mut variants = IndexMap::new();
        for (locale, result) in join_all(jobs).await {
            match result {
                Ok(media) => {
                    variants.insert(locale, media);
                }
                Err(e) => self.diagnostics.media_failed(asset.id(), &locale, &e),
            }
        }
        variants
    }
}

/// Regroup `field → locale → value` into `locale → field → value`
///
/// Fields that are not locale maps are ignored.
fn pivot_locales(fields: &IndexMap<String, Value>) -> IndexMap<String, IndexMap<String, Value>> {
    let mut groups: IndexMap<String, IndexMap<String, Value>> = IndexMap::new();
    for (field, value) in fields {
        let Value::Object(by_locale) = value else {
            continue;
        };
        for (locale, v) in by_locale {
            groups
                .entry(locale.clone())
                .or_default()
                .insert(field.clone(), v.clone());
        }
    }
    groups
}
