//! graft Core Library
//!
//! This crate resolves flat content payloads from a headless CMS delivery API
//! into a dereferenced object graph: links between entries and assets are
//! replaced by the records they point at.
//!
//! # Architecture
//!
//! - **Link index**: record ID → slot, assets resolved up front
//! - **Entry resolver**: dereferences links, each record at most once
//! - **Locale flattener**: one plain tree per locale for `*` queries
//!
//! # Quick Start
//!
//! ```text
//! let client = Client::new(source);
//!
//! // One record
//! let post = client.get_model("e1").await?;
//!
//! // A page of records, every locale
//! let page = client
//!     .get_models(Query::new().content_type("post").all_locales(), QueryOptions::default())
//!     .await?;
//! ```
//!
//! # Modules
//!
//! - `client`: Query entry points (main entry point)
//! - `models`: Raw payload structures and field classification
//! - `index`: Link index and slot states
//! - `resolver`: Entry resolution
//! - `media`: Media descriptors and the transform hook
//! - `graph`: Resolved model arena
//! - `locale`: Locale flattening
//! - `query`: Query parameters and results
//! - `source`: Content source seam
//! - `config`: Application configuration

pub mod client;
pub mod config;
pub mod error;
pub mod graph;
pub mod index;
pub mod locale;
pub mod media;
pub mod models;
pub mod query;
pub mod resolver;
pub mod source;

pub use client::{Client, QueryItems, QueryOptions, Resolution};
pub use config::Config;
pub use error::{ResolveError, ResolveResult, TransientError};
pub use graph::{ContentGraph, MediaId, Model, ModelId, Node};
pub use index::{Link, LinkIndex, LinkSlot};
pub use locale::{flatten_locales, LocaleFlattener};
pub use media::{Diagnostics, MediaDescriptor, MediaResolver, MediaTransform, TracingDiagnostics};
pub use models::{FieldValue, LinkRef, Locale, LocaleCatalog, Payload, RawRecord};
pub use query::{Query, QueryResult};
pub use resolver::EntryResolver;
pub use source::{ContentSource, StaticSource};
