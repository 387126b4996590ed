//! Get command handler

use anyhow::{Context, Result};
use indexmap::IndexMap;
use serde_json::Value;

use graft_core::{Client, ContentSource, Query, QueryItems, QueryOptions, ResolveError};

use crate::output::Output;

/// Resolve and print one model, optionally in a given locale
///
/// With the `*` locale the model is printed once per locale.
pub async fn get<S: ContentSource>(
    client: &Client<S>,
    id: String,
    locale: Option<String>,
    options: QueryOptions,
    output: &Output,
) -> Result<()> {
    let Some(locale) = locale else {
        let resolution = client
            .get_model_with(&id, options)
            .await
            .context("Failed to resolve model")?;
        if let Some(model) = resolution.to_json().first() {
            output.print_model(model);
        }
        return Ok(());
    };

    let result = client
        .get_models(Query::by_id(&id).locale(locale), options)
        .await
        .context("Failed to resolve model")?;

    let model = match result.items {
        QueryItems::Models(resolution) => resolution.to_json().into_iter().next(),
        QueryItems::Localized(by_locale) => first_per_locale(by_locale),
    };

    match model {
        Some(model) => {
            output.print_model(&model);
            Ok(())
        }
        None => Err(ResolveError::NotFound { id }.into()),
    }
}

/// Keep the single model of each locale, or `None` when nothing matched
fn first_per_locale(by_locale: IndexMap<String, Vec<Value>>) -> Option<Value> {
    let mut variants = serde_json::Map::new();
    for (locale, models) in by_locale {
        if let Some(model) = models.into_iter().next() {
            variants.insert(locale, model);
        }
    }
    if variants.is_empty() {
        None
    } else {
        Some(Value::Object(variants))
    }
}
