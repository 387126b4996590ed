//! Locales command handler

use anyhow::{Context, Result};

use graft_core::ContentSource;

use crate::output::Output;

/// List the locales the source declares
pub async fn list<S: ContentSource>(source: &S, output: &Output) -> Result<()> {
    let catalog = source
        .fetch_locales()
        .await
        .context("Failed to fetch locales")?;

    output.print_locales(&catalog.items);
    Ok(())
}
