//! List command handler

use anyhow::{bail, Context, Result};
use clap::Args;

use graft_core::{Client, ContentSource, Query, QueryOptions};

use crate::output::Output;

/// Query parameters accepted by `graft list`
#[derive(Args, Debug, Clone, Default)]
pub struct ListArgs {
    /// Restrict to one content type
    #[arg(short = 't', long)]
    pub content_type: Option<String>,
    /// Locale code, or '*' for every locale
    #[arg(short, long)]
    pub locale: Option<String>,
    /// Field paths to return (comma-separated)
    #[arg(short, long, value_delimiter = ',')]
    pub select: Vec<String>,
    /// Number of items to skip
    #[arg(long)]
    pub skip: Option<u64>,
    /// Maximum number of items
    #[arg(long)]
    pub limit: Option<u64>,
    /// Sort order (e.g. -sys.updatedAt)
    #[arg(long)]
    pub order: Option<String>,
    /// Link depth to include
    #[arg(long)]
    pub include: Option<u8>,
    /// Filter as key=value (repeatable)
    #[arg(short = 'w', long = "where", value_parser = parse_filter)]
    pub filters: Vec<(String, String)>,
}

impl ListArgs {
    /// Build the entries query
    pub fn to_query(&self) -> Query {
        let mut query = Query::new().select(self.select.iter().cloned());
        query.content_type = self.content_type.clone();
        query.locale = self.locale.clone();
        query.skip = self.skip;
        query.limit = self.limit;
        query.order = self.order.clone();
        query.include = self.include;
        for (key, value) in &self.filters {
            query = query.filter(key.clone(), value.clone());
        }
        query
    }
}

/// Parse a `key=value` filter
fn parse_filter(s: &str) -> Result<(String, String)> {
    let Some((key, value)) = s.split_once('=') else {
        bail!("Invalid filter '{}'. Expected key=value", s);
    };
    let key = key.trim();
    if key.is_empty() {
        bail!("Invalid filter '{}'. Key must not be empty", s);
    }
    Ok((key.to_string(), value.to_string()))
}

/// Resolve and print a page of models
pub async fn list<S: ContentSource>(
    client: &Client<S>,
    args: &ListArgs,
    options: QueryOptions,
    output: &Output,
) -> Result<()> {
    let result = client
        .get_models(args.to_query(), options)
        .await
        .context("Failed to resolve models")?;

    output.print_result(&result);
    Ok(())
}
