//! Content sources backing the CLI
//!
//! Either the delivery API over HTTP or a payload file on disk.

use std::path::Path;
use std::time::Duration;

use anyhow::{bail, Context, Result};
use async_trait::async_trait;
use tracing::debug;

use reqwest::StatusCode;

use graft_core::{
    Config, ContentSource, Locale, LocaleCatalog, Payload, Query, StaticSource, TransientError,
};

/// Longest response body echoed back in an error
const MAX_ERROR_BODY: usize = 200;

/// Delivery API client
pub struct HttpSource {
    client: reqwest::Client,
    base_url: String,
    access_token: String,
}

impl HttpSource {
    /// Build a source from the configured space, token and host
    pub fn from_config(config: &Config) -> Result<Self> {
        let base_url = config.base_url()?;
        let access_token = config.access_token.clone().context(
            "Access token not configured. Set it with: graft config set access_token <token>",
        )?;

        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .user_agent(concat!("graft/", env!("CARGO_PKG_VERSION")))
            .build()
            .context("Failed to build HTTP client")?;

        Ok(Self {
            client,
            base_url,
            access_token,
        })
    }

    async fn get<T: serde::de::DeserializeOwned>(
        &self,
        path: &str,
        params: &[(String, String)],
    ) -> Result<T> {
        let url = format!("{}/{}", self.base_url, path);
        debug!("GET {} {:?}", url, params);

        let response = match self
            .client
            .get(&url)
            .bearer_auth(&self.access_token)
            .query(params)
            .send()
            .await
        {
            Ok(response) => response,
            Err(e) if e.is_timeout() || e.is_connect() => {
                return Err(TransientError::new(format!("Request failed: {}: {}", url, e)).into());
            }
            Err(e) => return Err(anyhow::Error::new(e).context(format!("Request failed: {}", url))),
        };

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(status_error(status, path, &body));
        }

        response
            .json()
            .await
            .with_context(|| format!("Failed to decode response from {}", path))
    }
}

#[async_trait]
impl ContentSource for HttpSource {
    async fn fetch_entries(&self, query: &Query) -> Result<Payload> {
        self.get("entries", &entries_params(query)).await
    }

    async fn fetch_locales(&self) -> Result<LocaleCatalog> {
        self.get("locales", &[]).await
    }
}

/// Error for a non-success response
///
/// Rate limiting and server errors are marked transient.
fn status_error(status: StatusCode, path: &str, body: &str) -> anyhow::Error {
    let body: String = body.chars().take(MAX_ERROR_BODY).collect();
    let message = format!("Content API returned {} for {}: {}", status, path, body);
    if status == StatusCode::TOO_MANY_REQUESTS || status.is_server_error() {
        TransientError::new(message).into()
    } else {
        anyhow::anyhow!(message)
    }
}

/// Translate a query into delivery API parameters
fn entries_params(query: &Query) -> Vec<(String, String)> {
    let mut params = Vec::new();

    if let Some(ref content_type) = query.content_type {
        params.push(("content_type".to_string(), content_type.clone()));
    }
    if !query.select.is_empty() {
        params.push(("select".to_string(), query.select.join(",")));
    }
    if let Some(ref locale) = query.locale {
        params.push(("locale".to_string(), locale.clone()));
    }
    if let Some(skip) = query.skip {
        params.push(("skip".to_string(), skip.to_string()));
    }
    if let Some(limit) = query.limit {
        params.push(("limit".to_string(), limit.to_string()));
    }
    if let Some(ref order) = query.order {
        params.push(("order".to_string(), order.clone()));
    }
    if let Some(include) = query.include {
        params.push(("include".to_string(), include.to_string()));
    }
    for (key, value) in &query.filters {
        params.push((key.clone(), value.clone()));
    }

    params
}

/// Load a payload file, plus an optional locales file, as a fixed source
///
/// Without a locales file the catalog holds only `default_locale`.
pub fn load_file_source(
    payload_path: &Path,
    locales_path: Option<&Path>,
    default_locale: &str,
) -> Result<StaticSource> {
    let content = std::fs::read_to_string(payload_path)
        .with_context(|| format!("Failed to read payload file: {:?}", payload_path))?;
    let payload = Payload::from_json_str(&content)
        .with_context(|| format!("Failed to parse payload file: {:?}", payload_path))?;

    let locales = match locales_path {
        Some(path) => {
            let content = std::fs::read_to_string(path)
                .with_context(|| format!("Failed to read locales file: {:?}", path))?;
            serde_json::from_str(&content)
                .with_context(|| format!("Failed to parse locales file: {:?}", path))?
        }
        None => LocaleCatalog {
            items: vec![Locale::default_locale(default_locale)],
        },
    };

    Ok(StaticSource::new(payload, locales))
}

/// The source selected on the command line
pub enum AnySource {
    Http(HttpSource),
    File(StaticSource),
}

impl AnySource {
    /// Use the payload file when given, otherwise the configured API
    pub fn select(
        config: &Config,
        file: Option<&Path>,
        locales_file: Option<&Path>,
    ) -> Result<Self> {
        match file {
            Some(path) => Ok(AnySource::File(load_file_source(
                path,
                locales_file,
                &config.default_locale,
            )?)),
            None => {
                if locales_file.is_some() {
                    bail!("--locales-file requires --file");
                }
                Ok(AnySource::Http(HttpSource::from_config(config)?))
            }
        }
    }
}

#[async_trait]
impl ContentSource for AnySource {
    async fn fetch_entries(&self, query: &Query) -> Result<Payload> {
        match self {
            AnySource::Http(source) => source.fetch_entries(query).await,
            AnySource::File(source) => source.fetch_entries(query).await,
        }
    }

    async fn fetch_locales(&self) -> Result<LocaleCatalog> {
        match self {
            AnySource::Http(source) => source.fetch_locales().await,
            AnySource::File(source) => source.fetch_locales().await,
        }
    }
}
