//! Config command handlers

use std::path::PathBuf;

use anyhow::{bail, Context, Result};

use graft_core::Config;

use crate::output::{Output, OutputFormat};

/// Keys accepted by `graft config set`
const KEYS: &str = "space_id, access_token, environment, host, timeout_secs, default_locale, log_file";

/// Show current configuration
pub fn show(config_path: Option<&PathBuf>, output: &Output) -> Result<()> {
    let config =
        Config::load_with_cli_override(config_path).context("Failed to load configuration")?;
    let token = config.access_token.as_deref().map(mask_token);

    match output.format {
        OutputFormat::Json => {
            println!(
                "{}",
                serde_json::json!({
                    "space_id": config.space_id,
                    "access_token": token,
                    "environment": config.environment,
                    "host": config.host,
                    "timeout_secs": config.timeout_secs,
                    "default_locale": config.default_locale,
                    "log_file": config.log_file
                })
            );
        }
        OutputFormat::Quiet => {
            println!("{}", config.space_id.as_deref().unwrap_or(""));
        }
        OutputFormat::Human => {
            let effective_path = config_path
                .cloned()
                .unwrap_or_else(Config::config_file_path);
            println!("Configuration:");
            println!(
                "  space_id:       {}",
                config.space_id.as_deref().unwrap_or("(not set)")
            );
            println!(
                "  access_token:   {}",
                token.as_deref().unwrap_or("(not set)")
            );
            println!("  environment:    {}", config.environment);
            println!("  host:           {}", config.host);
            println!("  timeout_secs:   {}", config.timeout_secs);
            println!("  default_locale: {}", config.default_locale);
            println!(
                "  log_file:       {}",
                config
                    .log_file
                    .as_ref()
                    .map(|p| p.display().to_string())
                    .unwrap_or_else(|| "(not set)".to_string())
            );
            println!();
            println!("Config file: {}", effective_path.display());
        }
    }

    Ok(())
}

/// Set a configuration value
pub fn set(
    key: String,
    value: String,
    config_path: Option<&PathBuf>,
    output: &Output,
) -> Result<()> {
    let mut config =
        Config::load_with_cli_override(config_path).context("Failed to load configuration")?;

    apply(&mut config, &key, &value)?;

    // Save to the CLI-specified path or default
    let save_path = config_path
        .cloned()
        .unwrap_or_else(Config::config_file_path);
    config
        .save_to(&save_path)
        .context("Failed to save configuration")?;

    let shown = if key == "access_token" {
        mask_token(&value)
    } else {
        value
    };
    output.success(&format!("Set {} = {}", key, shown));
    Ok(())
}

/// Apply one `key = value` assignment
fn apply(config: &mut Config, key: &str, value: &str) -> Result<()> {
    match key {
        "space_id" => config.space_id = optional(value),
        "access_token" => config.access_token = optional(value),
        "environment" => config.environment = required(key, value)?,
        "host" => config.host = required(key, value)?,
        "timeout_secs" => {
            config.timeout_secs = value
                .parse()
                .context("Invalid value for timeout_secs. Use a whole number of seconds.")?;
        }
        "default_locale" => config.default_locale = required(key, value)?,
        "log_file" => config.log_file = optional(value).map(PathBuf::from),
        _ => {
            bail!(
                "Unknown configuration key: '{}'\nValid keys: {}",
                key,
                KEYS
            );
        }
    }
    Ok(())
}

/// Empty or "none" clears an optional value
fn optional(value: &str) -> Option<String> {
    if value.is_empty() || value == "none" {
        None
    } else {
        Some(value.to_string())
    }
}

fn required(key: &str, value: &str) -> Result<String> {
    if value.is_empty() {
        bail!("{} cannot be empty", key);
    }
    Ok(value.to_string())
}

/// Show only the last four characters of a token
fn mask_token(token: &str) -> String {
    let count = token.chars().count();
    if count <= 4 {
        return "****".to_string();
    }
    let tail: String = token.chars().skip(count - 4).collect();
    format!("****{}", tail)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_apply_keys() {
        let mut config = Config::default();

        apply(&mut config, "space_id", "abc123").unwrap();
        apply(&mut config, "timeout_secs", "30").unwrap();
        apply(&mut config, "log_file", "/tmp/graft.log").unwrap();
        assert_eq!(config.space_id.as_deref(), Some("abc123"));
        assert_eq!(config.timeout_secs, 30);
        assert_eq!(config.log_file, Some(PathBuf::from("/tmp/graft.log")));

        apply(&mut config, "space_id", "none").unwrap();
        assert!(config.space_id.is_none());
    }

    #[test]
    fn test_apply_invalid() {
        let mut config = Config::default();
        assert!(apply(&mut config, "timeout_secs", "soon").is_err());
        assert!(apply(&mut config, "environment", "").is_err());
        let err = apply(&mut config, "colour", "blue").unwrap_err();
        assert!(err.to_string().contains("Unknown configuration key"));
    }

    #[test]
    fn test_mask_token() {
        assert_eq!(mask_token("abcdef123456"), "****3456");
        assert_eq!(mask_token("abc"), "****");
    }
}
