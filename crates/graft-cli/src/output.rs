//! Output formatting for CLI
//!
//! Provides consistent output formatting across all commands:
//! - Human-readable default output
//! - JSON output (--json flag)
//! - Quiet mode for scripting (--quiet flag)

use graft_core::{Locale, QueryItems, QueryResult};
use serde_json::Value;

/// Fields tried, in order, for a model's one-line label
const LABEL_FIELDS: &[&str] = &["title", "name", "slug", "label"];

/// Output format options
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    /// Human-readable output (default)
    Human,
    /// JSON output
    Json,
    /// Quiet mode - minimal output
    Quiet,
}

impl OutputFormat {
    /// Create format from CLI flags
    pub fn from_flags(json: bool, quiet: bool) -> Self {
        if quiet {
            OutputFormat::Quiet
        } else if json {
            OutputFormat::Json
        } else {
            OutputFormat::Human
        }
    }
}

/// Output helper for consistent formatting
pub struct Output {
    /// The output format
    pub format: OutputFormat,
}

impl Output {
    pub fn new(format: OutputFormat) -> Self {
        Self { format }
    }

    /// Print one fully expanded model
    pub fn print_model(&self, model: &Value) {
        match self.format {
            OutputFormat::Human | OutputFormat::Json => {
                println!("{}", pretty(model));
            }
            OutputFormat::Quiet => {
                println!("{}", model_id(model));
            }
        }
    }

    /// Print a page of query results
    pub fn print_result(&self, result: &QueryResult<QueryItems>) {
        match self.format {
            OutputFormat::Human => {
                match &result.items {
                    QueryItems::Models(resolution) => {
                        print_model_lines(&resolution.to_json());
                    }
                    QueryItems::Localized(by_locale) => {
                        for (locale, models) in by_locale {
                            println!("── {} ──", locale);
                            print_model_lines(models);
                            println!();
                        }
                    }
                }
                println!("\n{}", page_summary(result));
            }
            OutputFormat::Json => {
                let json = serde_json::json!({
                    "items": result.items.to_json(),
                    "skip": result.skip,
                    "limit": result.limit,
                    "total": result.total
                });
                println!("{}", pretty(&json));
            }
            OutputFormat::Quiet => match &result.items {
                QueryItems::Models(resolution) => {
                    for model in resolution.models() {
                        println!("{}", model.id);
                    }
                }
                QueryItems::Localized(by_locale) => {
                    // Every locale lists the same models; print them once
                    if let Some(models) = by_locale.values().next() {
                        for model in models {
                            println!("{}", model_id(model));
                        }
                    }
                }
            },
        }
    }

    /// Print the locale catalog
    pub fn print_locales(&self, locales: &[Locale]) {
        match self.format {
            OutputFormat::Human => {
                if locales.is_empty() {
                    println!("No locales found.");
                    return;
                }
                for locale in locales {
                    let marker = if locale.default { " (default)" } else { "" };
                    match locale.name {
                        Some(ref name) => println!("{:<10} {}{}", locale.code, name, marker),
                        None => println!("{}{}", locale.code, marker),
                    }
                }
                println!("\n{} locale(s)", locales.len());
            }
            OutputFormat::Json => {
                println!("{}", pretty(&serde_json::json!(locales)));
            }
            OutputFormat::Quiet => {
                for locale in locales {
                    println!("{}", locale.code);
                }
            }
        }
    }

    /// Print a success message
    pub fn success(&self, message: &str) {
        match self.format {
            OutputFormat::Human => println!("✓ {}", message),
            OutputFormat::Json => {
                println!(
                    "{}",
                    serde_json::json!({"status": "success", "message": message})
                );
            }
            OutputFormat::Quiet => {}
        }
    }
}

/// Returned count, offset and total of a page
fn page_summary(result: &QueryResult<QueryItems>) -> String {
    let returned = match &result.items {
        QueryItems::Models(resolution) => resolution.len(),
        // Every locale lists the same models
        QueryItems::Localized(by_locale) => by_locale.values().next().map_or(0, Vec::len),
    };
    format!(
        "Showing {} from offset {} ({} total)",
        returned, result.skip, result.total
    )
}

/// Print one summary line per model
fn print_model_lines(models: &[Value]) {
    if models.is_empty() {
        println!("No models found.");
        return;
    }
    for model in models {
        println!(
            "{:<24} | {:<16} | {}",
            truncate(model_id(model), 24),
            truncate(model["type"].as_str().unwrap_or("-"), 16),
            truncate(model_label(model), 50)
        );
    }
    println!("\n{} model(s)", models.len());
}

fn pretty(value: &Value) -> String {
    serde_json::to_string_pretty(value).unwrap_or_else(|_| value.to_string())
}

fn model_id(model: &Value) -> &str {
    model["id"].as_str().unwrap_or("-")
}

/// First string field usable as a label
fn model_label(model: &Value) -> &str {
    LABEL_FIELDS
        .iter()
        .find_map(|field| model[*field].as_str())
        .unwrap_or("-")
}

/// Truncate a string to max length, adding "..." if truncated
fn truncate(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else {
        let kept: String = s.chars().take(max_len - 3).collect();
        format!("{}...", kept)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_format_from_flags() {
        assert_eq!(OutputFormat::from_flags(false, false), OutputFormat::Human);
        assert_eq!(OutputFormat::from_flags(true, false), OutputFormat::Json);
        assert_eq!(OutputFormat::from_flags(false, true), OutputFormat::Quiet);
        // Quiet takes precedence
        assert_eq!(OutputFormat::from_flags(true, true), OutputFormat::Quiet);
    }

    #[test]
    fn test_truncate() {
        assert_eq!(truncate("short", 10), "short");
        assert_eq!(truncate("this is a long string", 10), "this is...");
        assert_eq!(truncate("actualités du jour", 10), "actuali...");
    }

    #[test]
    fn test_model_label() {
        assert_eq!(model_label(&json!({"name": "Ada", "slug": "ada"})), "Ada");
        assert_eq!(model_label(&json!({"title": "Hi", "name": "Ada"})), "Hi");
        assert_eq!(model_label(&json!({"views": 3})), "-");
    }

    #[test]
    fn test_page_summary_counts_returned_models() {
        let mut by_locale = indexmap::IndexMap::new();
        by_locale.insert("en-US".to_string(), vec![json!({"id": "e1"}), json!({"id": "e2"})]);
        by_locale.insert("fr".to_string(), vec![json!({"id": "e1"}), json!({"id": "e2"})]);
        let result = QueryResult {
            items: QueryItems::Localized(by_locale),
            skip: 20,
            limit: 100,
            total: 22,
        };
        assert_eq!(page_summary(&result), "Showing 2 from offset 20 (22 total)");

        let empty = QueryResult {
            items: QueryItems::Models(graft_core::Resolution::new(
                graft_core::ContentGraph::new(),
                Vec::new(),
            )),
            skip: 0,
            limit: 100,
            total: 0,
        };
        assert_eq!(page_summary(&empty), "Showing 0 from offset 0 (0 total)");
    }

    #[test]
    fn test_model_id() {
        assert_eq!(model_id(&json!({"id": "e1"})), "e1");
        assert_eq!(model_id(&json!("not a model")), "-");
    }
}
