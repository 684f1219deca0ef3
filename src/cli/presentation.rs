//! CLI presentation: provider listing as a table or JSON.

use crate::provider::ProviderConfig;
use comfy_table::presets::UTF8_BORDERS_ONLY;
use comfy_table::Table;
use serde::Serialize;

/// One row of `widgetforge providers`.
#[derive(Debug, Clone, Serialize)]
pub struct ProviderRow {
    pub name: String,
    pub provider_type: String,
    pub model: Option<String>,
    pub endpoint: String,
    pub widget_name: String,
    pub structured_payload: bool,
    pub api_key: &'static str,
}

impl ProviderRow {
    pub fn from_config(name: &str, config: &ProviderConfig) -> Self {
        let api_key = if !config.requires_api_key() {
            "not required"
        } else if config.resolve_api_key().is_some() {
            "set"
        } else {
            "missing"
        };
        Self {
            name: name.to_string(),
            provider_type: config.provider_type.to_string(),
            model: config.model.clone(),
            endpoint: config.endpoint(),
            widget_name: config.widget_name(),
            structured_payload: config.expects_structured_payload(),
            api_key,
        }
    }
}

pub fn format_providers_text(rows: &[ProviderRow]) -> String {
    if rows.is_empty() {
        return "No providers configured.\n\nAdd one under [providers.<name>] in config/config.toml."
            .to_string();
    }
    let mut table = Table::new();
    table.load_preset(UTF8_BORDERS_ONLY);
    table.set_header(vec!["Provider", "Type", "Model", "Widget", "Payload", "API key"]);
    for row in rows {
        table.add_row(vec![
            row.name.clone(),
            row.provider_type.clone(),
            row.model.clone().unwrap_or_else(|| "(auto)".to_string()),
            row.widget_name.clone(),
            if row.structured_payload { "json" } else { "code" }.to_string(),
            row.api_key.to_string(),
        ]);
    }
    format!("{}\n\nTotal: {} provider(s)", table, rows.len())
}

pub fn format_providers_json(rows: &[ProviderRow]) -> String {
    let out = serde_json::json!({ "providers": rows, "total": rows.len() });
    serde_json::to_string_pretty(&out).unwrap_or_else(|_| "{}".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::provider::ProviderType;

    #[test]
    fn test_provider_table_lists_rows() {
        let rows = vec![ProviderRow::from_config(
            "local",
            &ProviderConfig::new(ProviderType::Ollama),
        )];
        let text = format_providers_text(&rows);
        assert!(text.contains("local"));
        assert!(text.contains("OllamaGeneratedWidget"));
        assert!(text.contains("not required"));
        assert!(text.ends_with("Total: 1 provider(s)"));

        let json: serde_json::Value = serde_json::from_str(&format_providers_json(&rows)).unwrap();
        assert_eq!(json["total"], 1);
        assert_eq!(json["providers"][0]["structured_payload"], false);
    }

    #[test]
    fn test_empty_listing() {
        assert!(format_providers_text(&[]).starts_with("No providers configured."));
    }
}
