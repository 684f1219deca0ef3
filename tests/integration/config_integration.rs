//! Configuration file to provider registry.

use tempfile::TempDir;
use widgetforge::config::ConfigLoader;
use widgetforge::provider::{ProviderRegistry, ProviderType};
use widgetforge::ApiError;

fn write_config(dir: &TempDir, body: &str) -> std::path::PathBuf {
    let config_dir = dir.path().join("config");
    std::fs::create_dir_all(&config_dir).unwrap();
    let path = config_dir.join("widgetforge.toml");
    std::fs::write(&path, body).unwrap();
    path
}

#[test]
fn test_registry_built_from_file() {
    let dir = TempDir::new().unwrap();
    let path = write_config(
        &dir,
        r#"
[providers.local]
provider_type = "ollama"
model = "qwen2.5-coder"

[providers.hf]
provider_type = "huggingface"
widget_name = "CatalogCard"

[output]
widgets_dir = "generated"
"#,
    );

    let config = ConfigLoader::load_from_file(&path).unwrap();
    assert!(config.validate().is_ok());
    assert_eq!(config.output.widgets_dir, dir.path().join("generated"));

    let registry = ProviderRegistry::load_from_config(&config);
    let names: Vec<&str> = registry.list_all().into_iter().map(|(n, _)| n).collect();
    assert_eq!(names, vec!["hf", "local"]);
    assert_eq!(registry.get("local").unwrap().provider_type, ProviderType::Ollama);
    assert_eq!(registry.get("hf").unwrap().widget_name(), "CatalogCard");

    // Ollama needs no credentials, so a session can be created offline.
    let session = registry.create_session("local").unwrap();
    assert_eq!(session.widget_name(), "OllamaGeneratedWidget");
}

#[test]
fn test_missing_file_is_config_error() {
    let dir = TempDir::new().unwrap();
    let err = ConfigLoader::load_from_file(&dir.path().join("absent.toml")).unwrap_err();
    assert!(matches!(err, ApiError::ConfigError(_)));
}

#[test]
fn test_invalid_retry_rejected() {
    let dir = TempDir::new().unwrap();
    let path = write_config(
        &dir,
        r#"
[retry]
max_attempts = 0
"#,
    );
    let config = ConfigLoader::load_from_file(&path).unwrap();
    let err = config.validated().unwrap_err();
    assert!(err.to_string().contains("Retry"));
}
