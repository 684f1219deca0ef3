//! Merge rules: defaults, override order, conflict handling.

use config::Config;
use config::ConfigBuilder;
use config::ConfigError;

/// Create a Config builder with merge policy defaults applied.
pub fn builder_with_defaults() -> Result<ConfigBuilder<config::builder::DefaultState>, ConfigError>
{
    Config::builder()
        .set_default("retry.max_attempts", 3)?
        .set_default("retry.base_delay", 1.0)?
        .set_default("retry.max_delay", 30.0)?
        .set_default("retrieval.top_k", 1)?
        .set_default("retrieval.similarity_threshold", 0.0)?
        .set_default("output.widgets_dir", "lib/widgets")?
        .set_default("output.enabled", true)?
        .set_default("fan_out.max_workers", 4)
}
