//! Environment source: WIDGETFORGE__SECTION__KEY, e.g. WIDGETFORGE__RETRY__MAX_ATTEMPTS=5

use config::builder::DefaultState;
use config::ConfigBuilder;
use config::Environment;

pub const PREFIX: &str = "WIDGETFORGE";
pub const SEPARATOR: &str = "__";

pub fn add_to_builder(builder: ConfigBuilder<DefaultState>) -> ConfigBuilder<DefaultState> {
    builder.add_source(
        Environment::with_prefix(PREFIX)
            .separator(SEPARATOR)
            .try_parsing(true),
    )
}
