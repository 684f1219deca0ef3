//! CLI domain: parse, route, output and presentation only.
//! No pipeline logic; the route table dispatches to the generation and retrieval services.

mod output;
mod parse;
mod presentation;
mod route;

pub use output::map_error;
pub use parse::{Cli, Commands, OutputFormat};
pub use presentation::{format_providers_json, format_providers_text, ProviderRow};
pub use route::RunContext;
