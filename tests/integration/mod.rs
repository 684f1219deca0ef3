//! Integration tests for widgetforge

mod config_integration;
mod end_to_end;
mod provider_session;
mod retrieval_pipeline;
mod sanitizer_pipeline;
mod test_utils;
