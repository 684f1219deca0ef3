//! Structured payload decoding: `{"code": ..., "ui_json": ...}` responses.

pub mod literal;

use crate::types::AuxStructure;
use serde_json::Value;
use thiserror::Error;
use tracing::{debug, warn};

/// Wire key carrying the auxiliary UI description.
pub const AUX_KEY: &str = "ui_json";
const AUX_KEY_ALIAS: &str = "aux_structure";

/// Decoded response record.
#[derive(Debug, Clone, PartialEq)]
pub struct StructuredPayload {
    /// Non-blank source text.
    pub code: String,
    pub aux_structure: AuxStructure,
}

/// Why a response could not be used as a structured payload.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseFailure {
    /// Neither decoder accepted the text; carries the strict decoder's error.
    #[error("Parsing error: {0}")]
    Decode(String),

    #[error("no code in response")]
    NoCode,

    #[error("invalid structure")]
    InvalidStructure,
}

/// Decode a normalised response.
///
/// Strict JSON is tried first, then the relaxed literal decoder. The record must be a
/// mapping with a non-blank string `code`.
pub fn parse(text: &str) -> Result<StructuredPayload, ParseFailure> {
    let value = match serde_json::from_str::<Value>(text) {
        Ok(value) => value,
        Err(strict) => match literal::parse_literal(text) {
            Ok(value) => {
                debug!(strict_error = %strict, "Decoded payload with relaxed literal syntax");
                value
            }
            Err(relaxed) => {
                warn!(
                    strict_error = %strict,
                    relaxed_error = %relaxed,
                    "Payload rejected by both decoders"
                );
                return Err(ParseFailure::Decode(strict.to_string()));
            }
        },
    };

    let Value::Object(mut record) = value else {
        return Err(ParseFailure::InvalidStructure);
    };

    let code = match record.remove("code") {
        Some(Value::String(code)) if !code.trim().is_empty() => code,
        _ => return Err(ParseFailure::NoCode),
    };

    let raw_aux = record
        .remove(AUX_KEY)
        .or_else(|| record.remove(AUX_KEY_ALIAS));
    let aux_structure = decode_aux(raw_aux)?;

    Ok(StructuredPayload {
        code,
        aux_structure,
    })
}

/// A mapping is used as-is, text is decoded as nested JSON, anything else is empty.
fn decode_aux(raw: Option<Value>) -> Result<AuxStructure, ParseFailure> {
    match raw {
        None | Some(Value::Null) => Ok(AuxStructure::new()),
        Some(Value::Object(map)) => Ok(map),
        Some(Value::String(text)) => match serde_json::from_str::<Value>(&text) {
            Ok(Value::Object(map)) => Ok(map),
            Ok(_) => Err(ParseFailure::InvalidStructure),
            Err(err) => {
                warn!(error = %err, "Discarding undecodable ui_json string");
                Ok(AuxStructure::new())
            }
        },
        Some(other) => {
            warn!(kind = value_kind(&other), "Discarding ui_json of unexpected type");
            Ok(AuxStructure::new())
        }
    }
}

fn value_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
