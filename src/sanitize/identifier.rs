//! Widget identifier enforcement.

use regex::Regex;
use tracing::{debug, warn};

/// Names models tend to emit instead of the one they were asked for.
pub const PLACEHOLDER_NAMES: [&str; 8] = [
    "GeneratedWidget",
    "MainWidget",
    "Main",
    "MyWidget",
    "AppWidget",
    "HomeWidget",
    "CustomWidget",
    "UIWidget",
];

/// Every name following a `class` keyword, in source order.
pub fn class_names(code: &str) -> Vec<String> {
    static_regex!(r"\bclass\s+([A-Za-z_]\w*)")
        .captures_iter(code)
        .filter_map(|caps| caps.get(1).map(|m| m.as_str().to_string()))
        .collect()
}

/// True when `code` declares a type called `name`.
pub fn declares_type(code: &str, name: &str) -> bool {
    class_names(code).iter().any(|declared| declared == name)
}

fn first_widget_declaration(code: &str) -> Option<String> {
    static_regex!(
        r"\bclass\s+([A-Za-z_]\w*)(?:\s*<[^>{]*>)?\s+extends\s+(?:StatelessWidget|StatefulWidget)\b"
    )
    .captures(code)
    .and_then(|caps| caps.get(1))
    .map(|m| m.as_str().to_string())
}

/// Make sure `code` declares `required`.
///
/// Nothing is touched when the declaration already exists. Otherwise the first placeholder
/// declaration is renamed, and failing that the first class extending a widget supertype.
/// Returns the code and whether the declaration is present afterwards.
pub fn enforce_identifier(code: &str, required: &str) -> (String, bool) {
    if declares_type(code, required) {
        return (code.to_string(), true);
    }

    let placeholder = class_names(code)
        .into_iter()
        .find(|name| name != required && PLACEHOLDER_NAMES.contains(&name.as_str()));
    let mut current = match placeholder {
        Some(old) => {
            debug!(from = %old, to = required, "Renaming placeholder widget");
            rename_type(code, &old, required)
        }
        None => code.to_string(),
    };

    if !declares_type(&current, required) {
        if let Some(old) = first_widget_declaration(&current) {
            debug!(from = %old, to = required, "Renaming top-level widget");
            current = rename_type(&current, &old, required);
        }
    }

    let enforced = declares_type(&current, required);
    (current, enforced)
}

/// Rewrite the declaration, constructor calls (named ones too) and `State<..>` references of `old`.
fn rename_type(code: &str, old: &str, new: &str) -> String {
    let old = regex::escape(old);
    let patterns = [
        (format!(r"\b(class\s+){}\b", old), format!("${{1}}{}", new)),
        (format!(r"\b{}(\s*\()", old), format!("{}${{1}}", new)),
        (format!(r"\b{}(\.\w+\s*\()", old), format!("{}${{1}}", new)),
        (
            format!(r"\bState<(\s*){}(\s*)>", old),
            format!("State<${{1}}{}${{2}}>", new),
        ),
    ];

    let mut renamed = code.to_string();
    for (pattern, replacement) in patterns.iter() {
        match Regex::new(pattern) {
            Ok(re) => renamed = re.replace_all(&renamed, replacement.as_str()).into_owned(),
            Err(err) => warn!(pattern = %pattern, error = %err, "Skipping rename pattern"),
        }
    }
    renamed
}
