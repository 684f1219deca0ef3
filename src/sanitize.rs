//! Response sanitation: turns raw model text into a consistently formatted Dart artifact.
//!
//! The stages run in a fixed order:
//! 1. strip markdown fences and surrounding whitespace
//! 2. (structured payloads only) isolate the outermost `{ ... }` block, see [`extract_payload`]
//! 3. fold the ordered [`repairs`] over the text
//! 4. enforce the required widget identifier
//! 5. normalise spacing and reindent by brace depth
//!
//! Running [`sanitize`] on its own output yields the same code.

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

/// Compile a constant pattern once and hand out a `&'static Regex`.
macro_rules! static_regex {
    ($pattern:expr) => {{
        static RE: std::sync::OnceLock<regex::Regex> = std::sync::OnceLock::new();
        RE.get_or_init(|| regex::Regex::new($pattern).expect("static regex pattern"))
    }};
}

pub mod identifier;
pub mod layout;
pub mod repairs;

pub use identifier::{declares_type, enforce_identifier, PLACEHOLDER_NAMES};
pub use repairs::{RepairKind, MATERIAL_IMPORT};

/// Outcome of one sanitation pass.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SanitationResult {
    pub code: String,
    /// The required declaration is present after identifier enforcement.
    pub identifier_enforced: bool,
    /// Repairs that changed the text, in application order.
    pub applied_fixes: Vec<RepairKind>,
}

/// Remove ```` ```json ````, ```` ```dart ```` and bare ```` ``` ```` fences, then trim.
pub fn strip_fences(raw: &str) -> String {
    let fence = static_regex!(r"```(?i:json|dart)?[ \t]*\r?\n?");
    let mut text = raw.to_string();
    // Removing one fence can splice stray backticks into a new one.
    while text.contains("```") {
        text = fence.replace_all(&text, "").into_owned();
    }
    text.trim().to_string()
}

/// Stages 1 and 2 for providers that answer with a structured payload.
///
/// When the stripped text does not already start with `{`, slice from the first `{` to the
/// last `}`; if no such ordered pair exists the stripped text is returned unchanged.
pub fn extract_payload(raw: &str) -> String {
    let stripped = strip_fences(raw);
    if stripped.starts_with('{') {
        return stripped;
    }
    match (stripped.find('{'), stripped.rfind('}')) {
        (Some(start), Some(end)) if end > start => {
            debug!(start, end, "Isolated structured payload");
            stripped[start..=end].to_string()
        }
        _ => stripped,
    }
}

/// Run stages 1, 3, 4 and 5 over plain code. Never fails.
pub fn sanitize(raw: &str, required_identifier: &str) -> SanitationResult {
    let stripped = strip_fences(raw);
    let (repaired, applied_fixes) = repairs::apply_repairs(&stripped);
    let (renamed, identifier_enforced) = enforce_identifier(&repaired, required_identifier);
    let code = layout::apply_layout(&renamed);

    if !identifier_enforced {
        warn!(
            identifier = required_identifier,
            "No widget declaration could be renamed to the required identifier"
        );
    }
    debug!(
        identifier = required_identifier,
        identifier_enforced,
        applied_fixes = ?applied_fixes,
        code_len = code.len(),
        "Sanitized response"
    );

    SanitationResult {
        code,
        identifier_enforced,
        applied_fixes,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_strip_fences_variants() {
        assert_eq!(strip_fences("```dart\nclass A {}\n```"), "class A {}");
        assert_eq!(strip_fences("  ```json\n{\"a\": 1}```  "), "{\"a\": 1}");
        assert_eq!(strip_fences("``````"), "");
        assert_eq!(strip_fences("no fences"), "no fences");
    }

    #[test]
    fn test_extract_payload_slices_braces() {
        assert_eq!(
            extract_payload("Here you go: {\"code\": \"x\"} hope it helps"),
            "{\"code\": \"x\"}"
        );
        assert_eq!(extract_payload("} backwards {"), "} backwards {");
        assert_eq!(extract_payload("```json\n{\"a\":1}\n```"), "{\"a\":1}");
    }

    #[test]
    fn test_fenced_widget_is_fully_repaired() {
        let raw = "```dart\nimport 'package:  flutter/material.dart';;\nclass Foo extends StatelessWidget {\nconst Foo({super.key});\n@override\nWidget build(BuildContext context) {\nreturn const Text('opens at 9: 30');\n}\n}\n```";
        let result = sanitize(raw, "Bar");

        assert!(result.identifier_enforced);
        assert!(!result.code.contains("```"));
        assert!(result.code.starts_with("import 'package:flutter/material.dart';"));
        assert!(result.code.contains("class Bar extends StatelessWidget {"));
        assert!(result.code.contains("  const Bar({super.key});"));
        assert!(result.code.contains("'opens at 9:30'"));
        assert!(!result.code.contains("Foo"));
        assert_eq!(
            result.applied_fixes,
            vec![
                RepairKind::PackageImportSpacing,
                RepairKind::DuplicateSemicolons,
                RepairKind::TimeLiteralSpacing,
            ]
        );
    }

    #[test]
    fn test_missing_import_is_prepended() {
        let result = sanitize("class Bar extends StatelessWidget {\n}", "Bar");
        assert!(result.code.starts_with("import 'package:flutter/material.dart';\n\nclass Bar"));
        assert_eq!(result.applied_fixes, vec![RepairKind::MissingMaterialImport]);
    }

    #[test]
    fn test_second_pass_applies_nothing() {
        let first = sanitize("```dart\nclass MyWidget extends StatelessWidget {\nfinal url = 'https: //x.io';\n}\n```", "Bar");
        let second = sanitize(&first.code, "Bar");
        assert_eq!(first.code, second.code);
        assert!(second.applied_fixes.is_empty());
    }

    const FRAGMENTS: [&str; 21] = [
        "class ",
        "MyWidget",
        "Foo",
        " extends StatelessWidget",
        " extends StatefulWidget",
        "State<Foo>",
        "import 'package:  flutter/material.dart';",
        "```dart\n",
        "```",
        ";;",
        "https: //",
        "12: 30",
        "// note: x",
        "color:Colors.red",
        "   ",
        "{\n",
        "}\n",
        "(",
        ")",
        "'",
        "\"",
    ];

    fn dartish() -> impl Strategy<Value = String> {
        let token = prop_oneof![
            3 => prop::sample::select(FRAGMENTS.to_vec()).prop_map(str::to_string),
            1 => "[a-zA-Z0-9_ :;,.{}()<>/'\"\\\\\t\n-]{0,12}",
        ];
        prop::collection::vec(token, 0..40).prop_map(|parts| parts.concat())
    }

    proptest! {
        #[test]
        fn prop_sanitize_is_idempotent(raw in dartish(), named_bar in any::<bool>()) {
            let name = if named_bar { "Bar" } else { "GroqGeneratedWidget" };
            let once = sanitize(&raw, name);
            let twice = sanitize(&once.code, name);
            prop_assert_eq!(&once.code, &twice.code);
            prop_assert_eq!(once.identifier_enforced, twice.identifier_enforced);
        }
    }
}
