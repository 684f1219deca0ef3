//! Sanitizer behaviour on realistic model output.

use widgetforge::payload;
use widgetforge::sanitize::{extract_payload, sanitize, RepairKind, MATERIAL_IMPORT};

const SAMPLES: [&str; 4] = [
    "```dart\nclass GeneratedWidget extends StatelessWidget {\nWidget build(BuildContext context) {\nreturn Image.network('https: //example.com/a.png');\n}\n}\n```",
    "import 'package:flutter/material.dart';\n\nclass HomeWidget extends StatefulWidget {\n@override\nState<HomeWidget> createState() => _HomeWidgetState();\n}\n\nclass _HomeWidgetState extends State<HomeWidget> {\nint count = 0;;\n}",
    "class Screen extends StatelessWidget {\n  // child: keep this comment\n  final String label = 'a:   b';\n}",
    "",
];

#[test]
fn test_sanitize_is_idempotent_on_samples() {
    for sample in SAMPLES {
        let once = sanitize(sample, "TargetWidget");
        let twice = sanitize(&once.code, "TargetWidget");
        assert_eq!(once.code, twice.code, "sample: {:?}", sample);
        assert!(twice.applied_fixes.is_empty(), "sample: {:?}", sample);
    }
}

#[test]
fn test_stateful_widget_renamed_everywhere() {
    let result = sanitize(SAMPLES[1], "CounterPage");
    assert!(result.identifier_enforced);
    assert!(result.code.contains("class CounterPage extends StatefulWidget"));
    assert!(result.code.contains("State<CounterPage> createState()"));
    assert!(result.applied_fixes.contains(&RepairKind::DuplicateSemicolons));
}

#[test]
fn test_url_and_import_repairs() {
    let result = sanitize(SAMPLES[0], "Gallery");
    assert!(result.code.starts_with(MATERIAL_IMPORT));
    assert!(result.code.contains("https://example.com/a.png"));
    assert!(result.code.contains("class Gallery extends StatelessWidget"));
}

#[test]
fn test_payload_code_survives_parse() {
    let code = "class A extends StatelessWidget {\n  const A();\n}";
    let raw = format!(
        "```json\n{}\n```",
        serde_json::json!({ "code": code, "ui_json": { "type": "Text" } })
    );
    let parsed = payload::parse(&extract_payload(&raw)).unwrap();
    assert_eq!(parsed.code, code);
    assert_eq!(parsed.aux_structure["type"], "Text");

    let err = payload::parse("{\"code\": \"   \"}").unwrap_err();
    assert_eq!(err.to_string(), "no code in response");
}
