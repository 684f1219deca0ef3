//! Known-good placeholder artifact returned whenever generation or retrieval fails.

use crate::types::AuxStructure;
use serde_json::{json, Value};
use tracing::warn;

const WIDGET_SLOT: &str = "__WIDGET__";

const TEMPLATE: &str = r#"import 'package:flutter/material.dart';

class __WIDGET__ extends StatelessWidget {
  const __WIDGET__({super.key});

  @override
  Widget build(BuildContext context) {
    return Scaffold(
      backgroundColor: const Color(0xFFF5F7FA),
      appBar: AppBar(
        title: const Text(
          'Widget Preview',
          style: TextStyle(
            fontWeight: FontWeight.w600,
            color: Colors.white,
          ),
        ),
        backgroundColor: const Color(0xFF6366F1),
        elevation: 0,
        centerTitle: true,
      ),
      body: Container(
        decoration: const BoxDecoration(
          gradient: LinearGradient(
            begin: Alignment.topCenter,
            end: Alignment.bottomCenter,
            colors: [
              Color(0xFFF5F7FA),
              Color(0xFFE8EDF5),
            ],
          ),
        ),
        child: Center(
          child: Padding(
            padding: const EdgeInsets.all(24.0),
            child: Card(
              elevation: 8,
              shape: RoundedRectangleBorder(
                borderRadius: BorderRadius.circular(16),
              ),
              child: Padding(
                padding: const EdgeInsets.all(32.0),
                child: Column(
                  mainAxisSize: MainAxisSize.min,
                  children: [
                    Container(
                      width: 80,
                      height: 80,
                      decoration: BoxDecoration(
                        color: const Color(0xFF6366F1).withOpacity(0.1),
                        borderRadius: BorderRadius.circular(40),
                      ),
                      child: const Icon(
                        Icons.auto_awesome,
                        size: 40,
                        color: Color(0xFF6366F1),
                      ),
                    ),
                    const SizedBox(height: 24),
                    const Text(
                      'Your widget is on its way',
                      style: TextStyle(
                        fontSize: 22,
                        fontWeight: FontWeight.bold,
                        color: Color(0xFF1F2937),
                      ),
                      textAlign: TextAlign.center,
                    ),
                    const SizedBox(height: 12),
                    const Text(
                      'Describe a screen and try again.',
                      style: TextStyle(
                        fontSize: 14,
                        color: Color(0xFF6B7280),
                        height: 1.5,
                      ),
                      textAlign: TextAlign.center,
                    ),
                    const SizedBox(height: 32),
                    ElevatedButton(
                      onPressed: () {},
                      style: ElevatedButton.styleFrom(
                        backgroundColor: const Color(0xFF6366F1),
                        foregroundColor: Colors.white,
                        padding: const EdgeInsets.symmetric(
                          horizontal: 32,
                          vertical: 16,
                        ),
                        shape: RoundedRectangleBorder(
                          borderRadius: BorderRadius.circular(12),
                        ),
                        elevation: 4,
                      ),
                      child: const Text(
                        'Get Started',
                        style: TextStyle(
                          fontSize: 16,
                          fontWeight: FontWeight.w600,
                        ),
                      ),
                    ),
                  ],
                ),
              ),
            ),
          ),
        ),
      ),
    );
  }
}"#;

/// Placeholder code plus its UI description.
#[derive(Debug, Clone, PartialEq)]
pub struct FallbackArtifact {
    pub code: String,
    pub aux_structure: AuxStructure,
}

/// Build the placeholder for `identifier`. `reason` is only logged.
pub fn get_fallback(reason: &str, identifier: &str) -> FallbackArtifact {
    warn!(reason, identifier, "Serving fallback widget");
    FallbackArtifact {
        code: TEMPLATE.replace(WIDGET_SLOT, identifier),
        aux_structure: fallback_structure(),
    }
}

fn fallback_structure() -> AuxStructure {
    let tree = json!({
        "type": "Scaffold",
        "properties": {
            "backgroundColor": "#F5F7FA",
            "appBar": {
                "type": "AppBar",
                "properties": {
                    "title": "Widget Preview",
                    "backgroundColor": "#6366F1",
                    "elevation": 0,
                    "centerTitle": true,
                    "titleStyle": {"fontWeight": "w600", "color": "#FFFFFF"}
                }
            }
        },
        "children": [{
            "type": "Container",
            "properties": {
                "decoration": {
                    "gradient": {
                        "type": "LinearGradient",
                        "begin": "topCenter",
                        "end": "bottomCenter",
                        "colors": ["#F5F7FA", "#E8EDF5"]
                    }
                }
            },
            "children": [{
                "type": "Center",
                "children": [{
                    "type": "Card",
                    "properties": {"elevation": 8, "borderRadius": 16, "padding": {"all": 32.0}},
                    "children": [{
                        "type": "Column",
                        "properties": {"mainAxisSize": "min"},
                        "children": [
                            {
                                "type": "Icon",
                                "properties": {"icon": "Icons.auto_awesome", "size": 40, "color": "#6366F1"}
                            },
                            {
                                "type": "Text",
                                "properties": {
                                    "text": "Your widget is on its way",
                                    "style": {"fontSize": 22, "fontWeight": "bold", "color": "#1F2937"}
                                }
                            },
                            {
                                "type": "ElevatedButton",
                                "properties": {
                                    "text": "Get Started",
                                    "style": {"backgroundColor": "#6366F1", "borderRadius": 12, "elevation": 4}
                                }
                            }
                        ]
                    }]
                }]
            }]
        }]
    });
    match tree {
        Value::Object(map) => map,
        _ => AuxStructure::new(),
    }
}
