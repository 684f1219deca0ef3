//! System prompts sent ahead of the user's UI description.

/// Separator between the system prompt and the user's description.
pub const USER_REQUEST_PREFIX: &str = "\n\nUser request: ";

/// Full prompt for one request.
pub fn build_prompt(widget_name: &str, structured: bool, user_prompt: &str) -> String {
    let system = if structured {
        structured_system_prompt(widget_name)
    } else {
        plain_system_prompt(widget_name)
    };
    format!("{}{}{}", system, USER_REQUEST_PREFIX, user_prompt.trim())
}

fn design_rules(widget_name: &str) -> String {
    format!(
        r#"You are an expert Flutter/Dart UI designer generating polished, modern mobile screens.

WIDGET NAMING:
- The main widget class MUST be named exactly: {name}
- Do not use placeholder names such as GeneratedWidget, MyWidget or MainWidget.

DESIGN:
- Material Design 3, consistent spacing in 8/16/24/32 increments, clear typography.
- Cards with rounded corners and elevation, gradients where they help, outlined icons.
- Scaffold with a styled AppBar; scrollable content via SingleChildScrollView or ListView.
- Styled buttons and TextFormFields with decorations and validation.
- Realistic sample data, empty states and feedback (SnackBar, dialogs) where relevant.

CODE:
1. Use StatelessWidget or StatefulWidget as appropriate.
2. Include every import the widget needs, starting with package:flutter/material.dart.
3. Keep the widget self-contained, null-safe and idiomatic.
4. Name the main widget EXACTLY: {name}"#,
        name = widget_name
    )
}

/// Asks for a single JSON object carrying the code and a UI description.
pub fn structured_system_prompt(widget_name: &str) -> String {
    format!(
        r##"{rules}

Return two outputs in ONE JSON object with keys "code" and "ui_json":
- "code": the complete Dart source as a string.
- "ui_json": a description of the widget tree using this shape:
  {{"type": "Scaffold", "properties": {{"backgroundColor": "#F5F7FA"}}, "children": [...]}}
  Include colors, spacing, typography and interaction properties.

FORMAT:
- Start immediately with {{ and end with }}.
- No markdown fences and no commentary."##,
        rules = design_rules(widget_name)
    )
}

/// Asks for bare Dart source.
pub fn plain_system_prompt(widget_name: &str) -> String {
    format!(
        r#"{rules}

FORMAT:
- Return ONLY the Dart source code for the widget.
- No explanations before or after the code."#,
        rules = design_rules(widget_name)
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_prompt_names_widget_and_appends_request() {
        let prompt = build_prompt("GroqGeneratedWidget", true, "  login screen ");
        assert!(prompt.contains("MUST be named exactly: GroqGeneratedWidget"));
        assert!(prompt.contains("\"ui_json\""));
        assert!(prompt.ends_with("User request: login screen"));
    }

    #[test]
    fn test_structured_prompt_keeps_color_example_and_format_rules() {
        let prompt = structured_system_prompt("Bar");
        assert!(prompt.contains(r##""backgroundColor": "#F5F7FA"}, "children""##));
        assert!(prompt.ends_with("- No markdown fences and no commentary."));
    }

    #[test]
    fn test_plain_prompt_does_not_request_json() {
        let prompt = build_prompt("OllamaGeneratedWidget", false, "settings page");
        assert!(!prompt.contains("ui_json"));
        assert!(prompt.contains("ONLY the Dart source"));
    }
}
