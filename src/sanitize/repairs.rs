//! Ordered textual repairs for defects models commonly introduce.
//!
//! Each repair is a pure `&str -> String` function; [`apply_repairs`] folds them in order
//! and records which ones changed the text.

use regex::Captures;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Import every generated widget needs.
pub const MATERIAL_IMPORT: &str = "import 'package:flutter/material.dart';";

/// Identifies one repair in [`super::SanitationResult::applied_fixes`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RepairKind {
    /// `import 'package:  x` -> `import 'package:x`
    PackageImportSpacing,
    /// `;;` -> `;`
    DuplicateSemicolons,
    /// `https: //` -> `https://`
    UrlSchemeSpacing,
    /// `9: 30` -> `9:30`
    TimeLiteralSpacing,
    /// Prepend the material import when absent.
    MissingMaterialImport,
}

impl RepairKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            RepairKind::PackageImportSpacing => "package_import_spacing",
            RepairKind::DuplicateSemicolons => "duplicate_semicolons",
            RepairKind::UrlSchemeSpacing => "url_scheme_spacing",
            RepairKind::TimeLiteralSpacing => "time_literal_spacing",
            RepairKind::MissingMaterialImport => "missing_material_import",
        }
    }
}

impl fmt::Display for RepairKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

struct Repair {
    kind: RepairKind,
    apply: fn(&str) -> String,
}

const REPAIRS: [Repair; 5] = [
    Repair {
        kind: RepairKind::PackageImportSpacing,
        apply: fix_package_import,
    },
    Repair {
        kind: RepairKind::DuplicateSemicolons,
        apply: collapse_semicolons,
    },
    Repair {
        kind: RepairKind::UrlSchemeSpacing,
        apply: fix_url_scheme,
    },
    Repair {
        kind: RepairKind::TimeLiteralSpacing,
        apply: fix_time_literal,
    },
    Repair {
        kind: RepairKind::MissingMaterialImport,
        apply: ensure_material_import,
    },
];

/// Apply every repair once, in order.
pub fn apply_repairs(text: &str) -> (String, Vec<RepairKind>) {
    REPAIRS.iter().fold(
        (text.to_string(), Vec::new()),
        |(current, mut applied), repair| {
            let next = (repair.apply)(&current);
            if next != current {
                applied.push(repair.kind);
            }
            (next, applied)
        },
    )
}

fn fix_package_import(text: &str) -> String {
    static_regex!(r#"(import\s+['"]package:)[ \t]+"#)
        .replace_all(text, "${1}")
        .into_owned()
}

fn collapse_semicolons(text: &str) -> String {
    let runs = static_regex!(r";{2,}");
    runs.replace_all(text, |caps: &Captures| {
        let Some(run) = caps.get(0) else {
            return String::new();
        };
        // `for (;;)` is the one place a doubled semicolon is legitimate.
        let bare_loop = text[..run.start()].trim_end().ends_with('(')
            && text[run.end()..].trim_start().starts_with(')');
        if bare_loop {
            run.as_str().to_string()
        } else {
            ";".to_string()
        }
    })
    .into_owned()
}

fn fix_url_scheme(text: &str) -> String {
    static_regex!(r"\b(https?|wss?|ftp|file):[ \t]+//")
        .replace_all(text, "${1}://")
        .into_owned()
}

fn fix_time_literal(text: &str) -> String {
    static_regex!(r"\b(\d{1,2}):[ \t]+(\d{2})\b")
        .replace_all(text, "${1}:${2}")
        .into_owned()
}

fn ensure_material_import(text: &str) -> String {
    let present = static_regex!(r#"import\s+['"]package:flutter/material\.dart['"]"#);
    if present.is_match(text) {
        text.to_string()
    } else {
        format!("{}\n\n{}", MATERIAL_IMPORT, text)
    }
}
