//! Spacing normalisation and brace-depth reindentation.

use regex::Captures;

const INDENT: &str = "  ";

/// One slice of a source line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Segment<'a> {
    Code(&'a str),
    /// String literal or trailing `//` comment; never rewritten.
    Verbatim(&'a str),
}

/// Split a line into code and verbatim slices. Unterminated literals run to the end of the
/// line.
fn segments(line: &str) -> Vec<Segment<'_>> {
    let mut out = Vec::new();
    let mut start = 0;
    let mut quote: Option<char> = None;
    let mut escaped = false;
    let mut chars = line.char_indices().peekable();

    while let Some((i, c)) = chars.next() {
        match quote {
            Some(q) => {
                if escaped {
                    escaped = false;
                } else if c == '\\' {
                    escaped = true;
                } else if c == q {
                    out.push(Segment::Verbatim(&line[start..=i]));
                    start = i + 1;
                    quote = None;
                }
            }
            None => {
                if c == '\'' || c == '"' {
                    if start < i {
                        out.push(Segment::Code(&line[start..i]));
                    }
                    start = i;
                    quote = Some(c);
                } else if c == '/' && matches!(chars.peek(), Some((_, '/'))) {
                    if start < i {
                        out.push(Segment::Code(&line[start..i]));
                    }
                    out.push(Segment::Verbatim(&line[i..]));
                    return out;
                }
            }
        }
    }

    if start < line.len() {
        let rest = &line[start..];
        out.push(if quote.is_some() {
            Segment::Verbatim(rest)
        } else {
            Segment::Code(rest)
        });
    }
    out
}

/// `name:value` -> `name: value`, then collapse runs of three or more spaces.
///
/// `following` is the rest of the line after this segment. A colon directly ahead of `/`
/// is left alone so scheme separators stay intact, as is the `package:` import prefix.
fn normalize_code(segment: &str, following: &str) -> String {
    let colon = static_regex!(r"\b([A-Za-z_]\w*):[ \t]*");
    let spaced = colon.replace_all(segment, |caps: &Captures| {
        let whole = &caps[0];
        let name = &caps[1];
        let end = caps.get(0).map(|m| m.end()).unwrap_or(segment.len());
        let next = segment[end..]
            .chars()
            .next()
            .or_else(|| following.chars().next());
        if name == "package" || next == Some('/') {
            whole.to_string()
        } else {
            format!("{}: ", name)
        }
    });
    static_regex!(r" {3,}").replace_all(&spaced, " ").into_owned()
}

/// Normalise spacing outside literals and comments on one trimmed line.
pub fn normalize_line(line: &str) -> String {
    let parts = segments(line);
    let mut out = String::with_capacity(line.len() + 8);
    let mut offset = 0;
    for part in parts.iter() {
        match part {
            Segment::Code(text) => {
                let following = &line[offset + text.len()..];
                out.push_str(&normalize_code(text, following));
                offset += text.len();
            }
            Segment::Verbatim(text) => {
                out.push_str(text);
                offset += text.len();
            }
        }
    }
    out.trim().to_string()
}

/// Strip every line, normalise its spacing, and indent it two spaces per open brace.
/// Blank lines are kept empty.
pub fn apply_layout(code: &str) -> String {
    let mut depth = 0usize;
    let mut lines = Vec::new();

    for raw_line in code.lines() {
        let line = normalize_line(raw_line.trim());
        if line.is_empty() {
            lines.push(String::new());
            continue;
        }
        if line.starts_with('}') {
            depth = depth.saturating_sub(1);
        }
        lines.push(format!("{}{}", INDENT.repeat(depth), line));
        if line.ends_with('{') {
            depth += 1;
        }
    }

    lines.join("\n").trim().to_string()
}
