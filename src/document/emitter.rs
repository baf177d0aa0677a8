//! YAML and JSON writers for [`super::Document`].
//!
//! The YAML writer emits block style with sequences at their parent key's
//! indentation, never wraps lines, and writes strings as plain, quoted,
//! folded or literal scalars depending on content and the recorded style.

use std::collections::BTreeMap;
use std::fmt::Write as _;
use std::sync::LazyLock;

use regex::Regex;
use serde::Serialize;
use serde_yaml::{Mapping, Value};

use super::ScalarStyle;
use crate::error::Result;

static NUMBER_LIKE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?x)^(?:
            [-+]?[0-9_]*\.?[0-9_]*(?:[eE][-+]?[0-9]+)?
          | [-+]?0[xXoObB][0-9a-fA-F_]+
          | [-+]?\.(?:inf|Inf|INF)
          | \.(?:nan|NaN|NAN)
          | [-+]?[0-9][0-9_]*(?::[0-5]?[0-9])+(?:\.[0-9_]*)?
          | [0-9]{4}-[0-9]{1,2}-[0-9]{1,2}.*
        )$",
    )
    .expect("number regex")
});

const RESERVED_WORDS: &[&str] = &[
    "true", "false", "yes", "no", "on", "off", "y", "n", "null", "~", "<<", "=",
];

const INDICATORS: &[char] = &[
    '-', '?', ':', ',', '[', ']', '{', '}', '#', '&', '*', '!', '|', '>', '\'', '"', '%', '@',
    '`',
];

pub(super) fn to_yaml(root: &Value, styles: &BTreeMap<String, ScalarStyle>) -> String {
    let mut out = String::new();
    match root {
        Value::Mapping(map) if !map.is_empty() => write_mapping(&mut out, map, 0, Some(""), styles),
        Value::Sequence(seq) if !seq.is_empty() => write_sequence(&mut out, seq, 0, styles),
        other => write_inline(&mut out, other, None, 0, styles),
    }
    out
}

pub(super) fn to_json(root: &Value) -> Result<String> {
    let mut buf = Vec::new();
    let formatter = serde_json::ser::PrettyFormatter::with_indent(b"    ");
    let mut serializer = serde_json::Serializer::with_formatter(&mut buf, formatter);
    root.serialize(&mut serializer)?;
    Ok(String::from_utf8_lossy(&buf).into_owned())
}

fn pad(out: &mut String, indent: usize) {
    out.extend(std::iter::repeat_n(' ', indent));
}

fn child_path(parent: Option<&str>, key: &Value) -> Option<String> {
    let key = key.as_str()?;
    parent.map(|p| {
        if p.is_empty() {
            key.to_string()
        } else {
            format!("{p}.{key}")
        }
    })
}

fn write_mapping(
    out: &mut String,
    map: &Mapping,
    indent: usize,
    path: Option<&str>,
    styles: &BTreeMap<String, ScalarStyle>,
) {
    for (key, value) in map {
        pad(out, indent);
        out.push_str(&key_repr(key));
        out.push(':');
        let child = child_path(path, key);
        write_after_key(out, value, indent, child.as_deref(), styles);
    }
}

fn write_after_key(
    out: &mut String,
    value: &Value,
    indent: usize,
    path: Option<&str>,
    styles: &BTreeMap<String, ScalarStyle>,
) {
    match value {
        Value::Mapping(map) if !map.is_empty() => {
            out.push('\n');
            write_mapping(out, map, indent + 2, path, styles);
        }
        Value::Sequence(seq) if !seq.is_empty() => {
            out.push('\n');
            write_sequence(out, seq, indent, styles);
        }
        Value::Tagged(tagged) => {
            let _ = write!(out, " {}", tagged.tag);
            write_after_key(out, &tagged.value, indent, path, styles);
        }
        other => {
            out.push(' ');
            let style = path.and_then(|p| styles.get(p).copied());
            write_inline(out, other, style, indent + 2, styles);
        }
    }
}

fn write_sequence(
    out: &mut String,
    seq: &[Value],
    indent: usize,
    styles: &BTreeMap<String, ScalarStyle>,
) {
    for item in seq {
        pad(out, indent);
        out.push('-');
        match item {
            Value::Mapping(map) if !map.is_empty() => {
                let mut nested = String::new();
                write_mapping(&mut nested, map, indent + 2, None, styles);
                out.push(' ');
                out.push_str(&nested[indent + 2..]);
            }
            Value::Sequence(inner) if !inner.is_empty() => {
                let mut nested = String::new();
                write_sequence(&mut nested, inner, indent + 2, styles);
                out.push(' ');
                out.push_str(&nested[indent + 2..]);
            }
            Value::Tagged(tagged) => {
                let _ = write!(out, " {}", tagged.tag);
                write_after_key(out, &tagged.value, indent, None, styles);
            }
            other => {
                out.push(' ');
                write_inline(out, other, None, indent + 2, styles);
            }
        }
    }
}

/// Write a scalar or empty collection followed by a newline
fn write_inline(
    out: &mut String,
    value: &Value,
    style: Option<ScalarStyle>,
    block_indent: usize,
    styles: &BTreeMap<String, ScalarStyle>,
) {
    match value {
        Value::Null => out.push_str("null\n"),
        Value::Bool(b) => {
            let _ = writeln!(out, "{b}");
        }
        Value::Number(n) => {
            let _ = writeln!(out, "{n}");
        }
        Value::String(s) => write_string(out, s, style, block_indent),
        Value::Mapping(_) => out.push_str("{}\n"),
        Value::Sequence(_) => out.push_str("[]\n"),
        Value::Tagged(tagged) => {
            let _ = write!(out, "{} ", tagged.tag);
            write_inline(out, &tagged.value, style, block_indent, styles);
        }
    }
}

fn write_string(out: &mut String, s: &str, style: Option<ScalarStyle>, block_indent: usize) {
    let wants_block = match style {
        Some(ScalarStyle::Folded | ScalarStyle::Literal) => true,
        Some(ScalarStyle::Plain) => false,
        None => s.contains('\n'),
    };

    if wants_block && block_safe(s) {
        if style == Some(ScalarStyle::Folded) && fold_safe(s) {
            write_folded(out, s, block_indent);
        } else {
            write_literal(out, s, block_indent);
        }
        return;
    }

    if is_plain_safe(s) {
        out.push_str(s);
    } else if needs_double_quotes(s) {
        write_double_quoted(out, s);
    } else {
        out.push('\'');
        out.push_str(&s.replace('\'', "''"));
        out.push('\'');
    }
    out.push('\n');
}

fn key_repr(key: &Value) -> String {
    match key {
        Value::String(s) if is_plain_safe(s) => s.clone(),
        Value::String(s) if needs_double_quotes(s) => {
            let mut out = String::new();
            write_double_quoted(&mut out, s);
            out
        }
        Value::String(s) => format!("'{}'", s.replace('\'', "''")),
        Value::Null => "null".to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Number(n) => n.to_string(),
        other => serde_yaml::to_string(other)
            .map(|s| s.trim_end().to_string())
            .unwrap_or_default(),
    }
}

/// Whether a string can be written without quotes and read back unchanged
pub(super) fn is_plain_safe(s: &str) -> bool {
    if s.is_empty()
        || s.starts_with(INDICATORS)
        || s.starts_with([' ', '\t'])
        || s.ends_with([' ', '\t', ':'])
        || s.chars().any(|c| c.is_control() || is_special_char(c))
        || s.contains(": ")
        || s.contains(" #")
        || s.starts_with("---")
        || s.starts_with("...")
    {
        return false;
    }
    let lower = s.to_ascii_lowercase();
    if RESERVED_WORDS.contains(&lower.as_str()) {
        return false;
    }
    !NUMBER_LIKE.is_match(s)
}

fn is_special_char(c: char) -> bool {
    matches!(c, '\u{85}' | '\u{2028}' | '\u{2029}' | '\u{feff}')
}

fn needs_double_quotes(s: &str) -> bool {
    s.chars().any(|c| c.is_control() || is_special_char(c))
}

fn write_double_quoted(out: &mut String, s: &str) {
    out.push('"');
    for c in s.chars() {
        match c {
            '\\' => out.push_str("\\\\"),
            '"' => out.push_str("\\\""),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            '\0' => out.push_str("\\0"),
            '\u{85}' => out.push_str("\\N"),
            '\u{2028}' => out.push_str("\\L"),
            '\u{2029}' => out.push_str("\\P"),
            c if c.is_control() || c == '\u{feff}' => {
                let code = u32::from(c);
                if code <= 0xff {
                    let _ = write!(out, "\\x{code:02X}");
                } else {
                    let _ = write!(out, "\\u{code:04X}");
                }
            }
            c => out.push(c),
        }
    }
    out.push('"');
}

/// Whether a string survives a block scalar with auto-detected indentation
fn block_safe(s: &str) -> bool {
    if s.trim_end_matches('\n').is_empty()
        || s
            .chars()
            .any(|c| (c.is_control() && c != '\n' && c != '\t') || is_special_char(c))
    {
        return false;
    }
    for line in s.split('\n') {
        if line.is_empty() {
            continue;
        }
        // first line with content decides the indentation
        return !line.starts_with([' ', '\t']);
    }
    false
}

/// Folding cannot represent whitespace-only lines reliably
fn fold_safe(s: &str) -> bool {
    s.trim_end_matches('\n')
        .split('\n')
        .all(|line| line.is_empty() || !line.trim().is_empty())
}

fn chomping(trailing_newlines: usize) -> &'static str {
    match trailing_newlines {
        0 => "-",
        1 => "",
        _ => "+",
    }
}

fn write_literal(out: &mut String, s: &str, indent: usize) {
    let body = s.trim_end_matches('\n');
    let trailing = s.len() - body.len();
    out.push('|');
    out.push_str(chomping(trailing));
    out.push('\n');
    for line in body.split('\n') {
        if !line.is_empty() {
            pad(out, indent);
            out.push_str(line);
        }
        out.push('\n');
    }
    for _ in 1..trailing {
        out.push('\n');
    }
}

fn write_folded(out: &mut String, s: &str, indent: usize) {
    let body = s.trim_end_matches('\n');
    let trailing = s.len() - body.len();
    out.push('>');
    out.push_str(chomping(trailing));
    out.push('\n');

    let spaced = |line: &str| line.starts_with([' ', '\t']);
    let mut previous: Option<&str> = None;
    let mut empty_run = 0usize;
    for line in body.split('\n') {
        if line.is_empty() {
            empty_run += 1;
            continue;
        }
        match previous {
            None => {
                for _ in 0..empty_run {
                    out.push('\n');
                }
            }
            Some(prev) => {
                // a single break between two plain lines folds into a space,
                // so each source break needs one extra empty line
                let source_breaks = empty_run + 1;
                let written = if spaced(prev) || spaced(line) {
                    source_breaks
                } else {
                    source_breaks + 1
                };
                for _ in 1..written {
                    out.push('\n');
                }
            }
        }
        pad(out, indent);
        out.push_str(line);
        out.push('\n');
        previous = Some(line);
        empty_run = 0;
    }
    for _ in 1..trailing {
        out.push('\n');
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn round_trip(value: &Value, styles: &BTreeMap<String, ScalarStyle>) -> Value {
        let text = to_yaml(value, styles);
        serde_yaml::from_str(&text).unwrap_or_else(|e| panic!("reparse failed: {e}\n{text}"))
    }

    fn single(key: &str, s: &str, style: Option<ScalarStyle>) -> (Value, BTreeMap<String, ScalarStyle>) {
        let mut map = Mapping::new();
        map.insert(Value::String(key.into()), Value::String(s.into()));
        let mut styles = BTreeMap::new();
        if let Some(style) = style {
            styles.insert(key.to_string(), style);
        }
        (Value::Mapping(map), styles)
    }

    #[test]
    fn test_plain_safety() {
        assert!(is_plain_safe("HelloWorld"));
        assert!(is_plain_safe("id:marketplacev2"));
        assert!(is_plain_safe("demisto/python3:3.10.12"));
        assert!(!is_plain_safe("true"));
        assert!(!is_plain_safe("No"));
        assert!(is_plain_safe("5.0.0"));
        assert!(!is_plain_safe("6.5"));
        assert!(!is_plain_safe("-1"));
        assert!(!is_plain_safe("12:30"));
        assert!(!is_plain_safe("2024-01-01"));
        assert!(!is_plain_safe("a: b"));
        assert!(!is_plain_safe("- item"));
        assert!(!is_plain_safe(""));
        assert!(!is_plain_safe("trailing "));
    }

    #[test]
    fn test_quoted_strings_round_trip() {
        for s in [
            "true", "0x1F", "6.5", "a: b", "it's", "#comment", "tab\there", "cr\rlf", "", "~",
            "'quoted'", "\"dq\"", "-", "5.0.0", "1e5", ".inf",
        ] {
            let (value, styles) = single("k", s, None);
            assert_eq!(round_trip(&value, &styles), value, "failed for {s:?}");
        }
    }

    #[test]
    fn test_folded_round_trip() {
        for s in [
            "one line",
            "one line\n",
            "two\nlines",
            "para one\n\npara two\n",
            "code:\n    indented\n    more\nback\n",
            "trailing\n\n\n",
            "\nleading newline",
            "a\n\n\nb",
            "x\n  y\n\n  z\nw",
        ] {
            let (value, styles) = single("k", s, Some(ScalarStyle::Folded));
            assert_eq!(round_trip(&value, &styles), value, "failed for {s:?}");
        }
    }

    #[test]
    fn test_literal_round_trip() {
        for s in [
            "def f():\n    return 1\n",
            "no trailing",
            "keep\n\n",
            "a\n\nb\n",
            "\nstarts empty\n",
        ] {
            let (value, styles) = single("k", s, Some(ScalarStyle::Literal));
            assert_eq!(round_trip(&value, &styles), value, "failed for {s:?}");
        }
    }

    #[test]
    fn test_block_falls_back_when_unsafe() {
        let (value, styles) = single("k", "  indented first\nline", Some(ScalarStyle::Folded));
        let text = to_yaml(&value, &styles);
        assert!(text.starts_with("k: \""));
        assert_eq!(round_trip(&value, &styles), value);
    }

    #[test]
    fn test_folded_header_and_body() {
        let (value, styles) = single("detaileddescription", "Hello world.\n", Some(ScalarStyle::Folded));
        assert_eq!(to_yaml(&value, &styles), "detaileddescription: >\n  Hello world.\n");
    }

    #[test]
    fn test_sequences_at_parent_indent() {
        let value: Value = serde_yaml::from_str(
            "tasks:\n  '1':\n    id: '1'\nlist:\n- a\n- b: 1\n  c: 2\n- - nested\nempty: []\nnone: {}\nn: null\n",
        )
        .unwrap();
        let text = to_yaml(&value, &BTreeMap::new());
        assert!(text.contains("list:\n- a\n- b: 1\n  c: 2\n- - nested\n"));
        assert!(text.contains("empty: []\n"));
        assert!(text.contains("none: {}\n"));
        assert!(text.contains("'n': null\n"));
        assert!(text.contains("  '1':\n    id: '1'\n"));
        assert_eq!(round_trip(&value, &BTreeMap::new()), value);
    }

    #[test]
    fn test_no_line_wrapping() {
        let long = "word ".repeat(500).trim_end().to_string();
        let (value, styles) = single("description", &long, None);
        let text = to_yaml(&value, &styles);
        assert_eq!(text.lines().count(), 1);
    }

    #[test]
    fn test_json_indent() {
        let value: Value = serde_json::from_str(r#"{"a": [1, {"b": "c"}]}"#).unwrap();
        let text = to_json(&value).unwrap();
        assert!(text.contains("\n    \"a\": [\n        1,"));
    }
}
