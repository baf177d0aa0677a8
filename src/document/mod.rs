//! Ordered content documents.
//!
//! A [`Document`] wraps a `serde_yaml::Value` (whose mappings keep insertion
//! order) together with the source format and a table of block-scalar styles
//! keyed by dotted path, so that folded and literal text survives a
//! load/modify/write cycle.

mod emitter;

use std::collections::BTreeMap;

use serde_yaml::{Mapping, Value};

use crate::error::{PackError, Result};

/// On-disk encoding of a document
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentFormat {
    Yaml,
    Json,
}

impl DocumentFormat {
    /// Pick the format from a file extension
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext.to_ascii_lowercase().as_str() {
            "yml" | "yaml" => Some(DocumentFormat::Yaml),
            "json" => Some(DocumentFormat::Json),
            _ => None,
        }
    }
}

/// How a string scalar is written back to YAML
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScalarStyle {
    Plain,
    Folded,
    Literal,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Document {
    root: Value,
    format: DocumentFormat,
    styles: BTreeMap<String, ScalarStyle>,
}

impl Document {
    pub fn new(root: Value, format: DocumentFormat) -> Self {
        Self {
            root,
            format,
            styles: BTreeMap::new(),
        }
    }

    /// Empty mapping document
    pub fn empty(format: DocumentFormat) -> Self {
        Self::new(Value::Mapping(Mapping::new()), format)
    }

    pub fn parse(text: &str, format: DocumentFormat) -> Result<Self> {
        match format {
            DocumentFormat::Yaml => Self::parse_yaml(text),
            DocumentFormat::Json => Self::parse_json(text),
        }
    }

    pub fn parse_yaml(text: &str) -> Result<Self> {
        let root: Value = serde_yaml::from_str(text)?;
        Ok(Self {
            root,
            format: DocumentFormat::Yaml,
            styles: scan_block_styles(text),
        })
    }

    pub fn parse_json(text: &str) -> Result<Self> {
        let root: Value = serde_json::from_str(text)?;
        Ok(Self::new(root, DocumentFormat::Json))
    }

    pub fn format(&self) -> DocumentFormat {
        self.format
    }

    pub fn root(&self) -> &Value {
        &self.root
    }

    pub fn root_mut(&mut self) -> &mut Value {
        &mut self.root
    }

    pub fn mapping(&self) -> Option<&Mapping> {
        self.root.as_mapping()
    }

    /// Top-level keys in order
    pub fn keys(&self) -> Vec<String> {
        self.mapping()
            .map(|m| {
                m.keys()
                    .filter_map(|k| k.as_str().map(str::to_string))
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Look up a dotted path through nested mappings
    pub fn get(&self, path: &str) -> Option<&Value> {
        path.split('.')
            .try_fold(&self.root, |node, key| node.as_mapping()?.get(key))
    }

    pub fn get_mut(&mut self, path: &str) -> Option<&mut Value> {
        path.split('.')
            .try_fold(&mut self.root, |node, key| node.as_mapping_mut()?.get_mut(key))
    }

    pub fn get_str(&self, path: &str) -> Option<&str> {
        self.get(path).and_then(Value::as_str)
    }

    /// Truthy boolean at `path`, accepting `"true"` strings as some authors write them
    pub fn get_bool(&self, path: &str) -> bool {
        match self.get(path) {
            Some(Value::Bool(b)) => *b,
            Some(Value::String(s)) => s.eq_ignore_ascii_case("true"),
            _ => false,
        }
    }

    pub fn contains(&self, path: &str) -> bool {
        self.get(path).is_some()
    }

    /// Set a value at a dotted path, creating intermediate mappings.
    ///
    /// Existing keys keep their position; new keys are appended.
    pub fn set(&mut self, path: &str, value: Value) {
        let mut parts: Vec<&str> = path.split('.').collect();
        let Some(last) = parts.pop() else {
            return;
        };
        let mut node = &mut self.root;
        for part in parts {
            if !node.is_mapping() {
                *node = Value::Mapping(Mapping::new());
            }
            let Some(map) = node.as_mapping_mut() else {
                return;
            };
            if !map.get(part).is_some_and(Value::is_mapping) {
                map.insert(Value::String(part.to_string()), Value::Mapping(Mapping::new()));
            }
            let Some(next) = map.get_mut(part) else {
                return;
            };
            node = next;
        }
        if !node.is_mapping() {
            *node = Value::Mapping(Mapping::new());
        }
        if let Some(map) = node.as_mapping_mut() {
            map.insert(Value::String(last.to_string()), value);
        }
    }

    pub fn set_str(&mut self, path: &str, value: impl Into<String>) {
        self.set(path, Value::String(value.into()));
    }

    /// Set a string and record the block style it is written with
    pub fn set_styled(&mut self, path: &str, value: impl Into<String>, style: ScalarStyle) {
        self.set_str(path, value);
        self.styles.insert(path.to_string(), style);
    }

    /// Remove the value at a dotted path, keeping the order of its siblings
    pub fn remove(&mut self, path: &str) -> Option<Value> {
        let (parent, key) = match path.rsplit_once('.') {
            Some((parent, key)) => (self.get_mut(parent)?, key),
            None => (&mut self.root, path),
        };
        let removed = parent.as_mapping_mut()?.shift_remove(key);
        if removed.is_some() {
            self.styles.remove(path);
        }
        removed
    }

    pub fn style(&self, path: &str) -> Option<ScalarStyle> {
        self.styles.get(path).copied()
    }

    pub fn set_style(&mut self, path: &str, style: ScalarStyle) {
        self.styles.insert(path.to_string(), style);
    }

    /// Move a recorded style when a key is renamed
    pub fn rename_style(&mut self, from: &str, to: &str) {
        if let Some(style) = self.styles.remove(from) {
            self.styles.insert(to.to_string(), style);
        }
        let prefix = format!("{from}.");
        let nested: Vec<String> = self
            .styles
            .keys()
            .filter(|k| k.starts_with(&prefix))
            .cloned()
            .collect();
        for key in nested {
            if let Some(style) = self.styles.remove(&key) {
                self.styles.insert(format!("{to}.{}", &key[prefix.len()..]), style);
            }
        }
    }

    /// Drop styles whose paths no longer resolve to strings
    pub fn prune_styles(&mut self) {
        let stale: Vec<String> = self
            .styles
            .keys()
            .filter(|k| !self.get(k).is_some_and(Value::is_string))
            .cloned()
            .collect();
        for key in stale {
            self.styles.remove(&key);
        }
    }

    /// Serialize in the document's own format
    pub fn to_text(&self) -> Result<String> {
        match self.format {
            DocumentFormat::Yaml => Ok(self.to_yaml()),
            DocumentFormat::Json => self.to_json(),
        }
    }

    /// Block-style YAML without line wrapping
    pub fn to_yaml(&self) -> String {
        emitter::to_yaml(&self.root, &self.styles)
    }

    /// JSON with four-space indentation
    pub fn to_json(&self) -> Result<String> {
        emitter::to_json(&self.root)
    }
}

/// Find keys introduced with `|` or `>` block headers, by dotted path.
///
/// Paths under sequences are not tracked; their scalars are written with
/// the default style for their content.
fn scan_block_styles(text: &str) -> BTreeMap<String, ScalarStyle> {
    let mut styles = BTreeMap::new();
    // (indent, key) where None marks a sequence entry
    let mut stack: Vec<(usize, Option<String>)> = Vec::new();
    let mut block_indent: Option<usize> = None;

    for line in text.lines() {
        let trimmed = line.trim_start();
        if trimmed.is_empty() {
            continue;
        }
        let indent = line.len() - trimmed.len();
        if let Some(header_indent) = block_indent {
            if indent > header_indent {
                continue;
            }
            block_indent = None;
        }
        if trimmed.starts_with('#') {
            continue;
        }
        while stack.last().is_some_and(|(i, _)| *i >= indent) {
            stack.pop();
        }

        if trimmed == "-" || trimmed.starts_with("- ") {
            stack.push((indent, None));
            if block_header(trimmed.rsplit(' ').next().unwrap_or("")).is_some() {
                block_indent = Some(indent);
            }
            continue;
        }

        let Some((key, rest)) = split_mapping_line(trimmed) else {
            continue;
        };
        if let Some(style) = block_header(rest) {
            if stack.iter().all(|(_, k)| k.is_some()) {
                let mut path: Vec<&str> = stack.iter().filter_map(|(_, k)| k.as_deref()).collect();
                path.push(&key);
                styles.insert(path.join("."), style);
            }
            block_indent = Some(indent);
        }
        stack.push((indent, Some(key)));
    }
    styles
}

/// Split `key: rest` on the first colon followed by a space or end of line
fn split_mapping_line(line: &str) -> Option<(String, &str)> {
    let bytes = line.as_bytes();
    if let Some(quote @ (b'\'' | b'"')) = bytes.first().copied() {
        let close = line[1..].find(quote as char)? + 1;
        let after = &line[close + 1..];
        let rest = after.strip_prefix(':')?;
        return Some((line[1..close].to_string(), rest.trim()));
    }
    let mut i = 0;
    while i < bytes.len() {
        if bytes[i] == b':' && (i + 1 == bytes.len() || bytes[i + 1] == b' ') {
            return Some((line[..i].to_string(), line[i + 1..].trim()));
        }
        i += 1;
    }
    None
}

/// Recognize a block scalar header such as `>-`, `|+` or `|2`
fn block_header(rest: &str) -> Option<ScalarStyle> {
    let rest = rest.split(" #").next().unwrap_or("").trim();
    let mut chars = rest.chars();
    let style = match chars.next()? {
        '>' => ScalarStyle::Folded,
        '|' => ScalarStyle::Literal,
        _ => return None,
    };
    chars
        .all(|c| matches!(c, '+' | '-' | '1'..='9'))
        .then_some(style)
}
