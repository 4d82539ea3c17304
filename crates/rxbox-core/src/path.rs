//! Key-path parsing and resolution.
//!
//! A key path addresses a value inside a nested state tree using dotted
//! segments with optional bracket indexes: `a.b[2].c` is the same path as
//! `a.b.2.c`. Resolution is soft: a missing key, an out-of-range index or a
//! step into a scalar yields `None` ("absent"), which is distinct from a
//! present `null`.

use serde_json::Value;
use std::fmt;

/// A parsed key path.
///
/// Parsing never fails. Bracket segments made of word characters
/// (`[A-Za-z0-9_]`) are rewritten to dotted segments; any other bracket text
/// is kept literally as part of its segment.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct KeyPath {
    raw: String,
    segments: Vec<String>,
}

impl KeyPath {
    /// Parse a key path.
    ///
    /// # Example
    ///
    /// ```rust
    /// use rxbox_core::KeyPath;
    ///
    /// let path = KeyPath::parse("items[0].name");
    /// assert_eq!(path.segments(), ["items", "0", "name"]);
    /// assert_eq!(path.root(), "items");
    /// ```
    pub fn parse(raw: impl Into<String>) -> Self {
        let raw = raw.into();
        let normalized = normalize_brackets(&raw);
        let trimmed = normalized.strip_prefix('.').unwrap_or(&normalized);
        let segments = trimmed.split('.').map(str::to_owned).collect();
        Self { raw, segments }
    }

    /// The path as originally written.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.raw
    }

    /// The normalized segments, never empty.
    #[must_use]
    pub fn segments(&self) -> &[String] {
        &self.segments
    }

    /// The first segment: the top-level state key this path lives under.
    #[must_use]
    pub fn root(&self) -> &str {
        self.segments.first().map_or("", String::as_str)
    }

    /// Resolve this path against a value.
    ///
    /// Returns `None` when any segment is missing.
    #[must_use]
    pub fn resolve<'a>(&self, root: &'a Value) -> Option<&'a Value> {
        self.segments
            .iter()
            .try_fold(root, |node, segment| step(node, segment))
    }

    /// Resolve this path against a state map (the root of a state tree).
    #[must_use]
    pub fn resolve_in<'a>(&self, state: &'a serde_json::Map<String, Value>) -> Option<&'a Value> {
        let (first, rest) = self.segments.split_first()?;
        rest.iter()
            .try_fold(state.get(first)?, |node, segment| step(node, segment))
    }
}

impl fmt::Display for KeyPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.raw)
    }
}

impl From<&str> for KeyPath {
    fn from(raw: &str) -> Self {
        Self::parse(raw)
    }
}

impl From<String> for KeyPath {
    fn from(raw: String) -> Self {
        Self::parse(raw)
    }
}

/// Resolve a path string against a value in one call.
///
/// ```rust
/// use rxbox_core::path::resolve;
/// use serde_json::json;
///
/// let doc = json!({"a": {"b": null}});
/// assert_eq!(resolve(&doc, "a.b"), Some(&json!(null)));
/// assert_eq!(resolve(&doc, "a.c"), None);
/// ```
#[must_use]
pub fn resolve<'a>(root: &'a Value, path: &str) -> Option<&'a Value> {
    KeyPath::parse(path).resolve(root)
}

fn step<'a>(node: &'a Value, segment: &str) -> Option<&'a Value> {
    match node {
        Value::Object(map) => map.get(segment),
        Value::Array(items) => array_index(segment).and_then(|i| items.get(i)),
        _ => None,
    }
}

// Canonical decimal only: "1" indexes, "01" and "+1" do not.
fn array_index(segment: &str) -> Option<usize> {
    let canonical = !segment.is_empty()
        && segment.bytes().all(|b| b.is_ascii_digit())
        && (segment == "0" || !segment.starts_with('0'));
    if canonical { segment.parse().ok() } else { None }
}

// `[word]` -> `.word`, anything else copied through untouched.
fn normalize_brackets(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    let mut rest = raw;

    while let Some(open) = rest.find('[') {
        out.push_str(&rest[..open]);
        let after = &rest[open + 1..];
        let word_len = after
            .find(|c: char| !(c.is_ascii_alphanumeric() || c == '_'))
            .unwrap_or(after.len());

        if word_len > 0 && after[word_len..].starts_with(']') {
            out.push('.');
            out.push_str(&after[..word_len]);
            rest = &after[word_len + 1..];
        } else {
            out.push('[');
            rest = after;
        }
    }

    out.push_str(rest);
    out
}
