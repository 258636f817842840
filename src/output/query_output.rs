//! Output field selections.
//!
//! A [`QueryOutput`] describes which fields of a result document are
//! returned. It holds plain field names for the current level plus nested
//! selections for sub-documents, so that `["id", "transcripts.id"]` and
//! `["id", {"transcripts": ["id"]}]` describe the same selection.
//!
//! # Examples
//!
//! ```
//! use genesearch::output::QueryOutput;
//!
//! let dotted = QueryOutput::build(r#"["id", "transcripts.id"]"#).unwrap();
//! let nested = QueryOutput::build(r#"["id", {"transcripts": ["id"]}]"#).unwrap();
//! assert_eq!(dotted, nested);
//! assert!(dotted.contains_path("transcripts.id"));
//! assert!(!dotted.contains_path("transcripts.biotype"));
//! ```

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::{Map, Value};

use crate::error::{GeneSearchError, Result};

/// Marker selecting every field at a level.
pub const WILDCARD: &str = "*";

/// A selection of output fields.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct QueryOutput {
    /// Fields selected whole at this level.
    fields: Vec<String>,
    /// Selections inside sub-documents, keyed by field name.
    sub_fields: BTreeMap<String, QueryOutput>,
}

impl QueryOutput {
    /// An empty selection, which keeps documents unchanged.
    pub fn new() -> Self {
        QueryOutput::default()
    }

    /// Select the given dotted paths.
    pub fn of<I, S>(paths: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut output = QueryOutput::new();
        for path in paths {
            output.add_path(path.as_ref());
        }
        output
    }

    /// Parse an output field string.
    ///
    /// Accepts a JSON list (`["id", {"transcripts": ["id"]}]`), a JSON object
    /// (`{"transcripts": ["id"]}`), a comma separated list of quoted JSON
    /// values, or a plain comma separated list of names (`id,name`).
    pub fn build(input: &str) -> Result<Self> {
        let input = input.trim();
        if input.is_empty() {
            return Ok(QueryOutput::new());
        }
        check_balanced(input)?;
        let parse = |json: &str| {
            serde_json::from_str::<Value>(json).map_err(|e| {
                GeneSearchError::query_parse(format!(
                    "Could not parse query output string {input}: {e}"
                ))
            })
        };
        if input.starts_with('[') || input.starts_with('{') {
            return Self::from_json(&parse(input)?);
        }
        match parse(&format!("[{input}]")) {
            Ok(value) => Self::from_json(&value),
            Err(_) if !input.contains(['[', ']', '{', '}', '"']) => {
                Ok(Self::of(input.split(',').map(str::trim).filter(|s| !s.is_empty())))
            }
            Err(e) => Err(e),
        }
    }

    /// Build a selection from a JSON list, object or string.
    pub fn from_json(value: &Value) -> Result<Self> {
        match value {
            Value::Array(items) => Self::from_list(items),
            Value::Object(map) => Self::from_map(map),
            Value::String(s) => Self::build(s),
            other => Err(GeneSearchError::query_parse(format!(
                "Could not parse query output {other}"
            ))),
        }
    }

    fn from_list(items: &[Value]) -> Result<Self> {
        let mut output = QueryOutput::new();
        for item in items {
            match item {
                Value::String(name) => output.add_path(name.trim()),
                Value::Object(map) => output.merge(Self::from_map(map)?),
                other => {
                    return Err(GeneSearchError::query_parse(format!(
                        "Could not parse query output {other}"
                    )));
                }
            }
        }
        Ok(output)
    }

    fn from_map(map: &Map<String, Value>) -> Result<Self> {
        let mut output = QueryOutput::new();
        for (name, value) in map {
            let sub = match value {
                Value::Array(items) => Self::from_list(items)?,
                Value::Object(map) => Self::from_map(map)?,
                other => {
                    return Err(GeneSearchError::query_parse(format!(
                        "Could not parse query output {other} for {name}"
                    )));
                }
            };
            output.add_sub(name, sub);
        }
        Ok(output)
    }

    /// Select a dotted path.
    pub fn add_path(&mut self, path: &str) {
        if path.is_empty() {
            return;
        }
        match path.split_once('.') {
            Some((head, rest)) => {
                if !self.selects_whole(head) {
                    self.sub_fields.entry(head.to_string()).or_default().add_path(rest);
                }
            }
            None => {
                self.sub_fields.remove(path);
                if !self.selects_whole(path) {
                    self.fields.push(path.to_string());
                }
            }
        }
    }

    fn add_sub(&mut self, name: &str, sub: QueryOutput) {
        match name.split_once('.') {
            Some((head, rest)) => {
                let mut wrapper = QueryOutput::new();
                wrapper.add_sub(rest, sub);
                self.add_sub(head, wrapper);
            }
            None if self.selects_whole(name) => {}
            None => self.sub_fields.entry(name.to_string()).or_default().merge(sub),
        }
    }

    /// Add everything selected by `other`.
    pub fn merge(&mut self, other: QueryOutput) {
        for field in &other.fields {
            self.add_path(field);
        }
        for (name, sub) in other.sub_fields {
            self.add_sub(&name, sub);
        }
    }

    fn selects_whole(&self, name: &str) -> bool {
        self.fields.iter().any(|f| f == name)
    }

    /// Fields selected whole at this level.
    pub fn fields(&self) -> &[String] {
        &self.fields
    }

    /// Nested selections.
    pub fn sub_fields(&self) -> &BTreeMap<String, QueryOutput> {
        &self.sub_fields
    }

    /// Whether `*` is selected at this level.
    pub fn is_wild(&self) -> bool {
        self.selects_whole(WILDCARD)
    }

    /// Whether nothing is selected.
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty() && self.sub_fields.is_empty()
    }

    /// Whether the dotted `path` is selected, whole or in part.
    pub fn contains_path(&self, path: &str) -> bool {
        let (head, rest) = split_path(path);
        if self.is_wild() || self.selects_whole(head) {
            return true;
        }
        match (rest, self.sub_fields.get(head)) {
            (_, None) => false,
            (None, Some(_)) => true,
            (Some(rest), Some(sub)) => sub.contains_path(rest),
        }
    }

    /// Whether something *inside* `path` is specifically selected, so that a
    /// sub-document at `path` has to be pruned rather than kept whole.
    pub fn contains_path_children(&self, path: &str) -> bool {
        let (head, rest) = split_path(path);
        if self.selects_whole(head) {
            return false;
        }
        match (rest, self.sub_fields.get(head)) {
            (_, None) => false,
            (None, Some(_)) => true,
            (Some(rest), Some(sub)) => sub.contains_path_children(rest),
        }
    }

    /// Every selected leaf as a dotted path.
    pub fn paths(&self) -> Vec<String> {
        let mut paths = self.fields.clone();
        for (name, sub) in &self.sub_fields {
            paths.extend(sub.paths().into_iter().map(|p| format!("{name}.{p}")));
        }
        paths
    }

    /// Number of `*` markers and plain field names anywhere in the selection.
    pub fn count_fields(&self) -> (usize, usize) {
        let mut wild = 0;
        let mut named = 0;
        for field in &self.fields {
            if field == WILDCARD {
                wild += 1;
            } else {
                named += 1;
            }
        }
        for sub in self.sub_fields.values() {
            let (w, n) = sub.count_fields();
            wild += w;
            named += n;
        }
        (wild, named)
    }

    /// Render in the mixed list form, e.g. `["id", {"transcripts": ["id"]}]`.
    pub fn to_json(&self) -> Value {
        let mut items: Vec<Value> = self.fields.iter().map(|f| Value::String(f.clone())).collect();
        for (name, sub) in &self.sub_fields {
            let mut map = Map::new();
            map.insert(name.clone(), sub.to_json());
            items.push(Value::Object(map));
        }
        Value::Array(items)
    }
}

fn split_path(path: &str) -> (&str, Option<&str>) {
    match path.split_once('.') {
        Some((head, rest)) => (head, Some(rest)),
        None => (path, None),
    }
}

fn check_balanced(input: &str) -> Result<()> {
    let mut open = Vec::new();
    let mut in_string = false;
    let mut escaped = false;
    for c in input.chars() {
        if in_string {
            match c {
                _ if escaped => escaped = false,
                '\\' => escaped = true,
                '"' => in_string = false,
                _ => {}
            }
            continue;
        }
        match c {
            '"' => in_string = true,
            '[' | '{' => open.push(c),
            ']' | '}' => {
                let expected = if c == ']' { '[' } else { '{' };
                if open.pop() != Some(expected) {
                    return Err(GeneSearchError::query_parse(format!(
                        "Unbalanced {c} in query output string {input}"
                    )));
                }
            }
            _ => {}
        }
    }
    if in_string || !open.is_empty() {
        return Err(GeneSearchError::query_parse(format!(
            "Unbalanced query output string {input}"
        )));
    }
    Ok(())
}

impl fmt::Display for QueryOutput {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_json())
    }
}

impl Serialize for QueryOutput {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        self.to_json().serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for QueryOutput {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let value = Value::deserialize(deserializer)?;
        QueryOutput::from_json(&value).map_err(serde::de::Error::custom)
    }
}
