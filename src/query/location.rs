//! Genomic location queries.
//!
//! A location is given under the reserved key `location`, either as an object
//! `{"seq_region": "1", "start": "100", "end": "2000", "strand": "1"}` or as a
//! string `1:100-2000:1`. It expands into independent sibling query nodes.

use std::sync::OnceLock;

use regex::Regex;

use crate::error::{GeneSearchError, Result};
use crate::query::ast::QueryNode;
use crate::query::value::QueryValue;

/// Reserved query key for locations.
pub const LOCATION_FIELD: &str = "location";
pub const SEQ_REGION_FIELD: &str = "seq_region";
pub const START_FIELD: &str = "start";
pub const END_FIELD: &str = "end";
pub const STRAND_FIELD: &str = "strand";

fn location_string() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"^([^:]+):(-?[0-9]+)-(-?[0-9]+)(?::(-?1))?$").unwrap())
}

/// A parsed location.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Location {
    pub seq_region: Option<String>,
    pub start: Option<i64>,
    pub end: Option<i64>,
    pub strand: Option<String>,
}

impl Location {
    /// Parse the string form `seq_region:start-end[:strand]`.
    pub fn parse(input: &str) -> Result<Self> {
        let caps = location_string().captures(input.trim()).ok_or_else(|| {
            GeneSearchError::query_parse(format!("Cannot parse location query {input}"))
        })?;
        Ok(Location {
            seq_region: Some(caps[1].to_string()),
            start: Some(parse_coordinate(START_FIELD, &caps[2])?),
            end: Some(parse_coordinate(END_FIELD, &caps[3])?),
            strand: caps.get(4).map(|m| m.as_str().to_string()),
        })
    }

    /// Decode a location from a query value.
    pub fn from_value(value: &QueryValue) -> Result<Self> {
        match value {
            QueryValue::Scalar(s) => Location::parse(s),
            QueryValue::Object(entries) => {
                let mut location = Location::default();
                for (key, value) in entries {
                    let text = value.as_scalar().ok_or_else(|| {
                        GeneSearchError::query_parse(format!(
                            "Location field {key} must be a single value"
                        ))
                    })?;
                    match key.as_str() {
                        SEQ_REGION_FIELD => location.seq_region = Some(text.to_string()),
                        START_FIELD => location.start = Some(parse_coordinate(key, text)?),
                        END_FIELD => location.end = Some(parse_coordinate(key, text)?),
                        STRAND_FIELD => location.strand = Some(text.to_string()),
                        other => {
                            return Err(GeneSearchError::query_parse(format!(
                                "Unknown location field {other}"
                            )));
                        }
                    }
                }
                Ok(location)
            }
            QueryValue::List(_) => Err(GeneSearchError::query_parse(
                "A location must be an object or a string",
            )),
        }
    }

    /// Expand into sibling nodes: a term on `seq_region`, a lower-bounded
    /// range on `start`, an upper-bounded range on `end` and a term on
    /// `strand`, each only when present.
    pub fn to_nodes(&self) -> Vec<QueryNode> {
        let mut nodes = Vec::with_capacity(4);
        if let Some(seq_region) = &self.seq_region {
            nodes.push(QueryNode::term(SEQ_REGION_FIELD, [seq_region.as_str()]));
        }
        if let Some(start) = self.start {
            nodes.push(QueryNode::range(START_FIELD, Some(start), None));
        }
        if let Some(end) = self.end {
            nodes.push(QueryNode::range(END_FIELD, None, Some(end)));
        }
        if let Some(strand) = &self.strand {
            nodes.push(QueryNode::term(STRAND_FIELD, [strand.as_str()]));
        }
        nodes
    }
}

fn parse_coordinate(field: &str, text: &str) -> Result<i64> {
    text.trim().parse::<i64>().map_err(|_| {
        GeneSearchError::query_parse(format!(
            "Location {field} must be an integer, found {text}"
        ))
    })
}
