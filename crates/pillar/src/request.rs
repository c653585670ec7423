//! Per-resolution request options.
//!
//! A [`PillarRequest`] carries everything that shapes one lookup: the target
//! collection, the field matched against the node id, an optional regex
//! rewrite of that id, and either a projection list or an aggregation
//! pipeline. Requests are plain configuration data and deserialize straight
//! from the caller's configuration file.

use std::borrow::Cow;

use mongodb::bson::Document;
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::error::PillarResult;

/// Options for a single pillar resolution.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PillarRequest {
    /// The collection to read pillar data from.
    #[serde(default = "default_collection")]
    pub collection: String,

    /// The field in the collection that holds the node id.
    #[serde(default = "default_id_field")]
    pub id_field: String,

    /// Optional regular expression applied to the node id before lookup.
    ///
    /// Node ids are usually fully-qualified domain names while collections
    /// often key on the bare hostname; one pattern rule strips the suffix
    /// without per-node configuration. A non-matching pattern leaves the id
    /// unchanged.
    #[serde(default)]
    pub id_pattern: Option<String>,

    /// Replacement text for `id_pattern` matches. Back-references use the
    /// `$1` / `${name}` syntax.
    #[serde(default)]
    pub id_replacement: String,

    /// Specific fields to return from the matched document. Absent (or
    /// empty) means the whole document. Ignored when `pipeline` is set.
    #[serde(default)]
    pub fields: Option<Vec<String>>,

    /// Aggregation pipeline stages, run after an implicit `$match` on the
    /// node id. Stage contents are opaque to this crate and passed to the
    /// store untouched, in the order given.
    #[serde(default)]
    pub pipeline: Option<Vec<Document>>,
}

fn default_collection() -> String {
    "pillar".to_string()
}

fn default_id_field() -> String {
    "_id".to_string()
}

impl Default for PillarRequest {
    fn default() -> Self {
        Self {
            collection: default_collection(),
            id_field: default_id_field(),
            id_pattern: None,
            id_replacement: String::new(),
            fields: None,
            pipeline: None,
        }
    }
}

/// The retrieval strategy for a request, chosen once before dispatch.
///
/// The two strategies are mutually exclusive: a request with a pipeline is
/// an aggregation, full stop, and its `fields` option has no effect. That
/// precedence is documented behavior, not a defect.
#[derive(Debug)]
pub enum LookupStrategy<'a> {
    /// Single-document lookup, optionally projected to a field subset.
    FindOne {
        /// Fields to project, or `None` for the whole document.
        fields: Option<&'a [String]>,
    },

    /// Multi-stage pipeline aggregation. Caller stages run after the
    /// implicit node-id match stage.
    Aggregate {
        /// Caller-supplied stages, in order.
        stages: &'a [Document],
    },
}

impl PillarRequest {
    /// Chooses the retrieval strategy for this request.
    ///
    /// An empty `fields` list behaves as absent.
    pub fn strategy(&self) -> LookupStrategy<'_> {
        match &self.pipeline {
            Some(stages) => LookupStrategy::Aggregate { stages },
            None => LookupStrategy::FindOne {
                fields: self
                    .fields
                    .as_deref()
                    .filter(|fields| !fields.is_empty()),
            },
        }
    }

    /// Derives the lookup key from a raw node id.
    ///
    /// With `id_pattern` set, every match in `node_id` is rewritten with
    /// `id_replacement`; otherwise the id is returned unchanged. A pattern
    /// that matches nothing is a no-op. An invalid pattern is an error.
    pub fn lookup_key<'a>(&self, node_id: &'a str) -> PillarResult<Cow<'a, str>> {
        match &self.id_pattern {
            Some(pattern) => {
                let re = Regex::new(pattern)?;
                Ok(re.replace_all(node_id, self.id_replacement.as_str()))
            }
            None => Ok(Cow::Borrowed(node_id)),
        }
    }
}
