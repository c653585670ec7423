//! Pillar resolution.
//!
//! One resolution is a fresh, independent query: normalize the node id,
//! dispatch exactly one of the two retrieval strategies, then normalize
//! whatever came back. Absence of a pillar document is an expected outcome
//! and yields an empty document, never an error.

use mongodb::bson::{doc, Bson, Document};

use crate::error::PillarResult;
use crate::request::{LookupStrategy, PillarRequest};
use crate::store::DocumentStore;

/// Resolves pillar data for `node_id` against `store`.
///
/// Returns the matched (and normalized) document, or an empty document when
/// no match exists. Connection and query failures propagate unmodified; the
/// caller decides whether one node's missing pillar aborts a larger run.
pub async fn resolve<S>(
    node_id: &str,
    request: &PillarRequest,
    store: &S,
) -> PillarResult<Document>
where
    S: DocumentStore + ?Sized,
{
    let key = request.lookup_key(node_id)?;

    tracing::info!(
        "looking up pillar def for {{'{}': '{}'}} in collection '{}'",
        request.id_field,
        key,
        request.collection
    );

    let raw = match request.strategy() {
        LookupStrategy::FindOne { fields } => find_one(store, request, &key, fields).await?,
        LookupStrategy::Aggregate { stages } => aggregate(store, request, &key, stages).await?,
    };

    Ok(normalize(raw))
}

/// Single-document strategy: one point lookup, optionally projected.
async fn find_one<S>(
    store: &S,
    request: &PillarRequest,
    key: &str,
    fields: Option<&[String]>,
) -> PillarResult<Option<Document>>
where
    S: DocumentStore + ?Sized,
{
    let filter = doc! { (request.id_field.as_str()): key };
    let projection = fields.map(projection_doc);

    let result = store
        .find_one(&request.collection, filter, projection)
        .await?;

    match (&result, fields) {
        (Some(_), Some(fields)) => {
            tracing::debug!("found document, returning fields {:?}", fields);
        }
        (Some(_), None) => {
            tracing::debug!("found document, returning whole doc");
        }
        (None, _) => {
            tracing::debug!("no document found in collection '{}'", request.collection);
        }
    }

    Ok(result)
}

/// Pipeline strategy: implicit node-id match stage, then the caller's
/// stages, in order and uninterpreted.
///
/// The result-arity policy is deliberately permissive: more than one output
/// document is reported at error level but the first document is still
/// returned. Narrowing to one document is the pipeline author's job, and a
/// result we can materialize is never silently dropped.
async fn aggregate<S>(
    store: &S,
    request: &PillarRequest,
    key: &str,
    stages: &[Document],
) -> PillarResult<Option<Document>>
where
    S: DocumentStore + ?Sized,
{
    let mut pipeline = Vec::with_capacity(stages.len() + 1);
    pipeline.push(doc! { "$match": { (request.id_field.as_str()): key } });
    pipeline.extend(stages.iter().cloned());

    let results = store.aggregate(&request.collection, pipeline).await?;

    match results.len() {
        0 => tracing::error!(
            "pipeline on collection '{}' returned no results",
            request.collection
        ),
        1 => {}
        n => tracing::error!(
            "pipeline on collection '{}' returned {} results; \
             a pipeline should be designed to return at most one result",
            request.collection,
            n
        ),
    }

    Ok(results.into_iter().next())
}

/// Builds a projection document for an explicit field list.
///
/// The store includes `_id` by default even under a projection, while a
/// field-filtered pillar should contain the requested fields and nothing
/// else, so `_id` is suppressed unless explicitly requested.
fn projection_doc(fields: &[String]) -> Document {
    let mut projection = Document::new();
    for field in fields {
        projection.insert(field.as_str(), 1);
    }
    if !fields.iter().any(|f| f == "_id") {
        projection.insert("_id", 0);
    }
    projection
}

/// Normalizes a raw lookup result into the returned pillar document.
///
/// "No result" becomes an empty document. A top-level ObjectId `_id` is
/// replaced by its hex string; this is best-effort, and nested foreign
/// references may still fail downstream serialization.
fn normalize(raw: Option<Document>) -> Document {
    let mut doc = match raw {
        Some(doc) => doc,
        None => return Document::new(),
    };

    if let Some(Bson::ObjectId(oid)) = doc.get("_id") {
        let oid = *oid;
        doc.insert("_id", oid.to_hex());
    }

    doc
}

/// Converts a resolved pillar into a JSON object (relaxed Extended JSON),
/// ready for merging into a larger configuration tree.
pub fn pillar_to_json(pillar: Document) -> serde_json::Map<String, serde_json::Value> {
    match Bson::Document(pillar).into_relaxed_extjson() {
        serde_json::Value::Object(map) => map,
        // A document always serializes to an object.
        _ => serde_json::Map::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mongodb::bson::oid::ObjectId;

    #[test]
    fn test_projection_doc_suppresses_implicit_id() {
        let fields = vec!["a".to_string(), "b".to_string()];
        let projection = projection_doc(&fields);
        assert_eq!(projection, doc! { "a": 1, "b": 1, "_id": 0 });
    }

    #[test]
    fn test_projection_doc_keeps_requested_id() {
        let fields = vec!["_id".to_string(), "role".to_string()];
        let projection = projection_doc(&fields);
        assert_eq!(projection, doc! { "_id": 1, "role": 1 });
    }

    #[test]
    fn test_normalize_missing_result_is_empty() {
        assert_eq!(normalize(None), Document::new());
    }

    #[test]
    fn test_normalize_stringifies_object_id() {
        let oid = ObjectId::new();
        let doc = normalize(Some(doc! { "_id": oid, "role": "web" }));
        assert_eq!(doc.get_str("_id").unwrap(), oid.to_hex());
        assert_eq!(doc.get_str("role").unwrap(), "web");
    }

    #[test]
    fn test_normalize_leaves_text_id_alone() {
        let doc = normalize(Some(doc! { "_id": "web1", "role": "web" }));
        assert_eq!(doc.get_str("_id").unwrap(), "web1");
    }

    #[test]
    fn test_pillar_to_json_plain_fields() {
        let json = pillar_to_json(doc! { "role": "web", "replicas": 3, "active": true });
        assert_eq!(json["role"], "web");
        assert_eq!(json["replicas"], 3);
        assert_eq!(json["active"], true);
    }
}
