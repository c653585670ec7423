//! In-memory fake store for exercising the resolver without a server.

use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;
use mongodb::bson::{Bson, Document};

use mongo_pillar::{DocumentStore, PillarError, PillarResult};

/// An in-memory [`DocumentStore`].
///
/// `find_one` scans seeded documents with equality-match filter semantics
/// and applies include-mode projections the way the server would. A fake
/// cannot execute server-side pipelines, so `aggregate` returns a canned
/// result set per collection and records every submitted pipeline for
/// assertions.
#[derive(Default)]
pub struct FakeStore {
    collections: HashMap<String, Vec<Document>>,
    aggregate_results: HashMap<String, Vec<Document>>,
    recorded_pipelines: Mutex<Vec<Vec<Document>>>,
}

impl FakeStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seeds documents into `collection` for `find_one` scans.
    pub fn with_documents(mut self, collection: &str, docs: Vec<Document>) -> Self {
        self.collections.insert(collection.to_string(), docs);
        self
    }

    /// Sets the canned output of any pipeline run against `collection`.
    pub fn with_aggregate_results(mut self, collection: &str, docs: Vec<Document>) -> Self {
        self.aggregate_results.insert(collection.to_string(), docs);
        self
    }

    /// Pipelines submitted so far, in call order.
    pub fn recorded_pipelines(&self) -> Vec<Vec<Document>> {
        self.recorded_pipelines.lock().unwrap().clone()
    }
}

fn matches_filter(doc: &Document, filter: &Document) -> bool {
    filter
        .iter()
        .all(|(key, value)| doc.get(key) == Some(value))
}

fn apply_projection(doc: &Document, projection: &Document) -> Document {
    let mut out = Document::new();
    // Include-mode semantics: listed fields come through, and _id comes
    // through by default unless the projection suppresses it.
    if !projection.contains_key("_id") {
        if let Some(id) = doc.get("_id") {
            out.insert("_id", id.clone());
        }
    }
    for (key, value) in projection {
        if matches!(value, Bson::Int32(1) | Bson::Int64(1)) {
            if let Some(found) = doc.get(key) {
                out.insert(key.as_str(), found.clone());
            }
        }
    }
    out
}

#[async_trait]
impl DocumentStore for FakeStore {
    async fn find_one(
        &self,
        collection: &str,
        filter: Document,
        projection: Option<Document>,
    ) -> PillarResult<Option<Document>> {
        let found = self
            .collections
            .get(collection)
            .and_then(|docs| docs.iter().find(|doc| matches_filter(doc, &filter)));

        Ok(found.map(|doc| match &projection {
            Some(projection) => apply_projection(doc, projection),
            None => doc.clone(),
        }))
    }

    async fn aggregate(
        &self,
        collection: &str,
        pipeline: Vec<Document>,
    ) -> PillarResult<Vec<Document>> {
        self.recorded_pipelines.lock().unwrap().push(pipeline);
        Ok(self
            .aggregate_results
            .get(collection)
            .cloned()
            .unwrap_or_default())
    }
}

/// A store whose every operation fails, for propagation tests.
pub struct FailingStore;

fn store_failure(collection: &str) -> PillarError {
    PillarError::Query {
        collection: collection.to_string(),
        message: "connection reset by peer".to_string(),
        source: None,
    }
}

#[async_trait]
impl DocumentStore for FailingStore {
    async fn find_one(
        &self,
        collection: &str,
        _filter: Document,
        _projection: Option<Document>,
    ) -> PillarResult<Option<Document>> {
        Err(store_failure(collection))
    }

    async fn aggregate(
        &self,
        collection: &str,
        _pipeline: Vec<Document>,
    ) -> PillarResult<Vec<Document>> {
        Err(store_failure(collection))
    }
}
