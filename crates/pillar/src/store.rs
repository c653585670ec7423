//! Document store access.
//!
//! The resolver talks to the store through the narrow [`DocumentStore`]
//! trait: one point lookup and one pipeline execution. [`MongoStore`] is the
//! production implementation over [`mongodb::Database`]; tests inject a fake.

use async_trait::async_trait;
use futures::TryStreamExt;
use mongodb::bson::Document;
use mongodb::options::{ClientOptions, Credential};
use mongodb::{Client, Database};

use crate::config::MongoConfig;
use crate::error::{PillarError, PillarResult};

/// Narrow query interface consumed by the resolver.
///
/// Both operations are single synchronous calls from the resolver's point of
/// view: no retry, no timeout beyond whatever the underlying driver applies.
/// Implementations must be safe to share across concurrent resolutions.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Finds the first document in `collection` matching `filter`,
    /// restricted to `projection` when given.
    async fn find_one(
        &self,
        collection: &str,
        filter: Document,
        projection: Option<Document>,
    ) -> PillarResult<Option<Document>>;

    /// Runs an aggregation pipeline against `collection` and materializes
    /// every output document, in pipeline-output order.
    async fn aggregate(
        &self,
        collection: &str,
        pipeline: Vec<Document>,
    ) -> PillarResult<Vec<Document>>;
}

/// MongoDB-backed [`DocumentStore`].
#[derive(Debug, Clone)]
pub struct MongoStore {
    db: Database,
}

impl MongoStore {
    /// Connects to the configured MongoDB deployment and selects the pillar
    /// database.
    ///
    /// Credentials are attached only when the configuration carries both a
    /// user and a password.
    pub async fn connect(config: &MongoConfig) -> PillarResult<Self> {
        config.validate()?;

        tracing::info!(
            "connecting to {}:{} for pillar data",
            config.host,
            config.port
        );

        let mut options = ClientOptions::builder()
            .hosts(config.server_addresses()?)
            .build();
        if config.has_credentials() {
            tracing::debug!("authenticating as '{}'", config.user);
            options.credential = Some(
                Credential::builder()
                    .username(config.user.clone())
                    .password(config.password.clone())
                    .build(),
            );
        }

        let client = Client::with_options(options).map_err(|e| PillarError::ConnectionFailed {
            host: config.host.clone(),
            message: e.to_string(),
        })?;

        tracing::debug!("using database '{}'", config.db);
        Ok(Self {
            db: client.database(&config.db),
        })
    }

    /// Wraps an already-selected database handle.
    pub fn from_database(db: Database) -> Self {
        Self { db }
    }
}

#[async_trait]
impl DocumentStore for MongoStore {
    async fn find_one(
        &self,
        collection: &str,
        filter: Document,
        projection: Option<Document>,
    ) -> PillarResult<Option<Document>> {
        let coll = self.db.collection::<Document>(collection);
        let mut find = coll.find_one(filter);
        if let Some(projection) = projection {
            find = find.projection(projection);
        }
        find.await.map_err(|e| PillarError::query(collection, e))
    }

    async fn aggregate(
        &self,
        collection: &str,
        pipeline: Vec<Document>,
    ) -> PillarResult<Vec<Document>> {
        let coll = self.db.collection::<Document>(collection);
        let cursor = coll
            .aggregate(pipeline)
            .await
            .map_err(|e| PillarError::query(collection, e))?;
        cursor
            .try_collect()
            .await
            .map_err(|e| PillarError::query(collection, e))
    }
}
