//! Per-node pillar resolution from a MongoDB collection.
//!
//! This crate loads a node-specific pillar document from a MongoDB
//! collection. It uses the node's id for lookups and can return either the
//! whole document, a specific subset of its fields, or the output of an
//! aggregation pipeline, as a normalized document ready for merging into a
//! larger configuration tree.
//!
//! # Resolution
//!
//! Each resolution is a fresh, independent query with three steps:
//!
//! 1. The node id is optionally rewritten by a regex rule
//!    ([`PillarRequest::id_pattern`]) - node ids are usually FQDNs while
//!    collections often key on the bare hostname.
//! 2. Exactly one of two retrieval strategies runs: a single-document
//!    lookup on `{id_field: key}`, or an aggregation pipeline prefixed with
//!    an implicit `$match` stage on the same filter. A request with a
//!    pipeline ignores its `fields` option.
//! 3. The result is normalized: a missing match becomes an empty document
//!    and a top-level ObjectId `_id` becomes its hex string.
//!
//! # Example
//!
//! ```no_run
//! use mongo_pillar::{resolve, MongoConfig, MongoStore, PillarRequest};
//!
//! # async fn example() -> Result<(), mongo_pillar::PillarError> {
//! let store = MongoStore::connect(&MongoConfig::from_env()).await?;
//!
//! let request = PillarRequest {
//!     collection: "vm".to_string(),
//!     id_field: "name".to_string(),
//!     id_pattern: Some(r"\.example\.com".to_string()),
//!     fields: Some(vec!["customer_id".into(), "software".into()]),
//!     ..Default::default()
//! };
//!
//! let pillar = resolve("web1.example.com", &request, &store).await?;
//! if pillar.is_empty() {
//!     // No pillar document for this node - expected, not an error.
//! }
//! # Ok(())
//! # }
//! ```
//!
//! # Testing
//!
//! The resolver only sees the [`DocumentStore`] trait, so resolution logic
//! can be exercised against an in-memory fake without a running server.

#![warn(missing_docs)]
#![warn(rustdoc::missing_crate_level_docs)]

pub mod config;
pub mod error;
pub mod request;
pub mod resolver;
pub mod store;

// Re-export commonly used types at crate root
pub use config::MongoConfig;
pub use error::{PillarError, PillarResult};
pub use request::{LookupStrategy, PillarRequest};
pub use resolver::{pillar_to_json, resolve};
pub use store::{DocumentStore, MongoStore};

/// Crate version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Crate name.
pub const NAME: &str = env!("CARGO_PKG_NAME");
