//! solr-ltr - a client for Solr's learning-to-rank plugin.
//!
//! The crate wraps the handful of Solr REST calls needed to set up LTR on a
//! collection (collection creation, schema fields, the `ltr` query parser,
//! the `[features]` transformer and feature stores) and to log feature
//! vectors for a set of documents. It also carries the small helpers used
//! around those calls: HTML result rendering, number formatting and file
//! downloads.
//!
//! # Quick start
//!
//! ```no_run
//! use solr_ltr::{FeatureQuery, SolrClient, SolrConfig};
//!
//! # async fn run() -> solr_ltr::Result<()> {
//! let client = SolrClient::new(SolrConfig::from_env()?)?;
//! client.create_collection("tmdb").await?;
//! client.enable_ltr("tmdb").await?;
//!
//! let query = FeatureQuery::new("tmdb", "movie_features")
//!     .with_ids(["11", "1891"])
//!     .with_option("keywords", "star wars");
//! let docs = client.fetch_feature_vectors(&query).await?;
//! for doc in &docs {
//!     println!("{} {:?}", doc["id"], doc.get("ltr_features"));
//! }
//! # Ok(())
//! # }
//! ```

pub mod admin;
pub mod client;
pub mod config;
pub mod data_dir;
pub mod download;
pub mod error;
pub mod features;
pub mod render;
pub mod text_util;

pub use admin::{AdminStatus, FeatureDefinition, LtrSetup};
pub use client::SolrClient;
pub use config::SolrConfig;
pub use data_dir::DataDir;
pub use error::{Error, Result};
pub use features::{FeatureDocument, FeatureQuery, IdFilter};
pub use render::SearchResultsTemplate;
