//! LTR feature logging.
//!
//! Solr's `[features]` document transformer computes the feature values of
//! a named feature store for every returned document and packs them into a
//! single string field:
//!
//! ```text
//! {"id": "1", "[features]": "title_bm25=0.5,price=1.25"}
//! ```
//!
//! [`SolrClient::fetch_feature_vectors`] asks for that field and unpacks it
//! into an ordered `Vec<f64>` stored on the document under
//! [`LTR_FEATURES_FIELD`]. The order is the order Solr emitted, never
//! re-sorted by feature name.
//!
//! # Example
//!
//! ```no_run
//! use solr_ltr::{FeatureQuery, SolrClient, SolrConfig};
//!
//! # async fn run() -> solr_ltr::Result<()> {
//! let client = SolrClient::new(SolrConfig::default())?;
//! let query = FeatureQuery::new("tmdb", "movie_features")
//!     .with_ids(["1", "2"])
//!     .with_option("keywords", "star wars");
//! for doc in client.fetch_feature_vectors(&query).await? {
//!     println!("{:?}", doc.get("ltr_features"));
//! }
//! # Ok(())
//! # }
//! ```

use std::collections::BTreeMap;

use serde_json::{Map, Value};

use crate::{
    client::{SolrClient, check_response, read_json},
    error::{Error, Result},
};

/// Field holding the packed feature string in Solr's response.
pub const FEATURES_FIELD: &str = "[features]";
/// Field the parsed feature vector is attached under.
pub const LTR_FEATURES_FIELD: &str = "ltr_features";
pub const DEFAULT_ID_FIELD: &str = "id";
/// Row cap on every feature logging request.
pub const MAX_ROWS: usize = 1000;
pub const MATCH_ALL: &str = "*:*";

/// One document of the select response, keys in response order.
pub type FeatureDocument = Map<String, Value>;

/// Which documents to log features for.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum IdFilter {
    /// Every document in the collection (up to [`MAX_ROWS`]).
    #[default]
    All,
    /// Only documents whose id field is one of these values.
    Ids(Vec<String>),
}

impl IdFilter {
    pub fn ids<I, S>(ids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::Ids(ids.into_iter().map(Into::into).collect())
    }
}

/// Parameters of one feature logging request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FeatureQuery {
    pub index: String,
    pub featureset: String,
    pub ids: IdFilter,
    /// External feature information (`efi.*`) passed to the feature store.
    pub options: BTreeMap<String, String>,
    pub id_field: String,
}

impl FeatureQuery {
    pub fn new(index: impl Into<String>, featureset: impl Into<String>) -> Self {
        Self {
            index: index.into(),
            featureset: featureset.into(),
            ids: IdFilter::All,
            options: BTreeMap::new(),
            id_field: DEFAULT_ID_FIELD.to_string(),
        }
    }

    pub fn with_ids<I, S>(mut self, ids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.ids = IdFilter::ids(ids);
        self
    }

    pub fn with_option(
        mut self,
        key: impl Into<String>,
        value: impl Into<String>,
    ) -> Self {
        self.options.insert(key.into(), value.into());
        self
    }

    pub fn with_id_field(mut self, id_field: impl Into<String>) -> Self {
        self.id_field = id_field.into();
        self
    }

    fn validate(&self) -> Result<()> {
        if self.index.trim().is_empty() {
            return Err(Error::Config("index must not be empty".into()));
        }
        if self.featureset.trim().is_empty() {
            return Err(Error::Config("featureset must not be empty".into()));
        }
        if self.id_field.trim().is_empty() {
            return Err(Error::Config("id field must not be empty".into()));
        }
        Ok(())
    }

    /// The form body of the select request.
    pub fn form_params(&self) -> Vec<(&'static str, String)> {
        let efi = efi_clause(&self.options);
        vec![
            ("fl", field_list(&self.id_field, &self.featureset, &efi)),
            ("q", query_expression(&self.ids, &self.id_field)),
            ("rows", MAX_ROWS.to_string()),
            ("wt", "json".to_string()),
        ]
    }
}

/// Serialize efi options as `efi.<key>="<value>"` tokens, space-joined in
/// key order. An empty map gives an empty clause.
pub fn efi_clause(options: &BTreeMap<String, String>) -> String {
    options
        .iter()
        .map(|(key, value)| format!("efi.{key}=\"{value}\""))
        .collect::<Vec<_>>()
        .join(" ")
}

/// `*:*` for [`IdFilter::All`], otherwise a terms filter on `id_field`.
pub fn query_expression(ids: &IdFilter, id_field: &str) -> String {
    match ids {
        IdFilter::All => MATCH_ALL.to_string(),
        IdFilter::Ids(ids) => {
            format!("{{!terms f={id_field}}}{}", ids.join(","))
        }
    }
}

/// `<id_field>,[features store=<featureset> <efi>]`
pub fn field_list(id_field: &str, featureset: &str, efi: &str) -> String {
    format!("{id_field},[features store={featureset} {efi}]")
}

/// A packed feature entry that could not be turned into a number.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("malformed feature entry {entry:?}: {reason}")]
pub struct FeatureParseError {
    pub entry: String,
    pub reason: String,
}

/// Unpack `name1=value1,name2=value2,...` into the values, in order.
///
/// An empty string has no features. Any entry without `=`, or with a value
/// that is not a finite float, fails the whole string.
pub fn parse_packed_features(
    packed: &str,
) -> std::result::Result<Vec<f64>, FeatureParseError> {
    if packed.is_empty() {
        return Ok(Vec::new());
    }

    packed
        .split(',')
        .map(|entry| {
            let value = entry.split('=').nth(1).ok_or_else(|| {
                FeatureParseError {
                    entry: entry.to_string(),
                    reason: "missing '='".to_string(),
                }
            })?;
            let number =
                value.trim().parse::<f64>().map_err(|e| FeatureParseError {
                    entry: entry.to_string(),
                    reason: e.to_string(),
                })?;
            if !number.is_finite() {
                return Err(FeatureParseError {
                    entry: entry.to_string(),
                    reason: "value is not finite".to_string(),
                });
            }
            Ok(number)
        })
        .collect()
}

/// Attach [`LTR_FEATURES_FIELD`] to every document that carries
/// [`FEATURES_FIELD`]. Documents without it are left untouched and logged.
pub fn attach_feature_vectors(docs: &mut [FeatureDocument]) -> Result<()> {
    for (doc_index, doc) in docs.iter_mut().enumerate() {
        let vector = match doc.get(FEATURES_FIELD) {
            None => {
                tracing::warn!(doc_index, "No features in doc");
                continue;
            }
            Some(Value::String(packed)) => parse_packed_features(packed)
                .map_err(|e| Error::MalformedFeature {
                    doc_index,
                    entry: e.entry,
                    reason: e.reason,
                })?,
            Some(other) => {
                return Err(Error::MalformedFeature {
                    doc_index,
                    entry: other.to_string(),
                    reason: "packed features must be a string".to_string(),
                });
            }
        };

        let vector = vector.into_iter().map(Value::from).collect();
        doc.insert(LTR_FEATURES_FIELD.to_string(), Value::Array(vector));
    }
    Ok(())
}

/// Pull `response.docs` out of a select response body.
fn extract_docs(mut body: Value) -> Result<Vec<FeatureDocument>> {
    let docs = body
        .get_mut("response")
        .and_then(|r| r.get_mut("docs"))
        .map(Value::take)
        .ok_or_else(|| {
            Error::Response("missing response.docs in select result".into())
        })?;

    let Value::Array(docs) = docs else {
        return Err(Error::Response("response.docs is not an array".into()));
    };

    docs.into_iter()
        .map(|doc| match doc {
            Value::Object(map) => Ok(map),
            other => Err(Error::Response(format!(
                "expected a document object, got {other}"
            ))),
        })
        .collect()
}

impl SolrClient {
    /// Fetch LTR feature vectors for the documents selected by `query`.
    ///
    /// Issues exactly one form-encoded POST to `{base}/{index}/select`.
    /// Fails on HTTP status >= 400 (with the response body in the error)
    /// and on the first malformed packed feature string.
    pub async fn fetch_feature_vectors(
        &self,
        query: &FeatureQuery,
    ) -> Result<Vec<FeatureDocument>> {
        query.validate()?;

        let params = query.form_params();
        tracing::debug!(
            index = %query.index,
            featureset = %query.featureset,
            q = %params[1].1,
            "logging features"
        );

        let response = self
            .http()
            .post(self.collection_url(&query.index, "select"))
            .form(&params)
            .send()
            .await?;
        let label = format!("Searching {}", query.index);
        let response = check_response(&label, response).await?;

        let mut docs = extract_docs(read_json(response).await?)?;
        attach_feature_vectors(&mut docs)?;
        Ok(docs)
    }
}
