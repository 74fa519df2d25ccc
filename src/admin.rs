use serde::{Deserialize, Serialize};
use serde_json::{Value, json};

use crate::{
    client::{SolrClient, check_response, read_json},
    error::Result,
};

const LTR_QPARSER_CLASS: &str = "org.apache.solr.ltr.search.LTRQParserPlugin";
const LTR_TRANSFORMER_CLASS: &str =
    "org.apache.solr.ltr.response.transform.LTRFeatureLoggerTransformerFactory";
const FEATURE_VECTOR_CACHE: &str = "QUERY_DOC_FV";

/// Outcome reported by Solr in `responseHeader.status` (0 means success).
#[derive(Debug, Clone, PartialEq)]
pub struct AdminStatus {
    pub success: bool,
    pub body: Value,
}

impl AdminStatus {
    pub fn from_body(body: Value) -> Self {
        let success = body
            .pointer("/responseHeader/status")
            .and_then(Value::as_i64)
            == Some(0);

        if success {
            tracing::info!("Status: Success");
        } else {
            tracing::warn!(response = %body, "Status: Failure");
        }

        Self { success, body }
    }
}

/// Statuses of the two registrations performed by
/// [`SolrClient::enable_ltr`].
#[derive(Debug, Clone, PartialEq)]
pub struct LtrSetup {
    pub query_parser: AdminStatus,
    pub transformer: AdminStatus,
}

impl LtrSetup {
    pub fn success(&self) -> bool {
        self.query_parser.success && self.transformer.success
    }
}

/// One entry of an LTR feature store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeatureDefinition {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub store: Option<String>,
    pub class: String,
    #[serde(default)]
    pub params: Value,
}

impl SolrClient {
    /// Drop `name` if it exists, then create it with one shard and one
    /// replica.
    pub async fn create_collection(&self, name: &str) -> Result<AdminStatus> {
        tracing::info!("Wiping '{name}' collection");
        let wipe = [("action", "delete"), ("name", name)];
        let response = self
            .http()
            .post(self.collections_admin_url())
            .form(&wipe)
            .send()
            .await?;
        log_tolerated(&format!("Wiping {name}"), response);

        tracing::info!("Creating '{name}' collection");
        let create = [
            ("action", "CREATE"),
            ("name", name),
            ("numShards", "1"),
            ("replicationFactor", "1"),
        ];
        let response = self
            .http()
            .post(self.collections_admin_url())
            .form(&create)
            .send()
            .await?;
        let response =
            check_response(&format!("Creating {name}"), response).await?;
        Ok(AdminStatus::from_body(read_json(response).await?))
    }

    pub async fn delete_collection(&self, name: &str) -> Result<AdminStatus> {
        let params = [("action", "DELETE"), ("name", name)];
        let response = self
            .http()
            .post(self.collections_admin_url())
            .form(&params)
            .send()
            .await?;
        let response =
            check_response(&format!("Deleting {name}"), response).await?;
        Ok(AdminStatus::from_body(read_json(response).await?))
    }

    /// Register the `ltr` query parser and the `features` document
    /// transformer on `collection`, replacing earlier registrations.
    pub async fn enable_ltr(&self, collection: &str) -> Result<LtrSetup> {
        let url = self.collection_url(collection, "config");

        tracing::info!("Del/Adding LTR QParser for {collection} collection");
        self.post_json_tolerated(&url, &json!({ "delete-queryparser": "ltr" }))
            .await?;
        let query_parser = self
            .post_json(
                "Adding LTR QParser",
                &url,
                &json!({
                    "add-queryparser": {
                        "name": "ltr",
                        "class": LTR_QPARSER_CLASS,
                    }
                }),
            )
            .await?;

        tracing::info!("Adding LTR Doc Transformer for {collection} collection");
        self.post_json_tolerated(
            &url,
            &json!({ "delete-transformer": "features" }),
        )
        .await?;
        let transformer = self
            .post_json(
                "Adding LTR Doc Transformer",
                &url,
                &json!({
                    "add-transformer": {
                        "name": "features",
                        "class": LTR_TRANSFORMER_CLASS,
                        "fvCacheName": FEATURE_VECTOR_CACHE,
                    }
                }),
            )
            .await?;

        Ok(LtrSetup {
            query_parser,
            transformer,
        })
    }

    /// (Re)create a stored, indexed, single-valued `text_general` field.
    pub async fn upsert_text_field(
        &self,
        collection: &str,
        field: &str,
    ) -> Result<AdminStatus> {
        self.upsert_field(collection, field, "text_general").await
    }

    /// (Re)create a stored, indexed, single-valued `pint` field.
    pub async fn upsert_integer_field(
        &self,
        collection: &str,
        field: &str,
    ) -> Result<AdminStatus> {
        self.upsert_field(collection, field, "pint").await
    }

    async fn upsert_field(
        &self,
        collection: &str,
        field: &str,
        field_type: &str,
    ) -> Result<AdminStatus> {
        let url = self.collection_url(collection, "schema");

        // Delete first so repeated calls are idempotent.
        self.post_json_tolerated(
            &url,
            &json!({ "delete-field": { "name": field } }),
        )
        .await?;

        tracing::info!("Adding '{field}' field to collection");
        self.post_json(
            &format!("Adding field {field}"),
            &url,
            &json!({
                "add-field": {
                    "name": field,
                    "type": field_type,
                    "stored": true,
                    "indexed": true,
                    "multiValued": false,
                }
            }),
        )
        .await
    }

    /// Replace the feature store `store` on `collection` with `features`.
    ///
    /// Every feature is assigned to `store`, whatever it declared.
    pub async fn upload_feature_store(
        &self,
        collection: &str,
        store: &str,
        features: &[FeatureDefinition],
    ) -> Result<AdminStatus> {
        let store_url = self.collection_url(
            collection,
            &format!("schema/feature-store/{store}"),
        );
        let response = self.http().delete(&store_url).send().await?;
        log_tolerated(&format!("Deleting feature store {store}"), response);

        let features: Vec<FeatureDefinition> = features
            .iter()
            .cloned()
            .map(|mut f| {
                f.store = Some(store.to_string());
                f
            })
            .collect();

        tracing::info!(
            count = features.len(),
            "Uploading feature store {store} to {collection}"
        );
        let response = self
            .http()
            .put(self.collection_url(collection, "schema/feature-store"))
            .json(&features)
            .send()
            .await?;
        let response = check_response(
            &format!("Uploading feature store {store}"),
            response,
        )
        .await?;
        Ok(AdminStatus::from_body(read_json(response).await?))
    }

    pub async fn delete_feature_store(
        &self,
        collection: &str,
        store: &str,
    ) -> Result<AdminStatus> {
        let url = self.collection_url(
            collection,
            &format!("schema/feature-store/{store}"),
        );
        let response = self.http().delete(url).send().await?;
        let response = check_response(
            &format!("Deleting feature store {store}"),
            response,
        )
        .await?;
        Ok(AdminStatus::from_body(read_json(response).await?))
    }

    /// Ask Solr for its system info; any status >= 400 or transport
    /// failure is an error.
    pub async fn health_check(&self) -> Result<AdminStatus> {
        let response = self
            .http()
            .get(format!("{}/admin/info/system?wt=json", self.base_url()))
            .send()
            .await?;
        let response = check_response("Health check", response).await?;
        Ok(AdminStatus::from_body(read_json(response).await?))
    }

    async fn post_json(
        &self,
        label: &str,
        url: &str,
        payload: &Value,
    ) -> Result<AdminStatus> {
        let response = self.http().post(url).json(payload).send().await?;
        let response = check_response(label, response).await?;
        Ok(AdminStatus::from_body(read_json(response).await?))
    }

    async fn post_json_tolerated(&self, url: &str, payload: &Value) -> Result<()> {
        let response = self.http().post(url).json(payload).send().await?;
        log_tolerated(&payload.to_string(), response);
        Ok(())
    }
}

/// Cleanup steps may legitimately fail (nothing to delete yet).
fn log_tolerated(label: &str, response: reqwest::Response) {
    tracing::debug!(
        label,
        status = response.status().as_u16(),
        "cleanup step finished"
    );
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_status_is_success() {
        let status = AdminStatus::from_body(
            json!({"responseHeader": {"status": 0, "QTime": 3}}),
        );
        assert!(status.success);
    }

    #[test]
    fn non_zero_or_missing_status_is_failure() {
        assert!(
            !AdminStatus::from_body(json!({"responseHeader": {"status": 400}}))
                .success
        );
        assert!(!AdminStatus::from_body(json!({"error": "boom"})).success);
    }

    #[test]
    fn ltr_setup_needs_both_registrations() {
        let ok = AdminStatus::from_body(json!({"responseHeader": {"status": 0}}));
        let bad = AdminStatus::from_body(json!({}));
        let setup = LtrSetup {
            query_parser: ok.clone(),
            transformer: bad,
        };
        assert!(!setup.success());
        let setup = LtrSetup {
            query_parser: ok.clone(),
            transformer: ok,
        };
        assert!(setup.success());
    }

    #[test]
    fn feature_definition_parses_without_store() {
        let feature: FeatureDefinition = serde_json::from_value(json!({
            "name": "title_bm25",
            "class": "org.apache.solr.ltr.feature.SolrFeature",
            "params": {"q": "title:(${keywords})"}
        }))
        .unwrap();
        assert_eq!(feature.store, None);
        let back = serde_json::to_value(&feature).unwrap();
        assert!(back.get("store").is_none());
    }
}
