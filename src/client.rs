use reqwest::{Client, Response};
use serde_json::Value;

use crate::{
    config::SolrConfig,
    error::{Error, Result},
};

/// Handle on one Solr instance.
///
/// Cloning is cheap: clones share the underlying connection pool. The
/// client carries no request state between calls.
#[derive(Debug, Clone)]
pub struct SolrClient {
    http: Client,
    config: SolrConfig,
    base_url: String,
}

impl SolrClient {
    pub fn new(config: SolrConfig) -> Result<Self> {
        let http = Client::builder().timeout(config.timeout).build()?;
        let base_url = config.base_url();
        Ok(Self {
            http,
            config,
            base_url,
        })
    }

    /// Build a client from [`SolrConfig::from_env`].
    pub fn from_env() -> Result<Self> {
        Self::new(SolrConfig::from_env()?)
    }

    pub fn config(&self) -> &SolrConfig {
        &self.config
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub(crate) fn http(&self) -> &Client {
        &self.http
    }

    /// `{base}/{collection}/{path}`
    pub fn collection_url(&self, collection: &str, path: &str) -> String {
        format!(
            "{}/{}/{}",
            self.base_url,
            collection,
            path.trim_start_matches('/')
        )
    }

    pub fn collections_admin_url(&self) -> String {
        format!("{}/admin/collections", self.base_url)
    }
}

/// Log the outcome of a call and turn any status >= 400 into
/// [`Error::RequestFailed`] carrying the raw body.
pub async fn check_response(label: &str, response: Response) -> Result<Response> {
    let status = response.status().as_u16();
    tracing::info!("{label} [Status: {status}]");

    if status >= 400 {
        let body = match response.text().await {
            Ok(body) => body,
            Err(e) => {
                tracing::debug!(
                    label,
                    error = %e,
                    "could not read error body"
                );
                String::new()
            }
        };
        tracing::error!(label, status, body = %body, "request failed");
        return Err(Error::RequestFailed {
            label: label.to_string(),
            status,
            body,
        });
    }

    Ok(response)
}

/// Read a response body as JSON, reporting parse failures as
/// [`Error::Json`] rather than a transport error.
pub async fn read_json(response: Response) -> Result<Value> {
    let body = response.text().await?;
    Ok(serde_json::from_str(&body)?)
}
