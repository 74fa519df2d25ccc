use std::time::Duration;

use crate::error::{Error, Result};

pub const DEFAULT_SCHEME: &str = "http";
pub const DEFAULT_HOST: &str = "localhost";
/// Hostname of the Solr container when running inside the docker network.
pub const DOCKER_HOST: &str = "solr";
pub const DEFAULT_PORT: u16 = 8983;
pub const DEFAULT_BASE_PATH: &str = "solr";
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Full base URL, e.g. `http://search-solr:8983/solr`. Wins over the
/// individual host/port variables.
pub const URL_ENV_VAR: &str = "SOLR_URL";
pub const HOST_ENV_VAR: &str = "SOLR_HOST";
pub const PORT_ENV_VARS: &[&str] = &["SOLR_PORT", "SEARCH_SOLR_PORT"];
/// When set (to anything), the host defaults to [`DOCKER_HOST`].
pub const DOCKER_ENV_VAR: &str = "LTR_DOCKER";

/// Where the Solr instance lives and how long to wait for it.
///
/// The client never reads the environment itself; callers build one of
/// these (possibly via [`SolrConfig::from_env`]) and hand it over.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SolrConfig {
    pub scheme: String,
    pub host: String,
    pub port: u16,
    /// Path under the host, without leading or trailing slashes.
    pub base_path: String,
    pub timeout: Duration,
}

impl Default for SolrConfig {
    fn default() -> Self {
        Self {
            scheme: DEFAULT_SCHEME.to_string(),
            host: DEFAULT_HOST.to_string(),
            port: DEFAULT_PORT,
            base_path: DEFAULT_BASE_PATH.to_string(),
            timeout: DEFAULT_TIMEOUT,
        }
    }
}

impl SolrConfig {
    pub fn new(host: impl Into<String>, port: u16) -> Self {
        Self {
            host: host.into(),
            port,
            ..Self::default()
        }
    }

    /// Resolve the configuration from the process environment, in order of
    /// priority:
    /// 1. `SOLR_URL` (a full base URL)
    /// 2. `SOLR_HOST`, or `solr` when `LTR_DOCKER` is set, else `localhost`,
    ///    combined with `SOLR_PORT` / `SEARCH_SOLR_PORT`
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Same as [`SolrConfig::from_env`] with an injectable variable lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(url) = lookup(URL_ENV_VAR).filter(|v| !v.is_empty()) {
            return Self::from_base_url(&url);
        }

        let host = lookup(HOST_ENV_VAR)
            .filter(|v| !v.is_empty())
            .unwrap_or_else(|| {
                if lookup(DOCKER_ENV_VAR).is_some() {
                    DOCKER_HOST.to_string()
                } else {
                    DEFAULT_HOST.to_string()
                }
            });

        let port = match PORT_ENV_VARS
            .iter()
            .find_map(|key| lookup(key).filter(|v| !v.is_empty()))
        {
            Some(raw) => raw.trim().parse().map_err(|_| {
                Error::Config(format!("invalid Solr port: {raw:?}"))
            })?,
            None => DEFAULT_PORT,
        };

        Ok(Self::new(host, port))
    }

    /// Parse a base URL such as `http://localhost:8983/solr/`.
    ///
    /// A trailing slash is ignored. When the URL carries no explicit port
    /// the scheme's default is used.
    pub fn from_base_url(url: &str) -> Result<Self> {
        let parsed = reqwest::Url::parse(url.trim_end_matches('/'))
            .map_err(|e| {
                Error::Config(format!("invalid Solr URL {url:?}: {e}"))
            })?;

        let host = parsed
            .host_str()
            .filter(|h| !h.is_empty())
            .ok_or_else(|| {
                Error::Config(format!("Solr URL has no host: {url:?}"))
            })?
            .to_string();
        let port = parsed.port_or_known_default().ok_or_else(|| {
            Error::Config(format!("Solr URL has no port: {url:?}"))
        })?;

        Ok(Self {
            scheme: parsed.scheme().to_string(),
            host,
            port,
            base_path: parsed.path().trim_matches('/').to_string(),
            timeout: DEFAULT_TIMEOUT,
        })
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// The base endpoint, never ending in a slash.
    pub fn base_url(&self) -> String {
        let root = format!("{}://{}:{}", self.scheme, self.host, self.port);
        let path = self.base_path.trim_matches('/');
        if path.is_empty() {
            root
        } else {
            format!("{root}/{path}")
        }
    }
}
