//! Thin HTTP client for the Jikan v4 API.
//!
//! One GET per call, bounded by the client timeout, no retries. Every failure
//! comes back as a [`FetchError`] so the catalog layer can decide how to degrade.

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use serde_json::Value;
use std::collections::BTreeMap;
use std::fmt;
use std::time::Duration;
use thiserror::Error;
use tracing::debug;

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum FetchError {
    #[error("request timed out")]
    Timeout,

    #[error("connection failure: {0}")]
    ConnectionFailure(String),

    #[error("upstream returned HTTP {status}")]
    UpstreamError { status: u16 },

    #[error("malformed response: {0}")]
    MalformedResponse(String),
}

impl FetchError {
    /// Stable label used in logs and metrics.
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::Timeout => "timeout",
            Self::ConnectionFailure(_) => "connection_failure",
            Self::UpstreamError { .. } => "upstream_error",
            Self::MalformedResponse(_) => "malformed_response",
        }
    }

    fn from_transport(err: &reqwest::Error) -> Self {
        if err.is_timeout() {
            Self::Timeout
        } else if err.is_decode() {
            Self::MalformedResponse(err.to_string())
        } else {
            Self::ConnectionFailure(err.to_string())
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParamValue {
    Text(String),
    Integer(i64),
}

impl fmt::Display for ParamValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Text(s) => f.write_str(s),
            Self::Integer(n) => write!(f, "{n}"),
        }
    }
}

impl From<&str> for ParamValue {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

impl From<String> for ParamValue {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

impl From<i64> for ParamValue {
    fn from(value: i64) -> Self {
        Self::Integer(value)
    }
}

impl From<i32> for ParamValue {
    fn from(value: i32) -> Self {
        Self::Integer(i64::from(value))
    }
}

impl From<u32> for ParamValue {
    fn from(value: u32) -> Self {
        Self::Integer(i64::from(value))
    }
}

impl From<f64> for ParamValue {
    fn from(value: f64) -> Self {
        Self::Text(value.to_string())
    }
}

/// Query parameters kept sorted by key, so iteration order never depends on
/// the order they were added in.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct QueryParams(BTreeMap<String, ParamValue>);

impl QueryParams {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with(mut self, key: impl Into<String>, value: impl Into<ParamValue>) -> Self {
        self.insert(key, value);
        self
    }

    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<ParamValue>) {
        self.0.insert(key.into(), value.into());
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &ParamValue)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v))
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// Anything that can answer a catalog request with a JSON body.
#[async_trait]
pub trait CatalogSource: Send + Sync {
    async fn fetch(&self, endpoint: &str, params: &QueryParams) -> Result<Value, FetchError>;
}

// Upstream record shape. Every field is optional: absence is normal and the
// normalizer decides what to substitute.

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct RawAnime {
    pub mal_id: Option<i32>,
    pub url: Option<String>,
    pub images: Option<RawImages>,
    pub title: Option<String>,
    pub title_english: Option<String>,
    #[serde(rename = "type")]
    pub kind: Option<String>,
    pub episodes: Option<i32>,
    pub status: Option<String>,
    pub aired: Option<RawAired>,
    pub score: Option<f64>,
    pub rank: Option<i32>,
    pub synopsis: Option<String>,
    pub broadcast: Option<RawBroadcast>,
    pub genres: Option<Vec<RawNamed>>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct RawImages {
    pub jpg: Option<RawImageSet>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct RawImageSet {
    pub image_url: Option<String>,
    pub large_image_url: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct RawAired {
    pub from: Option<String>,
    pub to: Option<String>,
    pub string: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct RawBroadcast {
    pub string: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct RawNamed {
    pub name: Option<String>,
}

#[derive(Clone)]
pub struct JikanClient {
    client: Client,
    base_url: String,
}

impl JikanClient {
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> anyhow::Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .user_agent(concat!("animecalendar/", env!("CARGO_PKG_VERSION")))
            .pool_max_idle_per_host(10)
            .build()
            .map_err(|e| anyhow::anyhow!("Failed to build Jikan HTTP client: {e}"))?;

        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }

    fn endpoint_url(&self, endpoint: &str, params: &QueryParams) -> Result<url::Url, FetchError> {
        let mut url = url::Url::parse(&format!("{}{}", self.base_url, endpoint))
            .map_err(|e| FetchError::ConnectionFailure(format!("invalid url: {e}")))?;

        if !params.is_empty() {
            let mut pairs = url.query_pairs_mut();
            for (key, value) in params.iter() {
                pairs.append_pair(key, &value.to_string());
            }
        }

        Ok(url)
    }
}

#[async_trait]
impl CatalogSource for JikanClient {
    async fn fetch(&self, endpoint: &str, params: &QueryParams) -> Result<Value, FetchError> {
        let url = self.endpoint_url(endpoint, params)?;
        debug!(url = %url, "Jikan request");

        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| FetchError::from_transport(&e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::UpstreamError {
                status: status.as_u16(),
            });
        }

        let body = response
            .bytes()
            .await
            .map_err(|e| FetchError::from_transport(&e))?;

        serde_json::from_slice(&body).map_err(|e| FetchError::MalformedResponse(e.to_string()))
    }
}
