//! `reqwest`-backed HTTP client.

use crate::error::{ErrorKind, Result};
use crate::{HttpClient, Response, parse_http_date};
use async_trait::async_trait;
use exn::ResultExt;
use reqwest::StatusCode;
use reqwest::header::LAST_MODIFIED;
use std::time::Duration;
use tracing::instrument;

const DEFAULT_USER_AGENT: &str = concat!("vexcat/", env!("CARGO_PKG_VERSION"));
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Options for building a [`ReqwestClient`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct HttpOptions {
    /// Whole-request timeout; `None` disables it.
    pub timeout: Option<Duration>,
    pub user_agent: String,
}

impl Default for HttpOptions {
    fn default() -> Self {
        Self {
            timeout: Some(DEFAULT_TIMEOUT),
            user_agent: DEFAULT_USER_AGENT.to_string(),
        }
    }
}

/// HTTP client over a pooled [`reqwest::Client`].
#[derive(Clone, Debug)]
pub struct ReqwestClient {
    name: String,
    inner: reqwest::Client,
}

impl ReqwestClient {
    pub fn new(options: &HttpOptions) -> Result<Self> {
        let mut builder = reqwest::Client::builder().user_agent(options.user_agent.as_str());
        if let Some(timeout) = options.timeout {
            builder = builder.timeout(timeout);
        }
        let inner = builder.build().or_raise(|| ErrorKind::Client)?;
        Ok(Self {
            name: "reqwest".to_string(),
            inner,
        })
    }

    /// Wrap an already configured client.
    pub fn from_client(inner: reqwest::Client) -> Self {
        Self {
            name: "reqwest".to_string(),
            inner,
        }
    }
}

#[async_trait]
impl HttpClient for ReqwestClient {
    fn name(&self) -> &str {
        &self.name
    }

    #[instrument(skip(self), fields(client = %self.name, status, size))]
    async fn get(&self, url: &str) -> Result<Response> {
        let response = self.inner.get(url).send().await.map_err(|err| {
            exn::Exn::from(ErrorKind::Network {
                url: url.to_string(),
                reason: err.to_string(),
            })
        })?;
        let status = response.status();
        tracing::Span::current().record("status", status.as_u16());
        if status != StatusCode::OK {
            exn::bail!(ErrorKind::Status {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }
        let last_modified = response
            .headers()
            .get(LAST_MODIFIED)
            .and_then(|value| value.to_str().ok())
            .and_then(parse_http_date);
        let body = response
            .bytes()
            .await
            .or_raise(|| ErrorKind::Body(url.to_string()))?;
        tracing::Span::current().record("size", body.len());
        Ok(Response { body, last_modified })
    }
}
