//! In-memory HTTP client for testing.

use crate::error::{ErrorKind, Result};
use crate::{HttpClient, Response};
use async_trait::async_trait;
use bytes::Bytes;
use std::collections::HashMap;
use std::time::Duration;
use time::OffsetDateTime;
use tokio::sync::RwLock;

/// A canned answer for one URL.
#[derive(Clone, Debug)]
pub struct MockRoute {
    status: u16,
    body: Bytes,
    last_modified: Option<OffsetDateTime>,
    delay: Option<Duration>,
}

impl MockRoute {
    pub fn ok(body: impl Into<Bytes>) -> Self {
        Self {
            status: 200,
            body: body.into(),
            last_modified: None,
            delay: None,
        }
    }

    pub fn status(status: u16) -> Self {
        Self {
            status,
            body: Bytes::new(),
            last_modified: None,
            delay: None,
        }
    }

    pub fn last_modified(mut self, last_modified: OffsetDateTime) -> Self {
        self.last_modified = Some(last_modified);
        self
    }

    /// Sleep before answering, to widen race windows or trip timeouts.
    pub fn delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }
}

/// In-memory HTTP client for testing.
///
/// Routes are stored in a `HashMap` behind a [`RwLock`], so they can be
/// swapped while loaders hold the client. Unknown URLs answer 404. Every
/// request is counted per URL.
///
/// # Examples
///
/// ```
/// use vexcat_transport::{HttpClient, MockClient, MockRoute};
///
/// # #[tokio::main(flavor = "current_thread")]
/// # async fn main() {
/// let client = MockClient::with_routes([
///     ("https://example.com/vex.json", MockRoute::ok("{}")),
/// ]);
/// let response = client.get("https://example.com/vex.json").await.unwrap();
/// assert_eq!(response.body.as_ref(), b"{}");
/// assert_eq!(client.requests("https://example.com/vex.json").await, 1);
/// # }
/// ```
#[derive(Default)]
pub struct MockClient {
    routes: RwLock<HashMap<String, MockRoute>>,
    requests: RwLock<HashMap<String, usize>>,
}

impl MockClient {
    pub fn with_routes(routes: impl IntoIterator<Item = (impl Into<String>, MockRoute)>) -> Self {
        Self {
            routes: RwLock::new(routes.into_iter().map(|(url, route)| (url.into(), route)).collect()),
            requests: RwLock::default(),
        }
    }

    /// Add or replace the route for `url`.
    pub async fn route(&self, url: impl Into<String>, route: MockRoute) {
        self.routes.write().await.insert(url.into(), route);
    }

    /// Number of GETs issued for `url` so far.
    pub async fn requests(&self, url: &str) -> usize {
        self.requests.read().await.get(url).copied().unwrap_or(0)
    }

    /// Number of GETs issued across all URLs.
    pub async fn total_requests(&self) -> usize {
        self.requests.read().await.values().sum()
    }
}

#[async_trait]
impl HttpClient for MockClient {
    fn name(&self) -> &str {
        "mock"
    }

    async fn get(&self, url: &str) -> Result<Response> {
        *self.requests.write().await.entry(url.to_string()).or_default() += 1;
        let route = self.routes.read().await.get(url).cloned();
        let Some(route) = route else {
            exn::bail!(ErrorKind::Status {
                url: url.to_string(),
                status: 404,
            });
        };
        if let Some(delay) = route.delay {
            tokio::time::sleep(delay).await;
        }
        if route.status != 200 {
            exn::bail!(ErrorKind::Status {
                url: url.to_string(),
                status: route.status,
            });
        }
        Ok(Response {
            body: route.body,
            last_modified: route.last_modified,
        })
    }
}
