use crate::error::{ErrorKind, Result};
use crate::{DocumentFormat, InterpreterHandle, decode_document};
use bytes::Bytes;
use exn::ResultExt;
use std::sync::Arc;
use std::time::Duration;
use vexcat_cache::{CacheHandle, CacheKey};
use vexcat_transport::HttpHandle;

/// Collaborators every loader is built with.
pub struct Context<D> {
    pub client: HttpHandle,
    pub cache: CacheHandle,
    pub interpreter: InterpreterHandle<D>,
}

impl<D> Clone for Context<D> {
    fn clone(&self) -> Self {
        Self {
            client: Arc::clone(&self.client),
            cache: Arc::clone(&self.cache),
            interpreter: Arc::clone(&self.interpreter),
        }
    }
}

impl<D> Context<D> {
    pub fn new(client: HttpHandle, cache: CacheHandle, interpreter: InterpreterHandle<D>) -> Self {
        Self {
            client,
            cache,
            interpreter,
        }
    }

    /// GET `url` through the cache.
    pub async fn fetch_cached(&self, key: CacheKey, url: &str, interval: Duration) -> Result<Bytes> {
        self.cache
            .fetch(key, interval, Box::pin(self.client.get(url)))
            .await
            .or_raise(|| ErrorKind::Fetch(url.to_string()))
    }

    /// GET `url`, bypassing the cache.
    pub async fn fetch_uncached(&self, url: &str) -> Result<vexcat_transport::Response> {
        self.client.get(url).await.or_raise(|| ErrorKind::Fetch(url.to_string()))
    }

    /// Hand `body` to the interpreter.
    pub fn decode(&self, body: Bytes, format: &DocumentFormat) -> Result<D> {
        decode_document(self.interpreter.as_ref(), body, format)
    }
}
