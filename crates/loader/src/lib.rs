//! Loader contract and collection engine.
//!
//! A [`VexLoader`] answers one [`Request`] by emitting zero or more documents
//! and zero or more errors into a [`Sink`]. Matching nothing is success: the
//! loader simply emits nothing.
//!
//! [`collect()`] runs any number of loaders concurrently against one sink and
//! returns everything they emitted once all of them have finished. A
//! [`Proxy`] wraps a list of loaders behind the single-loader contract using
//! the same fan-out, so a catalog of catalogs looks like one loader from the
//! outside.
//!
//! Documents are generic: the caller supplies an [`Interpreter`] that turns
//! bytes into their document type, threaded to every loader through a
//! [`Context`].

mod collect;
mod context;
mod coordinate;
pub mod error;
mod format;
mod proxy;
mod request;
mod sink;

pub use self::collect::{CollectOptions, Collected, collect};
pub use self::context::Context;
pub use self::coordinate::{PackageCoordinate, VulnerabilityId};
pub use self::format::{
    DEFAULT_STANDARD, DEFAULT_STANDARD_VERSION, DocumentFormat, Interpreter, InterpreterHandle, JsonDocument,
    JsonInterpreter, decode_document,
};
pub use self::proxy::Proxy;
pub use self::request::Request;
pub use self::sink::Sink;
use crate::error::Result;
use async_trait::async_trait;
use std::sync::Arc;

/// Shared handle to a loader.
pub type LoaderHandle<D> = Arc<dyn VexLoader<D>>;

/// A source of VEX documents.
#[async_trait]
pub trait VexLoader<D>: Send + Sync {
    /// Name used in logs and in timeout/cancellation errors.
    fn name(&self) -> &str;

    /// Emit every document (and every failure) this source has for
    /// `request`. Returns once nothing more will be emitted.
    async fn load_vex(&self, request: &Request, sink: &Sink<D>);

    /// Release whatever the loader holds (temp files, open archives).
    async fn close(&self) -> Result<()> {
        Ok(())
    }
}
