//! Catalog documents.
//!
//! A catalog document lists catalog entries, each describing where VEX
//! documents for some set of packages can be found:
//!
//! - `single`: one URL serving every matching package;
//! - `template`: a URL [`Pattern`](vexcat_pattern::Pattern) expanded per
//!   request;
//! - `vex-repo`: a VEX repository manifest, served by `vexcat-repo`.
//!
//! [`catalog_loader`] turns a whole document into one [`Proxy`] loader,
//! skipping entries of kinds it does not know.
//!
//! [`Proxy`]: vexcat_loader::Proxy

mod dispatch;
pub mod error;
mod model;
mod url;

pub use self::dispatch::{catalog_loader, catalog_loader_from_url, download_catalog, repo_catalog_loader};
pub use self::model::{Catalog, CatalogDocument, CatalogKind, CatalogMetadata};
pub use self::url::UrlCatalogLoader;
