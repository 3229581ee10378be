//! Upstream subtitle catalog access.
//!
//! The `CatalogClient` trait is the seam between the pipeline and the
//! third-party catalog; `HttpCatalogClient` is the real implementation,
//! throttled through the per-credential queue lanes.

mod client;
mod types;

pub use client::{CatalogClient, HttpCatalogClient};
pub use types::{CatalogEntry, CatalogError};
