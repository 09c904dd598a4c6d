//! Metadata gateway for the remote catalog
//!
//! Fetches mod records, file records, and download URLs. Read-only; the
//! install pipeline never writes through this boundary.

pub mod client;
pub mod types;

pub use client::CatalogClient;
pub use types::{
    FileDependency, FileHash, FileRecord, HashAlgo, ModLoaderType, ModRef, ModSummary,
    RelationType,
};
