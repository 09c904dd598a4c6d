//! # curseloader
//!
//! Installation pipeline for catalog-hosted mods and modpacks: recursive
//! required-dependency resolution, sequential download orchestration with
//! content-integrity verification, and archive-based bundle installs driven
//! by an embedded manifest.
//!
//! # Quick Start
//!
//! ```rust,no_run
//! use curseloader::{
//!     InstallConfig, Installer, ModRef, ProgressEvent, ResolveContext,
//!     SelectionSet,
//! };
//! use std::path::Path;
//! use std::sync::Arc;
//!
//! # async fn example() -> curseloader::Result<()> {
//! let config = InstallConfig::default().with_api_key("...");
//! let installer = Installer::new(config)?;
//!
//! // One file per mod; required dependencies are filled in automatically.
//! let mut selection = SelectionSet::new();
//! selection.select(ModRef::new(238222, 4712858));
//!
//! let ctx = ResolveContext::new(Some("1.20.1".to_string()), None);
//! let progress = Arc::new(|event: ProgressEvent| {
//!     if let ProgressEvent::UnitFinished { file_name, percent } = event {
//!         println!("{percent:.0}% {file_name}");
//!     }
//! });
//!
//! let report = installer
//!     .run(selection, &ctx, Path::new("instance/mods"), Some(progress))
//!     .await?;
//! println!("{} files verified", report.verified.len());
//! # Ok(())
//! # }
//! ```
//!
//! # Guarantees
//!
//! - **Exactly once**: each mod is resolved at most once and each distinct
//!   download URL is fetched at most once per run.
//! - **Fail fast**: the first integrity mismatch on freshly retrieved bytes
//!   aborts the run; already-verified files stay in place.
//! - **Idempotent re-runs**: an existing destination file whose hashes match
//!   is satisfied with zero network I/O.

pub mod bundle;
pub mod catalog;
pub mod config;
pub mod coordinator;
pub mod download;
pub mod error;
pub mod progress;
pub mod resolve;
pub mod selection;
pub mod verify;

pub use bundle::{
    BundleInstaller, BundleOutcome, ManifestFileRef, ManifestLoaderRef, MinecraftSpec,
    PackManifest,
};
pub use catalog::{
    CatalogClient, FileDependency, FileHash, FileRecord, HashAlgo, ModLoaderType, ModRef,
    ModSummary, RelationType,
};
pub use config::InstallConfig;
pub use coordinator::{InstallReport, Installer};
pub use download::{DownloadEngine, DownloadUnit, VerifiedFile};
pub use error::{FileOperation, InstallError, InstallWarning, Result};
pub use progress::{InstallState, ProgressCallback, ProgressEvent, ProgressTracker};
pub use resolve::DependencyResolver;
pub use selection::{ResolveContext, SelectionSet};
