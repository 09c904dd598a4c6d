//! Installation coordinator
//!
//! Sequences one install run: resolve dependencies, download and verify the
//! closed file set, and route archive-packaged files through the bundle
//! installer. One state machine instance per run; `Completed` is reached
//! only when every unit verified, and any fatal component error transitions
//! to `Failed` carrying the offending identity.

use std::path::Path;
use tracing::{debug, info};

use crate::bundle::{self, BundleInstaller};
use crate::catalog::CatalogClient;
use crate::config::InstallConfig;
use crate::download::{DownloadEngine, VerifiedFile};
use crate::error::{InstallWarning, Result};
use crate::progress::{InstallState, ProgressCallback, ProgressTracker};
use crate::resolve::DependencyResolver;
use crate::selection::{ResolveContext, SelectionSet};

/// Terminal result of a successful run
#[derive(Debug)]
pub struct InstallReport {
    pub verified: Vec<VerifiedFile>,
    /// Non-fatal conditions (skipped manifest entries, override conflicts)
    pub warnings: Vec<InstallWarning>,
}

/// Entry point owning the catalog gateway and the download engine
pub struct Installer {
    catalog: CatalogClient,
    engine: DownloadEngine,
}

impl Installer {
    pub fn new(config: InstallConfig) -> Result<Self> {
        let catalog = CatalogClient::new(&config)?;
        let engine = DownloadEngine::new(&config, catalog.clone())?;
        Ok(Self { catalog, engine })
    }

    pub fn catalog(&self) -> &CatalogClient {
        &self.catalog
    }

    pub fn engine(&self) -> &DownloadEngine {
        &self.engine
    }

    /// Run one install: resolve, download, verify, and (for archives)
    /// extract and expand the bundle manifest
    pub async fn run(
        &self,
        selection: SelectionSet,
        ctx: &ResolveContext,
        dest: &Path,
        callback: Option<ProgressCallback>,
    ) -> Result<InstallReport> {
        let mut tracker = ProgressTracker::new(callback);
        tracker.state_changed(InstallState::Idle);

        match self.run_inner(selection, ctx, dest, &mut tracker).await {
            Ok(report) => {
                tracker.state_changed(InstallState::Completed);
                tracker.completed(report.verified.len());
                info!(
                    "Install completed: {} files verified, {} warnings",
                    report.verified.len(),
                    report.warnings.len()
                );
                Ok(report)
            }
            Err(e) => {
                tracker.state_changed(InstallState::Failed);
                tracker.failed(&e);
                Err(e)
            }
        }
    }

    async fn run_inner(
        &self,
        selection: SelectionSet,
        ctx: &ResolveContext,
        dest: &Path,
        tracker: &mut ProgressTracker,
    ) -> Result<InstallReport> {
        tracker.state_changed(InstallState::ResolvingDependencies);
        let mut resolver = DependencyResolver::new(&self.catalog);
        let resolved = resolver.resolve(selection, ctx).await?;
        debug!("Resolved selection closed over {} mods", resolved.len());

        let records = self.catalog.get_files_by_ids(&resolved.file_ids()).await?;
        let (bundles, plain): (Vec<_>, Vec<_>) =
            records.into_iter().partition(bundle::is_bundle);

        tracker.state_changed(InstallState::DownloadingAndVerifying);
        let mut warnings = Vec::new();
        let mut verified = self.engine.install_records(&plain, dest, tracker).await?;

        let bundle_installer = BundleInstaller::new(&self.engine);
        for record in &bundles {
            let outcome = bundle_installer
                .install_bundle(record, dest, tracker, &mut warnings)
                .await?;
            verified.push(outcome.archive);
            verified.extend(outcome.fetched);
        }

        Ok(InstallReport { verified, warnings })
    }
}
