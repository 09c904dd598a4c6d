//! Bundle (modpack) installation
//!
//! A bundle is an archive-packaged file: its contents are unpacked into the
//! destination, an `overrides` tree is merged one level up into the actual
//! instance folder, and an embedded `manifest.json` names additional
//! (project, file) references that are fetched individually through the
//! same single-unit download path as everything else.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::{debug, warn};

use crate::catalog::FileRecord;
use crate::download::{DownloadEngine, DownloadUnit, VerifiedFile};
use crate::error::{FileOperation, InstallError, InstallWarning, Result};
use crate::progress::{InstallState, ProgressTracker};

const MANIFEST_NAME: &str = "manifest.json";
const OVERRIDES_DIR: &str = "overrides";

/// On-disk bundle manifest; field names follow the archive format exactly
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PackManifest {
    pub minecraft: MinecraftSpec,
    #[serde(rename = "manifestType")]
    pub manifest_type: String,
    #[serde(rename = "manifestVersion")]
    pub manifest_version: u32,
    pub name: String,
    pub version: String,
    pub author: String,
    pub files: Vec<ManifestFileRef>,
    pub overrides: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MinecraftSpec {
    pub version: String,
    #[serde(rename = "modLoaders")]
    pub mod_loaders: Vec<ManifestLoaderRef>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ManifestLoaderRef {
    pub id: String,
    pub primary: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ManifestFileRef {
    #[serde(rename = "projectID")]
    pub project_id: i64,
    #[serde(rename = "fileID")]
    pub file_id: i64,
    pub required: bool,
}

/// True when the chosen file's name has an archive extension
pub fn is_bundle(record: &FileRecord) -> bool {
    record.file_name.to_ascii_lowercase().ends_with(".zip")
}

/// What one bundle install produced
#[derive(Debug)]
pub struct BundleOutcome {
    /// Verification record for the bundle file itself, computed over the
    /// archive's original bytes before deletion
    pub archive: VerifiedFile,
    /// Manifest-referenced files fetched into the destination
    pub fetched: Vec<VerifiedFile>,
}

/// Installs one bundle through the shared download engine
pub struct BundleInstaller<'a> {
    engine: &'a DownloadEngine,
}

impl<'a> BundleInstaller<'a> {
    pub fn new(engine: &'a DownloadEngine) -> Self {
        Self { engine }
    }

    /// Install an archive-packaged file into `dest`
    ///
    /// The archive itself is downloaded and verified first; its hash record
    /// (computed over the original archive bytes) is what this returns. The
    /// archive is deleted after extraction; only its unpacked contents and
    /// the manifest-referenced files are deliverables. A manifest entry
    /// whose URL cannot be resolved is skipped with a warning; the rest of
    /// the bundle continues.
    pub async fn install_bundle(
        &self,
        record: &FileRecord,
        dest: &Path,
        tracker: &mut ProgressTracker,
        warnings: &mut Vec<InstallWarning>,
    ) -> Result<BundleOutcome> {
        let mod_name = self.engine.catalog().get_mod(record.mod_id).await?.name;
        let url = record
            .download_url
            .as_deref()
            .filter(|u| !u.is_empty())
            .ok_or(InstallError::MissingDownloadUrl {
                mod_id: record.mod_id,
                file_id: record.id,
            })?;

        let unit = DownloadUnit::from_record(record, &mod_name, url);
        tracker.add_units(1);
        let archive = self.engine.install_unit(&unit, dest, tracker).await?;

        tracker.state_changed(InstallState::ExtractingBundle);
        extract_archive(&archive.path, dest).await?;
        relocate_overrides(dest, tracker, warnings).await?;

        tracker.state_changed(InstallState::ResolvingManifestFiles);
        let manifest = read_manifest(&archive.path, dest).await?;
        debug!(
            "Bundle '{}' manifest lists {} files",
            manifest.name,
            manifest.files.len()
        );

        tracker.state_changed(InstallState::DownloadingManifestFiles);
        tracker.add_units(manifest.files.len());
        let mut fetched = Vec::new();
        for entry in &manifest.files {
            match self
                .engine
                .catalog()
                .get_download_url(entry.project_id, entry.file_id)
                .await
            {
                Ok(entry_url) => {
                    let entry_unit = DownloadUnit::manifest_entry(
                        entry_url,
                        entry.project_id,
                        entry.file_id,
                        &mod_name,
                    );
                    fetched.push(self.engine.install_unit(&entry_unit, dest, tracker).await?);
                }
                Err(e) => {
                    warn!(
                        "Could not resolve manifest entry (project {}, file {}): {}",
                        entry.project_id, entry.file_id, e
                    );
                    let warning = InstallWarning::ManifestEntrySkipped {
                        project_id: entry.project_id,
                        file_id: entry.file_id,
                        reason: e.to_string(),
                    };
                    tracker.warning(warning.to_string());
                    warnings.push(warning);
                    // The unit still resolves for progress purposes.
                    tracker.unit_finished(&format!("project-{}", entry.project_id));
                }
            }
        }

        fs::remove_file(&archive.path)
            .await
            .map_err(|e| InstallError::io(&archive.path, FileOperation::Delete, e))?;
        debug!("Removed bundle archive {}", archive.path.display());

        Ok(BundleOutcome { archive, fetched })
    }
}

/// Unpack every archive entry into `dest` on a blocking thread
async fn extract_archive(archive_path: &Path, dest: &Path) -> Result<()> {
    let archive = archive_path.to_path_buf();
    let dest = dest.to_path_buf();
    let identity = archive.clone();

    tokio::task::spawn_blocking(move || extract_archive_blocking(&archive, &dest))
        .await
        .map_err(|e| InstallError::Extraction {
            archive: identity,
            reason: format!("extraction task failed: {e}"),
        })?
}

fn extract_archive_blocking(archive_path: &Path, dest: &Path) -> Result<()> {
    let extraction_error = |reason: String| InstallError::Extraction {
        archive: archive_path.to_path_buf(),
        reason,
    };

    let file = std::fs::File::open(archive_path)
        .map_err(|e| InstallError::io(archive_path, FileOperation::Read, e))?;
    let mut zip = zip::ZipArchive::new(file).map_err(|e| extraction_error(e.to_string()))?;

    for index in 0..zip.len() {
        let mut entry = zip
            .by_index(index)
            .map_err(|e| extraction_error(e.to_string()))?;
        // enclosed_name rejects paths escaping the destination (zip-slip)
        let Some(relative) = entry.enclosed_name() else {
            warn!("Skipping archive entry with unsafe path: {}", entry.name());
            continue;
        };
        let out_path = dest.join(relative);

        if entry.is_dir() {
            std::fs::create_dir_all(&out_path)
                .map_err(|e| InstallError::io(&out_path, FileOperation::CreateDir, e))?;
            continue;
        }
        if let Some(parent) = out_path.parent() {
            std::fs::create_dir_all(parent)
                .map_err(|e| InstallError::io(parent, FileOperation::CreateDir, e))?;
        }
        let mut out_file = std::fs::File::create(&out_path)
            .map_err(|e| InstallError::io(&out_path, FileOperation::Create, e))?;
        std::io::copy(&mut entry, &mut out_file)
            .map_err(|e| InstallError::io(&out_path, FileOperation::Write, e))?;
    }

    debug!(
        "Extracted {} entries from {}",
        zip.len(),
        archive_path.display()
    );
    Ok(())
}

/// Merge `dest/overrides` into the parent of `dest`
///
/// Every entry moves up one directory level so bundle-provided config and
/// resources land in the user's actual instance folder rather than staying
/// nested. A directory that already exists on both sides is merged
/// recursively. A pre-existing file is never clobbered silently: the
/// existing file is kept and a warning recorded, per file. The emptied
/// `overrides` directory is removed afterwards, discarding any kept-aside
/// bundle copies.
async fn relocate_overrides(
    dest: &Path,
    tracker: &ProgressTracker,
    warnings: &mut Vec<InstallWarning>,
) -> Result<()> {
    let overrides = dest.join(OVERRIDES_DIR);
    if !overrides.is_dir() {
        return Ok(());
    }
    let parent = dest
        .parent()
        .map(Path::to_path_buf)
        .unwrap_or_else(|| dest.to_path_buf());

    // Worklist of (source dir, target dir) pairs; pushing a pair means the
    // target directory already exists and the two trees must be merged.
    let mut pending = vec![(overrides.clone(), parent)];
    while let Some((source_dir, target_dir)) = pending.pop() {
        let mut entries = fs::read_dir(&source_dir)
            .await
            .map_err(|e| InstallError::io(&source_dir, FileOperation::Read, e))?;
        while let Some(entry) = entries
            .next_entry()
            .await
            .map_err(|e| InstallError::io(&source_dir, FileOperation::Read, e))?
        {
            let source = entry.path();
            let target = target_dir.join(entry.file_name());
            if !target.exists() {
                fs::rename(&source, &target)
                    .await
                    .map_err(|e| InstallError::io(&source, FileOperation::Move, e))?;
                debug!("Relocated override entry to {}", target.display());
                continue;
            }
            if source.is_dir() && target.is_dir() {
                pending.push((source, target));
                continue;
            }
            let warning = InstallWarning::OverrideConflict {
                path: target.clone(),
            };
            warn!("{warning}");
            tracker.warning(warning.to_string());
            warnings.push(warning);
        }
    }

    fs::remove_dir_all(&overrides)
        .await
        .map_err(|e| InstallError::io(&overrides, FileOperation::Delete, e))?;
    Ok(())
}

/// Read and parse `manifest.json` from the extraction root
async fn read_manifest(archive_path: &Path, dest: &Path) -> Result<PackManifest> {
    let manifest_path = dest.join(MANIFEST_NAME);
    let bytes = fs::read(&manifest_path)
        .await
        .map_err(|_| InstallError::Extraction {
            archive: archive_path.to_path_buf(),
            reason: format!("archive contains no {MANIFEST_NAME}"),
        })?;
    serde_json::from_slice(&bytes).map_err(|e| InstallError::Extraction {
        archive: archive_path.to_path_buf(),
        reason: format!("invalid {MANIFEST_NAME}: {e}"),
    })
}
