//! Download & verify engine
//!
//! Fetches canonical file records for an id set, downloads each distinct
//! URL exactly once, and compares content hashes against the catalog's
//! declared values. Downloads run sequentially, one unit at a time, which
//! keeps progress monotonic and avoids concurrent writes into the same
//! destination directory.

use futures::StreamExt;
use reqwest::Client;
use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};
use tokio::fs;
use tokio::io::AsyncWriteExt;
use tracing::{debug, warn};

use crate::catalog::{CatalogClient, FileRecord};
use crate::config::InstallConfig;
use crate::error::{FileOperation, InstallError, Result};
use crate::progress::ProgressTracker;
use crate::verify::{self, ExpectedHashes, VerificationResult};

/// One scheduled download: a distinct URL plus the identity surfaced to
/// progress reporting
#[derive(Debug, Clone)]
pub struct DownloadUnit {
    pub url: String,
    pub mod_id: i64,
    pub file_id: i64,
    pub mod_name: String,
    pub file_name: String,
    pub expected: ExpectedHashes,
}

impl DownloadUnit {
    pub fn from_record(record: &FileRecord, mod_name: &str, url: &str) -> Self {
        let file_name = if record.file_name.is_empty() {
            filename_from_url(url)
        } else {
            record.file_name.clone()
        };
        Self {
            url: url.to_string(),
            mod_id: record.mod_id,
            file_id: record.id,
            mod_name: mod_name.to_string(),
            file_name,
            expected: ExpectedHashes::from_declared(&record.hashes),
        }
    }

    /// Unit for a bundle-manifest entry: URL only, no declared hashes
    pub fn manifest_entry(url: String, project_id: i64, file_id: i64, mod_name: &str) -> Self {
        let file_name = filename_from_url(&url);
        Self {
            url,
            mod_id: project_id,
            file_id,
            mod_name: mod_name.to_string(),
            file_name,
            expected: ExpectedHashes::default(),
        }
    }
}

/// A unit that passed verification, with its per-algorithm results
#[derive(Debug, Clone)]
pub struct VerifiedFile {
    pub mod_id: i64,
    pub file_id: i64,
    pub mod_name: String,
    pub file_name: String,
    pub path: PathBuf,
    pub verification: Vec<VerificationResult>,
}

/// The engine: plain HTTP transport for file bytes plus the catalog
/// gateway for records and owning-mod identity
pub struct DownloadEngine {
    catalog: CatalogClient,
    http: Client,
}

impl DownloadEngine {
    pub fn new(config: &InstallConfig, catalog: CatalogClient) -> Result<Self> {
        // File downloads go to third-party CDNs; the API key header stays
        // on the catalog client only.
        let http = Client::builder()
            .timeout(config.timeout)
            .user_agent(&config.user_agent)
            .build()
            .map_err(|e| InstallError::MetadataFetch {
                context: "creating download HTTP client".to_string(),
                source: e,
            })?;
        Ok(Self { catalog, http })
    }

    pub fn catalog(&self) -> &CatalogClient {
        &self.catalog
    }

    /// Install a set of files by id: batch-fetch their records, then
    /// download and verify each distinct URL sequentially
    pub async fn install_files(
        &self,
        file_ids: &[i64],
        dest: &Path,
        tracker: &mut ProgressTracker,
    ) -> Result<Vec<VerifiedFile>> {
        let records = self.catalog.get_files_by_ids(file_ids).await?;
        self.install_records(&records, dest, tracker).await
    }

    /// Install already-fetched records (the coordinator partitions records
    /// between this path and the bundle installer)
    pub async fn install_records(
        &self,
        records: &[FileRecord],
        dest: &Path,
        tracker: &mut ProgressTracker,
    ) -> Result<Vec<VerifiedFile>> {
        let units = self.plan_units(records).await?;
        tracker.add_units(units.len());

        let mut verified = Vec::with_capacity(units.len());
        for unit in &units {
            verified.push(self.install_unit(unit, dest, tracker).await?);
        }
        Ok(verified)
    }

    /// Build the deduplicated unit list for a record set
    ///
    /// Records are deduplicated by file id and then by download URL, so
    /// each distinct URL is scheduled exactly once. The owning mod's name is
    /// resolved through a memoized catalog lookup, which also covers
    /// manifest-introduced files absent from the user's selection.
    async fn plan_units(&self, records: &[FileRecord]) -> Result<Vec<DownloadUnit>> {
        let mut seen_files = HashSet::new();
        let mut seen_urls = HashSet::new();
        let mut mod_names: HashMap<i64, String> = HashMap::new();
        let mut units = Vec::new();

        for record in records {
            if !seen_files.insert(record.id) {
                continue;
            }
            let url = record
                .download_url
                .as_deref()
                .filter(|u| !u.is_empty())
                .ok_or(InstallError::MissingDownloadUrl {
                    mod_id: record.mod_id,
                    file_id: record.id,
                })?;
            if !seen_urls.insert(url.to_string()) {
                debug!("URL already scheduled, skipping duplicate: {}", url);
                continue;
            }

            let mod_name = match mod_names.get(&record.mod_id) {
                Some(name) => name.clone(),
                None => {
                    let name = self.catalog.get_mod(record.mod_id).await?.name;
                    mod_names.insert(record.mod_id, name.clone());
                    name
                }
            };
            units.push(DownloadUnit::from_record(record, &mod_name, url));
        }
        Ok(units)
    }

    /// Download and verify one unit
    ///
    /// If the destination file already exists, its on-disk bytes are hashed
    /// instead of downloading; a full match satisfies the unit with zero
    /// network I/O. A stale/corrupt existing file is removed and fetched
    /// fresh. A mismatch on freshly retrieved bytes is fatal; files
    /// verified earlier in the run stay in place.
    pub async fn install_unit(
        &self,
        unit: &DownloadUnit,
        dest: &Path,
        tracker: &mut ProgressTracker,
    ) -> Result<VerifiedFile> {
        let dest_path = dest.join(&unit.file_name);
        tracker.unit_started(&unit.mod_name, &unit.file_name);

        if dest_path.exists() {
            let results = verify::verify_file(&dest_path, &unit.expected).await?;
            if verify::all_matched(&results) {
                debug!(
                    "Existing file already verified, skipping download: {}",
                    dest_path.display()
                );
                tracker.unit_finished(&unit.file_name);
                return Ok(self.verified(unit, dest_path, results));
            }
            warn!(
                "Existing file failed verification, re-downloading: {}",
                dest_path.display()
            );
            fs::remove_file(&dest_path)
                .await
                .map_err(|e| InstallError::io(&dest_path, FileOperation::Delete, e))?;
        }

        self.download_to_file(&unit.url, &dest_path).await?;

        let results = verify::verify_file(&dest_path, &unit.expected).await?;
        if let Some(mismatch) = verify::first_mismatch(&results) {
            return Err(InstallError::IntegrityMismatch {
                mod_name: unit.mod_name.clone(),
                file_name: unit.file_name.clone(),
                algorithm: mismatch.algorithm,
                expected: mismatch.expected.clone(),
                computed: mismatch.computed.clone(),
            });
        }

        tracker.unit_finished(&unit.file_name);
        Ok(self.verified(unit, dest_path, results))
    }

    fn verified(
        &self,
        unit: &DownloadUnit,
        path: PathBuf,
        verification: Vec<VerificationResult>,
    ) -> VerifiedFile {
        VerifiedFile {
            mod_id: unit.mod_id,
            file_id: unit.file_id,
            mod_name: unit.mod_name.clone(),
            file_name: unit.file_name.clone(),
            path,
            verification,
        }
    }

    /// Stream a URL to disk via a `.part` staging file and atomic rename
    pub async fn download_to_file(&self, url: &str, dest_path: &Path) -> Result<u64> {
        debug!("Downloading {} to {}", url, dest_path.display());

        if let Some(parent) = dest_path.parent() {
            fs::create_dir_all(parent)
                .await
                .map_err(|e| InstallError::io(parent, FileOperation::CreateDir, e))?;
        }

        let response = self
            .http
            .get(url)
            .send()
            .await
            .and_then(|r| r.error_for_status())
            .map_err(|e| InstallError::DownloadTransport {
                url: url.to_string(),
                source: e,
            })?;

        let temp_path = dest_path.with_extension("part");
        let mut file = fs::File::create(&temp_path)
            .await
            .map_err(|e| InstallError::io(&temp_path, FileOperation::Create, e))?;

        let mut stream = response.bytes_stream();
        let mut written = 0u64;
        while let Some(chunk) = stream.next().await {
            let chunk = chunk.map_err(|e| InstallError::DownloadTransport {
                url: url.to_string(),
                source: e,
            })?;
            file.write_all(&chunk)
                .await
                .map_err(|e| InstallError::io(&temp_path, FileOperation::Write, e))?;
            written += chunk.len() as u64;
        }

        file.flush()
            .await
            .map_err(|e| InstallError::io(&temp_path, FileOperation::Write, e))?;
        drop(file);

        fs::rename(&temp_path, dest_path)
            .await
            .map_err(|e| InstallError::io(dest_path, FileOperation::Move, e))?;

        debug!("Downloaded {} bytes to {}", written, dest_path.display());
        Ok(written)
    }
}

/// Last path segment of a URL, or a generic name when extraction fails
pub(crate) fn filename_from_url(url: &str) -> String {
    url::Url::parse(url)
        .ok()
        .and_then(|parsed| {
            parsed
                .path_segments()
                .and_then(|mut segments| segments.next_back())
                .filter(|segment| !segment.is_empty())
                .map(|segment| segment.to_string())
        })
        .unwrap_or_else(|| "downloaded_file".to_string())
}
