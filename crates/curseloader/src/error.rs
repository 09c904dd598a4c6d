//! Error types for the installation pipeline

use std::path::PathBuf;
use thiserror::Error;

use crate::catalog::HashAlgo;

/// Errors that abort an install run
///
/// Every variant here is fatal to the run: the coordinator transitions to
/// `Failed` and surfaces the offending mod/file identity. The one non-fatal
/// condition in the pipeline, a bundle manifest entry whose download URL
/// cannot be resolved, is not an error at all; it travels through
/// [`InstallWarning`] instead.
#[derive(Error, Debug)]
pub enum InstallError {
    /// The catalog could not return required mod/file metadata
    #[error("catalog request failed while {context}")]
    MetadataFetch {
        context: String,
        #[source]
        source: reqwest::Error,
    },

    /// Network failure while retrieving a download URL
    #[error("download of '{url}' failed")]
    DownloadTransport {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    /// Computed content hash disagrees with the catalog-declared hash
    #[error(
        "integrity mismatch for '{file_name}' (mod '{mod_name}'): \
         {algorithm} expected {expected}, computed {computed}"
    )]
    IntegrityMismatch {
        mod_name: String,
        file_name: String,
        algorithm: HashAlgo,
        expected: String,
        computed: String,
    },

    /// The catalog holds no download URL for a required file
    #[error("no download url available for file {file_id} of mod {mod_id}")]
    MissingDownloadUrl { mod_id: i64, file_id: i64 },

    /// A bundle archive could not be unpacked or its manifest parsed
    #[error("failed to install bundle '{}': {reason}", archive.display())]
    Extraction { archive: PathBuf, reason: String },

    /// File system I/O failure with file context
    #[error("file operation failed while {operation} '{}'", path.display())]
    Filesystem {
        path: PathBuf,
        operation: FileOperation,
        #[source]
        source: std::io::Error,
    },
}

/// Types of file operations for error context
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileOperation {
    Read,
    Write,
    Create,
    Delete,
    Move,
    Metadata,
    CreateDir,
}

impl std::fmt::Display for FileOperation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FileOperation::Read => write!(f, "reading"),
            FileOperation::Write => write!(f, "writing"),
            FileOperation::Create => write!(f, "creating"),
            FileOperation::Delete => write!(f, "deleting"),
            FileOperation::Move => write!(f, "moving"),
            FileOperation::Metadata => write!(f, "reading metadata"),
            FileOperation::CreateDir => write!(f, "creating directory"),
        }
    }
}

pub type Result<T> = std::result::Result<T, InstallError>;

impl InstallError {
    /// Attach path and operation context to an I/O error
    pub(crate) fn io(path: impl Into<PathBuf>, operation: FileOperation, source: std::io::Error) -> Self {
        InstallError::Filesystem {
            path: path.into(),
            operation,
            source,
        }
    }

    /// Error category for logging and assertions
    pub fn category(&self) -> &'static str {
        match self {
            InstallError::MetadataFetch { .. } => "metadata_fetch",
            InstallError::DownloadTransport { .. } => "download_transport",
            InstallError::IntegrityMismatch { .. } => "integrity_mismatch",
            InstallError::MissingDownloadUrl { .. } => "missing_download_url",
            InstallError::Extraction { .. } => "extraction",
            InstallError::Filesystem { .. } => "file_system",
        }
    }
}

/// Non-fatal conditions accumulated during a run and surfaced alongside an
/// otherwise-successful report
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InstallWarning {
    /// A bundle manifest entry's download URL could not be resolved; the
    /// entry was skipped and the rest of the bundle continued
    ManifestEntrySkipped {
        project_id: i64,
        file_id: i64,
        reason: String,
    },
    /// An `overrides` entry collided with a pre-existing file; the existing
    /// file was kept
    OverrideConflict { path: PathBuf },
}

impl std::fmt::Display for InstallWarning {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            InstallWarning::ManifestEntrySkipped {
                project_id,
                file_id,
                reason,
            } => write!(
                f,
                "skipped manifest entry (project {project_id}, file {file_id}): {reason}"
            ),
            InstallWarning::OverrideConflict { path } => write!(
                f,
                "kept existing file instead of bundle override: '{}'",
                path.display()
            ),
        }
    }
}
