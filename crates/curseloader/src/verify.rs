//! Content-integrity verification against catalog-declared hashes

use sha1::{Digest, Sha1};
use std::path::Path;
use tokio::fs;
use tokio::io::AsyncReadExt;
use tracing::debug;

use crate::catalog::{FileHash, HashAlgo};
use crate::error::{FileOperation, InstallError, Result};

const HASH_BUFFER_SIZE: usize = 64 * 1024;

/// The hashes the catalog declared for one file, lowercased hex
#[derive(Debug, Clone, Default)]
pub struct ExpectedHashes {
    pub sha1: Option<String>,
    pub md5: Option<String>,
}

impl ExpectedHashes {
    pub fn from_declared(hashes: &[FileHash]) -> Self {
        let mut expected = Self::default();
        for hash in hashes {
            match hash.algo {
                HashAlgo::Sha1 => expected.sha1 = Some(hash.value.to_lowercase()),
                HashAlgo::Md5 => expected.md5 = Some(hash.value.to_lowercase()),
                HashAlgo::Other(n) => debug!("Ignoring undeclared hash algorithm {}", n),
            }
        }
        expected
    }

    /// True when the catalog declared nothing to verify against
    pub fn is_empty(&self) -> bool {
        self.sha1.is_none() && self.md5.is_none()
    }
}

/// Outcome of comparing one computed hash against its declared value
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VerificationResult {
    pub algorithm: HashAlgo,
    pub computed: String,
    pub expected: String,
    pub matched: bool,
}

/// True when every declared hash matched (the unit's overall outcome)
pub fn all_matched(results: &[VerificationResult]) -> bool {
    results.iter().all(|r| r.matched)
}

/// First mismatching result, if any
pub fn first_mismatch(results: &[VerificationResult]) -> Option<&VerificationResult> {
    results.iter().find(|r| !r.matched)
}

/// Hash a file's bytes with every declared algorithm and compare
///
/// Streams the file in 64 KiB chunks; only the hashers that are actually
/// declared get created. An empty `expected` produces an empty result set,
/// which counts as verified.
pub async fn verify_file(path: &Path, expected: &ExpectedHashes) -> Result<Vec<VerificationResult>> {
    if expected.is_empty() {
        return Ok(Vec::new());
    }

    let mut sha1_hasher = expected.sha1.as_ref().map(|_| Sha1::new());
    let mut md5_hasher = expected.md5.as_ref().map(|_| md5::Context::new());

    let mut file = fs::File::open(path)
        .await
        .map_err(|e| InstallError::io(path, FileOperation::Read, e))?;
    let mut buffer = vec![0u8; HASH_BUFFER_SIZE];

    loop {
        let bytes_read = file
            .read(&mut buffer)
            .await
            .map_err(|e| InstallError::io(path, FileOperation::Read, e))?;
        if bytes_read == 0 {
            break;
        }
        let chunk = &buffer[..bytes_read];
        if let Some(ref mut hasher) = sha1_hasher {
            hasher.update(chunk);
        }
        if let Some(ref mut hasher) = md5_hasher {
            hasher.consume(chunk);
        }
    }

    let mut results = Vec::new();
    if let (Some(expected_sha1), Some(hasher)) = (expected.sha1.as_ref(), sha1_hasher) {
        let computed = hex::encode(hasher.finalize());
        results.push(VerificationResult {
            algorithm: HashAlgo::Sha1,
            matched: &computed == expected_sha1,
            expected: expected_sha1.clone(),
            computed,
        });
    }
    if let (Some(expected_md5), Some(hasher)) = (expected.md5.as_ref(), md5_hasher) {
        let computed = format!("{:x}", hasher.compute());
        results.push(VerificationResult {
            algorithm: HashAlgo::Md5,
            matched: &computed == expected_md5,
            expected: expected_md5.clone(),
            computed,
        });
    }

    debug!(
        "Verified {}: {}",
        path.display(),
        if all_matched(&results) { "match" } else { "MISMATCH" }
    );
    Ok(results)
}
