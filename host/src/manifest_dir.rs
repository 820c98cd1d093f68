//! Manifest directory persistence: pin a kernel's interface on disk and
//! check a live kernel against it.
//!
//! # Directory layout
//!
//! ```text
//! <dir>/
//!   kernel_manifest.json          canonical JSON (KernelManifest::bytes)
//!   kernel_manifest_digest.txt    ASCII digest string ("sha256:...")
//! ```
//!
//! # Fail-closed semantics
//!
//! - Missing manifest or digest file → error
//! - Non-canonical or unparseable manifest → error
//! - Stored digest differs from the recomputed one → error
//! - Live kernel's manifest differs from the stored one → error

use std::path::Path;

use evalkern_kernel::function::contract::KernelFunction;
use evalkern_kernel::proof::hash::ContentHash;
use evalkern_kernel::proof::manifest::{KernelManifest, ManifestError};

/// Manifest filename.
pub const MANIFEST_FILENAME: &str = "kernel_manifest.json";
/// Digest filename.
pub const DIGEST_FILENAME: &str = "kernel_manifest_digest.txt";

/// Error writing a manifest directory.
#[derive(Debug)]
pub enum ManifestWriteError {
    /// I/O error during write.
    Io { detail: String },
}

impl std::fmt::Display for ManifestWriteError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Io { detail } => write!(f, "I/O error: {detail}"),
        }
    }
}

impl std::error::Error for ManifestWriteError {}

/// Error reading or verifying a manifest directory.
#[derive(Debug)]
pub enum ManifestVerifyError {
    /// A required file is missing or unreadable.
    MissingFile { filename: String },
    /// The digest file does not hold a `algorithm:hex` string.
    MalformedDigest { content: String },
    /// The manifest file failed to decode.
    Manifest(ManifestError),
    /// The digest file disagrees with the manifest bytes.
    DigestMismatch { stored: String, recomputed: String },
    /// The live kernel no longer matches the pinned manifest.
    InterfaceDrift { pinned: String, live: String },
}

impl std::fmt::Display for ManifestVerifyError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::MissingFile { filename } => write!(f, "missing manifest file: {filename}"),
            Self::MalformedDigest { content } => write!(f, "malformed digest: {content:?}"),
            Self::Manifest(e) => write!(f, "{e}"),
            Self::DigestMismatch { stored, recomputed } => write!(
                f,
                "digest mismatch: stored={stored}, recomputed={recomputed}"
            ),
            Self::InterfaceDrift { pinned, live } => write!(
                f,
                "kernel interface drifted: pinned={pinned}, live={live}"
            ),
        }
    }
}

impl std::error::Error for ManifestVerifyError {}

impl From<ManifestError> for ManifestVerifyError {
    fn from(e: ManifestError) -> Self {
        Self::Manifest(e)
    }
}

/// Write `manifest` into `dir`, creating the directory if needed.
///
/// # Errors
///
/// Returns [`ManifestWriteError::Io`] on any filesystem failure.
pub fn write_manifest(dir: &Path, manifest: &KernelManifest) -> Result<(), ManifestWriteError> {
    std::fs::create_dir_all(dir).map_err(|e| ManifestWriteError::Io {
        detail: format!("create_dir_all: {e}"),
    })?;
    write_atomic(&dir.join(MANIFEST_FILENAME), &manifest.bytes)?;
    write_atomic(&dir.join(DIGEST_FILENAME), manifest.digest.as_str().as_bytes())?;
    tracing::debug!(
        kernel = %manifest.kernel_name,
        digest = manifest.digest.as_str(),
        dir = %dir.display(),
        "manifest written"
    );
    Ok(())
}

/// Read the pinned manifest and check it against its digest file.
///
/// # Errors
///
/// Returns [`ManifestVerifyError`] for missing files, a malformed or
/// mismatching digest, or an undecodable manifest.
pub fn read_manifest(dir: &Path) -> Result<KernelManifest, ManifestVerifyError> {
    let bytes = read_required(dir, MANIFEST_FILENAME)?;
    let digest_bytes = read_required(dir, DIGEST_FILENAME)?;
    let digest_text = String::from_utf8_lossy(&digest_bytes).into_owned();
    let stored = ContentHash::parse(&digest_text).ok_or(ManifestVerifyError::MalformedDigest {
        content: digest_text,
    })?;

    let manifest = KernelManifest::from_bytes(&bytes)?;
    if manifest.digest != stored {
        return Err(ManifestVerifyError::DigestMismatch {
            stored: stored.as_str().to_string(),
            recomputed: manifest.digest.as_str().to_string(),
        });
    }
    Ok(manifest)
}

/// Verify that `kernel` still has the interface pinned in `dir`.
///
/// Returns the pinned manifest on success.
///
/// # Errors
///
/// Everything [`read_manifest`] reports, plus
/// [`ManifestVerifyError::InterfaceDrift`] when the live manifest differs.
pub fn verify_manifest(
    dir: &Path,
    kernel: &dyn KernelFunction,
) -> Result<KernelManifest, ManifestVerifyError> {
    let pinned = read_manifest(dir)?;
    let live = KernelManifest::from_kernel(kernel)?;
    if live.digest != pinned.digest {
        tracing::warn!(
            kernel = kernel.name(),
            pinned = pinned.digest.as_str(),
            live = live.digest.as_str(),
            "kernel interface drifted"
        );
        return Err(ManifestVerifyError::InterfaceDrift {
            pinned: pinned.digest.as_str().to_string(),
            live: live.digest.as_str().to_string(),
        });
    }
    Ok(pinned)
}

/// Temp file + rename, so a reader never sees a half-written file.
fn write_atomic(path: &Path, content: &[u8]) -> Result<(), ManifestWriteError> {
    let dir = path.parent().ok_or_else(|| ManifestWriteError::Io {
        detail: "no parent directory".into(),
    })?;
    let temp_path = dir.join(format!(
        ".tmp_{}",
        path.file_name().unwrap_or_default().to_string_lossy()
    ));
    std::fs::write(&temp_path, content).map_err(|e| ManifestWriteError::Io {
        detail: format!("write {}: {e}", temp_path.display()),
    })?;
    std::fs::rename(&temp_path, path).map_err(|e| ManifestWriteError::Io {
        detail: format!("rename {} → {}: {e}", temp_path.display(), path.display()),
    })
}

fn read_required(dir: &Path, filename: &str) -> Result<Vec<u8>, ManifestVerifyError> {
    std::fs::read(dir.join(filename)).map_err(|_| ManifestVerifyError::MissingFile {
        filename: filename.to_string(),
    })
}
