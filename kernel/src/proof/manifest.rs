//! `KernelManifest`: content-addressed record of a kernel's interface.
//!
//! The manifest captures everything a host may query without evaluating:
//! name, slot names, compact sparsities, input defaults, and workspace
//! sizes. Two kernel builds with the same manifest digest are
//! interchangeable from a host's point of view.
//!
//! # Format
//!
//! ```text
//! {
//!   "inputs":  [{"default_hex": "<f64 LE bytes>", "index": 0, "name": "i0", "sparsity": [1,1,0,1,0]}, ...],
//!   "name": "f",
//!   "outputs": [{"index": 0, "name": "o0", "sparsity": [1,1,0,1,0]}, ...],
//!   "schema_version": "kernel_manifest.v1",
//!   "work": {"n_arg": 4, "n_iw": 0, "n_res": 2, "n_w": 2}
//! }
//! ```
//!
//! Serialized with [`canonical_json_bytes`], hashed under
//! [`HashDomain::KernelManifest`].

use serde_json::{json, Value};

use crate::function::contract::{KernelFunction, SlotSpec};
use crate::proof::canon::{canonical_json_bytes, CanonError};
use crate::proof::hash::{canonical_hash, ContentHash};
use crate::proof::hash_domain::HashDomain;

/// Schema tag embedded in every manifest.
pub const MANIFEST_SCHEMA_VERSION: &str = "kernel_manifest.v1";

/// Error building or decoding a manifest.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ManifestError {
    /// Canonical JSON serialization failed.
    Canon(CanonError),
    /// Manifest bytes are not valid JSON.
    InvalidJson { detail: String },
    /// Manifest bytes are valid JSON but not in canonical form.
    NotCanonical,
    /// A required field is missing or has the wrong type.
    MissingField { field: &'static str },
    /// The schema tag is not [`MANIFEST_SCHEMA_VERSION`].
    UnsupportedSchema { found: String },
}

impl std::fmt::Display for ManifestError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Canon(e) => write!(f, "manifest canonicalization failed: {e}"),
            Self::InvalidJson { detail } => write!(f, "manifest is not valid JSON: {detail}"),
            Self::NotCanonical => write!(f, "manifest bytes are not canonical JSON"),
            Self::MissingField { field } => write!(f, "manifest field missing: {field}"),
            Self::UnsupportedSchema { found } => {
                write!(f, "unsupported manifest schema: {found}")
            }
        }
    }
}

impl std::error::Error for ManifestError {}

impl From<CanonError> for ManifestError {
    fn from(e: CanonError) -> Self {
        Self::Canon(e)
    }
}

/// Canonical manifest bytes plus their digest.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KernelManifest {
    /// Kernel name recorded in the manifest.
    pub kernel_name: String,
    /// Canonical JSON bytes.
    pub bytes: Vec<u8>,
    /// `canonical_hash(KernelManifest, bytes)`.
    pub digest: ContentHash,
}

impl KernelManifest {
    /// Describe a live kernel.
    ///
    /// # Errors
    ///
    /// Returns [`ManifestError::Canon`] if canonical serialization fails.
    pub fn from_kernel(kernel: &dyn KernelFunction) -> Result<Self, ManifestError> {
        let bytes = canonical_json_bytes(&manifest_json(kernel))?;
        Ok(Self {
            kernel_name: kernel.name().to_string(),
            digest: canonical_hash(HashDomain::KernelManifest, &bytes),
            bytes,
        })
    }

    /// Decode manifest bytes produced by [`KernelManifest::from_kernel`].
    ///
    /// The bytes must already be canonical; the digest is recomputed.
    ///
    /// # Errors
    ///
    /// Returns [`ManifestError`] for invalid JSON, non-canonical bytes, a
    /// missing name, or an unknown schema tag.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, ManifestError> {
        let value: Value = serde_json::from_slice(bytes).map_err(|e| ManifestError::InvalidJson {
            detail: e.to_string(),
        })?;
        if canonical_json_bytes(&value)? != bytes {
            return Err(ManifestError::NotCanonical);
        }
        let schema = value["schema_version"]
            .as_str()
            .ok_or(ManifestError::MissingField {
                field: "schema_version",
            })?;
        if schema != MANIFEST_SCHEMA_VERSION {
            return Err(ManifestError::UnsupportedSchema {
                found: schema.to_string(),
            });
        }
        let kernel_name = value["name"]
            .as_str()
            .ok_or(ManifestError::MissingField { field: "name" })?
            .to_string();
        Ok(Self {
            kernel_name,
            bytes: bytes.to_vec(),
            digest: canonical_hash(HashDomain::KernelManifest, bytes),
        })
    }
}

fn manifest_json(kernel: &dyn KernelFunction) -> Value {
    let signature = kernel.signature();
    let inputs: Vec<Value> = signature
        .inputs()
        .iter()
        .enumerate()
        .map(|(index, slot)| {
            let mut entry = slot_json(index, slot);
            entry["default_hex"] = json!(hex::encode(slot.default.to_le_bytes()));
            entry
        })
        .collect();
    let outputs: Vec<Value> = signature
        .outputs()
        .iter()
        .enumerate()
        .map(|(index, slot)| slot_json(index, slot))
        .collect();
    let work = signature.work();

    json!({
        "inputs": inputs,
        "name": signature.name(),
        "outputs": outputs,
        "schema_version": MANIFEST_SCHEMA_VERSION,
        "work": {
            "n_arg": work.n_arg as u64,
            "n_iw": work.n_iw as u64,
            "n_res": work.n_res as u64,
            "n_w": work.n_w as u64,
        },
    })
}

fn slot_json(index: usize, slot: &SlotSpec) -> Value {
    json!({
        "index": index as u64,
        "name": slot.name,
        "sparsity": slot.sparsity.to_compact(),
    })
}
