//! `KernelRegistry`: the catalogue of kernels a host can load by name.
//!
//! Maps kernel names to shared kernel instances. The registry's canonical
//! form lists every kernel with its manifest digest, so one digest pins the
//! full interface of everything a host may call.

use std::collections::BTreeMap;
use std::sync::Arc;

use crate::function::contract::KernelFunction;
use crate::function::sin_sum::SinOfSum;
use crate::proof::canon::canonical_json_bytes;
use crate::proof::hash::{canonical_hash, ContentHash};
use crate::proof::hash_domain::HashDomain;
use crate::proof::manifest::{KernelManifest, ManifestError};

/// Schema tag of the registry's canonical form.
pub const REGISTRY_SCHEMA_VERSION: &str = "kernel_registry.v1";

/// Error type for registry construction and serialization.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RegistryError {
    /// Two kernels share a name.
    DuplicateName { name: String },
    /// A kernel's manifest could not be built.
    Manifest { name: String, detail: String },
    /// Canonical JSON serialization of the listing failed.
    CanonError { detail: String },
}

impl std::fmt::Display for RegistryError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::DuplicateName { name } => write!(f, "duplicate kernel name in registry: {name}"),
            Self::Manifest { name, detail } => {
                write!(f, "manifest for kernel {name} failed: {detail}")
            }
            Self::CanonError { detail } => {
                write!(f, "kernel registry canonicalization failed: {detail}")
            }
        }
    }
}

impl std::error::Error for RegistryError {}

/// Name → kernel map with deterministic (`BTreeMap`) iteration order.
#[derive(Clone, Default)]
pub struct KernelRegistry {
    kernels: BTreeMap<String, Arc<dyn KernelFunction>>,
}

impl std::fmt::Debug for KernelRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("KernelRegistry")
            .field("kernels", &self.kernels.keys().collect::<Vec<_>>())
            .finish()
    }
}

impl KernelRegistry {
    /// Build a registry from a list of kernels.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError::DuplicateName`] if two kernels share a name.
    pub fn new(kernels: Vec<Arc<dyn KernelFunction>>) -> Result<Self, RegistryError> {
        let mut map = BTreeMap::new();
        for kernel in kernels {
            let name = kernel.name().to_string();
            if map.insert(name.clone(), kernel).is_some() {
                return Err(RegistryError::DuplicateName { name });
            }
        }
        tracing::debug!(kernels = map.len(), "kernel registry built");
        Ok(Self { kernels: map })
    }

    /// Look up a kernel by name.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<Arc<dyn KernelFunction>> {
        self.kernels.get(name).cloned()
    }

    /// Whether `name` is registered.
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.kernels.contains_key(name)
    }

    /// Registered names in canonical order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.kernels.keys().map(String::as_str)
    }

    /// Number of registered kernels.
    #[must_use]
    pub fn len(&self) -> usize {
        self.kernels.len()
    }

    /// Whether the registry is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.kernels.is_empty()
    }

    /// Canonical JSON listing of every kernel and its manifest digest.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError::Manifest`] if a manifest cannot be built.
    pub fn canonical_bytes(&self) -> Result<Vec<u8>, RegistryError> {
        let mut entries = Vec::with_capacity(self.kernels.len());
        for (name, kernel) in &self.kernels {
            let manifest = KernelManifest::from_kernel(kernel.as_ref())
                .map_err(|e| manifest_error(name, &e))?;
            entries.push(serde_json::json!({
                "manifest_digest": manifest.digest.as_str(),
                "name": name,
            }));
        }
        let value = serde_json::json!({
            "kernels": entries,
            "schema_version": REGISTRY_SCHEMA_VERSION,
        });
        canonical_json_bytes(&value).map_err(|e| RegistryError::CanonError {
            detail: e.to_string(),
        })
    }

    /// Content hash of [`canonical_bytes`](Self::canonical_bytes).
    ///
    /// # Errors
    ///
    /// Propagates [`RegistryError`] from serialization.
    pub fn digest(&self) -> Result<ContentHash, RegistryError> {
        Ok(canonical_hash(HashDomain::KernelRegistry, &self.canonical_bytes()?))
    }
}

fn manifest_error(name: &str, e: &ManifestError) -> RegistryError {
    RegistryError::Manifest {
        name: name.to_string(),
        detail: e.to_string(),
    }
}

/// Registry of the kernels shipped with this crate: `f` ([`SinOfSum`]).
///
/// # Panics
///
/// Panics if the static registry construction fails (programming error).
#[must_use]
pub fn builtin_registry() -> KernelRegistry {
    let f: Arc<dyn KernelFunction> = Arc::new(SinOfSum::new());
    KernelRegistry::new(vec![f])
        .expect("builtin_registry: static invariant violated")
}
