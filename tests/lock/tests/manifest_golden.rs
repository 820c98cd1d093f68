//! Golden lock for the manifest and registry digests.
//!
//! Proves:
//! 1. `f`'s manifest digest equals the pinned value
//! 2. The digest is SHA-256 over domain prefix + canonical bytes, recomputable
//!    with nothing but `sha2` and `hex`
//! 3. The built-in registry digest equals the pinned value
//! 4. A manifest directory written by the host verifies against `f` and the
//!    digest file holds the pinned value

use evalkern_host::manifest_dir::{verify_manifest, write_manifest, DIGEST_FILENAME};
use evalkern_kernel::function::sin_sum::SinOfSum;
use evalkern_kernel::proof::hash_domain::HashDomain;
use evalkern_kernel::proof::manifest::KernelManifest;
use evalkern_kernel::registry::builtin_registry;
use lock_tests::golden::{BUILTIN_REGISTRY_DIGEST, F_MANIFEST_DIGEST};
use sha2::{Digest, Sha256};

#[test]
fn manifest_digest_is_pinned() {
    let manifest = KernelManifest::from_kernel(&SinOfSum::new()).unwrap();
    assert_eq!(
        manifest.digest.as_str(),
        F_MANIFEST_DIGEST,
        "f's interface changed; if intended, re-pin F_MANIFEST_DIGEST"
    );
}

#[test]
fn manifest_digest_recomputes_independently() {
    let manifest = KernelManifest::from_kernel(&SinOfSum::new()).unwrap();
    let mut hasher = Sha256::new();
    hasher.update(b"EVALKERN::KERNEL_MANIFEST::V1\0");
    hasher.update(&manifest.bytes);
    let independent = format!("sha256:{}", hex::encode(hasher.finalize()));
    assert_eq!(independent, manifest.digest.as_str());
    assert_eq!(
        HashDomain::KernelManifest.as_bytes(),
        b"EVALKERN::KERNEL_MANIFEST::V1\0"
    );
}

#[test]
fn manifest_bytes_are_canonical_json() {
    let manifest = KernelManifest::from_kernel(&SinOfSum::new()).unwrap();
    let value: serde_json::Value = serde_json::from_slice(&manifest.bytes).unwrap();
    assert_eq!(value["name"], "f");
    assert_eq!(value["schema_version"], "kernel_manifest.v1");
    assert_eq!(value["work"]["n_w"], 2);
    assert_eq!(value["inputs"][1]["name"], "i1");
    assert_eq!(value["outputs"][0]["sparsity"], serde_json::json!([1, 1, 0, 1, 0]));
    assert!(!manifest.bytes.contains(&b' '));
    assert!(!manifest.bytes.contains(&b'\n'));
}

#[test]
fn registry_digest_is_pinned() {
    let digest = builtin_registry().digest().unwrap();
    assert_eq!(digest.as_str(), BUILTIN_REGISTRY_DIGEST);
}

#[test]
fn manifest_directory_round_trip() {
    let dir = tempfile::tempdir().unwrap();
    let manifest = KernelManifest::from_kernel(&SinOfSum::new()).unwrap();
    write_manifest(dir.path(), &manifest).unwrap();
    let pinned = verify_manifest(dir.path(), &SinOfSum::new()).unwrap();
    assert_eq!(pinned, manifest);
    let on_disk = std::fs::read_to_string(dir.path().join(DIGEST_FILENAME)).unwrap();
    assert_eq!(on_disk, F_MANIFEST_DIGEST);
}
