//! Pinned values. Changing any of these is an interface change.

/// Digest of `f`'s manifest under `EVALKERN::KERNEL_MANIFEST::V1`.
pub const F_MANIFEST_DIGEST: &str =
    "sha256:bf55d738b22ea08b36d510ef2daebf9711da015aca335e5a539a849673aa7392";

/// Digest of the built-in registry (`f` only) under `EVALKERN::KERNEL_REGISTRY::V1`.
pub const BUILTIN_REGISTRY_DIGEST: &str =
    "sha256:8ad06dc0162d0763840b62ae5e6d6b71889a150199af9289e0b053ae5859b8b0";

/// Compact sparsity of a dense scalar.
pub const SCALAR_COMPACT: [i64; 5] = [1, 1, 0, 1, 0];

/// `(n_arg, n_res, n_iw, n_w)` of `f`.
pub const F_WORK: (usize, usize, usize, usize) = (4, 2, 0, 2);

/// `(x0, x1, y)` triples with known results.
pub const SCENARIOS: [(f64, f64, f64); 3] = [
    (0.0, 0.0, 0.0),
    (1.0, -1.0, 0.0),
    (0.5, 0.5, 1.841_470_984_807_896_5),
];

/// Absolute tolerance for comparing against [`SCENARIOS`].
pub const SCENARIO_TOLERANCE: f64 = 1e-12;
