//! Proof module: canonical JSON, content hashing, kernel manifests.
//!
//! Depends on `layout` and `function`. Nothing in those layers imports it.

pub mod canon;
pub mod hash;
pub mod hash_domain;
pub mod manifest;
