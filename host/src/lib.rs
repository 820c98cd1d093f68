//! evalkern host: drives any kernel through the evaluation contract.
//!
//! The host owns everything the contract leaves to the caller: sizing and
//! allocating work buffers, validating buffer lengths against sparsity,
//! checking memory handles in and out, and holding a kernel reference for
//! its lifetime. It never looks at what a kernel computes.
//!
//! ```text
//! evalkern_kernel  ←  evalkern_host
//! (contract, f)       (sessions, named calls, manifest files)
//! ```

#![forbid(unsafe_code)]
#![deny(clippy::all)]
#![warn(clippy::pedantic)]

pub mod config;
pub mod error;
pub mod host;
pub mod manifest_dir;
