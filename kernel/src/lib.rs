//! evalkern kernel: the evaluation contract between generated numerical
//! kernels and their hosts.
//!
//! # API Surface
//!
//! - [`function::contract::KernelFunction`] -- the trait every kernel implements
//!   (evaluation, introspection, memory-handle lifecycle)
//! - [`function::sin_sum::SinOfSum`] -- the built-in kernel `f:(i0,i1)->(o0)`
//! - [`registry::builtin_registry`] -- name → kernel catalogue
//! - [`proof::manifest::KernelManifest`] -- content-addressed interface record
//!
//! # Module Dependency Direction
//!
//! `layout` ← `function` ← `proof` ← `registry`
//!
//! One-way only. No cycles. `layout` depends on nothing internal.

#![forbid(unsafe_code)]
#![deny(clippy::all)]
#![warn(clippy::pedantic)]

pub mod function;
pub mod layout;
pub mod proof;
pub mod registry;
