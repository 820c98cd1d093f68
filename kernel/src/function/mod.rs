//! Function module: the kernel contract, memory handles, and built-in kernels.
//!
//! Depends on `layout`. Does not import from `proof`.

pub mod contract;
pub mod memory;
pub mod sin_sum;
