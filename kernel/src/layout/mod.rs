//! Layout module: sparsity patterns, nullable slot buffers, workspace sizing.
//!
//! This is the foundational layer. No other kernel module is imported here.

pub mod buffers;
pub mod sparsity;
pub mod work;
