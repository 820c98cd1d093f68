//! Nullable argument and result buffers.
//!
//! The generated calling convention passes one pointer per slot and lets
//! either side be null. Here the two null meanings are explicit variants:
//!
//! - [`ArgBuf::Zero`]: the input slot is absent and every nonzero of its
//!   sparsity pattern reads as `0.0`.
//! - [`ResBuf::Discard`]: the caller does not want this output; writes into
//!   the slot are dropped. The kernel still computes everything other
//!   outputs depend on.
//!
//! Buffers hold nonzeros only, in the slot's CSC order. Sizing is a caller
//! precondition: indexing past `nnz` panics.

/// One input slot.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum ArgBuf<'a> {
    /// Absent input: every nonzero is `0.0`.
    #[default]
    Zero,
    /// Nonzeros of the input, in CSC order.
    Nonzeros(&'a [f64]),
}

impl<'a> ArgBuf<'a> {
    /// Map an optional slice onto the null-means-zero convention.
    #[must_use]
    pub const fn from_option(values: Option<&'a [f64]>) -> Self {
        match values {
            Some(v) => Self::Nonzeros(v),
            None => Self::Zero,
        }
    }

    /// Nonzero `k`, or `0.0` for an absent slot.
    #[must_use]
    pub fn get(&self, k: usize) -> f64 {
        match self {
            Self::Zero => 0.0,
            Self::Nonzeros(values) => values[k],
        }
    }
}

/// One output slot.
#[derive(Debug, PartialEq, Default)]
pub enum ResBuf<'a> {
    /// Output not requested: writes are dropped.
    #[default]
    Discard,
    /// Destination for the output's nonzeros, in CSC order.
    Nonzeros(&'a mut [f64]),
}

impl<'a> ResBuf<'a> {
    /// Map an optional slice onto the null-means-discard convention.
    #[must_use]
    pub fn from_option(values: Option<&'a mut [f64]>) -> Self {
        match values {
            Some(v) => Self::Nonzeros(v),
            None => Self::Discard,
        }
    }

    /// Store nonzero `k`; a no-op for a discarded slot.
    pub fn set(&mut self, k: usize, value: f64) {
        if let Self::Nonzeros(values) = self {
            values[k] = value;
        }
    }
}
