//! The kernel contract: what a host may assume about any evaluation kernel.
//!
//! A kernel is a stateless-by-default numerical function with:
//!
//! - a fixed [`KernelSignature`] (arity, slot names, sparsity, defaults,
//!   workspace sizes), queryable before any evaluation
//! - one evaluation entry point, [`KernelFunction::eval`], writing results
//!   in place through nullable slot buffers
//! - a memory-handle lifecycle (`alloc_mem` … `decref`) that stateless
//!   kernels inherit as no-ops and stateful kernels override, so hosts never
//!   branch on "does this kernel need memory"
//!
//! Evaluation reports exactly one failure class. Buffer sizing is a caller
//! precondition, not a runtime error.

use std::fmt;

use crate::function::memory::MemoryError;
use crate::layout::buffers::{ArgBuf, ResBuf};
use crate::layout::sparsity::SparsityPattern;
use crate::layout::work::WorkSizes;

/// Status code for a successful evaluation.
pub const STATUS_OK: i32 = 0;

/// Status code for a failed evaluation. The contract defines no other codes.
pub const STATUS_FAILED: i32 = 1;

/// Opaque memory handle identifying one checked-out evaluation context.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct MemId(usize);

impl MemId {
    /// The handle stateless kernels hand out from `alloc_mem`/`checkout`.
    pub const STATELESS: Self = Self(0);

    /// Wrap a raw handle index.
    #[must_use]
    pub const fn new(index: usize) -> Self {
        Self(index)
    }

    /// The raw handle index.
    #[must_use]
    pub const fn index(self) -> usize {
        self.0
    }
}

impl fmt::Display for MemId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "mem#{}", self.0)
    }
}

/// The single "evaluation failed" outcome.
///
/// Raised for domain errors or failing external callbacks in kernels that
/// have them. Carries a diagnostic only; there are no sub-kinds.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EvalFailure {
    /// Human-readable cause (diagnostic only).
    pub detail: String,
}

impl EvalFailure {
    /// Build a failure with a diagnostic message.
    #[must_use]
    pub fn new(detail: impl Into<String>) -> Self {
        Self {
            detail: detail.into(),
        }
    }
}

impl fmt::Display for EvalFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "evaluation failed: {}", self.detail)
    }
}

impl std::error::Error for EvalFailure {}

/// Result type for evaluation.
pub type EvalResult = Result<(), EvalFailure>;

/// Calling-convention status for an evaluation result.
#[must_use]
pub fn status_of(result: &EvalResult) -> i32 {
    match result {
        Ok(()) => STATUS_OK,
        Err(_) => STATUS_FAILED,
    }
}

/// Declaration of one positional input or output.
#[derive(Debug, Clone, PartialEq)]
pub struct SlotSpec {
    /// Symbolic name (diagnostics and name-keyed calls).
    pub name: String,
    /// Structural layout of the slot's buffer.
    pub sparsity: SparsityPattern,
    /// Value a host substitutes when the caller asks for an explicit default.
    /// Only meaningful for inputs.
    pub default: f64,
}

impl SlotSpec {
    /// A slot with default value `0.0`.
    #[must_use]
    pub fn new(name: impl Into<String>, sparsity: SparsityPattern) -> Self {
        Self {
            name: name.into(),
            sparsity,
            default: 0.0,
        }
    }

    /// Override the default value.
    #[must_use]
    pub fn with_default(mut self, default: f64) -> Self {
        self.default = default;
        self
    }
}

/// Typed failure for signature construction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SignatureError {
    /// Two inputs, or two outputs, share a name.
    DuplicateSlotName { name: String },
    /// `n_arg` is smaller than the number of inputs.
    ArgCapacityTooSmall { n_arg: usize, n_in: usize },
    /// `n_res` is smaller than the number of outputs.
    ResCapacityTooSmall { n_res: usize, n_out: usize },
}

impl fmt::Display for SignatureError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::DuplicateSlotName { name } => write!(f, "duplicate slot name: {name}"),
            Self::ArgCapacityTooSmall { n_arg, n_in } => {
                write!(f, "n_arg = {n_arg} cannot hold {n_in} inputs")
            }
            Self::ResCapacityTooSmall { n_res, n_out } => {
                write!(f, "n_res = {n_res} cannot hold {n_out} outputs")
            }
        }
    }
}

impl std::error::Error for SignatureError {}

/// Immutable per-kernel configuration, computed once at construction.
#[derive(Debug, Clone, PartialEq)]
pub struct KernelSignature {
    name: String,
    inputs: Vec<SlotSpec>,
    outputs: Vec<SlotSpec>,
    work: WorkSizes,
}

impl KernelSignature {
    /// Build and validate a signature.
    ///
    /// # Errors
    ///
    /// Returns [`SignatureError`] on duplicate slot names or when the
    /// pointer-array capacities cannot hold every slot.
    pub fn new(
        name: impl Into<String>,
        inputs: Vec<SlotSpec>,
        outputs: Vec<SlotSpec>,
        work: WorkSizes,
    ) -> Result<Self, SignatureError> {
        for slots in [&inputs, &outputs] {
            for (i, slot) in slots.iter().enumerate() {
                if slots[..i].iter().any(|other| other.name == slot.name) {
                    return Err(SignatureError::DuplicateSlotName {
                        name: slot.name.clone(),
                    });
                }
            }
        }
        if work.n_arg < inputs.len() {
            return Err(SignatureError::ArgCapacityTooSmall {
                n_arg: work.n_arg,
                n_in: inputs.len(),
            });
        }
        if work.n_res < outputs.len() {
            return Err(SignatureError::ResCapacityTooSmall {
                n_res: work.n_res,
                n_out: outputs.len(),
            });
        }
        Ok(Self {
            name: name.into(),
            inputs,
            outputs,
            work,
        })
    }

    /// Kernel name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Input slots, in positional order.
    #[must_use]
    pub fn inputs(&self) -> &[SlotSpec] {
        &self.inputs
    }

    /// Output slots, in positional order.
    #[must_use]
    pub fn outputs(&self) -> &[SlotSpec] {
        &self.outputs
    }

    /// Workspace sizes.
    #[must_use]
    pub const fn work(&self) -> WorkSizes {
        self.work
    }

    /// Position of the input called `name`.
    #[must_use]
    pub fn index_in(&self, name: &str) -> Option<usize> {
        self.inputs.iter().position(|s| s.name == name)
    }

    /// Position of the output called `name`.
    #[must_use]
    pub fn index_out(&self, name: &str) -> Option<usize> {
        self.outputs.iter().position(|s| s.name == name)
    }
}

/// Trait every evaluation kernel implements.
///
/// # Contract
///
/// - Everything reachable from [`signature`](Self::signature) is fixed for
///   the kernel's lifetime and independent of call history.
/// - `eval` reads `arg[i]` for `i < n_in()` and writes `res[i]` for
///   `i < n_out()`; `arg.len() >= n_in()` and `res.len() >= n_out()`, extra
///   slots are ignored. Present buffers hold at least `nnz` of their slot.
/// - `iw`/`w` are at least `work_sizes().n_iw` / `n_w` long, hold arbitrary
///   contents on entry, and carry nothing across calls.
/// - A discarded output never changes what is written to other outputs.
/// - Concurrent calls with disjoint buffers are allowed (`Send + Sync`).
pub trait KernelFunction: Send + Sync {
    /// The kernel's fixed signature.
    fn signature(&self) -> &KernelSignature;

    /// Evaluate once, writing every requested output in place.
    ///
    /// # Errors
    ///
    /// Returns [`EvalFailure`] if the kernel detects a runtime failure.
    /// Kernels without failure modes always return `Ok(())`.
    fn eval(
        &self,
        arg: &[ArgBuf<'_>],
        res: &mut [ResBuf<'_>],
        iw: &mut [i64],
        w: &mut [f64],
        mem: MemId,
    ) -> EvalResult;

    /// Kernel name.
    fn name(&self) -> &str {
        self.signature().name()
    }

    /// Number of inputs.
    fn n_in(&self) -> usize {
        self.signature().inputs().len()
    }

    /// Number of outputs.
    fn n_out(&self) -> usize {
        self.signature().outputs().len()
    }

    /// Name of input `i`, or `None` when out of range.
    fn name_in(&self, i: usize) -> Option<&str> {
        self.signature().inputs().get(i).map(|s| s.name.as_str())
    }

    /// Name of output `i`, or `None` when out of range.
    fn name_out(&self, i: usize) -> Option<&str> {
        self.signature().outputs().get(i).map(|s| s.name.as_str())
    }

    /// Sparsity of input `i`, or `None` when out of range.
    fn sparsity_in(&self, i: usize) -> Option<&SparsityPattern> {
        self.signature().inputs().get(i).map(|s| &s.sparsity)
    }

    /// Sparsity of output `i`, or `None` when out of range.
    fn sparsity_out(&self, i: usize) -> Option<&SparsityPattern> {
        self.signature().outputs().get(i).map(|s| &s.sparsity)
    }

    /// Default value of input `i`; `0.0` when out of range.
    fn default_in(&self, i: usize) -> f64 {
        self.signature().inputs().get(i).map_or(0.0, |s| s.default)
    }

    /// Buffer length of input `i`, or `None` when out of range.
    fn nnz_in(&self, i: usize) -> Option<usize> {
        self.sparsity_in(i).map(SparsityPattern::nnz)
    }

    /// Buffer length of output `i`, or `None` when out of range.
    fn nnz_out(&self, i: usize) -> Option<usize> {
        self.sparsity_out(i).map(SparsityPattern::nnz)
    }

    /// Minimum buffer sizes for one call.
    fn work_sizes(&self) -> WorkSizes {
        self.signature().work()
    }

    /// Allocate one memory object and return its handle.
    ///
    /// # Errors
    ///
    /// Stateful kernels return [`MemoryError`] when no memory can be
    /// allocated. The stateless default never fails.
    fn alloc_mem(&self) -> Result<MemId, MemoryError> {
        Ok(MemId::STATELESS)
    }

    /// Initialise a freshly allocated memory object.
    ///
    /// # Errors
    ///
    /// Stateful kernels return [`MemoryError`] for unknown handles or
    /// failed initialisation. The stateless default never fails.
    fn init_mem(&self, _mem: MemId) -> Result<(), MemoryError> {
        Ok(())
    }

    /// Free a memory object.
    fn free_mem(&self, _mem: MemId) {}

    /// Obtain a handle for one evaluation context, reusing released ones.
    ///
    /// # Errors
    ///
    /// Stateful kernels return [`MemoryError`] when every handle is in use.
    /// The stateless default never fails.
    fn checkout(&self) -> Result<MemId, MemoryError> {
        Ok(MemId::STATELESS)
    }

    /// Return a checked-out handle.
    fn release(&self, _mem: MemId) {}

    /// Register one more owner of the kernel.
    fn incref(&self) {}

    /// Drop one owner of the kernel.
    fn decref(&self) {}
}
