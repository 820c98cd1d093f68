//! `SinOfSum`: the built-in kernel `f:(i0,i1)->(o0)`.
//!
//! ```text
//! o0 = sin(i0 + i1) + (i0 + i1)
//! ```
//!
//! All three slots are dense scalars. The body is straight-line arithmetic
//! over two real scratch cells:
//!
//! | Step | Operation            |
//! |------|----------------------|
//! | 0    | `w[0] = i0`          |
//! | 1    | `w[1] = i1`          |
//! | 2    | `w[0] = w[0] + w[1]` |
//! | 3    | `w[1] = sin(w[0])`   |
//! | 4    | `w[1] = w[1] + w[0]` |
//! | 5    | `o0 = w[1]`          |
//!
//! No domain restrictions exist, so evaluation never fails.

use crate::function::contract::{
    EvalResult, KernelFunction, KernelSignature, MemId, SlotSpec,
};
use crate::layout::buffers::{ArgBuf, ResBuf};
use crate::layout::sparsity::SparsityPattern;
use crate::layout::work::WorkSizes;

/// Name under which the kernel is registered and exported.
pub const SIN_OF_SUM_NAME: &str = "f";

/// Workspace requirement of the generated kernel: `(n_arg, n_res, n_iw, n_w)`.
pub const SIN_OF_SUM_WORK: WorkSizes = WorkSizes::new(4, 2, 0, 2);

/// The `f` kernel. Stateless; every lifecycle method is the default no-op.
#[derive(Debug, Clone)]
pub struct SinOfSum {
    signature: KernelSignature,
}

impl SinOfSum {
    /// Build the kernel and its signature.
    ///
    /// # Panics
    ///
    /// Panics if the static signature fails validation (programming error).
    #[must_use]
    pub fn new() -> Self {
        let signature = KernelSignature::new(
            SIN_OF_SUM_NAME,
            vec![
                SlotSpec::new("i0", SparsityPattern::scalar()),
                SlotSpec::new("i1", SparsityPattern::scalar()),
            ],
            vec![SlotSpec::new("o0", SparsityPattern::scalar())],
            SIN_OF_SUM_WORK,
        )
        .expect("SinOfSum: static signature invariant violated");
        Self { signature }
    }

    /// Reference value of the expression, outside the calling convention.
    #[must_use]
    pub fn reference(x0: f64, x1: f64) -> f64 {
        let s = x0 + x1;
        s.sin() + s
    }
}

impl Default for SinOfSum {
    fn default() -> Self {
        Self::new()
    }
}

impl KernelFunction for SinOfSum {
    fn signature(&self) -> &KernelSignature {
        &self.signature
    }

    fn eval(
        &self,
        arg: &[ArgBuf<'_>],
        res: &mut [ResBuf<'_>],
        _iw: &mut [i64],
        w: &mut [f64],
        _mem: MemId,
    ) -> EvalResult {
        w[0] = arg[0].get(0);
        w[1] = arg[1].get(0);
        w[0] += w[1];
        w[1] = w[0].sin();
        w[1] += w[0];
        res[0].set(0, w[1]);
        Ok(())
    }
}
