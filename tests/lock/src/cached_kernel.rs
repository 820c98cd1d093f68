//! `CachedSinOfSum`: `f` with a per-handle result cache.
//!
//! Interface-identical to the built-in `f` (same name, slots, sparsity,
//! defaults and work sizes, hence the same manifest digest), but every
//! memory handle owns a [`SumCache`] in a [`MemoryPool`]. Evaluation with a
//! handle that was never checked out fails with the single failure status.

use evalkern_kernel::function::contract::{
    EvalFailure, EvalResult, KernelFunction, KernelSignature, MemId, SlotSpec,
};
use evalkern_kernel::function::memory::{MemoryError, MemoryPool};
use evalkern_kernel::function::sin_sum::{SIN_OF_SUM_NAME, SIN_OF_SUM_WORK};
use evalkern_kernel::layout::buffers::{ArgBuf, ResBuf};
use evalkern_kernel::layout::sparsity::SparsityPattern;

/// Last evaluation seen by one handle.
#[derive(Debug, Default)]
pub struct SumCache {
    last: Option<([u64; 2], f64)>,
    /// Calls answered from the cache.
    pub hits: u64,
    /// Calls that evaluated the expression.
    pub misses: u64,
}

/// Stateful twin of `SinOfSum`.
#[derive(Debug)]
pub struct CachedSinOfSum {
    signature: KernelSignature,
    pool: MemoryPool<SumCache>,
}

impl CachedSinOfSum {
    /// A kernel whose pool holds at most `capacity` handles.
    ///
    /// # Panics
    ///
    /// Panics if the static signature fails validation.
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        let signature = KernelSignature::new(
            SIN_OF_SUM_NAME,
            vec![
                SlotSpec::new("i0", SparsityPattern::scalar()),
                SlotSpec::new("i1", SparsityPattern::scalar()),
            ],
            vec![SlotSpec::new("o0", SparsityPattern::scalar())],
            SIN_OF_SUM_WORK,
        )
        .expect("CachedSinOfSum: static signature");
        Self {
            signature,
            pool: MemoryPool::new(capacity),
        }
    }

    /// The backing pool.
    #[must_use]
    pub fn pool(&self) -> &MemoryPool<SumCache> {
        &self.pool
    }

    /// `(hits, misses)` recorded by `mem`.
    ///
    /// # Errors
    ///
    /// [`MemoryError::UnknownHandle`] if `mem` is not allocated.
    pub fn stats(&self, mem: MemId) -> Result<(u64, u64), MemoryError> {
        self.pool.with_mem(mem, |cache| (cache.hits, cache.misses))
    }
}

impl KernelFunction for CachedSinOfSum {
    fn signature(&self) -> &KernelSignature {
        &self.signature
    }

    fn eval(
        &self,
        arg: &[ArgBuf<'_>],
        res: &mut [ResBuf<'_>],
        _iw: &mut [i64],
        w: &mut [f64],
        mem: MemId,
    ) -> EvalResult {
        let key = [arg[0].get(0).to_bits(), arg[1].get(0).to_bits()];
        let y = self
            .pool
            .with_mem(mem, |cache| match cache.last {
                Some((seen, y)) if seen == key => {
                    cache.hits += 1;
                    y
                }
                _ => {
                    w[0] = f64::from_bits(key[0]);
                    w[1] = f64::from_bits(key[1]);
                    w[0] += w[1];
                    w[1] = w[0].sin();
                    w[1] += w[0];
                    cache.last = Some((key, w[1]));
                    cache.misses += 1;
                    w[1]
                }
            })
            .map_err(|e| EvalFailure::new(e.to_string()))?;
        res[0].set(0, y);
        Ok(())
    }

    fn alloc_mem(&self) -> Result<MemId, MemoryError> {
        self.pool.alloc()
    }

    fn init_mem(&self, mem: MemId) -> Result<(), MemoryError> {
        self.pool.init(mem)
    }

    fn free_mem(&self, mem: MemId) {
        self.pool.free(mem);
    }

    fn checkout(&self) -> Result<MemId, MemoryError> {
        self.pool.checkout()
    }

    fn release(&self, mem: MemId) {
        // Releasing an unknown or idle handle is a no-op at this surface.
        let _ = self.pool.release(mem);
    }

    fn incref(&self) {
        self.pool.incref();
    }

    fn decref(&self) {
        self.pool.decref();
    }
}
