//! `KernelHost` and `Session`: generic drivers for any [`KernelFunction`].
//!
//! # Lifecycle
//!
//! ```text
//! KernelHost::new   → kernel.incref()
//!   host.session()  → kernel.checkout(), allocate Workspace from work_sizes()
//!     session.evaluate(...) → kernel.eval(...) with the checked-out handle
//!   drop(session)   → kernel.release(mem)
//! drop(host)        → kernel.decref()
//! ```
//!
//! Stateless and stateful kernels go through the same path. A session is
//! single-threaded; open one session per thread for concurrent evaluation.

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use evalkern_kernel::function::contract::{status_of, KernelFunction, MemId};
use evalkern_kernel::layout::buffers::{ArgBuf, ResBuf};
use evalkern_kernel::layout::work::Workspace;
use evalkern_kernel::proof::manifest::KernelManifest;
use tracing::{debug, warn};

use crate::config::HostConfig;
use crate::error::{HostError, SlotSide};

/// One kernel plus the host-side bookkeeping for it.
pub struct KernelHost {
    kernel: Arc<dyn KernelFunction>,
    manifest: KernelManifest,
    config: HostConfig,
    open_sessions: AtomicUsize,
}

impl std::fmt::Debug for KernelHost {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("KernelHost")
            .field("kernel", &self.kernel.name())
            .field("manifest_digest", &self.manifest.digest.as_str())
            .field("config", &self.config)
            .field("open_sessions", &self.open_sessions())
            .finish()
    }
}

impl KernelHost {
    /// Attach to a kernel: build its manifest and register as an owner.
    ///
    /// # Errors
    ///
    /// Returns [`HostError::Manifest`] if the kernel's manifest cannot be
    /// serialized.
    pub fn new(kernel: Arc<dyn KernelFunction>, config: HostConfig) -> Result<Self, HostError> {
        let manifest = KernelManifest::from_kernel(kernel.as_ref())?;
        kernel.incref();
        debug!(
            kernel = kernel.name(),
            digest = manifest.digest.as_str(),
            "host attached"
        );
        Ok(Self {
            kernel,
            manifest,
            config,
            open_sessions: AtomicUsize::new(0),
        })
    }

    /// The hosted kernel.
    #[must_use]
    pub fn kernel(&self) -> &Arc<dyn KernelFunction> {
        &self.kernel
    }

    /// Manifest computed at attach time.
    #[must_use]
    pub fn manifest(&self) -> &KernelManifest {
        &self.manifest
    }

    /// Active configuration.
    #[must_use]
    pub fn config(&self) -> &HostConfig {
        &self.config
    }

    /// Number of sessions currently open.
    #[must_use]
    pub fn open_sessions(&self) -> usize {
        self.open_sessions.load(Ordering::SeqCst)
    }

    /// Open a session: check out a memory handle and allocate scratch.
    ///
    /// # Errors
    ///
    /// [`HostError::SessionLimit`] at `max_sessions`, or
    /// [`HostError::Memory`] if the kernel cannot hand out a handle.
    pub fn session(&self) -> Result<Session<'_>, HostError> {
        let max_sessions = self.config.max_sessions();
        self.open_sessions
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| {
                (n < max_sessions).then_some(n + 1)
            })
            .map_err(|_| HostError::SessionLimit { max_sessions })?;

        let mem = match self.kernel.checkout() {
            Ok(mem) => mem,
            Err(e) => {
                self.open_sessions.fetch_sub(1, Ordering::SeqCst);
                return Err(e.into());
            }
        };
        debug!(kernel = self.kernel.name(), %mem, "session opened");
        Ok(Session {
            host: self,
            mem,
            workspace: Workspace::new(&self.kernel.work_sizes()),
        })
    }

    /// One-shot [`Session::call`] in a temporary session.
    ///
    /// # Errors
    ///
    /// See [`KernelHost::session`] and [`Session::call`].
    pub fn call(&self, inputs: &[Option<&[f64]>]) -> Result<Vec<Vec<f64>>, HostError> {
        self.session()?.call(inputs)
    }
}

impl Drop for KernelHost {
    fn drop(&mut self) {
        self.kernel.decref();
        debug!(kernel = self.kernel.name(), "host detached");
    }
}

/// A checked-out evaluation context with its own scratch buffers.
#[derive(Debug)]
pub struct Session<'h> {
    host: &'h KernelHost,
    mem: MemId,
    workspace: Workspace,
}

impl Session<'_> {
    /// The memory handle this session holds.
    #[must_use]
    pub const fn mem(&self) -> MemId {
        self.mem
    }

    /// Evaluate once, in place.
    ///
    /// `inputs` and `outputs` carry exactly `n_in` / `n_out` slots. `None`
    /// means implicit zero for inputs and "not requested" for outputs.
    /// Present buffers must hold at least the slot's nonzero count.
    ///
    /// # Errors
    ///
    /// [`HostError::ArityMismatch`], [`HostError::BufferTooSmall`], or
    /// [`HostError::EvalFailed`] when the kernel reports failure.
    pub fn evaluate(
        &mut self,
        inputs: &[Option<&[f64]>],
        outputs: &mut [Option<&mut [f64]>],
    ) -> Result<(), HostError> {
        let kernel = self.host.kernel.as_ref();
        check_slots(kernel, SlotSide::Input, inputs.iter().map(|b| b.map(<[f64]>::len)))?;
        check_slots(
            kernel,
            SlotSide::Output,
            outputs.iter().map(|b| b.as_ref().map(|v| v.len())),
        )?;

        let work = kernel.work_sizes();
        let mut arg: Vec<ArgBuf<'_>> = inputs.iter().map(|b| ArgBuf::from_option(*b)).collect();
        arg.resize(work.n_arg.max(arg.len()), ArgBuf::Zero);
        let mut res: Vec<ResBuf<'_>> = outputs
            .iter_mut()
            .map(|b| ResBuf::from_option(b.as_deref_mut()))
            .collect();
        let n_res = work.n_res.max(res.len());
        res.resize_with(n_res, ResBuf::default);

        if self.host.config.poison_scratch() {
            self.workspace.poison();
        }
        let result = kernel.eval(
            &arg,
            &mut res,
            &mut self.workspace.iw,
            &mut self.workspace.w,
            self.mem,
        );
        drop(res);

        if let Err(failure) = &result {
            let status = status_of(&result);
            warn!(kernel = kernel.name(), status, %failure, "evaluation failed");
            return Err(HostError::EvalFailed {
                kernel: kernel.name().to_string(),
                status,
                detail: failure.detail.clone(),
            });
        }

        if self.host.config.check_outputs_finite() {
            for (slot, out) in outputs.iter().enumerate() {
                if out.as_ref().is_some_and(|v| v.iter().any(|x| !x.is_finite())) {
                    warn!(kernel = kernel.name(), slot, "non-finite output");
                }
            }
        }
        Ok(())
    }

    /// Evaluate with every output requested; returns each output's nonzeros.
    ///
    /// # Errors
    ///
    /// See [`Session::evaluate`].
    pub fn call(&mut self, inputs: &[Option<&[f64]>]) -> Result<Vec<Vec<f64>>, HostError> {
        let kernel = Arc::clone(&self.host.kernel);
        let mut results: Vec<Vec<f64>> = (0..kernel.n_out())
            .map(|i| vec![0.0; kernel.nnz_out(i).unwrap_or(0)])
            .collect();
        let mut outputs: Vec<Option<&mut [f64]>> =
            results.iter_mut().map(|v| Some(v.as_mut_slice())).collect();
        self.evaluate(inputs, &mut outputs)?;
        drop(outputs);
        Ok(results)
    }

    /// Name-keyed call. Inputs not named are filled with the kernel's
    /// `default_in` value; every output is returned under its name.
    ///
    /// # Errors
    ///
    /// [`HostError::UnknownSlotName`] for a name the kernel does not
    /// declare, otherwise see [`Session::evaluate`].
    pub fn call_named(
        &mut self,
        inputs: &BTreeMap<&str, &[f64]>,
    ) -> Result<BTreeMap<String, Vec<f64>>, HostError> {
        let kernel = Arc::clone(&self.host.kernel);
        let signature = kernel.signature();
        if let Some(unknown) = inputs.keys().find(|n| signature.index_in(n).is_none()) {
            return Err(HostError::UnknownSlotName {
                side: SlotSide::Input,
                name: (*unknown).to_string(),
            });
        }

        let defaults: Vec<Vec<f64>> = signature
            .inputs()
            .iter()
            .map(|slot| {
                if inputs.contains_key(slot.name.as_str()) {
                    Vec::new()
                } else {
                    vec![slot.default; slot.sparsity.nnz()]
                }
            })
            .collect();
        let args: Vec<Option<&[f64]>> = signature
            .inputs()
            .iter()
            .zip(&defaults)
            .map(|(slot, default)| {
                Some(
                    inputs
                        .get(slot.name.as_str())
                        .copied()
                        .unwrap_or(default.as_slice()),
                )
            })
            .collect();

        let results = self.call(&args)?;
        Ok(signature
            .outputs()
            .iter()
            .map(|slot| slot.name.clone())
            .zip(results)
            .collect())
    }
}

impl Drop for Session<'_> {
    fn drop(&mut self) {
        self.host.kernel.release(self.mem);
        self.host.open_sessions.fetch_sub(1, Ordering::SeqCst);
        debug!(kernel = self.host.kernel.name(), mem = %self.mem, "session closed");
    }
}

/// Check slot count and, for present buffers, length against `nnz`.
fn check_slots(
    kernel: &dyn KernelFunction,
    side: SlotSide,
    lens: impl ExactSizeIterator<Item = Option<usize>>,
) -> Result<(), HostError> {
    let expected = match side {
        SlotSide::Input => kernel.n_in(),
        SlotSide::Output => kernel.n_out(),
    };
    if lens.len() != expected {
        return Err(HostError::ArityMismatch {
            side,
            expected,
            actual: lens.len(),
        });
    }
    for (slot, len) in lens.enumerate() {
        let nnz = match side {
            SlotSide::Input => kernel.nnz_in(slot),
            SlotSide::Output => kernel.nnz_out(slot),
        }
        .unwrap_or(0);
        if let Some(actual) = len {
            if actual < nnz {
                return Err(HostError::BufferTooSmall {
                    side,
                    slot,
                    expected: nnz,
                    actual,
                });
            }
        }
    }
    Ok(())
}
