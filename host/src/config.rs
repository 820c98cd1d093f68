//! Host configuration.
//!
//! Plain data with `Option` overrides; unset fields fall back to the
//! `DEFAULT_*` constants. The host never reads environment or files.

/// Default bound on simultaneously open sessions per host.
pub const DEFAULT_MAX_SESSIONS: usize = 64;

/// Default for [`HostConfig::poison_scratch`].
pub const DEFAULT_POISON_SCRATCH: bool = false;

/// Default for [`HostConfig::check_outputs_finite`].
pub const DEFAULT_CHECK_OUTPUTS_FINITE: bool = false;

/// Configuration accepted by [`crate::host::KernelHost::new`].
#[derive(Debug, Clone, Default)]
pub struct HostConfig {
    /// Maximum simultaneously open sessions. `None` uses
    /// [`DEFAULT_MAX_SESSIONS`].
    pub max_sessions: Option<usize>,
    /// Fill scratch with sentinel garbage before every call, exposing
    /// kernels that read scratch they did not write. `None` uses
    /// [`DEFAULT_POISON_SCRATCH`].
    pub poison_scratch: Option<bool>,
    /// Log a warning when a requested output contains NaN or infinity.
    /// `None` uses [`DEFAULT_CHECK_OUTPUTS_FINITE`].
    pub check_outputs_finite: Option<bool>,
}

impl HostConfig {
    /// Effective session bound.
    #[must_use]
    pub fn max_sessions(&self) -> usize {
        self.max_sessions.unwrap_or(DEFAULT_MAX_SESSIONS)
    }

    /// Whether scratch is poisoned before each evaluation.
    #[must_use]
    pub fn poison_scratch(&self) -> bool {
        self.poison_scratch.unwrap_or(DEFAULT_POISON_SCRATCH)
    }

    /// Whether requested outputs are checked for non-finite values.
    #[must_use]
    pub fn check_outputs_finite(&self) -> bool {
        self.check_outputs_finite.unwrap_or(DEFAULT_CHECK_OUTPUTS_FINITE)
    }
}
