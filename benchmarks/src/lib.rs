//! Shared helpers for evalkern benchmark suites.

use std::sync::Arc;

use evalkern_host::config::HostConfig;
use evalkern_host::host::KernelHost;
use evalkern_kernel::function::contract::KernelFunction;

/// `n` deterministic `(x0, x1)` pairs spread over `[-4, 4)`.
#[must_use]
pub fn input_grid(n: u32) -> Vec<(f64, f64)> {
    (0..n)
        .map(|i| {
            let t = f64::from(i) / f64::from(n.max(1));
            (8.0 * t - 4.0, 4.0 - 8.0 * t * t)
        })
        .collect()
}

/// Host over `kernel` with the given scratch policy.
///
/// # Panics
///
/// Panics if the kernel's manifest cannot be built. Benchmark setup failures
/// are fatal.
#[must_use]
pub fn host_for(kernel: Arc<dyn KernelFunction>, poison_scratch: bool) -> KernelHost {
    let config = HostConfig {
        poison_scratch: Some(poison_scratch),
        ..HostConfig::default()
    };
    KernelHost::new(kernel, config).expect("host setup")
}
