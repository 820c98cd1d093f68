//! A stateful kernel drops into the host with no host-side changes.
//!
//! Proves:
//! 1. `CachedSinOfSum` has the same manifest digest as `f`
//! 2. The same host code returns bit-identical results for both kernels
//! 3. Sessions map onto pool handles: checkout on open, release on drop
//! 4. Pool exhaustion surfaces as a typed host error
//! 5. Dropping the last host frees every handle
//! 6. At the C boundary, handle checks are the kernel's: a stateful kernel
//!    rejects a negative handle, `f` evaluates under it

use std::collections::BTreeMap;
use std::ffi::c_int;
use std::ptr;
use std::sync::Arc;

use evalkern_ffi::{eval_raw, f};
use evalkern_host::config::HostConfig;
use evalkern_host::error::HostError;
use evalkern_host::host::KernelHost;
use evalkern_kernel::function::contract::{KernelFunction, MemId, STATUS_FAILED, STATUS_OK};
use evalkern_kernel::function::memory::MemoryError;
use evalkern_kernel::function::sin_sum::SinOfSum;
use evalkern_kernel::layout::buffers::{ArgBuf, ResBuf};
use evalkern_kernel::proof::manifest::KernelManifest;
use lock_tests::cached_kernel::CachedSinOfSum;
use lock_tests::golden::{F_MANIFEST_DIGEST, SCENARIOS};

/// Host code written once, against the trait object only.
fn run_scenarios(kernel: Arc<dyn KernelFunction>) -> Vec<u64> {
    let host = KernelHost::new(kernel, HostConfig::default()).unwrap();
    let mut session = host.session().unwrap();
    let mut bits = Vec::new();
    for _ in 0..2 {
        for (x0, x1, _) in SCENARIOS {
            let out = session.call(&[Some(&[x0][..]), Some(&[x1][..])]).unwrap();
            bits.push(out[0][0].to_bits());
        }
    }
    bits
}

#[test]
fn same_interface_same_digest() {
    let cached = KernelManifest::from_kernel(&CachedSinOfSum::new(4)).unwrap();
    let plain = KernelManifest::from_kernel(&SinOfSum::new()).unwrap();
    assert_eq!(cached.digest, plain.digest);
    assert_eq!(cached.digest.as_str(), F_MANIFEST_DIGEST);
}

#[test]
fn host_results_are_identical() {
    let plain = run_scenarios(Arc::new(SinOfSum::new()));
    let cached = run_scenarios(Arc::new(CachedSinOfSum::new(4)));
    assert_eq!(plain, cached);
}

#[test]
fn sessions_check_out_and_release_handles() {
    let kernel = Arc::new(CachedSinOfSum::new(4));
    let host = KernelHost::new(kernel.clone(), HostConfig::default()).unwrap();
    assert_eq!(kernel.pool().refcount(), 1);

    let mut session = host.session().unwrap();
    let mem = session.mem();
    assert_eq!(kernel.pool().checked_out(), 1);

    session.call(&[Some(&[0.5][..]), Some(&[0.5][..])]).unwrap();
    session.call(&[Some(&[0.5][..]), Some(&[0.5][..])]).unwrap();
    session.call(&[Some(&[0.5][..]), None]).unwrap();
    assert_eq!(kernel.stats(mem).unwrap(), (1, 2));

    drop(session);
    assert_eq!(kernel.pool().checked_out(), 0);
    assert_eq!(kernel.pool().allocated(), 1);

    // The released handle, and its cache, is handed to the next session.
    let mut next = host.session().unwrap();
    assert_eq!(next.mem(), mem);
    let mut inputs = BTreeMap::new();
    inputs.insert("i0", &[0.5][..]);
    let out = next.call_named(&inputs).unwrap();
    assert_eq!(out["o0"][0].to_bits(), SinOfSum::reference(0.5, 0.0).to_bits());
    assert_eq!(kernel.stats(mem).unwrap(), (2, 2));
}

#[test]
fn pool_exhaustion_is_a_host_error() {
    let kernel = Arc::new(CachedSinOfSum::new(1));
    let host = KernelHost::new(kernel, HostConfig::default()).unwrap();
    let _held = host.session().unwrap();
    assert_eq!(
        host.session().unwrap_err(),
        HostError::Memory(MemoryError::Exhausted { capacity: 1 })
    );
    assert_eq!(host.open_sessions(), 1);
}

#[test]
fn last_host_drop_frees_every_handle() {
    let kernel = Arc::new(CachedSinOfSum::new(4));
    let first = KernelHost::new(kernel.clone(), HostConfig::default()).unwrap();
    let second = KernelHost::new(kernel.clone(), HostConfig::default()).unwrap();
    {
        let _a = first.session().unwrap();
        let _b = second.session().unwrap();
    }
    assert_eq!(kernel.pool().allocated(), 2);
    drop(first);
    assert_eq!(kernel.pool().allocated(), 2);
    drop(second);
    assert_eq!(kernel.pool().refcount(), 0);
    assert_eq!(kernel.pool().allocated(), 0);
}

#[test]
fn unchecked_handle_fails_evaluation() {
    let kernel = CachedSinOfSum::new(2);
    let mut y = [0.0];
    let result = kernel.eval(
        &[ArgBuf::Zero, ArgBuf::Zero],
        &mut [ResBuf::Nonzeros(&mut y)],
        &mut [],
        &mut [0.0; 2],
        MemId::new(0),
    );
    assert!(result.is_err());
}

#[test]
fn negative_handle_is_judged_by_the_kernel() {
    let x = [0.5];
    let arg = [x.as_ptr(), x.as_ptr()];
    let mut w = [0.0; 2];

    let cached = CachedSinOfSum::new(2);
    cached.incref();
    let mem = cached.checkout().unwrap();
    let mut y = [f64::NAN];
    let res = [y.as_mut_ptr()];
    let status = unsafe {
        eval_raw::<2, 1>(&cached, arg.as_ptr(), res.as_ptr(), ptr::null_mut(), w.as_mut_ptr(), -1)
    };
    assert_eq!(status, STATUS_FAILED);
    assert!(y[0].is_nan());

    let handle = c_int::try_from(mem.index()).unwrap();
    let status = unsafe {
        eval_raw::<2, 1>(&cached, arg.as_ptr(), res.as_ptr(), ptr::null_mut(), w.as_mut_ptr(), handle)
    };
    assert_eq!(status, STATUS_OK);
    assert_eq!(y[0].to_bits(), SinOfSum::reference(0.5, 0.5).to_bits());
    cached.release(mem);
    cached.decref();

    let mut z = [f64::NAN];
    let res = [z.as_mut_ptr()];
    let status = unsafe { f(arg.as_ptr(), res.as_ptr(), ptr::null_mut(), w.as_mut_ptr(), -1) };
    assert_eq!(status, STATUS_OK);
    assert_eq!(z[0].to_bits(), y[0].to_bits());
}
