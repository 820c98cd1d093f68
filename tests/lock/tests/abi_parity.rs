//! Parity between the three ways of calling `f`.
//!
//! Proves:
//! 1. C exports, the trait, and a host session return bit-identical results
//! 2. C introspection exports agree with the trait's introspection
//! 3. Null pointers at the C boundary mean zero input / discarded output

use std::ffi::CStr;
use std::ptr;
use std::sync::Arc;

use evalkern_ffi::{
    f, f_default_in, f_n_in, f_n_out, f_name_in, f_name_out, f_sparsity_in, f_sparsity_out,
    f_work, Int,
};
use evalkern_host::config::HostConfig;
use evalkern_host::host::KernelHost;
use evalkern_kernel::function::contract::{KernelFunction, MemId, STATUS_OK};
use evalkern_kernel::function::sin_sum::SinOfSum;
use evalkern_kernel::layout::buffers::{ArgBuf, ResBuf};
use proptest::prelude::*;

fn via_ffi(x0: Option<f64>, x1: Option<f64>) -> f64 {
    let a = x0.map(|v| [v]);
    let b = x1.map(|v| [v]);
    let arg = [
        a.as_ref().map_or(ptr::null(), |v| v.as_ptr()),
        b.as_ref().map_or(ptr::null(), |v| v.as_ptr()),
        ptr::null(),
        ptr::null(),
    ];
    let mut y = [f64::NAN];
    let res = [y.as_mut_ptr(), ptr::null_mut()];
    let mut iw: [Int; 0] = [];
    let mut w = [0.0; 2];
    let status = unsafe { f(arg.as_ptr(), res.as_ptr(), iw.as_mut_ptr(), w.as_mut_ptr(), 0) };
    assert_eq!(status, STATUS_OK);
    y[0]
}

fn via_trait(x0: Option<f64>, x1: Option<f64>) -> f64 {
    let a = x0.map(|v| [v]);
    let b = x1.map(|v| [v]);
    let mut y = [f64::NAN];
    SinOfSum::new()
        .eval(
            &[
                ArgBuf::from_option(a.as_ref().map(|v| &v[..])),
                ArgBuf::from_option(b.as_ref().map(|v| &v[..])),
            ],
            &mut [ResBuf::Nonzeros(&mut y)],
            &mut [],
            &mut [0.0; 2],
            MemId::STATELESS,
        )
        .unwrap();
    y[0]
}

fn via_host(host: &KernelHost, x0: Option<f64>, x1: Option<f64>) -> f64 {
    let a = x0.map(|v| [v]);
    let b = x1.map(|v| [v]);
    let out = host
        .call(&[a.as_ref().map(|v| &v[..]), b.as_ref().map(|v| &v[..])])
        .unwrap();
    out[0][0]
}

fn maybe() -> impl Strategy<Value = Option<f64>> {
    proptest::option::of(-100.0f64..100.0)
}

proptest! {
    #[test]
    fn prop_three_paths_agree(x0 in maybe(), x1 in maybe()) {
        let host = KernelHost::new(Arc::new(SinOfSum::new()), HostConfig::default()).unwrap();
        let ffi = via_ffi(x0, x1).to_bits();
        prop_assert_eq!(ffi, via_trait(x0, x1).to_bits());
        prop_assert_eq!(ffi, via_host(&host, x0, x1).to_bits());
    }
}

#[test]
fn null_pointers_mean_zero_and_discard() {
    assert_eq!(via_ffi(None, Some(0.3)).to_bits(), via_ffi(Some(0.0), Some(0.3)).to_bits());
    assert_eq!(via_ffi(None, None), 0.0);

    let x = [0.5];
    let arg = [x.as_ptr(), x.as_ptr()];
    let res = [ptr::null_mut::<f64>()];
    let mut w = [0.0; 2];
    let status = unsafe { f(arg.as_ptr(), res.as_ptr(), ptr::null_mut(), w.as_mut_ptr(), 0) };
    assert_eq!(status, STATUS_OK);
    assert_eq!(via_ffi(Some(0.5), Some(0.5)), via_trait(Some(0.5), Some(0.5)));
}

#[test]
fn introspection_exports_match_trait() {
    let kernel = SinOfSum::new();
    assert_eq!(usize::try_from(f_n_in()).unwrap(), kernel.n_in());
    assert_eq!(usize::try_from(f_n_out()).unwrap(), kernel.n_out());

    for i in 0..kernel.n_in() {
        let index = Int::try_from(i).unwrap();
        let name = unsafe { CStr::from_ptr(f_name_in(index)) };
        assert_eq!(name.to_str().unwrap(), kernel.name_in(i).unwrap());
        let compact = kernel.sparsity_in(i).unwrap().to_compact();
        let exported = unsafe { std::slice::from_raw_parts(f_sparsity_in(index), compact.len()) };
        assert_eq!(exported, compact.as_slice());
        assert_eq!(f_default_in(index).to_bits(), kernel.default_in(i).to_bits());
    }
    for i in 0..kernel.n_out() {
        let index = Int::try_from(i).unwrap();
        let name = unsafe { CStr::from_ptr(f_name_out(index)) };
        assert_eq!(name.to_str().unwrap(), kernel.name_out(i).unwrap());
        let compact = kernel.sparsity_out(i).unwrap().to_compact();
        let exported = unsafe { std::slice::from_raw_parts(f_sparsity_out(index), compact.len()) };
        assert_eq!(exported, compact.as_slice());
    }
    assert!(f_name_in(f_n_in()).is_null());
    assert!(f_name_out(f_n_out()).is_null());
    assert!(f_sparsity_in(f_n_in()).is_null());
    assert!(f_sparsity_out(f_n_out()).is_null());

    let mut sizes: [Int; 4] = [-1; 4];
    let [a, r, iw, w] = &mut sizes;
    assert_eq!(unsafe { f_work(a, r, iw, w) }, STATUS_OK);
    let work = kernel.work_sizes();
    let expected = [work.n_arg, work.n_res, work.n_iw, work.n_w].map(|n| Int::try_from(n).unwrap());
    assert_eq!(sizes, expected);
}
