//! C calling convention for the built-in kernel `f`.
//!
//! Exports the symbol set a generated-code consumer links against:
//!
//! ```text
//! int           f(const double** arg, double** res, long long* iw, double* w, int mem);
//! int           f_alloc_mem(void);        int  f_init_mem(int mem);
//! void          f_free_mem(int mem);      int  f_checkout(void);
//! void          f_release(int mem);       void f_incref(void);   void f_decref(void);
//! long long     f_n_in(void);             long long f_n_out(void);
//! double        f_default_in(long long i);
//! const char*   f_name_in(long long i);   const char* f_name_out(long long i);
//! const long long* f_sparsity_in(long long i);
//! const long long* f_sparsity_out(long long i);
//! int           f_work(long long* sz_arg, long long* sz_res, long long* sz_iw, long long* sz_w);
//! ```
//!
//! Every export forwards to [`SinOfSum`] through the
//! [`KernelFunction`] trait. Name strings and compact sparsity arrays live
//! in a process-wide table built on first use, so returned pointers stay
//! valid until the process exits.
//!
//! A panic during evaluation is caught here and reported as
//! [`STATUS_FAILED`]; it never unwinds into the caller.

#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(unsafe_op_in_unsafe_fn)]

use std::ffi::{c_char, c_int, CString};
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::ptr;
use std::slice;
use std::sync::OnceLock;

use evalkern_kernel::function::contract::{
    status_of, KernelFunction, MemId, SlotSpec, STATUS_FAILED, STATUS_OK,
};
use evalkern_kernel::function::sin_sum::{SinOfSum, SIN_OF_SUM_WORK};
use evalkern_kernel::layout::buffers::{ArgBuf, ResBuf};

/// Real scalar type of the calling convention.
pub type Real = f64;
/// Integer type of the calling convention (sizes, indices, sparsity).
pub type Int = i64;

const F_N_ARG: usize = SIN_OF_SUM_WORK.n_arg;
const F_N_RES: usize = SIN_OF_SUM_WORK.n_res;

struct ExportTable {
    kernel: SinOfSum,
    name_in: Vec<CString>,
    name_out: Vec<CString>,
    sparsity_in: Vec<Vec<Int>>,
    sparsity_out: Vec<Vec<Int>>,
}

impl ExportTable {
    fn build() -> Self {
        let kernel = SinOfSum::new();
        let signature = kernel.signature();
        let name_in = c_names(signature.inputs());
        let name_out = c_names(signature.outputs());
        let sparsity_in = compact(signature.inputs());
        let sparsity_out = compact(signature.outputs());
        Self {
            kernel,
            name_in,
            name_out,
            sparsity_in,
            sparsity_out,
        }
    }
}

fn c_names(slots: &[SlotSpec]) -> Vec<CString> {
    slots
        .iter()
        .map(|s| CString::new(s.name.as_str()).unwrap_or_default())
        .collect()
}

fn compact(slots: &[SlotSpec]) -> Vec<Vec<Int>> {
    slots.iter().map(|s| s.sparsity.to_compact()).collect()
}

fn table() -> &'static ExportTable {
    static TABLE: OnceLock<ExportTable> = OnceLock::new();
    TABLE.get_or_init(ExportTable::build)
}

fn slot_index(i: Int, len: usize) -> Option<usize> {
    usize::try_from(i).ok().filter(|&i| i < len)
}

fn to_int(n: usize) -> Int {
    Int::try_from(n).unwrap_or(Int::MAX)
}

fn to_handle(mem: MemId) -> c_int {
    c_int::try_from(mem.index()).unwrap_or(-1)
}

fn from_handle(mem: c_int) -> Option<MemId> {
    usize::try_from(mem).ok().map(MemId::new)
}

/// Handle passed to `eval` for a negative `mem`. No pool hands it out, so a
/// stateful kernel rejects it in its own `eval`; stateless kernels ignore it.
const UNMAPPED_HANDLE: MemId = MemId::new(usize::MAX);

/// Evaluate `kernel` from raw calling-convention pointers.
///
/// `N_ARG` / `N_RES` size the on-stack slot arrays and must be at least the
/// kernel's `n_in` / `n_out`; otherwise the call fails without evaluating.
/// Returns [`STATUS_OK`] or [`STATUS_FAILED`]; a panic inside the kernel is
/// reported as [`STATUS_FAILED`].
///
/// `mem` is not validated here. Handle checks belong to the kernel, so a
/// stateless kernel evaluates under any handle.
///
/// # Safety
///
/// - `arg` is null or points to at least `n_in` input pointers; each is null
///   or addresses `nnz_in(i)` readable reals.
/// - `res` is null or points to at least `n_out` output pointers; each is
///   null or addresses `nnz_out(i)` writable reals not overlapping any input.
/// - `iw` / `w` address at least `n_iw` / `n_w` writable elements (they may
///   be null when the corresponding size is zero).
pub unsafe fn eval_raw<const N_ARG: usize, const N_RES: usize>(
    kernel: &dyn KernelFunction,
    arg: *const *const Real,
    res: *const *mut Real,
    iw: *mut Int,
    w: *mut Real,
    mem: c_int,
) -> c_int {
    // SAFETY: forwarded caller contract.
    let outcome = catch_unwind(AssertUnwindSafe(|| unsafe {
        eval_unguarded::<N_ARG, N_RES>(kernel, arg, res, iw, w, mem)
    }));
    outcome.unwrap_or_else(|_| {
        tracing::error!(kernel = kernel.name(), "panic caught at C boundary");
        STATUS_FAILED
    })
}

unsafe fn eval_unguarded<const N_ARG: usize, const N_RES: usize>(
    kernel: &dyn KernelFunction,
    arg: *const *const Real,
    res: *const *mut Real,
    iw: *mut Int,
    w: *mut Real,
    mem: c_int,
) -> c_int {
    let (n_in, n_out) = (kernel.n_in(), kernel.n_out());
    let work = kernel.work_sizes();
    let mem = from_handle(mem).unwrap_or(UNMAPPED_HANDLE);
    if n_in > N_ARG || n_out > N_RES {
        return STATUS_FAILED;
    }
    if (work.n_iw > 0 && iw.is_null()) || (work.n_w > 0 && w.is_null()) {
        return STATUS_FAILED;
    }

    let mut args: [ArgBuf<'_>; N_ARG] = [ArgBuf::Zero; N_ARG];
    if !arg.is_null() {
        for (i, slot) in args.iter_mut().enumerate().take(n_in) {
            // SAFETY: `arg` holds at least `n_in` pointers.
            let p = unsafe { *arg.add(i) };
            if !p.is_null() {
                let nnz = kernel.nnz_in(i).unwrap_or(0);
                // SAFETY: a non-null input addresses `nnz` reals.
                *slot = ArgBuf::Nonzeros(unsafe { slice::from_raw_parts(p, nnz) });
            }
        }
    }

    let mut results: [ResBuf<'_>; N_RES] = std::array::from_fn(|_| ResBuf::Discard);
    if !res.is_null() {
        for (i, slot) in results.iter_mut().enumerate().take(n_out) {
            // SAFETY: `res` holds at least `n_out` pointers.
            let p = unsafe { *res.add(i) };
            if !p.is_null() {
                let nnz = kernel.nnz_out(i).unwrap_or(0);
                // SAFETY: a non-null output addresses `nnz` writable reals
                // that no other live slice covers.
                *slot = ResBuf::Nonzeros(unsafe { slice::from_raw_parts_mut(p, nnz) });
            }
        }
    }

    let mut no_iw: [Int; 0] = [];
    let mut no_w: [Real; 0] = [];
    let iw: &mut [Int] = if work.n_iw == 0 {
        &mut no_iw
    } else {
        // SAFETY: checked non-null above; caller sized it to `n_iw`.
        unsafe { slice::from_raw_parts_mut(iw, work.n_iw) }
    };
    let w: &mut [Real] = if work.n_w == 0 {
        &mut no_w
    } else {
        // SAFETY: checked non-null above; caller sized it to `n_w`.
        unsafe { slice::from_raw_parts_mut(w, work.n_w) }
    };

    let result = kernel.eval(&args, &mut results, iw, w, mem);
    if let Err(failure) = &result {
        tracing::warn!(kernel = kernel.name(), %failure, "evaluation failed");
    }
    status_of(&result)
}

/// Evaluate `f`: `res[0][0] = sin(arg[0][0] + arg[1][0]) + (arg[0][0] + arg[1][0])`.
///
/// A null input pointer reads as zero; a null output pointer is skipped.
///
/// # Safety
///
/// See [`eval_raw`]. `f` needs two input pointers, one output pointer, no
/// integer scratch and two reals of real scratch.
#[no_mangle]
pub unsafe extern "C" fn f(
    arg: *const *const Real,
    res: *const *mut Real,
    iw: *mut Int,
    w: *mut Real,
    mem: c_int,
) -> c_int {
    // SAFETY: forwarded caller contract.
    unsafe { eval_raw::<F_N_ARG, F_N_RES>(&table().kernel, arg, res, iw, w, mem) }
}

/// Allocate a memory object; returns its handle, or -1 on failure.
#[no_mangle]
pub extern "C" fn f_alloc_mem() -> c_int {
    table().kernel.alloc_mem().map_or(-1, to_handle)
}

/// Initialise a memory object; returns 0 on success.
#[no_mangle]
pub extern "C" fn f_init_mem(mem: c_int) -> c_int {
    match from_handle(mem).map(|m| table().kernel.init_mem(m)) {
        Some(Ok(())) => STATUS_OK,
        _ => STATUS_FAILED,
    }
}

/// Free a memory object. Negative handles are ignored.
#[no_mangle]
pub extern "C" fn f_free_mem(mem: c_int) {
    if let Some(mem) = from_handle(mem) {
        table().kernel.free_mem(mem);
    }
}

/// Check out a memory handle; returns -1 when none is available.
#[no_mangle]
pub extern "C" fn f_checkout() -> c_int {
    table().kernel.checkout().map_or(-1, to_handle)
}

/// Release a handle obtained from [`f_checkout`].
#[no_mangle]
pub extern "C" fn f_release(mem: c_int) {
    if let Some(mem) = from_handle(mem) {
        table().kernel.release(mem);
    }
}

/// Register one more user of `f`.
#[no_mangle]
pub extern "C" fn f_incref() {
    table().kernel.incref();
}

/// Drop one user of `f`.
#[no_mangle]
pub extern "C" fn f_decref() {
    table().kernel.decref();
}

/// Number of inputs.
#[no_mangle]
pub extern "C" fn f_n_in() -> Int {
    to_int(table().kernel.n_in())
}

/// Number of outputs.
#[no_mangle]
pub extern "C" fn f_n_out() -> Int {
    to_int(table().kernel.n_out())
}

/// Default value of input `i` (0 for every input, and for out-of-range `i`).
#[no_mangle]
pub extern "C" fn f_default_in(i: Int) -> Real {
    usize::try_from(i).map_or(0.0, |i| table().kernel.default_in(i))
}

/// Name of input `i`, or null when out of range.
#[no_mangle]
pub extern "C" fn f_name_in(i: Int) -> *const c_char {
    let names = &table().name_in;
    slot_index(i, names.len()).map_or(ptr::null(), |i| names[i].as_ptr())
}

/// Name of output `i`, or null when out of range.
#[no_mangle]
pub extern "C" fn f_name_out(i: Int) -> *const c_char {
    let names = &table().name_out;
    slot_index(i, names.len()).map_or(ptr::null(), |i| names[i].as_ptr())
}

/// Compact sparsity of input `i`, or null when out of range.
#[no_mangle]
pub extern "C" fn f_sparsity_in(i: Int) -> *const Int {
    let patterns = &table().sparsity_in;
    slot_index(i, patterns.len()).map_or(ptr::null(), |i| patterns[i].as_ptr())
}

/// Compact sparsity of output `i`, or null when out of range.
#[no_mangle]
pub extern "C" fn f_sparsity_out(i: Int) -> *const Int {
    let patterns = &table().sparsity_out;
    slot_index(i, patterns.len()).map_or(ptr::null(), |i| patterns[i].as_ptr())
}

/// Write the workspace sizes through the non-null pointers; returns 0.
///
/// # Safety
///
/// Each pointer is null or points to one writable `Int`.
#[no_mangle]
pub unsafe extern "C" fn f_work(
    sz_arg: *mut Int,
    sz_res: *mut Int,
    sz_iw: *mut Int,
    sz_w: *mut Int,
) -> c_int {
    let work = table().kernel.work_sizes();
    for (out, n) in [
        (sz_arg, work.n_arg),
        (sz_res, work.n_res),
        (sz_iw, work.n_iw),
        (sz_w, work.n_w),
    ] {
        if !out.is_null() {
            // SAFETY: non-null and writable per the caller contract.
            unsafe { *out = to_int(n) };
        }
    }
    STATUS_OK
}
