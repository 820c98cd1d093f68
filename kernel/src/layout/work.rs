//! Workspace sizing and owned scratch buffers.

/// Minimum buffer sizes a caller must supply for one evaluation.
///
/// - `n_arg`: capacity of the input-pointer array (at least `n_in`)
/// - `n_res`: capacity of the output-pointer array (at least `n_out`)
/// - `n_iw`: integer scratch elements
/// - `n_w`: real scratch elements
///
/// Fixed for the lifetime of a kernel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct WorkSizes {
    /// Input-pointer array capacity.
    pub n_arg: usize,
    /// Output-pointer array capacity.
    pub n_res: usize,
    /// Integer scratch length.
    pub n_iw: usize,
    /// Real scratch length.
    pub n_w: usize,
}

impl WorkSizes {
    /// Build from the four sizes in calling-convention order.
    #[must_use]
    pub const fn new(n_arg: usize, n_res: usize, n_iw: usize, n_w: usize) -> Self {
        Self {
            n_arg,
            n_res,
            n_iw,
            n_w,
        }
    }

    /// The sizes as an `(n_arg, n_res, n_iw, n_w)` tuple.
    #[must_use]
    pub const fn as_tuple(&self) -> (usize, usize, usize, usize) {
        (self.n_arg, self.n_res, self.n_iw, self.n_w)
    }
}

/// Caller-owned scratch storage, reused across calls.
///
/// Kernels may not assume anything about its contents on entry.
#[derive(Debug, Clone, PartialEq)]
pub struct Workspace {
    /// Integer scratch (`n_iw` entries).
    pub iw: Vec<i64>,
    /// Real scratch (`n_w` entries).
    pub w: Vec<f64>,
}

impl Workspace {
    /// Zero-initialised scratch sized from `sizes`.
    #[must_use]
    pub fn new(sizes: &WorkSizes) -> Self {
        Self {
            iw: vec![0; sizes.n_iw],
            w: vec![0.0; sizes.n_w],
        }
    }

    /// Whether this workspace is large enough for `sizes`.
    #[must_use]
    pub fn fits(&self, sizes: &WorkSizes) -> bool {
        self.iw.len() >= sizes.n_iw && self.w.len() >= sizes.n_w
    }

    /// Overwrite all scratch with sentinel garbage (`i64::MIN`, NaN).
    ///
    /// Hosts use this to expose kernels that read scratch before writing it.
    pub fn poison(&mut self) {
        self.iw.fill(i64::MIN);
        self.w.fill(f64::NAN);
    }
}
