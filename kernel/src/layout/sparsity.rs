//! `SparsityPattern`: structural layout of one input or output slot.
//!
//! Patterns are stored in compressed-sparse-column (CSC) form:
//!
//! - `colind`: `[ncol + 1]` offsets into `row`, starting at 0
//! - `row`: `[nnz]` row indices, strictly increasing within each column
//!
//! A slot's numeric buffer holds exactly `nnz` reals, ordered column by
//! column. A dense scalar degenerates to `{nrow: 1, ncol: 1, nnz: 1}`.
//!
//! # Compact encoding
//!
//! Generated kernels publish patterns as one flat integer sequence:
//!
//! ```text
//! [nrow, ncol, colind[0], ..., colind[ncol], row[0], ..., row[nnz - 1]]
//! ```
//!
//! The scalar pattern is `[1, 1, 0, 1, 0]`. [`SparsityPattern::from_compact`]
//! also accepts the dense shorthand `[nrow, ncol, 1]`.

use std::fmt;

/// Typed failure for sparsity construction and decoding.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SparsityError {
    /// `colind` does not have `ncol + 1` entries.
    ColumnPointerLength { expected: usize, actual: usize },
    /// `colind[0]` is not 0.
    ColumnPointerStart { actual: usize },
    /// `colind[col + 1] < colind[col]`.
    ColumnPointerDecreasing { col: usize },
    /// `colind[ncol]` does not match the number of row indices.
    NonzeroCountMismatch { colind_end: usize, row_len: usize },
    /// A row index is `>= nrow`.
    RowOutOfRange { col: usize, row: usize, nrow: usize },
    /// Row indices within one column are not strictly increasing.
    RowOrder { col: usize },
    /// A compact encoding is shorter than its header declares.
    CompactTruncated { expected: usize, actual: usize },
    /// A compact encoding contains a negative entry.
    CompactNegative { index: usize, value: i64 },
    /// `nrow * ncol` does not fit in `usize`.
    DimensionOverflow { nrow: usize, ncol: usize },
}

impl fmt::Display for SparsityError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ColumnPointerLength { expected, actual } => {
                write!(f, "column pointer array has {actual} entries, expected {expected}")
            }
            Self::ColumnPointerStart { actual } => {
                write!(f, "column pointer array starts at {actual}, expected 0")
            }
            Self::ColumnPointerDecreasing { col } => {
                write!(f, "column pointers decrease after column {col}")
            }
            Self::NonzeroCountMismatch { colind_end, row_len } => write!(
                f,
                "last column pointer is {colind_end} but {row_len} row indices were given"
            ),
            Self::RowOutOfRange { col, row, nrow } => {
                write!(f, "row index {row} in column {col} is out of range for {nrow} rows")
            }
            Self::RowOrder { col } => {
                write!(f, "row indices in column {col} are not strictly increasing")
            }
            Self::CompactTruncated { expected, actual } => write!(
                f,
                "compact sparsity has {actual} entries, header requires {expected}"
            ),
            Self::CompactNegative { index, value } => {
                write!(f, "compact sparsity entry {index} is negative ({value})")
            }
            Self::DimensionOverflow { nrow, ncol } => {
                write!(f, "{nrow}x{ncol} has more entries than usize can count")
            }
        }
    }
}

impl std::error::Error for SparsityError {}

/// Compressed-sparse-column pattern of one slot.
///
/// Immutable once built; every constructor validates the CSC invariants.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SparsityPattern {
    nrow: usize,
    ncol: usize,
    colind: Vec<usize>,
    row: Vec<usize>,
}

impl SparsityPattern {
    /// Build a pattern from CSC arrays.
    ///
    /// # Errors
    ///
    /// Returns [`SparsityError`] if the arrays violate the CSC invariants.
    pub fn new(
        nrow: usize,
        ncol: usize,
        colind: Vec<usize>,
        row: Vec<usize>,
    ) -> Result<Self, SparsityError> {
        if ncol.checked_add(1) != Some(colind.len()) {
            return Err(SparsityError::ColumnPointerLength {
                expected: ncol.saturating_add(1),
                actual: colind.len(),
            });
        }
        if nrow.checked_mul(ncol).is_none() {
            return Err(SparsityError::DimensionOverflow { nrow, ncol });
        }
        if colind[0] != 0 {
            return Err(SparsityError::ColumnPointerStart { actual: colind[0] });
        }
        for col in 0..ncol {
            if colind[col + 1] < colind[col] {
                return Err(SparsityError::ColumnPointerDecreasing { col });
            }
        }
        if colind[ncol] != row.len() {
            return Err(SparsityError::NonzeroCountMismatch {
                colind_end: colind[ncol],
                row_len: row.len(),
            });
        }
        for col in 0..ncol {
            let rows = &row[colind[col]..colind[col + 1]];
            if let Some(&bad) = rows.iter().find(|&&r| r >= nrow) {
                return Err(SparsityError::RowOutOfRange { col, row: bad, nrow });
            }
            if rows.windows(2).any(|pair| pair[0] >= pair[1]) {
                return Err(SparsityError::RowOrder { col });
            }
        }
        Ok(Self {
            nrow,
            ncol,
            colind,
            row,
        })
    }

    /// The dense 1×1 pattern.
    #[must_use]
    pub fn scalar() -> Self {
        Self::dense(1, 1)
    }

    /// A fully populated `nrow × ncol` pattern.
    #[must_use]
    pub fn dense(nrow: usize, ncol: usize) -> Self {
        let colind = (0..=ncol).map(|c| c * nrow).collect();
        let row = (0..ncol).flat_map(|_| 0..nrow).collect();
        Self {
            nrow,
            ncol,
            colind,
            row,
        }
    }

    /// An `nrow × ncol` pattern with no structural nonzeros.
    #[must_use]
    pub fn empty(nrow: usize, ncol: usize) -> Self {
        Self {
            nrow,
            ncol,
            colind: vec![0; ncol + 1],
            row: Vec::new(),
        }
    }

    /// Decode the flat compact encoding (see module docs).
    ///
    /// # Errors
    ///
    /// Returns [`SparsityError`] if the sequence is truncated, contains
    /// negative entries, or decodes to an invalid CSC pattern.
    pub fn from_compact(compact: &[i64]) -> Result<Self, SparsityError> {
        if compact.len() < 2 {
            return Err(SparsityError::CompactTruncated {
                expected: 2,
                actual: compact.len(),
            });
        }
        let entries = compact
            .iter()
            .enumerate()
            .map(|(index, &value)| {
                usize::try_from(value).map_err(|_| SparsityError::CompactNegative { index, value })
            })
            .collect::<Result<Vec<usize>, _>>()?;

        let (nrow, ncol) = (entries[0], entries[1]);
        // Dense shorthand: [nrow, ncol, 1]. Unambiguous because a full
        // encoding always has colind[0] == 0 at this position.
        if entries.len() == 3 && entries[2] == 1 {
            return Ok(Self::dense(nrow, ncol));
        }

        let header = ncol.saturating_add(3);
        if entries.len() < header {
            return Err(SparsityError::CompactTruncated {
                expected: header,
                actual: entries.len(),
            });
        }
        let colind = entries[2..header].to_vec();
        let expected = header.saturating_add(colind[ncol]);
        if entries.len() != expected {
            return Err(SparsityError::CompactTruncated {
                expected,
                actual: entries.len(),
            });
        }
        let row = entries[header..].to_vec();
        Self::new(nrow, ncol, colind, row)
    }

    /// Encode as `[nrow, ncol, colind..., row...]`.
    ///
    /// # Panics
    ///
    /// Panics if a dimension or index exceeds `i64::MAX`, which no
    /// constructible pattern can reach on supported targets.
    #[must_use]
    pub fn to_compact(&self) -> Vec<i64> {
        let to_int = |v: usize| i64::try_from(v).expect("sparsity entry exceeds i64::MAX");
        let mut out = Vec::with_capacity(3 + self.ncol + self.row.len());
        out.push(to_int(self.nrow));
        out.push(to_int(self.ncol));
        out.extend(self.colind.iter().copied().map(to_int));
        out.extend(self.row.iter().copied().map(to_int));
        out
    }

    /// Number of rows.
    #[must_use]
    pub const fn nrow(&self) -> usize {
        self.nrow
    }

    /// Number of columns.
    #[must_use]
    pub const fn ncol(&self) -> usize {
        self.ncol
    }

    /// Number of structural nonzeros (the slot's buffer length).
    #[must_use]
    pub fn nnz(&self) -> usize {
        self.row.len()
    }

    /// `nrow * ncol`.
    #[must_use]
    pub const fn numel(&self) -> usize {
        self.nrow * self.ncol
    }

    /// Column pointers (`ncol + 1` entries).
    #[must_use]
    pub fn colind(&self) -> &[usize] {
        &self.colind
    }

    /// Row indices (`nnz` entries).
    #[must_use]
    pub fn row(&self) -> &[usize] {
        &self.row
    }

    /// Whether this is the dense 1×1 pattern.
    #[must_use]
    pub fn is_scalar(&self) -> bool {
        self.nrow == 1 && self.ncol == 1 && self.nnz() == 1
    }

    /// Whether every entry is structurally present.
    #[must_use]
    pub fn is_dense(&self) -> bool {
        self.nnz() == self.numel()
    }

    /// Whether the pattern stores no entries.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.row.is_empty()
    }

    /// Scatter nonzeros into a column-major dense buffer of `numel()` entries.
    ///
    /// Panics if `nonzeros.len() < nnz()`.
    #[must_use]
    pub fn to_dense(&self, nonzeros: &[f64]) -> Vec<f64> {
        let mut dense = vec![0.0; self.numel()];
        for col in 0..self.ncol {
            for k in self.colind[col]..self.colind[col + 1] {
                dense[col * self.nrow + self.row[k]] = nonzeros[k];
            }
        }
        dense
    }
}

impl fmt::Display for SparsityPattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}x{},{}nz", self.nrow, self.ncol, self.nnz())
    }
}
