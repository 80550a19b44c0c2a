//! Complex sparse-matrix helpers on top of `sprs`.
//!
//! Assembly goes through `TriMat` triplets (duplicates are summed by
//! `TriMat::to_csr`); products, sums and transposes use the `sprs` operators
//! directly (`&a * &b`, `&a + &b`, `&a - &b`). Every matrix returned here is
//! CSR. Zero-row and zero-column shapes are valid everywhere: a network
//! without constrained branches flows through the same code as any other.

use num_complex::Complex64;
use sprs::{CsMat, TriMat};

/// Complex CSR matrix
pub type ComplexMat = CsMat<Complex64>;

/// Real CSR matrix
pub type RealMat = CsMat<f64>;

pub const J: Complex64 = Complex64::new(0.0, 1.0);

/// Build a complex CSR matrix from `(row, col, value)` triplets.
pub fn from_triplets(
    shape: (usize, usize),
    entries: impl IntoIterator<Item = (usize, usize, Complex64)>,
) -> ComplexMat {
    let mut tri = TriMat::new(shape);
    for (i, j, v) in entries {
        tri.add_triplet(i, j, v);
    }
    tri.to_csr()
}

/// Build a real CSR matrix from `(row, col, value)` triplets.
pub fn real_from_triplets(
    shape: (usize, usize),
    entries: impl IntoIterator<Item = (usize, usize, f64)>,
) -> RealMat {
    let mut tri = TriMat::new(shape);
    for (i, j, v) in entries {
        tri.add_triplet(i, j, v);
    }
    tri.to_csr()
}

pub fn zeros(rows: usize, cols: usize) -> ComplexMat {
    CsMat::zero((rows, cols))
}

pub fn real_zeros(rows: usize, cols: usize) -> RealMat {
    CsMat::zero((rows, cols))
}

/// Square diagonal matrix. Exact zeros are not stored.
pub fn diag(values: &[Complex64]) -> ComplexMat {
    let n = values.len();
    from_triplets(
        (n, n),
        values
            .iter()
            .enumerate()
            .filter(|(_, v)| v.re != 0.0 || v.im != 0.0)
            .map(|(i, &v)| (i, i, v)),
    )
}

/// Non-conjugating transpose, returned as CSR.
pub fn transpose(m: &ComplexMat) -> ComplexMat {
    m.transpose_view().to_csr()
}

pub fn conj(m: &ComplexMat) -> ComplexMat {
    m.map(|z| z.conj())
}

/// Conjugate transpose `mᴴ`.
pub fn adjoint(m: &ComplexMat) -> ComplexMat {
    m.transpose_view().map(|z| z.conj()).to_csr()
}

pub fn scale(m: &ComplexMat, s: Complex64) -> ComplexMat {
    m.map(|&z| z * s)
}

pub fn real_part(m: &ComplexMat) -> RealMat {
    m.map(|z| z.re)
}

/// Sparse matrix times dense vector.
pub fn mul_vec(a: &ComplexMat, x: &[Complex64]) -> Vec<Complex64> {
    debug_assert_eq!(a.cols(), x.len(), "matrix-vector dimensions");
    a.outer_iterator()
        .map(|row| row.iter().map(|(j, &v)| v * x[j]).sum())
        .collect()
}

/// `diag(d) · m`
pub fn scale_rows(d: &[Complex64], m: &ComplexMat) -> ComplexMat {
    debug_assert_eq!(d.len(), m.rows());
    &diag(d) * m
}

/// `m · diag(d)`
pub fn scale_cols(m: &ComplexMat, d: &[Complex64]) -> ComplexMat {
    debug_assert_eq!(d.len(), m.cols());
    m * &diag(d)
}

/// Place real blocks at `(row_offset, col_offset)` inside a `shape` matrix.
pub fn real_block(shape: (usize, usize), blocks: &[(usize, usize, &RealMat)]) -> RealMat {
    real_from_triplets(
        shape,
        blocks.iter().flat_map(|&(r0, c0, m)| {
            debug_assert!(r0 + m.rows() <= shape.0 && c0 + m.cols() <= shape.1);
            m.iter().map(move |(&v, (i, j))| (r0 + i, c0 + j, v))
        }),
    )
}

pub fn real_scale(m: &RealMat, s: f64) -> RealMat {
    m.map(|&v| v * s)
}

/// Dense row-major copy of a real matrix. Intended for tests and debugging.
pub fn to_dense(m: &RealMat) -> Vec<Vec<f64>> {
    let mut dense = vec![vec![0.0; m.cols()]; m.rows()];
    for (&v, (i, j)) in m.iter() {
        dense[i][j] += v;
    }
    dense
}

/// Largest absolute stored value; zero for an empty matrix.
pub fn max_abs(m: &RealMat) -> f64 {
    m.data().iter().fold(0.0, |acc, v| acc.max(v.abs()))
}
