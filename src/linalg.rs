//! Thin wrappers around the local dense backend (`rlst`): thin SVD, matrix
//! multiply, diagonal construction, Frobenius norm, column norms.
//! Centralising them here keeps `local.rs`/`reconstruct.rs` free of `rlst`
//! plumbing, the same way a pseudo-inverse helper lives in its own
//! `linalg` module rather than inlined at every call site.

use rlst::prelude::*;

use crate::types::{RMat, RealScalar};

/// Economy (thin) SVD `M = U · diag(sigma) · V^T`, returning `U` and the
/// singular values in descending order. `V^T` itself is never needed by
/// this crate (only column norms of `A^T U` are, in `reconstruct.rs`), so
/// it is discarded here rather than threaded through every caller.
pub fn thin_svd<T: RealScalar>(m: &RMat<T>) -> (RMat<T>, Vec<T>)
where
    RMat<T>: MatrixSvd<Item = T>,
{
    let shape = m.shape();
    let (rows, cols) = (shape[0], shape[1]);
    let k = rows.min(cols);

    let mut u = rlst_dynamic_array2!(T, [rows, k]);
    let mut sigma = vec![T::zero(); k];
    let mut vt = rlst_dynamic_array2!(T, [k, cols]);

    m.view()
        .into_svd_alloc(u.view_mut(), sigma.as_mut_slice(), vt.view_mut(), SvdMode::Reduced)
        .expect("local SVD failed to converge");

    (u, sigma)
}

/// `A · B`, dense-dense, resized to fit.
pub fn matmul<T: RealScalar>(a: &RMat<T>, b: &RMat<T>) -> RMat<T> {
    empty_array::<T, 2>().simple_mult_into_resize(a.view(), b.view())
}

/// Scale the columns of `m` in place by `diag[j]`, i.e. `m := m * diag(d)`.
pub fn scale_columns_inplace<T: RealScalar>(m: &mut RMat<T>, d: &[T]) {
    for (mut col, &dj) in m.col_iter_mut().zip(d.iter()) {
        col.scale_inplace(dj);
    }
}

/// Frobenius norm of a dense local matrix: `sqrt(sum of squared entries)`.
pub fn fro_norm<T: RealScalar>(m: &RMat<T>) -> T {
    m.view().norm_2()
}

/// Squared Frobenius norm of the tail `sigma[from..]`.
pub fn tail_norm_sq<T: RealScalar>(sigma: &[T], from: usize) -> T {
    sigma[from.min(sigma.len())..]
        .iter()
        .map(|&s| s * s)
        .fold(T::zero(), |a, b| a + b)
}

/// 2-norm of every column of `m`.
pub fn col_norms<T: RealScalar>(m: &RMat<T>) -> Vec<T> {
    m.col_iter().map(|c| c.norm_2()).collect()
}

/// Column-wise concatenation `[a_0 | a_1 | ... ]`, in the given order, all
/// sharing the same row count.
pub fn hstack<T: RealScalar>(blocks: &[RMat<T>]) -> RMat<T> {
    let rows = blocks[0].shape()[0];
    let total_cols: usize = blocks.iter().map(|b| b.shape()[1]).sum();
    let mut out = rlst_dynamic_array2!(T, [rows, total_cols]);

    let mut col_iter = out.col_iter_mut();
    for block in blocks {
        for src_col in block.col_iter() {
            let mut dst_col = col_iter.next().expect("hstack: column count mismatch");
            dst_col.fill_from(src_col.view());
        }
    }
    out
}

/// Zero matrix of the given shape.
pub fn zeros<T: RealScalar>(rows: usize, cols: usize) -> RMat<T> {
    rlst_dynamic_array2!(T, [rows, cols])
}

/// Owned, independent copy of `m`.
pub fn clone_mat<T: RealScalar>(m: &RMat<T>) -> RMat<T> {
    let shape = m.shape();
    let mut out = rlst_dynamic_array2!(T, [shape[0], shape[1]]);
    out.data_mut().copy_from_slice(m.data());
    out
}

/// Dense `k x k` diagonal matrix built from `values`.
pub fn diag<T: RealScalar>(values: &[T]) -> RMat<T> {
    let k = values.len();
    let mut out = rlst_dynamic_array2!(T, [k, k]);
    for (i, &v) in values.iter().enumerate() {
        *out.get_mut([i, i]).unwrap() = v;
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn from_rows(rows: &[[f64; 2]]) -> RMat<f64> {
        let mut m = rlst_dynamic_array2!(f64, [rows.len(), 2]);
        for (i, row) in rows.iter().enumerate() {
            for (j, &v) in row.iter().enumerate() {
                *m.get_mut([i, j]).unwrap() = v;
            }
        }
        m
    }

    #[test]
    fn hstack_concatenates_columns_in_order() {
        let a = from_rows(&[[1.0, 2.0], [3.0, 4.0]]);
        let b = from_rows(&[[5.0, 6.0], [7.0, 8.0]]);
        let out = hstack(&[a, b]);
        assert_eq!(out.shape(), [2, 4]);
        assert_eq!(out.data(), &[1.0, 3.0, 2.0, 4.0, 5.0, 7.0, 6.0, 8.0]);
    }

    #[test]
    fn col_norms_matches_euclidean_length() {
        let m = from_rows(&[[3.0, 0.0], [4.0, 0.0]]);
        let norms = col_norms(&m);
        assert!((norms[0] - 5.0).abs() < 1e-12);
        assert!((norms[1] - 0.0).abs() < 1e-12);
    }

    #[test]
    fn tail_norm_sq_is_zero_past_the_end() {
        let sigma = vec![3.0, 4.0];
        assert!((tail_norm_sq(&sigma, 0) - 25.0).abs() < 1e-12);
        assert!((tail_norm_sq(&sigma, 1) - 16.0).abs() < 1e-12);
        assert_eq!(tail_norm_sq(&sigma, 2), 0.0);
        assert_eq!(tail_norm_sq(&sigma, 5), 0.0);
    }

    #[test]
    fn scale_columns_inplace_scales_each_column() {
        let mut m = from_rows(&[[1.0, 1.0], [1.0, 1.0]]);
        scale_columns_inplace(&mut m, &[2.0, 0.5]);
        assert_eq!(m.data(), &[2.0, 2.0, 0.5, 0.5]);
    }

    #[test]
    fn diag_places_values_on_the_diagonal() {
        let d = diag(&[1.0, 2.0, 3.0]);
        assert_eq!(d.shape(), [3, 3]);
        assert_eq!(*d.get([1, 1]).unwrap(), 2.0);
        assert_eq!(*d.get([0, 1]).unwrap(), 0.0);
    }

    #[test]
    fn clone_mat_is_independent_of_the_source() {
        let m = from_rows(&[[1.0, 2.0], [3.0, 4.0]]);
        let mut c = clone_mat(&m);
        *c.get_mut([0, 0]).unwrap() = 99.0;
        assert_eq!(*m.get([0, 0]).unwrap(), 1.0);
    }
}
