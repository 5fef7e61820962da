//! `ReconstructV`: recovers singular values and the right singular vectors
//! from the surviving `U` and the (pre-transpose) working matrix.

use mpi::collective::SystemOperation;
use mpi::topology::Communicator;
use rlst::prelude::*;

use crate::linalg;
use crate::types::{RMat, RealScalar};

/// What `hsvd`'s expert form hands back once `HSVDDriver` has converged.
pub struct Factorization<T: RealScalar> {
    /// Orthonormal left (or, if the input was row-split, right) singular
    /// vectors, replicated identically on every rank.
    pub u: RMat<T>,
    /// Singular values in descending order, replicated on every rank.
    /// `None` when `full` was not requested.
    pub sigma: Option<Vec<T>>,
    /// Right (or, if row-split, left) singular vectors, replicated on
    /// every rank and already column-split to match the caller's layout.
    /// `None` when `full` was not requested.
    pub v: Option<RMat<T>>,
}

pub struct ReconstructV;

impl ReconstructV {
    /// `a_work_local` is this rank's local block of the (possibly already
    /// transposed) working matrix the driver ran the tree reduction over;
    /// `u` is the fully-reduced, replicated factor it returned.
    ///
    /// Computes `W = A_work^T · U` (a reduction over each rank's local
    /// contribution, since `A_work` is column-split but `U` is
    /// replicated), takes its column norms as the singular values, and
    /// rescales `W`'s columns to unit length to recover the right singular
    /// vectors — all guarded against an all-zero `W` (possible only when
    /// `U` itself was the degenerate all-noise factor).
    ///
    /// `transpose_flag` says whether the driver pre-transposed the input
    /// (it does so for row-split input); when it did, the roles of the two
    /// returned factors swap, since what was computed as "V" here is
    /// actually the caller's left singular vectors.
    pub fn compute<T: RealScalar, C: Communicator>(
        comm: &C,
        a_work_local: &RMat<T>,
        u: &RMat<T>,
        transpose_flag: bool,
        full: bool,
    ) -> Factorization<T> {
        // When the input wasn't row-split, `u` is already the caller's
        // answer and `full == false` needs nothing further. When it was
        // row-split, `u` is the *working* matrix's factor, not the
        // caller's — the caller's dominant factor is `V = A_work^T · U`,
        // so that multiply and reduction can't be skipped even when
        // `full` is false.
        if !full && !transpose_flag {
            return Factorization {
                u: linalg::clone_mat(u),
                sigma: None,
                v: None,
            };
        }

        let mut w = linalg::matmul(&a_work_local.view().transpose().eval(), u);

        let local_sigma_sq: Vec<T> = linalg::col_norms(&w).iter().map(|&s| s * s).collect();
        let mut sigma_sq = vec![T::zero(); local_sigma_sq.len()];
        comm.all_reduce_into(&local_sigma_sq[..], &mut sigma_sq[..], &SystemOperation::sum());
        let sigma: Vec<T> = sigma_sq.iter().map(|&s| s.sqrt()).collect();

        let sigma_norm = linalg::tail_norm_sq(&sigma, 0).sqrt();
        if sigma_norm > T::zero() {
            let inv_sigma: Vec<T> = sigma
                .iter()
                .map(|&s| if s > T::zero() { T::one() / s } else { T::zero() })
                .collect();
            linalg::scale_columns_inplace(&mut w, &inv_sigma);
        }

        if transpose_flag {
            if full {
                Factorization {
                    u: w,
                    sigma: Some(sigma),
                    v: Some(linalg::clone_mat(u)),
                }
            } else {
                // `elif transposeflag and not full: return V, rel_error_estimate`
                Factorization {
                    u: w,
                    sigma: None,
                    v: None,
                }
            }
        } else {
            Factorization {
                u: linalg::clone_mat(u),
                sigma: Some(sigma),
                v: Some(w),
            }
        }
    }
}
