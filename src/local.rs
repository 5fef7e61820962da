//! `LocalTruncator`: a single node's truncated SVD, with noise floor,
//! optional absolute tolerance, rank cap, and safety shift.

use crate::linalg;
use crate::types::{noise_floor, RMat, RealScalar};

/// Result of one local truncation. `e_squared` is reported at the *base*
/// rank `k_star`, before `safetyshift` widens the returned factor — the
/// returned `u`/`sigma` carry `k_ret = min(c, k_star + safetyshift)`
/// columns, so callers that need the base rank separately (the final
/// level, slicing the survivor) should keep both fields rather than
/// recovering `k_star` from `u.shape()[1]`.
pub struct LocalTruncation<T: RealScalar> {
    pub u: RMat<T>,
    pub sigma: Vec<T>,
    pub e_squared: T,
    /// Base rank `k_star` the error estimate was measured at.
    pub k_star: usize,
    /// Set when the ideal-tolerance rank was clamped down by `maxrank`.
    pub precision_clamped: bool,
}

/// Computes a truncated local SVD of `m`.
pub struct LocalTruncator;

impl LocalTruncator {
    /// `level`/`proc_id` are only used to label the precision-clamped
    /// diagnostic; they do not affect the computation. The diagnostic
    /// itself is suppressed when `warnings_off` is set.
    pub fn truncate<T: RealScalar>(
        level: usize,
        proc_id: i32,
        m: &RMat<T>,
        maxrank: usize,
        loctol: Option<T>,
        safetyshift: usize,
        warnings_off: bool,
    ) -> LocalTruncation<T>
    where
        RMat<T>: rlst::prelude::MatrixSvd<Item = T>,
    {
        let (u_f, sigma_f) = linalg::thin_svd(m);
        let c = sigma_f.len();
        let eps = noise_floor::<T>();

        let no_noise_idx = sigma_f.iter().rposition(|&s| s >= eps);

        let Some(last_signal) = no_noise_idx else {
            // All singular values are noise: degenerate factor.
            let e_squared = linalg::tail_norm_sq(&sigma_f, 0);
            let rows = m.shape()[0];
            return LocalTruncation {
                u: linalg::zeros(rows, 1),
                sigma: vec![T::zero()],
                e_squared,
                k_star: 0,
                precision_clamped: false,
            };
        };
        let k_noise = last_signal + 1;

        let k_tol = loctol.map(|tol| {
            let tol_sq = tol * tol;
            (0..=c)
                .find(|&k| linalg::tail_norm_sq(&sigma_f, k) < tol_sq)
                .unwrap_or(c)
        });

        let k_max = maxrank;
        let k_star = match k_tol {
            Some(k_tol) => k_noise.min(k_max).min(k_tol),
            None => k_noise.min(k_max),
        };

        let precision_clamped = match k_tol {
            Some(k_tol) => k_star < k_tol && k_star == k_max,
            None => false,
        };
        if precision_clamped && !warnings_off {
            log::warn!(
                "hsvd (level {level}, process {proc_id}): abs tol requires truncation to rank \
                 {k_tol}, but maxrank={maxrank}. Loss of desired precision (rtol) very likely!",
                k_tol = k_tol.unwrap(),
            );
        }

        let k_ret = c.min(k_star + safetyshift);
        let e_squared = linalg::tail_norm_sq(&sigma_f, k_star);

        LocalTruncation {
            u: slice_cols(&u_f, k_ret),
            sigma: sigma_f[..k_ret].to_vec(),
            e_squared,
            k_star,
            precision_clamped,
        }
    }
}

/// First `k` columns of `m`.
fn slice_cols<T: RealScalar>(m: &RMat<T>, k: usize) -> RMat<T> {
    let rows = m.shape()[0];
    let mut out = linalg::zeros(rows, k);
    for (dst, src) in out.col_iter_mut().zip(m.col_iter().take(k)) {
        dst.fill_from(src.view());
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use rlst::prelude::*;

    fn identity(n: usize) -> RMat<f64> {
        let mut m = rlst_dynamic_array2!(f64, [n, n]);
        for i in 0..n {
            *m.get_mut([i, i]).unwrap() = 1.0;
        }
        m
    }

    #[test]
    fn identity_keeps_all_unit_singular_values() {
        let m = identity(8);
        let result = LocalTruncator::truncate(0, 0, &m, 8, None, 0, false);
        assert_eq!(result.sigma.len(), 8);
        for s in &result.sigma {
            assert!((*s - 1.0).abs() < 1e-12);
        }
        assert_eq!(result.e_squared, 0.0);
    }

    #[test]
    fn rank_cap_reports_tail_at_base_rank_not_safetyshifted_rank() {
        let m = identity(8);
        let result = LocalTruncator::truncate(0, 0, &m, 4, None, 2, false);
        // returned factor is widened by safetyshift...
        assert_eq!(result.u.shape()[1], 6);
        assert_eq!(result.k_star, 4);
        // ...but the error is the tail at k_star=4, i.e. 4 unit singular values.
        assert!((result.e_squared - 4.0).abs() < 1e-12);
    }

    #[test]
    fn all_noise_matrix_is_degenerate() {
        let mut m = rlst_dynamic_array2!(f64, [4, 4]);
        for v in m.data_mut().iter_mut() {
            *v = 1e-20;
        }
        let result = LocalTruncator::truncate(0, 0, &m, 4, None, 0, false);
        assert_eq!(result.u.shape()[1], 1);
        assert_eq!(result.sigma, vec![0.0]);
    }
}
