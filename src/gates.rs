//! `FrontendGates`: validates and defaults the options of the three public
//! entry points before handing off to `HSVDDriver`/`ReconstructV`.

use mpi::topology::Communicator;

use crate::dist::DistMatrix;
use crate::driver::DriverOptions;
use crate::error::{HsvdError, HsvdResult};
use crate::schedule::TreeScheduler;
use crate::types::RealScalar;

/// The options an expert caller of `hsvd` supplies directly; `hsvd_rank`
/// and `hsvd_rtol` each build one of these with the other alternative left
/// `None`.
pub struct RequestedOptions<T: RealScalar> {
    pub maxrank: Option<usize>,
    pub rtol: Option<T>,
    pub maxmergedim: Option<usize>,
    pub safetyshift: usize,
    pub no_of_merges: Option<usize>,
    pub silent: bool,
    pub warnings_off: bool,
}

pub struct FrontendGates;

impl FrontendGates {
    /// `maxrank` is required and positive; `maxmergedim` defaults to
    /// `max(local_width_max, 2*(maxrank+safetyshift)+1)` when unset.
    pub fn rank_gate<T: RealScalar, C: Communicator>(
        a: &DistMatrix<C, T>,
        requested: RequestedOptions<T>,
    ) -> HsvdResult<DriverOptions<T>> {
        let maxrank = requested
            .maxrank
            .ok_or_else(|| HsvdError::InvalidInput("hsvd_rank requires maxrank".to_string()))?;
        if maxrank == 0 {
            return Err(HsvdError::InvalidInput("maxrank must be positive".to_string()));
        }

        let safetyshift = requested.safetyshift;
        let widths = a.lshape_map();
        let local_width_max = *widths.iter().max().unwrap_or(&0);
        let two_child_floor = 2 * (maxrank + safetyshift) + 1;

        let maxmergedim = requested
            .maxmergedim
            .unwrap_or_else(|| local_width_max.max(two_child_floor));

        Self::finish(maxrank, maxmergedim, safetyshift, requested)
    }

    /// Any combination of `maxrank`/`maxmergedim`/`noOfMerges` is accepted;
    /// missing values are derived from whichever are present, falling back
    /// to "no rank cap, binary tree" (`noOfMerges = 2`, `maxrank = n`,
    /// `maxmergedim = 2*(n+safetyshift)+1`) when none are.
    pub fn tolerance_gate<T: RealScalar, C: Communicator>(
        a: &DistMatrix<C, T>,
        requested: RequestedOptions<T>,
    ) -> HsvdResult<DriverOptions<T>> {
        let rtol = requested
            .rtol
            .ok_or_else(|| HsvdError::InvalidInput("hsvd_rtol requires rtol".to_string()))?;
        if rtol <= T::zero() {
            return Err(HsvdError::InvalidInput("rtol must be positive".to_string()));
        }

        let safetyshift = requested.safetyshift;
        let widths = a.lshape_map();
        let local_width_max = *widths.iter().max().unwrap_or(&0);
        let n = a.global_shape()[1];

        let (maxrank, maxmergedim) = match (requested.maxrank, requested.maxmergedim) {
            (Some(k), Some(m)) => (k, m),
            (Some(k), None) => (k, local_width_max.max(2 * (k + safetyshift) + 1)),
            (None, Some(m)) => {
                // Derived from the local width, not m itself: the original
                // bounds the per-rank tolerance-mode rank by what a single
                // rank can locally hold, independent of the merge cap.
                if local_width_max / 2 <= safetyshift {
                    return Err(HsvdError::InvalidInput(format!(
                        "cannot derive maxrank from rtol: local_width_max/2 ({}) must exceed \
                         safetyshift ({safetyshift})",
                        local_width_max / 2
                    )));
                }
                (local_width_max / 2 - safetyshift, m)
            }
            (None, None) => (n, 2 * (n + safetyshift) + 1),
        };

        let no_of_merges = match requested.no_of_merges {
            Some(n) => Some(n),
            None if requested.maxrank.is_none() && requested.maxmergedim.is_none() => Some(2),
            None => None,
        };

        if let Some(n) = no_of_merges {
            if n < 2 {
                return Err(HsvdError::InvalidInput(
                    "noOfMerges must allow at least a two-way merge".to_string(),
                ));
            }
        }

        Self::finish(
            maxrank,
            maxmergedim,
            safetyshift,
            RequestedOptions {
                no_of_merges,
                ..requested
            },
        )
    }

    fn finish<T: RealScalar>(
        maxrank: usize,
        maxmergedim: usize,
        safetyshift: usize,
        requested: RequestedOptions<T>,
    ) -> HsvdResult<DriverOptions<T>> {
        TreeScheduler::check_feasible(maxmergedim, maxrank, safetyshift)?;
        Ok(DriverOptions {
            maxrank,
            maxmergedim,
            rtol: requested.rtol,
            safetyshift,
            no_of_merges: requested.no_of_merges,
            silent: requested.silent,
            warnings_off: requested.warnings_off,
        })
    }
}
