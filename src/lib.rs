//! Distributed hierarchical truncated SVD (hSVD) over a column-split dense
//! matrix, reduced along a merge tree of MPI ranks.
//!
//! The three public entry points are [`hsvd_rank`] (fixed target rank),
//! [`hsvd_rtol`] (target relative Frobenius error), and [`hsvd`] (the
//! expert form taking every option with no defaults). All three return the
//! same factorization shape, governed by whether `full` output (singular
//! values and the second factor, not just the dominant one) was requested.

pub mod dist;
pub mod driver;
pub mod error;
pub mod gates;
pub mod linalg;
pub mod local;
pub mod reconstruct;
pub mod schedule;
pub mod transport;
pub mod types;

use mpi::topology::Communicator;

pub use dist::DistMatrix;
pub use error::{HsvdError, HsvdResult};
pub use types::RealScalar;

use driver::HSVDDriver;
use gates::{FrontendGates, RequestedOptions};
use reconstruct::ReconstructV;
use types::RMat;

/// Default `safetyshift` used by `hsvd_rank`/`hsvd_rtol`.
pub const DEFAULT_SAFETYSHIFT: usize = 5;

/// What every entry point returns: the dominant factor plus, when `full`
/// output was requested, the singular values and the paired factor.
pub enum HsvdOutput<T: RealScalar> {
    Basic {
        u: RMat<T>,
        rel_err: T,
    },
    Full {
        u: RMat<T>,
        sigma: Vec<T>,
        v: RMat<T>,
        rel_err: T,
    },
}

impl<T: RealScalar> HsvdOutput<T> {
    /// The relative error estimate common to both variants.
    pub fn rel_err(&self) -> T {
        match self {
            HsvdOutput::Basic { rel_err, .. } => *rel_err,
            HsvdOutput::Full { rel_err, .. } => *rel_err,
        }
    }
}

/// Fixed-rank hSVD: truncate to exactly `maxrank` singular vectors at every
/// node of the merge tree (plus `safetyshift` extra columns carried between
/// levels to damp error amplification).
pub fn hsvd_rank<T, C>(
    comm: &C,
    a: &DistMatrix<C, T>,
    maxrank: usize,
    full: bool,
    maxmergedim: Option<usize>,
    safetyshift: Option<usize>,
    silent: bool,
) -> HsvdResult<HsvdOutput<T>>
where
    T: RealScalar,
    C: Communicator,
    RMat<T>: rlst::prelude::MatrixSvd<Item = T>,
{
    let requested = RequestedOptions {
        maxrank: Some(maxrank),
        rtol: None,
        maxmergedim,
        safetyshift: safetyshift.unwrap_or(DEFAULT_SAFETYSHIFT),
        no_of_merges: None,
        silent,
        warnings_off: false,
    };
    let opts = FrontendGates::rank_gate(a, requested)?;
    Ok(run(comm, a, opts, full))
}

/// Tolerance-driven hSVD: truncate each local factor so its discarded
/// tail's contribution to the global error budget stays under a share of
/// `rtol` derived from the merge tree's depth.
#[allow(clippy::too_many_arguments)]
pub fn hsvd_rtol<T, C>(
    comm: &C,
    a: &DistMatrix<C, T>,
    rtol: T,
    full: bool,
    maxrank: Option<usize>,
    maxmergedim: Option<usize>,
    safetyshift: Option<usize>,
    no_of_merges: Option<usize>,
    silent: bool,
) -> HsvdResult<HsvdOutput<T>>
where
    T: RealScalar,
    C: Communicator,
    RMat<T>: rlst::prelude::MatrixSvd<Item = T>,
{
    let requested = RequestedOptions {
        maxrank,
        rtol: Some(rtol),
        maxmergedim,
        safetyshift: safetyshift.unwrap_or(DEFAULT_SAFETYSHIFT),
        no_of_merges,
        silent,
        warnings_off: false,
    };
    let opts = FrontendGates::tolerance_gate(a, requested)?;
    Ok(run(comm, a, opts, full))
}

/// Expert form: every option is taken verbatim, with no defaulting beyond
/// what the chosen gate (rank gate when `maxrank` is set, tolerance gate
/// otherwise) performs.
#[allow(clippy::too_many_arguments)]
pub fn hsvd<T, C>(
    comm: &C,
    a: &DistMatrix<C, T>,
    maxrank: Option<usize>,
    rtol: Option<T>,
    full: bool,
    maxmergedim: Option<usize>,
    safetyshift: usize,
    no_of_merges: Option<usize>,
    silent: bool,
    warnings_off: bool,
) -> HsvdResult<HsvdOutput<T>>
where
    T: RealScalar,
    C: Communicator,
    RMat<T>: rlst::prelude::MatrixSvd<Item = T>,
{
    let requested = RequestedOptions {
        maxrank,
        rtol,
        maxmergedim,
        safetyshift,
        no_of_merges,
        silent,
        warnings_off,
    };
    let opts = if maxrank.is_some() && rtol.is_none() {
        FrontendGates::rank_gate(a, requested)?
    } else {
        FrontendGates::tolerance_gate(a, requested)?
    };
    Ok(run(comm, a, opts, full))
}

fn run<T, C>(comm: &C, a: &DistMatrix<C, T>, opts: driver::DriverOptions<T>, full: bool) -> HsvdOutput<T>
where
    T: RealScalar,
    C: Communicator,
    RMat<T>: rlst::prelude::MatrixSvd<Item = T>,
{
    let result = HSVDDriver::run(comm, a, &opts);
    let fact = ReconstructV::compute(
        comm,
        &result.a_work_local,
        &result.u,
        result.transpose_flag,
        full,
    );

    match (fact.sigma, fact.v) {
        (Some(sigma), Some(v)) => HsvdOutput::Full {
            u: fact.u,
            sigma,
            v,
            rel_err: result.rel_err,
        },
        _ => HsvdOutput::Basic {
            u: fact.u,
            rel_err: result.rel_err,
        },
    }
}
