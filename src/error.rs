//! Error types for the distributed hierarchical SVD.

use thiserror::Error;

/// Failure modes of [`crate::hsvd`] and its front-door wrappers.
///
/// Only the fatal kinds are represented here (input-shape/type and
/// scheduling-infeasible). The precision-clamped diagnostic and the
/// all-noise degenerate case are handled in-band and never surface as an
/// `Err`; transport failures are propagated from the `mpi` crate as-is
/// rather than wrapped, since they terminate the SPMD job regardless of
/// how they are reported.
#[derive(Debug, Error)]
pub enum HsvdError {
    /// `A` is not rank-2, has an unsupported element type, or a supplied
    /// rank/tolerance parameter is non-positive or internally inconsistent.
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// `maxmergedim` cannot admit even a single two-child merge given
    /// `maxrank` and `safetyshift`.
    #[error("infeasible merge schedule: {0}")]
    Scheduling(String),
}

/// Convenience alias used throughout the crate.
pub type HsvdResult<T> = Result<T, HsvdError>;
