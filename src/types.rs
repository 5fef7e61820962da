//! Shared type aliases and scalar bound used throughout the crate.

use mpi::datatype::Equivalence;
use num::{Float, NumCast};
use rlst::prelude::*;

/// Scalar bound satisfied by `f32` and `f64`: real-valued, usable as an
/// `rlst` array element, and directly sendable/receivable over MPI.
pub trait RealScalar: RlstScalar<Real = Self> + Float + Equivalence + Default + 'static {}

impl<T> RealScalar for T where T: RlstScalar<Real = T> + Float + Equivalence + Default + 'static {}

/// A dense local matrix, column-major, backed by `rlst`'s default container.
pub type RMat<T> = DynamicArray<T, 2>;

/// Per-dtype noise floor below which a singular value is treated as
/// numerical zero.
pub fn noise_floor<T: RealScalar>() -> T {
    // f64 gets 1e-14, f32 gets 1e-7; distinguished by epsilon since `T` is
    // generic over both at this point in the call graph.
    if T::epsilon() < T::from(1e-10).unwrap() {
        T::from(1e-14).unwrap()
    } else {
        T::from(1e-7).unwrap()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn noise_floor_is_per_dtype() {
        assert!((noise_floor::<f64>() - 1e-14).abs() < 1e-20);
        assert!((noise_floor::<f32>() - 1e-7).abs() < 1e-10);
    }
}
