//! `DistMatrix`: the column-split dense array this crate reduces over.
//!
//! No crate on crates.io exposes exactly the shape/partition metadata this
//! algorithm needs, so it is implemented here the same way domain
//! containers elsewhere in this codebase are built (a `Grid`, a
//! `MultiNodeTree`): a thin struct pairing a local `rlst` buffer with
//! partition metadata and a communicator reference, built up with
//! constructors rather than derived from a generic "array" trait.

use mpi::collective::SystemOperation;
use mpi::topology::Communicator;

use crate::linalg;
use crate::types::{RMat, RealScalar};

/// Dense `m x n` matrix, split column-wise (`split == 1`) or row-wise
/// (`split == 0`) across the ranks of `comm`. `split == None` marks a
/// replicated matrix held identically (and fully) on every rank.
pub struct DistMatrix<'a, C: Communicator, T: RealScalar> {
    local: RMat<T>,
    split: Option<usize>,
    comm: &'a C,
}

impl<'a, C: Communicator, T: RealScalar> DistMatrix<'a, C, T> {
    /// Wrap an already-partitioned local block. `split` is the axis along
    /// which `local` is this rank's contiguous slice of the global matrix.
    pub fn from_local(comm: &'a C, local: RMat<T>, split: usize) -> Self {
        assert!(split == 0 || split == 1, "split must be 0 or 1");
        DistMatrix {
            local,
            split: Some(split),
            comm,
        }
    }

    /// Wrap a local buffer that is already replicated, identically, on
    /// every rank (`split = None`).
    pub fn replicated(comm: &'a C, local: RMat<T>) -> Self {
        DistMatrix {
            local,
            split: None,
            comm,
        }
    }

    /// This rank's local shape `(rows, cols)`.
    pub fn local_shape(&self) -> [usize; 2] {
        let shape = self.local.shape();
        [shape[0], shape[1]]
    }

    /// The split axis, or `None` if replicated.
    pub fn split(&self) -> Option<usize> {
        self.split
    }

    /// This rank's local dense buffer.
    pub fn local(&self) -> &RMat<T> {
        &self.local
    }

    /// Consume, handing back the local buffer.
    pub fn into_local(self) -> RMat<T> {
        self.local
    }

    /// Per-rank local width along the split axis, known to every rank.
    pub fn lshape_map(&self) -> Vec<usize> {
        let size = self.comm.size() as usize;
        let my_width = match self.split {
            Some(axis) => self.local_shape()[axis],
            None => self.local_shape()[1],
        };
        let mut widths = vec![0u64; size];
        for (rank, w) in widths.iter_mut().enumerate() {
            let mut v = if rank as i32 == self.comm.rank() {
                my_width as u64
            } else {
                0u64
            };
            self.comm.process_at_rank(rank as i32).broadcast_into(&mut v);
            *w = v;
        }
        widths.into_iter().map(|w| w as usize).collect()
    }

    /// Global `(rows, cols)`, derived from `lshape_map` along the split
    /// axis and this rank's local size along the other. `None`-split
    /// (replicated) matrices already have their full shape locally.
    pub fn global_shape(&self) -> [usize; 2] {
        match self.split {
            None => self.local_shape(),
            Some(axis) => {
                let total = self.lshape_map().iter().sum();
                let mut shape = self.local_shape();
                shape[axis] = total;
                shape
            }
        }
    }

    /// Cheap metadata-and-local-transpose flip: a row-split `(split=0)`
    /// matrix transposed becomes column-split, because each rank's local
    /// row block, transposed in place, is already that rank's column block
    /// of `A^T` — no redistribution is required.
    pub fn transpose_view(&self) -> DistMatrix<'a, C, T> {
        let transposed = self.local.view().transpose().eval();
        let split = self.split.map(|axis| 1 - axis);
        DistMatrix {
            local: transposed,
            split,
            comm: self.comm,
        }
    }

    /// Global Frobenius norm, via a local partial sum of squares followed
    /// by a sum-reduction across the communicator.
    pub fn vector_norm(&self) -> T {
        let local_sq = {
            let n = linalg::fro_norm(&self.local);
            n * n
        };
        let mut global_sq = T::zero();
        self.comm
            .all_reduce_into(&local_sq, &mut global_sq, &SystemOperation::sum());
        global_sq.sqrt()
    }

    /// A reference to the owning communicator.
    pub fn comm(&self) -> &'a C {
        self.comm
    }
}
