//! `MergeTransport`: ships local factors and error scalars between
//! children and their parent for one level of the merge tree.
//!
//! Tag discipline: tag `c` carries child `c`'s factor, tag `2P + c` carries
//! its error scalar — chosen so no two messages can ever cross-match
//! within or across parents in the same level.

use mpi::topology::Communicator;
use mpi::traits::{Destination, Source};
use rlst::prelude::*;

use crate::linalg;
use crate::types::{RMat, RealScalar};

/// Exchanges `(U, e_squared)` pairs along one level's merge schedule.
pub struct MergeTransport;

impl MergeTransport {
    fn error_tag(num_procs: i32, child: i32) -> i32 {
        2 * num_procs + child
    }

    /// Non-parent: hand this rank's factor and error to its assigned
    /// parent. Blocks until both sends complete.
    pub fn send<T: RealScalar, C: Communicator>(
        comm: &C,
        my_rank: i32,
        parent: i32,
        u: &RMat<T>,
        e_squared: T,
    ) {
        let num_procs = comm.size();
        let dest = comm.process_at_rank(parent);
        dest.send_with_tag(u.data(), my_rank);
        dest.send_with_tag(&[e_squared], Self::error_tag(num_procs, my_rank));
    }

    /// Parent: receive every child's factor and error (pre-sized using the
    /// widths already published for this level), concatenate columns in
    /// ascending child-rank order with this rank's own block first, and
    /// sum the error scalars.
    pub fn receive_and_concat<T: RealScalar, C: Communicator>(
        comm: &C,
        rows: usize,
        children: &[i32],
        child_widths: &[usize],
        own_u: RMat<T>,
        own_e_squared: T,
    ) -> (RMat<T>, T) {
        let num_procs = comm.size();

        let mut blocks = vec![own_u];
        let mut e_squared = own_e_squared;

        for (&child, &width) in children.iter().zip(child_widths.iter()) {
            let src = comm.process_at_rank(child);

            let mut u = linalg::zeros::<T>(rows, width);
            src.receive_into_with_tag(u.data_mut(), child);

            let mut e: [T; 1] = [T::zero()];
            src.receive_into_with_tag(&mut e[..], Self::error_tag(num_procs, child));

            blocks.push(u);
            e_squared = e_squared + e[0];
        }

        (linalg::hstack(&blocks), e_squared)
    }
}
