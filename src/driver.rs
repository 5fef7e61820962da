//! `HSVDDriver`: drives the merge-tree levels until a single surviving
//! node remains, handling the transpose pre-step, the 0-th-level seed SVD,
//! and the final broadcast.

use mpi::topology::Communicator;
use rlst::prelude::*;

use crate::dist::DistMatrix;
use crate::linalg;
use crate::local::LocalTruncator;
use crate::schedule::TreeScheduler;
use crate::transport::MergeTransport;
use crate::types::{RMat, RealScalar};

/// Parameters the driver needs; already validated and defaulted by
/// `FrontendGates`.
pub struct DriverOptions<T: RealScalar> {
    pub maxrank: usize,
    pub maxmergedim: usize,
    pub rtol: Option<T>,
    pub safetyshift: usize,
    pub no_of_merges: Option<usize>,
    pub silent: bool,
    pub warnings_off: bool,
}

/// Result of running the tree reduction to completion: the final
/// orthonormal `U`, replicated identically on every rank, plus the
/// ingredients `ReconstructV` and the caller need.
pub struct DriverOutput<T: RealScalar> {
    pub u: RMat<T>,
    pub rel_err: T,
    pub transpose_flag: bool,
    /// The (possibly already-transposed) working matrix's local block —
    /// `ReconstructV` needs `A_work^T · U`, not the original `A`.
    pub a_work_local: RMat<T>,
}

pub struct HSVDDriver;

impl HSVDDriver {
    pub fn run<T: RealScalar, C: Communicator>(
        comm: &C,
        a: &DistMatrix<C, T>,
        opts: &DriverOptions<T>,
    ) -> DriverOutput<T>
    where
        RMat<T>: rlst::prelude::MatrixSvd<Item = T>,
    {
        let rank = comm.rank();
        let num_procs = comm.size();

        let transpose_flag = a.split() == Some(0);
        let a_work = if transpose_flag {
            a.transpose_view()
        } else {
            DistMatrix::from_local(comm, linalg::clone_mat(a.local()), 1)
        };
        let rows = a_work.local_shape()[0];

        let anorm = a_work.vector_norm();
        let loctol = opts
            .rtol
            .map(|rtol| anorm * rtol / T::from(2 * num_procs as usize - 1).unwrap().sqrt());

        let mut active: Vec<i32> = (0..num_procs).collect();
        let mut widths_global = vec![0usize; num_procs as usize];

        // Level 0: seed every rank with its own local truncated SVD.
        let seed = LocalTruncator::truncate(
            0,
            rank,
            a_work.local(),
            opts.maxrank,
            loctol,
            opts.safetyshift,
            opts.warnings_off,
        );
        let mut u = seed.u;
        linalg::scale_columns_inplace(&mut u, &seed.sigma);
        let mut e_squared = seed.e_squared;
        let mut level = 0usize;

        if rank == 0 && !opts.silent {
            log::info!("hsvd level {level}... processes {:?}", active);
        }

        loop {
            // Publish this level's widths: every rank in the communicator
            // participates, whether or not it is still active, since the
            // broadcast is collective over the whole communicator.
            for k in 0..num_procs {
                let my_width = if k == rank && active.contains(&rank) {
                    u.shape()[1] as u64
                } else {
                    0u64
                };
                let mut v = my_width;
                comm.process_at_rank(k).broadcast_into(&mut v);
                if active.contains(&k) {
                    widths_global[k as usize] = v as usize;
                }
            }

            let plan = TreeScheduler::plan(&active, &widths_global, opts.maxmergedim, opts.no_of_merges);
            let is_final_level = plan.future_nodes.len() == 1;

            if rank == 0 && !opts.silent {
                log::info!(
                    "              current ranks: {:?}",
                    active.iter().map(|r| widths_global[*r as usize]).collect::<Vec<_>>()
                );
            }

            if plan.future_nodes.contains(&rank) {
                let children = plan.recv_from.get(&rank).cloned().unwrap_or_default();
                let child_widths: Vec<usize> =
                    children.iter().map(|&c| widths_global[c as usize]).collect();
                let (concatenated, received_e_squared) = MergeTransport::receive_and_concat(
                    comm,
                    rows,
                    &children,
                    &child_widths,
                    u,
                    e_squared,
                );

                level += 1;
                if rank == 0 && !opts.silent {
                    log::info!("hsvd level {level}... processes {:?}", plan.future_nodes);
                }

                let safetyshift_this_level = if is_final_level { 0 } else { opts.safetyshift };
                let merged = LocalTruncator::truncate(
                    level,
                    rank,
                    &concatenated,
                    opts.maxrank,
                    loctol,
                    safetyshift_this_level,
                    opts.warnings_off,
                );

                u = merged.u;
                e_squared = received_e_squared + merged.e_squared;
                if !is_final_level {
                    // Carry singular-value magnitude forward into the next
                    // concatenation; the final level keeps U orthonormal.
                    linalg::scale_columns_inplace(&mut u, &merged.sigma);
                }
            } else if active.contains(&rank) {
                let parent = *plan.send_to.get(&rank).expect("active non-parent must have a parent");
                MergeTransport::send(comm, rank, parent, &u, e_squared);
            }

            if is_final_level {
                break;
            }
            active = plan.future_nodes;
        }

        // Broadcast the surviving U and e_squared from rank 0 (the
        // scheduler's ordering rule guarantees rank 0 is the last survivor).
        let mut shape = if rank == 0 { [rows, u.shape()[1]] } else { [rows, 0] };
        comm.process_at_rank(0)
            .broadcast_into(&mut shape[1]);

        let mut u_final = if rank == 0 { u } else { linalg::zeros(rows, shape[1]) };
        comm.process_at_rank(0).broadcast_into(u_final.data_mut());

        let mut e_final = if rank == 0 { e_squared } else { T::zero() };
        comm.process_at_rank(0).broadcast_into(&mut e_final);

        let rel_err = e_final.sqrt() / anorm;

        DriverOutput {
            u: u_final,
            rel_err,
            transpose_flag,
            a_work_local: linalg::clone_mat(a_work.local()),
        }
    }
}
