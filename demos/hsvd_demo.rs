//! Builds a random column-split matrix across the available ranks and runs
//! both entry points on it, printing the reported relative error on rank 0.
//!
//! Run with, e.g., `mpirun -n 4 cargo run --example hsvd_demo`.

use hsvd::{hsvd_rank, hsvd_rtol, DistMatrix};
use mpi::traits::Communicator;
use rand::{Rng, SeedableRng};
use rlst::prelude::*;

fn main() {
    let universe = mpi::initialize().expect("failed to initialize MPI");
    let world = universe.world();
    let rank = world.rank();
    let size = world.size();

    let local_rows = 64;
    let local_cols = 20;
    let mut rng = rand::rngs::StdRng::seed_from_u64(42 + rank as u64);

    let mut local = rlst_dynamic_array2!(f64, [local_rows, local_cols]);
    for v in local.data_mut().iter_mut() {
        *v = rng.gen_range(-1.0..1.0);
    }

    let a = DistMatrix::from_local(&world, local, 1);

    let fixed_rank = hsvd_rank(&world, &a, 8, true, None, None, true).expect("hsvd_rank failed");
    if rank == 0 {
        println!(
            "hsvd_rank(maxrank=8): P={size} rel_err={:.3e}",
            fixed_rank.rel_err()
        );
    }

    let fixed_tol = hsvd_rtol(&world, &a, 1e-6, false, None, None, None, None, true)
        .expect("hsvd_rtol failed");
    if rank == 0 {
        println!("hsvd_rtol(rtol=1e-6): P={size} rel_err={:.3e}", fixed_tol.rel_err());
    }
}
