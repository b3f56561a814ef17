//! Offloaded far-field summation.
//!
//! Splits the per-dipole summation into fixed-size chunks and dispatches
//! them to the parallel execution queue. The shared [`SyncPolicy`] is
//! consulted before each step: synchronous mode issues one chunk at a time
//! and blocks on it (deterministic step-by-step execution), asynchronous
//! mode pipelines all chunks through the pool. Partial sums are combined in
//! chunk order in both modes.

use candela_core::params::DdaParams;
use candela_core::scalar::{polar, real, Cplx, Real};
use rayon::prelude::*;

use crate::backend::{check_direction, project_far_field, ComputeError, FieldCalculator, SyncPolicy};
use crate::kernel::KernelOptions;

const CHUNK: usize = 1024;

/// Backend dispatching the dipole summation to a parallel execution queue.
pub struct OffloadFieldCalculator<'p, T> {
    params: &'p DdaParams<T>,
    pvec: Option<&'p [Cplx<T>]>,
    policy: SyncPolicy,
}

impl<'p, T: Real> OffloadFieldCalculator<'p, T> {
    /// Probe the execution resources the chunks dispatch to; a platform
    /// that cannot report its thread budget cannot host this backend.
    pub fn new(params: &'p DdaParams<T>, policy: SyncPolicy) -> Result<Self, ComputeError> {
        std::thread::available_parallelism()
            .map_err(|e| ComputeError::Unavailable(e.to_string()))?;
        Ok(Self {
            params,
            pvec: None,
            policy,
        })
    }

    /// The kernel compilation unit this backend corresponds to under the
    /// accelerator contract. Constant parameters are baked in as defines;
    /// free-text options go through C-string escaping.
    pub fn kernel_source(&self, label: &str) -> String {
        KernelOptions::new()
            .define_int("NV_COUNT", self.params.nv_count() as u64)
            .define_int("VEC_STRIDE", self.params.vec_stride() as u64)
            .define_int("CHUNK", CHUNK as u64)
            .define_str("RUN_LABEL", label)
            .assemble(include_str!("kernels/far_field_sum.cl"))
    }

    /// Partial sum over one chunk of dipoles.
    fn chunk_sum(&self, pvec: &[Cplx<T>], n: [T; 3], lo: usize, hi: usize) -> [Cplx<T>; 3] {
        let params = self.params;
        let geometry = params.geometry();
        let kd = params.kd();
        let positions = geometry.positions();
        let valid = geometry.valid();

        let mut sum = [Cplx::new(T::zero(), T::zero()); 3];
        for j in lo..hi {
            if valid[j] {
                let pos = positions[j];
                let phase = -kd
                    * (n[0] * real(pos[0] as f64)
                        + n[1] * real(pos[1] as f64)
                        + n[2] * real(pos[2] as f64));
                let a = polar(phase);
                let p = params.get_vec(pvec, j);
                sum[0] += p[0] * a;
                sum[1] += p[1] * a;
                sum[2] += p[2] * a;
            }
        }
        sum
    }
}

impl<'p, T: Real> FieldCalculator<'p, T> for OffloadFieldCalculator<'p, T> {
    fn set_pvec(&mut self, pvec: &'p [Cplx<T>]) {
        self.params.check_pvec(pvec);
        self.pvec = Some(pvec);
    }

    fn calc_field(&mut self, n: [T; 3]) -> [Cplx<T>; 3] {
        check_direction(n);
        let pvec = self.pvec.expect("no induced-dipole vector installed");

        let nv_count = self.params.nv_count();
        let n_chunks = nv_count.div_ceil(CHUNK);

        let partials: Vec<[Cplx<T>; 3]> = if self.policy.is_synchronous() {
            // One dispatch per step, each blocking until completion
            (0..n_chunks)
                .map(|c| {
                    let lo = c * CHUNK;
                    let hi = (lo + CHUNK).min(nv_count);
                    self.chunk_sum(pvec, n, lo, hi)
                })
                .collect()
        } else {
            (0..n_chunks)
                .into_par_iter()
                .map(|c| {
                    let lo = c * CHUNK;
                    let hi = (lo + CHUNK).min(nv_count);
                    self.chunk_sum(pvec, n, lo, hi)
                })
                .collect()
        };

        // Combine in chunk order so both policies agree bit for bit
        let mut sum = [Cplx::new(T::zero(), T::zero()); 3];
        for partial in partials {
            sum[0] += partial[0];
            sum[1] += partial[1];
            sum[2] += partial[2];
        }

        project_far_field(self.params, n, sum)
    }
}
