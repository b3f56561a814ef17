//! Field-evaluation backend contract.
//!
//! A [`FieldCalculator`] answers far-field queries against the current
//! induced-dipole state. Exactly two variants implement the contract; the
//! caller picks one at construction time through [`BackendKind`], never by
//! inspecting the data at runtime.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use candela_core::params::DdaParams;
use candela_core::scalar::{Cplx, Real};
use thiserror::Error;

/// Errors originating from a compute backend or its collaborators.
#[derive(Debug, Error)]
pub enum ComputeError {
    /// The execution resources behind a backend could not be queried or
    /// initialised.
    #[error("backend not available: {0}")]
    Unavailable(String),
}

/// Which field-evaluation backend to construct.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BackendKind {
    /// Direct single-threaded per-dipole summation.
    Direct,
    /// Summation offloaded in chunks to a parallel execution queue.
    Offloaded,
}

/// Shared dispatch-synchronisation policy for offloaded evaluation.
///
/// Consulted before each dispatch step: in synchronous mode every step runs
/// to completion before the next is issued (deterministic, step-by-step
/// profiling); in asynchronous mode steps are allowed to pipeline. The flag
/// is shared so a driver can flip the whole run at once.
#[derive(Debug, Clone)]
pub struct SyncPolicy {
    synchronous: Arc<AtomicBool>,
}

impl SyncPolicy {
    /// The performance default: asynchronous dispatch.
    pub fn asynchronous() -> Self {
        Self {
            synchronous: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Deterministic step-by-step dispatch.
    pub fn synchronous() -> Self {
        Self {
            synchronous: Arc::new(AtomicBool::new(true)),
        }
    }

    pub fn set_synchronous(&self, on: bool) {
        self.synchronous.store(on, Ordering::Relaxed);
    }

    pub fn is_synchronous(&self) -> bool {
        self.synchronous.load(Ordering::Relaxed)
    }
}

impl Default for SyncPolicy {
    fn default() -> Self {
        Self::asynchronous()
    }
}

/// Evaluator of the far-field scattered amplitude in a given direction.
///
/// The induced-dipole vector is installed once per orientation with
/// [`set_pvec`](Self::set_pvec) and borrowed, not copied: the caller
/// guarantees it stays alive and unmutated for all subsequent
/// [`calc_field`](Self::calc_field) calls.
pub trait FieldCalculator<'p, T: Real> {
    /// Install a non-owning reference to the induced-dipole vector.
    ///
    /// Panics if the length differs from the parameters' `cvec_size`.
    fn set_pvec(&mut self, pvec: &'p [Cplx<T>]);

    /// Far-field amplitude at the unit direction `n`:
    ///
    /// `E(n) = i k² e^{-ik(origin·n)} (I − n nᵀ) Σ_valid p_j e^{-i kd n·r_j}`
    ///
    /// Callable repeatedly, in any direction order; stateless with respect
    /// to direction history. Panics if no pvec is installed.
    fn calc_field(&mut self, n: [T; 3]) -> [Cplx<T>; 3];
}

/// Construct the backend selected by `kind`.
///
/// Construction of the offloaded backend probes the execution resources it
/// dispatches to; that probe can fail, and the failure is reported rather
/// than degraded into a serial run.
pub fn create_field_calculator<'p, T: Real>(
    kind: BackendKind,
    params: &'p DdaParams<T>,
    policy: SyncPolicy,
) -> Result<Box<dyn FieldCalculator<'p, T> + 'p>, ComputeError> {
    Ok(match kind {
        BackendKind::Direct => Box::new(crate::direct::DirectFieldCalculator::new(params)),
        BackendKind::Offloaded => {
            Box::new(crate::offload::OffloadFieldCalculator::new(params, policy)?)
        }
    })
}

/// Transverse projection and radiation prefactor shared by both backends:
/// turns the raw dipole sum into the far-field amplitude.
pub(crate) fn project_far_field<T: Real>(
    params: &DdaParams<T>,
    n: [T; 3],
    sum: [Cplx<T>; 3],
) -> [Cplx<T>; 3] {
    use candela_core::scalar::polar;

    // tbuff = sum - n (n . sum)
    let ndots = sum[0] * n[0] + sum[1] * n[1] + sum[2] * n[2];
    let tbuff = [
        sum[0] - ndots * n[0],
        sum[1] - ndots * n[1],
        sum[2] - ndots * n[2],
    ];

    let k = params.wave_num();
    let origin = params.geometry().origin();
    let origin_dot_n = candela_core::scalar::real::<T>(origin[0]) * n[0]
        + candela_core::scalar::real::<T>(origin[1]) * n[1]
        + candela_core::scalar::real::<T>(origin[2]) * n[2];
    let prefactor = Cplx::new(T::zero(), k * k) * polar(-k * origin_dot_n);

    [
        prefactor * tbuff[0],
        prefactor * tbuff[1],
        prefactor * tbuff[2],
    ]
}

/// Assert `n` is a unit vector; a non-unit direction is a precondition
/// violation, not a recoverable error.
pub(crate) fn check_direction<T: Real>(n: [T; 3]) {
    let len2 = n[0] * n[0] + n[1] * n[1] + n[2] * n[2];
    let tol = candela_core::scalar::real::<T>(1e-4);
    assert!(
        (len2 - T::one()).abs() < tol,
        "field direction must be a unit vector"
    );
}
