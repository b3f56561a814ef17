//! Orientation sampling and cross-section averaging.
//!
//! The averaging driver walks a grid of ZYZ Euler angles, obtains a
//! [`Rotation`] per sample, runs the per-orientation pipeline (solve,
//! evaluate, cross sections) and accumulates the mean [`CrossSection`].

use serde::{Deserialize, Serialize};

use crate::cross_section::CrossSection;
use crate::rotation::Rotation;
use crate::scalar::{real, Real};

/// A regular grid over ZYZ Euler angles (degrees).
///
/// α and γ cover [0°, 360°) excluding the endpoint (the parametrisation is
/// periodic); β covers [0°, 180°] inclusive. A count of 1 pins the angle at
/// its lower bound, giving the single-orientation case.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrientationGrid {
    pub n_alpha: usize,
    pub n_beta: usize,
    pub n_gamma: usize,
}

impl OrientationGrid {
    /// Single orientation: the identity.
    pub fn single() -> Self {
        Self {
            n_alpha: 1,
            n_beta: 1,
            n_gamma: 1,
        }
    }

    pub fn new(n_alpha: usize, n_beta: usize, n_gamma: usize) -> Self {
        assert!(
            n_alpha >= 1 && n_beta >= 1 && n_gamma >= 1,
            "orientation grid counts must be at least 1"
        );
        Self {
            n_alpha,
            n_beta,
            n_gamma,
        }
    }

    pub fn len(&self) -> usize {
        self.n_alpha * self.n_beta * self.n_gamma
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Iterate over `(alpha_deg, beta_deg, gamma_deg, rotation)` samples.
    pub fn iter<T: Real>(&self) -> impl Iterator<Item = (T, T, T, Rotation<T>)> + '_ {
        let grid = self.clone();
        (0..grid.len()).map(move |idx| {
            let ia = idx / (grid.n_beta * grid.n_gamma);
            let ib = (idx / grid.n_gamma) % grid.n_beta;
            let ig = idx % grid.n_gamma;
            let alpha = real::<T>(360.0 * ia as f64 / grid.n_alpha as f64);
            let beta = if grid.n_beta == 1 {
                T::zero()
            } else {
                real::<T>(180.0 * ib as f64 / (grid.n_beta - 1) as f64)
            };
            let gamma = real::<T>(360.0 * ig as f64 / grid.n_gamma as f64);
            (alpha, beta, gamma, Rotation::from_zyz_deg(alpha, beta, gamma))
        })
    }
}

/// Running mean of per-orientation cross sections.
#[derive(Debug, Clone, Default)]
pub struct OrientationAverage {
    sum: CrossSection,
    count: usize,
}

impl OrientationAverage {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn accumulate(&mut self, cs: &CrossSection) {
        self.sum.cext += cs.cext;
        self.sum.cabs += cs.cabs;
        self.sum.csca += cs.csca;
        self.sum.qext += cs.qext;
        self.sum.qabs += cs.qabs;
        self.sum.qsca += cs.qsca;
        self.count += 1;
    }

    pub fn count(&self) -> usize {
        self.count
    }

    /// The orientation-averaged cross sections. Panics if nothing was
    /// accumulated.
    pub fn mean(&self) -> CrossSection {
        assert!(self.count > 0, "no orientations accumulated");
        let n = self.count as f64;
        CrossSection {
            cext: self.sum.cext / n,
            cabs: self.sum.cabs / n,
            csca: self.sum.csca / n,
            qext: self.sum.qext / n,
            qabs: self.sum.qabs / n,
            qsca: self.sum.qsca / n,
        }
    }
}
