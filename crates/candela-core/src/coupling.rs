//! Per-material coupling constants (polarisability tensors).
//!
//! Each material in the simulation carries one diagonal complex 3×3 tensor:
//! three complex scalars, one per axis. The table is derived once from the
//! material dielectric functions and the lattice, then shared read-only for
//! the whole run.

use num_complex::Complex;

use crate::geometry::DipoleGeometry;
use crate::scalar::{real, Cplx, Real};

/// Compute the Clausius-Mossotti polarisability for a small volume element.
///
/// $\alpha_{\text{CM}} = 3 V \frac{\epsilon - \epsilon_m}{\epsilon + 2\epsilon_m}$
///
/// Units of volume (nm³); the vacuum permittivity is absorbed.
pub fn clausius_mossotti<T: Real>(volume_nm3: T, epsilon: Cplx<T>, epsilon_m: T) -> Cplx<T> {
    let eps_m = Complex::from(epsilon_m);
    let three = Complex::from(real::<T>(3.0));
    three * volume_nm3 * (epsilon - eps_m) / (epsilon + (eps_m + eps_m))
}

/// Apply the Draine radiative correction to a polarisability.
///
/// Ensures optical-theorem consistency:
/// $\alpha_{\text{rad}} = \alpha_{\text{CM}} / (1 - \frac{2i}{3} k^3 \alpha_{\text{CM}})$
///
/// The reaction term $\frac{2}{3} k^3$ matches the correction subtracted in
/// the absorption formula, so a lossless material absorbs exactly nothing.
pub fn radiative_correction<T: Real>(alpha_cm: Cplx<T>, k: T) -> Cplx<T> {
    let two_thirds = real::<T>(2.0 / 3.0);
    let reaction = Cplx::new(T::zero(), two_thirds * k.powi(3));
    alpha_cm / (Cplx::from(T::one()) - reaction * alpha_cm)
}

/// The per-material diagonal polarisability table.
///
/// Invariant: no tensor component is zero (the absorption formula takes the
/// inverse). Immutable after construction.
#[derive(Debug, Clone)]
pub struct CoupleConstants<T> {
    cc: Vec<[Cplx<T>; 3]>,
}

impl<T: Real> CoupleConstants<T> {
    /// Wrap an explicit tensor table.
    ///
    /// Panics if any component is exactly zero; a zero coupling constant is
    /// a programming error upstream (division by it is undefined).
    pub fn new(cc: Vec<[Cplx<T>; 3]>) -> Self {
        for (m, tensor) in cc.iter().enumerate() {
            for (j, &c) in tensor.iter().enumerate() {
                assert!(
                    c != Cplx::from(T::zero()),
                    "zero coupling constant for material {m}, axis {j}"
                );
            }
        }
        Self { cc }
    }

    /// Build the table from one dielectric function per material, using the
    /// radiatively corrected Clausius-Mossotti prescription on the
    /// geometry's lattice.
    ///
    /// `epsilon[m]` is the complex dielectric function of material `m`;
    /// `epsilon_m` the (real) dielectric constant of the ambient medium;
    /// `k` the wavenumber in the medium (nm⁻¹).
    pub fn from_dielectrics(
        geometry: &DipoleGeometry,
        epsilon: &[Cplx<T>],
        epsilon_m: T,
        k: T,
    ) -> Self {
        assert!(
            epsilon.len() >= geometry.mat_count(),
            "dielectric table has {} entries, geometry references {}",
            epsilon.len(),
            geometry.mat_count()
        );
        let volume = real::<T>(geometry.grid_unit().powi(3));
        let cc = epsilon
            .iter()
            .map(|&eps| {
                let alpha = radiative_correction(clausius_mossotti(volume, eps, epsilon_m), k);
                [alpha, alpha, alpha]
            })
            .collect();
        Self::new(cc)
    }

    /// Number of materials in the table.
    pub fn mat_count(&self) -> usize {
        self.cc.len()
    }

    /// Diagonal tensor of material `m`.
    pub fn tensor(&self, m: u8) -> [Cplx<T>; 3] {
        self.cc[m as usize]
    }

    pub fn table(&self) -> &[[Cplx<T>; 3]] {
        &self.cc
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clausius_mossotti_vacuum_is_zero() {
        let a = clausius_mossotti(8.0f64, Cplx::new(1.0, 0.0), 1.0);
        assert!(a.norm() < 1e-15);
    }

    #[test]
    fn radiative_correction_adds_absorptive_part() {
        // A lossless dielectric polarisability gains a positive imaginary
        // part from radiation reaction
        let alpha_cm = clausius_mossotti(8.0f64, Cplx::new(4.0, 0.0), 1.0);
        assert_eq!(alpha_cm.im, 0.0);
        let alpha = radiative_correction(alpha_cm, 0.05);
        assert!(alpha.im > 0.0);
    }

    #[test]
    #[should_panic(expected = "zero coupling constant")]
    fn zero_tensor_component_is_rejected() {
        let zero = Cplx::new(0.0f64, 0.0);
        let one = Cplx::new(1.0, 0.0);
        CoupleConstants::new(vec![[one, zero, one]]);
    }

    #[test]
    fn table_covers_geometry_materials() {
        let g = DipoleGeometry::cuboid([2, 2, 2], 1.5, 0).unwrap();
        let cc = CoupleConstants::from_dielectrics(&g, &[Cplx::new(2.25, 0.01)], 1.0, 0.01f64);
        assert_eq!(cc.mat_count(), 1);
        let t = cc.tensor(0);
        assert_eq!(t[0], t[1]);
        assert_eq!(t[1], t[2]);
    }
}
