//! Integrated cross sections and their report format.
//!
//! The absorption cross section uses Draine's closed-form expression with
//! per-material correction terms; extinction follows from the optical
//! theorem. Both consume one orientation's induced-dipole vector and are
//! free of side effects.

use std::fmt::Write as _;

use serde::{Deserialize, Serialize};

use crate::coupling::CoupleConstants;
use crate::incident::IncidentField;
use crate::params::DdaParams;
use crate::scalar::{real, Cplx, Real};

/// Absorption cross section (Draine).
///
/// For each material `m` and axis `j`, a correction term
/// `mult_dr[m][j] = -Im(1 / cc[m][j]) - (2/3) k³` is precomputed; the cross
/// section is `4π k Σᵢⱼ mult_dr[mat(i)][j] |p_{i,j}|²` over *valid* dipoles
/// only. Invalid dipoles contribute nothing.
///
/// Precondition (checked at [`CoupleConstants`] construction): no coupling
/// tensor component is zero.
pub fn abs_cross<T: Real>(params: &DdaParams<T>, pvec: &[Cplx<T>], cc: &CoupleConstants<T>) -> T {
    params.check_pvec(pvec);
    let geometry = params.geometry();
    assert!(
        cc.mat_count() >= geometry.mat_count(),
        "coupling table smaller than geometry material count"
    );

    let corr = params.wave_num().powi(3) * real::<T>(2.0) / real::<T>(3.0);

    let mult_dr: Vec<[T; 3]> = cc
        .table()
        .iter()
        .map(|tensor| {
            let mut row = [T::zero(); 3];
            for (j, &c) in tensor.iter().enumerate() {
                row[j] = -(Cplx::from(T::one()) / c).im - corr;
            }
            row
        })
        .collect();

    let mut sum = T::zero();
    for i in 0..params.nv_count() {
        if geometry.is_valid(i) {
            let mat = geometry.material_index(i) as usize;
            for (j, &m) in mult_dr[mat].iter().enumerate() {
                sum += m * params.get(pvec, i, j).norm_sqr();
            }
        }
    }

    real::<T>(4.0) * T::PI() * params.wave_num() * sum
}

/// Extinction cross section via the optical theorem:
/// `Cext = 4π k Σᵢ Im(E*_inc(rᵢ) · pᵢ) / |E₀|²`, valid dipoles only.
pub fn ext_cross<T: Real>(
    params: &DdaParams<T>,
    pvec: &[Cplx<T>],
    incident: &IncidentField<T>,
) -> T {
    params.check_pvec(pvec);
    let geometry = params.geometry();
    let k = params.wave_num();

    let mut sum = T::zero();
    for i in 0..params.nv_count() {
        if geometry.is_valid(i) {
            let pos = geometry.physical_position(i);
            let e_inc = incident.at_position([real(pos[0]), real(pos[1]), real(pos[2])], k);
            let p = params.get_vec(pvec, i);
            for j in 0..3 {
                sum += (e_inc[j].conj() * p[j]).im;
            }
        }
    }

    real::<T>(4.0) * T::PI() * k * sum / incident.amplitude_sq()
}

/// Extinction/absorption/scattering cross sections and efficiencies for one
/// orientation (or one averaging run). Pure data plus presentation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct CrossSection {
    /// Extinction cross section (nm²).
    pub cext: f64,
    /// Absorption cross section (nm²).
    pub cabs: f64,
    /// Scattering cross section (nm²).
    pub csca: f64,
    /// Extinction efficiency.
    pub qext: f64,
    /// Absorption efficiency.
    pub qabs: f64,
    /// Scattering efficiency.
    pub qsca: f64,
}

impl CrossSection {
    /// Derive the six values from extinction and absorption, with
    /// `Csca = Cext − Cabs` and efficiencies normalised by the geometric
    /// cross section `geom_area` (nm²).
    pub fn from_ext_abs(cext: f64, cabs: f64, geom_area: f64) -> Self {
        let csca = cext - cabs;
        Self {
            cext,
            cabs,
            csca,
            qext: cext / geom_area,
            qabs: cabs / geom_area,
            qsca: csca / geom_area,
        }
    }

    /// Format the fixed two-column report, tagged with an orientation or
    /// polarisation label:
    ///
    /// ```text
    /// Cext <label> = <value> nm^2        Qext <label> = <value>
    /// Cabs <label> = <value> nm^2        Qabs <label> = <value>
    /// Csca <label> = <value> nm^2        Qsca <label> = <value>
    /// ```
    pub fn report(&self, label: &str) -> String {
        let mut out = String::new();
        for (name, c, q) in [
            ("ext", self.cext, self.qext),
            ("abs", self.cabs, self.qabs),
            ("sca", self.csca, self.qsca),
        ] {
            let cell = format!("{:.10} nm^2", c);
            let _ = writeln!(out, "C{name} {label} = {cell:<25} Q{name} {label} = {q:.10}");
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::{DipoleGeometry, GeometryBuilder};
    use std::sync::Arc;

    fn simple_setup() -> (DdaParams<f64>, CoupleConstants<f64>) {
        let g = Arc::new(DipoleGeometry::cuboid([2, 2, 2], 2.0, 0).unwrap());
        let params = DdaParams::new(Arc::clone(&g), 500.0, 1.0).unwrap();
        let cc = CoupleConstants::from_dielectrics(&g, &[Cplx::new(2.5, 0.8)], 1.0, params.wave_num());
        (params, cc)
    }

    #[test]
    fn absorption_is_linear_in_moment_magnitude_squared() {
        let (params, cc) = simple_setup();
        let pvec: Vec<Cplx<f64>> = (0..params.cvec_size())
            .map(|i| Cplx::new(0.1 + 0.03 * i as f64, -0.02 * i as f64))
            .collect();
        let c1 = abs_cross(&params, &pvec, &cc);
        // Scaling every moment by s scales the cross section by s²
        let scaled: Vec<Cplx<f64>> = pvec.iter().map(|&p| p * 2.0).collect();
        let c2 = abs_cross(&params, &scaled, &cc);
        assert!((c2 / c1 - 4.0).abs() < 1e-12);
    }

    #[test]
    fn invalid_dipole_removes_exactly_its_contribution() {
        let spacing = 2.0;
        let mut all = GeometryBuilder::new([2, 1, 1], spacing);
        all.push([0, 0, 0], true, 0).unwrap();
        all.push([1, 0, 0], true, 0).unwrap();
        let g_all = Arc::new(all.build().unwrap());

        let mut masked = GeometryBuilder::new([2, 1, 1], spacing);
        masked.push([0, 0, 0], true, 0).unwrap();
        masked.push([1, 0, 0], false, 0).unwrap();
        let g_masked = Arc::new(masked.build().unwrap());

        let mut only_second = GeometryBuilder::new([2, 1, 1], spacing);
        only_second.push([0, 0, 0], false, 0).unwrap();
        only_second.push([1, 0, 0], true, 0).unwrap();
        let g_second = Arc::new(only_second.build().unwrap());

        let eps = [Cplx::new(3.0, 0.5)];
        let pvec: Vec<Cplx<f64>> = (0..6)
            .map(|i| Cplx::new(0.2 * (i + 1) as f64, -0.1 * i as f64))
            .collect();

        let c = |g: &Arc<DipoleGeometry>| {
            let params = DdaParams::new(Arc::clone(g), 500.0, 1.0).unwrap();
            let cc = CoupleConstants::from_dielectrics(g, &eps, 1.0, params.wave_num());
            abs_cross(&params, &pvec, &cc)
        };

        let total = c(&g_all);
        let without_second = c(&g_masked);
        let second_only = c(&g_second);
        assert!((total - (without_second + second_only)).abs() < 1e-12 * total.abs());
    }

    #[test]
    fn extinction_of_zero_moments_is_zero() {
        let (params, _) = simple_setup();
        let pvec = vec![Cplx::new(0.0, 0.0); params.cvec_size()];
        let c = ext_cross(&params, &pvec, &IncidentField::default());
        assert_eq!(c, 0.0);
    }

    #[test]
    fn report_layout() {
        let cs = CrossSection::from_ext_abs(200.0, 50.0, 100.0);
        let text = cs.report("x");
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 3);
        assert!(lines[0].starts_with("Cext x = "));
        assert!(lines[0].contains("Qext x = 2.0000000000"));
        assert!(lines[1].contains("Qabs x = 0.5000000000"));
        assert!(lines[2].contains("Qsca x = 1.5000000000"));
        // Cross-section column is padded to a fixed width
        let qpos: Vec<usize> = lines.iter().map(|l| l.find('Q').unwrap()).collect();
        assert!(qpos.iter().all(|&p| p == qpos[0]));
    }

    #[test]
    fn csca_is_ext_minus_abs() {
        let cs = CrossSection::from_ext_abs(10.0, 4.0, 2.0);
        assert_eq!(cs.csca, 6.0);
        assert_eq!(cs.qsca, 3.0);
    }
}
