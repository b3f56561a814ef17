//! Direct single-threaded far-field summation.
//!
//! Walks the dipole list once per direction. Phase factors are factorised
//! per lattice axis: the x-layer phases are tabulated up front, and the y/z
//! phases are reused while consecutive dipoles share a lattice row, which
//! they do when the geometry was filled in lattice order.

use candela_core::params::DdaParams;
use candela_core::scalar::{polar, real, Cplx, Real};

use crate::backend::{check_direction, project_far_field, FieldCalculator};

/// CPU backend performing the direct per-dipole summation.
pub struct DirectFieldCalculator<'p, T> {
    params: &'p DdaParams<T>,
    pvec: Option<&'p [Cplx<T>]>,
    /// Phase table e^{-i kd n_x x} for every x layer, rebuilt per direction.
    x_values: Vec<Cplx<T>>,
}

impl<'p, T: Real> DirectFieldCalculator<'p, T> {
    pub fn new(params: &'p DdaParams<T>) -> Self {
        let box_x = params.geometry().box_size()[0] as usize;
        Self {
            params,
            pvec: None,
            x_values: vec![Cplx::new(T::zero(), T::zero()); box_x],
        }
    }
}

impl<'p, T: Real> FieldCalculator<'p, T> for DirectFieldCalculator<'p, T> {
    fn set_pvec(&mut self, pvec: &'p [Cplx<T>]) {
        self.params.check_pvec(pvec);
        self.pvec = Some(pvec);
    }

    fn calc_field(&mut self, n: [T; 3]) -> [Cplx<T>; 3] {
        check_direction(n);
        let pvec = self.pvec.expect("no induced-dipole vector installed");

        let params = self.params;
        let geometry = params.geometry();
        let nv_count = params.nv_count();
        let kd = params.kd();
        let positions = geometry.positions();
        let valid = geometry.valid();
        debug_assert_eq!(positions.len(), nv_count);
        debug_assert_eq!(valid.len(), nv_count);

        for (ix, v) in self.x_values.iter_mut().enumerate() {
            *v = polar(-kd * n[0] * real(ix as f64));
        }

        let mut sum = [Cplx::new(T::zero(), T::zero()); 3];

        // Previous row indices; u32::MAX forces the first recompute
        let mut iy1 = u32::MAX;
        let mut iz1 = u32::MAX;
        let mut tmp = Cplx::new(T::zero(), T::zero());
        let mut tmp_z = Cplx::new(T::zero(), T::zero());

        for j in 0..nv_count {
            if valid[j] {
                let pos = positions[j];
                if pos[1] != iy1 || pos[2] != iz1 {
                    if pos[2] != iz1 {
                        iz1 = pos[2];
                        tmp_z = polar(-kd * n[2] * real(iz1 as f64));
                    }
                    iy1 = pos[1];
                    tmp = polar(-kd * n[1] * real(iy1 as f64)) * tmp_z;
                }
                let a = tmp * self.x_values[pos[0] as usize];
                let p = params.get_vec(pvec, j);
                sum[0] += p[0] * a;
                sum[1] += p[1] * a;
                sum[2] += p[2] * a;
            }
        }

        project_far_field(params, n, sum)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use candela_core::geometry::DipoleGeometry;
    use std::sync::Arc;

    #[test]
    fn single_dipole_field_is_transverse() {
        let g = Arc::new(DipoleGeometry::cuboid([1, 1, 1], 1.0, 0).unwrap());
        let params = DdaParams::new(g, 500.0f64, 1.0).unwrap();
        let pvec = vec![
            Cplx::new(1.0, 0.0),
            Cplx::new(0.5, -0.25),
            Cplx::new(0.0, 2.0),
        ];
        let mut calc = DirectFieldCalculator::new(&params);
        calc.set_pvec(&pvec);

        let inv_sqrt3 = 1.0 / 3.0f64.sqrt();
        let n = [inv_sqrt3, inv_sqrt3, inv_sqrt3];
        let e = calc.calc_field(n);
        // n . E must vanish after the transverse projection
        let ndote = e[0] * n[0] + e[1] * n[1] + e[2] * n[2];
        approx::assert_abs_diff_eq!(ndote.norm(), 0.0, epsilon = 1e-12);
    }

    #[test]
    fn invalid_dipoles_do_not_radiate() {
        use candela_core::geometry::GeometryBuilder;

        let mut b = GeometryBuilder::new([2, 1, 1], 1.0);
        b.push([0, 0, 0], true, 0).unwrap();
        b.push([1, 0, 0], false, 0).unwrap();
        let g = Arc::new(b.build().unwrap());
        let params = DdaParams::new(g, 500.0f64, 1.0).unwrap();

        // Huge moments on the invalid dipole must not show up
        let mut pvec = vec![Cplx::new(0.0, 0.0); params.cvec_size()];
        pvec[0] = Cplx::new(1.0, 0.0);
        pvec[1] = Cplx::new(1e12, 1e12);
        pvec[3] = Cplx::new(1e12, 1e12);
        pvec[5] = Cplx::new(1e12, 1e12);

        let mut calc = DirectFieldCalculator::new(&params);
        calc.set_pvec(&pvec);
        let e = calc.calc_field([0.0, 1.0, 0.0]);
        assert!(e[0].norm() < 1e6); // k² amplitude scale, nowhere near 1e12
    }

    #[test]
    #[should_panic(expected = "unit vector")]
    fn non_unit_direction_is_fatal() {
        let g = Arc::new(DipoleGeometry::cuboid([1, 1, 1], 1.0, 0).unwrap());
        let params = DdaParams::new(g, 500.0f64, 1.0).unwrap();
        let pvec = vec![Cplx::new(0.0, 0.0); 3];
        let mut calc = DirectFieldCalculator::new(&params);
        calc.set_pvec(&pvec);
        calc.calc_field([0.0, 0.0, 2.0]);
    }

    #[test]
    #[should_panic(expected = "induced-dipole vector has length")]
    fn wrong_pvec_length_is_fatal() {
        let g = Arc::new(DipoleGeometry::cuboid([2, 2, 2], 1.0, 0).unwrap());
        let params = DdaParams::new(g, 500.0f64, 1.0).unwrap();
        let pvec = vec![Cplx::new(0.0, 0.0); 7];
        let mut calc = DirectFieldCalculator::new(&params);
        calc.set_pvec(&pvec);
    }
}
