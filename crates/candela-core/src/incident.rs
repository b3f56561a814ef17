//! Incident plane-wave specification.

use crate::scalar::{polar, real, Cplx, Real};

/// An incident plane wave.
#[derive(Debug, Clone)]
pub struct IncidentField<T> {
    /// Propagation direction (unit vector).
    pub direction: [T; 3],
    /// Polarisation vector (unit vector, perpendicular to direction).
    pub polarisation: [T; 3],
    /// Amplitude. Typically 1 for cross-section calculations.
    pub amplitude: T,
}

impl<T: Real> Default for IncidentField<T> {
    fn default() -> Self {
        Self {
            // z-propagating, x-polarised
            direction: [T::zero(), T::zero(), T::one()],
            polarisation: [T::one(), T::zero(), T::zero()],
            amplitude: T::one(),
        }
    }
}

impl<T: Real> IncidentField<T> {
    /// Evaluate the incident field at a position (nm), for wavenumber `k`.
    ///
    /// `E(r) = E₀ ê exp(i k·r)`
    pub fn at_position(&self, position: [T; 3], k: T) -> [Cplx<T>; 3] {
        let kdotr = k
            * (self.direction[0] * position[0]
                + self.direction[1] * position[1]
                + self.direction[2] * position[2]);
        let phase = polar(kdotr) * self.amplitude;
        [
            phase * self.polarisation[0],
            phase * self.polarisation[1],
            phase * self.polarisation[2],
        ]
    }

    /// The field rotated into a particle orientation: both the propagation
    /// and polarisation directions are rotated by the inverse orientation
    /// (rotating the beam instead of the particle).
    pub fn in_particle_frame(&self, orientation: &crate::rotation::Rotation<T>) -> Self {
        let inv = orientation.inverse();
        Self {
            direction: inv.rotate(self.direction),
            polarisation: inv.rotate(self.polarisation),
            amplitude: self.amplitude,
        }
    }

    /// |E₀|².
    pub fn amplitude_sq(&self) -> T {
        self.amplitude * self.amplitude
    }

    /// Assert the incident geometry is physically meaningful: both vectors
    /// unit length and mutually orthogonal.
    pub fn validate(&self) {
        let n2 = dot(self.direction, self.direction);
        let p2 = dot(self.polarisation, self.polarisation);
        let np = dot(self.direction, self.polarisation);
        let tol: T = real(1e-6);
        assert!((n2 - T::one()).abs() < tol, "direction must be unit length");
        assert!(
            (p2 - T::one()).abs() < tol,
            "polarisation must be unit length"
        );
        assert!(
            np.abs() < tol,
            "polarisation must be perpendicular to direction"
        );
    }
}

#[inline]
fn dot<T: Real>(a: [T; 3], b: [T; 3]) -> T {
    a[0] * b[0] + a[1] * b[1] + a[2] * b[2]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rotation::Rotation;

    #[test]
    fn default_field_at_origin_is_polarisation() {
        let f = IncidentField::<f64>::default();
        let e = f.at_position([0.0, 0.0, 0.0], 0.01);
        assert_eq!(e[0], Cplx::new(1.0, 0.0));
        assert_eq!(e[1], Cplx::new(0.0, 0.0));
    }

    #[test]
    fn phase_advances_along_propagation() {
        let f = IncidentField::<f64>::default();
        let k = 0.01;
        let z = std::f64::consts::PI / (2.0 * k); // quarter wave
        let e = f.at_position([0.0, 0.0, z], k);
        assert!(e[0].re.abs() < 1e-12);
        assert!((e[0].im - 1.0).abs() < 1e-12);
    }

    #[test]
    fn particle_frame_field_stays_orthonormal() {
        let f = IncidentField::<f64>::default();
        let r = Rotation::from_zyz_deg(30.0, 60.0, 10.0);
        let g = f.in_particle_frame(&r);
        g.validate();
    }
}
