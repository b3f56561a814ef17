//! Orientation of a particle in 3D space, represented by a unit quaternion.
//!
//! ZYZ Euler angles are the interchange format used by orientation sampling
//! and by job configuration. Euler extraction is not unique at gimbal lock,
//! so rotations are compared with [`Rotation::squared_difference`], which is
//! insensitive to both the Euler degeneracy and the quaternion double cover
//! (q and −q encode the same physical rotation).

use crate::quaternion::Quaternion;
use crate::scalar::{real, Real};

/// A rotation in 3D space.
///
/// Invariant: the stored quaternion has unit norm. Construction normalises
/// and asserts that the input is already close to unit length; a quaternion
/// far from unit norm is a programming error.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rotation<T> {
    q: Quaternion<T>,
}

impl<T: Real> Rotation<T> {
    /// The identity rotation.
    pub fn none() -> Self {
        Self {
            q: Quaternion::one(),
        }
    }

    pub fn new(q: Quaternion<T>) -> Self {
        let len = q.abs();
        assert!(
            len >= real(0.99) && len <= real(1.01),
            "quaternion norm {len:?} too far from 1"
        );
        Self { q: q / len }
    }

    pub fn quaternion(&self) -> Quaternion<T> {
        self.q
    }

    /// Apply the rotation to a vector.
    pub fn rotate(&self, v: [T; 3]) -> [T; 3] {
        let p = Quaternion::new(T::zero(), v[0], v[1], v[2]);
        let r = self.q * p * self.q.conjugate();
        [r.b, r.c, r.d]
    }

    /// Compose two rotations: `self` applied after `r`.
    pub fn compose(&self, r: Rotation<T>) -> Self {
        Self::new(self.q * r.q)
    }

    pub fn inverse(&self) -> Self {
        Self::new(self.q.conjugate())
    }

    pub fn from_axis_angle(axis: [T; 3], rad: T) -> Self {
        let half = rad / real(2.0);
        let (sin, cos) = (half.sin(), half.cos());
        Self::new(Quaternion::new(
            cos,
            axis[0] * sin,
            axis[1] * sin,
            axis[2] * sin,
        ))
    }

    /// Construct from intrinsic Z-Y-Z Euler angles (radians).
    pub fn from_zyz(alpha: T, beta: T, gamma: T) -> Self {
        let z = [T::zero(), T::zero(), T::one()];
        let y = [T::zero(), T::one(), T::zero()];
        Self::from_axis_angle(z, alpha)
            .compose(Self::from_axis_angle(y, beta))
            .compose(Self::from_axis_angle(z, gamma))
    }

    /// Construct from intrinsic Z-Y-Z Euler angles (degrees).
    pub fn from_zyz_deg(alpha: T, beta: T, gamma: T) -> Self {
        let f = T::PI() / real(180.0);
        Self::from_zyz(alpha * f, beta * f, gamma * f)
    }

    /// Extract Z-Y-Z Euler angles (radians).
    ///
    /// Approximate inverse of [`from_zyz`](Self::from_zyz). At gimbal lock
    /// (β ≈ 0 or π) only α ± γ is determined; the degenerate angle is
    /// reported as zero.
    pub fn to_zyz(&self) -> (T, T, T) {
        let q = self.q;
        let two = real::<T>(2.0);
        // Rotation matrix elements, columns indexed second:
        // (m11 m21 m31)
        // (m12 m22 m32)
        // (m13 m23 m33)
        let m33 = T::one() - two * q.b * q.b - two * q.c * q.c;
        let eps: T = real(1e-6); // cos β within ~0.08° of ±1
        if m33 > T::one() - eps {
            // m33 = cos β ≈ 1: m11 = cos(α+γ), m12 = sin(α+γ)
            let m11 = T::one() - two * q.c * q.c - two * q.d * q.d;
            let m12 = two * q.b * q.c + two * q.a * q.d;
            (m12.atan2(m11), T::zero(), T::zero())
        } else if m33 < -T::one() + eps {
            // m33 = cos β ≈ -1: m11 = -cos(α-γ), m12 = -sin(α-γ)
            let m11 = T::one() - two * q.c * q.c - two * q.d * q.d;
            let m12 = two * q.b * q.c + two * q.a * q.d;
            ((-m12).atan2(-m11), T::PI(), T::zero())
        } else {
            let m13 = two * q.b * q.d - two * q.a * q.c;
            let m23 = two * q.c * q.d + two * q.a * q.b;
            let m31 = two * q.b * q.d + two * q.a * q.c;
            let m32 = two * q.c * q.d - two * q.a * q.b;
            (m32.atan2(m31), m33.acos(), m23.atan2(-m13))
        }
    }

    /// Extract Z-Y-Z Euler angles (degrees).
    pub fn to_zyz_deg(&self) -> (T, T, T) {
        let (alpha, beta, gamma) = self.to_zyz();
        let f = real::<T>(180.0) / T::PI();
        (alpha * f, beta * f, gamma * f)
    }

    /// Squared distance between two rotations.
    ///
    /// Near zero for physically identical rotations, including when the two
    /// quaternions differ by sign: the relative rotation is sign-aligned
    /// before comparison against the identity, so the double cover never
    /// registers as a difference.
    pub fn squared_difference(&self, r: Rotation<T>) -> T {
        let mut diff = (r.compose(self.inverse())).q;
        if diff.a < T::zero() {
            // Map (-1, 0, 0, 0) to (1, 0, 0, 0)
            diff = -diff;
        }
        (diff - Quaternion::one()).abs2()
    }
}
