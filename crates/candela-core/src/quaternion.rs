//! A quaternion over the working precision.
//!
//! Minimal value type backing [`crate::rotation::Rotation`]. Components are
//! named `(a, b, c, d)` for `a + b i + c j + d k`.

use std::ops::{Add, Div, Mul, Neg, Sub};

use crate::scalar::Real;

/// Quaternion `a + b i + c j + d k`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Quaternion<T> {
    pub a: T,
    pub b: T,
    pub c: T,
    pub d: T,
}

impl<T: Real> Quaternion<T> {
    pub fn new(a: T, b: T, c: T, d: T) -> Self {
        Self { a, b, c, d }
    }

    /// The multiplicative identity `1 + 0i + 0j + 0k`.
    pub fn one() -> Self {
        Self::new(T::one(), T::zero(), T::zero(), T::zero())
    }

    pub fn conjugate(self) -> Self {
        Self::new(self.a, -self.b, -self.c, -self.d)
    }

    /// Squared norm `a² + b² + c² + d²`.
    pub fn abs2(self) -> T {
        self.a * self.a + self.b * self.b + self.c * self.c + self.d * self.d
    }

    pub fn abs(self) -> T {
        self.abs2().sqrt()
    }
}

impl<T: Real> Add for Quaternion<T> {
    type Output = Self;
    fn add(self, r: Self) -> Self {
        Self::new(self.a + r.a, self.b + r.b, self.c + r.c, self.d + r.d)
    }
}

impl<T: Real> Sub for Quaternion<T> {
    type Output = Self;
    fn sub(self, r: Self) -> Self {
        Self::new(self.a - r.a, self.b - r.b, self.c - r.c, self.d - r.d)
    }
}

impl<T: Real> Neg for Quaternion<T> {
    type Output = Self;
    fn neg(self) -> Self {
        Self::new(-self.a, -self.b, -self.c, -self.d)
    }
}

/// Hamilton product.
impl<T: Real> Mul for Quaternion<T> {
    type Output = Self;
    fn mul(self, r: Self) -> Self {
        Self::new(
            self.a * r.a - self.b * r.b - self.c * r.c - self.d * r.d,
            self.a * r.b + self.b * r.a + self.c * r.d - self.d * r.c,
            self.a * r.c - self.b * r.d + self.c * r.a + self.d * r.b,
            self.a * r.d + self.b * r.c - self.c * r.b + self.d * r.a,
        )
    }
}

impl<T: Real> Mul<T> for Quaternion<T> {
    type Output = Self;
    fn mul(self, s: T) -> Self {
        Self::new(self.a * s, self.b * s, self.c * s, self.d * s)
    }
}

impl<T: Real> Div<T> for Quaternion<T> {
    type Output = Self;
    fn div(self, s: T) -> Self {
        Self::new(self.a / s, self.b / s, self.c / s, self.d / s)
    }
}
