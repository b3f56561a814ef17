//! Working-precision abstraction.
//!
//! All physics code in Candela is generic over the floating-point scalar so
//! that the f32 and f64 builds share one implementation. The [`Real`] trait
//! collects the bounds that the numeric modules need; it is implemented
//! exactly for the precisions the engine is instantiated at.

use std::fmt::{Debug, Display, LowerExp};

use num_complex::Complex;
use num_traits::{Float, FloatConst, FromPrimitive, NumAssign};

/// Scalar type usable as the working precision of a simulation.
///
/// Implemented for `f32` and `f64`. Code never branches on the precision at
/// runtime; each instantiation is resolved at compile time.
pub trait Real:
    Float
    + FloatConst
    + FromPrimitive
    + NumAssign
    + Debug
    + Display
    + LowerExp
    + Default
    + Send
    + Sync
    + 'static
{
}

impl Real for f32 {}
impl Real for f64 {}

/// Complex number in the working precision.
pub type Cplx<T> = Complex<T>;

/// Convert an `f64` literal to the working precision.
///
/// Infallible for the supported precisions; literals used in the engine are
/// all representable (possibly rounded) in f32.
#[inline]
pub fn real<T: Real>(v: f64) -> T {
    T::from_f64(v).unwrap_or_else(|| panic!("literal {v} not representable in target precision"))
}

/// `e^{i\phi}` as a unit complex number, the phase factor used throughout
/// the far-field evaluation.
#[inline]
pub fn polar<T: Real>(phi: T) -> Cplx<T> {
    Cplx::new(phi.cos(), phi.sin())
}
