//! # Candela Core
//!
//! The numerical backbone of the Candela DDA engine. A scattering particle
//! is discretised into a lattice of polarisable point dipoles; an upstream
//! solver produces the induced dipole moments, and this crate evaluates the
//! derived physical quantities (cross sections, efficiencies) and supplies
//! the orientation representation used for multi-orientation averaging.
//!
//! ## Modules
//!
//! - [`scalar`]: working-precision abstraction (f32/f64).
//! - [`geometry`]: dipole lattice with validity flags and material indices.
//! - [`coupling`]: per-material complex polarisability tensors.
//! - [`params`]: aggregated simulation parameters and pvec indexing.
//! - [`incident`]: plane-wave incident field.
//! - [`cross_section`]: absorption/extinction cross sections and reports.
//! - [`quaternion`], [`rotation`]: orientation representation with ZYZ
//!   Euler conversions.
//! - [`orientation`]: ZYZ sampling grid and cross-section averaging.
//! - [`checked`]: overflow-reporting integer arithmetic.

pub mod checked;
pub mod coupling;
pub mod cross_section;
pub mod geometry;
pub mod incident;
pub mod orientation;
pub mod params;
pub mod quaternion;
pub mod rotation;
pub mod scalar;

pub use coupling::CoupleConstants;
pub use cross_section::CrossSection;
pub use geometry::DipoleGeometry;
pub use incident::IncidentField;
pub use params::DdaParams;
pub use rotation::Rotation;
pub use scalar::Real;
