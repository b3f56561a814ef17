//! # Candela Compute
//!
//! Far-field evaluation backends for the Candela DDA engine. The
//! [`FieldCalculator`](backend::FieldCalculator) trait isolates the physics
//! and driver code from how the per-dipole summation is executed.
//!
//! ## Available backends
//!
//! | Backend | Selection | Execution |
//! |---------|-----------|-----------|
//! | Direct | [`BackendKind::Direct`](backend::BackendKind) | single-threaded summation with phase-table reuse |
//! | Offloaded | [`BackendKind::Offloaded`](backend::BackendKind) | chunked dispatch to a parallel pool, sync/async policy |
//!
//! Both backends are numerically equivalent for identical inputs; this is a
//! correctness requirement, validated by the cross-backend tests.

pub mod backend;
pub mod direct;
pub mod kernel;
pub mod offload;

pub use backend::{create_field_calculator, BackendKind, ComputeError, FieldCalculator, SyncPolicy};
pub use direct::DirectFieldCalculator;
pub use offload::OffloadFieldCalculator;
