//! # Candela Storage
//!
//! Hierarchical array persistence for simulation datasets. Numeric
//! sequences (induced-dipole vectors, coupling tables, sampled directions)
//! are stored as one-dimensional datasets in an NPZ archive; dataset names
//! are `group/name` paths, and the element count of every dataset is
//! recovered from the NPY shape metadata rather than an auxiliary length
//! field. Round-trips are bit-identical for the stored element type.
//!
//! Per-type storage capability is expressed through the [`StorableScalar`]
//! trait and resolved at compile time; there is no runtime type registry.

mod records;
mod store;

pub use records::Vec3Record;
pub use store::{ArrayStoreReader, ArrayStoreWriter, StorableScalar, StorageError};
