//! Fixed-layout record types shared with the storage format.

use bytemuck::{Pod, Zeroable};

/// A 3-component real record (x, y, z) for geometric vectors.
///
/// Laid out as three consecutive same-precision values with no implicit
/// padding, so a `[Vec3Record<T>]` slice reinterprets exactly as a flat
/// `[T]` sequence of 3N scalars.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Vec3Record<T> {
    pub x: T,
    pub y: T,
    pub z: T,
}

impl<T> Vec3Record<T> {
    pub fn new(x: T, y: T, z: T) -> Self {
        Self { x, y, z }
    }
}

impl<T: Copy> From<[T; 3]> for Vec3Record<T> {
    fn from(v: [T; 3]) -> Self {
        Self::new(v[0], v[1], v[2])
    }
}

impl<T: Copy> From<Vec3Record<T>> for [T; 3] {
    fn from(v: Vec3Record<T>) -> Self {
        [v.x, v.y, v.z]
    }
}

// Three scalars in repr(C) with identical alignment cannot introduce
// padding, so the Pod contract holds for the supported precisions.
unsafe impl Zeroable for Vec3Record<f32> {}
unsafe impl Pod for Vec3Record<f32> {}
unsafe impl Zeroable for Vec3Record<f64> {}
unsafe impl Pod for Vec3Record<f64> {}
