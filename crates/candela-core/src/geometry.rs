//! Dipole lattice geometry.
//!
//! A particle is represented on a regular cubic lattice. Every lattice site
//! that belongs to the particle carries a validity flag and the index of its
//! material in the coupling-constant table. The geometry is immutable after
//! construction: it is built through [`GeometryBuilder`] (or one of the
//! primitive constructors) and then shared read-only across concurrent
//! orientation evaluations.

use thiserror::Error;

/// Errors raised while assembling a dipole lattice.
#[derive(Debug, Error)]
pub enum GeometryError {
    #[error("dipole grid position {pos:?} outside lattice box {box_size:?}")]
    OutsideBox { pos: [u32; 3], box_size: [u32; 3] },

    #[error("geometry contains no valid dipoles")]
    Empty,
}

/// Per-dipole validity flags and material assignment over a fixed lattice.
#[derive(Debug, Clone)]
pub struct DipoleGeometry {
    /// Size of the bounding box around the dipoles, in lattice units.
    box_size: [u32; 3],
    /// Physical position of the dipole at grid position (0,0,0), in nm.
    origin: [f64; 3],
    /// Lattice spacing d, in nm.
    grid_unit: f64,
    /// Grid coordinates of each dipole.
    positions: Vec<[u32; 3]>,
    /// Validity flag per dipole. Invalid dipoles occupy a lattice slot but
    /// contribute to no physical quantity.
    valid: Vec<bool>,
    /// Material table index per dipole; meaningful only where `valid`.
    material_index: Vec<u8>,
    /// Number of materials referenced (max valid material index + 1).
    mat_count: usize,
    /// Number of valid dipoles.
    valid_count: usize,
}

impl DipoleGeometry {
    /// Total number of dipoles (lattice slots), valid or not.
    pub fn nv_count(&self) -> usize {
        self.positions.len()
    }

    pub fn valid_count(&self) -> usize {
        self.valid_count
    }

    pub fn box_size(&self) -> [u32; 3] {
        self.box_size
    }

    pub fn grid_unit(&self) -> f64 {
        self.grid_unit
    }

    /// Position of the dipole at grid position (0,0,0) in the particle
    /// reference frame (nm).
    pub fn origin(&self) -> [f64; 3] {
        self.origin
    }

    pub fn positions(&self) -> &[[u32; 3]] {
        &self.positions
    }

    pub fn valid(&self) -> &[bool] {
        &self.valid
    }

    pub fn is_valid(&self, i: usize) -> bool {
        self.valid[i]
    }

    pub fn material_index(&self, i: usize) -> u8 {
        self.material_index[i]
    }

    pub fn mat_count(&self) -> usize {
        self.mat_count
    }

    /// Physical position of dipole `i` (nm).
    pub fn physical_position(&self, i: usize) -> [f64; 3] {
        let p = self.positions[i];
        [
            self.origin[0] + p[0] as f64 * self.grid_unit,
            self.origin[1] + p[1] as f64 * self.grid_unit,
            self.origin[2] + p[2] as f64 * self.grid_unit,
        ]
    }

    /// Volume-equivalent effective radius `(3 N d³ / 4π)^{1/3}` (nm),
    /// counting valid dipoles only.
    pub fn effective_radius(&self) -> f64 {
        let vol = self.valid_count as f64 * self.grid_unit.powi(3);
        (3.0 * vol / (4.0 * std::f64::consts::PI)).cbrt()
    }

    /// Geometric cross-sectional area `π a_eff²` (nm²), the normalisation
    /// for efficiencies.
    pub fn geometric_cross_section(&self) -> f64 {
        let a = self.effective_radius();
        std::f64::consts::PI * a * a
    }

    /// A solid sphere of the given radius (nm), discretised with spacing
    /// `grid_unit` (nm), all dipoles assigned `material`.
    pub fn sphere(radius: f64, grid_unit: f64, material: u8) -> Result<Self, GeometryError> {
        let n = (2.0 * radius / grid_unit).ceil() as u32 + 1;
        let mut builder = GeometryBuilder::new([n, n, n], grid_unit);
        let centre = (n - 1) as f64 / 2.0;
        for iz in 0..n {
            for iy in 0..n {
                for ix in 0..n {
                    let dx = (ix as f64 - centre) * grid_unit;
                    let dy = (iy as f64 - centre) * grid_unit;
                    let dz = (iz as f64 - centre) * grid_unit;
                    if dx * dx + dy * dy + dz * dz <= radius * radius {
                        builder.push([ix, iy, iz], true, material)?;
                    }
                }
            }
        }
        builder.build()
    }

    /// A solid axis-aligned cuboid of `extent` lattice sites per axis.
    pub fn cuboid(extent: [u32; 3], grid_unit: f64, material: u8) -> Result<Self, GeometryError> {
        let mut builder = GeometryBuilder::new(extent, grid_unit);
        for iz in 0..extent[2] {
            for iy in 0..extent[1] {
                for ix in 0..extent[0] {
                    builder.push([ix, iy, iz], true, material)?;
                }
            }
        }
        builder.build()
    }
}

/// Accumulates dipoles in lattice order and produces an immutable
/// [`DipoleGeometry`].
#[derive(Debug)]
pub struct GeometryBuilder {
    box_size: [u32; 3],
    grid_unit: f64,
    positions: Vec<[u32; 3]>,
    valid: Vec<bool>,
    material_index: Vec<u8>,
}

impl GeometryBuilder {
    pub fn new(box_size: [u32; 3], grid_unit: f64) -> Self {
        assert!(grid_unit > 0.0, "lattice spacing must be positive");
        Self {
            box_size,
            grid_unit,
            positions: Vec::new(),
            valid: Vec::new(),
            material_index: Vec::new(),
        }
    }

    /// Append a dipole. Dipoles must be pushed in z-major lattice order
    /// (x fastest) so the field evaluation's per-layer phase reuse applies.
    pub fn push(&mut self, pos: [u32; 3], valid: bool, material: u8) -> Result<(), GeometryError> {
        if pos[0] >= self.box_size[0] || pos[1] >= self.box_size[1] || pos[2] >= self.box_size[2] {
            return Err(GeometryError::OutsideBox {
                pos,
                box_size: self.box_size,
            });
        }
        self.positions.push(pos);
        self.valid.push(valid);
        self.material_index.push(material);
        Ok(())
    }

    /// Finish construction, centring the particle on the lattice origin.
    pub fn build(self) -> Result<DipoleGeometry, GeometryError> {
        let valid_count = self.valid.iter().filter(|&&v| v).count();
        if valid_count == 0 {
            return Err(GeometryError::Empty);
        }
        let mat_count = self
            .material_index
            .iter()
            .zip(&self.valid)
            .filter(|&(_, &v)| v)
            .map(|(&m, _)| m as usize)
            .max()
            .unwrap_or(0)
            + 1;
        // Centre of the box maps to the physical origin
        let origin = [
            -((self.box_size[0] - 1) as f64) / 2.0 * self.grid_unit,
            -((self.box_size[1] - 1) as f64) / 2.0 * self.grid_unit,
            -((self.box_size[2] - 1) as f64) / 2.0 * self.grid_unit,
        ];
        Ok(DipoleGeometry {
            box_size: self.box_size,
            origin,
            grid_unit: self.grid_unit,
            positions: self.positions,
            valid: self.valid,
            material_index: self.material_index,
            mat_count,
            valid_count,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sphere_is_centred_and_nonempty() {
        let g = DipoleGeometry::sphere(8.0, 2.0, 0).unwrap();
        assert!(g.valid_count() > 0);
        // Centre of mass of the lattice should sit near the origin
        let mut com = [0.0; 3];
        for i in 0..g.nv_count() {
            let p = g.physical_position(i);
            for a in 0..3 {
                com[a] += p[a];
            }
        }
        for c in &mut com {
            *c /= g.nv_count() as f64;
        }
        assert!(com[0].abs() < 1e-9 && com[1].abs() < 1e-9 && com[2].abs() < 1e-9);
    }

    #[test]
    fn cuboid_counts_every_site() {
        let g = DipoleGeometry::cuboid([3, 4, 5], 1.0, 0).unwrap();
        assert_eq!(g.nv_count(), 60);
        assert_eq!(g.valid_count(), 60);
        assert_eq!(g.mat_count(), 1);
    }

    #[test]
    fn out_of_box_position_is_rejected() {
        let mut b = GeometryBuilder::new([2, 2, 2], 1.0);
        assert!(b.push([2, 0, 0], true, 0).is_err());
    }

    #[test]
    fn empty_geometry_is_rejected() {
        let b = GeometryBuilder::new([2, 2, 2], 1.0);
        assert!(matches!(b.build(), Err(GeometryError::Empty)));
    }

    #[test]
    fn mat_count_tracks_valid_dipoles_only() {
        let mut b = GeometryBuilder::new([2, 1, 1], 1.0);
        b.push([0, 0, 0], true, 1).unwrap();
        b.push([1, 0, 0], false, 7).unwrap();
        let g = b.build().unwrap();
        assert_eq!(g.mat_count(), 2);
    }

    #[test]
    fn effective_radius_of_unit_cell() {
        let g = DipoleGeometry::cuboid([1, 1, 1], 1.0, 0).unwrap();
        let expected = (3.0 / (4.0 * std::f64::consts::PI)).cbrt();
        assert!((g.effective_radius() - expected).abs() < 1e-12);
    }
}
