//! Aggregated simulation parameters.
//!
//! [`DdaParams`] bundles the wavenumber, the dipole geometry and the layout
//! of the flattened induced-dipole vector (pvec). The pvec uses an
//! axis-block layout: component `j` of dipole `i` lives at `i + j * stride`,
//! with `stride` equal to the dipole count, so the full vector holds
//! `3 * stride` complex values.

use std::sync::Arc;

use crate::checked::CUsize;
use crate::geometry::DipoleGeometry;
use crate::scalar::{real, Cplx, Real};

/// Number of vector components per dipole (x, y, z).
pub const VEC_COMPONENTS: usize = 3;

/// Parameters shared by field evaluation and cross-section computation.
#[derive(Debug, Clone)]
pub struct DdaParams<T> {
    geometry: Arc<DipoleGeometry>,
    /// Wavenumber in the medium, 2π n_m / λ (nm⁻¹).
    wave_num: T,
    /// Wavenumber times lattice spacing (the per-lattice-step phase).
    kd: T,
    /// Per-axis block length of the pvec.
    vec_stride: usize,
    /// Total pvec length, `3 * vec_stride`.
    vec_size: usize,
}

impl<T: Real> DdaParams<T> {
    /// Derive the parameters for a wavelength `lambda_nm` in a medium of
    /// refractive index `n_medium`.
    ///
    /// Panics on a non-positive wavelength; overflow in the vector-size
    /// computation is reported as an error rather than wrapping.
    pub fn new(
        geometry: Arc<DipoleGeometry>,
        lambda_nm: T,
        n_medium: T,
    ) -> Result<Self, crate::checked::OverflowError> {
        assert!(lambda_nm > T::zero(), "wavelength must be positive");
        assert!(n_medium > T::zero(), "medium index must be positive");
        let wave_num = real::<T>(2.0) * T::PI() * n_medium / lambda_nm;
        let kd = wave_num * real(geometry.grid_unit());
        let vec_stride = geometry.nv_count();
        let vec_size = CUsize::new(vec_stride)
            .mul(CUsize::new(VEC_COMPONENTS))?
            .get();
        Ok(Self {
            geometry,
            wave_num,
            kd,
            vec_stride,
            vec_size,
        })
    }

    pub fn geometry(&self) -> &DipoleGeometry {
        &self.geometry
    }

    pub fn geometry_arc(&self) -> Arc<DipoleGeometry> {
        Arc::clone(&self.geometry)
    }

    /// Wavenumber in the medium (nm⁻¹).
    pub fn wave_num(&self) -> T {
        self.wave_num
    }

    /// `wave_num * grid_unit`.
    pub fn kd(&self) -> T {
        self.kd
    }

    /// Number of dipoles (lattice slots).
    pub fn nv_count(&self) -> usize {
        self.geometry.nv_count()
    }

    /// Per-axis block length of the induced-dipole vector.
    pub fn vec_stride(&self) -> usize {
        self.vec_stride
    }

    /// Required length of the induced-dipole vector.
    pub fn cvec_size(&self) -> usize {
        self.vec_size
    }

    /// Component `axis` of dipole `i` from a flattened pvec.
    #[inline]
    pub fn get(&self, pvec: &[Cplx<T>], i: usize, axis: usize) -> Cplx<T> {
        debug_assert!(axis < VEC_COMPONENTS);
        pvec[i + axis * self.vec_stride]
    }

    /// The three components of dipole `i` from a flattened pvec.
    #[inline]
    pub fn get_vec(&self, pvec: &[Cplx<T>], i: usize) -> [Cplx<T>; 3] {
        [
            pvec[i],
            pvec[i + self.vec_stride],
            pvec[i + 2 * self.vec_stride],
        ]
    }

    /// Assert the pvec length invariant. Called by every consumer that
    /// installs a pvec reference.
    pub fn check_pvec(&self, pvec: &[Cplx<T>]) {
        assert!(
            pvec.len() == self.vec_size,
            "induced-dipole vector has length {}, expected {}",
            pvec.len(),
            self.vec_size
        );
    }
}
