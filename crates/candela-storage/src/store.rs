//! NPZ-backed dataset store.

use std::fs::File;
use std::path::Path;

use bytemuck::Pod;
use candela_core::checked::{CUsize, OverflowError};
use ndarray::{Array1, ArrayView1};
use ndarray_npy::{ReadNpzError, ReadableElement, WritableElement, WriteNpzError};
use num_complex::Complex;
use thiserror::Error;

use crate::records::Vec3Record;

/// Errors from the storage collaborator. Failures are unrecoverable for the
/// operation at hand; the failing dataset name is carried in the message.
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("failed to open archive: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to write dataset: {0}")]
    Write(#[from] WriteNpzError),

    #[error("failed to read dataset: {0}")]
    Read(#[from] ReadNpzError),

    #[error("dataset {name} has {len} scalars, not a whole number of 3-component records")]
    NotVec3 { name: String, len: usize },

    #[error("complex dataset {name} has mismatched re/im component lengths")]
    ComponentMismatch { name: String },

    #[error("dataset size computation overflowed")]
    Overflow(#[from] OverflowError),
}

/// Scalar types the store can persist, resolved at compile time.
pub trait StorableScalar: WritableElement + ReadableElement + Copy + 'static {}

impl StorableScalar for f32 {}
impl StorableScalar for f64 {}
impl StorableScalar for i8 {}
impl StorableScalar for i16 {}
impl StorableScalar for i32 {}
impl StorableScalar for i64 {}
impl StorableScalar for u8 {}
impl StorableScalar for u16 {}
impl StorableScalar for u32 {}
impl StorableScalar for u64 {}

/// Writes named 1-D datasets into an NPZ archive.
///
/// Dataset names may be hierarchical (`group/name`). The writer must be
/// [`finish`](Self::finish)ed for the archive to be valid.
pub struct ArrayStoreWriter {
    npz: ndarray_npy::NpzWriter<File>,
}

impl ArrayStoreWriter {
    pub fn create(path: &Path) -> Result<Self, StorageError> {
        let file = File::create(path)?;
        Ok(Self {
            npz: ndarray_npy::NpzWriter::new(file),
        })
    }

    /// Store a flat scalar sequence. The element count is carried by the
    /// dataset's shape metadata; nothing else is written.
    pub fn put_scalars<T: StorableScalar>(
        &mut self,
        name: &str,
        data: &[T],
    ) -> Result<(), StorageError> {
        self.npz.add_array(name, &ArrayView1::from(data))?;
        Ok(())
    }

    /// Store a complex sequence as `name/re` and `name/im` component
    /// datasets.
    pub fn put_complex<T: StorableScalar>(
        &mut self,
        name: &str,
        data: &[Complex<T>],
    ) -> Result<(), StorageError> {
        let re: Vec<T> = data.iter().map(|z| z.re).collect();
        let im: Vec<T> = data.iter().map(|z| z.im).collect();
        self.put_scalars(&format!("{name}/re"), &re)?;
        self.put_scalars(&format!("{name}/im"), &im)
    }

    /// Store a sequence of 3-component records as a flat 3N scalar dataset.
    pub fn put_vec3<T>(&mut self, name: &str, data: &[Vec3Record<T>]) -> Result<(), StorageError>
    where
        T: StorableScalar + Pod,
        Vec3Record<T>: Pod,
    {
        // Padding-free layout makes this a pure reinterpretation
        let flat: &[T] = bytemuck::cast_slice(data);
        self.put_scalars(name, flat)
    }

    pub fn finish(self) -> Result<(), StorageError> {
        self.npz.finish()?;
        Ok(())
    }
}

/// Reads named 1-D datasets back from an NPZ archive.
pub struct ArrayStoreReader {
    npz: ndarray_npy::NpzReader<File>,
}

impl ArrayStoreReader {
    pub fn open(path: &Path) -> Result<Self, StorageError> {
        let file = File::open(path)?;
        Ok(Self {
            npz: ndarray_npy::NpzReader::new(file)?,
        })
    }

    /// Names of all datasets in the archive.
    pub fn names(&mut self) -> Result<Vec<String>, StorageError> {
        Ok(self.npz.names()?)
    }

    /// Read a flat scalar sequence; the length comes from the stored shape.
    pub fn get_scalars<T: StorableScalar>(&mut self, name: &str) -> Result<Vec<T>, StorageError> {
        // Zip entries carry a `.npy` suffix; accept either spelling.
        let arr: Array1<T> = match self.npz.by_name(name) {
            Ok(arr) => arr,
            Err(ReadNpzError::Zip(_)) => self.npz.by_name(&format!("{name}.npy"))?,
            Err(e) => return Err(e.into()),
        };
        Ok(arr.to_vec())
    }

    /// Read a complex sequence stored by
    /// [`put_complex`](ArrayStoreWriter::put_complex).
    pub fn get_complex<T: StorableScalar>(
        &mut self,
        name: &str,
    ) -> Result<Vec<Complex<T>>, StorageError> {
        let re = self.get_scalars::<T>(&format!("{name}/re"))?;
        let im = self.get_scalars::<T>(&format!("{name}/im"))?;
        if re.len() != im.len() {
            return Err(StorageError::ComponentMismatch {
                name: name.to_owned(),
            });
        }
        Ok(re
            .into_iter()
            .zip(im)
            .map(|(re, im)| Complex::new(re, im))
            .collect())
    }

    /// Read a 3-component record sequence stored by
    /// [`put_vec3`](ArrayStoreWriter::put_vec3).
    pub fn get_vec3<T>(&mut self, name: &str) -> Result<Vec<Vec3Record<T>>, StorageError>
    where
        T: StorableScalar + Pod,
        Vec3Record<T>: Pod,
    {
        let flat = self.get_scalars::<T>(name)?;
        let count = CUsize::new(flat.len()).div(CUsize::new(3))?;
        if count.mul(CUsize::new(3))?.get() != flat.len() {
            return Err(StorageError::NotVec3 {
                name: name.to_owned(),
                len: flat.len(),
            });
        }
        Ok(bytemuck::cast_slice(&flat).to_vec())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tmp_archive(name: &str) -> std::path::PathBuf {
        tempfile::tempdir()
            .expect("create temp dir")
            .keep()
            .join(name)
    }

    fn roundtrip_f64(n: usize) {
        let path = tmp_archive("roundtrip.npz");
        let data: Vec<f64> = (0..n).map(|i| (i as f64 * 0.1).sin() * 1e-7).collect();

        let mut w = ArrayStoreWriter::create(&path).unwrap();
        w.put_scalars("pvec/real", &data).unwrap();
        w.finish().unwrap();

        let mut r = ArrayStoreReader::open(&path).unwrap();
        let back = r.get_scalars::<f64>("pvec/real").unwrap();
        assert_eq!(back.len(), n);
        // Bit-identical, not approximately equal
        for (a, b) in data.iter().zip(&back) {
            assert_eq!(a.to_bits(), b.to_bits());
        }
    }

    #[test]
    fn scalar_roundtrip_empty() {
        roundtrip_f64(0);
    }

    #[test]
    fn scalar_roundtrip_single() {
        roundtrip_f64(1);
    }

    #[test]
    fn scalar_roundtrip_thousand() {
        roundtrip_f64(1000);
    }

    #[test]
    fn length_is_recovered_from_shape_metadata() {
        let path = tmp_archive("shape.npz");
        let mut w = ArrayStoreWriter::create(&path).unwrap();
        w.put_scalars("a", &[1.0f32, 2.0, 3.0]).unwrap();
        w.put_scalars("b", &[7u32; 42]).unwrap();
        w.finish().unwrap();

        let mut r = ArrayStoreReader::open(&path).unwrap();
        assert_eq!(r.get_scalars::<f32>("a").unwrap().len(), 3);
        assert_eq!(r.get_scalars::<u32>("b").unwrap().len(), 42);
    }

    #[test]
    fn complex_roundtrip() {
        let path = tmp_archive("complex.npz");
        let data: Vec<Complex<f64>> = (0..17)
            .map(|i| Complex::new(i as f64, -(i as f64) * 0.5))
            .collect();
        let mut w = ArrayStoreWriter::create(&path).unwrap();
        w.put_complex("pvec", &data).unwrap();
        w.finish().unwrap();

        let mut r = ArrayStoreReader::open(&path).unwrap();
        let back = r.get_complex::<f64>("pvec").unwrap();
        assert_eq!(back, data);
    }

    #[test]
    fn vec3_roundtrip() {
        let path = tmp_archive("vec3.npz");
        let data: Vec<Vec3Record<f64>> = (0..5)
            .map(|i| Vec3Record::new(i as f64, i as f64 + 0.5, -(i as f64)))
            .collect();
        let mut w = ArrayStoreWriter::create(&path).unwrap();
        w.put_vec3("positions", &data).unwrap();
        w.finish().unwrap();

        let mut r = ArrayStoreReader::open(&path).unwrap();
        let back = r.get_vec3::<f64>("positions").unwrap();
        assert_eq!(back, data);
    }

    #[test]
    fn vec3_rejects_partial_records() {
        let path = tmp_archive("badvec3.npz");
        let mut w = ArrayStoreWriter::create(&path).unwrap();
        w.put_scalars("positions", &[1.0f64, 2.0, 3.0, 4.0]).unwrap();
        w.finish().unwrap();

        let mut r = ArrayStoreReader::open(&path).unwrap();
        assert!(matches!(
            r.get_vec3::<f64>("positions"),
            Err(StorageError::NotVec3 { .. })
        ));
    }
}
