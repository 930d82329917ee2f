//! Direct-lattice geometry: the primitive cell vectors and the reciprocal
//! vectors derived from them. All lengths are in Bohr, following the
//! plane-wave code that produced the data.

use crate::error::{Result, TbError};
use ndarray::Array2;
use ndarray_linalg::Inv;
use serde::{Deserialize, Serialize};
use std::f64::consts::PI;

/// Primitive lattice vectors (rows) plus the lattice parameter `alat`.
///
/// `alat` is carried separately because the upstream k-points come in
/// Cartesian units of 2*pi/alat, the plane-wave convention.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Lattice {
    alat: f64,
    vectors: Array2<f64>,
    reciprocal: Array2<f64>,
}

impl Lattice {
    /// Build a lattice from its row-vector matrix, validating that the cell
    /// is non-degenerate. The reciprocal vectors B = 2*pi*(A^T)^{-1} are
    /// precomputed here so later accessors are infallible.
    pub fn new(alat: f64, vectors: Array2<f64>) -> Result<Self> {
        if vectors.nrows() != 3 || vectors.ncols() != 3 {
            return Err(TbError::DimensionMismatch {
                context: "lattice vector matrix".to_string(),
                expected: 3,
                found: vectors.nrows().max(vectors.ncols()),
            });
        }
        let inv_t = vectors
            .t()
            .to_owned()
            .inv()
            .map_err(|_| TbError::SingularLattice)?;
        let reciprocal = inv_t * (2.0 * PI);
        Ok(Lattice {
            alat,
            vectors,
            reciprocal,
        })
    }

    #[inline(always)]
    pub fn alat(&self) -> f64 {
        self.alat
    }

    /// Rows are a1, a2, a3 in Bohr.
    #[inline(always)]
    pub fn vectors(&self) -> &Array2<f64> {
        &self.vectors
    }

    /// Rows are b1, b2, b3 in 1/Bohr.
    #[inline(always)]
    pub fn reciprocal(&self) -> &Array2<f64> {
        &self.reciprocal
    }

    /// 2*pi/alat, the unit the upstream mesh k-points are expressed in.
    #[inline(always)]
    pub fn tpiba(&self) -> f64 {
        2.0 * PI / self.alat
    }
}
