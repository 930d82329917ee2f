//! Container for the ab-initio data the pipeline consumes: eigenvalues,
//! atomic/Wannier projection matrices and orbital overlaps on the original
//! k-mesh. Parsing the DFT output files into these arrays is the caller's
//! job; this module owns the validation that used to be scattered through
//! the reader.

use crate::error::{Result, TbError};
use crate::kpoints::KMesh;
use crate::lattice::Lattice;
use crate::math::hermitize;
use crate::phy_const::Ry2eV;
use ndarray::{Array3, Array4, Axis, s};
use num_complex::Complex;

/// Per-dataset ab-initio arrays.
///
/// Shapes: eigenvalues `[nspin, nk, nbnds]` (eV, referenced to the Fermi
/// energy), projections `[nspin, nk, nawf, nbnds]` (each column is one band
/// projected on the atomic/Wannier basis), overlaps `[nk, nawf, nawf]`.
#[derive(Debug, Clone)]
pub struct AbInitioData {
    lattice: Lattice,
    kmesh: KMesh,
    efermi: f64,
    eigenvalues: Array3<f64>,
    projections: Option<Array4<Complex<f64>>>,
    overlaps: Option<Array3<Complex<f64>>>,
}

impl AbInitioData {
    pub fn new(
        lattice: Lattice,
        kmesh: KMesh,
        efermi: f64,
        eigenvalues: Array3<f64>,
        projections: Option<Array4<Complex<f64>>>,
        overlaps: Option<Array3<Complex<f64>>>,
    ) -> Result<Self> {
        let nspin = eigenvalues.len_of(Axis(0));
        let nkpnts = eigenvalues.len_of(Axis(1));
        let nbnds = eigenvalues.len_of(Axis(2));
        if nkpnts != kmesh.nkpnts() {
            return Err(TbError::DimensionMismatch {
                context: "eigenvalue k-points vs mesh".to_string(),
                expected: kmesh.nkpnts(),
                found: nkpnts,
            });
        }
        if let Some(u) = &projections {
            if u.len_of(Axis(0)) != nspin || u.len_of(Axis(1)) != nkpnts {
                return Err(TbError::DimensionMismatch {
                    context: "projection spin/k-point axes".to_string(),
                    expected: nspin * nkpnts,
                    found: u.len_of(Axis(0)) * u.len_of(Axis(1)),
                });
            }
            if u.len_of(Axis(3)) != nbnds {
                return Err(TbError::DimensionMismatch {
                    context: "projection band axis".to_string(),
                    expected: nbnds,
                    found: u.len_of(Axis(3)),
                });
            }
            // corrupted upstream data, not recoverable
            for ispin in 0..nspin {
                for ik in 0..nkpnts {
                    let block = u.slice(s![ispin, ik, .., ..]);
                    if block.iter().any(|x| x.re.is_nan() || x.im.is_nan()) {
                        return Err(TbError::NanProjection { ik, ispin });
                    }
                }
            }
        }
        let overlaps = match overlaps {
            Some(sk) => {
                if sk.len_of(Axis(0)) != nkpnts {
                    return Err(TbError::DimensionMismatch {
                        context: "overlap k-point axis".to_string(),
                        expected: nkpnts,
                        found: sk.len_of(Axis(0)),
                    });
                }
                if let Some(u) = &projections {
                    if sk.len_of(Axis(1)) != u.len_of(Axis(2)) {
                        return Err(TbError::DimensionMismatch {
                            context: "overlap orbital count vs projections".to_string(),
                            expected: u.len_of(Axis(2)),
                            found: sk.len_of(Axis(1)),
                        });
                    }
                }
                // upstream files store only one triangle reliably
                let mut sk = sk;
                for ik in 0..nkpnts {
                    let h = hermitize(&sk.slice(s![ik, .., ..]));
                    sk.slice_mut(s![ik, .., ..]).assign(&h);
                }
                Some(sk)
            }
            None => None,
        };
        Ok(AbInitioData {
            lattice,
            kmesh,
            efermi,
            eigenvalues,
            projections,
            overlaps,
        })
    }

    #[inline(always)]
    pub fn nspin(&self) -> usize {
        self.eigenvalues.len_of(Axis(0))
    }

    #[inline(always)]
    pub fn nkpnts(&self) -> usize {
        self.eigenvalues.len_of(Axis(1))
    }

    #[inline(always)]
    pub fn nbnds(&self) -> usize {
        self.eigenvalues.len_of(Axis(2))
    }

    /// Number of atomic wavefunctions, when projections are present.
    #[inline(always)]
    pub fn nawf(&self) -> Option<usize> {
        self.projections.as_ref().map(|u| u.len_of(Axis(2)))
    }

    #[inline(always)]
    pub fn lattice(&self) -> &Lattice {
        &self.lattice
    }

    #[inline(always)]
    pub fn kmesh(&self) -> &KMesh {
        &self.kmesh
    }

    #[inline(always)]
    pub fn efermi(&self) -> f64 {
        self.efermi
    }

    #[inline(always)]
    pub fn eigenvalues(&self) -> &Array3<f64> {
        &self.eigenvalues
    }

    #[inline(always)]
    pub fn projections(&self) -> Option<&Array4<Complex<f64>>> {
        self.projections.as_ref()
    }

    #[inline(always)]
    pub fn overlaps(&self) -> Option<&Array3<Complex<f64>>> {
        self.overlaps.as_ref()
    }
}

/// Convert raw Rydberg eigenvalues to eV referenced to the Fermi energy,
/// the form the rest of the pipeline expects.
pub fn rydberg_to_ev(eigs_ry: &Array3<f64>, efermi_ev: f64) -> Array3<f64> {
    eigs_ry.mapv(|e| e * Ry2eV - efermi_ev)
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    fn cubic() -> Lattice {
        Lattice::new(
            1.0,
            array![[1.0, 0.0, 0.0], [0.0, 1.0, 0.0], [0.0, 0.0, 1.0]],
        )
        .unwrap()
    }

    #[test]
    fn nan_projection_is_fatal() {
        let lat = cubic();
        let mesh = KMesh::uniform([1, 1, 2], &lat).unwrap();
        let eigs = Array3::<f64>::zeros((1, 2, 3));
        let mut u = Array4::<Complex<f64>>::zeros((1, 2, 2, 3));
        u[[0, 1, 0, 2]] = Complex::new(f64::NAN, 0.0);
        let res = AbInitioData::new(lat, mesh, 0.0, eigs, Some(u), None);
        match res {
            Err(TbError::NanProjection { ik, ispin }) => {
                assert_eq!((ik, ispin), (1, 0));
            }
            other => panic!("expected NanProjection, got {:?}", other.map(|_| ())),
        }
    }

    #[test]
    fn overlaps_are_hermitized_on_ingest() {
        let lat = cubic();
        let mesh = KMesh::uniform([1, 1, 1], &lat).unwrap();
        let eigs = Array3::<f64>::zeros((1, 1, 2));
        let mut sk = Array3::<Complex<f64>>::zeros((1, 2, 2));
        sk[[0, 0, 0]] = Complex::new(1.0, 0.0);
        sk[[0, 1, 1]] = Complex::new(1.0, 0.0);
        sk[[0, 0, 1]] = Complex::new(0.1, 0.2);
        // lower triangle left inconsistent on purpose
        sk[[0, 1, 0]] = Complex::new(9.0, 9.0);
        let data = AbInitioData::new(lat, mesh, 0.0, eigs, None, Some(sk)).unwrap();
        let s = data.overlaps().unwrap();
        assert_eq!(s[[0, 1, 0]], Complex::new(0.1, -0.2));
    }

    #[test]
    fn k_count_mismatch_is_fatal() {
        let lat = cubic();
        let mesh = KMesh::uniform([1, 1, 2], &lat).unwrap();
        let eigs = Array3::<f64>::zeros((1, 3, 2));
        let res = AbInitioData::new(lat, mesh, 0.0, eigs, None, None);
        assert!(matches!(res, Err(TbError::DimensionMismatch { .. })));
    }

    #[test]
    fn rydberg_conversion_references_fermi() {
        let eigs = array![[[1.0, 2.0]]];
        let ev = rydberg_to_ev(&eigs, 5.0);
        assert!((ev[[0, 0, 0]] - (Ry2eV - 5.0)).abs() < 1e-12);
        assert!((ev[[0, 0, 1]] - (2.0 * Ry2eV - 5.0)).abs() < 1e-12);
    }
}
