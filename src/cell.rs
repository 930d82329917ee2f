//! Real-space supercell geometry: enumeration of the Wigner-Seitz neighbor
//! shell of an nk1 x nk2 x nk3 supercell, with degeneracy weights for lattice
//! points shared between periodic images.

use crate::error::{Result, TbError};
use crate::lattice::Lattice;
use ndarray::{Array1, Array2};
use serde::{Deserialize, Serialize};

const EPS7: f64 = 1e-7;

/// Tag describing how the real-space cell was obtained. Persisted with the
/// real-space Hamiltonian so downstream consumers can label their output.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CellType {
    WignerSeitz,
}

impl CellType {
    pub fn label(&self) -> &'static str {
        match self {
            CellType::WignerSeitz => "ws",
        }
    }
}

/// The Wigner-Seitz shell: integer lattice translations (n1,n2,n3) that lie
/// inside the Wigner-Seitz cell of the supercell, each with weight
/// 1/(number of periodic images tied for the minimum distance).
///
/// Invariant: the weights sum to nk1*nk2*nk3 within 1e-7. A violation means
/// the search missed points and is fatal at construction.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WignerSeitzCell {
    vectors: Array2<isize>,
    weights: Array1<f64>,
    nk: [usize; 3],
}

impl WignerSeitzCell {
    /// Enumerate the shell for the given mesh dimensions and lattice.
    ///
    /// Every candidate (n1,n2,n3) with |n_i| <= 2*nk_i is tested against the
    /// 125 periodic images of the origin (shifts in [-2,2]^3); it belongs to
    /// the cell iff its distance to the home image equals the minimum over
    /// all images within 1e-7. Ties are counted, not broken, so no ordering
    /// is needed.
    pub fn build(nk1: usize, nk2: usize, nk3: usize, lattice: &Lattice) -> Result<Self> {
        let a = lattice.vectors();
        let mut nrpts: usize = 0;
        let mut ndegen: Vec<usize> = Vec::new();
        let mut irvec: Vec<isize> = Vec::new();
        let mut dist = [0.0_f64; 125];
        let (nk1, nk2, nk3) = (nk1 as isize, nk2 as isize, nk3 as isize);
        for n1 in -2 * nk1..=2 * nk1 {
            for n2 in -2 * nk2..=2 * nk2 {
                for n3 in -2 * nk3..=2 * nk3 {
                    let mut icnt = 0;
                    for i1 in -2_isize..=2 {
                        for i2 in -2_isize..=2 {
                            for i3 in -2_isize..=2 {
                                let ndiff = [
                                    (n1 - i1 * nk1) as f64,
                                    (n2 - i2 * nk2) as f64,
                                    (n3 - i3 * nk3) as f64,
                                ];
                                let mut d2 = 0.0;
                                for c in 0..3 {
                                    let x = ndiff[0] * a[[0, c]]
                                        + ndiff[1] * a[[1, c]]
                                        + ndiff[2] * a[[2, c]];
                                    d2 += x * x;
                                }
                                dist[icnt] = d2;
                                icnt += 1;
                            }
                        }
                    }
                    let dist_min = dist.iter().cloned().fold(f64::INFINITY, f64::min);
                    // index 62 is the home image, shift (0,0,0)
                    if (dist[62] - dist_min).abs() < EPS7 {
                        nrpts += 1;
                        ndegen.push(dist.iter().filter(|&&d| (d - dist_min).abs() < EPS7).count());
                        irvec.extend_from_slice(&[n1, n2, n3]);
                    }
                }
            }
        }
        if irvec.len() != 3 * nrpts {
            return Err(TbError::WignerSeitzCount {
                collected: irvec.len() / 3,
                counted: nrpts,
            });
        }
        let weights: Array1<f64> = ndegen.iter().map(|&d| 1.0 / d as f64).collect();
        let expected = (nk1 * nk2 * nk3) as f64;
        let tot = weights.sum();
        if (tot - expected).abs() > EPS7 {
            return Err(TbError::WignerSeitzWeightSum {
                sum: tot,
                expected,
            });
        }
        let vectors = Array2::from_shape_vec((nrpts, 3), irvec)
            .map_err(|e| TbError::Linalg(ndarray_linalg::error::LinalgError::Shape(e)))?;
        Ok(WignerSeitzCell {
            vectors,
            weights,
            nk: [nk1 as usize, nk2 as usize, nk3 as usize],
        })
    }

    /// Number of lattice points in the shell.
    #[inline(always)]
    pub fn len(&self) -> usize {
        self.weights.len()
    }

    #[inline(always)]
    pub fn is_empty(&self) -> bool {
        self.weights.is_empty()
    }

    /// Integer translations, one row per shell point.
    #[inline(always)]
    pub fn vectors(&self) -> &Array2<isize> {
        &self.vectors
    }

    /// Inverse degeneracies, co-indexed with `vectors`.
    #[inline(always)]
    pub fn weights(&self) -> &Array1<f64> {
        &self.weights
    }

    #[inline(always)]
    pub fn mesh(&self) -> [usize; 3] {
        self.nk
    }

    /// Weight of the shell point (n1,n2,n3), if it is in the shell.
    pub fn weight_of(&self, n: [isize; 3]) -> Option<f64> {
        self.vectors
            .rows()
            .into_iter()
            .position(|row| row[0] == n[0] && row[1] == n[1] && row[2] == n[2])
            .map(|i| self.weights[i])
    }
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
    fn simple_cubic_4x4x4_shell() {
        let cell = WignerSeitzCell::build(4, 4, 4, &cubic()).unwrap();
        // [-2,2]^3 in supercell units, every integer point belongs
        assert_eq!(cell.len(), 125);
        assert!((cell.weights().sum() - 64.0).abs() < 1e-7);

        // home cell
        assert_eq!(cell.weight_of([0, 0, 0]), Some(1.0));
        // interior face, edge and corner neighbors of the home cell
        for &n in &[
            [1, 0, 0],
            [-1, 0, 0],
            [0, 1, 0],
            [0, -1, 0],
            [0, 0, 1],
            [0, 0, -1],
        ] {
            assert_eq!(cell.weight_of(n), Some(1.0), "face neighbor {:?}", n);
        }
        let edges = [
            [1, 1, 0],
            [1, -1, 0],
            [-1, 1, 0],
            [-1, -1, 0],
            [1, 0, 1],
            [1, 0, -1],
            [-1, 0, 1],
            [-1, 0, -1],
            [0, 1, 1],
            [0, 1, -1],
            [0, -1, 1],
            [0, -1, -1],
        ];
        for &n in edges.iter() {
            assert_eq!(cell.weight_of(n), Some(1.0), "edge neighbor {:?}", n);
        }
        for i in [-1_isize, 1] {
            for j in [-1_isize, 1] {
                for k in [-1_isize, 1] {
                    assert_eq!(cell.weight_of([i, j, k]), Some(1.0));
                }
            }
        }
        // boundary points shared between supercell images
        assert_eq!(cell.weight_of([2, 0, 0]), Some(0.5));
        assert_eq!(cell.weight_of([-2, 0, 0]), Some(0.5));
        assert_eq!(cell.weight_of([2, 2, 0]), Some(0.25));
        assert_eq!(cell.weight_of([2, 2, 2]), Some(0.125));
        assert_eq!(cell.weight_of([-2, -2, -2]), Some(0.125));
        // outside the shell
        assert_eq!(cell.weight_of([3, 0, 0]), None);
    }

    #[test]
    fn degeneracy_sum_matches_mesh_size() {
        for &(n1, n2, n3) in &[(3, 3, 3), (2, 3, 4), (1, 1, 2), (2, 2, 2)] {
            let cell = WignerSeitzCell::build(n1, n2, n3, &cubic()).unwrap();
            let expect = (n1 * n2 * n3) as f64;
            assert!(
                (cell.weights().sum() - expect).abs() < 1e-7,
                "mesh {}x{}x{}",
                n1,
                n2,
                n3
            );
        }
    }

    #[test]
    fn non_cubic_lattice_still_closes() {
        let lat = Lattice::new(
            1.0,
            array![
                [1.0, 0.0, 0.0],
                [-0.5, 3.0_f64.sqrt() / 2.0, 0.0],
                [0.0, 0.0, 1.8]
            ],
        )
        .unwrap();
        let cell = WignerSeitzCell::build(3, 3, 2, &lat).unwrap();
        assert!((cell.weights().sum() - 18.0).abs() < 1e-7);
    }
}
