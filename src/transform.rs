//! The reciprocal-to-real transform: weighted Fourier summation of the
//! mesh-resolved H(k)/S(k) onto the Wigner-Seitz neighbor shell, fanned out
//! over neighbor vectors, plus the persisted real-space artifact that the
//! interpolation engine reloads.

use crate::cell::{CellType, WignerSeitzCell};
use crate::error::{Result, TbError};
use crate::hamiltonian::{BasisKind, KSpaceHamiltonian};
use crate::kpoints::KMesh;
use crate::lattice::Lattice;
use ndarray::{Array2, Array3, Array5, ArrayView1, ArrayView2, ArrayView3, Axis, s};
use num_complex::Complex;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

/// H(R) for a single neighbor vector and spin channel,
/// H(R) = [sum_k w_k exp(-i K.R) H(k)] / sum_k w_k with K = (2 pi/alat) k
/// and R = n . A in Bohr; S(R) computed identically when overlaps are
/// present. Pure function over read-only inputs, the unit of parallel work.
#[allow(non_snake_case)]
pub fn build_real_space_block(
    neigh: ArrayView1<isize>,
    kmesh: &KMesh,
    lattice: &Lattice,
    hk: &ArrayView3<Complex<f64>>,
    sk: Option<&Array3<Complex<f64>>>,
) -> (Array2<Complex<f64>>, Option<Array2<Complex<f64>>>) {
    let nawf = hk.len_of(Axis(1));
    let a = lattice.vectors();
    let mut R = [0.0_f64; 3];
    for c in 0..3 {
        R[c] = (neigh[0] as f64) * a[[0, c]]
            + (neigh[1] as f64) * a[[1, c]]
            + (neigh[2] as f64) * a[[2, c]];
    }
    let tpiba = lattice.tpiba();
    let mut h = Array2::<Complex<f64>>::zeros((nawf, nawf));
    let mut s_acc = sk.map(|_| Array2::<Complex<f64>>::zeros((nawf, nawf)));
    for ik in 0..kmesh.nkpnts() {
        let kp = kmesh.points().row(ik);
        let kdotr = tpiba * (kp[0] * R[0] + kp[1] * R[1] + kp[2] * R[2]);
        let phase = Complex::new(0.0, -kdotr).exp() * kmesh.weights()[ik];
        h.zip_mut_with(&hk.index_axis(Axis(0), ik), |acc, &v| *acc += phase * v);
        if let (Some(s_acc), Some(sk)) = (&mut s_acc, sk) {
            s_acc.zip_mut_with(&sk.index_axis(Axis(0), ik), |acc, &v| *acc += phase * v);
        }
    }
    let wtot = Complex::new(kmesh.total_weight(), 0.0);
    (h / wtot, s_acc.map(|s| s / wtot))
}

/// The durable real-space artifact: the shell-indexed complex blocks plus
/// everything a later interpolation run needs to reload alongside them
/// (neighbor vectors, degeneracy weights, cell and basis tags, lattice).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RealSpaceHamiltonian {
    /// `[nspin, n_R, nmat, nawf, nawf]`; `nmat` is 2 when both H and S are
    /// stored (non-orthogonal basis) and 1 otherwise.
    data: Array5<Complex<f64>>,
    cell: WignerSeitzCell,
    cell_type: CellType,
    basis: BasisKind,
    lattice: Lattice,
}

impl RealSpaceHamiltonian {
    /// Transform every (spin, neighbor) block of the mesh-resolved
    /// Hamiltonian. The per-neighbor computations are independent and run on
    /// the rayon pool; results are gathered into the shell-indexed array by
    /// position, so completion order is irrelevant.
    pub fn build(
        hk: &KSpaceHamiltonian,
        cell: &WignerSeitzCell,
        kmesh: &KMesh,
        lattice: &Lattice,
    ) -> Result<Self> {
        if hk.nkpnts() != kmesh.nkpnts() {
            return Err(TbError::DimensionMismatch {
                context: "k-space Hamiltonian vs k-mesh".to_string(),
                expected: kmesh.nkpnts(),
                found: hk.nkpnts(),
            });
        }
        let (nspin, nawf) = (hk.nspin(), hk.nawf());
        let nmat = hk.basis().matrix_kinds();
        let mut data = Array5::<Complex<f64>>::zeros((nspin, cell.len(), nmat, nawf, nawf));
        for ispin in 0..nspin {
            let hk_spin = hk.hk().index_axis(Axis(0), ispin);
            let blocks: Vec<_> = cell
                .vectors()
                .axis_iter(Axis(0))
                .into_par_iter()
                .map(|neigh| build_real_space_block(neigh, kmesh, lattice, &hk_spin, hk.sk()))
                .collect();
            for (ir, (h, s)) in blocks.into_iter().enumerate() {
                data.slice_mut(s![ispin, ir, 0, .., ..]).assign(&h);
                if let Some(s) = s {
                    data.slice_mut(s![ispin, ir, 1, .., ..]).assign(&s);
                }
            }
        }
        Ok(RealSpaceHamiltonian {
            data,
            cell: cell.clone(),
            cell_type: CellType::WignerSeitz,
            basis: hk.basis(),
            lattice: lattice.clone(),
        })
    }

    #[inline(always)]
    pub fn nspin(&self) -> usize {
        self.data.len_of(Axis(0))
    }

    #[inline(always)]
    pub fn n_neighbors(&self) -> usize {
        self.data.len_of(Axis(1))
    }

    #[inline(always)]
    pub fn nawf(&self) -> usize {
        self.data.len_of(Axis(3))
    }

    #[inline(always)]
    pub fn basis(&self) -> BasisKind {
        self.basis
    }

    #[inline(always)]
    pub fn cell_type(&self) -> CellType {
        self.cell_type
    }

    #[inline(always)]
    pub fn cell(&self) -> &WignerSeitzCell {
        &self.cell
    }

    #[inline(always)]
    pub fn lattice(&self) -> &Lattice {
        &self.lattice
    }

    /// The Hamiltonian block for one spin and neighbor index.
    #[inline(always)]
    pub fn h_block(&self, ispin: usize, ir: usize) -> ArrayView2<'_, Complex<f64>> {
        self.data.slice(s![ispin, ir, 0, .., ..])
    }

    /// The overlap block, when the basis stores one.
    #[inline(always)]
    pub fn s_block(&self, ispin: usize, ir: usize) -> Option<ArrayView2<'_, Complex<f64>>> {
        if self.basis.matrix_kinds() == 2 {
            Some(self.data.slice(s![ispin, ir, 1, .., ..]))
        } else {
            None
        }
    }
}
