//! Reciprocal-space sampling: the upstream k-mesh with its weights, uniform
//! mesh generation, and high-symmetry path construction for band plots.

use crate::error::{Result, TbError};
use crate::lattice::Lattice;
use ndarray::{Array1, Array2, s};
use ndarray_linalg::Inv;
use serde::{Deserialize, Serialize};

/// The k-mesh the ab-initio data was computed on.
///
/// Points are Cartesian coordinates in units of 2*pi/alat (the plane-wave
/// convention); weights are co-indexed and order-significant. Both are
/// immutable after construction, and their sum is the normalization divisor
/// of the real-space Fourier transform.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KMesh {
    points: Array2<f64>,
    weights: Array1<f64>,
}

impl KMesh {
    pub fn new(points: Array2<f64>, weights: Array1<f64>) -> Result<Self> {
        if points.nrows() != weights.len() {
            return Err(TbError::DimensionMismatch {
                context: "k-point weights".to_string(),
                expected: points.nrows(),
                found: weights.len(),
            });
        }
        if points.ncols() != 3 {
            return Err(TbError::DimensionMismatch {
                context: "k-point components".to_string(),
                expected: 3,
                found: points.ncols(),
            });
        }
        Ok(KMesh { points, weights })
    }

    /// Uniform nk1 x nk2 x nk3 mesh over the Brillouin zone with unit
    /// weights, expressed in the same 2*pi/alat Cartesian units upstream
    /// codes use.
    pub fn uniform(nk: [usize; 3], lattice: &Lattice) -> Result<Self> {
        let frac = gen_kmesh(nk);
        let cart = frac.dot(lattice.reciprocal()) / lattice.tpiba();
        let weights = Array1::<f64>::ones(cart.nrows());
        KMesh::new(cart, weights)
    }

    #[inline(always)]
    pub fn nkpnts(&self) -> usize {
        self.points.nrows()
    }

    #[inline(always)]
    pub fn points(&self) -> &Array2<f64> {
        &self.points
    }

    #[inline(always)]
    pub fn weights(&self) -> &Array1<f64> {
        &self.weights
    }

    #[inline(always)]
    pub fn total_weight(&self) -> f64 {
        self.weights.sum()
    }
}

/// Fractional coordinates of a uniform nk1 x nk2 x nk3 Gamma-centered mesh,
/// one row per point, innermost index fastest.
pub fn gen_kmesh(nk: [usize; 3]) -> Array2<f64> {
    let nkt = nk[0] * nk[1] * nk[2];
    let mut kvec = Array2::<f64>::zeros((nkt, 3));
    let mut row = 0;
    for i in 0..nk[0] {
        for j in 0..nk[1] {
            for l in 0..nk[2] {
                kvec[[row, 0]] = (i as f64) / (nk[0] as f64);
                kvec[[row, 1]] = (j as f64) / (nk[1] as f64);
                kvec[[row, 2]] = (l as f64) / (nk[2] as f64);
                row += 1;
            }
        }
    }
    kvec
}

/// Distribute `nk` points along the piecewise-linear path through the given
/// high-symmetry nodes (fractional coordinates), proportionally to segment
/// length. Returns the fractional points, the cumulative path distance per
/// point, and the distance of each node, both in units of 2*pi/alat.
#[allow(non_snake_case)]
pub fn k_path(
    lattice: &Lattice,
    nodes: &Array2<f64>,
    nk: usize,
) -> Result<(Array2<f64>, Array1<f64>, Array1<f64>)> {
    let n_node = nodes.nrows();
    if nodes.ncols() != 3 {
        return Err(TbError::DimensionMismatch {
            context: "k-path node components".to_string(),
            expected: 3,
            found: nodes.ncols(),
        });
    }
    if nk < n_node {
        return Err(TbError::DimensionMismatch {
            context: "k-path point count".to_string(),
            expected: n_node,
            found: nk,
        });
    }
    // |dk_frac . B| = 2 pi sqrt(dk . (A A^T)^-1 . dk); the alat factor
    // converts to the 2*pi/alat unit the band tables are written in.
    let a = lattice.vectors();
    let k_metric = a.dot(&a.t()).inv()?;
    let mut k_node = Array1::<f64>::zeros(n_node);
    for n in 1..n_node {
        let dk = nodes.row(n).to_owned() - nodes.slice(s![n - 1, ..]).to_owned();
        let dklen = dk.dot(&k_metric.dot(&dk)).sqrt() * lattice.alat();
        k_node[[n]] = k_node[[n - 1]] + dklen;
    }
    let mut node_index: Vec<usize> = vec![0];
    for n in 1..n_node - 1 {
        let frac = k_node[[n]] / k_node[[n_node - 1]];
        node_index.push((frac * ((nk - 1) as f64)).round() as usize);
    }
    node_index.push(nk - 1);
    let mut k_dist = Array1::<f64>::zeros(nk);
    let mut k_vec = Array2::<f64>::zeros((nk, 3));
    k_vec.row_mut(0).assign(&nodes.row(0));
    for n in 1..n_node {
        let n_i = node_index[n - 1];
        let n_f = node_index[n];
        let kd_i = k_node[[n - 1]];
        let kd_f = k_node[[n]];
        let k_i = nodes.row(n - 1);
        let k_f = nodes.row(n);
        for j in n_i..n_f + 1 {
            let frac = ((j - n_i) as f64) / ((n_f - n_i) as f64);
            k_dist[[j]] = kd_i + frac * (kd_f - kd_i);
            k_vec
                .row_mut(j)
                .assign(&((1.0 - frac) * k_i.to_owned() + frac * k_f.to_owned()));
        }
    }
    Ok((k_vec, k_dist, k_node))
}
