//! Post-processing of plane-wave electronic-structure calculations into a
//! real-space tight-binding representation, and band-structure interpolation
//! from it.
//!
//! The pipeline:
//!
//! 1. [`WindowedBuilder`] (atomic-projection bases, with or without an
//!    overlap matrix) or [`KSpaceHamiltonian::from_projections`]
//!    (Wannier-like bases) turns raw ab-initio eigenvalues and projections
//!    into a finite-basis H(k) on the original k-mesh;
//! 2. [`WignerSeitzCell::build`] enumerates the real-space neighbor shell of
//!    the mesh supercell, with degeneracy weights for shared boundary points;
//! 3. [`RealSpaceHamiltonian::build`] Fourier-transforms H(k) (and S(k))
//!    onto the shell, in parallel over neighbor vectors — this is the
//!    durable artifact worth persisting;
//! 4. [`interpolate_bands`] reconstructs H(k) along an arbitrary
//!    reciprocal-space path and solves the standard or generalized
//!    eigenproblem for the band energies.

pub mod cell;
pub mod dataset;
pub mod error;
pub mod generics;
pub mod hamiltonian;
pub mod interpolate;
pub mod io;
pub mod kpoints;
pub mod lattice;
pub mod math;
pub mod ndarray_lapack;
pub mod phy_const;
pub mod transform;

pub use cell::{CellType, WignerSeitzCell};
pub use dataset::{AbInitioData, rydberg_to_ev};
pub use error::{Result, TbError};
pub use generics::{ToFloat, usefloat};
pub use hamiltonian::{BasisKind, KSpaceHamiltonian, ShiftMode, WindowedBuilder};
pub use interpolate::{BandStructure, interpolate_bands, interpolate_bands_at};
pub use kpoints::{KMesh, gen_kmesh, k_path};
pub use lattice::Lattice;
pub use math::{hermitize, sqrtm_hermitian};
pub use ndarray_lapack::eig_gen;
pub use transform::{RealSpaceHamiltonian, build_real_space_block};

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::prelude::*;
    use ndarray_linalg::{EigValsh, UPLO};
    use num_complex::Complex;
    use std::f64::consts::PI;

    fn cubic() -> Lattice {
        Lattice::new(
            1.0,
            arr2(&[[1.0, 0.0, 0.0], [0.0, 1.0, 0.0], [0.0, 0.0, 1.0]]),
        )
        .unwrap()
    }

    fn nn_dispersion(t: f64, kf: ArrayView1<f64>) -> f64 {
        -2.0 * t
            * ((2.0 * PI * kf[0]).cos() + (2.0 * PI * kf[1]).cos() + (2.0 * PI * kf[2]).cos())
    }

    #[test]
    fn round_trip_nearest_neighbor_cubic() {
        let t = 1.3;
        let lat = cubic();
        let mesh = KMesh::uniform([4, 4, 4], &lat).unwrap();
        let mut hk = Array4::<Complex<f64>>::zeros((1, mesh.nkpnts(), 1, 1));
        for ik in 0..mesh.nkpnts() {
            hk[[0, ik, 0, 0]] = Complex::new(nn_dispersion(t, mesh.points().row(ik)), 0.0);
        }
        let hks = KSpaceHamiltonian::from_parts(BasisKind::Orthogonal, hk, None).unwrap();
        let cell = WignerSeitzCell::build(4, 4, 4, &lat).unwrap();
        let hr = RealSpaceHamiltonian::build(&hks, &cell, &mesh, &lat).unwrap();

        // back on the original mesh
        let frac = gen_kmesh([4, 4, 4]);
        let bands = interpolate_bands_at(&hr, &frac).unwrap();
        for ik in 0..frac.nrows() {
            let expect = nn_dispersion(t, frac.row(ik));
            assert!(
                (bands[[0, ik, 0]] - expect).abs() < 1e-6,
                "mesh point {}: {} vs {}",
                ik,
                bands[[0, ik, 0]],
                expect
            );
        }
        // the hopping model is exactly representable on the shell, so the
        // interpolation is exact at incommensurate points too
        let frac2 = arr2(&[[0.137, 0.291, -0.44], [0.05, 0.95, 0.5], [0.5, 0.5, 0.5]]);
        let bands2 = interpolate_bands_at(&hr, &frac2).unwrap();
        for ik in 0..frac2.nrows() {
            let expect = nn_dispersion(t, frac2.row(ik));
            assert!((bands2[[0, ik, 0]] - expect).abs() < 1e-6);
        }
    }

    #[test]
    fn complex_hopping_stays_hermitian() {
        // 2-orbital model with a complex k-dependent coupling; the
        // reconstructed H(k) is Hermitized before diagonalization, so the
        // interpolated energies are the exact +-|v| pair everywhere
        let v = 0.7;
        let lat = cubic();
        let mesh = KMesh::uniform([4, 4, 4], &lat).unwrap();
        let mut hk = Array4::<Complex<f64>>::zeros((1, mesh.nkpnts(), 2, 2));
        for ik in 0..mesh.nkpnts() {
            let f1 = mesh.points().row(ik)[0];
            let phase = Complex::new(0.0, 2.0 * PI * f1).exp();
            hk[[0, ik, 0, 1]] = phase * v;
            hk[[0, ik, 1, 0]] = phase.conj() * v;
        }
        let hks = KSpaceHamiltonian::from_parts(BasisKind::Orthogonal, hk, None).unwrap();
        let cell = WignerSeitzCell::build(4, 4, 4, &lat).unwrap();
        let hr = RealSpaceHamiltonian::build(&hks, &cell, &mesh, &lat).unwrap();

        let frac = arr2(&[[0.123, 0.456, 0.789], [0.31, -0.27, 0.08]]);
        let bands = interpolate_bands_at(&hr, &frac).unwrap();
        for ik in 0..frac.nrows() {
            assert!((bands[[0, ik, 0]] + v).abs() < 1e-9);
            assert!((bands[[0, ik, 1]] - v).abs() < 1e-9);
        }
    }

    #[test]
    fn windowed_builder_self_consistency_on_mesh() {
        // orthogonal basis: S(k) = I, so interpolation at a mesh k-point must
        // reproduce the windowed builder's own eigenvalues there
        let lat = cubic();
        let mesh = KMesh::uniform([2, 2, 2], &lat).unwrap();
        let nkt = mesh.nkpnts();
        let mut eigs = Array3::<f64>::zeros((2, nkt, 2));
        let mut u = Array4::<Complex<f64>>::zeros((2, nkt, 2, 2));
        for ispin in 0..2 {
            for ik in 0..nkt {
                eigs[[ispin, ik, 0]] = -1.0 - 0.1 * (ik as f64) - 0.2 * (ispin as f64);
                eigs[[ispin, ik, 1]] = 0.5 + 0.07 * (ik as f64);
                let th = 0.3 * (ik as f64) + 0.1 * (ispin as f64);
                u[[ispin, ik, 0, 0]] = Complex::new(th.cos(), 0.0);
                u[[ispin, ik, 1, 0]] = Complex::new(th.sin(), 0.0);
                u[[ispin, ik, 0, 1]] = Complex::new(-th.sin(), 0.0);
                u[[ispin, ik, 1, 1]] = Complex::new(th.cos(), 0.0);
            }
        }
        let data = AbInitioData::new(lat.clone(), mesh.clone(), 0.0, eigs, Some(u), None).unwrap();
        let mut builder = WindowedBuilder::new(0.0, ShiftMode::Regular);
        builder.band_count = Some(2);
        let hks = builder.build(&data, BasisKind::Orthogonal).unwrap();
        let cell = WignerSeitzCell::build(2, 2, 2, &lat).unwrap();
        let hr = RealSpaceHamiltonian::build(&hks, &cell, &mesh, &lat).unwrap();

        let bands = interpolate_bands_at(&hr, &gen_kmesh([2, 2, 2])).unwrap();
        for ispin in 0..2 {
            for ik in 0..nkt {
                let direct = hermitize(&hks.hk().slice(s![ispin, ik, .., ..]))
                    .eigvalsh(UPLO::Upper)
                    .unwrap();
                for ib in 0..2 {
                    assert!(
                        (bands[[ispin, ik, ib]] - direct[ib]).abs() < 1e-6,
                        "ispin={} ik={} ib={}",
                        ispin,
                        ik,
                        ib
                    );
                }
            }
        }
    }
}
