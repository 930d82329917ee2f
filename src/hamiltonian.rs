//! Construction of the finite-basis k-space Hamiltonian from raw ab-initio
//! eigenvalues and projections: band selection by energy window or fixed
//! count, energy shifting of the unoccupied complement, and optional
//! de-orthogonalization through the overlap square root.

use crate::dataset::AbInitioData;
use crate::error::{Result, TbError};
use crate::math::{hermitize, sqrtm_hermitian};
use ndarray::{Array1, Array2, Array3, Array4, Axis, s};
use ndarray_linalg::Inv;
use num_complex::Complex;
use serde::{Deserialize, Serialize};

/// How the tight-binding basis was obtained. The presence of an overlap
/// matrix changes both data shape and algorithm branch throughout the
/// pipeline, so this is a tag every artifact carries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BasisKind {
    /// Orthonormalized atomic projections; S(k) = I.
    Orthogonal,
    /// Raw atomic projections with an explicit overlap matrix.
    NonOrthogonal,
    /// Wannier-like rotation of the ab-initio bands; no overlap concept.
    Projection,
}

impl BasisKind {
    /// Number of matrix kinds stored per neighbor vector (H, or H and S).
    #[inline(always)]
    pub fn matrix_kinds(&self) -> usize {
        match self {
            BasisKind::NonOrthogonal => 2,
            _ => 1,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            BasisKind::Orthogonal => "ortho",
            BasisKind::NonOrthogonal => "nonortho",
            BasisKind::Projection => "wannier",
        }
    }
}

/// How the energy shift of the unselected subspace is applied.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ShiftMode {
    /// H' = A E A^dagger + kappa (I - A A^dagger), less the identity term
    /// which is added per basis kind.
    Regular,
    /// Corrects for non-orthonormality of the selected subspace through
    /// (A^dagger A)^{-1} before shifting.
    Generalized,
}

impl TryFrom<u8> for ShiftMode {
    type Error = TbError;

    fn try_from(value: u8) -> Result<Self> {
        match value {
            0 => Ok(ShiftMode::Regular),
            1 => Ok(ShiftMode::Generalized),
            other => Err(TbError::InvalidShiftMode(other)),
        }
    }
}

/// The mesh-resolved k-space Hamiltonian, one square complex block per
/// (spin, k-point), with the overlap matrices alongside when the basis is
/// non-orthogonal.
#[derive(Debug, Clone)]
pub struct KSpaceHamiltonian {
    basis: BasisKind,
    /// `[nspin, nk, nawf, nawf]`
    hk: Array4<Complex<f64>>,
    /// `[nk, nawf, nawf]`, present iff the basis is non-orthogonal
    sk: Option<Array3<Complex<f64>>>,
}

impl KSpaceHamiltonian {
    #[inline(always)]
    pub fn basis(&self) -> BasisKind {
        self.basis
    }

    #[inline(always)]
    pub fn nspin(&self) -> usize {
        self.hk.len_of(Axis(0))
    }

    #[inline(always)]
    pub fn nkpnts(&self) -> usize {
        self.hk.len_of(Axis(1))
    }

    #[inline(always)]
    pub fn nawf(&self) -> usize {
        self.hk.len_of(Axis(2))
    }

    #[inline(always)]
    pub fn hk(&self) -> &Array4<Complex<f64>> {
        &self.hk
    }

    #[inline(always)]
    pub fn sk(&self) -> Option<&Array3<Complex<f64>>> {
        self.sk.as_ref()
    }

    /// Assemble from externally computed blocks, validating that the overlap
    /// presence matches the basis kind and that every shape is consistent.
    pub fn from_parts(
        basis: BasisKind,
        hk: Array4<Complex<f64>>,
        sk: Option<Array3<Complex<f64>>>,
    ) -> Result<Self> {
        if hk.len_of(Axis(2)) != hk.len_of(Axis(3)) {
            return Err(TbError::DimensionMismatch {
                context: "k-space Hamiltonian blocks must be square".to_string(),
                expected: hk.len_of(Axis(2)),
                found: hk.len_of(Axis(3)),
            });
        }
        match (&sk, basis) {
            (None, BasisKind::NonOrthogonal) => return Err(TbError::MissingOverlap),
            (Some(_), BasisKind::Orthogonal) | (Some(_), BasisKind::Projection) => {
                return Err(TbError::UnexpectedOverlap(basis.label()));
            }
            _ => {}
        }
        if let Some(sk) = &sk {
            if sk.len_of(Axis(0)) != hk.len_of(Axis(1)) || sk.len_of(Axis(1)) != hk.len_of(Axis(2))
            {
                return Err(TbError::DimensionMismatch {
                    context: "overlap array vs Hamiltonian array".to_string(),
                    expected: hk.len_of(Axis(1)) * hk.len_of(Axis(2)),
                    found: sk.len_of(Axis(0)) * sk.len_of(Axis(1)),
                });
            }
        }
        Ok(KSpaceHamiltonian { basis, hk, sk })
    }

    /// Rotate the ab-initio bands into the projection basis without any
    /// windowing: H(k) = U*(k) E(k) U^T(k) per spin. This is the path for
    /// Wannier-style projection matrices, where no overlap exists.
    pub fn from_projections(data: &AbInitioData) -> Result<Self> {
        let u = data.projections().ok_or(TbError::MissingProjections)?;
        let nspin = data.nspin();
        let nkpnts = data.nkpnts();
        let nawf = u.len_of(Axis(2));
        let mut hk = Array4::<Complex<f64>>::zeros((nspin, nkpnts, nawf, nawf));
        for ispin in 0..nspin {
            for ik in 0..nkpnts {
                let a = u.slice(s![ispin, ik, .., ..]);
                let ee = Array2::from_diag(
                    &data
                        .eigenvalues()
                        .slice(s![ispin, ik, ..])
                        .mapv(|e| Complex::new(e, 0.0)),
                );
                let block = a.mapv(|x| x.conj()).dot(&ee).dot(&a.t());
                hk.slice_mut(s![ispin, ik, .., ..]).assign(&hermitize(&block));
            }
        }
        Ok(KSpaceHamiltonian {
            basis: BasisKind::Projection,
            hk,
            sk: None,
        })
    }
}

/// Configuration of the windowed effective-Hamiltonian construction.
///
/// With `band_count` unset, every band with eigenvalue below `shift` enters
/// the model; with `Some(n)`, exactly the `n` lowest-index bands do, and
/// asking for more bands than the dataset holds is a configuration error.
/// `norm_bands` rescales that many leading projection columns to unit
/// orbital norm before use, correcting normalization drift in the upstream
/// projection.
#[derive(Debug, Clone, Copy)]
pub struct WindowedBuilder {
    pub shift: f64,
    pub mode: ShiftMode,
    pub band_count: Option<usize>,
    pub norm_bands: usize,
}

impl WindowedBuilder {
    pub fn new(shift: f64, mode: ShiftMode) -> Self {
        WindowedBuilder {
            shift,
            mode,
            band_count: None,
            norm_bands: 0,
        }
    }

    pub fn build(&self, data: &AbInitioData, basis: BasisKind) -> Result<KSpaceHamiltonian> {
        let u = data.projections().ok_or(TbError::MissingProjections)?;
        let nspin = data.nspin();
        let nkpnts = data.nkpnts();
        let nbnds = data.nbnds();
        let nawf = u.len_of(Axis(2));
        if let Some(n) = self.band_count {
            if n > nbnds {
                return Err(TbError::InvalidBandCount {
                    requested: n,
                    available: nbnds,
                });
            }
        }
        let sk_all = match basis {
            BasisKind::Orthogonal => None,
            BasisKind::NonOrthogonal => Some(data.overlaps().ok_or(TbError::MissingOverlap)?),
            BasisKind::Projection => return Err(TbError::InvalidBasisKind(basis.label())),
        };
        let kappa = Complex::new(self.shift, 0.0);
        let eye = Array2::<Complex<f64>>::eye(nawf);
        let mut hk = Array4::<Complex<f64>>::zeros((nspin, nkpnts, nawf, nawf));
        for ispin in 0..nspin {
            for ik in 0..nkpnts {
                let my_eigs = data.eigenvalues().slice(s![ispin, ik, ..]);
                let mut uu = u.slice(s![ispin, ik, .., ..]).to_owned();
                if self.norm_bands > 0 {
                    for b in 0..self.norm_bands.min(nbnds) {
                        let norm = uu
                            .column(b)
                            .iter()
                            .map(|x| x.norm_sqr())
                            .sum::<f64>()
                            .sqrt();
                        if norm > 0.0 {
                            let scale = Complex::new(1.0 / norm, 0.0);
                            uu.column_mut(b).mapv_inplace(|x| x * scale);
                        }
                    }
                }
                let iselect: Vec<usize> = match self.band_count {
                    None => (0..nbnds).filter(|&b| my_eigs[b] <= self.shift).collect(),
                    Some(n) => (0..n).collect(),
                };
                let h_aux = if iselect.is_empty() {
                    // empty window: only the shift term survives
                    Array2::<Complex<f64>>::zeros((nawf, nawf))
                } else {
                    let ac = uu.select(Axis(1), &iselect);
                    let ee = Array2::from_diag(
                        &iselect
                            .iter()
                            .map(|&b| Complex::new(my_eigs[b], 0.0))
                            .collect::<Array1<_>>(),
                    );
                    let ac_h = ac.t().mapv(|x| x.conj());
                    match self.mode {
                        ShiftMode::Regular => {
                            ac.dot(&ee).dot(&ac_h) - ac.dot(&ac_h) * kappa
                        }
                        ShiftMode::Generalized => {
                            let aux_p = ac_h.dot(&ac).inv()?;
                            ac.dot(&ee).dot(&ac_h) - ac.dot(&aux_p).dot(&ac_h) * kappa
                        }
                    }
                };
                // symmetrized for both shift modes, before the basis branch
                let h_aux = hermitize(&h_aux);
                let block = match sk_all {
                    None => h_aux + &eye * kappa,
                    Some(sk) => {
                        let s_k = sk.slice(s![ik, .., ..]).to_owned();
                        let s_half =
                            sqrtm_hermitian(&s_k, &format!("windowed Hamiltonian at ik = {}", ik))?;
                        s_half.dot(&h_aux).dot(&s_half) + s_k * kappa
                    }
                };
                hk.slice_mut(s![ispin, ik, .., ..]).assign(&block);
            }
        }
        let sk = sk_all.cloned();
        Ok(KSpaceHamiltonian { basis, hk, sk })
    }
}
