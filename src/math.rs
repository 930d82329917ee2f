//! Small dense-matrix helpers shared by the builder and the interpolator.

use crate::error::Result;
use log::warn;
use ndarray::{Array1, Array2, ArrayBase, Data, Ix2};
use ndarray_linalg::{Eigh, UPLO};
use num_complex::Complex;

/// Rebuild a matrix as exactly Hermitian: strict upper triangle, real
/// diagonal, and the conjugate transpose of the strict upper triangle.
/// This removes asymmetry introduced by floating-point summation order.
#[allow(non_snake_case)]
#[inline(always)]
pub fn hermitize<S>(A: &ArrayBase<S, Ix2>) -> Array2<Complex<f64>>
where
    S: Data<Elem = Complex<f64>>,
{
    let n = A.nrows();
    let mut h = Array2::<Complex<f64>>::zeros((n, n));
    for i in 0..n {
        h[[i, i]] = Complex::new(A[[i, i]].re, 0.0);
        for j in (i + 1)..n {
            h[[i, j]] = A[[i, j]];
            h[[j, i]] = A[[i, j]].conj();
        }
    }
    h
}

/// Principal square root of a Hermitian matrix via its eigendecomposition,
/// S^{1/2} = V diag(sqrt(lambda)) V^dagger.
///
/// A non-positive-definite input is a numerical-quality problem, not a fatal
/// one: the principal complex branch sqrt(lambda) is still taken and a
/// warning is emitted so the caller can judge the result.
pub fn sqrtm_hermitian<S>(s: &ArrayBase<S, Ix2>, context: &str) -> Result<Array2<Complex<f64>>>
where
    S: Data<Elem = Complex<f64>>,
{
    let (vals, vecs) = s.eigh(UPLO::Upper)?;
    let min_val = vals.iter().cloned().fold(f64::INFINITY, f64::min);
    if min_val <= 0.0 {
        warn!(
            "{}: overlap matrix is not positive definite (min eigenvalue {:.3e}); \
             its square root is taken on the principal complex branch",
            context, min_val
        );
    }
    let sq: Array1<Complex<f64>> = vals.mapv(|v| Complex::new(v, 0.0).sqrt());
    let vh = vecs.t().mapv(|x| x.conj());
    Ok(vecs.dot(&Array2::from_diag(&sq)).dot(&vh))
}
