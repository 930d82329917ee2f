//! Raw-LAPACK access for routines `ndarray-linalg` does not expose; here the
//! complex generalized non-symmetric eigensolver `zggev`, needed for the
//! H v = lambda S v pencil when the overlap may not be positive definite.
#[cfg(any(feature = "intel-mkl-system", feature = "intel-mkl-static"))]
extern crate intel_mkl_src as _src;

#[cfg(any(feature = "openblas-system", feature = "openblas-static"))]
extern crate openblas_src as _src;

#[cfg(any(feature = "netlib-system", feature = "netlib-static"))]
extern crate netlib_src as _src;

use crate::error::{Result, TbError};
use lapack::zggev;
use ndarray::{Array1, ArrayBase, Data, Ix2};
use num_complex::Complex;

/// Eigenvalues of the generalized problem A x = lambda B x for general
/// complex square A, B. Eigenvectors are not computed.
///
/// The row-major buffers are handed to the column-major routine as-is: that
/// solves the transposed pencil, whose eigenvalues are identical.
#[allow(non_snake_case)]
pub fn eig_gen<S1, S2>(
    A: &ArrayBase<S1, Ix2>,
    B: &ArrayBase<S2, Ix2>,
) -> Result<Array1<Complex<f64>>>
where
    S1: Data<Elem = Complex<f64>>,
    S2: Data<Elem = Complex<f64>>,
{
    let n = A.nrows() as i32;
    if B.nrows() != A.nrows() {
        return Err(TbError::DimensionMismatch {
            context: "eig_gen pencil".to_string(),
            expected: A.nrows(),
            found: B.nrows(),
        });
    }
    let mut a: Vec<_> = A.iter().cloned().collect();
    let mut b: Vec<_> = B.iter().cloned().collect();
    let mut alpha = vec![Complex::new(0.0, 0.0); n as usize];
    let mut beta = vec![Complex::new(0.0, 0.0); n as usize];
    // eigenvectors are not referenced for jobvl = jobvr = 'N'
    let mut vl = vec![Complex::new(0.0, 0.0); 1];
    let mut vr = vec![Complex::new(0.0, 0.0); 1];
    let mut rwork = vec![0.0; (8 * n) as usize];
    let mut info = 0;
    let job1 = b'N';
    let job2 = b'N';

    // workspace query
    let mut work = vec![Complex::new(0.0, 0.0); 1];
    unsafe {
        zggev(
            job1, job2, n, &mut a, n, &mut b, n, &mut alpha, &mut beta, &mut vl, 1, &mut vr, 1,
            &mut work, -1, &mut rwork, &mut info,
        );
    }
    let lwork = work[0].re as i32;
    let mut work = vec![Complex::new(0.0, 0.0); lwork as usize];

    unsafe {
        zggev(
            job1, job2, n, &mut a, n, &mut b, n, &mut alpha, &mut beta, &mut vl, 1, &mut vr, 1,
            &mut work, lwork, &mut rwork, &mut info,
        );
    }
    if info == 0 {
        let eig: Vec<Complex<f64>> = alpha
            .into_iter()
            .zip(beta.into_iter())
            .map(|(al, be)| al / be)
            .collect();
        Ok(Array1::from_vec(eig))
    } else {
        Err(TbError::Lapack {
            routine: "zggev",
            info,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::{Array2, array};

    fn sorted_re(eig: &Array1<Complex<f64>>) -> Vec<f64> {
        let mut v: Vec<f64> = eig.iter().map(|x| x.re).collect();
        v.sort_by(|a, b| a.partial_cmp(b).unwrap());
        v
    }

    #[test]
    fn diagonal_pencil() {
        let a = array![
            [Complex::new(2.0, 0.0), Complex::new(0.0, 0.0)],
            [Complex::new(0.0, 0.0), Complex::new(3.0, 0.0)]
        ];
        let b = array![
            [Complex::new(1.0, 0.0), Complex::new(0.0, 0.0)],
            [Complex::new(0.0, 0.0), Complex::new(2.0, 0.0)]
        ];
        let eig = eig_gen(&a, &b).unwrap();
        let re = sorted_re(&eig);
        assert!((re[0] - 1.5).abs() < 1e-12);
        assert!((re[1] - 2.0).abs() < 1e-12);
        for x in eig.iter() {
            assert!(x.im.abs() < 1e-12);
        }
    }

    #[test]
    fn hermitian_pencil_with_identity() {
        let a = array![
            [Complex::new(2.0, 0.0), Complex::new(1.0, 0.0)],
            [Complex::new(1.0, 0.0), Complex::new(2.0, 0.0)]
        ];
        let b = array![
            [Complex::new(1.0, 0.0), Complex::new(0.0, 0.0)],
            [Complex::new(0.0, 0.0), Complex::new(1.0, 0.0)]
        ];
        let re = sorted_re(&eig_gen(&a, &b).unwrap());
        assert!((re[0] - 1.0).abs() < 1e-12);
        assert!((re[1] - 3.0).abs() < 1e-12);
    }

    #[test]
    fn size_mismatch_is_rejected() {
        let a = Array2::<Complex<f64>>::zeros((2, 2));
        let b = Array2::<Complex<f64>>::zeros((3, 3));
        assert!(eig_gen(&a, &b).is_err());
    }
}
