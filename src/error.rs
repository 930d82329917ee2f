//! src/error.rs
//! Centralized error types for the tight-binding post-processing library.
//! Every fatal condition in the pipeline is a variant here; numerical-quality
//! issues that allow execution to continue are logged instead (see the
//! builder and interpolator modules).

use thiserror::Error;

/// The primary error type for all fallible operations in this library.
#[derive(Error, Debug)]
pub enum TbError {
    // --- I/O ---
    #[error("I/O error")]
    Io(#[from] std::io::Error),

    // --- Linear algebra ---
    #[error("Linear algebra operation failed")]
    Linalg(#[from] ndarray_linalg::error::LinalgError),

    #[error("LAPACK routine '{routine}' failed with non-zero info code: {info}")]
    Lapack {
        routine: &'static str,
        info: i32,
    },

    // --- Invalid input and configuration ---
    #[error("Dimension mismatch for '{context}': expected {expected}, got {found}")]
    DimensionMismatch {
        context: String,
        expected: usize,
        found: usize,
    },

    #[error("The lattice vectors are degenerate (non-invertible matrix)")]
    SingularLattice,

    #[error("Requested {requested} bands but only {available} are available")]
    InvalidBandCount { requested: usize, available: usize },

    #[error("Shift mode '{0}' is not recognized; only 0 (regular) and 1 (generalized) are accepted")]
    InvalidShiftMode(u8),

    #[error("A non-orthogonal basis requires an overlap matrix, but none was provided")]
    MissingOverlap,

    #[error("Windowed Hamiltonian construction requires projection matrices, but none were provided")]
    MissingProjections,

    #[error("Basis kind '{0}' is not accepted here; only 'ortho' and 'nonortho' windowed bases can be built")]
    InvalidBasisKind(&'static str),

    #[error("An overlap matrix was provided for basis kind '{0}', which stores none")]
    UnexpectedOverlap(&'static str),

    // --- Corrupted upstream data ---
    #[error("Found a NaN projection coefficient at ik = {ik}, ispin = {ispin}")]
    NanProjection { ik: usize, ispin: usize },

    // --- Internal consistency (geometry-search bugs, not recoverable) ---
    #[error("Wigner-Seitz point count mismatch: collected {collected} vectors but counted {counted}")]
    WignerSeitzCount { collected: usize, counted: usize },

    #[error("Wigner-Seitz degeneracy sum {sum} does not match the mesh size {expected}; some points are missing from the cell")]
    WignerSeitzWeightSum { sum: f64, expected: f64 },
}

/// A specialized `Result` type for this library's operations.
pub type Result<T> = std::result::Result<T, TbError>;
