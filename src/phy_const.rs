#![allow(non_upper_case_globals)]
pub const Ry2eV: f64 = 13.60569193;
pub const Ha2eV: f64 = 2.0 * Ry2eV;
