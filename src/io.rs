//! Plain-text writers for the numeric tables the plotting side consumes.
//! The band format is one `dk energy` pair per line, bands separated by a
//! blank line, one file per spin channel labeled with the basis-kind and
//! cell-type tags.

use crate::error::Result;
use crate::generics::usefloat;
use crate::interpolate::BandStructure;
use ndarray::{Array1, Array2};
use std::fs::File;
use std::io::Write;
use std::path::Path;

/// Fixed-point table, one matrix row per line, columns sign-aligned so
/// positive and negative entries line up.
pub fn write_txt<T: usefloat>(data: &Array2<T>, output: &str) -> Result<()> {
    let mut buf = String::new();
    for row in data.rows() {
        for x in row.iter() {
            buf.push_str(if *x >= T::from(0.0) { "     " } else { "    " });
            buf.push_str(&format!("{:.6}", x));
        }
        buf.push('\n');
    }
    File::create(output)?.write_all(buf.as_bytes())?;
    Ok(())
}

/// One entry per line, sign-aligned like [`write_txt`].
pub fn write_txt_1<T: usefloat>(data: &Array1<T>, output: &str) -> Result<()> {
    let mut buf = String::new();
    for x in data.iter() {
        if *x >= T::from(0.0) {
            buf.push(' ');
        }
        buf.push_str(&format!("{:.6}\n", x));
    }
    File::create(output)?.write_all(buf.as_bytes())?;
    Ok(())
}

/// Write `bands<suffix>_<basis>_<cell>.txt` under `dir`, one file per spin.
/// Each band is a block of `dk energy` rows against the cumulative k-path
/// distance, blocks separated by blank lines (gnuplot convention).
pub fn write_band_dat(bands: &BandStructure, dir: &str) -> Result<()> {
    for ispin in 0..bands.nspin() {
        let suffix = if bands.nspin() == 1 {
            ""
        } else if ispin == 0 {
            "_up"
        } else {
            "_dn"
        };
        let fname = format!(
            "bands{}_{}_{}.txt",
            suffix,
            bands.basis().label(),
            bands.cell_type().label()
        );
        let mut file = File::create(Path::new(dir).join(fname))?;
        let mut buf = String::new();
        for ib in 0..bands.nbands() {
            for ik in 0..bands.nkpnts() {
                buf.push_str(&format!(
                    "{:.6} {:.6}\n",
                    bands.k_dist()[[ik]],
                    bands.energies()[[ispin, ik, ib]]
                ));
            }
            buf.push('\n');
        }
        write!(file, "{}", buf)?;
    }
    Ok(())
}
