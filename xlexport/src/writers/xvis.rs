use std::path::{Path, PathBuf};

use indexmap::IndexSet;
use xlcore::{
    XlError,
    csv::write_fixed_csv,
    xtable::{LinkType, XTable, XTableRow},
};

use crate::{
    WriterOptions,
    writers::{CrossLinkWriter, by_descending_score, with_suffix, write_file},
};

/// The xVis table: one row per unique residue pair, with the best score for that pair
#[derive(Clone, Copy, Debug)]
pub(crate) struct XVis;

/// The columns of an xVis file
const HEADER: [&str; 5] = ["Protein1", "Protein2", "AbsPos1", "AbsPos2", "Id-Score"];

/// Mono-links and linear peptides do not connect two residues and cannot be shown in xVis
pub(crate) fn connects_residues(row: &XTableRow) -> bool {
    row.link_type.is_cross_link() || row.link_type == LinkType::Loop
}

impl CrossLinkWriter for XVis {
    const TAG: &'static str = "xVis";

    fn write(table: &XTable, out: &Path, _: &WriterOptions) -> Result<Vec<PathBuf>, XlError> {
        let mut seen = IndexSet::new();
        let rows = by_descending_score(table.rows.iter().filter(|r| connects_residues(r)))
            .into_iter()
            .filter_map(|row| {
                let protein2 = row.prot2.clone().unwrap_or_else(|| row.prot1.clone());
                let key = (row.prot1.clone(), protein2, row.xpos1?, row.xpos2?);
                seen.insert(key.clone()).then(|| {
                    vec![
                        key.0,
                        key.1,
                        key.2.to_string(),
                        key.3.to_string(),
                        row.score.map(|s| s.to_string()).unwrap_or_default(),
                    ]
                })
            })
            .collect::<Vec<_>>();
        log::debug!(
            "xVis keeps {} of {} rows after removing duplicate links",
            rows.len(),
            table.len()
        );
        let path = with_suffix(out, ".csv");
        write_file(&path, |w| write_fixed_csv(w, &HEADER, rows, ','))?;
        Ok(vec![path])
    }
}
