use std::path::{Path, PathBuf};

use indexmap::IndexSet;
use xlcore::{XlError, csv::write_fixed_csv, xtable::XTable};

use crate::{
    WriterOptions,
    writers::{
        CrossLinkWriter, by_descending_score, with_suffix, write_file, xvis::connects_residues,
    },
};

/// The xiNET CSV: one row per pair of linked peptides with the best scoring match, the score is shown as
/// `-log10(score)`
#[derive(Clone, Copy, Debug)]
pub(crate) struct XiNet;

const HEADER: [&str; 10] = [
    "Protein1", "PepPos1", "PepSeq1", "LinkPos1", "Protein2", "PepPos2", "PepSeq2", "LinkPos2",
    "Score", "Id",
];

/// The score as shown in xiNET, not defined for missing and non positive scores
fn xinet_score(score: Option<f64>) -> Option<f64> {
    score.filter(|s| *s > 0.0).map(|s| -s.log10())
}

impl CrossLinkWriter for XiNet {
    const TAG: &'static str = "xiNet";

    fn write(table: &XTable, out: &Path, _: &WriterOptions) -> Result<Vec<PathBuf>, XlError> {
        let mut seen = IndexSet::new();
        let optional = |v: Option<usize>| v.map(|v| v.to_string()).unwrap_or_default();
        let rows = by_descending_score(table.rows.iter().filter(|r| connects_residues(r)))
            .into_iter()
            .map(|row| {
                vec![
                    row.prot1.clone(),
                    optional(row.pos1),
                    row.pepseq1.clone(),
                    optional(row.xlink1),
                    row.prot2.clone().unwrap_or_else(|| row.prot1.clone()),
                    optional(row.pos2.or(row.pos1)),
                    row.pepseq2.clone().unwrap_or_else(|| row.pepseq1.clone()),
                    optional(row.xlink2),
                    xinet_score(row.score)
                        .map(|s| s.to_string())
                        .unwrap_or_default(),
                    row.id.clone().unwrap_or_default(),
                ]
            })
            // The proteins, peptide positions, peptides, and link positions identify a line
            .filter(|line| seen.insert(line[..8].to_vec()))
            .collect::<Vec<_>>();
        let path = with_suffix(out, ".csv");
        write_file(&path, |w| write_fixed_csv(w, &HEADER, rows, ','))?;
        Ok(vec![path])
    }
}
