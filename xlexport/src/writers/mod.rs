//! The tool specific writers, each projects the xTable into the format of a single tool

use std::{
    ffi::OsString,
    io::{BufWriter, Write},
    path::{Path, PathBuf},
};

use context_error::*;
use ordered_float::OrderedFloat;
use xlcore::{
    XlError,
    path::{create_file, io_error},
    xtable::{XTable, XTableRow},
};

use crate::WriterOptions;

mod custom;
mod dynamxl;
mod plabel;
mod xinet;
mod xtable;
mod xvis;
mod xwalk;

#[cfg(test)]
mod plabel_tests;

pub(crate) use custom::CustomTable;
pub(crate) use dynamxl::DynamXl;
pub(crate) use plabel::PLabel;
pub(crate) use xinet::XiNet;
pub(crate) use xtable::XTableWriter;
pub(crate) use xvis::XVis;
pub(crate) use xwalk::XWalk;

/// A writer for the input format of a single tool
pub(crate) trait CrossLinkWriter {
    /// The tag for this writer, used in output file names
    const TAG: &'static str;

    /// Write the table, the output path is the base path without extension. Returns all files
    /// that were written.
    /// # Errors
    /// If a precondition does not hold (checked before anything is written) or writing failed.
    fn write(
        table: &XTable,
        out: &Path,
        options: &WriterOptions,
    ) -> Result<Vec<PathBuf>, XlError>;
}

/// Append an extension to a path, keeping any dots that are already in the file name
pub(crate) fn with_suffix(out: &Path, suffix: &str) -> PathBuf {
    let mut name = OsString::from(out.as_os_str());
    name.push(suffix);
    PathBuf::from(name)
}

/// The error for an option or table that does not allow writing in this format
pub(crate) fn precondition(tag: &str, long: impl Into<String>) -> XlError {
    BoxedError::new(
        BasicKind::Error,
        format!("Cannot write {tag}"),
        long.into(),
        Context::none(),
    )
}

/// Create the file and write its contents with a buffered writer
pub(crate) fn write_file(
    path: &Path,
    contents: impl FnOnce(&mut BufWriter<std::fs::File>) -> std::io::Result<()>,
) -> Result<(), XlError> {
    let mut writer = BufWriter::new(create_file(path)?);
    contents(&mut writer).map_err(|e| io_error(path, &e))?;
    writer.flush().map_err(|e| io_error(path, &e))
}

/// Sort rows on descending score, rows without score are placed last. The sort is stable.
pub(crate) fn by_descending_score<'a>(
    rows: impl IntoIterator<Item = &'a XTableRow>,
) -> Vec<&'a XTableRow> {
    let mut rows: Vec<_> = rows.into_iter().collect();
    rows.sort_by_key(|row| std::cmp::Reverse(row.score.map(OrderedFloat)));
    rows
}

/// The residue at the link position of the given side, if known
pub(crate) fn linked_residue(row: &XTableRow, side: usize) -> Option<char> {
    let (sequence, xlink) = if side == 1 {
        (Some(row.pepseq1.as_str()), row.xlink1)
    } else {
        (row.pepseq2.as_deref(), row.xlink2)
    };
    sequence?.chars().nth(xlink?.checked_sub(1)?)
}

#[cfg(test)]
pub(crate) mod test {
    use xlcore::xtable::{LinkType, Modification, XTable, XTableRow};

    /// A table with a mono-link, a loop-link, two matches for the same inter-link, and an
    /// intra-link
    pub(crate) fn table() -> XTable {
        let inter = |scan: usize, score: f64| XTableRow {
            rawfile: Some("run1".to_string()),
            scanno: Some(scan),
            prec_ch: Some(4),
            pepseq1: "PEPKTIDE".to_string(),
            pepseq2: Some("LKPEPR".to_string()),
            xlink1: Some(4),
            xlink2: Some(2),
            mods1: vec![Modification::new("Acetyl[AnyN-term]", 0, 42.010_565)],
            prot1: "ProtA".to_string(),
            prot2: Some("ProtB".to_string()),
            pos1: Some(7),
            pos2: Some(19),
            xpos1: Some(10),
            xpos2: Some(20),
            link_type: LinkType::Inter,
            score: Some(score),
            id: Some("ProtA-10-ProtB-20".to_string()),
            search_engine: "Kojak".to_string(),
            ..XTableRow::default()
        };
        XTable::new(vec![
            XTableRow {
                rawfile: Some("run1".to_string()),
                scanno: Some(1001),
                prec_ch: Some(3),
                pepseq1: "MTDSKYFTTNK".to_string(),
                xlink1: Some(5),
                prot1: "ProtA".to_string(),
                pos1: Some(38),
                xpos1: Some(42),
                link_type: LinkType::Mono,
                score: Some(27.3),
                id: Some("ProtA-42".to_string()),
                search_engine: "Kojak".to_string(),
                ..XTableRow::default()
            },
            inter(1002, 5.0),
            inter(1003, 8.0),
            XTableRow {
                rawfile: Some("run2".to_string()),
                scanno: Some(2001),
                prec_ch: Some(2),
                pepseq1: "KPEPKR".to_string(),
                pepseq2: Some("KPEPKR".to_string()),
                xlink1: Some(1),
                xlink2: Some(5),
                prot1: "ProtA".to_string(),
                prot2: Some("ProtA".to_string()),
                pos1: Some(10),
                pos2: Some(10),
                xpos1: Some(10),
                xpos2: Some(14),
                link_type: LinkType::Loop,
                score: Some(2.0),
                id: Some("ProtA-10".to_string()),
                search_engine: "Kojak".to_string(),
                ..XTableRow::default()
            },
            XTableRow {
                rawfile: Some("run2".to_string()),
                scanno: Some(2002),
                prec_ch: Some(3),
                pepseq1: "AKR".to_string(),
                pepseq2: Some("GGSKR".to_string()),
                xlink1: Some(2),
                xlink2: Some(4),
                prot1: "ProtB".to_string(),
                prot2: Some("ProtB".to_string()),
                pos1: Some(50),
                pos2: Some(80),
                xpos1: Some(51),
                xpos2: Some(83),
                link_type: LinkType::Intra,
                score: None,
                id: Some("ProtB-51-ProtB-83".to_string()),
                search_engine: "Kojak".to_string(),
                ..XTableRow::default()
            },
        ])
    }
}

#[cfg(test)]
mod tests {
    use std::path::Path;

    use super::*;

    #[test]
    fn suffix() {
        assert_eq!(
            with_suffix(Path::new("out/run.1_Kojak_to_xVis"), ".csv"),
            Path::new("out/run.1_Kojak_to_xVis.csv")
        );
    }

    #[test]
    fn score_order() {
        let table = test::table();
        let sorted = by_descending_score(&table.rows)
            .into_iter()
            .map(|r| r.scanno)
            .collect::<Vec<_>>();
        assert_eq!(
            sorted,
            vec![Some(1001), Some(1003), Some(1002), Some(2001), Some(2002)]
        );
    }

    #[test]
    fn residues() {
        let table = test::table();
        assert_eq!(linked_residue(&table.rows[0], 1), Some('K'));
        assert_eq!(linked_residue(&table.rows[1], 2), Some('K'));
        assert_eq!(linked_residue(&table.rows[0], 2), None);
    }
}
