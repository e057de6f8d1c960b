use std::path::{Path, PathBuf};

use itertools::Itertools;
use xlcore::{
    XlError,
    csv::write_fixed_csv,
    xtable::{CANONICAL_COLUMNS, XTable},
};

use crate::{
    WriterOptions,
    writers::{CrossLinkWriter, with_suffix, write_file},
};

/// The canonical table as CSV, with only the canonical columns or (with `keep`) all columns
#[derive(Clone, Copy, Debug)]
pub(crate) struct XTableWriter;

impl CrossLinkWriter for XTableWriter {
    const TAG: &'static str = "xTable";

    fn write(
        table: &XTable,
        out: &Path,
        options: &WriterOptions,
    ) -> Result<Vec<PathBuf>, XlError> {
        let columns = if options.keep {
            CANONICAL_COLUMNS
                .iter()
                .map(ToString::to_string)
                .chain(
                    table
                        .columns
                        .iter()
                        .filter(|c| !CANONICAL_COLUMNS.contains(&c.as_str()))
                        .cloned(),
                )
                .chain(table.extra_columns())
                .unique()
                .collect_vec()
        } else {
            CANONICAL_COLUMNS.iter().map(ToString::to_string).collect_vec()
        };
        let path = with_suffix(out, ".csv");
        write_file(&path, |w| {
            write_fixed_csv(
                w,
                &columns.iter().map(String::as_str).collect_vec(),
                table.rows.iter().map(|row| {
                    columns
                        .iter()
                        .map(|c| row.cell(c).unwrap_or_default())
                        .collect_vec()
                }),
                ',',
            )
        })?;
        Ok(vec![path])
    }
}

#[cfg(test)]
mod tests {
    use xlcore::xtable::SPLIT_ENTRY;

    use super::*;
    use crate::writers::test::table;

    #[test]
    fn canonical_only() {
        let directory = tempfile::tempdir().unwrap();
        let mut table = table();
        table.rows[1]
            .extras
            .insert(SPLIT_ENTRY.to_string(), "true".to_string());
        let table = XTable::new(table.rows);
        let out = directory.path().join("sample");
        let written = XTableWriter::write(&table, &out, &WriterOptions::default()).unwrap();
        let text = std::fs::read_to_string(&written[0]).unwrap();
        let mut lines = text.lines();
        assert_eq!(lines.next(), Some(CANONICAL_COLUMNS.join(",").as_str()));
        assert_eq!(
            lines.next(),
            Some(
                "run1,1001,3,MTDSKYFTTNK,,5,,,,,,,,,ProtA,,38,,42,,mono,27.3,ProtA-42,false,Kojak"
            )
        );
        assert_eq!(
            lines.next(),
            Some(
                "run1,1002,4,PEPKTIDE,LKPEPR,4,2,,Acetyl[AnyN-term],,0,,42.010565,,ProtA,ProtB,7,19,10,20,inter,5,ProtA-10-ProtB-20,false,Kojak"
            )
        );
        assert_eq!(text.lines().count(), 6);

        let options = WriterOptions {
            keep: true,
            ..WriterOptions::default()
        };
        let written = XTableWriter::write(&table, &out, &options).unwrap();
        let text = std::fs::read_to_string(&written[0]).unwrap();
        let header = text.lines().next().unwrap();
        assert!(header.ends_with(",search_engine,split_entry"));
        assert!(text.lines().nth(2).unwrap().ends_with(",Kojak,true"));
        assert!(text.lines().nth(1).unwrap().ends_with(",Kojak,"));
    }
}
