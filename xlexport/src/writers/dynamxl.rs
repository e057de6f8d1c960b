use std::{
    io::Write,
    path::{Path, PathBuf},
};

use xlcore::{
    XlError,
    xtable::{XTable, XTableRow},
};

use crate::{
    WriterOptions,
    writers::{
        CrossLinkWriter, linked_residue, with_suffix, write_file, xvis::connects_residues,
    },
};

/// The DynamXL restraint list: tab separated without header, `residue atom residue atom score`
#[derive(Clone, Copy, Debug)]
pub(crate) struct DynamXl;

/// The residue identifier (`K104`) and atom (`NZ` for lysine, `CA` otherwise) for one side
fn endpoint(row: &XTableRow, side: usize) -> Option<(String, &'static str)> {
    let position = if side == 1 { row.xpos1 } else { row.xpos2 }?;
    let residue = linked_residue(row, side).unwrap_or('X');
    let atom = if residue == 'K' { "NZ" } else { "CA" };
    Some((format!("{residue}{position}"), atom))
}

impl CrossLinkWriter for DynamXl {
    const TAG: &'static str = "DynamXL";

    fn write(table: &XTable, out: &Path, _: &WriterOptions) -> Result<Vec<PathBuf>, XlError> {
        let lines = table
            .rows
            .iter()
            .filter(|r| connects_residues(r))
            .filter_map(|row| {
                let (id1, atom1) = endpoint(row, 1)?;
                let (id2, atom2) = endpoint(row, 2)?;
                Some(format!(
                    "{id1}\t{atom1}\t{id2}\t{atom2}\t{:.3}",
                    row.score.unwrap_or_default()
                ))
            })
            .collect::<Vec<_>>();
        let path = with_suffix(out, ".txt");
        write_file(&path, |w| {
            for line in lines {
                writeln!(w, "{line}")?;
            }
            Ok(())
        })?;
        Ok(vec![path])
    }
}
