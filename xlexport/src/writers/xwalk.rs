use std::{
    io::Write,
    path::{Path, PathBuf},
};

use indexmap::{IndexMap, IndexSet};
use xlcore::{
    XlError,
    reference::three_letter_code,
    xtable::{XTable, XTableRow},
};

use crate::{
    WriterOptions,
    writers::{
        CrossLinkWriter, linked_residue, precondition, with_suffix, write_file,
        xvis::connects_residues,
    },
};

/// xWalk distance requests, one file per combination of protein chains
#[derive(Clone, Copy, Debug)]
pub(crate) struct XWalk;

/// One end of a link in the structure: residue name, residue number, chain
#[derive(Clone, Debug, Hash, PartialEq, Eq)]
pub(crate) struct Endpoint {
    residue: &'static str,
    number: i64,
    chain: char,
}

/// The file a link between two chains is written to: protein A, chain A, protein B, chain B
type FileKey = (String, char, String, char);

/// Check the xWalk options, returns the pdb file name
fn check_options(options: &WriterOptions) -> Result<&str, XlError> {
    let pdb = options
        .pdb
        .as_deref()
        .ok_or_else(|| precondition(XWalk::TAG, "xWalk needs the 'pdb' option to be set"))?;
    if !pdb.to_ascii_lowercase().ends_with(".pdb") {
        return Err(precondition(
            XWalk::TAG,
            format!("The pdb file '{pdb}' does not end in '.pdb'"),
        ));
    }
    if options.atom.is_empty() || options.atom.chars().count() > 4 {
        return Err(precondition(
            XWalk::TAG,
            format!(
                "The atom '{}' has to be between one and four characters",
                options.atom
            ),
        ));
    }
    if options.chains.is_empty() {
        return Err(precondition(
            XWalk::TAG,
            "xWalk needs the 'chains' option to map proteins to chains",
        ));
    }
    Ok(pdb)
}

/// A file name safe version of a protein name
fn sanitise(name: &str) -> String {
    name.chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '-' || c == '.' {
                c
            } else {
                '_'
            }
        })
        .collect()
}

/// The residue name and number for one side of a link, `None` if the position is unknown or
/// falls before the start of the structure
fn residue(row: &XTableRow, side: usize, offset: i64) -> Option<(&'static str, i64)> {
    let position = if side == 1 { row.xpos1 } else { row.xpos2 }?;
    let number = i64::try_from(position).ok()? + offset;
    if number < 1 {
        log::warn!(
            "Skipping link {} for xWalk, the offset moves residue {position} to {number}",
            row.id.as_deref().unwrap_or_default()
        );
        return None;
    }
    let name = linked_residue(row, side)
        .and_then(three_letter_code)
        .unwrap_or_else(|| {
            log::warn!(
                "Unknown residue on side {side} of link {} for xWalk, written as LYS",
                row.id.as_deref().unwrap_or_default()
            );
            "LYS"
        });
    Some((name, number))
}

/// Group all unique links on the chain combination they belong to
fn group_links(
    table: &XTable,
    options: &WriterOptions,
) -> IndexMap<FileKey, IndexSet<(Endpoint, Endpoint)>> {
    let mut files: IndexMap<FileKey, IndexSet<(Endpoint, Endpoint)>> = IndexMap::new();
    for row in table.rows.iter().filter(|r| connects_residues(r)) {
        let protein1 = row.prot1.as_str();
        let protein2 = row.prot2.as_deref().unwrap_or(protein1);
        let (Some(chains1), Some(chains2)) =
            (options.chains.get(protein1), options.chains.get(protein2))
        else {
            log::debug!("No chains given for the proteins of link {protein1}-{protein2}");
            continue;
        };
        let (Some((residue1, number1)), Some((residue2, number2))) = (
            residue(row, 1, options.offset),
            residue(row, 2, options.offset),
        ) else {
            continue;
        };
        for chain1 in chains1.chars() {
            for chain2 in chains2.chars() {
                let first = Endpoint {
                    residue: residue1,
                    number: number1,
                    chain: chain1,
                };
                let second = Endpoint {
                    residue: residue2,
                    number: number2,
                    chain: chain2,
                };
                if first == second {
                    continue;
                }
                files
                    .entry((protein1.to_string(), chain1, protein2.to_string(), chain2))
                    .or_default()
                    .insert((first, second));
            }
        }
    }
    files
}

impl CrossLinkWriter for XWalk {
    const TAG: &'static str = "xWalk";

    fn write(
        table: &XTable,
        out: &Path,
        options: &WriterOptions,
    ) -> Result<Vec<PathBuf>, XlError> {
        let pdb = check_options(options)?;
        let atom = options.atom.as_str();
        let files = group_links(table, options);
        if files.is_empty() {
            log::warn!("No links could be placed on the chains of {pdb}");
        }
        let mut written = Vec::with_capacity(files.len());
        for ((protein1, chain1, protein2, chain2), links) in files {
            let path = with_suffix(
                out,
                &format!(
                    "_{}{chain1}_{}{chain2}.tsv",
                    sanitise(&protein1),
                    sanitise(&protein2)
                ),
            );
            write_file(&path, |w| {
                writeln!(w, "Index\tFile_name\tAtom_Info_1\tAtom_Info_2")?;
                for (index, (first, second)) in links.iter().enumerate() {
                    writeln!(
                        w,
                        "{}\t{pdb}\t{}-{}-{}-{atom}\t{}-{}-{}-{atom}",
                        index + 1,
                        first.residue,
                        first.number,
                        first.chain,
                        second.residue,
                        second.number,
                        second.chain,
                    )?;
                }
                Ok(())
            })?;
            written.push(path);
        }
        Ok(written)
    }
}
