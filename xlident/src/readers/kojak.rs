use std::path::Path;

use context_error::*;
use xlcore::{
    XlError,
    csv::{CsvLine, parse_csv},
    path::file_stem,
    xtable::Modification,
};

use crate::{
    ReaderOptions,
    draft::{DraftLink, DraftRow, Peptide, ProteinRef, pair_alternatives},
    helper_functions::{end_of_enclosure, optional_position, split_with_brackets},
    readers::CrossLinkReader,
};

/// Kojak `.kojak.txt` reports, a tab separated file with a single version banner line
#[derive(Clone, Copy, Debug)]
pub(crate) struct Kojak;

impl CrossLinkReader for Kojak {
    const ENGINE: &'static str = "Kojak";

    fn read_drafts(path: &Path, options: &ReaderOptions) -> Result<Vec<DraftRow>, XlError> {
        let rawfile = options
            .rawfile
            .clone()
            .unwrap_or_else(|| kojak_rawfile(path));
        parse_csv(path, b'\t', None, 1)?
            .filter_map(|line| {
                line.and_then(|line| parse_kojak_line(&line, &rawfile))
                    .transpose()
            })
            .collect()
    }
}

/// The raw file name for a Kojak report, the file name without `.kojak.txt`
pub(crate) fn kojak_rawfile(path: &Path) -> String {
    let stem = file_stem(path);
    stem.strip_suffix(".kojak").unwrap_or(&stem).to_string()
}

/// Parse a single line from a Kojak report, scans without identification result in `None`
pub(crate) fn parse_kojak_line(line: &CsvLine, rawfile: &str) -> Result<Option<DraftRow>, XlError> {
    let (peptide1, peptide1_index) = line.index_column(&["Peptide #1"])?;
    if peptide1.is_empty() || peptide1 == "-" {
        return Ok(None);
    }
    let column_error = |index: usize, long: String| {
        BoxedError::new(
            BasicKind::Error,
            "Invalid Kojak line",
            long,
            line.column_context(index),
        )
    };
    let (sequence, mods) =
        parse_kojak_peptide(peptide1).map_err(|long| column_error(peptide1_index, long))?;
    let link_position = |names: &[&str]| -> Result<Option<usize>, XlError> {
        line.column_index(names)
            .map_or(Ok(None), |index| {
                optional_position(&line[index]).map_err(|long| column_error(index, long))
            })
    };
    let xlink1 = link_position(&["Link #1"])?;
    let xlink2 = link_position(&["Link #2"])?;
    let peptide2 = line
        .column_index(&["Peptide #2"])
        .map(|index| (&line[index], index))
        .filter(|(p, _)| !p.is_empty() && *p != "-");

    let (protein1, protein1_index) = line.index_column(&["Protein #1"])?;
    let proteins1 = parse_kojak_proteins(protein1, line.get(&["Protein #1 Site"]), xlink1.is_some())
        .map_err(|long| column_error(protein1_index, long))?;

    let (link, proteins) = match (xlink1, peptide2) {
        (None, None) => (DraftLink::Linear, pair_alternatives(&proteins1, &[])),
        (Some(_), None) => (
            xlink2.map_or(DraftLink::Mono, |xlink2| DraftLink::Loop { xlink2 }),
            pair_alternatives(&proteins1, &[]),
        ),
        (Some(_), Some((peptide2, index))) => {
            let (sequence, mods) =
                parse_kojak_peptide(peptide2).map_err(|long| column_error(index, long))?;
            let (protein2, protein2_index) = line.index_column(&["Protein #2"])?;
            let proteins2 = parse_kojak_proteins(protein2, line.get(&["Protein #2 Site"]), true)
                .map_err(|long| column_error(protein2_index, long))?;
            (
                DraftLink::Cross {
                    beta: Peptide {
                        sequence,
                        xlink: xlink2,
                        mods,
                    },
                },
                pair_alternatives(&proteins1, &proteins2),
            )
        }
        (None, Some(_)) => {
            return Err(BoxedError::new(
                BasicKind::Error,
                "Invalid Kojak line",
                "A cross-linked peptide pair has to have a link position on the first peptide",
                line.full_context(),
            ));
        }
    };

    Ok(Some(DraftRow {
        line_index: Some(line.line_index()),
        rawfile: Some(rawfile.to_string()),
        scanno: line.parse_optional(&["Scan Number", "Scan"], "scan number")?,
        prec_ch: line.parse_optional(&["Charge"], "charge")?,
        score: line.parse_optional(&["Score"], "score")?,
        alpha: Peptide {
            sequence,
            xlink: xlink1,
            mods,
        },
        link,
        proteins,
        ..DraftRow::default()
    }))
}

/// Parse a Kojak peptide with inline mass modifications like `AC[57.02]DEF[15.99]G`. A leading
/// `n` marks N-terminal modifications, a trailing `c` marks C-terminal modifications.
pub(crate) fn parse_kojak_peptide(text: &str) -> Result<(String, Vec<Modification>), String> {
    let text = text.trim();
    let mut sequence = String::new();
    let mut mods = Vec::new();
    let mut c_term = false;
    let mut index = 0;
    while index < text.len() {
        let byte = text.as_bytes()[index];
        match byte {
            b'[' => {
                let end = end_of_enclosure(text, index + 1, b'[', b']').ok_or_else(|| {
                    format!("The modification bracket at {index} in '{text}' is never closed")
                })?;
                let inner = text[index + 1..end].trim();
                let mass = inner.parse::<f64>().map_err(|_| {
                    format!("The modification '{inner}' in '{text}' is not a valid mass")
                })?;
                let position = if c_term {
                    sequence.len() + 1
                } else {
                    sequence.len()
                };
                mods.push(Modification::new(inner, position, mass));
                index = end + 1;
            }
            b'n' if sequence.is_empty() => index += 1,
            b'c' if !sequence.is_empty() => {
                c_term = true;
                index += 1;
            }
            b if b.is_ascii_uppercase() && !c_term => {
                sequence.push(b as char);
                index += 1;
            }
            _ => {
                return Err(format!(
                    "The character '{}' at {index} in '{text}' is not valid in a Kojak peptide",
                    text[index..].chars().next().unwrap_or_default()
                ));
            }
        }
    }
    if sequence.is_empty() {
        return Err(format!("The Kojak peptide '{text}' does not have any residues"));
    }
    Ok((sequence, mods))
}

/// Parse a Kojak protein list `Name(42);Name(7);`. The number is the position of the linked
/// residue for linked peptides, and the start of the peptide otherwise. When the names do not
/// carry a position the separate site column is used, if present.
pub(crate) fn parse_kojak_proteins(
    text: &str,
    sites: Option<&str>,
    linked: bool,
) -> Result<Vec<ProteinRef>, String> {
    if text.trim() == "-" {
        return Ok(Vec::new());
    }
    let sites = sites
        .map(|s| split_with_brackets(s, b';', b'(', b')'))
        .unwrap_or_default();
    split_with_brackets(text, b';', b'(', b')')
        .into_iter()
        .enumerate()
        .map(|(index, protein)| {
            let (name, position) = if let Some(open) = protein.rfind('(')
                && protein.ends_with(')')
            {
                let number = &protein[open + 1..protein.len() - 1];
                let position = number.trim().parse::<usize>().map_err(|_| {
                    format!("The protein position '{number}' in '{protein}' is not a valid number")
                })?;
                (protein[..open].trim(), Some(position))
            } else {
                (
                    protein,
                    sites
                        .get(index)
                        .or_else(|| sites.first())
                        .and_then(|s| s.parse::<usize>().ok()),
                )
            };
            Ok(if linked {
                ProteinRef::at_xpos(name, position)
            } else {
                ProteinRef::at_pos(name, position)
            })
        })
        .collect()
}
