use std::{
    collections::HashMap,
    path::{Path, PathBuf},
    sync::LazyLock,
};

use context_error::*;
use regex::Regex;
use xlcore::{
    XlError,
    csv::{CsvLine, parse_csv},
    mgf::parse_title,
    path::read_to_string,
    reference::{AminoAcidTable, ElementTable, MassMode},
    xtable::Modification,
};

use crate::{
    ReaderOptions,
    draft::{DraftLink, DraftRow, Peptide, ProteinRef},
    helper_functions::{line_error, parse_charge},
    readers::CrossLinkReader,
};

/// A StavroX result table (`;` separated, with positional columns)
#[derive(Clone, Copy, Debug)]
pub(crate) struct StavroX;

/// The positional columns of a StavroX result, the header line in the file is not used
const COLUMNS: [&str; 26] = [
    "score",
    "m/z",
    "charge",
    "m+h+",
    "calculated m+h+",
    "ppm",
    "peptide1",
    "protein1",
    "from1",
    "to1",
    "peptide2",
    "protein2",
    "from2",
    "to2",
    "scan",
    "linkage1",
    "linkage2",
    "retention time",
    "fragments",
    "alpha fragments",
    "beta fragments",
    "cross-linker",
    "candidates",
    "best",
    "decoy",
    "comment",
];

const STANDARD_RESIDUES: &str = "ACDEFGHIKLMNPQRSTVWY";

static SCAN: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?i)scan[= ](\d+)").unwrap());

/// The non standard residues defined in a StavroX `properties.ssf` file
#[derive(Clone, Debug, Default, PartialEq)]
pub(crate) struct SsfTable {
    /// symbol -> (unmodified residue, mass difference)
    residues: HashMap<char, (char, f64)>,
}

impl SsfTable {
    /// Parse a `properties.ssf` file. Element masses are read from the `ELEMENTS` section
    /// (`symbol;mass`), residues from the `AMINOACIDS` section (`symbol;formula;base`).
    /// # Errors
    /// If a line is malformed, an element is unknown, or the base residue is unknown.
    pub(crate) fn parse(text: &str, source: &Path) -> Result<Self, XlError> {
        let mut elements = ElementTable::default();
        let amino_acids = AminoAcidTable::default();
        let mut residues = HashMap::new();
        let mut section = "";
        for (index, line) in text.lines().enumerate() {
            let error = |long: String| {
                BoxedError::new(
                    BasicKind::Error,
                    "Invalid StavroX properties",
                    long,
                    Context::full_line(index as u32, line)
                        .source(source.to_string_lossy())
                        .to_owned(),
                )
            };
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }
            let upper = line.to_ascii_uppercase();
            if upper == "ELEMENTS" || upper == "AMINOACIDS" {
                section = if upper == "ELEMENTS" {
                    "elements"
                } else {
                    "aminoacids"
                };
                continue;
            }
            if upper.starts_with("END") || !line.contains(';') {
                section = "";
                continue;
            }
            let fields = line.split(';').map(str::trim).collect::<Vec<_>>();
            match section {
                "elements" => {
                    let mass = fields
                        .get(1)
                        .and_then(|m| m.parse::<f64>().ok())
                        .ok_or_else(|| error("An element should be defined as 'symbol;mass'".to_string()))?;
                    elements.insert(fields[0], mass);
                }
                "aminoacids" => {
                    let mut symbol = fields[0].chars();
                    let (Some(symbol), None) = (symbol.next(), symbol.next()) else {
                        return Err(error(format!(
                            "The residue symbol '{}' should be a single character",
                            fields[0]
                        )));
                    };
                    if STANDARD_RESIDUES.contains(symbol) {
                        continue;
                    }
                    let formula = fields.get(1).ok_or_else(|| {
                        error("A residue should be defined as 'symbol;formula;base'".to_string())
                    })?;
                    let base = fields
                        .get(2)
                        .and_then(|b| {
                            let mut chars = b.chars();
                            match (chars.next(), chars.next()) {
                                (Some(c), None) if c.is_ascii_uppercase() => Some(c),
                                _ => None,
                            }
                        })
                        .unwrap_or_else(|| symbol.to_ascii_uppercase());
                    let base_mass = amino_acids
                        .mass(base, MassMode::Monoisotopic)
                        .ok_or_else(|| {
                            error(format!(
                                "The residue '{symbol}' is based on the unknown residue '{base}'"
                            ))
                        })?;
                    let mass = elements
                        .formula_mass(formula)
                        .map_err(|err| error(format!("The formula '{formula}' is invalid")).add_underlying_errors(vec![err]))?;
                    residues.insert(symbol, (base, mass - base_mass));
                }
                _ => (),
            }
        }
        Ok(Self { residues })
    }

    /// Load the properties file
    /// # Errors
    /// If the file is missing or invalid.
    pub(crate) fn load(path: &Path) -> Result<Self, XlError> {
        if !path.exists() {
            return Err(BoxedError::new(
                BasicKind::Error,
                "Missing companion file",
                format!(
                    "The StavroX properties file '{}' is needed to resolve modified residues but it does not exist",
                    path.display()
                ),
                Context::default().source(path.to_string_lossy()).to_owned(),
            ));
        }
        Self::parse(&read_to_string(path)?, path)
    }

    /// Get the base residue and mass difference for a non standard residue
    pub(crate) fn residue(&self, symbol: char) -> Option<(char, f64)> {
        self.residues.get(&symbol).copied()
    }
}

/// Find the properties file, either the given one or `properties.ssf` next to the input
fn ssf_path(path: &Path, options: &ReaderOptions) -> PathBuf {
    options.ssf_file.clone().unwrap_or_else(|| {
        path.parent()
            .unwrap_or_else(|| Path::new(""))
            .join("properties.ssf")
    })
}

/// Remove the terminal markers and resolve all non standard residues into modifications. The
/// properties file is only loaded when a non standard residue is found.
fn stavrox_peptide(
    text: &str,
    ssf: &mut Option<SsfTable>,
    ssf_path: &Path,
) -> Result<(String, Vec<Modification>), XlError> {
    let mut sequence = String::with_capacity(text.len());
    let mut mods = Vec::new();
    for residue in text.chars().filter(|c| !matches!(c, '[' | ']' | '{' | '}')) {
        if STANDARD_RESIDUES.contains(residue) {
            sequence.push(residue);
            continue;
        }
        if ssf.is_none() {
            log::debug!("Loading StavroX properties from '{}'", ssf_path.display());
            *ssf = Some(SsfTable::load(ssf_path)?);
        }
        let (base, delta) = ssf
            .as_ref()
            .and_then(|table| table.residue(residue))
            .ok_or_else(|| {
                BoxedError::new(
                    BasicKind::Error,
                    "Unknown residue",
                    format!(
                        "The residue '{residue}' in '{text}' is not defined in the StavroX properties"
                    ),
                    Context::default().source(ssf_path.to_string_lossy()).to_owned(),
                )
            })?;
        sequence.push(base);
        mods.push(Modification::new(
            residue.to_string(),
            sequence.len(),
            delta,
        ));
    }
    Ok((sequence, mods))
}

/// Parse a StavroX linkage `K104` into the absolute position
pub(crate) fn parse_linkage(text: &str) -> Result<usize, String> {
    let text = text.trim();
    let digits = text.trim_start_matches(|c: char| !c.is_ascii_digit());
    if digits.len() == text.len() || digits.is_empty() {
        return Err(format!(
            "The linkage '{text}' should be a residue followed by the position, like 'K104'"
        ));
    }
    digits
        .parse()
        .map_err(|_| format!("The linkage '{text}' does not end in a valid position"))
}

fn stavrox_scan(text: &str) -> Option<(Option<String>, usize)> {
    parse_title(text)
        .map(|(raw, scan, _)| (raw, scan))
        .or_else(|| {
            SCAN.captures(text)
                .and_then(|c| c[1].parse().ok())
                .map(|scan| (None, scan))
        })
}

fn position_in_peptide(line: &CsvLine, absolute: usize, start: usize) -> Result<usize, XlError> {
    (absolute + 1).checked_sub(start).ok_or_else(|| {
        line_error(
            line,
            "Invalid StavroX line",
            format!("The linkage position {absolute} is before the start of the peptide ({start})"),
        )
    })
}

impl CrossLinkReader for StavroX {
    const ENGINE: &'static str = "StavroX";

    fn read_drafts(path: &Path, options: &ReaderOptions) -> Result<Vec<DraftRow>, XlError> {
        let ssf_path = ssf_path(path, options);
        let mut ssf = None;
        let mut drafts = Vec::new();
        let header = COLUMNS.iter().map(ToString::to_string).collect();
        for line in parse_csv(path, b';', Some(header), 1)? {
            let line = line?;
            let error = |long: String| line_error(&line, "Invalid StavroX line", long);
            let (sequence1, mods1) =
                stavrox_peptide(line.index_column(&["peptide1"])?.0, &mut ssf, &ssf_path)?;
            let protein1 = line.index_column(&["protein1"])?.0.trim_start_matches('>');
            let from1: usize = line.parse_column(&["from1"], "start position")?;
            let linkage1 =
                parse_linkage(line.index_column(&["linkage1"])?.0).map_err(error)?;
            let xlink1 = position_in_peptide(&line, linkage1, from1)?;
            let protein2 = line.index_column(&["protein2"])?.0.trim_start_matches('>');
            let (link, protein2) = if protein2.eq_ignore_ascii_case("H2O") {
                (DraftLink::Mono, None)
            } else if protein2.eq_ignore_ascii_case("intrapeptidal") {
                let linkage2 =
                    parse_linkage(line.index_column(&["linkage2"])?.0).map_err(error)?;
                (
                    DraftLink::Loop {
                        xlink2: position_in_peptide(&line, linkage2, from1)?,
                    },
                    None,
                )
            } else {
                let (sequence2, mods2) =
                    stavrox_peptide(line.index_column(&["peptide2"])?.0, &mut ssf, &ssf_path)?;
                let from2: usize = line.parse_column(&["from2"], "start position")?;
                let linkage2 =
                    parse_linkage(line.index_column(&["linkage2"])?.0).map_err(error)?;
                (
                    DraftLink::Cross {
                        beta: Peptide {
                            sequence: sequence2,
                            xlink: Some(position_in_peptide(&line, linkage2, from2)?),
                            mods: mods2,
                        },
                    },
                    Some(ProteinRef::at_pos(protein2, Some(from2))),
                )
            };
            let scan_text = line.index_column(&["scan"])?.0;
            let (rawfile, scan) = stavrox_scan(scan_text).ok_or_else(|| {
                error(format!(
                    "The scan number could not be found in '{scan_text}'"
                ))
            })?;
            drafts.push(DraftRow {
                line_index: Some(line.line_index()),
                rawfile,
                scanno: Some(scan),
                prec_ch: parse_charge(line.index_column(&["charge"])?.0),
                score: line.parse_optional(&["score"], "score")?,
                alpha: Peptide {
                    sequence: sequence1,
                    xlink: Some(xlink1),
                    mods: mods1,
                },
                link,
                proteins: vec![(ProteinRef::at_pos(protein1, Some(from1)), protein2)],
                ..DraftRow::default()
            });
        }
        Ok(drafts)
    }
}
