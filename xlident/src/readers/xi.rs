use std::{
    collections::{BTreeMap, HashMap},
    path::Path,
};

use context_error::*;
use itertools::Itertools;
use xlcore::{
    XlError,
    csv::{CsvLine, parse_csv},
    path::read_to_string,
    reference::{AminoAcidTable, MassMode},
    xtable::Modification,
};

use crate::{
    ReaderOptions,
    draft::{DraftLink, DraftRow, Peptide, ProteinRef, pair_alternatives},
    helper_functions::{line_error, optional_position},
    readers::CrossLinkReader,
};

/// A Xi search result (CSV)
#[derive(Clone, Copy, Debug)]
pub(crate) struct Xi;

/// A Xi search result after FDR filtering with xiFDR (CSV)
#[derive(Clone, Copy, Debug)]
pub(crate) struct XiFdr;

impl CrossLinkReader for Xi {
    const ENGINE: &'static str = "Xi";

    fn read_drafts(path: &Path, options: &ReaderOptions) -> Result<Vec<DraftRow>, XlError> {
        let config = match &options.xi_config {
            Some(config) => XiModifications::load(config)?,
            None => XiModifications::builtin(),
        };
        read_xi(path, &config, false)
    }
}

impl CrossLinkReader for XiFdr {
    const ENGINE: &'static str = "xiFDR";

    fn read_drafts(path: &Path, options: &ReaderOptions) -> Result<Vec<DraftRow>, XlError> {
        let config = match &options.xi_config {
            Some(config) => Some(XiModifications::load(config)?),
            None => None,
        };
        read_xi(path, &config.unwrap_or_default(), options.xi_config.is_none())
    }
}

/// The modification markers that can be used in Xi peptide sequences, with their mass difference
#[derive(Clone, Debug, Default, PartialEq)]
pub(crate) struct XiModifications {
    masses: HashMap<String, f64>,
}

impl XiModifications {
    /// The markers of the default Xi configuration
    pub(crate) fn builtin() -> Self {
        let mut masses = HashMap::from([
            ("Mox".to_string(), 15.994_915),
            ("Ccm".to_string(), 57.021_464),
        ]);
        for residue in ['K', 'S', 'T', 'Y'] {
            for (marker, mass) in [
                ("bs3nh2", 155.094_629),
                ("bs3oh", 156.078_644),
                ("dssnh2", 155.094_629),
                ("dssoh", 156.078_644),
            ] {
                masses.insert(format!("{residue}{marker}"), mass);
            }
        }
        Self { masses }
    }

    /// Load a Xi configuration file
    /// # Errors
    /// If the file could not be read or contains invalid definitions.
    pub(crate) fn load(path: &Path) -> Result<Self, XlError> {
        log::debug!("Reading Xi configuration '{}'", path.display());
        Self::parse(&read_to_string(path)?, path)
    }

    /// Parse the `modification:` and `crosslinker:` lines of a Xi configuration. A modification
    /// defines `SYMBOL` (the full marker) or `SYMBOLEXT` (appended to every `MODIFIED` residue),
    /// with the `MASS` of the modified residue or the `DELTAMASS`. A cross-linker defines the
    /// mono-link markers as `MODIFICATIONS:name,mass,...`, which are added to the linker `MASS`
    /// and allowed on all `LINKEDAMINOACIDS`.
    /// # Errors
    /// If a definition is incomplete or contains invalid numbers.
    pub(crate) fn parse(text: &str, source: &Path) -> Result<Self, XlError> {
        let amino_acids = AminoAcidTable::default();
        let mut masses = HashMap::new();
        for (index, line) in text.lines().enumerate() {
            let line = line.trim();
            let error = |long: String| {
                BoxedError::new(
                    BasicKind::Error,
                    "Invalid Xi configuration",
                    long,
                    Context::full_line(index as u32, line)
                        .source(source.to_string_lossy())
                        .to_owned(),
                )
            };
            let kind = if line.starts_with("modification:") {
                "modification"
            } else if line.starts_with("crosslinker:") {
                "crosslinker"
            } else {
                continue;
            };
            let fields = config_fields(line);
            let number = |key: &str| -> Result<Option<f64>, XlError> {
                fields
                    .get(key)
                    .map(|v| {
                        v.trim().parse::<f64>().map_err(|_| {
                            error(format!("The {key} '{v}' is not a valid number"))
                        })
                    })
                    .transpose()
            };
            let residues = |key: &str| -> Vec<char> {
                fields
                    .get(key)
                    .map(|v| {
                        v.split(',')
                            .filter_map(|r| {
                                let mut chars = r.trim().chars();
                                match (chars.next(), chars.next()) {
                                    (Some(c), None) if c.is_ascii_uppercase() => Some(c),
                                    _ => None,
                                }
                            })
                            .collect()
                    })
                    .unwrap_or_default()
            };
            if kind == "modification" {
                let modified = residues("MODIFIED");
                let delta = |residue: char| -> Result<f64, XlError> {
                    if let Some(delta) = number("DELTAMASS")? {
                        Ok(delta)
                    } else if let Some(mass) = number("MASS")? {
                        amino_acids
                            .mass(residue, MassMode::Monoisotopic)
                            .map(|base| mass - base)
                            .ok_or_else(|| error(format!("The residue '{residue}' is unknown")))
                    } else {
                        Err(error(
                            "A modification needs either a MASS or a DELTAMASS".to_string(),
                        ))
                    }
                };
                if let Some(symbol) = fields.get("SYMBOL") {
                    let residue = modified
                        .first()
                        .copied()
                        .or_else(|| symbol.chars().next())
                        .ok_or_else(|| error("A modification needs a SYMBOL".to_string()))?;
                    masses.insert((*symbol).to_string(), delta(residue)?);
                } else if let Some(extension) = fields.get("SYMBOLEXT") {
                    if modified.is_empty() {
                        return Err(error(
                            "A modification with a SYMBOLEXT needs the MODIFIED residues"
                                .to_string(),
                        ));
                    }
                    for residue in modified {
                        masses.insert(format!("{residue}{extension}"), delta(residue)?);
                    }
                } else {
                    return Err(error(
                        "A modification needs either a SYMBOL or a SYMBOLEXT".to_string(),
                    ));
                }
            } else {
                let name = fields
                    .get("Name")
                    .ok_or_else(|| error("A cross-linker needs a Name".to_string()))?
                    .to_ascii_lowercase();
                let linker = number("MASS")?
                    .ok_or_else(|| error("A cross-linker needs a MASS".to_string()))?;
                let Some(modifications) = fields.get("MODIFICATIONS") else {
                    continue;
                };
                for (marker, mass) in modifications.split(',').map(str::trim).tuples() {
                    let mass = mass.parse::<f64>().map_err(|_| {
                        error(format!("The mass '{mass}' for '{marker}' is not a valid number"))
                    })?;
                    for residue in residues("LINKEDAMINOACIDS") {
                        masses.insert(
                            format!("{residue}{name}{}", marker.to_ascii_lowercase()),
                            linker + mass,
                        );
                    }
                }
            }
        }
        Ok(Self { masses })
    }

    /// Get the mass difference for a marker including the residue, like `Mox`
    pub(crate) fn mass(&self, symbol: &str) -> Option<f64> {
        self.masses.get(symbol).copied()
    }
}

/// Split a configuration line into its `KEY:value` fields, the key is the last `:` separated
/// part before the value
fn config_fields(line: &str) -> HashMap<&str, &str> {
    line.split(';')
        .filter_map(|field| {
            let (key, value) = field.rsplit_once(':')?;
            Some((key.rsplit(':').next().unwrap_or(key).trim(), value.trim()))
        })
        .collect()
}

/// Parse a Xi peptide with lowercase modification markers following the modified residue, like
/// `PEPKbs3ohTMoxIDE`. Returns the sequence and the markers with their position.
pub(crate) fn parse_xi_peptide(text: &str) -> Result<(String, Vec<(String, usize)>), String> {
    let mut sequence = String::with_capacity(text.len());
    let mut markers: Vec<(String, usize)> = Vec::new();
    let mut marker: Option<String> = None;
    let mut finish = |marker: &mut Option<String>, sequence: &str| {
        if let Some(marker) = marker.take() {
            let position = sequence.len();
            let symbol = sequence
                .chars()
                .last()
                .map_or_else(|| marker.clone(), |residue| format!("{residue}{marker}"));
            markers.push((symbol, position));
        }
    };
    for c in text.trim().chars() {
        if c.is_ascii_uppercase() {
            finish(&mut marker, &sequence);
            sequence.push(c);
        } else if c.is_ascii_lowercase() || (c.is_ascii_digit() && marker.is_some()) {
            marker.get_or_insert_with(String::new).push(c);
        } else {
            return Err(format!(
                "The character '{c}' is not valid in the Xi peptide '{text}'"
            ));
        }
    }
    finish(&mut marker, &sequence);
    if sequence.is_empty() {
        return Err(format!("The Xi peptide '{text}' does not contain any residues"));
    }
    Ok((sequence, markers))
}

fn xi_peptide(
    text: &str,
    xlink: Option<usize>,
    config: &XiModifications,
    needs_config: bool,
) -> Result<Peptide, String> {
    let (sequence, markers) = parse_xi_peptide(text)?;
    if needs_config && !markers.is_empty() {
        return Err(format!(
            "The peptide '{text}' contains modifications, but no Xi configuration was given to resolve them"
        ));
    }
    let mods = markers
        .into_iter()
        .map(|(symbol, position)| {
            config
                .mass(&symbol)
                .map(|mass| Modification::new(symbol.clone(), position, mass))
                .ok_or_else(|| format!("The modification '{symbol}' in '{text}' is unknown"))
        })
        .collect::<Result<Vec<_>, String>>()?;
    Ok(Peptide {
        sequence,
        xlink,
        mods,
    })
}

/// The proteins and peptide positions in parallel `;` separated lists
fn xi_proteins(line: &CsvLine, side: usize) -> Result<Vec<ProteinRef>, XlError> {
    let protein_column = format!("Protein{side}");
    let position_column = format!("PepPos{side}");
    let proteins = line.index_column(&[protein_column.as_str()])?.0;
    let positions = line.get(&[position_column.as_str()]).unwrap_or_default();
    let positions = positions.split(';').map(str::trim).collect_vec();
    proteins
        .split(';')
        .map(str::trim)
        .filter(|p| !p.is_empty() && *p != "-")
        .enumerate()
        .map(|(index, protein)| {
            let pos = positions
                .get(index)
                .or_else(|| positions.first())
                .map_or(Ok(None), |p| optional_position(p))
                .map_err(|long| line_error(line, "Invalid Xi line", long))?;
            Ok(ProteinRef::at_pos(protein, pos))
        })
        .collect()
}

fn is_true(text: &str) -> bool {
    matches!(text.trim().to_ascii_lowercase().as_str(), "true" | "1")
}

fn read_xi(
    path: &Path,
    config: &XiModifications,
    needs_config: bool,
) -> Result<Vec<DraftRow>, XlError> {
    let mut drafts = Vec::new();
    for line in parse_csv(path, b',', None, 0)? {
        let line = line?;
        let error = |long: String| line_error(&line, "Invalid Xi line", long);
        let position = |name: &str| -> Result<Option<usize>, XlError> {
            line.get(&[name])
                .map_or(Ok(None), optional_position)
                .map_err(error)
        };
        let xlink1 = position("LinkPos1")?;
        let xlink2 = position("LinkPos2")?;
        let peptide2 = line
            .get(&["PepSeq2"])
            .map(str::trim)
            .filter(|p| !p.is_empty() && *p != "-");
        let alpha = xi_peptide(
            line.index_column(&["PepSeq1"])?.0,
            xlink1,
            config,
            needs_config,
        )
        .map_err(error)?;
        let first = xi_proteins(&line, 1)?;
        let (link, proteins) = if let Some(peptide2) = peptide2 {
            let beta = xi_peptide(peptide2, xlink2, config, needs_config).map_err(error)?;
            let second = xi_proteins(&line, 2)?;
            (DraftLink::Cross { beta }, pair_alternatives(&first, &second))
        } else if let Some(xlink2) = xlink2 {
            (DraftLink::Loop { xlink2 }, pair_alternatives(&first, &[]))
        } else if xlink1.is_some() {
            (DraftLink::Mono, pair_alternatives(&first, &[]))
        } else {
            (DraftLink::Linear, pair_alternatives(&first, &[]))
        };
        let decoy = match (
            line.get(&["Decoy1"]),
            line.get(&["Decoy2"]),
            line.get(&["isDecoy"]),
        ) {
            (_, _, Some(decoy)) => Some(is_true(decoy)),
            (Some(decoy1), decoy2, None) => Some(is_true(decoy1) || decoy2.is_some_and(is_true)),
            (None, _, None) => None,
        };
        let mut extras = BTreeMap::new();
        if let Some(fdr) = line.get(&["fdr"]) {
            extras.insert("fdr".to_string(), fdr.to_string());
        }
        drafts.push(DraftRow {
            line_index: Some(line.line_index()),
            rawfile: line.get(&["Run"]).map(ToString::to_string),
            scanno: line.parse_optional(&["Scan"], "scan number")?,
            prec_ch: line.parse_optional(&["PrecursorCharge", "Charge"], "charge")?,
            score: line.parse_optional(&["match score", "Score"], "score")?,
            alpha,
            link,
            proteins,
            decoy,
            extras,
            ..DraftRow::default()
        });
    }
    Ok(drafts)
}
