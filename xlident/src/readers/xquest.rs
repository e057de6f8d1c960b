use std::{path::Path, sync::LazyLock};

use regex::Regex;
use xlcore::{XlError, csv::parse_csv, xtable::Modification};

use crate::{
    ReaderOptions,
    draft::{DraftLink, DraftRow, Peptide, ProteinRef},
    helper_functions::{line_error, optional_position},
    readers::CrossLinkReader,
};

/// An xQuest result table (tab separated)
#[derive(Clone, Copy, Debug)]
pub(crate) struct XQuest;

/// The mass of the oxidation that xQuest writes as an `X` in the sequence
const OXIDATION: f64 = 15.994_915;

static TITLE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(.+)\.(\d+)\.(\d+)\.(.+)\.(\d+)\.(\d+)\.(\d+)$").unwrap());
static CROSS_ID: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^([A-Z]+)-([A-Z]+)-a(\d+)-b(\d+)$").unwrap());
static MONO_ID: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^([A-Z]+)-[A-Z](\d+)-\d+(?:\.\d+)?$").unwrap());
static LOOP_ID: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^([A-Z]+)-[A-Z](\d+)-[A-Z](\d+)$").unwrap());

/// The parsed form of an xQuest `Id`
#[derive(Clone, Debug, PartialEq, Eq)]
pub(crate) enum XQuestId {
    Cross {
        alpha: String,
        beta: String,
        xlink1: usize,
        xlink2: usize,
    },
    Mono {
        peptide: String,
        xlink: usize,
    },
    Loop {
        peptide: String,
        xlink1: usize,
        xlink2: usize,
    },
}

/// Parse an xQuest `Id`: `PEP1-PEP2-a{n}-b{m}` (cross), `PEP-K{n}-{mass}` (mono), or
/// `PEP-K{n}-K{m}` (loop).
pub(crate) fn parse_xquest_id(id: &str) -> Result<XQuestId, String> {
    let number = |text: &str| {
        text.parse::<usize>()
            .map_err(|_| format!("The link position '{text}' in the xQuest id '{id}' is too big"))
    };
    let id = id.trim();
    if let Some(c) = CROSS_ID.captures(id) {
        Ok(XQuestId::Cross {
            alpha: c[1].to_string(),
            beta: c[2].to_string(),
            xlink1: number(&c[3])?,
            xlink2: number(&c[4])?,
        })
    } else if let Some(c) = LOOP_ID.captures(id) {
        Ok(XQuestId::Loop {
            peptide: c[1].to_string(),
            xlink1: number(&c[2])?,
            xlink2: number(&c[3])?,
        })
    } else if let Some(c) = MONO_ID.captures(id) {
        Ok(XQuestId::Mono {
            peptide: c[1].to_string(),
            xlink: number(&c[2])?,
        })
    } else {
        Err(format!(
            "The xQuest id '{id}' is not a recognised cross-link, loop-link, or mono-link"
        ))
    }
}

/// Parse an xQuest spectrum title `name.scan.scan.name.scan.scan.charge` into (rawfile, scan, charge)
pub(crate) fn parse_xquest_title(title: &str) -> Result<(String, usize, usize), String> {
    let error = || {
        format!(
            "The xQuest spectrum '{title}' does not follow the format 'name.scan.scan.name.scan.scan.charge'"
        )
    };
    let c = TITLE.captures(title.trim()).ok_or_else(error)?;
    Ok((
        c[1].to_string(),
        c[2].parse().map_err(|_| error())?,
        c[7].parse().map_err(|_| error())?,
    ))
}

/// xQuest writes oxidised methionines as `X`
fn xquest_peptide(sequence: &str, xlink: usize) -> Peptide {
    let mut mods = Vec::new();
    let sequence = sequence
        .chars()
        .enumerate()
        .map(|(index, residue)| {
            if residue == 'X' {
                mods.push(Modification::new("Oxidation", index + 1, OXIDATION));
                'M'
            } else {
                residue
            }
        })
        .collect();
    Peptide {
        sequence,
        xlink: Some(xlink),
        mods,
    }
}

fn is_xquest_decoy(protein: &str) -> bool {
    let protein = protein.to_ascii_lowercase();
    protein.contains("reverse") || protein.contains("decoy")
}

impl CrossLinkReader for XQuest {
    const ENGINE: &'static str = "xQuest";

    fn read_drafts(path: &Path, _options: &ReaderOptions) -> Result<Vec<DraftRow>, XlError> {
        let mut drafts = Vec::new();
        for line in parse_csv(path, b'\t', None, 0)? {
            let line = line?;
            let error = |long: String| line_error(&line, "Invalid xQuest line", long);
            let (rawfile, scan, charge) =
                parse_xquest_title(line.index_column(&["Spectrum"])?.0).map_err(error)?;
            let protein1 = line.index_column(&["Protein1"])?.0;
            let protein2 = line.get(&["Protein2"]).filter(|p| !p.is_empty() && *p != "-");
            let xpos1 = optional_position(line.index_column(&["AbsPos1"])?.0).map_err(error)?;
            let (alpha, link, proteins) =
                match parse_xquest_id(line.index_column(&["Id"])?.0).map_err(error)? {
                    XQuestId::Cross {
                        alpha,
                        beta,
                        xlink1,
                        xlink2,
                    } => {
                        let xpos2 =
                            optional_position(line.index_column(&["AbsPos2"])?.0).map_err(error)?;
                        let protein2 = protein2.ok_or_else(|| {
                            error("A cross-link needs a second protein".to_string())
                        })?;
                        (
                            xquest_peptide(&alpha, xlink1),
                            DraftLink::Cross {
                                beta: xquest_peptide(&beta, xlink2),
                            },
                            vec![(
                                ProteinRef::at_xpos(protein1, xpos1),
                                Some(ProteinRef::at_xpos(protein2, xpos2)),
                            )],
                        )
                    }
                    XQuestId::Loop {
                        peptide,
                        xlink1,
                        xlink2,
                    } => (
                        xquest_peptide(&peptide, xlink1),
                        DraftLink::Loop { xlink2 },
                        vec![(ProteinRef::at_xpos(protein1, xpos1), None)],
                    ),
                    XQuestId::Mono { peptide, xlink } => (
                        xquest_peptide(&peptide, xlink),
                        DraftLink::Mono,
                        vec![(ProteinRef::at_xpos(protein1, xpos1), None)],
                    ),
                };
            drafts.push(DraftRow {
                line_index: Some(line.line_index()),
                rawfile: Some(rawfile),
                scanno: Some(scan),
                prec_ch: Some(charge),
                score: line.parse_optional(&["ld-Score"], "score")?,
                alpha,
                link,
                decoy: Some(is_xquest_decoy(protein1) || protein2.is_some_and(is_xquest_decoy)),
                proteins,
                ..DraftRow::default()
            });
        }
        Ok(drafts)
    }
}
