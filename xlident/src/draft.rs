//! The engine independent intermediate representation that all readers produce, and the
//! normalisation that turns it into canonical xTable rows.

use std::{collections::BTreeMap, path::Path};

use context_error::*;
use xlcore::{
    XlError,
    link::{categorize_inter_peptides, generate_id},
    xtable::{LinkType, Modification, SPLIT_ENTRY, XTableRow},
};

use crate::ReaderOptions;

/// A protein with the position of the peptide in it, either the start position of the peptide
/// (`pos`) or the position of the linked residue (`xpos`) or both
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub(crate) struct ProteinRef {
    pub(crate) name: String,
    pub(crate) pos: Option<usize>,
    pub(crate) xpos: Option<usize>,
}

impl ProteinRef {
    pub(crate) fn at_xpos(name: impl Into<String>, xpos: Option<usize>) -> Self {
        Self {
            name: name.into(),
            pos: None,
            xpos,
        }
    }

    pub(crate) fn at_pos(name: impl Into<String>, pos: Option<usize>) -> Self {
        Self {
            name: name.into(),
            pos,
            xpos: None,
        }
    }
}

/// A peptide with its modifications and link position
#[derive(Clone, Debug, Default, PartialEq)]
pub(crate) struct Peptide {
    pub(crate) sequence: String,
    pub(crate) xlink: Option<usize>,
    pub(crate) mods: Vec<Modification>,
}

/// The kind of link as reported by the engine, the exact category of cross-links between two
/// peptides is determined later
#[derive(Clone, Debug, Default, PartialEq)]
pub(crate) enum DraftLink {
    #[default]
    Linear,
    Mono,
    Loop {
        xlink2: usize,
    },
    Cross {
        beta: Peptide,
    },
}

/// A single identification as read from a file, before normalisation
#[derive(Clone, Debug, Default, PartialEq)]
pub(crate) struct DraftRow {
    pub(crate) line_index: Option<usize>,
    pub(crate) rawfile: Option<String>,
    pub(crate) scanno: Option<usize>,
    pub(crate) prec_ch: Option<usize>,
    pub(crate) xtype: Option<String>,
    pub(crate) score: Option<f64>,
    pub(crate) alpha: Peptide,
    pub(crate) link: DraftLink,
    /// The alternative protein assignments, every alternative results in a separate row
    pub(crate) proteins: Vec<(ProteinRef, Option<ProteinRef>)>,
    /// The decoy status if the engine reports it, otherwise it is based on the protein names
    pub(crate) decoy: Option<bool>,
    pub(crate) extras: BTreeMap<String, String>,
}

/// Combine independent lists of alternative proteins for both peptides into all combinations
pub(crate) fn pair_alternatives(
    first: &[ProteinRef],
    second: &[ProteinRef],
) -> Vec<(ProteinRef, Option<ProteinRef>)> {
    if second.is_empty() {
        first.iter().map(|p| (p.clone(), None)).collect()
    } else {
        first
            .iter()
            .flat_map(|a| second.iter().map(|b| (a.clone(), Some(b.clone()))))
            .collect()
    }
}

/// Resolve (pos, xpos) for a peptide in a protein, deriving the missing one from the link position
fn resolve_positions(
    protein: &ProteinRef,
    xlink: Option<usize>,
) -> Result<(Option<usize>, Option<usize>), String> {
    match (protein.pos, protein.xpos, xlink) {
        (Some(pos), None, Some(xlink)) => Ok((Some(pos), Some(pos + xlink - 1))),
        (None, Some(xpos), Some(xlink)) => {
            if xpos < xlink {
                Err(format!(
                    "The link position {xlink} in the peptide is larger than the position {xpos} in protein '{}'",
                    protein.name
                ))
            } else {
                Ok((Some(xpos - xlink + 1), Some(xpos)))
            }
        }
        (pos, xpos, _) => Ok((pos, xpos)),
    }
}

/// Turn the drafts into canonical rows: split protein alternatives, compute the positions,
/// categorise, generate the ID, determine the decoy status, tag the search engine, and check all
/// invariants.
/// # Errors
/// If any row is incomplete or breaks one of the invariants of the xTable.
pub(crate) fn finalize(
    drafts: Vec<DraftRow>,
    path: &Path,
    engine: &str,
    options: &ReaderOptions,
) -> Result<Vec<XTableRow>, XlError> {
    let mut rows = Vec::with_capacity(drafts.len());
    for draft in drafts {
        let line_index = draft.line_index;
        let error = |long: String| {
            let mut context = Context::default().source(path.to_string_lossy()).to_owned();
            if let Some(line) = line_index {
                context = context.line_index(line as u32);
            }
            BoxedError::new(BasicKind::Error, "Invalid cross-link", long, context)
        };
        rows.extend(finalize_draft(draft, engine, options).map_err(error)?);
    }
    Ok(rows)
}

fn finalize_draft(
    draft: DraftRow,
    engine: &str,
    options: &ReaderOptions,
) -> Result<Vec<XTableRow>, String> {
    let alternatives = if draft.proteins.is_empty() {
        vec![(ProteinRef::default(), None)]
    } else {
        draft.proteins.clone()
    };
    let split = alternatives.len() > 1;
    let mut rows = Vec::with_capacity(alternatives.len());
    for (protein1, protein2) in alternatives {
        let (pos1, xpos1) = resolve_positions(&protein1, draft.alpha.xlink)?;
        let mut row = XTableRow {
            rawfile: draft.rawfile.clone().or_else(|| options.rawfile.clone()),
            scanno: draft.scanno,
            prec_ch: draft.prec_ch,
            pepseq1: draft.alpha.sequence.clone(),
            xlink1: draft.alpha.xlink,
            xtype: draft.xtype.clone(),
            mods1: draft.alpha.mods.clone(),
            prot1: protein1.name.clone(),
            pos1,
            xpos1,
            score: draft.score,
            search_engine: engine.to_string(),
            extras: draft.extras.clone(),
            ..XTableRow::default()
        };
        match &draft.link {
            DraftLink::Linear => {
                row.link_type = LinkType::Linear;
                row.xlink1 = None;
                row.xpos1 = None;
            }
            DraftLink::Mono => row.link_type = LinkType::Mono,
            DraftLink::Loop { xlink2 } => {
                row.link_type = LinkType::Loop;
                row.pepseq2 = Some(row.pepseq1.clone());
                row.prot2 = Some(row.prot1.clone());
                row.pos2 = row.pos1;
                row.xlink2 = Some(*xlink2);
                row.xpos2 = row.pos1.map(|p| p + xlink2 - 1);
            }
            DraftLink::Cross { beta } => {
                let protein2 = protein2.ok_or_else(|| {
                    format!(
                        "The cross-link between '{}' and '{}' does not have a second protein",
                        draft.alpha.sequence, beta.sequence
                    )
                })?;
                let (pos2, xpos2) = resolve_positions(&protein2, beta.xlink)?;
                row.pepseq2 = Some(beta.sequence.clone());
                row.xlink2 = beta.xlink;
                row.mods2.clone_from(&beta.mods);
                row.prot2 = Some(protein2.name.clone());
                row.pos2 = pos2;
                row.xpos2 = xpos2;
                let (Some(pos1), Some(pos2)) = (pos1, pos2) else {
                    return Err(format!(
                        "The cross-link between '{}' and '{}' does not have protein positions",
                        draft.alpha.sequence, beta.sequence
                    ));
                };
                row.link_type = categorize_inter_peptides(
                    &row.prot1,
                    pos1,
                    &row.pepseq1,
                    &protein2.name,
                    pos2,
                    &beta.sequence,
                );
            }
        }
        row.id = generate_id(
            row.link_type,
            &row.prot1,
            row.xpos1,
            row.prot2.as_deref(),
            row.xpos2,
        );
        row.decoy = draft.decoy.unwrap_or_else(|| {
            options.is_decoy(&row.prot1) || row.prot2.as_deref().is_some_and(|p| options.is_decoy(p))
        });
        if split {
            row.extras
                .insert(SPLIT_ENTRY.to_string(), "true".to_string());
        }
        row.check_invariants()?;
        rows.push(row);
    }
    Ok(rows)
}
