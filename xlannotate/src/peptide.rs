//! The peptides and their linkage as needed for fragmentation

use context_error::*;
use serde::{Deserialize, Serialize};
use xlcore::{
    XlError,
    reference::{AminoAcidTable, MassMode},
    xtable::{LinkType, Modification, XTableRow},
};

/// A peptide with its modifications. Modification position 0 is the N-terminus and
/// `len + 1` the C-terminus.
#[derive(Clone, Debug, Default, Deserialize, PartialEq, Serialize)]
pub struct Peptide {
    /// The sequence as one letter residue codes
    pub sequence: String,
    /// The modifications, with the 1-based position they are placed on
    pub modifications: Vec<Modification>,
}

impl Peptide {
    /// Create a new peptide
    pub fn new(sequence: impl Into<String>, modifications: Vec<Modification>) -> Self {
        Self {
            sequence: sequence.into(),
            modifications,
        }
    }

    /// The number of residues
    pub fn len(&self) -> usize {
        self.sequence.chars().count()
    }

    /// If there are no residues
    pub fn is_empty(&self) -> bool {
        self.sequence.is_empty()
    }

    /// The mass of every residue including the modifications on it, terminal modifications are
    /// added to the first or last residue.
    /// # Errors
    /// If the peptide is empty or contains an unknown residue. Also if a modification is placed
    /// outside of the peptide.
    pub fn residue_masses(
        &self,
        amino_acids: &AminoAcidTable,
        mode: MassMode,
    ) -> Result<Vec<f64>, XlError> {
        if self.is_empty() {
            return Err(BoxedError::new(
                BasicKind::Error,
                "Empty peptide",
                "A peptide needs at least one residue to be fragmented",
                Context::none(),
            ));
        }
        let mut masses = self
            .sequence
            .chars()
            .enumerate()
            .map(|(index, residue)| {
                amino_acids.mass(residue, mode).ok_or_else(|| {
                    BoxedError::new(
                        BasicKind::Error,
                        "Unknown residue",
                        format!(
                            "The residue '{residue}' at position {} of '{}' has no known mass",
                            index + 1,
                            self.sequence
                        ),
                        Context::none(),
                    )
                })
            })
            .collect::<Result<Vec<_>, _>>()?;
        let len = masses.len();
        for modification in &self.modifications {
            let index = match modification.position {
                0 => 0,
                p if p <= len => p - 1,
                p if p == len + 1 => len - 1,
                p => {
                    return Err(BoxedError::new(
                        BasicKind::Error,
                        "Invalid modification position",
                        format!(
                            "The modification '{}' is placed at {p} but '{}' has only {len} residues",
                            modification.name, self.sequence
                        ),
                        Context::none(),
                    ));
                }
            };
            if let Some(mass) = masses.get_mut(index) {
                *mass += modification.mass;
            }
        }
        Ok(masses)
    }

    /// The names of the modifications on the residues in the given 1-based inclusive range,
    /// terminal modifications count for the terminal residue
    pub(crate) fn modifications_between(&self, first: usize, last: usize) -> Vec<String> {
        let len = self.len();
        self.modifications
            .iter()
            .filter(|m| {
                let position = m.position.clamp(1, len.max(1));
                (first..=last).contains(&position)
            })
            .map(|m| m.name.clone())
            .collect()
    }
}

/// How the peptide is linked
#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
pub enum Linkage {
    /// No cross-linker attached
    Linear,
    /// A cross-linker attached at one end, at the given 1-based position
    Mono(usize),
    /// A cross-linker with both ends on the same peptide, at the given 1-based positions
    Loop(usize, usize),
    /// A cross-linker connecting the alpha peptide at `alpha_link` to the beta peptide at
    /// `beta_link`
    Cross {
        /// The link position on the alpha peptide
        alpha_link: usize,
        /// The second peptide
        beta: Peptide,
        /// The link position on the beta peptide
        beta_link: usize,
    },
}

/// A (possibly cross-linked) peptide as found in a single spectrum
#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
pub struct LinkedPeptide {
    /// The first (alpha) peptide
    pub alpha: Peptide,
    /// The linkage
    pub linkage: Linkage,
}

impl LinkedPeptide {
    /// Build the linked peptide for an xTable row
    /// # Errors
    /// If a link position is missing for a linked row or lies outside its peptide.
    pub fn from_row(row: &XTableRow) -> Result<Self, XlError> {
        let alpha = Peptide::new(row.pepseq1.clone(), row.mods1.clone());
        let missing = |what: &str| {
            BoxedError::new(
                BasicKind::Error,
                "Incomplete row",
                format!(
                    "The {} row for '{}' has no {what}",
                    row.link_type, row.pepseq1
                ),
                Context::none(),
            )
        };
        let linkage = match row.link_type {
            LinkType::Linear => Linkage::Linear,
            LinkType::Mono => Linkage::Mono(row.xlink1.ok_or_else(|| missing("xlink1"))?),
            LinkType::Loop => Linkage::Loop(
                row.xlink1.ok_or_else(|| missing("xlink1"))?,
                row.xlink2.ok_or_else(|| missing("xlink2"))?,
            ),
            LinkType::Intra | LinkType::Inter | LinkType::Homomultimeric => Linkage::Cross {
                alpha_link: row.xlink1.ok_or_else(|| missing("xlink1"))?,
                beta: Peptide::new(
                    row.pepseq2.clone().ok_or_else(|| missing("pepseq2"))?,
                    row.mods2.clone(),
                ),
                beta_link: row.xlink2.ok_or_else(|| missing("xlink2"))?,
            },
        };
        let linked = Self { alpha, linkage };
        linked.check_links()?;
        Ok(linked)
    }

    fn check_links(&self) -> Result<(), XlError> {
        let outside = |peptide: &Peptide, link: usize| {
            (link == 0 || link > peptide.len()).then(|| {
                BoxedError::new(
                    BasicKind::Error,
                    "Invalid link position",
                    format!(
                        "The link position {link} lies outside of '{}'",
                        peptide.sequence
                    ),
                    Context::none(),
                )
            })
        };
        let error = match &self.linkage {
            Linkage::Linear => None,
            Linkage::Mono(link) => outside(&self.alpha, *link),
            Linkage::Loop(first, second) => {
                outside(&self.alpha, *first).or_else(|| outside(&self.alpha, *second))
            }
            Linkage::Cross {
                alpha_link,
                beta,
                beta_link,
            } => outside(&self.alpha, *alpha_link).or_else(|| outside(beta, *beta_link)),
        };
        error.map_or(Ok(()), Err)
    }
}
