//! Theoretical fragments of (cross-linked) peptides

use std::fmt::Display;

use itertools::Itertools;
use serde::{Deserialize, Serialize};
use xlcore::{
    XlError,
    reference::{AminoAcidTable, PROTON},
};

use crate::{
    parameters::{FragmentationParameters, IonKind},
    peptide::{LinkedPeptide, Linkage, Peptide},
};

/// The peptide a fragment is formed from
#[derive(
    Clone, Copy, Debug, Default, Deserialize, Eq, Hash, Ord, PartialEq, PartialOrd, Serialize,
)]
pub enum Side {
    /// The first peptide
    #[default]
    Alpha,
    /// The second peptide
    Beta,
}

/// The ion series of a theoretical ion
#[derive(Clone, Copy, Debug, Deserialize, Eq, Hash, Ord, PartialEq, PartialOrd, Serialize)]
pub enum IonSeries {
    /// A backbone fragment, `linked` if it carries the cross-linker (and the partner peptide)
    Fragment {
        /// The ion type
        kind: IonKind,
        /// If this fragment carries the cross-link
        linked: bool,
    },
    /// The intact precursor
    Precursor,
}

impl Display for IonSeries {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Fragment { kind, linked } => write!(f, "{}", kind.letter(*linked)),
            Self::Precursor => write!(f, "M"),
        }
    }
}

/// A single theoretical ion
#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
pub struct TheoreticalIon {
    /// The m/z
    pub mz: f64,
    /// The residues of the peptide that are part of this fragment
    pub sequence: String,
    /// The ion series
    pub series: IonSeries,
    /// The number of residues of the peptide in this fragment
    pub length: usize,
    /// The charge
    pub charge: usize,
    /// The peptide this fragment is formed from
    pub side: Side,
    /// The names of the modifications on the residues in this fragment
    pub modifications: Vec<String>,
}

impl TheoreticalIon {
    /// The conventional name for this ion, `b3`, `Y5`, or `M+2H`
    pub fn label(&self) -> String {
        match self.series {
            IonSeries::Fragment { .. } => format!("{}{}", self.series, self.length),
            IonSeries::Precursor => format!("M+{}H", self.charge),
        }
    }
}

impl Display for TheoreticalIon {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} {}+ {:.4}", self.label(), self.charge, self.mz)
    }
}

/// One peptide as it is fragmented: its residue masses, the link positions on it, and the
/// mass that a fragment gains when it contains all link positions
struct FragmentingPeptide<'a> {
    peptide: &'a Peptide,
    side: Side,
    masses: Vec<f64>,
    links: Vec<usize>,
    link_addition: f64,
}

impl FragmentingPeptide<'_> {
    /// Fragments that contain some but not all link positions do not exist for loop-links, so
    /// these are `None`. Otherwise returns if the fragment carries the link.
    fn carries_link(&self, first: usize, last: usize) -> Option<bool> {
        let covered = self
            .links
            .iter()
            .filter(|l| (first..=last).contains(*l))
            .count();
        if covered == 0 {
            Some(false)
        } else if covered == self.links.len() {
            Some(true)
        } else {
            None
        }
    }

    fn fragments(&self, parameters: &FragmentationParameters, ions: &mut Vec<TheoreticalIon>) {
        let len = self.masses.len();
        let mode = parameters.mass_mode;
        let sequence = self.peptide.sequence.chars().collect_vec();
        for length in 1..len {
            for kind in parameters.ion_types.iter().copied().unique() {
                let (first, last) = if kind.is_n_terminal() {
                    (1, length)
                } else {
                    (len - length + 1, len)
                };
                let Some(linked) = self.carries_link(first, last) else {
                    continue;
                };
                let mass = self.masses[first - 1..last].iter().sum::<f64>()
                    + if linked { self.link_addition } else { 0.0 };
                for charge in parameters.charges.clone().filter(|c| *c > 0) {
                    ions.push(TheoreticalIon {
                        mz: (mass + kind.series_term(charge, mode)) / charge as f64,
                        sequence: sequence[first - 1..last].iter().collect(),
                        series: IonSeries::Fragment { kind, linked },
                        length,
                        charge,
                        side: self.side,
                        modifications: self.peptide.modifications_between(first, last),
                    });
                }
            }
        }
    }
}

impl LinkedPeptide {
    /// Generate all theoretical ions: the a, b, and y fragments of every peptide as selected in
    /// the parameters and the intact precursor, all at every charge in the charge range. The
    /// result is sorted on m/z, ions with an m/z above the maximal mass are left out.
    /// # Errors
    /// If any residue is unknown, or a modification is placed outside of its peptide.
    pub fn theoretical_ions(
        &self,
        parameters: &FragmentationParameters,
        amino_acids: &AminoAcidTable,
    ) -> Result<Vec<TheoreticalIon>, XlError> {
        let mode = parameters.mass_mode;
        let alpha_masses = self.alpha.residue_masses(amino_acids, mode)?;
        let alpha_mass = alpha_masses.iter().sum::<f64>() + mode.water();
        let mut peptides = Vec::with_capacity(2);
        let precursor = match &self.linkage {
            Linkage::Linear => {
                peptides.push(FragmentingPeptide {
                    peptide: &self.alpha,
                    side: Side::Alpha,
                    masses: alpha_masses,
                    links: Vec::new(),
                    link_addition: 0.0,
                });
                alpha_mass
            }
            Linkage::Mono(link) => {
                peptides.push(FragmentingPeptide {
                    peptide: &self.alpha,
                    side: Side::Alpha,
                    masses: alpha_masses,
                    links: vec![*link],
                    link_addition: parameters.linker_mass,
                });
                alpha_mass + parameters.linker_mass
            }
            Linkage::Loop(first, second) => {
                peptides.push(FragmentingPeptide {
                    peptide: &self.alpha,
                    side: Side::Alpha,
                    masses: alpha_masses,
                    links: vec![*first, *second],
                    link_addition: parameters.linker_mass,
                });
                alpha_mass + parameters.linker_mass
            }
            Linkage::Cross {
                alpha_link,
                beta,
                beta_link,
            } => {
                let beta_masses = beta.residue_masses(amino_acids, mode)?;
                let beta_mass = beta_masses.iter().sum::<f64>() + mode.water();
                peptides.push(FragmentingPeptide {
                    peptide: &self.alpha,
                    side: Side::Alpha,
                    masses: alpha_masses,
                    links: vec![*alpha_link],
                    link_addition: beta_mass + parameters.linker_mass,
                });
                peptides.push(FragmentingPeptide {
                    peptide: beta,
                    side: Side::Beta,
                    masses: beta_masses,
                    links: vec![*beta_link],
                    link_addition: alpha_mass + parameters.linker_mass,
                });
                alpha_mass + beta_mass + parameters.linker_mass
            }
        };

        let mut ions = Vec::new();
        for peptide in &peptides {
            peptide.fragments(parameters, &mut ions);
        }
        let sequence = match &self.linkage {
            Linkage::Cross { beta, .. } => format!("{}-{}", self.alpha.sequence, beta.sequence),
            _ => self.alpha.sequence.clone(),
        };
        let modifications = peptides
            .iter()
            .flat_map(|p| p.peptide.modifications.iter().map(|m| m.name.clone()))
            .collect_vec();
        let length = peptides.iter().map(|p| p.masses.len()).sum();
        for charge in parameters.charges.clone().filter(|c| *c > 0) {
            ions.push(TheoreticalIon {
                mz: (precursor + charge as f64 * PROTON) / charge as f64,
                sequence: sequence.clone(),
                series: IonSeries::Precursor,
                length,
                charge,
                side: Side::Alpha,
                modifications: modifications.clone(),
            });
        }
        if let Some(max) = parameters.max_mass {
            ions.retain(|ion| ion.mz <= max);
        }
        ions.sort_by(|a, b| a.mz.total_cmp(&b.mz));
        log::debug!("Generated {} theoretical ions for {sequence}", ions.len());
        Ok(ions)
    }
}

#[cfg(test)]
#[allow(clippy::missing_panics_doc)]
mod tests {
    use xlcore::{reference::MassMode, xtable::Modification};

    use super::*;

    fn find<'a>(
        ions: &'a [TheoreticalIon],
        label: &str,
        side: Side,
        charge: usize,
    ) -> &'a TheoreticalIon {
        ions.iter()
            .find(|i| i.label() == label && i.side == side && i.charge == charge)
            .unwrap_or_else(|| panic!("Missing {label} {side:?} {charge}+"))
    }

    const P: f64 = PROTON;
    const H: f64 = 1.007_825_032_07;
    const WATER: f64 = 18.010_564_683_7;
    const CO: f64 = 27.994_914_622_1;
    const G: f64 = 57.021_463_735;
    const K: f64 = 128.094_963_050;
    const LINKER: f64 = 138.068_08;

    #[test]
    fn linear_series() {
        let peptide = LinkedPeptide {
            alpha: Peptide::new("GGK", Vec::new()),
            linkage: Linkage::Linear,
        };
        let parameters = FragmentationParameters::default()
            .ion_types([IonKind::A, IonKind::B, IonKind::Y])
            .charges(1..=2);
        let ions = peptide
            .theoretical_ions(&parameters, &AminoAcidTable::default())
            .unwrap();
        // 2 lengths, 3 types, 2 charges, and the precursor at 2 charges
        assert_eq!(ions.len(), 14);
        assert!(ions.windows(2).all(|w| w[0].mz <= w[1].mz));
        assert!((find(&ions, "b1", Side::Alpha, 1).mz - (G + H)).abs() < 1e-6);
        assert!((find(&ions, "a2", Side::Alpha, 1).mz - (2.0 * G - CO + P)).abs() < 1e-6);
        assert!((find(&ions, "y1", Side::Alpha, 1).mz - (K + WATER + P)).abs() < 1e-6);
        assert!(
            (find(&ions, "y2", Side::Alpha, 2).mz - (G + K + WATER + 2.0 * P) / 2.0).abs() < 1e-6
        );
        assert!(
            (find(&ions, "M+2H", Side::Alpha, 2).mz - (2.0 * G + K + WATER + 2.0 * P) / 2.0).abs()
                < 1e-6
        );
        assert_eq!(find(&ions, "y2", Side::Alpha, 1).sequence, "GK");
    }

    #[test]
    fn cross_linked_series() {
        let peptide = LinkedPeptide {
            alpha: Peptide::new("GKG", vec![Modification::new("Acetyl", 0, 42.010_565)]),
            linkage: Linkage::Cross {
                alpha_link: 2,
                beta: Peptide::new("KG", Vec::new()),
                beta_link: 1,
            },
        };
        let parameters = FragmentationParameters::default().charges(1..=1);
        let ions = peptide
            .theoretical_ions(&parameters, &AminoAcidTable::default())
            .unwrap();
        let alpha = 2.0 * G + K + 42.010_565 + WATER;
        let beta = G + K + WATER;

        let b1 = find(&ions, "b1", Side::Alpha, 1);
        assert!((b1.mz - (G + 42.010_565 + H)).abs() < 1e-6);
        assert_eq!(b1.modifications, vec!["Acetyl"]);
        // Contains the link, so carries the beta peptide and the linker
        let b2 = find(&ions, "B2", Side::Alpha, 1);
        assert!((b2.mz - (G + K + 42.010_565 + beta + LINKER + H)).abs() < 1e-6);
        let y1 = find(&ions, "y1", Side::Alpha, 1);
        assert!((y1.mz - (G + WATER + P)).abs() < 1e-6);
        let y1 = find(&ions, "y1", Side::Beta, 1);
        assert!((y1.mz - (G + WATER + P)).abs() < 1e-6);
        let b1 = find(&ions, "B1", Side::Beta, 1);
        assert!((b1.mz - (K + alpha + LINKER + H)).abs() < 1e-6);
        let precursor = find(&ions, "M+1H", Side::Alpha, 1);
        assert!((precursor.mz - (alpha + beta + LINKER + P)).abs() < 1e-6);
        assert_eq!(precursor.sequence, "GKG-KG");

        let limited = peptide
            .theoretical_ions(&parameters.max_mass(300.0), &AminoAcidTable::default())
            .unwrap();
        assert!(limited.iter().all(|i| i.mz <= 300.0));
        assert!(limited.iter().all(|i| i.series != IonSeries::Precursor));
        assert!(!limited.is_empty());
    }

    #[test]
    fn loop_link_series() {
        let peptide = LinkedPeptide {
            alpha: Peptide::new("KGKG", Vec::new()),
            linkage: Linkage::Loop(1, 3),
        };
        let parameters = FragmentationParameters::default()
            .ion_types([IonKind::B])
            .charges(1..=1);
        let ions = peptide
            .theoretical_ions(&parameters, &AminoAcidTable::default())
            .unwrap();
        // b1 and b2 would break the ring of the loop-link
        assert_eq!(
            ions.iter().map(TheoreticalIon::label).collect_vec(),
            vec!["B3", "M+1H"]
        );
        assert!((ions[0].mz - (2.0 * K + G + LINKER + H)).abs() < 1e-6);
    }

    #[test]
    fn average_masses() {
        let peptide = LinkedPeptide {
            alpha: Peptide::new("GK", Vec::new()),
            linkage: Linkage::Mono(2),
        };
        let parameters = FragmentationParameters::default()
            .mass_mode(MassMode::Average)
            .ion_types([IonKind::Y])
            .linker_mass(156.0786)
            .charges(1..=1);
        let ions = peptide
            .theoretical_ions(&parameters, &AminoAcidTable::default())
            .unwrap();
        let y1 = find(&ions, "Y1", Side::Alpha, 1);
        assert!((y1.mz - (128.1741 + 156.0786 + 18.01528 + P)).abs() < 1e-6);
    }
}
