use std::ops::RangeInclusive;

use serde::{Deserialize, Serialize};
use xlcore::reference::MassMode;

/// The fragment ion types that can be generated
#[derive(
    Clone, Copy, Debug, Deserialize, Eq, Hash, Ord, PartialEq, PartialOrd, Serialize,
)]
pub enum IonKind {
    /// N-terminal fragment without the carbonyl
    A,
    /// N-terminal fragment
    B,
    /// C-terminal fragment
    Y,
}

impl IonKind {
    /// If this fragment contains the N-terminus
    pub const fn is_n_terminal(self) -> bool {
        matches!(self, Self::A | Self::B)
    }

    /// The series letter, upper case for fragments that carry the cross-link
    pub const fn letter(self, linked: bool) -> char {
        match (self, linked) {
            (Self::A, false) => 'a',
            (Self::A, true) => 'A',
            (Self::B, false) => 'b',
            (Self::B, true) => 'B',
            (Self::Y, false) => 'y',
            (Self::Y, true) => 'Y',
        }
    }

    /// The mass added to the summed residue masses to get the m/z times the charge
    pub fn series_term(self, charge: usize, mode: MassMode) -> f64 {
        let protons = charge as f64 * xlcore::reference::PROTON;
        match self {
            Self::A => -mode.carbon_monoxide() + protons,
            Self::B => mode.hydrogen() + protons - xlcore::reference::PROTON,
            Self::Y => mode.water() + protons,
        }
    }
}

/// Parameters for the generation of theoretical fragments
#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
#[serde(default)]
pub struct FragmentationParameters {
    /// The fragment ion types
    pub ion_types: Vec<IonKind>,
    /// The charges to generate fragments and precursors for
    pub charges: RangeInclusive<usize>,
    /// Mono-isotopic or average masses
    pub mass_mode: MassMode,
    /// The mass of the cross-linker (for mono-links the linker including the hydrolysed end)
    pub linker_mass: f64,
    /// Fragments with an m/z above this value are discarded
    pub max_mass: Option<f64>,
}

impl Default for FragmentationParameters {
    fn default() -> Self {
        Self {
            ion_types: vec![IonKind::B, IonKind::Y],
            charges: 1..=2,
            mass_mode: MassMode::Monoisotopic,
            linker_mass: 138.068_08,
            max_mass: None,
        }
    }
}

impl FragmentationParameters {
    /// Set the ion types
    #[must_use]
    pub fn ion_types(self, ion_types: impl Into<Vec<IonKind>>) -> Self {
        Self {
            ion_types: ion_types.into(),
            ..self
        }
    }

    /// Set the charge range
    #[must_use]
    pub fn charges(self, charges: RangeInclusive<usize>) -> Self {
        Self { charges, ..self }
    }

    /// Set the mass mode
    #[must_use]
    pub fn mass_mode(self, mass_mode: MassMode) -> Self {
        Self { mass_mode, ..self }
    }

    /// Set the linker mass
    #[must_use]
    pub fn linker_mass(self, linker_mass: f64) -> Self {
        Self {
            linker_mass,
            ..self
        }
    }

    /// Set the maximal m/z
    #[must_use]
    pub fn max_mass(self, max_mass: f64) -> Self {
        Self {
            max_mass: Some(max_mass),
            ..self
        }
    }
}

/// Parameters for the matching of theoretical fragments to peaks. A peak with m/z `m` matches a
/// theoretical m/z `t` if `m·(1 + low/1e6) ≤ t ≤ m·(1 + high/1e6)`.
#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
#[serde(default)]
pub struct MatchingParameters {
    /// The lower bound of the window in ppm, normally negative
    pub ppm_low: f64,
    /// The upper bound of the window in ppm
    pub ppm_high: f64,
}

impl MatchingParameters {
    /// A symmetric window of the given number of ppm
    pub const fn ppm(ppm: f64) -> Self {
        Self {
            ppm_low: -ppm.abs(),
            ppm_high: ppm.abs(),
        }
    }

    /// If the theoretical m/z falls in the window around the measured m/z
    pub fn contains(&self, measured: f64, theoretical: f64) -> bool {
        measured * (1.0 + self.ppm_low / 1e6) <= theoretical
            && theoretical <= measured * (1.0 + self.ppm_high / 1e6)
    }
}

impl Default for MatchingParameters {
    fn default() -> Self {
        Self::ppm(20.0)
    }
}
