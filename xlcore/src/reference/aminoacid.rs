use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// The mass of a proton
pub const PROTON: f64 = 1.007_276_466_88;

/// Select either the mono-isotopic or average masses
#[derive(
    Clone, Copy, Debug, Default, Deserialize, Eq, Hash, Ord, PartialEq, PartialOrd, Serialize,
)]
pub enum MassMode {
    /// Mono-isotopic masses, the mass of the most abundant isotope of every element
    #[default]
    Monoisotopic,
    /// Average masses, weighted by the natural abundance of the isotopes
    Average,
}

impl MassMode {
    /// The mass of a hydrogen atom
    pub const fn hydrogen(self) -> f64 {
        match self {
            Self::Monoisotopic => 1.007_825_032_07,
            Self::Average => 1.00794,
        }
    }

    /// The mass of water
    pub const fn water(self) -> f64 {
        match self {
            Self::Monoisotopic => 18.010_564_683_7,
            Self::Average => 18.01528,
        }
    }

    /// The mass of carbon monoxide
    pub const fn carbon_monoxide(self) -> f64 {
        match self {
            Self::Monoisotopic => 27.994_914_622_1,
            Self::Average => 28.0101,
        }
    }
}

/// The residues with (one letter code, three letter code, mono-isotopic mass, average mass)
const RESIDUES: &[(char, &str, f64, f64)] = &[
    ('A', "ALA", 71.037_113_805, 71.0788),
    ('C', "CYS", 103.009_184_505, 103.1388),
    ('D', "ASP", 115.026_943_065, 115.0886),
    ('E', "GLU", 129.042_593_135, 129.1155),
    ('F', "PHE", 147.068_413_945, 147.1766),
    ('G', "GLY", 57.021_463_735, 57.0519),
    ('H', "HIS", 137.058_911_875, 137.1411),
    ('I', "ILE", 113.084_064_015, 113.1594),
    ('K', "LYS", 128.094_963_050, 128.1741),
    ('L', "LEU", 113.084_064_015, 113.1594),
    ('M', "MET", 131.040_484_645, 131.1926),
    ('N', "ASN", 114.042_927_470, 114.1038),
    ('O', "PYL", 237.147_726_925, 237.3018),
    ('P', "PRO", 97.052_763_875, 97.1167),
    ('Q', "GLN", 128.058_577_540, 128.1307),
    ('R', "ARG", 156.101_111_050, 156.1875),
    ('S', "SER", 87.032_028_435, 87.0782),
    ('T', "THR", 101.047_678_505, 101.1051),
    ('U', "SEC", 150.953_633_405, 150.0388),
    ('V', "VAL", 99.068_413_945, 99.1326),
    ('W', "TRP", 186.079_312_980, 186.2132),
    ('Y', "TYR", 163.063_328_575, 163.1760),
];

/// The three letter code for a residue, as used in PDB files
pub fn three_letter_code(residue: char) -> Option<&'static str> {
    let residue = residue.to_ascii_uppercase();
    RESIDUES
        .iter()
        .find(|r| r.0 == residue)
        .map(|r| r.1)
}

/// The masses of the amino acid residues. This is an explicitly constructed read only value, the
/// default contains the 22 proteinogenic amino acids. Additional residues (for example modified
/// residues from a search engine configuration) can be added before use.
#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
pub struct AminoAcidTable {
    masses: BTreeMap<char, (f64, f64)>,
}

impl Default for AminoAcidTable {
    fn default() -> Self {
        Self {
            masses: RESIDUES.iter().map(|r| (r.0, (r.2, r.3))).collect(),
        }
    }
}

impl AminoAcidTable {
    /// Get the residue mass for the given residue
    pub fn mass(&self, residue: char, mode: MassMode) -> Option<f64> {
        self.masses.get(&residue).map(|(mono, average)| match mode {
            MassMode::Monoisotopic => *mono,
            MassMode::Average => *average,
        })
    }

    /// Add or replace a residue
    #[must_use]
    pub fn with_residue(mut self, residue: char, monoisotopic: f64, average: f64) -> Self {
        self.masses.insert(residue, (monoisotopic, average));
        self
    }

    /// If this residue is known
    pub fn contains(&self, residue: char) -> bool {
        self.masses.contains_key(&residue)
    }

    /// The summed residue mass of a sequence, `None` if any residue is unknown
    pub fn sequence_mass(&self, sequence: &str, mode: MassMode) -> Option<f64> {
        sequence.chars().map(|c| self.mass(c, mode)).sum()
    }
}

#[test]
fn residue_masses() {
    let table = AminoAcidTable::default();
    assert!((table.mass('K', MassMode::Monoisotopic).unwrap() - 128.09496).abs() < 1e-5);
    assert!((table.mass('K', MassMode::Average).unwrap() - 128.1741).abs() < 1e-5);
    assert_eq!(table.mass('X', MassMode::Monoisotopic), None);
    assert!((table.sequence_mass("GG", MassMode::Monoisotopic).unwrap() - 114.04293).abs() < 1e-5);
    assert_eq!(three_letter_code('k'), Some("LYS"));
}
