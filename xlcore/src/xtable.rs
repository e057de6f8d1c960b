//! The canonical cross-link table, the xTable, with the textual representation of its cells.

use std::{
    collections::{BTreeMap, BTreeSet},
    fmt::Display,
    str::FromStr,
};

use context_error::*;
use itertools::Itertools;
use serde::{Deserialize, Serialize};

use crate::{XlError, link::generate_id};

/// The canonical columns of the xTable, in order
pub const CANONICAL_COLUMNS: [&str; 25] = [
    "rawfile",
    "scanno",
    "prec_ch",
    "pepseq1",
    "pepseq2",
    "xlink1",
    "xlink2",
    "xtype",
    "mod1",
    "mod2",
    "modpos1",
    "modpos2",
    "modmass1",
    "modmass2",
    "prot1",
    "prot2",
    "pos1",
    "pos2",
    "xpos1",
    "xpos2",
    "type",
    "score",
    "ID",
    "decoy",
    "search_engine",
];

/// The canonical columns that hold (optional) text and can be split on a delimiter
pub const TEXT_COLUMNS: [&str; 8] = [
    "rawfile",
    "pepseq1",
    "pepseq2",
    "xtype",
    "prot1",
    "prot2",
    "ID",
    "search_engine",
];

/// The extra column that marks rows that were created by splitting a concatenated cell
pub const SPLIT_ENTRY: &str = "split_entry";

/// The category of a cross-link
#[derive(
    Clone, Copy, Debug, Default, Deserialize, Eq, Hash, Ord, PartialEq, PartialOrd, Serialize,
)]
pub enum LinkType {
    /// Only one side of the cross-linker reacted
    Mono,
    /// Both sides of the cross-linker reacted with the same peptide
    Loop,
    /// Two different peptides from the same protein
    Intra,
    /// Two different proteins
    Inter,
    /// Two overlapping peptides from the same protein, so two copies of the protein
    Homomultimeric,
    /// No cross-linker is attached
    #[default]
    Linear,
}

impl LinkType {
    /// All link types
    pub const ALL: [Self; 6] = [
        Self::Mono,
        Self::Loop,
        Self::Intra,
        Self::Inter,
        Self::Homomultimeric,
        Self::Linear,
    ];

    /// The name as used in the xTable
    pub const fn name(self) -> &'static str {
        match self {
            Self::Mono => "mono",
            Self::Loop => "loop",
            Self::Intra => "intra",
            Self::Inter => "inter",
            Self::Homomultimeric => "homomultimeric",
            Self::Linear => "linear",
        }
    }

    /// If this links two peptides (intra, inter, or homomultimeric)
    pub const fn is_cross_link(self) -> bool {
        matches!(self, Self::Intra | Self::Inter | Self::Homomultimeric)
    }
}

impl Display for LinkType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

impl FromStr for LinkType {
    type Err = XlError;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|t| t.name().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| {
                BoxedError::new(
                    BasicKind::Error,
                    "Invalid link type",
                    format!(
                        "The link type '{s}' is not one of {}",
                        Self::ALL.iter().join(", ")
                    ),
                    Context::none(),
                )
            })
    }
}

/// A modification placed on a peptide
#[derive(Clone, Debug, Default, Deserialize, PartialEq, Serialize)]
pub struct Modification {
    /// The name of the modification, the engine's own name or the mass when no name is known
    pub name: String,
    /// The position in the peptide, 1-based, 0 for the N-terminus and length + 1 for the C-terminus
    pub position: usize,
    /// The mono-isotopic mass delta
    pub mass: f64,
}

impl Modification {
    /// Create a new modification
    pub fn new(name: impl Into<String>, position: usize, mass: f64) -> Self {
        Self {
            name: name.into(),
            position,
            mass,
        }
    }

    /// Combine the three parallel list cells (names, positions, masses) into modifications
    /// # Errors
    /// If the lists have different lengths or contain invalid numbers.
    pub fn from_lists(names: &str, positions: &str, masses: &str) -> Result<Vec<Self>, XlError> {
        let names = split_list(names);
        let positions = split_list(positions)
            .into_iter()
            .map(|p| {
                p.parse::<f64>()
                    .ok()
                    .filter(|v| *v >= 0.0 && v.fract() == 0.0)
                    .map(|v| v as usize)
                    .ok_or_else(|| list_error(format!("The position '{p}' is not a valid number")))
            })
            .collect::<Result<Vec<_>, _>>()?;
        let masses = split_list(masses)
            .into_iter()
            .map(|m| {
                m.parse::<f64>()
                    .map_err(|_| list_error(format!("The mass '{m}' is not a valid number")))
            })
            .collect::<Result<Vec<_>, _>>()?;
        if names.len() != positions.len() || names.len() != masses.len() {
            return Err(list_error(format!(
                "The modification lists are not parallel, there are {} names, {} positions, and {} masses",
                names.len(),
                positions.len(),
                masses.len()
            )));
        }
        Ok(names
            .into_iter()
            .zip(positions)
            .zip(masses)
            .map(|((name, position), mass)| Self::new(name, position, mass))
            .collect())
    }
}

fn list_error(long: String) -> XlError {
    BoxedError::new(
        BasicKind::Error,
        "Invalid modification list",
        long,
        Context::none(),
    )
}

/// Split a semicolon separated list cell, an empty cell is an empty list
pub fn split_list(text: &str) -> Vec<&str> {
    let text = text.trim();
    if text.is_empty() {
        Vec::new()
    } else {
        text.split(';').map(str::trim).collect()
    }
}

/// A single cross-link spectrum match in the canonical representation
#[derive(Clone, Debug, Default, Deserialize, PartialEq, Serialize)]
pub struct XTableRow {
    /// The raw file stem
    pub rawfile: Option<String>,
    /// The MS2 scan number
    pub scanno: Option<usize>,
    /// The precursor charge
    pub prec_ch: Option<usize>,
    /// The alpha peptide
    pub pepseq1: String,
    /// The beta peptide, absent for mono-links and linear peptides
    pub pepseq2: Option<String>,
    /// The link position in the alpha peptide, 1-based
    pub xlink1: Option<usize>,
    /// The link position in the beta peptide, 1-based
    pub xlink2: Option<usize>,
    /// The isotopic label tag of the cross-linker
    pub xtype: Option<String>,
    /// The modifications on the alpha peptide
    pub mods1: Vec<Modification>,
    /// The modifications on the beta peptide
    pub mods2: Vec<Modification>,
    /// The protein of the alpha peptide
    pub prot1: String,
    /// The protein of the beta peptide
    pub prot2: Option<String>,
    /// The position of the first residue of the alpha peptide in its protein, 1-based
    pub pos1: Option<usize>,
    /// The position of the first residue of the beta peptide in its protein, 1-based
    pub pos2: Option<usize>,
    /// The position of the linked residue of the alpha peptide in its protein, 1-based
    pub xpos1: Option<usize>,
    /// The position of the linked residue of the beta peptide in its protein, 1-based
    pub xpos2: Option<usize>,
    /// The category of the link
    pub link_type: LinkType,
    /// The score as reported by the engine
    pub score: Option<f64>,
    /// The canonical link identifier
    pub id: Option<String>,
    /// If any of the proteins is a decoy
    pub decoy: bool,
    /// The reader that produced this row
    pub search_engine: String,
    /// Any engine specific columns
    pub extras: BTreeMap<String, String>,
}

fn opt<T: Display>(value: Option<&T>) -> String {
    value.map_or_else(String::new, ToString::to_string)
}

fn join_mods(mods: &[Modification], f: impl Fn(&Modification) -> String) -> String {
    mods.iter().map(f).join(";")
}

fn parse_opt<T: FromStr>(column: &str, value: &str) -> Result<Option<T>, XlError> {
    let value = value.trim();
    if value.is_empty() {
        return Ok(None);
    }
    value
        .parse::<T>()
        .map(Some)
        .or_else(|_| {
            // Numbers written by spreadsheets can carry a trailing '.0'
            value
                .strip_suffix(".0")
                .and_then(|v| v.parse::<T>().ok())
                .map(Some)
                .ok_or(())
        })
        .map_err(|()| {
            BoxedError::new(
                BasicKind::Error,
                "Invalid cell",
                format!("The value '{value}' is not valid for column '{column}'"),
                Context::none(),
            )
        })
}

fn parse_bool(value: &str) -> Result<bool, XlError> {
    match value.trim().to_ascii_lowercase().as_str() {
        "true" | "1" | "yes" => Ok(true),
        "false" | "0" | "no" | "" => Ok(false),
        other => Err(BoxedError::new(
            BasicKind::Error,
            "Invalid cell",
            format!("The value '{other}' is not a valid boolean for column 'decoy'"),
            Context::none(),
        )),
    }
}

impl XTableRow {
    /// The textual value of a column, `None` if this is not a canonical column and not present
    /// as an extra column. Lists are joined with `;`.
    pub fn cell(&self, column: &str) -> Option<String> {
        Some(match column {
            "rawfile" => opt(self.rawfile.as_ref()),
            "scanno" => opt(self.scanno.as_ref()),
            "prec_ch" => opt(self.prec_ch.as_ref()),
            "pepseq1" => self.pepseq1.clone(),
            "pepseq2" => opt(self.pepseq2.as_ref()),
            "xlink1" => opt(self.xlink1.as_ref()),
            "xlink2" => opt(self.xlink2.as_ref()),
            "xtype" => opt(self.xtype.as_ref()),
            "mod1" => join_mods(&self.mods1, |m| m.name.clone()),
            "mod2" => join_mods(&self.mods2, |m| m.name.clone()),
            "modpos1" => join_mods(&self.mods1, |m| m.position.to_string()),
            "modpos2" => join_mods(&self.mods2, |m| m.position.to_string()),
            "modmass1" => join_mods(&self.mods1, |m| m.mass.to_string()),
            "modmass2" => join_mods(&self.mods2, |m| m.mass.to_string()),
            "prot1" => self.prot1.clone(),
            "prot2" => opt(self.prot2.as_ref()),
            "pos1" => opt(self.pos1.as_ref()),
            "pos2" => opt(self.pos2.as_ref()),
            "xpos1" => opt(self.xpos1.as_ref()),
            "xpos2" => opt(self.xpos2.as_ref()),
            "type" => self.link_type.to_string(),
            "score" => opt(self.score.as_ref()),
            "ID" | "id" => opt(self.id.as_ref()),
            "decoy" => self.decoy.to_string(),
            "search_engine" => self.search_engine.clone(),
            other => return self.extras.get(other).cloned(),
        })
    }

    /// Set a text column, either a canonical text column or an extra column
    /// # Errors
    /// If the column is a canonical column that does not hold text
    pub fn set_text(&mut self, column: &str, value: &str) -> Result<(), XlError> {
        let some = |v: &str| (!v.is_empty()).then(|| v.to_string());
        match column {
            "rawfile" => self.rawfile = some(value),
            "pepseq1" => self.pepseq1 = value.to_string(),
            "pepseq2" => self.pepseq2 = some(value),
            "xtype" => self.xtype = some(value),
            "prot1" => self.prot1 = value.to_string(),
            "prot2" => self.prot2 = some(value),
            "ID" | "id" => self.id = some(value),
            "search_engine" => self.search_engine = value.to_string(),
            other if CANONICAL_COLUMNS.contains(&other) => {
                return Err(BoxedError::new(
                    BasicKind::Error,
                    "Not a text column",
                    format!("The column '{other}' does not contain text"),
                    Context::none(),
                ));
            }
            other => {
                self.extras.insert(other.to_string(), value.to_string());
            }
        }
        Ok(())
    }

    /// Build a row from the cells of a serialised xTable, any non canonical column is kept as an
    /// extra column. The column names are matched case insensitively.
    /// # Errors
    /// If any of the canonical cells could not be parsed.
    pub fn from_cells<'a>(cells: impl IntoIterator<Item = (&'a str, &'a str)>) -> Result<Self, XlError> {
        let mut row = Self::default();
        let mut mod_lists: [[&str; 3]; 2] = [[""; 3]; 2];
        for (column, value) in cells {
            let value = value.trim();
            let lower = column.to_ascii_lowercase();
            match lower.as_str() {
                "scanno" => row.scanno = parse_opt(column, value)?,
                "prec_ch" => row.prec_ch = parse_opt(column, value)?,
                "xlink1" => row.xlink1 = parse_opt(column, value)?,
                "xlink2" => row.xlink2 = parse_opt(column, value)?,
                "pos1" => row.pos1 = parse_opt(column, value)?,
                "pos2" => row.pos2 = parse_opt(column, value)?,
                "xpos1" => row.xpos1 = parse_opt(column, value)?,
                "xpos2" => row.xpos2 = parse_opt(column, value)?,
                "score" => row.score = parse_opt(column, value)?,
                "decoy" => row.decoy = parse_bool(value)?,
                "type" => {
                    row.link_type = if value.is_empty() {
                        LinkType::Linear
                    } else {
                        value.parse()?
                    }
                }
                "mod1" => mod_lists[0][0] = value,
                "modpos1" => mod_lists[0][1] = value,
                "modmass1" => mod_lists[0][2] = value,
                "mod2" => mod_lists[1][0] = value,
                "modpos2" => mod_lists[1][1] = value,
                "modmass2" => mod_lists[1][2] = value,
                "rawfile" | "pepseq1" | "pepseq2" | "xtype" | "prot1" | "prot2" | "id"
                | "search_engine" => row.set_text(&lower, value)?,
                _ => {
                    row.extras.insert(column.to_string(), value.to_string());
                }
            }
        }
        row.mods1 = Modification::from_lists(mod_lists[0][0], mod_lists[0][1], mod_lists[0][2])?;
        row.mods2 = Modification::from_lists(mod_lists[1][0], mod_lists[1][1], mod_lists[1][2])?;
        Ok(row)
    }

    /// Check that all invariants of the canonical representation hold for this row, returning a
    /// description of the first broken invariant if any.
    pub fn check_invariants(&self) -> Result<(), String> {
        let len1 = self.pepseq1.len();
        if let Some(x) = self.xlink1
            && !(1..=len1).contains(&x)
        {
            return Err(format!(
                "Link position {x} is outside of peptide '{}'",
                self.pepseq1
            ));
        }
        if self.link_type != LinkType::Linear && self.xlink1.is_none() {
            return Err(format!(
                "A {} link needs a link position on the first peptide",
                self.link_type
            ));
        }
        if let (Some(pep), Some(x)) = (&self.pepseq2, self.xlink2)
            && !(1..=pep.len()).contains(&x)
        {
            return Err(format!("Link position {x} is outside of peptide '{pep}'"));
        }
        for (pos, xlink, xpos, side) in [
            (self.pos1, self.xlink1, self.xpos1, 1),
            (self.pos2, self.xlink2, self.xpos2, 2),
        ] {
            if let (Some(pos), Some(xlink), Some(xpos)) = (pos, xlink, xpos)
                && (pos + xlink).checked_sub(1) != Some(xpos)
            {
                return Err(format!(
                    "The absolute link position {xpos} of side {side} does not match the peptide position {pos} and link position {xlink}"
                ));
            }
        }
        match self.link_type {
            LinkType::Mono => {
                if self.pepseq2.is_some()
                    || self.xlink2.is_some()
                    || self.prot2.is_some()
                    || self.pos2.is_some()
                    || self.xpos2.is_some()
                {
                    return Err("A mono-link cannot have a second peptide".to_string());
                }
            }
            LinkType::Loop => {
                if self.pepseq2.as_deref() != Some(self.pepseq1.as_str())
                    || self.prot2.as_deref() != Some(self.prot1.as_str())
                    || self.pos2 != self.pos1
                {
                    return Err(
                        "A loop-link has to have the same peptide, protein, and position on both sides"
                            .to_string(),
                    );
                }
                if self.xlink2.is_none() || self.xlink1 == self.xlink2 {
                    return Err("A loop-link needs two distinct link positions".to_string());
                }
            }
            LinkType::Intra | LinkType::Inter | LinkType::Homomultimeric => {
                if self.pepseq2.is_none()
                    || self.xlink2.is_none()
                    || self.prot2.is_none()
                    || self.pos1.is_none()
                    || self.pos2.is_none()
                    || self.xpos1.is_none()
                    || self.xpos2.is_none()
                {
                    return Err(format!(
                        "An {} link has to have both sides fully defined",
                        self.link_type
                    ));
                }
            }
            LinkType::Linear => (),
        }
        if self.link_type.is_cross_link()
            && let (Some(prot2), Some(pos1), Some(pos2), Some(pep2)) =
                (&self.prot2, self.pos1, self.pos2, &self.pepseq2)
        {
            let expected = crate::link::categorize_inter_peptides(
                &self.prot1,
                pos1,
                &self.pepseq1,
                prot2,
                pos2,
                pep2,
            );
            if expected != self.link_type {
                return Err(format!(
                    "The link is categorised as {} but should be {expected}",
                    self.link_type
                ));
            }
        }
        let id = generate_id(
            self.link_type,
            &self.prot1,
            self.xpos1,
            self.prot2.as_deref(),
            self.xpos2,
        );
        if id != self.id {
            return Err(format!(
                "The ID '{}' is not the canonical ID '{}'",
                opt(self.id.as_ref()),
                opt(id.as_ref())
            ));
        }
        Ok(())
    }
}

/// A full xTable, a list of rows with the column order to use when serialising
#[derive(Clone, Debug, Default, Deserialize, PartialEq, Serialize)]
pub struct XTable {
    /// The rows
    pub rows: Vec<XTableRow>,
    /// The column order, canonical columns followed by the extra columns
    pub columns: Vec<String>,
}

impl XTable {
    /// Create a new table with the canonical column order followed by all extra columns in
    /// alphabetical order
    pub fn new(rows: Vec<XTableRow>) -> Self {
        let mut table = Self {
            rows,
            columns: Vec::new(),
        };
        table.columns = CANONICAL_COLUMNS
            .iter()
            .map(ToString::to_string)
            .chain(table.extra_columns())
            .collect();
        table
    }

    /// All extra (non canonical) columns present on any row, in alphabetical order
    pub fn extra_columns(&self) -> BTreeSet<String> {
        self.rows
            .iter()
            .flat_map(|r| r.extras.keys())
            .filter(|c| !CANONICAL_COLUMNS.contains(&c.as_str()))
            .cloned()
            .collect()
    }

    /// If the given column is either canonical or an extra column on any row
    pub fn has_column(&self, column: &str) -> bool {
        CANONICAL_COLUMNS.contains(&column) || self.rows.iter().any(|r| r.extras.contains_key(column))
    }

    /// The number of rows
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// If there are no rows
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Add all rows of another table at the end of this table, any new extra columns are added
    /// at the end of the column order
    pub fn append(&mut self, other: Self) {
        for column in other.columns {
            if !self.columns.contains(&column) {
                self.columns.push(column);
            }
        }
        self.rows.extend(other.rows);
    }

    /// Iterate over the textual cells of every row in the column order
    pub fn text_rows(&self) -> impl Iterator<Item = Vec<String>> + '_ {
        self.rows.iter().map(|row| {
            self.columns
                .iter()
                .map(|c| row.cell(c).unwrap_or_default())
                .collect()
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn mono() -> XTableRow {
        XTableRow {
            scanno: Some(1001),
            prec_ch: Some(3),
            pepseq1: "MTDSKYFTTNK".to_string(),
            xlink1: Some(5),
            mods1: vec![Modification::new("15.99", 1, 15.99)],
            prot1: "GeneA".to_string(),
            pos1: Some(38),
            xpos1: Some(42),
            link_type: LinkType::Mono,
            score: Some(27.3),
            id: Some("GeneA-42".to_string()),
            search_engine: "Kojak".to_string(),
            ..XTableRow::default()
        }
    }

    #[test]
    fn cells_round_trip() {
        let row = mono();
        let cells = CANONICAL_COLUMNS
            .iter()
            .map(|c| (*c, row.cell(c).unwrap()))
            .collect_vec();
        let back =
            XTableRow::from_cells(cells.iter().map(|(c, v)| (*c, v.as_str()))).unwrap();
        assert_eq!(back, row);
    }

    #[test]
    fn invariants() {
        let mut row = mono();
        assert_eq!(row.check_invariants(), Ok(()));
        row.xpos1 = Some(41);
        assert!(row.check_invariants().is_err());
        let mut row = mono();
        row.pepseq2 = Some("PEPTIDE".to_string());
        assert!(row.check_invariants().is_err());
        let mut row = mono();
        row.xlink1 = Some(12);
        assert!(row.check_invariants().is_err());
    }

    #[test]
    fn uneven_lists() {
        assert!(Modification::from_lists("a;b", "1", "1.0;2.0").is_err());
        assert_eq!(
            Modification::from_lists("Oxidation[M]", "3", "15.9949").unwrap(),
            vec![Modification::new("Oxidation[M]", 3, 15.9949)]
        );
        assert!(Modification::from_lists("", "", "").unwrap().is_empty());
    }

    #[test]
    fn link_type_names() {
        for t in LinkType::ALL {
            assert_eq!(t.to_string().parse::<LinkType>().unwrap(), t);
        }
        assert!("crosslink".parse::<LinkType>().is_err());
    }
}
