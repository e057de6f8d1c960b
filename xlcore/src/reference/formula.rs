use std::collections::BTreeMap;

use context_error::*;
use serde::{Deserialize, Serialize};

use crate::XlError;

/// Mono-isotopic masses of elements, used to calculate the mass of chemical formulas
#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
pub struct ElementTable {
    masses: BTreeMap<String, f64>,
}

impl Default for ElementTable {
    fn default() -> Self {
        Self {
            masses: [
                ("H", 1.007_825_032_07),
                ("C", 12.0),
                ("N", 14.003_074_004_8),
                ("O", 15.994_914_619_6),
                ("P", 30.973_761_998),
                ("S", 31.972_071_174),
                ("Se", 79.916_521_3),
                ("Na", 22.989_769_282),
                ("K", 38.963_706_486),
                ("Cl", 34.968_852_682),
            ]
            .into_iter()
            .map(|(e, m)| (e.to_string(), m))
            .collect(),
        }
    }
}

impl ElementTable {
    /// An empty table
    pub const fn empty() -> Self {
        Self {
            masses: BTreeMap::new(),
        }
    }

    /// Add or replace an element
    pub fn insert(&mut self, element: impl Into<String>, mass: f64) {
        self.masses.insert(element.into(), mass);
    }

    /// Get the mass of an element
    pub fn mass(&self, element: &str) -> Option<f64> {
        self.masses.get(element).copied()
    }

    /// Calculate the mass of a formula like `C6H12O6`, `C2H3N1O1`, or `H-2O`. Elements are an
    /// uppercase letter followed by any lowercase letters, the count is an optional (signed)
    /// integer that defaults to one. Whitespace is ignored.
    /// # Errors
    /// If an element is unknown or the formula is malformed.
    pub fn formula_mass(&self, formula: &str) -> Result<f64, XlError> {
        let error = |long: String| {
            BoxedError::new(
                BasicKind::Error,
                "Invalid formula",
                long,
                Context::show(formula.to_string()),
            )
        };
        let chars: Vec<char> = formula.chars().filter(|c| !c.is_whitespace()).collect();
        let mut index = 0;
        let mut mass = 0.0;
        while index < chars.len() {
            if !chars[index].is_ascii_uppercase() {
                return Err(error(format!(
                    "Expected an element at position {index} but found '{}'",
                    chars[index]
                )));
            }
            let start = index;
            index += 1;
            while index < chars.len() && chars[index].is_ascii_lowercase() {
                index += 1;
            }
            let element: String = chars[start..index].iter().collect();
            let count_start = index;
            if index < chars.len() && chars[index] == '-' {
                index += 1;
            }
            while index < chars.len() && chars[index].is_ascii_digit() {
                index += 1;
            }
            let count_text: String = chars[count_start..index].iter().collect();
            let count: i32 = match count_text.as_str() {
                "" => 1,
                "-" => -1,
                text => text
                    .parse()
                    .map_err(|_| error(format!("Invalid element count '{text}'")))?,
            };
            let element_mass = self
                .mass(&element)
                .ok_or_else(|| error(format!("Unknown element '{element}'")))?;
            mass += f64::from(count) * element_mass;
        }
        Ok(mass)
    }
}
