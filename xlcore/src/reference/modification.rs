use std::{collections::BTreeMap, path::Path};

use context_error::*;
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};

use crate::{XlError, helper_functions::first_float, path::read_to_string};

/// The default pLink modification definitions
const DEFAULT_MODIFICATIONS: &str = include_str!("modification.ini");

/// The modification names and mono-isotopic masses as defined by pLink (`modification.ini`)
#[derive(Clone, Debug, Default, Deserialize, PartialEq, Serialize)]
pub struct ModificationTable {
    masses: BTreeMap<String, f64>,
}

impl ModificationTable {
    /// The built in modification definitions
    pub fn builtin() -> Self {
        Self::parse(DEFAULT_MODIFICATIONS).unwrap_or_default()
    }

    /// Load the modification table. The given path is used if present, otherwise a
    /// `modification.ini` in the user configuration directory is used if that exists, otherwise
    /// the built in definitions are used.
    /// # Errors
    /// If the file could not be read or parsed.
    pub fn load(path: Option<&Path>) -> Result<Self, XlError> {
        if let Some(path) = path {
            return Self::parse_file(path);
        }
        if let Some(config) = ProjectDirs::from("com", "com.snijderlab.xlconvert", "")
            .map(|dirs| dirs.config_dir().join("modification.ini"))
            .filter(|p| p.exists())
        {
            log::debug!("Using modification definitions from {}", config.display());
            return Self::parse_file(&config);
        }
        Ok(Self::builtin())
    }

    /// Parse a pLink `modification.ini` file
    /// # Errors
    /// If the file could not be read or parsed.
    pub fn parse_file(path: &Path) -> Result<Self, XlError> {
        Self::parse(&read_to_string(path)?).map_err(|err| {
            BoxedError::new(
                BasicKind::Error,
                "Invalid modification file",
                "The pLink modification definitions could not be read",
                Context::default().source(path.to_string_lossy()).to_owned(),
            )
            .add_underlying_errors(vec![err])
        })
    }

    /// Parse the contents of a pLink `modification.ini` file. Every `name=definition` line
    /// defines a modification, the mono-isotopic mass is the first number in the definition.
    /// Section headers, `@` lines, and the `nameN=` index lines are skipped.
    /// # Errors
    /// If a definition does not contain a mass.
    pub fn parse(text: &str) -> Result<Self, XlError> {
        let mut masses = BTreeMap::new();
        for (index, line) in text.lines().enumerate() {
            let line = line.trim();
            if line.is_empty() || line.starts_with('[') || line.starts_with('@') || line.starts_with('#') {
                continue;
            }
            let Some((name, definition)) = line.split_once('=') else {
                continue;
            };
            if name
                .strip_prefix("name")
                .is_some_and(|n| !n.is_empty() && n.bytes().all(|b| b.is_ascii_digit()))
            {
                continue;
            }
            let mass = first_float(definition).ok_or_else(|| {
                BoxedError::new(
                    BasicKind::Error,
                    "Invalid modification definition",
                    format!("The definition for '{name}' does not contain a mass"),
                    Context::full_line(index as u32, line).to_owned(),
                )
            })?;
            masses.insert(name.trim().to_string(), mass);
        }
        Ok(Self { masses })
    }

    /// Get the mass of a modification by its full pLink name, like `Oxidation[M]`
    pub fn mass(&self, name: &str) -> Option<f64> {
        self.masses.get(name).copied()
    }

    /// Add or replace a modification
    pub fn insert(&mut self, name: impl Into<String>, mass: f64) {
        self.masses.insert(name.into(), mass);
    }

    /// The number of known modifications
    pub fn len(&self) -> usize {
        self.masses.len()
    }

    /// If no modifications are known
    pub fn is_empty(&self) -> bool {
        self.masses.is_empty()
    }
}
