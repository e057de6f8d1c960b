use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// All options that influence how search engine results are read
#[derive(Clone, Debug, Deserialize, PartialEq, Eq, Serialize)]
#[serde(default)]
pub struct ReaderOptions {
    /// The raw file to use when the engine does not report it
    pub rawfile: Option<String>,
    /// The text in a protein name that marks it as a decoy
    #[serde(alias = "decoyString")]
    pub decoy_string: String,
    /// The column order of the resulting table, the canonical order if not set
    #[serde(alias = "colOrder")]
    pub col_order: Option<Vec<String>>,
    /// Only keep the columns from the column order
    pub compact: bool,
    /// The marker in the name of a validated Percolator file
    #[serde(alias = "validatedString")]
    pub validated_string: String,
    /// The marker in the name of Percolator files, everything before this is the sample name
    #[serde(alias = "percolatorString")]
    pub percolator_string: String,
    /// The StavroX `properties.ssf` file
    #[serde(alias = "ssfFile")]
    pub ssf_file: Option<PathBuf>,
    /// The Xi configuration file
    #[serde(alias = "xiConfig")]
    pub xi_config: Option<PathBuf>,
    /// The pLink `modification.ini` file, overrides the built in definitions
    #[serde(alias = "modificationIni")]
    pub modification_ini: Option<PathBuf>,
}

impl Default for ReaderOptions {
    fn default() -> Self {
        Self {
            rawfile: None,
            decoy_string: "REVERSE".to_string(),
            col_order: None,
            compact: false,
            validated_string: ".validated".to_string(),
            percolator_string: ".perc".to_string(),
            ssf_file: None,
            xi_config: None,
            modification_ini: None,
        }
    }
}

impl ReaderOptions {
    /// If the given protein name is a decoy according to the decoy string
    pub fn is_decoy(&self, protein: &str) -> bool {
        !self.decoy_string.is_empty() && protein.contains(&self.decoy_string)
    }
}
