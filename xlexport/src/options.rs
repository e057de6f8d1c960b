use std::{collections::BTreeMap, path::PathBuf};

use serde::{Deserialize, Serialize};

/// All options that influence how an xTable is written
#[derive(Clone, Debug, Deserialize, PartialEq, Eq, Serialize)]
#[serde(default)]
pub struct WriterOptions {
    /// Keep the extra (non canonical) columns when writing an xTable
    pub keep: bool,
    /// The PDB file the xWalk distances are calculated on, has to end in `.pdb`
    pub pdb: Option<String>,
    /// The difference between the protein positions and the residue numbers in the PDB file
    pub offset: i64,
    /// The chains of every protein in the PDB file, as protein name to chain identifiers (`AB`)
    pub chains: BTreeMap<String, String>,
    /// The atom used for xWalk distances, at most four characters
    pub atom: String,
    /// The directory with the MGF files for pLabel
    #[serde(alias = "mgfDir")]
    pub mgf_dir: Option<PathBuf>,
    /// The name of the cross-linker for pLabel
    pub xlinker: String,
    /// Write a single pLabel file for all raw files, with renamed spectra
    #[serde(alias = "mergepLabel")]
    pub merge_plabel: bool,
    /// The template for a custom table
    #[serde(alias = "customTemplatePath")]
    pub custom_template_path: Option<PathBuf>,
}

impl Default for WriterOptions {
    fn default() -> Self {
        Self {
            keep: false,
            pdb: None,
            offset: 0,
            chains: BTreeMap::new(),
            atom: "CA".to_string(),
            mgf_dir: None,
            xlinker: "DSS".to_string(),
            merge_plabel: false,
            custom_template_path: None,
        }
    }
}
