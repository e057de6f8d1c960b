use std::{
    fmt::Display,
    path::{Path, PathBuf},
    str::FromStr,
};

use context_error::*;
use itertools::Itertools;
use serde::{Deserialize, Serialize};
use xlcore::{XlError, xtable::XTable};

use crate::{
    WriterOptions,
    writers::{CrossLinkWriter, CustomTable, DynamXl, PLabel, XTableWriter, XVis, XWalk, XiNet},
};

/// All supported output formats
#[derive(Clone, Copy, Debug, Deserialize, Eq, Hash, Ord, PartialEq, PartialOrd, Serialize)]
pub enum OutputFormat {
    /// The canonical xTable as CSV
    XTable,
    /// Unique residue pairs for xVis
    XVis,
    /// The best match per link for xiNET
    XiNet,
    /// Distance restraints for DynamXL
    DynamXl,
    /// Distance requests for xWalk, one file per chain combination
    XWalk,
    /// pLabel files with their MGF files
    PLabel,
    /// A user defined template
    CustomTable,
}

impl OutputFormat {
    /// All output formats
    pub const ALL: [Self; 7] = [
        Self::XTable,
        Self::XVis,
        Self::XiNet,
        Self::DynamXl,
        Self::XWalk,
        Self::PLabel,
        Self::CustomTable,
    ];

    /// The tag of this writer, as used in output file names
    pub const fn name(self) -> &'static str {
        match self {
            Self::XTable => XTableWriter::TAG,
            Self::XVis => XVis::TAG,
            Self::XiNet => XiNet::TAG,
            Self::DynamXl => DynamXl::TAG,
            Self::XWalk => XWalk::TAG,
            Self::PLabel => PLabel::TAG,
            Self::CustomTable => CustomTable::TAG,
        }
    }

    /// Write the table in this format. The output path is the base path without extension,
    /// every writer adds its own extension (and suffixes for writers that write multiple files).
    /// The table is not changed. Returns all files that were written.
    /// # Errors
    /// If the options or the table do not allow writing this format (checked before any file
    /// is written), or if writing failed.
    pub fn write(
        self,
        table: &XTable,
        out: impl AsRef<Path>,
        options: &WriterOptions,
    ) -> Result<Vec<PathBuf>, XlError> {
        let out = out.as_ref();
        log::info!("Writing {} rows as {self} to '{}'", table.len(), out.display());
        let written = match self {
            Self::XTable => XTableWriter::write(table, out, options),
            Self::XVis => XVis::write(table, out, options),
            Self::XiNet => XiNet::write(table, out, options),
            Self::DynamXl => DynamXl::write(table, out, options),
            Self::XWalk => XWalk::write(table, out, options),
            Self::PLabel => PLabel::write(table, out, options),
            Self::CustomTable => CustomTable::write(table, out, options),
        }?;
        log::debug!("Wrote {}", written.iter().map(|p| p.display()).join(", "));
        Ok(written)
    }
}

impl Display for OutputFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

impl FromStr for OutputFormat {
    type Err = XlError;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalised = s.trim().to_ascii_lowercase().replace(['+', ' ', '_', '-'], "");
        match normalised.as_str() {
            "custom" => Ok(Self::CustomTable),
            "xinet" | "xinetcsv" => Ok(Self::XiNet),
            other => Self::ALL
                .into_iter()
                .find(|f| f.name().eq_ignore_ascii_case(other))
                .ok_or_else(|| {
                    BoxedError::new(
                        BasicKind::Error,
                        "Unknown writer",
                        format!(
                            "The writer '{s}' is not known, use one of {}",
                            Self::ALL.iter().join(", ")
                        ),
                        Context::none(),
                    )
                }),
        }
    }
}

#[test]
fn names() {
    for format in OutputFormat::ALL {
        assert_eq!(format.to_string().parse::<OutputFormat>().unwrap(), format);
    }
    assert_eq!(
        "custom_table".parse::<OutputFormat>().unwrap(),
        OutputFormat::CustomTable
    );
    assert_eq!("dynamxl".parse::<OutputFormat>().unwrap(), OutputFormat::DynamXl);
    assert!("pymol".parse::<OutputFormat>().is_err());
}
