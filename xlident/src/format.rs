use std::{fmt::Display, path::Path, str::FromStr};

use context_error::*;
use itertools::Itertools;
use serde::{Deserialize, Serialize};
use xlcore::{
    XlError,
    columns::{canonical_order, order_columns},
    xtable::{XTable, XTableRow},
};

use crate::{
    ReaderOptions,
    draft::finalize,
    readers::{
        CrossLinkReader, Kojak, KojakPercolator, PLink1, PLink2, StavroX, Xi, XiFdr, XQuest,
        read_xtable,
    },
};

/// All supported input formats
#[derive(Clone, Copy, Debug, Deserialize, Eq, Hash, Ord, PartialEq, PartialOrd, Serialize)]
pub enum InputFormat {
    /// A pLink 1 result directory
    PLink1,
    /// A pLink 2 result directory
    PLink2,
    /// A Kojak `.kojak.txt` report
    Kojak,
    /// A validated Percolator file for a Kojak search, with its companions
    KojakPercolator,
    /// An xQuest `xquest.xls` export
    XQuest,
    /// A StavroX export
    StavroX,
    /// An Xi CSV export
    Xi,
    /// An xiFDR CSV export
    XiFdr,
    /// A previously written xTable
    XTable,
}

impl InputFormat {
    /// All input formats
    pub const ALL: [Self; 9] = [
        Self::PLink1,
        Self::PLink2,
        Self::Kojak,
        Self::KojakPercolator,
        Self::XQuest,
        Self::StavroX,
        Self::Xi,
        Self::XiFdr,
        Self::XTable,
    ];

    /// The tag of this reader, as used in the `search_engine` column and output file names
    pub const fn name(self) -> &'static str {
        match self {
            Self::PLink1 => PLink1::ENGINE,
            Self::PLink2 => PLink2::ENGINE,
            Self::Kojak => Kojak::ENGINE,
            Self::KojakPercolator => KojakPercolator::ENGINE,
            Self::XQuest => XQuest::ENGINE,
            Self::StavroX => StavroX::ENGINE,
            Self::Xi => Xi::ENGINE,
            Self::XiFdr => XiFdr::ENGINE,
            Self::XTable => "xTable",
        }
    }

    /// If the input for this format is a directory instead of a file
    pub const fn is_directory(self) -> bool {
        matches!(self, Self::PLink1 | Self::PLink2)
    }

    /// Read all given inputs into a single table. The rows of every input are kept together in
    /// the order of the inputs. Afterwards the column order from the options is applied.
    /// # Errors
    /// If any of the inputs could not be read, the error names the offending input. No partial
    /// results are returned.
    pub fn read(
        self,
        paths: &[impl AsRef<Path>],
        options: &ReaderOptions,
    ) -> Result<XTable, XlError> {
        let mut rows = Vec::new();
        for path in paths {
            let path = path.as_ref();
            log::info!("Reading '{}' as {self}", path.display());
            let read = self.read_single(path, options).map_err(|err| {
                BoxedError::new(
                    BasicKind::Error,
                    "Could not read input",
                    format!("The input could not be read as {self}"),
                    Context::default().source(path.to_string_lossy()).to_owned(),
                )
                .add_underlying_errors(vec![err])
            })?;
            log::debug!("Read {} rows from '{}'", read.len(), path.display());
            rows.extend(read);
        }
        let mut table = XTable::new(rows);
        match &options.col_order {
            Some(order) => order_columns(&mut table, order, options.compact)?,
            None => order_columns(&mut table, &canonical_order(), options.compact)?,
        }
        Ok(table)
    }

    fn read_single(self, path: &Path, options: &ReaderOptions) -> Result<Vec<XTableRow>, XlError> {
        match self {
            Self::PLink1 => read_with::<PLink1>(path, options),
            Self::PLink2 => read_with::<PLink2>(path, options),
            Self::Kojak => read_with::<Kojak>(path, options),
            Self::KojakPercolator => read_with::<KojakPercolator>(path, options),
            Self::XQuest => read_with::<XQuest>(path, options),
            Self::StavroX => read_with::<StavroX>(path, options),
            Self::Xi => read_with::<Xi>(path, options),
            Self::XiFdr => read_with::<XiFdr>(path, options),
            Self::XTable => read_xtable(path),
        }
    }
}

fn read_with<R: CrossLinkReader>(
    path: &Path,
    options: &ReaderOptions,
) -> Result<Vec<XTableRow>, XlError> {
    let drafts = R::read_drafts(path, options)?;
    finalize(drafts, path, R::ENGINE, options)
}

impl Display for InputFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

impl FromStr for InputFormat {
    type Err = XlError;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalised = s.trim().to_ascii_lowercase().replace(['+', ' ', '_', '-'], "");
        match normalised.as_str() {
            "kojakpercolator" | "percolator" => Ok(Self::KojakPercolator),
            "xifdr" => Ok(Self::XiFdr),
            "plink" => Ok(Self::PLink2),
            other => Self::ALL
                .into_iter()
                .find(|f| f.name().eq_ignore_ascii_case(other))
                .ok_or_else(|| {
                    BoxedError::new(
                        BasicKind::Error,
                        "Unknown reader",
                        format!(
                            "The reader '{s}' is not known, use one of {}",
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
    for format in InputFormat::ALL {
        assert_eq!(format.to_string().parse::<InputFormat>().unwrap(), format);
    }
    assert_eq!(
        "Kojak+Percolator".parse::<InputFormat>().unwrap(),
        InputFormat::KojakPercolator
    );
    assert_eq!("xi-fdr".parse::<InputFormat>().unwrap(), InputFormat::XiFdr);
    assert!("mascot".parse::<InputFormat>().is_err());
}
