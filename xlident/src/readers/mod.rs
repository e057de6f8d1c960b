//! The search engine specific readers, each turns the engine's own report into draft rows

use std::path::Path;

use xlcore::XlError;

use crate::{ReaderOptions, draft::DraftRow};

mod kojak;
mod percolator;
mod plink;
mod stavrox;
mod xi;
mod xquest;
mod xtable;

#[cfg(test)]
mod kojak_tests;
#[cfg(test)]
mod plink_tests;
#[cfg(test)]
mod xquest_tests;

pub(crate) use kojak::Kojak;
pub(crate) use percolator::KojakPercolator;
pub(crate) use plink::{PLink1, PLink2};
pub(crate) use stavrox::StavroX;
pub(crate) use xi::{Xi, XiFdr};
pub(crate) use xquest::XQuest;
pub(crate) use xtable::read_xtable;

/// A reader for the output of a single search engine
pub(crate) trait CrossLinkReader {
    /// The tag for this engine, used in the `search_engine` column
    const ENGINE: &'static str;

    /// Read the file (or directory) into draft rows, in file order
    /// # Errors
    /// If the input or any of its companion files could not be read or parsed.
    fn read_drafts(path: &Path, options: &ReaderOptions) -> Result<Vec<DraftRow>, XlError>;
}
