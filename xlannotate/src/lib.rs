#![doc = include_str!("../README.md")]

mod annotate;
/// Theoretical ions of (cross-linked) peptides
pub mod fragment;
/// Match theoretical ions to measured peaks
pub mod matching;
/// The parameters for fragmentation and matching
pub mod parameters;
pub mod peptide;

pub use annotate::{Annotation, annotate_row, find_spectrum};

/// A subset of the types and traits that are envisioned to be used the most, importing this is a good starting point for working with the crate
pub mod prelude {
    pub use crate::annotate::{Annotation, annotate_row};
    pub use crate::fragment::{IonSeries, Side, TheoreticalIon};
    pub use crate::matching::{Coverage, PeakMatch, match_peaks, ppm_error};
    pub use crate::parameters::{FragmentationParameters, IonKind, MatchingParameters};
    pub use crate::peptide::{LinkedPeptide, Linkage, Peptide};
}

#[cfg(test)]
use proptest as _;
#[cfg(test)]
use tempfile as _;
