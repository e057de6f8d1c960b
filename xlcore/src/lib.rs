#![doc = include_str!("../README.md")]

mod helper_functions;

/// Column level operations: ordering and splitting concatenated cells
pub mod columns;
/// Parse CSV files while keeping track of all necessary info to generate great error messages
pub mod csv;
pub mod link;
pub mod mgf;
pub mod path;
pub mod reference;
pub mod xtable;

/// The error type used throughout the cross-link conversion crates
pub type XlError = context_error::BoxedError<'static, context_error::BasicKind>;

/// A subset of the types and traits that are envisioned to be used the most, importing this is a good starting point for working with the crate
pub mod prelude {
    pub use crate::XlError;
    pub use crate::columns::{canonical_order, order_columns, split_concatenated_lists};
    pub use crate::link::{categorize_inter_peptides, generate_id};
    pub use crate::mgf::{MgfEntry, MgfIndex, MgfSpectrum};
    pub use crate::reference::{AminoAcidTable, ElementTable, MassMode, ModificationTable};
    pub use crate::xtable::{CANONICAL_COLUMNS, LinkType, Modification, XTable, XTableRow};
}

#[cfg(test)]
use proptest as _;
