//! Read only reference data: amino acid masses, modification masses, and element masses.

mod aminoacid;
mod formula;
mod modification;

pub use aminoacid::*;
pub use formula::*;
pub use modification::*;
