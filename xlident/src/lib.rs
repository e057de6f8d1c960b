#![doc = include_str!("../README.md")]

mod draft;
mod format;
mod helper_functions;
mod options;
mod readers;

pub use format::InputFormat;
pub use options::ReaderOptions;

/// Read the given inputs with the given reader, see [`InputFormat::read`]
/// # Errors
/// If any of the inputs could not be read.
pub fn read(
    format: InputFormat,
    paths: &[impl AsRef<std::path::Path>],
    options: &ReaderOptions,
) -> Result<xlcore::xtable::XTable, xlcore::XlError> {
    format.read(paths, options)
}
