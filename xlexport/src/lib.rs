#![doc = include_str!("../README.md")]

mod format;
mod options;
mod writers;

pub use format::OutputFormat;
pub use options::WriterOptions;

/// Write the table with the given writer, see [`OutputFormat::write`]
/// # Errors
/// If the table could not be written.
pub fn write(
    format: OutputFormat,
    table: &xlcore::xtable::XTable,
    out: impl AsRef<std::path::Path>,
    options: &WriterOptions,
) -> Result<Vec<std::path::PathBuf>, xlcore::XlError> {
    format.write(table, out, options)
}
