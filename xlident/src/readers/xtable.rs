use std::path::Path;

use context_error::*;
use xlcore::{XlError, csv::parse_csv, xtable::XTableRow};

/// Read a serialised xTable back in. All canonical columns are parsed (lists split on `;`), any
/// other column is kept as an extra column. The search engine is kept as written.
/// # Errors
/// If the file could not be read, or any row could not be parsed or breaks an invariant.
pub(crate) fn read_xtable(path: &Path) -> Result<Vec<XTableRow>, XlError> {
    let mut rows = Vec::new();
    for line in parse_csv(path, b',', None, 0)? {
        let line = line?;
        let cells = line
            .headers()
            .zip((0..line.number_of_columns()).map(|index| &line[index]));
        let row = XTableRow::from_cells(cells).map_err(|err| {
            BoxedError::new(
                BasicKind::Error,
                "Invalid xTable line",
                "This line could not be read as an xTable row",
                line.full_context().source(path.to_string_lossy()).to_owned(),
            )
            .add_underlying_errors(vec![err])
        })?;
        row.check_invariants().map_err(|long| {
            BoxedError::new(
                BasicKind::Error,
                "Invalid cross-link",
                long,
                line.full_context().source(path.to_string_lossy()).to_owned(),
            )
        })?;
        rows.push(row);
    }
    Ok(rows)
}
