//! Column level operations on an xTable.

use context_error::*;
use itertools::Itertools;

use crate::{
    XlError,
    xtable::{CANONICAL_COLUMNS, SPLIT_ENTRY, TEXT_COLUMNS, XTable},
};

/// Set the column order of the table. Without `compact` the given order is followed by all extra
/// columns in alphabetical order. With `compact` only the given columns are kept.
/// # Errors
/// When `compact` is set and one of the given columns is not present in the table.
pub fn order_columns(
    table: &mut XTable,
    canonical_order: &[impl AsRef<str>],
    compact: bool,
) -> Result<(), XlError> {
    let order = canonical_order
        .iter()
        .map(|c| c.as_ref().to_string())
        .collect_vec();
    if compact {
        if let Some(missing) = order.iter().find(|c| !table.has_column(c)) {
            return Err(BoxedError::new(
                BasicKind::Error,
                "Missing column",
                format!("The column '{missing}' is requested in the column order but is not present in the table"),
                Context::none(),
            ));
        }
        table.columns = order;
    } else {
        let extra = table
            .extra_columns()
            .into_iter()
            .filter(|c| !order.contains(c))
            .collect_vec();
        table.columns = order.into_iter().chain(extra).collect();
    }
    Ok(())
}

/// The default canonical column order
pub fn canonical_order() -> Vec<String> {
    CANONICAL_COLUMNS.iter().map(ToString::to_string).collect()
}

/// Split every row that contains the delimiter in any of the given text columns into one row per
/// token, all other cells are copied. Generated rows are marked with a `split_entry` column set to
/// `true`. Afterwards none of the targeted cells contains the delimiter.
/// # Errors
/// If any of the columns is not a text column of the table.
pub fn split_concatenated_lists(
    table: &mut XTable,
    columns: &[&str],
    delimiter: &str,
) -> Result<(), XlError> {
    if let Some(invalid) = columns.iter().copied().find(|c| {
        !(TEXT_COLUMNS.contains(c) || (!CANONICAL_COLUMNS.contains(c) && table.has_column(c)))
    }) {
        return Err(BoxedError::new(
            BasicKind::Error,
            "Invalid column to split",
            format!("The column '{invalid}' is not a text column of this table"),
            Context::none(),
        ));
    }
    if delimiter.is_empty() {
        return Err(BoxedError::new(
            BasicKind::Error,
            "Invalid delimiter",
            "The delimiter to split on cannot be empty",
            Context::none(),
        ));
    }
    let mut rows = Vec::with_capacity(table.rows.len());
    for row in table.rows.drain(..) {
        let mut expanded = vec![(row, false)];
        for column in columns {
            expanded = expanded
                .into_iter()
                .flat_map(|(row, split)| {
                    let cell = row.cell(column).unwrap_or_default();
                    if cell.contains(delimiter) {
                        cell.split(delimiter)
                            .map(str::trim)
                            .filter(|t| !t.is_empty())
                            .map(|token| {
                                let mut new = row.clone();
                                // Only fails for non text columns, which are rejected above
                                let _ = new.set_text(column, token);
                                (new, true)
                            })
                            .collect_vec()
                    } else {
                        vec![(row, split)]
                    }
                })
                .collect();
        }
        rows.extend(expanded.into_iter().map(|(mut row, split)| {
            if split {
                row.extras.insert(SPLIT_ENTRY.to_string(), "true".to_string());
            }
            row
        }));
    }
    table.rows = rows;
    if table.rows.iter().any(|r| r.extras.contains_key(SPLIT_ENTRY))
        && !table.columns.iter().any(|c| c == SPLIT_ENTRY)
    {
        table.columns.push(SPLIT_ENTRY.to_string());
    }
    Ok(())
}
