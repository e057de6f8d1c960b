//! Methods for reading and writing the delimited text files used by search engines and viewers.

use std::{
    fmt::Debug,
    io::{BufRead, BufReader, Read, Write},
    ops::Range,
    path::Path,
    str::FromStr,
    sync::Arc,
};

use context_error::*;
use flate2::bufread::GzDecoder;
use itertools::Itertools;
use serde::{Deserialize, Serialize};

use crate::{XlError, helper_functions::check_extension, path::open_file};

/// A single line in a CSV file
#[derive(Clone, Debug, Deserialize, Eq, Hash, PartialEq, Serialize)]
pub struct CsvLine {
    line_index: usize,
    line: String,
    fields: Vec<(Arc<String>, Range<usize>)>,
}

impl CsvLine {
    /// Get the line index (0 based)
    pub const fn line_index(&self) -> usize {
        self.line_index
    }

    /// Get the column headers
    pub fn headers(&self) -> impl Iterator<Item = &str> {
        self.fields.iter().map(|f| f.0.as_str())
    }

    /// Get the number of columns
    pub fn number_of_columns(&self) -> usize {
        self.fields.len()
    }

    /// Get the context applicable to the specified column
    pub fn column_context(&self, column: usize) -> Context<'static> {
        Context::line(
            Some(self.line_index as u32),
            &self.line,
            self.fields[column].1.start,
            self.fields[column].1.len(),
        )
        .to_owned()
    }

    /// Get the context for the whole line
    pub fn full_context(&self) -> Context<'static> {
        Context::full_line(self.line_index as u32, &self.line).to_owned()
    }

    /// Find the index of the first column that has one of the given names, the names are
    /// compared case insensitive and ignoring any spaces.
    pub fn column_index(&self, names: &[&str]) -> Option<usize> {
        names.iter().find_map(|name| {
            let name = normalise_header(name);
            self.fields
                .iter()
                .position(|f| normalise_header(f.0.as_str()) == name)
        })
    }

    /// Get the text of the first column that has one of the given names.
    pub fn get(&self, names: &[&str]) -> Option<&str> {
        self.column_index(names).map(|index| &self[index])
    }

    /// Get the specified column, by column name, with the given aliases
    /// # Errors
    /// If none of the given names is a column header
    pub fn index_column(&self, names: &[&str]) -> Result<(&str, usize), XlError> {
        self.column_index(names)
            .map(|index| (&self[index], index))
            .ok_or_else(|| {
                BoxedError::new(
                    BasicKind::Error,
                    "Could not find given column",
                    format!(
                        "This file does not contain the needed column '{}'",
                        names.join("' or '")
                    ),
                    self.full_context(),
                )
            })
    }

    /// Parse the column with one of the given names into the given format
    /// # Errors
    /// If the column is missing or the text could not be parsed
    pub fn parse_column<F: FromStr>(&self, names: &[&str], what: &str) -> Result<F, XlError> {
        let (text, index) = self.index_column(names)?;
        text.parse().map_err(|_| {
            BoxedError::new(
                BasicKind::Error,
                format!("Invalid {what}"),
                format!("The text '{text}' is not a valid {what}"),
                self.column_context(index),
            )
        })
    }

    /// Parse the column with one of the given names into the given format, where an empty cell,
    /// a missing column, or a dash is seen as a missing value
    /// # Errors
    /// If the text could not be parsed
    pub fn parse_optional<F: FromStr>(
        &self,
        names: &[&str],
        what: &str,
    ) -> Result<Option<F>, XlError> {
        let Some(index) = self.column_index(names) else {
            return Ok(None);
        };
        let text = &self[index];
        if text.is_empty() || text == "-" {
            Ok(None)
        } else {
            text.parse().map(Some).map_err(|_| {
                BoxedError::new(
                    BasicKind::Error,
                    format!("Invalid {what}"),
                    format!("The text '{text}' is not a valid {what}"),
                    self.column_context(index),
                )
            })
        }
    }
}

fn normalise_header(name: &str) -> String {
    name.chars()
        .filter(|c| !c.is_ascii_whitespace())
        .flat_map(char::to_lowercase)
        .collect()
}

impl std::ops::Index<usize> for CsvLine {
    type Output = str;
    fn index(&self, index: usize) -> &str {
        &self.line[self.fields[index].1.clone()]
    }
}

/// Parse a CSV file into an iterator with the parsed lines. Files ending in `.gz` are decompressed.
/// The given number of leading lines is skipped before the header line (for version banners).
/// # Errors
/// If the file cannot be opened it returns `Err` with the error.
/// If any single line cannot be read it returns an error for that line.
pub fn parse_csv(
    path: impl AsRef<Path>,
    separator: u8,
    provided_header: Option<Vec<String>>,
    skip_lines: usize,
) -> Result<Box<dyn Iterator<Item = Result<CsvLine, XlError>>>, XlError> {
    let file = open_file(path.as_ref())?;
    if check_extension(path, "gz") {
        Ok(Box::new(parse_csv_raw(
            GzDecoder::new(BufReader::new(file)),
            separator,
            provided_header,
            skip_lines,
        )?))
    } else {
        Ok(Box::new(parse_csv_raw(
            file,
            separator,
            provided_header,
            skip_lines,
        )?))
    }
}

/// Parse a CSV file from a raw `BufReader`
/// # Errors
/// If no header is provided and the first line could not be read as a header line.
/// Or if the 'sep=C' uses a character that is more than 1 byte wide in utf8.
pub fn parse_csv_raw<T: Read>(
    reader: T,
    mut separator: u8,
    provided_header: Option<Vec<String>>,
    skip_lines: usize,
) -> Result<CsvLineIter<T>, XlError> {
    let reader = BufReader::new(reader);
    let mut lines = reader.lines().enumerate().peekable();
    for _ in 0..skip_lines {
        let _banner = lines.next();
    }
    let mut skip = false;
    if let Some(sep) = lines
        .peek()
        .and_then(|(_, l)| l.as_ref().ok())
        .and_then(|l| l.strip_prefix("sep="))
    {
        skip = true;
        if let Some(c) = sep.chars().next() {
            if c.len_utf8() == 1 {
                separator = c as u8;
            } else {
                let text = format!("sep={sep}");
                return Err(BoxedError::new(
                    BasicKind::Error,
                    "Unicode value separators not supported",
                    "This is a character that takes more than 1 byte to represent in Unicode, this is not supported in parsing CSV files.",
                    Context::line(Some(0), &text, 4, sep.len()).to_owned(),
                ));
            }
        }
    }
    if skip {
        // Actually consume this line
        let _unused = lines.next();
    }
    let column_headers = if let Some(header) = provided_header {
        header.into_iter().map(Arc::new).collect()
    } else {
        let (_, column_headers) = lines.next().ok_or_else(|| {
            BoxedError::new(
                BasicKind::Error,
                "Could not parse csv file",
                "The file is empty",
                Context::none(),
            )
        })?;
        let header_line = column_headers.map_err(|err| {
            BoxedError::new(
                BasicKind::Error,
                "Could not read header line",
                err.to_string(),
                Context::none(),
            )
        })?;
        csv_separate(&header_line, separator)?
            .into_iter()
            .map(|r| Arc::new(header_line[r].to_lowercase()))
            .collect()
    };

    Ok(CsvLineIter {
        lines,
        header: column_headers,
        separator,
    })
}

/// An iterator returning CSV lines, empty lines are skipped
#[derive(Debug)]
pub struct CsvLineIter<T: Read> {
    lines: std::iter::Peekable<std::iter::Enumerate<std::io::Lines<BufReader<T>>>>,
    header: Vec<Arc<String>>,
    separator: u8,
}

impl<T: Read> CsvLineIter<T> {
    /// The (lowercased) column headers
    pub fn header(&self) -> &[Arc<String>] {
        &self.header
    }
}

impl<T: Read> Iterator for CsvLineIter<T> {
    type Item = Result<CsvLine, XlError>;
    fn next(&mut self) -> Option<Self::Item> {
        let (line_index, line) = loop {
            let (line_index, line) = self.lines.next()?;
            match line {
                Ok(line) if line.trim().is_empty() => (),
                Ok(line) => break (line_index, line),
                Err(err) => {
                    return Some(Err(BoxedError::new(
                        BasicKind::Error,
                        "Could not read line",
                        err.to_string(),
                        Context::default().line_index(line_index as u32),
                    )));
                }
            }
        };
        Some(csv_separate(&line, self.separator).and_then(|mut row| {
            // Trailing separators produce empty fields that are not part of the table
            while row.len() > self.header.len() && row.last().is_some_and(Range::is_empty) {
                row.pop();
            }
            if self.header.len() == row.len() {
                Ok(CsvLine {
                    line_index,
                    line,
                    fields: self.header.iter().cloned().zip(row).collect(),
                })
            } else {
                Err(BoxedError::new(
                    BasicKind::Error,
                    "Incorrect number of columns",
                    format!(
                        "It does not have the correct number of columns. {} columns were expected but {} were found.",
                        self.header.len(),
                        row.len()
                    ),
                    Context::full_line(line_index as u32, &line).to_owned(),
                ))
            }
        }))
    }
}

/// Split a line into the ranges of the separate fields. Fields can be enclosed in quotes, any
/// whitespace around a field is not part of the field.
/// # Errors
/// If the line is empty.
pub fn csv_separate(line: &str, separator: u8) -> Result<Vec<Range<usize>>, XlError> {
    if line.is_empty() {
        return Err(BoxedError::new(
            BasicKind::Error,
            "Empty line",
            "The line is empty",
            Context::none(),
        ));
    }
    let mut enclosed = None;
    let mut was_enclosed = false;
    let mut row = Vec::new();
    let mut start = None;
    let mut last_non_whitespace = None;
    for (index, ch) in line.bytes().enumerate() {
        match (ch, enclosed, start) {
            (b'\"', None, None) => {
                enclosed = Some(ch);
                start = Some(index + 1);
            }
            (c, Some(e), Some(s)) if c == e => {
                enclosed = None;
                row.push(s..index);
                start = None;
                last_non_whitespace = None;
                was_enclosed = true;
            }
            (_, Some(_), _) => (),
            (sep, None, Some(s)) if sep == separator => {
                if sep.is_ascii_whitespace() {
                    row.push(s..last_non_whitespace.unwrap_or(index));
                } else {
                    row.push(s..last_non_whitespace.unwrap_or(s));
                }
                start = None;
                last_non_whitespace = None;
                was_enclosed = false;
            }
            (sep, None, None) if sep == separator => {
                if !was_enclosed {
                    // ignore any separator directly after an enclosed field
                    row.push(index..index);
                    start = None;
                    last_non_whitespace = None;
                }
                was_enclosed = false;
            }
            (c, _, _) if c.is_ascii_whitespace() => (), // ignore
            (_, _, None) => {
                start = Some(index);
                last_non_whitespace = Some(index + 1);
            }
            _ => last_non_whitespace = Some(index + 1),
        }
    }
    if let Some(s) = start {
        if enclosed.is_some() {
            row.push(s..line.len());
        } else {
            row.push(s..last_non_whitespace.unwrap_or(line.len()));
        }
    } else if !was_enclosed {
        row.push(line.len()..line.len());
    }
    Ok(row)
}

impl std::fmt::Display for CsvLine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(
            f,
            "{}",
            Context::default()
                .line_index(self.line_index as u32)
                .lines(0, &self.line)
                .add_highlights(self.fields.iter().map(|f| (0, f.1.clone())))
        )
    }
}

/// Quote a single value if it contains the separator or a quote.
pub fn quote_field(value: &str, separator: char) -> String {
    if value.contains(separator) || value.contains('"') || value.contains('\n') {
        format!("\"{}\"", value.replace('\"', "\'"))
    } else {
        value.to_string()
    }
}

/// Write a CSV file with a fixed header, every row has to have the same number of fields as the
/// header. The header is left out if it is empty.
/// # Errors
/// If the `Write` implementation errors.
pub fn write_fixed_csv<S: AsRef<str>>(
    mut f: impl Write,
    header: &[&str],
    rows: impl IntoIterator<Item = impl IntoIterator<Item = S>>,
    separator: char,
) -> Result<(), std::io::Error> {
    let join = separator.to_string();
    if !header.is_empty() {
        writeln!(
            f,
            "{}",
            header.iter().map(|h| quote_field(h, separator)).join(&join)
        )?;
    }
    for row in rows {
        writeln!(
            f,
            "{}",
            row.into_iter()
                .map(|v| quote_field(v.as_ref(), separator))
                .join(&join)
        )?;
    }
    Ok(())
}
