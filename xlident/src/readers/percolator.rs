use std::{
    collections::HashMap,
    io::{BufRead, BufReader},
    path::{Path, PathBuf},
};

use context_error::*;
use xlcore::{
    XlError,
    csv::{csv_separate, parse_csv},
    path::{io_error, open_file},
};

use crate::{
    ReaderOptions,
    draft::DraftRow,
    readers::{
        CrossLinkReader,
        kojak::{kojak_rawfile, parse_kojak_line},
    },
};

/// A validated Percolator result for a Kojak search. Next to the validated PSMs file the
/// Percolator input features file and the original Kojak report are needed.
#[derive(Clone, Copy, Debug)]
pub(crate) struct KojakPercolator;

/// The maximal difference between the scores in the features file and the Kojak report
const SCORE_TOLERANCE: f64 = 1e-3;

impl CrossLinkReader for KojakPercolator {
    const ENGINE: &'static str = "KojakPercolator";

    fn read_drafts(path: &Path, options: &ReaderOptions) -> Result<Vec<DraftRow>, XlError> {
        let (features_path, kojak_path) = companion_files(path, options)?;
        let features = read_features(&features_path)?;

        let rawfile = options
            .rawfile
            .clone()
            .unwrap_or_else(|| kojak_rawfile(&kojak_path));
        let mut kojak: HashMap<(usize, usize), Vec<(f64, f64, DraftRow)>> = HashMap::new();
        for line in parse_csv(&kojak_path, b'\t', None, 1)? {
            let line = line?;
            if let Some(draft) = parse_kojak_line(&line, &rawfile)?
                && let (Some(scan), Some(charge)) = (draft.scanno, draft.prec_ch)
            {
                let score = draft.score.unwrap_or_default();
                let d_score = line
                    .parse_optional::<f64>(&["dScore"], "dScore")?
                    .unwrap_or_default();
                kojak
                    .entry((scan, charge))
                    .or_default()
                    .push((score, d_score, draft));
            }
        }

        let (header, lines) = read_ragged(path)?;
        let column = |name: &str| {
            header
                .iter()
                .position(|h| h.eq_ignore_ascii_case(name))
                .ok_or_else(|| missing_column(path, name))
        };
        let id_column = column("PSMId")?;
        let score_column = column("score")?;
        let q_column = column("q-value")?;
        let pep_column = column("posterior_error_prob")?;

        let mut drafts = Vec::with_capacity(lines.len());
        for (line_index, fields) in lines {
            let field = |index: usize| fields.get(index).map_or("", String::as_str);
            let id = field(id_column);
            let feature = features.get(id).ok_or_else(|| {
                BoxedError::new(
                    BasicKind::Error,
                    "Missing Percolator features",
                    format!(
                        "The PSM '{id}' is not present in the features file '{}'",
                        features_path.display()
                    ),
                    Context::default()
                        .source(path.to_string_lossy())
                        .line_index(line_index as u32)
                        .to_owned(),
                )
            })?;
            let (_, _, draft) = kojak
                .get(&(feature.scan, feature.charge))
                .and_then(|candidates| {
                    candidates.iter().find(|(score, d_score, _)| {
                        (score - feature.score).abs() <= SCORE_TOLERANCE
                            && (d_score - feature.d_score).abs() <= SCORE_TOLERANCE
                    })
                })
                .ok_or_else(|| {
                    BoxedError::new(
                        BasicKind::Error,
                        "Missing Kojak result",
                        format!(
                            "The PSM '{id}' (scan {}, charge {}) is not present in the Kojak report '{}'",
                            feature.scan,
                            feature.charge,
                            kojak_path.display()
                        ),
                        Context::default()
                            .source(path.to_string_lossy())
                            .line_index(line_index as u32)
                            .to_owned(),
                    )
                })?;
            let mut draft = draft.clone();
            draft.line_index = Some(line_index);
            draft
                .extras
                .insert("percolator_score".to_string(), field(score_column).to_string());
            draft
                .extras
                .insert("percolator_qvalue".to_string(), field(q_column).to_string());
            draft
                .extras
                .insert("percolator_pep".to_string(), field(pep_column).to_string());
            drafts.push(draft);
        }
        Ok(drafts)
    }
}

/// Find the features file and the Kojak report for a validated Percolator file
pub(crate) fn companion_files(
    path: &Path,
    options: &ReaderOptions,
) -> Result<(PathBuf, PathBuf), XlError> {
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_default();
    let directory = path.parent().unwrap_or_else(|| Path::new(""));
    let naming_error = |marker: &str| {
        BoxedError::new(
            BasicKind::Error,
            "Invalid Percolator file name",
            format!("The file name '{name}' does not contain '{marker}'"),
            Context::default().source(path.to_string_lossy()).to_owned(),
        )
    };
    if options.validated_string.is_empty() || !name.contains(&options.validated_string) {
        return Err(naming_error(&options.validated_string));
    }
    let features = directory.join(name.replacen(&options.validated_string, "", 1));
    let sample = name
        .find(&options.percolator_string)
        .filter(|_| !options.percolator_string.is_empty())
        .map(|index| &name[..index])
        .ok_or_else(|| naming_error(&options.percolator_string))?;
    let kojak = directory.join(format!("{sample}.kojak.txt"));
    for companion in [&features, &kojak] {
        if !companion.exists() {
            return Err(BoxedError::new(
                BasicKind::Error,
                "Missing companion file",
                format!(
                    "The file '{}' is needed to read this Percolator file but it does not exist",
                    companion.display()
                ),
                Context::default().source(path.to_string_lossy()).to_owned(),
            ));
        }
    }
    Ok((features, kojak))
}

#[derive(Clone, Copy, Debug, PartialEq)]
struct Feature {
    scan: usize,
    charge: usize,
    score: f64,
    d_score: f64,
}

/// Read the Percolator input features, indexed by the PSM id
fn read_features(path: &Path) -> Result<HashMap<String, Feature>, XlError> {
    let (header, lines) = read_ragged(path)?;
    let column = |name: &str| {
        header
            .iter()
            .position(|h| h.eq_ignore_ascii_case(name))
            .ok_or_else(|| missing_column(path, name))
    };
    let id_column = column("SpecId")?;
    let scan_column = column("ScanNr")?;
    let score_column = column("Score")?;
    let d_score_column = column("dScore")?;
    let charge_column = column("Charge").ok();
    let one_hot_charges = header
        .iter()
        .enumerate()
        .filter_map(|(index, h)| {
            h.strip_prefix("Charge")
                .and_then(|c| c.parse::<usize>().ok())
                .map(|charge| (index, charge))
        })
        .collect::<Vec<_>>();

    let mut features = HashMap::with_capacity(lines.len());
    for (line_index, fields) in lines {
        let error = |name: &str| {
            BoxedError::new(
                BasicKind::Error,
                "Invalid Percolator features line",
                format!("The {name} is missing or not a valid number"),
                Context::default()
                    .source(path.to_string_lossy())
                    .line_index(line_index as u32)
                    .to_owned(),
            )
        };
        let number = |index: usize, name: &str| {
            fields
                .get(index)
                .and_then(|f| f.parse::<f64>().ok())
                .ok_or_else(|| error(name))
        };
        let charge = match charge_column {
            Some(index) => fields.get(index).and_then(|c| c.parse::<usize>().ok()),
            None => one_hot_charges
                .iter()
                .find(|(index, _)| fields.get(*index).is_some_and(|v| v == "1"))
                .map(|(_, charge)| *charge),
        }
        .ok_or_else(|| error("charge"))?;
        features.insert(
            fields.get(id_column).cloned().unwrap_or_default(),
            Feature {
                scan: fields
                    .get(scan_column)
                    .and_then(|s| s.parse::<usize>().ok())
                    .ok_or_else(|| error("scan number"))?,
                charge,
                score: number(score_column, "score")?,
                d_score: number(d_score_column, "dScore")?,
            },
        );
    }
    Ok(features)
}

/// Read a tab separated file where the last column (the proteins) can span multiple fields.
/// Returns the header and all non empty lines with their line index.
fn read_ragged(path: &Path) -> Result<(Vec<String>, Vec<(usize, Vec<String>)>), XlError> {
    let reader = BufReader::new(open_file(path)?);
    let mut header = None;
    let mut lines = Vec::new();
    for (line_index, line) in reader.lines().enumerate() {
        let line = line.map_err(|e| io_error(path, &e))?;
        if line.trim().is_empty() {
            continue;
        }
        let fields = csv_separate(&line, b'\t')?
            .into_iter()
            .map(|range| line[range].to_string())
            .collect::<Vec<_>>();
        if header.is_none() {
            header = Some(fields);
        } else if !fields
            .first()
            .is_some_and(|f| f.eq_ignore_ascii_case("DefaultDirection"))
        {
            lines.push((line_index, fields));
        }
    }
    Ok((header.unwrap_or_default(), lines))
}

fn missing_column(path: &Path, name: &str) -> XlError {
    BoxedError::new(
        BasicKind::Error,
        "Could not find given column",
        format!("This file does not contain the needed column '{name}'"),
        Context::default().source(path.to_string_lossy()).to_owned(),
    )
}
