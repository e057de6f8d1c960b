use std::{
    collections::HashSet,
    io::{BufRead, BufReader},
    path::{Path, PathBuf},
};

use context_error::*;
use itertools::Itertools;
use xlcore::{
    XlError,
    csv::{csv_separate, parse_csv},
    mgf::parse_title,
    path::{io_error, open_file},
    reference::ModificationTable,
    xtable::Modification,
};

use crate::{
    ReaderOptions,
    draft::{DraftLink, DraftRow, Peptide, ProteinRef},
    helper_functions::{explain_number_error, line_error, parse_charge, split_with_brackets},
    readers::CrossLinkReader,
};

/// A pLink 1 result directory, with the combined protein level reports per link class
#[derive(Clone, Copy, Debug)]
pub(crate) struct PLink1;

/// A pLink 2 result directory, with a peptide level and a spectrum level report per link class
#[derive(Clone, Copy, Debug)]
pub(crate) struct PLink2;

const PLINK1_REPORTS: [&str; 3] = [
    "_inter_combine.protein.xls",
    "_loop_combine.protein.xls",
    "_mono_combine.protein.xls",
];

const PLINK2_CLASSES: [&str; 3] = ["cross-linked", "loop-linked", "mono-linked"];

/// The place a modification is attached to
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum ModificationSite {
    /// The alpha peptide at this position (0 is the N-terminus, length + 1 the C-terminus)
    Alpha(usize),
    /// The beta peptide at this position (0 is the N-terminus, length + 1 the C-terminus)
    Beta(usize),
    /// The cross-linker itself
    Linker,
}

/// pLink 1 counts positions over the concatenation of both peptides
pub(crate) fn plink1_site(
    position: usize,
    len1: usize,
    len2: Option<usize>,
) -> Result<ModificationSite, String> {
    match len2 {
        Some(len2) if position > len1 => {
            if position - len1 <= len2 {
                Ok(ModificationSite::Beta(position - len1))
            } else {
                Err(format!(
                    "The modification position {position} is after the end of both peptides ({len1} + {len2})"
                ))
            }
        }
        _ if position <= len1 + 1 => Ok(ModificationSite::Alpha(position)),
        _ => Err(format!(
            "The modification position {position} is after the end of the peptide ({len1})"
        )),
    }
}

/// pLink 2 has three positions between the peptides: the C-terminus of the alpha peptide, the
/// cross-linker, and the N-terminus of the beta peptide
pub(crate) fn plink2_site(
    position: usize,
    len1: usize,
    len2: Option<usize>,
) -> Result<ModificationSite, String> {
    match len2 {
        _ if position <= len1 + 1 => Ok(ModificationSite::Alpha(position)),
        Some(_) if position == len1 + 2 => Ok(ModificationSite::Linker),
        Some(len2) if position - (len1 + 3) <= len2 + 1 => {
            Ok(ModificationSite::Beta(position - (len1 + 3)))
        }
        _ => Err(format!(
            "The modification position {position} is after the end of the peptide(s)"
        )),
    }
}

/// Separate the pLink format of `pep(pos)-pep(pos)`, `pep(pos)(pos)`, `pep(pos)`, or `pep`
pub(crate) fn plink_separate<'a>(
    text: &'a str,
) -> Result<(&'a str, Option<usize>, Option<&'a str>, Option<usize>), String> {
    let text = text.trim();
    let number = |part: &str| {
        part.trim().parse::<usize>().map_err(|err| {
            format!(
                "The position '{part}' in '{text}' {}",
                explain_number_error(&err)
            )
        })
    };
    if let Some((first, second)) = text.split_once(")-") {
        let first_open = first.rfind('(').ok_or_else(|| {
            format!(
                "'{text}' should follow the format 'PEP1(pos1)-PEP2(pos2)' but the opening bracket '(' was not found for PEP1"
            )
        })?;
        let second = second.strip_suffix(')').ok_or_else(|| {
            format!(
                "'{text}' should follow the format 'PEP1(pos1)-PEP2(pos2)' but the closing bracket ')' was not found for PEP2"
            )
        })?;
        let second_open = second.rfind('(').ok_or_else(|| {
            format!(
                "'{text}' should follow the format 'PEP1(pos1)-PEP2(pos2)' but the opening bracket '(' was not found for PEP2"
            )
        })?;
        Ok((
            first[..first_open].trim(),
            Some(number(&first[first_open + 1..])?),
            Some(second[..second_open].trim()),
            Some(number(&second[second_open + 1..])?),
        ))
    } else {
        // rsplit to prevent picking a bracket in the text field, and then reverse for it to make sense to human brains
        let mut split = text.rsplitn(3, '(').collect_vec();
        split.reverse();
        let close = |part: &'a str| {
            part.strip_suffix(')').ok_or_else(|| {
                format!("'{text}' should follow the format 'PEP(pos1)(pos2)' but a closing bracket ')' is missing")
            })
        };
        match split.len() {
            3 => Ok((
                split[0].trim(),
                Some(number(close(split[1])?)?),
                None,
                Some(number(close(split[2])?)?),
            )),
            2 => Ok((split[0].trim(), Some(number(close(split[1])?)?), None, None)),
            _ => Ok((text, None, None, None)),
        }
    }
}

/// The fields of a single pLink identification, shared between both versions
struct PLinkRow<'a> {
    title: &'a str,
    charge: Option<usize>,
    sequence: &'a str,
    xtype: Option<String>,
    modifications: Vec<(usize, String)>,
    proteins: &'a str,
    score: Option<f64>,
    decoy: Option<bool>,
}

type SiteRule = fn(usize, usize, Option<usize>) -> Result<ModificationSite, String>;

fn plink_draft(
    row: PLinkRow<'_>,
    table: &ModificationTable,
    site: SiteRule,
) -> Result<DraftRow, String> {
    let (rawfile, scan, title_charge) = parse_title(row.title)
        .ok_or_else(|| format!("The spectrum title '{}' is not in a recognised format", row.title))?;
    let (sequence1, xlink1, sequence2, xlink2) = plink_separate(row.sequence)?;
    let mut alpha = Peptide {
        sequence: sequence1.to_string(),
        xlink: xlink1,
        mods: Vec::new(),
    };
    let mut beta = sequence2.map(|sequence| Peptide {
        sequence: sequence.to_string(),
        xlink: xlink2,
        mods: Vec::new(),
    });
    for (position, name) in row.modifications {
        let mass = table.mass(&name).ok_or_else(|| {
            format!("The modification '{name}' is not defined in the pLink modification table")
        })?;
        match (
            site(
                position,
                alpha.sequence.len(),
                beta.as_ref().map(|b| b.sequence.len()),
            )?,
            beta.as_mut(),
        ) {
            (ModificationSite::Alpha(p), _) => alpha.mods.push(Modification::new(name, p, mass)),
            (ModificationSite::Beta(p), Some(beta)) => {
                beta.mods.push(Modification::new(name, p, mass));
            }
            (ModificationSite::Linker, _) => {
                log::debug!("Discarded the modification '{name}' that is placed on the cross-linker");
            }
            (ModificationSite::Beta(_), None) => {
                return Err(format!(
                    "The modification '{name}' is placed on a second peptide that does not exist"
                ));
            }
        }
    }
    let link = match (beta, xlink1, xlink2) {
        (Some(beta), _, _) => DraftLink::Cross { beta },
        (None, Some(_), Some(xlink2)) => DraftLink::Loop { xlink2 },
        (None, Some(_), None) => DraftLink::Mono,
        (None, None, _) => DraftLink::Linear,
    };
    let proteins = split_with_brackets(row.proteins, b'/', b'(', b')')
        .into_iter()
        .map(|protein| {
            let (name1, position1, name2, position2) = plink_separate(protein)?;
            Ok(match &link {
                DraftLink::Cross { .. } => (
                    ProteinRef::at_xpos(name1, position1),
                    Some(ProteinRef::at_xpos(
                        name2.ok_or_else(|| {
                            format!("The protein '{protein}' is not a protein pair for a cross-link")
                        })?,
                        position2,
                    )),
                ),
                DraftLink::Linear => (ProteinRef::at_pos(name1, position1), None),
                DraftLink::Mono | DraftLink::Loop { .. } => {
                    (ProteinRef::at_xpos(name1, position1), None)
                }
            })
        })
        .collect::<Result<Vec<_>, String>>()?;
    Ok(DraftRow {
        rawfile,
        scanno: Some(scan),
        prec_ch: row.charge.or(title_charge),
        xtype: row.xtype,
        score: row.score,
        alpha,
        link,
        proteins,
        decoy: row.decoy,
        ..DraftRow::default()
    })
}

/// Find all files in the directory (or a `reports` subdirectory) whose name ends in the given suffix
fn find_reports(directory: &Path, suffix: &str) -> Result<Vec<PathBuf>, XlError> {
    let mut found = Vec::new();
    for directory in [directory.to_path_buf(), directory.join("reports")] {
        if !directory.is_dir() {
            continue;
        }
        for entry in std::fs::read_dir(&directory).map_err(|e| io_error(&directory, &e))? {
            let path = entry.map_err(|e| io_error(&directory, &e))?.path();
            if path
                .file_name()
                .is_some_and(|n| n.to_string_lossy().ends_with(suffix))
            {
                found.push(path);
            }
        }
    }
    found.sort();
    Ok(found)
}

fn no_reports(path: &Path, expected: &str) -> XlError {
    BoxedError::new(
        BasicKind::Error,
        "No pLink reports",
        format!("The directory does not contain any pLink reports ({expected})"),
        Context::default().source(path.to_string_lossy()).to_owned(),
    )
}

impl CrossLinkReader for PLink1 {
    const ENGINE: &'static str = "pLink1";

    fn read_drafts(path: &Path, options: &ReaderOptions) -> Result<Vec<DraftRow>, XlError> {
        let table = ModificationTable::load(options.modification_ini.as_deref())?;
        let files = if path.is_file() {
            vec![path.to_path_buf()]
        } else {
            let mut files = Vec::new();
            for suffix in PLINK1_REPORTS {
                files.extend(find_reports(path, suffix)?);
            }
            files
        };
        if files.is_empty() {
            return Err(no_reports(path, &PLINK1_REPORTS.join(", ")));
        }
        let mut drafts = Vec::new();
        for file in files {
            log::debug!("Reading pLink 1 report '{}'", file.display());
            drafts.extend(read_plink1_report(&file, &table)?);
        }
        Ok(drafts)
    }
}

/// The kind of line in a two level pLink 1 report
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum ReportLine {
    ProteinHeader,
    Protein,
    PeptideHeader,
    Peptide,
}

/// Recognise the kind of line by its prefix
pub(crate) fn classify_report_line(line: &str) -> Option<ReportLine> {
    let indented = line.starts_with(char::is_whitespace);
    let trimmed = line.trim_start();
    let starts_with_number = trimmed.starts_with(|c: char| c.is_ascii_digit());
    match (indented, trimmed.starts_with("Order"), starts_with_number) {
        (false, true, _) => Some(ReportLine::ProteinHeader),
        (false, _, true) => Some(ReportLine::Protein),
        (true, true, _) => Some(ReportLine::PeptideHeader),
        (true, _, true) => Some(ReportLine::Peptide),
        _ => None,
    }
}

fn read_plink1_report(path: &Path, table: &ModificationTable) -> Result<Vec<DraftRow>, XlError> {
    let reader = BufReader::new(open_file(path)?);
    let mut header: Option<Vec<String>> = None;
    let mut drafts = Vec::new();
    for (line_index, line) in reader.lines().enumerate() {
        let line = line.map_err(|e| io_error(path, &e))?;
        if line.trim().is_empty() {
            continue;
        }
        let error = |long: String| {
            BoxedError::new(
                BasicKind::Error,
                "Invalid pLink 1 line",
                long,
                Context::full_line(line_index as u32, &line).to_owned(),
            )
        };
        let fields = || -> Result<Vec<&str>, XlError> {
            let trimmed = line.trim_start();
            let offset = line.len() - trimmed.len();
            Ok(csv_separate(trimmed, b'\t')?
                .into_iter()
                .map(|range| &line[offset + range.start..offset + range.end])
                .collect())
        };
        match classify_report_line(&line) {
            Some(ReportLine::ProteinHeader | ReportLine::Protein) => (),
            Some(ReportLine::PeptideHeader) => {
                header = Some(fields()?.into_iter().map(str::to_ascii_lowercase).collect());
            }
            Some(ReportLine::Peptide) => {
                let header = header.as_ref().ok_or_else(|| {
                    error("A peptide line is found before the peptide header line".to_string())
                })?;
                let fields = fields()?;
                let column = |names: &[&str]| {
                    names
                        .iter()
                        .find_map(|name| header.iter().position(|h| h == name))
                        .and_then(|index| fields.get(index).copied())
                        .ok_or_else(|| {
                            error(format!("The column '{}' is missing", names.join("' or '")))
                        })
                };
                let sequence = column(&["sequence", "peptide"])?;
                let (sequence, xtype) = match sequence.rsplit_once(':') {
                    Some((sequence, xtype)) => (sequence, Some(xtype.trim().to_string())),
                    None => (sequence, None),
                };
                let score = column(&["score"])?;
                let row = PLinkRow {
                    title: column(&["spectrum", "title"])?,
                    charge: None,
                    sequence,
                    xtype,
                    modifications: plink1_modifications(column(&["modification", "modifications"])?)
                        .map_err(error)?,
                    proteins: column(&["proteins", "protein"])?,
                    score: Some(score.parse().map_err(|_| {
                        error(format!("The score '{score}' is not a valid number"))
                    })?),
                    decoy: None,
                };
                let mut draft = plink_draft(row, table, plink1_site).map_err(error)?;
                draft.line_index = Some(line_index);
                drafts.push(draft);
            }
            None => {
                return Err(error(
                    "This line is not recognised as a protein or peptide line".to_string(),
                ));
            }
        }
    }
    Ok(drafts)
}

/// Parse the pLink 1 modification field `N,Name[site];N,Name[site];` or `null`
pub(crate) fn plink1_modifications(text: &str) -> Result<Vec<(usize, String)>, String> {
    let text = text.trim();
    if text.is_empty() || text.eq_ignore_ascii_case("null") {
        return Ok(Vec::new());
    }
    text.split(';')
        .map(str::trim)
        .filter(|m| !m.is_empty())
        .map(|m| {
            let (position, name) = m.split_once(',').ok_or_else(|| {
                format!("A pLink modification should follow the format 'N,Name[site]' but '{m}' does not contain a comma")
            })?;
            let position = position.trim().parse::<usize>().map_err(|err| {
                format!(
                    "The modification position '{position}' {}",
                    explain_number_error(&err)
                )
            })?;
            Ok((position, name.trim().to_string()))
        })
        .collect()
}

/// Parse the pLink 2 modification field `Name[site](N);Name[site](N)` or `null`
pub(crate) fn plink2_modifications(text: &str) -> Result<Vec<(usize, String)>, String> {
    let text = text.trim();
    if text.is_empty() || text.eq_ignore_ascii_case("null") {
        return Ok(Vec::new());
    }
    text.split(';')
        .map(str::trim)
        .filter(|m| !m.is_empty())
        .map(|m| {
            let open = m.rfind('(').filter(|_| m.ends_with(')')).ok_or_else(|| {
                format!("A pLink modification should follow the format 'Name[site](N)' but '{m}' does not end in a position")
            })?;
            let position = &m[open + 1..m.len() - 1];
            let position = position.trim().parse::<usize>().map_err(|err| {
                format!(
                    "The modification position '{position}' {}",
                    explain_number_error(&err)
                )
            })?;
            Ok((position, m[..open].trim().to_string()))
        })
        .collect()
}

impl CrossLinkReader for PLink2 {
    const ENGINE: &'static str = "pLink2";

    fn read_drafts(path: &Path, options: &ReaderOptions) -> Result<Vec<DraftRow>, XlError> {
        let table = ModificationTable::load(options.modification_ini.as_deref())?;
        let mut drafts = Vec::new();
        let mut any = false;
        for class in PLINK2_CLASSES {
            for spectra in find_reports(path, &format!("_{class}_spectra.csv"))? {
                any = true;
                let name = spectra
                    .file_name()
                    .map(|n| n.to_string_lossy().to_string())
                    .unwrap_or_default();
                let peptides = spectra.with_file_name(name.replace(
                    &format!("_{class}_spectra.csv"),
                    &format!("_{class}_peptides.csv"),
                ));
                if !peptides.exists() {
                    return Err(BoxedError::new(
                        BasicKind::Error,
                        "Missing companion file",
                        format!(
                            "The peptide level report '{}' is needed to read this spectrum level report but it does not exist",
                            peptides.display()
                        ),
                        Context::default().source(spectra.to_string_lossy()).to_owned(),
                    ));
                }
                log::debug!("Reading pLink 2 reports '{}'", spectra.display());
                let titles = read_plink2_titles(&peptides)?;
                drafts.extend(read_plink2_spectra(&spectra, &titles, &table)?);
            }
        }
        if any {
            Ok(drafts)
        } else {
            Err(no_reports(
                path,
                &PLINK2_CLASSES
                    .iter()
                    .map(|c| format!("*_{c}_spectra.csv"))
                    .join(", "),
            ))
        }
    }
}

/// Read all spectrum titles from the nested rows of a peptide level pLink 2 report
pub(crate) fn read_plink2_titles(path: &Path) -> Result<HashSet<String>, XlError> {
    let reader = BufReader::new(open_file(path)?);
    let mut title_column = None;
    let mut titles = HashSet::new();
    for (line_index, line) in reader.lines().enumerate() {
        let line = line.map_err(|e| io_error(path, &e))?;
        let Some(nested) = line.strip_prefix(',') else {
            continue;
        };
        let fields = csv_separate(nested, b',')?
            .into_iter()
            .map(|range| &nested[range])
            .collect_vec();
        match title_column {
            None => {
                title_column = Some(
                    fields
                        .iter()
                        .position(|f| f.eq_ignore_ascii_case("Title"))
                        .ok_or_else(|| {
                            BoxedError::new(
                                BasicKind::Error,
                                "Invalid pLink 2 peptide report",
                                "The spectrum header line does not contain a 'Title' column",
                                Context::full_line(line_index as u32, &line).to_owned(),
                            )
                        })?,
                );
            }
            Some(index) => {
                if let Some(title) = fields.get(index) {
                    titles.insert((*title).to_string());
                }
            }
        }
    }
    Ok(titles)
}

fn read_plink2_spectra(
    path: &Path,
    titles: &HashSet<String>,
    table: &ModificationTable,
) -> Result<Vec<DraftRow>, XlError> {
    let mut drafts = Vec::new();
    let mut skipped = 0;
    for line in parse_csv(path, b',', None, 0)? {
        let line = line?;
        let title = line.index_column(&["Title"])?.0;
        if !titles.contains(title) {
            skipped += 1;
            continue;
        }
        let modifications = plink2_modifications(line.index_column(&["Modifications"])?.0)
            .map_err(|long| line_error(&line, "Invalid pLink 2 line", long))?;
        let row = PLinkRow {
            title,
            charge: line.get(&["Charge"]).and_then(parse_charge),
            sequence: line.index_column(&["Peptide"])?.0,
            xtype: None,
            modifications,
            proteins: line.index_column(&["Proteins"])?.0,
            score: line.parse_optional(&["Score"], "score")?,
            decoy: line
                .get(&["Target_Decoy"])
                .filter(|t| !t.is_empty())
                .map(|t| t.trim() != "2"),
        };
        let mut draft = plink_draft(row, table, plink2_site)
            .map_err(|long| line_error(&line, "Invalid pLink 2 line", long))?;
        draft.line_index = Some(line.line_index());
        drafts.push(draft);
    }
    if skipped > 0 {
        log::debug!(
            "Skipped {skipped} spectra from '{}' that are not in the peptide level report",
            path.display()
        );
    }
    Ok(drafts)
}
