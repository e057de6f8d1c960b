//! pLabel files with their paired MGF files. A pLabel file lists the modifications, the
//! cross-linker, and for every spectrum the peptides identified in it. The MGF file next to
//! it contains only the spectra referenced from the pLabel file.

use std::{
    io::Write,
    path::{Path, PathBuf},
};

use indexmap::{IndexMap, IndexSet};
use itertools::Itertools;
use xlcore::{
    XlError,
    mgf::{MgfEntry, MgfIndex},
    path::file_stem,
    xtable::{LinkType, Modification, XTable, XTableRow},
};

use crate::{
    WriterOptions,
    writers::{CrossLinkWriter, precondition, with_suffix, write_file},
};

/// pLabel with its MGF files, per raw file or merged into a single pair of files
#[derive(Clone, Copy, Debug)]
pub(crate) struct PLabel;

/// The peptide type numbers as used by pLabel
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum PLabelPeptideType {
    Linear = 0,
    Mono = 1,
    Loop = 2,
    Cross = 3,
}

impl From<LinkType> for PLabelPeptideType {
    fn from(value: LinkType) -> Self {
        match value {
            LinkType::Linear => Self::Linear,
            LinkType::Mono => Self::Mono,
            LinkType::Loop => Self::Loop,
            LinkType::Intra | LinkType::Inter | LinkType::Homomultimeric => Self::Cross,
        }
    }
}

/// A spectrum with all rows identified in it, in table order
struct SpectrumGroup<'a> {
    entry: &'a MgfEntry,
    rows: Vec<&'a XTableRow>,
}

/// Find the spectrum of every row. Rows sharing a spectrum are grouped, unless `merged` is set
/// in which case every row gets its own copy of the spectrum. When merging the charge is only
/// used to choose between spectra with the same scan number. Fails on the first row without a
/// spectrum.
fn join_spectra<'a>(
    table: &'a XTable,
    index: &'a MgfIndex,
    mgf_dir: &Path,
    merged: bool,
) -> Result<Vec<SpectrumGroup<'a>>, XlError> {
    let mut groups: Vec<SpectrumGroup<'a>> = Vec::new();
    let mut by_title: IndexMap<&str, usize> = IndexMap::new();
    for row in &table.rows {
        let entry = row
            .rawfile
            .as_deref()
            .zip(row.scanno)
            .and_then(|(raw, scan)| {
                index
                    .find(raw, scan, row.prec_ch)
                    .or_else(|| merged.then(|| index.find(raw, scan, None)).flatten())
            })
            .ok_or_else(|| {
                precondition(
                    PLabel::TAG,
                    format!(
                        "No spectrum in '{}' for raw file '{}' scan {} charge {}",
                        mgf_dir.display(),
                        row.rawfile.as_deref().unwrap_or_default(),
                        row.scanno.map(|s| s.to_string()).unwrap_or_default(),
                        row.prec_ch.map(|s| s.to_string()).unwrap_or_default(),
                    ),
                )
            })?;
        if !merged && let Some(group) = by_title.get(entry.title.as_str()) {
            groups[*group].rows.push(row);
        } else {
            by_title.insert(entry.title.as_str(), groups.len());
            groups.push(SpectrumGroup {
                entry,
                rows: vec![row],
            });
        }
    }
    Ok(groups)
}

/// The modification numbers in the order of first use
fn modification_numbers<'a>(
    groups: impl IntoIterator<Item = &'a SpectrumGroup<'a>>,
) -> IndexSet<&'a str> {
    groups
        .into_iter()
        .flat_map(|g| g.rows.iter())
        .flat_map(|r| r.mods1.iter().chain(r.mods2.iter()))
        .map(|m| m.name.as_str())
        .collect()
}

/// The peptide description of a single row: type, link positions, sequence, score, beta
/// sequence, a literal `1`, and the modifications as `position,number`. Modifications on the
/// beta peptide are numbered over the combined sequence, after the alpha C-terminus and the
/// linker.
pub(crate) fn peptide_line(row: &XTableRow, modifications: &IndexSet<&str>) -> String {
    let kind = PLabelPeptideType::from(row.link_type);
    let score = row.score.unwrap_or_default();
    let optional = |v: Option<usize>| v.map_or_else(|| "0".to_string(), |v| v.to_string());
    let number = |m: &Modification| modifications.get_index_of(m.name.as_str()).unwrap_or(0) + 1;
    let beta_offset = row.pepseq1.len() + 3;
    let mods = row
        .mods1
        .iter()
        .map(|m| format!("{},{}", m.position, number(m)))
        .chain(
            row.mods2
                .iter()
                .filter(|_| kind == PLabelPeptideType::Cross)
                .map(|m| format!("{},{}", m.position + beta_offset, number(m))),
        );
    let main = match kind {
        PLabelPeptideType::Linear => format!("{} {score}", row.pepseq1),
        PLabelPeptideType::Mono => format!("{} {} {score}", optional(row.xlink1), row.pepseq1),
        PLabelPeptideType::Loop => format!(
            "{} {} {} {score}",
            optional(row.xlink1),
            optional(row.xlink2),
            row.pepseq1,
        ),
        PLabelPeptideType::Cross => format!(
            "{} {} {} {score} {}",
            optional(row.xlink1),
            optional(row.xlink2),
            row.pepseq1,
            row.pepseq2.as_deref().unwrap_or_default(),
        ),
    };
    std::iter::once(format!("{} {main} 1", kind as u8))
        .chain(mods)
        .join(" ")
}

/// Write one pLabel file and its MGF file for the given spectra. With `rename` the spectra get
/// new titles based on the stem of the MGF file (`{stem}.{n}.{n}.{charge}.0`), otherwise
/// they keep their titles. The pLabel file names every spectrum as `{title}.DTA`.
fn write_pair(
    groups: &[&SpectrumGroup],
    label: &Path,
    mgf: &Path,
    xlinker: &str,
    rename: bool,
) -> Result<(), XlError> {
    let modifications = modification_numbers(groups.iter().copied());
    let stem = file_stem(mgf);
    let mut spectra = Vec::with_capacity(groups.len());
    for (index, group) in groups.iter().enumerate() {
        let spectrum = MgfIndex::read_spectrum(group.entry)?;
        let charge = group.rows[0]
            .prec_ch
            .or(group.entry.charge)
            .or_else(|| spectrum.charge());
        let title = if rename {
            format!(
                "{stem}.{n}.{n}.{}.0",
                charge.unwrap_or_default(),
                n = index + 1
            )
        } else {
            group.entry.title.clone()
        };
        spectra.push((title, charge, spectrum));
    }

    write_file(mgf, |w| {
        for (title, charge, spectrum) in &spectra {
            if rename {
                spectrum.write_rewritten(&mut *w, title, *charge)?;
            } else {
                spectrum.write(&mut *w)?;
            }
            writeln!(w)?;
        }
        Ok(())
    })?;
    write_file(label, |w| {
        writeln!(w, "[FilePath]")?;
        writeln!(w, "File_Path={}", mgf.display())?;
        writeln!(w, "[Modification]")?;
        for (index, name) in modifications.iter().enumerate() {
            writeln!(w, "{}={name}", index + 1)?;
        }
        writeln!(w, "[xlink]")?;
        writeln!(w, "xlink={xlinker}")?;
        writeln!(w, "[Total]")?;
        writeln!(w, "total={}", groups.len())?;
        for (index, (group, (title, _, _))) in groups.iter().zip(&spectra).enumerate() {
            writeln!(w, "[Spectrum{}]", index + 1)?;
            writeln!(w, "name={title}.DTA")?;
            for (peptide, row) in group.rows.iter().enumerate() {
                writeln!(w, "pep{}={}", peptide + 1, peptide_line(row, &modifications))?;
            }
        }
        Ok(())
    })
}

impl CrossLinkWriter for PLabel {
    const TAG: &'static str = "pLabel";

    fn write(
        table: &XTable,
        out: &Path,
        options: &WriterOptions,
    ) -> Result<Vec<PathBuf>, XlError> {
        let mgf_dir = options.mgf_dir.as_deref().ok_or_else(|| {
            precondition(
                Self::TAG,
                "pLabel needs the 'mgfDir' option with the MGF files of the raw files",
            )
        })?;
        let index = MgfIndex::from_directory(mgf_dir)?;
        if index.is_empty() {
            log::warn!("No spectra found in the MGF files in {}", mgf_dir.display());
        }
        let groups = join_spectra(table, &index, mgf_dir, options.merge_plabel)?;
        log::debug!(
            "pLabel joined {} rows to {} spectra",
            table.len(),
            groups.len()
        );

        if options.merge_plabel {
            let label = with_suffix(out, ".pl");
            let mgf = with_suffix(out, ".mgf");
            write_pair(
                &groups.iter().collect_vec(),
                &label,
                &mgf,
                &options.xlinker,
                true,
            )?;
            Ok(vec![label, mgf])
        } else {
            let mut per_raw: IndexMap<&str, Vec<&SpectrumGroup>> = IndexMap::new();
            for group in &groups {
                per_raw
                    .entry(group.rows[0].rawfile.as_deref().unwrap_or_default())
                    .or_default()
                    .push(group);
            }
            let mut written = Vec::with_capacity(per_raw.len() * 2);
            for (raw, groups) in per_raw {
                let label = with_suffix(out, &format!("_{raw}.pl"));
                let mgf = with_suffix(out, &format!("_{raw}.mgf"));
                write_pair(&groups, &label, &mgf, &options.xlinker, false)?;
                written.push(label);
                written.push(mgf);
            }
            Ok(written)
        }
    }
}
