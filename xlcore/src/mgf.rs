//! Index MGF peak list files by spectrum title, and read single spectra from them.

use std::{
    collections::HashMap,
    io::{BufRead, BufReader, Seek, SeekFrom, Write},
    path::{Path, PathBuf},
    sync::LazyLock,
};

use context_error::*;
use indexmap::IndexMap;
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::{
    XlError,
    helper_functions::check_extension,
    path::{file_stem, io_error, normalize_long_path, open_file},
};

/// The extension of the index file stored next to an MGF file
pub const INDEX_EXTENSION: &str = "mgfindex";

static PXTRACT_TITLE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)^(.+)\.(\d+)\.(\d+)\.(\d+)\.\d+(?:\.dta)?$").unwrap());
static PXTRACT_SHORT_TITLE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)^(.+)\.(\d+)\.(\d+)\.(\d+)(?:\.dta)?$").unwrap());
static TPP_SCAN: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?i)scan=(\d+)").unwrap());
static TPP_FILE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"(?i)File:\s*"?([^",]+?)"?(?:,|\s|$)"#).unwrap());

/// A single spectrum in an MGF file
#[derive(Clone, Debug, Deserialize, PartialEq, Eq, Serialize)]
pub struct MgfEntry {
    /// The full title
    pub title: String,
    /// The MGF file
    pub path: PathBuf,
    /// The byte offset of the `BEGIN IONS` line
    pub offset: u64,
    /// The raw file this spectrum came from, if it could be determined
    pub rawfile: Option<String>,
    /// The scan number, if it could be determined
    pub scan: Option<usize>,
    /// The precursor charge, from the title or the `CHARGE=` line
    pub charge: Option<usize>,
}

/// Parse a spectrum title in either the pXtract form (`name.scan.scan.charge`, optionally
/// followed by `.N` and/or `.dta`) or the TPP form (`... scan=N ...`). Returns (rawfile, scan,
/// charge). When the pXtract tail is ambiguous, as in a run name ending in digits, the reading
/// with two equal scan numbers wins.
pub fn parse_title(title: &str) -> Option<(Option<String>, usize, Option<usize>)> {
    let trimmed = title.trim();
    let readings = [&PXTRACT_TITLE, &PXTRACT_SHORT_TITLE]
        .into_iter()
        .filter_map(|regex| {
            let captures = regex.captures(trimmed)?;
            Some((
                captures[1].to_string(),
                captures[2].parse::<usize>().ok()?,
                captures[3].parse::<usize>().ok()?,
                captures[4].parse::<usize>().ok(),
            ))
        })
        .collect::<Vec<_>>();
    if let Some((rawfile, scan, _, charge)) = readings
        .iter()
        .find(|(_, first, last, _)| first == last)
        .or_else(|| readings.first())
    {
        return Some((Some(rawfile.clone()), *scan, *charge));
    }
    let scan = TPP_SCAN.captures(title)?[1].parse().ok()?;
    let rawfile = TPP_FILE
        .captures(title)
        .map(|c| file_stem(Path::new(c[1].trim())));
    Some((rawfile, scan, None))
}

fn parse_charge(text: &str) -> Option<usize> {
    text.trim()
        .split(|c: char| c == ' ' || c == ',')
        .next()
        .map(|c| c.trim_end_matches(['+', '-']))
        .and_then(|c| c.parse().ok())
}

/// An index of MGF files, mapping titles to the location of the spectrum
#[derive(Clone, Debug, Default, Deserialize, PartialEq, Eq, Serialize)]
pub struct MgfIndex {
    #[serde(with = "indexmap::map::serde_seq")]
    entries: IndexMap<String, MgfEntry>,
    /// The size in bytes of every indexed file, used to detect stale cached indices
    sizes: Vec<(PathBuf, u64)>,
    #[serde(skip)]
    by_scan: HashMap<(String, usize), Vec<usize>>,
}

impl MgfIndex {
    /// Build the index for a single MGF file with a single forward pass.
    /// # Errors
    /// If the file could not be read.
    pub fn build(path: impl AsRef<Path>) -> Result<Self, XlError> {
        let path = path.as_ref();
        let mut reader = BufReader::new(open_file(path)?);
        let default_rawfile = file_stem(path);
        let mut index = Self::default();
        let mut offset: u64 = 0;
        let mut block_start = None;
        let mut current: Option<String> = None;
        let mut block_charge = None;
        let mut buffer = Vec::new();
        loop {
            buffer.clear();
            let read = reader
                .read_until(b'\n', &mut buffer)
                .map_err(|e| io_error(path, &e))?;
            if read == 0 {
                break;
            }
            let line = String::from_utf8_lossy(&buffer);
            let line = line.trim();
            if line.starts_with("BEGIN IONS") {
                block_start = Some(offset);
                current = None;
                block_charge = None;
            } else if line.starts_with("END IONS") {
                block_start = None;
                current = None;
            } else if let (Some(start), Some(title)) = (block_start, line.strip_prefix("TITLE=")) {
                let title = title.trim().to_string();
                let (rawfile, scan, charge) = parse_title(&title)
                    .map_or((None, None, None), |(r, s, c)| (r, Some(s), c));
                index.entries.insert(
                    title.clone(),
                    MgfEntry {
                        title: title.clone(),
                        path: path.to_path_buf(),
                        offset: start,
                        rawfile: rawfile.or_else(|| Some(default_rawfile.clone())),
                        scan,
                        charge: charge.or(block_charge),
                    },
                );
                current = Some(title);
            } else if let Some(charge) = line.strip_prefix("CHARGE=") {
                block_charge = parse_charge(charge);
                if let Some(entry) = current.as_ref().and_then(|t| index.entries.get_mut(t))
                    && entry.charge.is_none()
                {
                    entry.charge = block_charge;
                }
            }
            offset += read as u64;
        }
        index.sizes.push((path.to_path_buf(), offset));
        if index.entries.is_empty() {
            log::warn!("An index was built for {} but no spectra were found", path.display());
        }
        index.rebuild_lookup();
        Ok(index)
    }

    /// The path of the index file stored next to an MGF file
    pub fn sidecar_path(path: &Path) -> PathBuf {
        path.with_extension(INDEX_EXTENSION)
    }

    /// Load the cached index next to the MGF file if it exists and is up to date, otherwise
    /// build the index and store it next to the MGF file. The index file is written atomically.
    /// # Errors
    /// If the MGF file could not be read. A failure to write the cache is only logged.
    pub fn load_or_build(path: impl AsRef<Path>) -> Result<Self, XlError> {
        let path = path.as_ref();
        let sidecar = Self::sidecar_path(path);
        if let Some(index) = Self::load_cached(path, &sidecar) {
            log::debug!("Loaded cached MGF index {}", sidecar.display());
            return Ok(index);
        }
        log::debug!("Building MGF index for {}", path.display());
        let index = Self::build(path)?;
        if let Err(err) = index.store(&sidecar) {
            log::warn!("Could not store MGF index {}: {err}", sidecar.display());
        }
        Ok(index)
    }

    fn load_cached(path: &Path, sidecar: &Path) -> Option<Self> {
        let size = std::fs::metadata(normalize_long_path(path)).ok()?.len();
        let file = std::fs::File::open(normalize_long_path(sidecar)).ok()?;
        let mut index: Self = serde_json::from_reader(BufReader::new(file)).ok()?;
        if index.sizes.len() != 1 || index.sizes[0] != (path.to_path_buf(), size) {
            return None;
        }
        index.rebuild_lookup();
        Some(index)
    }

    /// Store this index as JSON, writing to a temporary file first and then renaming it.
    /// # Errors
    /// If the file could not be written.
    pub fn store(&self, path: &Path) -> Result<(), XlError> {
        let directory = path
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
            .unwrap_or_else(|| Path::new("."));
        let mut file = tempfile::NamedTempFile::new_in(normalize_long_path(directory))
            .map_err(|e| io_error(path, &e))?;
        serde_json::to_writer(&mut file, self).map_err(|e| {
            BoxedError::new(
                BasicKind::Error,
                "Could not serialise MGF index",
                e.to_string(),
                Context::default().source(path.to_string_lossy()).to_owned(),
            )
        })?;
        file.flush().map_err(|e| io_error(path, &e))?;
        file.persist(normalize_long_path(path))
            .map_err(|e| io_error(path, &e.error))?;
        Ok(())
    }

    /// Index all MGF files in a directory (non recursive), in alphabetical order
    /// # Errors
    /// If the directory or any of the MGF files could not be read.
    pub fn from_directory(directory: impl AsRef<Path>) -> Result<Self, XlError> {
        let directory = directory.as_ref();
        let mut files = std::fs::read_dir(normalize_long_path(directory))
            .map_err(|e| io_error(directory, &e))?
            .filter_map(Result::ok)
            .map(|e| e.path())
            .filter(|p| p.is_file() && check_extension(p, "mgf"))
            .collect::<Vec<_>>();
        files.sort();
        let mut index = Self::default();
        for file in files {
            index.merge(Self::load_or_build(file)?);
        }
        Ok(index)
    }

    /// Add all entries from another index, entries with a title that is already present are
    /// ignored
    pub fn merge(&mut self, other: Self) {
        for (title, entry) in other.entries {
            self.entries.entry(title).or_insert(entry);
        }
        self.sizes.extend(other.sizes);
        self.rebuild_lookup();
    }

    fn rebuild_lookup(&mut self) {
        self.by_scan.clear();
        for (index, entry) in self.entries.values().enumerate() {
            if let (Some(raw), Some(scan)) = (&entry.rawfile, entry.scan) {
                self.by_scan
                    .entry((raw.to_ascii_lowercase(), scan))
                    .or_default()
                    .push(index);
            }
        }
    }

    /// The number of indexed spectra
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// If no spectra are indexed
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Get a spectrum by its exact title
    pub fn get(&self, title: &str) -> Option<&MgfEntry> {
        self.entries.get(title)
    }

    /// Iterate over all entries in file order
    pub fn iter(&self) -> impl Iterator<Item = &MgfEntry> {
        self.entries.values()
    }

    /// Find the spectrum for a raw file and scan number, the raw file is compared case
    /// insensitively. If a charge is given and multiple spectra share the scan number the one
    /// with the matching charge is returned.
    pub fn find(&self, rawfile: &str, scan: usize, charge: Option<usize>) -> Option<&MgfEntry> {
        let candidates = self.by_scan.get(&(rawfile.to_ascii_lowercase(), scan))?;
        let mut entries = candidates
            .iter()
            .filter_map(|i| self.entries.get_index(*i).map(|(_, e)| e));
        match charge {
            Some(charge) => {
                let mut first = None;
                for entry in entries {
                    if entry.charge == Some(charge) {
                        return Some(entry);
                    }
                    if first.is_none() && entry.charge.is_none() {
                        first = Some(entry);
                    }
                }
                first
            }
            None => entries.next(),
        }
    }

    /// Read the spectrum for an entry, by seeking to the offset and reading until `END IONS`
    /// # Errors
    /// If the file could not be read, or the spectrum is not terminated.
    pub fn read_spectrum(entry: &MgfEntry) -> Result<MgfSpectrum, XlError> {
        let mut file = open_file(&entry.path)?;
        file.seek(SeekFrom::Start(entry.offset))
            .map_err(|e| io_error(&entry.path, &e))?;
        let mut lines = Vec::new();
        for line in BufReader::new(file).lines() {
            let line = line.map_err(|e| io_error(&entry.path, &e))?;
            let end = line.trim().starts_with("END IONS");
            lines.push(line.trim_end().to_string());
            if end {
                return Ok(MgfSpectrum { lines });
            }
        }
        Err(BoxedError::new(
            BasicKind::Error,
            "Unterminated spectrum",
            format!(
                "The spectrum '{}' does not end with an 'END IONS' line",
                entry.title
            ),
            Context::default()
                .source(entry.path.to_string_lossy())
                .to_owned(),
        ))
    }
}

/// A single spectrum block from an MGF file, including the `BEGIN IONS` and `END IONS` lines
#[derive(Clone, Debug, Default, Deserialize, PartialEq, Eq, Serialize)]
pub struct MgfSpectrum {
    /// The lines of the block
    pub lines: Vec<String>,
}

impl MgfSpectrum {
    fn header(&self, key: &str) -> Option<&str> {
        self.lines
            .iter()
            .find_map(|l| l.strip_prefix(key).and_then(|l| l.strip_prefix('=')))
    }

    /// The title
    pub fn title(&self) -> Option<&str> {
        self.header("TITLE")
    }

    /// The precursor charge
    pub fn charge(&self) -> Option<usize> {
        self.header("CHARGE").and_then(parse_charge)
    }

    /// The precursor m/z
    pub fn precursor_mz(&self) -> Option<f64> {
        self.header("PEPMASS")
            .and_then(|m| m.split_ascii_whitespace().next())
            .and_then(|m| m.parse().ok())
    }

    /// The peaks as (m/z, intensity), sorted on m/z
    pub fn peaks(&self) -> Vec<(f64, f64)> {
        let mut peaks: Vec<(f64, f64)> = self
            .lines
            .iter()
            .filter(|l| l.starts_with(|c: char| c.is_ascii_digit()))
            .filter_map(|l| {
                let mut parts = l.split_ascii_whitespace();
                let mz = parts.next()?.parse().ok()?;
                let intensity = parts.next().and_then(|i| i.parse().ok()).unwrap_or(0.0);
                Some((mz, intensity))
            })
            .collect();
        peaks.sort_by(|a, b| a.0.total_cmp(&b.0));
        peaks
    }

    /// Write this block with a new title and charge. The `CHARGE=` line is inserted after the
    /// title if the block does not have one.
    /// # Errors
    /// If the writer errors.
    pub fn write_rewritten(
        &self,
        mut w: impl Write,
        title: &str,
        charge: Option<usize>,
    ) -> Result<(), std::io::Error> {
        let has_charge = self.lines.iter().any(|l| l.starts_with("CHARGE="));
        for line in &self.lines {
            if line.starts_with("TITLE=") {
                writeln!(w, "TITLE={title}")?;
                if let (false, Some(charge)) = (has_charge, charge) {
                    writeln!(w, "CHARGE={charge}+")?;
                }
            } else if let (true, Some(charge)) = (line.starts_with("CHARGE="), charge) {
                writeln!(w, "CHARGE={charge}+")?;
            } else {
                writeln!(w, "{line}")?;
            }
        }
        Ok(())
    }

    /// Write this block unchanged
    /// # Errors
    /// If the writer errors.
    pub fn write(&self, mut w: impl Write) -> Result<(), std::io::Error> {
        for line in &self.lines {
            writeln!(w, "{line}")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const MGF: &str = "BEGIN IONS\nTITLE=run1.100.100.2.0.dta\nCHARGE=2+\nPEPMASS=500.25 1000\n200.1 10\n300.2 20\nEND IONS\n\nBEGIN IONS\nTITLE=run1.101.101.3.0.dta\nPEPMASS=400.5\n150.0 5\nEND IONS\nBEGIN IONS\nTITLE=controllerType=0 controllerNumber=1 scan=205 File:\"other.raw\"\nCHARGE=2+\n100.0 1\nEND IONS\n";

    #[test]
    fn titles() {
        assert_eq!(
            parse_title("run1.100.100.2.0.dta"),
            Some((Some("run1".to_string()), 100, Some(2)))
        );
        assert_eq!(
            parse_title("run.name.with.dots.7.7.3"),
            Some((Some("run.name.with.dots".to_string()), 7, Some(3)))
        );
        assert_eq!(
            parse_title("controllerType=0 controllerNumber=1 scan=205 File:\"other.raw\""),
            Some((Some("other".to_string()), 205, None))
        );
        assert_eq!(
            parse_title("run1.5.100.100.2"),
            Some((Some("run1.5".to_string()), 100, Some(2)))
        );
        assert_eq!(
            parse_title("run.100.100.2.0"),
            Some((Some("run".to_string()), 100, Some(2)))
        );
        assert_eq!(
            parse_title("sample.2024.01.6.6.4.0"),
            Some((Some("sample.2024.01".to_string()), 6, Some(4)))
        );
        assert_eq!(
            parse_title("run1.100.100.2.dta"),
            Some((Some("run1".to_string()), 100, Some(2)))
        );
        assert_eq!(parse_title("no scan here"), None);
    }

    #[test]
    fn index_and_read() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("run1.mgf");
        std::fs::write(&path, MGF).unwrap();
        let index = MgfIndex::load_or_build(&path).unwrap();
        assert_eq!(index.len(), 3);
        assert!(MgfIndex::sidecar_path(&path).exists());
        let entry = index.find("RUN1", 100, Some(2)).unwrap();
        assert_eq!(entry.offset, 0);
        let spectrum = MgfIndex::read_spectrum(entry).unwrap();
        assert_eq!(spectrum.title(), Some("run1.100.100.2.0.dta"));
        assert_eq!(spectrum.charge(), Some(2));
        assert_eq!(spectrum.peaks(), vec![(200.1, 10.0), (300.2, 20.0)]);
        assert_eq!(spectrum.precursor_mz(), Some(500.25));
        let second = index.find("run1", 101, None).unwrap();
        let spectrum = MgfIndex::read_spectrum(second).unwrap();
        assert_eq!(spectrum.lines.len(), 5);
        assert_eq!(index.find("other", 205, None).unwrap().charge, Some(2));
        assert!(index.find("run1", 102, None).is_none());

        // The cached index is loaded the second time
        let cached = MgfIndex::load_or_build(&path).unwrap();
        assert_eq!(cached, index);
    }

    #[test]
    fn rewrite() {
        let spectrum = MgfSpectrum {
            lines: vec![
                "BEGIN IONS".to_string(),
                "TITLE=a".to_string(),
                "100.0 1".to_string(),
                "END IONS".to_string(),
            ],
        };
        let mut out = Vec::new();
        spectrum.write_rewritten(&mut out, "b", Some(3)).unwrap();
        assert_eq!(
            String::from_utf8(out).unwrap(),
            "BEGIN IONS\nTITLE=b\nCHARGE=3+\n100.0 1\nEND IONS\n"
        );
    }
}
