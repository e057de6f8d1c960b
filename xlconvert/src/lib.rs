#![doc = include_str!("../README.md")]

use std::path::{Path, PathBuf};

use context_error::*;
use serde::{Deserialize, Serialize};
use xlcore::{XlError, path::read_to_string};
use xlexport::{OutputFormat, WriterOptions};
use xlident::{InputFormat, ReaderOptions};

/// All options for a conversion, stored as a single flat JSON object
#[derive(Clone, Debug, Default, Deserialize, PartialEq, Eq, Serialize)]
#[serde(default)]
pub struct Settings {
    /// The options for the reader
    #[serde(flatten)]
    pub reader: ReaderOptions,
    /// The options for the writer
    #[serde(flatten)]
    pub writer: WriterOptions,
}

impl Settings {
    /// Load settings from a JSON file, missing options get their default value
    /// # Errors
    /// If the file could not be read or is not valid JSON.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, XlError> {
        let path = path.as_ref();
        Self::parse(&read_to_string(path)?).map_err(|err| {
            BoxedError::new(
                BasicKind::Error,
                "Invalid settings",
                err,
                Context::default().source(path.to_string_lossy()).to_owned(),
            )
        })
    }

    /// Parse settings from JSON text
    /// # Errors
    /// If the text is not a valid settings object.
    pub fn parse(text: &str) -> Result<Self, String> {
        serde_json::from_str(text).map_err(|e| e.to_string())
    }
}

/// The result of converting a single input
#[derive(Debug)]
pub struct Outcome {
    /// The input
    pub input: PathBuf,
    /// The base path of the output, without extension
    pub output: PathBuf,
    /// All files written, or the reason the conversion failed
    pub result: Result<Vec<PathBuf>, XlError>,
}

impl Outcome {
    /// If the conversion succeeded
    pub const fn is_ok(&self) -> bool {
        self.result.is_ok()
    }
}

/// The base output path for an input: `{directory}/{stem}_{reader}_to_{writer}`, where the
/// directory defaults to the directory of the input
pub fn output_path(
    input: &Path,
    output_dir: Option<&Path>,
    reader: InputFormat,
    writer: OutputFormat,
) -> PathBuf {
    let stem = if reader.is_directory() {
        input
            .file_name()
            .map_or_else(|| "results".to_string(), |n| n.to_string_lossy().to_string())
    } else {
        xlcore::path::file_stem(input)
    };
    let stem = stem.strip_suffix(".kojak").unwrap_or(&stem);
    let directory = output_dir
        .map(Path::to_path_buf)
        .or_else(|| input.parent().map(Path::to_path_buf))
        .unwrap_or_default();
    directory.join(format!("{stem}_{reader}_to_{writer}"))
}

/// Convert every input on its own. A failing input is reported in its outcome and does not
/// stop the conversion of the other inputs.
pub fn convert(
    inputs: &[impl AsRef<Path>],
    reader: InputFormat,
    writer: OutputFormat,
    output_dir: Option<&Path>,
    settings: &Settings,
) -> Vec<Outcome> {
    inputs
        .iter()
        .map(|input| {
            let input = input.as_ref();
            let output = output_path(input, output_dir, reader, writer);
            let result = reader
                .read(&[input], &settings.reader)
                .and_then(|table| writer.write(&table, &output, &settings.writer));
            match &result {
                Ok(files) => log::info!(
                    "Converted '{}' into {} file(s)",
                    input.display(),
                    files.len()
                ),
                Err(_) => log::warn!("Could not convert '{}'", input.display()),
            }
            Outcome {
                input: input.to_path_buf(),
                output,
                result,
            }
        })
        .collect()
}

// Only used by the binary
use clap as _;
use env_logger as _;
#[cfg(test)]
use tempfile as _;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn settings() {
        let settings = Settings::parse(
            r#"{"decoy_string": "REV_", "mgfDir": "mgf", "mergepLabel": true, "keep": true, "chains": {"ProtA": "AB"}, "offset": -3}"#,
        )
        .unwrap();
        assert_eq!(settings.reader.decoy_string, "REV_");
        assert_eq!(settings.reader.validated_string, ".validated");
        assert_eq!(settings.writer.mgf_dir, Some(PathBuf::from("mgf")));
        assert!(settings.writer.merge_plabel);
        assert!(settings.writer.keep);
        assert_eq!(settings.writer.offset, -3);
        assert_eq!(settings.writer.chains["ProtA"], "AB");
        assert_eq!(settings.writer.atom, "CA");
        assert_eq!(Settings::parse("{}").unwrap(), Settings::default());
        assert!(Settings::parse("{\"offset\": \"a\"}").is_err());
    }

    #[test]
    fn output_paths() {
        assert_eq!(
            output_path(
                Path::new("data/run1.kojak.txt"),
                None,
                InputFormat::Kojak,
                OutputFormat::XiNet
            ),
            Path::new("data/run1_Kojak_to_xiNet")
        );
        assert_eq!(
            output_path(
                Path::new("data/run.1.csv.gz"),
                Some(Path::new("out")),
                InputFormat::XTable,
                OutputFormat::XVis
            ),
            Path::new("out/run.1_xTable_to_xVis")
        );
        assert_eq!(
            output_path(
                Path::new("data/search.v2"),
                None,
                InputFormat::PLink2,
                OutputFormat::PLabel
            ),
            Path::new("data/search.v2_pLink2_to_pLabel")
        );
    }
}
