//! Convert cross-link search results from the command line

use std::{path::PathBuf, process::ExitCode};

use clap::Parser;
use xlconvert::{Settings, convert};
use xlcore::XlError;
use xlexport::OutputFormat;
use xlident::InputFormat;

use context_error as _;
use log as _;
use serde as _;
use serde_json as _;

/// The command line interface arguments
#[derive(Debug, Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// The inputs, files or (for pLink) result directories
    inputs: Vec<PathBuf>,
    /// The reader tag, see `--list`
    #[arg(short, long, value_parser = reader)]
    reader: Option<InputFormat>,
    /// The writer tag, see `--list`
    #[arg(short, long, value_parser = writer)]
    writer: Option<OutputFormat>,
    /// The directory to write to, defaults to the directory of every input
    #[arg(short, long)]
    output_dir: Option<PathBuf>,
    /// A JSON file with the reader and writer options
    #[arg(short, long)]
    settings: Option<PathBuf>,
    /// List the supported readers and writers
    #[arg(long)]
    list: bool,
    /// The raw file to use when the search engine does not report it
    #[arg(long)]
    rawfile: Option<String>,
    /// The text in a protein name that marks it as a decoy
    #[arg(long)]
    decoy_string: Option<String>,
    /// The column order of the table, separated by commas
    #[arg(long, value_delimiter = ',')]
    col_order: Option<Vec<String>>,
    /// Only keep the columns from the column order
    #[arg(long)]
    compact: bool,
    /// The StavroX `properties.ssf` file
    #[arg(long)]
    ssf_file: Option<PathBuf>,
    /// The Xi configuration file
    #[arg(long)]
    xi_config: Option<PathBuf>,
    /// The pLink `modification.ini` file
    #[arg(long)]
    modification_ini: Option<PathBuf>,
    /// Keep the extra columns when writing an xTable
    #[arg(long)]
    keep: bool,
    /// The PDB file for xWalk
    #[arg(long)]
    pdb: Option<String>,
    /// The offset between protein positions and PDB residue numbers
    #[arg(long, allow_hyphen_values = true)]
    offset: Option<i64>,
    /// The chains of a protein in the PDB file, as `protein:chains`, can be given multiple times
    #[arg(long, value_parser = chains)]
    chains: Vec<(String, String)>,
    /// The atom for xWalk distances
    #[arg(long)]
    atom: Option<String>,
    /// The directory with the MGF files for pLabel
    #[arg(long)]
    mgf_dir: Option<PathBuf>,
    /// The cross-linker name for pLabel
    #[arg(long)]
    xlinker: Option<String>,
    /// Write a single pLabel file for all raw files
    #[arg(long)]
    merge_plabel: bool,
    /// The template for a custom table
    #[arg(long)]
    custom_template: Option<PathBuf>,
}

/// # Errors
/// If the tag is not a known reader.
fn reader(value: &str) -> Result<InputFormat, String> {
    value.parse().map_err(|e: XlError| e.to_string())
}

/// # Errors
/// If the tag is not a known writer.
fn writer(value: &str) -> Result<OutputFormat, String> {
    value.parse().map_err(|e: XlError| e.to_string())
}

/// # Errors
/// If the value is not `protein:chains`.
fn chains(value: &str) -> Result<(String, String), String> {
    value
        .rsplit_once(':')
        .filter(|(protein, chains)| !protein.is_empty() && !chains.is_empty())
        .map(|(protein, chains)| (protein.to_string(), chains.to_string()))
        .ok_or_else(|| format!("'{value}' is not of the form 'protein:chains'"))
}

impl Cli {
    /// Apply the command line flags on top of the settings
    fn apply(self, settings: &mut Settings) {
        let reader = &mut settings.reader;
        reader.rawfile = self.rawfile.or(reader.rawfile.take());
        if let Some(decoy_string) = self.decoy_string {
            reader.decoy_string = decoy_string;
        }
        reader.col_order = self.col_order.or(reader.col_order.take());
        reader.compact |= self.compact;
        reader.ssf_file = self.ssf_file.or(reader.ssf_file.take());
        reader.xi_config = self.xi_config.or(reader.xi_config.take());
        reader.modification_ini = self.modification_ini.or(reader.modification_ini.take());

        let writer = &mut settings.writer;
        writer.keep |= self.keep;
        writer.pdb = self.pdb.or(writer.pdb.take());
        if let Some(offset) = self.offset {
            writer.offset = offset;
        }
        writer.chains.extend(self.chains);
        if let Some(atom) = self.atom {
            writer.atom = atom;
        }
        writer.mgf_dir = self.mgf_dir.or(writer.mgf_dir.take());
        if let Some(xlinker) = self.xlinker {
            writer.xlinker = xlinker;
        }
        writer.merge_plabel |= self.merge_plabel;
        writer.custom_template_path = self.custom_template.or(writer.custom_template_path.take());
    }
}

fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let args = Cli::parse();

    if args.list {
        println!("Readers:");
        for format in InputFormat::ALL {
            println!("  {format}");
        }
        println!("Writers:");
        for format in OutputFormat::ALL {
            println!("  {format}");
        }
        return ExitCode::SUCCESS;
    }

    let (Some(reader), Some(writer)) = (args.reader, args.writer) else {
        eprintln!("Both --reader and --writer are needed, see --list for the options");
        return ExitCode::FAILURE;
    };
    if args.inputs.is_empty() {
        eprintln!("No inputs given");
        return ExitCode::FAILURE;
    }
    let mut settings = match args.settings.as_deref().map(Settings::load).transpose() {
        Ok(settings) => settings.unwrap_or_default(),
        Err(err) => {
            eprintln!("{err}");
            return ExitCode::FAILURE;
        }
    };
    let inputs = args.inputs.clone();
    let output_dir = args.output_dir.clone();
    args.apply(&mut settings);

    let outcomes = convert(&inputs, reader, writer, output_dir.as_deref(), &settings);
    let mut failed = false;
    for outcome in outcomes {
        match outcome.result {
            Ok(files) => {
                for file in files {
                    println!("ok {}", file.display());
                }
            }
            Err(err) => {
                failed = true;
                println!("error {}", outcome.input.display());
                eprintln!("{err}");
            }
        }
    }
    if failed {
        ExitCode::FAILURE
    } else {
        ExitCode::SUCCESS
    }
}
