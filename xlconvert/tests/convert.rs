//! Convert files end to end through the orchestrator

use std::path::Path;

use xlconvert::{Settings, convert};
use xlexport::OutputFormat;
use xlident::{InputFormat, ReaderOptions};

const KOJAK: &str = "Kojak version 2.0.0-dev, 2019 Michael Hoopmann, Institute for Systems Biology
Scan Number\tObs Mass\tCharge\tPSM Mass\tPPM Error\tScore\tdScore\tPeptide #1 Score\tPeptide #1\tLink #1\tProtein #1\tPeptide #2 Score\tPeptide #2\tLink #2\tProtein #2\tLinker Mass
1001\t1500.7\t3\t1500.7\t1.2\t27.3\t5.1\t27.3\tM[15.99]TDSKYFTTNK\t5\tGeneA(42);\t0\t-\t-\t-\t156.0786
1002\t2000.1\t4\t2000.1\t0.8\t30.5\t2.0\t20.1\tPEPKTIDE\t4\tGeneA(104);REVERSE_GeneB(14);\t10.4\tLKPEPR\t2\tGeneC(20);\t138.068
1003\t1800.9\t3\t1800.9\t-0.4\t12.0\t1.0\t12.0\tPEPKTIDEKR\t4\tGeneA(54);\t0\t-\t9\t-\t138.068
1005\t2100.2\t4\t2100.2\t0.3\t8.0\t1.0\t6.0\tPEPKTIDE\t4\tGeneA(104);\t2.0\tLKPEPR\t2\tGeneC(20);\t138.068
";

fn write_input(directory: &Path, name: &str) -> std::path::PathBuf {
    let path = directory.join(name);
    std::fs::write(&path, KOJAK).unwrap();
    path
}

#[test]
fn xtable_round_trip() {
    let directory = tempfile::tempdir().unwrap();
    let input = write_input(directory.path(), "run1.kojak.txt");
    let settings = Settings {
        writer: xlexport::WriterOptions {
            keep: true,
            ..xlexport::WriterOptions::default()
        },
        ..Settings::default()
    };
    let outcomes = convert(
        &[&input],
        InputFormat::Kojak,
        OutputFormat::XTable,
        None,
        &settings,
    );
    assert_eq!(outcomes.len(), 1);
    let written = match &outcomes[0].result {
        Ok(written) => written.clone(),
        Err(e) => {
            println!("{e}");
            panic!("Failed conversion");
        }
    };
    assert_eq!(
        written,
        vec![directory.path().join("run1_Kojak_to_xTable.csv")]
    );

    let original = xlident::read(InputFormat::Kojak, &[&input], &ReaderOptions::default()).unwrap();
    let read_back =
        xlident::read(InputFormat::XTable, written.as_slice(), &ReaderOptions::default()).unwrap();
    assert_eq!(read_back.columns, original.columns);
    assert_eq!(
        read_back.text_rows().collect::<Vec<_>>(),
        original.text_rows().collect::<Vec<_>>()
    );
}

#[test]
fn failures_do_not_stop_other_inputs() {
    let directory = tempfile::tempdir().unwrap();
    let first = write_input(directory.path(), "run1.kojak.txt");
    let missing = directory.path().join("missing.kojak.txt");
    let second = write_input(directory.path(), "run2.kojak.txt");
    let output = directory.path().join("out");
    let outcomes = convert(
        &[&first, &missing, &second],
        InputFormat::Kojak,
        OutputFormat::XiNet,
        Some(&output),
        &Settings::default(),
    );
    assert!(outcomes[0].is_ok());
    assert!(!outcomes[1].is_ok());
    assert!(
        outcomes[1]
            .result
            .as_ref()
            .unwrap_err()
            .to_string()
            .contains("missing.kojak.txt")
    );
    assert!(outcomes[2].is_ok());
    assert!(output.join("run2_Kojak_to_xiNet.csv").exists());
    assert!(!output.join("missing_Kojak_to_xiNet.csv").exists());

    // One row per link, the best of 1002 and 1005 is kept
    let text = std::fs::read_to_string(output.join("run1_Kojak_to_xiNet.csv")).unwrap();
    assert_eq!(text.lines().filter(|l| l.ends_with("GeneA-104-GeneC-20")).count(), 1);
    assert!(text.contains(&format!(",{},GeneA-104-GeneC-20", -(30.5_f64.log10()))));
}

#[test]
fn writer_preconditions_are_reported() {
    let directory = tempfile::tempdir().unwrap();
    let input = write_input(directory.path(), "run1.kojak.txt");
    let outcomes = convert(
        &[&input],
        InputFormat::Kojak,
        OutputFormat::XWalk,
        None,
        &Settings::default(),
    );
    let error = outcomes[0].result.as_ref().unwrap_err().to_string();
    assert!(error.contains("pdb"));
    assert!(!directory.path().join("run1_Kojak_to_xWalk").exists());
}
