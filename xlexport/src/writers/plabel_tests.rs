#![allow(clippy::missing_panics_doc)]
use std::path::Path;

use indexmap::IndexSet;
use xlcore::xtable::{Modification, XTable};

use crate::{
    WriterOptions,
    writers::{CrossLinkWriter, PLabel, plabel::peptide_line, test::table},
};

fn spectrum(raw: &str, scan: usize, charge: usize) -> String {
    format!(
        "BEGIN IONS\nTITLE={raw}.{scan}.{scan}.{charge}.0.dta\nCHARGE={charge}+\nPEPMASS=812.4{scan}\n147.11 100\n245.08 50\nEND IONS\n"
    )
}

fn mgf_directory(root: &Path) -> std::path::PathBuf {
    let directory = root.join("mgf");
    std::fs::create_dir_all(&directory).unwrap();
    std::fs::write(
        directory.join("run1.mgf"),
        [
            spectrum("run1", 1000, 2),
            spectrum("run1", 1001, 3),
            spectrum("run1", 1002, 4),
            spectrum("run1", 1003, 4),
        ]
        .concat(),
    )
    .unwrap();
    std::fs::write(
        directory.join("run2.mgf"),
        [spectrum("run2", 2001, 2), spectrum("run2", 2002, 3)].concat(),
    )
    .unwrap();
    directory
}

#[test]
fn plabel_per_rawfile() {
    let directory = tempfile::tempdir().unwrap();
    let options = WriterOptions {
        mgf_dir: Some(mgf_directory(directory.path())),
        ..WriterOptions::default()
    };
    let out = directory.path().join("out").join("sample");
    let mut table = table();
    let mut shared = table.rows[1].clone();
    shared.pepseq1 = "PEPKTIDER".to_string();
    shared.score = Some(1.0);
    table.rows.insert(2, shared);

    let written = match PLabel::write(&table, &out, &options) {
        Ok(written) => written,
        Err(e) => {
            println!("{e}");
            panic!("Failed pLabel test");
        }
    };
    let names = written
        .iter()
        .map(|p| p.file_name().unwrap().to_string_lossy().to_string())
        .collect::<Vec<_>>();
    assert_eq!(
        names,
        vec![
            "sample_run1.pl",
            "sample_run1.mgf",
            "sample_run2.pl",
            "sample_run2.mgf"
        ]
    );

    let label = std::fs::read_to_string(&written[0]).unwrap();
    assert_eq!(
        label,
        format!(
            "[FilePath]\nFile_Path={}\n[Modification]\n1=Acetyl[AnyN-term]\n[xlink]\nxlink=DSS\n[Total]\ntotal=3\n\
            [Spectrum1]\nname=run1.1001.1001.3.0.dta.DTA\npep1=1 5 MTDSKYFTTNK 27.3 1\n\
            [Spectrum2]\nname=run1.1002.1002.4.0.dta.DTA\npep1=3 4 2 PEPKTIDE 5 LKPEPR 1 0,1\npep2=3 4 2 PEPKTIDER 1 LKPEPR 1 0,1\n\
            [Spectrum3]\nname=run1.1003.1003.4.0.dta.DTA\npep1=3 4 2 PEPKTIDE 8 LKPEPR 1 0,1\n",
            written[1].display()
        )
    );

    // Only referenced spectra, each once, with the original titles
    let mgf = std::fs::read_to_string(&written[1]).unwrap();
    assert_eq!(mgf.matches("BEGIN IONS").count(), 3);
    assert!(!mgf.contains("run1.1000.1000"));
    assert!(mgf.contains("TITLE=run1.1002.1002.4.0.dta\nCHARGE=4+\n"));

    let label = std::fs::read_to_string(&written[2]).unwrap();
    assert!(label.contains("[Modification]\n[xlink]"));
    assert!(label.contains("name=run2.2002.2002.3.0.dta.DTA\npep1=3 2 4 AKR 0 GGSKR 1\n"));
    assert!(label.contains("pep1=2 1 5 KPEPKR 2 1\n"));
}

#[test]
fn plabel_merged() {
    let directory = tempfile::tempdir().unwrap();
    let options = WriterOptions {
        mgf_dir: Some(mgf_directory(directory.path())),
        merge_plabel: true,
        xlinker: "BS3".to_string(),
        ..WriterOptions::default()
    };
    let out = directory.path().join("out").join("sample");
    let mut table = table();
    let mut shared = table.rows[1].clone();
    shared.score = Some(1.0);
    table.rows.push(shared);
    let written = PLabel::write(&table, &out, &options).unwrap();
    assert_eq!(
        written,
        vec![
            directory.path().join("out").join("sample.pl"),
            directory.path().join("out").join("sample.mgf")
        ]
    );
    let label = std::fs::read_to_string(&written[0]).unwrap();
    assert!(label.contains("xlink=BS3\n[Total]\ntotal=6\n"));
    assert!(label.contains("[Spectrum4]\nname=sample.4.4.2.0.DTA\npep1=2 1 5 KPEPKR 2 1\n"));

    let mgf = std::fs::read_to_string(&written[1]).unwrap();
    // Every row gets its own copy of the spectrum
    assert_eq!(mgf.matches("BEGIN IONS").count(), 6);
    assert!(mgf.contains("TITLE=sample.1.1.3.0\nCHARGE=3+\n"));
    assert!(mgf.contains("TITLE=sample.5.5.3.0\nCHARGE=3+\n"));
    assert!(mgf.contains("TITLE=sample.6.6.4.0\nCHARGE=4+\n"));
    assert!(label.contains("[Spectrum6]\nname=sample.6.6.4.0.DTA\npep1=3 4 2 PEPKTIDE 1 LKPEPR 1 0,1\n"));
    assert!(!mgf.contains("run2.2001"));
}

#[test]
fn plabel_missing_spectrum() {
    let directory = tempfile::tempdir().unwrap();
    let options = WriterOptions {
        mgf_dir: Some(mgf_directory(directory.path())),
        ..WriterOptions::default()
    };
    let mut table = table();
    table.rows[3].scanno = Some(9999);
    let error = PLabel::write(&table, &directory.path().join("out").join("sample"), &options)
        .unwrap_err()
        .to_string();
    assert!(error.contains("scan 9999"));
    assert!(!directory.path().join("out").exists());

    let error = PLabel::write(
        &XTable::new(Vec::new()),
        &directory.path().join("sample"),
        &WriterOptions::default(),
    )
    .unwrap_err()
    .to_string();
    assert!(error.contains("mgfDir"));
}

#[test]
fn peptide_lines() {
    let mut row = table().rows[1].clone();
    row.mods2 = vec![Modification::new("Oxidation[M]", 3, 15.994_915)];
    let modifications = IndexSet::from(["Acetyl[AnyN-term]", "Oxidation[M]"]);
    assert_eq!(
        peptide_line(&row, &modifications),
        "3 4 2 PEPKTIDE 5 LKPEPR 1 0,1 14,2"
    );
    let mono = &table().rows[0];
    assert_eq!(peptide_line(mono, &modifications), "1 5 MTDSKYFTTNK 27.3 1");
    let mut linear = mono.clone();
    linear.link_type = xlcore::xtable::LinkType::Linear;
    linear.xlink1 = None;
    assert_eq!(peptide_line(&linear, &modifications), "0 MTDSKYFTTNK 27.3 1");
}
