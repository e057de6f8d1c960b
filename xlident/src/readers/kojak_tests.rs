#![allow(clippy::missing_panics_doc)]
use xlcore::xtable::{LinkType, Modification, SPLIT_ENTRY};

use crate::{
    InputFormat, ReaderOptions,
    readers::kojak::{parse_kojak_peptide, parse_kojak_proteins},
    test::test_reader,
};

#[test]
fn kojak() {
    let table = match test_reader(
        InputFormat::Kojak,
        &[("run1.kojak.txt", KOJAK_V2)],
        "run1.kojak.txt",
        &ReaderOptions::default(),
    ) {
        Ok(table) => table,
        Err(e) => {
            println!("{e}");
            panic!("Failed Kojak test");
        }
    };
    assert_eq!(table.len(), 4);

    let mono = &table.rows[0];
    assert_eq!(mono.rawfile.as_deref(), Some("run1"));
    assert_eq!(mono.scanno, Some(1001));
    assert_eq!(mono.prec_ch, Some(3));
    assert_eq!(mono.pepseq1, "MTDSKYFTTNK");
    assert_eq!(mono.xlink1, Some(5));
    assert_eq!(mono.mods1, vec![Modification::new("15.99", 1, 15.99)]);
    assert_eq!(mono.prot1, "GeneA");
    assert_eq!(mono.xpos1, Some(42));
    assert_eq!(mono.pos1, Some(38));
    assert_eq!(mono.link_type, LinkType::Mono);
    assert_eq!(mono.id.as_deref(), Some("GeneA-42"));
    assert_eq!(mono.score, Some(27.3));
    assert!(!mono.decoy);

    let cross = &table.rows[1];
    assert_eq!(cross.link_type, LinkType::Inter);
    assert_eq!(cross.pos1, Some(101));
    assert_eq!(cross.pos2, Some(19));
    assert_eq!(cross.id.as_deref(), Some("GeneA-104-GeneC-20"));
    assert_eq!(cross.extras[SPLIT_ENTRY], "true");
    assert!(!cross.decoy);
    let decoy = &table.rows[2];
    assert_eq!(decoy.prot1, "REVERSE_GeneB");
    assert!(decoy.decoy);

    let looplink = &table.rows[3];
    assert_eq!(looplink.link_type, LinkType::Loop);
    assert_eq!(looplink.xpos1, Some(54));
    assert_eq!(looplink.xpos2, Some(59));
    assert_eq!(looplink.pepseq2.as_deref(), Some("PEPKTIDEKR"));
    assert_eq!(looplink.id.as_deref(), Some("GeneA-54"));
}

#[test]
fn kojak_rawfile_option() {
    let options = ReaderOptions {
        rawfile: Some("sample_07".to_string()),
        ..ReaderOptions::default()
    };
    let table = test_reader(
        InputFormat::Kojak,
        &[("run1.kojak.txt", KOJAK_V2)],
        "run1.kojak.txt",
        &options,
    )
    .unwrap();
    assert!(
        table
            .rows
            .iter()
            .all(|r| r.rawfile.as_deref() == Some("sample_07"))
    );
}

#[test]
fn kojak_missing_file() {
    assert!(
        test_reader(
            InputFormat::Kojak,
            &[],
            "run1.kojak.txt",
            &ReaderOptions::default()
        )
        .is_err()
    );
}

#[test]
fn peptides() {
    assert_eq!(
        parse_kojak_peptide("AC[57.02]DEF[15.99]G").unwrap(),
        (
            "ACDEFG".to_string(),
            vec![
                Modification::new("57.02", 2, 57.02),
                Modification::new("15.99", 5, 15.99)
            ]
        )
    );
    assert_eq!(
        parse_kojak_peptide("n[42.01]PEPTIDEc[-0.98]").unwrap(),
        (
            "PEPTIDE".to_string(),
            vec![
                Modification::new("42.01", 0, 42.01),
                Modification::new("-0.98", 8, -0.98)
            ]
        )
    );
    assert!(parse_kojak_peptide("PEP[15.99").is_err());
    assert!(parse_kojak_peptide("PEP[ox]TIDE").is_err());
    assert!(parse_kojak_peptide("pep").is_err());
}

#[test]
fn proteins() {
    let proteins = parse_kojak_proteins("GeneA(42);sp|P1|B(C)(7);", None, true).unwrap();
    assert_eq!(proteins.len(), 2);
    assert_eq!(proteins[1].name, "sp|P1|B(C)");
    assert_eq!(proteins[1].xpos, Some(7));
    let proteins = parse_kojak_proteins("GeneA;", Some("12"), true).unwrap();
    assert_eq!(proteins[0].xpos, Some(12));
    assert!(parse_kojak_proteins("-", None, true).unwrap().is_empty());
    assert!(parse_kojak_proteins("GeneA(x);", None, true).is_err());
}

const KOJAK_V2: &str = "Kojak version 2.0.0-dev, 2019 Michael Hoopmann, Institute for Systems Biology
Scan Number\tObs Mass\tCharge\tPSM Mass\tPPM Error\tScore\tdScore\tPeptide #1 Score\tPeptide #1\tLink #1\tProtein #1\tPeptide #2 Score\tPeptide #2\tLink #2\tProtein #2\tLinker Mass
1001\t1500.7\t3\t1500.7\t1.2\t27.3\t5.1\t27.3\tM[15.99]TDSKYFTTNK\t5\tGeneA(42);\t0\t-\t-\t-\t156.0786
1002\t2000.1\t4\t2000.1\t0.8\t30.5\t2.0\t20.1\tPEPKTIDE\t4\tGeneA(104);REVERSE_GeneB(14);\t10.4\tLKPEPR\t2\tGeneC(20);\t138.068
1003\t1800.9\t3\t1800.9\t-0.4\t12.0\t1.0\t12.0\tPEPKTIDEKR\t4\tGeneA(54);\t0\t-\t9\t-\t138.068
1004\t900.1\t2\t0\t0\t0\t0\t0\t-\t-1\t-\t0\t-\t-1\t-\t0
";
