#![allow(clippy::missing_panics_doc)]
use xlcore::xtable::{LinkType, Modification};

use crate::{
    InputFormat, ReaderOptions,
    readers::xquest::{XQuestId, parse_xquest_id, parse_xquest_title},
    test::test_reader,
};

#[test]
fn xquest() {
    let table = match test_reader(
        InputFormat::XQuest,
        &[("merged_xquest.xls", XQUEST)],
        "merged_xquest.xls",
        &ReaderOptions::default(),
    ) {
        Ok(table) => table,
        Err(e) => {
            println!("{e}");
            panic!("Failed xQuest test");
        }
    };
    assert_eq!(table.len(), 4);

    let cross = &table.rows[0];
    assert_eq!(cross.rawfile.as_deref(), Some("run_A"));
    assert_eq!(cross.scanno, Some(1520));
    assert_eq!(cross.prec_ch, Some(4));
    assert_eq!(cross.pepseq1, "MEPKTIDE");
    assert_eq!(cross.mods1, vec![Modification::new("Oxidation", 1, 15.994_915)]);
    assert_eq!(cross.pepseq2.as_deref(), Some("LMKEPR"));
    assert_eq!(cross.link_type, LinkType::Inter);
    assert_eq!(cross.pos1, Some(39));
    assert_eq!(cross.xpos2, Some(10));
    assert_eq!(cross.id.as_deref(), Some("GeneA-42-GeneB-10"));
    assert_eq!(cross.score, Some(31.25));
    assert!(!cross.decoy);

    let homomultimer = &table.rows[1];
    assert_eq!(homomultimer.link_type, LinkType::Homomultimeric);
    assert!(homomultimer.decoy);

    let looplink = &table.rows[2];
    assert_eq!(looplink.link_type, LinkType::Loop);
    assert_eq!(looplink.xpos2, Some(14));

    let mono = &table.rows[3];
    assert_eq!(mono.link_type, LinkType::Mono);
    assert_eq!(mono.xlink1, Some(4));
    assert_eq!(mono.pos1, Some(17));
}

#[test]
fn xquest_unrecognised_id() {
    let result = test_reader(
        InputFormat::XQuest,
        &[(
            "merged_xquest.xls",
            &XQUEST.replace("KPEPKR-K1-K5", "KPEPKR_K1_K5"),
        )],
        "merged_xquest.xls",
        &ReaderOptions::default(),
    );
    assert!(result.unwrap_err().contains("KPEPKR_K1_K5"));
}

#[test]
fn ids() {
    assert_eq!(
        parse_xquest_id("PEPKR-LKPEPR-a4-b2"),
        Ok(XQuestId::Cross {
            alpha: "PEPKR".to_string(),
            beta: "LKPEPR".to_string(),
            xlink1: 4,
            xlink2: 2
        })
    );
    assert_eq!(
        parse_xquest_id("PEPKR-K4-155.09"),
        Ok(XQuestId::Mono {
            peptide: "PEPKR".to_string(),
            xlink: 4
        })
    );
    assert_eq!(
        parse_xquest_id("PEPKR-K4-156"),
        Ok(XQuestId::Mono {
            peptide: "PEPKR".to_string(),
            xlink: 4
        })
    );
    assert_eq!(
        parse_xquest_id("KPEPKR-K1-K5"),
        Ok(XQuestId::Loop {
            peptide: "KPEPKR".to_string(),
            xlink1: 1,
            xlink2: 5
        })
    );
    assert!(parse_xquest_id("PEPKR").is_err());
    assert!(parse_xquest_id("pepkr-K4-155.09").is_err());
}

#[test]
fn titles() {
    assert_eq!(
        parse_xquest_title("run_A.1520.1520.run_A.1521.1521.4"),
        Ok(("run_A".to_string(), 1520, 4))
    );
    assert!(parse_xquest_title("run_A.1520.1520.4").is_err());
}

const XQUEST: &str = "Id\tSpectrum\tProtein1\tProtein2\tAbsPos1\tAbsPos2\tld-Score\tMr
XEPKTIDE-LXKEPR-a4-b3\trun_A.1520.1520.run_A.1521.1521.4\tGeneA\tGeneB\t42\t10\t31.25\t2012.02
PEPKTIDE-TIDEKR-a4-b5\trun_A.1600.1600.run_A.1601.1601.3\tdecoy_GeneC\tdecoy_GeneC\t20\t24\t12.5\t1800.9
KPEPKR-K1-K5\trun_A.1700.1700.run_A.1701.1701.2\tGeneA\t-\t10\t-\t20.0\t900.5
PEPKR-K4-155.09\trun_A.1800.1800.run_A.1801.1801.2\tGeneA\t-\t20\t-\t15.0\t800.4
";
