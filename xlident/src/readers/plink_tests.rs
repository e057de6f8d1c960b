#![allow(clippy::missing_panics_doc)]
use xlcore::xtable::{LinkType, Modification};

use crate::{
    InputFormat, ReaderOptions,
    readers::plink::{
        ModificationSite, ReportLine, classify_report_line, plink_separate, plink1_modifications,
        plink1_site, plink2_modifications, plink2_site,
    },
    test::test_reader,
};

#[test]
fn plink1() {
    let table = match test_reader(
        InputFormat::PLink1,
        &[
            ("results/sample_inter_combine.protein.xls", PLINK1_INTER),
            ("results/sample_mono_combine.protein.xls", PLINK1_MONO),
            ("results/sample.log", "not a report"),
        ],
        "results",
        &ReaderOptions::default(),
    ) {
        Ok(table) => table,
        Err(e) => {
            println!("{e}");
            panic!("Failed pLink 1 test");
        }
    };
    assert_eq!(table.len(), 3);

    let cross = &table.rows[0];
    assert_eq!(cross.rawfile.as_deref(), Some("run1"));
    assert_eq!(cross.scanno, Some(1234));
    assert_eq!(cross.prec_ch, Some(3));
    assert_eq!(cross.pepseq1, "MEPKTIDE");
    assert_eq!(cross.pepseq2.as_deref(), Some("LMKEPR"));
    assert_eq!(cross.xtype.as_deref(), Some("1"));
    assert_eq!(cross.mods1, vec![Modification::new("Oxidation[M]", 1, 15.994_915)]);
    assert_eq!(cross.mods2, vec![Modification::new("Oxidation[M]", 2, 15.994_915)]);
    assert_eq!(cross.link_type, LinkType::Inter);
    assert_eq!(cross.pos1, Some(39));
    assert_eq!(cross.pos2, Some(8));
    assert_eq!(cross.id.as_deref(), Some("GeneA-42-GeneB-10"));
    assert_eq!(cross.score, Some(1.2e-5));
    assert!(!cross.decoy);

    let decoy = &table.rows[1];
    assert_eq!(decoy.prot2.as_deref(), Some("REVERSE_GeneC"));
    assert!(decoy.decoy);

    let mono = &table.rows[2];
    assert_eq!(mono.link_type, LinkType::Mono);
    assert_eq!(mono.xpos1, Some(20));
    assert_eq!(mono.pos1, Some(17));
    assert_eq!(mono.xtype, None);
}

#[test]
fn plink1_without_reports() {
    let result = test_reader(
        InputFormat::PLink1,
        &[("results/sample.log", "not a report")],
        "results",
        &ReaderOptions::default(),
    );
    assert!(result.unwrap_err().contains("No pLink reports"));
}

#[test]
fn plink2() {
    let table = match test_reader(
        InputFormat::PLink2,
        &[
            ("out/reports/sample_cross-linked_spectra.csv", PLINK2_CROSS_SPECTRA),
            ("out/reports/sample_cross-linked_peptides.csv", PLINK2_CROSS_PEPTIDES),
            ("out/reports/sample_loop-linked_spectra.csv", PLINK2_LOOP_SPECTRA),
            ("out/reports/sample_loop-linked_peptides.csv", PLINK2_LOOP_PEPTIDES),
        ],
        "out",
        &ReaderOptions::default(),
    ) {
        Ok(table) => table,
        Err(e) => {
            println!("{e}");
            panic!("Failed pLink 2 test");
        }
    };
    // The second cross-linked spectrum is not present in the peptide report
    assert_eq!(table.len(), 2);

    let cross = &table.rows[0];
    assert_eq!(cross.rawfile.as_deref(), Some("run2"));
    assert_eq!(cross.scanno, Some(2001));
    assert_eq!(cross.prec_ch, Some(4));
    assert_eq!(cross.mods1, vec![Modification::new("Oxidation[M]", 1, 15.994_915)]);
    // Position 13 is behind the alpha C-terminus (9) and the linker (10)
    assert_eq!(cross.mods2, vec![Modification::new("Oxidation[M]", 2, 15.994_915)]);
    assert_eq!(cross.link_type, LinkType::Inter);
    assert_eq!(cross.id.as_deref(), Some("GeneA-42-GeneB-10"));
    assert_eq!(cross.score, Some(1.5e-3));
    assert!(!cross.decoy);

    let looplink = &table.rows[1];
    assert_eq!(looplink.link_type, LinkType::Loop);
    assert_eq!(looplink.pepseq2.as_deref(), Some("KPEPKR"));
    assert_eq!(looplink.xpos1, Some(10));
    assert_eq!(looplink.xpos2, Some(14));
    assert_eq!(looplink.id.as_deref(), Some("GeneA-10"));
    assert!(looplink.decoy);
}

#[test]
fn plink2_missing_peptides() {
    let result = test_reader(
        InputFormat::PLink2,
        &[("out/sample_cross-linked_spectra.csv", PLINK2_CROSS_SPECTRA)],
        "out",
        &ReaderOptions::default(),
    );
    assert!(
        result
            .unwrap_err()
            .contains("sample_cross-linked_peptides.csv")
    );
}

#[test]
fn plink2_unknown_modification() {
    let result = test_reader(
        InputFormat::PLink2,
        &[
            (
                "out/sample_cross-linked_spectra.csv",
                &PLINK2_CROSS_SPECTRA.replace("Oxidation[M](1)", "Unknown[M](1)"),
            ),
            ("out/sample_cross-linked_peptides.csv", PLINK2_CROSS_PEPTIDES),
        ],
        "out",
        &ReaderOptions::default(),
    );
    assert!(result.unwrap_err().contains("Unknown[M]"));
}

#[test]
fn modification_sites() {
    // (position, pLink 1 site, pLink 2 site) for a cross-link of ABCDE (5) with FGHIJK (6)
    let table = [
        (0, Ok(ModificationSite::Alpha(0)), Ok(ModificationSite::Alpha(0))),
        (1, Ok(ModificationSite::Alpha(1)), Ok(ModificationSite::Alpha(1))),
        (5, Ok(ModificationSite::Alpha(5)), Ok(ModificationSite::Alpha(5))),
        (6, Ok(ModificationSite::Beta(1)), Ok(ModificationSite::Alpha(6))),
        (7, Ok(ModificationSite::Beta(2)), Ok(ModificationSite::Linker)),
        (8, Ok(ModificationSite::Beta(3)), Ok(ModificationSite::Beta(0))),
        (9, Ok(ModificationSite::Beta(4)), Ok(ModificationSite::Beta(1))),
        (11, Ok(ModificationSite::Beta(6)), Ok(ModificationSite::Beta(3))),
        (15, Err(()), Ok(ModificationSite::Beta(7))),
        (16, Err(()), Err(())),
    ];
    for (position, v1, v2) in table {
        assert_eq!(
            plink1_site(position, 5, Some(6)).map_err(|_| ()),
            v1,
            "pLink 1 position {position}"
        );
        assert_eq!(
            plink2_site(position, 5, Some(6)).map_err(|_| ()),
            v2,
            "pLink 2 position {position}"
        );
    }
    // A single peptide only has its own termini
    assert_eq!(plink1_site(6, 5, None), Ok(ModificationSite::Alpha(6)));
    assert_eq!(plink2_site(6, 5, None), Ok(ModificationSite::Alpha(6)));
    assert!(plink1_site(7, 5, None).is_err());
    assert!(plink2_site(7, 5, None).is_err());
}

#[test]
fn separate() {
    assert_eq!(
        plink_separate("MEPKTIDE(4)-LMKEPR(3)"),
        Ok(("MEPKTIDE", Some(4), Some("LMKEPR"), Some(3)))
    );
    assert_eq!(
        plink_separate("KPEPKR(1)(5)"),
        Ok(("KPEPKR", Some(1), None, Some(5)))
    );
    assert_eq!(plink_separate("PEPKR(4)"), Ok(("PEPKR", Some(4), None, None)));
    assert_eq!(plink_separate("PEPKR"), Ok(("PEPKR", None, None, None)));
    assert_eq!(
        plink_separate("sp|P1|GENEA(42)-sp|P2|GENEB(10)"),
        Ok(("sp|P1|GENEA", Some(42), Some("sp|P2|GENEB"), Some(10)))
    );
    assert!(plink_separate("PEP(4)-PEPR(x)").is_err());
    assert!(plink_separate("PEP4)-PEPR(2)").is_err());
}

#[test]
fn modifications() {
    assert_eq!(
        plink1_modifications("1,Oxidation[M];10,Carbamidomethyl[C];"),
        Ok(vec![
            (1, "Oxidation[M]".to_string()),
            (10, "Carbamidomethyl[C]".to_string())
        ])
    );
    assert_eq!(plink1_modifications("null"), Ok(Vec::new()));
    assert!(plink1_modifications("Oxidation[M]").is_err());
    assert_eq!(
        plink2_modifications("Oxidation[M](1);Carbamidomethyl[C](13)"),
        Ok(vec![
            (1, "Oxidation[M]".to_string()),
            (13, "Carbamidomethyl[C]".to_string())
        ])
    );
    assert_eq!(plink2_modifications(""), Ok(Vec::new()));
    assert!(plink2_modifications("Oxidation[M]").is_err());
}

#[test]
fn report_lines() {
    assert_eq!(
        classify_report_line("Order\tProtein"),
        Some(ReportLine::ProteinHeader)
    );
    assert_eq!(
        classify_report_line("1\tGeneA(42)-GeneB(10)"),
        Some(ReportLine::Protein)
    );
    assert_eq!(
        classify_report_line("\tOrder\tSpectrum"),
        Some(ReportLine::PeptideHeader)
    );
    assert_eq!(
        classify_report_line("\t1\trun1.1234.1234.3.0.dta"),
        Some(ReportLine::Peptide)
    );
    assert_eq!(classify_report_line("Summary"), None);
}

const PLINK1_INTER: &str = "Order\tProtein\tCount
1\tGeneA(42)-GeneB(10)\t1
\tOrder\tSpectrum\tScore\tCalc_M\tDelta_M\tppm\tSequence\tModification\tSample\tEngine\tMatchedIons\tMissCleaveNum\tRank\tProteins
\t1\trun1.1234.1234.3.0.dta\t1.2e-05\t2012.0215\t0.0011\t0.55\tMEPKTIDE(4)-LMKEPR(3):1\t1,Oxidation[M];10,Oxidation[M];\tsample\tpLink\t21\t0\t1\tGeneA(42)-GeneB(10)/GeneA(42)-REVERSE_GeneC(10)/
";

const PLINK1_MONO: &str = "Order\tProtein\tCount
1\tGeneA(20)\t1
\tOrder\tSpectrum\tScore\tCalc_M\tDelta_M\tppm\tSequence\tModification\tSample\tEngine\tMatchedIons\tMissCleaveNum\tRank\tProteins
\t1\trun1.1301.1301.2.0.dta\t3.4e-03\t800.4\t0.0002\t0.25\tPEPKR(4)\tnull\tsample\tpLink\t9\t0\t1\tGeneA(20)/
";

const PLINK2_CROSS_SPECTRA: &str = "Order,Title,Charge,Precursor_Mass,Peptide,Peptide_Type,Linker,Peptide_Mass,Modifications,Evalue,Score,Proteins,Protein_Type,Target_Decoy
1,run2.2001.2001.4.0.dta,4,2012.02,MEPKTIDE(4)-LMKEPR(3),3,DSS,2012.02,Oxidation[M](1);Oxidation[M](13),1e-3,1.5e-3,GeneA(42)-GeneB(10)/,2,2
2,run2.2050.2050.3.0.dta,3,1500.71,PEPKR(4)-LMKEPR(3),3,DSS,1500.71,null,1e-2,2.5e-2,GeneA(20)-GeneB(10)/,2,2
";

const PLINK2_CROSS_PEPTIDES: &str = "Peptide_Order,Peptide,Peptide_Mass,Modifications,Proteins,Protein_Type
1,MEPKTIDE(4)-LMKEPR(3),2012.02,Oxidation[M](1);Oxidation[M](13),GeneA(42)-GeneB(10)/,2
,Order,Spectrum_Order,Title,Charge,Precursor_Mass,Evalue,Score
,1,1,run2.2001.2001.4.0.dta,4,2012.02,1e-3,1.5e-3
";

const PLINK2_LOOP_SPECTRA: &str = "Order,Title,Charge,Precursor_Mass,Peptide,Peptide_Type,Linker,Peptide_Mass,Modifications,Evalue,Score,Proteins,Protein_Type,Target_Decoy
1,run2.2101.2101.2.0.dta,2,900.5,KPEPKR(1)(5),2,DSS,900.5,null,1e-2,3.5e-3,GeneA(10)(14)/,1,0
";

const PLINK2_LOOP_PEPTIDES: &str = "Peptide_Order,Peptide,Peptide_Mass,Modifications,Proteins,Protein_Type
1,KPEPKR(1)(5),900.5,null,GeneA(10)(14)/,1
,Order,Spectrum_Order,Title,Charge,Precursor_Mass,Evalue,Score
,1,1,run2.2101.2101.2.0.dta,2,900.5,1e-2,3.5e-3
";
