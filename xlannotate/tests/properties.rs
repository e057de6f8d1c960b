//! Property based tests for the fragment matching

use proptest::prelude::*;
use xlannotate::prelude::*;
use xlcore::prelude::*;

fn peptide() -> impl Strategy<Value = String> {
    "[ACDEFGHIKLMNPQRSTVWY]{2,20}"
}

proptest! {
    #[test]
    fn ppm_error_is_the_negated_shift(
        alpha in peptide(),
        beta in peptide(),
        alpha_fraction in 0.0_f64..1.0,
        beta_fraction in 0.0_f64..1.0,
        shift in -9.0_f64..9.0,
    ) {
        let alpha_link = 1 + (alpha_fraction * (alpha.len() - 1) as f64) as usize;
        let beta_link = 1 + (beta_fraction * (beta.len() - 1) as f64) as usize;
        let peptide = LinkedPeptide {
            alpha: Peptide::new(alpha, Vec::new()),
            linkage: Linkage::Cross { alpha_link, beta: Peptide::new(beta, Vec::new()), beta_link },
        };
        let ions = peptide
            .theoretical_ions(&FragmentationParameters::default(), &AminoAcidTable::default())
            .unwrap();
        prop_assert!(!ions.is_empty());

        let exact = ions.iter().map(|i| (i.mz, 1.0)).collect::<Vec<_>>();
        let matches = match_peaks(&ions, &exact, &MatchingParameters::ppm(10.0));
        for m in &matches {
            if ions[m.ion].mz == m.mz {
                prop_assert!(m.error_ppm.abs() < 1e-9);
            }
        }
        prop_assert!(matches.len() >= ions.len());

        let shifted = ions
            .iter()
            .map(|i| (i.mz * (1.0 + shift / 1e6), 1.0))
            .collect::<Vec<_>>();
        let matches = match_peaks(&ions, &shifted, &MatchingParameters::ppm(10.0));
        for (index, ion) in ions.iter().enumerate() {
            let own = matches
                .iter()
                .find(|m| m.ion == index && m.mz == ion.mz * (1.0 + shift / 1e6));
            prop_assert!(own.is_some());
            prop_assert!((own.unwrap().error_ppm + shift).abs() < 1e-6);
        }
    }
}
