use std::fmt::Display;

use serde::{Deserialize, Serialize};

use crate::{fragment::TheoreticalIon, parameters::MatchingParameters};

/// A peak that was matched to a theoretical ion
#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
pub struct PeakMatch {
    /// The measured m/z
    pub mz: f64,
    /// The measured intensity
    pub intensity: f64,
    /// The index of the matched ion in the theoretical ions
    pub ion: usize,
    /// The error in ppm, `(theoretical - measured) / theoretical · 1e6`
    pub error_ppm: f64,
}

/// The error of a measured m/z relative to the theoretical m/z in ppm
pub fn ppm_error(theoretical: f64, measured: f64) -> f64 {
    (theoretical - measured) / theoretical * 1e6
}

/// Match the peaks to the theoretical ions. Both have to be sorted on m/z. For every peak the
/// theoretical ions are scanned forward from the first ion that could still match, so the whole
/// matching is a single pass over both lists. A peak can match multiple ions and an ion can be
/// matched by multiple peaks.
pub fn match_peaks(
    theoretical: &[TheoreticalIon],
    peaks: &[(f64, f64)],
    parameters: &MatchingParameters,
) -> Vec<PeakMatch> {
    let mut matches = Vec::new();
    let mut start = 0;
    for &(mz, intensity) in peaks {
        let low = mz * (1.0 + parameters.ppm_low / 1e6);
        while start < theoretical.len() && theoretical[start].mz < low {
            start += 1;
        }
        for (offset, ion) in theoretical[start..].iter().enumerate() {
            if !parameters.contains(mz, ion.mz) {
                break;
            }
            matches.push(PeakMatch {
                mz,
                intensity,
                ion: start + offset,
                error_ppm: ppm_error(ion.mz, mz),
            });
        }
    }
    matches
}

/// How much of the theoretical fragments and the spectrum is explained
#[derive(Clone, Copy, Debug, Default, Deserialize, PartialEq, Eq, Serialize)]
pub struct Coverage {
    /// The number of theoretical ions
    pub theoretical: usize,
    /// The number of theoretical ions matched by at least one peak
    pub matched_ions: usize,
    /// The number of peaks
    pub peaks: usize,
    /// The number of peaks matching at least one theoretical ion
    pub matched_peaks: usize,
}

impl Coverage {
    /// Summarise the matches
    pub fn new(theoretical: usize, peaks: &[(f64, f64)], matches: &[PeakMatch]) -> Self {
        let mut ions = matches.iter().map(|m| m.ion).collect::<Vec<_>>();
        ions.sort_unstable();
        ions.dedup();
        let mut matched_peaks = matches.iter().map(|m| m.mz.to_bits()).collect::<Vec<_>>();
        matched_peaks.sort_unstable();
        matched_peaks.dedup();
        Self {
            theoretical,
            matched_ions: ions.len(),
            peaks: peaks.len(),
            matched_peaks: matched_peaks.len(),
        }
    }

    /// The fraction of theoretical ions that was matched
    pub fn ion_fraction(&self) -> f64 {
        if self.theoretical == 0 {
            0.0
        } else {
            self.matched_ions as f64 / self.theoretical as f64
        }
    }
}

impl Display for Coverage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}/{} theoretical ions matched by {}/{} peaks",
            self.matched_ions, self.theoretical, self.matched_peaks, self.peaks
        )
    }
}

#[cfg(test)]
#[allow(clippy::missing_panics_doc)]
mod tests {
    use super::*;
    use crate::fragment::{IonSeries, Side};

    fn ion(mz: f64) -> TheoreticalIon {
        TheoreticalIon {
            mz,
            sequence: String::new(),
            series: IonSeries::Precursor,
            length: 0,
            charge: 1,
            side: Side::Alpha,
            modifications: Vec::new(),
        }
    }

    #[test]
    fn forward_scan() {
        let theoretical = [ion(100.0), ion(200.0), ion(200.001), ion(500.0)];
        let peaks = [(99.0, 1.0), (200.0005, 5.0), (500.004, 2.0), (600.0, 1.0)];
        let matches = match_peaks(&theoretical, &peaks, &MatchingParameters::ppm(10.0));
        assert_eq!(
            matches.iter().map(|m| (m.mz, m.ion)).collect::<Vec<_>>(),
            vec![(200.0005, 1), (200.0005, 2), (500.004, 3)]
        );
        assert!((matches[0].error_ppm - ppm_error(200.0, 200.0005)).abs() < 1e-12);
        assert!(matches[0].error_ppm < 0.0);
        assert!(matches[1].error_ppm > 0.0);

        let coverage = Coverage::new(theoretical.len(), &peaks, &matches);
        assert_eq!(
            coverage,
            Coverage {
                theoretical: 4,
                matched_ions: 3,
                peaks: 4,
                matched_peaks: 2,
            }
        );
        assert!((coverage.ion_fraction() - 0.75).abs() < 1e-12);
        assert_eq!(
            coverage.to_string(),
            "3/4 theoretical ions matched by 2/4 peaks"
        );
    }

    #[test]
    fn asymmetric_window() {
        let theoretical = [ion(1000.0)];
        let parameters = MatchingParameters {
            ppm_low: -5.0,
            ppm_high: 20.0,
        };
        // The theoretical m/z is 10 ppm above this peak
        assert_eq!(match_peaks(&theoretical, &[(999.99, 1.0)], &parameters).len(), 1);
        // The theoretical m/z is 10 ppm below this peak
        assert!(match_peaks(&theoretical, &[(1000.01, 1.0)], &parameters).is_empty());
    }
}
