use context_error::*;
use serde::{Deserialize, Serialize};
use xlcore::{
    XlError,
    mgf::{MgfEntry, MgfIndex},
    reference::AminoAcidTable,
    xtable::XTableRow,
};

use crate::{
    fragment::TheoreticalIon,
    matching::{Coverage, PeakMatch, match_peaks},
    parameters::{FragmentationParameters, MatchingParameters},
    peptide::LinkedPeptide,
};

/// A spectrum annotated with the theoretical ions of the peptide(s) identified in it
#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
pub struct Annotation {
    /// The title of the annotated spectrum
    pub title: String,
    /// The theoretical ions, sorted on m/z
    pub ions: Vec<TheoreticalIon>,
    /// The peaks of the spectrum, sorted on m/z
    pub peaks: Vec<(f64, f64)>,
    /// All matches between peaks and theoretical ions
    pub matches: Vec<PeakMatch>,
    /// The summary of the matches
    pub coverage: Coverage,
}

impl Annotation {
    /// The matched ion for a match
    pub fn ion(&self, peak_match: &PeakMatch) -> Option<&TheoreticalIon> {
        self.ions.get(peak_match.ion)
    }
}

/// Find the spectrum for an xTable row based on its raw file, scan number, and charge
/// # Errors
/// If the row misses its raw file or scan number, or if there is no such spectrum.
pub fn find_spectrum<'a>(row: &XTableRow, index: &'a MgfIndex) -> Result<&'a MgfEntry, XlError> {
    let (Some(rawfile), Some(scan)) = (row.rawfile.as_deref(), row.scanno) else {
        return Err(BoxedError::new(
            BasicKind::Error,
            "Missing spectrum reference",
            format!(
                "The row for '{}' needs a raw file and scan number to find its spectrum",
                row.pepseq1
            ),
            Context::none(),
        ));
    };
    index.find(rawfile, scan, row.prec_ch).ok_or_else(|| {
        BoxedError::new(
            BasicKind::Error,
            "Missing spectrum",
            format!("There is no spectrum for raw file '{rawfile}' scan {scan}"),
            Context::none(),
        )
    })
}

/// Annotate the spectrum of an xTable row. The spectrum is found in the index based on the
/// raw file and scan number, only this spectrum is read from the MGF file.
/// # Errors
/// If the spectrum cannot be found or read, or if the peptides cannot be fragmented.
pub fn annotate_row(
    row: &XTableRow,
    index: &MgfIndex,
    fragmentation: &FragmentationParameters,
    matching: &MatchingParameters,
    amino_acids: &AminoAcidTable,
) -> Result<Annotation, XlError> {
    let entry = find_spectrum(row, index)?;
    let peptide = LinkedPeptide::from_row(row)?;
    let spectrum = MgfIndex::read_spectrum(entry)?;
    let ions = peptide.theoretical_ions(fragmentation, amino_acids)?;
    let peaks = spectrum.peaks();
    let matches = match_peaks(&ions, &peaks, matching);
    let coverage = Coverage::new(ions.len(), &peaks, &matches);
    log::debug!("Annotated '{}': {coverage}", entry.title);
    Ok(Annotation {
        title: entry.title.clone(),
        ions,
        peaks,
        matches,
        coverage,
    })
}
