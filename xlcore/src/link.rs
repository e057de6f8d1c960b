//! Classification of cross-links and their canonical identifiers.

use crate::xtable::LinkType;

/// Generate the canonical identifier of a link.
/// * Mono and loop links: `{prot1}-{xpos1}`.
/// * Intra, inter, and homomultimeric links: `{protA}-{xposA}-{protB}-{xposB}` where the pair
///   `(protA, xposA)` sorts before `(protB, xposB)`, so both orientations of the same link get the
///   same identifier.
/// * Linear peptides, or links with missing proteins or positions, have no identifier.
pub fn generate_id(
    link_type: LinkType,
    prot1: &str,
    xpos1: Option<usize>,
    prot2: Option<&str>,
    xpos2: Option<usize>,
) -> Option<String> {
    if prot1.is_empty() {
        return None;
    }
    match link_type {
        LinkType::Mono | LinkType::Loop => xpos1.map(|x| format!("{prot1}-{x}")),
        LinkType::Intra | LinkType::Inter | LinkType::Homomultimeric => {
            let a = (prot1, xpos1?);
            let b = (prot2.filter(|p| !p.is_empty())?, xpos2?);
            let (a, b) = if a <= b { (a, b) } else { (b, a) };
            Some(format!("{}-{}-{}-{}", a.0, a.1, b.0, b.1))
        }
        LinkType::Linear => None,
    }
}

/// Categorise a link between two peptides. Different proteins give [`LinkType::Inter`]. For the
/// same protein, peptide windows `[pos, pos + len - 1]` that overlap can only be explained by two
/// copies of the protein, [`LinkType::Homomultimeric`], otherwise it is [`LinkType::Intra`].
pub fn categorize_inter_peptides(
    prot1: &str,
    pos1: usize,
    pepseq1: &str,
    prot2: &str,
    pos2: usize,
    pepseq2: &str,
) -> LinkType {
    if prot1 != prot2 {
        return LinkType::Inter;
    }
    let end1 = (pos1 + pepseq1.len()).saturating_sub(1);
    let end2 = (pos2 + pepseq2.len()).saturating_sub(1);
    if (pos2 <= end1 && end1 <= end2) || (pos1 <= end2 && end2 <= end1) {
        LinkType::Homomultimeric
    } else {
        LinkType::Intra
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn id_symmetry() {
        let a = generate_id(LinkType::Inter, "X", Some(30), Some("A"), Some(10));
        let b = generate_id(LinkType::Inter, "A", Some(10), Some("X"), Some(30));
        assert_eq!(a, b);
        assert_eq!(a.as_deref(), Some("A-10-X-30"));
    }

    #[test]
    fn id_same_protein() {
        assert_eq!(
            generate_id(LinkType::Intra, "P", Some(50), Some("P"), Some(7)).as_deref(),
            Some("P-7-P-50")
        );
        assert_eq!(
            generate_id(LinkType::Loop, "P", Some(50), Some("P"), Some(57)).as_deref(),
            Some("P-50")
        );
        assert_eq!(
            generate_id(LinkType::Mono, "GeneA", Some(42), None, None).as_deref(),
            Some("GeneA-42")
        );
    }

    #[test]
    fn id_missing_fields() {
        assert_eq!(generate_id(LinkType::Inter, "A", Some(10), None, Some(3)), None);
        assert_eq!(generate_id(LinkType::Mono, "A", None, None, None), None);
        assert_eq!(generate_id(LinkType::Mono, "", Some(3), None, None), None);
        assert_eq!(generate_id(LinkType::Linear, "A", Some(3), None, None), None);
    }

    #[test]
    fn homomultimeric() {
        assert_eq!(
            categorize_inter_peptides("P", 5, "PEPTIDE", "P", 7, "PTIDEKK"),
            LinkType::Homomultimeric
        );
        assert_eq!(
            categorize_inter_peptides("P", 7, "PTIDEKK", "P", 5, "PEPTIDE"),
            LinkType::Homomultimeric
        );
        // Containment
        assert_eq!(
            categorize_inter_peptides("P", 5, "PEPTIDEKK", "P", 7, "PTI"),
            LinkType::Homomultimeric
        );
    }

    #[test]
    fn intra_and_inter() {
        assert_eq!(
            categorize_inter_peptides("P", 5, "PEPTIDE", "P", 12, "KLMN"),
            LinkType::Intra
        );
        assert_eq!(
            categorize_inter_peptides("P", 5, "PEPTIDE", "Q", 5, "PEPTIDE"),
            LinkType::Inter
        );
    }
}
