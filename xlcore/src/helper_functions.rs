use std::path::Path;

/// Helper function to check extensions in filenames
pub(crate) fn check_extension(filename: impl AsRef<Path>, extension: impl AsRef<Path>) -> bool {
    filename
        .as_ref()
        .extension()
        .is_some_and(|ext| ext.eq_ignore_ascii_case(extension.as_ref()))
}

/// Get the first whitespace or comma separated token that parses as a float
pub(crate) fn first_float(text: &str) -> Option<f64> {
    text.split(|c: char| c.is_ascii_whitespace() || c == ',')
        .find_map(|t| t.parse::<f64>().ok())
}

#[test]
fn extension() {
    assert!(check_extension("a/b/file.MGF", "mgf"));
    assert!(!check_extension("a/b/file.mgf.gz", "mgf"));
    assert_eq!(first_float("K NORMAL 15.9949 15.9949 O"), Some(15.9949));
}
