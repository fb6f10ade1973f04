const EXPORT_SUFFIX: &str = "_research.txt";

/// `Acme Corp.` -> `acme_corp__research.txt`: every non-alphanumeric ASCII
/// character becomes `_`, then the name is lowercased.
pub fn export_filename(company: &str) -> String {
    let stem: String = company
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() { c.to_ascii_lowercase() } else { '_' })
        .collect();
    let stem = if stem.is_empty() { "company".to_string() } else { stem };
    format!("{stem}{EXPORT_SUFFIX}")
}
