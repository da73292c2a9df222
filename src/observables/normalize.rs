//! Value normalization applied before deduplication

/// De-fanged scheme prefixes, matched case-sensitively
const DEFANGED_PREFIXES: [&str; 2] = ["hxxp", "hXXp"];

/// Re-fang a de-fanged URL (`hxxp://` -> `http://`, `hXXps://` -> `https://`)
///
/// Values without a recognized prefix are returned unchanged.
pub fn fang(url: &str) -> String {
    for prefix in DEFANGED_PREFIXES {
        if let Some(rest) = url.strip_prefix(prefix) {
            return format!("http{}", rest);
        }
    }
    url.to_string()
}
