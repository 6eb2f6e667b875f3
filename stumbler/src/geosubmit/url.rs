/// Append `path` to `base`, leaving exactly one `/` at the join.
///
/// ```
/// use stumbler::geosubmit::join_url;
///
/// assert_eq!(
///     join_url("https://example.com/api/", "/v2/geosubmit"),
///     "https://example.com/api/v2/geosubmit"
/// );
/// ```
pub fn join_url(base: &str, path: &str) -> String {
    let base = base.trim_end_matches('/');
    let path = path.trim_start_matches('/');
    if path.is_empty() {
        return base.to_string();
    }
    format!("{base}/{path}")
}
