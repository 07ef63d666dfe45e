//! Downstream URL construction.

use crate::routing::ResolvedRoute;

/// Build `target_base_url + target_path_prefix + remaining_path (+ ?query)`.
///
/// Exactly one `/` separates each non-empty part. A part consisting only of
/// slashes contributes a single trailing slash.
pub fn build_target_url(resolved: &ResolvedRoute<'_>, query: Option<&str>) -> String {
    let route = resolved.route;
    let mut url = route.target_base_url.trim_end_matches('/').to_string();

    for part in [route.target_path_prefix.as_str(), resolved.remaining_path] {
        if part.is_empty() {
            continue;
        }
        let trimmed = part.trim_start_matches('/');
        if !url.ends_with('/') {
            url.push('/');
        }
        url.push_str(trimmed);
    }

    if let Some(query) = query.filter(|q| !q.is_empty()) {
        url.push('?');
        url.push_str(query);
    }

    url
}
