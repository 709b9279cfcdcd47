/// Extract a search query from a documentation URL that failed to resolve.
///
/// Takes the last path segment, ignoring any query string, fragment, trailing
/// slash and `.html` suffix: `https://site/find/nat.succ_le_iff.html` yields
/// `nat.succ_le_iff`.
pub fn query_from_url(url: &str) -> Option<String> {
    let without_scheme = url.split_once("://").map_or(url, |(_, rest)| rest);
    let path = without_scheme
        .split(['?', '#'])
        .next()
        .unwrap_or_default()
        .trim_end_matches('/');

    // "host" alone has no path segment
    let (_, segment) = path.rsplit_once('/')?;
    let segment = segment.strip_suffix(".html").unwrap_or(segment);

    (!segment.is_empty()).then(|| segment.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_last_segment_is_extracted() {
        assert_eq!(
            query_from_url("https://docs.example.org/find/nat.succ_le_iff").as_deref(),
            Some("nat.succ_le_iff")
        );
        assert_eq!(
            query_from_url("https://docs.example.org/data/list/basic.html").as_deref(),
            Some("basic")
        );
        assert_eq!(
            query_from_url("https://docs.example.org/find/list.map/").as_deref(),
            Some("list.map")
        );
    }

    #[test]
    fn test_query_string_and_fragment_are_ignored() {
        assert_eq!(
            query_from_url("https://docs.example.org/find/list.map?x=1#top").as_deref(),
            Some("list.map")
        );
    }

    #[test]
    fn test_relative_paths() {
        assert_eq!(query_from_url("/find/Nat.add").as_deref(), Some("Nat.add"));
    }

    #[test]
    fn test_no_segment() {
        assert_eq!(query_from_url("https://docs.example.org"), None);
        assert_eq!(query_from_url("https://docs.example.org/"), None);
        assert_eq!(query_from_url(""), None);
    }
}
