//! Path string utilities.
//!
//! Catalogue locations and host paths are compared as strings with `/`
//! separators, so Windows-style paths coming from either side are
//! normalised first.

/// Normalise separators to `/` and drop a trailing separator.
pub fn normalize(path: &str) -> String {
    let mut normalized = path.replace('\\', "/");
    while normalized.len() > 1 && normalized.ends_with('/') {
        normalized.pop();
    }
    normalized
}

/// Normalise and make sure the path starts with a separator.
pub fn rooted(path: &str) -> String {
    let normalized = normalize(path);
    if normalized.starts_with('/') {
        normalized
    } else {
        format!("/{}", normalized)
    }
}

/// Parent directory of a path, rooted. Returns `/` for top-level entries.
pub fn parent_dir(path: &str) -> String {
    let rooted = rooted(path);
    match rooted.rfind('/') {
        Some(0) | None => "/".to_string(),
        Some(idx) => rooted[..idx].to_string(),
    }
}

/// File name component of a path.
pub fn file_name(path: &str) -> &str {
    let trimmed = path.trim_end_matches(['/', '\\']);
    match trimmed.rfind(['/', '\\']) {
        Some(idx) => &trimmed[idx + 1..],
        None => trimmed,
    }
}

/// Whether `path` ends with `suffix` on a component boundary.
pub fn ends_with_path(path: &str, suffix: &str) -> bool {
    let path = rooted(path);
    let suffix = rooted(suffix);
    if suffix == "/" {
        return true;
    }
    path.ends_with(&suffix)
}

/// Whether `path` is equal to or below `root`.
pub fn is_under(path: &str, root: &str) -> bool {
    let path = normalize(path);
    let root = normalize(root);
    if root == "/" {
        return path.starts_with('/');
    }
    path == root || path.starts_with(&format!("{}/", root))
}

/// Remove `root` from the front of `path`, returning a rooted remainder.
pub fn strip_root(path: &str, root: &str) -> Option<String> {
    if !is_under(path, root) {
        return None;
    }
    let path = normalize(path);
    let root = normalize(root);
    let rest = if root == "/" { &path[..] } else { &path[root.len()..] };
    Some(rooted(rest))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize() {
        assert_eq!(normalize("C:\\Anime\\Show\\"), "C:/Anime/Show");
        assert_eq!(normalize("/"), "/");
        assert_eq!(rooted("Show/ep1.mkv"), "/Show/ep1.mkv");
    }

    #[test]
    fn test_parent_dir() {
        assert_eq!(parent_dir("Show/Season 1/ep1.mkv"), "/Show/Season 1");
        assert_eq!(parent_dir("/ep1.mkv"), "/");
        assert_eq!(parent_dir("ep1.mkv"), "/");
    }

    #[test]
    fn test_file_name() {
        assert_eq!(file_name("/a/b/c.mkv"), "c.mkv");
        assert_eq!(file_name("c.mkv"), "c.mkv");
        assert_eq!(file_name("a\\b\\c.mkv"), "c.mkv");
    }

    #[test]
    fn test_ends_with_path_respects_components() {
        assert!(ends_with_path("Anime/Show/ep1.mkv", "/Show/ep1.mkv"));
        assert!(!ends_with_path("Anime/MyShow/ep1.mkv", "/Show/ep1.mkv"));
    }

    #[test]
    fn test_strip_root() {
        assert_eq!(
            strip_root("/mnt/anime/Show/ep1.mkv", "/mnt/anime"),
            Some("/Show/ep1.mkv".to_string())
        );
        assert_eq!(strip_root("/mnt/animex/ep1.mkv", "/mnt/anime"), None);
        assert_eq!(strip_root("/mnt/ep1.mkv", "/"), Some("/mnt/ep1.mkv".to_string()));
    }
}
