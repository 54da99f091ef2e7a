//! Remote path normalization.
//!
//! A normalized path has no leading or trailing slash and no empty or `.`
//! segments. `..` only survives as a leading segment. The empty string is
//! the root.

/// Normalizes a slash-separated path. `..` cancels the segment before it;
/// a `..` with nothing left to cancel is kept, so such a path never
/// resolves.
pub fn normalize(path: &str) -> String {
    let mut parts: Vec<&str> = Vec::new();
    for seg in path.split('/') {
        match seg {
            "" | "." => {}
            ".." => match parts.last() {
                Some(&last) if last != ".." => {
                    parts.pop();
                }
                _ => parts.push(".."),
            },
            s => parts.push(s),
        }
    }
    parts.join("/")
}

/// Joins an already-normalized parent with a child name or relative path.
pub fn join(parent: &str, child: &str) -> String {
    if parent.is_empty() {
        child.to_string()
    } else if child.is_empty() {
        parent.to_string()
    } else {
        format!("{}/{}", parent, child)
    }
}

/// Splits a normalized path into `(parent, name)`. `None` for the root.
pub fn split_parent(path: &str) -> Option<(&str, &str)> {
    if path.is_empty() {
        return None;
    }
    match path.rfind('/') {
        Some(pos) => Some((&path[..pos], &path[pos + 1..])),
        None => Some(("", path)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalize_trims_and_collapses() {
        assert_eq!(normalize(""), "");
        assert_eq!(normalize("/"), "");
        assert_eq!(normalize("."), "");
        assert_eq!(normalize("//one//two/"), "one/two");
        assert_eq!(normalize("/one/./two/target.txt"), "one/two/target.txt");
    }

    #[test]
    fn normalize_applies_parent_segments() {
        assert_eq!(normalize("one/../two"), "two");
        assert_eq!(normalize("one/two/.."), "one");
        assert_eq!(normalize("one/../.."), "..");
    }

    #[test]
    fn normalize_keeps_leading_parent_segments() {
        assert_eq!(normalize("../../one"), "../../one");
        assert_eq!(normalize("/../one/"), "../one");
    }

    #[test]
    fn join_handles_root() {
        assert_eq!(join("", "readme.txt"), "readme.txt");
        assert_eq!(join("one", ""), "one");
        assert_eq!(join("one/two", "target.txt"), "one/two/target.txt");
    }

    #[test]
    fn split_parent_of_nested_and_top_level() {
        assert_eq!(split_parent("one/two/target.txt"), Some(("one/two", "target.txt")));
        assert_eq!(split_parent("readme.txt"), Some(("", "readme.txt")));
        assert_eq!(split_parent(""), None);
    }
}
