/// Characters that may not appear in a branch path segment
const RESERVED: [char; 10] = ['/', '\\', '.', ':', '*', '?', '"', '<', '>', '|'];

/// Map a branch name onto a single filesystem-safe path segment.
///
/// Reserved characters and whitespace become `-`. The mapping is
/// idempotent. An empty branch maps to `unknown`.
pub fn sanitize_branch(branch: &str) -> String {
    if branch.is_empty() {
        return vrt_core::UNKNOWN.to_string();
    }
    branch
        .chars()
        .map(|c| {
            if RESERVED.contains(&c) || c.is_whitespace() {
                '-'
            } else {
                c
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_examples() {
        assert_eq!(sanitize_branch("feature/x"), "feature-x");
        assert_eq!(sanitize_branch("release/1.2"), "release-1-2");
        assert_eq!(sanitize_branch("fix: a b"), "fix--a-b");
        assert_eq!(sanitize_branch(r#"a\b*c?d"e<f>g|h"#), "a-b-c-d-e-f-g-h");
        assert_eq!(sanitize_branch("main"), "main");
        assert_eq!(sanitize_branch(""), "unknown");
    }

    #[test]
    fn test_dot_segments_are_neutralised() {
        assert_eq!(sanitize_branch(".."), "--");
        assert_eq!(sanitize_branch("../../etc"), "------etc");
    }

    proptest! {
        #[test]
        fn prop_idempotent(branch in ".*") {
            let once = sanitize_branch(&branch);
            prop_assert_eq!(sanitize_branch(&once), once);
        }

        #[test]
        fn prop_no_separators_or_reserved(branch in ".*") {
            let out = sanitize_branch(&branch);
            prop_assert!(!out.is_empty());
            prop_assert!(!out.contains(std::path::MAIN_SEPARATOR));
            prop_assert!(!out.chars().any(|c| RESERVED.contains(&c) || c.is_whitespace()));
        }
    }
}
