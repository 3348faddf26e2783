//! Pull request context from CI environment variables

use vrt_core::PrInfo;

/// Detect PR context using the process environment
pub fn detect_pr_info_from_env() -> Option<PrInfo> {
    detect_pr_info(|key| std::env::var(key).ok())
}

/// Detect PR context from GitHub Actions or GitLab CI variables.
/// Returns `None` outside of a PR/MR pipeline.
pub fn detect_pr_info<F>(env: F) -> Option<PrInfo>
where
    F: Fn(&str) -> Option<String>,
{
    let var = |key: &str| env(key).filter(|v| !v.trim().is_empty());

    // GitHub: GITHUB_REF=refs/pull/<n>/merge
    if let Some(number) = var("GITHUB_REF").as_deref().and_then(github_pr_number) {
        let url = match (var("GITHUB_SERVER_URL"), var("GITHUB_REPOSITORY")) {
            (Some(server), Some(repo)) => Some(format!(
                "{}/{}/pull/{}",
                server.trim_end_matches('/'),
                repo,
                number
            )),
            _ => None,
        };
        return Some(PrInfo {
            number: Some(number),
            url,
            base_branch: var("GITHUB_BASE_REF"),
        });
    }

    // GitLab merge request pipelines
    if let Some(number) = var("CI_MERGE_REQUEST_IID").and_then(|v| v.parse::<u64>().ok()) {
        let url = var("CI_MERGE_REQUEST_PROJECT_URL").map(|project| {
            format!(
                "{}/-/merge_requests/{}",
                project.trim_end_matches('/'),
                number
            )
        });
        return Some(PrInfo {
            number: Some(number),
            url,
            base_branch: var("CI_MERGE_REQUEST_TARGET_BRANCH_NAME"),
        });
    }

    None
}

fn github_pr_number(git_ref: &str) -> Option<u64> {
    git_ref
        .strip_prefix("refs/pull/")?
        .split('/')
        .next()?
        .parse()
        .ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn env(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_github_pull_request() {
        let info = detect_pr_info(env(&[
            ("GITHUB_REF", "refs/pull/42/merge"),
            ("GITHUB_SERVER_URL", "https://github.com/"),
            ("GITHUB_REPOSITORY", "acme/web"),
            ("GITHUB_BASE_REF", "main"),
        ]))
        .unwrap();

        assert_eq!(info.number, Some(42));
        assert_eq!(info.url.as_deref(), Some("https://github.com/acme/web/pull/42"));
        assert_eq!(info.base_branch.as_deref(), Some("main"));
    }

    #[test]
    fn test_github_branch_push_is_not_a_pr() {
        assert_eq!(detect_pr_info(env(&[("GITHUB_REF", "refs/heads/main")])), None);
    }

    #[test]
    fn test_gitlab_merge_request() {
        let info = detect_pr_info(env(&[
            ("CI_MERGE_REQUEST_IID", "7"),
            ("CI_MERGE_REQUEST_PROJECT_URL", "https://gitlab.com/acme/web"),
        ]))
        .unwrap();
        assert_eq!(info.number, Some(7));
        assert_eq!(
            info.url.as_deref(),
            Some("https://gitlab.com/acme/web/-/merge_requests/7")
        );
        assert_eq!(info.base_branch, None);
    }

    #[test]
    fn test_no_ci() {
        assert_eq!(detect_pr_info(env(&[])), None);
    }
}
