use crate::types::{RepoStatus, Repository, RunConclusion, RunStatus, Webhook, WebhookStatus, WorkflowRun};

// ---------------------------------------------------------------------------
// Structured list query
// ---------------------------------------------------------------------------

/// Stable sort keys for list views. Sorting is applied to a borrowed view and
/// never mutates stored order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortKey {
    /// Keep store insertion order.
    #[default]
    Insertion,
    Name,
    Updated,
}

/// Parsed structured query for list views.
#[derive(Debug, Default, Clone)]
pub struct ListQuery {
    /// Free-text substring to match against name/url/branch/sha.
    pub text: String,
    /// Filter by status name (e.g. "pending", "failed").
    pub status: Option<String>,
    /// Filter by branch (workflow runs only).
    pub branch: Option<String>,
    pub sort: SortKey,
}

impl ListQuery {
    pub fn is_empty(&self) -> bool {
        self.text.is_empty() && self.status.is_none() && self.branch.is_none()
    }
}

/// Parse a query string, extracting structured prefixes.
///
/// Supported prefixes:
/// - `status:pending` / `status:failed` / …
/// - `branch:main`
/// - `sort:name` / `sort:updated`
///
/// Remaining text is used for free-text matching.
pub fn parse_query(query: &str) -> ListQuery {
    let mut result = ListQuery::default();
    let mut text_parts = Vec::new();

    for token in query.split_whitespace() {
        if let Some(val) = token.strip_prefix("status:") {
            result.status = Some(val.to_lowercase());
        } else if let Some(val) = token.strip_prefix("branch:") {
            result.branch = Some(val.to_owned());
        } else if let Some(val) = token.strip_prefix("sort:") {
            result.sort = match val.to_lowercase().as_str() {
                "name" => SortKey::Name,
                "updated" => SortKey::Updated,
                _ => SortKey::Insertion,
            };
        } else {
            text_parts.push(token);
        }
    }

    result.text = text_parts.join(" ");
    result
}

// ---------------------------------------------------------------------------
// Entity matchers
// ---------------------------------------------------------------------------

fn text_matches(text: &str, haystacks: &[&str]) -> bool {
    if text.is_empty() {
        return true;
    }
    let lower = text.to_lowercase();
    haystacks
        .iter()
        .any(|hay| hay.to_lowercase().contains(&lower))
}

pub fn repo_matches(repo: &Repository, query: &ListQuery) -> bool {
    if let Some(ref status) = query.status
        && repo_status_name(repo.status) != status.as_str()
    {
        return false;
    }
    text_matches(&query.text, &[&repo.name, &repo.url])
}

pub fn webhook_matches(webhook: &Webhook, query: &ListQuery) -> bool {
    if let Some(ref status) = query.status
        && webhook_status_name(webhook.status) != status.as_str()
    {
        return false;
    }
    text_matches(&query.text, &[&webhook.delivery_url])
}

pub fn run_matches(run: &WorkflowRun, query: &ListQuery) -> bool {
    if let Some(ref branch) = query.branch
        && run.head_branch.as_deref() != Some(branch.as_str())
    {
        return false;
    }
    if let Some(ref status) = query.status {
        let matches_status = run_status_name(run.status) == status.as_str();
        let matches_conclusion = run
            .conclusion
            .is_some_and(|c| conclusion_name(c) == status.as_str());
        if !matches_status && !matches_conclusion {
            return false;
        }
    }
    text_matches(
        &query.text,
        &[
            &run.name,
            run.head_branch.as_deref().unwrap_or(""),
            &run.head_sha,
        ],
    )
}

// ---------------------------------------------------------------------------
// Status display names
// ---------------------------------------------------------------------------

pub fn repo_status_name(status: RepoStatus) -> &'static str {
    match status {
        RepoStatus::Pending => "pending",
        RepoStatus::Success => "success",
        RepoStatus::Failed => "failed",
        RepoStatus::Unknown => "unknown",
    }
}

pub fn webhook_status_name(status: WebhookStatus) -> &'static str {
    match status {
        WebhookStatus::Unconfigured => "unconfigured",
        WebhookStatus::Pending => "pending",
        WebhookStatus::Configured => "configured",
        WebhookStatus::Failed => "failed",
        WebhookStatus::Unknown => "unknown",
    }
}

pub fn run_status_name(status: RunStatus) -> &'static str {
    match status {
        RunStatus::Queued => "queued",
        RunStatus::InProgress => "in_progress",
        RunStatus::Completed => "completed",
        RunStatus::Unknown => "unknown",
    }
}

pub fn conclusion_name(conclusion: RunConclusion) -> &'static str {
    match conclusion {
        RunConclusion::Success => "success",
        RunConclusion::Failure => "failure",
        RunConclusion::Neutral => "neutral",
        RunConclusion::Cancelled => "cancelled",
        RunConclusion::Skipped => "skipped",
        RunConclusion::Stale => "stale",
        RunConclusion::ActionRequired => "action_required",
        RunConclusion::TimedOut => "timed_out",
        RunConclusion::StartupFailure => "startup_failure",
        RunConclusion::Unknown => "unknown",
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn make_repo(name: &str, status: RepoStatus) -> Repository {
        Repository {
            id: 1,
            url: format!("https://github.com/acme/{name}"),
            name: format!("acme/{name}"),
            status,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    fn make_run(name: &str, branch: &str, conclusion: Option<RunConclusion>) -> WorkflowRun {
        WorkflowRun {
            id: 1,
            name: name.to_owned(),
            status: RunStatus::Completed,
            conclusion,
            head_branch: Some(branch.to_owned()),
            head_sha: "deadbeef".to_owned(),
            run_number: 1,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn parse_empty_query() {
        let q = parse_query("");
        assert!(q.is_empty());
        assert_eq!(q.sort, SortKey::Insertion);
    }

    #[test]
    fn parse_plain_text() {
        let q = parse_query("fix widget");
        assert_eq!(q.text, "fix widget");
        assert!(q.status.is_none());
    }

    #[test]
    fn parse_status_prefix() {
        let q = parse_query("status:Failed");
        assert_eq!(q.status.as_deref(), Some("failed"));
        assert!(q.text.is_empty());
    }

    #[test]
    fn parse_combined_query() {
        let q = parse_query("branch:main status:failure sort:updated deploy");
        assert_eq!(q.branch.as_deref(), Some("main"));
        assert_eq!(q.status.as_deref(), Some("failure"));
        assert_eq!(q.sort, SortKey::Updated);
        assert_eq!(q.text, "deploy");
    }

    #[test]
    fn repo_matches_text_case_insensitive() {
        let repo = make_repo("Widgets", RepoStatus::Success);
        assert!(repo_matches(&repo, &parse_query("widgets")));
        assert!(!repo_matches(&repo, &parse_query("gadgets")));
    }

    #[test]
    fn repo_matches_status_filter() {
        let repo = make_repo("widgets", RepoStatus::Pending);
        assert!(repo_matches(&repo, &parse_query("status:pending")));
        assert!(!repo_matches(&repo, &parse_query("status:failed")));
    }

    #[test]
    fn run_matches_branch_filter() {
        let run = make_run("ci", "main", Some(RunConclusion::Success));
        assert!(run_matches(&run, &parse_query("branch:main")));
        assert!(!run_matches(&run, &parse_query("branch:dev")));
    }

    #[test]
    fn run_status_filter_covers_conclusion() {
        let run = make_run("ci", "main", Some(RunConclusion::Failure));
        assert!(run_matches(&run, &parse_query("status:failure")));
        assert!(run_matches(&run, &parse_query("status:completed")));
        assert!(!run_matches(&run, &parse_query("status:success")));
    }

    #[test]
    fn run_matches_sha_text() {
        let run = make_run("ci", "main", None);
        assert!(run_matches(&run, &parse_query("deadbeef")));
    }
}
