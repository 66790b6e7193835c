//! Maps a webhook event to the notification it should produce.
//!
//! Classification is a pure function of the event type and payload. Rules
//! are checked in order and the first match wins:
//!
//! | Event | Condition | Notification |
//! |-------|-----------|--------------|
//! | `pull_request*` | action is `closed` or `reopened` | lifecycle (`MERGED` / `CLOSED` / `REOPENED`) |
//! | `pull_request*` | any other action | open/update (`PR #<n>: <title>`) |
//! | `issue_comment` | action is `created` | comment |
//! | `status` | - | commit status |
//!
//! Everything else returns `None`, which is not an error.

use super::events::{EventType, PullRequest, StatusCommit, User, WebhookPayload};
use super::notification::{
    COLOR_LIFECYCLE, COLOR_OPENED, COLOR_STATUS_ERROR, COLOR_STATUS_FAILURE, COLOR_STATUS_PENDING,
    COLOR_STATUS_SUCCESS, Notification,
};

/// Classifies an event. Returns `None` for events that are not relayed.
pub fn classify(event_type: &EventType, payload: &WebhookPayload) -> Option<Notification> {
    if event_type.is_pull_request_family() {
        let pr = payload.pull_request.as_ref()?;
        return match payload.action.as_deref() {
            Some(action @ ("closed" | "reopened")) => {
                Some(lifecycle(pr, action, payload.sender.as_ref()))
            }
            _ => Some(opened_or_updated(pr)),
        };
    }

    match event_type {
        EventType::IssueComment => comment(payload),
        EventType::CommitStatus => status(payload),
        _ => None,
    }
}

/// Close, merge or reopen.
fn lifecycle(pr: &PullRequest, action: &str, sender: Option<&User>) -> Notification {
    let action = if action == "closed" && pr.merged.unwrap_or(false) {
        "merged"
    } else {
        action
    };

    let notification = Notification::new(format!("PR #{}: {}", pr.number.0, action))
        .title(action.to_uppercase())
        .title_link(&pr.html_url)
        .color(COLOR_LIFECYCLE);

    with_author(notification, sender)
}

fn opened_or_updated(pr: &PullRequest) -> Notification {
    let title = format!("PR #{}: {}", pr.number.0, pr.title.as_deref().unwrap_or_default());

    let notification = Notification::new(format!("{} - {}", title, pr.html_url))
        .title(title)
        .title_link(&pr.html_url)
        .body_text(pr.body.clone())
        .color(COLOR_OPENED);

    with_author(notification, pr.user.as_ref())
}

fn comment(payload: &WebhookPayload) -> Option<Notification> {
    // Edits and deletions would repost text already in the thread.
    if !matches!(payload.action.as_deref(), None | Some("created")) {
        return None;
    }

    let comment = payload.comment.as_ref()?;
    let login = comment.user.as_ref().map_or("unknown", |u| u.login.as_str());
    let body = comment.body.as_deref().unwrap_or_default();

    let fallback = match &payload.issue {
        Some(issue) => format!("PR #{}: {}: {}", issue.number.0, login, body),
        None => format!("{}: {}", login, body),
    };

    let notification = Notification::new(fallback)
        .title_link(&comment.html_url)
        .body_text(comment.body.clone());

    Some(with_author(notification, comment.user.as_ref()))
}

fn status(payload: &WebhookPayload) -> Option<Notification> {
    let state = payload.state.as_deref().unwrap_or_default();
    let description = payload.description.as_deref().unwrap_or_default();

    // An empty or absent target_url both fall back to the commit page.
    let link = payload
        .target_url
        .as_deref()
        .filter(|url| !url.is_empty())
        .or_else(|| payload.commit.as_ref().and_then(|c| c.html_url.as_deref()))
        .unwrap_or_default();

    let label = match (&payload.context, &payload.sha) {
        (Some(context), _) => context.clone(),
        (None, Some(sha)) => sha.short().to_string(),
        (None, None) => "status".to_string(),
    };

    let mut notification = Notification::new(format!("{label}: {description} ({state})"))
        .title(description)
        .body_text(Some(format!("{link} ({state})")))
        .color(status_color(state));

    if let Some((name, link, icon)) = payload.commit.as_ref().and_then(commit_author) {
        notification = notification.author(name, link, icon);
    }

    Some(notification)
}

/// Colour for a commit status state; empty for unknown states.
pub fn status_color(state: &str) -> &'static str {
    match state {
        "pending" => COLOR_STATUS_PENDING,
        "error" => COLOR_STATUS_ERROR,
        "success" => COLOR_STATUS_SUCCESS,
        "failure" => COLOR_STATUS_FAILURE,
        _ => "",
    }
}

/// Author of a status commit: the GitHub author account, else the
/// committer account, else the raw git author name.
fn commit_author(commit: &StatusCommit) -> Option<(String, Option<String>, Option<String>)> {
    if let Some(user) = commit.author.as_ref().or(commit.committer.as_ref()) {
        return Some((
            user.login.clone(),
            user.html_url.clone(),
            user.avatar_url.clone(),
        ));
    }

    commit
        .commit
        .as_ref()
        .and_then(|c| c.author.as_ref())
        .and_then(|a| a.name.clone())
        .map(|name| (name, None, None))
}

fn with_author(notification: Notification, user: Option<&User>) -> Notification {
    match user {
        Some(user) => notification.author(
            &user.login,
            user.html_url.clone(),
            user.avatar_url.clone(),
        ),
        None => notification,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{Value, json};

    fn payload(value: Value) -> WebhookPayload {
        serde_json::from_value(value).unwrap()
    }

    fn pr_payload(action: &str, merged: bool) -> WebhookPayload {
        payload(json!({
            "action": action,
            "pull_request": {
                "number": 42,
                "html_url": "https://github.com/octocat/hello/pull/42",
                "title": "Add widgets",
                "body": "This adds widgets.",
                "merged": merged,
                "user": {
                    "login": "author",
                    "url": "https://api.github.com/users/author",
                    "html_url": "https://github.com/author",
                    "avatar_url": "https://avatars.example/author"
                }
            },
            "sender": {
                "login": "closer",
                "html_url": "https://github.com/closer",
                "avatar_url": "https://avatars.example/closer"
            }
        }))
    }

    fn status_payload(state: &str, target_url: Value) -> WebhookPayload {
        payload(json!({
            "sha": "0123456789abcdef0123456789abcdef01234567",
            "state": state,
            "description": "Build finished",
            "context": "ci/build",
            "target_url": target_url,
            "commit": {
                "html_url": "https://github.com/octocat/hello/commit/0123456",
                "author": {
                    "login": "committer",
                    "html_url": "https://github.com/committer",
                    "avatar_url": "https://avatars.example/committer"
                },
                "committer": null
            }
        }))
    }

    // ─── Pull request family ───

    #[test]
    fn opened_pull_request() {
        let n = classify(&EventType::PullRequest, &pr_payload("opened", false)).unwrap();

        assert_eq!(n.color.as_deref(), Some("#7CD197"));
        assert_eq!(n.title.as_deref(), Some("PR #42: Add widgets"));
        assert!(n.title.as_deref().unwrap().starts_with("PR #42: "));
        assert_eq!(
            n.title_link.as_deref(),
            Some("https://github.com/octocat/hello/pull/42")
        );
        assert_eq!(n.author_name.as_deref(), Some("author"));
        assert_eq!(n.author_link.as_deref(), Some("https://github.com/author"));
        assert_eq!(n.author_icon.as_deref(), Some("https://avatars.example/author"));
        assert_eq!(n.body_text.as_deref(), Some("This adds widgets."));
        assert_eq!(
            n.fallback,
            "PR #42: Add widgets - https://github.com/octocat/hello/pull/42"
        );
        assert!(n.thread_ts.is_none());
    }

    #[test]
    fn other_actions_use_open_update_format() {
        for action in ["synchronize", "edited", "submitted", "created"] {
            for event_type in [
                EventType::PullRequest,
                EventType::PullRequestReview,
                EventType::PullRequestReviewComment,
            ] {
                let n = classify(&event_type, &pr_payload(action, false)).unwrap();
                assert_eq!(n.color.as_deref(), Some(COLOR_OPENED), "{event_type} {action}");
            }
        }
    }

    #[test]
    fn merged_pull_request() {
        let n = classify(&EventType::PullRequest, &pr_payload("closed", true)).unwrap();

        assert_eq!(n.title.as_deref(), Some("MERGED"));
        assert_eq!(n.color.as_deref(), Some("#d011dd"));
        assert_eq!(n.fallback, "PR #42: merged");
        // The sender, not the PR author, is credited.
        assert_eq!(n.author_name.as_deref(), Some("closer"));
        assert_eq!(n.author_link.as_deref(), Some("https://github.com/closer"));
        assert_eq!(n.body_text, None);
    }

    #[test]
    fn closed_without_merge() {
        let n = classify(&EventType::PullRequest, &pr_payload("closed", false)).unwrap();
        assert_eq!(n.title.as_deref(), Some("CLOSED"));
        assert_eq!(n.fallback, "PR #42: closed");
    }

    #[test]
    fn reopened() {
        let n = classify(&EventType::PullRequestReview, &pr_payload("reopened", false)).unwrap();
        assert_eq!(n.title.as_deref(), Some("REOPENED"));
        assert_eq!(n.color.as_deref(), Some(COLOR_LIFECYCLE));
    }

    #[test]
    fn pull_request_event_without_pull_request_is_ignored() {
        let p = payload(json!({ "action": "opened" }));
        assert!(classify(&EventType::PullRequest, &p).is_none());
    }

    // ─── Comments ───

    fn comment_payload(action: &str) -> WebhookPayload {
        payload(json!({
            "action": action,
            "issue": {
                "number": 42,
                "html_url": "https://github.com/octocat/hello/pull/42",
                "title": "Add widgets"
            },
            "comment": {
                "html_url": "https://github.com/octocat/hello/pull/42#issuecomment-1",
                "body": "Looks good",
                "user": {
                    "login": "reviewer",
                    "html_url": "https://github.com/reviewer",
                    "avatar_url": "https://avatars.example/reviewer"
                }
            }
        }))
    }

    #[test]
    fn issue_comment_created() {
        let n = classify(&EventType::IssueComment, &comment_payload("created")).unwrap();

        assert_eq!(n.title, None);
        assert_eq!(
            n.title_link.as_deref(),
            Some("https://github.com/octocat/hello/pull/42#issuecomment-1")
        );
        assert_eq!(n.author_name.as_deref(), Some("reviewer"));
        assert_eq!(n.body_text.as_deref(), Some("Looks good"));
        assert_eq!(n.color, None);
        assert_eq!(n.fallback, "PR #42: reviewer: Looks good");
    }

    #[test]
    fn issue_comment_edits_are_ignored() {
        assert!(classify(&EventType::IssueComment, &comment_payload("edited")).is_none());
        assert!(classify(&EventType::IssueComment, &comment_payload("deleted")).is_none());
    }

    #[test]
    fn issue_comment_without_comment_is_ignored() {
        let p = payload(json!({ "action": "created" }));
        assert!(classify(&EventType::IssueComment, &p).is_none());
    }

    // ─── Status ───

    #[test]
    fn status_success_with_empty_target_url_uses_commit_url() {
        let n = classify(&EventType::CommitStatus, &status_payload("success", json!(""))).unwrap();

        assert_eq!(n.color.as_deref(), Some("#b3ffcc"));
        assert!(n.body_text.as_deref().unwrap().ends_with("(success)"));
        assert_eq!(
            n.body_text.as_deref(),
            Some("https://github.com/octocat/hello/commit/0123456 (success)")
        );
        assert_eq!(n.title.as_deref(), Some("Build finished"));
        assert_eq!(n.author_name.as_deref(), Some("committer"));
        assert_eq!(n.fallback, "ci/build: Build finished (success)");
    }

    #[test]
    fn status_absent_target_url_uses_commit_url() {
        let n = classify(&EventType::CommitStatus, &status_payload("pending", Value::Null)).unwrap();
        assert_eq!(
            n.body_text.as_deref(),
            Some("https://github.com/octocat/hello/commit/0123456 (pending)")
        );
    }

    #[test]
    fn status_prefers_target_url() {
        let n = classify(
            &EventType::CommitStatus,
            &status_payload("failure", json!("https://ci.example/build/7")),
        )
        .unwrap();
        assert_eq!(
            n.body_text.as_deref(),
            Some("https://ci.example/build/7 (failure)")
        );
    }

    #[test]
    fn status_colors() {
        for (state, color) in [
            ("pending", Some("#ffffcc")),
            ("error", Some("#ff8080")),
            ("success", Some("#b3ffcc")),
            ("failure", Some("#ff9900")),
            ("weird", None),
        ] {
            let n = classify(&EventType::CommitStatus, &status_payload(state, json!(""))).unwrap();
            assert_eq!(n.color.as_deref(), color, "state {state}");
        }
    }

    #[test]
    fn status_author_falls_back_to_git_name() {
        let p = payload(json!({
            "sha": "abcdef1234",
            "state": "success",
            "description": "ok",
            "commit": {
                "html_url": "https://github.com/o/r/commit/abcdef1",
                "author": null,
                "committer": null,
                "commit": { "author": { "name": "Mona Lisa" } }
            }
        }));

        let n = classify(&EventType::CommitStatus, &p).unwrap();
        assert_eq!(n.author_name.as_deref(), Some("Mona Lisa"));
        assert_eq!(n.author_link, None);
        // No context: the short SHA labels the fallback.
        assert_eq!(n.fallback, "abcdef1: ok (success)");
    }

    // ─── Misses ───

    #[test]
    fn unknown_event_type_is_none() {
        let p = pr_payload("opened", false);
        assert!(classify(&EventType::Unknown("push".into()), &p).is_none());
    }
}
