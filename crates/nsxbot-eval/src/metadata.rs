// SPDX-FileCopyrightText: 2026 nsxbot Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Run identifiers and the git-derived metadata string.

use tokio::process::Command;

/// `evl-` followed by 12 random hex characters.
pub fn new_eval_id() -> String {
    let mut id = format!("evl-{}", uuid::Uuid::new_v4().simple());
    id.truncate(16);
    id
}

pub fn format_metadata(features: &str, branch: &str, commit: &str) -> String {
    format!(
        "ACTIVATED:{features}_BRANCH:{}_COMMIT:{commit}",
        branch.replace('/', "-")
    )
}

/// Metadata for the current checkout; `unknown` where git is unavailable.
pub async fn git_metadata(features: &str) -> String {
    let branch = git(&["rev-parse", "--abbrev-ref", "HEAD"]).await;
    let commit = git(&["rev-parse", "--short", "HEAD"]).await;
    format_metadata(
        features,
        branch.as_deref().unwrap_or("unknown"),
        commit.as_deref().unwrap_or("unknown"),
    )
}

async fn git(args: &[&str]) -> Option<String> {
    let output = Command::new("git").args(args).output().await.ok()?;
    output
        .status
        .success()
        .then(|| String::from_utf8_lossy(&output.stdout).trim().to_string())
        .filter(|s| !s.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn eval_id_shape() {
        let id = new_eval_id();
        assert_eq!(id.len(), 16);
        assert!(id.starts_with("evl-"));
    }

    #[test]
    fn branch_slashes_are_replaced() {
        assert_eq!(
            format_metadata("faq,nsx", "feature/react", "abc1234"),
            "ACTIVATED:faq,nsx_BRANCH:feature-react_COMMIT:abc1234"
        );
    }
}
