//! Name-keyed approval state ("current state of the world")

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use time::OffsetDateTime;

use crate::git::UNKNOWN;

/// Human decision recorded against a test name
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DecisionAction {
    Accept,
    Reject,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Decision {
    pub action: DecisionAction,
    #[serde(with = "time::serde::rfc3339")]
    pub timestamp: OffsetDateTime,
}

impl Decision {
    pub fn accept(timestamp: OffsetDateTime) -> Self {
        Self {
            action: DecisionAction::Accept,
            timestamp,
        }
    }

    pub fn reject(timestamp: OffsetDateTime) -> Self {
        Self {
            action: DecisionAction::Reject,
            timestamp,
        }
    }
}

/// Decisions keyed by test name
pub type Decisions = BTreeMap<String, Decision>;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApprovalsMeta {
    pub author: String,
    #[serde(with = "time::serde::rfc3339")]
    pub timestamp: OffsetDateTime,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pr_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub commit_sha: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub commit_url: Option<String>,
}

impl Default for ApprovalsMeta {
    fn default() -> Self {
        Self {
            author: UNKNOWN.to_string(),
            timestamp: OffsetDateTime::UNIX_EPOCH,
            source: None,
            pr_url: None,
            commit_sha: None,
            commit_url: None,
        }
    }
}

/// Contents of `approvals.json`
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApprovalsSnapshot {
    #[serde(default)]
    pub approved: Vec<String>,
    #[serde(default)]
    pub rejected: Vec<String>,
    #[serde(default)]
    pub new: Vec<String>,
    #[serde(default)]
    pub deleted: Vec<String>,
    #[serde(default)]
    pub meta: ApprovalsMeta,
}

impl ApprovalsSnapshot {
    pub fn is_approved(&self, name: &str) -> bool {
        self.approved.iter().any(|n| n == name)
    }

    pub fn is_rejected(&self, name: &str) -> bool {
        self.rejected.iter().any(|n| n == name)
    }

    /// Move accepted names into `approved` and rejected names into
    /// `rejected`. A name is never left in both lists.
    pub fn apply_decisions(&mut self, decisions: &Decisions) {
        for (name, decision) in decisions {
            match decision.action {
                DecisionAction::Accept => {
                    self.rejected.retain(|n| n != name);
                    if !self.is_approved(name) {
                        self.approved.push(name.clone());
                    }
                }
                DecisionAction::Reject => {
                    self.approved.retain(|n| n != name);
                    if !self.is_rejected(name) {
                        self.rejected.push(name.clone());
                    }
                }
            }
        }
    }

    /// Replace the `new` / `deleted` lists from the latest compare run
    pub fn refresh_inventory<I, J>(&mut self, new: I, deleted: J)
    where
        I: IntoIterator<Item = String>,
        J: IntoIterator<Item = String>,
    {
        self.new = new.into_iter().collect();
        self.new.sort();
        self.new.dedup();
        self.deleted = deleted.into_iter().collect();
        self.deleted.sort();
        self.deleted.dedup();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn decisions(entries: &[(&str, DecisionAction)]) -> Decisions {
        entries
            .iter()
            .map(|(name, action)| {
                (
                    name.to_string(),
                    Decision {
                        action: *action,
                        timestamp: OffsetDateTime::UNIX_EPOCH,
                    },
                )
            })
            .collect()
    }

    #[test]
    fn test_accept_moves_out_of_rejected() {
        let mut snapshot = ApprovalsSnapshot {
            rejected: vec!["home".to_string()],
            ..Default::default()
        };

        snapshot.apply_decisions(&decisions(&[("home", DecisionAction::Accept)]));

        assert_eq!(snapshot.approved, vec!["home"]);
        assert!(snapshot.rejected.is_empty());
    }

    #[test]
    fn test_reject_moves_out_of_approved() {
        let mut snapshot = ApprovalsSnapshot {
            approved: vec!["home".to_string(), "login".to_string()],
            ..Default::default()
        };

        snapshot.apply_decisions(&decisions(&[("login", DecisionAction::Reject)]));

        assert_eq!(snapshot.approved, vec!["home"]);
        assert_eq!(snapshot.rejected, vec!["login"]);
    }

    #[test]
    fn test_repeated_accept_does_not_duplicate() {
        let mut snapshot = ApprovalsSnapshot::default();
        let accept = decisions(&[("home", DecisionAction::Accept)]);
        snapshot.apply_decisions(&accept);
        snapshot.apply_decisions(&accept);
        assert_eq!(snapshot.approved, vec!["home"]);
    }

    #[test]
    fn test_parse_minimal_file() {
        let snapshot: ApprovalsSnapshot =
            serde_json::from_str(r#"{"approved":["a"],"rejected":[]}"#).unwrap();
        assert_eq!(snapshot.approved, vec!["a"]);
        assert_eq!(snapshot.meta.author, UNKNOWN);
    }

    #[test]
    fn test_meta_wire_format() {
        let snapshot = ApprovalsSnapshot {
            meta: ApprovalsMeta {
                pr_url: Some("https://example.com/pr/1".to_string()),
                ..Default::default()
            },
            ..Default::default()
        };
        let json = serde_json::to_value(&snapshot).unwrap();
        assert_eq!(json["meta"]["pr_url"], "https://example.com/pr/1");
        assert_eq!(json["meta"]["timestamp"], "1970-01-01T00:00:00Z");
        assert!(json["meta"].get("commit_sha").is_none());
    }
}
