//! # Actor Roles
//!
//! Roles gate which edges an actor may drive. By default a role is read from
//! the DID naming convention `did:freed:<role>-<id>`; deployments with a real
//! directory inject their own [`RoleResolver`].

use serde::{Deserialize, Serialize};

use crate::status::DisputeStatus;

/// Role an actor plays in a dispute.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ActorRole {
    Subject,
    Reviewer,
    Council,
    Ombuds,
    System,
    Unknown,
}

impl ActorRole {
    /// Lowercase token used on the wire.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Subject => "subject",
            Self::Reviewer => "reviewer",
            Self::Council => "council",
            Self::Ombuds => "ombuds",
            Self::System => "system",
            Self::Unknown => "unknown",
        }
    }

    /// Parse a role token; anything unrecognized is `Unknown`.
    pub fn from_token(token: &str) -> Self {
        match token.trim().to_ascii_lowercase().as_str() {
            "subject" => Self::Subject,
            "reviewer" => Self::Reviewer,
            "council" => Self::Council,
            "ombuds" => Self::Ombuds,
            "system" => Self::System,
            _ => Self::Unknown,
        }
    }
}

impl std::fmt::Display for ActorRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Maps an actor identifier to a role.
pub trait RoleResolver: Send + Sync {
    fn resolve(&self, actor: &str) -> ActorRole;
}

impl<F> RoleResolver for F
where
    F: Fn(&str) -> ActorRole + Send + Sync,
{
    fn resolve(&self, actor: &str) -> ActorRole {
        self(actor)
    }
}

/// Reads the role from the last `:` segment of the actor, up to the first
/// `-`: `did:freed:reviewer-1` is a reviewer.
#[derive(Debug, Clone, Copy, Default)]
pub struct DidSuffixRoleResolver;

impl RoleResolver for DidSuffixRoleResolver {
    fn resolve(&self, actor: &str) -> ActorRole {
        let tail = actor.rsplit(':').next().unwrap_or(actor);
        let token = tail.split('-').next().unwrap_or(tail);
        ActorRole::from_token(token)
    }
}

/// Roles permitted to drive the edge `from -> to`. Empty for edges outside
/// the transition table.
pub fn allowed_roles(from: DisputeStatus, to: DisputeStatus) -> &'static [ActorRole] {
    use ActorRole::*;
    use DisputeStatus as S;
    match (from, to) {
        (S::Opened, S::Review) => &[Reviewer, Ombuds],
        (S::Opened, S::Dismissed) => &[Reviewer, Ombuds],
        (S::Review, S::Resolved) => &[Reviewer, Council],
        (S::Review, S::Dismissed) => &[Reviewer, Council],
        (S::Review, S::Escalated) => &[Reviewer, Ombuds],
        (S::Escalated, S::Review) => &[Council, Ombuds],
        (S::Escalated, S::Resolved) => &[Council],
        (S::Resolved, S::Reopened) => &[Subject, Ombuds],
        (S::Dismissed, S::Reopened) => &[Subject, Ombuds],
        (S::Reopened, S::Review) => &[Reviewer, Ombuds],
        _ => &[],
    }
}
