//! # Dispute Status
//!
//! Six states with directed edges and no implicit self-loops. `Resolved` and
//! `Dismissed` are soft-terminal: the only way out is `Reopened`.

use serde::{Deserialize, Serialize};

/// The lifecycle state of a dispute case.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DisputeStatus {
    /// Case filed; genesis state.
    Opened,
    /// Under review by a reviewer.
    Review,
    /// Escalated to council.
    Escalated,
    /// Decided in the subject's favour or otherwise closed on the merits.
    Resolved,
    /// Rejected without a decision on the merits.
    Dismissed,
    /// Reopened after resolution or dismissal.
    Reopened,
}

impl DisputeStatus {
    /// Every status, in lifecycle order.
    pub const ALL: [DisputeStatus; 6] = [
        Self::Opened,
        Self::Review,
        Self::Escalated,
        Self::Resolved,
        Self::Dismissed,
        Self::Reopened,
    ];

    /// The lowercase wire token.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Opened => "opened",
            Self::Review => "review",
            Self::Escalated => "escalated",
            Self::Resolved => "resolved",
            Self::Dismissed => "dismissed",
            Self::Reopened => "reopened",
        }
    }

    /// Parse a wire token (case-insensitive, surrounding whitespace ignored).
    pub fn parse(token: &str) -> Option<Self> {
        let token = token.trim().to_ascii_lowercase();
        Self::ALL.into_iter().find(|s| s.as_str() == token)
    }

    /// Valid target states from this state.
    pub fn valid_transitions(&self) -> &'static [DisputeStatus] {
        match self {
            Self::Opened => &[Self::Review, Self::Dismissed],
            Self::Review => &[Self::Resolved, Self::Dismissed, Self::Escalated],
            Self::Escalated => &[Self::Review, Self::Resolved],
            Self::Resolved => &[Self::Reopened],
            Self::Dismissed => &[Self::Reopened],
            Self::Reopened => &[Self::Review],
        }
    }

    /// Whether `self -> target` is an edge of the lifecycle.
    pub fn can_transition_to(&self, target: DisputeStatus) -> bool {
        self.valid_transitions().contains(&target)
    }

    /// Whether the case is closed pending a reopen.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Resolved | Self::Dismissed)
    }
}

impl std::fmt::Display for DisputeStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for DisputeStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s).ok_or_else(|| format!("unknown dispute status: {s:?}"))
    }
}

/// Serde for an event's `from_status`: genesis events have none, written as
/// the token `"none"`.
pub(crate) mod from_status {
    use super::DisputeStatus;
    use serde::{de, Deserialize, Deserializer, Serializer};

    pub const GENESIS_TOKEN: &str = "none";

    pub fn serialize<S: Serializer>(
        value: &Option<DisputeStatus>,
        serializer: S,
    ) -> Result<S::Ok, S::Error> {
        match value {
            Some(status) => serializer.serialize_str(status.as_str()),
            None => serializer.serialize_str(GENESIS_TOKEN),
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<Option<DisputeStatus>, D::Error> {
        let token = String::deserialize(deserializer)?;
        if token == GENESIS_TOKEN {
            return Ok(None);
        }
        DisputeStatus::parse(&token)
            .map(Some)
            .ok_or_else(|| de::Error::custom(format!("unknown dispute status: {token:?}")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn edge_table() {
        use DisputeStatus::*;
        assert!(Opened.can_transition_to(Review));
        assert!(Opened.can_transition_to(Dismissed));
        assert!(!Opened.can_transition_to(Resolved));
        assert!(!Opened.can_transition_to(Opened));
        assert!(Review.can_transition_to(Escalated));
        assert!(Escalated.can_transition_to(Review));
        assert!(!Escalated.can_transition_to(Dismissed));
        assert!(Resolved.can_transition_to(Reopened));
        assert!(Dismissed.can_transition_to(Reopened));
        assert!(Reopened.can_transition_to(Review));
        assert!(!Reopened.can_transition_to(Resolved));
    }

    #[test]
    fn no_self_loops() {
        for s in DisputeStatus::ALL {
            assert!(!s.can_transition_to(s), "{s} must not loop");
        }
    }

    #[test]
    fn every_state_has_an_exit() {
        for s in DisputeStatus::ALL {
            assert!(!s.valid_transitions().is_empty());
        }
    }

    #[test]
    fn tokens_roundtrip() {
        for s in DisputeStatus::ALL {
            assert_eq!(DisputeStatus::parse(s.as_str()), Some(s));
            assert_eq!(serde_json::to_string(&s).unwrap(), format!("\"{s}\""));
        }
        assert_eq!(DisputeStatus::parse(" Review "), Some(DisputeStatus::Review));
        assert_eq!(DisputeStatus::parse("closed"), None);
        assert!("none".parse::<DisputeStatus>().is_err());
    }

    #[test]
    fn terminal_states() {
        assert!(DisputeStatus::Resolved.is_terminal());
        assert!(DisputeStatus::Dismissed.is_terminal());
        assert!(!DisputeStatus::Reopened.is_terminal());
    }
}
