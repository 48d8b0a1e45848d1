//! Target state definitions for tracking a URL through one crawl session
//!
//! ```text
//! Discovered -> Claimed -> Fetching -> Extracting  -> Completed
//!                   |                -> Redirecting -> Completed
//!                   |                -> Failed
//!                   +-> Rejected
//! ```
//!
//! There is no revisit transition; terminal states are final.
use std::fmt;

/// Represents the current state of a crawl target
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TargetState {
    // ===== Active States =====
    /// Link has been seen and normalized
    Discovered,

    /// This caller won the first-visit claim
    Claimed,

    /// Waiting for a permit or for the transport
    Fetching,

    /// Body received with a success status, links being extracted
    Extracting,

    /// Redirect received, location being dispatched
    Redirecting,

    // ===== Terminal States =====
    /// Target fully handled
    Completed,

    /// Claimed but refused by the domain filter, never fetched
    Rejected,

    /// Fetch, status or extraction failure
    Failed,
}

impl TargetState {
    /// Returns true if this is a terminal state
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Completed | Self::Rejected | Self::Failed)
    }

    /// Checks whether `next` is a legal successor of this state
    pub fn can_transition_to(&self, next: TargetState) -> bool {
        use TargetState::*;
        matches!(
            (self, next),
            (Discovered, Claimed)
                | (Claimed, Fetching)
                | (Claimed, Rejected)
                | (Fetching, Extracting)
                | (Fetching, Redirecting)
                | (Fetching, Failed)
                | (Extracting, Completed)
                | (Extracting, Failed)
                | (Redirecting, Completed)
        )
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Discovered => "discovered",
            Self::Claimed => "claimed",
            Self::Fetching => "fetching",
            Self::Extracting => "extracting",
            Self::Redirecting => "redirecting",
            Self::Completed => "completed",
            Self::Rejected => "rejected",
            Self::Failed => "failed",
        }
    }
}

impl fmt::Display for TargetState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
