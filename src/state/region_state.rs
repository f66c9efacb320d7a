//! Region lifecycle states
//!
//! A region moves `Pending -> InProgress -> Completed`. Only `Completed` is
//! persisted, as membership in the completed-regions checkpoint.

use std::fmt;

/// Represents where a region is in its pagination walk
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RegionState {
    /// Not walked yet in any run, or interrupted before its last page
    Pending,

    /// Its pagination chain is being walked
    InProgress,

    /// Its pagination chain was walked to the page with no next link
    Completed,
}

impl RegionState {
    /// Returns true if moving from this state to `next` is allowed
    pub fn can_transition_to(&self, next: RegionState) -> bool {
        matches!(
            (self, next),
            (Self::Pending, Self::InProgress) | (Self::InProgress, Self::Completed)
        )
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::InProgress => "in_progress",
            Self::Completed => "completed",
        }
    }
}

impl fmt::Display for RegionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
