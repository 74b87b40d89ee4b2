use std::fmt;

use serde::{Deserialize, Serialize};

/// The phases of the review workflow.
///
/// One session flows: Unauthenticated → Authenticating → AuthenticatedIdle →
/// QueueLoading → QueueReady → RowEnriching → RowReady → Submitting → back to
/// RowEnriching for the next row (or QueueLoading when the queue drains) →
/// LoggedOut.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Phase {
    Unauthenticated,
    Authenticating,
    AuthenticatedIdle,
    QueueLoading,
    QueueReady,
    RowEnriching,
    RowReady,
    Submitting,
    LoggedOut,
}

impl Phase {
    /// Whether a review session is active (a queue is loaded or a row is
    /// under inspection).
    pub fn in_review(&self) -> bool {
        matches!(
            self,
            Phase::QueueReady | Phase::RowEnriching | Phase::RowReady | Phase::Submitting
        )
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Phase::Unauthenticated => "UNAUTHENTICATED",
            Phase::Authenticating => "AUTHENTICATING",
            Phase::AuthenticatedIdle => "AUTHENTICATED_IDLE",
            Phase::QueueLoading => "QUEUE_LOADING",
            Phase::QueueReady => "QUEUE_READY",
            Phase::RowEnriching => "ROW_ENRICHING",
            Phase::RowReady => "ROW_READY",
            Phase::Submitting => "SUBMITTING",
            Phase::LoggedOut => "LOGGED_OUT",
        };
        write!(f, "{name}")
    }
}
