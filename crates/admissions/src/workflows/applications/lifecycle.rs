//! Administrative decisions and the status transitions they are allowed to make.
//!
//! ```text
//! DRAFT / SUBMITTED / UNDER_REVIEW / CHANGES_REQUESTED / REJECTED ──approve──> APPROVED
//! APPROVED ──approve──> InvalidState
//! any ──reject(note)──> REJECTED
//! any ──request_changes(note)──> CHANGES_REQUESTED
//! ```
//!
//! Reject and request-changes carry no guard on the current status, so an approved
//! application can still be rejected or sent back for changes.

use serde::{Deserialize, Serialize};

use super::domain::ApplicationStatus;

/// Reviewer note required by reject and request-changes. Never blank.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct DecisionNote(String);

impl DecisionNote {
    /// Trims the input; absent or whitespace-only notes are refused.
    pub fn parse(raw: Option<&str>) -> Result<Self, LifecycleError> {
        match raw.map(str::trim) {
            Some(note) if !note.is_empty() => Ok(Self(note.to_string())),
            _ => Err(LifecycleError::MissingNote),
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// Body accepted by the reject and request-changes endpoints.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DecisionNoteRequest {
    #[serde(default)]
    pub note: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Decision {
    Approve,
    Reject(DecisionNote),
    RequestChanges(DecisionNote),
}

impl Decision {
    pub fn target_status(&self) -> ApplicationStatus {
        match self {
            Decision::Approve => ApplicationStatus::Approved,
            Decision::Reject(_) => ApplicationStatus::Rejected,
            Decision::RequestChanges(_) => ApplicationStatus::ChangesRequested,
        }
    }

    /// Reason stored on the application; approval clears it.
    pub fn reason(&self) -> Option<&str> {
        match self {
            Decision::Approve => None,
            Decision::Reject(note) | Decision::RequestChanges(note) => Some(note.as_str()),
        }
    }

    pub const fn label(&self) -> &'static str {
        match self {
            Decision::Approve => "approve",
            Decision::Reject(_) => "reject",
            Decision::RequestChanges(_) => "request_changes",
        }
    }

    /// Status after applying this decision to an application currently in `current`.
    pub fn apply_to(&self, current: ApplicationStatus) -> Result<ApplicationStatus, LifecycleError> {
        match (self, current) {
            (Decision::Approve, ApplicationStatus::Approved) => {
                Err(LifecycleError::InvalidState {
                    current,
                    decision: self.label(),
                })
            }
            _ => Ok(self.target_status()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum LifecycleError {
    #[error("cannot {decision} an application that is {}", current.label())]
    InvalidState {
        current: ApplicationStatus,
        decision: &'static str,
    },
    #[error("a note is required for this decision")]
    MissingNote,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn note(text: &str) -> DecisionNote {
        DecisionNote::parse(Some(text)).expect("note is valid")
    }

    #[test]
    fn blank_notes_are_refused() {
        assert_eq!(DecisionNote::parse(None), Err(LifecycleError::MissingNote));
        assert_eq!(DecisionNote::parse(Some("")), Err(LifecycleError::MissingNote));
        assert_eq!(
            DecisionNote::parse(Some(" \t\n ")),
            Err(LifecycleError::MissingNote)
        );
        assert_eq!(note("  Incomplete documents ").as_str(), "Incomplete documents");
    }

    #[test]
    fn approve_is_refused_only_from_approved() {
        for status in ApplicationStatus::ALL {
            let result = Decision::Approve.apply_to(status);
            if status == ApplicationStatus::Approved {
                assert!(matches!(result, Err(LifecycleError::InvalidState { .. })));
            } else {
                assert_eq!(result, Ok(ApplicationStatus::Approved));
            }
        }
    }

    #[test]
    fn reject_and_request_changes_apply_from_any_status() {
        for status in ApplicationStatus::ALL {
            assert_eq!(
                Decision::Reject(note("Incomplete documents")).apply_to(status),
                Ok(ApplicationStatus::Rejected)
            );
            assert_eq!(
                Decision::RequestChanges(note("Upload permit")).apply_to(status),
                Ok(ApplicationStatus::ChangesRequested)
            );
        }
    }

    #[test]
    fn approval_clears_the_reason() {
        assert_eq!(Decision::Approve.reason(), None);
        assert_eq!(
            Decision::Reject(note("Duplicate")).reason(),
            Some("Duplicate")
        );
    }
}
