//! Shared types used across modules
//!
//! Knowledge entries and help requests are the two records the desk
//! persists. Both are plain data; all mutation goes through the
//! knowledge store and the escalation queue.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Where a knowledge entry came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntryOrigin {
    /// Preloaded before the desk went live
    Seed,
    /// Answered by a supervisor through a help request
    Supervisor,
    /// Confident answer from the AI oracle
    Oracle,
}

impl EntryOrigin {
    pub fn as_str(&self) -> &'static str {
        match self {
            EntryOrigin::Seed => "seed",
            EntryOrigin::Supervisor => "supervisor",
            EntryOrigin::Oracle => "oracle",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "seed" => Some(EntryOrigin::Seed),
            "supervisor" => Some(EntryOrigin::Supervisor),
            "oracle" => Some(EntryOrigin::Oracle),
            _ => None,
        }
    }
}

impl std::fmt::Display for EntryOrigin {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One confirmed question/answer pair. Never mutated once stored.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KnowledgeEntry {
    /// Insertion sequence assigned by the store; lower is older
    pub id: i64,
    /// The question as the user originally phrased it
    pub question: String,
    pub answer: String,
    pub origin: EntryOrigin,
    /// Help request that produced this entry (supervisor answers only)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub request_id: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// A knowledge entry before the store has assigned it an id
#[derive(Debug, Clone)]
pub struct NewKnowledge {
    pub question: String,
    /// Normalised form of `question`, used for exact lookups
    pub question_key: String,
    pub answer: String,
    pub origin: EntryOrigin,
    pub request_id: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Lifecycle of a help request. Moves from pending to resolved exactly once.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RequestStatus {
    Pending,
    Resolved,
}

impl RequestStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            RequestStatus::Pending => "pending",
            RequestStatus::Resolved => "resolved",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "pending" => Some(RequestStatus::Pending),
            "resolved" => Some(RequestStatus::Resolved),
            _ => None,
        }
    }
}

impl std::fmt::Display for RequestStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A question escalated to a human supervisor
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HelpRequest {
    pub id: String,
    /// Original, unnormalised question text
    pub question: String,
    pub status: RequestStatus,
    pub answer: Option<String>,
    pub created_at: DateTime<Utc>,
    pub resolved_at: Option<DateTime<Utc>>,
}

impl HelpRequest {
    /// Create a fresh pending request with a new UUID
    pub fn pending(question: impl Into<String>) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            question: question.into(),
            status: RequestStatus::Pending,
            answer: None,
            created_at: Utc::now(),
            resolved_at: None,
        }
    }

    pub fn is_pending(&self) -> bool {
        self.status == RequestStatus::Pending
    }
}

/// Which automated path produced an answer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AnswerSource {
    Knowledge,
    Oracle,
}

/// Outcome of asking the desk a question
#[derive(Debug, Clone, PartialEq)]
pub enum Resolution {
    /// Answered without human help
    Answered { source: AnswerSource, text: String },
    /// Queued for a supervisor; `message` is what the caller should hear meanwhile
    Escalated { request: HelpRequest, message: String },
}

impl Resolution {
    pub fn is_escalated(&self) -> bool {
        matches!(self, Resolution::Escalated { .. })
    }

    /// The answer text, if one was produced
    pub fn answer(&self) -> Option<&str> {
        match self {
            Resolution::Answered { text, .. } => Some(text),
            Resolution::Escalated { .. } => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_round_trips_through_strings() {
        assert_eq!(RequestStatus::parse("PENDING"), Some(RequestStatus::Pending));
        assert_eq!(RequestStatus::parse("resolved"), Some(RequestStatus::Resolved));
        assert_eq!(RequestStatus::parse("open"), None);
        assert_eq!(EntryOrigin::parse("oracle"), Some(EntryOrigin::Oracle));
        assert_eq!(EntryOrigin::Supervisor.to_string(), "supervisor");
    }

    #[test]
    fn test_pending_request_shape() {
        let a = HelpRequest::pending("What are your hours?");
        let b = HelpRequest::pending("What are your hours?");
        assert_ne!(a.id, b.id);
        assert!(a.is_pending());
        assert!(a.answer.is_none());
        assert!(a.resolved_at.is_none());
    }

    #[test]
    fn test_help_request_serializes_lowercase_status() {
        let req = HelpRequest::pending("Do you take walk-ins?");
        let json = serde_json::to_value(&req).unwrap();
        assert_eq!(json["status"], "pending");
        assert!(json["answer"].is_null());
    }
}
