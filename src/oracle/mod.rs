//! Oracle Adapter - boundary around the external AI answering service
//!
//! The adapter never lets an oracle failure escape. Transport errors, bad
//! status codes, timeouts and replies that admit uncertainty all come back
//! as `OracleReply::Unknown`, which the resolver turns into an escalation.

pub mod openai;

use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tracing::{info, warn};

use crate::types::KnowledgeEntry;

pub use openai::ChatCompletionOracle;

/// Token an oracle uses to say it has no confident answer
pub const UNKNOWN_SIGNAL: &str = "unknown";

/// Why the external oracle could not produce a reply
#[derive(Debug, Error)]
pub enum OracleError {
    #[error("oracle not configured: {0}")]
    NotConfigured(String),

    #[error("oracle request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("oracle returned HTTP {status}: {body}")]
    Status { status: u16, body: String },

    #[error("malformed oracle response: {0}")]
    Malformed(String),

    #[error("oracle timed out after {0:?}")]
    Timeout(Duration),
}

/// External answering service
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait Oracle: Send + Sync {
    /// Answer `question`, optionally using `context` (known Q/A pairs) as priming
    async fn query(&self, question: &str, context: &[KnowledgeEntry]) -> Result<String, OracleError>;

    fn name(&self) -> &'static str;
}

/// What the resolver sees from the oracle
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OracleReply {
    Answer(String),
    Unknown,
}

/// Oracle that never knows anything; used when the AI oracle is switched off
pub struct NullOracle;

#[async_trait]
impl Oracle for NullOracle {
    async fn query(&self, _question: &str, _context: &[KnowledgeEntry]) -> Result<String, OracleError> {
        Ok(UNKNOWN_SIGNAL.to_string())
    }

    fn name(&self) -> &'static str {
        "none"
    }
}

/// Wraps an `Oracle` with a hard timeout and the unknown-signal rules
#[derive(Clone)]
pub struct OracleAdapter {
    oracle: Arc<dyn Oracle>,
    timeout: Duration,
}

impl OracleAdapter {
    pub fn new(oracle: Arc<dyn Oracle>, timeout: Duration) -> Self {
        Self { oracle, timeout }
    }

    /// Ask the oracle. Every failure mode degrades to `Unknown`.
    pub async fn resolve(&self, question: &str, snapshot: &[KnowledgeEntry]) -> OracleReply {
        let result = match tokio::time::timeout(self.timeout, self.oracle.query(question, snapshot)).await {
            Ok(result) => result,
            Err(_) => Err(OracleError::Timeout(self.timeout)),
        };

        match result {
            Ok(reply) => {
                let reply = reply.trim();
                if is_unknown(reply) {
                    info!("Oracle '{}' has no confident answer for: {}", self.oracle.name(), question);
                    OracleReply::Unknown
                } else {
                    info!("Oracle '{}' answered: {}", self.oracle.name(), question);
                    OracleReply::Answer(reply.to_string())
                }
            }
            Err(e) => {
                warn!("Oracle '{}' unavailable, escalating: {}", self.oracle.name(), e);
                OracleReply::Unknown
            }
        }
    }
}

/// Empty replies and any reply mentioning "unknown" count as no answer
fn is_unknown(reply: &str) -> bool {
    reply.is_empty() || reply.to_lowercase().contains(UNKNOWN_SIGNAL)
}
