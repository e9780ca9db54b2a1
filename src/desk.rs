//! Help desk - the entry points transports and the CLI call into
//!
//! Wires the knowledge store, oracle adapter, escalation queue and resolver
//! over one shared storage backend, and validates input before anything
//! touches storage.

use anyhow::{Context, Result};
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};

use crate::config::Config;
use crate::error::{DeskError, DeskResult};
use crate::escalation::{EscalationQueue, LogNotifier, WebhookNotifier};
use crate::knowledge::KnowledgeStore;
use crate::oracle::{ChatCompletionOracle, NullOracle, Oracle, OracleAdapter};
use crate::resolver::Resolver;
use crate::store::{MemoryStore, SharedStorage, SqliteStore};
use crate::types::{EntryOrigin, HelpRequest, KnowledgeEntry, RequestStatus, Resolution};

/// Counts shown on status surfaces
#[derive(Debug, Clone, Serialize)]
pub struct DeskStats {
    pub knowledge_entries: usize,
    pub pending_requests: usize,
    pub resolved_requests: usize,
}

#[derive(Clone)]
pub struct HelpDesk {
    knowledge: KnowledgeStore,
    queue: EscalationQueue,
    resolver: Resolver,
}

impl HelpDesk {
    /// Assemble a desk from already-built parts
    pub fn new(knowledge: KnowledgeStore, queue: EscalationQueue, oracle: OracleAdapter) -> Self {
        let resolver = Resolver::new(knowledge.clone(), oracle, queue.clone());
        Self {
            knowledge,
            queue,
            resolver,
        }
    }

    /// Build a desk from configuration, opening SQLite unless `in_memory`
    pub async fn from_config(config: &Config, in_memory: bool) -> Result<Self> {
        let storage: SharedStorage = if in_memory {
            Arc::new(MemoryStore::new())
        } else {
            let path = config.storage.database_path()?;
            Arc::new(
                SqliteStore::open(&path)
                    .await
                    .with_context(|| format!("Failed to open database {}", path.display()))?,
            )
        };

        let oracle: Arc<dyn Oracle> = if config.oracle.enabled {
            let oracle = ChatCompletionOracle::from_config(&config.oracle)
                .context("Failed to build oracle client")?;
            if !oracle.has_api_key() {
                warn!(
                    "{} is not set; every unanswered question will be escalated",
                    config.oracle.api_key_env
                );
            }
            Arc::new(oracle)
        } else {
            Arc::new(NullOracle)
        };

        let mut queue = EscalationQueue::new(storage.clone()).with_notifier(Arc::new(LogNotifier));
        if let Some(url) = &config.escalation.webhook_url {
            queue = queue.with_notifier(Arc::new(WebhookNotifier::new(url.clone())));
        }

        let knowledge = KnowledgeStore::new(storage).with_match_mode(config.escalation.match_mode);
        info!("Knowledge matching: {:?}", knowledge.match_mode());
        let adapter = OracleAdapter::new(oracle, Duration::from_secs(config.oracle.timeout_secs));

        Ok(Self::new(knowledge, queue, adapter)
            .with_interim_message(config.escalation.interim_message.clone()))
    }

    /// Override what callers hear while a supervisor is consulted
    pub fn with_interim_message(mut self, message: impl Into<String>) -> Self {
        self.resolver = self.resolver.with_interim_message(message);
        self
    }

    /// Answer a caller's question, escalating when nobody automated knows
    pub async fn submit_question(&self, question: &str) -> DeskResult<Resolution> {
        if question.trim().is_empty() {
            return Err(DeskError::validation("question is required"));
        }
        Ok(self.resolver.answer(question).await?)
    }

    /// Pending help requests, oldest first
    pub async fn list_pending_requests(&self) -> DeskResult<Vec<HelpRequest>> {
        Ok(self.queue.list_pending().await?)
    }

    /// Help requests filtered by status; `None` lists all
    pub async fn list_requests(&self, status: Option<RequestStatus>) -> DeskResult<Vec<HelpRequest>> {
        let requests = match status {
            Some(status) => self.queue.list_by_status(status).await?,
            None => self.queue.list_all().await?,
        };
        Ok(requests)
    }

    pub async fn get_request(&self, id: &str) -> DeskResult<HelpRequest> {
        self.queue.get(id).await
    }

    /// Supervisor answers a help request; the answer becomes knowledge
    pub async fn submit_resolution(&self, request_id: &str, answer: &str) -> DeskResult<HelpRequest> {
        if request_id.trim().is_empty() {
            return Err(DeskError::validation("request id is required"));
        }
        let (request, _entry) = self.queue.resolve(request_id, answer).await?;
        Ok(request)
    }

    /// Everything the desk has learned, in insertion order
    pub async fn list_knowledge(&self) -> DeskResult<Vec<KnowledgeEntry>> {
        Ok(self.knowledge.all().await?)
    }

    /// Preload question/answer pairs. Blank pairs are skipped.
    pub async fn seed_knowledge<I>(&self, pairs: I) -> DeskResult<usize>
    where
        I: IntoIterator<Item = (String, String)>,
    {
        let mut added = 0;
        for (question, answer) in pairs {
            if question.trim().is_empty() || answer.trim().is_empty() {
                warn!("Skipping seed pair with blank question or answer: {:?}", question);
                continue;
            }
            self.knowledge.append(&question, answer.trim(), EntryOrigin::Seed).await?;
            added += 1;
        }
        info!("Seeded {} knowledge entries", added);
        Ok(added)
    }

    pub async fn stats(&self) -> DeskResult<DeskStats> {
        Ok(DeskStats {
            knowledge_entries: self.knowledge.all().await?.len(),
            pending_requests: self.queue.list_by_status(RequestStatus::Pending).await?.len(),
            resolved_requests: self.queue.list_by_status(RequestStatus::Resolved).await?.len(),
        })
    }
}
