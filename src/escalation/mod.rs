//! Escalation Queue - questions waiting on a human supervisor
//!
//! The queue owns every `HelpRequest`. Resolving one is the only way a
//! human answer reaches the knowledge base, and the storage backend performs
//! the status change and the knowledge append as one transaction.

pub mod notify;

use chrono::Utc;
use std::sync::Arc;
use tracing::{error, info, warn};

use crate::error::{DeskError, DeskResult, StoreResult};
use crate::knowledge::KnowledgeStore;
use crate::store::{ResolveOutcome, SharedStorage};
use crate::types::{EntryOrigin, HelpRequest, KnowledgeEntry, RequestStatus};

pub use notify::{LogNotifier, SupervisorNotifier, WebhookNotifier};

/// FIFO queue of help requests backed by shared storage
#[derive(Clone)]
pub struct EscalationQueue {
    storage: SharedStorage,
    notifiers: Vec<Arc<dyn SupervisorNotifier>>,
}

impl EscalationQueue {
    pub fn new(storage: SharedStorage) -> Self {
        Self {
            storage,
            notifiers: Vec::new(),
        }
    }

    /// Add a notifier that hears about every new request
    pub fn with_notifier(mut self, notifier: Arc<dyn SupervisorNotifier>) -> Self {
        self.notifiers.push(notifier);
        self
    }

    /// Queue a question for a supervisor. Accepts any text.
    pub async fn enqueue(&self, question: &str) -> StoreResult<HelpRequest> {
        let request = HelpRequest::pending(question);
        self.storage.insert_request(&request).await?;
        info!("Escalated question as help request {}: {}", request.id, question);

        for notifier in &self.notifiers {
            if let Err(e) = notifier.notify(&request).await {
                warn!("Notifier '{}' failed for request {}: {}", notifier.name(), request.id, e);
            }
        }

        Ok(request)
    }

    /// Pending requests, oldest first
    pub async fn list_pending(&self) -> StoreResult<Vec<HelpRequest>> {
        self.storage.list_requests(Some(RequestStatus::Pending)).await
    }

    /// Every request regardless of status, oldest first
    pub async fn list_all(&self) -> StoreResult<Vec<HelpRequest>> {
        self.storage.list_requests(None).await
    }

    pub async fn list_by_status(&self, status: RequestStatus) -> StoreResult<Vec<HelpRequest>> {
        self.storage.list_requests(Some(status)).await
    }

    pub async fn get(&self, id: &str) -> DeskResult<HelpRequest> {
        self.storage
            .get_request(id)
            .await?
            .ok_or_else(|| DeskError::NotFound { id: id.to_string() })
    }

    /// Record the supervisor's answer and teach it to the knowledge base
    ///
    /// Fails with `NotFound` or `AlreadyResolved` without writing anything.
    pub async fn resolve(&self, id: &str, answer: &str) -> DeskResult<(HelpRequest, KnowledgeEntry)> {
        let answer = answer.trim();
        if answer.is_empty() {
            return Err(DeskError::validation("answer text is required"));
        }

        // The stored question is needed to build the knowledge row; the
        // backend re-checks status inside its transaction.
        let request = self.get(id).await?;
        if !request.is_pending() {
            return Err(DeskError::AlreadyResolved { id: id.to_string() });
        }

        let knowledge = KnowledgeStore::new_entry(
            &request.question,
            answer,
            EntryOrigin::Supervisor,
            Some(request.id.clone()),
        );

        match self.storage.resolve_request(id, answer, Utc::now(), knowledge).await {
            Ok(ResolveOutcome::Resolved { request, entry }) => {
                info!(
                    "Help request {} resolved; learned knowledge entry {} for: {}",
                    request.id, entry.id, request.question
                );
                Ok((request, entry))
            }
            Ok(ResolveOutcome::AlreadyResolved(_)) => Err(DeskError::AlreadyResolved { id: id.to_string() }),
            Ok(ResolveOutcome::NotFound) => Err(DeskError::NotFound { id: id.to_string() }),
            Err(e) => {
                error!("Failed to resolve help request {}: {}", id, e);
                Err(e.into())
            }
        }
    }
}
