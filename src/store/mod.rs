//! Durable storage for knowledge entries and help requests
//!
//! Provides:
//! - The `Storage` trait the desk is written against
//! - `MemoryStore` for tests and throwaway sessions
//! - `SqliteStore` for persistence across restarts
//!
//! Resolving a help request and recording its answer as knowledge is one
//! operation on the trait (`resolve_request`), so a backend either does both
//! writes or neither.

pub mod memory;
pub mod sqlite;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::sync::Arc;

use crate::error::StoreResult;
use crate::types::{HelpRequest, KnowledgeEntry, NewKnowledge, RequestStatus};

pub use memory::MemoryStore;
pub use sqlite::SqliteStore;

/// Result of an attempted resolution
#[derive(Debug, Clone)]
pub enum ResolveOutcome {
    /// The request moved to resolved and its answer became knowledge
    Resolved {
        request: HelpRequest,
        entry: KnowledgeEntry,
    },
    NotFound,
    /// Already resolved earlier; nothing was written
    AlreadyResolved(HelpRequest),
}

/// Backend for the two collections the desk owns
#[async_trait]
pub trait Storage: Send + Sync {
    /// Append a knowledge entry, assigning the next insertion id
    async fn append_knowledge(&self, entry: NewKnowledge) -> StoreResult<KnowledgeEntry>;

    /// Earliest entry whose normalised question equals `key`
    async fn find_knowledge(&self, key: &str) -> StoreResult<Option<KnowledgeEntry>>;

    /// All knowledge in insertion order
    async fn list_knowledge(&self) -> StoreResult<Vec<KnowledgeEntry>>;

    async fn insert_request(&self, request: &HelpRequest) -> StoreResult<()>;

    async fn get_request(&self, id: &str) -> StoreResult<Option<HelpRequest>>;

    /// Requests in insertion order, optionally filtered by status
    async fn list_requests(&self, status: Option<RequestStatus>) -> StoreResult<Vec<HelpRequest>>;

    /// Atomically mark a pending request resolved and append `knowledge`
    ///
    /// `knowledge.request_id` must name `id`. Must not write anything unless
    /// both the status transition and the append succeed.
    async fn resolve_request(
        &self,
        id: &str,
        answer: &str,
        resolved_at: DateTime<Utc>,
        knowledge: NewKnowledge,
    ) -> StoreResult<ResolveOutcome>;
}

pub type SharedStorage = Arc<dyn Storage>;
