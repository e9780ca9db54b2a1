//! In-process storage backend

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::Mutex;

use super::{ResolveOutcome, Storage};
use crate::error::StoreResult;
use crate::types::{HelpRequest, KnowledgeEntry, NewKnowledge, RequestStatus};

#[derive(Default)]
struct Collections {
    knowledge: Vec<(String, KnowledgeEntry)>,
    requests: Vec<HelpRequest>,
    next_id: i64,
}

impl Collections {
    fn push_knowledge(&mut self, entry: NewKnowledge) -> KnowledgeEntry {
        self.next_id += 1;
        let stored = KnowledgeEntry {
            id: self.next_id,
            question: entry.question,
            answer: entry.answer,
            origin: entry.origin,
            request_id: entry.request_id,
            created_at: entry.created_at,
        };
        self.knowledge.push((entry.question_key, stored.clone()));
        stored
    }
}

/// Storage kept entirely in memory. Lost when dropped.
#[derive(Default)]
pub struct MemoryStore {
    inner: Mutex<Collections>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl Storage for MemoryStore {
    async fn append_knowledge(&self, entry: NewKnowledge) -> StoreResult<KnowledgeEntry> {
        let mut inner = self.inner.lock().await;
        Ok(inner.push_knowledge(entry))
    }

    async fn find_knowledge(&self, key: &str) -> StoreResult<Option<KnowledgeEntry>> {
        let inner = self.inner.lock().await;
        Ok(inner
            .knowledge
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, entry)| entry.clone()))
    }

    async fn list_knowledge(&self) -> StoreResult<Vec<KnowledgeEntry>> {
        let inner = self.inner.lock().await;
        Ok(inner.knowledge.iter().map(|(_, e)| e.clone()).collect())
    }

    async fn insert_request(&self, request: &HelpRequest) -> StoreResult<()> {
        let mut inner = self.inner.lock().await;
        inner.requests.push(request.clone());
        Ok(())
    }

    async fn get_request(&self, id: &str) -> StoreResult<Option<HelpRequest>> {
        let inner = self.inner.lock().await;
        Ok(inner.requests.iter().find(|r| r.id == id).cloned())
    }

    async fn list_requests(&self, status: Option<RequestStatus>) -> StoreResult<Vec<HelpRequest>> {
        let inner = self.inner.lock().await;
        Ok(inner
            .requests
            .iter()
            .filter(|r| status.map_or(true, |s| r.status == s))
            .cloned()
            .collect())
    }

    async fn resolve_request(
        &self,
        id: &str,
        answer: &str,
        resolved_at: DateTime<Utc>,
        knowledge: NewKnowledge,
    ) -> StoreResult<ResolveOutcome> {
        // One lock for the check, the transition and the append
        let mut inner = self.inner.lock().await;

        let Some(idx) = inner.requests.iter().position(|r| r.id == id) else {
            return Ok(ResolveOutcome::NotFound);
        };
        if !inner.requests[idx].is_pending() {
            return Ok(ResolveOutcome::AlreadyResolved(inner.requests[idx].clone()));
        }

        let entry = inner.push_knowledge(knowledge);
        let request = &mut inner.requests[idx];
        request.status = RequestStatus::Resolved;
        request.answer = Some(answer.to_string());
        request.resolved_at = Some(resolved_at);

        Ok(ResolveOutcome::Resolved {
            request: request.clone(),
            entry,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::EntryOrigin;

    fn seed(question: &str, key: &str, answer: &str) -> NewKnowledge {
        NewKnowledge {
            question: question.to_string(),
            question_key: key.to_string(),
            answer: answer.to_string(),
            origin: EntryOrigin::Seed,
            request_id: None,
            created_at: Utc::now(),
        }
    }

    #[tokio::test]
    async fn test_find_returns_earliest_match() {
        let store = MemoryStore::new();
        store.append_knowledge(seed("Hours?", "hours?", "9-5")).await.unwrap();
        store.append_knowledge(seed("HOURS?", "hours?", "10-6")).await.unwrap();

        let found = store.find_knowledge("hours?").await.unwrap().unwrap();
        assert_eq!(found.answer, "9-5");
        assert_eq!(found.id, 1);
        assert_eq!(store.list_knowledge().await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_resolve_transitions_once() {
        let store = MemoryStore::new();
        let request = HelpRequest::pending("Do you sell gift cards?");
        store.insert_request(&request).await.unwrap();

        let mut knowledge = seed(&request.question, "do you sell gift cards?", "Yes");
        knowledge.origin = EntryOrigin::Supervisor;
        knowledge.request_id = Some(request.id.clone());

        let first = store
            .resolve_request(&request.id, "Yes", Utc::now(), knowledge.clone())
            .await
            .unwrap();
        assert!(matches!(first, ResolveOutcome::Resolved { .. }));

        let second = store
            .resolve_request(&request.id, "No", Utc::now(), knowledge)
            .await
            .unwrap();
        match second {
            ResolveOutcome::AlreadyResolved(r) => assert_eq!(r.answer.as_deref(), Some("Yes")),
            other => panic!("expected AlreadyResolved, got {:?}", other),
        }
        assert_eq!(store.list_knowledge().await.unwrap().len(), 1);
        assert!(store
            .list_requests(Some(RequestStatus::Pending))
            .await
            .unwrap()
            .is_empty());
    }

    #[tokio::test]
    async fn test_resolve_unknown_id() {
        let store = MemoryStore::new();
        let outcome = store
            .resolve_request("missing", "x", Utc::now(), seed("q", "q", "x"))
            .await
            .unwrap();
        assert!(matches!(outcome, ResolveOutcome::NotFound));
        assert!(store.list_knowledge().await.unwrap().is_empty());
    }
}
