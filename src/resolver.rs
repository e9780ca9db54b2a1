//! Resolver - decides how a question gets answered
//!
//! Order is fixed: knowledge base first, oracle second, supervisor last.
//! A confident oracle answer is written to the knowledge base before it is
//! returned, so the oracle is asked about a given question at most once.

use tracing::info;

use crate::error::StoreResult;
use crate::escalation::EscalationQueue;
use crate::knowledge::KnowledgeStore;
use crate::oracle::{OracleAdapter, OracleReply};
use crate::types::{AnswerSource, EntryOrigin, Resolution};

/// Message returned while a supervisor looks at an escalated question
pub const DEFAULT_INTERIM_MESSAGE: &str = "Let me check with my supervisor and get back to you.";

#[derive(Clone)]
pub struct Resolver {
    knowledge: KnowledgeStore,
    oracle: OracleAdapter,
    queue: EscalationQueue,
    interim_message: String,
}

impl Resolver {
    pub fn new(knowledge: KnowledgeStore, oracle: OracleAdapter, queue: EscalationQueue) -> Self {
        Self {
            knowledge,
            oracle,
            queue,
            interim_message: DEFAULT_INTERIM_MESSAGE.to_string(),
        }
    }

    pub fn with_interim_message(mut self, message: impl Into<String>) -> Self {
        self.interim_message = message.into();
        self
    }

    /// Answer from knowledge, then the oracle, else escalate
    pub async fn answer(&self, question: &str) -> StoreResult<Resolution> {
        if let Some(entry) = self.knowledge.lookup(question).await? {
            info!("Answered from knowledge entry {}: {}", entry.id, question);
            return Ok(Resolution::Answered {
                source: AnswerSource::Knowledge,
                text: entry.answer,
            });
        }

        let snapshot = self.knowledge.all().await?;
        match self.oracle.resolve(question, &snapshot).await {
            OracleReply::Answer(text) => {
                self.knowledge.append(question, &text, EntryOrigin::Oracle).await?;
                Ok(Resolution::Answered {
                    source: AnswerSource::Oracle,
                    text,
                })
            }
            OracleReply::Unknown => {
                let request = self.queue.enqueue(question).await?;
                Ok(Resolution::Escalated {
                    request,
                    message: self.interim_message.clone(),
                })
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::oracle::{MockOracle, OracleError};
    use crate::store::{MemoryStore, SharedStorage};
    use std::sync::Arc;
    use std::time::Duration;

    fn resolver(mock: MockOracle) -> (Resolver, KnowledgeStore, EscalationQueue) {
        let storage: SharedStorage = Arc::new(MemoryStore::new());
        let knowledge = KnowledgeStore::new(storage.clone());
        let queue = EscalationQueue::new(storage);
        let oracle = OracleAdapter::new(Arc::new(mock), Duration::from_secs(1));
        (
            Resolver::new(knowledge.clone(), oracle, queue.clone()),
            knowledge,
            queue,
        )
    }

    fn mock() -> MockOracle {
        let mut mock = MockOracle::new();
        mock.expect_name().return_const("mock");
        mock
    }

    #[tokio::test]
    async fn test_knowledge_hit_skips_oracle() {
        let mut oracle = mock();
        oracle.expect_query().times(0);
        let (resolver, knowledge, _) = resolver(oracle);
        knowledge.append("Where are you located?", "12 Main St", EntryOrigin::Seed).await.unwrap();

        for _ in 0..3 {
            let res = resolver.answer("where are you located?").await.unwrap();
            assert_eq!(
                res,
                Resolution::Answered {
                    source: AnswerSource::Knowledge,
                    text: "12 Main St".to_string()
                }
            );
        }
    }

    #[tokio::test]
    async fn test_oracle_answer_is_learned_and_asked_once() {
        let mut oracle = mock();
        oracle
            .expect_query()
            .withf(|question, _context| question.contains("curly hair"))
            .times(1)
            .returning(|_, _| Ok("Yes, our stylists specialise in curls.".to_string()));
        let (resolver, knowledge, queue) = resolver(oracle);

        let first = resolver.answer("Do you cut curly hair?").await.unwrap();
        assert_eq!(
            first,
            Resolution::Answered {
                source: AnswerSource::Oracle,
                text: "Yes, our stylists specialise in curls.".to_string()
            }
        );

        let second = resolver.answer("Do you cut curly hair?").await.unwrap();
        assert_eq!(second.answer(), Some("Yes, our stylists specialise in curls."));
        assert!(matches!(second, Resolution::Answered { source: AnswerSource::Knowledge, .. }));

        let entries = knowledge.all().await.unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].origin, EntryOrigin::Oracle);
        assert!(queue.list_pending().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_oracle_receives_knowledge_snapshot() {
        let mut oracle = mock();
        oracle
            .expect_query()
            .withf(|_, context| context.len() == 1 && context[0].question == "Do you take cards?")
            .times(1)
            .returning(|_, _| Ok("unknown".to_string()));
        let (resolver, knowledge, _) = resolver(oracle);
        knowledge.append("Do you take cards?", "Yes", EntryOrigin::Seed).await.unwrap();

        let res = resolver.answer("Do you take cheques?").await.unwrap();
        assert!(res.is_escalated());
    }

    #[tokio::test]
    async fn test_failure_escalates_with_interim_message() {
        let mut oracle = mock();
        oracle
            .expect_query()
            .returning(|_, _| Err(OracleError::Malformed("garbage".to_string())));
        let (resolver, knowledge, queue) = resolver(oracle);
        let resolver = resolver.with_interim_message("One moment please.");

        match resolver.answer("Do you sell shampoo?").await.unwrap() {
            Resolution::Escalated { request, message } => {
                assert_eq!(message, "One moment please.");
                assert_eq!(request.question, "Do you sell shampoo?");
                let pending = queue.list_pending().await.unwrap();
                assert_eq!(pending.len(), 1);
                assert_eq!(pending[0].id, request.id);
            }
            other => panic!("expected escalation, got {:?}", other),
        }
        assert!(knowledge.all().await.unwrap().is_empty());
    }
}
