//! Knowledge Store - confirmed question/answer pairs
//!
//! Entries are append-only. A lookup resolves to the earliest entry whose
//! normalised question matches, so a later answer to the same question never
//! shadows the first one.

use chrono::Utc;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::error::StoreResult;
use crate::store::SharedStorage;
use crate::types::{EntryOrigin, KnowledgeEntry, NewKnowledge};

/// How an incoming question is compared with stored questions
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MatchMode {
    /// Normalised equality
    #[default]
    Exact,
    /// Incoming question contains a stored question. Looser: a short stored
    /// question such as "hours" will also answer "what are your parking hours".
    Contains,
}

/// Lowercase, trim and collapse internal whitespace runs to one space
pub fn normalize_question(question: &str) -> String {
    question
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase()
}

/// Read/append access to the knowledge base
#[derive(Clone)]
pub struct KnowledgeStore {
    storage: SharedStorage,
    mode: MatchMode,
}

impl KnowledgeStore {
    pub fn new(storage: SharedStorage) -> Self {
        Self {
            storage,
            mode: MatchMode::Exact,
        }
    }

    pub fn with_match_mode(mut self, mode: MatchMode) -> Self {
        self.mode = mode;
        self
    }

    pub fn match_mode(&self) -> MatchMode {
        self.mode
    }

    /// Find the first stored answer for this question. Pure read.
    pub async fn lookup(&self, question: &str) -> StoreResult<Option<KnowledgeEntry>> {
        let key = normalize_question(question);
        if key.is_empty() {
            return Ok(None);
        }

        let found = match self.mode {
            MatchMode::Exact => self.storage.find_knowledge(&key).await?,
            MatchMode::Contains => self
                .storage
                .list_knowledge()
                .await?
                .into_iter()
                .find(|entry| {
                    let stored = normalize_question(&entry.question);
                    !stored.is_empty() && key.contains(&stored)
                }),
        };

        match &found {
            Some(entry) => debug!("Knowledge hit for '{}' (entry {})", key, entry.id),
            None => debug!("Knowledge miss for '{}'", key),
        }
        Ok(found)
    }

    /// Record a new question/answer pair stamped with the current time
    pub async fn append(
        &self,
        question: &str,
        answer: &str,
        origin: EntryOrigin,
    ) -> StoreResult<KnowledgeEntry> {
        let entry = self
            .storage
            .append_knowledge(Self::new_entry(question, answer, origin, None))
            .await?;
        info!("Learned answer {} ({}) for: {}", entry.id, origin, question);
        Ok(entry)
    }

    /// All entries in insertion order
    pub async fn all(&self) -> StoreResult<Vec<KnowledgeEntry>> {
        self.storage.list_knowledge().await
    }

    /// Build the record the store persists for a pair
    pub(crate) fn new_entry(
        question: &str,
        answer: &str,
        origin: EntryOrigin,
        request_id: Option<String>,
    ) -> NewKnowledge {
        NewKnowledge {
            question: question.to_string(),
            question_key: normalize_question(question),
            answer: answer.to_string(),
            origin,
            request_id,
            created_at: Utc::now(),
        }
    }
}
