//! SQLite-based persistent storage for knowledge and help requests

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension, Row, TransactionBehavior};
use std::path::Path;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::debug;

use super::{ResolveOutcome, Storage};
use crate::error::{StoreError, StoreResult};
use crate::types::{EntryOrigin, HelpRequest, KnowledgeEntry, NewKnowledge, RequestStatus};

const KNOWLEDGE_COLUMNS: &str = "id, question, answer, origin, request_id, created_at";
const REQUEST_COLUMNS: &str = "id, question, status, answer, created_at, resolved_at";

/// SQLite-backed store
pub struct SqliteStore {
    conn: Arc<Mutex<Connection>>,
}

impl SqliteStore {
    /// Open (or create) the database at the given path
    pub async fn open<P: AsRef<Path>>(path: P) -> StoreResult<Self> {
        let path = path.as_ref().to_path_buf();

        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                tokio::fs::create_dir_all(parent).await?;
            }
        }

        let conn = Connection::open(&path)?;
        conn.execute_batch("PRAGMA journal_mode=WAL; PRAGMA synchronous=NORMAL; PRAGMA busy_timeout=5000;")?;
        Self::init_schema(&conn)?;
        debug!("Opened knowledge database at {}", path.display());

        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    fn init_schema(conn: &Connection) -> StoreResult<()> {
        conn.execute_batch(r#"
            -- Confirmed question/answer pairs, append-only
            CREATE TABLE IF NOT EXISTS knowledge (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                question TEXT NOT NULL,
                question_key TEXT NOT NULL,
                answer TEXT NOT NULL,
                origin TEXT NOT NULL,
                request_id TEXT,
                created_at TEXT NOT NULL
            );

            -- Escalated questions; seq keeps FIFO order
            CREATE TABLE IF NOT EXISTS help_requests (
                seq INTEGER PRIMARY KEY AUTOINCREMENT,
                id TEXT NOT NULL UNIQUE,
                question TEXT NOT NULL,
                status TEXT NOT NULL DEFAULT 'pending',
                answer TEXT,
                created_at TEXT NOT NULL,
                resolved_at TEXT
            );

            CREATE INDEX IF NOT EXISTS idx_knowledge_key ON knowledge(question_key, id);
            CREATE INDEX IF NOT EXISTS idx_help_requests_status ON help_requests(status, seq);
        "#)?;

        Ok(())
    }

    fn insert_knowledge(conn: &Connection, entry: &NewKnowledge) -> StoreResult<KnowledgeEntry> {
        conn.execute(
            r#"INSERT INTO knowledge (question, question_key, answer, origin, request_id, created_at)
               VALUES (?1, ?2, ?3, ?4, ?5, ?6)"#,
            params![
                entry.question,
                entry.question_key,
                entry.answer,
                entry.origin.as_str(),
                entry.request_id,
                entry.created_at.to_rfc3339(),
            ],
        )?;

        Ok(KnowledgeEntry {
            id: conn.last_insert_rowid(),
            question: entry.question.clone(),
            answer: entry.answer.clone(),
            origin: entry.origin,
            request_id: entry.request_id.clone(),
            created_at: entry.created_at,
        })
    }

    fn load_request(conn: &Connection, id: &str) -> StoreResult<Option<HelpRequest>> {
        let raw = conn
            .query_row(
                &format!("SELECT {} FROM help_requests WHERE id = ?1", REQUEST_COLUMNS),
                params![id],
                RawRequest::from_row,
            )
            .optional()?;
        raw.map(RawRequest::into_request).transpose()
    }
}

#[async_trait]
impl Storage for SqliteStore {
    async fn append_knowledge(&self, entry: NewKnowledge) -> StoreResult<KnowledgeEntry> {
        let conn = self.conn.lock().await;
        Self::insert_knowledge(&conn, &entry)
    }

    async fn find_knowledge(&self, key: &str) -> StoreResult<Option<KnowledgeEntry>> {
        let conn = self.conn.lock().await;
        let raw = conn
            .query_row(
                &format!(
                    "SELECT {} FROM knowledge WHERE question_key = ?1 ORDER BY id ASC LIMIT 1",
                    KNOWLEDGE_COLUMNS
                ),
                params![key],
                RawKnowledge::from_row,
            )
            .optional()?;
        raw.map(RawKnowledge::into_entry).transpose()
    }

    async fn list_knowledge(&self) -> StoreResult<Vec<KnowledgeEntry>> {
        let conn = self.conn.lock().await;
        let mut stmt = conn.prepare_cached(&format!(
            "SELECT {} FROM knowledge ORDER BY id ASC",
            KNOWLEDGE_COLUMNS
        ))?;
        let rows = stmt.query_map([], RawKnowledge::from_row)?;

        let mut entries = Vec::new();
        for row in rows {
            entries.push(row?.into_entry()?);
        }
        Ok(entries)
    }

    async fn insert_request(&self, request: &HelpRequest) -> StoreResult<()> {
        let conn = self.conn.lock().await;
        conn.execute(
            r#"INSERT INTO help_requests (id, question, status, answer, created_at, resolved_at)
               VALUES (?1, ?2, ?3, ?4, ?5, ?6)"#,
            params![
                request.id,
                request.question,
                request.status.as_str(),
                request.answer,
                request.created_at.to_rfc3339(),
                request.resolved_at.map(|t| t.to_rfc3339()),
            ],
        )?;
        Ok(())
    }

    async fn get_request(&self, id: &str) -> StoreResult<Option<HelpRequest>> {
        let conn = self.conn.lock().await;
        Self::load_request(&conn, id)
    }

    async fn list_requests(&self, status: Option<RequestStatus>) -> StoreResult<Vec<HelpRequest>> {
        let conn = self.conn.lock().await;
        let mut requests = Vec::new();

        match status {
            Some(status) => {
                let mut stmt = conn.prepare_cached(&format!(
                    "SELECT {} FROM help_requests WHERE status = ?1 ORDER BY seq ASC",
                    REQUEST_COLUMNS
                ))?;
                for row in stmt.query_map(params![status.as_str()], RawRequest::from_row)? {
                    requests.push(row?.into_request()?);
                }
            }
            None => {
                let mut stmt = conn.prepare_cached(&format!(
                    "SELECT {} FROM help_requests ORDER BY seq ASC",
                    REQUEST_COLUMNS
                ))?;
                for row in stmt.query_map([], RawRequest::from_row)? {
                    requests.push(row?.into_request()?);
                }
            }
        }

        Ok(requests)
    }

    async fn resolve_request(
        &self,
        id: &str,
        answer: &str,
        resolved_at: DateTime<Utc>,
        knowledge: NewKnowledge,
    ) -> StoreResult<ResolveOutcome> {
        let mut conn = self.conn.lock().await;
        // IMMEDIATE holds the write lock from the status read through the update
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;

        let Some(mut request) = Self::load_request(&tx, id)? else {
            return Ok(ResolveOutcome::NotFound);
        };
        if !request.is_pending() {
            return Ok(ResolveOutcome::AlreadyResolved(request));
        }

        let updated = tx.execute(
            r#"UPDATE help_requests
               SET status = 'resolved', answer = ?2, resolved_at = ?3
               WHERE id = ?1 AND status = 'pending'"#,
            params![id, answer, resolved_at.to_rfc3339()],
        )?;
        if updated == 0 {
            return match Self::load_request(&tx, id)? {
                Some(current) => Ok(ResolveOutcome::AlreadyResolved(current)),
                None => Ok(ResolveOutcome::NotFound),
            };
        }

        let entry = Self::insert_knowledge(&tx, &knowledge)?;
        tx.commit()?;

        request.status = RequestStatus::Resolved;
        request.answer = Some(answer.to_string());
        request.resolved_at = Some(resolved_at);

        Ok(ResolveOutcome::Resolved { request, entry })
    }
}

/// Knowledge row as stored, before timestamp/enum decoding
struct RawKnowledge {
    id: i64,
    question: String,
    answer: String,
    origin: String,
    request_id: Option<String>,
    created_at: String,
}

impl RawKnowledge {
    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get(0)?,
            question: row.get(1)?,
            answer: row.get(2)?,
            origin: row.get(3)?,
            request_id: row.get(4)?,
            created_at: row.get(5)?,
        })
    }

    fn into_entry(self) -> StoreResult<KnowledgeEntry> {
        let origin = EntryOrigin::parse(&self.origin).ok_or_else(|| StoreError::Corrupt {
            table: "knowledge",
            reason: format!("unknown origin '{}'", self.origin),
        })?;

        Ok(KnowledgeEntry {
            id: self.id,
            question: self.question,
            answer: self.answer,
            origin,
            request_id: self.request_id,
            created_at: parse_timestamp("knowledge", &self.created_at)?,
        })
    }
}

/// Help request row as stored
struct RawRequest {
    id: String,
    question: String,
    status: String,
    answer: Option<String>,
    created_at: String,
    resolved_at: Option<String>,
}

impl RawRequest {
    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get(0)?,
            question: row.get(1)?,
            status: row.get(2)?,
            answer: row.get(3)?,
            created_at: row.get(4)?,
            resolved_at: row.get(5)?,
        })
    }

    fn into_request(self) -> StoreResult<HelpRequest> {
        let status = RequestStatus::parse(&self.status).ok_or_else(|| StoreError::Corrupt {
            table: "help_requests",
            reason: format!("unknown status '{}'", self.status),
        })?;
        let resolved_at = self
            .resolved_at
            .as_deref()
            .map(|t| parse_timestamp("help_requests", t))
            .transpose()?;

        Ok(HelpRequest {
            id: self.id,
            question: self.question,
            status,
            answer: self.answer,
            created_at: parse_timestamp("help_requests", &self.created_at)?,
            resolved_at,
        })
    }
}

fn parse_timestamp(table: &'static str, value: &str) -> StoreResult<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(value)
        .map(|d| d.with_timezone(&Utc))
        .map_err(|e| StoreError::Corrupt {
            table,
            reason: format!("bad timestamp '{}': {}", value, e),
        })
}
