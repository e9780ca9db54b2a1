//! Frontdesk - Human-in-the-loop Question Answering Library
//!
//! A front desk assistant with:
//! - A knowledge base of confirmed question/answer pairs
//! - An AI oracle consulted when the knowledge base has no answer
//! - A supervisor escalation queue for everything else
//! - A feedback loop that turns supervisor answers into knowledge
//!
//! # Example
//!
//! ```ignore
//! use frontdesk::{Config, HelpDesk, Resolution};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let desk = HelpDesk::from_config(&Config::load()?, false).await?;
//!     match desk.submit_question("What are your hours?").await? {
//!         Resolution::Answered { text, .. } => println!("{}", text),
//!         Resolution::Escalated { request, message } => println!("{} ({})", message, request.id),
//!     }
//!     Ok(())
//! }
//! ```

// Core modules (order matters for cross-module dependencies)
pub mod types;
pub mod error;
pub mod store;
pub mod knowledge;
pub mod oracle;
pub mod escalation;
pub mod resolver;
pub mod desk;
pub mod config;

// Outer surfaces
pub mod server;
pub mod cli;

pub use config::Config;
pub use desk::{DeskStats, HelpDesk};
pub use error::{DeskError, DeskResult, StoreError};
pub use escalation::{EscalationQueue, SupervisorNotifier};
pub use knowledge::{normalize_question, KnowledgeStore, MatchMode};
pub use oracle::{Oracle, OracleAdapter, OracleError, OracleReply};
pub use resolver::Resolver;
pub use store::{MemoryStore, SqliteStore, Storage};
pub use types::{AnswerSource, EntryOrigin, HelpRequest, KnowledgeEntry, RequestStatus, Resolution};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Library name
pub const NAME: &str = env!("CARGO_PKG_NAME");

/// Get the library info
pub fn info() -> String {
    format!("{} v{} - Human-in-the-loop Front Desk", NAME, VERSION)
}
