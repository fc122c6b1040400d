//! Session domain module.
//!
//! This module contains the conversation model, the repository interface for
//! persisting it, and the store that manages the active session.
//!
//! # Module Structure
//!
//! - `message`: Conversation message types (`MessageRole`, `ConversationMessage`)
//! - `model`: Session document (`Session`, `SessionMetadata`)
//! - `naming`: File naming rules (sanitization, backup/export names)
//! - `search`: Message filtering (`SearchOptions`)
//! - `analytics`: Aggregate statistics (`ConversationAnalytics`)
//! - `export`: Export rendering (`ExportFormat`)
//! - `repository`: Repository trait for session persistence
//! - `store`: The active session (`SessionStore`, `SaveState`)
//! - `autosave`: Exit-time save hook (`AutosaveController`)
//!
//! # Usage
//!
//! ```ignore
//! use chatkeep_core::session::{SessionStore, AutosaveController, MessageRole};
//!
//! let mut store = SessionStore::new(repository);
//! store.add_message(MessageRole::User, "hello");
//! store.save("greetings").await?;
//! ```

mod analytics;
mod autosave;
mod export;
mod message;
mod model;
pub mod naming;
mod repository;
mod search;
mod store;

#[cfg(test)]
mod test_support;

// Re-export public API
pub use analytics::ConversationAnalytics;
pub use autosave::AutosaveController;
pub use export::{ExportFormat, render_export};
pub use message::{ConversationMessage, MessageRole};
pub use model::{Session, SessionMetadata};
pub use naming::sanitize_session_name;
pub use repository::{BackupSummary, SessionRepository, SessionSummary};
pub use search::{SearchOptions, search_messages};
pub use store::{SaveState, SessionStore};
