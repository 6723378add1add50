//! Durable storage for the client's session record.
//!
//! The record is a tiny scoped key-value document (`user_id` plus the
//! server-assigned `session_id`) read once at startup and rewritten on
//! every session mutation. This crate owns the record schema and its
//! file-backed store; it knows nothing about transcripts or transport.

mod error;
mod schema;
mod store;

pub use error::SessionStoreError;
pub use schema::{ChatSession, SCHEMA_VERSION};
pub use store::SessionStore;
