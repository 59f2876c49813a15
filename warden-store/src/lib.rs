//! Warden Store - concrete persistence adapters
//!
//! Implements the engine's store contracts:
//! - [`SqliteHistoryStore`]: verdict history, download log, and site action
//!   audit trail in an embedded SQLite database
//! - [`Neo4jGraphStore`]: flagged-website graph with MERGE upserts and
//!   ranked Cypher queries
//!
//! Both adapters own their connection lifecycle; the engine only calls the
//! trait operations.

pub mod graph;
pub mod history;

pub use graph::Neo4jGraphStore;
pub use history::SqliteHistoryStore;
