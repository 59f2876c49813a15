//! Warden Engine - rule-based scoring against cached threat feeds
//!
//! Two scoring strategies live here, deliberately kept separate:
//! - Short-circuit tiered classifiers for URLs and files (first tier wins)
//! - An additive weighted accumulator for email bodies (every match counts)
//!
//! The engine consumes persistence through narrow async traits
//! ([`HistoryStore`], [`GraphStore`]); it never owns connections or schema.
//! Classification is computed first and persisted second: a store failure is
//! logged, not propagated, and never changes the returned verdict.

pub mod email;
pub mod engine;
pub mod file;
pub mod graph;
pub mod memory;
pub mod traits;
pub mod url;

pub use engine::ScoringEngine;
pub use graph::GraphService;
pub use memory::{MemoryGraphStore, MemoryHistoryStore};
pub use traits::{GraphStore, HistoryStore, StoreError};
