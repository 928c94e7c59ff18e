// ============================================================================
// Race Tracker Library
// ============================================================================

pub mod api;
pub mod config;
pub mod core;
pub mod partition;
pub mod storage;
pub mod tracker;
pub mod validation;
pub mod web;

// Re-export main types for convenience
pub use config::AppConfig;
pub use crate::core::{ErrorKind, Event, RaceError, Result, Runner, Version};
pub use storage::{DocumentStore, InMemoryDocumentStore, StoreError};
pub use tracker::RaceTracker;
pub use web::{AppState, build_router};
