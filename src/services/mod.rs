//! Services - business logic and state management
//!
//! This module contains the core business logic services:
//! - `engine` - Central event loop coordinating merges, relevance, dispatch
//! - `alert_store` - Merged alert working set with atomic snapshots
//! - `proximity` - Relevant-alert computation
//! - `dispatcher` - At-most-once notification delivery
//! - `report` - Symptom report validation and submission

pub mod alert_store;
pub mod dispatcher;
pub mod engine;
pub mod proximity;
pub mod report;

// Re-export commonly used types
pub use alert_store::AlertStore;
pub use dispatcher::NotificationDispatcher;
pub use engine::{AlertEngine, EngineEvent};
pub use report::{ReportError, ReportIngestion};
