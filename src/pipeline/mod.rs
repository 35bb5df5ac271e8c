//! Governance Pipeline Module
//!
//! Per-file processing and bounded-parallel directory runs:
//!
//! 1. **Client**: stage sequencing, error logging and worker dispatch
//! 2. **Batch**: single-owner aggregation of per-file outcomes
//! 3. **Narrator**: optional side channel describing each file's processing
//! 4. **Types**: outcomes, batch results and persisted error records

pub mod batch;
pub mod client;
pub mod narrator;
pub mod types;

pub use client::GovernanceClient;
pub use narrator::{LogNarrator, Narrator, NoopNarrator};
pub use types::{BatchResult, ErrorLogEntry, FileDetail, FileOutcome, FileSuccess, RunState};
