//! DataGov Pipeline
//!
//! Batch data-governance over an object store: every raw tabular file is
//! loaded, its sensitive columns anonymized, its numeric gaps imputed, and
//! the result written back alongside an HTML quality report.

pub mod config;
pub mod dataset;
pub mod engine;
pub mod error;
pub mod models;
pub mod pipeline;
pub mod routes;
pub mod state;
pub mod storage;

pub use error::{PipelineError, PipelineResult};
pub use pipeline::GovernanceClient;
