//! Storage Module
//!
//! Uniform load/save of tabular datasets against a key-value object store:
//! - Object paths (`{base}/{leaf}` composition)
//! - The backend contract (`ObjectStore`) with in-memory and filesystem backends
//! - Suffix-driven format codecs (CSV, JSON, JSONL, Parquet)
//! - The `StorageAdapter` that ties them together

pub mod adapter;
pub mod formats;
pub mod fs;
pub mod memory;
pub mod path;
pub mod store;

pub use adapter::StorageAdapter;
pub use formats::DataFormat;
pub use fs::FsStore;
pub use memory::MemoryStore;
pub use path::ObjectPath;
pub use store::{ObjectEntry, ObjectStore, StoreError};
