//! Logical object paths

use serde::{Deserialize, Serialize};
use std::fmt;

/// `{base}/{leaf}` identifier inside a container
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ObjectPath(String);

impl ObjectPath {
    /// Join a base segment and a leaf name.
    ///
    /// Trailing slashes are stripped from `base` and leading slashes from
    /// `leaf`; the separator is always present so the result is never empty.
    pub fn join(base: &str, leaf: &str) -> Self {
        Self(format!(
            "{}/{}",
            base.trim_end_matches('/'),
            leaf.trim_start_matches('/')
        ))
    }

    /// Wrap a key that is already fully composed (e.g. returned by a listing)
    pub fn from_key(key: impl Into<String>) -> Self {
        Self(key.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Last path segment
    pub fn file_name(&self) -> &str {
        self.0.rsplit('/').next().unwrap_or(&self.0)
    }

    /// Suffix after the last `.` of the file name, lowercased
    pub fn extension(&self) -> Option<String> {
        let name = self.file_name();
        let (stem, ext) = name.rsplit_once('.')?;
        if stem.is_empty() || ext.is_empty() {
            return None;
        }
        Some(ext.to_ascii_lowercase())
    }
}

impl fmt::Display for ObjectPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for ObjectPath {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl From<ObjectPath> for String {
    fn from(path: ObjectPath) -> Self {
        path.0
    }
}
