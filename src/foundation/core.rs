use std::{fmt, path::Path, str::FromStr};

use crate::foundation::error::{WorkError, WorkResult};

pub use kurbo::Rect;

/// Opaque key identifying a resource's backing storage location (its master file path).
///
/// Separators are normalized to `/`. The value is only ever compared and hashed; it is never
/// interpreted as an index.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, serde::Serialize, serde::Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ResourceRef(String);

impl ResourceRef {
    /// Create a key from a master path.
    pub fn new(path: impl Into<String>) -> WorkResult<Self> {
        let path = path.into().replace('\\', "/");
        if path.trim().is_empty() {
            return Err(WorkError::validation("resource path must be non-empty"));
        }
        if path.ends_with('/') {
            return Err(WorkError::validation("resource path must name a file, not a directory"));
        }
        Ok(Self(path))
    }

    /// Create a key from a master directory and the file name inside it.
    pub fn from_master(dir: impl AsRef<Path>, file_name: &str) -> WorkResult<Self> {
        if file_name.is_empty() || file_name.contains(['/', '\\']) {
            return Err(WorkError::validation("master file name must be a single path segment"));
        }
        let dir = dir.as_ref().to_string_lossy().replace('\\', "/");
        let dir = dir.trim_end_matches('/');
        if dir.is_empty() {
            return Self::new(file_name);
        }
        Self::new(format!("{dir}/{file_name}"))
    }

    /// Normalized path string.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Path view of the key.
    pub fn as_path(&self) -> &Path {
        Path::new(&self.0)
    }

    /// Directory part of the master path, if any. A master directly under `/` yields `"/"`.
    pub fn master_dir(&self) -> Option<&str> {
        self.0
            .rsplit_once('/')
            .map(|(dir, _)| if dir.is_empty() { "/" } else { dir })
    }

    /// File name part of the master path.
    pub fn file_name(&self) -> &str {
        self.0.rsplit_once('/').map_or(self.0.as_str(), |(_, f)| f)
    }
}

impl fmt::Display for ResourceRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for ResourceRef {
    type Err = WorkError;

    fn from_str(s: &str) -> WorkResult<Self> {
        Self::new(s)
    }
}

impl TryFrom<String> for ResourceRef {
    type Error = WorkError;

    fn try_from(value: String) -> WorkResult<Self> {
        Self::new(value)
    }
}

impl From<ResourceRef> for String {
    fn from(value: ResourceRef) -> Self {
        value.0
    }
}

#[cfg(test)]
#[path = "../../tests/unit/foundation/core.rs"]
mod tests;
