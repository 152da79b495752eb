use std::{
    fs::File,
    io::BufReader,
    path::{Path, PathBuf},
};

use crate::foundation::error::{WorkError, WorkResult};

/// Options for the coalescing engine.
#[derive(Clone, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct EngineOpts {
    /// Fixed starting value for the version token. `None` starts from the wall clock.
    pub initial_version: Option<u64>,
    /// Buffered derived-change events per subscriber before slow subscribers lag.
    pub change_capacity: usize,
}

impl Default for EngineOpts {
    fn default() -> Self {
        Self {
            initial_version: None,
            change_capacity: 64,
        }
    }
}

impl EngineOpts {
    /// Reject settings the engine cannot run with.
    pub fn validate(&self) -> WorkResult<()> {
        if self.change_capacity == 0 {
            return Err(WorkError::validation("change_capacity must be > 0"));
        }
        Ok(())
    }
}

/// Layout of a file-backed photo library.
#[derive(Clone, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct LibraryConfig {
    /// Directory relative resource paths are resolved against.
    pub root: PathBuf,
    /// Per-directory sidecar holding the edit states of that directory's masters.
    pub sidecar_name: String,
    /// Library-level index of primary fields, stored under `root`.
    pub fields_name: String,
    /// Where rendered thumbnails live. Defaults to `<root>/.thumbnails`.
    pub thumbnail_dir: Option<PathBuf>,
    /// URL prefix thumbnails are served under.
    pub thumbnail_base_url: String,
}

impl Default for LibraryConfig {
    fn default() -> Self {
        Self {
            root: PathBuf::from("."),
            sidecar_name: ".photowork.json".to_string(),
            fields_name: ".photowork-fields.json".to_string(),
            thumbnail_dir: None,
            thumbnail_base_url: "thumbnails".to_string(),
        }
    }
}

impl LibraryConfig {
    /// Library rooted at `root` with default file names.
    pub fn at(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            ..Self::default()
        }
    }

    /// Resolved thumbnail directory.
    pub fn thumbnail_dir(&self) -> PathBuf {
        self.thumbnail_dir
            .clone()
            .unwrap_or_else(|| self.root.join(".thumbnails"))
    }

    /// Path of the primary-field index.
    pub fn fields_path(&self) -> PathBuf {
        self.root.join(&self.fields_name)
    }

    /// Reject file names that would escape their directory.
    pub fn validate(&self) -> WorkResult<()> {
        for (what, name) in [
            ("sidecar_name", &self.sidecar_name),
            ("fields_name", &self.fields_name),
        ] {
            if name.is_empty() || name.contains(['/', '\\']) || name == "." || name == ".." {
                return Err(WorkError::validation(format!(
                    "{what} must be a plain file name, got '{name}'"
                )));
            }
        }
        if self.sidecar_name == self.fields_name {
            return Err(WorkError::validation("sidecar_name and fields_name must differ"));
        }
        Ok(())
    }
}

/// Top-level configuration file.
#[derive(Clone, Debug, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct PhotoworkConfig {
    /// Engine options.
    pub engine: EngineOpts,
    /// File-backed library layout.
    pub library: LibraryConfig,
}

impl PhotoworkConfig {
    /// Load and validate a JSON config file.
    pub fn load_json(path: &Path) -> WorkResult<Self> {
        let f = File::open(path)
            .map_err(|e| WorkError::io(format!("open config '{}': {e}", path.display())))?;
        let cfg: Self = serde_json::from_reader(BufReader::new(f))
            .map_err(|e| WorkError::serde(format!("parse config '{}': {e}", path.display())))?;
        cfg.validate()?;
        Ok(cfg)
    }

    /// Validate every section.
    pub fn validate(&self) -> WorkResult<()> {
        self.engine.validate()?;
        self.library.validate()
    }
}

#[cfg(test)]
#[path = "../tests/unit/config.rs"]
mod tests;
