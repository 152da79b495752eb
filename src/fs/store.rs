use std::{
    collections::BTreeMap,
    io::ErrorKind,
    path::{Path, PathBuf},
};

use async_trait::async_trait;
use serde::{Serialize, de::DeserializeOwned};
use tokio::sync::Mutex;

use crate::{
    config::LibraryConfig,
    foundation::{
        core::ResourceRef,
        error::{WorkError, WorkResult},
    },
    gateway::PersistenceGateway,
    work::{
        fields::{FieldUpdate, PrimaryFields},
        state::EditState,
    },
};

/// Edit states of one directory, keyed by master file name.
type Sidecar = BTreeMap<String, EditState>;

/// Primary fields of the whole library, keyed by resource path.
type FieldIndex = BTreeMap<String, PrimaryFields>;

/// JSON-file-backed [`PersistenceGateway`].
///
/// Edit states live in a sidecar file next to their masters (one per directory); primary
/// fields live in a single index under the library root. All writes go through one lock and
/// replace files atomically.
pub struct FsWorkStore {
    config: LibraryConfig,
    write_lock: Mutex<()>,
}

impl FsWorkStore {
    /// Store over the library described by `config`.
    pub fn new(config: LibraryConfig) -> WorkResult<Self> {
        config.validate()?;
        Ok(Self {
            config,
            write_lock: Mutex::new(()),
        })
    }

    /// Absolute-or-root-relative location of a resource's master file.
    pub fn master_path(&self, resource: &ResourceRef) -> PathBuf {
        let p = resource.as_path();
        if p.is_absolute() {
            p.to_path_buf()
        } else {
            self.config.root.join(p)
        }
    }

    /// Sidecar file holding `resource`'s edit state.
    pub fn sidecar_path(&self, resource: &ResourceRef) -> PathBuf {
        let dir = match resource.master_dir() {
            Some(dir) => self.config.root.join(dir),
            None => self.config.root.clone(),
        };
        dir.join(&self.config.sidecar_name)
    }

    /// Stored primary fields of `resource`.
    pub async fn primary_fields(&self, resource: &ResourceRef) -> WorkResult<PrimaryFields> {
        let index: FieldIndex = read_json(&self.config.fields_path()).await?;
        Ok(index.get(resource.as_str()).copied().unwrap_or_default())
    }
}

#[async_trait]
impl PersistenceGateway for FsWorkStore {
    async fn fetch(&self, resource: &ResourceRef) -> WorkResult<EditState> {
        let master = self.master_path(resource);
        let exists = tokio::fs::try_exists(&master)
            .await
            .map_err(|e| WorkError::io(format!("stat '{}': {e}", master.display())))?;
        if !exists {
            return Err(WorkError::not_found(format!(
                "master file '{}' does not exist",
                master.display()
            )));
        }

        let sidecar: Sidecar = read_json(&self.sidecar_path(resource)).await?;
        Ok(sidecar
            .get(resource.file_name())
            .cloned()
            .unwrap_or_default())
    }

    async fn store(&self, resource: &ResourceRef, state: &EditState) -> WorkResult<()> {
        let _write = self.write_lock.lock().await;
        let path = self.sidecar_path(resource);
        let mut sidecar: Sidecar = read_json(&path).await?;

        let name = resource.file_name().to_string();
        if state.is_untouched() {
            sidecar.remove(&name);
        } else {
            sidecar.insert(name, state.clone());
        }

        if sidecar.is_empty() {
            return remove_if_present(&path).await;
        }
        write_json_atomic(&path, &sidecar).await
    }

    async fn update_fields(
        &self,
        resources: &[ResourceRef],
        update: &FieldUpdate,
    ) -> WorkResult<()> {
        let _write = self.write_lock.lock().await;
        let path = self.config.fields_path();
        let mut index: FieldIndex = read_json(&path).await?;
        for r in resources {
            update.apply_to(index.entry(r.as_str().to_string()).or_default());
        }
        write_json_atomic(&path, &index).await
    }
}

async fn read_json<T: DeserializeOwned + Default>(path: &Path) -> WorkResult<T> {
    let bytes = match tokio::fs::read(path).await {
        Ok(bytes) => bytes,
        Err(e) if e.kind() == ErrorKind::NotFound => return Ok(T::default()),
        Err(e) => return Err(WorkError::io(format!("read '{}': {e}", path.display()))),
    };
    serde_json::from_slice(&bytes)
        .map_err(|e| WorkError::serde(format!("parse '{}': {e}", path.display())))
}

async fn write_json_atomic<T: Serialize>(path: &Path, value: &T) -> WorkResult<()> {
    let json = serde_json::to_vec_pretty(value)
        .map_err(|e| WorkError::serde(format!("encode '{}': {e}", path.display())))?;

    if let Some(parent) = path.parent() {
        tokio::fs::create_dir_all(parent)
            .await
            .map_err(|e| WorkError::io(format!("create dir '{}': {e}", parent.display())))?;
    }

    let tmp = path.with_extension("json.tmp");
    tokio::fs::write(&tmp, &json)
        .await
        .map_err(|e| WorkError::io(format!("write '{}': {e}", tmp.display())))?;
    tokio::fs::rename(&tmp, path)
        .await
        .map_err(|e| WorkError::io(format!("rename to '{}': {e}", path.display())))
}

async fn remove_if_present(path: &Path) -> WorkResult<()> {
    match tokio::fs::remove_file(path).await {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
        Err(e) => Err(WorkError::io(format!("remove '{}': {e}", path.display()))),
    }
}

#[cfg(test)]
#[path = "../../tests/unit/fs/store.rs"]
mod tests;
