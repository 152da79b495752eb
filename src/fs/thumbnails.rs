use std::{io::ErrorKind, path::PathBuf};

use async_trait::async_trait;
use xxhash_rust::xxh3::xxh3_64;

use crate::{
    config::LibraryConfig,
    foundation::{
        core::ResourceRef,
        error::{WorkError, WorkResult},
    },
    gateway::DerivedCacheInvalidator,
};

/// Thumbnail directory acting as the derived-artifact cache.
///
/// Thumbnails are named by the xxh3 hash of the resource path, so nested master paths map
/// to flat file names.
#[derive(Clone, Debug)]
pub struct FsThumbnailCache {
    dir: PathBuf,
    base_url: String,
}

impl FsThumbnailCache {
    /// Cache rooted at the configured thumbnail directory.
    pub fn new(config: &LibraryConfig) -> Self {
        Self {
            dir: config.thumbnail_dir(),
            base_url: config.thumbnail_base_url.trim_end_matches('/').to_string(),
        }
    }

    /// Stable file stem for `resource`'s thumbnail.
    pub fn thumbnail_key(resource: &ResourceRef) -> String {
        format!("{:016x}", xxh3_64(resource.as_str().as_bytes()))
    }

    /// Where `resource`'s thumbnail is stored.
    pub fn thumbnail_path(&self, resource: &ResourceRef) -> PathBuf {
        self.dir.join(format!("{}.jpg", Self::thumbnail_key(resource)))
    }

    /// URL `resource`'s thumbnail is served under, without cache busting.
    pub fn thumbnail_url(&self, resource: &ResourceRef) -> String {
        format!("{}/{}.jpg", self.base_url, Self::thumbnail_key(resource))
    }
}

#[async_trait]
impl DerivedCacheInvalidator for FsThumbnailCache {
    async fn invalidate(&self, resource: &ResourceRef) -> WorkResult<()> {
        let path = self.thumbnail_path(resource);
        match tokio::fs::remove_file(&path).await {
            Ok(()) => {
                tracing::debug!(%resource, path = %path.display(), "thumbnail deleted");
                Ok(())
            }
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(WorkError::io(format!(
                "delete thumbnail '{}': {e}",
                path.display()
            ))),
        }
    }
}

#[cfg(test)]
#[path = "../../tests/unit/fs/thumbnails.rs"]
mod tests;
