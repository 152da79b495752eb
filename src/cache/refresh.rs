use std::sync::Arc;

use tokio::sync::broadcast;

use crate::{
    cache::version::VersionToken,
    config::EngineOpts,
    foundation::{
        core::ResourceRef,
        error::{WorkError, WorkResult},
    },
    gateway::DerivedCacheInvalidator,
};

/// Notification that a resource's derived artifact was invalidated.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DerivedChange {
    /// Resource whose artifact was invalidated.
    pub resource: ResourceRef,
    /// Token value after the bump.
    pub version: u64,
}

/// Result of one refresh.
#[derive(Debug)]
pub struct RefreshOutcome {
    /// Token value after the bump.
    pub version: u64,
    /// What the invalidator returned. A failure here did not stop the bump.
    pub invalidation: WorkResult<()>,
}

/// Owns the version token and drives the derived-cache invalidator.
pub struct DerivedCacheRefresher {
    invalidator: Arc<dyn DerivedCacheInvalidator>,
    version: VersionToken,
    changes: broadcast::Sender<DerivedChange>,
}

impl DerivedCacheRefresher {
    /// Build a refresher around `invalidator`.
    pub fn new(
        invalidator: Arc<dyn DerivedCacheInvalidator>,
        opts: &EngineOpts,
    ) -> WorkResult<Self> {
        opts.validate()?;
        let version = match opts.initial_version {
            Some(v) => VersionToken::starting_at(v),
            None => VersionToken::new(),
        };
        let (changes, _) = broadcast::channel(opts.change_capacity);
        Ok(Self {
            invalidator,
            version,
            changes,
        })
    }

    /// Current version token.
    pub fn version(&self) -> u64 {
        self.version.current()
    }

    /// `url` with the current token appended, so image loaders skip stale copies.
    pub fn derived_src(&self, url: &str) -> String {
        self.version.bust(url)
    }

    /// Receive a [`DerivedChange`] after every bump.
    pub fn subscribe(&self) -> broadcast::Receiver<DerivedChange> {
        self.changes.subscribe()
    }

    /// Delete the artifact of `resource`, then bump the token and notify subscribers.
    ///
    /// The bump happens even when the invalidator fails.
    #[tracing::instrument(skip_all, fields(resource = %resource))]
    pub async fn refresh(&self, resource: &ResourceRef) -> RefreshOutcome {
        let invalidation = self.invalidator.invalidate(resource).await.map_err(|e| {
            tracing::warn!(error = %e, "derived artifact invalidation failed");
            WorkError::invalidation(resource.clone(), e.to_string())
        });

        let version = self.version.bump();
        // No subscribers is fine.
        let _ = self.changes.send(DerivedChange {
            resource: resource.clone(),
            version,
        });
        tracing::debug!(version, "derived cache version bumped");

        RefreshOutcome {
            version,
            invalidation,
        }
    }
}

#[cfg(test)]
#[path = "../../tests/unit/cache/refresh.rs"]
mod tests;
