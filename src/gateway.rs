use std::sync::{
    Arc,
    atomic::{AtomicUsize, Ordering},
};

use async_trait::async_trait;

use crate::{
    foundation::{
        core::ResourceRef,
        error::{WorkError, WorkResult},
    },
    work::{fields::FieldUpdate, state::EditState},
};

/// Storage for edit states and primary fields.
#[async_trait]
pub trait PersistenceGateway: Send + Sync {
    /// Current edit state of `resource`. Fails with `NotFound` or `Io`.
    async fn fetch(&self, resource: &ResourceRef) -> WorkResult<EditState>;

    /// Replace the stored edit state of `resource`.
    async fn store(&self, resource: &ResourceRef, state: &EditState) -> WorkResult<()>;

    /// Apply one primary-field update to every resource in the batch.
    async fn update_fields(&self, resources: &[ResourceRef], update: &FieldUpdate)
    -> WorkResult<()>;
}

/// Deletes cached derived artifacts (thumbnails).
#[async_trait]
pub trait DerivedCacheInvalidator: Send + Sync {
    /// Drop the cached artifact of `resource`. Missing artifacts are not an error.
    async fn invalidate(&self, resource: &ResourceRef) -> WorkResult<()>;
}

/// Receives final state so observers can reflect it.
#[async_trait]
pub trait StateProjector: Send + Sync {
    /// Merged edit state of one resource.
    async fn publish_work(&self, resource: &ResourceRef, state: &EditState);

    /// Primary fields changed across a batch.
    async fn publish_fields(&self, resources: &[ResourceRef], update: &FieldUpdate);
}

/// Sink for failures that have no caller left to return to.
pub trait ErrorReporter: Send + Sync {
    /// Surface `error` with a short description of what was being done.
    fn report(&self, context: &str, error: &WorkError);
}

/// The external collaborators one engine instance talks to.
#[derive(Clone)]
pub struct Collaborators {
    /// Edit-state and primary-field storage.
    pub gateway: Arc<dyn PersistenceGateway>,
    /// Derived artifact cache.
    pub invalidator: Arc<dyn DerivedCacheInvalidator>,
    /// Observer of merged state.
    pub projector: Arc<dyn StateProjector>,
    /// Failure sink.
    pub reporter: Arc<dyn ErrorReporter>,
}

/// Projector that only logs.
#[derive(Clone, Copy, Debug, Default)]
pub struct TracingProjector;

#[async_trait]
impl StateProjector for TracingProjector {
    async fn publish_work(&self, resource: &ResourceRef, state: &EditState) {
        tracing::info!(
            %resource,
            geometry = state.has_geometry(),
            ?state,
            "edit state published"
        );
    }

    async fn publish_fields(&self, resources: &[ResourceRef], update: &FieldUpdate) {
        tracing::info!(count = resources.len(), ?update, "primary fields published");
    }
}

/// Reporter that logs at `error` level and counts what it saw.
#[derive(Debug, Default)]
pub struct TracingReporter {
    failures: AtomicUsize,
}

impl TracingReporter {
    /// Number of failures reported so far.
    pub fn failures(&self) -> usize {
        self.failures.load(Ordering::Relaxed)
    }
}

impl ErrorReporter for TracingReporter {
    fn report(&self, context: &str, error: &WorkError) {
        self.failures.fetch_add(1, Ordering::Relaxed);
        tracing::error!(%error, "{context}");
    }
}
