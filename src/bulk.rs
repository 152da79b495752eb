use std::sync::Arc;

use futures::future;

use crate::{
    coalesce::{MutationCoalescer, SubmitTicket},
    foundation::{
        core::ResourceRef,
        error::{WorkError, WorkResult},
    },
    gateway::{ErrorReporter, PersistenceGateway, StateProjector},
    work::{fields::FieldUpdate, mutation::WorkMutation},
};

/// Applies primary-field updates across many resources.
///
/// Fields mirrored into the edit state (the pick flag) additionally go through the
/// [`MutationCoalescer`] per resource, so they merge with any geometry edit already queued
/// for that resource instead of overwriting it.
#[derive(Clone)]
pub struct BulkFieldUpdateEngine {
    coalescer: MutationCoalescer,
    gateway: Arc<dyn PersistenceGateway>,
    projector: Arc<dyn StateProjector>,
    reporter: Arc<dyn ErrorReporter>,
}

impl BulkFieldUpdateEngine {
    /// Engine sharing the collaborators of `coalescer`.
    pub fn new(coalescer: MutationCoalescer) -> Self {
        Self {
            gateway: Arc::clone(coalescer.gateway()),
            projector: Arc::clone(coalescer.projector()),
            reporter: Arc::clone(coalescer.reporter()),
            coalescer,
        }
    }

    /// Coalescer mirrored fields are routed through.
    pub fn coalescer(&self) -> &MutationCoalescer {
        &self.coalescer
    }

    /// Apply `update` to every resource in `resources`.
    ///
    /// Publishes the combined update once the batch write and every mirrored per-resource
    /// merge have been published. Any failure is reported once for the whole batch and
    /// returned.
    #[tracing::instrument(skip_all, fields(count = resources.len(), update = ?update))]
    pub async fn update_fields(
        &self,
        resources: &[ResourceRef],
        update: &FieldUpdate,
    ) -> WorkResult<()> {
        let result = self.apply(resources, update).await;
        if let Err(err) = &result {
            self.reporter.report("updating photos failed", err);
        }
        result
    }

    async fn apply(&self, resources: &[ResourceRef], update: &FieldUpdate) -> WorkResult<()> {
        if update.is_empty() {
            return Err(WorkError::validation("field update must set at least one field"));
        }
        if resources.is_empty() {
            tracing::debug!("empty batch");
            return Ok(());
        }

        let tickets: Vec<SubmitTicket> = match update.mirrored_flag() {
            Some(flagged) => resources
                .iter()
                .map(|r| self.coalescer.submit(r.clone(), WorkMutation::SetFlagged(flagged)))
                .collect(),
            None => Vec::new(),
        };

        let (batch, mirrored) = future::join(
            self.gateway.update_fields(resources, update),
            future::join_all(tickets.into_iter().map(SubmitTicket::published)),
        )
        .await;

        batch.map_err(|e| WorkError::batch(format!("storing fields failed: {e}")))?;

        let failures: Vec<WorkError> = mirrored.into_iter().filter_map(Result::err).collect();
        if let Some(first) = failures.first() {
            return Err(WorkError::batch(format!(
                "{} of {} edit states failed to update, first: {first}",
                failures.len(),
                resources.len()
            )));
        }

        self.projector.publish_fields(resources, update).await;
        Ok(())
    }

    /// Set or clear the pick flag.
    pub async fn set_flagged(&self, resources: &[ResourceRef], flagged: bool) -> WorkResult<()> {
        self.update_fields(resources, &FieldUpdate::flagged(flagged)).await
    }

    /// Move resources into the trash.
    pub async fn move_to_trash(&self, resources: &[ResourceRef]) -> WorkResult<()> {
        self.update_fields(resources, &FieldUpdate::trashed(true)).await
    }

    /// Take resources back out of the trash.
    pub async fn restore_from_trash(&self, resources: &[ResourceRef]) -> WorkResult<()> {
        self.update_fields(resources, &FieldUpdate::trashed(false)).await
    }

    /// Apply `update` to a single resource.
    pub async fn update_one(&self, resource: &ResourceRef, update: &FieldUpdate) -> WorkResult<()> {
        self.update_fields(std::slice::from_ref(resource), update).await
    }
}
