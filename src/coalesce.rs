//! Per-resource coalescing of edit-state mutations.
//!
//! Each resource key moves through `Idle -> Pending -> Merging -> Completing -> Idle`, or
//! `Pending -> Failed -> Idle` when the baseline fetch fails. While a key is pending every
//! submission is appended to its queue; the queue is applied once, in submission order, to
//! the single baseline that fetch returns.
//!
//! Submissions are not cancelable and have no timeout. A fetch that never resolves keeps its
//! key pending forever; new submissions for that key keep queueing and other keys are not
//! affected.

use std::{
    collections::{HashMap, hash_map::Entry},
    sync::{
        Arc, Mutex, MutexGuard, PoisonError,
        atomic::{AtomicUsize, Ordering},
    },
};

use tokio::{
    runtime::Handle,
    sync::{Notify, oneshot},
};

use crate::{
    cache::refresh::DerivedCacheRefresher,
    config::EngineOpts,
    foundation::{
        core::ResourceRef,
        error::{WorkError, WorkResult},
    },
    gateway::{Collaborators, ErrorReporter, PersistenceGateway, StateProjector},
    work::{
        diff::WorkDiff,
        mutation::{WorkMutation, apply_in_order},
        state::EditState,
    },
};

/// Result of merging one pending entry.
#[derive(Clone, Debug, PartialEq)]
pub struct MergeOutcome {
    /// Merged resource.
    pub resource: ResourceRef,
    /// Fetched baseline.
    pub before: EditState,
    /// Baseline with every queued mutation applied.
    pub after: EditState,
    /// Fields that differ between `before` and `after`.
    pub diff: WorkDiff,
}

impl MergeOutcome {
    /// Whether this merge invalidates the derived artifact.
    pub fn refreshes_derived(&self) -> bool {
        self.diff.geometry_changed()
    }
}

/// Handle to one submission.
///
/// Dropping it is fine; the submission still runs to completion.
#[derive(Debug)]
pub struct SubmitTicket {
    resource: ResourceRef,
    published: oneshot::Receiver<WorkResult<MergeOutcome>>,
}

impl SubmitTicket {
    /// Resource the mutation was submitted for.
    pub fn resource(&self) -> &ResourceRef {
        &self.resource
    }

    /// Wait until the merged state containing this mutation has been published, or until the
    /// entry it was queued in failed.
    pub async fn published(self) -> WorkResult<MergeOutcome> {
        match self.published.await {
            Ok(result) => result,
            Err(_) => Err(WorkError::runtime(format!(
                "merge task for '{}' ended before publishing",
                self.resource
            ))),
        }
    }
}

struct PendingEntry {
    mutations: Vec<WorkMutation>,
    waiters: Vec<oneshot::Sender<WorkResult<MergeOutcome>>>,
}

struct Inner {
    pending: Mutex<HashMap<ResourceRef, PendingEntry>>,
    gateway: Arc<dyn PersistenceGateway>,
    projector: Arc<dyn StateProjector>,
    reporter: Arc<dyn ErrorReporter>,
    refresher: DerivedCacheRefresher,
    runtime: Handle,
    inflight: AtomicUsize,
    idle: Notify,
}

/// Counts one pending key from first submission until all of its completion work finished.
struct InflightGuard(Arc<Inner>);

impl Drop for InflightGuard {
    fn drop(&mut self) {
        if self.0.inflight.fetch_sub(1, Ordering::AcqRel) == 1 {
            self.0.idle.notify_waiters();
        }
    }
}

/// Merges concurrently submitted edits per resource against a single fetched baseline.
///
/// Cloning is cheap and clones share the same queue.
#[derive(Clone)]
pub struct MutationCoalescer {
    inner: Arc<Inner>,
}

impl MutationCoalescer {
    /// Build a coalescer that spawns onto the current tokio runtime.
    pub fn new(collaborators: Collaborators, opts: &EngineOpts) -> WorkResult<Self> {
        let runtime = Handle::try_current()
            .map_err(|e| WorkError::runtime(format!("no tokio runtime: {e}")))?;
        Self::with_runtime(collaborators, opts, runtime)
    }

    /// Build a coalescer that spawns onto `runtime`.
    pub fn with_runtime(
        collaborators: Collaborators,
        opts: &EngineOpts,
        runtime: Handle,
    ) -> WorkResult<Self> {
        let refresher = DerivedCacheRefresher::new(collaborators.invalidator, opts)?;
        Ok(Self {
            inner: Arc::new(Inner {
                pending: Mutex::new(HashMap::new()),
                gateway: collaborators.gateway,
                projector: collaborators.projector,
                reporter: collaborators.reporter,
                refresher,
                runtime,
                inflight: AtomicUsize::new(0),
                idle: Notify::new(),
            }),
        })
    }

    /// Queue `mutation` for `resource`.
    ///
    /// The first submission for an idle key starts the baseline fetch; later ones join its
    /// queue. Never blocks on I/O.
    #[tracing::instrument(skip_all, fields(resource = %resource, mutation = mutation.label()))]
    pub fn submit(&self, resource: ResourceRef, mutation: WorkMutation) -> SubmitTicket {
        let (tx, rx) = oneshot::channel();

        let started = {
            let mut pending = self.inner.lock_pending();
            match pending.entry(resource.clone()) {
                Entry::Occupied(mut slot) => {
                    let entry = slot.get_mut();
                    entry.mutations.push(mutation);
                    entry.waiters.push(tx);
                    tracing::trace!(queued = entry.mutations.len(), "joined pending entry");
                    false
                }
                Entry::Vacant(slot) => {
                    slot.insert(PendingEntry {
                        mutations: vec![mutation],
                        waiters: vec![tx],
                    });
                    self.inner.inflight.fetch_add(1, Ordering::AcqRel);
                    true
                }
            }
        };

        if started {
            tracing::debug!("fetching baseline");
            let guard = InflightGuard(Arc::clone(&self.inner));
            let key = resource.clone();
            self.inner.runtime.spawn(Inner::run(guard, key));
        }

        SubmitTicket {
            resource,
            published: rx,
        }
    }

    /// `true` while a baseline fetch for `resource` is outstanding.
    pub fn is_pending(&self, resource: &ResourceRef) -> bool {
        self.inner.lock_pending().contains_key(resource)
    }

    /// Number of keys with an outstanding baseline fetch.
    pub fn pending_len(&self) -> usize {
        self.inner.lock_pending().len()
    }

    /// Number of mutations queued for `resource`; zero when it is idle.
    pub fn queued_len(&self, resource: &ResourceRef) -> usize {
        self.inner
            .lock_pending()
            .get(resource)
            .map_or(0, |e| e.mutations.len())
    }

    /// Derived-cache refresher owned by this coalescer.
    pub fn refresher(&self) -> &DerivedCacheRefresher {
        &self.inner.refresher
    }

    /// Wait until no key is pending and every persist, invalidate and publish task finished.
    pub async fn drain(&self) {
        loop {
            let idle = self.inner.idle.notified();
            if self.inner.inflight.load(Ordering::Acquire) == 0 {
                return;
            }
            idle.await;
        }
    }

    pub(crate) fn gateway(&self) -> &Arc<dyn PersistenceGateway> {
        &self.inner.gateway
    }

    pub(crate) fn projector(&self) -> &Arc<dyn StateProjector> {
        &self.inner.projector
    }

    pub(crate) fn reporter(&self) -> &Arc<dyn ErrorReporter> {
        &self.inner.reporter
    }
}

impl Inner {
    fn lock_pending(&self) -> MutexGuard<'_, HashMap<ResourceRef, PendingEntry>> {
        self.pending.lock().unwrap_or_else(PoisonError::into_inner)
    }

    #[tracing::instrument(skip_all, fields(resource = %key))]
    async fn run(guard: InflightGuard, key: ResourceRef) {
        let inner = Arc::clone(&guard.0);
        let baseline = inner.gateway.fetch(&key).await;

        // Taking the entry out closes the queue. A submission arriving after this point
        // starts a fresh entry with its own fetch.
        let taken = inner.lock_pending().remove(&key);
        let Some(entry) = taken else {
            tracing::error!("pending entry disappeared during baseline fetch");
            return;
        };

        let before = match baseline {
            Ok(state) => state,
            Err(err) => {
                tracing::warn!(
                    dropped = entry.mutations.len(),
                    error = %err,
                    "baseline fetch failed, dropping queued edits"
                );
                let message = err.to_string();
                inner.reporter.report(
                    "updating edit state failed",
                    &WorkError::fetch(key.clone(), message.clone()),
                );
                for waiter in entry.waiters {
                    let _ = waiter.send(Err(WorkError::fetch(key.clone(), message.clone())));
                }
                return;
            }
        };

        let after = apply_in_order(&before, &entry.mutations);
        let diff = WorkDiff::between(&before, &after);
        tracing::debug!(
            applied = entry.mutations.len(),
            ?diff,
            refresh = diff.geometry_changed(),
            "merged queued edits"
        );

        let outcome = MergeOutcome {
            resource: key,
            before,
            after,
            diff,
        };
        inner.complete(guard, outcome, entry.waiters);
    }

    /// Publish, persist and (when geometry changed) refresh the derived cache, all
    /// concurrently and unordered relative to each other.
    fn complete(
        self: &Arc<Self>,
        guard: InflightGuard,
        outcome: MergeOutcome,
        waiters: Vec<oneshot::Sender<WorkResult<MergeOutcome>>>,
    ) {
        let publish = self.runtime.spawn({
            let inner = Arc::clone(self);
            let outcome = outcome.clone();
            async move {
                inner
                    .projector
                    .publish_work(&outcome.resource, &outcome.after)
                    .await;
                for waiter in waiters {
                    let _ = waiter.send(Ok(outcome.clone()));
                }
            }
        });

        let persist = self.runtime.spawn({
            let inner = Arc::clone(self);
            let resource = outcome.resource.clone();
            let state = outcome.after.clone();
            async move {
                if let Err(err) = inner.gateway.store(&resource, &state).await {
                    tracing::warn!(%resource, error = %err, "storing merged edit state failed");
                    inner.reporter.report(
                        "storing edit state failed",
                        &WorkError::persist(resource, err.to_string()),
                    );
                }
            }
        });

        let refresh = outcome.refreshes_derived().then(|| {
            let inner = Arc::clone(self);
            let resource = outcome.resource.clone();
            self.runtime.spawn(async move {
                let refreshed = inner.refresher.refresh(&resource).await;
                if let Err(err) = refreshed.invalidation {
                    inner
                        .reporter
                        .report("invalidating derived artifact failed", &err);
                }
            })
        });

        self.runtime.spawn(async move {
            let _guard = guard;
            let tasks = [Some(publish), Some(persist), refresh];
            for task in tasks.into_iter().flatten() {
                if let Err(err) = task.await {
                    tracing::error!(error = %err, "completion task did not finish");
                }
            }
        });
    }
}
