//! Photowork coalesces edits to a photo's derived "work" state (rotation, tilt, crop, flag,
//! tags), persists the merged result and invalidates the rendered thumbnail when geometry
//! changed.
//!
//! # Flow
//!
//! 1. **Submit**: [`MutationCoalescer::submit`] queues a [`WorkMutation`] under its
//!    [`ResourceRef`]. The first submission for an idle key starts the baseline fetch.
//! 2. **Merge**: when the baseline arrives, every queued mutation is applied in submission
//!    order and the key becomes idle again.
//! 3. **Complete**: the merged [`EditState`] is published, stored and, when rotation, tilt or
//!    crop changed, the thumbnail is invalidated and the [`VersionToken`] bumped. These run
//!    concurrently.
//!
//! [`BulkFieldUpdateEngine`] layers batch field updates (flag, trash) on top: the flag goes
//! through the coalescer per resource so it never clobbers a pending geometry edit.
//!
//! Persistence, thumbnail storage and UI projection are collaborators behind
//! [`PersistenceGateway`], [`DerivedCacheInvalidator`] and [`StateProjector`];
//! [`FsWorkStore`] and [`FsThumbnailCache`] are JSON/filesystem implementations of them.
//!
//! No edit is retried and nothing is rolled back. If the baseline fetch for a key fails, every
//! edit queued under that key is dropped and reported.
#![forbid(unsafe_code)]
#![deny(missing_docs)]

mod bulk;
mod cache;
mod coalesce;
mod config;
mod foundation;
mod fs;
mod gateway;
mod work;

pub use crate::bulk::BulkFieldUpdateEngine;
pub use crate::cache::refresh::{DerivedCacheRefresher, DerivedChange, RefreshOutcome};
pub use crate::cache::version::VersionToken;
pub use crate::coalesce::{MergeOutcome, MutationCoalescer, SubmitTicket};
pub use crate::config::{EngineOpts, LibraryConfig, PhotoworkConfig};
pub use crate::foundation::core::{Rect, ResourceRef};
pub use crate::foundation::error::{WorkError, WorkResult};
pub use crate::fs::store::FsWorkStore;
pub use crate::fs::thumbnails::FsThumbnailCache;
pub use crate::gateway::{
    Collaborators, DerivedCacheInvalidator, ErrorReporter, PersistenceGateway, StateProjector,
    TracingProjector, TracingReporter,
};
pub use crate::work::diff::{WorkDiff, needs_derived_refresh};
pub use crate::work::fields::{FieldUpdate, PrimaryFields};
pub use crate::work::mutation::{MutationFn, WorkMutation, apply_in_order};
pub use crate::work::state::EditState;
