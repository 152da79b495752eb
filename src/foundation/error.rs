use crate::foundation::core::ResourceRef;

/// Convenience result alias used across the crate.
pub type WorkResult<T> = Result<T, WorkError>;

/// Error type for the coalescing engine, its collaborators and the reference adapters.
#[derive(thiserror::Error, Debug)]
pub enum WorkError {
    /// Invalid input or configuration.
    #[error("validation error: {0}")]
    Validation(String),

    /// The resource (or its backing file) does not exist.
    #[error("not found: {0}")]
    NotFound(String),

    /// Filesystem or transport failure inside a collaborator.
    #[error("io error: {0}")]
    Io(String),

    /// The baseline edit state could not be fetched; queued edits for the key were dropped.
    #[error("fetch failed for '{resource}': {message}")]
    Fetch {
        /// Key whose pending entry was dropped.
        resource: ResourceRef,
        /// Rendered collaborator error.
        message: String,
    },

    /// The merged edit state could not be stored. It was still published.
    #[error("persist failed for '{resource}': {message}")]
    Persist {
        /// Key whose merged state was not stored.
        resource: ResourceRef,
        /// Rendered collaborator error.
        message: String,
    },

    /// The derived artifact could not be deleted. The version token was still bumped.
    #[error("invalidation failed for '{resource}': {message}")]
    Invalidation {
        /// Key whose derived artifact may be stale.
        resource: ResourceRef,
        /// Rendered collaborator error.
        message: String,
    },

    /// A batch field update failed somewhere in the batch.
    #[error("batch update error: {0}")]
    Batch(String),

    /// JSON encoding or decoding failed.
    #[error("serialization error: {0}")]
    Serde(String),

    /// The async runtime was unavailable or a task ended unexpectedly.
    #[error("runtime error: {0}")]
    Runtime(String),

    /// Anything else, with its source chain preserved.
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl WorkError {
    /// Build a [`WorkError::Validation`].
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    /// Build a [`WorkError::NotFound`].
    pub fn not_found(msg: impl Into<String>) -> Self {
        Self::NotFound(msg.into())
    }

    /// Build a [`WorkError::Io`].
    pub fn io(msg: impl Into<String>) -> Self {
        Self::Io(msg.into())
    }

    /// Build a [`WorkError::Fetch`].
    pub fn fetch(resource: ResourceRef, message: impl Into<String>) -> Self {
        Self::Fetch {
            resource,
            message: message.into(),
        }
    }

    /// Build a [`WorkError::Persist`].
    pub fn persist(resource: ResourceRef, message: impl Into<String>) -> Self {
        Self::Persist {
            resource,
            message: message.into(),
        }
    }

    /// Build a [`WorkError::Invalidation`].
    pub fn invalidation(resource: ResourceRef, message: impl Into<String>) -> Self {
        Self::Invalidation {
            resource,
            message: message.into(),
        }
    }

    /// Build a [`WorkError::Batch`].
    pub fn batch(msg: impl Into<String>) -> Self {
        Self::Batch(msg.into())
    }

    /// Build a [`WorkError::Serde`].
    pub fn serde(msg: impl Into<String>) -> Self {
        Self::Serde(msg.into())
    }

    /// Build a [`WorkError::Runtime`].
    pub fn runtime(msg: impl Into<String>) -> Self {
        Self::Runtime(msg.into())
    }

    /// The resource this error is tagged with, if any.
    pub fn resource(&self) -> Option<&ResourceRef> {
        match self {
            Self::Fetch { resource, .. }
            | Self::Persist { resource, .. }
            | Self::Invalidation { resource, .. } => Some(resource),
            _ => None,
        }
    }
}

#[cfg(test)]
#[path = "../../tests/unit/foundation/error.rs"]
mod tests;
