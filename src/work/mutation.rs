use std::{fmt, sync::Arc};

use crate::{foundation::core::Rect, work::state::EditState};

/// Shared function object used by [`WorkMutation::Custom`].
pub type MutationFn = Arc<dyn Fn(&mut EditState) + Send + Sync>;

/// One logical change to an [`EditState`].
///
/// Mutations are queued per resource and applied strictly in submission order, so two
/// mutations touching the same field resolve to the later one.
#[derive(Clone)]
pub enum WorkMutation {
    /// Set the rotation to an absolute number of quarter turns (normalized into `0..4`).
    SetRotation(i32),
    /// Rotate by a signed number of quarter turns relative to the current rotation.
    Rotate(i32),
    /// Set or clear the tilt angle.
    SetTilt(Option<f64>),
    /// Set or clear the crop rectangle.
    SetCrop(Option<Rect>),
    /// Set or clear the pick flag.
    SetFlagged(bool),
    /// Add a tag.
    AddTag(String),
    /// Remove a tag if present.
    RemoveTag(String),
    /// Drop every attribute.
    Reset,
    /// Arbitrary change; `label` names it in logs.
    Custom {
        /// Human-readable name for logging.
        label: &'static str,
        /// The change itself.
        apply: MutationFn,
    },
}

impl WorkMutation {
    /// Wrap a closure as a [`WorkMutation::Custom`].
    pub fn custom(
        label: &'static str,
        apply: impl Fn(&mut EditState) + Send + Sync + 'static,
    ) -> Self {
        Self::Custom {
            label,
            apply: Arc::new(apply),
        }
    }

    /// Apply this mutation in place.
    pub fn apply(&self, state: &mut EditState) {
        match self {
            Self::SetRotation(turns) => state.rotation_turns = Some(turns.rem_euclid(4)),
            Self::Rotate(delta) => {
                // Both operands are in 0..4, so the sum cannot overflow.
                let turns = state.effective_rotation() + delta.rem_euclid(4);
                state.rotation_turns = Some(turns.rem_euclid(4));
            }
            Self::SetTilt(tilt) => state.tilt = *tilt,
            Self::SetCrop(rect) => state.crop_rect = *rect,
            Self::SetFlagged(flagged) => state.flagged = *flagged,
            Self::AddTag(tag) => {
                state.tags.insert(tag.clone());
            }
            Self::RemoveTag(tag) => {
                state.tags.remove(tag);
            }
            Self::Reset => *state = EditState::default(),
            Self::Custom { apply, .. } => apply(state),
        }
    }

    /// Short name used in logs.
    pub fn label(&self) -> &'static str {
        match self {
            Self::SetRotation(_) => "set_rotation",
            Self::Rotate(_) => "rotate",
            Self::SetTilt(_) => "set_tilt",
            Self::SetCrop(_) => "set_crop",
            Self::SetFlagged(_) => "set_flagged",
            Self::AddTag(_) => "add_tag",
            Self::RemoveTag(_) => "remove_tag",
            Self::Reset => "reset",
            Self::Custom { label, .. } => *label,
        }
    }
}

impl fmt::Debug for WorkMutation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::SetRotation(v) => f.debug_tuple("SetRotation").field(v).finish(),
            Self::Rotate(v) => f.debug_tuple("Rotate").field(v).finish(),
            Self::SetTilt(v) => f.debug_tuple("SetTilt").field(v).finish(),
            Self::SetCrop(v) => f.debug_tuple("SetCrop").field(v).finish(),
            Self::SetFlagged(v) => f.debug_tuple("SetFlagged").field(v).finish(),
            Self::AddTag(v) => f.debug_tuple("AddTag").field(v).finish(),
            Self::RemoveTag(v) => f.debug_tuple("RemoveTag").field(v).finish(),
            Self::Reset => f.write_str("Reset"),
            Self::Custom { label, .. } => f.debug_struct("Custom").field("label", label).finish(),
        }
    }
}

/// Apply `mutations` to a copy of `baseline`, left to right.
pub fn apply_in_order<'a>(
    baseline: &EditState,
    mutations: impl IntoIterator<Item = &'a WorkMutation>,
) -> EditState {
    let mut state = baseline.clone();
    for m in mutations {
        m.apply(&mut state);
    }
    state
}

#[cfg(test)]
#[path = "../../tests/unit/work/mutation.rs"]
mod tests;
