use crate::work::state::EditState;

/// Which attributes differ between two edit states.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct WorkDiff {
    /// Rotation changed.
    pub rotation: bool,
    /// Tilt changed.
    pub tilt: bool,
    /// Crop rectangle changed.
    pub crop: bool,
    /// Flag changed.
    pub flagged: bool,
    /// Tag set changed.
    pub tags: bool,
}

impl WorkDiff {
    /// Compare `before` against `after` field by field.
    pub fn between(before: &EditState, after: &EditState) -> Self {
        Self {
            rotation: before.rotation_turns != after.rotation_turns,
            tilt: before.tilt != after.tilt,
            crop: before.crop_rect != after.crop_rect,
            flagged: before.flagged != after.flagged,
            tags: before.tags != after.tags,
        }
    }

    /// `true` when a field that shapes the rendered artifact changed.
    pub fn geometry_changed(self) -> bool {
        self.rotation || self.tilt || self.crop
    }

    /// `true` when nothing changed.
    pub fn is_empty(self) -> bool {
        self == Self::default()
    }
}

/// Whether the derived artifact (thumbnail) of a resource must be regenerated.
///
/// Only rotation, tilt and crop count; flag and tag changes never invalidate.
pub fn needs_derived_refresh(before: &EditState, after: &EditState) -> bool {
    WorkDiff::between(before, after).geometry_changed()
}

#[cfg(test)]
#[path = "../../tests/unit/work/diff.rs"]
mod tests;
