use std::collections::BTreeSet;

use crate::foundation::core::Rect;

/// Mutable derived-edit attributes of one resource.
///
/// Every field is absent by default and absent fields are omitted from the serialized form,
/// so an untouched resource serializes to `{}`.
#[derive(Clone, Debug, Default, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EditState {
    /// Rotation in clockwise quarter turns, `0..4`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rotation_turns: Option<i32>,
    /// Straightening angle in degrees.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tilt: Option<f64>,
    /// Crop rectangle in source pixel space.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub crop_rect: Option<Rect>,
    /// Pick flag.
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub flagged: bool,
    /// Free-form tags, kept sorted.
    #[serde(default, skip_serializing_if = "BTreeSet::is_empty")]
    pub tags: BTreeSet<String>,
}

impl EditState {
    /// `true` when no attribute is set.
    pub fn is_untouched(&self) -> bool {
        *self == Self::default()
    }

    /// Effective rotation, treating an absent value as zero turns.
    pub fn effective_rotation(&self) -> i32 {
        self.rotation_turns.unwrap_or(0).rem_euclid(4)
    }

    /// `true` when any field that affects the rendered artifact is set.
    pub fn has_geometry(&self) -> bool {
        self.rotation_turns.is_some() || self.tilt.is_some() || self.crop_rect.is_some()
    }
}

#[cfg(test)]
#[path = "../../tests/unit/work/state.rs"]
mod tests;
