/// Batch update of a resource's primary fields.
///
/// Absent fields are left untouched. `flag` is also mirrored into the edit state's `flagged`
/// attribute by the bulk engine.
#[derive(Clone, Debug, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct FieldUpdate {
    /// Pick flag.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub flag: Option<bool>,
    /// Trash membership.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub trashed: Option<bool>,
}

impl FieldUpdate {
    /// Update that sets the pick flag.
    pub fn flagged(flag: bool) -> Self {
        Self {
            flag: Some(flag),
            ..Self::default()
        }
    }

    /// Update that moves resources into or out of the trash.
    pub fn trashed(trashed: bool) -> Self {
        Self {
            trashed: Some(trashed),
            ..Self::default()
        }
    }

    /// `true` when no field is set.
    pub fn is_empty(&self) -> bool {
        self.flag.is_none() && self.trashed.is_none()
    }

    /// The part of this update that is mirrored into the edit state.
    pub fn mirrored_flag(&self) -> Option<bool> {
        self.flag
    }

    /// Apply this update onto stored primary fields.
    pub fn apply_to(&self, fields: &mut PrimaryFields) {
        if let Some(flag) = self.flag {
            fields.flag = flag;
        }
        if let Some(trashed) = self.trashed {
            fields.trashed = trashed;
        }
    }
}

/// Stored primary fields of one resource.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct PrimaryFields {
    /// Pick flag.
    #[serde(default)]
    pub flag: bool,
    /// Trash membership.
    #[serde(default)]
    pub trashed: bool,
}

#[cfg(test)]
#[path = "../../tests/unit/work/fields.rs"]
mod tests;
