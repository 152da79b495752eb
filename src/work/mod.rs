pub(crate) mod diff;
pub(crate) mod fields;
pub(crate) mod mutation;
pub(crate) mod state;
