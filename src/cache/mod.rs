pub(crate) mod refresh;
pub(crate) mod version;
