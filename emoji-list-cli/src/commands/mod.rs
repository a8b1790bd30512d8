pub(crate) mod cache;
pub(crate) mod export;
pub(crate) mod lookup;
