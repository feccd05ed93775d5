pub(crate) mod binding;
pub(crate) mod region;
pub(crate) mod source;
