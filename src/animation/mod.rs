pub(crate) mod ease;
pub(crate) mod proc;
pub(crate) mod target;
pub(crate) mod timeline;
pub(crate) mod tween;
pub(crate) mod value;
