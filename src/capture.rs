pub(crate) mod buffer;
pub(crate) mod options;
pub(crate) mod recorder;
pub(crate) mod source;
pub(crate) mod ticker;
