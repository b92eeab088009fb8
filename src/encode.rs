pub(crate) mod assembler;
pub(crate) mod ffmpeg;
pub(crate) mod platform;
