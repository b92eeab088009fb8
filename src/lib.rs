//! canvas-recorder captures the pixels of an RGBA canvas over time and turns them into a
//! downloadable video file.
//!
//! The heavy lifting (encoding, muxing, compression) is delegated to a platform encoder behind the
//! [`EncoderFactory`] / [`MediaEncoder`] seam; the crate ships an implementation backed by the
//! system `ffmpeg` binary. What lives here is the session lifecycle around it:
//!
//! 1. **Start**: size an [`OffscreenBuffer`] to the source canvas, open a per-session event queue,
//!    start the encoder.
//! 2. **Tick** (once per display refresh): paint an opaque fill, copy the canvas over it, feed the
//!    buffer to the encoder.
//! 3. **Stop**: finalize the encoder, wait for its terminal event, concatenate the non-empty
//!    fragments into an [`Artifact`] and optionally hand it to a [`Downloader`].
//!
//! Everything is single-threaded and cooperative from the caller's point of view: the caller owns
//! the loop and drives [`CanvasRecorder::tick`] (or [`CanvasRecorder::run`] with a
//! [`FrameTicker`]).
#![forbid(unsafe_code)]
#![deny(missing_docs)]

mod capture;
mod demo;
mod download;
mod encode;
mod foundation;

pub use capture::buffer::OffscreenBuffer;
pub use capture::options::{DEFAULT_MIME_TYPE, RecorderOptions};
pub use capture::recorder::{CanvasRecorder, NoopObserver, RecorderObserver, TickOutcome};
pub use capture::source::CanvasSource;
pub use capture::ticker::{FixedRateTicker, FrameTicker};
pub use demo::spiral::{SpiralDemo, SpiralParams};
pub use download::{
    Downloader, FileDownloader, download_file_name, download_recording, extension_for_mime,
    sanitize_stem, timestamp_stem,
};
pub use encode::assembler::{Artifact, FragmentAssembler};
pub use encode::ffmpeg::{FfmpegEncoderFactory, FfmpegMediaEncoder, is_ffmpeg_on_path};
pub use encode::platform::{
    CaptureStream, EncoderConfig, EncoderEvent, EncoderFactory, EventSender, MediaEncoder,
    MimeSpec,
};
pub use foundation::core::{FrameRGBA, SurfaceSize};
pub use foundation::error::{RecorderError, RecorderResult};
