use std::{
    io::{Read, Write as _},
    path::{Path, PathBuf},
    process::{Child, ChildStderr, ChildStdin, ChildStdout, Command, Stdio},
    thread::JoinHandle,
};

use crate::{
    encode::platform::{
        CaptureStream, EncoderConfig, EncoderEvent, EncoderFactory, EventSender, MediaEncoder,
        MimeSpec,
    },
    foundation::{
        core::FrameRGBA,
        error::{RecorderError, RecorderResult},
    },
};

const READ_CHUNK_BYTES: usize = 64 * 1024;
const DEFAULT_OUTPUT_MIME: &str = "video/mp4";

/// Whether an `ffmpeg` binary on `PATH` runs.
pub fn is_ffmpeg_on_path() -> bool {
    program_runs(Path::new("ffmpeg"))
}

fn program_runs(program: &Path) -> bool {
    Command::new(program)
        .arg("-version")
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .status()
        .map(|s| s.success())
        .unwrap_or(false)
}

/// Container + codec ffmpeg should produce.
#[derive(Clone, Debug, PartialEq, Eq)]
pub(crate) struct OutputFormat {
    /// ffmpeg muxer name (`-f`).
    pub(crate) muxer: &'static str,
    /// ffmpeg video encoder (`-c:v`).
    pub(crate) codec: &'static str,
    pub(crate) mime_type: String,
}

impl OutputFormat {
    fn default_mp4() -> Self {
        Self {
            muxer: "mp4",
            codec: "libx264",
            mime_type: DEFAULT_OUTPUT_MIME.to_string(),
        }
    }

    /// Map a mime descriptor to an ffmpeg muxer/encoder pair.
    pub(crate) fn resolve(mime: &str) -> RecorderResult<Self> {
        let parsed = MimeSpec::parse(mime)
            .map_err(|e| RecorderError::encoder_unavailable(e.to_string()))?;

        let (muxer, default_codec) = match parsed.essence.as_str() {
            "video/mp4" => ("mp4", "libx264"),
            "video/webm" => ("webm", "libvpx"),
            "video/x-matroska" => ("matroska", "libx264"),
            other => {
                return Err(RecorderError::encoder_unavailable(format!(
                    "unsupported container '{other}'"
                )));
            }
        };

        let mut codec = None;
        for c in &parsed.codecs {
            if is_audio_codec(c) {
                continue;
            }
            codec = Some(video_encoder_for(c).ok_or_else(|| {
                RecorderError::encoder_unavailable(format!("unsupported video codec '{c}'"))
            })?);
            break;
        }
        let codec = codec.unwrap_or(default_codec);

        if muxer == "webm" && !matches!(codec, "libvpx" | "libvpx-vp9" | "libaom-av1") {
            return Err(RecorderError::encoder_unavailable(format!(
                "codec '{codec}' cannot be muxed into webm"
            )));
        }

        Ok(Self {
            muxer,
            codec,
            mime_type: mime.to_string(),
        })
    }
}

fn is_audio_codec(codec: &str) -> bool {
    let c = codec.to_ascii_lowercase();
    c == "opus" || c == "vorbis" || c == "flac" || c.starts_with("mp4a") || c.starts_with("pcm")
}

fn video_encoder_for(codec: &str) -> Option<&'static str> {
    let c = codec.to_ascii_lowercase();
    let family = c.split('.').next().unwrap_or_default();
    match family {
        "avc1" | "avc3" | "h264" => Some("libx264"),
        "hvc1" | "hev1" | "h265" => Some("libx265"),
        "vp8" => Some("libvpx"),
        "vp9" | "vp09" => Some("libvpx-vp9"),
        "av01" | "av1" => Some("libaom-av1"),
        _ => None,
    }
}

/// Builds encoders that drive the system `ffmpeg` binary.
///
/// We use the binary rather than linking libav so no native dev headers are needed.
#[derive(Clone, Debug)]
pub struct FfmpegEncoderFactory {
    program: PathBuf,
}

impl Default for FfmpegEncoderFactory {
    fn default() -> Self {
        Self {
            program: PathBuf::from("ffmpeg"),
        }
    }
}

impl FfmpegEncoderFactory {
    /// Use `ffmpeg` from `PATH`.
    pub fn new() -> Self {
        Self::default()
    }

    /// Use a specific ffmpeg executable.
    pub fn with_program(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
        }
    }
}

impl EncoderFactory for FfmpegEncoderFactory {
    fn create(
        &self,
        stream: CaptureStream,
        config: Option<&EncoderConfig>,
    ) -> RecorderResult<Box<dyn MediaEncoder>> {
        let (format, bitrate) = match config {
            Some(cfg) => {
                if cfg.video_bitrate == 0 {
                    return Err(RecorderError::encoder_unavailable(
                        "video bitrate must be non-zero",
                    ));
                }
                (OutputFormat::resolve(&cfg.mime_type)?, Some(cfg.video_bitrate))
            }
            None => (OutputFormat::default_mp4(), None),
        };

        if stream.fps == 0 {
            return Err(RecorderError::encoder_unavailable(
                "capture stream fps must be non-zero",
            ));
        }
        if !stream.size.width.is_multiple_of(2) || !stream.size.height.is_multiple_of(2) {
            // yuv420p output needs even dimensions; no encoder configuration can fix that.
            return Err(RecorderError::validation(
                "capture width/height must be even (required for yuv420p output)",
            ));
        }
        if !program_runs(&self.program) {
            return Err(RecorderError::encoder_unavailable(format!(
                "'{}' was not found or does not run",
                self.program.display()
            )));
        }

        Ok(Box::new(FfmpegMediaEncoder {
            program: self.program.clone(),
            stream,
            format,
            bitrate,
            stdin: None,
            reader: None,
        }))
    }
}

/// A running (or ready to run) ffmpeg process producing one recording.
///
/// Raw RGBA frames go in on stdin; the container comes out on stdout and is forwarded to the
/// session queue as [`EncoderEvent::DataAvailable`] chunks by a reader thread.
pub struct FfmpegMediaEncoder {
    program: PathBuf,
    stream: CaptureStream,
    format: OutputFormat,
    bitrate: Option<u64>,
    stdin: Option<ChildStdin>,
    reader: Option<JoinHandle<()>>,
}

impl FfmpegMediaEncoder {
    pub(crate) fn args(&self) -> Vec<String> {
        let mut args: Vec<String> = [
            "-hide_banner",
            "-loglevel",
            "error",
            "-f",
            "rawvideo",
            "-pix_fmt",
            "rgba",
        ]
        .iter()
        .map(|s| s.to_string())
        .collect();

        args.push("-s".into());
        args.push(format!(
            "{}x{}",
            self.stream.size.width, self.stream.size.height
        ));
        args.push("-r".into());
        args.push(self.stream.fps.to_string());
        args.extend(["-i", "pipe:0", "-an", "-c:v"].map(String::from));
        args.push(self.format.codec.to_string());
        if let Some(bitrate) = self.bitrate {
            args.push("-b:v".into());
            args.push(bitrate.to_string());
        }
        args.extend(["-pix_fmt", "yuv420p"].map(String::from));
        if self.format.muxer == "mp4" {
            // A non-seekable pipe needs a fragmented layout with the moov box up front.
            args.extend(
                ["-movflags", "frag_keyframe+empty_moov+default_base_moof"].map(String::from),
            );
        }
        args.push("-f".into());
        args.push(self.format.muxer.to_string());
        args.push("pipe:1".into());
        args
    }
}

impl MediaEncoder for FfmpegMediaEncoder {
    fn start(&mut self, events: EventSender) -> RecorderResult<()> {
        if self.stdin.is_some() {
            return Err(RecorderError::encode("ffmpeg encoder is already started"));
        }

        let mut child = Command::new(&self.program)
            .args(self.args())
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|e| {
                RecorderError::encoder_unavailable(format!(
                    "failed to spawn '{}': {e}",
                    self.program.display()
                ))
            })?;

        let stdin = child
            .stdin
            .take()
            .ok_or_else(|| RecorderError::encode("failed to open ffmpeg stdin (unexpected)"))?;
        let stdout = child
            .stdout
            .take()
            .ok_or_else(|| RecorderError::encode("failed to open ffmpeg stdout (unexpected)"))?;
        let stderr = child.stderr.take();

        let handle = std::thread::Builder::new()
            .name("ffmpeg-output".into())
            .spawn(move || forward_output(child, stdout, stderr, events))
            .map_err(|e| RecorderError::encode(format!("failed to spawn reader thread: {e}")))?;

        tracing::debug!(codec = self.format.codec, muxer = self.format.muxer, "ffmpeg started");
        self.stdin = Some(stdin);
        self.reader = Some(handle);
        Ok(())
    }

    fn push_frame(&mut self, frame: &FrameRGBA) -> RecorderResult<()> {
        if frame.width != self.stream.size.width || frame.height != self.stream.size.height {
            return Err(RecorderError::validation(format!(
                "frame size mismatch: got {}x{}, expected {}x{}",
                frame.width, frame.height, self.stream.size.width, self.stream.size.height
            )));
        }

        let Some(stdin) = self.stdin.as_mut() else {
            return Err(RecorderError::encode(
                "ffmpeg encoder is not running (not started or already stopped)",
            ));
        };

        stdin.write_all(&frame.data).map_err(|e| {
            RecorderError::encode(format!("failed to write frame to ffmpeg stdin: {e}"))
        })
    }

    fn stop(&mut self) -> RecorderResult<()> {
        // Closing stdin is ffmpeg's end-of-stream; the reader thread reports `Stopped`.
        drop(self.stdin.take());
        // The handle is detached: completion is observed through the event queue.
        drop(self.reader.take());
        Ok(())
    }

    fn mime_type(&self) -> &str {
        &self.format.mime_type
    }
}

impl Drop for FfmpegMediaEncoder {
    fn drop(&mut self) {
        drop(self.stdin.take());
    }
}

fn forward_output(
    mut child: Child,
    mut stdout: ChildStdout,
    stderr: Option<ChildStderr>,
    events: EventSender,
) {
    let mut buf = vec![0u8; READ_CHUNK_BYTES];
    loop {
        match stdout.read(&mut buf) {
            Ok(0) => break,
            Ok(n) => {
                if events
                    .send(EncoderEvent::DataAvailable(buf[..n].to_vec()))
                    .is_err()
                {
                    // Session is gone; keep draining so ffmpeg can exit.
                    let _ = std::io::copy(&mut stdout, &mut std::io::sink());
                    break;
                }
            }
            Err(e) if e.kind() == std::io::ErrorKind::Interrupted => continue,
            Err(e) => {
                let _ = events.send(EncoderEvent::Error(format!(
                    "failed to read ffmpeg output: {e}"
                )));
                break;
            }
        }
    }

    let mut diagnostics = String::new();
    if let Some(mut stderr) = stderr {
        let _ = stderr.read_to_string(&mut diagnostics);
    }

    match child.wait() {
        Ok(status) if status.success() => {}
        Ok(status) => {
            let _ = events.send(EncoderEvent::Error(format!(
                "ffmpeg exited with status {status}: {}",
                diagnostics.trim()
            )));
        }
        Err(e) => {
            let _ = events.send(EncoderEvent::Error(format!(
                "failed to wait for ffmpeg to finish: {e}"
            )));
        }
    }

    let _ = events.send(EncoderEvent::Stopped);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::foundation::core::SurfaceSize;

    fn stream(w: u32, h: u32, fps: u32) -> CaptureStream {
        CaptureStream {
            size: SurfaceSize {
                width: w,
                height: h,
            },
            fps,
        }
    }

    fn encoder(format: OutputFormat, bitrate: Option<u64>) -> FfmpegMediaEncoder {
        FfmpegMediaEncoder {
            program: PathBuf::from("ffmpeg"),
            stream: stream(64, 48, 30),
            format,
            bitrate,
            stdin: None,
            reader: None,
        }
    }

    #[test]
    fn resolves_common_mime_types() {
        let f = OutputFormat::resolve("video/mp4;codecs=avc1.42E01E").unwrap();
        assert_eq!((f.muxer, f.codec), ("mp4", "libx264"));

        let f = OutputFormat::resolve(r#"video/webm;codecs="vp9,opus""#).unwrap();
        assert_eq!((f.muxer, f.codec), ("webm", "libvpx-vp9"));

        let f = OutputFormat::resolve("video/webm").unwrap();
        assert_eq!(f.codec, "libvpx");

        let f = OutputFormat::resolve("video/x-matroska;codecs=av01.0.04M.08").unwrap();
        assert_eq!((f.muxer, f.codec), ("matroska", "libaom-av1"));
    }

    #[test]
    fn unsupported_formats_are_encoder_unavailable() {
        for mime in [
            "video/ogg",
            "video/mp4;codecs=theora",
            "video/webm;codecs=avc1",
            "nonsense",
        ] {
            let err = OutputFormat::resolve(mime).unwrap_err();
            assert!(err.is_encoder_unavailable(), "{mime}: {err}");
        }
    }

    #[test]
    fn configured_args_carry_bitrate_and_fragmented_mp4() {
        let enc = encoder(OutputFormat::resolve("video/mp4").unwrap(), Some(30_000_000));
        let args = enc.args().join(" ");
        assert!(args.contains("-s 64x48"));
        assert!(args.contains("-r 30"));
        assert!(args.contains("-c:v libx264"));
        assert!(args.contains("-b:v 30000000"));
        assert!(args.contains("-movflags frag_keyframe+empty_moov+default_base_moof"));
        assert!(args.ends_with("-f mp4 pipe:1"));
    }

    #[test]
    fn default_args_have_no_bitrate() {
        let enc = encoder(OutputFormat::default_mp4(), None);
        let args = enc.args().join(" ");
        assert!(!args.contains("-b:v"));
        assert_eq!(enc.mime_type(), "video/mp4");
    }

    #[test]
    fn webm_args_skip_movflags() {
        let enc = encoder(OutputFormat::resolve("video/webm;codecs=vp8").unwrap(), None);
        let args = enc.args().join(" ");
        assert!(!args.contains("-movflags"));
        assert!(args.ends_with("-f webm pipe:1"));
    }

    #[test]
    fn missing_program_is_encoder_unavailable() {
        let factory = FfmpegEncoderFactory::with_program("/nonexistent/bin/ffmpeg");
        let err = factory.create(stream(64, 48, 30), None).err().unwrap();
        assert!(err.is_encoder_unavailable());
    }

    #[test]
    fn odd_dimensions_are_a_validation_error() {
        let factory = FfmpegEncoderFactory::with_program("/nonexistent/bin/ffmpeg");
        let err = factory.create(stream(63, 48, 30), None).err().unwrap();
        assert!(matches!(err, RecorderError::Validation(_)));
    }

    #[test]
    fn push_before_start_fails() {
        let mut enc = encoder(OutputFormat::default_mp4(), None);
        let frame = FrameRGBA::transparent(stream(64, 48, 30).size);
        assert!(enc.push_frame(&frame).is_err());
    }
}
