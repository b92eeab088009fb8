use std::sync::mpsc;

use crate::foundation::{
    core::{FrameRGBA, SurfaceSize},
    error::{RecorderError, RecorderResult},
};

/// Notification emitted by a running encoder.
///
/// Events for one session arrive on that session's queue in emission order; `Stopped` is the
/// last event an encoder sends.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum EncoderEvent {
    /// A chunk of encoded output. May be empty.
    DataAvailable(Vec<u8>),
    /// A non-fatal failure report. The encoder still sends `Stopped` afterwards.
    Error(String),
    /// Finalization finished; no more data follows.
    Stopped,
}

/// Sending half of a session's event queue.
pub type EventSender = mpsc::Sender<EncoderEvent>;

/// Shape of the pixel stream the capture bridge feeds into an encoder.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct CaptureStream {
    /// Frame dimensions.
    pub size: SurfaceSize,
    /// Frames per second the bridge feeds.
    pub fps: u32,
}

/// Encoder parameters requested by the recorder options.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct EncoderConfig {
    /// Target bitrate in bits per second.
    pub video_bitrate: u64,
    /// Container/codec descriptor.
    pub mime_type: String,
}

/// Produces encoders for a session.
pub trait EncoderFactory {
    /// Build an encoder reading from `stream`.
    ///
    /// With `Some(config)` the factory must honor the configuration or fail with
    /// [`RecorderError::EncoderUnavailable`]. With `None` it builds its default configuration.
    fn create(
        &self,
        stream: CaptureStream,
        config: Option<&EncoderConfig>,
    ) -> RecorderResult<Box<dyn MediaEncoder>>;
}

/// A MediaRecorder-style platform encoder.
pub trait MediaEncoder {
    /// Begin encoding; every event for this session goes to `events`.
    fn start(&mut self, events: EventSender) -> RecorderResult<()>;

    /// Capture bridge: feed one opaque frame.
    fn push_frame(&mut self, frame: &FrameRGBA) -> RecorderResult<()>;

    /// Request finalization. Completion is reported by an [`EncoderEvent::Stopped`].
    fn stop(&mut self) -> RecorderResult<()>;

    /// Mime type of the output this encoder actually produces.
    fn mime_type(&self) -> &str;
}

/// A parsed `type/subtype;codecs=...` descriptor.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MimeSpec {
    /// `type/subtype`, lowercased.
    pub essence: String,
    /// Entries of the `codecs` parameter, in order.
    pub codecs: Vec<String>,
}

impl MimeSpec {
    /// Parse a descriptor such as `video/webm; codecs="vp8, opus"`.
    pub fn parse(mime: &str) -> RecorderResult<Self> {
        let mut parts = mime.split(';');
        let essence = parts.next().unwrap_or_default().trim().to_ascii_lowercase();
        if essence.is_empty() || !essence.contains('/') {
            return Err(RecorderError::validation(format!(
                "invalid mime type '{mime}'"
            )));
        }

        let mut codecs = Vec::new();
        for param in parts {
            let Some((key, value)) = param.split_once('=') else {
                continue;
            };
            if !key.trim().eq_ignore_ascii_case("codecs") {
                continue;
            }
            codecs.extend(
                value
                    .trim()
                    .trim_matches('"')
                    .split(',')
                    .map(|c| c.trim().to_string())
                    .filter(|c| !c.is_empty()),
            );
        }

        Ok(Self { essence, codecs })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_unquoted_codecs() {
        let m = MimeSpec::parse("video/mp4;codecs=avc1.42E01E").unwrap();
        assert_eq!(m.essence, "video/mp4");
        assert_eq!(m.codecs, vec!["avc1.42E01E".to_string()]);
    }

    #[test]
    fn parses_quoted_codec_lists() {
        let m = MimeSpec::parse(r#"Video/WebM; codecs="vp8, opus""#).unwrap();
        assert_eq!(m.essence, "video/webm");
        assert_eq!(m.codecs, vec!["vp8".to_string(), "opus".to_string()]);
    }

    #[test]
    fn bare_essence_has_no_codecs() {
        let m = MimeSpec::parse("video/x-matroska").unwrap();
        assert!(m.codecs.is_empty());
    }

    #[test]
    fn rejects_garbage() {
        assert!(MimeSpec::parse("").is_err());
        assert!(MimeSpec::parse("mp4").is_err());
    }
}
