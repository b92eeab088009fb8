use std::{fs::File, io::BufReader, path::Path};

use anyhow::Context as _;

use crate::foundation::error::{RecorderError, RecorderResult};

/// Mime type requested when the caller does not pick one (MP4 container, H.264 baseline).
pub const DEFAULT_MIME_TYPE: &str = "video/mp4;codecs=avc1.42E01E";

/// Recording options.
///
/// Only defaults are applied here; out-of-range values are handed to the encoder as-is and it
/// decides whether it can honor them.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RecorderOptions {
    /// Capture rate in frames per second.
    pub fps: u32,
    /// Target video bitrate in bits per second.
    pub video_bitrate: u64,
    /// Output container/codec descriptor, e.g. `video/webm;codecs=vp9`.
    pub mime_type: String,
    /// Fixed output file stem. `None` derives one from the wall clock at download time.
    pub filename: Option<String>,
    /// Hand the finished artifact to the downloader on stop.
    pub auto_download: bool,
    /// Opaque fill painted under every captured frame (straight RGBA8).
    pub background: [u8; 4],
}

impl Default for RecorderOptions {
    fn default() -> Self {
        Self {
            fps: 60,
            video_bitrate: 30_000_000,
            mime_type: DEFAULT_MIME_TYPE.to_string(),
            filename: None,
            auto_download: true,
            background: [0, 0, 0, 255],
        }
    }
}

impl RecorderOptions {
    /// Parse options from JSON; absent keys keep their defaults.
    pub fn from_json_str(json: &str) -> RecorderResult<Self> {
        serde_json::from_str(json).map_err(|e| RecorderError::serde(e.to_string()))
    }

    /// Load options from a JSON file.
    pub fn from_json_file(path: &Path) -> RecorderResult<Self> {
        let f = File::open(path)
            .with_context(|| format!("open recorder options '{}'", path.display()))?;
        serde_json::from_reader(BufReader::new(f)).map_err(|e| {
            RecorderError::serde(format!(
                "parse recorder options '{}': {e}",
                path.display()
            ))
        })
    }

    /// Builder-style override of the frame rate.
    pub fn with_fps(mut self, fps: u32) -> Self {
        self.fps = fps;
        self
    }

    /// Builder-style override of the output stem.
    pub fn with_filename(mut self, stem: impl Into<String>) -> Self {
        self.filename = Some(stem.into());
        self
    }

    /// Builder-style override of the auto-download flag.
    pub fn with_auto_download(mut self, enabled: bool) -> Self {
        self.auto_download = enabled;
        self
    }

    /// Builder-style override of the mime type.
    pub fn with_mime_type(mut self, mime: impl Into<String>) -> Self {
        self.mime_type = mime.into();
        self
    }
}
