use std::path::{Component, Path, PathBuf};

use anyhow::Context as _;
use chrono::{DateTime, Local};

use crate::{
    encode::{assembler::Artifact, platform::MimeSpec},
    foundation::error::{RecorderError, RecorderResult},
};

/// Receives finished artifacts under a file name (the browser's "save file" equivalent).
pub trait Downloader {
    /// Persist or hand off `artifact` as `file_name`.
    fn download(&self, artifact: &Artifact, file_name: &str) -> RecorderResult<()>;
}

/// Writes artifacts into a directory, creating it if needed.
#[derive(Clone, Debug)]
pub struct FileDownloader {
    dir: PathBuf,
}

impl FileDownloader {
    /// Save into `dir`.
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Target directory.
    pub fn dir(&self) -> &Path {
        &self.dir
    }
}

impl Downloader for FileDownloader {
    fn download(&self, artifact: &Artifact, file_name: &str) -> RecorderResult<()> {
        std::fs::create_dir_all(&self.dir).with_context(|| {
            format!("failed to create download directory '{}'", self.dir.display())
        })?;
        let Some(name) = Path::new(file_name).file_name() else {
            return Err(RecorderError::validation(format!(
                "download name '{file_name}' has no file component"
            )));
        };
        let path = self.dir.join(name);
        std::fs::write(&path, &artifact.data)
            .with_context(|| format!("failed to write recording '{}'", path.display()))?;
        tracing::info!(path = %path.display(), bytes = artifact.len(), "recording saved");
        Ok(())
    }
}

/// `recording_YYYYMMDD_HHMMSS` in local time.
pub fn timestamp_stem(now: DateTime<Local>) -> String {
    now.format("recording_%Y%m%d_%H%M%S").to_string()
}

/// File extension for a container mime type. Unknown containers fall back to `mp4`.
pub fn extension_for_mime(mime: &str) -> &'static str {
    let Ok(parsed) = MimeSpec::parse(mime) else {
        return "mp4";
    };
    match parsed.essence.as_str() {
        "video/webm" | "audio/webm" => "webm",
        "video/x-matroska" => "mkv",
        "video/quicktime" => "mov",
        "video/ogg" => "ogv",
        _ => "mp4",
    }
}

/// `{stem}.{ext}` with the extension derived from `mime`.
pub fn download_file_name(stem: &str, mime: &str) -> String {
    format!("{stem}.{}", extension_for_mime(mime))
}

/// Reduce a configured stem to a bare file name: the last path component, with any remaining
/// separators replaced. `None` when nothing usable is left (`..`, `/`, empty).
pub fn sanitize_stem(stem: &str) -> Option<String> {
    let last = Path::new(stem).components().next_back()?;
    let Component::Normal(name) = last else {
        return None;
    };
    let name = name.to_string_lossy().replace(['/', '\\', ':'], "_");
    let name = name.trim();
    if name.is_empty() || name == "." || name == ".." {
        return None;
    }
    Some(name.to_string())
}

/// Hand `artifact` to `downloader`. Fire-and-forget: failures are logged, never returned.
///
/// The stem never leaves the downloader's directory: see [`sanitize_stem`].
pub fn download_recording(downloader: &dyn Downloader, artifact: &Artifact, stem: Option<&str>) {
    let stem = match stem.map(|s| (s, sanitize_stem(s))) {
        Some((_, Some(clean))) => clean,
        Some((raw, None)) => {
            tracing::warn!(stem = raw, "unusable download stem, using a timestamp");
            timestamp_stem(Local::now())
        }
        None => timestamp_stem(Local::now()),
    };
    let file_name = download_file_name(&stem, &artifact.mime_type);
    if let Err(e) = downloader.download(artifact, &file_name) {
        tracing::warn!(file = %file_name, error = %e, "download failed");
    }
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;

    use chrono::TimeZone as _;

    use super::*;

    #[derive(Default)]
    struct Recorded(RefCell<Vec<(String, usize)>>);

    impl Downloader for Recorded {
        fn download(&self, artifact: &Artifact, file_name: &str) -> RecorderResult<()> {
            self.0
                .borrow_mut()
                .push((file_name.to_string(), artifact.len()));
            Ok(())
        }
    }

    struct Failing;

    impl Downloader for Failing {
        fn download(&self, _artifact: &Artifact, _file_name: &str) -> RecorderResult<()> {
            Err(RecorderError::validation("disk full"))
        }
    }

    fn artifact(mime: &str, len: usize) -> Artifact {
        Artifact {
            data: vec![7; len],
            mime_type: mime.to_string(),
        }
    }

    #[test]
    fn timestamp_stem_is_zero_padded() {
        let t = Local.with_ymd_and_hms(2024, 3, 7, 9, 5, 2).single().unwrap();
        assert_eq!(timestamp_stem(t), "recording_20240307_090502");
    }

    #[test]
    fn extension_follows_container() {
        assert_eq!(extension_for_mime("video/mp4;codecs=avc1.42E01E"), "mp4");
        assert_eq!(extension_for_mime(r#"video/webm; codecs="vp9""#), "webm");
        assert_eq!(extension_for_mime("video/x-matroska"), "mkv");
        assert_eq!(extension_for_mime("garbage"), "mp4");
        assert_eq!(download_file_name("clip", "video/webm"), "clip.webm");
    }

    #[test]
    fn fixed_stem_is_used_verbatim() {
        let d = Recorded::default();
        download_recording(&d, &artifact("video/mp4", 3), Some("clip"));
        assert_eq!(d.0.borrow().as_slice(), &[("clip.mp4".to_string(), 3)]);
    }

    #[test]
    fn missing_stem_uses_timestamp() {
        let d = Recorded::default();
        download_recording(&d, &artifact("video/mp4", 1), None);
        let name = d.0.borrow()[0].0.clone();
        assert!(name.starts_with("recording_"));
        assert!(name.ends_with(".mp4"));
        assert_eq!(name.len(), "recording_YYYYMMDD_HHMMSS.mp4".len());
    }

    #[test]
    fn download_failures_are_swallowed() {
        download_recording(&Failing, &artifact("video/mp4", 1), Some("x"));
    }

    #[test]
    fn stems_are_reduced_to_a_bare_name() {
        assert_eq!(sanitize_stem("clip").as_deref(), Some("clip"));
        assert_eq!(sanitize_stem("/tmp/escaped/abs").as_deref(), Some("abs"));
        assert_eq!(sanitize_stem("../escaped/rel").as_deref(), Some("rel"));
        assert_eq!(sanitize_stem(".."), None);
        assert_eq!(sanitize_stem("/"), None);
        assert_eq!(sanitize_stem(""), None);
    }

    #[test]
    fn path_like_stems_stay_inside_the_download_dir() {
        let base = std::env::temp_dir().join(format!(
            "canvas_recorder_stems_{}",
            std::process::id()
        ));
        let downloads = base.join("downloads");
        let d = FileDownloader::new(&downloads);
        let abs = base.join("escaped").join("abs");

        download_recording(&d, &artifact("video/mp4", 2), Some(abs.to_str().unwrap()));
        download_recording(&d, &artifact("video/mp4", 2), Some("../escaped/rel"));

        assert!(!base.join("escaped").join("abs.mp4").exists());
        assert!(!base.join("escaped").join("rel.mp4").exists());
        assert!(downloads.join("abs.mp4").exists());
        assert!(downloads.join("rel.mp4").exists());
        let _ = std::fs::remove_dir_all(&base);
    }

    #[test]
    fn parent_dir_stem_falls_back_to_timestamp() {
        let d = Recorded::default();
        download_recording(&d, &artifact("video/webm", 1), Some(".."));
        let name = d.0.borrow()[0].0.clone();
        assert!(name.starts_with("recording_"), "{name}");
        assert!(name.ends_with(".webm"), "{name}");
    }

    #[test]
    fn file_downloader_ignores_directories_in_the_name() {
        let dir = std::env::temp_dir().join(format!(
            "canvas_recorder_download_name_{}",
            std::process::id()
        ));
        let d = FileDownloader::new(&dir);
        d.download(&artifact("video/mp4", 3), "../nested/out.mp4").unwrap();
        assert!(dir.join("out.mp4").exists());
        assert!(d.download(&artifact("video/mp4", 3), "..").is_err());
        let _ = std::fs::remove_dir_all(&dir);
    }

    #[test]
    fn file_downloader_writes_bytes() {
        let dir = std::env::temp_dir().join(format!(
            "canvas_recorder_download_{}",
            std::process::id()
        ));
        let d = FileDownloader::new(&dir);
        d.download(&artifact("video/mp4", 5), "out.mp4").unwrap();
        let bytes = std::fs::read(dir.join("out.mp4")).unwrap();
        assert_eq!(bytes, vec![7; 5]);
        let _ = std::fs::remove_dir_all(&dir);
    }
}
