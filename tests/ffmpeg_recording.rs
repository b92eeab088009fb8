#[cfg(feature = "media-ffmpeg")]
mod ffmpeg_recording {
    use canvas_recorder::{
        CanvasRecorder, FfmpegEncoderFactory, FileDownloader, RecorderOptions, SpiralDemo,
        SpiralParams, is_ffmpeg_on_path,
    };

    fn small_demo() -> SpiralDemo {
        let params = SpiralParams {
            particles: 120,
            ..SpiralParams::default()
        };
        SpiralDemo::new(64, 48, params).unwrap()
    }

    fn record(options: RecorderOptions, frames: u32) -> Option<canvas_recorder::Artifact> {
        let out_dir = std::env::temp_dir().join(format!(
            "canvas_recorder_ffmpeg_{}",
            std::process::id()
        ));
        let mut demo = small_demo();
        let mut recorder = CanvasRecorder::new(
            options,
            FfmpegEncoderFactory::new(),
            FileDownloader::new(&out_dir),
        );
        recorder.start_recording(&demo).unwrap();
        for _ in 0..frames {
            demo.advance(1.0 / 30.0);
            recorder.tick(&demo).unwrap();
        }
        recorder.stop_recording().unwrap()
    }

    #[test]
    fn records_fragmented_mp4_in_memory() {
        if !is_ffmpeg_on_path() {
            eprintln!("skipping: ffmpeg not on PATH");
            return;
        }

        let options = RecorderOptions::default()
            .with_fps(30)
            .with_auto_download(false);
        let artifact = record(options, 15).unwrap();

        assert!(artifact.len() > 8);
        assert_eq!(&artifact.data[4..8], b"ftyp");
    }

    #[test]
    fn unsupported_mime_falls_back_to_default_mp4() {
        if !is_ffmpeg_on_path() {
            eprintln!("skipping: ffmpeg not on PATH");
            return;
        }

        let options = RecorderOptions::default()
            .with_fps(30)
            .with_mime_type("video/ogg;codecs=theora")
            .with_auto_download(false);
        let artifact = record(options, 10).unwrap();

        assert_eq!(&artifact.data[4..8], b"ftyp");
        // The tag stays the configured one even though the fallback produced MP4.
        assert_eq!(artifact.mime_type, "video/ogg;codecs=theora");
    }

    #[test]
    fn auto_download_writes_the_file() {
        if !is_ffmpeg_on_path() {
            eprintln!("skipping: ffmpeg not on PATH");
            return;
        }

        let options = RecorderOptions::default()
            .with_fps(30)
            .with_filename("spiral_clip");
        let artifact = record(options, 10).unwrap();

        let path = std::env::temp_dir()
            .join(format!("canvas_recorder_ffmpeg_{}", std::process::id()))
            .join("spiral_clip.mp4");
        let bytes = std::fs::read(&path).unwrap();
        assert_eq!(bytes, artifact.data);
        let _ = std::fs::remove_file(&path);
    }
}
