use std::path::PathBuf;

use anyhow::Context as _;
use canvas_recorder::{
    Artifact, CanvasRecorder, CanvasSource as _, FfmpegEncoderFactory, FileDownloader,
    FixedRateTicker, OffscreenBuffer, RecorderError, RecorderObserver, RecorderOptions,
    SpiralDemo, SpiralParams,
};
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "canvas-recorder", version)]
struct Cli {
    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Record the particle spiral demo to a video file (requires `ffmpeg` on PATH).
    Record(RecordArgs),
    /// Render a single demo frame, flattened the way the recorder sees it, as a PNG.
    Frame(FrameArgs),
    /// Report whether `ffmpeg` is available.
    Probe,
}

#[derive(Parser, Debug)]
struct CanvasArgs {
    /// Canvas width in pixels.
    #[arg(long, default_value_t = 640)]
    width: u32,

    /// Canvas height in pixels.
    #[arg(long, default_value_t = 480)]
    height: u32,

    /// Number of spiral particles.
    #[arg(long, default_value_t = 600)]
    particles: usize,
}

#[derive(Parser, Debug)]
struct RecordArgs {
    #[command(flatten)]
    canvas: CanvasArgs,

    /// Recorder options JSON (keys: fps, videoBitrate, mimeType, filename, autoDownload).
    #[arg(long)]
    config: Option<PathBuf>,

    /// Recording length in seconds of animation.
    #[arg(long, default_value_t = 5.0)]
    seconds: f64,

    /// Override the capture frame rate.
    #[arg(long)]
    fps: Option<u32>,

    /// Override the target bitrate (bits per second).
    #[arg(long)]
    bitrate: Option<u64>,

    /// Override the output mime type, e.g. `video/webm;codecs=vp9`.
    #[arg(long)]
    mime: Option<String>,

    /// Output file stem (default: `recording_YYYYMMDD_HHMMSS`).
    #[arg(long)]
    filename: Option<String>,

    /// Directory downloads are written to.
    #[arg(long, default_value = ".")]
    out_dir: PathBuf,

    /// Keep the artifact in memory instead of saving it.
    #[arg(long)]
    no_download: bool,

    /// Pause for `--pause-for` seconds once this much animation has been recorded.
    #[arg(long)]
    pause_at: Option<f64>,

    /// Length of the pause requested with `--pause-at`.
    #[arg(long, default_value_t = 1.0)]
    pause_for: f64,
}

#[derive(Parser, Debug)]
struct FrameArgs {
    #[command(flatten)]
    canvas: CanvasArgs,

    /// Animation time to render, in seconds.
    #[arg(long, default_value_t = 0.0)]
    time: f64,

    /// Output PNG path.
    #[arg(long)]
    out: PathBuf,
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    match cli.cmd {
        Command::Record(args) => cmd_record(args),
        Command::Frame(args) => cmd_frame(args),
        Command::Probe => cmd_probe(),
    }
}

fn make_demo(args: &CanvasArgs) -> anyhow::Result<SpiralDemo> {
    let params = SpiralParams {
        particles: args.particles,
        ..SpiralParams::default()
    };
    Ok(SpiralDemo::new(args.width, args.height, params)?)
}

struct LogObserver;

impl RecorderObserver for LogObserver {
    fn on_start(&mut self) {
        eprintln!("recording...");
    }

    fn on_stop(&mut self, artifact: &Artifact) {
        eprintln!("stopped: {} bytes ({})", artifact.len(), artifact.mime_type);
    }

    fn on_pause(&mut self) {
        eprintln!("paused");
    }

    fn on_resume(&mut self) {
        eprintln!("resumed");
    }

    fn on_error(&mut self, error: &RecorderError) {
        eprintln!("recorder error: {error}");
    }
}

fn cmd_record(args: RecordArgs) -> anyhow::Result<()> {
    let mut options = match &args.config {
        Some(path) => RecorderOptions::from_json_file(path)?,
        None => RecorderOptions::default(),
    };
    if let Some(fps) = args.fps {
        options.fps = fps;
    }
    if let Some(bitrate) = args.bitrate {
        options.video_bitrate = bitrate;
    }
    if let Some(mime) = args.mime {
        options.mime_type = mime;
    }
    if args.filename.is_some() {
        options.filename = args.filename;
    }
    if args.no_download {
        options.auto_download = false;
    }

    let fps = options.fps.max(1);
    let dt = 1.0 / f64::from(fps);
    let total_frames = (args.seconds.max(0.0) * f64::from(fps)).round() as u64;
    let pause_at = args.pause_at.map(|at| (at.max(0.0) * f64::from(fps)).round() as u64);
    let pause_ticks = (args.pause_for.max(0.0) * f64::from(fps)).round() as u64;

    let mut demo = make_demo(&args.canvas)?;
    let mut recorder = CanvasRecorder::new(
        options,
        FfmpegEncoderFactory::new(),
        FileDownloader::new(&args.out_dir),
    );
    recorder.set_observer(LogObserver);
    recorder.start_recording(&demo)?;

    let mut ticker = FixedRateTicker::new(fps);
    let mut animated = 0u64;
    let mut paused_for = 0u64;
    let artifact = recorder.run(&mut ticker, &mut demo, |demo, rec| {
        if rec.is_paused() {
            paused_for += 1;
            if paused_for < pause_ticks {
                return true;
            }
            rec.resume_recording();
        } else if pause_at == Some(animated) && paused_for == 0 && pause_ticks > 0 {
            rec.pause_recording();
            return true;
        }

        if animated >= total_frames {
            return false;
        }
        demo.advance(dt);
        animated += 1;
        true
    })?;

    match artifact {
        Some(a) if !recorder.options().auto_download => {
            eprintln!("kept {} bytes in memory (download disabled)", a.len());
        }
        Some(_) => eprintln!("saved into {}", args.out_dir.display()),
        None => eprintln!("no recording was produced"),
    }
    Ok(())
}

fn cmd_frame(args: FrameArgs) -> anyhow::Result<()> {
    let mut demo = make_demo(&args.canvas)?;
    demo.advance(args.time);

    let mut buffer = OffscreenBuffer::new(demo.size())?;
    buffer.refresh_from(&demo, RecorderOptions::default().background)?;
    let frame = buffer.frame();

    if let Some(parent) = args.out.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("create output dir '{}'", parent.display()))?;
    }

    image::save_buffer_with_format(
        &args.out,
        &frame.data,
        frame.width,
        frame.height,
        image::ColorType::Rgba8,
        image::ImageFormat::Png,
    )
    .with_context(|| format!("write png '{}'", args.out.display()))?;

    eprintln!("wrote {}", args.out.display());
    Ok(())
}

fn cmd_probe() -> anyhow::Result<()> {
    if canvas_recorder::is_ffmpeg_on_path() {
        println!("ffmpeg: available");
        Ok(())
    } else {
        anyhow::bail!("ffmpeg was not found on PATH");
    }
}
