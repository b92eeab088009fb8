use std::sync::mpsc;

use crate::{
    capture::{
        buffer::OffscreenBuffer, options::RecorderOptions, source::CanvasSource,
        ticker::FrameTicker,
    },
    download::{Downloader, download_recording},
    encode::{
        assembler::{Artifact, FragmentAssembler},
        platform::{CaptureStream, EncoderConfig, EncoderEvent, EncoderFactory, MediaEncoder},
    },
    foundation::error::{RecorderError, RecorderResult},
};

/// Lifecycle notifications. Every method defaults to a no-op.
pub trait RecorderObserver {
    /// A session started.
    fn on_start(&mut self) {}
    /// A session finished and produced `artifact`.
    fn on_stop(&mut self, _artifact: &Artifact) {}
    /// The active session was paused.
    fn on_pause(&mut self) {}
    /// The paused session was resumed.
    fn on_resume(&mut self) {}
    /// Setup failed, or the encoder reported a failure.
    fn on_error(&mut self, _error: &RecorderError) {}
}

/// Observer that ignores everything.
#[derive(Debug, Default)]
pub struct NoopObserver;

impl RecorderObserver for NoopObserver {}

/// What a single [`CanvasRecorder::tick`] did.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TickOutcome {
    /// No session is active; nothing happened.
    Inactive,
    /// The buffer was refreshed from the source and fed to the encoder.
    Copied,
    /// Paused: the stale buffer was fed to the encoder without a refresh.
    Paused,
}

struct Session {
    id: u64,
    paused: bool,
    encoder: Box<dyn MediaEncoder>,
    events: mpsc::Receiver<EncoderEvent>,
    fragments: FragmentAssembler,
    buffer: OffscreenBuffer,
    frames_fed: u64,
    encoder_stopped: bool,
}

/// Records a [`CanvasSource`] into a video [`Artifact`].
///
/// At most one session exists at a time. The source is passed to [`start_recording`] and to
/// every [`tick`]; the recorder never keeps a reference to it between calls.
///
/// [`start_recording`]: CanvasRecorder::start_recording
/// [`tick`]: CanvasRecorder::tick
pub struct CanvasRecorder {
    options: RecorderOptions,
    factory: Box<dyn EncoderFactory>,
    downloader: Box<dyn Downloader>,
    observer: Box<dyn RecorderObserver>,
    session: Option<Session>,
    next_session_id: u64,
}

impl CanvasRecorder {
    /// Configure a recorder. Nothing is allocated until [`CanvasRecorder::start_recording`].
    pub fn new(
        options: RecorderOptions,
        factory: impl EncoderFactory + 'static,
        downloader: impl Downloader + 'static,
    ) -> Self {
        Self {
            options,
            factory: Box::new(factory),
            downloader: Box::new(downloader),
            observer: Box::new(NoopObserver),
            session: None,
            next_session_id: 1,
        }
    }

    /// Install the lifecycle observer, replacing the previous one.
    pub fn set_observer(&mut self, observer: impl RecorderObserver + 'static) {
        self.observer = Box::new(observer);
    }

    /// Options this recorder was configured with.
    pub fn options(&self) -> &RecorderOptions {
        &self.options
    }

    /// Whether a session is active.
    pub fn is_recording(&self) -> bool {
        self.session.is_some()
    }

    /// Whether the active session is paused. Always `false` when idle.
    pub fn is_paused(&self) -> bool {
        self.session.as_ref().is_some_and(|s| s.paused)
    }

    /// Offscreen buffer of the active session.
    pub fn buffer(&self) -> Option<&OffscreenBuffer> {
        self.session.as_ref().map(|s| &s.buffer)
    }

    /// Frames handed to the encoder in the active session.
    pub fn frames_fed(&self) -> u64 {
        self.session.as_ref().map_or(0, |s| s.frames_fed)
    }

    /// Start a session sized to `source`.
    ///
    /// Ignored while a session is already active. If the encoder cannot be built with the
    /// configured mime type/bitrate, the factory's default encoder is used instead.
    #[tracing::instrument(skip_all, fields(fps = self.options.fps))]
    pub fn start_recording(&mut self, source: &dyn CanvasSource) -> RecorderResult<()> {
        if self.session.is_some() {
            tracing::debug!("start ignored: a session is already active");
            return Ok(());
        }

        match self.open_session(source) {
            Ok(session) => {
                tracing::info!(
                    session = session.id,
                    width = session.buffer.size().width,
                    height = session.buffer.size().height,
                    mime = session.encoder.mime_type(),
                    "recording started"
                );
                self.session = Some(session);
                self.observer.on_start();
                Ok(())
            }
            Err(e) => {
                tracing::error!(error = %e, "failed to start recording");
                self.observer.on_error(&e);
                Err(e)
            }
        }
    }

    fn open_session(&mut self, source: &dyn CanvasSource) -> RecorderResult<Session> {
        let mut buffer = OffscreenBuffer::new(source.size())?;
        let stream = CaptureStream {
            size: buffer.size(),
            fps: self.options.fps,
        };
        let config = EncoderConfig {
            video_bitrate: self.options.video_bitrate,
            mime_type: self.options.mime_type.clone(),
        };

        let mut encoder = match self.factory.create(stream, Some(&config)) {
            Ok(encoder) => encoder,
            Err(e) if e.is_encoder_unavailable() => {
                tracing::warn!(
                    mime = %config.mime_type,
                    bitrate = config.video_bitrate,
                    error = %e,
                    "requested encoder unavailable, falling back to default configuration"
                );
                self.factory.create(stream, None)?
            }
            Err(e) => return Err(e),
        };

        let (tx, rx) = mpsc::channel();
        encoder.start(tx)?;

        buffer.refresh_from(source, self.options.background)?;

        let id = self.next_session_id;
        self.next_session_id += 1;

        Ok(Session {
            id,
            paused: false,
            encoder,
            events: rx,
            fragments: FragmentAssembler::new(),
            buffer,
            frames_fed: 0,
            encoder_stopped: false,
        })
    }

    /// One iteration of the frame-copy loop.
    ///
    /// Drains pending encoder events, refreshes the buffer from `source` unless paused, and feeds
    /// the buffer to the encoder.
    pub fn tick(&mut self, source: &dyn CanvasSource) -> RecorderResult<TickOutcome> {
        let Some(session) = self.session.as_mut() else {
            return Ok(TickOutcome::Inactive);
        };

        drain_pending(session, self.observer.as_mut());

        let outcome = if session.paused {
            TickOutcome::Paused
        } else {
            session
                .buffer
                .refresh_from(source, self.options.background)?;
            TickOutcome::Copied
        };

        session.encoder.push_frame(session.buffer.frame())?;
        session.frames_fed += 1;
        Ok(outcome)
    }

    /// Drive [`CanvasRecorder::tick`] at `ticker`'s cadence until the session ends.
    ///
    /// `frame` is called before every tick to let the caller update its canvas; returning `false`
    /// stops the recording and ends the loop. Returns the artifact of the stopped session, or
    /// `None` if no session was active.
    ///
    /// Stop by returning `false` from `frame`. Calling [`CanvasRecorder::stop_recording`] inside
    /// the closure also ends the loop, but its artifact is not returned from `run`.
    pub fn run<S, F>(
        &mut self,
        ticker: &mut dyn FrameTicker,
        source: &mut S,
        mut frame: F,
    ) -> RecorderResult<Option<Artifact>>
    where
        S: CanvasSource,
        F: FnMut(&mut S, &mut Self) -> bool,
    {
        while self.is_recording() {
            ticker.wait_next_tick();
            if !frame(&mut *source, &mut *self) {
                return self.stop_recording();
            }
            self.tick(&*source)?;
        }
        Ok(None)
    }

    /// Pause the active session. The encoder keeps running on the last copied frame.
    pub fn pause_recording(&mut self) {
        let Some(session) = self.session.as_mut() else {
            return;
        };
        if session.paused {
            return;
        }
        session.paused = true;
        tracing::debug!(session = session.id, "recording paused");
        self.observer.on_pause();
    }

    /// Resume a paused session.
    pub fn resume_recording(&mut self) {
        let Some(session) = self.session.as_mut() else {
            return;
        };
        if !session.paused {
            return;
        }
        session.paused = false;
        tracing::debug!(session = session.id, "recording resumed");
        self.observer.on_resume();
    }

    /// Finalize the active session and return its artifact.
    ///
    /// Returns `Ok(None)` without side effects when no session is active. Otherwise blocks until
    /// the encoder reports completion (there is no timeout), then downloads the artifact if
    /// `auto_download` is set and notifies the observer.
    #[tracing::instrument(skip_all)]
    pub fn stop_recording(&mut self) -> RecorderResult<Option<Artifact>> {
        let Some(mut session) = self.session.take() else {
            return Ok(None);
        };

        if let Err(e) = session.encoder.stop() {
            tracing::warn!(session = session.id, error = %e, "encoder stop request failed");
            self.observer.on_error(&e);
        }

        while !session.encoder_stopped {
            match session.events.recv() {
                Ok(EncoderEvent::DataAvailable(chunk)) => {
                    session.fragments.push(chunk);
                }
                Ok(EncoderEvent::Error(msg)) => report_encoder_error(
                    session.id,
                    RecorderError::encode(msg),
                    self.observer.as_mut(),
                ),
                Ok(EncoderEvent::Stopped) => session.encoder_stopped = true,
                Err(mpsc::RecvError) => {
                    tracing::warn!(
                        session = session.id,
                        "encoder dropped its event queue without a stop notification"
                    );
                    break;
                }
            }
        }

        tracing::info!(
            session = session.id,
            bytes = session.fragments.byte_len(),
            fragments = session.fragments.fragment_count(),
            frames = session.frames_fed,
            "recording stopped"
        );
        let artifact = session.fragments.finish(self.options.mime_type.clone());

        if self.options.auto_download {
            download_recording(
                self.downloader.as_ref(),
                &artifact,
                self.options.filename.as_deref(),
            );
        }

        self.observer.on_stop(&artifact);
        Ok(Some(artifact))
    }
}

fn drain_pending(session: &mut Session, observer: &mut dyn RecorderObserver) {
    while let Ok(event) = session.events.try_recv() {
        match event {
            EncoderEvent::DataAvailable(chunk) => {
                session.fragments.push(chunk);
            }
            EncoderEvent::Error(msg) => {
                report_encoder_error(session.id, RecorderError::encode(msg), observer)
            }
            EncoderEvent::Stopped => {
                tracing::warn!(session = session.id, "encoder stopped before stop request");
                session.encoder_stopped = true;
            }
        }
    }
}

fn report_encoder_error(session: u64, err: RecorderError, observer: &mut dyn RecorderObserver) {
    tracing::warn!(session, error = %err, "encoder reported an error");
    observer.on_error(&err);
}
