//! Acquisition session management.

use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use serde::Serialize;
use sunlapse_common::clock::{CaptureClock, LocalClock};
use sunlapse_common::error::{SunlapseError, SunlapseResult};
use sunlapse_frame_model::catalog::SourceCatalog;
use sunlapse_frame_model::naming::Frame;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use crate::countdown::{countdown, WaitOutcome};
use crate::fetch::{FrameFetcher, HttpFetcher};

/// Parameters of one acquisition run.
#[derive(Debug, Clone)]
pub struct AcquisitionParams {
    /// Number of frames to acquire.
    pub num_images: u32,

    /// Seconds to wait between two fetches.
    pub interval_secs: u64,

    /// Directory frames are written to. Created if absent.
    pub target_dir: PathBuf,

    /// Catalog name of the feed to fetch.
    pub source: String,

    /// Sequence number of the first frame.
    pub start_number: u64,
}

impl AcquisitionParams {
    /// Check the parameters against `catalog` and return the feed URL.
    pub fn validate(&self, catalog: &SourceCatalog) -> SunlapseResult<&'static str> {
        if self.num_images == 0 {
            return Err(SunlapseError::invalid_input(
                "number of images must be positive",
            ));
        }
        if self.interval_secs == 0 {
            return Err(SunlapseError::invalid_input("time interval must be positive"));
        }
        if self.start_number < 1 {
            return Err(SunlapseError::invalid_input(
                "start number must be at least 1",
            ));
        }
        if self
            .start_number
            .checked_add(u64::from(self.num_images) - 1)
            .is_none()
        {
            return Err(SunlapseError::invalid_input(
                "start number plus image count overflows the sequence range",
            ));
        }
        catalog.url_for(&self.source)
    }

    /// Sequence number of the last frame of the run.
    pub fn last_sequence(&self) -> u64 {
        self.start_number + (u64::from(self.num_images) - 1)
    }
}

/// Session tuning that is not part of a run's parameters.
#[derive(Debug, Clone, Copy)]
pub struct SessionOptions {
    /// Length of one countdown step. One second outside of tests.
    pub tick: Duration,
}

impl Default for SessionOptions {
    fn default() -> Self {
        Self {
            tick: Duration::from_secs(1),
        }
    }
}

/// Status updates emitted by a run, in the order the events happen.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum StatusEvent {
    /// A frame was written under `filename`.
    Saved { filename: String },
    /// The next fetch happens in `seconds_remaining` seconds.
    Countdown { seconds_remaining: u64 },
    /// All requested frames were written.
    Completed,
    /// The run was stopped before reaching its quota.
    Stopped,
    /// A fetch or decode error ended the run.
    Failed { cause: String },
}

/// Terminal state of a run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunOutcome {
    Completed,
    Stopped,
    Failed { cause: String },
}

/// Result of a finished run.
#[derive(Debug, Clone)]
pub struct RunReport {
    pub outcome: RunOutcome,

    /// Paths of the frames written, in sequence order.
    pub frames: Vec<PathBuf>,
}

/// Whether the session currently has a run in progress.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Idle,
    Running,
}

/// Shared run state. The token is the run/stop flag; cancelling it is the
/// only way a run is told to stop.
#[derive(Debug, Default)]
struct RunState {
    token: Option<CancellationToken>,
    active_runs: usize,
    last_outcome: Option<RunOutcome>,
}

/// Owns the run/stop state and spawns acquisition runs.
pub struct AcquisitionSession {
    fetcher: Arc<dyn FrameFetcher>,
    clock: Arc<dyn CaptureClock>,
    catalog: SourceCatalog,
    options: SessionOptions,
    state: Arc<Mutex<RunState>>,
}

impl AcquisitionSession {
    /// Create a session fetching through `fetcher`.
    pub fn new(fetcher: Arc<dyn FrameFetcher>) -> Self {
        Self {
            fetcher,
            clock: Arc::new(LocalClock),
            catalog: SourceCatalog::builtin(),
            options: SessionOptions::default(),
            state: Arc::new(Mutex::new(RunState::default())),
        }
    }

    /// Create a session using the HTTP fetcher with the standard timeout.
    pub fn with_http() -> SunlapseResult<Self> {
        Ok(Self::new(Arc::new(HttpFetcher::new()?)))
    }

    pub fn with_clock(mut self, clock: Arc<dyn CaptureClock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn with_options(mut self, options: SessionOptions) -> Self {
        self.options = options;
        self
    }

    pub fn catalog(&self) -> &SourceCatalog {
        &self.catalog
    }

    /// Current session state.
    pub fn state(&self) -> SessionState {
        if lock(&self.state).active_runs > 0 {
            SessionState::Running
        } else {
            SessionState::Idle
        }
    }

    pub fn is_running(&self) -> bool {
        self.state() == SessionState::Running
    }

    /// Outcome of the most recently finished run.
    pub fn last_outcome(&self) -> Option<RunOutcome> {
        lock(&self.state).last_outcome.clone()
    }

    /// Start a run.
    ///
    /// Parameters are validated before anything else; on failure nothing
    /// is created and no task is spawned. Concurrent runs on one session
    /// share its run flag, so `stop()` stops all of them.
    pub async fn start(&self, params: AcquisitionParams) -> SunlapseResult<RunHandle> {
        let url = params.validate(&self.catalog)?;

        tokio::fs::create_dir_all(&params.target_dir).await?;

        let token = {
            let mut state = lock(&self.state);
            let live = state
                .token
                .as_ref()
                .filter(|t| state.active_runs > 0 && !t.is_cancelled())
                .cloned();
            let token = match live {
                Some(token) => token,
                None => {
                    let token = CancellationToken::new();
                    state.token = Some(token.clone());
                    token
                }
            };
            state.active_runs += 1;
            token
        };

        tracing::info!(
            source = %params.source,
            url,
            num_images = params.num_images,
            interval_secs = params.interval_secs,
            start_number = params.start_number,
            dir = %params.target_dir.display(),
            "Starting acquisition run"
        );

        let (events_tx, events_rx) = mpsc::unbounded_channel();
        let run = Run {
            fetcher: self.fetcher.clone(),
            clock: self.clock.clone(),
            url,
            params,
            tick: self.options.tick,
            token: token.clone(),
            events: events_tx,
            state: self.state.clone(),
        };
        let task = tokio::spawn(run.execute());

        Ok(RunHandle {
            events: events_rx,
            task,
            token,
        })
    }

    /// Request the current run to stop. No-op when nothing is running.
    pub fn stop(&self) {
        let state = lock(&self.state);
        match &state.token {
            Some(token) if !token.is_cancelled() => {
                tracing::info!("Stopping acquisition run");
                token.cancel();
            }
            _ => tracing::debug!("Stop requested with no active run"),
        }
    }
}

/// Caller-side handle of a spawned run.
pub struct RunHandle {
    events: mpsc::UnboundedReceiver<StatusEvent>,
    task: JoinHandle<RunReport>,
    token: CancellationToken,
}

impl RunHandle {
    /// Next status event; `None` once the run has ended and all events
    /// were consumed.
    pub async fn next_event(&mut self) -> Option<StatusEvent> {
        self.events.recv().await
    }

    /// Request this run to stop.
    pub fn stop(&self) {
        self.token.cancel();
    }

    /// Wait for the run to end, discarding unread events.
    pub async fn wait(self) -> SunlapseResult<RunReport> {
        self.task
            .await
            .map_err(|e| SunlapseError::Other(anyhow::anyhow!("acquisition task failed: {e}")))
    }

    /// Drain every event and wait for the run to end.
    pub async fn collect(mut self) -> SunlapseResult<(Vec<StatusEvent>, RunReport)> {
        let mut events = Vec::new();
        while let Some(event) = self.events.recv().await {
            events.push(event);
        }
        let report = self.wait().await?;
        Ok((events, report))
    }
}

struct Run {
    fetcher: Arc<dyn FrameFetcher>,
    clock: Arc<dyn CaptureClock>,
    url: &'static str,
    params: AcquisitionParams,
    tick: Duration,
    token: CancellationToken,
    events: mpsc::UnboundedSender<StatusEvent>,
    state: Arc<Mutex<RunState>>,
}

impl Run {
    async fn execute(self) -> RunReport {
        let mut frames = Vec::new();
        let mut sequence = self.params.start_number;
        let last = self.params.last_sequence();

        loop {
            if self.token.is_cancelled() {
                return self.finish(RunOutcome::Stopped, frames);
            }

            let saved = match self.acquire_one(sequence).await {
                Ok(path) => path,
                Err(e) => {
                    tracing::error!(error = %e, sequence, "Acquisition failed");
                    return self.finish(
                        RunOutcome::Failed {
                            cause: e.to_string(),
                        },
                        frames,
                    );
                }
            };

            let filename = saved
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_default();
            tracing::info!(frame = %filename, sequence, "Frame saved");
            self.emit(StatusEvent::Saved { filename });
            frames.push(saved);

            if sequence >= last {
                break;
            }
            sequence += 1;

            let outcome = countdown(self.params.interval_secs, self.tick, &self.token, |s| {
                self.emit(StatusEvent::Countdown {
                    seconds_remaining: s,
                })
            })
            .await;
            if outcome == WaitOutcome::Cancelled {
                return self.finish(RunOutcome::Stopped, frames);
            }
        }

        // A stop that arrives during the final fetch still wins.
        if self.token.is_cancelled() {
            self.finish(RunOutcome::Stopped, frames)
        } else {
            self.finish(RunOutcome::Completed, frames)
        }
    }

    async fn acquire_one(&self, sequence: u64) -> SunlapseResult<PathBuf> {
        let bytes = self.fetcher.fetch(self.url).await?;
        let frame = Frame::new(self.clock.today(), sequence);
        let dir = self.params.target_dir.clone();

        tokio::task::spawn_blocking(move || persist_frame(&bytes, &dir, &frame))
            .await
            .map_err(|e| SunlapseError::Other(anyhow::anyhow!("frame writer panicked: {e}")))?
    }

    fn emit(&self, event: StatusEvent) {
        // The caller may have dropped its handle; the run continues regardless.
        let _ = self.events.send(event);
    }

    fn finish(&self, outcome: RunOutcome, frames: Vec<PathBuf>) -> RunReport {
        {
            // Cancel under the lock so a caller that observes Idle can
            // never join this run's token.
            let mut state = lock(&self.state);
            self.token.cancel();
            state.active_runs = state.active_runs.saturating_sub(1);
            if state.active_runs == 0 {
                state.token = None;
            }
            state.last_outcome = Some(outcome.clone());
        }

        match &outcome {
            RunOutcome::Completed => {
                tracing::info!(frames = frames.len(), "Acquisition complete");
                self.emit(StatusEvent::Completed);
            }
            RunOutcome::Stopped => {
                tracing::info!(frames = frames.len(), "Acquisition stopped");
                self.emit(StatusEvent::Stopped);
            }
            RunOutcome::Failed { cause } => {
                self.emit(StatusEvent::Failed {
                    cause: cause.clone(),
                });
            }
        }

        RunReport { outcome, frames }
    }
}

/// Decode fetched bytes and write them as a JPEG frame.
///
/// The image is written to `<name>.part` first and renamed into place, so
/// readers of the directory never list a partially written frame.
pub fn persist_frame(bytes: &[u8], dir: &Path, frame: &Frame) -> SunlapseResult<PathBuf> {
    let filename = frame.filename();
    let image =
        image::load_from_memory(bytes).map_err(|e| SunlapseError::decode(filename.as_str(), e))?;

    let final_path = dir.join(&filename);
    let part_path = dir.join(format!("{filename}.part"));

    let rgb = image::DynamicImage::ImageRgb8(image.to_rgb8());
    if let Err(e) = rgb.save_with_format(&part_path, image::ImageFormat::Jpeg) {
        let _ = std::fs::remove_file(&part_path);
        return Err(SunlapseError::encode(format!(
            "Failed to write {}: {e}",
            part_path.display()
        )));
    }
    std::fs::rename(&part_path, &final_path)?;

    Ok(final_path)
}

fn lock(state: &Mutex<RunState>) -> MutexGuard<'_, RunState> {
    state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}
