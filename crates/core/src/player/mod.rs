//! Timer-driven playback loop and the controller that records, starts,
//! stops and clears an animation.
//!
//! The loop runs on the caller's task: each iteration runs one tick to
//! completion, hands the tones to the sink, then waits for the tick
//! interval or a stop request, whichever comes first. A stop is only
//! observed between ticks.

use std::sync::{
    atomic::{AtomicBool, Ordering},
    Arc,
};

use rand::rngs::StdRng;
use tokio::sync::Notify;
use tracing::info;

use crate::audio::ToneSink;
use crate::capture::capture_all;
use crate::config::AppConfig;
use crate::event::Value;
use crate::seed::{random_permutation, seeded_rng};
use crate::timeline::{PlaybackSession, SessionState, TickReport};
use crate::Result;

/// Cloneable request to stop a running playback loop.
#[derive(Debug, Clone)]
pub struct StopHandle {
    inner: Arc<StopSignal>,
}

#[derive(Debug)]
struct StopSignal {
    requested: AtomicBool,
    notify: Notify,
}

impl StopHandle {
    pub fn new() -> Self {
        Self {
            inner: Arc::new(StopSignal {
                requested: AtomicBool::new(false),
                notify: Notify::new(),
            }),
        }
    }

    /// Asks the loop to stop at the next tick boundary and cuts short any
    /// wait already in progress.
    pub fn request_stop(&self) {
        self.inner.requested.store(true, Ordering::Release);
        self.inner.notify.notify_one();
    }

    pub fn is_stop_requested(&self) -> bool {
        self.inner.requested.load(Ordering::Acquire)
    }

    /// Withdraws a previous stop request.
    pub fn reset(&self) {
        self.inner.requested.store(false, Ordering::Release);
    }

    async fn stopped(&self) {
        while !self.is_stop_requested() {
            self.inner.notify.notified().await;
        }
    }
}

impl Default for StopHandle {
    fn default() -> Self {
        Self::new()
    }
}

/// Renderer boundary: receives every tick's report and the session it
/// was produced from.
pub trait TickObserver {
    fn on_tick(&mut self, report: &TickReport, session: &PlaybackSession);
}

/// Observer that ignores every tick.
pub struct NoOpObserver;

impl TickObserver for NoOpObserver {
    fn on_tick(&mut self, _report: &TickReport, _session: &PlaybackSession) {}
}

/// Why a playback loop returned.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunOutcome {
    Drained,
    Stopped,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RunSummary {
    pub outcome: RunOutcome,
    /// Ticks executed by this call.
    pub ticks: u64,
}

/// Drives `session` until it drains or `stop` is requested.
///
/// # Errors
///
/// Fails before the first tick when the playback settings could never
/// drain the session. Otherwise returns the first error raised while
/// applying events, leaving the session paused and the tone stopped.
pub async fn run_playback(
    session: &mut PlaybackSession,
    sink: &mut dyn ToneSink,
    observer: &mut dyn TickObserver,
    stop: &StopHandle,
) -> Result<RunSummary> {
    session.config().validate()?;
    session.start();
    let mut ticks = 0;

    info!(
        streams = session.streams().len(),
        interval_ms = session.config().interval_ms,
        by_operation = session.config().by_operation,
        concurrent = session.config().concurrent,
        "playback starting"
    );

    loop {
        if session.state() == SessionState::Drained {
            sink.stop_tone();
            return Ok(RunSummary {
                outcome: RunOutcome::Drained,
                ticks,
            });
        }

        if stop.is_stop_requested() {
            info!(ticks, "playback stopped");
            session.pause();
            sink.stop_tone();
            return Ok(RunSummary {
                outcome: RunOutcome::Stopped,
                ticks,
            });
        }

        let interval = session.config().interval();
        let report = match session.tick() {
            Ok(report) => report,
            Err(err) => {
                session.pause();
                sink.stop_tone();
                return Err(err);
            }
        };
        ticks += 1;

        sink.queue_tones(&report.tones, interval);
        observer.on_tick(&report, session);

        if report.drained {
            continue;
        }

        tokio::select! {
            _ = tokio::time::sleep(interval) => {}
            _ = stop.stopped() => {}
        }
    }
}

/// Records the configured algorithms against a seed array and plays the
/// resulting logs, supporting stop, resume and clear.
#[derive(Debug)]
pub struct Animator<S> {
    config: AppConfig,
    rng: StdRng,
    seed_values: Option<Vec<Value>>,
    session: Option<PlaybackSession>,
    sink: S,
    audio_ready: bool,
}

impl<S: ToneSink> Animator<S> {
    pub fn new(config: AppConfig, sink: S) -> Self {
        let rng = seeded_rng(config.capture.seed);
        Self {
            config,
            rng,
            seed_values: None,
            session: None,
            sink,
            audio_ready: false,
        }
    }

    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    pub fn state(&self) -> SessionState {
        self.session
            .as_ref()
            .map(PlaybackSession::state)
            .unwrap_or(SessionState::Idle)
    }

    pub fn session(&self) -> Option<&PlaybackSession> {
        self.session.as_ref()
    }

    pub fn seed_values(&self) -> Option<&[Value]> {
        self.seed_values.as_deref()
    }

    pub fn sink(&self) -> &S {
        &self.sink
    }

    /// Captures a fresh set of logs. A new seed array is drawn on the first
    /// recording, and on later ones when `reseed_on_restart` is set.
    pub fn record(&mut self) -> Result<()> {
        let capture = &self.config.capture;
        let seed = match self.seed_values.take() {
            Some(seed) if !capture.reseed_on_restart => seed,
            _ => random_permutation(capture.size, &mut self.rng),
        };

        let logs = capture_all(&seed, &capture.algorithms);
        let size = seed.len();
        self.seed_values = Some(seed);
        let logs = logs?;

        info!(
            size,
            streams = logs.len(),
            events = logs.iter().map(|log| log.len()).sum::<usize>(),
            "recorded scripts"
        );
        self.session = Some(PlaybackSession::new(logs, self.config.playback.clone()));
        Ok(())
    }

    /// Drops all logs and visual state. The next start records again.
    pub fn clear(&mut self) {
        self.session = None;
    }

    /// Starts or resumes playback. Records first when nothing is loaded.
    /// Any stop request left on `stop` from an earlier run is withdrawn.
    pub async fn start(&mut self, observer: &mut dyn TickObserver, stop: &StopHandle) -> Result<RunSummary> {
        if !self.audio_ready {
            self.sink.init_audio()?;
            self.audio_ready = true;
        }
        if self.session.is_none() {
            self.record()?;
        }
        stop.reset();

        match self.session.as_mut() {
            Some(session) => run_playback(session, &mut self.sink, observer, stop).await,
            None => Err("no session recorded".into()),
        }
    }
}
