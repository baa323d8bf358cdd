use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::audio::tone_for;
use crate::config::PlaybackConfig;
use crate::event::EventLog;
use crate::viz::VisualState;
use crate::Result;

/// Comparison point for the by-time model, in log milliseconds.
#[derive(Debug, Default, Clone, Copy, PartialEq)]
pub struct VirtualClock {
    pub elapsed: f64,
}

impl VirtualClock {
    pub fn advance(&mut self, delta: f64) {
        self.elapsed = (self.elapsed + delta).max(0.0);
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SessionState {
    Idle,
    Running,
    /// Stopped by request; ticking may resume.
    Paused,
    /// Every log is exhausted. Terminal.
    Drained,
}

/// One algorithm's log and the picture rebuilt from it so far.
#[derive(Debug, Clone)]
pub struct Stream {
    log: EventLog,
    viz: VisualState,
}

impl Stream {
    pub fn new(log: EventLog) -> Self {
        let viz = VisualState::new(log.name.clone());
        Self { log, viz }
    }

    pub fn log(&self) -> &EventLog {
        &self.log
    }

    pub fn visual(&self) -> &VisualState {
        &self.viz
    }

    pub fn is_exhausted(&self) -> bool {
        self.log.is_empty()
    }
}

/// Outcome of a single tick.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TickReport {
    pub tick: u64,
    pub consumed: usize,
    /// Audio cue frequencies gathered across all streams, in stream order.
    pub tones: Vec<f64>,
    pub drained: bool,
}

/// Multiplexed replay of several event logs.
#[derive(Debug)]
pub struct PlaybackSession {
    streams: Vec<Stream>,
    clock: VirtualClock,
    config: PlaybackConfig,
    ticks: u64,
    state: SessionState,
}

impl PlaybackSession {
    pub fn new(logs: Vec<EventLog>, config: PlaybackConfig) -> Self {
        Self {
            streams: logs.into_iter().map(Stream::new).collect(),
            clock: VirtualClock::default(),
            config,
            ticks: 0,
            state: SessionState::Idle,
        }
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn config(&self) -> &PlaybackConfig {
        &self.config
    }

    pub fn config_mut(&mut self) -> &mut PlaybackConfig {
        &mut self.config
    }

    pub fn clock(&self) -> VirtualClock {
        self.clock
    }

    pub fn ticks(&self) -> u64 {
        self.ticks
    }

    pub fn streams(&self) -> &[Stream] {
        &self.streams
    }

    pub fn is_exhausted(&self) -> bool {
        self.streams.iter().all(Stream::is_exhausted)
    }

    /// Plain copies of every stream's visual state, in stream order.
    pub fn snapshots(&self) -> Vec<VisualState> {
        self.streams.iter().map(|stream| stream.viz.clone()).collect()
    }

    /// Moves to `Running`, or straight to `Drained` when there is nothing
    /// left to play.
    pub fn start(&mut self) {
        let next = if self.is_exhausted() {
            SessionState::Drained
        } else {
            SessionState::Running
        };
        self.transition(next);
    }

    pub fn pause(&mut self) {
        if self.state == SessionState::Running {
            self.transition(SessionState::Paused);
        }
    }

    /// Advances playback by one tick.
    ///
    /// Streams are visited in order. In sequential mode a stream is only
    /// visited when no earlier stream had events left at the start of the
    /// tick. Only a `Running` session moves: in any other state the tick
    /// is a no-op that leaves the clock, the logs and the tick count alone.
    pub fn tick(&mut self) -> Result<TickReport> {
        if self.state != SessionState::Running {
            return Ok(TickReport {
                tick: self.ticks,
                drained: self.state == SessionState::Drained,
                ..Default::default()
            });
        }

        self.ticks += 1;
        self.clock.advance(self.config.step);
        let mut report = TickReport {
            tick: self.ticks,
            ..Default::default()
        };

        let mut earlier_pending = false;
        for stream in &mut self.streams {
            if !self.config.concurrent && earlier_pending {
                break;
            }
            earlier_pending |= !stream.log.is_empty();
            stream.viz.reset_transients();
            report.consumed += advance(stream, &self.config, self.clock.elapsed, &mut report.tones)?;
        }

        debug!(
            tick = report.tick,
            consumed = report.consumed,
            tones = report.tones.len(),
            clock = self.clock.elapsed,
            "tick"
        );

        if self.is_exhausted() {
            self.transition(SessionState::Drained);
            report.drained = true;
        }
        Ok(report)
    }

    fn transition(&mut self, next: SessionState) {
        if self.state != next {
            info!(from = ?self.state, to = ?next, ticks = self.ticks, "playback state");
            self.state = next;
        }
    }
}

/// Applies the eligible prefix of one stream's log and drops it.
fn advance(stream: &mut Stream, config: &PlaybackConfig, now: f64, tones: &mut Vec<f64>) -> Result<usize> {
    let mut budget = config.steps.max(1);
    let mut consumed = 0;
    let mut outcome = Ok(());

    for event in stream.log.events() {
        if !config.by_operation && event.time >= now {
            break;
        }
        if let Err(err) = stream.viz.apply(event) {
            outcome = Err(err);
            break;
        }
        consumed += 1;

        if !(config.tracks(event.field) && event.value.is_set()) {
            continue;
        }
        let value = event
            .index
            .cell()
            .and_then(|index| stream.viz.cell(index))
            .and_then(|cell| cell.value);
        if let Some(value) = value {
            tones.push(tone_for(value));
        }
        if config.by_operation {
            budget -= 1;
            if budget == 0 {
                break;
            }
        }
    }

    stream.log.consume(consumed);
    outcome.map(|()| consumed)
}
