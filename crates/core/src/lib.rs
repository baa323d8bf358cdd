//! Core library for Algoviz.
//!
//! Algorithms run against an [`InstrumentedSequence`], which turns every
//! read, write and comparison into timestamped [`Event`]s. [`capture_script`]
//! collects those into an [`EventLog`] per algorithm, and a
//! [`PlaybackSession`] replays several logs side by side under a virtual
//! clock, rebuilding a [`VisualState`] per stream and emitting audio cues to
//! a [`ToneSink`]. [`run_playback`] and [`Animator`] drive the session on a
//! timer.

pub mod algorithms;
pub mod audio;
pub mod capture;
pub mod config;
pub mod error;
pub mod event;
pub mod instrument;
pub mod player;
pub mod seed;
pub mod timeline;
pub mod viz;

pub use algorithms::Algorithm;
pub use audio::{tone_for, RecordingSink, SilentSink, ToneCue, ToneSchedule, ToneSink, TracingToneSink};
pub use capture::{capture_all, capture_script, Comparator};
pub use config::{AppConfig, CaptureConfig, PlaybackConfig};
pub use error::{AlgovizError, Result};
pub use event::{Event, EventLog, EventValue, Field, Slot, Value};
pub use instrument::{CaptureContext, Cell, InstrumentedSequence};
pub use player::{run_playback, Animator, NoOpObserver, RunOutcome, RunSummary, StopHandle, TickObserver};
pub use seed::{random_permutation, seeded_rng};
pub use timeline::{PlaybackSession, SessionState, Stream, TickReport, VirtualClock};
pub use viz::{CellView, VisualState};
