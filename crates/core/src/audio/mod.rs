use std::time::Duration;

use tracing::trace;

use crate::event::Value;
use crate::Result;

/// Tone frequency (Hz) associated with a cell value.
pub fn tone_for(value: Value) -> f64 {
    100.0 + value as f64 * 10.0
}

/// Output channel for audio cues. Playback hands over one batch per tick
/// and never waits for it to finish sounding.
pub trait ToneSink {
    /// Prepares the single oscillator/amplifier pair shared by all streams.
    fn init_audio(&mut self) -> Result<()>;

    /// Reprograms the channel with `frequencies`, spread across `interval`.
    fn queue_tones(&mut self, frequencies: &[f64], interval: Duration);

    /// Silences the channel.
    fn stop_tone(&mut self);
}

/// A frequency scheduled at an offset from the start of a tick.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ToneCue {
    pub offset: Duration,
    pub frequency: f64,
}

/// Evenly spaced cue list for one tick.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ToneSchedule {
    cues: Vec<ToneCue>,
}

impl ToneSchedule {
    pub fn spread(frequencies: &[f64], interval: Duration) -> Self {
        let cues = if frequencies.is_empty() {
            Vec::new()
        } else {
            let slot = interval / frequencies.len() as u32;
            frequencies
                .iter()
                .enumerate()
                .map(|(i, frequency)| ToneCue {
                    offset: slot * i as u32,
                    frequency: *frequency,
                })
                .collect()
        };
        Self { cues }
    }

    pub fn cues(&self) -> &[ToneCue] {
        &self.cues
    }

    pub fn is_empty(&self) -> bool {
        self.cues.is_empty()
    }
}

/// Sink that reports cue schedules through `tracing` instead of sound.
#[derive(Debug, Default)]
pub struct TracingToneSink {
    sounding: bool,
}

impl TracingToneSink {
    pub fn new() -> Self {
        Self::default()
    }
}

impl ToneSink for TracingToneSink {
    fn init_audio(&mut self) -> Result<()> {
        trace!("audio channel ready");
        Ok(())
    }

    fn queue_tones(&mut self, frequencies: &[f64], interval: Duration) {
        let schedule = ToneSchedule::spread(frequencies, interval);
        if schedule.is_empty() {
            return;
        }
        self.sounding = true;
        trace!(cues = ?schedule.cues(), "queued tones");
    }

    fn stop_tone(&mut self) {
        if std::mem::take(&mut self.sounding) {
            trace!("tone stopped");
        }
    }
}

/// Sink that discards everything.
#[derive(Debug, Default, Clone, Copy)]
pub struct SilentSink;

impl ToneSink for SilentSink {
    fn init_audio(&mut self) -> Result<()> {
        Ok(())
    }

    fn queue_tones(&mut self, _frequencies: &[f64], _interval: Duration) {}

    fn stop_tone(&mut self) {}
}

/// Sink that remembers every call, for inspection after a run.
#[derive(Debug, Default, Clone)]
pub struct RecordingSink {
    pub initialised: bool,
    pub batches: Vec<ToneSchedule>,
    pub stops: usize,
}

impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Total number of tones queued across all batches.
    pub fn tone_count(&self) -> usize {
        self.batches.iter().map(|batch| batch.cues().len()).sum()
    }
}

impl ToneSink for RecordingSink {
    fn init_audio(&mut self) -> Result<()> {
        self.initialised = true;
        Ok(())
    }

    fn queue_tones(&mut self, frequencies: &[f64], interval: Duration) {
        self.batches.push(ToneSchedule::spread(frequencies, interval));
    }

    fn stop_tone(&mut self) {
        self.stops += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn maps_values_to_frequencies() {
        assert_eq!(tone_for(0), 100.0);
        assert_eq!(tone_for(44), 540.0);
    }

    #[test]
    fn spreads_cues_evenly_over_the_interval() {
        let schedule = ToneSchedule::spread(&[200.0, 300.0, 400.0, 500.0], Duration::from_millis(20));
        let offsets: Vec<_> = schedule.cues().iter().map(|cue| cue.offset).collect();
        assert_eq!(
            offsets,
            vec![
                Duration::ZERO,
                Duration::from_millis(5),
                Duration::from_millis(10),
                Duration::from_millis(15),
            ]
        );
        assert_eq!(schedule.cues()[3].frequency, 500.0);
    }

    #[test]
    fn empty_batches_produce_no_cues() {
        assert!(ToneSchedule::spread(&[], Duration::from_millis(10)).is_empty());
    }

    #[test]
    fn recording_sink_keeps_every_batch() {
        let mut sink = RecordingSink::new();
        sink.init_audio().unwrap();
        sink.queue_tones(&[110.0], Duration::from_millis(10));
        sink.queue_tones(&[], Duration::from_millis(10));
        sink.stop_tone();

        assert!(sink.initialised);
        assert_eq!(sink.batches.len(), 2);
        assert_eq!(sink.tone_count(), 1);
        assert_eq!(sink.stops, 1);
    }
}
