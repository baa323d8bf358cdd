use std::{path::Path, time::Duration};

use serde::{Deserialize, Serialize};

use crate::algorithms::Algorithm;
use crate::event::Field;
use crate::{AlgovizError, Result};

/// Top-level configuration structure for the application.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub playback: PlaybackConfig,
    pub capture: CaptureConfig,
}

impl AppConfig {
    /// Reads a JSON configuration file. Missing keys keep their defaults.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let raw = std::fs::read_to_string(path)?;
        Self::from_json(&raw)
    }

    pub fn from_json(raw: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(raw)?;
        config.playback.validate()?;
        Ok(config)
    }
}

/// How logs are replayed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlaybackConfig {
    /// Wall-clock delay between ticks, in milliseconds.
    pub interval_ms: u64,
    /// Virtual clock advance per tick when replaying by time (ms).
    pub step: f64,
    /// Tracked events consumed per stream per tick when replaying by operation.
    pub steps: usize,
    /// Fields that count toward `steps` and produce audio cues.
    pub frames: Vec<Field>,
    pub by_operation: bool,
    /// Advance every stream each tick instead of one stream at a time.
    #[serde(alias = "async")]
    pub concurrent: bool,
}

impl PlaybackConfig {
    pub fn interval(&self) -> Duration {
        Duration::from_millis(self.interval_ms)
    }

    pub fn tracks(&self, field: Field) -> bool {
        self.frames.contains(&field)
    }

    /// Replaying by time needs a clock that moves forward, or no event
    /// would ever fall behind it.
    pub fn validate(&self) -> Result<()> {
        if !self.by_operation && !(self.step.is_finite() && self.step > 0.0) {
            return Err(AlgovizError::msg(format!(
                "playback step must be a positive number of milliseconds when replaying by time, got {}",
                self.step
            )));
        }
        Ok(())
    }
}

impl Default for PlaybackConfig {
    fn default() -> Self {
        Self {
            interval_ms: 10,
            step: 0.05,
            steps: 2,
            frames: vec![Field::Reference],
            by_operation: true,
            concurrent: true,
        }
    }
}

/// What gets recorded before playback.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CaptureConfig {
    /// Length of the random seed permutation.
    pub size: usize,
    /// Fixed RNG seed; a fresh one is drawn when absent.
    pub seed: Option<u64>,
    pub algorithms: Vec<Algorithm>,
    /// Draw a new seed array when recording again after a clear.
    pub reseed_on_restart: bool,
}

impl Default for CaptureConfig {
    fn default() -> Self {
        Self {
            size: 100,
            seed: None,
            algorithms: Algorithm::ALL.to_vec(),
            reseed_on_restart: false,
        }
    }
}
