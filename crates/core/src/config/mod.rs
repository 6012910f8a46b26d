use serde::{Deserialize, Serialize};

use crate::{BeatSyncError, Result};

/// Quantization steps at or below this value disable snapping entirely.
const QUANTIZATION_EPSILON: f32 = 1e-6;

/// Tunable parameter set for offline analysis and playback scheduling.
///
/// The config is consumed once at engine construction and treated as
/// immutable afterwards. All validation happens in [`AnalysisConfig::validate`];
/// the analysis and scheduling code assumes a validated config and never
/// re-checks ranges at runtime.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalysisConfig {
    /// Number of sample frames contributing to one energy measurement.
    pub window_size: usize,
    /// Stride in frames between successive windows. Values below
    /// `window_size` produce overlapping windows.
    pub hop_size: usize,
    /// Coefficient of the single-pole low-pass filter, in (0, 1].
    pub filter_factor: f32,
    /// Number of recent energy values kept for the adaptive threshold.
    pub history_size: usize,
    /// Multiplier applied to the local energy average; a window is only a
    /// beat candidate when its energy exceeds `local_average * energy_threshold`.
    pub energy_threshold: f32,
    /// Absolute energy floor below which no beat is ever reported.
    pub sensitivity_floor: f32,
    /// Minimum spacing in seconds between two reported beats.
    pub min_beat_interval: f32,
    /// Signed correction in seconds applied to every detected beat time.
    pub beat_time_offset: f32,
    /// Margin in seconds added to the playback clock when scheduling, so a
    /// beat is signalled slightly before its exact timestamp.
    pub look_ahead_time: f32,
    /// Snap detected beat times to the nearest multiple of this step.
    /// Zero (or near-zero) disables quantization.
    pub quantization_step: f32,
    /// Seconds before the end of a clip at which a stopped track counts as
    /// finished. Inherited heuristic; kept tunable rather than hard-coded.
    pub track_end_slack: f32,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            window_size: 1024,
            hop_size: 512,
            filter_factor: 0.1,
            history_size: 43,
            energy_threshold: 1.3,
            sensitivity_floor: 0.01,
            min_beat_interval: 0.35,
            beat_time_offset: 0.0,
            look_ahead_time: 0.05,
            quantization_step: 0.0,
            track_end_slack: 0.5,
        }
    }
}

impl AnalysisConfig {
    /// Checks every parameter range. Errors here are fatal and must abort
    /// before playback begins; the engine refuses construction on failure.
    pub fn validate(&self) -> Result<()> {
        if self.window_size == 0 {
            return Err(BeatSyncError::config("window_size must be positive"));
        }
        if self.hop_size == 0 {
            return Err(BeatSyncError::config("hop_size must be positive"));
        }
        if !(self.filter_factor > 0.0 && self.filter_factor <= 1.0) {
            return Err(BeatSyncError::config(format!(
                "filter_factor must lie in (0, 1], got {}",
                self.filter_factor
            )));
        }
        if self.history_size < 2 {
            return Err(BeatSyncError::config("history_size must be at least 2"));
        }
        if self.energy_threshold < 1.0 {
            return Err(BeatSyncError::config(
                "energy_threshold must be at least 1.0",
            ));
        }
        if self.look_ahead_time < 0.0 {
            return Err(BeatSyncError::config("look_ahead_time must not be negative"));
        }
        if self.min_beat_interval < 0.0 {
            return Err(BeatSyncError::config(
                "min_beat_interval must not be negative",
            ));
        }
        Ok(())
    }

    /// Returns true when beat times should be snapped to the quantization
    /// grid. Steps at or below an epsilon count as disabled.
    pub fn quantization_enabled(&self) -> bool {
        self.quantization_step > QUANTIZATION_EPSILON
    }
}
