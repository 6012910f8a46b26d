use std::collections::VecDeque;

use crate::{AnalysisConfig, AudioBuffer, BeatTimestamps};

/// Applies a causal single-pole low-pass filter to a sample buffer.
///
/// `out[i] = factor * in[i] + (1 - factor) * out[i - 1]` with an implicit
/// zero sample before the start. Pure and length preserving; `factor` is
/// validated at configuration load, not here.
pub fn low_pass(samples: &[f32], factor: f32) -> Vec<f32> {
    let mut out = Vec::with_capacity(samples.len());
    let mut previous = 0.0f32;
    for &sample in samples {
        let filtered = factor * sample + (1.0 - factor) * previous;
        out.push(filtered);
        previous = filtered;
    }
    out
}

/// Mean absolute amplitude over `window_size` logical frames starting at
/// `start_frame`, de-interleaving by `channel_count`.
///
/// Only channel 0 is sampled for multi-channel audio. This is an intentional
/// approximation inherited from the original tuning, not a full downmix.
/// Frames past the end of the buffer contribute zero energy, so a window
/// hanging off the tail truncates safely instead of erroring.
pub fn window_energy(
    filtered: &[f32],
    start_frame: usize,
    window_size: usize,
    channel_count: usize,
) -> f32 {
    if window_size == 0 {
        return 0.0;
    }
    let channel_count = channel_count.max(1);
    let mut sum = 0.0f32;
    for frame in 0..window_size {
        let index = (start_frame + frame) * channel_count;
        if let Some(sample) = filtered.get(index) {
            sum += sample.abs();
        }
    }
    sum / window_size as f32
}

/// Rolling-threshold beat classifier.
///
/// Keeps a bounded FIFO of recent window energies plus the time of the last
/// reported beat. The state is scratch: the analyzer builds a fresh
/// classifier per track, so analysis stays pure across calls and tracks can
/// be analyzed independently. Window-level state is sequential by nature and
/// must be fed in increasing time order.
#[derive(Debug)]
pub struct BeatClassifier {
    history: VecDeque<f32>,
    history_size: usize,
    energy_threshold: f32,
    sensitivity_floor: f32,
    min_beat_interval: f32,
    last_beat_time: f32,
}

impl BeatClassifier {
    pub fn new(config: &AnalysisConfig) -> Self {
        Self {
            history: VecDeque::with_capacity(config.history_size),
            history_size: config.history_size,
            energy_threshold: config.energy_threshold,
            sensitivity_floor: config.sensitivity_floor,
            min_beat_interval: config.min_beat_interval,
            // Start one interval in the past so the first candidate window is
            // never suppressed by the cooldown.
            last_beat_time: -config.min_beat_interval,
        }
    }

    /// Feeds one window energy at `time_seconds` and reports whether it
    /// classifies as a beat.
    pub fn classify(&mut self, energy: f32, time_seconds: f32) -> bool {
        self.history.push_back(energy);
        if self.history.len() > self.history_size {
            self.history.pop_front();
        }

        // Early statistics are unreliable; wait for half the history to fill.
        if self.history.len() < self.history_size / 2 {
            return false;
        }

        let local_average = self.trailing_average();
        let above_local = energy > local_average * self.energy_threshold;
        let above_floor = energy > self.sensitivity_floor;
        let cooled_down = time_seconds - self.last_beat_time >= self.min_beat_interval;

        let is_beat = above_local && above_floor && cooled_down;
        if is_beat {
            self.last_beat_time = time_seconds;
        }
        is_beat
    }

    /// Mean of the history excluding the most recently pushed entry, so the
    /// candidate window is compared against trailing context only.
    fn trailing_average(&self) -> f32 {
        let trailing = self.history.len().saturating_sub(1);
        if trailing == 0 {
            return 0.0;
        }
        let sum: f32 = self.history.iter().take(trailing).sum();
        sum / trailing as f32
    }
}

/// Runs the full offline pipeline over one track buffer: low-pass filter,
/// sliding energy windows, adaptive classification, then offset and
/// quantization of each detected beat time.
///
/// Pure with respect to external state; calling it twice with the same
/// buffer and config yields identical timestamps. A buffer shorter than one
/// window (or empty) produces an empty sequence rather than an error. The
/// result is non-decreasing by construction because windows are visited in
/// increasing time order.
pub fn analyze(buffer: &AudioBuffer, config: &AnalysisConfig) -> BeatTimestamps {
    let frame_count = buffer.frame_count();
    if frame_count < config.window_size {
        return BeatTimestamps::default();
    }

    let filtered = low_pass(buffer.samples(), config.filter_factor);
    let sample_rate = buffer.sample_rate() as f32;
    let mut classifier = BeatClassifier::new(config);
    let mut beats = Vec::new();

    let mut start = 0usize;
    while start + config.window_size <= frame_count {
        let energy = window_energy(
            &filtered,
            start,
            config.window_size,
            buffer.channel_count(),
        );
        let window_time = start as f32 / sample_rate;

        if classifier.classify(energy, window_time) {
            let mut adjusted = window_time + config.beat_time_offset;
            if config.quantization_enabled() {
                adjusted = (adjusted / config.quantization_step).round() * config.quantization_step;
            }
            beats.push(adjusted);
        }

        start += config.hop_size;
    }

    BeatTimestamps::new(beats)
}
