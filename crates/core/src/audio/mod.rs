use serde::{Deserialize, Serialize};

/// Decoded PCM audio for a single track.
///
/// Samples are interleaved floats in roughly [-1, 1]. The buffer is built
/// once when a track is loaded and never mutated afterwards; analysis reads
/// it, playback is handled entirely by the host.
#[derive(Debug, Clone)]
pub struct AudioBuffer {
    samples: Vec<f32>,
    channel_count: usize,
    sample_rate: u32,
}

impl AudioBuffer {
    /// Wraps decoded samples. A `channel_count` of zero is treated as mono
    /// so that length and duration arithmetic stays well defined.
    pub fn new(samples: Vec<f32>, channel_count: usize, sample_rate: u32) -> Self {
        Self {
            samples,
            channel_count: channel_count.max(1),
            sample_rate,
        }
    }

    pub fn samples(&self) -> &[f32] {
        &self.samples
    }

    pub fn channel_count(&self) -> usize {
        self.channel_count
    }

    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Number of logical frames, i.e. interleaved sample groups.
    pub fn frame_count(&self) -> usize {
        self.samples.len() / self.channel_count
    }

    /// Clip length in seconds, derived from frame count and sample rate.
    pub fn duration_seconds(&self) -> f32 {
        if self.sample_rate == 0 {
            return 0.0;
        }
        self.frame_count() as f32 / self.sample_rate as f32
    }
}

/// Sorted beat times for one track, in seconds from the start of the clip.
///
/// Produced exactly once per track by the analyzer and immutable afterwards.
/// The sequence is strictly increasing with consecutive gaps of at least the
/// configured minimum beat interval. Serializes as a flat array of seconds
/// so hosts can cache analysis results across runs.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BeatTimestamps(Vec<f32>);

impl BeatTimestamps {
    pub fn new(times: Vec<f32>) -> Self {
        Self(times)
    }

    pub fn as_slice(&self) -> &[f32] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<f32> {
        self.0.get(index).copied()
    }
}

/// A playlist entry: the owning buffer plus its cached analysis result.
#[derive(Debug, Clone)]
pub struct Track {
    pub index: usize,
    pub buffer: AudioBuffer,
    pub beats: Option<BeatTimestamps>,
}

impl Track {
    pub fn new(index: usize, buffer: AudioBuffer) -> Self {
        Self {
            index,
            buffer,
            beats: None,
        }
    }

    /// True once the analyzer has produced timestamps for this track.
    pub fn is_analyzed(&self) -> bool {
        self.beats.is_some()
    }
}
