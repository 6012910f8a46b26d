//! Core library for the Beat Sync engine.
//!
//! The crate analyzes decoded PCM buffers offline to produce a sorted list
//! of beat timestamps per track, then synchronizes those timestamps against
//! live playback with a lookahead scheduler and a cyclic track sequencer.
//! Each module owns a distinct subsystem (analysis, scheduling, playlist
//! rotation, the engine façade) so that hosts can use the pieces directly
//! or drive everything through [`BeatEngine`].

pub mod analysis;
pub mod audio;
pub mod config;
pub mod engine;
pub mod error;
pub mod playlist;
pub mod timeline;

pub use audio::{AudioBuffer, BeatTimestamps, Track};
pub use config::AnalysisConfig;
pub use engine::{BeatEngine, TickOutcome};
pub use error::{BeatSyncError, Result};
pub use playlist::{PlaylistState, TrackSequencer};
pub use timeline::{PlaybackScheduler, ScheduleCursor, SchedulerState};
