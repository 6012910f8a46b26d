use crate::{
    analysis, playlist::PlaylistState, playlist::TrackSequencer, timeline::PlaybackScheduler,
    timeline::ScheduleCursor, timeline::SchedulerState, AnalysisConfig, AudioBuffer,
    BeatSyncError, BeatTimestamps, Result, Track,
};

/// Tagged outcome of one engine tick. The host polls this instead of
/// registering callbacks, so event dispatch stays in the host's hands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickOutcome {
    /// Nothing happened this tick.
    NoEvent,
    /// A beat of the active track is due now (within the lookahead margin).
    BeatFired,
    /// The playlist rotated; the host should start playback of this track.
    TrackChanged(usize),
}

/// Single-owner façade over analysis, scheduling and track sequencing.
///
/// The engine holds the playlist of decoded buffers, their cached beat
/// timestamps, and the per-track schedule cursor. The host drives it with
/// one `tick` call per frame, supplying the playback clock and playing flag;
/// everything else (decoding, output, reacting to events) lives outside.
///
/// The tick model is cooperative and single threaded. A host that ticks
/// from multiple threads must wrap the engine in its own mutual exclusion.
#[derive(Debug)]
pub struct BeatEngine {
    config: AnalysisConfig,
    tracks: Vec<Track>,
    playlist: PlaylistState,
    cursor: ScheduleCursor,
    scheduler: PlaybackScheduler,
    sequencer: TrackSequencer,
}

impl BeatEngine {
    /// Validates the configuration and builds an engine with an empty
    /// playlist. Malformed configs abort here, before any playback.
    pub fn new(config: AnalysisConfig) -> Result<Self> {
        config.validate()?;
        let scheduler = PlaybackScheduler::new(config.look_ahead_time);
        let sequencer = TrackSequencer::new(config.track_end_slack);
        Ok(Self {
            config,
            tracks: Vec::new(),
            playlist: PlaylistState::new(),
            cursor: ScheduleCursor::new(),
            scheduler,
            sequencer,
        })
    }

    pub fn config(&self) -> &AnalysisConfig {
        &self.config
    }

    /// Appends a decoded buffer to the playlist and returns its track index.
    pub fn push_track(&mut self, buffer: AudioBuffer) -> usize {
        let index = self.tracks.len();
        self.tracks.push(Track::new(index, buffer));
        index
    }

    pub fn track_count(&self) -> usize {
        self.tracks.len()
    }

    pub fn current_track(&self) -> usize {
        self.playlist.current_track()
    }

    pub fn cursor(&self) -> &ScheduleCursor {
        &self.cursor
    }

    /// Runs offline analysis for one track and caches the result. Analysis
    /// happens at most once per track; repeat calls return the cached
    /// timestamps untouched.
    pub fn analyze_track(&mut self, index: usize) -> Result<&BeatTimestamps> {
        let config = self.config.clone();
        let track = self
            .tracks
            .get_mut(index)
            .ok_or_else(|| BeatSyncError::msg(format!("unknown track index {index}")))?;
        Ok(track
            .beats
            .get_or_insert_with(|| analysis::analyze(&track.buffer, &config)))
    }

    /// Analyzes every playlist entry ahead of playback. Each track is
    /// independent, so a host may instead analyze tracks in parallel and
    /// restore the results; this sequential pass is the simple default.
    pub fn analyze_all(&mut self) -> Result<()> {
        for index in 0..self.tracks.len() {
            self.analyze_track(index)?;
        }
        Ok(())
    }

    /// Installs timestamps produced elsewhere, e.g. deserialized from a
    /// cache a host persisted on a previous run.
    pub fn restore_beat_timestamps(
        &mut self,
        index: usize,
        timestamps: BeatTimestamps,
    ) -> Result<()> {
        let track = self
            .tracks
            .get_mut(index)
            .ok_or_else(|| BeatSyncError::msg(format!("unknown track index {index}")))?;
        track.beats = Some(timestamps);
        Ok(())
    }

    pub fn beat_timestamps(&self, index: usize) -> Option<&BeatTimestamps> {
        self.tracks.get(index).and_then(|track| track.beats.as_ref())
    }

    pub fn scheduler_state(&self) -> SchedulerState {
        match self.active_timestamps() {
            Some(timestamps) => self.scheduler.state(timestamps, &self.cursor),
            None => SchedulerState::Exhausted,
        }
    }

    /// One cooperative tick. The sequencer is evaluated before the beat
    /// scheduler so a finished track never fires stale beats, and a track
    /// change and a beat can never be reported in the same tick.
    pub fn tick(&mut self, playback_time: f32, is_playing: bool) -> TickOutcome {
        if self.tracks.is_empty() {
            return TickOutcome::NoEvent;
        }

        let clip_length = self.active_clip_length();
        if let Some(next) = self.sequencer.tick(
            is_playing,
            playback_time,
            clip_length,
            self.tracks.len(),
            &mut self.playlist,
            &mut self.cursor,
        ) {
            return TickOutcome::TrackChanged(next);
        }

        if !is_playing {
            return TickOutcome::NoEvent;
        }

        // Field accesses stay direct here: the timestamps borrow the track
        // list while the scheduler mutates the cursor.
        let active = self.playlist.current_track();
        let timestamps = self.tracks.get(active).and_then(|track| track.beats.as_ref());
        let fired = match timestamps {
            Some(timestamps) => self
                .scheduler
                .tick(playback_time, timestamps, &mut self.cursor),
            None => false,
        };
        if fired {
            TickOutcome::BeatFired
        } else {
            TickOutcome::NoEvent
        }
    }

    fn active_clip_length(&self) -> f32 {
        self.tracks
            .get(self.playlist.current_track())
            .map(|track| track.buffer.duration_seconds())
            .unwrap_or(0.0)
    }

    fn active_timestamps(&self) -> Option<&BeatTimestamps> {
        self.beat_timestamps(self.playlist.current_track())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn engine_with_tracks(track_beats: &[&[f32]]) -> BeatEngine {
        let config = AnalysisConfig {
            look_ahead_time: 0.0,
            ..AnalysisConfig::default()
        };
        let mut engine = BeatEngine::new(config).unwrap();
        for (index, beats) in track_beats.iter().enumerate() {
            // One second of silence per track keeps clip lengths well defined.
            engine.push_track(AudioBuffer::new(vec![0.0; 1000], 1, 1000));
            engine
                .restore_beat_timestamps(index, BeatTimestamps::new(beats.to_vec()))
                .unwrap();
        }
        engine
    }

    #[test]
    fn construction_rejects_bad_config() {
        let config = AnalysisConfig {
            filter_factor: 2.0,
            ..AnalysisConfig::default()
        };
        assert!(matches!(
            BeatEngine::new(config),
            Err(BeatSyncError::InvalidConfig(_))
        ));
    }

    #[test]
    fn empty_playlist_ticks_are_no_ops() {
        let mut engine = BeatEngine::new(AnalysisConfig::default()).unwrap();
        assert_eq!(engine.tick(0.0, true), TickOutcome::NoEvent);
        assert_eq!(engine.tick(0.0, false), TickOutcome::NoEvent);
    }

    #[test]
    fn analysis_runs_once_per_track() {
        let mut engine = BeatEngine::new(AnalysisConfig::default()).unwrap();
        let index = engine.push_track(AudioBuffer::new(vec![0.0; 4000], 1, 1000));

        let first = engine.analyze_track(index).unwrap().clone();
        let second = engine.analyze_track(index).unwrap().clone();
        assert_eq!(first, second);
        assert!(engine.beat_timestamps(index).is_some());
    }

    #[test]
    fn analyzing_unknown_track_errors() {
        let mut engine = BeatEngine::new(AnalysisConfig::default()).unwrap();
        assert!(engine.analyze_track(7).is_err());
    }

    #[test]
    fn beats_wait_for_their_timestamp() {
        let mut engine = engine_with_tracks(&[&[0.1]]);
        assert_eq!(engine.tick(0.05, true), TickOutcome::NoEvent);
        assert_eq!(engine.tick(0.1, true), TickOutcome::BeatFired);
    }

    #[test]
    fn single_track_playlist_rotates_onto_itself() {
        let mut engine = engine_with_tracks(&[&[0.1]]);
        assert_eq!(engine.tick(0.1, true), TickOutcome::BeatFired);
        assert_eq!(engine.tick(0.95, false), TickOutcome::TrackChanged(0));
        assert_eq!(engine.cursor().next_beat(), 0);
    }

    #[test]
    fn track_change_resets_cursor_mid_track() {
        let mut engine = engine_with_tracks(&[&[0.1, 0.2, 0.3, 0.4, 0.5], &[0.2, 0.4]]);

        // Fire three of the five beats on the first track.
        for time in [0.1, 0.2, 0.3] {
            assert_eq!(engine.tick(time, true), TickOutcome::BeatFired);
        }
        assert_eq!(engine.cursor().next_beat(), 3);

        // Host stops playback: the sequencer rotates and resets the cursor.
        assert_eq!(engine.tick(0.95, false), TickOutcome::TrackChanged(1));
        assert_eq!(engine.current_track(), 1);
        assert_eq!(engine.cursor().next_beat(), 0);

        // The new track schedules from its own first timestamp.
        assert_eq!(engine.tick(0.1, true), TickOutcome::NoEvent);
        assert_eq!(engine.tick(0.2, true), TickOutcome::BeatFired);
        assert_eq!(engine.cursor().next_beat(), 1);
    }

    #[test]
    fn exhausted_track_reports_no_events_until_change() {
        let mut engine = engine_with_tracks(&[&[0.1], &[0.3]]);

        assert_eq!(engine.tick(0.1, true), TickOutcome::BeatFired);
        assert_eq!(engine.scheduler_state(), SchedulerState::Exhausted);
        for time in [0.2, 0.5, 0.9] {
            assert_eq!(engine.tick(time, true), TickOutcome::NoEvent);
        }

        assert_eq!(engine.tick(0.99, false), TickOutcome::TrackChanged(1));
        assert_eq!(engine.scheduler_state(), SchedulerState::Idle);
    }

    #[test]
    fn change_and_beat_never_share_a_tick() {
        let mut engine = engine_with_tracks(&[&[0.5], &[0.0]]);

        // The new track's first beat is already due at time zero, but the
        // change itself is the only event this tick.
        assert_eq!(engine.tick(0.9, false), TickOutcome::TrackChanged(1));
        assert_eq!(engine.tick(0.0, true), TickOutcome::BeatFired);
    }
}
