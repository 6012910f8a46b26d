use crate::timeline::ScheduleCursor;

/// Position within a cyclic playlist.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PlaylistState {
    current_track: usize,
}

impl PlaylistState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn current_track(&self) -> usize {
        self.current_track
    }

    /// Moves to the next track, wrapping at the end of the playlist, and
    /// returns the new index. With an empty playlist this is a no-op at 0.
    pub fn advance(&mut self, playlist_len: usize) -> usize {
        if playlist_len == 0 {
            self.current_track = 0;
        } else {
            self.current_track = (self.current_track + 1) % playlist_len;
        }
        self.current_track
    }
}

/// Detects end-of-track and rotates the playlist.
///
/// Driven once per tick with the host's playing flag and playback clock.
/// A track counts as finished when playback has stopped and either the
/// clock is within `track_end_slack` seconds of the clip end or playback
/// has simply stopped; the slack value is inherited tuning, kept as a
/// configurable constant.
#[derive(Debug, Clone)]
pub struct TrackSequencer {
    track_end_slack: f32,
}

impl TrackSequencer {
    pub fn new(track_end_slack: f32) -> Self {
        Self { track_end_slack }
    }

    pub fn track_end_slack(&self) -> f32 {
        self.track_end_slack
    }

    /// Returns the index of the newly activated track when a change happens
    /// this tick, `None` otherwise. The cursor's end-handled flag makes the
    /// transition fire at most once per stop, and a track change resets the
    /// cursor so the next track schedules from its first beat.
    pub fn tick(
        &self,
        is_playing: bool,
        playback_time: f32,
        clip_length: f32,
        playlist_len: usize,
        playlist: &mut PlaylistState,
        cursor: &mut ScheduleCursor,
    ) -> Option<usize> {
        if playlist_len == 0 {
            return None;
        }
        if is_playing || cursor.track_end_handled() {
            return None;
        }

        cursor.mark_track_end();
        let near_clip_end = playback_time >= clip_length - self.track_end_slack;
        if near_clip_end || !is_playing {
            let next = playlist.advance(playlist_len);
            cursor.reset();
            return Some(next);
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn playlist_wraps_cyclically() {
        let mut playlist = PlaylistState::new();
        assert_eq!(playlist.advance(3), 1);
        assert_eq!(playlist.advance(3), 2);
        assert_eq!(playlist.advance(3), 0);
    }

    #[test]
    fn empty_playlist_is_a_no_op() {
        let sequencer = TrackSequencer::new(0.5);
        let mut playlist = PlaylistState::new();
        let mut cursor = ScheduleCursor::new();

        assert_eq!(
            sequencer.tick(false, 10.0, 10.0, 0, &mut playlist, &mut cursor),
            None
        );
        assert_eq!(playlist.current_track(), 0);
    }

    #[test]
    fn rotates_when_playback_stops() {
        let sequencer = TrackSequencer::new(0.5);
        let mut playlist = PlaylistState::new();
        let mut cursor = ScheduleCursor::new();

        // Still playing: nothing happens.
        assert_eq!(
            sequencer.tick(true, 5.0, 10.0, 2, &mut playlist, &mut cursor),
            None
        );

        // Stopped at the end of the clip: rotate and reset the cursor.
        let changed = sequencer.tick(false, 9.8, 10.0, 2, &mut playlist, &mut cursor);
        assert_eq!(changed, Some(1));
        assert_eq!(cursor, ScheduleCursor::new());
    }

    #[test]
    fn rotates_at_most_once_per_stop_detection() {
        let sequencer = TrackSequencer::new(0.5);
        let mut playlist = PlaylistState::new();
        let mut cursor = ScheduleCursor::new();

        assert_eq!(
            sequencer.tick(false, 9.8, 10.0, 3, &mut playlist, &mut cursor),
            Some(1)
        );
        // The change reset the cursor and cleared the end flag; the host is
        // expected to start the new track before the next tick. A host that
        // stays stopped sees one rotation per tick, never a double advance.
        assert_eq!(
            sequencer.tick(false, 0.0, 10.0, 3, &mut playlist, &mut cursor),
            Some(2)
        );
        assert_eq!(playlist.current_track(), 2);
    }
}
