use crate::BeatTimestamps;

/// Mutable scheduling position within one track's timestamp array.
///
/// `next_beat` only ever moves forward while a track is active; the cursor
/// is reset to the start on every track change. `track_end_handled` makes
/// the end-of-track transition idempotent within a tick.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ScheduleCursor {
    next_beat: usize,
    track_end_handled: bool,
}

impl ScheduleCursor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn next_beat(&self) -> usize {
        self.next_beat
    }

    pub fn track_end_handled(&self) -> bool {
        self.track_end_handled
    }

    pub fn mark_track_end(&mut self) {
        self.track_end_handled = true;
    }

    /// Returns the cursor to `{0, false}` for a freshly activated track.
    pub fn reset(&mut self) {
        *self = Self::default();
    }
}

/// Observable scheduling state for one active track.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SchedulerState {
    /// No beat has fired yet for the active track.
    Idle,
    /// At least one beat fired and more remain.
    Armed,
    /// Every timestamp has been consumed; nothing fires until a reset.
    Exhausted,
}

/// Lookahead beat scheduler.
///
/// Each tick compares the live playback clock, advanced by the lookahead
/// margin, against the next pending timestamp. At most one beat fires per
/// tick: a host that misses ticks sees beats delayed across subsequent
/// ticks, never skipped, because the comparison is re-checked every call.
#[derive(Debug, Clone)]
pub struct PlaybackScheduler {
    look_ahead_time: f32,
}

impl PlaybackScheduler {
    pub fn new(look_ahead_time: f32) -> Self {
        Self { look_ahead_time }
    }

    pub fn look_ahead_time(&self) -> f32 {
        self.look_ahead_time
    }

    /// Advances the cursor by at most one beat. Returns true when a beat
    /// fires this tick. An exhausted cursor is a normal terminal condition,
    /// not an error; ticking past the end simply reports no event.
    pub fn tick(
        &self,
        current_playback_time: f32,
        timestamps: &BeatTimestamps,
        cursor: &mut ScheduleCursor,
    ) -> bool {
        let Some(next_time) = timestamps.get(cursor.next_beat) else {
            return false;
        };

        if current_playback_time + self.look_ahead_time >= next_time {
            cursor.next_beat += 1;
            return true;
        }
        false
    }

    pub fn state(&self, timestamps: &BeatTimestamps, cursor: &ScheduleCursor) -> SchedulerState {
        if cursor.next_beat >= timestamps.len() {
            SchedulerState::Exhausted
        } else if cursor.next_beat == 0 {
            SchedulerState::Idle
        } else {
            SchedulerState::Armed
        }
    }
}
