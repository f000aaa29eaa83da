use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use chrono::{DateTime, Duration, Utc};

/// Point-in-time view of one match clock. Never persisted; lost on restart.
#[derive(Debug, Clone, PartialEq)]
pub struct TimerSnapshot {
    pub is_running: bool,
    pub remaining_seconds: i64,
    pub ends_at_utc: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone)]
struct TimerEntry {
    running: bool,
    remaining_seconds: i64,
    ends_at_utc: Option<DateTime<Utc>>,
}

impl TimerEntry {
    fn stopped(remaining_seconds: i64) -> Self {
        Self {
            running: false,
            remaining_seconds,
            ends_at_utc: None,
        }
    }
}

pub type Clock = Arc<dyn Fn() -> DateTime<Utc> + Send + Sync>;

/// In-memory countdown clocks, one per match.
///
/// No background task advances anything: remaining time is recomputed from
/// the wall clock whenever an entry is read or mutated, so there is no drift
/// and no per-match scheduler thread. The outer map lock is only held to
/// fetch the entry handle; start/pause/resume/reset on the same match
/// serialize on the entry's own mutex while unrelated matches stay
/// independent.
pub struct MatchTimerRuntime {
    entries: Mutex<HashMap<uuid::Uuid, Arc<Mutex<TimerEntry>>>>,
    clock: Clock,
}

impl MatchTimerRuntime {
    pub fn new() -> Self {
        Self::with_clock(Arc::new(Utc::now))
    }

    /// Build a runtime with an injected clock. Production uses `Utc::now`;
    /// tests substitute a manual clock to simulate elapsed time.
    pub fn with_clock(clock: Clock) -> Self {
        Self {
            entries: Mutex::new(HashMap::new()),
            clock,
        }
    }

    fn now(&self) -> DateTime<Utc> {
        (self.clock)()
    }

    fn entry(&self, match_id: uuid::Uuid, default_seconds: i64) -> Arc<Mutex<TimerEntry>> {
        let mut entries = self.entries.lock().expect("timer registry poisoned");
        entries
            .entry(match_id)
            .or_insert_with(|| Arc::new(Mutex::new(TimerEntry::stopped(default_seconds))))
            .clone()
    }

    /// Remaining whole seconds until `ends_at`, rounded up and clamped at 0.
    fn remaining_until(ends_at: DateTime<Utc>, now: DateTime<Utc>) -> i64 {
        let millis = (ends_at - now).num_milliseconds();
        if millis <= 0 {
            0
        } else {
            (millis + 999) / 1000
        }
    }

    pub fn get_or_create(&self, match_id: uuid::Uuid, default_seconds: i64) -> TimerSnapshot {
        let entry = self.entry(match_id, default_seconds);
        let state = entry.lock().expect("timer entry poisoned");
        self.snapshot(&state)
    }

    pub fn start(&self, match_id: uuid::Uuid, seconds: i64) -> TimerSnapshot {
        let entry = self.entry(match_id, 0);
        let mut state = entry.lock().expect("timer entry poisoned");
        let now = self.now();
        *state = TimerEntry {
            running: true,
            remaining_seconds: seconds,
            ends_at_utc: Some(now + Duration::seconds(seconds)),
        };
        self.snapshot(&state)
    }

    /// Freeze the clock and return the frozen remaining seconds. Pausing an
    /// already paused clock returns the existing value unchanged.
    pub fn pause(&self, match_id: uuid::Uuid) -> i64 {
        let entry = self.entry(match_id, 0);
        let mut state = entry.lock().expect("timer entry poisoned");
        if !state.running {
            return state.remaining_seconds;
        }

        let remaining = state
            .ends_at_utc
            .map(|ends_at| Self::remaining_until(ends_at, self.now()))
            .unwrap_or(0);
        *state = TimerEntry::stopped(remaining);
        remaining
    }

    /// Restart a paused clock from its frozen value. No-op when nothing
    /// remains.
    pub fn resume(&self, match_id: uuid::Uuid) -> TimerSnapshot {
        let entry = self.entry(match_id, 0);
        let mut state = entry.lock().expect("timer entry poisoned");
        if state.remaining_seconds <= 0 {
            return self.snapshot(&state);
        }

        state.running = true;
        state.ends_at_utc = Some(self.now() + Duration::seconds(state.remaining_seconds));
        self.snapshot(&state)
    }

    pub fn reset(&self, match_id: uuid::Uuid) {
        let entry = self.entry(match_id, 0);
        let mut state = entry.lock().expect("timer entry poisoned");
        *state = TimerEntry::stopped(0);
    }

    /// Lazily recompute the clock. A running clock that has hit zero is
    /// expired in place: expiry happens on observation, not on a callback.
    pub fn read(&self, match_id: uuid::Uuid) -> TimerSnapshot {
        let entry = self.entry(match_id, 0);
        let mut state = entry.lock().expect("timer entry poisoned");
        if state.running {
            let remaining = state
                .ends_at_utc
                .map(|ends_at| Self::remaining_until(ends_at, self.now()))
                .unwrap_or(0);
            if remaining <= 0 {
                *state = TimerEntry::stopped(0);
            }
        }
        self.snapshot(&state)
    }

    /// Reinstate a previously observed snapshot. Used to compensate the
    /// runtime when a persistence commit fails after the clock was already
    /// mutated.
    pub fn restore(&self, match_id: uuid::Uuid, snapshot: &TimerSnapshot) {
        let entry = self.entry(match_id, 0);
        let mut state = entry.lock().expect("timer entry poisoned");
        *state = TimerEntry {
            running: snapshot.is_running,
            remaining_seconds: snapshot.remaining_seconds,
            ends_at_utc: snapshot.ends_at_utc,
        };
    }

    fn snapshot(&self, state: &TimerEntry) -> TimerSnapshot {
        let remaining = if state.running {
            state
                .ends_at_utc
                .map(|ends_at| Self::remaining_until(ends_at, self.now()))
                .unwrap_or(state.remaining_seconds)
        } else {
            state.remaining_seconds
        };

        TimerSnapshot {
            is_running: state.running,
            remaining_seconds: remaining,
            ends_at_utc: if state.running { state.ends_at_utc } else { None },
        }
    }
}

impl Default for MatchTimerRuntime {
    fn default() -> Self {
        Self::new()
    }
}
