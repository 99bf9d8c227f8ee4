use chrono::{DateTime, TimeDelta, Utc};

/// Remaining time derived from a server-anchored start instant.
///
/// Nothing here accumulates between ticks: every reading is recomputed from
/// the anchor, so a client that joins late or misses ticks shows the same
/// value as one that was there from the start.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Countdown {
    anchor_time: DateTime<Utc>,
    duration_seconds: u32,
    status: CountdownStatus,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum CountdownStatus {
    Running,
    Expired,
    Cancelled,
}

/// Result of one tick
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CountdownTick {
    pub remaining_seconds: u32,
    /// True only on the first tick that observes zero
    pub expired_now: bool,
}

impl Countdown {
    pub fn start(anchor_time: DateTime<Utc>, duration_seconds: u32) -> Self {
        Self {
            anchor_time,
            duration_seconds,
            status: CountdownStatus::Running,
        }
    }

    pub fn anchor_time(&self) -> DateTime<Utc> {
        self.anchor_time
    }

    /// `max(0, duration - (now - anchor))`, clamped to `duration` when the anchor is in the future
    pub fn remaining_seconds(&self, now: DateTime<Utc>) -> u32 {
        let elapsed = (now - self.anchor_time).max(TimeDelta::zero());
        let remaining = i64::from(self.duration_seconds) - elapsed.num_seconds();
        remaining.clamp(0, i64::from(self.duration_seconds)) as u32
    }

    /// Derive the remaining time and report expiry exactly once.
    ///
    /// Returns `None` once cancelled or expired, so nothing is reported after the expiry tick.
    pub fn tick(&mut self, now: DateTime<Utc>) -> Option<CountdownTick> {
        if self.status != CountdownStatus::Running {
            return None;
        }

        let remaining_seconds = self.remaining_seconds(now);
        let expired_now = remaining_seconds == 0;
        if expired_now {
            self.status = CountdownStatus::Expired;
        }

        Some(CountdownTick {
            remaining_seconds,
            expired_now,
        })
    }

    pub fn cancel(&mut self) {
        self.status = CountdownStatus::Cancelled;
    }

    pub fn is_expired(&self) -> bool {
        self.status == CountdownStatus::Expired
    }

    /// Fraction of time left, for progress bars
    pub fn progress(&self, now: DateTime<Utc>) -> f32 {
        if self.duration_seconds == 0 {
            return 0.0;
        }
        self.remaining_seconds(now) as f32 / self.duration_seconds as f32
    }
}

/// Format seconds as `MM:SS`
pub fn format_clock(seconds: u32) -> String {
    format!("{:02}:{:02}", seconds / 60, seconds % 60)
}
