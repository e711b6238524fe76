use chrono::{DateTime, Duration, Utc};

/// Remaining time to a deadline, as shown on screen
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Remaining {
    pub minutes: i64,
    pub seconds: i64,
    pub is_expired: bool,
}

impl Remaining {
    pub fn total_seconds(&self) -> i64 {
        self.minutes * 60 + self.seconds
    }

    /// `MM:SS`
    pub fn label(&self) -> String {
        format!("{:02}:{:02}", self.minutes, self.seconds)
    }
}

/// Countdown to `anchor + window`. Without an anchor the countdown is inert.
#[derive(Debug, Clone)]
pub struct Countdown {
    anchor: Option<DateTime<Utc>>,
    window: Duration,
    expired: bool,
}

impl Countdown {
    pub fn new(anchor: Option<DateTime<Utc>>, window: Duration) -> Self {
        Self {
            anchor,
            window,
            expired: false,
        }
    }

    pub fn anchor(&self) -> Option<DateTime<Utc>> {
        self.anchor
    }

    pub fn deadline(&self) -> Option<DateTime<Utc>> {
        self.anchor.map(|anchor| anchor + self.window)
    }

    /// Restarts from a new anchor. Setting the same anchor keeps the expiry latch.
    pub fn set_anchor(&mut self, anchor: Option<DateTime<Utc>>) {
        if self.anchor != anchor {
            self.anchor = anchor;
            self.expired = false;
        }
    }

    /// Like `set_anchor`, also replacing the window
    pub fn retarget(&mut self, anchor: Option<DateTime<Utc>>, window: Duration) {
        if self.window != window {
            self.window = window;
            self.anchor = anchor;
            self.expired = false;
        } else {
            self.set_anchor(anchor);
        }
    }

    /// Remaining time at `now`, latching expiry for the current anchor
    pub fn tick(&mut self, now: DateTime<Utc>) -> Remaining {
        let remaining = self.peek(now);
        if remaining.is_expired {
            self.expired = true;
        }
        remaining
    }

    /// Remaining time at `now` without touching the latch
    pub fn peek(&self, now: DateTime<Utc>) -> Remaining {
        let Some(deadline) = self.deadline() else {
            return Remaining::default();
        };

        let is_expired = self.expired || now > deadline;
        // truncating millisecond division, clamped at zero
        let total = ((deadline - now).num_milliseconds() / 1000).max(0);

        Remaining {
            minutes: total / 60,
            seconds: total % 60,
            is_expired,
        }
    }
}
