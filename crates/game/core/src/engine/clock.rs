//! Host-driven countdowns.
//!
//! The encounter never reads wall time. The host advances it by an elapsed
//! [`Duration`] and each [`Countdown`] consumes from that budget, so the same
//! inputs always produce the same transitions.

use std::time::Duration;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Countdown {
    remaining: Duration,
    armed: bool,
}

impl Countdown {
    pub fn start(&mut self, duration: Duration) {
        self.remaining = duration;
        self.armed = true;
    }

    pub fn stop(&mut self) {
        self.remaining = Duration::ZERO;
        self.armed = false;
    }

    pub fn is_armed(&self) -> bool {
        self.armed
    }

    pub fn remaining(&self) -> Duration {
        self.remaining
    }

    /// Remaining time rounded up to whole seconds, as shown to players.
    pub fn whole_seconds(&self) -> u64 {
        let secs = self.remaining.as_secs();
        if self.remaining.subsec_nanos() > 0 {
            secs + 1
        } else {
            secs
        }
    }

    /// Ends the countdown now, keeping it armed so the next drain fires.
    pub fn short_circuit(&mut self) {
        self.remaining = Duration::ZERO;
    }

    /// Takes what this countdown needs from `budget`. Returns true when the
    /// countdown fires; the unused part of the budget stays available to
    /// whatever runs next.
    pub fn drain(&mut self, budget: &mut Duration) -> bool {
        if !self.armed {
            return false;
        }
        if *budget < self.remaining {
            self.remaining -= *budget;
            *budget = Duration::ZERO;
            return false;
        }
        *budget -= self.remaining;
        self.remaining = Duration::ZERO;
        self.armed = false;
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fires_once_and_returns_leftover_budget() {
        let mut countdown = Countdown::default();
        countdown.start(Duration::from_millis(1500));

        let mut budget = Duration::from_secs(1);
        assert!(!countdown.drain(&mut budget));
        assert_eq!(budget, Duration::ZERO);
        assert_eq!(countdown.whole_seconds(), 1);

        let mut budget = Duration::from_secs(2);
        assert!(countdown.drain(&mut budget));
        assert_eq!(budget, Duration::from_millis(1500));
        assert!(!countdown.drain(&mut budget));
    }

    #[test]
    fn zero_duration_fires_without_budget() {
        let mut countdown = Countdown::default();
        countdown.start(Duration::ZERO);
        let mut budget = Duration::ZERO;
        assert!(countdown.drain(&mut budget));
    }

    #[test]
    fn short_circuit_fires_on_next_drain() {
        let mut countdown = Countdown::default();
        countdown.start(Duration::from_secs(45));
        countdown.short_circuit();
        let mut budget = Duration::ZERO;
        assert!(countdown.drain(&mut budget));
    }
}
