//! Countdown timers advanced once per simulation tick.
//!
//! Every cooldown, stage window and buff in the simulation is a [`Countdown`].
//! A countdown only moves when the driver advances it with the current
//! [`TickId`]; a second advance carrying the same tick id is ignored, so a
//! timer can never lose more than one `dt` per tick no matter how many
//! systems touch it.

use std::collections::BTreeMap;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TickId(pub u64);

impl TickId {
    pub fn next(self) -> Self {
        Self(self.0.saturating_add(1))
    }
}

fn sanitize_seconds(value: f32) -> f32 {
    if value.is_finite() && value > 0.0 {
        value
    } else {
        0.0
    }
}

/// One-shot countdown clamped at zero.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Countdown {
    remaining_seconds: f32,
    last_advanced: Option<TickId>,
}

impl Countdown {
    pub fn started(duration_seconds: f32) -> Self {
        let mut countdown = Self::default();
        countdown.start(duration_seconds);
        countdown
    }

    /// Restarts the countdown. Non-finite or negative durations leave it idle.
    pub fn start(&mut self, duration_seconds: f32) {
        self.remaining_seconds = sanitize_seconds(duration_seconds);
    }

    pub fn cancel(&mut self) {
        self.remaining_seconds = 0.0;
    }

    pub fn remaining(&self) -> f32 {
        self.remaining_seconds
    }

    pub fn is_running(&self) -> bool {
        self.remaining_seconds > 0.0
    }

    /// Returns `true` exactly on the tick the countdown crosses from running to zero.
    pub fn advance(&mut self, tick: TickId, dt_seconds: f32) -> bool {
        if self.last_advanced == Some(tick) {
            return false;
        }
        self.last_advanced = Some(tick);
        if !self.is_running() {
            return false;
        }
        self.remaining_seconds = (self.remaining_seconds - sanitize_seconds(dt_seconds)).max(0.0);
        !self.is_running()
    }
}

/// Keyed set of independent countdowns.
///
/// Expired keys are reported in key order, which keeps expiry handling
/// deterministic even though no ordering between timers is promised.
#[derive(Debug, Clone, PartialEq)]
pub struct TimerBank<K: Copy + Ord> {
    timers: BTreeMap<K, Countdown>,
    last_advanced: Option<TickId>,
}

impl<K: Copy + Ord> Default for TimerBank<K> {
    fn default() -> Self {
        Self {
            timers: BTreeMap::new(),
            last_advanced: None,
        }
    }
}

impl<K: Copy + Ord> TimerBank<K> {
    pub fn with_keys(keys: impl IntoIterator<Item = K>) -> Self {
        let mut bank = Self::default();
        for key in keys {
            bank.register(key);
        }
        bank
    }

    pub fn register(&mut self, key: K) {
        self.timers.entry(key).or_default();
    }

    pub fn start(&mut self, key: K, duration_seconds: f32) {
        self.timers.entry(key).or_default().start(duration_seconds);
    }

    pub fn cancel(&mut self, key: K) {
        if let Some(timer) = self.timers.get_mut(&key) {
            timer.cancel();
        }
    }

    pub fn cancel_all(&mut self) {
        for timer in self.timers.values_mut() {
            timer.cancel();
        }
    }

    pub fn remaining(&self, key: K) -> f32 {
        self.timers.get(&key).map_or(0.0, Countdown::remaining)
    }

    pub fn is_running(&self, key: K) -> bool {
        self.timers.get(&key).is_some_and(Countdown::is_running)
    }

    pub fn len(&self) -> usize {
        self.timers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.timers.is_empty()
    }

    /// Advances every registered timer once and returns the keys that expired this tick.
    pub fn advance(&mut self, tick: TickId, dt_seconds: f32) -> Vec<K> {
        if self.last_advanced == Some(tick) {
            return Vec::new();
        }
        self.last_advanced = Some(tick);
        self.timers
            .iter_mut()
            .filter_map(|(key, timer)| timer.advance(tick, dt_seconds).then_some(*key))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use proptest::prelude::*;

    use super::*;

    #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
    enum Key {
        Short,
        Long,
    }

    #[test]
    fn countdown_expires_once_and_stays_at_zero() {
        let mut countdown = Countdown::started(0.5);
        let mut tick = TickId(0);
        let mut expiries = 0;
        for _ in 0..10 {
            tick = tick.next();
            if countdown.advance(tick, 0.2) {
                expiries += 1;
            }
        }
        assert_eq!(expiries, 1);
        assert_eq!(countdown.remaining(), 0.0);
    }

    #[test]
    fn countdown_ignores_second_advance_in_same_tick() {
        let mut countdown = Countdown::started(1.0);
        assert!(!countdown.advance(TickId(1), 0.25));
        assert!(!countdown.advance(TickId(1), 0.25));
        assert!((countdown.remaining() - 0.75).abs() < 1e-6);
    }

    #[test]
    fn countdown_rejects_invalid_durations() {
        assert!(!Countdown::started(-1.0).is_running());
        assert!(!Countdown::started(f32::NAN).is_running());
        assert!(!Countdown::started(f32::INFINITY).is_running());
    }

    #[test]
    fn restarted_countdown_can_expire_again() {
        let mut countdown = Countdown::started(0.1);
        assert!(countdown.advance(TickId(1), 0.1));
        countdown.start(0.1);
        assert!(countdown.advance(TickId(2), 0.5));
    }

    #[test]
    fn bank_reports_expired_keys_in_key_order() {
        let mut bank = TimerBank::with_keys([Key::Short, Key::Long]);
        bank.start(Key::Long, 0.1);
        bank.start(Key::Short, 0.1);
        let expired = bank.advance(TickId(1), 0.2);
        assert_eq!(expired, vec![Key::Short, Key::Long]);
        assert!(bank.advance(TickId(2), 0.2).is_empty());
    }

    #[test]
    fn bank_does_not_double_advance_within_a_tick() {
        let mut bank = TimerBank::with_keys([Key::Short]);
        bank.start(Key::Short, 1.0);
        bank.advance(TickId(7), 0.4);
        bank.advance(TickId(7), 0.4);
        assert!((bank.remaining(Key::Short) - 0.6).abs() < 1e-6);
    }

    #[test]
    fn unknown_key_reads_as_idle() {
        let bank: TimerBank<Key> = TimerBank::default();
        assert_eq!(bank.remaining(Key::Long), 0.0);
        assert!(!bank.is_running(Key::Long));
    }

    proptest! {
        #[test]
        fn countdown_never_negative_and_expires_at_most_once(
            duration in 0.0f32..5.0,
            steps in proptest::collection::vec(0.0f32..0.5, 1..64)
        ) {
            let mut countdown = Countdown::started(duration);
            let started_running = countdown.is_running();
            let mut expiries = 0u32;
            for (index, dt) in steps.iter().enumerate() {
                if countdown.advance(TickId(index as u64 + 1), *dt) {
                    expiries += 1;
                }
                prop_assert!(countdown.remaining() >= 0.0);
            }
            prop_assert!(expiries <= 1);
            if expiries == 1 {
                prop_assert!(started_running);
                prop_assert_eq!(countdown.remaining(), 0.0);
            }
            let total: f32 = steps.iter().sum();
            if started_running && total >= duration + 1e-3 {
                prop_assert_eq!(expiries, 1);
            }
        }
    }
}
