use std::collections::BTreeMap;

use crate::easing::Ease;

/// A scalar property animation: `from -> to` over `duration_s`, optionally
/// starting after `delay_s`.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Tween {
    pub from: f64,
    pub to: f64,
    pub duration_s: f64,
    pub delay_s: f64,
    pub ease: Ease,
}

impl Tween {
    pub fn new(from: f64, to: f64, duration_s: f64, ease: Ease) -> Self {
        Self {
            from,
            to,
            duration_s: duration_s.max(0.0),
            delay_s: 0.0,
            ease,
        }
    }

    pub fn with_delay(mut self, delay_s: f64) -> Self {
        self.delay_s = delay_s.max(0.0);
        self
    }

    /// Value `t_s` seconds after registration, or `None` while still delayed.
    pub fn value_at(&self, t_s: f64) -> Option<f64> {
        let local = t_s - self.delay_s;
        if local < 0.0 {
            return None;
        }
        if self.duration_s <= 0.0 {
            return Some(self.to);
        }
        let p = self.ease.apply(local / self.duration_s);
        Some(self.from + (self.to - self.from) * p)
    }

    pub fn total_s(&self) -> f64 {
        self.delay_s + self.duration_s
    }
}

#[derive(Debug, Clone)]
struct Running {
    tween: Tween,
    elapsed_s: f64,
}

/// Registry of in-flight property animations, advanced once per frame.
///
/// Ordering contract:
/// - At most one tween runs per key. Starting a tween on a key that is
///   already animating replaces it (last write wins); the caller supplies
///   `from`, so a replacement usually starts from the current value.
/// - `advance` reports values in ascending key order.
#[derive(Debug, Clone)]
pub struct Tweens<K> {
    running: BTreeMap<K, Running>,
}

impl<K> Default for Tweens<K> {
    fn default() -> Self {
        Self {
            running: BTreeMap::new(),
        }
    }
}

impl<K: Ord + Copy> Tweens<K> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `tween` on `key`, returning the tween it superseded.
    pub fn start(&mut self, key: K, tween: Tween) -> Option<Tween> {
        self.running
            .insert(
                key,
                Running {
                    tween,
                    elapsed_s: 0.0,
                },
            )
            .map(|r| r.tween)
    }

    pub fn cancel(&mut self, key: K) -> bool {
        self.running.remove(&key).is_some()
    }

    /// Cancels every tween whose key matches `pred`; returns how many.
    pub fn cancel_where(&mut self, mut pred: impl FnMut(&K) -> bool) -> usize {
        let before = self.running.len();
        self.running.retain(|k, _| !pred(k));
        before - self.running.len()
    }

    pub fn is_running(&self, key: K) -> bool {
        self.running.contains_key(&key)
    }

    /// Destination value of the tween on `key`, if any.
    pub fn target(&self, key: K) -> Option<f64> {
        self.running.get(&key).map(|r| r.tween.to)
    }

    pub fn len(&self) -> usize {
        self.running.len()
    }

    pub fn is_empty(&self) -> bool {
        self.running.is_empty()
    }

    pub fn clear(&mut self) {
        self.running.clear();
    }

    /// Advances every tween by `dt_s` and hands each current value to `apply`.
    ///
    /// Tweens still inside their delay report nothing. A tween that reaches
    /// its end reports the exact `to` value once and is removed.
    pub fn advance(&mut self, dt_s: f64, mut apply: impl FnMut(K, f64)) {
        let dt_s = if dt_s.is_finite() { dt_s.max(0.0) } else { 0.0 };
        let mut finished: Vec<K> = Vec::new();

        for (key, running) in self.running.iter_mut() {
            running.elapsed_s += dt_s;
            if running.elapsed_s >= running.tween.total_s() {
                apply(*key, running.tween.to);
                finished.push(*key);
            } else if let Some(v) = running.tween.value_at(running.elapsed_s) {
                apply(*key, v);
            }
        }

        for key in finished {
            self.running.remove(&key);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{Tween, Tweens};
    use crate::easing::Ease;

    #[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord)]
    enum Prop {
        A,
        B,
    }

    fn run(tweens: &mut Tweens<Prop>, dt: f64) -> Vec<(Prop, f64)> {
        let mut out = Vec::new();
        tweens.advance(dt, |k, v| out.push((k, v)));
        out
    }

    #[test]
    fn linear_tween_interpolates_and_finishes() {
        let mut t = Tweens::new();
        t.start(Prop::A, Tween::new(0.0, 10.0, 1.0, Ease::Linear));

        assert_eq!(run(&mut t, 0.25), vec![(Prop::A, 2.5)]);
        assert_eq!(run(&mut t, 0.25), vec![(Prop::A, 5.0)]);
        assert_eq!(run(&mut t, 1.0), vec![(Prop::A, 10.0)]);
        assert!(t.is_empty());
        assert!(run(&mut t, 0.1).is_empty());
    }

    #[test]
    fn restarting_a_key_replaces_the_target() {
        let mut t = Tweens::new();
        t.start(Prop::A, Tween::new(0.0, 10.0, 1.0, Ease::Linear));
        run(&mut t, 0.5);

        let superseded = t.start(Prop::A, Tween::new(5.0, -5.0, 1.0, Ease::Linear));
        assert_eq!(superseded.map(|s| s.to), Some(10.0));
        assert_eq!(t.len(), 1);
        assert_eq!(t.target(Prop::A), Some(-5.0));

        assert_eq!(run(&mut t, 2.0), vec![(Prop::A, -5.0)]);
    }

    #[test]
    fn delayed_tween_is_silent_until_it_starts() {
        let mut t = Tweens::new();
        t.start(Prop::B, Tween::new(0.0, 1.0, 1.0, Ease::Linear).with_delay(0.5));

        assert!(run(&mut t, 0.25).is_empty());
        assert!(t.is_running(Prop::B));
        let out = run(&mut t, 0.5);
        assert_eq!(out.len(), 1);
        assert!((out[0].1 - 0.25).abs() < 1e-12);
    }

    #[test]
    fn values_are_reported_in_key_order() {
        let mut t = Tweens::new();
        t.start(Prop::B, Tween::new(0.0, 1.0, 1.0, Ease::Linear));
        t.start(Prop::A, Tween::new(0.0, 1.0, 1.0, Ease::Linear));
        let keys: Vec<Prop> = run(&mut t, 0.1).into_iter().map(|(k, _)| k).collect();
        assert_eq!(keys, vec![Prop::A, Prop::B]);
    }

    #[test]
    fn zero_duration_snaps_to_end() {
        let mut t = Tweens::new();
        t.start(Prop::A, Tween::new(3.0, 4.0, 0.0, Ease::Power2Out));
        assert_eq!(run(&mut t, 0.0), vec![(Prop::A, 4.0)]);
        assert!(t.is_empty());
    }

    #[test]
    fn cancel_where_drops_matching_keys() {
        let mut t = Tweens::new();
        t.start(Prop::A, Tween::new(0.0, 1.0, 1.0, Ease::Linear));
        t.start(Prop::B, Tween::new(0.0, 1.0, 1.0, Ease::Linear));
        assert_eq!(t.cancel_where(|k| *k == Prop::B), 1);
        assert!(t.is_running(Prop::A));
        assert!(!t.is_running(Prop::B));
        assert!(t.cancel(Prop::A));
        assert!(!t.cancel(Prop::A));
    }
}
