use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::time::Instant;
use tracing::debug;

use crate::record::Point;

pub const DEBOUNCE_SECONDS: f64 = 3.0;
pub const DUPLICATE_DISTANCE_PX: f64 = 50.0;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DedupConfig {
    pub debounce_secs: f64,
    pub duplicate_distance_px: f64,
}

impl Default for DedupConfig {
    fn default() -> Self {
        Self {
            debounce_secs: DEBOUNCE_SECONDS,
            duplicate_distance_px: DUPLICATE_DISTANCE_PX,
        }
    }
}

#[derive(Debug, Clone)]
struct GuardEntry {
    last_time: Instant,
    last_position: Point,
}

/// Collapses the burst of detector hits one real play produces over
/// consecutive frames into a single event.
///
/// Two genuine plays of the same card at nearly the same spot within the
/// debounce window cannot be told apart from that burst and are merged.
#[derive(Debug, Clone, Default)]
pub struct DetectionDeduplicator {
    config: DedupConfig,
    entries: HashMap<String, GuardEntry>,
}

impl DetectionDeduplicator {
    pub fn new(config: DedupConfig) -> Self {
        Self {
            config,
            entries: HashMap::new(),
        }
    }

    /// Returns `true` for a new event and records it; `false` for a repeat
    /// of the last accepted event under `key`.
    pub fn accept(&mut self, key: &str, position: Point, now: Instant) -> bool {
        if let Some(entry) = self.entries.get(key) {
            let elapsed = now.saturating_duration_since(entry.last_time).as_secs_f64();
            let distance = position.distance(&entry.last_position);
            if elapsed < self.config.debounce_secs
                && distance < self.config.duplicate_distance_px
            {
                debug!(
                    "Duplicate {} ({:.2}s, {:.0}px from last accepted)",
                    key, elapsed, distance
                );
                return false;
            }
        }

        self.entries.insert(
            key.to_string(),
            GuardEntry {
                last_time: now,
                last_position: position,
            },
        );
        true
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn dedup() -> DetectionDeduplicator {
        DetectionDeduplicator::new(DedupConfig::default())
    }

    #[test]
    fn test_repeat_within_window_is_dropped() {
        let t0 = Instant::now();
        let mut d = dedup();
        let p = Point::new(100.0, 200.0);
        assert!(d.accept("Giant", p, t0));
        assert!(!d.accept("Giant", p, t0 + Duration::from_millis(2999)));
    }

    #[test]
    fn test_repeat_after_window_is_accepted() {
        let t0 = Instant::now();
        let mut d = dedup();
        let p = Point::new(100.0, 200.0);
        assert!(d.accept("Giant", p, t0));
        assert!(d.accept("Giant", p, t0 + Duration::from_secs(3)));
    }

    #[test]
    fn test_far_position_is_a_new_event() {
        let t0 = Instant::now();
        let mut d = dedup();
        assert!(d.accept("Giant", Point::new(100.0, 200.0), t0));
        assert!(!d.accept("Giant", Point::new(110.0, 200.0), t0 + Duration::from_secs(1)));
        assert!(d.accept("Giant", Point::new(100.0, 400.0), t0 + Duration::from_secs(1)));
    }

    #[test]
    fn test_accept_overwrites_entry() {
        let t0 = Instant::now();
        let mut d = dedup();
        assert!(d.accept("Giant", Point::new(100.0, 100.0), t0));
        assert!(d.accept("Giant", Point::new(300.0, 100.0), t0 + Duration::from_secs(1)));
        // Now compared against the second position, not the first
        assert!(d.accept("Giant", Point::new(100.0, 100.0), t0 + Duration::from_secs(2)));
        assert_eq!(d.len(), 1);
    }

    #[test]
    fn test_keys_are_independent() {
        let t0 = Instant::now();
        let mut d = dedup();
        let p = Point::new(50.0, 50.0);
        assert!(d.accept("Giant", p, t0));
        assert!(d.accept("Zap", p, t0));
        d.clear();
        assert!(d.is_empty());
        assert!(d.accept("Giant", p, t0));
    }
}
