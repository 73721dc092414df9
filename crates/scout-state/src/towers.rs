use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Instant;
use tracing::{debug, info};

use crate::frame::{FrameSize, Owner, Quadrant, Side};
use crate::record::{DetectionRecord, Point};

pub const MATCH_DISTANCE_PX: f64 = 100.0;
pub const STALE_TIMEOUT_SECONDS: f64 = 1.0;
/// Grid used to collapse overlapping boxes for one tower within a frame
pub const BATCH_BUCKET_PX: f64 = 10.0;

/// Track ids are unique for the lifetime of the process, across trackers.
static NEXT_TRACK_ID: AtomicU64 = AtomicU64::new(1);

fn next_track_id() -> u64 {
    NEXT_TRACK_ID.fetch_add(1, Ordering::Relaxed)
}

/// How "is this tower down" is decided for a quadrant
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum DownPolicy {
    /// Down unless some object in the quadrant is still active
    #[default]
    NoActive,
    /// Down unless the highest-confidence object (at or above the
    /// confidence floor) is active
    BestObject,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TowerConfig {
    pub match_distance_px: f64,
    pub stale_timeout_secs: f64,
    pub bucket_px: f64,
    pub down_policy: DownPolicy,
    pub min_confidence: f64,
}

impl Default for TowerConfig {
    fn default() -> Self {
        Self {
            match_distance_px: MATCH_DISTANCE_PX,
            stale_timeout_secs: STALE_TIMEOUT_SECONDS,
            bucket_px: BATCH_BUCKET_PX,
            down_policy: DownPolicy::NoActive,
            min_confidence: 0.0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TrackStatus {
    Active,
    /// Not seen within the timeout. Terminal: the object is kept but never revived.
    Stale,
}

#[derive(Debug, Clone)]
pub struct TrackedObject {
    pub id: u64,
    pub position: Point,
    pub confidence: f64,
    pub side: Side,
    pub owner: Owner,
    pub status: TrackStatus,
    pub last_seen: Instant,
}

impl TrackedObject {
    fn new(position: Point, confidence: f64, frame: &FrameSize, now: Instant) -> Self {
        Self {
            id: next_track_id(),
            position,
            confidence,
            side: frame.side_of(position.x),
            owner: frame.owner_of(position.y),
            status: TrackStatus::Active,
            last_seen: now,
        }
    }

    fn refresh(&mut self, position: Point, confidence: f64, frame: &FrameSize, now: Instant) {
        self.position = position;
        self.confidence = confidence;
        self.side = frame.side_of(position.x);
        self.owner = frame.owner_of(position.y);
        self.last_seen = now;
    }

    pub fn quadrant(&self) -> Quadrant {
        Quadrant::from_parts(self.side, self.owner)
    }

    pub fn is_active(&self) -> bool {
        self.status == TrackStatus::Active
    }
}

/// Per-quadrant "tower is down" flags
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct StructureStates {
    #[serde(rename = "LE")]
    pub left_enemy_down: bool,
    #[serde(rename = "RE")]
    pub right_enemy_down: bool,
    #[serde(rename = "LF")]
    pub left_friendly_down: bool,
    #[serde(rename = "RF")]
    pub right_friendly_down: bool,
}

impl StructureStates {
    pub fn get(&self, quadrant: Quadrant) -> bool {
        match quadrant {
            Quadrant::LeftEnemy => self.left_enemy_down,
            Quadrant::RightEnemy => self.right_enemy_down,
            Quadrant::LeftFriendly => self.left_friendly_down,
            Quadrant::RightFriendly => self.right_friendly_down,
        }
    }

    fn set(&mut self, quadrant: Quadrant, down: bool) {
        match quadrant {
            Quadrant::LeftEnemy => self.left_enemy_down = down,
            Quadrant::RightEnemy => self.right_enemy_down = down,
            Quadrant::LeftFriendly => self.left_friendly_down = down,
            Quadrant::RightFriendly => self.right_friendly_down = down,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum StructureChange {
    Down,
    Up,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StructureTransition {
    pub quadrant: Quadrant,
    pub change: StructureChange,
}

/// What one `update` call did to the tracked set
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TrackerUpdate {
    pub created: Vec<u64>,
    pub matched: Vec<u64>,
    pub went_stale: Vec<u64>,
    pub dropped_overlaps: usize,
}

/// Keeps identity-stable princess towers across frames.
pub struct ObjectTracker {
    frame: FrameSize,
    config: TowerConfig,
    objects: BTreeMap<u64, TrackedObject>,
    previous: StructureStates,
}

impl ObjectTracker {
    pub fn new(frame: FrameSize, config: TowerConfig) -> Self {
        Self {
            frame,
            config,
            objects: BTreeMap::new(),
            previous: StructureStates::default(),
        }
    }

    /// Feed one frame's detections. Non-structure classes are ignored.
    pub fn update(&mut self, detections: &[DetectionRecord], now: Instant) -> TrackerUpdate {
        let mut report = TrackerUpdate::default();
        self.sweep_stale(now, &mut report);

        let mut seen_buckets = HashSet::new();
        for det in detections.iter().filter(|d| is_structure_class(&d.class_name)) {
            if !seen_buckets.insert(self.bucket_of(det.center)) {
                report.dropped_overlaps += 1;
                continue;
            }

            match self.find_match(det.center) {
                Some(id) => {
                    if let Some(obj) = self.objects.get_mut(&id) {
                        obj.refresh(det.center, det.confidence, &self.frame, now);
                        report.matched.push(id);
                    }
                }
                None => {
                    let obj = TrackedObject::new(det.center, det.confidence, &self.frame, now);
                    info!(
                        "New tower #{} at ({:.0}, {:.0}) in {} (confidence={:.2})",
                        obj.id,
                        obj.position.x,
                        obj.position.y,
                        obj.quadrant().label(),
                        obj.confidence
                    );
                    report.created.push(obj.id);
                    self.objects.insert(obj.id, obj);
                }
            }
        }

        self.sweep_stale(now, &mut report);
        report
    }

    /// Nearest active object in the detection's quadrant within the match distance
    fn find_match(&self, p: Point) -> Option<u64> {
        let quadrant = self.frame.quadrant_of(p);
        let mut best: Option<(u64, f64)> = None;
        for obj in self.objects.values() {
            if !obj.is_active() || obj.quadrant() != quadrant {
                continue;
            }
            let distance = p.distance(&obj.position);
            if distance < self.config.match_distance_px
                && best.map_or(true, |(_, d)| distance < d)
            {
                best = Some((obj.id, distance));
            }
        }
        best.map(|(id, _)| id)
    }

    fn sweep_stale(&mut self, now: Instant, report: &mut TrackerUpdate) {
        for obj in self.objects.values_mut() {
            if obj.is_active()
                && now.saturating_duration_since(obj.last_seen).as_secs_f64()
                    > self.config.stale_timeout_secs
            {
                obj.status = TrackStatus::Stale;
                debug!("Tower #{} in {} went stale", obj.id, obj.quadrant().label());
                report.went_stale.push(obj.id);
            }
        }
    }

    fn bucket_of(&self, p: Point) -> (i64, i64) {
        let step = if self.config.bucket_px > 0.0 {
            self.config.bucket_px
        } else {
            BATCH_BUCKET_PX
        };
        ((p.x / step).round() as i64, (p.y / step).round() as i64)
    }

    /// Whether the tower in `quadrant` is considered down. A quadrant that
    /// was never observed also reports down.
    pub fn is_down(&self, quadrant: Quadrant) -> bool {
        match self.config.down_policy {
            DownPolicy::NoActive => !self.objects_in(quadrant).any(TrackedObject::is_active),
            DownPolicy::BestObject => self
                .objects_in(quadrant)
                .filter(|o| o.confidence >= self.config.min_confidence)
                .max_by(|a, b| a.confidence.total_cmp(&b.confidence))
                .map_or(true, |best| !best.is_active()),
        }
    }

    /// Current down flags plus the transitions since the previous call.
    pub fn structure_states(&mut self) -> (StructureStates, Vec<StructureTransition>) {
        let mut current = StructureStates::default();
        let mut transitions = Vec::new();

        for quadrant in Quadrant::ALL {
            let down = self.is_down(quadrant);
            current.set(quadrant, down);

            let change = match (self.previous.get(quadrant), down) {
                (false, true) => Some(StructureChange::Down),
                (true, false) => Some(StructureChange::Up),
                _ => None,
            };
            if let Some(change) = change {
                transitions.push(StructureTransition { quadrant, change });
            }
        }

        self.previous = current;
        (current, transitions)
    }

    pub fn objects(&self) -> impl Iterator<Item = &TrackedObject> {
        self.objects.values()
    }

    pub fn objects_in(&self, quadrant: Quadrant) -> impl Iterator<Item = &TrackedObject> {
        self.objects.values().filter(move |o| o.quadrant() == quadrant)
    }

    pub fn get(&self, id: u64) -> Option<&TrackedObject> {
        self.objects.get(&id)
    }

    /// Forget all towers and transition history. Ids are not reused.
    pub fn reset(&mut self) {
        self.objects.clear();
        self.previous = StructureStates::default();
    }
}

/// Princess-tower labels, e.g. "princess tower" or "enemy-princess-tower"
pub fn is_structure_class(class_name: &str) -> bool {
    let lower = class_name.to_lowercase();
    lower.contains("princess") && lower.contains("tower")
}
