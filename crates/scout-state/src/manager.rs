use scout_data::{normalize_card_name, CardCatalog};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::time::Instant;
use tracing::{debug, info};

use crate::config::EngineConfig;
use crate::cycle::{CardCycleModel, CycleUpdate};
use crate::dedup::DetectionDeduplicator;
use crate::elixir::ElixirClock;
use crate::record::DetectionRecord;
use crate::towers::{
    is_structure_class, ObjectTracker, StructureStates, StructureTransition, TrackerUpdate,
};

/// Consolidated opponent model at one point in time
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Snapshot {
    pub elixir: f64,
    pub double_elixir: bool,
    pub known_cards: Vec<String>,
    pub hand: Vec<String>,
    pub queue: Vec<String>,
    pub structures: StructureStates,
    pub transitions: Vec<StructureTransition>,
    /// Player's own elixir as read off the meter, reported as-is
    pub own_elixir: Option<u8>,
}

/// What one `update` call did
#[derive(Debug, Clone, Default)]
pub struct UpdateReport {
    /// Card classes accepted as new plays, in batch order
    pub plays: Vec<String>,
    pub duplicates: usize,
    /// Actor detections skipped for position, label or confidence
    pub skipped: usize,
    pub towers: TrackerUpdate,
}

/// Owns every piece of opponent state and routes detector output to it.
pub struct StateManager {
    config: EngineConfig,
    catalog: CardCatalog,
    clock: ElixirClock,
    dedup: DetectionDeduplicator,
    tracker: ObjectTracker,
    cycle: CardCycleModel,
    own_elixir: Option<u8>,
    /// Normalized label -> first spelling seen, for cards the catalog lacks
    aliases: HashMap<String, String>,
}

impl StateManager {
    pub fn new(config: EngineConfig, catalog: CardCatalog, now: Instant) -> Self {
        Self {
            clock: ElixirClock::with_config(config.elixir.clone(), now),
            dedup: DetectionDeduplicator::new(config.dedup.clone()),
            tracker: ObjectTracker::new(config.frame, config.towers.clone()),
            cycle: CardCycleModel::new(config.cycle.clone()),
            own_elixir: None,
            aliases: HashMap::new(),
            config,
            catalog,
        }
    }

    /// Apply one detection batch observed at `now`.
    ///
    /// An empty batch only advances the elixir clock.
    pub fn update(&mut self, detections: &[DetectionRecord], now: Instant) -> UpdateReport {
        self.clock.advance(now);

        let mut report = UpdateReport::default();
        if detections.is_empty() {
            return report;
        }

        let (structures, actors): (Vec<&DetectionRecord>, Vec<&DetectionRecord>) = detections
            .iter()
            .filter(|d| d.confidence >= self.config.min_confidence)
            .partition(|d| is_structure_class(&d.class_name));
        report.skipped += detections.len() - structures.len() - actors.len();

        let structures: Vec<DetectionRecord> = structures.into_iter().cloned().collect();
        report.towers = self.tracker.update(&structures, now);

        for det in actors {
            if !self.config.frame.is_opponent_half(det.center) || self.is_ignored(&det.class_name)
            {
                report.skipped += 1;
                continue;
            }

            let card = self.card_name(&det.class_name);
            if !self.dedup.accept(&card, det.center, now) {
                report.duplicates += 1;
                continue;
            }

            let cost = self
                .catalog
                .cost_of(&card)
                .map(f64::from)
                .unwrap_or_else(|| self.clock.default_cost());
            self.clock.spend(cost);

            let cycle = self.cycle.on_played(&card);
            info!(
                "Opponent played {} at ({:.0}, {:.0}), cost {:.0}, elixir now {:.1}",
                card,
                det.center.x,
                det.center.y,
                cost,
                self.clock.level()
            );
            if cycle == CycleUpdate::Profiled {
                debug!(
                    "Deck profile {}/{}",
                    self.cycle.known().len(),
                    self.config.cycle.deck_size
                );
            }
            report.plays.push(card);
        }

        report
    }

    /// One spelling per card: the catalog's display name, else the first label seen.
    fn card_name(&mut self, class_name: &str) -> String {
        if let Some(card) = self.catalog.get(class_name) {
            return card.name.clone();
        }
        self.aliases
            .entry(normalize_card_name(class_name))
            .or_insert_with(|| class_name.to_string())
            .clone()
    }

    /// Structure labels the detector sometimes reports as actors, plus configured
    /// noise labels. Cards in the catalog are never ignored.
    fn is_ignored(&self, class_name: &str) -> bool {
        if self.catalog.get(class_name).is_some() {
            return false;
        }
        let key = normalize_card_name(class_name);
        is_structure_class(class_name)
            || (key.contains("king") && key.contains("tower"))
            || self
                .config
                .ignored_labels
                .iter()
                .any(|label| normalize_card_name(label) == key)
    }

    /// Current state. Structure transitions are relative to the previous call.
    pub fn snapshot(&mut self) -> Snapshot {
        let (structures, transitions) = self.tracker.structure_states();
        for t in &transitions {
            info!("Tower {} is {:?}", t.quadrant.label(), t.change);
        }

        Snapshot {
            elixir: self.clock.level(),
            double_elixir: self.clock.is_double_rate(),
            known_cards: self.cycle.known().iter().cloned().collect(),
            hand: self.cycle.hand().to_vec(),
            queue: self.cycle.queue().cloned().collect(),
            structures,
            transitions,
            own_elixir: self.own_elixir,
        }
    }

    pub fn record_own_elixir(&mut self, reading: Option<u8>) {
        self.own_elixir = reading;
    }

    pub fn set_double_elixir(&mut self, enabled: bool, now: Instant) {
        info!("Double elixir {}", if enabled { "on" } else { "off" });
        self.clock.set_double_rate(enabled, now);
    }

    pub fn is_double_elixir(&self) -> bool {
        self.clock.is_double_rate()
    }

    /// Forget everything learned about the opponent's elixir and deck
    pub fn reset_opponent(&mut self, now: Instant) {
        info!("Resetting opponent model");
        self.clock.reset(now);
        self.cycle.reset();
        self.dedup.clear();
        self.aliases.clear();
    }

    pub fn reset_structures(&mut self) {
        info!("Resetting tower tracking");
        self.tracker.reset();
    }

    pub fn tracker(&self) -> &ObjectTracker {
        &self.tracker
    }

    pub fn elixir(&self) -> f64 {
        self.clock.level()
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }
}
