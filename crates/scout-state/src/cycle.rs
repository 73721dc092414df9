use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, VecDeque};
use tracing::{debug, warn};

pub const DECK_SIZE: usize = 8;
pub const HAND_SIZE: usize = 4;

/// What happens when a card already in the estimated hand is played again.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ReplayPolicy {
    /// Leave the hand untouched; the play only enters the queue.
    #[default]
    Retain,
    /// Take the card out of the hand and send it to the back of the queue.
    Requeue,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CycleConfig {
    pub deck_size: usize,
    pub hand_size: usize,
    pub replay_policy: ReplayPolicy,
}

impl Default for CycleConfig {
    fn default() -> Self {
        Self {
            deck_size: DECK_SIZE,
            hand_size: HAND_SIZE,
            replay_policy: ReplayPolicy::Retain,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CycleUpdate {
    /// Deck still being profiled; only the known set changed
    Profiled,
    /// Play went through the rotation model
    Rotated,
    /// Card is not part of an already complete deck
    OutsideDeck,
}

/// Reconstructs the opponent's hand and rotation order from play events.
///
/// Nothing is inferred until the whole deck has been seen. The plays after
/// that point fill the hand first; later plays rotate through the queue.
#[derive(Debug, Clone, Default)]
pub struct CardCycleModel {
    config: CycleConfig,
    known: BTreeSet<String>,
    queue: VecDeque<String>,
    hand: Vec<String>,
}

impl CardCycleModel {
    pub fn new(config: CycleConfig) -> Self {
        Self {
            config,
            known: BTreeSet::new(),
            queue: VecDeque::new(),
            hand: Vec::new(),
        }
    }

    pub fn on_played(&mut self, card: &str) -> CycleUpdate {
        if !self.deck_complete() {
            if self.known.insert(card.to_string()) {
                debug!("Deck profile: {} ({}/{})", card, self.known.len(), self.config.deck_size);
            }
            return CycleUpdate::Profiled;
        }

        if !self.known.contains(card) {
            warn!(
                "{} played but the {}-card deck is already known; ignoring for cycle",
                card, self.config.deck_size
            );
            return CycleUpdate::OutsideDeck;
        }

        let mut requeued = false;
        if self.config.replay_policy == ReplayPolicy::Requeue {
            let before = self.hand.len();
            self.hand.retain(|c| c != card);
            requeued = self.hand.len() < before;
        }

        // The first post-deck plays fill the hand directly, in arrival order
        if !requeued
            && self.queue.is_empty()
            && self.hand.len() < self.config.hand_size
            && !self.hand.iter().any(|c| c == card)
        {
            self.hand.push(card.to_string());
            debug!("Hand after {}: {:?}", card, self.hand);
            return CycleUpdate::Rotated;
        }

        self.queue.push_back(card.to_string());
        while self.queue.len() >= self.config.hand_size && self.hand.len() < self.config.hand_size
        {
            match self.queue.pop_front() {
                Some(next) => self.hand.push(next),
                None => break,
            }
        }
        while self.queue.len() > self.config.hand_size {
            self.queue.pop_front();
        }

        debug!("Cycle after {}: hand={:?} queue={:?}", card, self.hand, self.queue);
        CycleUpdate::Rotated
    }

    pub fn deck_complete(&self) -> bool {
        self.known.len() >= self.config.deck_size
    }

    pub fn known(&self) -> &BTreeSet<String> {
        &self.known
    }

    pub fn hand(&self) -> &[String] {
        &self.hand
    }

    pub fn queue(&self) -> impl Iterator<Item = &String> {
        self.queue.iter()
    }

    pub fn reset(&mut self) {
        self.known.clear();
        self.queue.clear();
        self.hand.clear();
    }
}
