//! Opponent-state estimation: elixir regeneration, play deduplication,
//! tower tracking and card-cycle inference from per-frame detections.

mod config;
mod cycle;
mod dedup;
mod elixir;
mod frame;
mod manager;
mod record;
mod towers;

pub use config::EngineConfig;
pub use cycle::{CardCycleModel, CycleConfig, CycleUpdate, ReplayPolicy, DECK_SIZE, HAND_SIZE};
pub use dedup::{DedupConfig, DetectionDeduplicator, DEBOUNCE_SECONDS, DUPLICATE_DISTANCE_PX};
pub use elixir::{
    ElixirClock, ElixirConfig, DEFAULT_CARD_COST, ELIXIR_MAX, ELIXIR_RATE_DOUBLE,
    ELIXIR_RATE_SINGLE, ELIXIR_START,
};
pub use frame::{FrameSize, Owner, Quadrant, Side, DEFAULT_FRAME_HEIGHT, DEFAULT_FRAME_WIDTH};
pub use manager::{Snapshot, StateManager, UpdateReport};
pub use record::{DetectionRecord, Point, UNKNOWN_CLASS};
pub use towers::{
    is_structure_class, DownPolicy, ObjectTracker, StructureChange, StructureStates,
    StructureTransition, TowerConfig, TrackStatus, TrackedObject, TrackerUpdate,
    MATCH_DISTANCE_PX, STALE_TIMEOUT_SECONDS,
};
