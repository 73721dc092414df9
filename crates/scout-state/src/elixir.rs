use serde::{Deserialize, Serialize};
use std::time::Instant;
use tracing::debug;

pub const ELIXIR_MAX: f64 = 10.0;
/// Assumed opponent level when tracking starts mid-match
pub const ELIXIR_START: f64 = 5.0;
pub const ELIXIR_RATE_SINGLE: f64 = 0.35;
pub const ELIXIR_RATE_DOUBLE: f64 = 0.70;
/// Spend applied when a card's cost is not in the catalog
pub const DEFAULT_CARD_COST: f64 = 4.0;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ElixirConfig {
    pub start: f64,
    pub max: f64,
    pub single_rate: f64,
    pub double_rate: f64,
    pub default_cost: f64,
}

impl Default for ElixirConfig {
    fn default() -> Self {
        Self {
            start: ELIXIR_START,
            max: ELIXIR_MAX,
            single_rate: ELIXIR_RATE_SINGLE,
            double_rate: ELIXIR_RATE_DOUBLE,
            default_cost: DEFAULT_CARD_COST,
        }
    }
}

/// Time-integrated estimate of the opponent's elixir.
///
/// The level is always kept inside `[0, max]`; inputs are clamped, never
/// rejected.
#[derive(Debug, Clone)]
pub struct ElixirClock {
    config: ElixirConfig,
    level: f64,
    last_update: Instant,
    double_rate: bool,
}

impl ElixirClock {
    pub fn new(now: Instant) -> Self {
        Self::with_config(ElixirConfig::default(), now)
    }

    pub fn with_config(config: ElixirConfig, now: Instant) -> Self {
        let max = config.max.max(0.0);
        let level = config.start.clamp(0.0, max);
        Self {
            config,
            level,
            last_update: now,
            double_rate: false,
        }
    }

    /// Regenerate for the time elapsed since the previous call.
    /// A `now` earlier than the last update counts as zero elapsed time.
    pub fn advance(&mut self, now: Instant) {
        let dt = now.saturating_duration_since(self.last_update).as_secs_f64();
        self.level = (self.level + dt * self.rate()).clamp(0.0, self.max());
        if now > self.last_update {
            self.last_update = now;
        }
    }

    pub fn spend(&mut self, cost: f64) {
        let cost = if cost.is_finite() { cost.max(0.0) } else { 0.0 };
        self.level = (self.level - cost).max(0.0);
        debug!("Opponent spent {:.1} elixir, now {:.2}", cost, self.level);
    }

    /// Switch regeneration rate. Time already elapsed is credited at the old rate.
    pub fn set_double_rate(&mut self, enabled: bool, now: Instant) {
        self.advance(now);
        self.double_rate = enabled;
    }

    pub fn reset(&mut self, now: Instant) {
        self.level = self.config.start.clamp(0.0, self.max());
        self.last_update = now;
        self.double_rate = false;
    }

    pub fn level(&self) -> f64 {
        self.level
    }

    pub fn is_double_rate(&self) -> bool {
        self.double_rate
    }

    pub fn rate(&self) -> f64 {
        if self.double_rate {
            self.config.double_rate
        } else {
            self.config.single_rate
        }
    }

    pub fn default_cost(&self) -> f64 {
        self.config.default_cost
    }

    fn max(&self) -> f64 {
        self.config.max.max(0.0)
    }
}
