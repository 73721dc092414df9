use scout_state::StateManager;
use std::time::Instant;
use tracing::{info, warn};

/// Operator actions that can be bound to a key
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ControlAction {
    Quit,
    ResetOpponent,
    ResetStructures,
    ToggleDoubleElixir,
    /// Key with no binding
    Unknown(char),
}

/// Key bindings. Lookups are case-insensitive.
pub const KEY_BINDINGS: &[(char, ControlAction)] = &[
    ('q', ControlAction::Quit),
    ('r', ControlAction::ResetOpponent),
    ('t', ControlAction::ResetStructures),
    ('d', ControlAction::ToggleDoubleElixir),
];

impl ControlAction {
    pub fn from_key(key: char) -> Self {
        let key = key.to_ascii_lowercase();
        KEY_BINDINGS
            .iter()
            .find(|(k, _)| *k == key)
            .map(|(_, action)| *action)
            .unwrap_or(ControlAction::Unknown(key))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ControlOutcome {
    Continue,
    Quit,
    Ignored(char),
}

/// Apply an action to the state it targets.
pub fn apply(action: ControlAction, manager: &mut StateManager, now: Instant) -> ControlOutcome {
    match action {
        ControlAction::Quit => {
            info!("Quit requested");
            ControlOutcome::Quit
        }
        ControlAction::ResetOpponent => {
            manager.reset_opponent(now);
            ControlOutcome::Continue
        }
        ControlAction::ResetStructures => {
            manager.reset_structures();
            ControlOutcome::Continue
        }
        ControlAction::ToggleDoubleElixir => {
            let enabled = !manager.is_double_elixir();
            manager.set_double_elixir(enabled, now);
            ControlOutcome::Continue
        }
        ControlAction::Unknown(key) => {
            warn!("No action bound to key '{}'", key);
            ControlOutcome::Ignored(key)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use scout_data::CardCatalog;
    use scout_state::{DetectionRecord, EngineConfig};

    fn manager(now: Instant) -> StateManager {
        StateManager::new(EngineConfig::default(), CardCatalog::builtin(), now)
    }

    #[test]
    fn test_key_lookup() {
        assert_eq!(ControlAction::from_key('q'), ControlAction::Quit);
        assert_eq!(ControlAction::from_key('D'), ControlAction::ToggleDoubleElixir);
        assert_eq!(ControlAction::from_key('x'), ControlAction::Unknown('x'));
    }

    #[test]
    fn test_unknown_key_is_reported() {
        let now = Instant::now();
        let mut m = manager(now);
        let outcome = apply(ControlAction::from_key('z'), &mut m, now);
        assert_eq!(outcome, ControlOutcome::Ignored('z'));
    }

    #[test]
    fn test_toggle_double_elixir() {
        let now = Instant::now();
        let mut m = manager(now);
        assert_eq!(apply(ControlAction::ToggleDoubleElixir, &mut m, now), ControlOutcome::Continue);
        assert!(m.is_double_elixir());
        apply(ControlAction::ToggleDoubleElixir, &mut m, now);
        assert!(!m.is_double_elixir());
    }

    #[test]
    fn test_reset_actions() {
        let now = Instant::now();
        let mut m = manager(now);
        m.update(
            &[
                DetectionRecord::new("Knight", 0.9, 100.0, 200.0),
                DetectionRecord::new("Princess Tower", 0.9, 100.0, 150.0),
            ],
            now,
        );

        apply(ControlAction::ResetOpponent, &mut m, now);
        assert!(m.snapshot().known_cards.is_empty());
        assert_eq!(m.tracker().objects().count(), 1);

        apply(ControlAction::ResetStructures, &mut m, now);
        assert_eq!(m.tracker().objects().count(), 0);
        assert_eq!(apply(ControlAction::Quit, &mut m, now), ControlOutcome::Quit);
    }
}
