use anyhow::{Context, Result};
use scout_data::CardCatalog;
use scout_state::{DetectionRecord, EngineConfig, Snapshot, StateManager};
use serde::Deserialize;
use serde_json::Value;
use std::path::Path;
use std::time::{Duration, Instant};
use tracing::{debug, info};

use crate::controls::{self, ControlAction, ControlOutcome};

/// One line of a recorded detection stream
#[derive(Debug, Clone, Deserialize)]
pub struct ReplayFrame {
    /// Seconds since the start of the recording
    #[serde(default)]
    pub t: f64,
    /// Raw detector output for the frame
    #[serde(default)]
    pub detections: Value,
    /// Keys pressed after the frame was shown
    #[serde(default)]
    pub keys: Vec<String>,
}

/// Parse a JSON-lines recording. Blank lines are skipped.
pub fn parse_replay(text: &str) -> Result<Vec<ReplayFrame>> {
    text.lines()
        .enumerate()
        .filter(|(_, line)| !line.trim().is_empty())
        .map(|(i, line)| {
            serde_json::from_str(line)
                .with_context(|| format!("Invalid replay record on line {}", i + 1))
        })
        .collect()
}

/// Feed recorded frames through a fresh engine and return the last snapshot.
pub fn run_replay(frames: &[ReplayFrame], config: EngineConfig, catalog: CardCatalog) -> Snapshot {
    let base = Instant::now();
    let mut manager = StateManager::new(config, catalog, base);
    let mut offset = Duration::ZERO;

    for (i, frame) in frames.iter().enumerate() {
        // Bad or negative timestamps keep the previous offset
        if let Ok(t) = Duration::try_from_secs_f64(frame.t) {
            offset = t;
        }
        let now = base + offset;

        let detections = DetectionRecord::parse_batch(&frame.detections);
        let report = manager.update(&detections, now);
        debug!(
            "Frame {} (t={:.2}s): {} play(s), {} duplicate(s)",
            i,
            frame.t,
            report.plays.len(),
            report.duplicates
        );

        for key in &frame.keys {
            let Some(c) = key.chars().next() else { continue };
            if controls::apply(ControlAction::from_key(c), &mut manager, now) == ControlOutcome::Quit
            {
                info!("Replay stopped by quit key at frame {}", i);
                return manager.snapshot();
            }
        }

        let snap = manager.snapshot();
        for transition in &snap.transitions {
            info!(
                "t={:.2}s {} {:?}",
                frame.t,
                transition.quadrant.label(),
                transition.change
            );
        }
    }

    manager.snapshot()
}

/// Replay a recording from disk and print the final snapshot as JSON.
pub fn replay_file(path: &Path, config_path: &Path, data_dir: &Path) -> Result<()> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read replay {}", path.display()))?;
    let frames = parse_replay(&text)?;
    let config = EngineConfig::load(config_path)?;
    let catalog = CardCatalog::load(data_dir)?;
    info!("Replaying {} frame(s) from {}", frames.len(), path.display());

    let snapshot = run_replay(&frames, config, catalog);
    let json = serde_json::to_string_pretty(&snapshot).context("Failed to encode snapshot")?;
    println!("{}", json);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn play(t: f64, class: &str, x: f64, y: f64) -> String {
        format!(
            r#"{{"t": {}, "detections": [{{"class": "{}", "confidence": 0.9, "box": [{}, {}, 30, 30]}}]}}"#,
            t, class, x, y
        )
    }

    #[test]
    fn test_parse_skips_blank_lines() {
        let text = format!("{}\n\n{}\n", play(0.0, "Giant", 100.0, 200.0), r#"{"t": 1.5}"#);
        let frames = parse_replay(&text).unwrap();
        assert_eq!(frames.len(), 2);
        assert_eq!(frames[1].t, 1.5);
        assert!(frames[1].keys.is_empty());
    }

    #[test]
    fn test_parse_reports_line_number() {
        let text = format!("{}\nnot json\n", play(0.0, "Giant", 100.0, 200.0));
        let err = parse_replay(&text).unwrap_err();
        assert!(format!("{:#}", err).contains("line 2"));
    }

    #[test]
    fn test_replay_giant_dedup_and_elixir() {
        // Same Giant twice within the debounce window, then once after it
        let text = [
            play(0.0, "Giant", 100.0, 200.0),
            play(1.0, "Giant", 110.0, 205.0),
            play(4.0, "Giant", 100.0, 200.0),
        ]
        .join("\n");
        let frames = parse_replay(&text).unwrap();
        let snap = run_replay(&frames, EngineConfig::default(), CardCatalog::builtin());

        assert_eq!(snap.known_cards, vec!["Giant"]);
        // 5 - 5 = 0, +0.35 -> 0.35, +1.05 = 1.40, - 5 clamps to 0
        assert!(snap.elixir.abs() < 1e-9, "elixir {}", snap.elixir);
    }

    #[test]
    fn test_replay_keys_apply_and_quit_stops() {
        let text = [
            r#"{"t": 0.0, "keys": ["D"]}"#.to_string(),
            r#"{"t": 1.0, "keys": ["q"]}"#.to_string(),
            play(2.0, "Knight", 100.0, 200.0),
        ]
        .join("\n");
        let frames = parse_replay(&text).unwrap();
        let snap = run_replay(&frames, EngineConfig::default(), CardCatalog::builtin());

        assert!(snap.double_elixir);
        assert!(snap.known_cards.is_empty());
        // Double rate for one second from the start level
        assert!((snap.elixir - 5.7).abs() < 1e-9, "elixir {}", snap.elixir);
    }

    #[test]
    fn test_replay_negative_time_keeps_clock() {
        let text = [r#"{"t": 2.0}"#, r#"{"t": -1.0}"#].join("\n");
        let frames = parse_replay(&text).unwrap();
        let snap = run_replay(&frames, EngineConfig::default(), CardCatalog::builtin());
        assert!((snap.elixir - 5.7).abs() < 1e-9);
    }
}
