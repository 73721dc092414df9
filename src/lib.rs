pub mod commands;
pub mod controls;
pub mod pipeline;

pub use controls::{ControlAction, ControlOutcome, KEY_BINDINGS};
pub use pipeline::{DetectionBatch, Detector, Pipeline};

/// Install the global tracing subscriber. `RUST_LOG` overrides the default filter.
pub fn init_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "arena_scout=debug,scout_state=debug,scout_vision=debug".into()),
        )
        .init();
}

pub fn run() -> anyhow::Result<()> {
    init_tracing();
    let args: Vec<String> = std::env::args().skip(1).collect();
    commands::dispatch(&args)
}
