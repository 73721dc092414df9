mod replay;

pub use replay::{parse_replay, replay_file, run_replay, ReplayFrame};

use anyhow::{bail, Result};
use std::path::PathBuf;

const USAGE: &str = "Usage: arena-scout replay <recording.jsonl> [config.json] [data_dir]";

/// Dispatch a command line (without the program name).
pub fn dispatch(args: &[String]) -> Result<()> {
    match args.first().map(String::as_str) {
        Some("replay") => {
            let Some(path) = args.get(1) else {
                bail!("{}", USAGE);
            };
            let config_path = args
                .get(2)
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from("config.json"));
            let data_dir = args
                .get(3)
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from("data"));
            replay_file(&PathBuf::from(path), &config_path, &data_dir)
        }
        Some(other) => bail!("Unknown command '{}'\n{}", other, USAGE),
        None => bail!("{}", USAGE),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dispatch_requires_command() {
        let err = dispatch(&[]).unwrap_err();
        assert!(err.to_string().contains("Usage"));
    }

    #[test]
    fn test_dispatch_rejects_unknown_command() {
        let err = dispatch(&["capture".to_string()]).unwrap_err();
        assert!(err.to_string().contains("Unknown command 'capture'"));
    }

    #[test]
    fn test_replay_missing_file_is_error() {
        let args = vec!["replay".to_string(), "/nonexistent/run.jsonl".to_string()];
        assert!(dispatch(&args).is_err());
    }
}
