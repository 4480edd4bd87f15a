// Season snapshot loading: the JSON export of one league-season's rows.

use std::path::{Path, PathBuf};

use castaway_core::SeasonInput;
use thiserror::Error;
use tracing::info;

#[derive(Debug, Error)]
pub enum SnapshotError {
    #[error("failed to read season snapshot {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to parse season snapshot {path}: {source}")]
    Parse {
        path: PathBuf,
        source: serde_json::Error,
    },
}

/// Read and deserialize a season snapshot.
pub fn load_snapshot(path: &Path) -> Result<SeasonInput, SnapshotError> {
    let text = std::fs::read_to_string(path).map_err(|source| SnapshotError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    let input = parse_snapshot(&text).map_err(|source| SnapshotError::Parse {
        path: path.to_path_buf(),
        source,
    })?;

    info!(
        "Snapshot loaded: {} episodes, {} contestants, {} members, {} events",
        input.episodes.len(),
        input.contestants.len(),
        input.members.len(),
        input.events.len()
    );
    Ok(input)
}

pub fn parse_snapshot(text: &str) -> Result<SeasonInput, serde_json::Error> {
    serde_json::from_str(text)
}
