// Configuration loading and parsing (league.toml: league identity, data paths, scoring rules).

use castaway_core::rules::LeagueRules;
use serde::Deserialize;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::info;

// ---------------------------------------------------------------------------
// Error types
// ---------------------------------------------------------------------------

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("config file not found: {path}")]
    FileNotFound { path: PathBuf },

    #[error("failed to parse config file {path}: {source}")]
    ParseError {
        path: PathBuf,
        source: toml::de::Error,
    },

    #[error("validation error for field `{field}`: {message}")]
    ValidationError { field: String, message: String },

    #[error("failed to initialize config from defaults: {message}")]
    DefaultsCopyError { message: String },
}

// ---------------------------------------------------------------------------
// Top-level assembled Config
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub struct Config {
    pub league: LeagueConfig,
    pub data: DataConfig,
    pub rules: LeagueRules,
    /// Directory the config was loaded from; relative data paths resolve here.
    pub base_dir: PathBuf,
}

impl Config {
    /// Absolute path of the season snapshot.
    pub fn snapshot_path(&self) -> PathBuf {
        self.base_dir.join(&self.data.snapshot)
    }
}

// ---------------------------------------------------------------------------
// league.toml structs
// ---------------------------------------------------------------------------

/// Shape of league.toml on disk.
#[derive(Debug, Clone, Deserialize)]
struct LeagueFile {
    league: LeagueConfig,
    data: DataConfig,
    #[serde(default)]
    rules: LeagueRules,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LeagueConfig {
    pub name: String,
    #[serde(default)]
    pub season: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DataConfig {
    /// Season snapshot JSON, relative to the base directory.
    pub snapshot: String,
}

// ---------------------------------------------------------------------------
// Loading logic
// ---------------------------------------------------------------------------

/// Load and validate `config/league.toml` relative to `base_dir`.
///
/// This does not seed defaults; `load_config()` does that first.
pub fn load_config_from(base_dir: &Path) -> Result<Config, ConfigError> {
    let league_path = base_dir.join("config").join("league.toml");
    let league_text = read_file(&league_path)?;
    let league_file: LeagueFile =
        toml::from_str(&league_text).map_err(|e| ConfigError::ParseError {
            path: league_path.clone(),
            source: e,
        })?;

    let config = Config {
        league: league_file.league,
        data: league_file.data,
        rules: league_file.rules,
        base_dir: base_dir.to_path_buf(),
    };

    validate(&config)?;

    Ok(config)
}

/// Seed `config/league.toml` from `defaults/league.toml` when the league has
/// none yet. Returns the path written, or `None` if a league file was already
/// there. An existing file is never overwritten.
pub fn ensure_league_file(base_dir: &Path) -> Result<Option<PathBuf>, ConfigError> {
    let target = base_dir.join("config").join("league.toml");
    if target.exists() {
        return Ok(None);
    }

    let source = base_dir.join("defaults").join("league.toml");
    let defaults = std::fs::read(&source).map_err(|e| ConfigError::DefaultsCopyError {
        message: format!(
            "no config/league.toml in {} and {} is unreadable: {e}",
            base_dir.display(),
            source.display()
        ),
    })?;

    let copy_error = |e: std::io::Error| ConfigError::DefaultsCopyError {
        message: format!("failed to write {}: {e}", target.display()),
    };
    if let Some(config_dir) = target.parent() {
        std::fs::create_dir_all(config_dir).map_err(copy_error)?;
    }
    let mut dest = match std::fs::OpenOptions::new()
        .write(true)
        .create_new(true)
        .open(&target)
    {
        Ok(dest) => dest,
        // Someone else seeded it between the check and the open.
        Err(e) if e.kind() == std::io::ErrorKind::AlreadyExists => return Ok(None),
        Err(e) => return Err(copy_error(e)),
    };
    std::io::Write::write_all(&mut dest, &defaults).map_err(copy_error)?;

    Ok(Some(target))
}

/// Load config relative to the current working directory, copying defaults first.
pub fn load_config() -> Result<Config, ConfigError> {
    let cwd = std::env::current_dir().map_err(|_| ConfigError::FileNotFound {
        path: PathBuf::from("."),
    })?;
    if let Some(seeded) = ensure_league_file(&cwd)? {
        info!(path = %seeded.display(), "seeded league file from defaults");
    }
    load_config_from(&cwd)
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn read_file(path: &Path) -> Result<String, ConfigError> {
    std::fs::read_to_string(path).map_err(|_| ConfigError::FileNotFound {
        path: path.to_path_buf(),
    })
}

// ---------------------------------------------------------------------------
// Validation
// ---------------------------------------------------------------------------

fn validate(config: &Config) -> Result<(), ConfigError> {
    if config.league.name.trim().is_empty() {
        return Err(ConfigError::ValidationError {
            field: "league.name".into(),
            message: "must not be empty".into(),
        });
    }

    if config.data.snapshot.trim().is_empty() {
        return Err(ConfigError::ValidationError {
            field: "data.snapshot".into(),
            message: "must name a season snapshot file".into(),
        });
    }

    config.rules.validate().map_err(|e| match e {
        castaway_core::EngineError::InvalidRules { field, message } => {
            ConfigError::ValidationError {
                field: format!("rules.{field}"),
                message,
            }
        }
        other => ConfigError::ValidationError {
            field: "rules".into(),
            message: other.to_string(),
        },
    })
}

// ---------------------------------------------------------------------------
// Unit tests
// ---------------------------------------------------------------------------
