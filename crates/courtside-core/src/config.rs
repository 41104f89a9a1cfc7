// Configuration loading and parsing (config/courtside.toml).

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::model::Strategy;

/// Name of the config file inside `config/` (and `defaults/`).
pub const CONFIG_FILE: &str = "courtside.toml";

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
// Assembled Config
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub struct Config {
    pub rotation: RotationConfig,
    pub weights: WeightedWeights,
    /// Resolved database location (absolute, or `:memory:`).
    pub db_path: PathBuf,
}

// ---------------------------------------------------------------------------
// courtside.toml structs
// ---------------------------------------------------------------------------

/// Raw deserialization target for the whole file.
#[derive(Debug, Clone, Deserialize)]
struct ConfigFile {
    rotation: RotationConfig,
    #[serde(default)]
    weights: WeightedWeights,
    #[serde(default)]
    database: DatabaseSection,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RotationConfig {
    /// Strategy the CLI uses when none is given on the command line.
    pub default_strategy: Strategy,
}

/// Coefficients of the weighted priority score. Lower scores play first, so
/// the negative `games_attended` weight moves regular attendees up the list.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct WeightedWeights {
    pub current_game: f64,
    pub historical: f64,
    pub games_attended: f64,
    pub swaps_attended: f64,
}

impl Default for WeightedWeights {
    fn default() -> Self {
        WeightedWeights {
            current_game: 0.50,
            historical: 0.30,
            games_attended: -0.15,
            swaps_attended: 0.05,
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
struct DatabaseSection {
    /// Empty means "use the platform data directory".
    #[serde(default)]
    path: String,
}

// ---------------------------------------------------------------------------
// Loading logic
// ---------------------------------------------------------------------------

/// Load and validate configuration from `config/courtside.toml` relative to
/// `base_dir`. Does not copy defaults; see [`load_config`].
pub fn load_config_from(base_dir: &Path) -> Result<Config, ConfigError> {
    let path = base_dir.join("config").join(CONFIG_FILE);
    let text = read_file(&path)?;
    let file: ConfigFile = toml::from_str(&text).map_err(|e| ConfigError::ParseError {
        path: path.clone(),
        source: e,
    })?;

    let config = Config {
        rotation: file.rotation,
        weights: file.weights,
        db_path: resolve_db_path(base_dir, &file.database.path)?,
    };

    validate(&config)?;

    Ok(config)
}

/// Ensure all config files exist by copying missing ones from `defaults/`.
/// Returns the list of files that were copied. Skips `.example` files.
pub fn ensure_config_files(base_dir: &Path) -> Result<Vec<PathBuf>, ConfigError> {
    let defaults_dir = base_dir.join("defaults");
    let config_dir = base_dir.join("config");

    if !defaults_dir.exists() {
        if !config_dir.exists() {
            return Err(ConfigError::DefaultsCopyError {
                message: format!(
                    "neither defaults/ nor config/ directory found in {}; \
                     run from the project root or ensure defaults/ is present",
                    base_dir.display()
                ),
            });
        }
        return Ok(vec![]);
    }

    std::fs::create_dir_all(&config_dir).map_err(|e| ConfigError::DefaultsCopyError {
        message: format!("failed to create config directory: {e}"),
    })?;

    let entries = std::fs::read_dir(&defaults_dir).map_err(|e| ConfigError::DefaultsCopyError {
        message: format!("failed to read defaults directory: {e}"),
    })?;

    let mut copied = Vec::new();
    for entry in entries {
        let entry = entry.map_err(|e| ConfigError::DefaultsCopyError {
            message: format!("failed to read defaults entry: {e}"),
        })?;
        let path = entry.path();
        if !path.is_file() {
            continue;
        }
        let Some(file_name) = path.file_name() else {
            continue;
        };
        if file_name.to_str().is_some_and(|n| n.ends_with(".example")) {
            continue;
        }

        let target = config_dir.join(file_name);

        // create_new fails if the file appeared in the meantime, so an
        // existing config is never clobbered.
        let mut dest = match std::fs::OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&target)
        {
            Ok(dest) => dest,
            Err(e) if e.kind() == std::io::ErrorKind::AlreadyExists => continue,
            Err(e) => {
                return Err(ConfigError::DefaultsCopyError {
                    message: format!("failed to create {}: {e}", target.display()),
                });
            }
        };
        let content = std::fs::read(&path).map_err(|e| ConfigError::DefaultsCopyError {
            message: format!("failed to read {}: {e}", path.display()),
        })?;
        std::io::Write::write_all(&mut dest, &content).map_err(|e| ConfigError::DefaultsCopyError {
            message: format!("failed to write {}: {e}", target.display()),
        })?;
        copied.push(target);
    }

    Ok(copied)
}

/// Convenience wrapper: loads config relative to the current working directory.
/// Ensures default config files are copied before loading.
pub fn load_config() -> Result<Config, ConfigError> {
    let cwd = std::env::current_dir().map_err(|_| ConfigError::FileNotFound {
        path: PathBuf::from("."),
    })?;
    ensure_config_files(&cwd)?;
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

/// Resolve the configured database path. Relative paths are anchored at
/// `base_dir`; an empty path falls back to the platform data directory.
fn resolve_db_path(base_dir: &Path, raw: &str) -> Result<PathBuf, ConfigError> {
    let raw = raw.trim();
    if raw == ":memory:" {
        return Ok(PathBuf::from(raw));
    }
    if raw.is_empty() {
        let dirs = directories::ProjectDirs::from("", "", "courtside").ok_or_else(|| {
            ConfigError::ValidationError {
                field: "database.path".into(),
                message: "empty and no platform data directory is available".into(),
            }
        })?;
        return Ok(dirs.data_dir().join("courtside.db"));
    }
    let path = PathBuf::from(raw);
    if path.is_absolute() {
        Ok(path)
    } else {
        Ok(base_dir.join(path))
    }
}

// ---------------------------------------------------------------------------
// Validation
// ---------------------------------------------------------------------------

fn validate(config: &Config) -> Result<(), ConfigError> {
    let w = &config.weights;
    let weight_fields: &[(&str, f64)] = &[
        ("weights.current_game", w.current_game),
        ("weights.historical", w.historical),
        ("weights.games_attended", w.games_attended),
        ("weights.swaps_attended", w.swaps_attended),
    ];
    for (name, val) in weight_fields {
        if !val.is_finite() {
            return Err(ConfigError::ValidationError {
                field: name.to_string(),
                message: format!("must be a finite number, got {val}"),
            });
        }
    }

    if w.current_game <= 0.0 {
        return Err(ConfigError::ValidationError {
            field: "weights.current_game".into(),
            message: format!("must be > 0, got {}", w.current_game),
        });
    }

    // A positive weight would push regular attendees down the list.
    if w.games_attended > 0.0 {
        return Err(ConfigError::ValidationError {
            field: "weights.games_attended".into(),
            message: format!("must be <= 0, got {}", w.games_attended),
        });
    }

    Ok(())
}

// ---------------------------------------------------------------------------
// Unit tests
// ---------------------------------------------------------------------------
