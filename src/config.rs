//! Engine configuration, passed explicitly into the filter engine and roster.
//!
//! Sources: defaults, then an optional YAML file named by `WINGMAN_CONFIG`,
//! then `WINGMAN_MODE`.

use std::env;
use std::fmt;
use std::fs;
use std::path::Path;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

pub const CONFIG_PATH_ENV: &str = "WINGMAN_CONFIG";
pub const MODE_ENV: &str = "WINGMAN_MODE";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("unable to read config '{path}': {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("unable to parse config: {0}")]
    Parse(#[from] serde_yaml::Error),
    #[error("unknown game mode '{0}' (expected standard, epic or freedom)")]
    InvalidMode(String),
}

/// Squad-building rules in force for a session.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GameMode {
    /// Single faction.
    #[default]
    Standard,
    /// Single faction, epic-only upgrades allowed.
    Epic,
    /// Any mix of factions.
    Freedom,
}

impl GameMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Standard => "standard",
            Self::Epic => "epic",
            Self::Freedom => "freedom",
        }
    }

    pub fn requires_single_faction(&self) -> bool {
        matches!(self, Self::Standard | Self::Epic)
    }
}

impl fmt::Display for GameMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for GameMode {
    type Err = ConfigError;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "standard" => Ok(Self::Standard),
            "epic" => Ok(Self::Epic),
            "freedom" => Ok(Self::Freedom),
            _ => Err(ConfigError::InvalidMode(raw.to_string())),
        }
    }
}

/// What to do with restriction kinds the registry does not know.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UnknownRestrictionPolicy {
    /// Ignore the restriction.
    #[default]
    Permissive,
    /// Reject the upgrade.
    Strict,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EngineConfig {
    #[serde(default)]
    pub mode: GameMode,
    #[serde(default)]
    pub unknown_restrictions: UnknownRestrictionPolicy,
}

impl EngineConfig {
    pub fn with_mode(mode: GameMode) -> Self {
        Self {
            mode,
            ..Self::default()
        }
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let raw = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_yaml_str(&raw)
    }

    pub fn from_yaml_str(raw: &str) -> Result<Self, ConfigError> {
        Ok(serde_yaml::from_str(raw)?)
    }

    /// Defaults, overlaid by the `WINGMAN_CONFIG` file and `WINGMAN_MODE`.
    pub fn from_env() -> Result<Self, ConfigError> {
        let mut config = match env::var(CONFIG_PATH_ENV) {
            Ok(path) if !path.trim().is_empty() => Self::load(path)?,
            _ => Self::default(),
        };
        if let Ok(mode) = env::var(MODE_ENV) {
            config.mode = mode.parse()?;
        }
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_yaml_with_defaults() {
        let config = EngineConfig::from_yaml_str("mode: epic\n").expect("config should parse");
        assert_eq!(config.mode, GameMode::Epic);
        assert_eq!(config.unknown_restrictions, UnknownRestrictionPolicy::Permissive);

        let strict = EngineConfig::from_yaml_str("unknown_restrictions: strict\n")
            .expect("config should parse");
        assert_eq!(strict.mode, GameMode::Standard);
        assert_eq!(strict.unknown_restrictions, UnknownRestrictionPolicy::Strict);
    }

    #[test]
    fn mode_parsing_is_case_insensitive() {
        assert_eq!("Freedom".parse::<GameMode>().ok(), Some(GameMode::Freedom));
        assert!(matches!(
            "arena".parse::<GameMode>(),
            Err(ConfigError::InvalidMode(_))
        ));
    }

    #[test]
    fn single_faction_modes() {
        assert!(GameMode::Standard.requires_single_faction());
        assert!(GameMode::Epic.requires_single_faction());
        assert!(!GameMode::Freedom.requires_single_faction());
    }
}
