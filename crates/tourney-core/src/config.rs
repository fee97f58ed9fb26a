//! Configuration loading and typed config structures for the scoreboard.
//!
//! The configuration lives in `tourney-config.yaml` next to where the
//! binary runs. This module defines strongly-typed structs that mirror the
//! YAML structure and a loader that reads the file. Every field has a
//! default, so an empty or missing file is a valid configuration.

use std::path::{Path, PathBuf};

use chrono::format::{Item, StrftimeItems};
use serde::Deserialize;

use tourney_ledger::RegistryRules;
use tourney_types::{Participant, ParticipantId};

/// Environment variable overriding `storage.data_dir`.
pub const DATA_DIR_ENV: &str = "TOURNEY_DATA_DIR";

/// Errors that can occur when loading configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Failed to read the configuration file from disk.
    #[error("failed to read config file: {source}")]
    Io {
        /// The underlying I/O error.
        #[from]
        source: std::io::Error,
    },

    /// Failed to parse YAML content.
    #[error("failed to parse config YAML: {source}")]
    Yaml {
        /// The underlying YAML parse error.
        source: serde_yml::Error,
    },

    /// `display.timestamp_format` holds a specifier `chrono` does not know.
    #[error("invalid display.timestamp_format {format:?}")]
    TimestampFormat {
        /// The format as configured.
        format: String,
    },
}

impl From<serde_yml::Error> for ConfigError {
    fn from(source: serde_yml::Error) -> Self {
        Self::Yaml { source }
    }
}

/// Top-level scoreboard configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct TourneyConfig {
    /// Where persisted state lives.
    #[serde(default)]
    pub storage: StorageConfig,

    /// Registration and seeding rules.
    #[serde(default)]
    pub rules: RulesConfig,

    /// Presentation settings shared by every view.
    #[serde(default)]
    pub display: DisplayConfig,

    /// Logging configuration.
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl TourneyConfig {
    /// Load configuration from a YAML file at the given path.
    ///
    /// `TOURNEY_DATA_DIR` overrides `storage.data_dir`.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Io`] if the file cannot be read, or
    /// [`ConfigError::Yaml`] if the content is not valid YAML.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        let mut config = Self::parse(&contents)?;
        config.storage.apply_env_overrides(|key| std::env::var(key).ok());
        Ok(config)
    }

    /// Load configuration from `path` if it exists, defaults otherwise.
    ///
    /// # Errors
    ///
    /// Same as [`TourneyConfig::from_file`] when the file exists.
    pub fn load_or_default(path: &Path) -> Result<Self, ConfigError> {
        if path.exists() {
            return Self::from_file(path);
        }
        let mut config = Self::default();
        config.storage.apply_env_overrides(|key| std::env::var(key).ok());
        Ok(config)
    }

    /// Parse configuration from a YAML string. No environment overrides
    /// are applied.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Yaml`] if the string is not valid YAML.
    pub fn parse(yaml: &str) -> Result<Self, ConfigError> {
        if yaml.trim().is_empty() {
            return Ok(Self::default());
        }
        let config: Self = serde_yml::from_str(yaml)?;
        config.display.validate()?;
        Ok(config)
    }
}

/// Storage configuration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct StorageConfig {
    /// Directory holding the persisted participant and match records.
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,
}

impl StorageConfig {
    /// Apply environment overrides through `lookup`.
    pub fn apply_env_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(dir) = lookup(DATA_DIR_ENV).filter(|d| !d.trim().is_empty()) {
            self.data_dir = PathBuf::from(dir);
        }
    }
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
        }
    }
}

/// A participant seeded on first run and merged into persisted state.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct SeedParticipant {
    /// Display name.
    pub name: String,

    /// Starting balance; falls back to `rules.starting_stars`.
    #[serde(default)]
    pub stars: Option<i64>,
}

/// Registration and seeding rules.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct RulesConfig {
    /// Balance a newly registered participant starts with.
    #[serde(default = "default_starting_stars")]
    pub starting_stars: i64,

    /// Default roster, assigned ids `P001`, `P002`, ... in list order.
    #[serde(default)]
    pub default_participants: Vec<SeedParticipant>,
}

impl RulesConfig {
    /// Registry rules derived from this configuration.
    pub const fn registry_rules(&self) -> RegistryRules {
        RegistryRules {
            starting_stars: self.starting_stars,
        }
    }

    /// The default participant set: the bank followed by the roster.
    pub fn default_participants(&self) -> Vec<Participant> {
        let roster = (1_u32..)
            .zip(&self.default_participants)
            .map(|(n, seed)| {
                Participant::new(
                    ParticipantId::from_sequence(n),
                    &seed.name,
                    "",
                    None,
                    seed.stars.unwrap_or(self.starting_stars),
                )
            });
        std::iter::once(Participant::bank()).chain(roster).collect()
    }
}

impl Default for RulesConfig {
    fn default() -> Self {
        Self {
            starting_stars: default_starting_stars(),
            default_participants: Vec::new(),
        }
    }
}

/// Presentation settings.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct DisplayConfig {
    /// `chrono` format for match timestamps (pt-BR locale style).
    #[serde(default = "default_timestamp_format")]
    pub timestamp_format: String,

    /// Number of participants on the podium.
    #[serde(default = "default_podium_size")]
    pub podium_size: usize,
}

impl DisplayConfig {
    /// Reject a timestamp format `chrono` cannot render.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::TimestampFormat`] if the format contains an
    /// unknown or incomplete specifier.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if is_valid_timestamp_format(&self.timestamp_format) {
            Ok(())
        } else {
            Err(ConfigError::TimestampFormat {
                format: self.timestamp_format.clone(),
            })
        }
    }
}

/// Whether every specifier in `format` is one `chrono` can render.
pub fn is_valid_timestamp_format(format: &str) -> bool {
    !StrftimeItems::new(format).any(|item| matches!(item, Item::Error))
}

impl Default for DisplayConfig {
    fn default() -> Self {
        Self {
            timestamp_format: default_timestamp_format(),
            podium_size: default_podium_size(),
        }
    }
}

/// Logging configuration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error). `RUST_LOG` wins.
    #[serde(default = "default_log_level")]
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

// ---------------------------------------------------------------------------
// Default value functions
// ---------------------------------------------------------------------------

fn default_data_dir() -> PathBuf {
    PathBuf::from(".tourney")
}

const fn default_starting_stars() -> i64 {
    4
}

fn default_timestamp_format() -> String {
    String::from("%d/%m/%Y, %H:%M:%S")
}

const fn default_podium_size() -> usize {
    tourney_ledger::stats::PODIUM_SIZE
}

fn default_log_level() -> String {
    String::from("info")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unknown_timestamp_specifier_is_rejected() {
        let result = TourneyConfig::parse("display:\n  timestamp_format: \"%d/%m %Q\"\n");
        assert!(matches!(
            result,
            Err(ConfigError::TimestampFormat { ref format }) if format == "%d/%m %Q"
        ));
    }

    #[test]
    fn timestamp_format_validation() {
        assert!(is_valid_timestamp_format("%d/%m/%Y, %H:%M:%S"));
        assert!(is_valid_timestamp_format("plain text"));
        assert!(!is_valid_timestamp_format("%Q"));
        assert!(!is_valid_timestamp_format("%H:%"));
    }

    #[test]
    fn default_config_is_valid() {
        let config = TourneyConfig::default();
        assert_eq!(config.storage.data_dir, PathBuf::from(".tourney"));
        assert_eq!(config.rules.starting_stars, 4);
        assert!(config.rules.default_participants.is_empty());
        assert_eq!(config.display.podium_size, 3);
        assert_eq!(config.logging.level, "info");
    }

    #[test]
    fn parse_full_yaml() {
        let yaml = r#"
storage:
  data_dir: "/var/lib/tourney"

rules:
  starting_stars: 10
  default_participants:
    - name: Ezequiel
    - name: Paulo
      stars: 6

display:
  timestamp_format: "%Y-%m-%d %H:%M"
  podium_size: 5

logging:
  level: "debug"
"#;

        let config = TourneyConfig::parse(yaml);
        assert!(config.is_ok(), "{config:?}");
        let config = config.ok().unwrap_or_default();

        assert_eq!(config.storage.data_dir, PathBuf::from("/var/lib/tourney"));
        assert_eq!(config.rules.starting_stars, 10);
        assert_eq!(config.rules.default_participants.len(), 2);
        assert_eq!(config.display.timestamp_format, "%Y-%m-%d %H:%M");
        assert_eq!(config.display.podium_size, 5);
        assert_eq!(config.logging.level, "debug");
    }

    #[test]
    fn parse_minimal_yaml() {
        let config = TourneyConfig::parse("rules:\n  starting_stars: 7\n");
        assert!(config.is_ok());
        let config = config.ok().unwrap_or_default();

        assert_eq!(config.rules.starting_stars, 7);
        assert_eq!(config.display.podium_size, 3);
    }

    #[test]
    fn parse_empty_yaml() {
        assert_eq!(TourneyConfig::parse("").ok(), Some(TourneyConfig::default()));
    }

    #[test]
    fn default_participants_start_with_bank() {
        let yaml = "\
rules:
  starting_stars: 4
  default_participants:
    - name: Ana
    - name: Bea
      stars: 9
";
        let config = TourneyConfig::parse(yaml).ok().unwrap_or_default();
        let defaults = config.rules.default_participants();

        let summary: Vec<(String, i64)> = defaults
            .iter()
            .map(|p| (p.id.to_string(), p.stars))
            .collect();
        assert_eq!(
            summary,
            vec![
                (String::from("P000"), tourney_types::BANK_STARS),
                (String::from("P001"), 4),
                (String::from("P002"), 9),
            ]
        );
    }

    #[test]
    fn env_override_replaces_data_dir() {
        let mut storage = StorageConfig::default();
        storage.apply_env_overrides(|key| (key == DATA_DIR_ENV).then(|| String::from("/tmp/t")));
        assert_eq!(storage.data_dir, PathBuf::from("/tmp/t"));

        let mut untouched = StorageConfig::default();
        untouched.apply_env_overrides(|_| Some(String::from("  ")));
        assert_eq!(untouched.data_dir, PathBuf::from(".tourney"));
    }

    #[test]
    fn load_project_config_file() {
        let path = Path::new(env!("CARGO_MANIFEST_DIR"))
            .join("..")
            .join("..")
            .join("tourney-config.yaml");
        if path.exists() {
            let config = TourneyConfig::from_file(&path);
            assert!(config.is_ok(), "Failed to load project config: {config:?}");
            let participants = config.map(|c| c.rules.default_participants()).unwrap_or_default();
            assert_eq!(participants.len(), 12);
            assert_eq!(participants.last().map(|p| p.name.as_str()), Some("Lucas"));
            assert_eq!(participants.last().map(|p| p.stars), Some(4));
        }
    }
}
