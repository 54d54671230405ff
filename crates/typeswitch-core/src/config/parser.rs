// Typeswitch Config Parser - TOML with Serde
// Parses and validates the configuration file

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;
use smallvec::SmallVec;

use crate::key::key_from_name;
use crate::output::DEFAULT_EMULATION_DELAY;
use crate::state::DEFAULT_BUFFER_CAPACITY;
use crate::switcher::ActiveKeySet;
use crate::Key;

/// Keys pressed together to reach the next keyboard layout
pub type LayoutShortcut = SmallVec<[Key; 4]>;

/// Configuration parser errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("IO error reading {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("TOML parse error: {0}")]
    TomlParse(String),

    #[error("Invalid key: {0}")]
    InvalidKey(String),

    #[error("Invalid value: {0}")]
    InvalidValue(String),
}

/// Root TOML table
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(deny_unknown_fields)]
pub struct ConfigToml {
    #[serde(default)]
    pub general: Option<GeneralConfig>,

    #[serde(default)]
    pub buffer: Option<BufferConfig>,

    #[serde(default)]
    pub delays: Option<DelayConfig>,

    #[serde(default)]
    pub devices: Option<DevicesConfig>,
}

/// A key given either by name or by numeric code
#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(untagged)]
pub enum KeySpec {
    Code(u16),
    Name(String),
}

impl KeySpec {
    pub fn resolve(&self) -> Result<Key, ConfigError> {
        match self {
            KeySpec::Code(code) => Ok(Key::from(*code)),
            KeySpec::Name(name) => {
                key_from_name(name).ok_or_else(|| ConfigError::InvalidKey(name.clone()))
            }
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct GeneralConfig {
    /// Key whose release deletes, switches layout and retypes
    pub trigger_key: Option<KeySpec>,
    /// The desktop's "next keyboard layout" shortcut
    pub layout_shortcut: Option<Vec<KeySpec>>,
    pub verbose: Option<bool>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct BufferConfig {
    pub capacity: Option<usize>,
    pub clear_after_retype: Option<bool>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DelayConfig {
    pub emulation_delay_ms: Option<u64>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DevicesConfig {
    /// Explicit device names/paths to listen on
    #[serde(default)]
    pub only: Vec<String>,
}

/// Resolved, validated configuration.
///
/// Built once at startup and handed to the constructors that need it.
#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    pub trigger_key: Key,
    pub layout_shortcut: LayoutShortcut,
    pub buffer_capacity: usize,
    pub emulation_delay: Duration,
    pub clear_after_retype: bool,
    pub verbose: bool,
    pub device_filter: Vec<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            trigger_key: Key::PAUSE,
            layout_shortcut: SmallVec::from_slice(&[Key::LEFT_ALT, Key::LEFT_SHIFT]),
            buffer_capacity: DEFAULT_BUFFER_CAPACITY,
            emulation_delay: DEFAULT_EMULATION_DELAY,
            clear_after_retype: false,
            verbose: false,
            device_filter: Vec::new(),
        }
    }
}

impl Config {
    pub const MAX_EMULATION_DELAY_MS: u64 = 1000;

    /// Parse and validate TOML content. Missing values take defaults.
    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        let parsed: ConfigToml =
            toml::from_str(content).map_err(|e| ConfigError::TomlParse(e.to_string()))?;
        Self::from_parsed(parsed)
    }

    pub fn from_toml_path(path: &Path) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&content)
    }

    /// Default location: `~/.config/typeswitch/config.toml`
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|p| p.join("typeswitch").join("config.toml"))
    }

    /// Load an explicit file, or the default file if present, or defaults.
    ///
    /// An explicit path that does not exist is an error; a missing default
    /// file is not.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        if let Some(path) = path {
            return Self::from_toml_path(path);
        }
        match Self::default_path() {
            Some(default) if default.exists() => {
                log::debug!("Loading config from {}", default.display());
                Self::from_toml_path(&default)
            }
            _ => Ok(Self::default()),
        }
    }

    fn from_parsed(parsed: ConfigToml) -> Result<Self, ConfigError> {
        let mut config = Self::default();

        if let Some(general) = parsed.general {
            if let Some(trigger) = general.trigger_key {
                config.trigger_key = trigger.resolve()?;
            }
            if let Some(shortcut) = general.layout_shortcut {
                config.layout_shortcut = shortcut
                    .iter()
                    .map(KeySpec::resolve)
                    .collect::<Result<LayoutShortcut, _>>()?;
            }
            if let Some(verbose) = general.verbose {
                config.verbose = verbose;
            }
        }

        if let Some(buffer) = parsed.buffer {
            if let Some(capacity) = buffer.capacity {
                config.buffer_capacity = capacity;
            }
            if let Some(clear) = buffer.clear_after_retype {
                config.clear_after_retype = clear;
            }
        }

        if let Some(delays) = parsed.delays {
            if let Some(ms) = delays.emulation_delay_ms {
                if ms > Self::MAX_EMULATION_DELAY_MS {
                    return Err(ConfigError::InvalidValue(format!(
                        "emulation_delay_ms must be at most {}, got {}",
                        Self::MAX_EMULATION_DELAY_MS,
                        ms
                    )));
                }
                config.emulation_delay = Duration::from_millis(ms);
            }
        }

        if let Some(devices) = parsed.devices {
            config.device_filter = devices.only;
        }

        config.validate()?;
        Ok(config)
    }

    /// Check the cross-field rules the switcher relies on
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.buffer_capacity == 0 {
            return Err(ConfigError::InvalidValue(
                "buffer capacity must be greater than zero".to_string(),
            ));
        }

        if self.layout_shortcut.is_empty() {
            return Err(ConfigError::InvalidValue(
                "layout_shortcut needs at least one key".to_string(),
            ));
        }

        for (i, key) in self.layout_shortcut.iter().enumerate() {
            if self.layout_shortcut[..i].contains(key) {
                return Err(ConfigError::InvalidValue(format!(
                    "layout_shortcut lists {} twice",
                    key
                )));
            }
            if key.code() > 255 {
                return Err(ConfigError::InvalidKey(format!(
                    "{} cannot be emitted by the virtual keyboard",
                    key
                )));
            }
        }

        if ActiveKeySet::default().contains(self.trigger_key) {
            return Err(ConfigError::InvalidKey(format!(
                "trigger key {} is a typing key and would never trigger",
                self.trigger_key
            )));
        }

        if self.layout_shortcut.contains(&self.trigger_key) {
            return Err(ConfigError::InvalidKey(format!(
                "trigger key {} is part of the layout shortcut",
                self.trigger_key
            )));
        }

        Ok(())
    }

    /// Human-readable summary for `--check-config`
    pub fn summary(&self) -> String {
        let shortcut: Vec<&str> = self.layout_shortcut.iter().map(|k| k.name()).collect();
        let devices = if self.device_filter.is_empty() {
            "all key-capable devices".to_string()
        } else {
            self.device_filter.join(", ")
        };
        format!(
            "trigger_key = {}\nlayout_shortcut = {}\nbuffer_capacity = {}\nclear_after_retype = {}\nemulation_delay = {}ms\nverbose = {}\ndevices = {}",
            self.trigger_key,
            shortcut.join(" + "),
            self.buffer_capacity,
            self.clear_after_retype,
            self.emulation_delay.as_millis(),
            self.verbose,
            devices
        )
    }
}

/// Commented default config file
pub fn default_config_content() -> &'static str {
    r#"# Typeswitch configuration
# Place this file at: ~/.config/typeswitch/config.toml
# Key names follow /usr/include/linux/input-event-codes.h, with or without
# the KEY_ prefix (KEY_LEFTALT and LEFT_ALT are the same key).

[general]
# Releasing this key deletes what you typed, switches layout and retypes it
trigger_key = "PAUSE"
# Your desktop's "switch to next keyboard layout" shortcut
layout_shortcut = ["LEFT_ALT", "LEFT_SHIFT"]
# Log every recognized event
verbose = false

[buffer]
# Number of key events remembered (~2 per typed character)
capacity = 1000
# Forget the text after retyping, so a second trigger does nothing
clear_after_retype = false

[delays]
# Pause before each emulated key group, in milliseconds
emulation_delay_ms = 10

[devices]
# Listen only on these devices (names or /dev/input paths); empty = all
only = []
"#
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        let config = Config::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.trigger_key, Key::PAUSE);
        assert_eq!(config.layout_shortcut.as_slice(), &[Key::LEFT_ALT, Key::LEFT_SHIFT]);
        assert_eq!(config.buffer_capacity, 1000);
        assert_eq!(config.emulation_delay, Duration::from_millis(10));
    }

    #[test]
    fn test_default_content_matches_defaults() {
        let parsed = Config::from_toml_str(default_config_content()).unwrap();
        assert_eq!(parsed, Config::default());
    }

    #[test]
    fn test_empty_toml_gives_defaults() {
        assert_eq!(Config::from_toml_str("").unwrap(), Config::default());
    }

    #[test]
    fn test_parse_full_config() {
        let toml = r#"
[general]
trigger_key = "KEY_SCROLLLOCK"
layout_shortcut = ["LEFT_META", "SPACE"]
verbose = true

[buffer]
capacity = 64
clear_after_retype = true

[delays]
emulation_delay_ms = 0

[devices]
only = ["/dev/input/event3"]
"#;
        let config = Config::from_toml_str(toml).unwrap();
        assert_eq!(config.trigger_key, Key::from(70));
        assert_eq!(config.layout_shortcut.as_slice(), &[Key::LEFT_META, Key::SPACE]);
        assert!(config.verbose);
        assert_eq!(config.buffer_capacity, 64);
        assert!(config.clear_after_retype);
        assert_eq!(config.emulation_delay, Duration::ZERO);
        assert_eq!(config.device_filter, vec!["/dev/input/event3".to_string()]);
    }

    #[test]
    fn test_numeric_key_codes() {
        let config = Config::from_toml_str("[general]\ntrigger_key = 119\nlayout_shortcut = [29, 42]\n").unwrap();
        assert_eq!(config.trigger_key, Key::PAUSE);
        assert_eq!(config.layout_shortcut.as_slice(), &[Key::LEFT_CTRL, Key::LEFT_SHIFT]);
    }

    #[test]
    fn test_unknown_key_name() {
        let err = Config::from_toml_str("[general]\ntrigger_key = \"HYPERKEY\"\n").unwrap_err();
        assert!(matches!(err, ConfigError::InvalidKey(name) if name == "HYPERKEY"));
    }

    #[test]
    fn test_unknown_field_rejected() {
        let err = Config::from_toml_str("[general]\ntriger_key = \"PAUSE\"\n").unwrap_err();
        assert!(matches!(err, ConfigError::TomlParse(_)));
    }

    #[test]
    fn test_trigger_key_must_not_be_typing_key() {
        let err = Config::from_toml_str("[general]\ntrigger_key = \"A\"\n").unwrap_err();
        assert!(matches!(err, ConfigError::InvalidKey(_)));
    }

    #[test]
    fn test_trigger_key_must_not_be_in_shortcut() {
        let err = Config::from_toml_str(
            "[general]\ntrigger_key = \"LEFT_ALT\"\nlayout_shortcut = [\"LEFT_ALT\", \"LEFT_SHIFT\"]\n",
        )
        .unwrap_err();
        assert!(matches!(err, ConfigError::InvalidKey(_)));
    }

    #[test]
    fn test_shortcut_validation() {
        let empty = Config::from_toml_str("[general]\nlayout_shortcut = []\n").unwrap_err();
        assert!(matches!(empty, ConfigError::InvalidValue(_)));

        let dup = Config::from_toml_str("[general]\nlayout_shortcut = [\"LEFT_ALT\", \"KEY_LEFTALT\"]\n")
            .unwrap_err();
        assert!(matches!(dup, ConfigError::InvalidValue(_)));

        let button = Config::from_toml_str("[general]\nlayout_shortcut = [\"BTN_LEFT\"]\n").unwrap_err();
        assert!(matches!(button, ConfigError::InvalidKey(_)));
    }

    #[test]
    fn test_zero_capacity_rejected() {
        let err = Config::from_toml_str("[buffer]\ncapacity = 0\n").unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue(_)));
    }

    #[test]
    fn test_delay_out_of_range() {
        let err = Config::from_toml_str("[delays]\nemulation_delay_ms = 5000\n").unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue(_)));
    }

    #[test]
    fn test_summary_mentions_keys() {
        let summary = Config::default().summary();
        assert!(summary.contains("trigger_key = PAUSE"));
        assert!(summary.contains("LEFT_ALT + LEFT_SHIFT"));
        assert!(summary.contains("all key-capable devices"));
    }
}
