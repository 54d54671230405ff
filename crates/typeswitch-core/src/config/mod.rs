// Typeswitch Configuration
// TOML config file parsing and validation

pub mod parser;

pub use parser::{default_config_content, Config, ConfigError, KeySpec, LayoutShortcut};
