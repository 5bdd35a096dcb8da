use std::path::{Path, PathBuf};

use crate::{config::AppConfig, error::Result};

/// Name of the config file looked up under the XDG config directory.
pub const CONFIG_FILE_NAME: &str = "config.json";

/// Environment variable that points at a config file.
pub const CONFIG_ENV_VAR: &str = "REPORTSCOPE_CONFIG";

/// Where the active configuration came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigSource {
    File(PathBuf),
    Defaults,
}

/// Resolve the config file location from, in order of priority:
/// 1. An explicit path (from --config)
/// 2. The REPORTSCOPE_CONFIG environment variable
/// 3. `$XDG_CONFIG_HOME/reportscope/config.json`, if it exists
///
/// Falls back to the built-in defaults when none of these apply.
pub fn resolve(explicit: Option<&Path>) -> ConfigSource {
    if let Some(path) = explicit {
        return ConfigSource::File(path.to_path_buf());
    }
    if let Ok(val) = std::env::var(CONFIG_ENV_VAR)
        && !val.is_empty()
    {
        return ConfigSource::File(PathBuf::from(val));
    }
    xdg::BaseDirectories::with_prefix("reportscope")
        .find_config_file(CONFIG_FILE_NAME)
        .map_or(ConfigSource::Defaults, ConfigSource::File)
}

/// Load the configuration from the resolved source.
///
/// An explicitly named file that cannot be read is an error; it is never
/// silently replaced by defaults.
pub fn load(source: &ConfigSource) -> Result<AppConfig> {
    match source {
        ConfigSource::File(path) => {
            tracing::debug!(path = %path.display(), "loading config file");
            AppConfig::load(path)
        }
        ConfigSource::Defaults => Ok(AppConfig::default()),
    }
}
