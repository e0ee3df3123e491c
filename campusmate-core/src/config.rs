//! Configuration for the command surface.
//!
//! Uses `figment` for layered configuration: defaults -> user config file
//! -> environment. The user file lives at
//! `~/.config/campusmate/config.toml`; environment variables use the
//! `CAMPUSMATE_` prefix (e.g. `CAMPUSMATE_FAIL_CLOSED=true`).

use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::enablement::FailPolicy;

/// Configuration for the suggestion surface and its stores.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SurfaceConfig {
    /// Directory holding persisted records (the enablement file lives
    /// here). Defaults to the platform data dir.
    pub data_dir: PathBuf,

    /// Treat plugins absent from the enablement record as disabled.
    /// The default is fail-open: absent means enabled.
    pub fail_closed: bool,

    /// Default tracing filter when RUST_LOG is unset.
    pub log_filter: String,
}

impl Default for SurfaceConfig {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
            fail_closed: false,
            log_filter: "campusmate=info".into(),
        }
    }
}

impl SurfaceConfig {
    /// The enablement fail policy implied by this configuration.
    pub fn fail_policy(&self) -> FailPolicy {
        if self.fail_closed {
            FailPolicy::Closed
        } else {
            FailPolicy::Open
        }
    }
}

fn default_data_dir() -> PathBuf {
    directories::ProjectDirs::from("dev", "campusmate", "campusmate")
        .map(|dirs| dirs.data_dir().to_path_buf())
        .unwrap_or_else(|| PathBuf::from("."))
}

/// Load configuration from defaults, the user config file, and the
/// environment, in that precedence order.
pub fn load_config(config_file: Option<&PathBuf>) -> Result<SurfaceConfig, Box<figment::Error>> {
    let mut figment = Figment::from(Serialized::defaults(SurfaceConfig::default()));

    if let Some(path) = config_file {
        figment = figment.merge(Toml::file(path));
    } else if let Some(dirs) = directories::ProjectDirs::from("dev", "campusmate", "campusmate") {
        let user_config = dirs.config_dir().join("config.toml");
        if user_config.exists() {
            figment = figment.merge(Toml::file(&user_config));
        }
    }

    figment = figment.merge(Env::prefixed("CAMPUSMATE_"));

    figment.extract().map_err(Box::new)
}
