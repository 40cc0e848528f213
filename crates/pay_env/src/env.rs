//! Deployment environment the adapters run in.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

/// Variable selecting the environment, e.g. `RUN_ENV=sandbox`
pub const RUN_ENV: &str = "RUN_ENV";

/// Where settings are read from and which gateway endpoints are used by default.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, Deserialize, Serialize, Display, EnumString)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case", ascii_case_insensitive)]
pub enum Env {
    /// Local development, the default for debug builds
    #[default]
    Development,
    /// Gateway sandboxes
    Sandbox,
    /// Live gateways, the default for release builds
    Production,
}

impl Env {
    /// File name of this environment's settings under `config/`, without the extension
    pub const fn config_file_stem(self) -> &'static str {
        match self {
            Self::Development => "development",
            Self::Sandbox => "sandbox",
            Self::Production => "production",
        }
    }

    const fn for_build() -> Self {
        if cfg!(debug_assertions) {
            Self::Development
        } else {
            Self::Production
        }
    }
}

/// Environment named by `RUN_ENV`, falling back to the build profile's default when unset or unknown
pub fn which() -> Env {
    std::env::var(RUN_ENV)
        .ok()
        .and_then(|name| name.parse().ok())
        .unwrap_or_else(Env::for_build)
}

/// Directory holding `config/` and `logs/`.
///
/// Under cargo this is the workspace root, two levels above the member crate's manifest.
/// Otherwise it is the current directory.
pub fn workspace_path() -> PathBuf {
    std::env::var_os("CARGO_MANIFEST_DIR")
        .map(PathBuf::from)
        .and_then(|manifest_dir| manifest_dir.ancestors().nth(2).map(PathBuf::from))
        .unwrap_or_else(|| PathBuf::from("."))
}
