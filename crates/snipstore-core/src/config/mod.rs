//! Application configuration schemas.
//!
//! All configuration structs are deserialized via the `config` crate from a
//! TOML file, an optional environment overlay, and `SNIPSTORE__*`
//! environment variables. Every section has defaults, so an empty
//! configuration selects the filesystem backend.

pub mod logging;
pub mod storage;

use serde::{Deserialize, Serialize};

use self::logging::LoggingConfig;
use self::storage::StoreConfig;

use crate::error::AppError;

/// Root application configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    /// Backend selection and backend-specific settings.
    #[serde(default)]
    pub store: StoreConfig,
    /// Project scoping.
    #[serde(default)]
    pub project: ProjectConfig,
    /// Logging settings.
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Project scoping applied to writes that carry no explicit project.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProjectConfig {
    /// Project id stamped on records when the caller names none.
    #[serde(default = "default_project_id")]
    pub default_project_id: i64,
}

impl Default for ProjectConfig {
    fn default() -> Self {
        Self {
            default_project_id: default_project_id(),
        }
    }
}

impl AppConfig {
    /// Load configuration.
    ///
    /// Merges `config_file` (optional on disk), then `config/{env}` when an
    /// environment name is given, then environment variables prefixed with
    /// `SNIPSTORE__` (e.g. `SNIPSTORE__STORE__BACKEND=gateway`).
    pub fn load(config_file: &str, env: Option<&str>) -> Result<Self, AppError> {
        let mut builder = config::Config::builder()
            .add_source(config::File::with_name(config_file).required(false));

        if let Some(env) = env {
            builder = builder
                .add_source(config::File::with_name(&format!("config/{env}")).required(false));
        }

        let config = builder
            .add_source(
                config::Environment::with_prefix("SNIPSTORE")
                    .prefix_separator("__")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()
            .map_err(|e| AppError::configuration(format!("Failed to build config: {e}")))?;

        config
            .try_deserialize()
            .map_err(|e| AppError::configuration(format!("Failed to deserialize config: {e}")))
    }
}

fn default_project_id() -> i64 {
    1
}
