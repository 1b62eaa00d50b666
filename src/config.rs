use config::{Config, Environment, File};
use serde::{Deserialize, Serialize};
use std::path::Path;
use validator::Validate;

use crate::error::{ProcessingError, Result};
use crate::models::PollutantLimits;
use crate::processors::{JoinConfig, MalformedPolicy};
use crate::utils::constants::{DEFAULT_DELIMITER, DEFAULT_MAX_SPREAD, ENV_PREFIX};

/// Runtime settings, layered from defaults, an optional config file and
/// `SENSOR_MERGE_*` environment variables (nested keys use `__`, e.g.
/// `SENSOR_MERGE_LIMITS__NO2=40`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
#[serde(default)]
pub struct Settings {
    #[validate(length(equal = 1))]
    pub delimiter: String,

    pub max_spread: u64,

    pub output_header: bool,

    pub malformed_policy: MalformedPolicy,

    #[validate(nested)]
    pub limits: PollutantLimits,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            delimiter: DEFAULT_DELIMITER.to_string(),
            max_spread: DEFAULT_MAX_SPREAD,
            output_header: true,
            malformed_policy: MalformedPolicy::Halt,
            limits: PollutantLimits::default(),
        }
    }
}

impl Settings {
    pub fn load(config_file: Option<&Path>) -> Result<Self> {
        let mut builder = Config::builder();
        if let Some(path) = config_file {
            builder = builder.add_source(File::from(path).required(true));
        }

        let settings: Self = builder
            .add_source(
                Environment::with_prefix(ENV_PREFIX)
                    .prefix_separator("_")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?
            .try_deserialize()?;

        settings.validate()?;
        Ok(settings)
    }

    /// The delimiter as the single byte the CSV layer needs.
    pub fn delimiter_byte(&self) -> Result<u8> {
        let mut chars = self.delimiter.chars();
        match (chars.next(), chars.next()) {
            (Some(c), None) if c.is_ascii() => Ok(c as u8),
            _ => Err(ProcessingError::Config(format!(
                "delimiter must be a single ASCII character, got '{}'",
                self.delimiter
            ))),
        }
    }

    pub fn join_config(&self) -> JoinConfig {
        JoinConfig::default()
            .with_max_spread(self.max_spread)
            .with_malformed_policy(self.malformed_policy)
    }
}
