use crate::store::LoadPolicy;
use anyhow::Context;
use config::ConfigBuilder;
use config::builder::DefaultState;
use serde::Deserialize;
use std::path::PathBuf;
use tracing::Level;

pub const CONFIG_FILE: &str = "task-tracker";
pub const ENV_PREFIX: &str = "TASK_TRACKER";
pub const DEFAULT_DB_PATH: &str = "data.json";

const LEVELS: [Level; 5] = [
    Level::ERROR,
    Level::WARN,
    Level::INFO,
    Level::DEBUG,
    Level::TRACE,
];

/// How the command line treats `--due` values.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DateInput {
    /// `YYYY-MM-DD` only, stored as typed.
    #[default]
    Strict,
    /// Any layout `date::parse_date` understands, stored normalized.
    Lenient,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Config {
    pub db_path: PathBuf,
    #[serde(default)]
    pub load_policy: LoadPolicy,
    #[serde(default)]
    pub date_input: DateInput,
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

/// Values given on the command line, which beat every other source.
#[derive(Debug, Default, Clone)]
pub struct Overrides {
    pub db_path: Option<PathBuf>,
    pub strict: bool,
}

impl Config {
    /// Loads configuration from `task-tracker.toml` (optional) and
    /// `TASK_TRACKER_*` environment variables, then applies `overrides`.
    pub fn load(overrides: &Overrides) -> anyhow::Result<Self> {
        let builder = config::Config::builder()
            .add_source(config::File::with_name(CONFIG_FILE).required(false))
            .add_source(config::Environment::with_prefix(ENV_PREFIX));
        Self::from_builder(builder, overrides)
    }

    fn from_builder(
        builder: ConfigBuilder<DefaultState>,
        overrides: &Overrides,
    ) -> anyhow::Result<Self> {
        let db_path = overrides
            .db_path
            .as_ref()
            .map(|path| path.to_string_lossy().into_owned());
        let settings = builder
            .set_default("db_path", DEFAULT_DB_PATH)?
            .set_override_option("db_path", db_path)?
            .set_override_option("load_policy", overrides.strict.then_some("strict"))?
            .build()?;

        Ok(settings.try_deserialize()?)
    }

    /// Configured log level raised by one step per `verbosity`.
    pub fn log_level(&self, verbosity: u8) -> anyhow::Result<Level> {
        let base: Level = self
            .log_level
            .parse()
            .with_context(|| format!("Unknown log level '{}'", self.log_level))?;
        let index = LEVELS.iter().position(|level| *level == base).unwrap_or(1);
        Ok(LEVELS[(index + verbosity as usize).min(LEVELS.len() - 1)])
    }
}

fn default_log_level() -> String {
    "warn".to_string()
}
