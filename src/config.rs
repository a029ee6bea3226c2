use crate::aggregator_core::{
    BackendType, CategorySet, EventCategory, UnknownCategoryPolicy, ViewPreset,
};
use std::env;
use std::path::PathBuf;

#[derive(Debug)]
pub enum ConfigError {
    MissingVariable(String),
    InvalidValue(String),
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::MissingVariable(var) => write!(f, "Missing environment variable: {}", var),
            ConfigError::InvalidValue(msg) => write!(f, "Invalid configuration value: {}", msg),
        }
    }
}

impl std::error::Error for ConfigError {}

/// Configuration for the aggregator binary
#[derive(Debug, Clone)]
pub struct AggregatorConfig {
    /// Capture store (`input_events` table)
    pub db_path: PathBuf,

    /// JSONL directory or SQLite file, depending on `backend`
    pub output_path: PathBuf,

    pub backend: BackendType,

    /// Seconds between series emissions
    pub emission_interval_secs: u64,

    pub views: Vec<ViewPreset>,

    pub categories: CategorySet,

    pub unknown_category_policy: UnknownCategoryPolicy,
}

impl AggregatorConfig {
    /// Load configuration from environment variables and `--backend`
    ///
    /// Environment variables:
    /// - `INPUTFLOW_DB_PATH` (default: data/inputflow.db)
    /// - `SERIES_OUTPUT_PATH` (default: streams/series for JSONL, data/series.db for SQLite)
    /// - `EMISSION_INTERVAL_SECS` (default: 60)
    /// - `INPUTFLOW_VIEWS` (default: 1h,24h)
    /// - `INPUTFLOW_CATEGORIES` (default: KeyPress,Right,Left,Middle)
    /// - `UNKNOWN_CATEGORY_POLICY` (default: strict)
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_vars(env::args(), |key| env::var(key).ok())
    }

    /// Build from explicit arguments and a variable lookup
    pub fn from_vars(
        args: impl IntoIterator<Item = String>,
        var: impl Fn(&str) -> Option<String>,
    ) -> Result<Self, ConfigError> {
        let backend = parse_backend_from_args(args)?;

        let output_path = var("SERIES_OUTPUT_PATH").unwrap_or_else(|| match backend {
            BackendType::Jsonl => "streams/series".to_string(),
            BackendType::Sqlite => "data/series.db".to_string(),
        });

        let emission_interval_secs = match var("EMISSION_INTERVAL_SECS") {
            Some(s) => s
                .parse::<u64>()
                .ok()
                .filter(|secs| *secs > 0)
                .ok_or_else(|| {
                    ConfigError::InvalidValue(format!("EMISSION_INTERVAL_SECS '{}'", s))
                })?,
            None => 60,
        };

        let views = match var("INPUTFLOW_VIEWS") {
            Some(s) => parse_views(&s)?,
            None => ViewPreset::all().to_vec(),
        };

        let categories = match var("INPUTFLOW_CATEGORIES") {
            Some(s) => parse_categories(&s)?,
            None => CategorySet::all(),
        };

        let unknown_category_policy = match var("UNKNOWN_CATEGORY_POLICY") {
            Some(s) => UnknownCategoryPolicy::from_str(&s).ok_or_else(|| {
                ConfigError::InvalidValue(format!("UNKNOWN_CATEGORY_POLICY '{}'", s))
            })?,
            None => UnknownCategoryPolicy::Strict,
        };

        Ok(Self {
            db_path: var("INPUTFLOW_DB_PATH")
                .unwrap_or_else(|| "data/inputflow.db".to_string())
                .into(),
            output_path: output_path.into(),
            backend,
            emission_interval_secs,
            views,
            categories,
            unknown_category_policy,
        })
    }
}

/// Configuration for the ingest binary
#[derive(Debug, Clone)]
pub struct IngestConfig {
    /// Capture JSONL stream to tail
    pub events_path: PathBuf,
    pub db_path: PathBuf,
    /// Import lines already in the stream before following it
    pub replay: bool,
}

impl IngestConfig {
    /// Environment variables:
    /// - `INPUT_EVENTS_PATH` (required)
    /// - `INPUTFLOW_DB_PATH` (default: data/inputflow.db)
    /// - `INGEST_REPLAY` (default: false)
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_vars(|key| env::var(key).ok())
    }

    pub fn from_vars(var: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let events_path = var("INPUT_EVENTS_PATH")
            .ok_or_else(|| ConfigError::MissingVariable("INPUT_EVENTS_PATH".to_string()))?;

        let replay = var("INGEST_REPLAY")
            .unwrap_or_else(|| "false".to_string())
            .to_lowercase()
            .parse::<bool>()
            .unwrap_or(false);

        Ok(Self {
            events_path: events_path.into(),
            db_path: var("INPUTFLOW_DB_PATH")
                .unwrap_or_else(|| "data/inputflow.db".to_string())
                .into(),
            replay,
        })
    }
}

pub fn parse_backend_from_args(
    args: impl IntoIterator<Item = String>,
) -> Result<BackendType, ConfigError> {
    let args: Vec<String> = args.into_iter().collect();

    match args.iter().position(|x| x == "--backend") {
        Some(idx) => {
            let value = args.get(idx + 1).map(|s| s.as_str()).unwrap_or("");
            BackendType::from_str(value).ok_or_else(|| {
                ConfigError::InvalidValue(format!(
                    "--backend '{}' (expected jsonl or sqlite)",
                    value
                ))
            })
        }
        None => Ok(BackendType::Jsonl),
    }
}

pub fn parse_views(s: &str) -> Result<Vec<ViewPreset>, ConfigError> {
    let mut views = Vec::new();
    for name in s.split(',').map(str::trim).filter(|v| !v.is_empty()) {
        let view = ViewPreset::from_str(name)
            .ok_or_else(|| ConfigError::InvalidValue(format!("unknown view '{}'", name)))?;
        if !views.contains(&view) {
            views.push(view);
        }
    }

    if views.is_empty() {
        return Err(ConfigError::InvalidValue("INPUTFLOW_VIEWS is empty".to_string()));
    }
    Ok(views)
}

pub fn parse_categories(s: &str) -> Result<CategorySet, ConfigError> {
    let categories = s
        .split(',')
        .map(str::trim)
        .filter(|c| !c.is_empty())
        .map(|name| {
            EventCategory::from_str(name)
                .ok_or_else(|| ConfigError::InvalidValue(format!("unknown category '{}'", name)))
        })
        .collect::<Result<Vec<_>, _>>()?;

    CategorySet::new(categories).map_err(|e| ConfigError::InvalidValue(e.to_string()))
}
