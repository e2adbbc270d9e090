use crate::error::{config_error, env_error, CalendarResult};
use chrono_tz::Tz;
use dotenvy::dotenv;
use serde::{Deserialize, Serialize};
use std::env;
use std::fs;
use std::path::Path;

/// Default number of events previewed per grid cell
pub const DEFAULT_PREVIEW_LIMIT: usize = 3;

/// Default open-ended recurrence horizon in calendar months
pub const DEFAULT_HORIZON_MONTHS: u32 = 3;

/// Largest accepted open-ended recurrence horizon (100 years)
pub const MAX_HORIZON_MONTHS: u32 = 1200;

/// Optional file with overrides for the environment configuration
pub const CONFIG_FILE: &str = "config/calendar.toml";

/// Main configuration structure for the calendar engine
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// IANA timezone used for day keys and local dates
    pub timezone: String,
    /// JSON snapshot used when no API is configured
    pub data_file: String,
    /// Base URL of the dashboard REST API
    pub api_url: Option<String>,
    /// Bearer token sent to the REST API
    pub api_token: Option<String>,
    /// Events shown per day cell before the overflow marker
    pub preview_limit: usize,
    /// Recurrence window when a base event has no end date
    pub recurrence_horizon_months: u32,
    /// File that keeps view state between runs
    pub state_file: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            timezone: "UTC".to_string(),
            data_file: "data/calendar.json".to_string(),
            api_url: None,
            api_token: None,
            preview_limit: DEFAULT_PREVIEW_LIMIT,
            recurrence_horizon_months: DEFAULT_HORIZON_MONTHS,
            state_file: "config/view_state.toml".to_string(),
        }
    }
}

/// Values accepted from the TOML override file
#[derive(Debug, Default, Deserialize)]
struct FileOverrides {
    timezone: Option<String>,
    data_file: Option<String>,
    api_url: Option<String>,
    preview_limit: Option<usize>,
    recurrence_horizon_months: Option<u32>,
    state_file: Option<String>,
}

impl Config {
    /// Load configuration from environment and config file
    pub fn load() -> CalendarResult<Self> {
        // Load .env file if it exists
        dotenv().ok();

        let mut config = Self::from_env()?;

        if Path::new(CONFIG_FILE).exists() {
            let content = fs::read_to_string(CONFIG_FILE)?;
            config.apply_overrides(&content)?;
        }

        config.validate()?;
        Ok(config)
    }

    /// Check settings that would otherwise fail far from their cause
    pub fn validate(&self) -> CalendarResult<()> {
        self.timezone()?;

        if self.recurrence_horizon_months > MAX_HORIZON_MONTHS {
            return Err(config_error(&format!(
                "recurrence_horizon_months is {}, at most {} is supported",
                self.recurrence_horizon_months, MAX_HORIZON_MONTHS
            )));
        }

        Ok(())
    }

    /// Build the configuration from environment variables only
    pub fn from_env() -> CalendarResult<Self> {
        let defaults = Self::default();

        let preview_limit = parse_env("LUKKARI_PREVIEW_LIMIT", defaults.preview_limit)?;
        let recurrence_horizon_months = parse_env(
            "LUKKARI_RECURRENCE_HORIZON_MONTHS",
            defaults.recurrence_horizon_months,
        )?;

        Ok(Config {
            timezone: env::var("LUKKARI_TIMEZONE").unwrap_or(defaults.timezone),
            data_file: env::var("LUKKARI_DATA_FILE").unwrap_or(defaults.data_file),
            api_url: env::var("LUKKARI_API_URL").ok().filter(|s| !s.is_empty()),
            api_token: env::var("LUKKARI_API_TOKEN").ok().filter(|s| !s.is_empty()),
            preview_limit,
            recurrence_horizon_months,
            state_file: env::var("LUKKARI_STATE_FILE").unwrap_or(defaults.state_file),
        })
    }

    /// Merge values from a TOML document over the current settings
    pub fn apply_overrides(&mut self, content: &str) -> CalendarResult<()> {
        let overrides: FileOverrides = toml::from_str(content)?;

        if let Some(timezone) = overrides.timezone {
            self.timezone = timezone;
        }
        if let Some(data_file) = overrides.data_file {
            self.data_file = data_file;
        }
        if let Some(api_url) = overrides.api_url {
            self.api_url = Some(api_url);
        }
        if let Some(limit) = overrides.preview_limit {
            self.preview_limit = limit;
        }
        if let Some(months) = overrides.recurrence_horizon_months {
            self.recurrence_horizon_months = months;
        }
        if let Some(state_file) = overrides.state_file {
            self.state_file = state_file;
        }

        Ok(())
    }

    /// Resolve the configured timezone
    pub fn timezone(&self) -> CalendarResult<Tz> {
        self.timezone
            .parse::<Tz>()
            .map_err(|_| config_error(&format!("Unknown timezone '{}'", self.timezone)))
    }
}

fn parse_env<T: std::str::FromStr>(var: &str, default: T) -> CalendarResult<T> {
    match env::var(var) {
        Ok(value) => value.trim().parse::<T>().map_err(|_| env_error(var)),
        Err(_) => Ok(default),
    }
}
