use std::{env, path::PathBuf};

use anyhow::{Context, Result, anyhow};
use chrono::NaiveDate;

const DEFAULT_PORT: u16 = 8080;
const DEFAULT_DOCUMENT_ROOT: &str = "storage";
const DEFAULT_BASE_URL: &str = "https://arxiv.org";
const DEFAULT_LATEXML_BASE_URL: &str = "https://arxiv.org/html";
const DEFAULT_MAX_CONNECTIONS: u32 = 10;
/// 20:00 US Eastern standard time.
const DEFAULT_PUBLISH_HOUR_UTC: u32 = 1;

/// Process-wide settings, read once at startup.
#[derive(Clone, Debug)]
pub struct Settings {
    pub database_url: String,
    pub database_max_connections: u32,
    pub run_migrations: bool,
    pub port: u16,
    pub document_root: PathBuf,
    pub base_url: String,
    pub latexml_base_url: String,
    /// Announcement hour in UTC under US Eastern standard time; the schedule
    /// moves it an hour earlier while daylight time is in effect.
    pub publish_hour_utc: u32,
    pub no_publish_dates: Vec<NaiveDate>,
}

impl Settings {
    pub fn from_env() -> Result<Self> {
        let database_url = env::var("DATABASE_URL").context("DATABASE_URL env var is missing")?;

        let port = parse_var("PORT")?.unwrap_or(DEFAULT_PORT);
        let database_max_connections =
            parse_var("DATABASE_MAX_CONNECTIONS")?.unwrap_or(DEFAULT_MAX_CONNECTIONS);
        let run_migrations = parse_var("RUN_MIGRATIONS")?.unwrap_or(false);

        let publish_hour_utc: u32 =
            parse_var("PUBLISH_HOUR_UTC")?.unwrap_or(DEFAULT_PUBLISH_HOUR_UTC);
        if publish_hour_utc > 23 {
            return Err(anyhow!(
                "PUBLISH_HOUR_UTC must be between 0 and 23, got {publish_hour_utc}"
            ));
        }

        let no_publish_dates = match env::var("NO_PUBLISH_DATES") {
            Ok(raw) => parse_dates(&raw)?,
            Err(_) => Vec::new(),
        };

        Ok(Self {
            database_url,
            database_max_connections,
            run_migrations,
            port,
            document_root: env::var("DOCUMENT_ROOT")
                .map(PathBuf::from)
                .unwrap_or_else(|_| PathBuf::from(DEFAULT_DOCUMENT_ROOT)),
            base_url: trimmed_url("BASE_URL", DEFAULT_BASE_URL),
            latexml_base_url: trimmed_url("LATEXML_BASE_URL", DEFAULT_LATEXML_BASE_URL),
            publish_hour_utc,
            no_publish_dates,
        })
    }

    #[cfg(test)]
    pub fn for_tests(document_root: impl Into<PathBuf>) -> Self {
        Self {
            database_url: String::new(),
            database_max_connections: 1,
            run_migrations: false,
            port: 0,
            document_root: document_root.into(),
            base_url: DEFAULT_BASE_URL.to_string(),
            latexml_base_url: DEFAULT_LATEXML_BASE_URL.to_string(),
            publish_hour_utc: DEFAULT_PUBLISH_HOUR_UTC,
            no_publish_dates: Vec::new(),
        }
    }
}

fn parse_var<T>(name: &str) -> Result<Option<T>>
where
    T: std::str::FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match env::var(name) {
        Ok(raw) if !raw.trim().is_empty() => raw
            .trim()
            .parse()
            .map(Some)
            .with_context(|| format!("invalid value for {name}: {raw}")),
        _ => Ok(None),
    }
}

fn trimmed_url(name: &str, default: &str) -> String {
    env::var(name)
        .ok()
        .filter(|value| !value.trim().is_empty())
        .unwrap_or_else(|| default.to_string())
        .trim()
        .trim_end_matches('/')
        .to_string()
}

fn parse_dates(raw: &str) -> Result<Vec<NaiveDate>> {
    raw.split(',')
        .map(str::trim)
        .filter(|part| !part.is_empty())
        .map(|part| {
            NaiveDate::parse_from_str(part, "%Y-%m-%d")
                .with_context(|| format!("invalid date in NO_PUBLISH_DATES: {part}"))
        })
        .collect()
}
