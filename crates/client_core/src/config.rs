use std::{
    fs,
    path::{Path, PathBuf},
};

use chrono::{DateTime, Local, NaiveDate, NaiveDateTime, TimeZone, Utc};
use serde::Deserialize;
use thiserror::Error;
use url::Url;

use crate::csv_export::CsvStyle;

pub const SETTINGS_FILE: &str = "rsvp.toml";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read settings file '{path}': {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("invalid settings file '{path}': {source}")]
    Parse {
        path: PathBuf,
        source: toml::de::Error,
    },
    #[error("invalid backend url '{value}': {source}")]
    BackendUrl {
        value: String,
        source: url::ParseError,
    },
    #[error("backend url '{0}' must use http or https")]
    BackendScheme(String),
    #[error("invalid target date '{0}'; expected e.g. 2026-08-22T00:00:00 or an RFC 3339 timestamp")]
    TargetDate(String),
    #[error("anon key is empty; set RSVP_ANON_KEY or anon_key in {SETTINGS_FILE}")]
    MissingAnonKey,
    #[error("no usable data directory; set RSVP_DATA_DIR")]
    DataDir,
}

/// Raw settings as layered from defaults, the optional settings file and the
/// environment. Validated into [`ClientConfig`] by [`Settings::resolve`].
#[derive(Debug, Clone, PartialEq)]
pub struct Settings {
    pub backend_url: String,
    pub anon_key: String,
    pub table: String,
    pub target_date: String,
    pub couple: String,
    pub date_label: String,
    pub theme_line: String,
    pub data_dir: Option<PathBuf>,
    pub csv_quote_fields: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            backend_url: "https://your-project-id.supabase.co".into(),
            anon_key: String::new(),
            table: "guests".into(),
            target_date: "2026-08-22T00:00:00".into(),
            couple: "Adunni & Ola".into(),
            date_label: "August 22nd, 2026".into(),
            theme_line: "Lilac & Purple Theme".into(),
            data_dir: None,
            csv_quote_fields: false,
        }
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct FileSettings {
    backend_url: Option<String>,
    anon_key: Option<String>,
    table: Option<String>,
    target_date: Option<String>,
    couple: Option<String>,
    date_label: Option<String>,
    theme_line: Option<String>,
    data_dir: Option<PathBuf>,
    csv_quote_fields: Option<bool>,
}

/// Event shown on the home card and the invitation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EventDetails {
    pub couple: String,
    pub date_label: String,
    pub theme_line: String,
    pub target: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct ClientConfig {
    pub backend_url: Url,
    pub anon_key: String,
    pub table: String,
    pub event: EventDetails,
    pub data_dir: PathBuf,
    pub csv_style: CsvStyle,
}

/// Defaults, then `rsvp.toml` in the working directory, then environment.
pub fn load_settings() -> Result<Settings, ConfigError> {
    let file = Path::new(SETTINGS_FILE);
    let raw = match fs::read_to_string(file) {
        Ok(raw) => Some(raw),
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => None,
        Err(source) => {
            return Err(ConfigError::Read {
                path: file.to_path_buf(),
                source,
            })
        }
    };
    load_settings_from(file, raw.as_deref(), |name| std::env::var(name).ok())
}

pub fn load_settings_from(
    file: &Path,
    raw_file: Option<&str>,
    env: impl Fn(&str) -> Option<String>,
) -> Result<Settings, ConfigError> {
    let mut settings = Settings::default();

    if let Some(raw) = raw_file {
        let file_cfg: FileSettings = toml::from_str(raw).map_err(|source| ConfigError::Parse {
            path: file.to_path_buf(),
            source,
        })?;
        apply_file(&mut settings, file_cfg);
    }

    let lookup = |suffix: &str| {
        env(&format!("APP__{suffix}"))
            .or_else(|| env(&format!("RSVP_{suffix}")))
            .filter(|value| !value.trim().is_empty())
    };

    if let Some(v) = lookup("BACKEND_URL") {
        settings.backend_url = v;
    }
    if let Some(v) = lookup("ANON_KEY") {
        settings.anon_key = v;
    }
    if let Some(v) = lookup("TABLE") {
        settings.table = v;
    }
    if let Some(v) = lookup("TARGET_DATE") {
        settings.target_date = v;
    }
    if let Some(v) = lookup("DATA_DIR") {
        settings.data_dir = Some(PathBuf::from(v));
    }
    if let Some(v) = lookup("CSV_QUOTE_FIELDS") {
        if let Some(parsed) = parse_flag(&v) {
            settings.csv_quote_fields = parsed;
        }
    }

    Ok(settings)
}

fn apply_file(settings: &mut Settings, file_cfg: FileSettings) {
    let FileSettings {
        backend_url,
        anon_key,
        table,
        target_date,
        couple,
        date_label,
        theme_line,
        data_dir,
        csv_quote_fields,
    } = file_cfg;

    if let Some(v) = backend_url {
        settings.backend_url = v;
    }
    if let Some(v) = anon_key {
        settings.anon_key = v;
    }
    if let Some(v) = table {
        settings.table = v;
    }
    if let Some(v) = target_date {
        settings.target_date = v;
    }
    if let Some(v) = couple {
        settings.couple = v;
    }
    if let Some(v) = date_label {
        settings.date_label = v;
    }
    if let Some(v) = theme_line {
        settings.theme_line = v;
    }
    if data_dir.is_some() {
        settings.data_dir = data_dir;
    }
    if let Some(v) = csv_quote_fields {
        settings.csv_quote_fields = v;
    }
}

fn parse_flag(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

impl Settings {
    pub fn resolve(self) -> Result<ClientConfig, ConfigError> {
        let backend_url = parse_backend_url(&self.backend_url)?;
        if self.anon_key.trim().is_empty() {
            return Err(ConfigError::MissingAnonKey);
        }
        let target = parse_target_date(&self.target_date)?;
        let data_dir = match self.data_dir {
            Some(dir) => dir,
            None => dirs::data_local_dir()
                .map(|base| base.join("wedding_rsvp"))
                .ok_or(ConfigError::DataDir)?,
        };

        Ok(ClientConfig {
            backend_url,
            anon_key: self.anon_key.trim().to_string(),
            table: self.table,
            event: EventDetails {
                couple: self.couple,
                date_label: self.date_label,
                theme_line: self.theme_line,
                target,
            },
            data_dir,
            csv_style: if self.csv_quote_fields {
                CsvStyle::Quoted
            } else {
                CsvStyle::Plain
            },
        })
    }
}

fn parse_backend_url(raw: &str) -> Result<Url, ConfigError> {
    let trimmed = raw.trim().trim_end_matches('/');
    let url = Url::parse(trimmed).map_err(|source| ConfigError::BackendUrl {
        value: trimmed.to_string(),
        source,
    })?;
    if !matches!(url.scheme(), "http" | "https") {
        return Err(ConfigError::BackendScheme(trimmed.to_string()));
    }
    Ok(url)
}

/// Accepts RFC 3339 (explicit offset), a local date-time without offset, or a
/// bare date. Local date-times use the machine's time zone; a bare date is
/// midnight UTC.
pub fn parse_target_date(raw: &str) -> Result<DateTime<Utc>, ConfigError> {
    let raw = raw.trim();
    if let Ok(parsed) = DateTime::parse_from_rfc3339(raw) {
        return Ok(parsed.with_timezone(&Utc));
    }

    let local = NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S")
        .or_else(|_| NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M"))
        .or_else(|_| NaiveDateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S"));
    if let Ok(naive) = local {
        return Local
            .from_local_datetime(&naive)
            .earliest()
            .map(|dt| dt.with_timezone(&Utc))
            .ok_or_else(|| ConfigError::TargetDate(raw.to_string()));
    }

    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc())
        .ok_or_else(|| ConfigError::TargetDate(raw.to_string()))
}

#[cfg(test)]
#[path = "tests/config_tests.rs"]
mod tests;
