use std::path::PathBuf;
use std::time::Duration;

use reqwest::Url;
use thiserror::Error;

pub const PRACTICUM_TOKEN: &str = "PRACTICUM_TOKEN";
pub const TELEGRAM_TOKEN: &str = "TELEGRAM_TOKEN";
pub const TELEGRAM_CHAT_ID: &str = "TELEGRAM_CHAT_ID";

const ENDPOINT_VAR: &str = "PRACTICUM_ENDPOINT";
const RETRY_PERIOD_VAR: &str = "RETRY_PERIOD";
const LOG_FILE_VAR: &str = "HOMEWORK_BOT_LOG_FILE";

pub const DEFAULT_ENDPOINT: &str = "https://practicum.yandex.ru/api/user_api/homework_statuses/";
pub const DEFAULT_RETRY_PERIOD: Duration = Duration::from_secs(600);
pub const DEFAULT_LOG_FILE: &str = "logs/homework_bot.log";

const REQUIRED: [&str; 3] = [PRACTICUM_TOKEN, TELEGRAM_TOKEN, TELEGRAM_CHAT_ID];

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("Missing required environment variables: {}", .0.join(", "))]
    MissingTokens(Vec<&'static str>),

    #[error("Invalid value for {var}: {reason}")]
    Invalid { var: &'static str, reason: String },
}

/// Process configuration, built once at startup.
#[derive(Clone, PartialEq, Eq)]
pub struct Config {
    pub practicum_token: String,
    pub telegram_token: String,
    pub chat_id: String,
    pub endpoint: Url,
    pub retry_period: Duration,
    /// `None` disables file logging.
    pub log_file: Option<PathBuf>,
}

// Tokens must never end up in logs.
impl std::fmt::Debug for Config {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Config")
            .field("chat_id", &self.chat_id)
            .field("endpoint", &self.endpoint.as_str())
            .field("retry_period", &self.retry_period)
            .field("log_file", &self.log_file)
            .finish_non_exhaustive()
    }
}

/// Reads a variable, treating blank values as absent.
fn non_blank<F>(lookup: &F, var: &str) -> Option<String>
where
    F: Fn(&str) -> Option<String>,
{
    lookup(var)
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

pub fn process_env(var: &str) -> Option<String> {
    std::env::var(var).ok()
}

/// Loads variables from `.env` in the working directory without overriding
/// ones that are already set. A missing file is not an error.
///
/// # Errors
/// Fails if the file exists but cannot be read or parsed.
pub fn load_dotenv() -> Result<Option<PathBuf>, dotenvy::Error> {
    match dotenvy::dotenv() {
        Ok(path) => Ok(Some(path)),
        Err(e) if e.not_found() => Ok(None),
        Err(e) => Err(e),
    }
}

/// Where the log file goes. An explicitly empty value disables the file;
/// an unset one uses the default. Read separately from [`Config`] because
/// logging is set up before the secrets are checked.
pub fn log_file<F>(lookup: F) -> Option<PathBuf>
where
    F: Fn(&str) -> Option<String>,
{
    match lookup(LOG_FILE_VAR) {
        None => Some(PathBuf::from(DEFAULT_LOG_FILE)),
        Some(path) if path.trim().is_empty() => None,
        Some(path) => Some(PathBuf::from(path.trim())),
    }
}

/// Whether all three secrets are available.
pub fn check_tokens<F>(lookup: F) -> bool
where
    F: Fn(&str) -> Option<String>,
{
    REQUIRED.iter().all(|var| non_blank(&lookup, var).is_some())
}

impl Config {
    /// Reads the process environment. Call [`load_dotenv`] first to pick up a `.env` file.
    ///
    /// # Errors
    /// See [`Config::from_lookup`].
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(process_env)
    }

    /// # Errors
    /// Fails if any required secret is missing or an optional override is malformed.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if !check_tokens(&lookup) {
            let missing = REQUIRED
                .into_iter()
                .filter(|var| non_blank(&lookup, var).is_none())
                .collect();
            return Err(ConfigError::MissingTokens(missing));
        }
        let get = |var| non_blank(&lookup, var).unwrap_or_default();

        let endpoint = non_blank(&lookup, ENDPOINT_VAR);
        let endpoint = endpoint.as_deref().unwrap_or(DEFAULT_ENDPOINT);
        let endpoint = Url::parse(endpoint).map_err(|e| ConfigError::Invalid {
            var: ENDPOINT_VAR,
            reason: e.to_string(),
        })?;

        let retry_period = match non_blank(&lookup, RETRY_PERIOD_VAR) {
            None => DEFAULT_RETRY_PERIOD,
            Some(secs) => parse_retry_period(&secs)?,
        };

        Ok(Self {
            practicum_token: get(PRACTICUM_TOKEN),
            telegram_token: get(TELEGRAM_TOKEN),
            chat_id: get(TELEGRAM_CHAT_ID),
            endpoint,
            retry_period,
            log_file: log_file(&lookup),
        })
    }
}

fn parse_retry_period(secs: &str) -> Result<Duration, ConfigError> {
    let invalid = |reason: String| ConfigError::Invalid {
        var: RETRY_PERIOD_VAR,
        reason,
    };
    let secs: u64 = secs.parse().map_err(|e| invalid(format!("{e}")))?;
    if secs == 0 {
        return Err(invalid(String::from("must be at least one second")));
    }
    Ok(Duration::from_secs(secs))
}
