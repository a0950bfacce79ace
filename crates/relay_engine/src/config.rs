use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use thiserror::Error;

use crate::{FailureKind, RelayError};

pub const SORT_MODES: [&str; 4] = ["top", "hot", "new", "rising"];
pub const PERIODS: [&str; 6] = ["hour", "day", "week", "month", "year", "all"];

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{field} must be a number, got {value:?}")]
    InvalidNumber { field: &'static str, value: String },
    #[error("{field} must be one of {allowed}, got {value:?}")]
    InvalidChoice {
        field: &'static str,
        value: String,
        allowed: String,
    },
    #[error("{0} is required")]
    Missing(&'static str),
}

impl From<ConfigError> for RelayError {
    fn from(err: ConfigError) -> Self {
        RelayError::new(FailureKind::Config, err.to_string())
    }
}

/// Settings value object as edited by the front-end and stored in `settings.json`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub telegram: TelegramSettings,
    pub reddit: RedditSettings,
    #[serde(rename = "sleepTime", with = "lenient_string")]
    pub sleep_time: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TelegramSettings {
    pub token: String,
    #[serde(rename = "chatId", with = "lenient_string")]
    pub chat_id: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RedditSettings {
    pub id: String,
    pub secret: String,
    pub username: String,
    pub password: String,
    pub subreddit: String,
    #[serde(with = "lenient_string")]
    pub limit: String,
    pub period: String,
    pub sort: String,
}

impl Default for RedditSettings {
    fn default() -> Self {
        Self {
            id: String::new(),
            secret: String::new(),
            username: String::new(),
            password: String::new(),
            subreddit: String::new(),
            limit: "70".to_string(),
            period: "day".to_string(),
            sort: "top".to_string(),
        }
    }
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            telegram: TelegramSettings::default(),
            reddit: RedditSettings::default(),
            sleep_time: "120".to_string(),
        }
    }
}

impl Settings {
    /// Validate and freeze the settings into the snapshot one cycle runs with.
    pub fn to_poll_config(&self) -> Result<PollConfig, ConfigError> {
        let chat_id = parse_number::<i64>("chatId", &self.telegram.chat_id)?;
        let sleep_secs = parse_number::<u64>("sleepTime", &self.sleep_time)?;
        let limit = parse_number::<u32>("limit", &self.reddit.limit)?;
        let sort = parse_choice("sort", &self.reddit.sort, &SORT_MODES)?;
        let period = parse_choice("period", &self.reddit.period, &PERIODS)?;
        if self.reddit.subreddit.trim().is_empty() {
            return Err(ConfigError::Missing("subreddit"));
        }
        if self.telegram.token.trim().is_empty() {
            return Err(ConfigError::Missing("telegram token"));
        }

        Ok(PollConfig {
            query: ListingQuery {
                path: self.reddit.subreddit.trim().to_string(),
                sort,
                period,
                limit,
            },
            sleep: Duration::from_secs(sleep_secs),
            destination: Destination {
                token: self.telegram.token.trim().to_string(),
                chat_id,
            },
            credentials: SourceCredentials {
                client_id: self.reddit.id.clone(),
                secret: self.reddit.secret.clone(),
                username: self.reddit.username.clone(),
                password: self.reddit.password.clone(),
            },
        })
    }
}

fn parse_number<T: FromStr>(field: &'static str, raw: &str) -> Result<T, ConfigError> {
    raw.trim().parse().map_err(|_| ConfigError::InvalidNumber {
        field,
        value: raw.to_string(),
    })
}

fn parse_choice(field: &'static str, raw: &str, allowed: &[&str]) -> Result<String, ConfigError> {
    let value = raw.trim();
    if allowed.contains(&value) {
        Ok(value.to_string())
    } else {
        Err(ConfigError::InvalidChoice {
            field,
            value: raw.to_string(),
            allowed: allowed.join("|"),
        })
    }
}

/// Numeric settings are written as JSON strings but numbers are accepted too.
mod lenient_string {
    use super::*;

    pub fn serialize<S: Serializer>(value: &str, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(value)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Raw {
            Text(String),
            Int(i64),
            Float(f64),
        }
        Ok(match Raw::deserialize(deserializer)? {
            Raw::Text(text) => text,
            Raw::Int(number) => number.to_string(),
            Raw::Float(number) => number.to_string(),
        })
    }
}

/// What to ask the source for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListingQuery {
    pub path: String,
    pub sort: String,
    pub period: String,
    pub limit: u32,
}

impl ListingQuery {
    /// Listing route: location path joined with the sort mode.
    pub fn route(&self) -> String {
        let path = self.path.trim_matches('/');
        if path.is_empty() {
            format!("/{}", self.sort)
        } else {
            format!("/{}/{}", path, self.sort)
        }
    }
}

#[derive(Clone, PartialEq, Eq)]
pub struct Destination {
    pub token: String,
    pub chat_id: i64,
}

impl fmt::Debug for Destination {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Destination")
            .field("token", &"<redacted>")
            .field("chat_id", &self.chat_id)
            .finish()
    }
}

#[derive(Clone, Default, PartialEq, Eq)]
pub struct SourceCredentials {
    pub client_id: String,
    pub secret: String,
    pub username: String,
    pub password: String,
}

impl fmt::Debug for SourceCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SourceCredentials")
            .field("client_id", &self.client_id)
            .field("username", &self.username)
            .finish_non_exhaustive()
    }
}

/// Immutable snapshot one cycle runs with.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PollConfig {
    pub query: ListingQuery,
    pub sleep: Duration,
    pub destination: Destination,
    pub credentials: SourceCredentials,
}

/// Supplies a fresh configuration snapshot at each cycle start.
pub trait ConfigProvider: Send + Sync {
    fn snapshot(&self) -> Result<PollConfig, RelayError>;
}

impl ConfigProvider for PollConfig {
    fn snapshot(&self) -> Result<PollConfig, RelayError> {
        Ok(self.clone())
    }
}

impl ConfigProvider for Settings {
    fn snapshot(&self) -> Result<PollConfig, RelayError> {
        Ok(self.to_poll_config()?)
    }
}

/// Base URLs of the external services.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Endpoints {
    pub reddit_auth: String,
    pub reddit_api: String,
    pub telegram_api: String,
}

impl Default for Endpoints {
    fn default() -> Self {
        Self {
            reddit_auth: "https://www.reddit.com".to_string(),
            reddit_api: "https://oauth.reddit.com".to_string(),
            telegram_api: "https://api.telegram.org".to_string(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct HttpSettings {
    pub connect_timeout: Duration,
    pub request_timeout: Duration,
}

impl Default for HttpSettings {
    fn default() -> Self {
        Self {
            connect_timeout: Duration::from_secs(10),
            request_timeout: Duration::from_secs(30),
        }
    }
}

impl HttpSettings {
    pub(crate) fn build_client(&self) -> Result<reqwest::Client, RelayError> {
        reqwest::Client::builder()
            .connect_timeout(self.connect_timeout)
            .timeout(self.request_timeout)
            .build()
            .map_err(|err| RelayError::new(FailureKind::Network, err.to_string()))
    }
}
