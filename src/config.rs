use std::{env, fmt::Display, net::SocketAddr, path::PathBuf, str::FromStr, time::Duration};
use thiserror::Error;

use crate::sources::{SourceKind, SourceSpec};

pub const DEFAULT_SUBREDDITS: [&str; 4] = ["memes", "dankmemes", "me_irl", "wholesomememes"];

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Invalid environment variable format for {0}: {1}")]
    InvalidVar(String, String),
}

/// Server-side settings for the resolver endpoint.
#[derive(Clone, Debug)]
pub struct Config {
    pub bind_address: SocketAddr,
    pub upstream_timeout: Duration,
    pub user_agent: String,
    /// Ordered source chain; the first usable result wins.
    pub sources: Vec<SourceSpec>,
}

impl Config {
    /// Loads configuration from environment variables.
    pub fn load() -> Result<Self, ConfigError> {
        // Load .env file if present (ignores errors, relies on env vars otherwise)
        dotenvy::dotenv().ok();

        let bind_address = parse_var("BIND_ADDRESS", "0.0.0.0:3000")?;
        let upstream_timeout = Duration::from_secs(parse_var("UPSTREAM_TIMEOUT_SECS", "10")?);
        let user_agent = env::var("USER_AGENT")
            .ok()
            .filter(|ua| !ua.trim().is_empty())
            .unwrap_or_else(default_user_agent);

        let subreddits = match env::var("REDDIT_SUBREDDITS") {
            Ok(raw) => split_list(&raw),
            Err(_) => DEFAULT_SUBREDDITS.iter().map(|s| s.to_string()).collect(),
        };
        if subreddits.is_empty() {
            return Err(ConfigError::InvalidVar(
                "REDDIT_SUBREDDITS".into(),
                "at least one subreddit is required".into(),
            ));
        }

        let sources = match env::var("MEME_SOURCES") {
            Ok(raw) => parse_sources(&raw, &subreddits)?,
            Err(_) => default_sources(&subreddits),
        };

        Ok(Config {
            bind_address,
            upstream_timeout,
            user_agent,
            sources,
        })
    }
}

/// Client-side settings for the viewer session.
#[derive(Clone, Debug)]
pub struct ViewerConfig {
    pub endpoint: String,
    pub refresh_interval: Duration,
    pub swipe_threshold: f32,
    pub download_dir: PathBuf,
    pub user_agent: String,
}

impl Default for ViewerConfig {
    fn default() -> Self {
        ViewerConfig {
            endpoint: "http://127.0.0.1:3000/api/memes".to_string(),
            refresh_interval: Duration::from_secs(8),
            swipe_threshold: 50.0,
            download_dir: PathBuf::from("."),
            user_agent: default_user_agent(),
        }
    }
}

impl ViewerConfig {
    pub fn load() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();
        let defaults = ViewerConfig::default();

        let endpoint = env::var("MEME_ENDPOINT").unwrap_or(defaults.endpoint);
        url::Url::parse(&endpoint)
            .map_err(|e| ConfigError::InvalidVar("MEME_ENDPOINT".into(), e.to_string()))?;

        let refresh_secs: u64 = parse_var("REFRESH_INTERVAL_SECS", "8")?;
        if !(1..=3600).contains(&refresh_secs) {
            return Err(ConfigError::InvalidVar(
                "REFRESH_INTERVAL_SECS".into(),
                format!("{refresh_secs} is outside 1..=3600"),
            ));
        }

        let swipe_threshold: f32 = parse_var("SWIPE_THRESHOLD_PX", "50")?;
        if !(swipe_threshold.is_finite() && swipe_threshold > 0.0) {
            return Err(ConfigError::InvalidVar(
                "SWIPE_THRESHOLD_PX".into(),
                "must be a positive number".into(),
            ));
        }

        let download_dir = env::var("DOWNLOAD_DIR")
            .map(PathBuf::from)
            .unwrap_or(defaults.download_dir);

        Ok(ViewerConfig {
            endpoint,
            refresh_interval: Duration::from_secs(refresh_secs),
            swipe_threshold,
            download_dir,
            user_agent: defaults.user_agent,
        })
    }
}

pub fn default_user_agent() -> String {
    format!("{}/{}", env!("CARGO_PKG_NAME"), env!("CARGO_PKG_VERSION"))
}

/// Source chain used when `MEME_SOURCES` is unset.
pub fn default_sources(subreddits: &[String]) -> Vec<SourceSpec> {
    [
        SourceKind::MemeApi,
        SourceKind::Imgflip,
        SourceKind::Reddit,
        SourceKind::RandomDuck,
    ]
    .into_iter()
    .map(|kind| SourceSpec::default_for(kind, subreddits))
    .collect()
}

fn parse_sources(raw: &str, subreddits: &[String]) -> Result<Vec<SourceSpec>, ConfigError> {
    split_list(raw)
        .iter()
        .map(|name| {
            name.parse::<SourceKind>()
                .map(|kind| SourceSpec::default_for(kind, subreddits))
                .map_err(|e| ConfigError::InvalidVar("MEME_SOURCES".into(), e))
        })
        .collect()
}

fn split_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

fn parse_var<T: FromStr>(key: &str, default: &str) -> Result<T, ConfigError>
where
    T::Err: Display,
{
    let raw = env::var(key).unwrap_or_else(|_| {
        tracing::debug!("{key} not set, using default: {default}");
        default.to_string()
    });
    raw.trim()
        .parse()
        .map_err(|e: T::Err| ConfigError::InvalidVar(key.to_string(), e.to_string()))
}
