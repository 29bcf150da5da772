use serde::{Deserialize, Deserializer};
use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("YAML parse error: {0}")]
    Yaml(#[from] serde_yaml::Error),
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub viewer: ViewerConfig,
    pub catalog: CatalogConfig,
    pub prediction: PredictionConfig,
    pub render: RenderConfig,
    pub web: WebConfig,
}

#[derive(Debug, Clone, Copy, Default, Deserialize)]
#[serde(default)]
pub struct ViewerConfig {
    pub latitude_deg: f64,
    pub longitude_deg: f64,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct CatalogConfig {
    /// Remote catalog. Empty disables the catalog.
    pub url: String,
    pub identity: Option<String>,
    /// Small list of marquee objects merged into the canonical catalog.
    pub overlay_url: String,
    pub canonical_file: String,
    pub cache_dir: PathBuf,
    #[serde(deserialize_with = "humantime_duration")]
    pub staleness: Duration,
    #[serde(deserialize_with = "humantime_duration")]
    pub settle_delay: Duration,
    #[serde(deserialize_with = "humantime_duration")]
    pub retry_delay: Duration,
    #[serde(deserialize_with = "humantime_duration")]
    pub poll_interval: Duration,
    #[serde(deserialize_with = "humantime_duration")]
    pub fetch_timeout: Duration,
}

impl Default for CatalogConfig {
    fn default() -> Self {
        Self {
            url: "https://celestrak.org/NORAD/elements/visual.txt".to_string(),
            identity: None,
            overlay_url: String::new(),
            canonical_file: "visual.txt".to_string(),
            cache_dir: PathBuf::from("cache"),
            staleness: Duration::from_secs(3600),
            settle_delay: Duration::from_millis(500),
            retry_delay: Duration::from_secs(30),
            poll_interval: Duration::from_millis(100),
            fetch_timeout: Duration::from_secs(30),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct PredictionConfig {
    pub show: bool,
    pub horizon_seconds: u32,
    pub step_seconds: u32,
    pub min_elevation_deg: f64,
    pub special_min_elevation_deg: f64,
    #[serde(deserialize_with = "humantime_duration")]
    pub busy_sleep: Duration,
    #[serde(deserialize_with = "humantime_duration")]
    pub idle_sleep: Duration,
}

impl Default for PredictionConfig {
    fn default() -> Self {
        Self {
            show: true,
            horizon_seconds: 900,
            step_seconds: 5,
            min_elevation_deg: 25.0,
            special_min_elevation_deg: 15.0,
            busy_sleep: Duration::from_millis(50),
            idle_sleep: Duration::from_secs(1),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct RenderConfig {
    pub frame_rate: u32,
    pub max_satellites: usize,
    #[serde(deserialize_with = "humantime_duration")]
    pub resort_interval: Duration,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            frame_rate: 30,
            max_satellites: 40,
            resort_interval: Duration::from_secs(5),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct WebConfig {
    #[serde(default = "default_bind")]
    pub bind: String,
}

impl Default for WebConfig {
    fn default() -> Self {
        Self {
            bind: default_bind(),
        }
    }
}

fn default_bind() -> String {
    "0.0.0.0:8080".to_string()
}

fn humantime_duration<'de, D>(deserializer: D) -> Result<Duration, D::Error>
where
    D: Deserializer<'de>,
{
    let s = String::deserialize(deserializer)?;
    humantime::parse_duration(s.trim()).map_err(serde::de::Error::custom)
}

impl Config {
    pub fn from_file(path: &str) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_yaml(&content)
    }

    pub fn from_yaml(content: &str) -> Result<Self, ConfigError> {
        // An empty document deserializes as null.
        if content.trim().is_empty() {
            return Ok(Self::default());
        }
        let config: Config = serde_yaml::from_str(content)?;
        Ok(config)
    }
}
