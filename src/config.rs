//! Configuration types for listentube

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::{net::SocketAddr, path::Path, path::PathBuf, time::Duration};
use utoipa::ToSchema;

/// Main configuration
///
/// Every field has a default, so an empty TOML file (or no file at all) yields a
/// working service.
#[derive(Clone, Debug, Default, Serialize, Deserialize, ToSchema)]
pub struct Config {
    /// HTTP server settings
    #[serde(default)]
    pub server: ServerConfig,

    /// Task lifecycle settings (work directory, expiry, janitor cadence)
    #[serde(default)]
    pub tasks: TaskConfig,

    /// yt-dlp invocation settings
    #[serde(default)]
    pub extractor: ExtractorConfig,
}

impl Config {
    /// Load configuration from a TOML file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|e| Error::Config {
            message: format!("failed to read {}: {e}", path.display()),
            key: None,
        })?;
        let config: Config = toml::from_str(&text)?;
        Ok(config)
    }

    /// Reject settings the service cannot run with
    pub fn validate(&self) -> Result<()> {
        if self.tasks.ttl.is_zero() {
            return Err(Error::Config {
                message: "ttl must be greater than zero".to_string(),
                key: Some("tasks.ttl".to_string()),
            });
        }

        if self.tasks.sweep_interval.is_zero() {
            return Err(Error::Config {
                message: "sweep_interval must be greater than zero".to_string(),
                key: Some("tasks.sweep_interval".to_string()),
            });
        }

        if self.tasks.extraction_timeout.is_some_and(|t| t.is_zero()) {
            return Err(Error::Config {
                message: "extraction_timeout must be greater than zero when set".to_string(),
                key: Some("tasks.extraction_timeout".to_string()),
            });
        }

        if let (Some(min), Some(max)) = (
            self.extractor.sleep_interval,
            self.extractor.max_sleep_interval,
        ) && max < min
        {
            return Err(Error::Config {
                message: format!("max_sleep_interval ({max}) is below sleep_interval ({min})"),
                key: Some("extractor.max_sleep_interval".to_string()),
            });
        }

        Ok(())
    }
}

/// HTTP server configuration
#[derive(Clone, Debug, Serialize, Deserialize, ToSchema)]
pub struct ServerConfig {
    /// Address to bind to (default: 0.0.0.0:9000)
    #[serde(default = "default_bind_address")]
    #[schema(value_type = String)]
    pub bind_address: SocketAddr,

    /// Enable CORS for browser access (default: true)
    #[serde(default = "default_true")]
    pub cors_enabled: bool,

    /// Allowed CORS origins (default: ["*"])
    #[serde(default = "default_cors_origins")]
    pub cors_origins: Vec<String>,

    /// Enable Swagger UI at /swagger-ui (default: true)
    #[serde(default = "default_true")]
    pub swagger_ui: bool,

    /// Directory holding the browser frontend (default: "static")
    ///
    /// Served as the fallback route when the directory exists.
    #[serde(default = "default_static_dir")]
    #[schema(value_type = Option<String>)]
    pub static_dir: Option<PathBuf>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_address: default_bind_address(),
            cors_enabled: true,
            cors_origins: default_cors_origins(),
            swagger_ui: true,
            static_dir: default_static_dir(),
        }
    }
}

/// Task lifecycle configuration
#[derive(Clone, Debug, Serialize, Deserialize, ToSchema)]
pub struct TaskConfig {
    /// Root directory for per-task working directories
    /// (default: "<system temp>/listentube")
    #[serde(default = "default_work_dir")]
    #[schema(value_type = String)]
    pub work_dir: PathBuf,

    /// How long a finished or failed task is kept, in seconds (default: 1800)
    #[serde(default = "default_ttl", with = "duration_serde")]
    #[schema(value_type = u64)]
    pub ttl: Duration,

    /// Janitor sweep interval, in seconds (default: 60)
    #[serde(default = "default_sweep_interval", with = "duration_serde")]
    #[schema(value_type = u64)]
    pub sweep_interval: Duration,

    /// Extra retention after a task was consumed by a download, in seconds (default: 300)
    #[serde(default = "default_grace_period", with = "duration_serde")]
    #[schema(value_type = u64)]
    pub grace_period: Duration,

    /// Upper bound on a single extraction, in seconds (default: unset)
    ///
    /// When unset a stuck extraction keeps its task in `downloading` forever.
    #[serde(default, with = "optional_duration_serde")]
    #[schema(value_type = Option<u64>)]
    pub extraction_timeout: Option<Duration>,
}

impl Default for TaskConfig {
    fn default() -> Self {
        Self {
            work_dir: default_work_dir(),
            ttl: default_ttl(),
            sweep_interval: default_sweep_interval(),
            grace_period: default_grace_period(),
            extraction_timeout: None,
        }
    }
}

/// yt-dlp invocation configuration
#[derive(Clone, Debug, Serialize, Deserialize, ToSchema)]
pub struct ExtractorConfig {
    /// Explicit path to the yt-dlp binary
    #[serde(default)]
    #[schema(value_type = Option<String>)]
    pub ytdlp_path: Option<PathBuf>,

    /// Look up yt-dlp on PATH when no explicit path is set (default: true)
    #[serde(default = "default_true")]
    pub search_path: bool,

    /// yt-dlp format selector (default: "bestaudio/best")
    #[serde(default = "default_format_selector")]
    pub format_selector: String,

    /// Audio quality handed to the transcoder (default: "192K")
    #[serde(default = "default_audio_quality")]
    pub audio_quality: String,

    /// Netscape cookies file, used only if it exists (default: "cookies.txt")
    #[serde(default = "default_cookies_file")]
    #[schema(value_type = Option<String>)]
    pub cookies_file: Option<PathBuf>,

    /// User-Agent sent by yt-dlp
    #[serde(default = "default_user_agent")]
    pub user_agent: Option<String>,

    /// Extra request headers in "Name: value" form
    #[serde(default = "default_headers")]
    pub headers: Vec<String>,

    /// Retry count for requests, fragments, extractors and file access (default: 3)
    #[serde(default = "default_retries")]
    pub retries: u32,

    /// Minimum sleep between downloads, in seconds (default: 1)
    #[serde(default = "default_sleep_interval")]
    pub sleep_interval: Option<u32>,

    /// Maximum sleep between downloads, in seconds (default: 5)
    #[serde(default = "default_max_sleep_interval")]
    pub max_sleep_interval: Option<u32>,

    /// Skip TLS certificate validation (default: true)
    #[serde(default = "default_true")]
    pub no_check_certificate: bool,

    /// Values passed through `--extractor-args`
    #[serde(default = "default_extractor_args")]
    pub extractor_args: Vec<String>,
}

impl Default for ExtractorConfig {
    fn default() -> Self {
        Self {
            ytdlp_path: None,
            search_path: true,
            format_selector: default_format_selector(),
            audio_quality: default_audio_quality(),
            cookies_file: default_cookies_file(),
            user_agent: default_user_agent(),
            headers: default_headers(),
            retries: default_retries(),
            sleep_interval: default_sleep_interval(),
            max_sleep_interval: default_max_sleep_interval(),
            no_check_certificate: true,
            extractor_args: default_extractor_args(),
        }
    }
}

fn default_true() -> bool {
    true
}

fn default_bind_address() -> SocketAddr {
    SocketAddr::from(([0, 0, 0, 0], 9000))
}

fn default_cors_origins() -> Vec<String> {
    vec!["*".to_string()]
}

fn default_static_dir() -> Option<PathBuf> {
    Some(PathBuf::from("static"))
}

fn default_work_dir() -> PathBuf {
    std::env::temp_dir().join("listentube")
}

fn default_ttl() -> Duration {
    Duration::from_secs(30 * 60)
}

fn default_sweep_interval() -> Duration {
    Duration::from_secs(60)
}

fn default_grace_period() -> Duration {
    Duration::from_secs(5 * 60)
}

fn default_format_selector() -> String {
    "bestaudio/best".to_string()
}

fn default_audio_quality() -> String {
    "192K".to_string()
}

fn default_cookies_file() -> Option<PathBuf> {
    Some(PathBuf::from("cookies.txt"))
}

fn default_user_agent() -> Option<String> {
    Some(
        "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/537.36 \
         (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36"
            .to_string(),
    )
}

fn default_headers() -> Vec<String> {
    [
        "Accept-Language: en-US,en;q=0.9",
        "Accept: text/html,application/xhtml+xml,application/xml;q=0.9,image/webp,*/*;q=0.8",
        "DNT: 1",
        "Upgrade-Insecure-Requests: 1",
    ]
    .iter()
    .map(|h| h.to_string())
    .collect()
}

fn default_retries() -> u32 {
    3
}

fn default_sleep_interval() -> Option<u32> {
    Some(1)
}

fn default_max_sleep_interval() -> Option<u32> {
    Some(5)
}

fn default_extractor_args() -> Vec<String> {
    vec!["youtube:player_client=android,web;player_skip=webpage,configs".to_string()]
}

// Duration serialization helper
mod duration_serde {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_u64(duration.as_secs())
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        let secs = u64::deserialize(deserializer)?;
        Ok(Duration::from_secs(secs))
    }
}

// Optional Duration serialization helper
mod optional_duration_serde {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S>(duration: &Option<Duration>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match duration {
            Some(d) => serializer.serialize_some(&d.as_secs()),
            None => serializer.serialize_none(),
        }
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Option<Duration>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let secs = Option::<u64>::deserialize(deserializer)?;
        Ok(secs.map(Duration::from_secs))
    }
}
