//! Gateway configuration with validation.

use serde::{Deserialize, Serialize};
use std::env;
use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::path::PathBuf;
use std::time::Duration;

/// Google's token-info endpoint.
pub const DEFAULT_TOKENINFO_URL: &str = "https://oauth2.googleapis.com/tokeninfo";

/// Main gateway configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct GatewayConfig {
    /// HTTP server configuration
    pub http: HttpConfig,
    /// Identity provider configuration
    pub auth: AuthConfig,
    /// Artifact and metadata directories
    pub storage: StorageConfig,
    /// Request limits
    pub limits: LimitsConfig,
    /// CORS configuration
    pub cors: CorsConfig,
    /// Inbox listing policy
    pub inbox: InboxConfig,
}

impl GatewayConfig {
    /// Defaults overridden from the process environment.
    ///
    /// # Environment Variables
    ///
    /// - `GOOGLE_CLIENT_ID`: OAuth audience tokens must be issued for (required)
    /// - `INBOX_HOST` / `INBOX_PORT`: bind address (default 0.0.0.0:5000)
    /// - `INBOX_DIR`: artifact directory (default `inbox`)
    /// - `INBOX_METADATA_DIR`: metadata directory (default `inbox_metadata`)
    /// - `INBOX_MAX_UPLOAD_BYTES`: upload body limit
    /// - `INBOX_TOKENINFO_URL`: token-info endpoint
    /// - `INBOX_REQUIRE_AUTH`: require a token on inbox listing
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Same as [`from_env`](Self::from_env), reading variables through `lookup`.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let mut config = Self::default();

        if let Some(client_id) = lookup("GOOGLE_CLIENT_ID") {
            config.auth.client_id = client_id;
        }
        if let Some(host) = lookup("INBOX_HOST") {
            config.http.host = host
                .parse()
                .map_err(|_| ConfigError::InvalidValue("INBOX_HOST", host))?;
        }
        if let Some(port) = lookup("INBOX_PORT") {
            config.http.port = port
                .parse()
                .map_err(|_| ConfigError::InvalidValue("INBOX_PORT", port))?;
        }
        if let Some(dir) = lookup("INBOX_DIR") {
            config.storage.artifact_dir = dir.into();
        }
        if let Some(dir) = lookup("INBOX_METADATA_DIR") {
            config.storage.metadata_dir = dir.into();
        }
        if let Some(limit) = lookup("INBOX_MAX_UPLOAD_BYTES") {
            config.limits.max_upload_size = limit
                .parse()
                .map_err(|_| ConfigError::InvalidValue("INBOX_MAX_UPLOAD_BYTES", limit))?;
        }
        if let Some(url) = lookup("INBOX_TOKENINFO_URL") {
            config.auth.tokeninfo_url = url;
        }
        if let Some(flag) = lookup("INBOX_REQUIRE_AUTH") {
            config.inbox.require_auth = flag.eq_ignore_ascii_case("true") || flag == "1";
        }

        config.validate()?;
        Ok(config)
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.auth.client_id.trim().is_empty() {
            return Err(ConfigError::MissingClientId);
        }

        if self.http.port == 0 {
            return Err(ConfigError::InvalidValue("http.port", "0".into()));
        }

        if self.limits.max_upload_size == 0 {
            return Err(ConfigError::InvalidLimit(
                "max_upload_size cannot be 0".into(),
            ));
        }

        if self.storage.artifact_dir == self.storage.metadata_dir {
            return Err(ConfigError::SharedStorageDir(self.storage.artifact_dir.clone()));
        }

        if self.auth.request_timeout.is_zero() {
            return Err(ConfigError::InvalidTimeout(
                "identity provider timeout cannot be 0".into(),
            ));
        }

        Ok(())
    }

    /// Get HTTP server bind address
    pub fn http_addr(&self) -> SocketAddr {
        SocketAddr::new(self.http.host, self.http.port)
    }
}

/// HTTP server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct HttpConfig {
    /// Bind address
    pub host: IpAddr,
    /// Port (default: 5000)
    pub port: u16,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            host: IpAddr::V4(Ipv4Addr::new(0, 0, 0, 0)),
            port: 5000,
        }
    }
}

/// Identity provider configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AuthConfig {
    /// OAuth client id tokens must be issued for (`aud` claim)
    pub client_id: String,
    /// Token-info endpoint
    pub tokeninfo_url: String,
    /// Accepted `iss` claims
    pub allowed_issuers: Vec<String>,
    /// Timeout for a single verification call
    #[serde(with = "humantime_serde")]
    pub request_timeout: Duration,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            client_id: String::new(),
            tokeninfo_url: DEFAULT_TOKENINFO_URL.to_string(),
            allowed_issuers: vec![
                "accounts.google.com".to_string(),
                "https://accounts.google.com".to_string(),
            ],
            request_timeout: Duration::from_secs(10),
        }
    }
}

/// Storage directories, created at startup if absent
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// Raw artifact bytes
    pub artifact_dir: PathBuf,
    /// One JSON record per artifact
    pub metadata_dir: PathBuf,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            artifact_dir: PathBuf::from("inbox"),
            metadata_dir: PathBuf::from("inbox_metadata"),
        }
    }
}

/// Request limits configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LimitsConfig {
    /// Max request body size in bytes (default: 16MB)
    pub max_upload_size: usize,
}

impl Default for LimitsConfig {
    fn default() -> Self {
        Self {
            max_upload_size: 16 * 1024 * 1024,
        }
    }
}

/// CORS configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CorsConfig {
    /// Enable CORS
    pub enabled: bool,
    /// Allowed origins ("*" for all)
    pub allowed_origins: Vec<String>,
    /// Allowed methods
    pub allowed_methods: Vec<String>,
    /// Allowed headers
    pub allowed_headers: Vec<String>,
    /// Max age for preflight cache
    pub max_age: u64,
}

impl Default for CorsConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            allowed_origins: vec!["*".to_string()],
            allowed_methods: vec!["GET".to_string(), "POST".to_string(), "OPTIONS".to_string()],
            allowed_headers: vec!["Content-Type".to_string(), "Authorization".to_string()],
            max_age: 86400, // 24 hours
        }
    }
}

/// Inbox listing policy
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct InboxConfig {
    /// Require a bearer token whose email matches the listed inbox.
    /// Off by default: listing is open to any caller.
    pub require_auth: bool,
}

/// Configuration errors
#[derive(Debug, Clone, thiserror::Error)]
pub enum ConfigError {
    #[error("GOOGLE_CLIENT_ID is not set")]
    MissingClientId,
    #[error("invalid value for {0}: {1:?}")]
    InvalidValue(&'static str, String),
    #[error("invalid limit: {0}")]
    InvalidLimit(String),
    #[error("invalid timeout: {0}")]
    InvalidTimeout(String),
    #[error("artifact and metadata directories must differ: {0:?}")]
    SharedStorageDir(PathBuf),
}

/// Duration (de)serialization as `"10s"`, `"500ms"`, `"2m"` or plain seconds.
mod humantime_serde {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        if duration.subsec_millis() == 0 {
            serializer.serialize_str(&format!("{}s", duration.as_secs()))
        } else {
            serializer.serialize_str(&format!("{}ms", duration.as_millis()))
        }
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        parse_duration(&s).map_err(serde::de::Error::custom)
    }

    pub(super) fn parse_duration(s: &str) -> Result<Duration, &'static str> {
        let s = s.trim();
        if let Some(ms) = s.strip_suffix("ms") {
            ms.trim()
                .parse::<u64>()
                .map(Duration::from_millis)
                .map_err(|_| "invalid milliseconds")
        } else if let Some(secs) = s.strip_suffix('s') {
            secs.trim()
                .parse::<u64>()
                .map(Duration::from_secs)
                .map_err(|_| "invalid seconds")
        } else if let Some(mins) = s.strip_suffix('m') {
            mins.trim()
                .parse::<u64>()
                .map(|m| Duration::from_secs(m * 60))
                .map_err(|_| "invalid minutes")
        } else {
            s.parse::<u64>()
                .map(Duration::from_secs)
                .map_err(|_| "invalid duration format")
        }
    }
}
