//! Type-Safe Configuration with Validation
//!
//! Loaded once at startup from environment variables (optionally seeded from
//! a `.env` file). Any error here is fatal.

use std::env;
use std::time::Duration;

use rust_common::{HttpConfig, LogFormat, TracingConfig};
use secrecy::{ExposeSecret, SecretString};
use thiserror::Error;
use url::Url;

use crate::credentials::{CredentialStoreError, Principal, Role, StaticCredentialStore};
use crate::http::proxy::Upstream;
use crate::jwt::DEFAULT_TOKEN_TTL_SECONDS;
use crate::middleware::CallerKeySource;
use crate::rate_limiter::RateLimitConfig;

/// Shortest accepted signing secret, in bytes.
pub const MIN_SECRET_BYTES: usize = 32;

const SERVICE_NAME: &str = "api-gateway";

/// Configuration errors.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Invalid URL format
    #[error("Invalid URL for {field}: {reason}")]
    InvalidUrl {
        /// Variable holding the URL
        field: String,
        /// Parser message
        reason: String,
    },

    /// Invalid port number
    #[error("Invalid port: must be between 1 and 65535")]
    InvalidPort,

    /// Invalid TTL value
    #[error("Invalid TTL: must be greater than 0")]
    InvalidTtl,

    /// Signing secret too short
    #[error("JWT_SECRET_KEY must be at least {min} bytes")]
    WeakSecret {
        /// Required length
        min: usize,
    },

    /// No principal has a password configured
    #[error("No principals configured: set ADMIN_PASSWORD and/or USER_PASSWORD")]
    NoPrincipals,

    /// Zero rate limit, window or timeout
    #[error("Invalid value for {0}: must be greater than 0")]
    NotPositive(&'static str),

    /// Whole-request deadline would fire before the upstream one
    #[error("REQUEST_TIMEOUT ({request}s) must exceed UPSTREAM_TIMEOUT ({upstream}s)")]
    TimeoutOrder {
        /// Whole-request timeout, seconds
        request: u64,
        /// Proxied call timeout, seconds
        upstream: u64,
    },

    /// Missing required field
    #[error("Missing required configuration: {0}")]
    MissingRequired(String),

    /// Environment variable parse error
    #[error("Failed to parse environment variable {name}: {reason}")]
    ParseError {
        /// Variable name
        name: String,
        /// Parser message
        reason: String,
    },
}

/// A principal declared in configuration.
#[derive(Debug, Clone)]
pub struct PrincipalConfig {
    /// Login identity
    pub username: String,
    /// Numeric id carried in tokens
    pub user_id: u64,
    /// Role granted at login
    pub role: Role,
    /// Plaintext until the credential store digests it
    pub password: SecretString,
}

impl PrincipalConfig {
    fn to_principal(&self) -> Principal {
        Principal::new(self.username.clone(), self.user_id, self.role, &self.password)
    }
}

/// Base URLs of the internal collaborators.
#[derive(Debug, Clone)]
pub struct ServiceUrls {
    /// `ASSETS_SERVICE_URL`
    pub assets: Url,
    /// `FILES_SERVICE_URL`
    pub files: Url,
    /// `TRANSCODE_SERVICE_URL`
    pub transcode: Url,
    /// `SEARCH_SERVICE_URL`
    pub search: Url,
}

impl ServiceUrls {
    /// Base URL for `upstream`.
    pub const fn get(&self, upstream: Upstream) -> &Url {
        match upstream {
            Upstream::Assets => &self.assets,
            Upstream::Files => &self.files,
            Upstream::Transcode => &self.transcode,
            Upstream::Search => &self.search,
        }
    }
}

/// Service configuration with validation.
#[derive(Debug, Clone)]
pub struct Config {
    /// Server host address
    pub host: String,
    /// Server port (1-65535)
    pub port: u16,
    /// HS256 signing secret
    pub jwt_secret: SecretString,
    /// Token lifetime in seconds
    pub token_ttl_seconds: i64,
    /// Known principals
    pub principals: Vec<PrincipalConfig>,
    /// Collaborator base URLs
    pub services: ServiceUrls,
    /// Per-route budgets and window
    pub rate_limits: RateLimitConfig,
    /// Key callers by the first X-Forwarded-For hop
    pub trust_forwarded_for: bool,
    /// Whole-request timeout in seconds
    pub request_timeout_secs: u64,
    /// Proxied call timeout in seconds
    pub upstream_timeout_secs: u64,
    /// Per-collaborator health probe timeout in seconds
    pub health_check_timeout_secs: u64,
    /// Request body cap in bytes
    pub max_body_bytes: usize,
    /// Graceful shutdown timeout in seconds
    pub shutdown_timeout_seconds: u64,
    /// Default log filter
    pub log_level: String,
    /// Log output format
    pub log_format: LogFormat,
}

impl Config {
    /// Configuration with defaults for everything but secrets, principals and
    /// collaborator URLs.
    pub fn new(jwt_secret: SecretString, principals: Vec<PrincipalConfig>, services: ServiceUrls) -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8000,
            jwt_secret,
            token_ttl_seconds: DEFAULT_TOKEN_TTL_SECONDS,
            principals,
            services,
            rate_limits: RateLimitConfig::default(),
            trust_forwarded_for: false,
            request_timeout_secs: 35,
            upstream_timeout_secs: 30,
            health_check_timeout_secs: 5,
            max_body_bytes: 100 * 1024 * 1024,
            shutdown_timeout_seconds: 30,
            log_level: "info".to_string(),
            log_format: LogFormat::Json,
        }
    }

    /// Loads configuration from environment variables with validation.
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();

        let jwt_secret = env::var("JWT_SECRET_KEY")
            .map(SecretString::from)
            .map_err(|_| ConfigError::MissingRequired("JWT_SECRET_KEY".to_string()))?;

        let services = ServiceUrls {
            assets: parse_url_env("ASSETS_SERVICE_URL", "http://localhost:8001")?,
            files: parse_url_env("FILES_SERVICE_URL", "http://localhost:8002")?,
            transcode: parse_url_env("TRANSCODE_SERVICE_URL", "http://localhost:8003")?,
            search: parse_url_env("SEARCH_SERVICE_URL", "http://localhost:8004")?,
        };

        let defaults = RateLimitConfig::default();
        let rate_limits = RateLimitConfig {
            login: parse_env("RATE_LIMIT_LOGIN", defaults.login)?,
            verify: parse_env("RATE_LIMIT_VERIFY", defaults.verify)?,
            me: parse_env("RATE_LIMIT_ME", defaults.me)?,
            assets: parse_env("RATE_LIMIT_ASSETS", defaults.assets)?,
            files: parse_env("RATE_LIMIT_FILES", defaults.files)?,
            transcode: parse_env("RATE_LIMIT_TRANSCODE", defaults.transcode)?,
            search: parse_env("RATE_LIMIT_SEARCH", defaults.search)?,
            status: parse_env("RATE_LIMIT_STATUS", defaults.status)?,
            window: Duration::from_secs(parse_env("RATE_LIMIT_WINDOW_SECS", defaults.window.as_secs())?),
            max_tracked_keys: parse_env("RATE_LIMIT_MAX_KEYS", defaults.max_tracked_keys)?,
        };

        let mut config = Self::new(jwt_secret, principals_from_env(), services);
        config.host = env::var("HOST").unwrap_or_else(|_| config.host.clone());
        config.port = parse_env("PORT", config.port)?;
        config.token_ttl_seconds = parse_env("TOKEN_TTL_SECONDS", config.token_ttl_seconds)?;
        config.rate_limits = rate_limits;
        config.trust_forwarded_for = parse_env("TRUST_FORWARDED_FOR", config.trust_forwarded_for)?;
        config.request_timeout_secs = parse_env("REQUEST_TIMEOUT", config.request_timeout_secs)?;
        config.upstream_timeout_secs = parse_env("UPSTREAM_TIMEOUT", config.upstream_timeout_secs)?;
        config.health_check_timeout_secs =
            parse_env("HEALTH_CHECK_TIMEOUT", config.health_check_timeout_secs)?;
        config.max_body_bytes = parse_env("MAX_BODY_BYTES", config.max_body_bytes)?;
        config.shutdown_timeout_seconds = parse_env("SHUTDOWN_TIMEOUT", config.shutdown_timeout_seconds)?;
        config.log_level = env::var("LOG_LEVEL").unwrap_or_else(|_| config.log_level.clone());
        config.log_format = parse_env("LOG_FORMAT", config.log_format)?;

        config.validate()?;
        Ok(config)
    }

    /// Validates the configuration.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.port == 0 {
            return Err(ConfigError::InvalidPort);
        }
        if self.jwt_secret.expose_secret().len() < MIN_SECRET_BYTES {
            return Err(ConfigError::WeakSecret { min: MIN_SECRET_BYTES });
        }
        if self.token_ttl_seconds <= 0 {
            return Err(ConfigError::InvalidTtl);
        }
        if self.principals.is_empty() {
            return Err(ConfigError::NoPrincipals);
        }

        let limits = &self.rate_limits;
        let positive = [
            ("RATE_LIMIT_LOGIN", u64::from(limits.login)),
            ("RATE_LIMIT_VERIFY", u64::from(limits.verify)),
            ("RATE_LIMIT_ME", u64::from(limits.me)),
            ("RATE_LIMIT_ASSETS", u64::from(limits.assets)),
            ("RATE_LIMIT_FILES", u64::from(limits.files)),
            ("RATE_LIMIT_TRANSCODE", u64::from(limits.transcode)),
            ("RATE_LIMIT_SEARCH", u64::from(limits.search)),
            ("RATE_LIMIT_STATUS", u64::from(limits.status)),
            ("RATE_LIMIT_WINDOW_SECS", limits.window.as_secs()),
            ("REQUEST_TIMEOUT", self.request_timeout_secs),
            ("UPSTREAM_TIMEOUT", self.upstream_timeout_secs),
            ("HEALTH_CHECK_TIMEOUT", self.health_check_timeout_secs),
        ];
        if let Some((name, _)) = positive.iter().find(|(_, value)| *value == 0) {
            return Err(ConfigError::NotPositive(*name));
        }
        if limits.max_tracked_keys == 0 {
            return Err(ConfigError::NotPositive("RATE_LIMIT_MAX_KEYS"));
        }
        if self.max_body_bytes == 0 {
            return Err(ConfigError::NotPositive("MAX_BODY_BYTES"));
        }
        if self.request_timeout_secs <= self.upstream_timeout_secs {
            return Err(ConfigError::TimeoutOrder {
                request: self.request_timeout_secs,
                upstream: self.upstream_timeout_secs,
            });
        }
        Ok(())
    }

    /// `host:port` to bind.
    #[must_use]
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Build the credential store from the configured principals.
    pub fn credential_store(&self) -> Result<StaticCredentialStore, CredentialStoreError> {
        StaticCredentialStore::new(self.principals.iter().map(PrincipalConfig::to_principal).collect())
    }

    /// Caller key source for rate limiting.
    #[must_use]
    pub const fn caller_key_source(&self) -> CallerKeySource {
        if self.trust_forwarded_for {
            CallerKeySource::ForwardedFor
        } else {
            CallerKeySource::PeerAddr
        }
    }

    /// Outbound client settings for proxied calls.
    #[must_use]
    pub fn http_config(&self) -> HttpConfig {
        HttpConfig::default().with_timeout(Duration::from_secs(self.upstream_timeout_secs))
    }

    /// Subscriber settings.
    #[must_use]
    pub fn tracing_config(&self) -> TracingConfig {
        TracingConfig::default()
            .with_service_name(SERVICE_NAME)
            .with_log_level(&self.log_level)
            .with_format(self.log_format)
    }

    /// Whole-request deadline.
    #[must_use]
    pub const fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    /// Per-collaborator probe deadline.
    #[must_use]
    pub const fn health_check_timeout(&self) -> Duration {
        Duration::from_secs(self.health_check_timeout_secs)
    }

    /// Drain budget after a shutdown signal.
    #[must_use]
    pub const fn shutdown_timeout(&self) -> Duration {
        Duration::from_secs(self.shutdown_timeout_seconds)
    }
}

/// Principals whose password variable is set.
fn principals_from_env() -> Vec<PrincipalConfig> {
    [
        ("ADMIN_USERNAME", "admin", "ADMIN_PASSWORD", 1, Role::Admin),
        ("USER_USERNAME", "user", "USER_PASSWORD", 2, Role::User),
    ]
    .into_iter()
    .filter_map(|(name_var, default_name, password_var, user_id, role)| {
        let password = env::var(password_var).ok().filter(|p| !p.is_empty())?;
        Some(PrincipalConfig {
            username: env::var(name_var).unwrap_or_else(|_| default_name.to_string()),
            user_id,
            role,
            password: SecretString::from(password),
        })
    })
    .collect()
}

/// Parse an environment variable with a default value.
fn parse_env<T: std::str::FromStr>(name: &str, default: T) -> Result<T, ConfigError>
where
    T::Err: std::fmt::Display,
{
    match env::var(name) {
        Ok(val) => val.parse().map_err(|e: T::Err| ConfigError::ParseError {
            name: name.to_string(),
            reason: e.to_string(),
        }),
        Err(_) => Ok(default),
    }
}

/// Parse a URL environment variable with a default value.
fn parse_url_env(name: &str, default: &str) -> Result<Url, ConfigError> {
    let url_str = env::var(name).unwrap_or_else(|_| default.to_string());
    Url::parse(&url_str).map_err(|e| ConfigError::InvalidUrl {
        field: name.to_string(),
        reason: e.to_string(),
    })
}
