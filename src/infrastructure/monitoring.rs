//! Monitoring configuration and tracing initialisation.
//!
//! Process-start plumbing: read a static monitoring configuration (DSN,
//! sample rate, environment, release, debug flag) and install a
//! `tracing-subscriber` formatter once. Shipping telemetry to the DSN is left
//! to whatever SDK consumes the configuration.

use serde::{Deserialize, Serialize};
use tracing::info;
use tracing_subscriber::EnvFilter;

/// Environment variable holding the monitoring DSN.
pub const ENV_DSN: &str = "PACEKEEPER_DSN";
/// Environment variable holding the deployment environment name.
pub const ENV_ENVIRONMENT: &str = "PACEKEEPER_ENV";
/// Environment variable holding the release identifier.
pub const ENV_RELEASE: &str = "PACEKEEPER_RELEASE";
/// Environment variable overriding the traces sample rate.
pub const ENV_SAMPLE_RATE: &str = "PACEKEEPER_SAMPLE_RATE";

/// Deployment environment.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Environment {
    /// Local development (debug output on, every trace sampled)
    #[default]
    Development,
    /// Production (sampled traces)
    Production,
    /// Automated tests
    Test,
    /// Any other named environment
    Other(String),
}

impl Environment {
    /// Sample rate used when none is configured explicitly.
    pub fn default_sample_rate(&self) -> f64 {
        match self {
            Environment::Production => 0.1,
            _ => 1.0,
        }
    }

    /// The environment name.
    pub fn as_str(&self) -> &str {
        match self {
            Environment::Development => "development",
            Environment::Production => "production",
            Environment::Test => "test",
            Environment::Other(name) => name,
        }
    }
}

impl From<String> for Environment {
    fn from(name: String) -> Self {
        match name.trim() {
            "development" => Environment::Development,
            "production" => Environment::Production,
            "test" => Environment::Test,
            other => Environment::Other(other.to_string()),
        }
    }
}

impl From<Environment> for String {
    fn from(environment: Environment) -> Self {
        environment.as_str().to_string()
    }
}

impl std::fmt::Display for Environment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when monitoring configuration is invalid.
#[derive(Debug, Clone, PartialEq)]
pub enum ConfigError {
    /// Sample rate must be within `0.0..=1.0`
    InvalidSampleRate(f64),
    /// A variable could not be parsed
    Parse {
        /// Variable name
        key: &'static str,
        /// Raw value
        value: String,
    },
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::InvalidSampleRate(rate) => {
                write!(f, "sample rate must be between 0.0 and 1.0 (got {})", rate)
            }
            ConfigError::Parse { key, value } => {
                write!(f, "could not parse {}={:?}", key, value)
            }
        }
    }
}

impl std::error::Error for ConfigError {}

/// Error returned when installing the tracing subscriber fails.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InitError {
    /// A global subscriber is already installed
    AlreadyInitialized,
    /// The log filter directive was rejected
    Filter(String),
}

impl std::fmt::Display for InitError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            InitError::AlreadyInitialized => write!(f, "tracing is already initialised"),
            InitError::Filter(e) => write!(f, "invalid log filter: {}", e),
        }
    }
}

impl std::error::Error for InitError {}

/// Static monitoring configuration consumed once at process start.
///
/// Deserialized documents follow the same rules as [`from_lookup`]: missing
/// fields take the defaults of the named environment and the result is
/// validated.
///
/// [`from_lookup`]: MonitoringConfig::from_lookup
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawMonitoringConfig")]
pub struct MonitoringConfig {
    /// Where telemetry is sent, if anywhere
    pub dsn: Option<String>,
    /// Fraction of traces to sample (0.0 to 1.0)
    pub traces_sample_rate: f64,
    /// Deployment environment
    pub environment: Environment,
    /// Release identifier
    pub release: Option<String>,
    /// Verbose diagnostics
    pub debug: bool,
}

/// A configuration document before environment defaults are applied.
#[derive(Deserialize)]
struct RawMonitoringConfig {
    dsn: Option<String>,
    traces_sample_rate: Option<f64>,
    environment: Option<Environment>,
    release: Option<String>,
    debug: Option<bool>,
}

impl TryFrom<RawMonitoringConfig> for MonitoringConfig {
    type Error = ConfigError;

    fn try_from(raw: RawMonitoringConfig) -> Result<Self, Self::Error> {
        let mut config = Self::for_environment(raw.environment.unwrap_or_default());
        config.dsn = raw.dsn;
        config.release = raw.release;
        if let Some(rate) = raw.traces_sample_rate {
            config.traces_sample_rate = rate;
        }
        if let Some(debug) = raw.debug {
            config.debug = debug;
        }

        config.validate()?;
        Ok(config)
    }
}

impl Default for MonitoringConfig {
    fn default() -> Self {
        Self::for_environment(Environment::Development)
    }
}

impl MonitoringConfig {
    /// Defaults for `environment`: sampled at its default rate, debug only in development.
    pub fn for_environment(environment: Environment) -> Self {
        Self {
            dsn: None,
            traces_sample_rate: environment.default_sample_rate(),
            debug: environment == Environment::Development,
            release: None,
            environment,
        }
    }

    /// Read the configuration from the process environment.
    ///
    /// # Errors
    /// Returns `ConfigError` if a variable is malformed or out of range.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Read the configuration through `lookup`.
    ///
    /// Unset or empty variables fall back to the environment's defaults; an
    /// unset environment means development.
    ///
    /// # Errors
    /// Returns `ConfigError` if a variable is malformed or out of range.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let non_empty = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let environment = non_empty(ENV_ENVIRONMENT)
            .map(Environment::from)
            .unwrap_or_default();
        let mut config = Self::for_environment(environment);

        config.dsn = non_empty(ENV_DSN);
        config.release = non_empty(ENV_RELEASE);
        if let Some(raw) = non_empty(ENV_SAMPLE_RATE) {
            config.traces_sample_rate =
                raw.trim().parse().map_err(|_| ConfigError::Parse {
                    key: ENV_SAMPLE_RATE,
                    value: raw.clone(),
                })?;
        }

        config.validate()?;
        Ok(config)
    }

    /// Check the configuration.
    ///
    /// # Errors
    /// Returns `ConfigError::InvalidSampleRate` if the sample rate is outside
    /// `0.0..=1.0` or not a number.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(0.0..=1.0).contains(&self.traces_sample_rate) {
            return Err(ConfigError::InvalidSampleRate(self.traces_sample_rate));
        }
        Ok(())
    }

    /// Filter directive used when `RUST_LOG` is not set.
    pub fn default_directive(&self) -> &'static str {
        if self.debug {
            "debug"
        } else {
            "info"
        }
    }
}

/// Install the global `tracing` subscriber for `config`.
///
/// Honors `RUST_LOG` when set; otherwise logs at `debug` with `config.debug`
/// and at `info` without it.
///
/// # Errors
/// Returns `InitError::AlreadyInitialized` if a global subscriber exists.
pub fn init_tracing(config: &MonitoringConfig) -> Result<(), InitError> {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(config.default_directive()))
        .map_err(|e| InitError::Filter(e.to_string()))?;

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .try_init()
        .map_err(|_| InitError::AlreadyInitialized)?;

    info!(
        environment = %config.environment,
        release = config.release.as_deref().unwrap_or("unknown"),
        traces_sample_rate = config.traces_sample_rate,
        dsn_configured = config.dsn.is_some(),
        "monitoring initialised"
    );
    Ok(())
}
