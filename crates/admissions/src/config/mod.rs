use std::env;
use std::fmt;
use std::net::{IpAddr, SocketAddr};
use std::time::Duration;

const DEFAULT_SESSION_TTL: Duration = Duration::from_secs(7 * 24 * 60 * 60);
const DEFAULT_NUMBER_ATTEMPTS: u32 = 3;
const DEV_ADMIN_EMAIL: &str = "admin@example.com";
const DEV_ADMIN_PASSWORD: &str = "admin123456";
const DEV_JWT_SECRET: &str = "development-only-session-secret";

/// Distinguishes runtime behavior for different stages of the service.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppEnvironment {
    Development,
    Test,
    Production,
}

impl AppEnvironment {
    fn from_str(value: &str) -> Self {
        match value.trim().to_ascii_lowercase().as_str() {
            "prod" | "production" => Self::Production,
            "test" | "ci" => Self::Test,
            _ => Self::Development,
        }
    }

    pub fn is_production(self) -> bool {
        matches!(self, Self::Production)
    }
}

/// Top-level configuration for the application.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub environment: AppEnvironment,
    pub server: ServerConfig,
    pub telemetry: TelemetryConfig,
    pub auth: AuthConfig,
    pub intake: IntakeConfig,
}

impl AppConfig {
    pub fn load() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();

        let environment = AppEnvironment::from_str(
            &env::var("APP_ENV").unwrap_or_else(|_| "development".to_string()),
        );

        let host = env::var("APP_HOST").unwrap_or_else(|_| "127.0.0.1".to_string());
        let port = env::var("APP_PORT")
            .unwrap_or_else(|_| "4000".to_string())
            .parse::<u16>()
            .map_err(|_| ConfigError::InvalidPort)?;

        let log_level = env::var("APP_LOG_LEVEL").unwrap_or_else(|_| "info".to_string());

        let admin_email = secret_or_default(environment, "ADMIN_EMAIL", DEV_ADMIN_EMAIL)?;
        let admin_password = secret_or_default(environment, "ADMIN_PASSWORD", DEV_ADMIN_PASSWORD)?;
        let jwt_secret = secret_or_default(environment, "JWT_SECRET", DEV_JWT_SECRET)?;
        let session_ttl = env::var("JWT_EXPIRES_IN")
            .map(|raw| parse_session_ttl(&raw))
            .unwrap_or(DEFAULT_SESSION_TTL);

        let max_number_attempts = match env::var("APPLICATION_NO_MAX_ATTEMPTS") {
            Ok(raw) => raw
                .trim()
                .parse::<u32>()
                .ok()
                .filter(|attempts| *attempts >= 1)
                .ok_or(ConfigError::InvalidNumberAttempts { value: raw })?,
            Err(_) => DEFAULT_NUMBER_ATTEMPTS,
        };

        Ok(Self {
            environment,
            server: ServerConfig { host, port },
            telemetry: TelemetryConfig { log_level },
            auth: AuthConfig {
                admin_email,
                admin_password,
                jwt_secret,
                session_ttl,
                secure_cookies: environment.is_production(),
            },
            intake: IntakeConfig {
                max_number_attempts,
            },
        })
    }
}

fn secret_or_default(
    environment: AppEnvironment,
    key: &'static str,
    fallback: &str,
) -> Result<String, ConfigError> {
    match env::var(key) {
        Ok(value) if !value.trim().is_empty() => Ok(value),
        _ if environment.is_production() => Err(ConfigError::MissingSecret { key }),
        _ => Ok(fallback.to_string()),
    }
}

/// Parses `7d`, `24h` or `30m` style lifetimes; anything else, including a lifetime too
/// long to represent, yields the seven day default.
pub fn parse_session_ttl(raw: &str) -> Duration {
    let raw = raw.trim();
    let Some(unit) = raw.chars().last() else {
        return DEFAULT_SESSION_TTL;
    };
    let amount = match raw[..raw.len() - unit.len_utf8()].parse::<u64>() {
        Ok(amount) => amount,
        Err(_) => return DEFAULT_SESSION_TTL,
    };

    let unit_secs: u64 = match unit {
        'd' => 24 * 60 * 60,
        'h' => 60 * 60,
        'm' => 60,
        _ => return DEFAULT_SESSION_TTL,
    };
    amount
        .checked_mul(unit_secs)
        .map(Duration::from_secs)
        .unwrap_or(DEFAULT_SESSION_TTL)
}

/// Settings controlling the HTTP server binding.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl ServerConfig {
    pub fn socket_addr(&self) -> Result<SocketAddr, ConfigError> {
        if self.host.eq_ignore_ascii_case("localhost") {
            return Ok(SocketAddr::new(IpAddr::from([127, 0, 0, 1]), self.port));
        }

        let ip: IpAddr = self
            .host
            .parse()
            .map_err(|source| ConfigError::InvalidHost { source })?;

        Ok(SocketAddr::new(ip, self.port))
    }
}

/// Tracing controls.
#[derive(Debug, Clone)]
pub struct TelemetryConfig {
    pub log_level: String,
}

/// Staff credentials and session signing.
#[derive(Clone)]
pub struct AuthConfig {
    pub admin_email: String,
    pub admin_password: String,
    pub jwt_secret: String,
    pub session_ttl: Duration,
    pub secure_cookies: bool,
}

impl fmt::Debug for AuthConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AuthConfig")
            .field("admin_email", &self.admin_email)
            .field("admin_password", &"<redacted>")
            .field("jwt_secret", &"<redacted>")
            .field("session_ttl", &self.session_ttl)
            .field("secure_cookies", &self.secure_cookies)
            .finish()
    }
}

/// Knobs for the submission path.
#[derive(Debug, Clone)]
pub struct IntakeConfig {
    /// Upper bound on insert attempts when allocating an application number.
    pub max_number_attempts: u32,
}

impl Default for IntakeConfig {
    fn default() -> Self {
        Self {
            max_number_attempts: DEFAULT_NUMBER_ATTEMPTS,
        }
    }
}

#[derive(Debug)]
pub enum ConfigError {
    InvalidPort,
    InvalidHost { source: std::net::AddrParseError },
    MissingSecret { key: &'static str },
    InvalidNumberAttempts { value: String },
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::InvalidPort => write!(f, "APP_PORT must be a valid u16"),
            ConfigError::InvalidHost { source } => {
                write!(f, "APP_HOST must be a valid IP address: {source}")
            }
            ConfigError::MissingSecret { key } => {
                write!(f, "{key} must be set when APP_ENV=production")
            }
            ConfigError::InvalidNumberAttempts { value } => write!(
                f,
                "APPLICATION_NO_MAX_ATTEMPTS must be a positive integer (found '{value}')"
            ),
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ConfigError::InvalidHost { source } => Some(source),
            ConfigError::InvalidPort
            | ConfigError::MissingSecret { .. }
            | ConfigError::InvalidNumberAttempts { .. } => None,
        }
    }
}
