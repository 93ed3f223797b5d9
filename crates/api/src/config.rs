use crate::auth::jwt::JwtConfig;

/// Default user session lifetime in minutes (12 hours).
const DEFAULT_SESSION_EXPIRY_MINS: i64 = 720;

/// Paths the request gate leaves open when no explicit policy matches.
const DEFAULT_PUBLIC_PATHS: &str = "/health,/api/v1/auth/login,/api/v1/auth/refresh";

/// Server configuration loaded from environment variables.
///
/// All fields except the JWT secrets have sensible defaults suitable for
/// local development. In production, override via environment variables.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Bind address (default: `0.0.0.0`).
    pub host: String,
    /// Bind port (default: `3000`).
    pub port: u16,
    /// Allowed CORS origins, parsed from comma-separated `CORS_ORIGINS` env var.
    pub cors_origins: Vec<String>,
    /// HTTP request timeout in seconds (default: `30`).
    pub request_timeout_secs: u64,
    /// User session lifetime in minutes (default: `720`).
    pub session_expiry_mins: i64,
    /// Request paths open to unauthenticated callers.
    pub public_paths: Vec<String>,
    /// JWT token configuration (secrets, issuer, expiry durations).
    pub jwt: JwtConfig,
}

impl ServerConfig {
    /// Load configuration from environment variables with defaults.
    ///
    /// | Env Var                | Default                                         |
    /// |------------------------|-------------------------------------------------|
    /// | `HOST`                 | `0.0.0.0`                                       |
    /// | `PORT`                 | `3000`                                          |
    /// | `CORS_ORIGINS`         | `http://localhost:5173`                         |
    /// | `REQUEST_TIMEOUT_SECS` | `30`                                            |
    /// | `SESSION_EXPIRY_MINS`  | `720`                                           |
    /// | `PUBLIC_PATHS`         | `/health,/api/v1/auth/login,/api/v1/auth/refresh` |
    ///
    /// JWT variables are documented on [`JwtConfig::from_env`]; the two
    /// secrets are required and have no defaults.
    pub fn from_env() -> Self {
        let host = std::env::var("HOST").unwrap_or_else(|_| "0.0.0.0".into());

        let port: u16 = std::env::var("PORT")
            .unwrap_or_else(|_| "3000".into())
            .parse()
            .expect("PORT must be a valid u16");

        let cors_origins: Vec<String> = std::env::var("CORS_ORIGINS")
            .unwrap_or_else(|_| "http://localhost:5173".into())
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();

        let request_timeout_secs: u64 = std::env::var("REQUEST_TIMEOUT_SECS")
            .unwrap_or_else(|_| "30".into())
            .parse()
            .expect("REQUEST_TIMEOUT_SECS must be a valid u64");

        let session_expiry_mins: i64 = std::env::var("SESSION_EXPIRY_MINS")
            .unwrap_or_else(|_| DEFAULT_SESSION_EXPIRY_MINS.to_string())
            .parse()
            .expect("SESSION_EXPIRY_MINS must be a valid i64");

        let public_paths: Vec<String> = std::env::var("PUBLIC_PATHS")
            .unwrap_or_else(|_| DEFAULT_PUBLIC_PATHS.into())
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();

        let jwt = JwtConfig::from_env();

        Self {
            host,
            port,
            cors_origins,
            request_timeout_secs,
            session_expiry_mins,
            public_paths,
            jwt,
        }
    }
}
