use uplink_pipeline::dispatch::DEFAULT_DISPATCH_CONCURRENCY;

use crate::auth::jwt::JwtConfig;

/// Server configuration loaded from environment variables.
///
/// All fields have sensible defaults suitable for local development.
/// In production, override via environment variables.
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
    /// Upper bound on each post-shutdown wait, in seconds (default: `30`).
    pub shutdown_timeout_secs: u64,
    /// JWT token configuration (secret, expiry durations).
    pub jwt: JwtConfig,
    /// Approval pipeline and collaborator settings.
    pub pipeline: PipelineConfig,
}

/// Settings for the approval pipeline and the backends it talks to.
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    /// Maximum number of approved plans transmitted at once.
    pub dispatch_concurrency: usize,
    /// How long the gateway waits for a ground station to answer a frame.
    pub gs_response_timeout_secs: u64,
    /// External compiler endpoint; the passthrough compiler is used when unset.
    pub compiler_url: Option<String>,
    /// Timeout for a single external compiler call.
    pub compiler_timeout_secs: u64,
    /// Directory for the content-addressed artifact store; in-memory when unset.
    pub artifact_dir: Option<String>,
    /// JSON-lines file receiving every audit event; none when unset.
    pub audit_log_path: Option<String>,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            dispatch_concurrency: DEFAULT_DISPATCH_CONCURRENCY,
            gs_response_timeout_secs: 10,
            compiler_url: None,
            compiler_timeout_secs: 30,
            artifact_dir: None,
            audit_log_path: None,
        }
    }
}

impl ServerConfig {
    /// Load configuration from environment variables with defaults.
    ///
    /// | Env Var                | Default                    |
    /// |------------------------|----------------------------|
    /// | `HOST`                 | `0.0.0.0`                  |
    /// | `PORT`                 | `3000`                     |
    /// | `CORS_ORIGINS`         | `http://localhost:5173`    |
    /// | `REQUEST_TIMEOUT_SECS` | `30`                       |
    /// | `SHUTDOWN_TIMEOUT_SECS`| `30`                       |
    ///
    /// See [`PipelineConfig::from_env`] for the pipeline settings.
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

        let shutdown_timeout_secs: u64 = std::env::var("SHUTDOWN_TIMEOUT_SECS")
            .unwrap_or_else(|_| "30".into())
            .parse()
            .expect("SHUTDOWN_TIMEOUT_SECS must be a valid u64");

        let jwt = JwtConfig::from_env();
        let pipeline = PipelineConfig::from_env();

        Self {
            host,
            port,
            cors_origins,
            request_timeout_secs,
            shutdown_timeout_secs,
            jwt,
            pipeline,
        }
    }
}

impl PipelineConfig {
    /// Load pipeline settings from environment variables.
    ///
    /// | Env Var                    | Default                         |
    /// |----------------------------|---------------------------------|
    /// | `DISPATCH_CONCURRENCY`     | `4`                             |
    /// | `GS_RESPONSE_TIMEOUT_SECS` | `10`                            |
    /// | `COMPILER_URL`             | unset (passthrough compiler)    |
    /// | `COMPILER_TIMEOUT_SECS`    | `30`                            |
    /// | `ARTIFACT_DIR`             | unset (in-memory store)         |
    /// | `AUDIT_LOG_PATH`           | unset (no audit file)           |
    pub fn from_env() -> Self {
        let defaults = Self::default();

        let dispatch_concurrency: usize = std::env::var("DISPATCH_CONCURRENCY")
            .map(|v| v.parse().expect("DISPATCH_CONCURRENCY must be a valid usize"))
            .unwrap_or(defaults.dispatch_concurrency);

        let gs_response_timeout_secs: u64 = std::env::var("GS_RESPONSE_TIMEOUT_SECS")
            .map(|v| v.parse().expect("GS_RESPONSE_TIMEOUT_SECS must be a valid u64"))
            .unwrap_or(defaults.gs_response_timeout_secs);

        let compiler_timeout_secs: u64 = std::env::var("COMPILER_TIMEOUT_SECS")
            .map(|v| v.parse().expect("COMPILER_TIMEOUT_SECS must be a valid u64"))
            .unwrap_or(defaults.compiler_timeout_secs);

        Self {
            dispatch_concurrency,
            gs_response_timeout_secs,
            compiler_url: non_empty_var("COMPILER_URL"),
            compiler_timeout_secs,
            artifact_dir: non_empty_var("ARTIFACT_DIR"),
            audit_log_path: non_empty_var("AUDIT_LOG_PATH"),
        }
    }
}

fn non_empty_var(name: &str) -> Option<String> {
    std::env::var(name)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}
