//! Runtime configuration. Every flag can also be set through the environment.

use clap::Parser;

#[derive(Parser, Clone)]
#[command(name = "coop-api", version, about = "Cooperative backend API server")]
pub struct AppConfig {
    /// Port to bind the HTTP server to.
    #[arg(long, env = "PORT", default_value_t = 8080)]
    pub port: u16,

    /// Shared secret expected in bearer tokens. Unset disables the check.
    #[arg(long, env = "AUTH_SECRET", hide_env_values = true)]
    pub auth_secret: Option<String>,

    /// Postgres connection string. Unset runs in-memory only.
    #[arg(long, env = "DATABASE_URL", hide_env_values = true)]
    pub database_url: Option<String>,

    /// Emit logs as JSON lines.
    #[arg(long, env = "LOG_JSON", default_value_t = false)]
    pub log_json: bool,

    /// Create a demo organization, branch and user at start-up.
    #[arg(long, env = "SEED_DEMO", default_value_t = false)]
    pub seed_demo: bool,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            port: 8080,
            auth_secret: None,
            database_url: None,
            log_json: false,
            seed_demo: false,
        }
    }
}

impl std::fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppConfig")
            .field("port", &self.port)
            .field("auth_secret", &self.auth_secret.as_ref().map(|_| "[REDACTED]"))
            .field("database_url", &self.database_url.as_ref().map(|_| "[REDACTED]"))
            .field("log_json", &self.log_json)
            .field("seed_demo", &self.seed_demo)
            .finish()
    }
}
