use clap::{Args, Parser, ValueEnum};

#[derive(Clone, Debug, Parser)]
#[command(version, about, long_about = None)]
pub struct Config {
    #[command(flatten)]
    pub server: ServerConfig,

    #[command(flatten)]
    pub database: DatabaseConfig,

    #[command(flatten)]
    pub consolidation: ConsolidationConfig,

    #[command(flatten)]
    pub health: HealthConfig,

    #[command(flatten)]
    pub telemetry: TelemetryConfig,
}

#[derive(Clone, Debug, Args)]
pub struct ServerConfig {
    /// Host to listen on
    #[arg(long, env = "CONSOLIDATION_HOST", default_value = "0.0.0.0")]
    pub host: String,

    /// Port for the public API
    #[arg(long, env = "CONSOLIDATION_PORT", default_value_t = 3000)]
    pub port: u16,

    /// Port for the management (health) API
    #[arg(long, env = "CONSOLIDATION_MGMT_PORT", default_value_t = 9090)]
    pub mgmt_port: u16,

    /// Upper bound on a single request's runtime
    #[arg(long, env = "CONSOLIDATION_REQUEST_TIMEOUT_SECS", default_value_t = 30)]
    pub request_timeout_secs: u64,

    /// How long to wait for in-flight requests during shutdown
    #[arg(long, env = "CONSOLIDATION_SHUTDOWN_TIMEOUT_SECS", default_value_t = 10)]
    pub shutdown_timeout_secs: u64,
}

#[derive(Clone, Debug, Args)]
pub struct DatabaseConfig {
    /// Database connection URL. When unset, an in-memory document store is used.
    #[arg(long = "database-url", env = "CONSOLIDATION_DATABASE_URL")]
    pub url: Option<String>,

    #[arg(long, env = "CONSOLIDATION_DB_MAX_CONNECTIONS", default_value_t = 20)]
    pub max_connections: u32,

    #[arg(long, env = "CONSOLIDATION_DB_MIN_CONNECTIONS", default_value_t = 1)]
    pub min_connections: u32,

    #[arg(long, env = "CONSOLIDATION_DB_ACQUIRE_TIMEOUT_SECS", default_value_t = 5)]
    pub acquire_timeout_secs: u64,

    #[arg(long, env = "CONSOLIDATION_DB_IDLE_TIMEOUT_SECS", default_value_t = 600)]
    pub idle_timeout_secs: u64,

    #[arg(long, env = "CONSOLIDATION_DB_MAX_LIFETIME_SECS", default_value_t = 1800)]
    pub max_lifetime_secs: u64,
}

/// What happens to the messages of a conversation removed as a duplicate.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, ValueEnum)]
pub enum OrphanedMessagePolicy {
    /// Leave messages pointing at the deleted conversation.
    #[default]
    Retain,
    /// Move messages onto the surviving conversation before deleting the duplicate.
    Reassign,
}

#[derive(Clone, Debug, Args)]
pub struct ConsolidationConfig {
    /// Default handling of messages that belong to a removed duplicate conversation
    #[arg(long, env = "CONSOLIDATION_ORPHANED_MESSAGES", value_enum, default_value_t = OrphanedMessagePolicy::Retain)]
    pub orphaned_messages: OrphanedMessagePolicy,
}

#[derive(Clone, Debug, Args)]
pub struct HealthConfig {
    /// Timeout for the document store readiness check
    #[arg(long, env = "CONSOLIDATION_HEALTH_STORE_TIMEOUT_MS", default_value_t = 2000)]
    pub store_timeout_ms: u64,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, ValueEnum)]
pub enum LogFormat {
    #[default]
    Text,
    Json,
}

#[derive(Clone, Debug, Args)]
pub struct TelemetryConfig {
    /// Log output format
    #[arg(long, env = "CONSOLIDATION_LOG_FORMAT", value_enum, default_value_t = LogFormat::Text)]
    pub log_format: LogFormat,

    /// Default log filter, overridden by RUST_LOG
    #[arg(long, env = "CONSOLIDATION_LOG_LEVEL", default_value = "info")]
    pub log_level: String,

    /// OTLP collector endpoint; traces and metrics are exported only when set
    #[arg(long, env = "CONSOLIDATION_OTLP_ENDPOINT")]
    pub otlp_endpoint: Option<String>,
}

impl Config {
    #[must_use]
    pub fn load() -> Self {
        Self::parse()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = Config::try_parse_from(["consolidation-server"]).unwrap();
        assert_eq!(config.server.port, 3000);
        assert_eq!(config.consolidation.orphaned_messages, OrphanedMessagePolicy::Retain);
        assert_eq!(config.telemetry.log_format, LogFormat::Text);
    }

    #[test]
    fn test_orphaned_messages_flag() {
        let config =
            Config::try_parse_from(["consolidation-server", "--orphaned-messages", "reassign"]).unwrap();
        assert_eq!(config.consolidation.orphaned_messages, OrphanedMessagePolicy::Reassign);
    }
}
