use std::time::Duration;

use clap::Parser;

use crate::sql::PoolOptions;

/// Local development database, created next to the process if missing.
pub const DEFAULT_DATABASE_URL: &str = "relay.db";

#[derive(Parser, Debug, Clone)]
#[command(version, about, long_about = None)]
pub struct Config {
    #[arg(
        long,
        env = "DATABASE_URL",
        default_value = DEFAULT_DATABASE_URL,
        help = "SQLite database path or file: URI"
    )]
    pub database_url: String,

    #[arg(long, env = "HOST", default_value = "0.0.0.0")]
    pub host: String,

    #[arg(short, long, env = "PORT", default_value_t = 8080)]
    pub port: u16,

    #[arg(
        long,
        env = "BUSY_TIMEOUT_MS",
        default_value_t = 3000,
        help = "How long a connection waits on a locked database"
    )]
    pub busy_timeout_ms: u64,

    #[arg(
        long,
        env = "MAX_CONNECTIONS",
        default_value_t = 8,
        value_parser = clap::value_parser!(u32).range(1..)
    )]
    pub max_connections: u32,

    #[arg(
        long,
        env = "ACQUIRE_TIMEOUT_MS",
        default_value_t = 10_000,
        help = "How long a request waits for a pooled connection"
    )]
    pub acquire_timeout_ms: u64,
}

impl Config {
    pub fn pool_options(&self) -> PoolOptions {
        PoolOptions {
            max_connections: self.max_connections,
            acquire_timeout: Duration::from_millis(self.acquire_timeout_ms),
            busy_timeout: Duration::from_millis(self.busy_timeout_ms),
        }
    }
}
