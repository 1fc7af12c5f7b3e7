use clap::{Parser, Subcommand, ValueEnum};
use jiff::Timestamp;
use std::fmt::{Display, Formatter};

pub const STORAGE_BACKEND_ENV: &str = "CHOTA_STORAGE_BACKEND";
pub const MYSQL_DSN_ENV: &str = "CHOTA_MYSQL_DSN";
pub const CACHE_BACKEND_ENV: &str = "CHOTA_CACHE_BACKEND";
pub const REDIS_URL_ENV: &str = "CHOTA_REDIS_URL";
pub const CACHE_NAMESPACE_ENV: &str = "CHOTA_CACHE_NAMESPACE";
pub const CACHE_EXPIRATION_ENV: &str = "CHOTA_CACHE_EXPIRATION_SECS";
pub const CACHE_SLIDING_EXPIRATION_ENV: &str = "CHOTA_CACHE_SLIDING_EXPIRATION_SECS";
pub const CACHE_TIMEOUT_ENV: &str = "CHOTA_CACHE_TIMEOUT_MS";
pub const WORKER_ID_ENV: &str = "CHOTA_WORKER_ID";
pub const EPOCH_ENV: &str = "CHOTA_EPOCH";
pub const LOG_FORMAT_ENV: &str = "CHOTA_LOG_FORMAT";

pub const DEFAULT_CACHE_NAMESPACE: &str = "urlshort";
pub const DEFAULT_CACHE_EXPIRATION_SECS: u64 = 24 * 60 * 60;
pub const DEFAULT_CACHE_SLIDING_EXPIRATION_SECS: u64 = 6 * 60 * 60;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum StorageBackendArg {
    #[value(name = "in-memory")]
    InMemory,
    #[value(name = "mysql")]
    Mysql,
}

impl Display for StorageBackendArg {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            StorageBackendArg::InMemory => write!(f, "in-memory"),
            StorageBackendArg::Mysql => write!(f, "mysql"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum CacheBackendArg {
    #[value(name = "in-memory")]
    InMemory,
    #[value(name = "redis")]
    Redis,
}

impl Display for CacheBackendArg {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            CacheBackendArg::InMemory => write!(f, "in-memory"),
            CacheBackendArg::Redis => write!(f, "redis"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum LogFormatArg {
    Text,
    Json,
}

#[derive(Debug, Parser)]
#[command(name = "chota", about = "Shorten URLs and resolve short codes")]
pub struct CLI {
    #[arg(
        long,
        env = STORAGE_BACKEND_ENV,
        value_enum,
        default_value_t = StorageBackendArg::InMemory
    )]
    pub storage: StorageBackendArg,

    #[arg(long, env = MYSQL_DSN_ENV, required_if_eq("storage", "mysql"))]
    pub mysql_dsn: Option<String>,

    #[arg(
        long,
        env = CACHE_BACKEND_ENV,
        value_enum,
        default_value_t = CacheBackendArg::InMemory
    )]
    pub cache: CacheBackendArg,

    #[arg(long, env = REDIS_URL_ENV, required_if_eq("cache", "redis"))]
    pub redis_url: Option<String>,

    #[arg(long, env = CACHE_NAMESPACE_ENV, default_value = DEFAULT_CACHE_NAMESPACE)]
    pub cache_namespace: String,

    /// Absolute lifetime of distributed cache entries, in seconds.
    #[arg(long, env = CACHE_EXPIRATION_ENV, default_value_t = DEFAULT_CACHE_EXPIRATION_SECS)]
    pub cache_expiration_secs: u64,

    /// Idle lifetime of distributed cache entries, in seconds.
    #[arg(
        long,
        env = CACHE_SLIDING_EXPIRATION_ENV,
        default_value_t = DEFAULT_CACHE_SLIDING_EXPIRATION_SECS
    )]
    pub cache_sliding_expiration_secs: u64,

    /// Per-call timeout for the distributed cache, in milliseconds.
    #[arg(long, env = CACHE_TIMEOUT_ENV)]
    pub cache_timeout_ms: Option<u64>,

    /// Snowflake worker id, unique per running process (0-1023).
    #[arg(long, env = WORKER_ID_ENV, default_value_t = 0)]
    pub worker_id: u16,

    /// Snowflake epoch as an RFC 3339 timestamp. Must never change once ids exist.
    #[arg(long, env = EPOCH_ENV)]
    pub epoch: Option<Timestamp>,

    #[arg(long, env = LOG_FORMAT_ENV, value_enum, default_value_t = LogFormatArg::Text)]
    pub log_format: LogFormatArg,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Clone, Subcommand)]
pub enum Command {
    /// Shorten one or more long URLs.
    Shorten {
        #[arg(required = true)]
        urls: Vec<String>,
    },
    /// Resolve a short code and count the click.
    Resolve {
        code: String,
        /// User agent of the click; browsers start with "Mozilla".
        #[arg(long, default_value = "")]
        user_agent: String,
    },
    /// List the most recently created records.
    Recent {
        #[arg(short = 'n', long, default_value_t = 10)]
        limit: usize,
    },
    /// Print the record count and distributed cache statistics.
    Stats,
}
