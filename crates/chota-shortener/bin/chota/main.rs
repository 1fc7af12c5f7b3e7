mod cli;

use crate::cli::{CacheBackendArg, Command, LogFormatArg, StorageBackendArg, CLI};
use anyhow::{anyhow, Context};
use chota_cache::{DistributedCacheOptions, KeyValueCache, MemoryKeyValueCache, RedisKeyValueCache};
use chota_shortener::{ClickSource, ShortenerService};
use chota_snowflake::{Snowflake, SnowflakeSettings, DEFAULT_EPOCH};
use chota_storage::{DurableRepository, InMemoryRepository, MySqlRepository, TieredRepository};
use clap::Parser;
use serde_json::json;
use std::time::Duration;
use tracing::info;
use tracing_subscriber::filter::LevelFilter;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = CLI::parse();
    init_tracing(config.log_format)?;

    info!(
        storage_backend = %config.storage,
        cache_backend = %config.cache,
        worker_id = config.worker_id,
        "starting chota"
    );

    match config.storage {
        StorageBackendArg::InMemory => with_cache(config, InMemoryRepository::new()).await,
        StorageBackendArg::Mysql => {
            let dsn = config
                .mysql_dsn
                .as_deref()
                .context("mysql dsn is required when storage backend is mysql")?;
            let repository = MySqlRepository::connect(dsn)
                .await
                .context("failed to connect to mysql")?;
            with_cache(config, repository).await
        }
    }
}

/// Logs go to stderr so stdout carries only command output.
fn init_tracing(format: LogFormatArg) -> anyhow::Result<()> {
    let filter = EnvFilter::builder()
        .with_default_directive(LevelFilter::WARN.into())
        .from_env()?;
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr);

    match format {
        LogFormatArg::Text => builder.try_init(),
        LogFormatArg::Json => builder.json().try_init(),
    }
    .map_err(|e| anyhow!(e))
}

async fn with_cache<R: DurableRepository>(config: CLI, durable: R) -> anyhow::Result<()> {
    match config.cache {
        CacheBackendArg::InMemory => run(config, durable, MemoryKeyValueCache::new()).await,
        CacheBackendArg::Redis => {
            let url = config
                .redis_url
                .as_deref()
                .context("redis url is required when cache backend is redis")?;
            let client = RedisKeyValueCache::connect(url)
                .await
                .context("failed to connect to redis")?;
            run(config, durable, client).await
        }
    }
}

fn cache_options(config: &CLI) -> DistributedCacheOptions {
    let options = DistributedCacheOptions::builder()
        .namespace(config.cache_namespace.clone())
        .default_expiration(Duration::from_secs(config.cache_expiration_secs))
        .sliding_expiration(Duration::from_secs(config.cache_sliding_expiration_secs));
    match config.cache_timeout_ms {
        Some(ms) => options.operation_timeout(Duration::from_millis(ms)).build(),
        None => options.build(),
    }
}

async fn run<R: DurableRepository, K: KeyValueCache>(
    config: CLI,
    durable: R,
    client: K,
) -> anyhow::Result<()> {
    let repository = TieredRepository::new(durable, client, cache_options(&config));
    let settings = SnowflakeSettings::builder()
        .worker_id(config.worker_id)
        .epoch(config.epoch.unwrap_or(DEFAULT_EPOCH))
        .build();
    let generator = Snowflake::new(settings).context("invalid id generator settings")?;
    let service = ShortenerService::new(repository, generator);

    match config.command {
        Command::Shorten { urls } => {
            for url in urls {
                let record = service.shorten(&url).await?;
                println!("{}", serde_json::to_string(&record)?);
            }
        }
        Command::Resolve { code, user_agent } => {
            let mut record = service.resolve_short_code(&code).await?;
            let source = ClickSource::from_user_agent(&user_agent);
            // The process is about to exit, so wait for the counter write.
            service.click_tracker().track(&mut record, source).await?;
            println!("{}", serde_json::to_string(&record)?);
        }
        Command::Recent { limit } => {
            for record in service.repository().durable().recent(limit).await? {
                println!("{}", serde_json::to_string(&record)?);
            }
        }
        Command::Stats => {
            let records = service.repository().durable().count().await?;
            let cache = service.repository().cache_statistics();
            println!("{}", json!({ "records": records, "cache": cache }));
        }
    }

    Ok(())
}
