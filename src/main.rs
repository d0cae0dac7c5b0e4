use std::{future::IntoFuture, process, sync::Arc, time::Duration};

use chronicle::{
    application::{
        error::AppError,
        pagination::ListingPolicy,
        repos::{HealthRepo, StoriesRepo, StoriesWriteRepo, TopicsRepo, TopicsWriteRepo},
        stories::StoryService,
        topics::TopicService,
    },
    cache::{CacheBackend, CacheConfig, CacheState, CacheStore, MemoryCacheStore},
    config,
    infra::{
        db::PostgresRepositories,
        error::InfraError,
        http::{self, ApiState},
        redis::RedisCacheStore,
        telemetry,
    },
};
use sqlx::PgPool;
use tokio::sync::Notify;
use tracing::{Dispatch, Level, dispatcher, error, info, warn};
use tracing_subscriber::fmt as tracing_fmt;

#[tokio::main]
async fn main() {
    if let Err(error) = run().await {
        report_application_error(&error);
        process::exit(1);
    }
}

fn report_application_error(error: &AppError) {
    if dispatcher::has_been_set() {
        error!(error = %error, "application error");
        return;
    }

    let subscriber = tracing_fmt().with_max_level(Level::ERROR).finish();
    let dispatch = Dispatch::new(subscriber);
    dispatcher::with_default(&dispatch, || {
        error!(error = %error, "application error");
    });
}

async fn run() -> Result<(), AppError> {
    let (cli_args, settings) = config::load_with_cli()
        .map_err(|err| AppError::unexpected(format!("failed to load configuration: {err}")))?;

    let command = cli_args
        .command
        .unwrap_or(config::Command::Serve(Box::<config::ServeArgs>::default()));

    telemetry::init(&settings.logging).map_err(AppError::from)?;

    match command {
        config::Command::Serve(_) => run_serve(settings).await,
        config::Command::Migrate(_) => run_migrate(settings).await,
    }
}

async fn run_serve(settings: config::Settings) -> Result<(), AppError> {
    let pool = connect_database(&settings).await?;
    migrate(&pool).await?;

    let repositories = Arc::new(PostgresRepositories::new(pool));
    let api_state = build_api_state(repositories, &settings);
    let cache_state = build_cache_state(&settings).await;

    serve_http(&settings, api_state, cache_state).await
}

async fn run_migrate(settings: config::Settings) -> Result<(), AppError> {
    let pool = connect_database(&settings).await?;
    migrate(&pool).await?;
    info!(target = "chronicle::migrate", "Migrations applied");
    Ok(())
}

async fn connect_database(settings: &config::Settings) -> Result<PgPool, AppError> {
    let database_url = settings
        .database
        .url
        .as_ref()
        .ok_or_else(|| InfraError::database("database url is not configured"))
        .map_err(AppError::from)?;

    PostgresRepositories::connect(database_url, settings.database.max_connections.get())
        .await
        .map_err(|err| AppError::from(InfraError::database(err.to_string())))
}

async fn migrate(pool: &PgPool) -> Result<(), AppError> {
    PostgresRepositories::run_migrations(pool)
        .await
        .map_err(|err| AppError::from(InfraError::database(err.to_string())))
}

fn build_api_state(repositories: Arc<PostgresRepositories>, settings: &config::Settings) -> ApiState {
    let stories_repo: Arc<dyn StoriesRepo> = repositories.clone();
    let stories_write_repo: Arc<dyn StoriesWriteRepo> = repositories.clone();
    let topics_repo: Arc<dyn TopicsRepo> = repositories.clone();
    let topics_write_repo: Arc<dyn TopicsWriteRepo> = repositories.clone();
    let health_repo: Arc<dyn HealthRepo> = repositories;

    let default_limit = settings.pagination.default_limit.get();
    let max_limit = settings.pagination.max_limit.get();

    ApiState {
        stories: Arc::new(StoryService::new(stories_repo, stories_write_repo)),
        topics: Arc::new(TopicService::new(topics_repo, topics_write_repo)),
        health: health_repo,
        story_listing: ListingPolicy::stories(default_limit, max_limit),
        topic_listing: ListingPolicy::topics(default_limit, max_limit),
    }
}

/// Resolves the cache backend. An unreachable Redis disables caching rather
/// than aborting startup.
async fn build_cache_state(settings: &config::Settings) -> CacheState {
    let cache_config = CacheConfig::from(&settings.cache);
    if !cache_config.enabled {
        info!(target = "chronicle::cache", "Response cache disabled");
        return CacheState::disabled(cache_config);
    }

    match cache_config.backend {
        CacheBackend::Memory => {
            let store: Arc<dyn CacheStore> = Arc::new(MemoryCacheStore::new(&cache_config));
            info!(
                target = "chronicle::cache",
                capacity = cache_config.memory_capacity,
                "Using in-process response cache"
            );
            CacheState::new(cache_config, store)
        }
        CacheBackend::Redis => {
            let redis = match RedisCacheStore::connect(&settings.cache.redis_url) {
                Ok(redis) => redis,
                Err(err) => {
                    error!(target = "chronicle::cache", error = %err, "Response cache disabled");
                    return CacheState::disabled(cache_config);
                }
            };
            if let Err(err) = redis.ping().await {
                error!(
                    target = "chronicle::cache",
                    error = %err,
                    "Redis unreachable, response cache disabled"
                );
                return CacheState::disabled(cache_config);
            }
            info!(target = "chronicle::cache", "Connected to Redis response cache");
            CacheState::new(cache_config, Arc::new(redis))
        }
    }
}

async fn serve_http(
    settings: &config::Settings,
    api_state: ApiState,
    cache_state: CacheState,
) -> Result<(), AppError> {
    let router = http::build_router(api_state, cache_state);

    let listener = tokio::net::TcpListener::bind(settings.server.addr)
        .await
        .map_err(|err| AppError::from(InfraError::from(err)))?;
    info!(target = "chronicle::server", addr = %settings.server.addr, "Listening");

    let shutdown = Arc::new(Notify::new());
    let server = axum::serve(listener, router.into_make_service())
        .with_graceful_shutdown(shutdown_signal(shutdown.clone()))
        .into_future();

    let grace = settings.server.graceful_shutdown;
    tokio::select! {
        result = server => {
            result.map_err(|err| AppError::unexpected(format!("server error: {err}")))?;
        }
        _ = drain_deadline(shutdown, grace) => {
            warn!(
                target = "chronicle::server",
                grace_seconds = grace.as_secs(),
                "Graceful shutdown timed out, dropping open connections"
            );
        }
    }

    info!(target = "chronicle::server", "Server stopped");
    Ok(())
}

async fn shutdown_signal(shutdown: Arc<Notify>) {
    let ctrl_c = async {
        if let Err(err) = tokio::signal::ctrl_c().await {
            error!(target = "chronicle::server", error = %err, "failed to listen for ctrl-c");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(err) => {
                error!(target = "chronicle::server", error = %err, "failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    info!(target = "chronicle::server", "Shutdown requested, draining connections");
    shutdown.notify_one();
}

async fn drain_deadline(shutdown: Arc<Notify>, grace: Duration) {
    shutdown.notified().await;
    tokio::time::sleep(grace).await;
}
