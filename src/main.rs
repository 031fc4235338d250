use std::{process, sync::Arc};

use listings::{
    application::{
        accounts::AccountService,
        auth::{AccessControl, AuthConfig},
        catalog::CatalogService,
        error::AppError,
        listings::ListingCache,
        repos::{ListingsStore, StoreHealth},
    },
    cache::{CacheConfig, MemoryViewStore, ViewStore},
    config,
    infra::{
        db::PostgresRepositories,
        error::InfraError,
        http::{self, ApiState},
        telemetry,
    },
};
use secrecy::SecretString;
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
        error!(error = %error, transient = error.is_transient(), "application error");
        return;
    }

    let subscriber = tracing_fmt().with_max_level(Level::ERROR).finish();
    let dispatch = Dispatch::new(subscriber);
    dispatcher::with_default(&dispatch, || {
        error!(error = %error, transient = error.is_transient(), "application error");
    });
}

async fn run() -> Result<(), AppError> {
    let (cli_args, settings) = config::load_with_cli()?;

    let command = cli_args
        .command
        .unwrap_or(config::Command::Serve(Box::<config::ServeArgs>::default()));

    telemetry::init(&settings.logging).map_err(AppError::from)?;

    match command {
        config::Command::Serve(_) => run_serve(settings).await,
        config::Command::Migrate(_) => run_migrate(settings).await,
    }
}

async fn run_serve(mut settings: config::Settings) -> Result<(), AppError> {
    let secret = settings
        .auth
        .jwt_secret
        .take()
        .ok_or_else(|| InfraError::configuration("auth.jwt_secret is not configured"))?;
    let repositories = init_repositories(&settings).await?;
    let state = build_application_context(repositories, secret, &settings);
    serve_http(&settings, state).await
}

async fn run_migrate(settings: config::Settings) -> Result<(), AppError> {
    let pool = connect(&settings).await?;
    PostgresRepositories::run_migrations(&pool)
        .await
        .map_err(|err| AppError::from(InfraError::from(err)))?;
    info!(target = "listings::migrate", "migrations applied");
    Ok(())
}

async fn connect(settings: &config::Settings) -> Result<sqlx::PgPool, AppError> {
    let database_url = settings
        .database
        .url
        .as_ref()
        .ok_or_else(|| InfraError::configuration("database url is not configured"))
        .map_err(AppError::from)?;

    PostgresRepositories::connect(database_url, settings.database.max_connections.get())
        .await
        .map_err(|err| AppError::from(InfraError::from(err)))
}

async fn init_repositories(
    settings: &config::Settings,
) -> Result<Arc<PostgresRepositories>, AppError> {
    let pool = connect(settings).await?;

    PostgresRepositories::run_migrations(&pool)
        .await
        .map_err(|err| AppError::from(InfraError::from(err)))?;

    Ok(Arc::new(PostgresRepositories::new(pool)))
}

fn build_application_context(
    repositories: Arc<PostgresRepositories>,
    secret: SecretString,
    settings: &config::Settings,
) -> ApiState {
    let access = Arc::new(AccessControl::new(AuthConfig::new(
        secret,
        settings.auth.token_ttl,
    )));

    let cache_config = CacheConfig::from(&settings.cache);
    let views: Option<Arc<dyn ViewStore>> = if cache_config.is_enabled() {
        Some(Arc::new(MemoryViewStore::new(&cache_config)))
    } else {
        warn!(
            target = "listings::bootstrap",
            "listing cache disabled; every read goes to the database"
        );
        None
    };

    let store: Arc<dyn ListingsStore> = repositories.clone();
    let health: Arc<dyn StoreHealth> = repositories;
    let listings = ListingCache::with_views_opt(store, views);

    ApiState {
        catalog: CatalogService::new(listings.clone()),
        accounts: AccountService::new(listings, access.clone()),
        access,
        health,
    }
}

async fn serve_http(settings: &config::Settings, state: ApiState) -> Result<(), AppError> {
    let router = http::build_router(state, settings.server.request_timeout);

    let listener = tokio::net::TcpListener::bind(settings.server.addr)
        .await
        .map_err(|err| AppError::from(InfraError::bind(settings.server.addr, err)))?;
    info!(
        target = "listings::bootstrap",
        addr = %settings.server.addr,
        "listening"
    );

    axum::serve(listener, router.into_make_service())
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(|err| AppError::unexpected(format!("server error: {err}")))?;

    info!(target = "listings::bootstrap", "server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        warn!(
            target = "listings::bootstrap",
            error = %err,
            "failed to listen for shutdown signal"
        );
        std::future::pending::<()>().await;
    }
}
