use std::{process, sync::Arc, time::Duration};

use folio::{
    application::{
        admin::posts::AdminPostService,
        error::AppError,
        listing::ListingService,
        repos::{HealthCheck, PostsRepo, PostsWriteRepo},
        sitemap::SitemapService,
        uploads::UploadService,
    },
    config,
    infra::{
        db::PostgresRepositories,
        error::InfraError,
        http::{self, AdminKey, AdminRateLimiter, ApiState, HttpState, RouterState},
        memory::MemoryRepositories,
        telemetry,
        uploads::UploadStorage,
    },
};
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
    let repositories = init_repositories(&settings).await?;
    let router_state = build_application_context(repositories, &settings)?;
    serve_http(&settings, router_state).await
}

async fn run_migrate(settings: config::Settings) -> Result<(), AppError> {
    let database_url = settings
        .database
        .url
        .as_ref()
        .ok_or_else(|| InfraError::configuration("database url is not configured"))
        .map_err(AppError::from)?;

    let pool = PostgresRepositories::connect(database_url, 1)
        .await
        .map_err(|err| AppError::from(InfraError::database(err.to_string())))?;
    PostgresRepositories::run_migrations(&pool)
        .await
        .map_err(|err| AppError::from(InfraError::database(err.to_string())))?;

    info!(target = "folio::migrate", "migrations applied");
    Ok(())
}

/// The three storage seams every service is built from.
struct Repositories {
    posts: Arc<dyn PostsRepo>,
    posts_write: Arc<dyn PostsWriteRepo>,
    health: Arc<dyn HealthCheck>,
}

async fn init_repositories(settings: &config::Settings) -> Result<Repositories, AppError> {
    let Some(database_url) = settings.database.url.as_ref() else {
        warn!(
            target = "folio::startup",
            "database url is not configured; posts are kept in memory and lost on restart"
        );
        let memory = Arc::new(MemoryRepositories::new());
        return Ok(Repositories {
            posts: memory.clone(),
            posts_write: memory.clone(),
            health: memory,
        });
    };

    let pool = PostgresRepositories::connect(database_url, settings.database.max_connections.get())
        .await
        .map_err(|err| AppError::from(InfraError::database(err.to_string())))?;

    PostgresRepositories::run_migrations(&pool)
        .await
        .map_err(|err| AppError::from(InfraError::database(err.to_string())))?;

    let postgres = Arc::new(PostgresRepositories::new(pool));
    Ok(Repositories {
        posts: postgres.clone(),
        posts_write: postgres.clone(),
        health: postgres,
    })
}

fn build_application_context(
    repositories: Repositories,
    settings: &config::Settings,
) -> Result<RouterState, AppError> {
    let site = Arc::new(settings.site.clone());

    let upload_storage = Arc::new(
        UploadStorage::new(settings.uploads.directory.clone())
            .map_err(|err| AppError::from(InfraError::Io(err)))?,
    );
    let upload_service = Arc::new(UploadService::new(
        upload_storage.clone(),
        settings.uploads.max_file_bytes.get(),
        &settings.uploads.public_prefix,
    ));

    let listing_service = Arc::new(ListingService::new(
        repositories.posts.clone(),
        settings.listing,
    ));
    let admin_post_service = Arc::new(AdminPostService::new(
        repositories.posts.clone(),
        repositories.posts_write.clone(),
        site.author.clone(),
    ));
    let sitemap_service = Arc::new(SitemapService::new(
        repositories.posts.clone(),
        site.clone(),
    ));

    if settings.admin.key.is_none() {
        warn!(
            target = "folio::startup",
            "admin key is not configured; every admin request will be rejected"
        );
    }

    let rate_limiter = Arc::new(AdminRateLimiter::new(
        Duration::from_secs(u64::from(settings.admin_rate_limit.window_seconds.get())),
        settings.admin_rate_limit.max_requests.get(),
    ));

    let http_state = HttpState {
        sitemap: sitemap_service,
        health: repositories.health,
        upload_storage,
    };

    let api_state = ApiState {
        listing: listing_service,
        posts: admin_post_service,
        uploads: upload_service,
        site,
        admin_key: AdminKey::new(settings.admin.key.clone()),
        rate_limiter,
    };

    Ok(RouterState {
        http: http_state,
        api: api_state,
    })
}

async fn serve_http(settings: &config::Settings, router_state: RouterState) -> Result<(), AppError> {
    let router = http::build_application_router(router_state, &settings.uploads.public_prefix);

    let listener = tokio::net::TcpListener::bind(settings.server.addr)
        .await
        .map_err(|err| AppError::from(InfraError::from(err)))?;

    info!(
        target = "folio::startup",
        addr = %settings.server.addr,
        "listening"
    );

    let grace = settings.server.graceful_shutdown;
    axum::serve(listener, router.into_make_service())
        .with_graceful_shutdown(shutdown_signal(grace))
        .await
        .map_err(|err| AppError::unexpected(format!("server error: {err}")))?;

    Ok(())
}

/// Resolves on Ctrl-C and arms a watchdog that exits once `grace` elapses
/// with connections still open.
async fn shutdown_signal(grace: Duration) {
    if let Err(err) = tokio::signal::ctrl_c().await {
        error!(error = %err, "failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }

    info!(
        target = "folio::shutdown",
        grace_seconds = grace.as_secs(),
        "shutdown requested; draining connections"
    );
    tokio::spawn(async move {
        tokio::time::sleep(grace).await;
        warn!(
            target = "folio::shutdown",
            "graceful shutdown timed out; exiting"
        );
        process::exit(0);
    });
}
