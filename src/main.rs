mod core;
mod features;
mod modules;
mod shared;

use crate::core::config::{CatalogBackend, Config, ContentBackend};
use crate::core::openapi::{ApiDoc, SwaggerInfoModifier};
use crate::core::{database, middleware};
use crate::features::assets::{self, AssetService, InMemoryCatalog, PgAssetRepository};
use crate::features::auth::{IdentityResolver, JwtValidator};
use crate::features::categories::{
    self, CategoryRepository, CategoryService, PgCategoryRepository,
};
use crate::features::tags::{self, PgTagRepository, TagRepository, TagService};
use crate::features::users::models::{NewUser, Role};
use crate::features::users::{
    self, InMemoryUserRepository, PgUserRepository, UserRepository, UserService,
};
use crate::modules::storage::{ContentStore, InMemoryContentStore, MinIOClient};
use axum::{middleware::from_fn, Router};
use std::sync::Arc;
use tower::ServiceBuilder;
use tower_http::request_id::{PropagateRequestIdLayer, SetRequestIdLayer};
use tower_http::trace::{DefaultOnRequest, DefaultOnResponse, TraceLayer};
use tracing::Level;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use utoipa::Modify;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

/// Repositories shared by the feature services
struct Repositories {
    assets: Arc<dyn assets::repository::AssetRepository>,
    categories: Arc<dyn CategoryRepository>,
    tags: Arc<dyn TagRepository>,
    users: Arc<dyn UserRepository>,
}

async fn build_repositories(config: &Config) -> anyhow::Result<Repositories> {
    match (config.catalog.backend, &config.database) {
        (CatalogBackend::Postgres, Some(db_config)) => {
            // Create database connection pool
            let pool = database::create_pool(db_config).await?;
            tracing::info!("Database connection pool created");

            // Run migrations automatically
            tracing::info!("Running database migrations...");
            sqlx::migrate!("./migrations")
                .run(&pool)
                .await
                .map_err(|e| anyhow::anyhow!("Migration failed: {}", e))?;
            tracing::info!("Database migrations completed successfully");

            Ok(Repositories {
                assets: Arc::new(PgAssetRepository::new(
                    pool.clone(),
                    config.catalog.tag_storage,
                )),
                categories: Arc::new(PgCategoryRepository::new(pool.clone())),
                tags: Arc::new(PgTagRepository::new(pool.clone())),
                users: Arc::new(PgUserRepository::new(pool)),
            })
        }
        (CatalogBackend::Postgres, None) => {
            Err(anyhow::anyhow!("Postgres backend selected without database configuration"))
        }
        (CatalogBackend::Memory, _) => {
            tracing::warn!("Using in-memory catalog; all data is lost on restart");
            let catalog = Arc::new(InMemoryCatalog::new(config.catalog.tag_storage));
            let users = Arc::new(InMemoryUserRepository::new());

            if config.catalog.allow_anonymous_uploads {
                let system = users
                    .insert(NewUser {
                        email: format!("{}@localhost", config.catalog.system_uploader_username),
                        username: config.catalog.system_uploader_username.clone(),
                        role: Role::User,
                        is_superuser: false,
                    })
                    .await?;
                tracing::info!("Fallback uploader account created: {}", system.username);
            }

            Ok(Repositories {
                assets: catalog.clone(),
                categories: catalog.clone(),
                tags: catalog,
                users,
            })
        }
    }
}

async fn build_content_store(config: &Config) -> anyhow::Result<Arc<dyn ContentStore>> {
    match (config.catalog.content_backend, &config.minio) {
        (ContentBackend::Minio, Some(minio_config)) => {
            // Initialize MinIO client for storage
            let minio_client = MinIOClient::new(minio_config.clone())
                .await
                .map_err(|e| anyhow::anyhow!("Failed to initialize MinIO client: {}", e))?;
            // Ensure bucket exists (create if not)
            minio_client
                .ensure_bucket_exists()
                .await
                .map_err(|e| anyhow::anyhow!("Failed to ensure MinIO bucket exists: {}", e))?;
            tracing::info!(
                "MinIO client initialized for bucket: {}",
                minio_client.bucket_name()
            );
            Ok(Arc::new(minio_client))
        }
        (ContentBackend::Minio, None) => {
            Err(anyhow::anyhow!("MinIO backend selected without MinIO configuration"))
        }
        (ContentBackend::Memory, _) => {
            tracing::warn!("Using in-memory content store; uploads are lost on restart");
            Ok(Arc::new(InMemoryContentStore::new()))
        }
    }
}

fn main() -> anyhow::Result<()> {
    // Build Tokio runtime with configurable worker threads
    let worker_threads = std::env::var("TOKIO_WORKER_THREADS")
        .ok()
        .and_then(|s| s.parse().ok())
        .unwrap_or_else(|| {
            std::thread::available_parallelism()
                .map(|p| p.get())
                .unwrap_or(4)
        });

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .worker_threads(worker_threads)
        .max_blocking_threads(worker_threads * 4)
        .enable_all()
        .build()?;

    runtime.block_on(async_main(worker_threads))
}

async fn async_main(worker_threads: usize) -> anyhow::Result<()> {
    // Load .env file BEFORE initializing logger so RUST_LOG is available
    let _ = dotenvy::dotenv();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load configuration
    let config = Config::from_env().map_err(|e| anyhow::anyhow!(e))?;

    // Log system info
    let available_cpus = std::thread::available_parallelism()
        .map(|p| p.get())
        .unwrap_or(1);
    tracing::info!(
        "System info: available_cpus={}, tokio_worker_threads={}, pid={}",
        available_cpus,
        worker_threads,
        std::process::id()
    );

    tracing::info!(
        "Configuration loaded successfully: catalog={:?}, content={:?}, tags={:?}",
        config.catalog.backend,
        config.catalog.content_backend,
        config.catalog.tag_storage
    );

    let repositories = build_repositories(&config).await?;
    let content_store = build_content_store(&config).await?;

    // Initialize auth
    let identity_resolver = Arc::new(IdentityResolver::new(
        JwtValidator::new(&config.auth),
        Arc::clone(&repositories.users),
    ));
    tracing::info!("Auth configuration initialized");

    // Initialize services
    let asset_service = Arc::new(AssetService::new(
        Arc::clone(&repositories.assets),
        Arc::clone(&repositories.categories),
        Arc::clone(&repositories.users),
        content_store,
        &config.catalog,
    ));
    let category_service = Arc::new(CategoryService::new(Arc::clone(&repositories.categories)));
    let tag_service = Arc::new(TagService::new(Arc::clone(&repositories.tags)));
    let user_service = Arc::new(UserService::new(Arc::clone(&repositories.users)));
    tracing::info!("Catalog services initialized");

    match &config.catalog.bootstrap_admin {
        Some(admin) => {
            user_service
                .ensure_bootstrap_admin(admin)
                .await
                .map_err(|e| anyhow::anyhow!("Failed to provision bootstrap admin: {}", e))?;
        }
        None if config.catalog.backend == CatalogBackend::Memory => {
            tracing::warn!("No BOOTSTRAP_ADMIN_ID set; the in-memory catalog has no admin account");
        }
        None => {}
    }

    // Build application router with dynamic swagger config
    let swagger_modifier = SwaggerInfoModifier {
        title: config.swagger.title.clone(),
        version: config.swagger.version.clone(),
        description: config.swagger.description.clone(),
    };

    let mut openapi = ApiDoc::openapi();
    swagger_modifier.modify(&mut openapi);

    // Build swagger router
    let swagger = if let Some(credentials) = config.swagger.credentials() {
        tracing::info!("Swagger UI basic auth enabled");
        Router::new()
            .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", openapi))
            .layer(from_fn(middleware::basic_auth_middleware(Arc::new(
                credentials,
            ))))
    } else {
        tracing::info!("Swagger UI basic auth disabled (no credentials configured)");
        Router::new().merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", openapi))
    };

    // API routes; the bearer token, when present, is resolved to an actor
    let api_routes = Router::new()
        .merge(assets::routes(
            Arc::clone(&asset_service),
            config.app.max_request_body_size,
        ))
        .merge(categories::routes(category_service))
        .merge(tags::routes(tag_service))
        .merge(users::routes::routes(Arc::clone(&user_service)))
        .nest("/api/admin", users::routes::admin_routes(user_service))
        .route_layer(axum::middleware::from_fn_with_state(
            identity_resolver,
            middleware::auth_middleware,
        ));

    // Simple health check endpoint (no auth required)
    async fn health_check() -> axum::http::StatusCode {
        axum::http::StatusCode::OK
    }
    let health_route = Router::new().route("/health", axum::routing::get(health_check));

    let app = Router::new()
        .merge(swagger)
        .merge(api_routes)
        .merge(health_route)
        .layer(middleware::cors_layer(
            config.app.cors_allowed_origins.clone(),
        ))
        .layer(
            ServiceBuilder::new()
                // Generate X-Request-Id using UUID v7 (or use client-provided one)
                .layer(SetRequestIdLayer::x_request_id(middleware::MakeRequestUuid))
                .layer(
                    TraceLayer::new_for_http()
                        .make_span_with(middleware::MakeSpanWithRequestId)
                        .on_request(DefaultOnRequest::new().level(Level::INFO))
                        .on_response(DefaultOnResponse::new().level(Level::INFO)),
                )
                // Propagate X-Request-Id to response headers
                .layer(PropagateRequestIdLayer::x_request_id()),
        );

    // Start server
    let addr = config.app.server_address();
    let socket_addr: std::net::SocketAddr = addr
        .parse()
        .map_err(|e| anyhow::anyhow!("Invalid address: {}", e))?;

    // Use socket2 for TCP listener configuration
    let socket = socket2::Socket::new(
        socket2::Domain::for_address(socket_addr),
        socket2::Type::STREAM,
        Some(socket2::Protocol::TCP),
    )?;

    socket.set_reuse_address(true)?;
    #[cfg(unix)]
    socket.set_reuse_port(true)?;
    socket.set_nodelay(true)?;

    socket.set_recv_buffer_size(256 * 1024)?;
    socket.set_send_buffer_size(256 * 1024)?;

    #[cfg(target_os = "linux")]
    {
        let keepalive = socket2::TcpKeepalive::new()
            .with_time(std::time::Duration::from_secs(60))
            .with_interval(std::time::Duration::from_secs(10))
            .with_retries(3);
        socket.set_tcp_keepalive(&keepalive)?;
    }
    #[cfg(not(target_os = "linux"))]
    {
        let keepalive = socket2::TcpKeepalive::new().with_time(std::time::Duration::from_secs(60));
        socket.set_tcp_keepalive(&keepalive)?;
    }

    socket.set_nonblocking(true)?;
    socket.bind(&socket_addr.into())?;
    socket.listen(65535)?;

    let listener = tokio::net::TcpListener::from_std(socket.into())?;
    tracing::info!("Server listening on {}", format!("http://{}", addr));
    tracing::info!(
        "Swagger UI available at {}",
        format!("http://{}/swagger-ui/", addr)
    );

    axum::serve(listener, app).await?;

    Ok(())
}
