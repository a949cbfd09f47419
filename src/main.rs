use aichin_backend::{
    AppState, GoogleTranslator, LocalDiskStorage, S3StorageClient,
    auth::ensure_bootstrap_admin,
    config::{AppConfig, Env, StorageBackend},
    create_router,
    repository::{PostgresRepository, RepositoryState},
    storage::{StorageService, StorageState},
    translation::TranslatorState,
};
use sqlx::postgres::PgPoolOptions;
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// main
///
/// Loads configuration, sets up logging, connects the document store, picks the
/// blob store and starts the HTTP server.
#[tokio::main]
async fn main() {
    // 1. Configuration (fail-fast on missing production secrets)
    dotenv::dotenv().ok();
    let config = AppConfig::load();

    // 2. Logging: pretty locally, JSON in production.
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "aichin_backend=debug,tower_http=info,axum=info".into());

    match config.env {
        Env::Local => {
            tracing_subscriber::registry()
                .with(env_filter)
                .with(tracing_subscriber::fmt::layer().pretty())
                .init();
        }
        Env::Production => {
            tracing_subscriber::registry()
                .with(env_filter)
                .with(tracing_subscriber::fmt::layer().json())
                .init();
        }
    }

    tracing::info!("Application starting in {:?} mode", config.env);

    // 3. Document store (Postgres JSONB)
    let pool = PgPoolOptions::new()
        .max_connections(5)
        .connect(&config.db_url)
        .await
        .expect("FATAL: Failed to connect to Postgres. Check DATABASE_URL.");

    let postgres = PostgresRepository::new(pool);
    postgres
        .init_schema()
        .await
        .expect("FATAL: Failed to initialise the document schema.");
    let repo = Arc::new(postgres) as RepositoryState;

    // 4. Blob store
    let storage: StorageState = match config.storage {
        StorageBackend::S3 => {
            let s3_client = S3StorageClient::new(
                &config.s3_endpoint,
                &config.s3_region,
                &config.s3_key,
                &config.s3_secret,
                &config.s3_bucket,
                &config.s3_public_url,
            );
            // MinIO in docker-compose starts without the bucket.
            if config.env == Env::Local {
                s3_client.ensure_bucket_exists().await;
            }
            Arc::new(s3_client)
        }
        StorageBackend::Local => {
            let disk = LocalDiskStorage::new(&config.upload_dir, &config.public_upload_base);
            disk.ensure_bucket_exists().await;
            Arc::new(disk)
        }
    };

    // 5. Translator for lang=en reads
    let translator = Arc::new(GoogleTranslator::new(&config.translate_url)) as TranslatorState;
    if !config.translate_enabled {
        tracing::info!("Machine translation disabled; lang=en serves stored fields only");
    }

    // 6. First superadmin
    if let Err(e) = ensure_bootstrap_admin(&repo, &config).await {
        tracing::error!("Failed to create bootstrap superadmin: {}", e);
    }

    // 7. Router and server
    let bind_addr = config.bind_addr.clone();
    let app_state = AppState {
        repo,
        storage,
        translator,
        config,
    };
    let app = create_router(app_state);

    let listener = TcpListener::bind(&bind_addr)
        .await
        .expect("FATAL: Failed to bind the HTTP listener. Check BIND_ADDR.");

    tracing::info!("Listening on {}", bind_addr);
    tracing::info!("API Documentation (Swagger UI) available at: http://{}/swagger-ui", bind_addr);

    axum::serve(listener, app)
        .await
        .expect("FATAL: HTTP server terminated unexpectedly.");
}
