pub mod application;
pub mod config;
pub mod db;
pub mod domain;
pub mod errors;
pub mod handlers;
pub mod infrastructure;
pub mod schema;

use std::sync::Arc;

use actix_web::{middleware::Logger, web, App, HttpServer};
use diesel_migrations::{embed_migrations, EmbeddedMigrations, MigrationHarness};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use application::order_service::OrderService;
use config::{AppConfig, StorageBackend};
use domain::pricing::Pricing;
use errors::{AppError, StartupError};
use handlers::{directory, orders, pricing, ApiDoc, AppState};
use infrastructure::card_repo::DieselCardLinker;
use infrastructure::directory_repo::DieselDirectory;
use infrastructure::memory::InMemoryStore;
use infrastructure::order_repo::DieselOrderRepository;

pub use db::{create_pool, DbPool};

pub const MIGRATIONS: EmbeddedMigrations = embed_migrations!("migrations");

/// Run any pending Diesel migrations against the pool's database.
pub fn run_migrations(pool: &DbPool) -> Result<(), StartupError> {
    let mut conn = pool.get()?;
    let applied = conn
        .run_pending_migrations(MIGRATIONS)
        .map_err(|e| StartupError::Migrations(e.to_string()))?;
    log::info!("Applied {} pending migration(s)", applied.len());
    Ok(())
}

/// Wire the order service onto the configured storage backend.
pub fn build_state(config: &AppConfig) -> Result<AppState, StartupError> {
    let service = match (config.storage, config.database_url.as_deref()) {
        (StorageBackend::Postgres, Some(url)) => {
            let pool = create_pool(url)?;
            run_migrations(&pool)?;
            OrderService::new(
                Arc::new(DieselOrderRepository::new(pool.clone())),
                Arc::new(DieselDirectory::new(pool.clone())),
                Arc::new(DieselCardLinker::new(pool)),
            )
        }
        (StorageBackend::Postgres, None) => {
            return Err(StartupError::Config(config::ConfigError::Missing(
                "DATABASE_URL",
            )))
        }
        (StorageBackend::Memory, _) => {
            log::warn!("Using the in-memory order store; data is lost on restart");
            let store = Arc::new(InMemoryStore::new());
            OrderService::new(store.clone(), store.clone(), store)
        }
    };

    Ok(AppState {
        orders: service.with_pricing(Pricing::new(config.prices.clone())),
    })
}

/// Register the REST routes and the extractor error handlers.
///
/// `AppState` must be registered as app data by the caller.
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.app_data(
        web::JsonConfig::default()
            .error_handler(|err, _req| AppError::BadRequest(err.to_string()).into()),
    )
    .app_data(
        web::QueryConfig::default()
            .error_handler(|err, _req| AppError::BadRequest(err.to_string()).into()),
    )
    .app_data(
        web::PathConfig::default()
            .error_handler(|err, _req| AppError::BadRequest(err.to_string()).into()),
    )
    .service(
        web::scope("/orders")
            .route("", web::post().to(orders::create_order))
            .route("", web::get().to(orders::list_orders))
            .route("/{id}", web::get().to(orders::get_order))
            .route("/{id}", web::delete().to(orders::delete_order))
            .route("/{id}/status", web::patch().to(orders::update_order_status))
            .route("/{id}/items", web::put().to(orders::replace_order_items)),
    )
    .route("/tracking/{code}", web::get().to(orders::track_order))
    .route("/pricing/calculate", web::post().to(pricing::calculate_pricing))
    .route("/customers/{id}", web::get().to(directory::get_customer))
    .route("/stores/{id}", web::get().to(directory::get_store));
}

/// Build and return an actix-web `Server` bound to `host:port`.
///
/// The caller is responsible for `.await`-ing (or `tokio::spawn`-ing) the
/// returned server.
pub fn build_server(
    state: AppState,
    host: &str,
    port: u16,
) -> std::io::Result<actix_web::dev::Server> {
    let state = web::Data::new(state);
    let openapi = ApiDoc::openapi();

    Ok(HttpServer::new(move || {
        App::new()
            .app_data(state.clone())
            .wrap(Logger::default())
            .configure(configure)
            .service(
                SwaggerUi::new("/swagger-ui/{_:.*}").url("/api-docs/openapi.json", openapi.clone()),
            )
    })
    .bind((host.to_string(), port))?
    .run())
}
