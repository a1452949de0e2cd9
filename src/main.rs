use dotenvy::dotenv;
use grading_orders::config::AppConfig;
use grading_orders::errors::StartupError;
use grading_orders::{build_server, build_state};

#[actix_web::main]
async fn main() -> Result<(), StartupError> {
    dotenv().ok();
    env_logger::init_from_env(env_logger::Env::default().default_filter_or("info"));

    let config = AppConfig::from_env()?;
    let state = build_state(&config)?;

    log::info!(
        "Starting server at http://{}:{} ({:?} store)",
        config.host,
        config.port,
        config.storage
    );

    build_server(state, &config.host, config.port)?.await?;
    Ok(())
}
