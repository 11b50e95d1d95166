use greenmetrics::api;
use greenmetrics::config::Config;
use greenmetrics::state::AppState;
use greenmetrics::storage::ObjectStore;
use greenmetrics::warehouse::Warehouse;
use std::sync::Arc;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenv::dotenv().ok();
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let config = Config::from_env()?;
    let warehouse = Warehouse::connect(&config.database_url)?;
    let store = ObjectStore::open(&config.bucket_dir)?;

    let bind_addr = config.bind_addr.clone();
    let state = Arc::new(AppState::new(config, warehouse, store));
    let app = api::router(state);

    let listener = tokio::net::TcpListener::bind(&bind_addr).await?;
    log::info!("listening on {bind_addr}");
    axum::serve(listener, app).await?;

    Ok(())
}
