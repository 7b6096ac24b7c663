//! Scout backend: HTTP service in front of the agent supervisor and workflows.
//!
//! Default: http://0.0.0.0:8000/

use dotenv::dotenv;
use scout_backend::bootstrap::build_state;
use scout_backend::config::Config;
use scout_backend::controllers;
use std::sync::Arc;

#[tokio::main]
async fn main() -> std::io::Result<()> {
    dotenv().ok();
    env_logger::init();

    let config = match Config::from_env() {
        Ok(config) => config,
        Err(e) => {
            log::error!("{}", e);
            std::process::exit(1);
        }
    };

    log::info!("Loading agents from {}", config.agents_dir.display());
    let state = match build_state(&config) {
        Ok(state) => Arc::new(state),
        Err(e) => {
            log::error!("Failed to start: {}", e);
            std::process::exit(1);
        }
    };

    let app = controllers::router(state);

    let addr = config.bind_addr();
    log::info!("Scout listening on http://{}", addr);

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await
}
