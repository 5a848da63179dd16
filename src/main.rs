use brickblock_rust::config::AppConfig;
use brickblock_rust::demo::build_app;
use brickblock_rust::errors::AppError;
use log::info;

#[tokio::main]
async fn main() -> Result<(), AppError> {
    let cfg = AppConfig::from_env()?;
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let app = build_app()?;
    let addr = cfg.bind_addr();
    info!("Starting server on {}", addr);

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;
    Ok(())
}
