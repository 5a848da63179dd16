use brick_api::RouteError;
use brick_core::ConfigError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("Error de configuración: {0}")]
    Config(String),
    #[error("Error en IO: {0}")]
    Io(#[from] std::io::Error),
    #[error("Error de rutas: {0}")]
    Route(#[from] RouteError),
    #[error("Error de pipeline: {0}")]
    Pipeline(#[from] ConfigError),
}
