//! Errores del core.
//!
//! - `ConfigError`: fallos detectados al construir (pipeline vacío, paso sin
//!   parámetro, paso async en pipeline síncrono). Nunca aparecen en runtime.
//! - `ValidationError`: un valor no encaja con el modelo declarado.
//! - `CallError`: cualquier fallo al invocar una función envuelta.

use thiserror::Error;

/// Error de usuario opaco devuelto por un step o endpoint.
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

#[derive(Debug, Error, PartialEq, Eq, Clone)]
pub enum ConfigError {
    #[error("pipeline '{0}' has no steps and no explicit input/output schema")]
    EmptyPipeline(String),
    #[error("step '{0}' declares no parameter to infer the pipeline input from")]
    MissingFirstParameter(String),
    #[error("pipeline '{pipeline}' is synchronous but step '{step}' is asynchronous")]
    AsyncStepInSyncPipeline { pipeline: String, step: String },
}

/// Fallo de validación contra un modelo estructurado.
#[derive(Debug, Error, PartialEq, Eq, Clone)]
#[error("validation failed for '{target}': {message}")]
pub struct ValidationError {
    /// Nombre del modelo (o parámetro) validado.
    pub target: String,
    pub message: String,
}

impl ValidationError {
    pub fn new(target: impl Into<String>, message: impl Into<String>) -> Self {
        Self { target: target.into(),
               message: message.into() }
    }
}

#[derive(Debug, Error)]
pub enum CallError {
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error("missing argument '{0}'")]
    MissingArgument(String),
    #[error("invalid argument '{name}': {message}")]
    InvalidArgument { name: String, message: String },
    #[error("'{0}' is asynchronous and cannot be called synchronously")]
    AsyncInSyncContext(String),
    #[error("worker task failed: {0}")]
    Worker(String),
    /// Error propio de la función de usuario; se propaga sin modificar.
    #[error(transparent)]
    Step(BoxError),
}

impl CallError {
    pub fn step<E: Into<BoxError>>(err: E) -> Self {
        CallError::Step(err.into())
    }

    pub fn invalid_argument(name: impl Into<String>, message: impl Into<String>) -> Self {
        CallError::InvalidArgument { name: name.into(),
                                     message: message.into() }
    }

    /// Errores atribuibles al cliente (datos de entrada), no al servidor.
    pub fn is_client_error(&self) -> bool {
        matches!(self,
                 CallError::Validation(_) | CallError::MissingArgument(_) | CallError::InvalidArgument { .. })
    }
}
