//! Configuración del servidor de ejemplo.
//! Carga `.env` una sola vez y lee `BRICK_HOST` / `BRICK_PORT`.
use std::env;

use dotenvy::dotenv;
use once_cell::sync::Lazy;

use crate::errors::AppError;

// Carga perezosa del archivo .env una sola vez.
static DOTENV_LOADED: Lazy<()> = Lazy::new(|| {
    let _ = dotenv(); // ignora error si no existe .env
});

pub const DEFAULT_HOST: &str = "0.0.0.0";
pub const DEFAULT_PORT: u16 = 8000;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppConfig {
    pub host: String,
    pub port: u16,
}

impl AppConfig {
    pub fn from_env() -> Result<Self, AppError> {
        Lazy::force(&DOTENV_LOADED);
        Self::from_vars(env::var("BRICK_HOST").ok(), env::var("BRICK_PORT").ok())
    }

    /// Construye desde valores ya leídos (facilita pruebas sin tocar el entorno).
    pub fn from_vars(host: Option<String>, port: Option<String>) -> Result<Self, AppError> {
        let host = host.filter(|h| !h.trim().is_empty())
                       .unwrap_or_else(|| DEFAULT_HOST.to_string());
        let port = match port {
            Some(raw) => raw.trim()
                            .parse::<u16>()
                            .map_err(|_| AppError::Config(format!("BRICK_PORT inválido: '{raw}'")))?,
            None => DEFAULT_PORT,
        };
        Ok(Self { host, port })
    }

    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self { host: DEFAULT_HOST.to_string(),
               port: DEFAULT_PORT }
    }
}
