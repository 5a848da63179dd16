//! BrickBlock Rust
//!
//! Este crate agrupa la aplicación de ejemplo:
//! - `config`: configuración del servidor desde variables de entorno.
//! - `errors`: errores de arranque.
//! - `demo`: funciones y pipeline de ejemplo montadas como endpoints.
//!
//! La lógica reutilizable vive en `brick-core` (pipelines, clasificación)
//! y `brick-api` (endpoints axum); se re-exportan aquí.

pub mod config;
pub mod demo;
pub mod errors;

pub use brick_api;
pub use brick_core;
