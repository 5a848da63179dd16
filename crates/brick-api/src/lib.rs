//! brick-api: registro automático de funciones como endpoints axum.
pub mod binding;
pub mod builder;
pub mod endpoint;
pub mod errors;

pub use binding::{bind, coerce_scalar, FormData, RequestPayload};
pub use builder::ApiBuilder;
pub use endpoint::Endpoint;
pub use errors::{ApiError, RouteError};
