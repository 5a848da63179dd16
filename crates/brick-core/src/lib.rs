//! brick-core: funciones nombradas, clasificación de parámetros y pipelines.
//!
//! No depende de ningún framework HTTP; `brick-api` monta los endpoints
//! sobre axum a partir de lo que aquí se describe.
pub mod classify;
pub mod errors;
pub mod function;
pub mod pipeline;
pub mod schema;
pub mod signature;

pub use classify::{binding_for, classify, method_set, BindingKind, MethodSet, ParamDescriptor};
pub use errors::{BoxError, CallError, ConfigError, ValidationError};
pub use function::{arg, take_arg, Args, Callable, FunctionBody, NamedFunction, STEP_PARAM};
pub use pipeline::{Pipeline, ASYNC_SUFFIX, INPUT_PARAM};
pub use schema::{DescribeType, Model, ModelSchema, TypeTag, UploadFile};
pub use signature::{Param, Signature};
