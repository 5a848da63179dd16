//! Funciones nombradas.
//!
//! `NamedFunction` es el valor explícito `{name, signature, body}` que
//! consumen tanto el constructor de endpoints como el compilador de
//! pipelines. El cuerpo recibe los argumentos ya enlazados por nombre
//! (`Args`) y devuelve JSON; puede ser síncrono o asíncrono.
//!
//! Para funciones tipadas de un solo valor (steps) existen `step` y
//! `async_step`, que derivan la firma desde los tipos Rust y adaptan la
//! entrada/salida vía serde.

use std::fmt;
use std::future::Future;
use std::sync::Arc;

use async_trait::async_trait;
use futures::future::BoxFuture;
use serde::{de::DeserializeOwned, Serialize};
use serde_json::{Map, Value};

use crate::errors::{BoxError, CallError};
use crate::schema::DescribeType;
use crate::signature::Signature;

/// Argumentos enlazados por nombre de parámetro.
pub type Args = Map<String, Value>;

pub type SyncBody = Arc<dyn Fn(Args) -> Result<Value, CallError> + Send + Sync>;
pub type AsyncBody = Arc<dyn Fn(Args) -> BoxFuture<'static, Result<Value, CallError>> + Send + Sync>;

/// Nombre del único parámetro de los steps tipados.
pub const STEP_PARAM: &str = "input";

#[derive(Clone)]
pub enum FunctionBody {
    Sync(SyncBody),
    Async(AsyncBody),
}

/// Interfaz común de todo lo invocable por nombre.
#[async_trait]
pub trait Callable: fmt::Debug + Send + Sync {
    fn name(&self) -> &str;
    fn signature(&self) -> &Signature;
    fn is_async(&self) -> bool;
    /// Invoca esperando si el cuerpo es asíncrono, directamente si no.
    async fn invoke(&self, args: Args) -> Result<Value, CallError>;
}

#[derive(Clone)]
pub struct NamedFunction {
    name: String,
    signature: Signature,
    body: FunctionBody,
}

impl NamedFunction {
    pub fn from_sync<F>(name: impl Into<String>, signature: Signature, f: F) -> Self
        where F: Fn(Args) -> Result<Value, CallError> + Send + Sync + 'static
    {
        Self { name: name.into(),
               signature,
               body: FunctionBody::Sync(Arc::new(f)) }
    }

    pub fn from_async<F, Fut>(name: impl Into<String>, signature: Signature, f: F) -> Self
        where F: Fn(Args) -> Fut + Send + Sync + 'static,
              Fut: Future<Output = Result<Value, CallError>> + Send + 'static
    {
        let body: AsyncBody = Arc::new(move |args: Args| -> BoxFuture<'static, Result<Value, CallError>> { Box::pin(f(args)) });
        Self { name: name.into(),
               signature,
               body: FunctionBody::Async(body) }
    }

    /// Step síncrono tipado `I -> O`.
    pub fn step<I, O, E, F>(name: impl Into<String>, f: F) -> Self
        where I: DeserializeOwned + DescribeType + 'static,
              O: Serialize + DescribeType + 'static,
              E: Into<BoxError> + 'static,
              F: Fn(I) -> Result<O, E> + Send + Sync + 'static
    {
        let signature = Signature::returning::<O>().typed_param::<I>(STEP_PARAM);
        Self::from_sync(name, signature, move |mut args| {
            let input: I = take_arg(&mut args, STEP_PARAM)?;
            let out = f(input).map_err(CallError::step)?;
            encode(out)
        })
    }

    /// Step asíncrono tipado `I -> Future<O>`.
    pub fn async_step<I, O, E, F, Fut>(name: impl Into<String>, f: F) -> Self
        where I: DeserializeOwned + DescribeType + 'static,
              O: Serialize + DescribeType + Send + 'static,
              E: Into<BoxError> + Send + 'static,
              F: Fn(I) -> Fut + Send + Sync + 'static,
              Fut: Future<Output = Result<O, E>> + Send + 'static
    {
        let signature = Signature::returning::<O>().typed_param::<I>(STEP_PARAM);
        Self::from_async(name, signature, move |mut args| {
            let pending = take_arg::<I>(&mut args, STEP_PARAM).map(&f);
            async move {
                let out = pending?.await.map_err(CallError::step)?;
                encode(out)
            }
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn signature(&self) -> &Signature {
        &self.signature
    }

    pub fn is_async(&self) -> bool {
        matches!(self.body, FunctionBody::Async(_))
    }

    /// Misma función, otra identidad.
    pub fn renamed(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Invocación síncrona; falla si el cuerpo es asíncrono.
    pub fn call(&self, args: Args) -> Result<Value, CallError> {
        match &self.body {
            FunctionBody::Sync(f) => (**f)(args),
            FunctionBody::Async(_) => Err(CallError::AsyncInSyncContext(self.name.clone())),
        }
    }

    pub async fn call_async(&self, args: Args) -> Result<Value, CallError> {
        match &self.body {
            FunctionBody::Sync(f) => (**f)(args),
            FunctionBody::Async(f) => (**f)(args).await,
        }
    }

    /// Como `call_async`, pero un cuerpo síncrono corre en el pool de
    /// bloqueo de tokio para no ocupar el scheduler. Requiere runtime.
    pub async fn call_offloaded(&self, args: Args) -> Result<Value, CallError> {
        match &self.body {
            FunctionBody::Sync(f) => {
                let f = Arc::clone(f);
                tokio::task::spawn_blocking(move || (*f)(args)).await
                                                             .map_err(|e| CallError::Worker(e.to_string()))?
            }
            FunctionBody::Async(f) => (**f)(args).await,
        }
    }

    /// Enlaza un valor único al primer parámetro declarado.
    pub fn single_arg(&self, value: Value) -> Args {
        let key = self.signature
                      .first_param()
                      .map(|p| p.name.clone())
                      .unwrap_or_else(|| STEP_PARAM.to_string());
        let mut args = Args::new();
        args.insert(key, value);
        args
    }
}

impl fmt::Debug for NamedFunction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NamedFunction")
         .field("name", &self.name)
         .field("signature", &self.signature)
         .field("async", &self.is_async())
         .finish()
    }
}

#[async_trait]
impl Callable for NamedFunction {
    fn name(&self) -> &str {
        &self.name
    }

    fn signature(&self) -> &Signature {
        &self.signature
    }

    fn is_async(&self) -> bool {
        matches!(self.body, FunctionBody::Async(_))
    }

    async fn invoke(&self, args: Args) -> Result<Value, CallError> {
        self.call_async(args).await
    }
}

/// Extrae y decodifica un argumento. Los modelos se validan con su esquema;
/// un argumento ausente sólo es válido si el tipo acepta `null` (Option).
pub fn take_arg<T>(args: &mut Args, name: &str) -> Result<T, CallError>
    where T: DeserializeOwned + DescribeType
{
    match args.remove(name) {
        Some(value) => decode_value(name, value),
        None => serde_json::from_value(Value::Null).map_err(|_| CallError::MissingArgument(name.to_string())),
    }
}

/// Variante por referencia de `take_arg`.
pub fn arg<T>(args: &Args, name: &str) -> Result<T, CallError>
    where T: DeserializeOwned + DescribeType
{
    match args.get(name) {
        Some(value) => decode_value(name, value.clone()),
        None => serde_json::from_value(Value::Null).map_err(|_| CallError::MissingArgument(name.to_string())),
    }
}

fn decode_value<T>(name: &str, value: Value) -> Result<T, CallError>
    where T: DeserializeOwned + DescribeType
{
    let value = match T::type_tag().model_schema() {
        Some(schema) => schema.parse(value)?,
        None => value,
    };
    serde_json::from_value(value).map_err(|e| CallError::invalid_argument(name, e.to_string()))
}

fn encode<O: Serialize>(out: O) -> Result<Value, CallError> {
    serde_json::to_value(out).map_err(CallError::step)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::TypeTag;
    use serde_json::json;

    #[test]
    fn typed_step_derives_signature() {
        let f = NamedFunction::step("len", |s: String| Ok::<_, BoxError>(s.len() as i64));
        assert_eq!(f.signature().params()[0].name, STEP_PARAM);
        assert_eq!(f.signature().params()[0].ty, TypeTag::Text);
        assert_eq!(f.signature().returns(), &TypeTag::Int);
        assert!(!f.is_async());

        let out = f.call(f.single_arg(json!("abcd"))).unwrap();
        assert_eq!(out, json!(4));
    }

    #[test]
    fn sync_call_rejects_async_body() {
        let f = NamedFunction::async_step("double", |n: i64| async move { Ok::<_, BoxError>(n * 2) });
        let err = f.call(f.single_arg(json!(1))).unwrap_err();
        assert!(matches!(err, CallError::AsyncInSyncContext(name) if name == "double"));
    }

    #[tokio::test]
    async fn async_call_awaits_async_body() {
        let f = NamedFunction::async_step("double", |n: i64| async move { Ok::<_, BoxError>(n * 2) });
        assert_eq!(f.invoke(f.single_arg(json!(21))).await.unwrap(), json!(42));
    }

    #[tokio::test]
    async fn offloaded_call_runs_sync_body() {
        let f = NamedFunction::step("inc", |n: i64| Ok::<_, BoxError>(n + 1));
        assert_eq!(f.call_offloaded(f.single_arg(json!(1))).await.unwrap(), json!(2));
    }

    #[test]
    fn missing_and_optional_arguments() {
        let mut args = Args::new();
        let err = take_arg::<i64>(&mut args, "n").unwrap_err();
        assert!(matches!(err, CallError::MissingArgument(n) if n == "n"));
        let opt: Option<i64> = take_arg(&mut args, "n").unwrap();
        assert_eq!(opt, None);
    }

    #[test]
    fn wrong_shape_is_invalid_argument() {
        let mut args = Args::new();
        args.insert("n".into(), json!("three"));
        let err = arg::<i64>(&args, "n").unwrap_err();
        assert!(err.is_client_error());
    }

    #[test]
    fn user_errors_propagate() {
        let f = NamedFunction::step("boom", |_: i64| Err::<i64, _>(std::io::Error::other("kaboom")));
        let err = f.call(f.single_arg(json!(0))).unwrap_err();
        assert!(matches!(err, CallError::Step(_)));
        assert_eq!(err.to_string(), "kaboom");
    }

    #[test]
    fn renamed_keeps_body() {
        let f = NamedFunction::step("a", |n: i64| Ok::<_, BoxError>(n)).renamed("b");
        assert_eq!(f.name(), "b");
        assert_eq!(f.call(f.single_arg(json!(7))).unwrap(), json!(7));
    }
}
