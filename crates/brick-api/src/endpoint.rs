//! Adaptador de endpoint.
//!
//! Envuelve una `NamedFunction` ya clasificada. `invoke` recompone los
//! argumentos enlazados según su binding (los body se desempaquetan, los
//! modelos se validan) y normaliza un resultado-modelo a mapping plano.
//! `handle` es la cara HTTP: lee la petición, enlaza y responde JSON.

use std::collections::HashMap;
use std::sync::Arc;

use axum::extract::{FromRequest, Multipart, Query, Request};
use axum::http::header;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post, MethodRouter};
use axum::Json;
use brick_core::{classify, method_set, Args, BindingKind, CallError, Callable, MethodSet, ParamDescriptor, UploadFile, ValidationError};
use log::debug;
use serde_json::Value;

use crate::binding::{bind, FormData, RequestPayload};
use crate::errors::ApiError;

const BODY_LIMIT: usize = 2 * 1024 * 1024;

#[derive(Debug)]
pub struct Endpoint {
    function: Box<dyn Callable>,
    params: Vec<ParamDescriptor>,
    methods: MethodSet,
}

impl Endpoint {
    pub fn new(function: impl Callable + 'static) -> Self {
        let params = classify(function.signature());
        let methods = method_set(&params);
        Self { function: Box::new(function),
               params,
               methods }
    }

    pub fn name(&self) -> &str {
        self.function.name()
    }

    pub fn path(&self) -> String {
        format!("/{}", self.function.name())
    }

    pub fn params(&self) -> &[ParamDescriptor] {
        &self.params
    }

    pub fn methods(&self) -> MethodSet {
        self.methods
    }

    /// Invoca la función con los valores enlazados por nombre. Nombres que
    /// no son parámetros declarados se ignoran.
    pub async fn invoke(&self, bound: Args) -> Result<Value, CallError> {
        let mut call = Args::new();
        for (name, value) in bound {
            let Some(param) = self.params.iter().find(|p| p.name == name) else {
                continue;
            };
            match param.binding {
                BindingKind::Body => match value {
                    Value::Object(fields) => call.extend(fields),
                    other => {
                        return Err(ValidationError::new(name, format!("expected an object to unpack, got {other}")).into());
                    }
                },
                BindingKind::Model => {
                    let parsed = match param.ty.model_schema() {
                        Some(schema) => schema.parse(value)?,
                        None => value,
                    };
                    call.insert(name, parsed);
                }
                BindingKind::Query | BindingKind::File => {
                    call.insert(name, value);
                }
            }
        }

        let result = self.function.invoke(call).await?;
        match self.function.signature().returns().model_schema() {
            Some(schema) if result.is_object() => Ok(schema.dump(result)?),
            _ => Ok(result),
        }
    }

    pub async fn handle(&self, request: Request) -> Response {
        match self.dispatch(request).await {
            Ok(value) => Json(value).into_response(),
            Err(err) => err.into_response(),
        }
    }

    async fn dispatch(&self, request: Request) -> Result<Value, ApiError> {
        let Query(query) = Query::<HashMap<String, String>>::try_from_uri(request.uri())
            .map_err(|e| ApiError::MalformedQuery(e.to_string()))?;
        debug!("{} {}", request.method(), self.path());
        // Sin parámetros body/model/file el cuerpo no se lee.
        let payload = if self.params.iter().all(|p| p.binding == BindingKind::Query) {
            RequestPayload::Empty
        } else {
            read_payload(request).await?
        };
        let bound = bind(&self.params, &query, payload)?;
        Ok(self.invoke(bound).await?)
    }

    /// Router de métodos según la heurística de clasificación.
    pub fn into_method_router(self: Arc<Self>) -> MethodRouter {
        let methods = self.methods;
        let handler = move |request: Request| {
            let endpoint = Arc::clone(&self);
            async move { endpoint.handle(request).await }
        };
        match methods {
            MethodSet::ReadWrite => get(handler.clone()).post(handler),
            MethodSet::WriteOnly => post(handler),
        }
    }
}

async fn read_payload(request: Request) -> Result<RequestPayload, ApiError> {
    let is_multipart = request.headers()
                              .get(header::CONTENT_TYPE)
                              .and_then(|v| v.to_str().ok())
                              .is_some_and(|ct| ct.starts_with("multipart/form-data"));
    if is_multipart {
        let mut multipart = Multipart::from_request(request, &()).await
                                                                 .map_err(|e| ApiError::Multipart(e.to_string()))?;
        let mut form = FormData::default();
        while let Some(field) = multipart.next_field().await.map_err(|e| ApiError::Multipart(e.to_string()))? {
            let name = field.name().unwrap_or_default().to_string();
            let filename = field.file_name().map(str::to_string);
            let content_type = field.content_type().map(str::to_string);
            let data = field.bytes().await.map_err(|e| ApiError::Multipart(e.to_string()))?;
            match filename {
                Some(filename) => form.files
                                      .entry(name)
                                      .or_default()
                                      .push(UploadFile::new(filename, content_type, data.to_vec())),
                None => {
                    form.fields.insert(name, String::from_utf8_lossy(&data).into_owned());
                }
            }
        }
        return Ok(RequestPayload::Form(form));
    }

    let bytes = axum::body::to_bytes(request.into_body(), BODY_LIMIT).await
                                                                     .map_err(|e| ApiError::MalformedBody(e.to_string()))?;
    if bytes.is_empty() {
        return Ok(RequestPayload::Empty);
    }
    serde_json::from_slice(&bytes).map(RequestPayload::Json)
                                  .map_err(|e| ApiError::MalformedBody(e.to_string()))
}
