//! Binding de una petición a argumentos nombrados.
//!
//! - query: valor del query string convertido al escalar declarado.
//! - body / model: del cuerpo JSON. Con un único parámetro de este tipo el
//!   cuerpo entero es su valor; con varios se lee `cuerpo[nombre]`. En
//!   peticiones multipart se leen de los campos de texto homónimos.
//! - file: campos multipart con filename y el nombre del parámetro.

use std::collections::HashMap;

use brick_core::{Args, BindingKind, CallError, ParamDescriptor, TypeTag, UploadFile};
use serde_json::{Number, Value};

/// Contenido del cuerpo de la petición ya leído.
#[derive(Debug)]
pub enum RequestPayload {
    Empty,
    Json(Value),
    Form(FormData),
}

#[derive(Debug, Default)]
pub struct FormData {
    pub files: HashMap<String, Vec<UploadFile>>,
    pub fields: HashMap<String, String>,
}

pub fn bind(params: &[ParamDescriptor], query: &HashMap<String, String>, mut payload: RequestPayload) -> Result<Args, CallError> {
    let embed = params.iter()
                      .filter(|p| matches!(p.binding, BindingKind::Body | BindingKind::Model))
                      .count()
                > 1;
    let mut args = Args::new();
    for p in params {
        let value = match p.binding {
            BindingKind::Query => {
                let raw = query.get(&p.name).ok_or_else(|| CallError::MissingArgument(p.name.clone()))?;
                coerce_scalar(&p.name, &p.ty, raw)?
            }
            BindingKind::Body | BindingKind::Model => body_value(&p.name, &payload, embed)?,
            BindingKind::File => file_value(p, &mut payload)?,
        };
        args.insert(p.name.clone(), value);
    }
    Ok(args)
}

fn body_value(name: &str, payload: &RequestPayload, embed: bool) -> Result<Value, CallError> {
    let found = match payload {
        RequestPayload::Json(body) if embed => body.get(name).cloned(),
        RequestPayload::Json(body) => Some(body.clone()),
        RequestPayload::Form(form) => form.fields
                                          .get(name)
                                          .map(|raw| serde_json::from_str(raw).unwrap_or_else(|_| Value::String(raw.clone()))),
        RequestPayload::Empty => None,
    };
    found.ok_or_else(|| CallError::MissingArgument(name.to_string()))
}

fn file_value(param: &ParamDescriptor, payload: &mut RequestPayload) -> Result<Value, CallError> {
    let missing = || CallError::MissingArgument(param.name.clone());
    let RequestPayload::Form(form) = payload else {
        return Err(missing());
    };
    let mut uploads = form.files.remove(&param.name).ok_or_else(missing)?;
    let value = match param.ty {
        TypeTag::UploadList => serde_json::to_value(uploads),
        _ if uploads.is_empty() => return Err(missing()),
        _ => serde_json::to_value(uploads.swap_remove(0)),
    };
    value.map_err(|e| CallError::invalid_argument(&param.name, e.to_string()))
}

/// Convierte un valor textual del query string al escalar declarado.
pub fn coerce_scalar(name: &str, ty: &TypeTag, raw: &str) -> Result<Value, CallError> {
    let invalid = |expected: &str| CallError::invalid_argument(name, format!("expected {expected}, got '{raw}'"));
    let trimmed = raw.trim();
    match ty {
        TypeTag::Int => trimmed.parse::<i64>().map(Value::from).map_err(|_| invalid("int")),
        TypeTag::Float => trimmed.parse::<f64>()
                                 .ok()
                                 .and_then(Number::from_f64)
                                 .map(Value::Number)
                                 .ok_or_else(|| invalid("float")),
        TypeTag::Bool => match trimmed.to_ascii_lowercase().as_str() {
            "true" | "1" | "yes" | "on" => Ok(Value::Bool(true)),
            "false" | "0" | "no" | "off" => Ok(Value::Bool(false)),
            _ => Err(invalid("bool")),
        },
        _ => Ok(Value::String(raw.to_string())),
    }
}
