//! Aplicación de ejemplo: algunas funciones sueltas y una pipeline de
//! cotización registradas como endpoints.
//!
//! | ruta           | métodos    | binding                |
//! |----------------|------------|------------------------|
//! | /add           | GET, POST  | query (a, b)           |
//! | /echo          | POST       | body desempaquetado    |
//! | /create_item   | POST       | modelo `Item`          |
//! | /upload_size   | POST       | archivo multipart      |
//! | /quote         | POST       | pipeline síncrona      |
//! | /quote_async   | POST       | pipeline asíncrona     |

use axum::Router;
use brick_api::ApiBuilder;
use brick_core::{arg, typed_model, BoxError, NamedFunction, Pipeline, Signature, UploadFile};
use serde_json::{json, Value};

use crate::errors::AppError;

/// Precio unitario base de la pipeline de cotización.
pub const UNIT_PRICE: f64 = 0.75;

typed_model!(Item { name: String, quantity: i64 } validate(item) {
    if item.name.trim().is_empty() {
        Err("name must not be empty".into())
    } else if item.quantity < 0 {
        Err("quantity must not be negative".into())
    } else {
        Ok(())
    }
});

typed_model!(PricedItem { name: String, quantity: i64, subtotal: f64 });

typed_model!(Quote { name: String, quantity: i64, total: f64, discounted: bool });

pub fn add() -> NamedFunction {
    let signature = Signature::returning::<i64>().typed_param::<i64>("a")
                                                 .typed_param::<i64>("b");
    NamedFunction::from_sync("add", signature, |call| {
        let a: i64 = arg(&call, "a")?;
        let b: i64 = arg(&call, "b")?;
        Ok(json!(a + b))
    })
}

/// Devuelve los argumentos tal como llegan: un body se ve desempaquetado.
pub fn echo() -> NamedFunction {
    NamedFunction::from_sync("echo", Signature::default().untyped_param("payload"), |call| Ok(Value::Object(call)))
}

pub fn create_item() -> NamedFunction {
    NamedFunction::async_step("create_item", |item: Item| async move {
        Ok::<_, BoxError>(Item { name: item.name.trim().to_lowercase(),
                                 quantity: item.quantity })
    })
}

pub fn upload_size() -> NamedFunction {
    let signature = Signature::returning::<Value>().typed_param::<UploadFile>("file");
    NamedFunction::from_sync("upload_size", signature, |call| {
        let file: UploadFile = arg(&call, "file")?;
        Ok(json!({ "filename": file.filename, "size": file.len() }))
    })
}

fn price() -> NamedFunction {
    NamedFunction::step("price", |item: Item| {
        Ok::<_, BoxError>(PricedItem { subtotal: item.quantity as f64 * UNIT_PRICE,
                                       name: item.name,
                                       quantity: item.quantity })
    })
}

fn bulk_discount() -> NamedFunction {
    NamedFunction::step("bulk_discount", |p: PricedItem| {
        let discounted = p.quantity >= 100;
        let total = if discounted { p.subtotal * 0.9 } else { p.subtotal };
        Ok::<_, BoxError>(Quote { name: p.name,
                                  quantity: p.quantity,
                                  total,
                                  discounted })
    })
}

pub fn quote_pipeline() -> Pipeline {
    Pipeline::init("quote").functions(vec![price(), bulk_discount()])
}

pub fn functions() -> Result<Vec<NamedFunction>, AppError> {
    let pipeline = quote_pipeline();
    Ok(vec![add(),
            echo(),
            create_item(),
            upload_size(),
            pipeline.to_function()?,
            pipeline.to_afunction()?])
}

pub fn build_app() -> Result<Router, AppError> {
    let api = ApiBuilder::init().add_endpoint_to_router(functions()?)?;
    Ok(api.update_app(Router::new()))
}
