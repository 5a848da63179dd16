//! Rutas HTTP generadas por `ApiBuilder`, ejercitadas con `oneshot`.

use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use axum::Router;
use brick_api::ApiBuilder;
use brick_core::{arg, typed_model, BoxError, NamedFunction, Pipeline, Signature, UploadFile};
use http_body_util::BodyExt;
use serde_json::{json, Value};
use tower::ServiceExt;

typed_model!(Item { name: String, price: f64 } validate(i) {
    if i.price >= 0.0 { Ok(()) } else { Err("price must not be negative".into()) }
});
typed_model!(Tagged { name: String, price: f64, tag: String });

fn add() -> NamedFunction {
    NamedFunction::from_sync("add",
                             Signature::returning::<i64>().typed_param::<i64>("a").typed_param::<i64>("b"),
                             |call| Ok(json!(arg::<i64>(&call, "a")? + arg::<i64>(&call, "b")?)))
}

fn keys() -> NamedFunction {
    NamedFunction::from_sync("keys", Signature::default().untyped_param("payload"), |call| {
        Ok(json!(call.keys().cloned().collect::<Vec<_>>()))
    })
}

fn tag() -> NamedFunction {
    NamedFunction::step("tag", |item: Item| {
        Ok::<_, BoxError>(Tagged { tag: format!("#{}", item.name),
                                   name: item.name,
                                   price: item.price })
    })
}

fn sizes() -> NamedFunction {
    NamedFunction::from_sync("sizes",
                             Signature::returning::<Vec<i64>>().typed_param::<Vec<UploadFile>>("files"),
                             |call| {
                                 let files: Vec<UploadFile> = arg(&call, "files")?;
                                 Ok(json!(files.iter().map(|f| f.len()).collect::<Vec<_>>()))
                             })
}

fn app() -> Router {
    let discount = Pipeline::init("discount").functions(vec![NamedFunction::step("half", |item: Item| {
                                                 Ok::<_, BoxError>(Item { price: item.price / 2.0,
                                                                          ..item })
                                             })])
                                             .to_afunction()
                                             .unwrap();
    ApiBuilder::init().add_endpoint_to_router(vec![add(), keys(), tag(), sizes(), discount])
                      .unwrap()
                      .update_app(Router::new())
}

async fn send(app: Router, request: Request<Body>) -> (StatusCode, Value) {
    let resp = app.oneshot(request).await.unwrap();
    let status = resp.status();
    let bytes = resp.into_body().collect().await.unwrap().to_bytes();
    let body = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
    (status, body)
}

fn json_post(uri: &str, body: Value) -> Request<Body> {
    Request::builder().method("POST")
                      .uri(uri)
                      .header(header::CONTENT_TYPE, "application/json")
                      .body(Body::from(body.to_string()))
                      .unwrap()
}

#[tokio::test]
async fn query_endpoint_accepts_get_and_post() {
    let get = Request::builder().uri("/add?a=2&b=3").body(Body::empty()).unwrap();
    assert_eq!(send(app(), get).await, (StatusCode::OK, json!(5)));

    let post = Request::builder().method("POST").uri("/add?a=10&b=-1").body(Body::empty()).unwrap();
    assert_eq!(send(app(), post).await, (StatusCode::OK, json!(9)));
}

#[tokio::test]
async fn query_endpoint_ignores_non_json_body() {
    let post = Request::builder().method("POST")
                                 .uri("/add?a=1&b=2")
                                 .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
                                 .body(Body::from("x=1"))
                                 .unwrap();
    assert_eq!(send(app(), post).await, (StatusCode::OK, json!(3)));
}

#[tokio::test]
async fn bad_query_value_is_422() {
    let get = Request::builder().uri("/add?a=two&b=3").body(Body::empty()).unwrap();
    let (status, body) = send(app(), get).await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert!(body["detail"].as_str().unwrap().contains("'a'"));
}

#[tokio::test]
async fn body_endpoint_is_post_only_and_unpacks() {
    let get = Request::builder().uri("/keys").body(Body::empty()).unwrap();
    let (status, _) = send(app(), get).await;
    assert_eq!(status, StatusCode::METHOD_NOT_ALLOWED);

    let (status, body) = send(app(), json_post("/keys", json!({"a": 1, "b": 2}))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!(["a", "b"]));
}

#[tokio::test]
async fn model_endpoint_validates_and_dumps() {
    let (status, body) = send(app(), json_post("/tag", json!({"name": "brick", "price": 2.0}))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({"name": "brick", "price": 2.0, "tag": "#brick"}));

    let (status, body) = send(app(), json_post("/tag", json!({"name": "brick", "price": -1.0}))).await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert!(body["detail"].as_str().unwrap().contains("price must not be negative"));
}

#[tokio::test]
async fn malformed_json_is_422() {
    let req = Request::builder().method("POST")
                                .uri("/tag")
                                .header(header::CONTENT_TYPE, "application/json")
                                .body(Body::from("{not json"))
                                .unwrap();
    let (status, _) = send(app(), req).await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
}

#[tokio::test]
async fn uploads_arrive_via_multipart() {
    let boundary = "XBRICKBOUNDARY";
    let body = format!("--{b}\r\nContent-Disposition: form-data; name=\"files\"; filename=\"a.txt\"\r\nContent-Type: text/plain\r\n\r\nhello\r\n\
                        --{b}\r\nContent-Disposition: form-data; name=\"files\"; filename=\"b.txt\"\r\nContent-Type: text/plain\r\n\r\nhi\r\n\
                        --{b}--\r\n",
                       b = boundary);
    let req = Request::builder().method("POST")
                                .uri("/sizes")
                                .header(header::CONTENT_TYPE, format!("multipart/form-data; boundary={boundary}"))
                                .body(Body::from(body))
                                .unwrap();
    assert_eq!(send(app(), req).await, (StatusCode::OK, json!([5, 2])));

    let get = Request::builder().uri("/sizes").body(Body::empty()).unwrap();
    assert_eq!(send(app(), get).await.0, StatusCode::METHOD_NOT_ALLOWED);
}

#[tokio::test]
async fn compiled_pipelines_register_like_any_function() {
    let (status, body) = send(app(), json_post("/discount_async", json!({"name": "brick", "price": 3.0}))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({"name": "brick", "price": 1.5}));
}

#[tokio::test]
async fn unknown_routes_are_404() {
    let get = Request::builder().uri("/nope").body(Body::empty()).unwrap();
    assert_eq!(send(app(), get).await.0, StatusCode::NOT_FOUND);
}
