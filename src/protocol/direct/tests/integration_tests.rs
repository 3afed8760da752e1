// Copyright (c) 2025 ExtDirect Authors
//
// Licensed under dual license:
// - MIT License (LICENSE-MIT or https://opensource.org/licenses/MIT)
// - Apache License, Version 2.0 (LICENSE-APACHE or https://www.apache.org/licenses/LICENSE-2.0)

//! Integration tests driving the axum boundary handlers end to end.

use std::sync::Arc;

use axum::body::{to_bytes, Body};
use axum::extract::Request;
use axum::http::{header, StatusCode};
use axum::middleware::{self, Next};
use axum::response::Response;
use axum::routing::{get, post};
use axum::Router;
use tower::ServiceExt;

use crate::protocol::direct::tests::fixtures::provider_with_db;
use crate::protocol::direct::{
    actions_handler, actions_handler_ctx, api_handler, router, DirectContext,
};

const DB_API_SCRIPT: &str = r#"Ext.ns("DirectApi");DirectApi.REMOTE_API={"type":"remoting","url":"/directapi","namespace":"DirectApi","timeout":30000,"actions":{"Db":[{"name":"getRecords","len":1},{"name":"test","len":0},{"name":"testEcho1","len":1},{"name":"testEcho2","len":7},{"name":"testException1","len":0},{"name":"testException2","len":0},{"name":"testException3","len":0},{"name":"testException4","len":0},{"name":"updateBasicInfo","formHander":true}]}}"#;

/// Host middleware installing the per-request context, the way an embedding
/// application would.
async fn attach_user(mut request: Request, next: Next) -> Response {
    request
        .extensions_mut()
        .insert(DirectContext::new().with_value("user", "TestUser"));
    next.run(request).await
}

fn test_app() -> Router {
    let provider = Arc::new(provider_with_db());
    Router::new()
        .route("/directapi", get(api_handler).post(actions_handler_ctx))
        .route("/directapi2", post(actions_handler))
        .layer(middleware::from_fn(attach_user))
        .with_state(provider)
}

async fn body_text(response: Response) -> String {
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    String::from_utf8(bytes.to_vec()).unwrap()
}

#[tokio::test]
async fn test_api_script_endpoint() {
    let response = test_app()
        .oneshot(
            Request::builder()
                .uri("/directapi")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response.headers().get(header::CONTENT_TYPE).unwrap(),
        "text/javascript; charset=utf-8"
    );
    assert_eq!(body_text(response).await, DB_API_SCRIPT);
}

#[tokio::test]
async fn test_default_router_serves_the_provider_url() {
    let app = router(Arc::new(provider_with_db()));
    let response = app
        .oneshot(
            Request::builder()
                .uri("/directapi")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_text(response).await, DB_API_SCRIPT);
}

#[tokio::test]
async fn test_json_transaction_with_context() {
    let response = test_app()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/directapi")
                .header(header::CONTENT_TYPE, "application/json")
                .header(header::HOST, "test2")
                .body(Body::from(
                    r#"{"action":"Db","method":"test","data":null,"type":"rpc","tid":33}"#,
                ))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response.headers().get(header::CONTENT_TYPE).unwrap(),
        "application/json; charset=utf-8"
    );
    assert_eq!(
        body_text(response).await,
        r#"[{"type":"rpc","tid":33,"action":"Db","method":"test","result":"TestUsertest2"}]"#
    );
}

#[tokio::test]
async fn test_json_transaction_without_context() {
    let response = test_app()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/directapi2")
                .header(header::CONTENT_TYPE, "application/json")
                .header(header::HOST, "test2")
                .body(Body::from(
                    r#"{"action":"Db","method":"test","data":null,"type":"rpc","tid":33}"#,
                ))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        body_text(response).await,
        r#"[{"type":"rpc","tid":33,"action":"Db","method":"test","result":"test2"}]"#
    );
}

#[tokio::test]
async fn test_exception_method_over_http() {
    let response = test_app()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/directapi")
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(
                    r#"{"action":"Db","method":"testException1","data":null,"type":"rpc","tid":40}"#,
                ))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        body_text(response).await,
        r#"[{"type":"exception","tid":40,"action":"Db","method":"testException1","message":"Error example #1"}]"#
    );
}

#[tokio::test]
async fn test_form_handler_over_http() {
    let response = test_app()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/directapi")
                .header(
                    header::CONTENT_TYPE,
                    "application/x-www-form-urlencoded; charset=UTF-8",
                )
                .body(Body::from(
                    "extTID=1&extAction=Db&extMethod=updateBasicInfo&extType=rpc&extUpload=false&foo=bar&uid=34&name=Aaron%20Conran&email=aaron%40sencha1.com&company=Sencha%20Inc.",
                ))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    // A form transaction answers with the bare envelope, not an array.
    assert_eq!(
        body_text(response).await,
        r#"{"type":"rpc","tid":1,"action":"Db","method":"updateBasicInfo","result":{"success":true}}"#
    );
}

#[tokio::test]
async fn test_form_handler_validation_failure_over_http() {
    let response = test_app()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/directapi")
                .header(
                    header::CONTENT_TYPE,
                    "application/x-www-form-urlencoded; charset=UTF-8",
                )
                .body(Body::from(
                    "extTID=1&extAction=Db&extMethod=updateBasicInfo&extType=rpc&extUpload=false&foo=bar&uid=34&name=Aaron%20Conran&email=aaron%40sencha.com&company=Sencha%20Inc.",
                ))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        body_text(response).await,
        r#"{"type":"rpc","tid":1,"action":"Db","method":"updateBasicInfo","result":{"errors":{"email":"already exists"},"success":false}}"#
    );
}

#[tokio::test]
async fn test_unsupported_content_type_is_a_host_failure() {
    let response = test_app()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/directapi")
                .header(header::CONTENT_TYPE, "text/plain")
                .body(Body::from("whatever"))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    assert!(body_text(response)
        .await
        .contains("invalid content type: text/plain"));
}

#[tokio::test]
async fn test_malformed_json_is_a_host_failure() {
    let response = test_app()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/directapi")
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from("{not json"))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    assert!(body_text(response)
        .await
        .contains("cannot parse transaction body"));
}
