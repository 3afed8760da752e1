//! Example embedding application for the Ext.Direct provider.
//!
//! Registers a `Db` action and serves the API script and transaction
//! endpoints over axum:
//!
//! ```bash
//! cargo run --example server
//! curl http://127.0.0.1:8000/directapi
//! ```

use std::collections::HashMap;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use extdirect::error::TracingLogSink;
use extdirect::protocol::direct::{
    router, DirectAction, DirectServiceProvider, FormHandlerResult, MethodCatalog,
};

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct GetDataRequest {
    page: i64,
    start: i64,
    limit: i64,
    model: String,
}

#[derive(Debug, Serialize)]
struct GetDataResponse {
    total: usize,
    records: Vec<User>,
}

#[derive(Debug, Serialize)]
struct User {
    id: i64,
    text: String,
}

#[derive(Default)]
struct Db;

impl DirectAction for Db {
    fn register_methods(catalog: &mut MethodCatalog<Self>) {
        catalog.rpc("GetRecords", |_: Db, query: GetDataRequest| async move {
            tracing::info!(
                model = %query.model,
                page = query.page,
                start = query.start,
                limit = query.limit,
                "get records"
            );
            GetDataResponse {
                total: 2,
                records: vec![
                    User {
                        id: 1,
                        text: "Bob".to_string(),
                    },
                    User {
                        id: 2,
                        text: "Alice".to_string(),
                    },
                ],
            }
        });
        catalog.rpc("TestEcho1", |_: Db, text: String| async move { text });
        catalog.form_handler(
            "UpdateBasicInfo",
            |_: Db, fields: HashMap<String, String>| async move {
                match fields.get("email") {
                    Some(email) if !email.is_empty() => FormHandlerResult::success(),
                    _ => FormHandlerResult::success().with_error("email", "required"),
                }
            },
        );
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let mut provider = DirectServiceProvider::new();
    provider.set_debug(true);
    provider.set_profile(true);
    provider.set_log_sink(Arc::new(TracingLogSink));
    provider.register_action::<Db>();
    let provider = Arc::new(provider);

    let app = router(provider.clone());
    let listener = tokio::net::TcpListener::bind("127.0.0.1:8000").await?;
    tracing::info!(
        "serving Ext.Direct API at http://{}{}",
        listener.local_addr()?,
        provider.url()
    );
    axum::serve(listener, app).await?;
    Ok(())
}
