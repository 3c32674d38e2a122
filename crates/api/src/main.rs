use std::sync::Arc;

use ampere_infra::{JsonFileSnapshotStore, Ledger};

#[tokio::main]
async fn main() {
    ampere_observability::init();

    let ledger = match std::env::var("AMPERE_SNAPSHOT_PATH") {
        Ok(path) => {
            tracing::info!(%path, "snapshot persistence enabled");
            Ledger::new(Box::new(JsonFileSnapshotStore::new(path)))
        }
        Err(_) => {
            tracing::warn!("AMPERE_SNAPSHOT_PATH not set; ledger state will not survive restarts");
            Ledger::in_memory()
        }
    };

    let app = ampere_api::app::build_app(Arc::new(ledger));

    let bind = std::env::var("AMPERE_BIND").unwrap_or_else(|_| "0.0.0.0:8080".to_string());
    let listener = tokio::net::TcpListener::bind(&bind)
        .await
        .expect("failed to bind listen address");

    tracing::info!("listening on {}", listener.local_addr().unwrap());

    axum::serve(listener, app).await.unwrap();
}
