mod handlers;
mod state;

use axum::routing::{get, post};
use axum::Router;
use state::AppState;
use std::sync::Arc;
use tower_http::cors::CorsLayer;

use crate::facility::{FacilityResolver, FacilityStore};
use std::sync::Mutex;

pub fn build_router() -> Router {
    let store = FacilityStore::load();
    let resolver = FacilityResolver::from_store(&store);
    build_router_with(store, resolver)
}

pub fn build_router_with(store: FacilityStore, resolver: FacilityResolver) -> Router {
    let state = Arc::new(AppState {
        store: Mutex::new(store),
        resolver: Mutex::new(resolver),
    });

    Router::new()
        .route(
            "/api/facilities",
            get(handlers::list_facilities).post(handlers::add_facility),
        )
        .route(
            "/api/facilities/{index}",
            axum::routing::patch(handlers::update_facility).delete(handlers::remove_facility),
        )
        .route("/api/locate", post(handlers::locate))
        .route("/api/estimate", get(handlers::estimate))
        .layer(CorsLayer::permissive())
        .with_state(state)
}

pub async fn start(host: &str, port: u16) {
    let app = build_router();
    let addr = format!("{}:{}", host, port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .unwrap_or_else(|e| {
            eprintln!("Error: Cannot bind to {}: {}", addr, e);
            std::process::exit(1);
        });

    eprintln!("  Domus Locator server listening on http://{}", addr);
    eprintln!("  Press Ctrl+C to stop.");

    axum::serve(listener, app)
        .await
        .unwrap_or_else(|e| {
            eprintln!("Server error: {}", e);
            std::process::exit(1);
        });
}
