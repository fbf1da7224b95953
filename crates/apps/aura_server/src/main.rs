use std::env;
use std::net::SocketAddr;
use std::sync::Arc;

use axum::extract::State;
use axum::http::{Method, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use streaming::protocol::{SearchRequest, SearchResponse, SEARCH_PATH};
use streaming::search::{RegionSearch, StaticPlaces};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

#[derive(Clone)]
struct AppState {
    places: Arc<StaticPlaces>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let addr: SocketAddr = env::var("PLACES_ADDR")
        .unwrap_or_else(|_| "127.0.0.1:9200".to_string())
        .parse()?;

    let places = match env::var("PLACES_FILE") {
        Ok(path) => {
            let json = tokio::fs::read_to_string(&path).await?;
            let places = StaticPlaces::from_json(&json)?;
            info!("loaded {} places from {path}", places.len());
            places
        }
        Err(_) => {
            warn!("PLACES_FILE not set; serving an empty catalog");
            StaticPlaces::default()
        }
    };

    let app = router(AppState {
        places: Arc::new(places),
    });

    info!("places server listening on http://{addr}");
    axum::serve(tokio::net::TcpListener::bind(addr).await?, app).await?;
    Ok(())
}

fn router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_headers(Any)
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS]);

    Router::new()
        .route("/healthz", get(healthz))
        .route(SEARCH_PATH, post(search_locations))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn healthz() -> Response {
    (StatusCode::OK, "ok").into_response()
}

async fn search_locations(
    State(state): State<AppState>,
    Json(req): Json<SearchRequest>,
) -> Response {
    match state.places.search_region(req.bounds).await {
        Ok(locations) => {
            info!("search {:?}: {} places", req.bounds, locations.len());
            Json(SearchResponse { locations }).into_response()
        }
        Err(err) => {
            error!("search failed: {err}");
            (StatusCode::INTERNAL_SERVER_ERROR, "search failed").into_response()
        }
    }
}
