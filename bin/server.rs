// Plate Ledger - Web Server
// REST ingest surface for browser frontends: the detection backend POSTs
// candidate batches, the ledger keeps the deduplicated session state.

use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Json},
    routing::{get, post},
    Router,
};
use plate_ledger::{LedgerEntry, PlateLedger};
use serde::Serialize;
use std::sync::{Arc, Mutex};
use tower_http::cors::CorsLayer;

/// Shared application state
#[derive(Clone)]
struct AppState {
    ledger: Arc<Mutex<PlateLedger>>,
}

/// API Response wrapper
#[derive(Serialize)]
struct ApiResponse<T> {
    success: bool,
    data: T,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

impl<T> ApiResponse<T> {
    fn ok(data: T) -> Self {
        Self {
            success: true,
            data,
            error: None,
        }
    }
}

impl ApiResponse<()> {
    fn err(message: impl Into<String>) -> Self {
        Self {
            success: false,
            data: (),
            error: Some(message.into()),
        }
    }
}

/// Ledger response: the session plus its entries
#[derive(Serialize)]
struct LedgerResponse {
    session_id: String,
    plates: Vec<LedgerEntry>,
}

/// Ingest response: display list only (what the frontend renders)
#[derive(Serialize)]
struct IngestResponse {
    session_id: String,
    plates: Vec<String>,
}

/// Reset response
#[derive(Serialize)]
struct ResetResponse {
    session_id: String,
}

// ============================================================================
// API Handlers
// ============================================================================

/// GET /api/health - Health check
async fn health_check() -> impl IntoResponse {
    Json(ApiResponse::ok("OK"))
}

/// GET /api/plates - Current ledger entries
async fn get_plates(State(state): State<AppState>) -> impl IntoResponse {
    let ledger = state.ledger.lock().unwrap();

    let response = LedgerResponse {
        session_id: ledger.session_id().to_string(),
        plates: ledger.entries().to_vec(),
    };

    (StatusCode::OK, Json(ApiResponse::ok(response))).into_response()
}

/// POST /api/detections - Ingest one batch of detected candidates
///
/// Body: JSON array of strings. A malformed batch is rejected whole
/// with 400; the ledger is left untouched.
async fn post_detections(
    State(state): State<AppState>,
    Json(batch): Json<serde_json::Value>,
) -> impl IntoResponse {
    let mut ledger = state.ledger.lock().unwrap();

    match ledger.ingest_value(&batch) {
        Ok(plates) => {
            let response = IngestResponse {
                session_id: ledger.session_id().to_string(),
                plates,
            };
            (StatusCode::OK, Json(ApiResponse::ok(response))).into_response()
        }
        Err(e) => {
            eprintln!("Rejected batch: {}", e);
            (
                StatusCode::BAD_REQUEST,
                Json(ApiResponse::err(e.to_string())),
            )
                .into_response()
        }
    }
}

/// POST /api/reset - Start a new session
async fn post_reset(State(state): State<AppState>) -> impl IntoResponse {
    let mut ledger = state.ledger.lock().unwrap();
    ledger.reset();

    let response = ResetResponse {
        session_id: ledger.session_id().to_string(),
    };

    (StatusCode::OK, Json(ApiResponse::ok(response))).into_response()
}

// ============================================================================
// Main Server
// ============================================================================

#[tokio::main]
async fn main() {
    println!("🌐 Plate Ledger - Web Server");
    println!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━");

    // Create shared state (one session ledger, serialized by the mutex)
    let state = AppState {
        ledger: Arc::new(Mutex::new(PlateLedger::new())),
    };

    // Build API routes
    let api_routes = Router::new()
        .route("/health", get(health_check))
        .route("/plates", get(get_plates))
        .route("/detections", post(post_detections))
        .route("/reset", post(post_reset))
        .with_state(state.clone());

    // Build main router
    let app = Router::new()
        .nest("/api", api_routes)
        .layer(CorsLayer::permissive());

    // Start server
    let addr = "0.0.0.0:3000";
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .expect("Failed to bind to address");

    println!("\n🚀 Server running on http://localhost:3000");
    println!("   Ingest: POST http://localhost:3000/api/detections");
    println!("   Plates: GET  http://localhost:3000/api/plates");
    println!("\n   Press Ctrl+C to stop\n");

    axum::serve(listener, app)
        .await
        .expect("Failed to start server");
}
