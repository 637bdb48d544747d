//! In-process ticket backend for integration tests.

#![allow(dead_code)]

use std::net::SocketAddr;
use std::sync::Arc;

use axum::extract::{Path, State};
use axum::http::{StatusCode, header};
use axum::response::{IntoResponse, Response};
use axum::routing::{delete, get, post};
use axum::{Json, Router};
use parking_lot::Mutex;
use serde_json::{Value, json};
use tokio::sync::oneshot;

/// Request seen by the stub, as `(method path, body)`.
pub type Recorded = (String, Value);

#[derive(Clone, Default)]
pub struct StubState {
    pub current_card: Arc<Mutex<Option<String>>>,
    pub weight: Arc<Mutex<f64>>,
    pub requests: Arc<Mutex<Vec<Recorded>>>,
}

impl StubState {
    pub fn set_card(&self, card: Option<&str>) {
        *self.current_card.lock() = card.map(str::to_string);
    }

    pub fn set_weight(&self, weight: f64) {
        *self.weight.lock() = weight;
    }

    pub fn requests(&self) -> Vec<Recorded> {
        self.requests.lock().clone()
    }

    pub fn requests_to(&self, prefix: &str) -> Vec<Recorded> {
        self.requests()
            .into_iter()
            .filter(|(line, _)| line.starts_with(prefix))
            .collect()
    }

    pub fn requests_exact(&self, line: &str) -> Vec<Recorded> {
        self.requests()
            .into_iter()
            .filter(|(seen, _)| seen == line)
            .collect()
    }

    fn record(&self, line: String, body: Value) {
        self.requests.lock().push((line, body));
    }
}

pub struct StubServer {
    pub base_url: String,
    pub state: StubState,
    shutdown: Option<oneshot::Sender<()>>,
}

impl Drop for StubServer {
    fn drop(&mut self) {
        if let Some(tx) = self.shutdown.take() {
            let _ = tx.send(());
        }
    }
}

fn json_error(status: StatusCode, message: &str) -> Response {
    (status, Json(json!({ "error": message }))).into_response()
}

async fn current_card(State(state): State<StubState>) -> Json<Value> {
    let card = state.current_card.lock().clone();
    Json(json!({ "card_id": card }))
}

async fn read_weight(State(state): State<StubState>) -> Response {
    let weight = *state.weight.lock();
    if weight < 0.0 {
        return (StatusCode::SERVICE_UNAVAILABLE, "scale offline").into_response();
    }
    Json(json!({ "weight": weight })).into_response()
}

/// Card `FAIL` gets a JSON error, card `PLAIN` an HTML error page.
async fn create_ticket(
    State(state): State<StubState>,
    Json(body): Json<Value>,
) -> Response {
    state.record("POST /api/tickets".to_string(), body.clone());
    match body["rfid_card"].as_str() {
        Some("FAIL") => {
            json_error(StatusCode::INTERNAL_SERVER_ERROR, "db down")
        }
        Some("PLAIN") => (
            StatusCode::BAD_GATEWAY,
            [(header::CONTENT_TYPE, "text/html")],
            "<h1>Bad Gateway</h1>",
        )
            .into_response(),
        Some("GARBLED") => (StatusCode::CREATED, Json(json!({ "ticket": 1 })))
            .into_response(),
        _ => (StatusCode::CREATED, Json(json!({ "id": 42 }))).into_response(),
    }
}

async fn close_ticket(
    State(state): State<StubState>,
    Path(id): Path<String>,
    Json(body): Json<Value>,
) -> Response {
    state.record(format!("POST /api/tickets/{id}/close"), body);
    if id == "404" {
        return json_error(StatusCode::NOT_FOUND, "Ticket not found");
    }
    Json(json!({ "success": true, "ticket": { "id": id, "status": "closed" } }))
        .into_response()
}

async fn delete_ticket(
    State(state): State<StubState>,
    Path(id): Path<String>,
) -> Response {
    state.record(format!("DELETE /api/tickets/{id}"), Value::Null);
    if id == "404" {
        return json_error(StatusCode::NOT_FOUND, "Ticket not found");
    }
    Json(json!({})).into_response()
}

async fn print_ticket(
    State(state): State<StubState>,
    Path(id): Path<String>,
) -> Json<Value> {
    state.record(format!("POST /api/tickets/{id}/print"), Value::Null);
    Json(json!({ "success": true, "message": format!("Ticket {id} sent to printer") }))
}

async fn create_customer(
    State(state): State<StubState>,
    Json(body): Json<Value>,
) -> Response {
    state.record("POST /api/customers".to_string(), body);
    (StatusCode::CREATED, Json(json!({ "id": 5, "name": "Acme" })))
        .into_response()
}

async fn print_label(
    State(state): State<StubState>,
    Path(id): Path<String>,
) -> Json<Value> {
    state.record(format!("POST /api/customers/{id}/print-label"), Value::Null);
    Json(json!({ "success": true }))
}

pub async fn start_stub_server() -> StubServer {
    let state = StubState::default();
    let app = Router::new()
        .route("/api/rfid/current", get(current_card))
        .route("/api/weight/read", get(read_weight))
        .route("/api/tickets", post(create_ticket))
        .route("/api/tickets/{id}", delete(delete_ticket))
        .route("/api/tickets/{id}/close", post(close_ticket))
        .route("/api/tickets/{id}/print", post(print_ticket))
        .route("/api/customers", post(create_customer))
        .route("/api/customers/{id}/print-label", post(print_label))
        .with_state(state.clone());

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("bind listener");
    let addr: SocketAddr = listener.local_addr().expect("listener addr");
    let (shutdown_tx, shutdown_rx) = oneshot::channel::<()>();

    tokio::spawn(async move {
        axum::serve(listener, app)
            .with_graceful_shutdown(async {
                let _ = shutdown_rx.await;
            })
            .await
            .expect("serve stub backend");
    });

    StubServer {
        base_url: format!("http://{addr}"),
        state,
        shutdown: Some(shutdown_tx),
    }
}
