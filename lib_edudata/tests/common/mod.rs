//! In-process mock of the EduData backend, served by `axum` on an ephemeral port.
//!
//! Every request is recorded. Scripted responses, when queued, win over the
//! built-in `/docentes` and `/auth` behaviour.

#![allow(dead_code)]

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use axum::body::Bytes;
use axum::extract::State;
use axum::http::{header, HeaderMap, Method, StatusCode, Uri};
use axum::response::{IntoResponse, Response};
use axum::{Json, Router};
use serde_json::{json, Value};

use lib_edudata::configs::ClientConfig;

pub const VALID_TOKEN: &str = "tok-1";

#[derive(Debug, Clone)]
pub struct Call {
    pub method: Method,
    pub path: String,
    pub authorization: Option<String>,
    pub body: Option<Value>,
}

/// A canned answer: status plus optional JSON or raw text body.
#[derive(Debug, Clone)]
pub enum Scripted {
    Json(u16, Value),
    Text(u16, String),
    Empty(u16),
}

#[derive(Debug, Default)]
pub struct Backend {
    pub docentes: Vec<Value>,
    pub next_id: i64,
    pub calls: Vec<Call>,
    pub scripted: VecDeque<Scripted>,
    pub delay: Option<Duration>,
}

type Shared = Arc<Mutex<Backend>>;

pub struct MockServer {
    pub base_url: String,
    state: Shared,
}

impl MockServer {
    pub async fn start() -> Self {
        Self::with_docentes(Vec::new()).await
    }

    pub async fn with_docentes(docentes: Vec<Value>) -> Self {
        let next_id = docentes
            .iter()
            .filter_map(|d| d["id"].as_i64())
            .max()
            .unwrap_or(0)
            + 1;
        let state = Arc::new(Mutex::new(Backend {
            docentes,
            next_id,
            ..Backend::default()
        }));

        let app = Router::new().fallback(handle).with_state(state.clone());
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        Self {
            base_url: format!("http://{}/api", addr),
            state,
        }
    }

    pub fn config(&self) -> ClientConfig {
        ClientConfig::with_base_url(self.base_url.clone())
    }

    pub fn script(&self, response: Scripted) {
        self.state.lock().unwrap().scripted.push_back(response);
    }

    pub fn set_delay(&self, delay: Duration) {
        self.state.lock().unwrap().delay = Some(delay);
    }

    pub fn calls(&self) -> Vec<Call> {
        self.state.lock().unwrap().calls.clone()
    }

    /// `METHOD /path` of every recorded call, in order.
    pub fn call_lines(&self) -> Vec<String> {
        self.calls()
            .iter()
            .map(|c| format!("{} {}", c.method, c.path))
            .collect()
    }

    pub fn docentes(&self) -> Vec<Value> {
        self.state.lock().unwrap().docentes.clone()
    }
}

async fn handle(
    State(state): State<Shared>,
    method: Method,
    uri: Uri,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    let path = uri.path().to_string();
    let authorization = headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string);
    let body: Option<Value> = serde_json::from_slice(&body).ok();

    let (delay, scripted) = {
        let mut backend = state.lock().unwrap();
        backend.calls.push(Call {
            method: method.clone(),
            path: path.clone(),
            authorization: authorization.clone(),
            body: body.clone(),
        });
        (backend.delay, backend.scripted.pop_front())
    };

    if let Some(delay) = delay {
        tokio::time::sleep(delay).await;
    }

    if let Some(answer) = scripted {
        return match answer {
            Scripted::Json(status, value) => (code(status), Json(value)).into_response(),
            Scripted::Text(status, text) => (code(status), text).into_response(),
            Scripted::Empty(status) => code(status).into_response(),
        };
    }

    let mut backend = state.lock().unwrap();
    let segments: Vec<&str> = path.trim_matches('/').split('/').collect();
    match (method.as_str(), segments.as_slice()) {
        ("GET", ["api", "docentes"]) => Json(Value::Array(backend.docentes.clone())).into_response(),
        ("POST", ["api", "docentes"]) => {
            let mut created = body.unwrap_or_else(|| json!({}));
            created["id"] = json!(backend.next_id);
            backend.next_id += 1;
            backend.docentes.push(created.clone());
            (StatusCode::CREATED, Json(created)).into_response()
        }
        ("PUT", ["api", "docentes", id]) => {
            let id: i64 = id.parse().unwrap_or(-1);
            match backend.docentes.iter_mut().find(|d| d["id"] == json!(id)) {
                Some(existing) => {
                    let mut updated = body.unwrap_or_else(|| json!({}));
                    updated["id"] = json!(id);
                    *existing = updated.clone();
                    Json(updated).into_response()
                }
                None => not_found(),
            }
        }
        ("DELETE", ["api", "docentes", id]) => {
            let id: i64 = id.parse().unwrap_or(-1);
            let before = backend.docentes.len();
            backend.docentes.retain(|d| d["id"] != json!(id));
            if backend.docentes.len() < before {
                StatusCode::NO_CONTENT.into_response()
            } else {
                not_found()
            }
        }
        ("POST", ["api", "auth", "login"]) => {
            let body = body.unwrap_or_default();
            if body["username"] == "admin" && body["password"] == "secret" {
                Json(json!({"token": VALID_TOKEN, "username": "admin", "role": "ADMIN"}))
                    .into_response()
            } else {
                (
                    StatusCode::UNAUTHORIZED,
                    Json(json!({"message": "Credenciales inválidas"})),
                )
                    .into_response()
            }
        }
        ("POST", ["api", "auth", "guest"]) => {
            Json(json!({"token": "guest-tok", "username": "invitado", "role": "GUEST"}))
                .into_response()
        }
        ("GET", ["api", "auth", "validate"]) => {
            if authorization.as_deref() == Some(format!("Bearer {}", VALID_TOKEN).as_str()) {
                "Token valido".into_response()
            } else {
                (StatusCode::UNAUTHORIZED, "Token invalido").into_response()
            }
        }
        _ => not_found(),
    }
}

fn code(status: u16) -> StatusCode {
    StatusCode::from_u16(status).unwrap()
}

fn not_found() -> Response {
    (StatusCode::NOT_FOUND, Json(json!({"error": "Not Found"}))).into_response()
}

pub fn docente(id: i64, identificacion: &str, nombre: &str, email: &str) -> Value {
    json!({
        "id": id,
        "identificacion": identificacion,
        "nombre": nombre,
        "email": email,
        "especialidad": "Math"
    })
}
