// tests/common/mod.rs

// Backend falso em processo (axum) com estado em memória. Só o suficiente
// para exercitar o HttpGateway de ponta a ponta.

#![allow(dead_code)]

use std::{collections::HashMap, net::SocketAddr, sync::Arc, time::Duration};

use axum::{
    extract::{Path, State},
    http::{header::AUTHORIZATION, HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use maestro_client::{config::AppState, gateway::HttpGateway};
use parking_lot::Mutex;
use serde_json::{json, Value};
use tokio::net::TcpListener;
use uuid::Uuid;

pub const PASSWORD: &str = "segredo";

#[derive(Debug, Clone)]
pub struct Account {
    pub id: Uuid,
    pub username: String,
    pub permissions: Vec<&'static str>,
}

#[derive(Default)]
pub struct Backend {
    // Todo token passa a ser recusado
    pub revoked: bool,
    pub accounts: HashMap<String, Account>,
    // Vendas em dinheiro do turno (o esperado = troco + vendas)
    pub cash_sales: f64,
    pub open_requests: usize,
    sessions: HashMap<Uuid, Value>,
    open_by_register: HashMap<Uuid, Uuid>,
    transfers: HashMap<Uuid, Value>,
}

pub type Shared = Arc<Mutex<Backend>>;

pub struct TestServer {
    pub url: String,
    pub backend: Shared,
}

impl TestServer {
    pub fn client(&self) -> AppState {
        let gateway = HttpGateway::new(&self.url, Duration::from_secs(5)).unwrap();
        AppState::with_gateway(Arc::new(gateway))
    }

    pub fn account(&self, username: &str) -> Account {
        self.backend.lock().accounts[username].clone()
    }
}

fn accounts() -> HashMap<String, Account> {
    let logistics = vec!["VIEW_INVENTORY", "MANAGE_TRANSFERS", "APPROVE_TRANSFER", "RECEIVE_TRANSFER"];
    let cashier = vec![
        "VIEW_INVENTORY",
        "CREATE_SALE",
        "POST_SALE",
        "PROCESS_RETURN",
        "CLOCK_IN_OUT",
        "VIEW_COMMUNICATIONS",
        "VIEW_PROMOTIONS",
    ];

    [("ana", logistics.clone()), ("bruno", cashier.clone()), ("carla", cashier)]
        .into_iter()
        .map(|(name, permissions)| {
            let account = Account { id: Uuid::new_v4(), username: name.to_string(), permissions };
            (name.to_string(), account)
        })
        .collect()
}

pub async fn spawn() -> TestServer {
    let backend: Shared = Arc::new(Mutex::new(Backend {
        accounts: accounts(),
        cash_sales: 8700.0,
        ..Default::default()
    }));

    let app = Router::new()
        .route("/api/auth/login", post(login))
        .route("/api/auth/validate", post(validate))
        .route("/api/registers/{id}/sessions/current", get(current_session))
        .route("/api/registers/{id}/shifts/open", post(open_shift))
        .route("/api/registers/sessions/{id}", get(get_session))
        .route("/api/registers/sessions/{id}/close", post(close_session))
        .route("/api/transfers", get(list_transfers).post(create_transfer))
        .route("/api/transfers/{id}", get(get_transfer))
        .route("/api/transfers/{id}/lines", post(add_transfer_line))
        .route("/api/transfers/{id}/{action}", post(transfer_action))
        .with_state(backend.clone());

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr: SocketAddr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    TestServer { url: format!("http://{}", addr), backend }
}

/// Endereço onde ninguém escuta (para simular rede fora).
pub async fn dead_url() -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);
    format!("http://{}", addr)
}

// --- Auxiliares ---

fn error(status: StatusCode, message: &str) -> Response {
    (status, Json(json!({ "error": message }))).into_response()
}

fn authorize(backend: &Backend, headers: &HeaderMap) -> Result<Account, Response> {
    let token = headers
        .get(AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "));

    match token.and_then(|t| t.strip_prefix("tok-")) {
        Some(name) if !backend.revoked => backend
            .accounts
            .get(name)
            .cloned()
            .ok_or_else(|| error(StatusCode::UNAUTHORIZED, "Token inválido.")),
        _ => Err(error(StatusCode::UNAUTHORIZED, "Token inválido ou expirado.")),
    }
}

fn now() -> String {
    chrono::Utc::now().to_rfc3339()
}

// --- Auth ---

async fn login(State(backend): State<Shared>, Json(body): Json<Value>) -> Response {
    let b = backend.lock();
    let username = body["username"].as_str().unwrap_or_default();
    let password = body["password"].as_str().unwrap_or_default();

    if b.accounts.contains_key(username) && password == PASSWORD {
        Json(json!({ "token": format!("tok-{}", username) })).into_response()
    } else {
        error(StatusCode::UNAUTHORIZED, "Credenciais inválidas.")
    }
}

async fn validate(State(backend): State<Shared>, headers: HeaderMap) -> Response {
    let b = backend.lock();
    let account = match authorize(&b, &headers) {
        Ok(a) => a,
        Err(r) => return r,
    };

    Json(json!({
        "user": {
            "id": account.id,
            "username": account.username,
            "storeId": null,
            "isActive": true
        },
        "permissions": account.permissions
    }))
    .into_response()
}

// --- Caixas ---

async fn current_session(State(backend): State<Shared>, headers: HeaderMap, Path(register_id): Path<Uuid>) -> Response {
    let b = backend.lock();
    if let Err(r) = authorize(&b, &headers) {
        return r;
    }

    let session = b
        .open_by_register
        .get(&register_id)
        .and_then(|id| b.sessions.get(id))
        .cloned()
        .unwrap_or(Value::Null);
    Json(session).into_response()
}

async fn open_shift(
    State(backend): State<Shared>,
    headers: HeaderMap,
    Path(register_id): Path<Uuid>,
    Json(body): Json<Value>,
) -> Response {
    let mut b = backend.lock();
    let account = match authorize(&b, &headers) {
        Ok(a) => a,
        Err(r) => return r,
    };
    b.open_requests += 1;

    if b.open_by_register.contains_key(&register_id) {
        return error(StatusCode::CONFLICT, "Caixa já está em uso.");
    }

    let id = Uuid::new_v4();
    let session = json!({
        "id": id,
        "registerId": register_id,
        "operatorId": account.id,
        "status": "OPEN",
        "openingCash": body["openingCash"],
        "closingCash": null,
        "expectedCash": null,
        "variance": null,
        "openedAt": now(),
        "closedAt": null
    });
    b.sessions.insert(id, session.clone());
    b.open_by_register.insert(register_id, id);
    (StatusCode::CREATED, Json(session)).into_response()
}

async fn get_session(State(backend): State<Shared>, headers: HeaderMap, Path(id): Path<Uuid>) -> Response {
    let b = backend.lock();
    if let Err(r) = authorize(&b, &headers) {
        return r;
    }
    match b.sessions.get(&id) {
        Some(s) => Json(s.clone()).into_response(),
        None => error(StatusCode::NOT_FOUND, "Sessão não encontrada."),
    }
}

async fn close_session(
    State(backend): State<Shared>,
    headers: HeaderMap,
    Path(id): Path<Uuid>,
    Json(body): Json<Value>,
) -> Response {
    let mut b = backend.lock();
    if let Err(r) = authorize(&b, &headers) {
        return r;
    }

    let cash_sales = b.cash_sales;
    let Some(session) = b.sessions.get_mut(&id) else {
        return error(StatusCode::NOT_FOUND, "Sessão não encontrada.");
    };
    if session["status"] != "OPEN" {
        return error(StatusCode::CONFLICT, "Sessão já fechada.");
    }

    let closing = body["closingCash"].as_f64().unwrap_or_default();
    let expected = session["openingCash"].as_f64().unwrap_or_default() + cash_sales;
    session["status"] = json!("CLOSED");
    session["closingCash"] = json!(closing);
    session["expectedCash"] = json!(expected);
    session["variance"] = json!(closing - expected);
    session["closedAt"] = json!(now());

    let register_id = session["registerId"].as_str().and_then(|s| Uuid::parse_str(s).ok());
    if let Some(register_id) = register_id {
        b.open_by_register.remove(&register_id);
    }
    StatusCode::NO_CONTENT.into_response()
}

// --- Transferências ---

async fn list_transfers(State(backend): State<Shared>, headers: HeaderMap) -> Response {
    let b = backend.lock();
    if let Err(r) = authorize(&b, &headers) {
        return r;
    }
    Json(b.transfers.values().cloned().collect::<Vec<_>>()).into_response()
}

async fn create_transfer(State(backend): State<Shared>, headers: HeaderMap, Json(body): Json<Value>) -> Response {
    let mut b = backend.lock();
    if let Err(r) = authorize(&b, &headers) {
        return r;
    }

    let id = Uuid::new_v4();
    let doc = json!({
        "id": id,
        "fromStoreId": body["fromStoreId"],
        "toStoreId": body["toStoreId"],
        "status": "PENDING",
        "reason": body["reason"],
        "createdAt": now(),
        "lines": []
    });
    b.transfers.insert(id, doc.clone());
    (StatusCode::CREATED, Json(doc)).into_response()
}

async fn get_transfer(State(backend): State<Shared>, headers: HeaderMap, Path(id): Path<Uuid>) -> Response {
    let b = backend.lock();
    if let Err(r) = authorize(&b, &headers) {
        return r;
    }
    match b.transfers.get(&id) {
        Some(doc) => Json(doc.clone()).into_response(),
        None => error(StatusCode::NOT_FOUND, "Transferência não encontrada."),
    }
}

async fn add_transfer_line(
    State(backend): State<Shared>,
    headers: HeaderMap,
    Path(id): Path<Uuid>,
    Json(body): Json<Value>,
) -> Response {
    let mut b = backend.lock();
    if let Err(r) = authorize(&b, &headers) {
        return r;
    }
    let Some(doc) = b.transfers.get_mut(&id) else {
        return error(StatusCode::NOT_FOUND, "Transferência não encontrada.");
    };
    if doc["status"] != "PENDING" {
        return error(StatusCode::CONFLICT, "Linhas só podem ser incluídas em transferências pendentes.");
    }

    let line = json!({
        "id": Uuid::new_v4(),
        "productId": body["productId"],
        "quantity": body["quantity"],
        "receivedQuantity": null
    });
    if let Some(lines) = doc["lines"].as_array_mut() {
        lines.push(line.clone());
    }
    (StatusCode::CREATED, Json(line)).into_response()
}

async fn transfer_action(
    State(backend): State<Shared>,
    headers: HeaderMap,
    Path((id, action)): Path<(Uuid, String)>,
) -> Response {
    let mut b = backend.lock();
    let account = match authorize(&b, &headers) {
        Ok(a) => a,
        Err(r) => return r,
    };

    let required = match action.as_str() {
        "approve" => "APPROVE_TRANSFER",
        "receive" => "RECEIVE_TRANSFER",
        _ => "MANAGE_TRANSFERS",
    };
    if !account.permissions.contains(&required) {
        return error(StatusCode::FORBIDDEN, "Permissão insuficiente.");
    }

    let Some(doc) = b.transfers.get_mut(&id) else {
        return error(StatusCode::NOT_FOUND, "Transferência não encontrada.");
    };
    let status = doc["status"].as_str().unwrap_or_default().to_string();
    let target = match (action.as_str(), status.as_str()) {
        ("approve", "PENDING") => "APPROVED",
        ("ship", "APPROVED") => "IN_TRANSIT",
        ("receive", "IN_TRANSIT") => "RECEIVED",
        ("cancel", "PENDING" | "APPROVED") => "CANCELLED",
        _ => {
            return error(
                StatusCode::CONFLICT,
                &format!("Não é possível executar '{}' em uma transferência {}.", action, status),
            )
        }
    };

    doc["status"] = json!(target);
    StatusCode::NO_CONTENT.into_response()
}
