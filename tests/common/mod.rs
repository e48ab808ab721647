// Allow dead_code because these helpers are used across different test files
// which are compiled separately
#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use anyhow::Result;
use axum::Router;
use axum::extract::State;
use axum::http::{HeaderMap, Method, StatusCode, Uri, header};
use axum::response::{IntoResponse, Response};
use ledger_probe::application::{Credentials, LedgerProbe, ProbeConfig};
use ledger_probe::domain::{TransactionRequest, format_cents};
use serde_json::{Value, json};
use tokio::net::TcpListener;

pub const USERNAME: &str = "ramakanthreddy_0_107";
pub const PASSWORD: &str = "reddy@123";
pub const TOKEN: &str = "eyJhbGciOiJIUzI1NiJ9.test-session-token";

pub const FARMER_ID: u64 = 61;
pub const BUYER_ID: u64 = 62;

/// A request as seen by the stub server.
#[derive(Debug, Clone)]
pub struct RecordedRequest {
    pub method: String,
    pub path: String,
    pub headers: HashMap<String, String>,
    pub body: String,
}

impl RecordedRequest {
    pub fn json(&self) -> Value {
        serde_json::from_str(&self.body).unwrap_or(Value::Null)
    }

    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .get(&name.to_ascii_lowercase())
            .map(String::as_str)
    }
}

/// What the stub answers with.
#[derive(Debug, Clone)]
pub struct StubResponse {
    pub status: u16,
    pub body: String,
    pub delay: Duration,
}

impl StubResponse {
    pub fn json(status: u16, body: Value) -> Self {
        Self {
            status,
            body: body.to_string(),
            delay: Duration::ZERO,
        }
    }

    pub fn raw(status: u16, body: impl Into<String>) -> Self {
        Self {
            status,
            body: body.into(),
            delay: Duration::ZERO,
        }
    }

    pub fn ok(data: Value) -> Self {
        Self::json(200, json!({ "success": true, "data": data }))
    }

    pub fn failure(status: u16, code: &str, message: &str) -> Self {
        Self::json(
            status,
            json!({ "success": false, "error": code, "message": message }),
        )
    }

    pub fn delayed(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }
}

impl IntoResponse for StubResponse {
    fn into_response(self) -> Response {
        let status = StatusCode::from_u16(self.status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        (status, [(header::CONTENT_TYPE, "application/json")], self.body).into_response()
    }
}

type Handler = Arc<dyn Fn(&RecordedRequest) -> StubResponse + Send + Sync>;

#[derive(Clone)]
struct StubState {
    handler: Handler,
    requests: Arc<Mutex<Vec<RecordedRequest>>>,
}

/// An axum server on an ephemeral port that records every request and answers
/// through a closure.
pub struct StubServer {
    pub base_url: String,
    requests: Arc<Mutex<Vec<RecordedRequest>>>,
}

impl StubServer {
    pub async fn start<F>(handler: F) -> Result<Self>
    where
        F: Fn(&RecordedRequest) -> StubResponse + Send + Sync + 'static,
    {
        let listener = TcpListener::bind("127.0.0.1:0").await?;
        let addr = listener.local_addr()?;
        let requests = Arc::new(Mutex::new(Vec::new()));

        let state = StubState {
            handler: Arc::new(handler),
            requests: Arc::clone(&requests),
        };
        let app = Router::new().fallback(respond).with_state(state);
        tokio::spawn(async move { axum::serve(listener, app).await });

        Ok(Self {
            base_url: format!("http://{}/api", addr),
            requests,
        })
    }

    pub fn requests(&self) -> Vec<RecordedRequest> {
        self.requests.lock().unwrap().clone()
    }

    pub fn paths(&self) -> Vec<String> {
        self.requests()
            .into_iter()
            .map(|r| format!("{} {}", r.method, r.path))
            .collect()
    }

    pub fn config(&self) -> ProbeConfig {
        ProbeConfig::new(self.base_url.clone(), Credentials::new(USERNAME, PASSWORD))
            .with_timeout(Duration::from_secs(5))
    }

    pub fn probe(&self) -> Result<LedgerProbe> {
        Ok(LedgerProbe::new(self.config())?)
    }
}

async fn respond(
    State(state): State<StubState>,
    method: Method,
    uri: Uri,
    headers: HeaderMap,
    body: String,
) -> StubResponse {
    let request = RecordedRequest {
        method: method.to_string(),
        path: uri.path().to_string(),
        headers: headers
            .iter()
            .filter_map(|(name, value)| {
                value
                    .to_str()
                    .ok()
                    .map(|v| (name.as_str().to_string(), v.to_string()))
            })
            .collect(),
        body,
    };
    state.requests.lock().unwrap().push(request.clone());

    let response = (*state.handler)(&request);
    if !response.delay.is_zero() {
        tokio::time::sleep(response.delay).await;
    }
    response
}

/// In-memory stand-in for the ledger service: the farmer is credited their earning
/// (total minus commission) and the buyer is debited the full total.
pub struct FakeLedger {
    pub commission_percent: i64,
    pub balances: HashMap<u64, i64>,
    next_id: u64,
}

impl FakeLedger {
    pub fn new(commission_percent: i64) -> Self {
        Self {
            commission_percent,
            balances: HashMap::new(),
            next_id: 1,
        }
    }

    /// Route a request the way the real service does.
    pub fn handle(&mut self, request: &RecordedRequest) -> StubResponse {
        if request.method == "POST" && request.path == "/api/auth/login" {
            let body = request.json();
            if body["username"] == USERNAME && body["password"] == PASSWORD {
                return StubResponse::ok(json!({ "token": TOKEN, "user": { "id": 1 } }));
            }
            return StubResponse::failure(
                401,
                "INVALID_CREDENTIALS",
                "Invalid username or password",
            );
        }

        let bearer = format!("Bearer {}", TOKEN);
        if request.header("authorization") != Some(bearer.as_str()) {
            return StubResponse::failure(401, "UNAUTHORIZED", "Missing or invalid token");
        }

        if request.method == "POST" && request.path == "/api/transactions/create" {
            return self.create_transaction(&request.json());
        }

        if request.method == "GET" {
            if let Some(id) = request.path.strip_prefix("/api/balances/user/") {
                return match id.parse::<u64>() {
                    Ok(user_id) => {
                        let cents = self.balances.get(&user_id).copied().unwrap_or(0);
                        StubResponse::ok(json!({
                            "user_id": user_id,
                            // Decimal columns come back as strings
                            "current_balance": format_cents(cents),
                            "pending_expenses": 0,
                        }))
                    }
                    Err(_) => StubResponse::failure(400, "INVALID_USER_ID", "Invalid user id"),
                };
            }
        }

        StubResponse::failure(404, "NOT_FOUND", "Route not found")
    }

    fn create_transaction(&mut self, body: &Value) -> StubResponse {
        let (Some(farmer_id), Some(buyer_id), Some(quantity), Some(unit_price)) = (
            body["farmer_id"].as_u64(),
            body["buyer_id"].as_u64(),
            body["quantity"].as_i64(),
            body["unit_price"].as_f64(),
        ) else {
            return StubResponse::failure(400, "VALIDATION_ERROR", "Missing transaction fields");
        };

        let total_cents = quantity * (unit_price * 100.0).round() as i64;
        let earning_cents = total_cents - total_cents * self.commission_percent / 100;

        *self.balances.entry(farmer_id).or_insert(0) += earning_cents;
        *self.balances.entry(buyer_id).or_insert(0) -= total_cents;

        let id = self.next_id;
        self.next_id += 1;

        StubResponse::json(
            201,
            json!({
                "success": true,
                "message": "Transaction created",
                "data": {
                    "id": id,
                    "total_amount": total_cents as f64 / 100.0,
                    "farmer_earning": earning_cents as f64 / 100.0,
                    "commission_amount": (total_cents - earning_cents) as f64 / 100.0,
                }
            }),
        )
    }
}

/// Start a stub server backed by a fresh [`FakeLedger`].
pub async fn fake_ledger_server(
    commission_percent: i64,
) -> Result<(StubServer, Arc<Mutex<FakeLedger>>)> {
    let ledger = Arc::new(Mutex::new(FakeLedger::new(commission_percent)));
    let shared = Arc::clone(&ledger);
    let server = StubServer::start(move |request| shared.lock().unwrap().handle(request)).await?;
    Ok((server, ledger))
}

/// The default `run` sale: 5 units at 200.
pub fn standard_request() -> TransactionRequest {
    TransactionRequest::new(1, FARMER_ID, BUYER_ID, "TestProduct")
        .with_category(1)
        .with_quantity(5)
        .with_unit_price(20000)
}
