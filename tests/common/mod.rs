use std::sync::atomic::AtomicBool;
use std::sync::Arc;

use axum::body::Body;
use axum::http::{Method, Request, StatusCode};
use chrono::{TimeZone, Utc};
use jsonwebtoken::{encode, EncodingKey, Header};
use serde_json::Value;
use tokio::sync::mpsc;
use tower::ServiceExt;
use uuid::Uuid;

use copydesk::api::auth::Claims;
use copydesk::api::router::create_router;
use copydesk::clock::ManualClock;
use copydesk::config::AppConfig;
use copydesk::db::MemoryStore;
use copydesk::models::{Signal, Trader};
use copydesk::AppState;

pub const JWT_SECRET: &str = "test-secret";

#[allow(dead_code)]
pub struct TestApp {
    pub router: axum::Router,
    pub store: MemoryStore,
    pub clock: ManualClock,
    pub pause_flag: Arc<AtomicBool>,
    /// Receives every signal the publish handler queues for auto-copy.
    pub signal_rx: mpsc::Receiver<Signal>,
}

/// Router wired to an in-memory store and a clock frozen at 2024-05-01 09:30 UTC.
#[allow(dead_code)]
pub fn build_test_app() -> TestApp {
    build_test_app_with(AppConfig::for_memory_store(JWT_SECRET))
}

#[allow(dead_code)]
pub fn build_test_app_with(config: AppConfig) -> TestApp {
    let store = MemoryStore::new();
    let clock = ManualClock::new(Utc.with_ymd_and_hms(2024, 5, 1, 9, 30, 0).unwrap());
    let pause_flag = Arc::new(AtomicBool::new(false));
    let (signal_tx, signal_rx) = mpsc::channel(64);

    let state = AppState {
        store: Arc::new(store.clone()),
        db: None,
        clock: Arc::new(clock.clone()),
        config,
        signal_tx: Some(signal_tx),
        metrics_handle: copydesk::metrics::init_metrics(),
        pause_flag: Arc::clone(&pause_flag),
    };

    TestApp {
        router: create_router(state),
        store,
        clock,
        pause_flag,
        signal_rx,
    }
}

/// Seed a trader record for testing.
#[allow(dead_code)]
pub async fn seed_trader(store: &MemoryStore, name: &str, is_expert: bool, verified: bool) -> Trader {
    let trader = Trader {
        id: Uuid::new_v4(),
        email: format!("{}@example.com", name.to_lowercase().replace(' ', ".")),
        display_name: name.to_string(),
        is_expert,
        verified,
        created_at: Some(Utc::now()),
    };
    store.insert_trader(trader.clone()).await;
    trader
}

/// Mint an HS256 token the auth middleware accepts.
#[allow(dead_code)]
pub fn token_for(user_id: Uuid, role: Option<&str>) -> String {
    let claims = Claims {
        sub: user_id,
        email: None,
        role: role.map(String::from),
        exp: (Utc::now().timestamp() + 3600) as usize,
    };
    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(JWT_SECRET.as_bytes()),
    )
    .expect("Failed to sign test token")
}

/// Send one request through the router and decode the JSON body.
#[allow(dead_code)]
pub async fn send(
    router: &axum::Router,
    method: Method,
    uri: &str,
    token: Option<&str>,
    body: Option<Value>,
) -> (StatusCode, Value) {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        builder = builder.header("authorization", format!("Bearer {token}"));
    }
    let request = match body {
        Some(json) => builder
            .header("content-type", "application/json")
            .body(Body::from(json.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };

    let resp = router.clone().oneshot(request).await.unwrap();
    let status = resp.status();
    let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX).await.unwrap();
    let json = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap_or(Value::Null)
    };
    (status, json)
}

/// Read a decimal field serialized as a JSON string.
#[allow(dead_code)]
pub fn dec(value: &Value) -> rust_decimal::Decimal {
    value
        .as_str()
        .and_then(|s| s.parse().ok())
        .unwrap_or_else(|| panic!("expected decimal string, got {value}"))
}
