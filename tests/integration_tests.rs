use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::routing::{get, post};
use axum::Router;
use rust_decimal::Decimal;
use serde_json::json;
use tower::ServiceExt;

use randevu::config::AppConfig;
use randevu::db::{self, queries};
use randevu::handlers;
use randevu::models::{AgentRequest, AgentResponse, BookingState};
use randevu::services::agent::AgentGateway;
use randevu::services::conversation;
use randevu::services::intent;
use randevu::services::messaging::MessagingProvider;
use randevu::services::sessions::SessionStore;
use randevu::state::AppState;

// ── Mock Providers ──

/// Deterministic stand-in for the remote agent: classifies by looking at
/// the raw message, the way the tests need it to. Counts every invocation
/// so the fast path can be shown to skip it.
struct ScriptedAgent {
    calls: Arc<Mutex<u32>>,
}

fn scripted(intent: &str, next_state: Option<&str>, info: serde_json::Value) -> AgentResponse {
    AgentResponse {
        ok: true,
        intent: intent.to_string(),
        reply: format!("ok: {intent}"),
        next_state: next_state.map(|s| s.to_string()),
        extracted_info: serde_json::from_value(info).ok(),
    }
}

#[async_trait]
impl AgentGateway for ScriptedAgent {
    async fn respond(&self, request: &AgentRequest) -> anyhow::Result<AgentResponse> {
        *self.calls.lock().unwrap() += 1;
        let msg = request.message.as_str();

        if msg == "fail" {
            anyhow::bail!("agent unreachable");
        }
        if let Some(label) = msg.strip_prefix("state:") {
            return Ok(scripted("greeting", Some(label), serde_json::Value::Null));
        }
        if msg.contains("merhaba") {
            return Ok(scripted("greeting", None, serde_json::Value::Null));
        }
        if msg.contains("Ankara") {
            return Ok(scripted(
                "provide_location",
                None,
                json!({ "location_preference": msg }),
            ));
        }
        if msg.len() <= 2 && msg.chars().all(|c| c.is_ascii_digit()) {
            return Ok(scripted(
                "select_barber",
                None,
                json!({ "barber_selection": msg }),
            ));
        }
        if msg.contains(':') {
            return Ok(scripted(
                "provide_time",
                None,
                json!({ "time_preference": msg }),
            ));
        }
        if msg.contains('.') || msg == "not-a-date" {
            return Ok(scripted(
                "provide_date",
                None,
                json!({ "date_preference": msg }),
            ));
        }
        if msg.contains("hair") || msg.contains("beard") {
            return Ok(scripted(
                "provide_service",
                None,
                json!({ "service_preference": msg }),
            ));
        }
        Ok(scripted(
            "provide_name",
            None,
            json!({ "customer_name": msg }),
        ))
    }
}

struct MockMessaging {
    sent: Arc<Mutex<Vec<(String, String)>>>,
}

#[async_trait]
impl MessagingProvider for MockMessaging {
    async fn send_message(&self, to: &str, body: &str) -> anyhow::Result<()> {
        self.sent
            .lock()
            .unwrap()
            .push((to.to_string(), body.to_string()));
        Ok(())
    }
}

// ── Helpers ──

struct TestCtx {
    state: Arc<AppState>,
    sent: Arc<Mutex<Vec<(String, String)>>>,
    agent_calls: Arc<Mutex<u32>>,
}

fn test_config() -> AppConfig {
    AppConfig {
        port: 3000,
        database_url: ":memory:".to_string(),
        agent_base_url: "http://127.0.0.1:4002".to_string(),
        twilio_account_sid: "".to_string(),
        twilio_auth_token: "".to_string(),
        twilio_whatsapp_number: "+905550000000".to_string(),
    }
}

fn test_ctx(seed: bool) -> TestCtx {
    let conn = db::init_db(":memory:").unwrap();
    if seed {
        // Business 1 receives the messages; 2 and 3 are the Çankaya branches
        // a location search surfaces.
        let hq = queries::insert_business(&conn, "Merkez Salon", "+902120000000", "Istanbul", None, true)
            .unwrap();
        let shop =
            queries::insert_business(&conn, "Çankaya Salon", "", "Ankara", Some("Çankaya"), true)
                .unwrap();
        queries::insert_business(&conn, "Kızılay Salon", "", "Ankara", Some("Çankaya"), true)
            .unwrap();
        assert_eq!(hq, 1);
        queries::insert_service(
            &conn,
            shop,
            "Haircut",
            30,
            Some(Decimal::new(5000, 2)),
            Some("TRY"),
            true,
        )
        .unwrap();
        queries::insert_service(
            &conn,
            shop,
            "Beard Trim",
            20,
            Some(Decimal::new(3000, 2)),
            Some("TRY"),
            true,
        )
        .unwrap();
    }

    let sent = Arc::new(Mutex::new(Vec::new()));
    let agent_calls = Arc::new(Mutex::new(0));
    let state = Arc::new(AppState {
        db: Arc::new(Mutex::new(conn)),
        config: test_config(),
        agent: Box::new(ScriptedAgent {
            calls: Arc::clone(&agent_calls),
        }),
        messaging: Box::new(MockMessaging {
            sent: Arc::clone(&sent),
        }),
        sessions: SessionStore::new(),
        handlers: intent::registry(),
    });

    TestCtx {
        state,
        sent,
        agent_calls,
    }
}

fn test_app(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/health", get(handlers::health::health))
        .route("/webhook/whatsapp", post(handlers::webhook::whatsapp_webhook))
        .route("/api/appointments", get(handlers::appointments::list_appointments))
        .with_state(state)
}

const PHONE: &str = "+905551112233";

async fn turn(ctx: &TestCtx, message: &str) -> AgentResponse {
    conversation::handle_incoming(&ctx.state, PHONE, 1, message)
        .await
        .unwrap()
}

fn session_state(ctx: &TestCtx) -> BookingState {
    let session = ctx.state.sessions.get_or_create(PHONE, 1);
    let state = session.lock().unwrap().state;
    state
}

// ── Conversation Flow ──

#[tokio::test]
async fn test_full_booking_flow() {
    let ctx = test_ctx(true);

    // Location search routes to the Çankaya branches.
    turn(&ctx, "Ankara, Çankaya").await;
    {
        let session = ctx.state.sessions.get_or_create(PHONE, 1);
        let session = session.lock().unwrap();
        assert_eq!(session.state, BookingState::AwaitingBarberSelection);
        assert_eq!(session.available_businesses.len(), 2);
        assert_eq!(
            session.selected_location.as_deref(),
            Some("Ankara, Çankaya")
        );
    }

    // Pick the first branch.
    turn(&ctx, "1").await;
    {
        let session = ctx.state.sessions.get_or_create(PHONE, 1);
        let session = session.lock().unwrap();
        assert_eq!(session.state, BookingState::AwaitingName);
        assert_eq!(session.selected_business_id, Some(2));
    }

    // Identity.
    turn(&ctx, "Ali Veli").await;
    {
        let session = ctx.state.sessions.get_or_create(PHONE, 1);
        let session = session.lock().unwrap();
        assert_eq!(session.state, BookingState::AwaitingService);
        assert!(session.customer_id.is_some());
    }

    // Service, date, time.
    turn(&ctx, "haircut").await;
    assert_eq!(session_state(&ctx), BookingState::AwaitingDate);

    turn(&ctx, "20.06.2025").await;
    assert_eq!(session_state(&ctx), BookingState::AwaitingTime);

    turn(&ctx, "10:00").await;
    assert_eq!(session_state(&ctx), BookingState::AwaitingConfirmation);

    // Plain "evet" books without consulting the agent.
    let calls_before = *ctx.agent_calls.lock().unwrap();
    let result = turn(&ctx, "evet").await;
    assert_eq!(result.intent, "confirm_appointment");
    assert_eq!(*ctx.agent_calls.lock().unwrap(), calls_before);
    assert_eq!(session_state(&ctx), BookingState::Completed);

    let db = ctx.state.db.lock().unwrap();
    let appointments = queries::list_appointments(&db, 2).unwrap();
    assert_eq!(appointments.len(), 1);
    assert_eq!(
        appointments[0].start_time.to_string(),
        "2025-06-20 10:00:00"
    );
    assert_eq!(appointments[0].total_price, Some(Decimal::new(5000, 2)));
}

#[tokio::test]
async fn test_fast_path_requires_awaiting_confirmation() {
    let ctx = test_ctx(true);

    // "evet" in the initial state is an ordinary turn and goes to the agent.
    turn(&ctx, "evet").await;
    assert_eq!(*ctx.agent_calls.lock().unwrap(), 1);
}

#[tokio::test]
async fn test_fast_path_vocabulary() {
    for message in ["evet", "Tamam", "ONAY", "e"] {
        let ctx = test_ctx(true);
        {
            let session = ctx.state.sessions.get_or_create(PHONE, 1);
            let mut session = session.lock().unwrap();
            session.state = BookingState::AwaitingConfirmation;
        }

        let result = turn(&ctx, message).await;
        assert_eq!(result.intent, "confirm_appointment", "message: {message}");
        assert_eq!(
            *ctx.agent_calls.lock().unwrap(),
            0,
            "agent must not be consulted for {message:?}"
        );
    }
}

#[tokio::test]
async fn test_state_normalization_handles_accented_labels() {
    for label in ["AWAİTİNG_DATE", "AWAITING_DATE", "awaiting_date"] {
        let ctx = test_ctx(true);
        turn(&ctx, &format!("state:{label}")).await;
        assert_eq!(session_state(&ctx), BookingState::AwaitingDate, "label: {label}");
    }
}

#[tokio::test]
async fn test_unrecognized_state_label_is_ignored() {
    let ctx = test_ctx(true);
    turn(&ctx, "state:AWAITING_PAYMENT").await;
    assert_eq!(session_state(&ctx), BookingState::Initial);
}

#[tokio::test]
async fn test_out_of_range_barber_selection_is_a_noop() {
    let ctx = test_ctx(true);
    turn(&ctx, "Ankara, Çankaya").await;

    turn(&ctx, "9").await;
    let session = ctx.state.sessions.get_or_create(PHONE, 1);
    let session = session.lock().unwrap();
    assert_eq!(session.state, BookingState::AwaitingBarberSelection);
    assert_eq!(session.selected_business_id, None);
}

#[tokio::test]
async fn test_barber_options_from_agent_take_precedence() {
    let ctx = test_ctx(true);
    let response = AgentResponse {
        ok: true,
        intent: "select_barber".to_string(),
        reply: "ok".to_string(),
        next_state: None,
        extracted_info: serde_json::from_value(json!({
            "barber_selection": "2",
            "barber_options": [{ "id": 41 }, { "id": 42 }],
        }))
        .ok(),
    };

    let session = ctx.state.sessions.get_or_create(PHONE, 1);
    let mut session = session.lock().unwrap();
    intent::dispatch(&ctx.state, &mut session, &response).unwrap();

    assert_eq!(session.selected_business_id, Some(42));
    assert_eq!(session.state, BookingState::AwaitingName);
}

#[tokio::test]
async fn test_service_aggregation_across_matches() {
    let ctx = test_ctx(true);
    {
        let session = ctx.state.sessions.get_or_create(PHONE, 1);
        session.lock().unwrap().selected_business_id = Some(2);
    }

    turn(&ctx, "haircut and beard please").await;

    let session = ctx.state.sessions.get_or_create(PHONE, 1);
    let session = session.lock().unwrap();
    assert_eq!(session.selected_service_ids.len(), 2);
    assert_eq!(session.total_duration_minutes, Some(50));
    assert_eq!(session.total_price, Some(Decimal::new(8000, 2)));
    assert_eq!(session.total_currency.as_deref(), Some("TRY"));
    assert_eq!(session.state, BookingState::AwaitingDate);
}

#[tokio::test]
async fn test_unmatched_service_falls_back_to_first() {
    let ctx = test_ctx(true);
    {
        let session = ctx.state.sessions.get_or_create(PHONE, 1);
        session.lock().unwrap().selected_business_id = Some(2);
    }

    turn(&ctx, "beard something exotic").await;
    {
        let session = ctx.state.sessions.get_or_create(PHONE, 1);
        let session = session.lock().unwrap();
        // "beard" matches Beard Trim directly, so force a miss instead.
        assert_eq!(session.selected_service_ids.len(), 1);
    }

    let ctx = test_ctx(true);
    {
        let session = ctx.state.sessions.get_or_create(PHONE, 1);
        session.lock().unwrap().selected_business_id = Some(2);
    }
    turn(&ctx, "haircolor").await;

    let session = ctx.state.sessions.get_or_create(PHONE, 1);
    let session = session.lock().unwrap();
    assert_eq!(session.selected_service_ids.len(), 1, "falls back to first service");
    assert_eq!(session.total_duration_minutes, Some(30));
}

#[tokio::test]
async fn test_malformed_date_defaults_to_today() {
    let ctx = test_ctx(true);
    turn(&ctx, "not-a-date").await;

    let session = ctx.state.sessions.get_or_create(PHONE, 1);
    let session = session.lock().unwrap();
    assert_eq!(
        session.selected_date,
        Some(chrono::Local::now().date_naive())
    );
    assert_eq!(session.state, BookingState::AwaitingTime);
}

#[tokio::test]
async fn test_time_without_date_is_not_stored() {
    let ctx = test_ctx(true);
    turn(&ctx, "14:30").await;

    let session = ctx.state.sessions.get_or_create(PHONE, 1);
    let session = session.lock().unwrap();
    assert_eq!(session.selected_time, None);
    assert_eq!(session.state, BookingState::AwaitingConfirmation);
}

#[tokio::test]
async fn test_gateway_failure_degrades_to_failure_turn() {
    let ctx = test_ctx(true);
    let result = turn(&ctx, "fail").await;

    assert!(!result.ok);
    assert_eq!(result.intent, "error");
    assert!(result.reply.is_empty());
    assert_eq!(session_state(&ctx), BookingState::Initial);
}

#[tokio::test]
async fn test_confirmation_without_customer_is_a_noop() {
    let ctx = test_ctx(true);
    {
        let session = ctx.state.sessions.get_or_create(PHONE, 1);
        session.lock().unwrap().state = BookingState::AwaitingConfirmation;
    }

    turn(&ctx, "evet").await;

    // No customer was ever resolved, so nothing was booked.
    assert_eq!(session_state(&ctx), BookingState::AwaitingConfirmation);
    let db = ctx.state.db.lock().unwrap();
    assert!(queries::list_appointments(&db, 1).unwrap().is_empty());
}

// ── Webhook ──

#[tokio::test]
async fn test_webhook_replies_over_messaging() {
    let ctx = test_ctx(true);
    let app = test_app(ctx.state.clone());

    let res = app
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/webhook/whatsapp")
                .header("Content-Type", "application/x-www-form-urlencoded")
                .body(Body::from(
                    "From=whatsapp%3A%2B905551112233&To=whatsapp%3A%2B905550000000&Body=merhaba&MessageSid=SM1",
                ))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(res.status(), StatusCode::OK);
    let body = axum::body::to_bytes(res.into_body(), usize::MAX).await.unwrap();
    let text = String::from_utf8(body.to_vec()).unwrap();
    assert!(text.contains("<Response>"));

    let sent = ctx.sent.lock().unwrap();
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].0, "+905551112233");
    assert_eq!(sent[0].1, "ok: greeting");
}

#[tokio::test]
async fn test_webhook_without_business_drops_silently() {
    let ctx = test_ctx(false);
    let app = test_app(ctx.state.clone());

    let res = app
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/webhook/whatsapp")
                .header("Content-Type", "application/x-www-form-urlencoded")
                .body(Body::from(
                    "From=whatsapp%3A%2B905551112233&Body=merhaba",
                ))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(res.status(), StatusCode::OK);
    assert!(ctx.sent.lock().unwrap().is_empty());
}

// ── Read API ──

#[tokio::test]
async fn test_appointments_unknown_business_is_404() {
    let ctx = test_ctx(true);
    let app = test_app(ctx.state.clone());

    let res = app
        .oneshot(
            Request::builder()
                .uri("/api/appointments?business_id=999")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(res.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_appointments_defaults_to_first_business() {
    let ctx = test_ctx(true);
    let app = test_app(ctx.state.clone());

    let res = app
        .oneshot(
            Request::builder()
                .uri("/api/appointments")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(res.status(), StatusCode::OK);
    let body = axum::body::to_bytes(res.into_body(), usize::MAX).await.unwrap();
    let json: Vec<serde_json::Value> = serde_json::from_slice(&body).unwrap();
    assert!(json.is_empty());
}

// ── Health ──

#[tokio::test]
async fn test_health() {
    let ctx = test_ctx(false);
    let app = test_app(ctx.state);

    let res = app
        .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(res.status(), StatusCode::OK);
}
