//! Two-stage login integration tests
//!
//! Drives registration, the MFA challenge and session use end to end over
//! the in-memory store, with time controlled by a manual clock.

use std::sync::{Arc, Mutex};

use workstation_gate::auth::{CodeDelivery, Permission, Role, TokenCodec};
use workstation_gate::services::MessageDraft;
use workstation_gate::db::{MemoryStore, PrincipalRecord};
use workstation_gate::types::ManualClock;
use workstation_gate::{AuthError, Workstation};

const START: u64 = 1_700_000_000;

#[derive(Default)]
struct Outbox(Mutex<Vec<(String, String)>>);

impl CodeDelivery for Outbox {
    fn deliver(&self, principal: &PrincipalRecord, code: &str) {
        self.0
            .lock()
            .unwrap()
            .push((principal.email.clone(), code.to_string()));
    }
}

impl Outbox {
    fn code_for(&self, email: &str) -> String {
        self.0
            .lock()
            .unwrap()
            .iter()
            .rev()
            .find(|(to, _)| to == email)
            .map(|(_, code)| code.clone())
            .expect("a code was delivered")
    }
}

struct Setup {
    ws: Workstation,
    clock: Arc<ManualClock>,
    outbox: Arc<Outbox>,
}

fn setup() -> Setup {
    let clock = Arc::new(ManualClock::new(START));
    let outbox = Arc::new(Outbox::default());
    let ws = Workstation::builder(Arc::new(MemoryStore::new()), Arc::new(TokenCodec::new_dev()))
        .clock(clock.clone())
        .delivery(outbox.clone())
        .build();
    Setup { ws, clock, outbox }
}

fn login(s: &Setup, email: &str, password: &str) -> String {
    let challenge = s.ws.begin_login(email, password).unwrap();
    let code = s.outbox.code_for(email);
    s.ws.complete_login(&challenge.temp_token, &code)
        .unwrap()
        .access_token
}

#[test]
fn test_manager_login_grants_manager_permissions() {
    let s = setup();
    let reg = s.ws.register("sam", "manager@corp.example", "hunter2hunter2").unwrap();
    assert_eq!(reg.role, Role::Manager);

    let token = login(&s, "manager@corp.example", "hunter2hunter2");

    let principal = s.ws.authorize(Some(&token), Permission::ApproveRequests).unwrap();
    assert_eq!(principal.role, Role::Manager);
    assert_eq!(principal.email, "manager@corp.example");

    assert!(matches!(
        s.ws.authorize(Some(&token), Permission::ManageUsers),
        Err(AuthError::Forbidden(_))
    ));
}

#[test]
fn test_code_is_six_digits_and_not_in_token() {
    let s = setup();
    s.ws.register("e", "e@corp.example", "pw").unwrap();
    let challenge = s.ws.begin_login("e@corp.example", "pw").unwrap();
    let code = s.outbox.code_for("e@corp.example");

    assert_eq!(code.len(), 6);
    assert!(code.chars().all(|c| c.is_ascii_digit()));
    assert!(!code.starts_with('0'));

    let json = serde_json::to_string(&challenge).unwrap();
    assert!(json.contains("\"mfaRequired\":true"));
    assert!(json.contains("\"tempToken\""));
    assert!(!json.contains(&code));
}

#[test]
fn test_challenge_window_boundary() {
    let s = setup();
    s.ws.register("e", "e@corp.example", "pw").unwrap();
    let challenge = s.ws.begin_login("e@corp.example", "pw").unwrap();
    let code = s.outbox.code_for("e@corp.example");

    s.clock.advance(299);
    assert!(s.ws.complete_login(&challenge.temp_token, &code).is_ok());

    s.clock.advance(1);
    assert!(matches!(
        s.ws.complete_login(&challenge.temp_token, &code),
        Err(AuthError::ChallengeExpired)
    ));
}

#[test]
fn test_new_challenge_after_expiry() {
    let s = setup();
    s.ws.register("e", "e@corp.example", "pw").unwrap();
    let stale = s.ws.begin_login("e@corp.example", "pw").unwrap();
    let stale_code = s.outbox.code_for("e@corp.example");

    s.clock.advance(600);
    assert!(s.ws.complete_login(&stale.temp_token, &stale_code).is_err());

    let fresh = s.ws.begin_login("e@corp.example", "pw").unwrap();
    let code = s.outbox.code_for("e@corp.example");
    let grant = s.ws.complete_login(&fresh.temp_token, &code).unwrap();
    assert_eq!(grant.expires_at, START + 600 + 3600);
}

#[test]
fn test_session_expires_after_one_hour() {
    let s = setup();
    s.ws.register("e", "e@corp.example", "pw").unwrap();
    let token = login(&s, "e@corp.example", "pw");

    s.clock.advance(3599);
    assert!(s.ws.authorize(Some(&token), Permission::Files).is_ok());

    s.clock.advance(1);
    let err = s.ws.authorize(Some(&token), Permission::Files).unwrap_err();
    assert!(matches!(err, AuthError::TokenExpired));
    assert_eq!(err.status_code(), hyper::StatusCode::UNAUTHORIZED);
}

#[test]
fn test_challenge_token_cannot_be_used_as_session() {
    let s = setup();
    s.ws.register("boss", "admin@corp.example", "pw").unwrap();
    let challenge = s.ws.begin_login("admin@corp.example", "pw").unwrap();

    assert!(matches!(
        s.ws.authorize(Some(&challenge.temp_token), Permission::Files),
        Err(AuthError::Forbidden(_))
    ));
}

#[test]
fn test_token_from_other_deployment() {
    let s = setup();
    s.ws.register("e", "e@corp.example", "pw").unwrap();

    let other = Workstation::builder(
        Arc::new(MemoryStore::new()),
        Arc::new(TokenCodec::new("another-deployment-secret-abcdefghijklmnop").unwrap()),
    )
    .clock(s.clock.clone())
    .delivery(s.outbox.clone())
    .build();
    other.register("e", "e@corp.example", "pw").unwrap();
    let challenge = other.begin_login("e@corp.example", "pw").unwrap();
    let code = s.outbox.code_for("e@corp.example");
    let foreign_session = other
        .complete_login(&challenge.temp_token, &code)
        .unwrap()
        .access_token;

    assert!(matches!(
        s.ws.authorize(Some(&foreign_session), Permission::Files),
        Err(AuthError::Forbidden(_))
    ));
    assert!(matches!(
        s.ws.complete_login(&challenge.temp_token, &code),
        Err(AuthError::InvalidToken)
    ));
}

#[test]
fn test_error_bodies_are_json() {
    let s = setup();
    let err = s.ws.begin_login("ghost@corp.example", "pw").unwrap_err();
    let (status, body) = err.into_status_code_and_body();

    assert_eq!(status, hyper::StatusCode::UNAUTHORIZED);
    let value: serde_json::Value = serde_json::from_str(&body).unwrap();
    assert_eq!(value["error"], "Invalid credentials");
}

#[test]
fn test_rows_follow_the_injected_clock() {
    let s = setup();
    s.ws.register("e", "e@corp.example", "pw").unwrap();
    let token = login(&s, "e@corp.example", "pw");

    s.clock.advance(120);
    let sent = s
        .ws
        .send_message(
            Some(&token),
            MessageDraft {
                recipient_id: None,
                recipient_group: Some("all".into()),
                content: "two minutes in".into(),
            },
        )
        .unwrap();
    assert_eq!(sent.created_at.timestamp(), (START + 120) as i64);

    let inbox = s.ws.inbox(Some(&token)).unwrap();
    assert_eq!(inbox[0].created_at, sent.created_at);
}

#[test]
fn test_unknown_identity_and_wrong_password_look_alike() {
    let s = setup();
    s.ws.register("e", "e@corp.example", "right").unwrap();

    let unknown = s.ws.begin_login("ghost@corp.example", "right").unwrap_err();
    let wrong = s.ws.begin_login("e@corp.example", "wrong").unwrap_err();
    assert_eq!(
        unknown.into_status_code_and_body(),
        wrong.into_status_code_and_body()
    );
}
