//! What the client writes to its log, captured through a scoped subscriber.

use std::io;
use std::sync::Arc;

use parking_lot::Mutex;
use serde_json::{Value, json};
use tracing::subscriber::DefaultGuard;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::fmt::MakeWriter;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use crate::common::{client_for, signed_in, token_body};

#[derive(Clone, Default)]
struct Captured(Arc<Mutex<Vec<u8>>>);

impl Captured {
    fn contents(&self) -> String {
        String::from_utf8_lossy(&self.0.lock()).into_owned()
    }
}

impl io::Write for Captured {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.lock().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl<'a> MakeWriter<'a> for Captured {
    type Writer = Captured;

    fn make_writer(&'a self) -> Self::Writer {
        self.clone()
    }
}

/// Debug-level output of this crate until the guard drops.
fn capture_logs() -> (Captured, DefaultGuard) {
    let captured = Captured::default();
    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new("banking_client=debug"))
        .with_writer(captured.clone())
        .with_ansi(false)
        .finish();
    let guard = tracing::subscriber::set_default(subscriber);
    (captured, guard)
}

#[tokio::test]
async fn test_refresh_token_never_logged() {
    let server = MockServer::start().await;
    let store = signed_in("a1", "SECRET-REFRESH-r1");

    Mock::given(method("POST"))
        .and(path("/auth/refresh"))
        .respond_with(ResponseTemplate::new(200).set_body_json(token_body("a2", "SECRET-REFRESH-r2")))
        .expect(1)
        .mount(&server)
        .await;

    let api = client_for(&server, &store);
    let (logs, _guard) = capture_logs();
    api.refresh_session().await.unwrap();
    let logs = logs.contents();

    assert!(logs.contains("Sending request"), "{logs}");
    assert!(logs.contains(r#"{"refreshToken":"[REDACTED]"}"#), "{logs}");
    assert!(!logs.contains("SECRET-REFRESH"), "{logs}");

    // The wire body is untouched.
    let requests = server.received_requests().await.unwrap();
    let sent: Value = serde_json::from_slice(&requests[0].body).unwrap();
    assert_eq!(sent, json!({ "refreshToken": "SECRET-REFRESH-r1" }));
}

#[tokio::test]
async fn test_password_redacted_in_logged_body() {
    let server = MockServer::start().await;
    let store = signed_in("a1", "r1");

    Mock::given(method("POST"))
        .and(path("/auth/login"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "ok": true })))
        .expect(1)
        .mount(&server)
        .await;

    let api = client_for(&server, &store);
    let (logs, _guard) = capture_logs();
    api.post::<Value, _>("/auth/login", &json!({ "email": "a@b.com", "password": "hunter2" }))
        .await
        .unwrap();
    let logs = logs.contents();

    assert!(logs.contains("a@b.com"), "{logs}");
    assert!(logs.contains("[REDACTED]"), "{logs}");
    assert!(!logs.contains("hunter2"), "{logs}");

    let requests = server.received_requests().await.unwrap();
    let sent: Value = serde_json::from_slice(&requests[0].body).unwrap();
    assert_eq!(sent["password"], "hunter2");
}

#[tokio::test]
async fn test_session_probe_401_logged_at_debug() {
    let server = MockServer::start().await;
    let store = signed_in("a1", "r1");

    Mock::given(method("GET"))
        .and(path("/auth/me"))
        .respond_with(ResponseTemplate::new(401))
        .expect(1)
        .mount(&server)
        .await;

    let api = client_for(&server, &store);
    let (logs, _guard) = capture_logs();
    api.get::<Value>("/auth/me").await.unwrap_err();
    let logs = logs.contents();

    let unauthorized: Vec<&str> = logs.lines().filter(|l| l.contains("Unauthorized")).collect();
    assert_eq!(unauthorized.len(), 1, "{logs}");
    assert!(unauthorized[0].contains("DEBUG"), "{logs}");
    assert!(!logs.contains("WARN"), "{logs}");
}

#[tokio::test]
async fn test_expired_access_401_logged_at_warn() {
    let server = MockServer::start().await;
    let store = signed_in("a1", "r1");

    Mock::given(method("GET"))
        .and(path("/accounts"))
        .respond_with(ResponseTemplate::new(401))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/auth/refresh"))
        .respond_with(ResponseTemplate::new(401))
        .expect(1)
        .mount(&server)
        .await;

    let api = client_for(&server, &store);
    let (logs, _guard) = capture_logs();
    api.get::<Value>("/accounts").await.unwrap_err();
    let logs = logs.contents();

    let unauthorized = logs
        .lines()
        .find(|l| l.contains("Unauthorized"))
        .unwrap_or_default();
    assert!(unauthorized.contains("WARN"), "{logs}");
}
