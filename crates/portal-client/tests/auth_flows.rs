//! End-to-end negotiation tests against in-process stub servers.
//!
//! Well-behaved portal and CAS endpoints are axum apps bound to ephemeral
//! ports; the CAS transport-failure cases use a raw TCP stub that drops
//! connections mid-flight, which a routed handler cannot express.

use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use axum::extract::{Form, Query};
use axum::http::StatusCode;
use axum::response::Html;
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::Deserialize;
use serde_json::json;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;

use portal_client::{
    AuthError, Authenticator, Credentials, EventBus, LoginStrategy, Notification, PortalConfig,
};

#[derive(Debug, Deserialize)]
struct LoginForm {
    #[serde(rename = "refUrl")]
    ref_url: String,
    #[serde(rename = "userName")]
    user_name: Option<String>,
    #[allow(dead_code)]
    password: Option<String>,
}

#[derive(Debug, Deserialize)]
struct CasSubmission {
    service: String,
    username: String,
    password: String,
    lt: String,
    execution: String,
    #[serde(rename = "_eventId")]
    event_id: String,
    submit: String,
}

#[derive(Clone, Default)]
struct PortalStats {
    login_hits: Arc<AtomicUsize>,
    logout_hits: Arc<AtomicUsize>,
    credentialed_logins: Arc<AtomicUsize>,
}

/// Portal stub: login servlet answering with a fixed user, logout servlet
/// answering with a fixed status.
fn portal_app(returned_user: &str, logout_ok: bool, stats: PortalStats) -> Router {
    let user = returned_user.to_string();
    let login_stats = stats.clone();
    let logout_stats = stats;

    Router::new()
        .route(
            "/umobile/Login",
            post(move |Form(form): Form<LoginForm>| {
                let stats = login_stats.clone();
                let user = user.clone();
                async move {
                    stats.login_hits.fetch_add(1, Ordering::SeqCst);
                    if form.user_name.is_some() {
                        stats.credentialed_logins.fetch_add(1, Ordering::SeqCst);
                    }
                    assert!(form.ref_url.ends_with("/layout.json"));
                    Json(json!({ "user": user, "layout": { "folders": [] } }))
                }
            }),
        )
        .route(
            "/umobile/Logout",
            get(move || {
                let stats = logout_stats.clone();
                async move {
                    stats.logout_hits.fetch_add(1, Ordering::SeqCst);
                    if logout_ok {
                        StatusCode::OK
                    } else {
                        StatusCode::INTERNAL_SERVER_ERROR
                    }
                }
            }),
        )
}

/// Mock fixture stub serving the two layout files the portal ships.
fn mock_app(fixture_hits: Arc<AtomicUsize>) -> Router {
    let guest_hits = fixture_hits.clone();
    let student_hits = fixture_hits;

    Router::new()
        .route(
            "/umobile/layout-guest.json",
            get(move || {
                let hits = guest_hits.clone();
                async move {
                    hits.fetch_add(1, Ordering::SeqCst);
                    Json(json!({ "user": "guest", "layout": { "folders": [] } }))
                }
            }),
        )
        .route(
            "/umobile/layout-student.json",
            get(move || {
                let hits = student_hits.clone();
                async move {
                    hits.fetch_add(1, Ordering::SeqCst);
                    Json(json!({ "user": "student", "layout": { "folders": [] } }))
                }
            }),
        )
}

fn cas_form_html(lt: &str, execution: &str) -> String {
    format!(
        r#"<html><body><form id="fm1" action="/cas/login" method="post">
<input type="hidden" name="lt" value="{lt}" />
<input type="hidden" name="execution" value="{execution}" />
<input type="text" name="username" /><input type="password" name="password" />
</form></body></html>"#
    )
}

/// CAS stub serving the login form on GET and a session payload on POST.
fn cas_form_app(
    lt: &str,
    execution: &str,
    post_user: &str,
    submissions: Arc<Mutex<Vec<CasSubmission>>>,
) -> Router {
    let html = cas_form_html(lt, execution);
    let user = post_user.to_string();

    Router::new().route(
        "/cas/login",
        get(move |Query(params): Query<HashMap<String, String>>| {
            let html = html.clone();
            async move {
                assert!(params
                    .get("service")
                    .is_some_and(|service| service.contains("refUrl=")));
                Html(html)
            }
        })
        .post(move |Form(submission): Form<CasSubmission>| {
            let submissions = submissions.clone();
            let user = user.clone();
            async move {
                submissions.lock().unwrap().push(submission);
                Json(json!({ "user": user, "layout": { "folders": [] } }))
            }
        }),
    )
}

/// CAS stub for the already-established-session case: the GET skips the
/// form and serves the layout payload directly.
fn cas_passthrough_app(user: &str) -> Router {
    let body = json!({ "user": user, "layout": { "folders": [] } }).to_string();
    Router::new().route(
        "/cas/login",
        get(move || {
            let body = body.clone();
            async move { Html(body) }
        }),
    )
}

async fn serve(app: Router) -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    addr
}

/// CAS stub that serves the login form once, then drops every subsequent
/// connection without a response. The POST therefore fails at the
/// transport level, which is what triggers the local-login fallback.
async fn flaky_cas(form_html: String) -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    tokio::spawn(async move {
        let mut served_form = false;
        loop {
            let Ok((mut socket, _)) = listener.accept().await else {
                break;
            };
            let mut buf = [0u8; 8192];
            let _ = socket.read(&mut buf).await;
            if !served_form {
                served_form = true;
                let response = format!(
                    "HTTP/1.1 200 OK\r\ncontent-type: text/html\r\ncontent-length: {}\r\nconnection: close\r\n\r\n{}",
                    form_html.len(),
                    form_html
                );
                let _ = socket.write_all(response.as_bytes()).await;
            }
        }
    });

    addr
}

/// A port that was bound and released: connecting to it is refused.
async fn unreachable_addr() -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);
    addr
}

fn config_for(portal: SocketAddr, cas: Option<SocketAddr>, strategy: LoginStrategy) -> PortalConfig {
    let mut config = PortalConfig::default();
    config.server.base_url = format!("http://{portal}");
    config.server.context = "/umobile".to_string();
    if let Some(cas) = cas {
        config.cas.server_url = format!("http://{cas}");
    }
    config.login.strategy = strategy;
    config.login.timeout_secs = 5;
    config
}

fn authenticator(config: PortalConfig) -> (Authenticator, EventBus) {
    let events = EventBus::new(8);
    let auth = Authenticator::new(Arc::new(config), events.clone()).unwrap();
    (auth, events)
}

#[tokio::test]
async fn local_guest_login_accepts_any_returned_user() {
    let stats = PortalStats::default();
    let portal = serve(portal_app("somebodyElse", true, stats.clone())).await;
    let (auth, _) = authenticator(config_for(portal, None, LoginStrategy::Local));

    let session = auth.login(&Credentials::guest()).await.unwrap();
    assert_eq!(session.user.as_deref(), Some("somebodyElse"));
    assert_eq!(stats.login_hits.load(Ordering::SeqCst), 1);
    assert_eq!(stats.credentialed_logins.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn local_login_rejects_a_mismatched_user() {
    let stats = PortalStats::default();
    let portal = serve(portal_app("other", true, stats.clone())).await;
    let (auth, _) = authenticator(config_for(portal, None, LoginStrategy::Local));

    let err = auth
        .login(&Credentials::new("student", "secret"))
        .await
        .unwrap_err();
    assert!(matches!(err, AuthError::UserMismatch { .. }));
    assert!(err.to_string().starts_with("auth failure"));
}

#[tokio::test]
async fn local_login_succeeds_for_the_matching_user() {
    let stats = PortalStats::default();
    let portal = serve(portal_app("student", true, stats.clone())).await;
    let (auth, _) = authenticator(config_for(portal, None, LoginStrategy::Local));

    let session = auth
        .login(&Credentials::new("student", "secret"))
        .await
        .unwrap();
    assert!(session.is_for("student"));
    assert_eq!(stats.credentialed_logins.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn mock_login_defaults_to_guest() {
    let hits = Arc::new(AtomicUsize::new(0));
    let portal = serve(mock_app(hits.clone())).await;
    let (auth, _) = authenticator(config_for(portal, None, LoginStrategy::Mock));

    let session = auth.login(&Credentials::guest()).await.unwrap();
    assert!(session.is_for("guest"));
    assert_eq!(hits.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn mock_login_rejects_unsupported_users_before_any_network_call() {
    let hits = Arc::new(AtomicUsize::new(0));
    let portal = serve(mock_app(hits.clone())).await;
    let (auth, _) = authenticator(config_for(portal, None, LoginStrategy::Mock));

    let err = auth
        .login(&Credentials::new("admin", "secret"))
        .await
        .unwrap_err();
    assert!(matches!(err, AuthError::UnsupportedUser(ref user) if user == "admin"));
    assert_eq!(hits.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn cas_passthrough_short_circuits_the_credential_submission() {
    let stats = PortalStats::default();
    let portal = serve(portal_app("student", true, stats.clone())).await;
    let cas = serve(cas_passthrough_app("student")).await;
    let (auth, _) = authenticator(config_for(portal, Some(cas), LoginStrategy::Cas));

    let session = auth
        .login(&Credentials::new("student", "secret"))
        .await
        .unwrap();
    assert!(session.is_for("student"));
    // No credential POST, no local fallback.
    assert_eq!(stats.login_hits.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn cas_flow_submits_the_scraped_tokens() {
    let stats = PortalStats::default();
    let submissions = Arc::new(Mutex::new(Vec::new()));
    let portal = serve(portal_app("student", true, stats.clone())).await;
    let cas = serve(cas_form_app("LT-1138-abcdef", "e1s1", "student", submissions.clone())).await;
    let (auth, _) = authenticator(config_for(portal, Some(cas), LoginStrategy::Cas));

    let session = auth
        .login(&Credentials::new("student", "secret"))
        .await
        .unwrap();
    assert!(session.is_for("student"));

    let submissions = submissions.lock().unwrap();
    assert_eq!(submissions.len(), 1);
    let submission = &submissions[0];
    assert_eq!(submission.lt, "LT-1138-abcdef");
    assert_eq!(submission.execution, "e1s1");
    assert_eq!(submission.username, "student");
    assert_eq!(submission.password, "secret");
    assert_eq!(submission.event_id, "submit");
    assert_eq!(submission.submit, "LOGIN");
    assert!(submission.service.contains("refUrl="));
    assert_eq!(stats.login_hits.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn cas_user_mismatch_surfaces_without_fallback() {
    let stats = PortalStats::default();
    let submissions = Arc::new(Mutex::new(Vec::new()));
    let portal = serve(portal_app("student", true, stats.clone())).await;
    let cas = serve(cas_form_app("LT-1", "e1s1", "other", submissions.clone())).await;
    let (auth, _) = authenticator(config_for(portal, Some(cas), LoginStrategy::Cas));

    let err = auth
        .login(&Credentials::new("student", "secret"))
        .await
        .unwrap_err();
    assert!(matches!(err, AuthError::UserMismatch { .. }));
    // The submission went through; the mismatch must not retry locally.
    assert_eq!(submissions.lock().unwrap().len(), 1);
    assert_eq!(stats.login_hits.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn cas_post_failure_falls_back_to_local_login_once() {
    let stats = PortalStats::default();
    let portal = serve(portal_app("student", true, stats.clone())).await;
    let cas = flaky_cas(cas_form_html("LT-1", "e1s1")).await;
    let (auth, _) = authenticator(config_for(portal, Some(cas), LoginStrategy::Cas));

    let session = auth
        .login(&Credentials::new("student", "secret"))
        .await
        .unwrap();
    assert!(session.is_for("student"));
    assert_eq!(stats.login_hits.load(Ordering::SeqCst), 1);
    assert_eq!(stats.credentialed_logins.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn cas_get_failure_surfaces_without_fallback() {
    let stats = PortalStats::default();
    let portal = serve(portal_app("student", true, stats.clone())).await;
    let cas = unreachable_addr().await;
    let (auth, _) = authenticator(config_for(portal, Some(cas), LoginStrategy::Cas));

    let err = auth
        .login(&Credentials::new("student", "secret"))
        .await
        .unwrap_err();
    assert!(matches!(err, AuthError::Transport(_)));
    assert_eq!(stats.login_hits.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn cas_guest_request_goes_through_the_local_servlet() {
    let stats = PortalStats::default();
    let portal = serve(portal_app("guest", true, stats.clone())).await;
    // If CAS were contacted at all, this address would refuse the connection.
    let cas = unreachable_addr().await;
    let (auth, _) = authenticator(config_for(portal, Some(cas), LoginStrategy::Cas));

    let session = auth.login(&Credentials::guest()).await.unwrap();
    assert!(session.is_for("guest"));
    assert_eq!(stats.login_hits.load(Ordering::SeqCst), 1);
    assert_eq!(stats.credentialed_logins.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn switch_user_logs_out_then_reauthenticates() {
    let stats = PortalStats::default();
    let portal = serve(portal_app("student", true, stats.clone())).await;
    let (auth, _) = authenticator(config_for(portal, None, LoginStrategy::Local));

    let session = auth
        .switch_user(&Credentials::new("student", "secret"))
        .await
        .unwrap();
    assert!(session.is_for("student"));
    assert_eq!(stats.logout_hits.load(Ordering::SeqCst), 1);
    assert_eq!(stats.login_hits.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn switch_user_surfaces_a_failed_logout_without_logging_in() {
    let stats = PortalStats::default();
    let portal = serve(portal_app("student", false, stats.clone())).await;
    let (auth, _) = authenticator(config_for(portal, None, LoginStrategy::Local));

    let err = auth
        .switch_user(&Credentials::new("student", "secret"))
        .await
        .unwrap_err();
    assert_eq!(err.status().map(|s| s.as_u16()), Some(500));
    assert_eq!(stats.logout_hits.load(Ordering::SeqCst), 1);
    assert_eq!(stats.login_hits.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn establish_session_broadcasts_the_established_session() {
    let stats = PortalStats::default();
    let portal = serve(portal_app("student", true, stats.clone())).await;
    let (auth, events) = authenticator(config_for(portal, None, LoginStrategy::Local));
    let mut rx = events.subscribe();

    auth.establish_session(&Credentials::new("student", "secret"))
        .await
        .unwrap();

    match rx.try_recv().unwrap() {
        Notification::SessionEstablished { session } => assert!(session.is_for("student")),
        other => panic!("unexpected notification: {other:?}"),
    }
}

#[tokio::test]
async fn establish_session_broadcasts_the_failure() {
    let stats = PortalStats::default();
    let portal = serve(portal_app("other", true, stats.clone())).await;
    let (auth, events) = authenticator(config_for(portal, None, LoginStrategy::Local));
    let mut rx = events.subscribe();

    let result = auth
        .establish_session(&Credentials::new("student", "secret"))
        .await;
    assert!(result.is_err());

    match rx.try_recv().unwrap() {
        Notification::SessionFailure { status, reason } => {
            assert_eq!(status, None);
            assert!(reason.starts_with("auth failure"));
        }
        other => panic!("unexpected notification: {other:?}"),
    }
}
