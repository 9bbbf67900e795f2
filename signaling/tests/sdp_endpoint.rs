use std::net::SocketAddr;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use reqwest::{header, Method, StatusCode};
use signaling::{
    router, AppState, EngineStatus, IngestStatus, Negotiated, NegotiationError, OfferHandler,
    SdpType, SessionDescription,
};
use tokio::net::TcpListener;

const ANSWER_SDP: &str = "v=0\r\na=candidate:1 1 udp 2130706431 127.0.0.1 50000 typ host\r\n";

#[derive(Default)]
struct FakeEngine {
    offers: Mutex<Vec<SessionDescription>>,
    fail_remote: bool,
    ingest_running: Option<bool>,
}

#[async_trait]
impl OfferHandler for FakeEngine {
    async fn answer(&self, offer: SessionDescription) -> Result<Negotiated, NegotiationError> {
        self.offers.lock().unwrap().push(offer);
        if self.fail_remote {
            return Err(NegotiationError::RemoteDescription("bad sdp".into()));
        }
        Ok(Negotiated {
            session_id: "sess1".into(),
            answer: SessionDescription::answer(ANSWER_SDP),
        })
    }

    async fn close_session(&self, session_id: &str) -> bool {
        session_id == "sess1"
    }

    async fn status(&self) -> EngineStatus {
        EngineStatus {
            sessions: self.offers.lock().unwrap().len(),
            ingest: self.ingest_running.map(|running| IngestStatus {
                running,
                ..Default::default()
            }),
        }
    }
}

async fn spawn_server(state: AppState, static_dir: &std::path::Path) -> SocketAddr {
    let app = router(state, static_dir);
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    addr
}

async fn spawn_with_engine(engine: Arc<FakeEngine>) -> (SocketAddr, tempfile::TempDir) {
    let dir = tempfile::tempdir().unwrap();
    let state = AppState::new(engine).with_cors_allow_any(true);
    let addr = spawn_server(state, dir.path()).await;
    (addr, dir)
}

fn offer_json() -> String {
    serde_json::to_string(&SessionDescription::offer("v=0\r\n")).unwrap()
}

#[tokio::test]
async fn non_post_methods_are_rejected() {
    let engine = Arc::new(FakeEngine::default());
    let (addr, _dir) = spawn_with_engine(engine.clone()).await;
    let client = reqwest::Client::new();

    for method in [Method::GET, Method::PUT, Method::DELETE, Method::PATCH] {
        let resp = client
            .request(method.clone(), format!("http://{addr}/sdp"))
            .send()
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::METHOD_NOT_ALLOWED, "{method}");
        assert_eq!(resp.headers()[header::ALLOW], "POST");
    }
    assert!(engine.offers.lock().unwrap().is_empty());
}

#[tokio::test]
async fn malformed_bodies_are_bad_requests() {
    let engine = Arc::new(FakeEngine::default());
    let (addr, _dir) = spawn_with_engine(engine.clone()).await;
    let client = reqwest::Client::new();

    let bodies = [
        "",
        "not json",
        r#"{"type":"offer"}"#,
        r#"{"type":"bogus","sdp":"v=0"}"#,
        r#"["offer"]"#,
    ];
    for body in bodies {
        let resp = client
            .post(format!("http://{addr}/sdp"))
            .body(body)
            .send()
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST, "body: {body:?}");
        assert_eq!(resp.text().await.unwrap(), "Failed to parse SDP offer");
    }
    assert!(engine.offers.lock().unwrap().is_empty());
}

#[tokio::test]
async fn oversized_body_is_bad_request() {
    let dir = tempfile::tempdir().unwrap();
    let state = AppState::new(Arc::new(FakeEngine::default())).with_max_body_bytes(16);
    let addr = spawn_server(state, dir.path()).await;

    let resp = reqwest::Client::new()
        .post(format!("http://{addr}/sdp"))
        .body(offer_json())
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    assert_eq!(resp.text().await.unwrap(), "Failed to read request body");
}

#[tokio::test]
async fn missing_engine_is_server_error() {
    let dir = tempfile::tempdir().unwrap();
    let addr = spawn_server(AppState::uninitialized(), dir.path()).await;
    let client = reqwest::Client::new();

    let resp = client
        .post(format!("http://{addr}/sdp"))
        .body(offer_json())
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);

    let resp = client
        .get(format!("http://{addr}/health"))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::SERVICE_UNAVAILABLE);
}

#[tokio::test]
async fn engine_failure_is_server_error() {
    let engine = Arc::new(FakeEngine {
        fail_remote: true,
        ..Default::default()
    });
    let (addr, _dir) = spawn_with_engine(engine.clone()).await;

    let resp = reqwest::Client::new()
        .post(format!("http://{addr}/sdp"))
        .body(offer_json())
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(resp.headers()[header::ACCESS_CONTROL_ALLOW_ORIGIN], "*");
    assert!(resp
        .text()
        .await
        .unwrap()
        .starts_with("failed to set remote description"));
    assert_eq!(engine.offers.lock().unwrap().len(), 1);
}

#[tokio::test]
async fn valid_offer_returns_answer() {
    let engine = Arc::new(FakeEngine::default());
    let (addr, _dir) = spawn_with_engine(engine.clone()).await;

    let resp = reqwest::Client::new()
        .post(format!("http://{addr}/sdp"))
        .body(offer_json())
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(resp.headers()[header::CONTENT_TYPE], "application/json");
    assert_eq!(resp.headers()[header::LOCATION], "/sdp/sess1");
    assert_eq!(resp.headers()[header::ACCESS_CONTROL_ALLOW_ORIGIN], "*");

    let answer: SessionDescription = resp.json().await.unwrap();
    assert_eq!(answer.sdp_type, SdpType::Answer);
    assert!(answer.sdp.contains("a=candidate"));

    let offers = engine.offers.lock().unwrap();
    assert_eq!(offers.as_slice(), &[SessionDescription::offer("v=0\r\n")]);
}

#[tokio::test]
async fn cors_header_is_opt_in() {
    let dir = tempfile::tempdir().unwrap();
    let state = AppState::new(Arc::new(FakeEngine::default()));
    let addr = spawn_server(state, dir.path()).await;

    let resp = reqwest::Client::new()
        .post(format!("http://{addr}/sdp"))
        .body(offer_json())
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    assert!(resp
        .headers()
        .get(header::ACCESS_CONTROL_ALLOW_ORIGIN)
        .is_none());
}

#[tokio::test]
async fn sessions_can_be_closed() {
    let (addr, _dir) = spawn_with_engine(Arc::new(FakeEngine::default())).await;
    let client = reqwest::Client::new();

    let resp = client
        .delete(format!("http://{addr}/sdp/sess1"))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::NO_CONTENT);

    let resp = client
        .delete(format!("http://{addr}/sdp/unknown"))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn health_reports_sessions_and_dead_ingest() {
    let healthy = Arc::new(FakeEngine {
        ingest_running: Some(true),
        ..Default::default()
    });
    let (addr, _dir) = spawn_with_engine(healthy).await;
    let resp = reqwest::get(format!("http://{addr}/health")).await.unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let status: EngineStatus = resp.json().await.unwrap();
    assert_eq!(status.sessions, 0);
    assert!(status.ingest.unwrap().running);

    let dead = Arc::new(FakeEngine {
        ingest_running: Some(false),
        ..Default::default()
    });
    let (addr, _dir) = spawn_with_engine(dead).await;
    let resp = reqwest::get(format!("http://{addr}/health")).await.unwrap();
    assert_eq!(resp.status(), StatusCode::SERVICE_UNAVAILABLE);
}

#[tokio::test]
async fn static_files_are_served_unchanged() {
    let dir = tempfile::tempdir().unwrap();
    let payload: Vec<u8> = (0..=255u8).cycle().take(4096).collect();
    std::fs::write(dir.path().join("clip.bin"), &payload).unwrap();
    std::fs::write(dir.path().join("index.html"), "<html>viewer</html>").unwrap();

    let state = AppState::new(Arc::new(FakeEngine::default()));
    let addr = spawn_server(state, dir.path()).await;

    let resp = reqwest::get(format!("http://{addr}/clip.bin")).await.unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(resp.bytes().await.unwrap().as_ref(), payload.as_slice());

    let resp = reqwest::get(format!("http://{addr}/")).await.unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(resp.text().await.unwrap(), "<html>viewer</html>");

    let resp = reqwest::get(format!("http://{addr}/missing.js")).await.unwrap();
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}
