use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use axum::extract::DefaultBodyLimit;
use axum::middleware;
use axum::routing::{get, post};
use axum::Router;
use secrecy::SecretString;
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;

use obs_control_link::UpstreamLink;

use crate::auth::{self, TokenGate};
use crate::dispatcher::ActionDispatcher;
use crate::handlers;
use crate::health::HealthReporter;

/// Server configuration.
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    /// Static assets served for every path not claimed by the API.
    pub public_dir: PathBuf,
    pub panel_path: PathBuf,
    /// Shared token; `None` or empty leaves every route open.
    pub panel_token: Option<SecretString>,
    pub body_limit: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".into(),
            port: 8080,
            public_dir: PathBuf::from("public"),
            panel_path: PathBuf::from("/app/panel.json"),
            panel_token: None,
            body_limit: 200 * 1024,
        }
    }
}

/// Shared application state passed to Axum handlers.
#[derive(Clone)]
pub struct AppState {
    pub dispatcher: Arc<ActionDispatcher>,
    pub health: Arc<HealthReporter>,
    pub panel_path: Arc<PathBuf>,
}

impl AppState {
    pub fn new(link: Arc<UpstreamLink>, panel_path: PathBuf) -> Self {
        Self {
            dispatcher: Arc::new(ActionDispatcher::new(Arc::clone(&link))),
            health: Arc::new(HealthReporter::new(link)),
            panel_path: Arc::new(panel_path),
        }
    }
}

/// Build the Axum router with all routes.
pub fn build_router(config: &ServerConfig, link: Arc<UpstreamLink>) -> Router {
    let state = AppState::new(link, config.panel_path.clone());
    let gate = TokenGate::new(config.panel_token.clone());

    Router::new()
        .route("/api/health", get(handlers::health))
        .route("/api/panel", get(handlers::panel))
        .route("/api/action", post(handlers::action))
        .fallback_service(ServeDir::new(&config.public_dir))
        .with_state(state)
        .layer(DefaultBodyLimit::max(config.body_limit))
        .layer(middleware::from_fn_with_state(gate, auth::require_token))
        .layer(TraceLayer::new_for_http())
}

/// Bind and start serving. Returns a handle that keeps the server task alive.
pub async fn start(
    config: ServerConfig,
    link: Arc<UpstreamLink>,
) -> Result<ServerHandle, std::io::Error> {
    let token_gate = TokenGate::new(config.panel_token.clone()).is_enabled();
    let router = build_router(&config, link);
    let listener = tokio::net::TcpListener::bind((config.host.as_str(), config.port)).await?;
    let local_addr = listener.local_addr()?;

    tracing::info!(
        addr = %local_addr,
        token_gate,
        public_dir = %config.public_dir.display(),
        "obs-control listening"
    );

    let server = tokio::spawn(async move {
        if let Err(e) = axum::serve(listener, router).await {
            tracing::error!(error = %e, "HTTP server stopped");
        }
    });

    Ok(ServerHandle {
        addr: local_addr,
        port: local_addr.port(),
        _server: server,
    })
}

/// Handle returned by `start()`.
pub struct ServerHandle {
    pub addr: SocketAddr,
    pub port: u16,
    _server: tokio::task::JoinHandle<()>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use obs_control_core::action::UpstreamRequest;
    use obs_control_core::errors::UpstreamError;
    use obs_control_core::security::{Credential, UpstreamTarget};
    use obs_control_core::session::UpstreamSession;
    use obs_control_link::mock::MockSession;
    use serde_json::{json, Value};
    use std::path::Path;

    fn link_for(mock: &Arc<MockSession>) -> Arc<UpstreamLink> {
        Arc::new(UpstreamLink::with_defaults(
            Arc::clone(mock) as Arc<dyn UpstreamSession>,
            UpstreamTarget::new("ws://mock", Credential::default()),
        ))
    }

    fn test_config(dir: &Path) -> ServerConfig {
        ServerConfig {
            host: "127.0.0.1".into(),
            port: 0,
            public_dir: dir.join("public"),
            panel_path: dir.join("panel.json"),
            ..Default::default()
        }
    }

    fn url(handle: &ServerHandle, path: &str) -> String {
        format!("http://127.0.0.1:{}{}", handle.port, path)
    }

    async fn post_action(handle: &ServerHandle, body: Value) -> (u16, Value) {
        let resp = reqwest::Client::new()
            .post(url(handle, "/api/action"))
            .json(&body)
            .send()
            .await
            .unwrap();
        let status = resp.status().as_u16();
        (status, resp.json().await.unwrap())
    }

    #[tokio::test]
    async fn health_reports_disconnected_link() {
        let dir = tempfile::tempdir().unwrap();
        let mock = Arc::new(MockSession::new());
        let handle = start(test_config(dir.path()), link_for(&mock)).await.unwrap();
        assert!(handle.port > 0);

        let resp = reqwest::get(url(&handle, "/api/health")).await.unwrap();
        assert_eq!(resp.status(), 200);
        let body: Value = resp.json().await.unwrap();
        assert_eq!(
            body,
            json!({"ok": false, "obsConnected": false, "lastObsError": ""})
        );
    }

    #[tokio::test]
    async fn health_reports_connected_link() {
        let dir = tempfile::tempdir().unwrap();
        let mock = Arc::new(MockSession::new());
        let link = link_for(&mock);
        link.connect().await;
        let handle = start(test_config(dir.path()), link).await.unwrap();

        let body: Value = reqwest::get(url(&handle, "/api/health"))
            .await
            .unwrap()
            .json()
            .await
            .unwrap();
        assert_eq!(body["ok"], true);
        assert_eq!(body["obsConnected"], true);
        assert_eq!(body["lastObsError"], "");
    }

    #[tokio::test]
    async fn action_success_and_failures() {
        let dir = tempfile::tempdir().unwrap();
        let mock = Arc::new(MockSession::new());
        let link = link_for(&mock);
        link.connect().await;
        let handle = start(test_config(dir.path()), link).await.unwrap();

        let (status, body) =
            post_action(&handle, json!({"action": "scene", "sceneName": "Intro"})).await;
        assert_eq!(status, 200);
        assert_eq!(body, json!({"ok": true, "message": "Scene set to Intro"}));

        let (status, body) = post_action(&handle, json!({"action": "teleport"})).await;
        assert_eq!(status, 400);
        assert_eq!(body, json!({"ok": false, "error": "Unknown action"}));

        let (status, body) = post_action(&handle, json!({"action": "mute"})).await;
        assert_eq!(status, 400);
        assert_eq!(body["error"], "inputName missing");

        mock.push_call_result(Err(UpstreamError::rejected(
            500,
            Some("Output already active".into()),
        )));
        let (status, body) = post_action(&handle, json!({"action": "start_stream"})).await;
        assert_eq!(status, 400);
        assert_eq!(body["error"], "Output already active");

        assert_eq!(mock.calls().len(), 2);
    }

    #[tokio::test]
    async fn action_while_disconnected() {
        let dir = tempfile::tempdir().unwrap();
        let mock = Arc::new(MockSession::new());
        let handle = start(test_config(dir.path()), link_for(&mock)).await.unwrap();

        let (status, body) = post_action(&handle, json!({"action": "start_stream"})).await;
        assert_eq!(status, 400);
        assert_eq!(body, json!({"ok": false, "error": "OBS not connected"}));
        assert!(mock.calls().is_empty());
    }

    #[tokio::test]
    async fn action_body_edge_cases() {
        let dir = tempfile::tempdir().unwrap();
        let mock = Arc::new(MockSession::new());
        let link = link_for(&mock);
        link.connect().await;
        let handle = start(test_config(dir.path()), link).await.unwrap();
        let client = reqwest::Client::new();

        let resp = client.post(url(&handle, "/api/action")).send().await.unwrap();
        assert_eq!(resp.status(), 400);
        let body: Value = resp.json().await.unwrap();
        assert_eq!(body["error"], "Unknown action");

        let resp = client
            .post(url(&handle, "/api/action"))
            .body("{not json")
            .send()
            .await
            .unwrap();
        assert_eq!(resp.status(), 400);
        let body: Value = resp.json().await.unwrap();
        assert_eq!(body["ok"], false);
        assert!(body["error"]
            .as_str()
            .unwrap()
            .starts_with("invalid request body:"));

        assert!(mock.calls().is_empty());
    }

    #[tokio::test]
    async fn wrong_typed_fields_follow_readiness_and_validation() {
        let dir = tempfile::tempdir().unwrap();
        let mock = Arc::new(MockSession::new());
        let link = link_for(&mock);
        let handle = start(test_config(dir.path()), Arc::clone(&link))
            .await
            .unwrap();
        let unused_field = json!({"action": "start_stream", "sceneName": 5});

        let (status, body) = post_action(&handle, unused_field.clone()).await;
        assert_eq!(status, 400);
        assert_eq!(body, json!({"ok": false, "error": "OBS not connected"}));
        let (_, body) = post_action(&handle, json!({"action": 5})).await;
        assert_eq!(body["error"], "OBS not connected");
        assert!(mock.calls().is_empty());

        link.connect().await;

        let (status, body) = post_action(&handle, unused_field).await;
        assert_eq!(status, 200);
        assert_eq!(body, json!({"ok": true, "message": "Stream started"}));
        assert_eq!(mock.calls(), vec![UpstreamRequest::StartStream]);

        let (status, body) = post_action(&handle, json!({"action": 5})).await;
        assert_eq!(status, 400);
        assert_eq!(body["error"], "Unknown action");

        let (status, body) = post_action(&handle, json!({"action": "scene", "sceneName": 7})).await;
        assert_eq!(status, 400);
        assert_eq!(body["error"], "sceneName missing");

        assert_eq!(mock.calls().len(), 1);
    }

    #[tokio::test]
    async fn panel_document() {
        let dir = tempfile::tempdir().unwrap();
        let mock = Arc::new(MockSession::new());
        let config = test_config(dir.path());
        let panel_path = config.panel_path.clone();
        let handle = start(config, link_for(&mock)).await.unwrap();

        let resp = reqwest::get(url(&handle, "/api/panel")).await.unwrap();
        assert_eq!(resp.status(), 500);
        assert_eq!(resp.text().await.unwrap(), "panel.json not readable");

        std::fs::write(&panel_path, r#"{"scenes":["Intro","Live"]}"#).unwrap();
        let resp = reqwest::get(url(&handle, "/api/panel")).await.unwrap();
        assert_eq!(resp.status(), 200);
        let body: Value = resp.json().await.unwrap();
        assert_eq!(body, json!({"scenes": ["Intro", "Live"]}));

        std::fs::write(&panel_path, "{broken").unwrap();
        let resp = reqwest::get(url(&handle, "/api/panel")).await.unwrap();
        assert_eq!(resp.status(), 500);
    }

    #[tokio::test]
    async fn serves_static_assets() {
        let dir = tempfile::tempdir().unwrap();
        let config = test_config(dir.path());
        std::fs::create_dir_all(&config.public_dir).unwrap();
        std::fs::write(config.public_dir.join("index.html"), "<h1>panel</h1>").unwrap();
        let mock = Arc::new(MockSession::new());
        let handle = start(config, link_for(&mock)).await.unwrap();

        let resp = reqwest::get(url(&handle, "/index.html")).await.unwrap();
        assert_eq!(resp.status(), 200);
        assert_eq!(resp.text().await.unwrap(), "<h1>panel</h1>");

        let resp = reqwest::get(url(&handle, "/")).await.unwrap();
        assert_eq!(resp.status(), 200);

        let resp = reqwest::get(url(&handle, "/missing.js")).await.unwrap();
        assert_eq!(resp.status(), 404);
    }

    #[tokio::test]
    async fn token_gate_guards_every_route() {
        let dir = tempfile::tempdir().unwrap();
        let config = ServerConfig {
            panel_token: Some(SecretString::from("s3cret".to_string())),
            ..test_config(dir.path())
        };
        let mock = Arc::new(MockSession::new());
        let handle = start(config, link_for(&mock)).await.unwrap();
        let client = reqwest::Client::new();

        for path in ["/api/health", "/api/panel", "/index.html"] {
            let resp = client.get(url(&handle, path)).send().await.unwrap();
            assert_eq!(resp.status(), 401, "path {path}");
            assert_eq!(resp.text().await.unwrap(), "Unauthorized");
        }

        let resp = client
            .post(url(&handle, "/api/action"))
            .header(auth::TOKEN_HEADER, "wrong")
            .json(&json!({"action": "start_stream"}))
            .send()
            .await
            .unwrap();
        assert_eq!(resp.status(), 401);
        assert!(mock.calls().is_empty());

        let resp = client
            .get(url(&handle, "/api/health"))
            .header(auth::TOKEN_HEADER, "s3cret")
            .send()
            .await
            .unwrap();
        assert_eq!(resp.status(), 200);
    }

    #[test]
    fn build_router_creates_routes() {
        let mock = Arc::new(MockSession::new());
        let _router = build_router(&ServerConfig::default(), link_for(&mock));
    }
}
