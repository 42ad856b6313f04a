//! HTTP/WebSocket front end
//!
//! - `POST /chatapp/send`: multipart form with `name`, `email`, `topic` and
//!   `content`; stores and broadcasts one message.
//! - `GET /chatapp/websocket`: upgrades to a WebSocket served by a
//!   [`Session`].
//!
//! Every origin is accepted.

use std::collections::HashMap;
use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use axum::Router;
use axum::extract::multipart::MultipartError;
use axum::extract::ws::WebSocketUpgrade;
use axum::extract::{ConnectInfo, DefaultBodyLimit, Multipart, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use tokio::net::TcpListener;
use tokio::sync::RwLock;
use tower_http::cors::CorsLayer;
use tracing::{error, info, warn};

use crate::broker::Broker;
use crate::config::Settings;
use crate::ingress::{Ingress, Submission};
use crate::persistence::Persistence;
use crate::store::{ChatLog, MessageStore};
use crate::transport::session::Session;
use crate::utils::Result;

pub const SEND_PATH: &str = "/chatapp/send";
pub const WEBSOCKET_PATH: &str = "/chatapp/websocket";

/// Shared state handed to every request handler.
#[derive(Debug, Clone)]
pub struct AppState {
    pub log: Arc<RwLock<ChatLog>>,
    pub broker: Broker,
    pub ingress: Ingress,
    pub write_timeout: Duration,
}

impl AppState {
    pub fn new(log: ChatLog, settings: &Settings) -> Self {
        let log = Arc::new(RwLock::new(log));
        let broker = Broker::new(settings.broker.subscriber_buffer);
        Self {
            ingress: Ingress::new(log.clone(), broker.clone()),
            log,
            broker,
            write_timeout: Duration::from_millis(settings.server.write_timeout_ms),
        }
    }

    /// Builds the state described by `settings`, reopening the durable log
    /// when a persistence path is configured.
    pub fn from_settings(settings: &Settings) -> Result<Self> {
        let store = match &settings.persistence.path {
            Some(path) => MessageStore::with_persistence(Persistence::open(path)?)?,
            None => MessageStore::new(),
        };
        Ok(Self::new(ChatLog::new(store), settings))
    }
}

pub fn router(state: AppState, max_body_bytes: usize) -> Router {
    Router::new()
        .route(SEND_PATH, post(send_message))
        .route(WEBSOCKET_PATH, get(websocket))
        .layer(DefaultBodyLimit::max(max_body_bytes))
        .layer(CorsLayer::permissive())
        .with_state(state)
}

async fn send_message(
    State(state): State<AppState>,
    ConnectInfo(peer): ConnectInfo<SocketAddr>,
    multipart: Multipart,
) -> Response {
    let fields = match read_form(multipart).await {
        Ok(fields) => fields,
        Err(e) => {
            warn!("unreadable form from {peer}: {}", e.body_text());
            return (e.status(), e.body_text()).into_response();
        }
    };

    let submission = match Submission::from_fields(fields) {
        Ok(submission) => submission,
        Err(e) => {
            warn!("rejected submission from {peer}: {e}");
            return e.into_response();
        }
    };

    info!("new message received from {peer}");
    match state.ingress.submit(&submission).await {
        Ok(_) => StatusCode::OK.into_response(),
        Err(e) => {
            error!("failed to store message from {peer}: {e}");
            e.into_response()
        }
    }
}

/// Collects the text of every known form field. A repeated field keeps its
/// first value.
async fn read_form(
    mut multipart: Multipart,
) -> std::result::Result<HashMap<String, String>, MultipartError> {
    let mut fields = HashMap::new();
    while let Some(field) = multipart.next_field().await? {
        let Some(name) = field.name().map(str::to_owned) else {
            continue;
        };
        if !Submission::is_known_field(&name) || fields.contains_key(&name) {
            continue;
        }
        let value = field.text().await?;
        fields.insert(name, value);
    }
    Ok(fields)
}

async fn websocket(
    ws: WebSocketUpgrade,
    State(state): State<AppState>,
    ConnectInfo(peer): ConnectInfo<SocketAddr>,
) -> Response {
    info!("client connection from {peer}");
    let session = Session::new(state.log, state.broker, state.write_timeout, peer);
    ws.on_upgrade(move |socket| async move {
        session.run(socket).await;
    })
}

/// Serves `app` on `listener` until `shutdown` resolves.
pub async fn serve<F>(listener: TcpListener, app: Router, shutdown: F) -> std::io::Result<()>
where
    F: Future<Output = ()> + Send + 'static,
{
    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown)
    .await
}

/// Binds the configured address and runs the relay until Ctrl-C.
pub async fn start_server(settings: Settings) -> Result<()> {
    let state = AppState::from_settings(&settings)?;
    let addr = settings.listen_addr();
    let listener = TcpListener::bind(&addr).await?;

    info!("chat relay listening on http://{addr}");
    info!("  POST {SEND_PATH}  |  WS {WEBSOCKET_PATH}");

    let app = router(state, settings.server.max_body_bytes);
    serve(listener, app, async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!("failed to listen for shutdown signal: {e}");
            std::future::pending::<()>().await;
        }
        info!("shutdown signal received, exiting");
    })
    .await?;

    Ok(())
}
