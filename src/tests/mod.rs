//! End-to-end tests: a real relay on an ephemeral port, driven over HTTP and
//! WebSocket.


use std::net::SocketAddr;
use std::time::Duration;

use tokio::net::TcpListener;
use tokio::sync::oneshot;

use crate::client::ChatClient;
use crate::config::Settings;
use crate::store::ChatLog;
use crate::transport::{AppState, SEND_PATH, WEBSOCKET_PATH, router, serve};

pub(crate) struct TestRelay {
    pub addr: SocketAddr,
    pub state: AppState,
    _shutdown: oneshot::Sender<()>,
}

impl TestRelay {
    pub async fn start(settings: Settings) -> Self {
        let state = AppState::new(ChatLog::default(), &settings);
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let app = router(state.clone(), settings.server.max_body_bytes);

        let (tx, rx) = oneshot::channel::<()>();
        tokio::spawn(serve(listener, app, async {
            let _ = rx.await;
        }));

        Self {
            addr,
            state,
            _shutdown: tx,
        }
    }

    pub fn ws_url(&self) -> String {
        format!("ws://{}{}", self.addr, WEBSOCKET_PATH)
    }

    pub fn send_url(&self) -> String {
        format!("http://{}{}", self.addr, SEND_PATH)
    }

    /// Connects a client and waits until its session has subscribed.
    pub async fn connect(&self) -> ChatClient {
        let before = self.state.broker.subscriber_count();
        let client = ChatClient::connect(&self.ws_url()).await.unwrap();
        self.wait_for_subscribers(before + 1).await;
        client
    }

    pub async fn wait_for_subscribers(&self, n: usize) {
        tokio::time::timeout(Duration::from_secs(5), async {
            while self.state.broker.subscriber_count() != n {
                tokio::time::sleep(Duration::from_millis(10)).await;
            }
        })
        .await
        .unwrap_or_else(|_| {
            panic!(
                "expected {n} subscribers, have {}",
                self.state.broker.subscriber_count()
            )
        });
    }

    pub async fn post(&self, fields: &[(&str, &str)]) -> reqwest::StatusCode {
        let form = fields
            .iter()
            .fold(reqwest::multipart::Form::new(), |form, (k, v)| {
                form.text(k.to_string(), v.to_string())
            });
        reqwest::Client::new()
            .post(self.send_url())
            .multipart(form)
            .send()
            .await
            .unwrap()
            .status()
    }

    pub async fn post_message(&self, name: &str, content: &str) -> reqwest::StatusCode {
        self.post(&[
            ("name", name),
            ("email", "a@x.com"),
            ("topic", "hi"),
            ("content", content),
        ])
        .await
    }
}
