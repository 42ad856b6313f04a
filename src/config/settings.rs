use serde::Deserialize;

/// Top-level configuration settings for the relay.
#[derive(Debug, Deserialize, Clone)]
pub struct Settings {
    pub server: ServerSettings,
    pub broker: BrokerSettings,
    pub persistence: PersistenceSettings,
    pub log: LogSettings,
}

/// Configuration settings for the HTTP/WebSocket server.
#[derive(Debug, Deserialize, Clone)]
pub struct ServerSettings {
    pub host: String,
    pub port: u16,
    /// Upper bound for a multipart submission body.
    pub max_body_bytes: usize,
    /// A single socket write taking longer than this drops the connection.
    pub write_timeout_ms: u64,
}

/// Configuration settings for the broker.
#[derive(Debug, Deserialize, Clone)]
pub struct BrokerSettings {
    /// Capacity of each subscriber's queue. A subscriber whose queue is full
    /// at publish time is disconnected.
    pub subscriber_buffer: usize,
}

/// Optional durable backing for the message store.
#[derive(Debug, Deserialize, Clone, Default)]
pub struct PersistenceSettings {
    pub path: Option<String>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct LogSettings {
    pub level: String,
}

/// Partial configuration settings loaded from files or environment.
///
/// Missing values are filled from `Settings::default()`.
#[derive(Debug, Deserialize)]
pub struct PartialSettings {
    pub server: Option<PartialServerSettings>,
    pub broker: Option<PartialBrokerSettings>,
    pub persistence: Option<PartialPersistenceSettings>,
    pub log: Option<PartialLogSettings>,
}

#[derive(Debug, Deserialize)]
pub struct PartialServerSettings {
    pub host: Option<String>,
    pub port: Option<u16>,
    pub max_body_bytes: Option<usize>,
    pub write_timeout_ms: Option<u64>,
}

#[derive(Debug, Deserialize)]
pub struct PartialBrokerSettings {
    pub subscriber_buffer: Option<usize>,
}

#[derive(Debug, Deserialize)]
pub struct PartialPersistenceSettings {
    pub path: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct PartialLogSettings {
    pub level: Option<String>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            server: ServerSettings {
                host: "0.0.0.0".to_string(),
                port: 14222,
                max_body_bytes: 500 << 10,
                write_timeout_ms: 5000,
            },
            broker: BrokerSettings {
                subscriber_buffer: 64,
            },
            persistence: PersistenceSettings::default(),
            log: LogSettings {
                level: "info".to_string(),
            },
        }
    }
}

impl Settings {
    /// Merge a partially specified configuration over the defaults.
    pub fn from_partial(partial: PartialSettings) -> Self {
        let default = Settings::default();
        let server = partial.server;
        let broker = partial.broker;

        Settings {
            server: ServerSettings {
                host: server
                    .as_ref()
                    .and_then(|s| s.host.clone())
                    .unwrap_or(default.server.host),
                port: server
                    .as_ref()
                    .and_then(|s| s.port)
                    .unwrap_or(default.server.port),
                max_body_bytes: server
                    .as_ref()
                    .and_then(|s| s.max_body_bytes)
                    .unwrap_or(default.server.max_body_bytes),
                write_timeout_ms: server
                    .as_ref()
                    .and_then(|s| s.write_timeout_ms)
                    .unwrap_or(default.server.write_timeout_ms),
            },
            broker: BrokerSettings {
                subscriber_buffer: broker
                    .as_ref()
                    .and_then(|b| b.subscriber_buffer)
                    .filter(|n| *n > 0)
                    .unwrap_or(default.broker.subscriber_buffer),
            },
            persistence: PersistenceSettings {
                path: partial
                    .persistence
                    .and_then(|p| p.path)
                    .filter(|p| !p.is_empty()),
            },
            log: LogSettings {
                level: partial
                    .log
                    .and_then(|l| l.level)
                    .unwrap_or(default.log.level),
            },
        }
    }

    /// `host:port` to bind.
    pub fn listen_addr(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }
}
