//! Streaming HTTP Transport
//!
//! The single network seam of the provider layer: a long-lived streaming HTTP
//! connection that forwards raw response chunks to a subscriber, with
//! cooperative cancellation. Carries no knowledge of any vendor's wire format;
//! providers describe the request with a [`ConnectionConfig`] and interpret
//! the chunks themselves.

use std::sync::Mutex;

use futures_util::StreamExt;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

/// HTTP method for a connection
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HttpMethod {
    Get,
    Post,
}

/// Description of one streaming HTTP connection.
#[derive(Debug, Clone)]
pub struct ConnectionConfig {
    /// Target URL
    pub url: String,
    /// HTTP method
    pub method: HttpMethod,
    /// Request headers, including any auth headers the caller supplies
    pub headers: Vec<(String, String)>,
    /// JSON request body, if any
    pub body: Option<serde_json::Value>,
    /// Short label used only in log lines
    pub tag: String,
}

impl ConnectionConfig {
    /// A GET connection to the given URL
    pub fn get(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            method: HttpMethod::Get,
            headers: Vec::new(),
            body: None,
            tag: String::new(),
        }
    }

    /// A POST connection to the given URL
    pub fn post(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            method: HttpMethod::Post,
            headers: Vec::new(),
            body: None,
            tag: String::new(),
        }
    }

    /// Append a request header
    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    /// Set the JSON request body
    pub fn with_body(mut self, body: serde_json::Value) -> Self {
        self.body = Some(body);
        self
    }

    /// Set the diagnostic tag
    pub fn with_tag(mut self, tag: impl Into<String>) -> Self {
        self.tag = tag.into();
        self
    }
}

/// Transport-level failure
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TransportError {
    /// The connection could not be established
    #[error("network error: {0}")]
    Network(String),
    /// The server answered with a non-success status
    #[error("HTTP {status}: {body}")]
    Status { status: u16, body: String },
    /// The stream broke mid-response
    #[error("stream interrupted: {0}")]
    Interrupted(String),
    /// The connection was aborted via [`Transport::stop`]
    #[error("connection cancelled")]
    Cancelled,
}

/// Connection lifecycle events delivered to the subscriber.
///
/// For one connection the sequence is `Open`, zero or more `Data`, then
/// exactly one of `Closed` or `Error` (a connection that fails before it is
/// established emits only the `Error`). Nothing follows the terminal event.
#[derive(Debug, Clone, PartialEq)]
pub enum TransportEvent {
    /// The connection is established and the response status was success
    Open,
    /// One raw chunk of the response stream, untouched, in arrival order
    Data(String),
    /// Terminal failure (including cancellation)
    Error(TransportError),
    /// The stream ended naturally
    Closed,
}

/// Streaming connection primitive.
///
/// One instance serves one connection at a time; starting a new connection
/// aborts any active one. `stop` and `shutdown` are idempotent and safe to
/// call with no connection active.
pub trait Transport: Send + Sync {
    /// Open a connection and forward its lifecycle events to `events`.
    /// Returns immediately; delivery happens on a background task.
    fn start(&self, config: ConnectionConfig, events: mpsc::Sender<TransportEvent>);

    /// Abort the active connection, if any.
    fn stop(&self);

    /// Release transport resources. Safe to call multiple times.
    fn shutdown(&self);
}

/// Proxy protocol type
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProxyProtocol {
    Http,
    Https,
    Socks5,
}

impl ProxyProtocol {
    /// Return the URL scheme string for this protocol.
    pub fn scheme(&self) -> &'static str {
        match self {
            ProxyProtocol::Http => "http",
            ProxyProtocol::Https => "https",
            ProxyProtocol::Socks5 => "socks5",
        }
    }
}

/// Proxy configuration for outbound connections
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct ProxyConfig {
    pub protocol: ProxyProtocol,
    pub host: String,
    pub port: u16,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
    /// Password — held in-memory only, excluded from serialization.
    #[serde(skip_serializing, default)]
    pub password: Option<String>,
}

impl ProxyConfig {
    /// Build the proxy URL string (without auth).
    pub fn url(&self) -> String {
        format!("{}://{}:{}", self.protocol.scheme(), self.host, self.port)
    }
}

/// Build a `reqwest::Client` with the resolved proxy configuration.
///
/// - `Some(proxy)` -> configure proxy on the client
/// - `None` -> explicitly disable proxy (`no_proxy`), ignoring env vars
pub fn build_http_client(proxy: Option<&ProxyConfig>) -> reqwest::Client {
    let mut builder = reqwest::Client::builder();
    match proxy {
        Some(cfg) => {
            let url = cfg.url();
            let mut p = reqwest::Proxy::all(&url).expect("valid proxy URL");
            if let (Some(u), Some(pw)) = (&cfg.username, &cfg.password) {
                p = p.basic_auth(u, pw);
            }
            builder = builder.proxy(p);
        }
        None => {
            builder = builder.no_proxy();
        }
    }
    builder.build().expect("failed to build reqwest client")
}

/// [`Transport`] over a reqwest streaming HTTP connection.
pub struct HttpTransport {
    client: reqwest::Client,
    cancel: Mutex<Option<CancellationToken>>,
}

impl HttpTransport {
    /// Create a transport with a direct (proxy-less) client
    pub fn new() -> Self {
        Self::with_client(build_http_client(None))
    }

    /// Create a transport around an existing client
    pub fn with_client(client: reqwest::Client) -> Self {
        Self {
            client,
            cancel: Mutex::new(None),
        }
    }

    fn replace_token(&self) -> CancellationToken {
        let token = CancellationToken::new();
        let previous = self
            .cancel
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .replace(token.clone());
        if let Some(previous) = previous {
            previous.cancel();
        }
        token
    }
}

impl Default for HttpTransport {
    fn default() -> Self {
        Self::new()
    }
}

impl Transport for HttpTransport {
    fn start(&self, config: ConnectionConfig, events: mpsc::Sender<TransportEvent>) {
        let token = self.replace_token();
        let client = self.client.clone();
        tokio::spawn(async move {
            run_connection(client, config, token, events).await;
        });
    }

    fn stop(&self) {
        let token = self
            .cancel
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .take();
        if let Some(token) = token {
            token.cancel();
        }
    }

    fn shutdown(&self) {
        self.stop();
    }
}

async fn run_connection(
    client: reqwest::Client,
    config: ConnectionConfig,
    token: CancellationToken,
    events: mpsc::Sender<TransportEvent>,
) {
    let method = match config.method {
        HttpMethod::Get => reqwest::Method::GET,
        HttpMethod::Post => reqwest::Method::POST,
    };
    let mut request = client.request(method, &config.url);
    for (name, value) in &config.headers {
        request = request.header(name, value);
    }
    if let Some(body) = &config.body {
        request = request.json(body);
    }
    tracing::debug!("[{}] connecting to {}", config.tag, config.url);

    let response = tokio::select! {
        _ = token.cancelled() => {
            let _ = events.send(TransportEvent::Error(TransportError::Cancelled)).await;
            return;
        }
        result = request.send() => result,
    };

    let response = match response {
        Ok(response) => response,
        Err(e) => {
            tracing::warn!("[{}] connection failed: {}", config.tag, e);
            let _ = events
                .send(TransportEvent::Error(TransportError::Network(e.to_string())))
                .await;
            return;
        }
    };

    let status = response.status();
    if !status.is_success() {
        let body = response.text().await.unwrap_or_default();
        tracing::warn!("[{}] HTTP {} from {}", config.tag, status, config.url);
        let _ = events
            .send(TransportEvent::Error(TransportError::Status {
                status: status.as_u16(),
                body,
            }))
            .await;
        return;
    }

    let _ = events.send(TransportEvent::Open).await;

    let mut stream = response.bytes_stream();
    loop {
        let chunk = tokio::select! {
            _ = token.cancelled() => {
                tracing::debug!("[{}] connection cancelled", config.tag);
                let _ = events.send(TransportEvent::Error(TransportError::Cancelled)).await;
                return;
            }
            chunk = stream.next() => chunk,
        };
        match chunk {
            Some(Ok(bytes)) => {
                let data = String::from_utf8_lossy(&bytes).into_owned();
                let _ = events.send(TransportEvent::Data(data)).await;
            }
            Some(Err(e)) => {
                tracing::warn!("[{}] stream interrupted: {}", config.tag, e);
                let _ = events
                    .send(TransportEvent::Error(TransportError::Interrupted(
                        e.to_string(),
                    )))
                    .await;
                return;
            }
            None => {
                let _ = events.send(TransportEvent::Closed).await;
                return;
            }
        }
    }
}
