//! Screeps web API client
//!
//! Covers the three endpoints the environment needs:
//! - `POST /api/auth/signin` for a session token
//! - `POST /api/user/console` to run code on the next tick
//! - `GET /api/user/memory` to read a memory path
//!
//! Every authenticated response may carry a rotated `X-Token` header, which
//! replaces the stored token.

use async_trait::async_trait;
use base64::Engine;
use base64::engine::general_purpose::STANDARD as BASE64;
use flate2::read::GzDecoder;
use reqwest::{Client, RequestBuilder, Response, StatusCode};
use screeps_rl_core::{Result, ScreepsRlError};
use screeps_rl_env::RemoteBoundary;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::io::Read;
use tokio::sync::RwLock;
use tracing::{debug, info, warn};

use crate::config::ScreepsConfig;

const TOKEN_HEADER: &str = "X-Token";
const USERNAME_HEADER: &str = "X-Username";
const GZ_PREFIX: &str = "gz:";

#[derive(Debug, Serialize)]
struct SignIn<'a> {
    email: &'a str,
    password: &'a str,
}

#[derive(Debug, Deserialize)]
struct SignInResponse {
    token: Option<String>,
    error: Option<String>,
}

#[derive(Debug, Serialize)]
struct ConsoleRequest<'a> {
    expression: &'a str,
    shard: &'a str,
}

/// HTTP client for one Screeps server and account
pub struct ScreepsApi {
    http: Client,
    base_url: String,
    config: ScreepsConfig,
    token: RwLock<Option<String>>,
}

impl ScreepsApi {
    /// Create a client; no request is made until first use
    pub fn new(config: ScreepsConfig) -> Result<Self> {
        let http = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| ScreepsRlError::Remote(format!("HTTP client build failed: {}", e)))?;
        Ok(Self {
            http,
            base_url: config.base_url(),
            token: RwLock::new(config.token.clone()),
            config,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Whether a session or API token is held
    pub async fn is_authenticated(&self) -> bool {
        self.token.read().await.is_some()
    }

    /// Exchange username/password for a session token
    pub async fn sign_in(&self) -> Result<()> {
        info!("Signing in to {} as {}", self.base_url, self.config.username);

        let response = self
            .http
            .post(self.url("/api/auth/signin"))
            .json(&SignIn {
                email: &self.config.username,
                password: &self.config.password,
            })
            .send()
            .await
            .map_err(|e| ScreepsRlError::Remote(format!("Sign-in request failed: {}", e)))?;

        let status = response.status();
        let text = response
            .text()
            .await
            .map_err(|e| ScreepsRlError::Remote(format!("Sign-in read failed: {}", e)))?;
        if !status.is_success() {
            return Err(ScreepsRlError::Remote(format!(
                "Sign-in rejected ({}): {}",
                status, text
            )));
        }

        let body: SignInResponse = serde_json::from_str(&text)?;
        if let Some(error) = body.error {
            return Err(ScreepsRlError::Remote(format!("Sign-in rejected: {}", error)));
        }
        let token = body
            .token
            .ok_or_else(|| ScreepsRlError::Protocol("Sign-in response without token".into()))?;

        *self.token.write().await = Some(token);
        info!("Signed in to {}", self.base_url);
        Ok(())
    }

    /// Run `expression` in the console of `shard`
    pub async fn console(&self, expression: &str, shard: &str) -> Result<Value> {
        let preview: String = expression.chars().take(100).collect();
        debug!("console [{}]: {}", shard, preview);
        let url = self.url("/api/user/console");
        let body = ConsoleRequest { expression, shard };
        self.send(|http| http.post(&url).json(&body)).await
    }

    /// Read memory at `path` on `shard`.
    ///
    /// Returns the `{ok, data}` envelope with `gz:` payloads inflated in place.
    pub async fn memory(&self, path: &str, shard: &str) -> Result<Value> {
        let url = self.url("/api/user/memory");
        let mut envelope = self
            .send(|http| http.get(&url).query(&[("path", path), ("shard", shard)]))
            .await?;

        if let Some(data) = envelope.get_mut("data") {
            if let Some(compressed) = data.as_str().filter(|s| s.starts_with(GZ_PREFIX)) {
                let inflated = inflate_memory(compressed)?;
                *data = inflated;
            }
        }
        debug!("memory [{}] {} -> {}", shard, path, envelope);
        Ok(envelope)
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// Send an authenticated request, signing in first if needed and once
    /// more if the token was rejected
    async fn send<F>(&self, build: F) -> Result<Value>
    where
        F: Fn(&Client) -> RequestBuilder,
    {
        if !self.is_authenticated().await {
            self.sign_in().await?;
        }

        let response = self.send_once(&build).await?;
        if response.status() == StatusCode::UNAUTHORIZED {
            warn!("Screeps token rejected, signing in again");
            self.sign_in().await?;
            let retry = self.send_once(&build).await?;
            return self.parse_response(retry).await;
        }
        self.parse_response(response).await
    }

    async fn send_once<F>(&self, build: &F) -> Result<Response>
    where
        F: Fn(&Client) -> RequestBuilder,
    {
        let token = self.token.read().await.clone().unwrap_or_default();
        build(&self.http)
            .header(TOKEN_HEADER, token)
            .header(USERNAME_HEADER, &self.config.username)
            .send()
            .await
            .map_err(|e| ScreepsRlError::Remote(format!("Request failed: {}", e)))
    }

    async fn parse_response(&self, response: Response) -> Result<Value> {
        if let Some(rotated) = response
            .headers()
            .get(TOKEN_HEADER)
            .and_then(|v| v.to_str().ok())
        {
            *self.token.write().await = Some(rotated.to_string());
        }

        let status = response.status();
        let text = response
            .text()
            .await
            .map_err(|e| ScreepsRlError::Remote(format!("Response read failed: {}", e)))?;
        if !status.is_success() {
            return Err(ScreepsRlError::Remote(format!("HTTP {}: {}", status, text)));
        }

        let body: Value = serde_json::from_str(&text)?;
        if let Some(error) = body.get("error").and_then(Value::as_str) {
            return Err(ScreepsRlError::Remote(error.to_string()));
        }
        Ok(body)
    }
}

#[async_trait]
impl RemoteBoundary for ScreepsApi {
    async fn dispatch_command(&self, code: &str, shard: &str) -> Result<()> {
        self.console(code, shard).await.map(|_| ())
    }

    async fn read_memory(&self, key: &str, shard: &str) -> Result<Value> {
        self.memory(key, shard).await
    }
}

/// Decode a `gz:<base64 gzip JSON>` memory payload
pub fn inflate_memory(data: &str) -> Result<Value> {
    let encoded = data
        .strip_prefix(GZ_PREFIX)
        .ok_or_else(|| ScreepsRlError::Protocol("Memory payload missing gz: prefix".into()))?;
    let bytes = BASE64
        .decode(encoded.trim())
        .map_err(|e| ScreepsRlError::Protocol(format!("Invalid base64 memory: {}", e)))?;

    let mut json = String::new();
    GzDecoder::new(bytes.as_slice())
        .read_to_string(&mut json)
        .map_err(|e| ScreepsRlError::Protocol(format!("Invalid gzip memory: {}", e)))?;

    Ok(serde_json::from_str(&json)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use flate2::Compression;
    use flate2::write::GzEncoder;
    use serde_json::json;
    use std::collections::HashMap;
    use std::io::Write;
    use std::net::SocketAddr;
    use std::sync::{Arc, Mutex};
    use std::time::Duration;
    use tokio::io::{AsyncBufReadExt, AsyncReadExt, AsyncWriteExt, BufReader};
    use tokio::net::{TcpListener, TcpStream};

    fn gz(json: &str) -> String {
        let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
        encoder.write_all(json.as_bytes()).unwrap();
        format!("gz:{}", BASE64.encode(encoder.finish().unwrap()))
    }

    #[test]
    fn test_inflate_memory() {
        let payload = gz(r#""[1,2,0,1,3]""#);
        assert_eq!(inflate_memory(&payload).unwrap(), json!("[1,2,0,1,3]"));

        let payload = gz("7");
        assert_eq!(inflate_memory(&payload).unwrap(), json!(7));
    }

    #[test]
    fn test_inflate_rejects_garbage() {
        assert!(matches!(
            inflate_memory("[1,2,3]"),
            Err(ScreepsRlError::Protocol(_))
        ));
        assert!(matches!(
            inflate_memory("gz:!!!not-base64"),
            Err(ScreepsRlError::Protocol(_))
        ));
        let not_gzip = format!("gz:{}", BASE64.encode(b"plain"));
        assert!(matches!(
            inflate_memory(&not_gzip),
            Err(ScreepsRlError::Protocol(_))
        ));
    }

    #[test]
    fn test_inflated_payload_decodes() {
        let envelope = json!({"ok": 1, "data": inflate_memory(&gz(r#""[0,4,1,1,2]""#)).unwrap()});
        let obs = screeps_rl_core::decode_observation(&envelope);
        assert_eq!(obs.0, [0.0, 4.0, 1.0, 1.0, 2.0]);
    }

    /// One request as seen by [`FakeServer`]
    #[derive(Debug, Clone)]
    struct Recorded {
        method: String,
        target: String,
        headers: HashMap<String, String>,
        body: String,
    }

    impl Recorded {
        fn header(&self, name: &str) -> Option<&str> {
            self.headers.get(name).map(String::as_str)
        }
    }

    /// Status, extra headers and JSON body of a scripted reply
    type Reply = (u16, Vec<(&'static str, String)>, String);

    /// Minimal HTTP/1.1 server answering one request per connection
    struct FakeServer {
        addr: SocketAddr,
        requests: Arc<Mutex<Vec<Recorded>>>,
    }

    impl FakeServer {
        async fn start<F>(respond: F) -> Self
        where
            F: Fn(&Recorded) -> Reply + Send + Sync + 'static,
        {
            let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
            let addr = listener.local_addr().unwrap();
            let requests = Arc::new(Mutex::new(Vec::new()));
            let respond = Arc::new(respond);

            let log = requests.clone();
            tokio::spawn(async move {
                loop {
                    let Ok((stream, _)) = listener.accept().await else {
                        return;
                    };
                    let log = log.clone();
                    let respond = respond.clone();
                    tokio::spawn(async move {
                        let mut stream = BufReader::new(stream);
                        let Some(request) = read_request(&mut stream).await else {
                            return;
                        };
                        let (status, headers, body) = respond(&request);
                        log.lock().unwrap().push(request);

                        let mut head = format!(
                            "HTTP/1.1 {} Fake\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n",
                            status,
                            body.len()
                        );
                        for (name, value) in headers {
                            head.push_str(&format!("{}: {}\r\n", name, value));
                        }
                        head.push_str("\r\n");
                        let stream = stream.get_mut();
                        let _ = stream.write_all(head.as_bytes()).await;
                        let _ = stream.write_all(body.as_bytes()).await;
                        let _ = stream.shutdown().await;
                    });
                }
            });

            Self { addr, requests }
        }

        fn config(&self, token: Option<&str>) -> ScreepsConfig {
            ScreepsConfig {
                host: self.addr.to_string(),
                secure: false,
                username: "bot".into(),
                password: "hunter2".into(),
                token: token.map(str::to_string),
                timeout: Duration::from_secs(5),
            }
        }

        fn requests(&self) -> Vec<Recorded> {
            self.requests.lock().unwrap().clone()
        }
    }

    async fn read_request(stream: &mut BufReader<TcpStream>) -> Option<Recorded> {
        let mut line = String::new();
        stream.read_line(&mut line).await.ok()?;
        let mut parts = line.split_whitespace();
        let method = parts.next()?.to_string();
        let target = parts.next()?.to_string();

        let mut headers = HashMap::new();
        loop {
            let mut line = String::new();
            stream.read_line(&mut line).await.ok()?;
            let line = line.trim_end();
            if line.is_empty() {
                break;
            }
            let (name, value) = line.split_once(':')?;
            headers.insert(name.trim().to_ascii_lowercase(), value.trim().to_string());
        }

        let len: usize = headers
            .get("content-length")
            .and_then(|v| v.parse().ok())
            .unwrap_or(0);
        let mut body = vec![0; len];
        stream.read_exact(&mut body).await.ok()?;

        Some(Recorded {
            method,
            target,
            headers,
            body: String::from_utf8(body).ok()?,
        })
    }

    fn ok(body: Value) -> Reply {
        (200, vec![], body.to_string())
    }

    #[tokio::test]
    async fn test_sign_in_then_authenticated_headers() {
        let server = FakeServer::start(|req| match req.target.as_str() {
            "/api/auth/signin" => ok(json!({"ok": 1, "token": "session-1"})),
            _ => ok(json!({"ok": 1, "result": []})),
        })
        .await;
        let api = ScreepsApi::new(server.config(None)).unwrap();

        api.console("Game.time", "shard0").await.unwrap();

        let requests = server.requests();
        assert_eq!(requests.len(), 2);
        assert_eq!(requests[0].method, "POST");
        assert_eq!(requests[0].target, "/api/auth/signin");
        let credentials: Value = serde_json::from_str(&requests[0].body).unwrap();
        assert_eq!(credentials, json!({"email": "bot", "password": "hunter2"}));

        assert_eq!(requests[1].method, "POST");
        assert_eq!(requests[1].target, "/api/user/console");
        assert_eq!(requests[1].header("x-token"), Some("session-1"));
        assert_eq!(requests[1].header("x-username"), Some("bot"));
        let console: Value = serde_json::from_str(&requests[1].body).unwrap();
        assert_eq!(console, json!({"expression": "Game.time", "shard": "shard0"}));
    }

    #[tokio::test]
    async fn test_rotated_token_is_used_next() {
        let server = FakeServer::start(|req| {
            let next = match req.header("x-token") {
                Some("t0") => "t1",
                _ => "t2",
            };
            (
                200,
                vec![(TOKEN_HEADER, next.to_string())],
                json!({"ok": 1}).to_string(),
            )
        })
        .await;
        let api = ScreepsApi::new(server.config(Some("t0"))).unwrap();

        api.console("1", "shard0").await.unwrap();
        api.console("2", "shard0").await.unwrap();

        let requests = server.requests();
        assert_eq!(requests.len(), 2);
        assert!(requests.iter().all(|r| r.target == "/api/user/console"));
        assert_eq!(requests[0].header("x-token"), Some("t0"));
        assert_eq!(requests[1].header("x-token"), Some("t1"));
        assert_eq!(api.token.read().await.as_deref(), Some("t2"));
    }

    #[tokio::test]
    async fn test_unauthorized_signs_in_once_and_retries() {
        let server = FakeServer::start(|req| match req.target.as_str() {
            "/api/auth/signin" => ok(json!({"ok": 1, "token": "fresh"})),
            _ if req.header("x-token") == Some("fresh") => ok(json!({"ok": 1})),
            _ => (401, vec![], json!({"error": "unauthorized"}).to_string()),
        })
        .await;
        let api = ScreepsApi::new(server.config(Some("stale"))).unwrap();

        let body = api.console("1", "shard0").await.unwrap();
        assert_eq!(body, json!({"ok": 1}));

        let targets: Vec<(String, Option<String>)> = server
            .requests()
            .into_iter()
            .map(|r| (r.target.clone(), r.header("x-token").map(str::to_string)))
            .collect();
        assert_eq!(
            targets,
            vec![
                ("/api/user/console".to_string(), Some("stale".to_string())),
                ("/api/auth/signin".to_string(), None),
                ("/api/user/console".to_string(), Some("fresh".to_string())),
            ]
        );
    }

    #[tokio::test]
    async fn test_second_unauthorized_is_an_error() {
        let server = FakeServer::start(|req| match req.target.as_str() {
            "/api/auth/signin" => ok(json!({"ok": 1, "token": "fresh"})),
            _ => (401, vec![], json!({"error": "unauthorized"}).to_string()),
        })
        .await;
        let api = ScreepsApi::new(server.config(Some("stale"))).unwrap();

        assert!(matches!(
            api.console("1", "shard0").await,
            Err(ScreepsRlError::Remote(_))
        ));
        let requests = server.requests();
        assert_eq!(requests.len(), 3);
        assert_eq!(
            requests
                .iter()
                .filter(|r| r.target == "/api/auth/signin")
                .count(),
            1
        );
    }

    #[tokio::test]
    async fn test_memory_inflates_envelope() {
        let server = FakeServer::start(|_| {
            ok(json!({"ok": 1, "data": gz(r#""[1,2,0,1,3]""#)}))
        })
        .await;
        let api = ScreepsApi::new(server.config(Some("t0"))).unwrap();

        let envelope = api.memory("dqn_state", "shard0").await.unwrap();
        assert_eq!(envelope, json!({"ok": 1, "data": "[1,2,0,1,3]"}));
        let obs = screeps_rl_core::decode_observation(&envelope);
        assert_eq!(obs.0, [1.0, 2.0, 0.0, 1.0, 3.0]);

        let requests = server.requests();
        assert_eq!(requests.len(), 1);
        assert_eq!(requests[0].method, "GET");
        assert_eq!(
            requests[0].target,
            "/api/user/memory?path=dqn_state&shard=shard0"
        );
    }

    #[tokio::test]
    async fn test_memory_error_field_is_an_error() {
        let server = FakeServer::start(|_| ok(json!({"error": "invalid path"}))).await;
        let api = ScreepsApi::new(server.config(Some("t0"))).unwrap();

        match api.memory("missing", "shard0").await {
            Err(ScreepsRlError::Remote(msg)) => assert_eq!(msg, "invalid path"),
            other => panic!("expected remote error, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_preset_token() {
        let api = ScreepsApi::new(ScreepsConfig {
            token: Some("abc".into()),
            ..Default::default()
        })
        .unwrap();
        assert!(api.is_authenticated().await);
        assert_eq!(api.base_url(), "http://127.0.0.1:21025");

        let anonymous = ScreepsApi::new(ScreepsConfig::default()).unwrap();
        assert!(!anonymous.is_authenticated().await);
    }
}
