//! Common test utilities and fixtures
//!
//! A minimal Ollama-style chat server on a background thread, plus a temp
//! workspace with a config file pointing at it.

#![allow(dead_code)]

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use parking_lot::Mutex;
use serde_json::{json, Value};
use tempfile::TempDir;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};

/// How the mock server answers every `/api/chat` request
#[derive(Debug, Clone)]
pub enum Reply {
    /// 200 with `message.content` set to the text
    Content(String),
    /// Non-2xx with a plain-text body
    Status(u16, String),
}

/// Chat server bound to an ephemeral localhost port
pub struct MockChatServer {
    url: String,
    requests: Arc<Mutex<Vec<Value>>>,
}

impl MockChatServer {
    pub fn start(reply: Reply) -> Self {
        let std_listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        std_listener.set_nonblocking(true).unwrap();
        let url = format!("http://{}", std_listener.local_addr().unwrap());
        let requests = Arc::new(Mutex::new(Vec::new()));

        let recorded = requests.clone();
        std::thread::spawn(move || {
            let runtime = tokio::runtime::Builder::new_current_thread()
                .enable_all()
                .build()
                .unwrap();
            runtime.block_on(async move {
                let listener = TcpListener::from_std(std_listener).unwrap();
                loop {
                    let Ok((stream, _)) = listener.accept().await else {
                        continue;
                    };
                    let reply = reply.clone();
                    let recorded = recorded.clone();
                    tokio::spawn(async move {
                        let _ = handle_connection(stream, reply, recorded).await;
                    });
                }
            });
        });

        Self { url, requests }
    }

    /// A server that answers with 50 `A`s
    pub fn passing() -> Self {
        Self::start(Reply::Content("A".repeat(50)))
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    pub fn request_count(&self) -> usize {
        self.requests.lock().len()
    }

    /// Decoded request bodies in arrival order
    pub fn requests(&self) -> Vec<Value> {
        self.requests.lock().clone()
    }
}

async fn handle_connection(
    mut stream: TcpStream,
    reply: Reply,
    recorded: Arc<Mutex<Vec<Value>>>,
) -> anyhow::Result<()> {
    let mut buf = Vec::new();
    let mut chunk = [0u8; 4096];

    let header_end = loop {
        let n = stream.read(&mut chunk).await?;
        if n == 0 {
            return Err(anyhow::anyhow!("Connection closed before headers"));
        }
        buf.extend_from_slice(&chunk[..n]);
        if let Some(pos) = buf.windows(4).position(|w| w == b"\r\n\r\n") {
            break pos + 4;
        }
    };

    let headers = String::from_utf8_lossy(&buf[..header_end]).to_lowercase();
    let content_length = headers
        .lines()
        .find_map(|line| line.strip_prefix("content-length:"))
        .and_then(|v| v.trim().parse::<usize>().ok())
        .unwrap_or(0);

    while buf.len() < header_end + content_length {
        let n = stream.read(&mut chunk).await?;
        if n == 0 {
            break;
        }
        buf.extend_from_slice(&chunk[..n]);
    }

    let body: Value = serde_json::from_slice(&buf[header_end..]).unwrap_or(Value::Null);
    recorded.lock().push(body);

    let (status, content_type, payload) = match reply {
        Reply::Content(text) => (
            200,
            "application/json",
            json!({
                "model": "mock",
                "message": { "role": "assistant", "content": text },
                "done": true,
                "prompt_eval_count": 12,
                "eval_count": 30
            })
            .to_string(),
        ),
        Reply::Status(code, text) => (code, "text/plain", text),
    };

    let response = format!(
        "HTTP/1.1 {} Mock\r\nContent-Type: {}\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
        status,
        content_type,
        payload.len(),
        payload
    );
    stream.write_all(response.as_bytes()).await?;
    stream.shutdown().await?;
    Ok(())
}

/// Temp workspace with a config file and a report directory
pub struct TestEnvironment {
    pub temp_dir: TempDir,
    pub config_path: PathBuf,
    pub report_dir: PathBuf,
}

impl TestEnvironment {
    /// Config pointing the built-in tiers at `endpoint`
    pub fn new(endpoint: &str) -> Self {
        Self::with_extra(endpoint, "")
    }

    /// Same as `new`, with extra TOML appended to the config
    pub fn with_extra(endpoint: &str, extra: &str) -> Self {
        let temp_dir = TempDir::new().unwrap();
        let report_dir = temp_dir.path().join("reports");
        let config_path = temp_dir.path().join("nightly-sim.toml");

        let config = format!(
            r#"
[backend]
default_endpoint = "{}"
timeout_secs = 10
connect_timeout_secs = 2

[report]
dir = "{}"

[logging]
level = "warn"
{}
"#,
            endpoint,
            toml_path(&report_dir),
            extra
        );
        fs::write(&config_path, config).unwrap();

        Self {
            temp_dir,
            config_path,
            report_dir,
        }
    }

    pub fn config_arg(&self) -> &str {
        self.config_path.to_str().unwrap()
    }

    /// Report files currently on disk
    pub fn report_files(&self) -> Vec<PathBuf> {
        match fs::read_dir(&self.report_dir) {
            Ok(entries) => {
                let mut files: Vec<PathBuf> = entries.filter_map(|e| e.ok().map(|e| e.path())).collect();
                files.sort();
                files
            }
            Err(_) => Vec::new(),
        }
    }

    pub fn read_report(&self, path: &Path) -> Value {
        serde_json::from_str(&fs::read_to_string(path).unwrap()).unwrap()
    }
}

/// Forward slashes so the path survives inside a TOML basic string
pub fn toml_path(path: &Path) -> String {
    path.to_string_lossy().replace('\\', "/")
}
