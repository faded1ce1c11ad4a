#![allow(dead_code)]
//! Shared fixtures: a one-route HTTP responder and encryption helpers.

use aes::Aes128;
use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use cbc::cipher::block_padding::Pkcs7;
use cbc::cipher::{BlockEncryptMut, KeyIvInit};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;

/// Key used by the encryption fixtures (AES-128).
pub const KEY: &str = "0123456789abcdef";

/// A request as seen by the test server.
#[derive(Debug, Clone)]
pub struct RecordedRequest {
    pub method: String,
    pub path: String,
    /// Header names are lower-cased.
    pub headers: HashMap<String, String>,
}

/// In-process HTTP server answering every request with the same response.
pub struct TestServer {
    pub base_url: String,
    requests: Arc<Mutex<Vec<RecordedRequest>>>,
}

impl TestServer {
    /// Serve `body` with `status` for every request.
    pub async fn respond(status: u16, body: impl Into<String>) -> Self {
        Self::start(Some((status, body.into()))).await
    }

    /// Accept connections but never answer.
    pub async fn silent() -> Self {
        Self::start(None).await
    }

    async fn start(response: Option<(u16, String)>) -> Self {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let requests = Arc::new(Mutex::new(Vec::new()));

        let recorded = Arc::clone(&requests);
        tokio::spawn(async move {
            loop {
                let Ok((mut stream, _)) = listener.accept().await else {
                    return;
                };
                let recorded = Arc::clone(&recorded);
                let response = response.clone();

                tokio::spawn(async move {
                    let mut buf = Vec::new();
                    let mut chunk = [0u8; 1024];
                    while !buf.windows(4).any(|w| w == b"\r\n\r\n") {
                        match stream.read(&mut chunk).await {
                            Ok(0) | Err(_) => return,
                            Ok(n) => buf.extend_from_slice(&chunk[..n]),
                        }
                    }
                    recorded.lock().unwrap().push(parse_request(&buf));

                    let Some((status, body)) = response else {
                        tokio::time::sleep(Duration::from_secs(60)).await;
                        return;
                    };

                    let reply = format!(
                        "HTTP/1.1 {} Test\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
                        status,
                        body.len(),
                        body
                    );
                    let _ = stream.write_all(reply.as_bytes()).await;
                    let _ = stream.shutdown().await;
                });
            }
        });

        Self {
            base_url: format!("http://{}/", addr),
            requests,
        }
    }

    /// Requests received so far.
    pub fn requests(&self) -> Vec<RecordedRequest> {
        self.requests.lock().unwrap().clone()
    }
}

fn parse_request(raw: &[u8]) -> RecordedRequest {
    let text = String::from_utf8_lossy(raw);
    let mut lines = text.split("\r\n");
    let mut request_line = lines.next().unwrap_or_default().split_whitespace();
    let method = request_line.next().unwrap_or_default().to_string();
    let path = request_line.next().unwrap_or_default().to_string();

    let headers = lines
        .take_while(|line| !line.is_empty())
        .filter_map(|line| line.split_once(':'))
        .map(|(name, value)| (name.trim().to_ascii_lowercase(), value.trim().to_string()))
        .collect();

    RecordedRequest {
        method,
        path,
        headers,
    }
}

/// Encrypt `plaintext` the way the default provider expects: AES-128-CBC,
/// PKCS#7, IV = key, wrapped as `![base64]`.
pub fn encrypted(plaintext: &str) -> String {
    let ciphertext = cbc::Encryptor::<Aes128>::new_from_slices(KEY.as_bytes(), KEY.as_bytes())
        .unwrap()
        .encrypt_padded_vec_mut::<Pkcs7>(plaintext.as_bytes());
    format!("![{}]", STANDARD.encode(ciphertext))
}

/// Build a response body from `(source name, [(key, value)])` pairs, highest priority first.
pub fn environment_body(sources: &[(&str, &[(&str, &str)])]) -> String {
    let property_sources: Vec<serde_json::Value> = sources
        .iter()
        .map(|(name, pairs)| {
            let source: serde_json::Map<String, serde_json::Value> = pairs
                .iter()
                .map(|(k, v)| (k.to_string(), serde_json::Value::String(v.to_string())))
                .collect();
            serde_json::json!({ "name": name, "source": source })
        })
        .collect();

    serde_json::json!({
        "name": "orders",
        "profiles": ["prod"],
        "label": "master",
        "version": "6f2d1c0",
        "state": null,
        "propertySources": property_sources,
    })
    .to_string()
}
