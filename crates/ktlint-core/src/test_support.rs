//! Shared helpers for unit tests: fake formatter scripts, an event recorder and a
//! minimal HTTP fixture server standing in for the release host.

use crate::error::Error;
use crate::events::{FormatEvents, ProcessStart};
use crate::invoke::ProcessOutput;
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::{TcpListener, TcpStream};

/// Write an executable `/bin/sh` script with `body` into a fresh temp dir
#[cfg(unix)]
pub fn fake_formatter(body: &str) -> (tempfile::TempDir, PathBuf) {
    use std::os::unix::fs::PermissionsExt;

    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("ktlint");
    std::fs::write(&path, format!("#!/bin/sh\n{}", body)).unwrap();
    std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o755)).unwrap();
    (dir, path)
}

/// Captures every event for later assertions
#[derive(Default)]
pub struct RecordingEvents {
    starts: Mutex<Vec<Vec<String>>>,
    filtered: Mutex<Vec<String>>,
    exits: Mutex<Vec<ProcessOutput>>,
    outcomes: Mutex<Vec<Result<String, String>>>,
}

impl RecordingEvents {
    pub fn starts(&self) -> Vec<Vec<String>> {
        self.starts.lock().unwrap().clone()
    }

    pub fn filtered(&self) -> Vec<String> {
        self.filtered.lock().unwrap().clone()
    }

    pub fn exits(&self) -> Vec<ProcessOutput> {
        self.exits.lock().unwrap().clone()
    }

    pub fn outcomes(&self) -> Vec<Result<String, String>> {
        self.outcomes.lock().unwrap().clone()
    }
}

impl FormatEvents for RecordingEvents {
    fn on_process_start(&self, start: &ProcessStart<'_>) {
        self.starts.lock().unwrap().push(start.args.to_vec());
    }

    fn on_line_filtered(&self, line: &str) {
        self.filtered.lock().unwrap().push(line.to_string());
    }

    fn on_process_exit(&self, output: &ProcessOutput) {
        self.exits.lock().unwrap().push(output.clone());
    }

    fn on_outcome(&self, outcome: Result<&str, &Error>) {
        self.outcomes
            .lock()
            .unwrap()
            .push(outcome.map(str::to_string).map_err(|e| e.to_string()));
    }
}

/// Canned response for one path
#[derive(Debug, Clone)]
pub enum Route {
    /// 200 with a Content-Length header
    Body(Vec<u8>),
    /// 200 delimited by connection close, without Content-Length
    BodyWithoutLength(Vec<u8>),
    /// 3xx pointing at `Location`
    Redirect(u16, String),
    /// 3xx without `Location`
    RedirectWithoutLocation(u16),
    /// Any status with an empty body
    Status(u16),
    /// 200 announcing `declared` bytes, then closing after `body`
    TruncatedBody { declared: usize, body: Vec<u8> },
}

/// HTTP/1.1 server answering GETs from a route table, counting every request
pub struct FixtureServer {
    base: String,
    routes: Arc<Mutex<HashMap<String, Route>>>,
    hits: Arc<AtomicUsize>,
}

impl FixtureServer {
    pub async fn start() -> Self {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let base = format!("http://{}", listener.local_addr().unwrap());
        let routes: Arc<Mutex<HashMap<String, Route>>> = Arc::default();
        let hits = Arc::new(AtomicUsize::new(0));

        let accept_routes = routes.clone();
        let accept_hits = hits.clone();
        tokio::spawn(async move {
            while let Ok((stream, _)) = listener.accept().await {
                let routes = accept_routes.clone();
                let hits = accept_hits.clone();
                tokio::spawn(async move {
                    hits.fetch_add(1, Ordering::SeqCst);
                    serve(stream, &routes).await;
                });
            }
        });

        Self { base, routes, hits }
    }

    /// Register (or replace) the response for `path`
    pub fn route(&self, path: &str, route: Route) -> &Self {
        self.routes.lock().unwrap().insert(path.to_string(), route);
        self
    }

    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.base, path)
    }

    pub fn hits(&self) -> usize {
        self.hits.load(Ordering::SeqCst)
    }
}

async fn serve(mut stream: TcpStream, routes: &Mutex<HashMap<String, Route>>) {
    let (read_half, mut write_half) = stream.split();
    let mut reader = BufReader::new(read_half);

    let mut request_line = String::new();
    if reader.read_line(&mut request_line).await.is_err() {
        return;
    }
    loop {
        let mut header = String::new();
        match reader.read_line(&mut header).await {
            Ok(0) => break,
            Ok(_) if header == "\r\n" || header == "\n" => break,
            Ok(_) => continue,
            Err(_) => return,
        }
    }

    let path = request_line
        .split_whitespace()
        .nth(1)
        .unwrap_or("/")
        .to_string();

    let route = routes.lock().unwrap().get(&path).cloned();
    let (head, body) = match route {
        Some(Route::Body(body)) => (
            format!("HTTP/1.1 200 OK\r\nContent-Length: {}\r\n", body.len()),
            body,
        ),
        Some(Route::TruncatedBody { declared, body }) => (
            format!("HTTP/1.1 200 OK\r\nContent-Length: {}\r\n", declared),
            body,
        ),
        Some(Route::BodyWithoutLength(body)) => ("HTTP/1.1 200 OK\r\n".to_string(), body),
        Some(Route::Redirect(status, location)) => (
            format!(
                "HTTP/1.1 {} Redirect\r\nLocation: {}\r\nContent-Length: 0\r\n",
                status, location
            ),
            Vec::new(),
        ),
        Some(Route::RedirectWithoutLocation(status)) => (
            format!("HTTP/1.1 {} Redirect\r\nContent-Length: 0\r\n", status),
            Vec::new(),
        ),
        Some(Route::Status(status)) => (
            format!("HTTP/1.1 {} Error\r\nContent-Length: 0\r\n", status),
            Vec::new(),
        ),
        None => (
            "HTTP/1.1 404 Not Found\r\nContent-Length: 0\r\n".to_string(),
            Vec::new(),
        ),
    };

    let _ = write_half
        .write_all(format!("{}Connection: close\r\n\r\n", head).as_bytes())
        .await;
    let _ = write_half.write_all(&body).await;
    let _ = write_half.shutdown().await;
}
