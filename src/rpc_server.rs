//! Acme RPC Server — JSON-RPC over stdin/stdout for a native UI shell.
//!
//! Protocol: one JSON object per line (newline-delimited JSON).
//! Request:  {"id":1, "method":"tab.add", "params":{"url":"...","title":"..."}}
//! Response: {"id":1, "result":{...}} or {"id":1, "error":"..."}
//! Events:   {"event":"ready",...} and {"event":"tab_count","count":n}
//!
//! `ACME_CONFIG` points at a settings file, `ACME_DATA_DIR` overrides the
//! data directory. Logs go to stderr.

use std::io::{self, BufRead, Write};
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Mutex;
use std::time::Instant;

use acme::app::App;
use acme::rpc_handler::handle_method;

use serde_json::{json, Value};
use tracing::{debug, error, info};

/// Simple rate limiter: max requests per second.
struct RateLimiter {
    window_start: Instant,
    request_count: u32,
    max_per_second: u32,
}

impl RateLimiter {
    fn new(max_per_second: u32) -> Self {
        Self { window_start: Instant::now(), request_count: 0, max_per_second }
    }

    /// Returns true if the request is allowed, false if rate-limited.
    fn check(&mut self) -> bool {
        let elapsed = self.window_start.elapsed();
        if elapsed.as_secs() >= 1 {
            self.window_start = Instant::now();
            self.request_count = 0;
        }
        self.request_count += 1;
        self.request_count <= self.max_per_second
    }
}

fn emit(message: &Value) {
    let mut out = io::stdout().lock();
    // A closed stdout means the shell is gone; the read loop ends on its own.
    let _ = writeln!(out, "{}", message).and_then(|_| out.flush());
}

fn main() -> ExitCode {
    let config_path = std::env::var("ACME_CONFIG").ok();
    let data_dir = std::env::var_os("ACME_DATA_DIR").map(PathBuf::from);

    let mut app = match App::new(config_path, data_dir) {
        Ok(app) => app,
        Err(e) => {
            eprintln!("Failed to initialize Acme: {}", e);
            return ExitCode::FAILURE;
        }
    };
    app.on_tab_count_changed(Box::new(|count: usize| {
        emit(&json!({"event": "tab_count", "count": count}));
    }));
    info!(data_dir = %app.data_dir().display(), "RPC server starting");
    let app = Mutex::new(app);

    // Signal ready
    emit(&json!({"event": "ready", "version": env!("CARGO_PKG_VERSION")}));

    let mut rate_limiter = RateLimiter::new(200);

    let stdin = io::stdin();
    for line in stdin.lock().lines() {
        let line = match line {
            Ok(l) => l,
            Err(e) => {
                error!(error = %e, "stdin closed");
                break;
            }
        };
        if line.trim().is_empty() { continue; }

        let req: Value = match serde_json::from_str(&line) {
            Ok(v) => v,
            Err(e) => {
                emit(&json!({"id": null, "error": format!("parse error: {}", e)}));
                continue;
            }
        };

        let id = req.get("id").cloned().unwrap_or(Value::Null);

        if !rate_limiter.check() {
            emit(&json!({"id": id, "error": "rate limit exceeded"}));
            continue;
        }

        let method = req.get("method").and_then(|v| v.as_str()).unwrap_or("");
        let params = req.get("params").cloned().unwrap_or(json!({}));
        debug!(method, "RPC request");

        let response = match handle_method(&app, method, &params) {
            Ok(val) => json!({"id": id, "result": val}),
            Err(err) => json!({"id": id, "error": err}),
        };
        emit(&response);

        // Favicons fetched in the background land in the cache between requests.
        if let Ok(mut a) = app.lock() {
            let applied = a.drain_favicons();
            if applied > 0 {
                debug!(applied, "Favicons cached");
            }
        }
    }

    info!("RPC server stopped");
    ExitCode::SUCCESS
}
