//! gemmarks RPC Server: JSON-RPC over stdin/stdout for a UI front end.
//!
//! Protocol: one JSON object per line (newline-delimited JSON).
//! Request:  {"id":1, "method":"bookmark.add", "params":{"url":"...","title":"..."}}
//! Response: {"id":1, "result":{...}} or {"id":1, "error":"..."}
//! Event:    {"event":"bookmarks.changed"} / {"event":"bookmarks.refresh.finished"}
//!
//! Logs go to stderr so stdout carries protocol lines only.

use std::io::{self, BufRead, Write};
use std::time::Instant;

use gemmarks::app::App;
use gemmarks::managers::remote_sync::FetchCompletion;
use gemmarks::rpc_handler::handle_method;
use gemmarks::services::settings_engine::{SettingsEngine, SettingsEngineTrait};
use gemmarks::types::event::{BookmarkEvent, Notifier};

use serde_json::{json, Value};
use tokio::sync::mpsc;
use tracing::{debug, error, info, warn};
use tracing_subscriber::EnvFilter;

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
        if self.window_start.elapsed().as_secs() >= 1 {
            self.window_start = Instant::now();
            self.request_count = 0;
        }
        self.request_count += 1;
        self.request_count <= self.max_per_second
    }
}

enum Input {
    Line(Option<String>),
    Completion(Option<FetchCompletion>),
    Event(Option<BookmarkEvent>),
}

fn emit(line: &Value) {
    let mut stdout = io::stdout().lock();
    if writeln!(stdout, "{}", line).and_then(|_| stdout.flush()).is_err() {
        debug!("stdout closed");
    }
}

fn init_logging() {
    // The log level setting is only the fallback when RUST_LOG is unset.
    let level = SettingsEngine::new(None)
        .load()
        .map(|s| s.logging.level)
        .unwrap_or_else(|_| "info".to_string());
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(io::stderr)
        .init();
}

fn handle_line(app: &mut App, rate_limiter: &mut RateLimiter, line: &str) -> Value {
    let req: Value = match serde_json::from_str(line) {
        Ok(v) => v,
        Err(e) => return json!({"id": null, "error": format!("parse error: {}", e)}),
    };
    let id = req.get("id").cloned().unwrap_or(Value::Null);

    if !rate_limiter.check() {
        return json!({"id": id, "error": "rate limit exceeded"});
    }

    let method = req.get("method").and_then(|v| v.as_str()).unwrap_or("");
    let params = req.get("params").cloned().unwrap_or(json!({}));
    match handle_method(app, method, &params) {
        Ok(val) => json!({"id": id, "result": val}),
        Err(err) => {
            debug!(method, error = %err, "request failed");
            json!({"id": id, "error": err})
        }
    }
}

#[tokio::main]
async fn main() {
    init_logging();

    let (notifier, mut events) = Notifier::channel();
    let mut app = match App::from_environment(notifier, tokio::runtime::Handle::current()) {
        Ok(app) => app,
        Err(err) => {
            error!(error = %err, "failed to initialize");
            std::process::exit(1);
        }
    };
    let source = app.startup();
    info!(profile = %app.profile_dir.display(), ?source, "bookmarks loaded");

    emit(&json!({"event": "ready", "version": env!("CARGO_PKG_VERSION")}));

    // Blocking stdin reads stay off the runtime.
    let (lines_tx, mut lines) = mpsc::unbounded_channel::<String>();
    std::thread::spawn(move || {
        for line in io::stdin().lock().lines() {
            let Ok(line) = line else { break };
            if lines_tx.send(line).is_err() {
                break;
            }
        }
    });

    let mut rate_limiter = RateLimiter::new(200);
    loop {
        let input = tokio::select! {
            line = lines.recv() => Input::Line(line),
            completion = app.remote_sync.next_completion() => Input::Completion(completion),
            event = events.recv() => Input::Event(event),
        };

        match input {
            Input::Line(Some(line)) => {
                if line.trim().is_empty() {
                    continue;
                }
                let response = handle_line(&mut app, &mut rate_limiter, &line);
                emit(&response);
            }
            Input::Line(None) => break,
            Input::Completion(Some(completion)) => app.remote_sync.request_finished(completion),
            Input::Completion(None) => warn!("fetch completion channel closed"),
            Input::Event(Some(event)) => emit(&json!({"event": event.command()})),
            Input::Event(None) => {}
        }
    }

    app.shutdown();
    // Deliver anything posted during shutdown.
    while let Ok(event) = events.try_recv() {
        emit(&json!({"event": event.command()}));
    }
}
