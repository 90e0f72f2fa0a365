//! MarkVault RPC Server: JSON-RPC over stdin/stdout.
//!
//! Protocol: one JSON object per line (newline-delimited JSON).
//! Request:  {"id":1, "method":"tag.attach", "params":{"bookmarkId":"...","tagIds":["..."]}}
//! Response: {"id":1, "result":{...}} or {"id":1, "error":{"code":"not_found","message":"..."}}
//!
//! Logs go to stderr so stdout carries only protocol lines.

use std::io::{self, BufRead, Write};
use std::process::ExitCode;
use std::sync::Mutex;

use markvault::app::App;
use markvault::rpc_handler::handle_method;
use markvault::services::settings_engine::{SettingsEngine, SettingsEngineTrait};

use serde_json::{json, Value};
use tracing::{error, info};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

fn init_tracing(filter: &str) {
    let env_filter = EnvFilter::try_new(filter).unwrap_or_else(|_| EnvFilter::new("info"));
    let fmt_layer = fmt::layer()
        .with_target(false)
        .with_ansi(false)
        .with_writer(io::stderr);
    tracing_subscriber::registry().with(env_filter).with(fmt_layer).init();
}

fn emit(out: &mut impl Write, value: &Value) -> io::Result<()> {
    writeln!(out, "{}", value)?;
    out.flush()
}

fn main() -> ExitCode {
    let app = match App::new(SettingsEngine::new(None)) {
        Ok(app) => app,
        Err(e) => {
            eprintln!("failed to start markvault: {}", e);
            return ExitCode::FAILURE;
        }
    };
    // MARKVAULT_LOG was folded into log_filter when the settings loaded.
    init_tracing(&app.settings_engine.get_settings().log_filter);
    info!(config = app.settings_engine.get_config_path(), "markvault rpc server ready");
    let app = Mutex::new(app);

    let stdout = io::stdout();
    let mut out = stdout.lock();
    let ready = json!({"event": "ready", "version": env!("CARGO_PKG_VERSION")});
    if emit(&mut out, &ready).is_err() {
        return ExitCode::FAILURE;
    }

    let stdin = io::stdin();
    for line in stdin.lock().lines() {
        let line = match line {
            Ok(l) => l,
            Err(_) => break,
        };
        if line.trim().is_empty() {
            continue;
        }

        let response = match serde_json::from_str::<Value>(&line) {
            Ok(req) => {
                let id = req.get("id").cloned().unwrap_or(Value::Null);
                let method = req.get("method").and_then(|v| v.as_str()).unwrap_or("");
                let params = req.get("params").cloned().unwrap_or(json!({}));

                match handle_method(&app, method, &params) {
                    Ok(val) => json!({"id": id, "result": val}),
                    Err(err) => {
                        error!(method, code = err.code.as_str(), message = %err.message, "rpc call failed");
                        json!({"id": id, "error": err})
                    }
                }
            }
            Err(e) => json!({
                "id": null,
                "error": {"code": "invalid_argument", "message": format!("parse error: {}", e)}
            }),
        };

        if emit(&mut out, &response).is_err() {
            break;
        }
    }

    ExitCode::SUCCESS
}
