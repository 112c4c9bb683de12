use std::io::{self, BufRead, Write};

use anyhow::Context;
use schoolbookd::config::{Settings, LOG_ENV};
use schoolbookd::ipc;
use tracing_subscriber::EnvFilter;

fn init_tracing(settings: &Settings) {
    // stdout carries the protocol, so logs go to stderr.
    let filter = EnvFilter::try_from_env(LOG_ENV)
        .or_else(|_| EnvFilter::try_new(&settings.log_filter))
        .unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .with_ansi(false)
        .init();
}

fn main() -> anyhow::Result<()> {
    let settings = Settings::from_env().context("failed to load schoolbookd settings")?;
    init_tracing(&settings);
    tracing::info!(
        version = env!("CARGO_PKG_VERSION"),
        currency = %settings.currency,
        "schoolbookd ready"
    );

    let mut state = ipc::AppState::new(settings);

    let stdin = io::stdin();
    let mut stdout = io::stdout();

    for line in stdin.lock().lines() {
        let line = match line {
            Ok(v) => v,
            Err(e) => {
                tracing::warn!(error = %e, "stdin closed");
                break;
            }
        };
        if line.trim().is_empty() {
            continue;
        }

        let resp = match serde_json::from_str::<ipc::Request>(&line) {
            Ok(req) => ipc::handle_request(&mut state, req),
            Err(e) => {
                // Can't reply with an id.
                tracing::warn!(error = %e, "unparseable request line");
                ipc::bad_json(e.to_string())
            }
        };

        writeln!(stdout, "{resp}").context("failed to write response")?;
        stdout.flush().context("failed to flush response")?;
    }

    Ok(())
}
