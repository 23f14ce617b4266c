//! Credit Scoring Dashboard - Main Entry Point
//!
//! Usage: `dashboard [SK_ID_CURR ...]`. Without arguments, identifiers are
//! read from stdin one per line.

mod constants;
mod logic;

use std::io::Write;

use tokio::io::{AsyncBufReadExt, BufReader};

use logic::client::{ClientConfig, ScoringClient, ScoringTransport};
use logic::formatter::PresentationFormatter;
use logic::render;
use logic::session::Session;

async fn show<T: ScoringTransport>(session: &mut Session<T>, input: &str) -> bool {
    match session.submit_input(input).await {
        Ok(report) => {
            println!("{}", report.render());
            true
        }
        Err(e) => {
            log::warn!("Submission '{}' failed: {}", input.trim(), e);
            eprintln!("{}", render::render_error(&e));
            false
        }
    }
}

async fn check_api(client: &ScoringClient) {
    match client.health_check().await {
        Ok(health) => {
            let at = chrono::DateTime::from_timestamp(health.timestamp, 0)
                .map(|t| t.to_rfc3339())
                .unwrap_or_else(|| health.timestamp.to_string());
            log::info!(
                "Scoring API {} v{} ({}), {} records, server time {}",
                health.status, health.version, client.server_url(), health.records, at
            );
            match health.model {
                Some(model) => log::info!(
                    "Model: {} with {} features, {} trees",
                    model.kind, model.feature_count, model.tree_count
                ),
                None => log::warn!("Scoring API has no model loaded"),
            }
        }
        Err(e) => log::warn!("Scoring API not reachable at {}: {}", client.server_url(), e),
    }
}

#[tokio::main]
async fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .init();

    log::info!("Starting {} v{}...", constants::APP_NAME, constants::APP_VERSION);

    let formatter = match PresentationFormatter::from_env() {
        Ok(f) => f,
        Err(e) => {
            log::error!("Invalid configuration: {}", e);
            std::process::exit(2);
        }
    };
    log::info!("Decision threshold: {:.4}%", formatter.threshold());

    let client = match ScoringClient::new(ClientConfig::default()) {
        Ok(c) => c,
        Err(e) => {
            log::error!("Failed to create HTTP client: {}", e);
            std::process::exit(2);
        }
    };
    let mut session = Session::new(client, formatter);
    check_api(session.transport()).await;

    let args: Vec<String> = std::env::args().skip(1).collect();
    if !args.is_empty() {
        let mut failed = false;
        for arg in &args {
            failed |= !show(&mut session, arg).await;
        }
        if failed {
            std::process::exit(1);
        }
        return;
    }

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        print!("SK_ID_CURR (q to quit): ");
        let _ = std::io::stdout().flush();

        let line = match lines.next_line().await {
            Ok(Some(line)) => line,
            Ok(None) => break,
            Err(e) => {
                log::error!("Failed to read input: {}", e);
                break;
            }
        };

        match line.trim() {
            "" => continue,
            "q" | "quit" | "exit" => break,
            input => {
                show(&mut session, input).await;
                log::debug!(
                    "Session {:?}, current client {:?}",
                    session.state().phase(),
                    session.state().last_identifier()
                );
            }
        }
    }

    log::info!("Session closed");
}
