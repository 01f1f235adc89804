// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use anyhow::Context;
use std::env;
use std::sync::Arc;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;

use connector_remediation::config::{load_and_validate_config, RuntimeBuilder};
use connector_remediation::observability::init_tracing;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args: Vec<String> = env::args().collect();

    if args.len() < 3 {
        eprintln!("Usage: {} <config.yaml> <alert.json> [alert.json ...]", args[0]);
        eprintln!("Example: {} configs/remediation.yaml configs/alerts/*.json", args[0]);
        std::process::exit(1);
    }

    init_tracing("info");

    let config = load_and_validate_config(&args[1])
        .with_context(|| format!("loading configuration from {}", args[1]))?;
    let (consumer, gateways) = RuntimeBuilder::simulated(&config)?;
    let consumer = Arc::new(consumer);

    let cancel = CancellationToken::new();
    let shutdown = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::warn!("Interrupt received, cancelling in-flight remediation runs");
            shutdown.cancel();
        }
    });

    let permits = Arc::new(Semaphore::new(config.consumer.max_concurrent_alerts));
    let mut runs = JoinSet::new();

    for path in &args[2..] {
        let Some(payload) = read_alert(path).await else {
            continue;
        };
        let permit = permits.clone().acquire_owned().await?;
        let consumer = consumer.clone();
        let cancel = cancel.clone();
        let path = path.clone();

        runs.spawn(async move {
            let disposition = consumer.handle_payload(&payload, &cancel).await;
            drop(permit);
            (path, disposition)
        });
    }

    println!("Connector remediation");
    println!("═════════════════════");
    while let Some(joined) = runs.join_next().await {
        let (path, disposition) = joined?;
        match disposition {
            Ok(disposition) => println!("{}: acknowledged, {}", path, disposition),
            Err(e) => println!("{}: not acknowledged, left for redelivery: {}", path, e),
        }
    }

    let reports = gateways.delivered().await;
    println!("\nReports delivered: {}", reports.len());
    for report in reports {
        println!("\n{}", "─".repeat(60));
        print!("{}", report);
    }

    Ok(())
}

/// Reads one alert file. An unreadable file is logged and skipped so the rest of the
/// batch still runs.
async fn read_alert(path: &str) -> Option<Vec<u8>> {
    match tokio::fs::read(path).await {
        Ok(payload) => Some(payload),
        Err(error) => {
            tracing::error!(path = %path, error = %error, "Skipping unreadable alert file");
            None
        }
    }
}
