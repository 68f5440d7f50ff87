//! cadvisor-relabel HTTP server
//!
//! Starts an Axum web server that relabels cAdvisor network metrics for Prometheus.

use cadvisor_relabel::{
    cli::{Cli, Command, generate_config_template},
    config::Config,
    exposition::TimestampFormat,
    handlers::{self, AppState},
    mapping::TopologyResponse,
    relabel::relabel_text,
    telemetry,
};
use clap::Parser;
use std::net::SocketAddr;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    match cli.command {
        Some(Command::Config { output }) => {
            let template = generate_config_template();
            match output {
                Some(path) => {
                    std::fs::write(&path, template)?;
                    eprintln!("Configuration template written to {}", path);
                }
                None => print!("{}", template),
            }
            return Ok(());
        }
        Some(Command::Relabel {
            input,
            mapping,
            timestamp_format,
        }) => {
            match relabel_offline(&input, &mapping, timestamp_format) {
                Ok(body) => println!("{}", body),
                Err(e) => {
                    eprintln!("Error: {}", e);
                    std::process::exit(1);
                }
            }
            return Ok(());
        }
        None => {}
    }

    let config = Arc::new(Config::load(&cli.config)?);

    telemetry::init(&config.observability.log_level);

    tracing::info!(
        source = %config.source.url,
        topology = %config.topology.base_url(),
        default_network = %config.topology.default_network,
        "Starting cadvisor-relabel on {}:{}",
        config.server.host,
        config.server.port
    );

    let state = AppState::new(config.clone())?;

    if config.topology.load_on_startup {
        // A failed initial load is not fatal: scrapes pass through with
        // relabel_success 0 until a refresh succeeds.
        if let Err(e) = state.refresher().refresh(None).await {
            tracing::warn!(
                network_name = %config.topology.default_network,
                error = %e,
                "Initial mapping load failed, serving unrelabeled metrics until a refresh succeeds"
            );
        }
    }

    if config.topology.refresh_interval_seconds > 0 {
        state
            .refresher()
            .clone()
            .start_periodic_refresh(Duration::from_secs(config.topology.refresh_interval_seconds));
    }

    let app = handlers::router(state);

    let addr = SocketAddr::from((
        config
            .server
            .host
            .parse::<std::net::IpAddr>()
            .unwrap_or_else(|_| std::net::IpAddr::from([0, 0, 0, 0])),
        config.server.port,
    ));

    tracing::info!("Listening on {}", addr);
    tracing::info!("Relabeled metrics available at http://{}/metrics", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

fn relabel_offline(
    input: &Path,
    mapping: &Path,
    timestamps: TimestampFormat,
) -> Result<String, Box<dyn std::error::Error>> {
    let raw = std::fs::read_to_string(input)
        .map_err(|e| format!("failed to read {}: {}", input.display(), e))?;
    let topology = std::fs::read_to_string(mapping)
        .map_err(|e| format!("failed to read {}: {}", mapping.display(), e))?;
    let table = TopologyResponse::from_json(&topology)?;

    Ok(relabel_text(&raw, Some(&table), timestamps)?.into_response_body())
}
