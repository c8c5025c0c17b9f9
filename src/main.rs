use backend_selector::{Config, LoadBalancer, ServerPool, StrategyKind};
use std::time::Duration;
use tracing::{error, info, Level};
use tracing_subscriber::fmt;

const DEFAULT_CONFIG_PATH: &str = "config/pool.yaml";
const ROUNDS: usize = 6;

fn setup_logging() {
    fmt::Subscriber::builder()
        .with_max_level(Level::INFO)
        .with_file(true)
        .with_line_number(true)
        .with_thread_ids(true)
        .with_target(false)
        .with_thread_names(true)
        .with_ansi(true)
        .init();
}

/// Replays the configured clients, or a fixed set when none are configured.
fn client_keys(config: &Config) -> Vec<String> {
    if config.client_keys.is_empty() {
        ["10.0.0.1", "10.0.0.2", "10.0.0.3"]
            .into_iter()
            .map(String::from)
            .collect()
    } else {
        config.client_keys.clone()
    }
}

/// Seeds per-server metrics so the load-sensitive strategies have something
/// to compare. Servers past the third keep their zeroed metrics.
fn seed_metrics(pool: &ServerPool) {
    let connections = [5, 2, 3];
    let response_ms = [50, 30, 40];
    for (i, server) in pool.iter().enumerate().take(connections.len()) {
        server.set_connections(connections[i]);
        server.set_response_time(Duration::from_millis(response_ms[i]));
    }
}

fn run(kind: StrategyKind, pool: &ServerPool, keys: &[String]) -> anyhow::Result<()> {
    let lb = LoadBalancer::new(kind, pool.clone())?;

    if kind == StrategyKind::IpHash {
        for key in keys {
            let server = lb.select(Some(key.as_str()))?;
            info!(strategy = %kind, client = %key, address = %server.address, "selected");
        }
        return Ok(());
    }

    let rounds = match kind {
        StrategyKind::RoundRobin | StrategyKind::WeightedRoundRobin => ROUNDS,
        _ => 1,
    };
    for _ in 0..rounds {
        let server = lb.select(None)?;
        info!(strategy = %kind, address = %server.address, "selected");
    }
    Ok(())
}

fn main() -> anyhow::Result<()> {
    setup_logging();

    let path = std::env::args()
        .nth(1)
        .unwrap_or_else(|| DEFAULT_CONFIG_PATH.to_string());
    info!("Loading server pool from {}", path);

    let config = Config::from_file(&path)?;
    let pool = config.pool();
    let keys = client_keys(&config);
    info!(servers = pool.len(), "server pool loaded");

    seed_metrics(&pool);

    let kinds = match config.strategy {
        Some(kind) => vec![kind],
        None => StrategyKind::ALL.to_vec(),
    };
    for kind in kinds {
        if let Err(e) = run(kind, &pool, &keys) {
            error!(strategy = %kind, "selection failed: {}", e);
        }
    }

    Ok(())
}
