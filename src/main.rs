use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use clap::Parser;
use serde::Serialize;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt, BufReader};
use tokio::signal;
use tracing::info;
use tracing_subscriber::EnvFilter;

use token_limiter::config::{AppConfig, LogFormat, LoggingConfig};
use token_limiter::{RateLimitExceeded, RateLimiter, RateLimiterBackend, Usage};

/// Replay tokens from stdin through a rate limiter, one per line.
#[derive(Debug, Parser)]
#[command(name = "token-limiter", version, about)]
struct Cli {
    /// Path to a YAML configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Requests allowed per token per window
    #[arg(short, long, default_value_t = 10)]
    limit: u64,

    /// Emit one JSON object per decision
    #[arg(long)]
    json: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let config = AppConfig::load(cli.config.as_deref())?;

    init_tracing(&config.logging);

    info!("Starting token limiter");
    info!("Version: {}", env!("CARGO_PKG_VERSION"));

    let limiter = Arc::new(RateLimiter::new(config.limiter));
    info!(
        interval_ms = config.limiter.interval_ms.get(),
        unique_token_per_interval = config.limiter.unique_token_per_interval.get(),
        limit = cli.limit,
        "Rate limiter initialized"
    );

    tokio::select! {
        result = replay(
            limiter.clone(),
            cli.limit,
            cli.json,
            BufReader::new(tokio::io::stdin()),
            tokio::io::stdout(),
        ) => result?,
        _ = shutdown_signal() => {}
    }

    info!(tracked = limiter.len(), "Token limiter stopped");
    Ok(())
}

/// Install the global subscriber. Logs go to stderr; stdout carries decisions.
fn init_tracing(logging: &LoggingConfig) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&logging.level));

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false);

    match logging.format {
        LogFormat::Pretty => builder.init(),
        LogFormat::Json => builder.json().init(),
    }
}

/// Check every non-empty input line as a token until EOF, writing one
/// decision per line.
async fn replay<R, W>(
    limiter: Arc<dyn RateLimiterBackend>,
    limit: u64,
    json: bool,
    input: R,
    mut output: W,
) -> anyhow::Result<()>
where
    R: AsyncBufRead + Unpin,
    W: AsyncWrite + Unpin,
{
    let mut lines = input.lines();

    while let Some(line) = lines.next_line().await? {
        let token = line.trim();
        if token.is_empty() {
            continue;
        }

        let decision = Decision::new(token, limiter.check_rate_limit(limit, token).await);
        let rendered = if json {
            serde_json::to_string(&decision)?
        } else {
            decision.to_string()
        };

        output.write_all(rendered.as_bytes()).await?;
        output.write_all(b"\n").await?;
    }

    output.flush().await?;
    info!("Reached end of input");
    Ok(())
}

/// One line of output.
#[derive(Debug, Serialize)]
struct Decision<'a> {
    token: &'a str,
    allowed: bool,
    limit: u64,
    count: u64,
    remaining: u64,
    reset_after_ms: u64,
}

impl<'a> Decision<'a> {
    fn new(token: &'a str, outcome: Result<Usage, RateLimitExceeded>) -> Self {
        match outcome {
            Ok(usage) => Self {
                token,
                allowed: true,
                limit: usage.limit,
                count: usage.count,
                remaining: usage.remaining,
                reset_after_ms: millis(usage.reset_after),
            },
            Err(exceeded) => Self {
                token,
                allowed: false,
                limit: exceeded.limit,
                count: exceeded.count,
                remaining: 0,
                reset_after_ms: millis(exceeded.retry_after),
            },
        }
    }
}

fn millis(duration: Duration) -> u64 {
    u64::try_from(duration.as_millis()).unwrap_or(u64::MAX)
}

impl std::fmt::Display for Decision<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let verdict = if self.allowed { "allow" } else { "deny" };
        write!(
            f,
            "{} {} {}/{} reset_in={}ms",
            verdict, self.token, self.count, self.limit, self.reset_after_ms
        )
    }
}

/// Wait for a shutdown signal (Ctrl+C or SIGTERM).
async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("Failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C, shutting down");
        }
        _ = terminate => {
            info!("Received SIGTERM, shutting down");
        }
    }
}
