use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use tokio::time::{Duration, sleep};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use shuttle_core::app::{AppBuilder, HydrationScope, SyncContext};
use shuttle_core::client::ConnectionStatus;
use shuttle_core::config::SyncConfig;
use shuttle_core::handlers;
use shuttle_core::impls::{ReqwestHttpApi, WsTransport};

const INITIAL_BACKOFF: Duration = Duration::from_secs(1);
const MAX_BACKOFF: Duration = Duration::from_secs(10);

#[derive(Parser, Debug)]
#[command(name = "shuttle", about = "Mirror a backend's live state over its push channel")]
struct Args {
    /// TOML config file; missing means defaults.
    #[arg(long, default_value = "shuttle.toml")]
    config: PathBuf,
    #[arg(long)]
    ws_url: Option<String>,
    #[arg(long)]
    http_url: Option<String>,
    #[arg(long)]
    workspace: Option<String>,
    #[arg(long)]
    workflow: Option<String>,
    /// Used when RUST_LOG is unset.
    #[arg(long, default_value = "info")]
    log_level: String,
    /// Seconds between status lines.
    #[arg(long, default_value_t = 5)]
    status_interval: u64,
    /// Print status as JSON.
    #[arg(long)]
    json: bool,
}

fn init_logging(level: &str) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    tracing_subscriber::fmt().with_env_filter(filter).init();
}

/// File, then `SHUTTLE_*` environment, then command-line flags.
fn load_config(args: &Args) -> anyhow::Result<SyncConfig> {
    let mut config =
        SyncConfig::load(&args.config)?.with_env_overrides(|key| std::env::var(key).ok());
    if let Some(url) = &args.ws_url {
        config.ws_url = url.clone();
    }
    if let Some(url) = &args.http_url {
        config.http_base_url = url.clone();
    }
    Ok(config)
}

fn next_backoff(current: Duration) -> Duration {
    let next = current + current;
    if next > MAX_BACKOFF { MAX_BACKOFF } else { next }
}

/// Reconnect loop. Returns once the connection is torn down on purpose.
async fn supervise(ctx: SyncContext, scope: HydrationScope, mut hydrated: bool) {
    let mut status = ctx.connection().subscribe_status();
    let mut backoff = INITIAL_BACKOFF;
    loop {
        match ctx.connect().await {
            Ok(()) => {
                backoff = INITIAL_BACKOFF;
                if !hydrated {
                    hydrated = ctx.hydrate(&scope).await;
                }
                while *status.borrow_and_update() == ConnectionStatus::Connected {
                    if status.changed().await.is_err() {
                        return;
                    }
                }
                if *status.borrow() == ConnectionStatus::Disconnected {
                    return;
                }
                warn!("push channel lost; reconnecting");
            }
            Err(err) => warn!(
                error = %err,
                retry_in_ms = backoff.as_millis() as u64,
                "connect failed"
            ),
        }
        sleep(backoff).await;
        backoff = next_backoff(backoff);
    }
}

fn print_status(ctx: &SyncContext, json: bool) {
    let status = ctx.status();
    if json {
        match serde_json::to_string(&status) {
            Ok(line) => println!("{line}"),
            Err(err) => warn!(error = %err, "status encode failed"),
        }
    } else {
        println!("{status}");
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    init_logging(&args.log_level);

    let config = load_config(&args)?;
    info!(ws_url = %config.ws_url, http = %config.http_base_url, "starting");
    let transport = WsTransport::parse(&config.ws_url).context("invalid ws_url")?;
    let http = ReqwestHttpApi::new(&config.http_base_url, config.request_timeout())
        .context("invalid http_base_url")?;

    let ctx = AppBuilder::new(config)
        .with_default_handlers()?
        .expect_actions(handlers::ALL_ACTIONS)
        .build(Arc::new(transport), Arc::new(http))?;

    let scope = HydrationScope {
        workspace_id: args.workspace.as_deref().map(Into::into),
        workflow_id: args.workflow.as_deref().map(Into::into),
    };
    let hydrated = ctx.hydrate(&scope).await;
    if !hydrated {
        warn!("starting empty; will refetch after connecting");
    }

    let supervisor = tokio::spawn(supervise(ctx.clone(), scope, hydrated));
    let mut ticker = tokio::time::interval(Duration::from_secs(args.status_interval.max(1)));
    loop {
        tokio::select! {
            _ = ticker.tick() => print_status(&ctx, args.json),
            _ = tokio::signal::ctrl_c() => {
                info!("shutting down");
                break;
            }
        }
    }

    ctx.disconnect().await;
    supervisor.abort();
    print_status(&ctx, args.json);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn backoff_doubles_up_to_the_cap() {
        assert_eq!(next_backoff(Duration::from_secs(1)), Duration::from_secs(2));
        assert_eq!(next_backoff(Duration::from_secs(4)), Duration::from_secs(8));
        assert_eq!(next_backoff(Duration::from_secs(8)), MAX_BACKOFF);
        assert_eq!(next_backoff(MAX_BACKOFF), MAX_BACKOFF);
    }

    #[test]
    fn flags_override_config_values() {
        let args = Args::parse_from([
            "shuttle",
            "--config",
            "/nonexistent/shuttle.toml",
            "--ws-url",
            "ws://example.test/ws",
        ]);
        let config = load_config(&args).unwrap();
        assert_eq!(config.ws_url, "ws://example.test/ws");
        assert_eq!(config.request_timeout_ms, 15_000);
    }
}
