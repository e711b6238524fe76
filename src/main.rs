//! P2P trade client - trade screen runner
//!
//! Opens one trade screen for the signed-in user and keeps it live until
//! Ctrl+C. Lines read from stdin drive the screen:
//! `{...}` is a realtime frame from the socket, `/paid`, `/release`,
//! `/cancel`, `/dispute <reason>`, `/trust`, `/refresh` are user actions,
//! anything else is sent as a chat message. Realtime commands are written
//! to stdout as JSON frames for the socket side.
use anyhow::Context;
use chrono::Utc;
use dotenv::dotenv;
use log::{debug, error, info, warn};
use p2p_trade_client::{
    ConsoleTradeView, Countdown, CountdownTicker, RealtimeHub, ServiceContainer, SessionStore,
    Settings, TradePresenter,
};
use std::env;
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::select;
use tokio::sync::mpsc;

/// Application entry point
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables from .env file
    dotenv().ok();

    // Initialize logging with default level of "info"
    env_logger::init_from_env(env_logger::Env::new().default_filter_or("info"));
    info!("Starting P2P trade client v{}", p2p_trade_client::VERSION);

    let trade_id = env::args()
        .nth(1)
        .context("Usage: p2p-trade-client <trade-id>")?;

    let settings = Settings::from_env()?;
    let session = SessionStore::new(&settings.auth_store_path)
        .load()
        .await
        .context("Failed to load session, please sign in first")?;

    let (services, mut commands) = ServiceContainer::new(settings, session)?;
    let hub = services.hub();

    // Forward realtime room commands to the socket side
    tokio::spawn(async move {
        while let Some(command) = commands.recv().await {
            match serde_json::to_string(&command) {
                Ok(frame) => println!("{}", frame),
                Err(e) => warn!("Failed to encode realtime command: {}", e),
            }
        }
        debug!("Realtime command queue closed");
    });

    let (input_tx, mut input_rx) = mpsc::channel::<String>(32);
    tokio::spawn(async move {
        let mut lines = BufReader::new(tokio::io::stdin()).lines();
        while let Ok(Some(line)) = lines.next_line().await {
            if input_tx.send(line).await.is_err() {
                break;
            }
        }
    });

    let mut presenter = services.trade_presenter(Arc::new(ConsoleTradeView::new()));
    presenter
        .open(&trade_id)
        .await
        .with_context(|| format!("Failed to open trade {}", trade_id))?;

    // Re-render once the dispute grace window runs out
    let (mut dispute_ticker, mut dispute_rx) = CountdownTicker::start(Countdown::new(
        presenter.dispute_anchor(),
        services.settings().dispute_grace(),
    ));
    let mut dispute_unlocked = dispute_rx.borrow().is_expired;

    let shutdown = tokio::signal::ctrl_c();
    tokio::pin!(shutdown);

    info!("Trade screen is live! Press Ctrl+C to stop.");
    loop {
        select! {
            delivery = presenter.next_delivery() => match delivery {
                Some(delivery) => {
                    if let Err(e) = presenter.handle_delivery(delivery).await {
                        error!("Failed to apply realtime delivery: {}", e);
                    }
                    dispute_ticker.set_anchor(presenter.dispute_anchor());
                }
                None => {
                    warn!("Realtime channel closed");
                    break;
                }
            },
            Some(line) = input_rx.recv() => {
                if let Err(e) = handle_input(&mut presenter, &hub, line.trim()).await {
                    error!("Failed to handle input: {}", e);
                }
                dispute_ticker.set_anchor(presenter.dispute_anchor());
            }
            Ok(()) = dispute_rx.changed() => {
                let remaining = *dispute_rx.borrow_and_update();
                let now = Utc::now();
                presenter.tick(now);
                if remaining.is_expired && !dispute_unlocked {
                    if let Err(e) = presenter.render(now).await {
                        error!("Failed to render: {}", e);
                    }
                }
                dispute_unlocked = remaining.is_expired;
            }
            _ = &mut shutdown => {
                info!("Shutting down");
                break;
            }
        }
    }

    dispute_ticker.stop().await;
    presenter.close();
    Ok(())
}

async fn handle_input<P: TradePresenter>(
    presenter: &mut P,
    hub: &RealtimeHub,
    line: &str,
) -> anyhow::Result<()> {
    let now = Utc::now();

    if line.is_empty() {
        return presenter.render(now).await;
    }
    if line.starts_with('{') {
        let delivered = hub.deliver_json(line)?;
        debug!("Realtime frame delivered to {} listeners", delivered);
        return Ok(());
    }

    let (command, rest) = line.split_once(' ').unwrap_or((line, ""));
    match command {
        "/paid" => {
            presenter.mark_as_paid(now).await?;
        }
        "/release" => {
            presenter.release_crypto(now).await?;
        }
        "/cancel" => {
            presenter.cancel_trade(now).await?;
        }
        "/dispute" => {
            presenter.open_dispute(rest, "", None, now).await?;
        }
        "/trust" => {
            presenter.trust_counterparty().await?;
        }
        "/refresh" => {
            if presenter.refresh().await? {
                presenter.render(now).await?;
            }
        }
        _ => {
            presenter.send_message(line).await?;
        }
    }
    Ok(())
}
