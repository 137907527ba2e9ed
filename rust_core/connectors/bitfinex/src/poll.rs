use crate::rest::FundingBookSource;
use connectors_common::types::{BookView, DisplayState};
use log::{debug, info, warn};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, watch};
use tokio::time::{sleep_until, Instant};

pub const DEFAULT_INTERVAL: Duration = Duration::from_secs(5);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PollCommand {
    RefreshNow,
    Shutdown,
}

/// Caller side of a running poll loop.
#[derive(Clone)]
pub struct PollControl {
    auto_refresh: Arc<watch::Sender<bool>>,
    commands: mpsc::Sender<PollCommand>,
}

/// Loop side, consumed by [`run_funding_poll`].
pub struct PollHandle {
    auto_refresh: watch::Receiver<bool>,
    commands: mpsc::Receiver<PollCommand>,
}

pub fn poll_control(auto_refresh: bool) -> (PollControl, PollHandle) {
    let (auto_tx, auto_rx) = watch::channel(auto_refresh);
    let (cmd_tx, cmd_rx) = mpsc::channel(8);
    (
        PollControl { auto_refresh: Arc::new(auto_tx), commands: cmd_tx },
        PollHandle { auto_refresh: auto_rx, commands: cmd_rx },
    )
}

impl PollControl {
    pub fn auto_refresh(&self) -> bool {
        *self.auto_refresh.borrow()
    }

    pub fn set_auto_refresh(&self, enabled: bool) {
        // unchanged values do not wake the loop
        let changed = self.auto_refresh.send_if_modified(|v| std::mem::replace(v, enabled) != enabled);
        if changed {
            info!("auto-refresh {}", if enabled { "enabled" } else { "disabled" });
        }
    }

    /// Ask for one fetch regardless of the auto-refresh flag. Returns false
    /// if the loop is gone or already has refreshes queued.
    pub fn refresh_now(&self) -> bool {
        self.commands.try_send(PollCommand::RefreshNow).is_ok()
    }

    pub async fn shutdown(&self) {
        let _ = self.commands.send(PollCommand::Shutdown).await;
    }
}

/// Turn one fetch into what the page should show. Never fails.
pub async fn fetch_state<S: FundingBookSource + ?Sized>(source: &S) -> DisplayState {
    match source.fetch_funding_book().await {
        Ok(snapshot) if snapshot.is_empty() => {
            debug!("{} book is empty", snapshot.symbol);
            DisplayState::Empty { symbol: snapshot.symbol, updated_at: snapshot.ts }
        }
        Ok(snapshot) => {
            debug!("{} book: {} bids, {} asks", snapshot.symbol, snapshot.bids.len(), snapshot.asks.len());
            DisplayState::Ready(BookView::from_snapshot(&snapshot))
        }
        Err(e) => {
            warn!("funding book fetch failed: {}", e);
            DisplayState::error(format!("Error fetching order book: {}", e))
        }
    }
}

/// Fetch once immediately, then every `interval` while auto-refresh is on.
///
/// With auto-refresh off no request is made until it is switched back on
/// (fetches right away) or a manual refresh arrives. Requests never overlap.
/// Returns on shutdown, when every [`PollControl`] is dropped, or when `tx`
/// is closed.
pub async fn run_funding_poll<S>(source: Arc<S>, tx: mpsc::Sender<DisplayState>, mut handle: PollHandle, interval: Duration)
where
    S: FundingBookSource + ?Sized,
{
    let mut fetch_now = true;
    let mut auto = *handle.auto_refresh.borrow_and_update();
    let mut next_fetch = Instant::now();
    loop {
        if fetch_now {
            let state = fetch_state(&*source).await;
            if tx.send(state).await.is_err() {
                info!("funding poll output closed");
                return;
            }
            next_fetch = Instant::now() + interval;
        }
        fetch_now = false;

        let timer = async move {
            if auto {
                sleep_until(next_fetch).await
            } else {
                std::future::pending::<()>().await
            }
        };
        tokio::select! {
            _ = timer => fetch_now = true,
            changed = handle.auto_refresh.changed() => {
                if changed.is_err() {
                    return;
                }
                let now = *handle.auto_refresh.borrow_and_update();
                fetch_now = now && !auto;
                auto = now;
            }
            cmd = handle.commands.recv() => match cmd {
                Some(PollCommand::RefreshNow) => fetch_now = true,
                Some(PollCommand::Shutdown) | None => {
                    info!("funding poll stopped");
                    return;
                }
            },
        }
    }
}
