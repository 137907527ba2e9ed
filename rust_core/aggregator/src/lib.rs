use connectors_common::types::DisplayState;
use log::{debug, info};
use std::sync::{Arc, PoisonError, RwLock};
use tokio::sync::{broadcast, mpsc};

/// Fans display updates out to every subscriber and remembers the most
/// recent one for late joiners.
#[derive(Clone)]
pub struct Aggregator {
    tx: broadcast::Sender<DisplayState>,
    latest: Arc<RwLock<DisplayState>>,
}

impl Aggregator {
    pub fn new(buffer: usize) -> Self {
        let (tx, _) = broadcast::channel(buffer);
        Aggregator {
            tx,
            latest: Arc::new(RwLock::new(DisplayState::Loading)),
        }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<DisplayState> {
        self.tx.subscribe()
    }

    pub fn latest(&self) -> DisplayState {
        self.latest.read().unwrap_or_else(PoisonError::into_inner).clone()
    }

    pub fn publish(&self, state: DisplayState) {
        *self.latest.write().unwrap_or_else(PoisonError::into_inner) = state.clone();
        // no subscribers is fine
        let receivers = self.tx.send(state).unwrap_or(0);
        debug!("published display state to {} subscribers", receivers);
    }

    pub fn create_input_channel(&self, buffer: usize) -> mpsc::Sender<DisplayState> {
        let (tx, mut rx) = mpsc::channel(buffer);
        let agg = self.clone();
        tokio::spawn(async move {
            while let Some(state) = rx.recv().await {
                agg.publish(state);
            }
            info!("aggregator input channel closed");
        });
        tx
    }
}
