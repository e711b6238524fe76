use chrono::{DateTime, Utc};
use log::{debug, info};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::select;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tokio::time::interval;

use super::countdown::{Countdown, Remaining};

/// Publishes a countdown's remaining time once per second until stopped
pub struct CountdownTicker {
    countdown: Arc<Mutex<Countdown>>,
    tx: Arc<watch::Sender<Remaining>>,
    stop_tx: Option<mpsc::Sender<()>>,
    handle: Option<JoinHandle<()>>,
}

impl CountdownTicker {
    /// Spawns the ticking task. Must be called from within a tokio runtime.
    pub fn start(countdown: Countdown) -> (Self, watch::Receiver<Remaining>) {
        let initial = countdown.peek(Utc::now());
        let (tx, rx) = watch::channel(initial);
        let tx = Arc::new(tx);
        let (stop_tx, mut stop_rx) = mpsc::channel::<()>(1);
        let countdown = Arc::new(Mutex::new(countdown));

        let task_countdown = countdown.clone();
        let task_tx = tx.clone();

        let handle = tokio::spawn(async move {
            let mut interval = interval(Duration::from_secs(1));

            loop {
                select! {
                    _ = interval.tick() => {
                        if task_tx.is_closed() {
                            debug!("Countdown has no listeners left");
                            break;
                        }
                        let remaining = Self::tick(&task_countdown, Utc::now());
                        task_tx.send_replace(remaining);
                    }
                    _ = stop_rx.recv() => {
                        break;
                    }
                }
            }
        });

        let ticker = Self {
            countdown,
            tx,
            stop_tx: Some(stop_tx),
            handle: Some(handle),
        };
        (ticker, rx)
    }

    fn tick(countdown: &Arc<Mutex<Countdown>>, now: DateTime<Utc>) -> Remaining {
        match countdown.lock() {
            Ok(mut countdown) => countdown.tick(now),
            Err(poisoned) => poisoned.into_inner().tick(now),
        }
    }

    /// Restarts from `anchor` and republishes immediately
    pub fn set_anchor(&self, anchor: Option<DateTime<Utc>>) {
        {
            let mut countdown = match self.countdown.lock() {
                Ok(countdown) => countdown,
                Err(poisoned) => poisoned.into_inner(),
            };
            countdown.set_anchor(anchor);
        }
        self.tx.send_replace(Self::tick(&self.countdown, Utc::now()));
    }

    pub fn current(&self) -> Remaining {
        *self.tx.borrow()
    }

    pub fn subscribe(&self) -> watch::Receiver<Remaining> {
        self.tx.subscribe()
    }

    pub async fn stop(&mut self) {
        if let Some(tx) = self.stop_tx.take() {
            let _ = tx.send(()).await;
        }
        if let Some(handle) = self.handle.take() {
            let _ = handle.await;
            info!("Countdown ticker stopped");
        }
    }

    pub fn is_running(&self) -> bool {
        self.handle
            .as_ref()
            .map(|handle| !handle.is_finished())
            .unwrap_or(false)
    }
}

impl Drop for CountdownTicker {
    fn drop(&mut self) {
        if let Some(handle) = self.handle.take() {
            handle.abort();
        }
    }
}
