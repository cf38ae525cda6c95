//! Async driver for `PollState`
//!
//! The runner owns the state and a single event queue. Fetches and timers run
//! as spawned tasks that report back by sending one more event into the queue,
//! so the state is only ever touched from the runner's own loop.

use chrono::Utc;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tracing::{debug, info};

use crate::poll::{Effect, PollEvent, PollState};
use crate::source::MetricSource;

/// Cloneable sender for feeding events into a running loop
#[derive(Debug, Clone)]
pub struct PollHandle {
    tx: mpsc::UnboundedSender<PollEvent>,
}

impl PollHandle {
    /// Queue an event; returns false once the loop has stopped
    pub fn send(&self, event: PollEvent) -> bool {
        self.tx.send(event).is_ok()
    }

    pub fn shutdown(&self) {
        let _ = self.tx.send(PollEvent::Shutdown);
    }

    pub fn is_closed(&self) -> bool {
        self.tx.is_closed()
    }
}

pub struct PollRunner<S: ?Sized> {
    state: PollState,
    source: Arc<S>,
    tx: mpsc::UnboundedSender<PollEvent>,
    rx: mpsc::UnboundedReceiver<PollEvent>,
}

impl<S> PollRunner<S>
where
    S: MetricSource + ?Sized + 'static,
{
    pub fn new(state: PollState, source: Arc<S>) -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        Self {
            state,
            source,
            tx,
            rx,
        }
    }

    pub fn handle(&self) -> PollHandle {
        PollHandle {
            tx: self.tx.clone(),
        }
    }

    /// Process events until `Shutdown`, calling `observe` after each one
    ///
    /// `observe` gets a shared borrow of the state and cannot mutate it. An
    /// error from `observe` stops the loop. In-flight fetches are abandoned
    /// on exit.
    pub async fn run<F>(mut self, mut observe: F) -> anyhow::Result<PollState>
    where
        F: FnMut(&PollState) -> anyhow::Result<()>,
    {
        let _ = self.tx.send(PollEvent::Start);

        while let Some(event) = self.rx.recv().await {
            let mut exit = false;
            for effect in self.state.update(event, Utc::now()) {
                match effect {
                    Effect::Fetch { rearm } => self.spawn_fetch(rearm),
                    Effect::ArmTimer(delay) => self.spawn_timer(delay),
                    Effect::Exit => exit = true,
                }
            }
            if exit {
                break;
            }
            observe(&self.state)?;
        }

        info!(in_flight = self.state.in_flight(), "Poll loop stopped");
        Ok(self.state)
    }

    fn spawn_fetch(&self, rearm: bool) {
        let source = Arc::clone(&self.source);
        let tx = self.tx.clone();
        tokio::spawn(async move {
            let outcome = source.fetch().await;
            if tx
                .send(PollEvent::FetchCompleted { outcome, rearm })
                .is_err()
            {
                debug!("Fetch finished after loop exit");
            }
        });
    }

    fn spawn_timer(&self, delay: Duration) {
        let tx = self.tx.clone();
        tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            let _ = tx.send(PollEvent::Tick);
        });
    }
}
