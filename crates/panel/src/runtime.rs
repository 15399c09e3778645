//! Async runtime that executes panel effects against a [`TradingApi`].
//!
//! Each effect becomes one spawned task; completions come back as
//! [`PanelEvent`]s on an unbounded channel and are applied to the state on
//! the caller's task. Requests are never cancelled; superseded responses are
//! filtered by the state's tickets.

use std::sync::Arc;
use std::time::Duration;

use oneclick_core::config::PanelConfig;
use oneclick_core::traits::TradingApi;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, info};

use crate::event::{Effect, PanelEvent};
use crate::state::PanelState;

pub struct PanelRuntime<A: TradingApi + 'static> {
    api: Arc<A>,
    state: PanelState,
    tx: mpsc::UnboundedSender<PanelEvent>,
    rx: mpsc::UnboundedReceiver<PanelEvent>,
    poll_interval: Duration,
    poller: Option<JoinHandle<()>>,
}

impl<A: TradingApi + 'static> std::fmt::Debug for PanelRuntime<A> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PanelRuntime")
            .field("state", &self.state)
            .field("poll_interval", &self.poll_interval)
            .field("polling", &self.poller.is_some())
            .finish_non_exhaustive()
    }
}

impl<A: TradingApi + 'static> PanelRuntime<A> {
    #[must_use]
    pub fn new(api: Arc<A>, config: &PanelConfig) -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        Self {
            api,
            state: PanelState::new(config),
            tx,
            rx,
            poll_interval: Duration::from_millis(config.position_poll_ms.max(1)),
            poller: None,
        }
    }

    #[must_use]
    pub fn state(&self) -> &PanelState {
        &self.state
    }

    /// Issues the initial expiry and strike fetches.
    pub fn start(&mut self) {
        let effects = self.state.start();
        self.execute_all(effects);
    }

    /// Applies a user event and executes the resulting effects.
    pub fn dispatch(&mut self, event: PanelEvent) {
        let effects = self.state.handle(event);
        self.execute_all(effects);
    }

    /// Waits for the next completion and applies it.
    pub async fn process_next(&mut self) {
        if let Some(event) = self.rx.recv().await {
            self.dispatch(event);
        }
    }

    /// Applies every completion that has already arrived. Returns how many
    /// were applied.
    pub fn drain(&mut self) -> usize {
        let mut applied = 0;
        while let Ok(event) = self.rx.try_recv() {
            self.dispatch(event);
            applied += 1;
        }
        applied
    }

    /// Stops position polling. In-flight requests run to completion and are
    /// ignored.
    pub fn shutdown(&mut self) {
        self.stop_polling();
    }

    fn execute_all(&mut self, effects: Vec<Effect>) {
        for effect in effects {
            self.execute(effect);
        }
    }

    fn execute(&mut self, effect: Effect) {
        let api = Arc::clone(&self.api);
        let tx = self.tx.clone();

        match effect {
            Effect::FetchExpiries { ticket, request } => {
                tokio::spawn(async move {
                    let result = api.option_chain(&request).await;
                    send(&tx, PanelEvent::ExpiriesLoaded { ticket, result });
                });
            }
            Effect::FetchChain { ticket, request } => {
                tokio::spawn(async move {
                    let result = api.option_chain(&request).await;
                    send(&tx, PanelEvent::ChainLoaded { ticket, result });
                });
            }
            Effect::FetchQuote {
                ticket,
                contract,
                delay,
            } => {
                tokio::spawn(async move {
                    if !delay.is_zero() {
                        tokio::time::sleep(delay).await;
                    }
                    let result = api.quote(&contract).await;
                    send(
                        &tx,
                        PanelEvent::QuoteLoaded {
                            ticket,
                            contract,
                            result,
                        },
                    );
                });
            }
            Effect::StartPositionPolling { epoch } => self.start_polling(epoch),
            Effect::StopPositionPolling => self.stop_polling(),
            Effect::PlaceOrder(order) => {
                tokio::spawn(async move {
                    let result = api.place_options_order(&order).await;
                    send(&tx, PanelEvent::OrderCompleted { order, result });
                });
            }
            Effect::ClosePositions(request) => {
                tokio::spawn(async move {
                    let result = api.close_positions(&request).await;
                    send(&tx, PanelEvent::CloseCompleted { result });
                });
            }
        }
    }

    /// Polls the position book on a fixed interval. The first tick fires
    /// immediately; each tick spawns one fetch regardless of whether the
    /// previous one has returned.
    fn start_polling(&mut self, epoch: u64) {
        self.stop_polling();

        let api = Arc::clone(&self.api);
        let tx = self.tx.clone();
        let period = self.poll_interval;
        info!(epoch, ?period, "position polling started");

        self.poller = Some(tokio::spawn(async move {
            let mut ticker = tokio::time::interval(period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                ticker.tick().await;
                let api = Arc::clone(&api);
                let tx = tx.clone();
                tokio::spawn(async move {
                    let result = api.position_book().await;
                    send(&tx, PanelEvent::PositionsLoaded { epoch, result });
                });
            }
        }));
    }

    fn stop_polling(&mut self) {
        if let Some(handle) = self.poller.take() {
            handle.abort();
            info!("position polling stopped");
        }
    }
}

impl<A: TradingApi + 'static> Drop for PanelRuntime<A> {
    fn drop(&mut self) {
        self.stop_polling();
    }
}

fn send(tx: &mpsc::UnboundedSender<PanelEvent>, event: PanelEvent) {
    if tx.send(event).is_err() {
        debug!("panel runtime closed, dropping completion");
    }
}
