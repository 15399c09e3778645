//! Panel state machine.
//!
//! [`PanelState::handle`] is the only way state changes. It takes one
//! [`PanelEvent`] and returns the [`Effect`]s the runtime must execute; no
//! I/O happens here, so every transition is testable without a gateway.

use std::time::Duration;

use chrono::{DateTime, Utc};
use oneclick_core::config::PanelConfig;
use oneclick_core::error::ApiError;
use oneclick_core::instruments::{is_lot_choice, OptionType, LOT_CHOICES};
use oneclick_core::types::{OptionChain, OptionQuote, OptionsOrderRequest, OrderAck, PaperFill, PositionBook};
use rust_decimal::Decimal;
use tracing::{debug, error, info, warn};

use crate::activity::{ActivityLevel, ActivityLog};
use crate::dispatcher::{Dispatch, Dispatcher, Toggles};
use crate::event::{Effect, FetchKind, FetchTicket, PanelEvent};
use crate::paper::simulate_fill;
use crate::poller::{PositionPoller, Tickets};
use crate::selection::{self, MarketView, Selection};

#[derive(Debug, Clone)]
pub struct PanelState {
    selection: Selection,
    view: MarketView,
    toggles: Toggles,
    tickets: Tickets,
    poller: PositionPoller,
    dispatcher: Dispatcher,
    activity: ActivityLog,
    paper_fills: Vec<PaperFill>,
    quote_delay: Duration,
}

impl PanelState {
    #[must_use]
    pub fn new(config: &PanelConfig) -> Self {
        Self {
            selection: Selection::from_config(config),
            view: MarketView::default(),
            toggles: Toggles::default(),
            tickets: Tickets::default(),
            poller: PositionPoller::default(),
            dispatcher: Dispatcher::new(config.strategy_tag.clone()),
            activity: ActivityLog::new(config.activity_log_len),
            paper_fills: Vec::new(),
            quote_delay: Duration::from_millis(config.quote_delay_ms),
        }
    }

    // =========================================================================
    // Accessors
    // =========================================================================

    #[must_use]
    pub fn selection(&self) -> &Selection {
        &self.selection
    }

    #[must_use]
    pub fn view(&self) -> &MarketView {
        &self.view
    }

    #[must_use]
    pub fn toggles(&self) -> Toggles {
        self.toggles
    }

    #[must_use]
    pub fn positions(&self) -> &PositionBook {
        self.poller.book()
    }

    #[must_use]
    pub fn total_mtm(&self) -> Decimal {
        self.poller.total_mtm()
    }

    #[must_use]
    pub fn activity(&self) -> &ActivityLog {
        &self.activity
    }

    #[must_use]
    pub fn paper_fills(&self) -> &[PaperFill] {
        &self.paper_fills
    }

    #[must_use]
    pub fn strategy_tag(&self) -> &str {
        self.dispatcher.strategy_tag()
    }

    #[must_use]
    pub fn quote_delay(&self) -> Duration {
        self.quote_delay
    }

    // =========================================================================
    // Transitions
    // =========================================================================

    /// Effects for the initial load: the expiry list, and the strike list
    /// when an expiry was configured.
    pub fn start(&mut self) -> Vec<Effect> {
        let mut effects = vec![self.fetch_expiries()];
        effects.extend(self.fetch_chain());
        effects
    }

    pub fn handle(&mut self, event: PanelEvent) -> Vec<Effect> {
        self.handle_at(event, Utc::now())
    }

    /// Like [`handle`](Self::handle) with an explicit clock for paper fills
    /// and activity timestamps.
    pub fn handle_at(&mut self, event: PanelEvent, now: DateTime<Utc>) -> Vec<Effect> {
        let mut effects = Vec::new();

        match event {
            PanelEvent::SetExchange(exchange) => {
                if self.selection.set_exchange(exchange) {
                    info!(%exchange, symbol = %self.selection.symbol, "exchange changed");
                    self.refetch_lists(&mut effects);
                }
            }
            PanelEvent::SetSymbol(symbol) => match self.selection.set_symbol(symbol) {
                Ok(true) => {
                    info!(%symbol, "symbol changed");
                    self.refetch_lists(&mut effects);
                }
                Ok(false) => {}
                Err(e) => warn!(error = %e, "symbol change rejected"),
            },
            PanelEvent::SetExpiry(expiry) => {
                if self.selection.set_expiry(expiry) {
                    info!(expiry = ?self.selection.expiry, "expiry changed");
                    self.supersede_quotes();
                    effects.extend(self.fetch_chain());
                }
            }
            PanelEvent::SetStrike(leg, strike) => {
                match self.selection.set_strike(leg, strike, &self.view.strikes) {
                    Ok(true) => {
                        debug!(%leg, %strike, "strike changed");
                        effects.extend(self.fetch_quote(leg, Duration::ZERO));
                    }
                    Ok(false) => {}
                    Err(e) => warn!(error = %e, "strike change rejected"),
                }
            }
            PanelEvent::SetLots(lots) => {
                if is_lot_choice(lots) {
                    self.selection.lots = lots;
                } else {
                    warn!(lots, choices = ?LOT_CHOICES, "lot count rejected");
                }
            }
            PanelEvent::SetProduct(product) => self.selection.product = product,

            PanelEvent::SetArmed(armed) => {
                if armed != self.toggles.armed {
                    info!(armed, "hotkeys {}", if armed { "armed" } else { "disarmed" });
                }
                self.toggles.armed = armed;
            }
            PanelEvent::SetPaper(paper) => {
                if paper != self.toggles.paper {
                    info!(paper, "paper trading {}", if paper { "on" } else { "off" });
                }
                self.toggles.paper = paper;
            }
            PanelEvent::SetAutoRefresh(enabled) => {
                self.toggles.auto_refresh = enabled;
                if let Some(epoch) = self.poller.set_enabled(enabled) {
                    info!(enabled, epoch, "position auto-refresh toggled");
                    effects.push(if enabled {
                        Effect::StartPositionPolling { epoch }
                    } else {
                        Effect::StopPositionPolling
                    });
                }
            }

            PanelEvent::Key(key) => {
                for dispatch in self.dispatcher.key(self.toggles, &self.selection, key) {
                    self.apply_dispatch(dispatch, now, &mut effects);
                }
            }
            PanelEvent::PlaceOrder(action, leg) => {
                let dispatch = self
                    .dispatcher
                    .click(self.toggles, &self.selection, action, leg);
                self.apply_dispatch(dispatch, now, &mut effects);
            }
            PanelEvent::PanicClose => {
                let dispatch = self.dispatcher.panic(self.toggles);
                self.apply_dispatch(dispatch, now, &mut effects);
            }

            PanelEvent::ExpiriesLoaded { ticket, result } => {
                if self.accept(ticket) {
                    self.on_expiries(result, &mut effects);
                }
            }
            PanelEvent::ChainLoaded { ticket, result } => {
                if self.accept(ticket) {
                    self.on_chain(result, &mut effects);
                }
            }
            PanelEvent::QuoteLoaded {
                ticket,
                contract,
                result,
            } => {
                if self.accept(ticket) {
                    self.on_quote(ticket, &contract, result);
                }
            }
            PanelEvent::PositionsLoaded { epoch, result } => {
                self.poller.apply(epoch, result);
            }
            PanelEvent::OrderCompleted { order, result } => {
                self.on_order_completed(&order, result, now);
            }
            PanelEvent::CloseCompleted { result } => self.on_close_completed(result, now),
        }

        effects
    }

    // =========================================================================
    // Fetch issuing
    // =========================================================================

    fn refetch_lists(&mut self, effects: &mut Vec<Effect>) {
        self.supersede_quotes();
        effects.push(self.fetch_expiries());
        effects.extend(self.fetch_chain());
    }

    fn fetch_expiries(&mut self) -> Effect {
        Effect::FetchExpiries {
            ticket: self.tickets.issue(FetchKind::Expiries),
            request: self.selection.expiry_request(),
        }
    }

    /// Always supersedes in-flight chain fetches, even when no expiry is
    /// selected and nothing is sent.
    fn fetch_chain(&mut self) -> Option<Effect> {
        let ticket = self.tickets.issue(FetchKind::Chain);
        let request = self.selection.chain_request()?;
        Some(Effect::FetchChain { ticket, request })
    }

    /// Quotes in flight for the previous contract must not land on the new one.
    fn supersede_quotes(&mut self) {
        for leg in [OptionType::Call, OptionType::Put] {
            self.tickets.issue(FetchKind::Quote(leg));
        }
    }

    fn fetch_quote(&mut self, leg: OptionType, delay: Duration) -> Option<Effect> {
        let ticket = self.tickets.issue(FetchKind::Quote(leg));
        let contract = self.selection.contract(leg)?;
        Some(Effect::FetchQuote {
            ticket,
            contract,
            delay,
        })
    }

    fn accept(&self, ticket: FetchTicket) -> bool {
        let current = self.tickets.is_current(ticket);
        if !current {
            debug!(
                kind = ?ticket.kind,
                generation = ticket.generation,
                latest = self.tickets.latest(ticket.kind),
                "dropping superseded response"
            );
        }
        current
    }

    // =========================================================================
    // Responses
    // =========================================================================

    fn on_expiries(&mut self, result: Result<OptionChain, ApiError>, effects: &mut Vec<Effect>) {
        match result {
            Ok(chain) => {
                if selection::apply_expiries(&mut self.selection, &mut self.view, &chain) {
                    effects.extend(self.fetch_chain());
                }
            }
            Err(e) => error!(symbol = %self.selection.symbol, error = %e, "failed to fetch expiries"),
        }
    }

    fn on_chain(&mut self, result: Result<OptionChain, ApiError>, effects: &mut Vec<Effect>) {
        match result {
            Ok(chain) => {
                if selection::apply_strikes(&mut self.selection, &mut self.view, &chain).is_some() {
                    let delay = self.quote_delay;
                    effects.extend(self.fetch_quote(OptionType::Call, delay));
                    effects.extend(self.fetch_quote(OptionType::Put, delay));
                }
            }
            Err(e) if e.clears_view() => {
                error!(symbol = %self.selection.symbol, error = %e, "invalid option chain response");
                selection::clear_strikes(&mut self.view);
            }
            Err(e) => error!(symbol = %self.selection.symbol, error = %e, "failed to fetch option chain"),
        }
    }

    fn on_quote(&mut self, ticket: FetchTicket, contract: &str, result: Result<OptionQuote, ApiError>) {
        let FetchKind::Quote(leg) = ticket.kind else {
            return;
        };
        match result {
            Ok(quote) => {
                debug!(contract, ltp = ?quote.ltp, "quote loaded");
                self.view.set_quote(leg, quote);
            }
            Err(e) => error!(contract, error = %e, "failed to fetch option data"),
        }
    }

    fn on_order_completed(
        &mut self,
        order: &OptionsOrderRequest,
        result: Result<OrderAck, ApiError>,
        now: DateTime<Utc>,
    ) {
        let summary = order.describe();
        match result {
            Ok(ack) if ack.is_success() => {
                let order_id = ack.order_id.unwrap_or_else(|| "-".to_string());
                info!(order = %summary, %order_id, "order placed");
                self.activity
                    .push(now, ActivityLevel::Info, format!("{summary} placed (order {order_id})"));
            }
            Ok(ack) => {
                let reason = ack.message.unwrap_or(ack.status);
                error!(order = %summary, %reason, "order not accepted");
                self.activity
                    .push(now, ActivityLevel::Error, format!("{summary} failed: {reason}"));
            }
            Err(e) => {
                error!(order = %summary, error = %e, "order failed");
                self.activity
                    .push(now, ActivityLevel::Error, format!("{summary} failed: {e}"));
            }
        }
    }

    fn on_close_completed(&mut self, result: Result<OrderAck, ApiError>, now: DateTime<Utc>) {
        match result {
            Ok(ack) if ack.is_success() => {
                let message = ack.message.unwrap_or_else(|| "positions closed".to_string());
                info!(%message, "close-all completed");
                self.activity
                    .push(now, ActivityLevel::Info, format!("PANIC close: {message}"));
            }
            Ok(ack) => {
                let reason = ack.message.unwrap_or(ack.status);
                error!(%reason, "close-all not accepted");
                self.activity
                    .push(now, ActivityLevel::Error, format!("PANIC close failed: {reason}"));
            }
            Err(e) => {
                error!(error = %e, "close-all failed");
                self.activity
                    .push(now, ActivityLevel::Error, format!("PANIC close failed: {e}"));
            }
        }
    }

    // =========================================================================
    // Dispatch
    // =========================================================================

    fn apply_dispatch(&mut self, dispatch: Dispatch, now: DateTime<Utc>, effects: &mut Vec<Effect>) {
        match dispatch {
            Dispatch::Live(order) => {
                info!(order = %order.describe(), "sending order");
                effects.push(Effect::PlaceOrder(order));
            }
            Dispatch::Paper(order) => {
                let price = self.view.ltp(order.option_type);
                let fill = simulate_fill(order, price, now);
                let message = match fill.fill_price {
                    Some(price) => format!("PAPER {} @ {price}", fill.order.describe()),
                    None => format!("PAPER {}", fill.order.describe()),
                };
                self.activity.push(now, ActivityLevel::Info, message);
                self.paper_fills.push(fill);
            }
            Dispatch::Close(request) => {
                warn!(strategy = %request.strategy, "PANIC close requested");
                effects.push(Effect::ClosePositions(request));
            }
            Dispatch::CloseSuppressed | Dispatch::Blocked(_) => {}
        }
    }
}
