//! Integration tests for the panel runtime.
//!
//! A recording in-memory gateway stands in for the HTTP client. Time is
//! paused so the quote delay and the position poll interval are driven
//! deterministically.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use oneclick_core::config::PanelConfig;
use oneclick_core::error::{ApiError, Result};
use oneclick_core::instruments::{Action, Exchange, OptionType, Underlying};
use oneclick_core::traits::TradingApi;
use oneclick_core::types::{
    ChainRequest, ChainRow, ClosePositionRequest, OptionChain, OptionQuote, OptionsOrderRequest,
    OrderAck, PositionBook, PositionRow,
};
use oneclick_panel::{ActivityLevel, Key, PanelEvent, PanelRuntime};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

// =============================================================================
// Recording gateway
// =============================================================================

#[derive(Debug, Clone, PartialEq)]
enum Call {
    Chain(ChainRequest),
    Quote(String),
    Positions,
    Order(OptionsOrderRequest),
    Close(ClosePositionRequest),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum PositionsMode {
    Book,
    NotJson,
    Unauthorized,
}

struct RecordingApi {
    calls: Mutex<Vec<Call>>,
    expiries: Vec<&'static str>,
    strikes_by_expiry: HashMap<&'static str, (Vec<Decimal>, Decimal)>,
    chain_delays: HashMap<&'static str, Duration>,
    positions_mode: PositionsMode,
    reject_orders: bool,
}

impl RecordingApi {
    fn new() -> Self {
        Self {
            calls: Mutex::new(Vec::new()),
            expiries: vec!["28FEB26", "06MAR26"],
            strikes_by_expiry: HashMap::new(),
            chain_delays: HashMap::new(),
            positions_mode: PositionsMode::Book,
            reject_orders: false,
        }
    }

    fn with_strikes(mut self, expiry: &'static str, strikes: Vec<Decimal>, spot: Decimal) -> Self {
        self.strikes_by_expiry.insert(expiry, (strikes, spot));
        self
    }

    fn with_chain_delay(mut self, expiry: &'static str, delay: Duration) -> Self {
        self.chain_delays.insert(expiry, delay);
        self
    }

    fn with_positions(mut self, mode: PositionsMode) -> Self {
        self.positions_mode = mode;
        self
    }

    fn rejecting_orders(mut self) -> Self {
        self.reject_orders = true;
        self
    }

    fn record(&self, call: Call) {
        self.calls.lock().unwrap().push(call);
    }

    fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }

    fn count(&self, pred: impl Fn(&Call) -> bool) -> usize {
        self.calls().iter().filter(|&c| pred(c)).count()
    }

    fn trade_calls(&self) -> usize {
        self.count(|c| matches!(c, Call::Order(_) | Call::Close(_)))
    }

    fn position_calls(&self) -> usize {
        self.count(|c| matches!(c, Call::Positions))
    }

    fn orders(&self) -> Vec<OptionsOrderRequest> {
        self.calls()
            .into_iter()
            .filter_map(|c| match c {
                Call::Order(o) => Some(o),
                _ => None,
            })
            .collect()
    }
}

#[async_trait]
impl TradingApi for RecordingApi {
    async fn option_chain(&self, request: &ChainRequest) -> Result<OptionChain> {
        self.record(Call::Chain(request.clone()));

        let Some(expiry) = request.expiry_date.as_deref() else {
            return Ok(OptionChain::new(
                self.expiries
                    .iter()
                    .map(|e| ChainRow {
                        expiry_date: Some((*e).to_string()),
                        strike_price: Some(dec!(100)),
                        spot_price: None,
                    })
                    .collect(),
            ));
        };

        if let Some(delay) = self.chain_delays.get(expiry) {
            tokio::time::sleep(*delay).await;
        }

        let (strikes, spot) = self
            .strikes_by_expiry
            .get(expiry)
            .cloned()
            .unwrap_or_else(|| {
                (
                    vec![dec!(100), dec!(200), dec!(300), dec!(400), dec!(500)],
                    dec!(250),
                )
            });
        Ok(OptionChain::new(
            strikes
                .into_iter()
                .map(|s| ChainRow {
                    expiry_date: Some(expiry.to_string()),
                    strike_price: Some(s),
                    spot_price: Some(spot),
                })
                .collect(),
        ))
    }

    async fn quote(&self, contract: &str) -> Result<OptionQuote> {
        self.record(Call::Quote(contract.to_string()));
        Ok(OptionQuote {
            ltp: Some(if contract.ends_with("CE") { dec!(101.5) } else { dec!(98.25) }),
            iv: Some(14.0),
            open_interest: Some(1_000_000),
            delta: Some(0.5),
            theta: Some(-8.0),
        })
    }

    async fn position_book(&self) -> Result<PositionBook> {
        self.record(Call::Positions);
        match self.positions_mode {
            PositionsMode::Book => Ok(PositionBook::new(vec![
                PositionRow {
                    symbol: "NIFTY28FEB26300CE".to_string(),
                    buy_quantity: 65,
                    net_quantity: 65,
                    mtm: dec!(812.5),
                    ..PositionRow::default()
                },
                PositionRow {
                    symbol: "NIFTY28FEB26300PE".to_string(),
                    sell_quantity: 65,
                    net_quantity: -65,
                    mtm: dec!(-200),
                    ..PositionRow::default()
                },
            ])),
            PositionsMode::NotJson => Err(ApiError::not_json("text/html")),
            PositionsMode::Unauthorized => Err(ApiError::api(401, "unauthorized")),
        }
    }

    async fn place_options_order(&self, order: &OptionsOrderRequest) -> Result<OrderAck> {
        self.record(Call::Order(order.clone()));
        if self.reject_orders {
            return Err(ApiError::OrderRejected("RMS: margin exceeded".to_string()));
        }
        Ok(OrderAck {
            status: "success".to_string(),
            order_id: Some("250228000001".to_string()),
            message: None,
        })
    }

    async fn close_positions(&self, request: &ClosePositionRequest) -> Result<OrderAck> {
        self.record(Call::Close(request.clone()));
        Ok(OrderAck {
            status: "success".to_string(),
            order_id: None,
            message: Some("All positions closed".to_string()),
        })
    }
}

// =============================================================================
// Helper Functions
// =============================================================================

fn config() -> PanelConfig {
    PanelConfig {
        expiry: Some("28FEB26".to_string()),
        ..PanelConfig::default()
    }
}

/// Lets spawned requests run and applies their completions until quiet.
async fn settle(runtime: &mut PanelRuntime<RecordingApi>) {
    for _ in 0..8 {
        tokio::time::sleep(Duration::from_millis(150)).await;
        runtime.drain();
    }
}

async fn started(api: RecordingApi) -> (Arc<RecordingApi>, PanelRuntime<RecordingApi>) {
    let api = Arc::new(api);
    let mut runtime = PanelRuntime::new(Arc::clone(&api), &config());
    runtime.start();
    settle(&mut runtime).await;
    (api, runtime)
}

const ALL_KEYS: [Key; 6] = [Key::Up, Key::Down, Key::Left, Key::Right, Key::Reverse, Key::Escape];

// =============================================================================
// Selection and market data
// =============================================================================

#[tokio::test(start_paused = true)]
async fn test_startup_selects_atm_and_quotes_both_legs() {
    let (api, runtime) = started(RecordingApi::new()).await;
    let state = runtime.state();

    assert_eq!(state.selection().exchange, Exchange::NseIndex);
    assert_eq!(state.selection().symbol, Underlying::Nifty);
    assert_eq!(state.view().expiries, vec!["06MAR26", "28FEB26"]);
    assert_eq!(state.selection().ce_strike, Some(dec!(300)));
    assert_eq!(state.selection().pe_strike, Some(dec!(300)));
    assert_eq!(state.view().spot, Some(dec!(250)));
    assert_eq!(state.view().ltp(OptionType::Call), Some(dec!(101.5)));
    assert_eq!(state.view().ltp(OptionType::Put), Some(dec!(98.25)));

    let mut quotes: Vec<_> = api
        .calls()
        .into_iter()
        .filter_map(|c| match c {
            Call::Quote(contract) => Some(contract),
            _ => None,
        })
        .collect();
    quotes.sort();
    assert_eq!(quotes, vec!["NIFTY28FEB26300CE", "NIFTY28FEB26300PE"]);
}

#[tokio::test(start_paused = true)]
async fn test_process_next_applies_startup_completions() {
    let api = Arc::new(RecordingApi::new());
    let mut runtime = PanelRuntime::new(Arc::clone(&api), &config());
    runtime.start();

    // Expiry list and strike list are both in flight.
    runtime.process_next().await;
    runtime.process_next().await;

    let state = runtime.state();
    assert_eq!(state.view().expiries, vec!["06MAR26", "28FEB26"]);
    assert_eq!(state.selection().ce_strike, Some(dec!(300)));
    assert_eq!(state.selection().pe_strike, Some(dec!(300)));
    assert!(state.view().quote(OptionType::Call).is_none());
}

#[tokio::test(start_paused = true)]
async fn test_quotes_wait_for_delay_after_atm() {
    let api = Arc::new(RecordingApi::new());
    let mut runtime = PanelRuntime::new(Arc::clone(&api), &config());
    runtime.start();

    // Let the chain responses land but stay inside the quote delay.
    tokio::time::sleep(Duration::from_millis(10)).await;
    runtime.drain();
    assert_eq!(runtime.state().selection().ce_strike, Some(dec!(300)));
    assert_eq!(api.count(|c| matches!(c, Call::Quote(_))), 0);

    tokio::time::sleep(Duration::from_millis(120)).await;
    assert_eq!(api.count(|c| matches!(c, Call::Quote(_))), 2);
}

#[tokio::test(start_paused = true)]
async fn test_exchange_switch_falls_back_and_refetches() {
    let (api, mut runtime) = started(RecordingApi::new()).await;

    runtime.dispatch(PanelEvent::SetExchange(Exchange::BseIndex));
    settle(&mut runtime).await;

    assert_eq!(runtime.state().selection().symbol, Underlying::Sensex);
    assert!(api
        .calls()
        .contains(&Call::Chain(ChainRequest::expiries(Underlying::Sensex, Exchange::BseIndex))));
    assert_eq!(
        runtime.state().selection().contract(OptionType::Call).as_deref(),
        Some("SENSEX28FEB26300CE")
    );
}

#[tokio::test(start_paused = true)]
async fn test_superseded_chain_response_never_applies() {
    let api = RecordingApi::new()
        .with_strikes("06MAR26", vec![dec!(22400), dec!(22500), dec!(22600)], dec!(22510))
        .with_strikes("28FEB26", vec![dec!(100), dec!(200), dec!(300)], dec!(210))
        .with_chain_delay("28FEB26", Duration::from_secs(1));
    let api = Arc::new(api);
    let mut runtime = PanelRuntime::new(Arc::clone(&api), &config());
    runtime.start();

    // The slow 28FEB26 response is still in flight when the user moves on.
    runtime.dispatch(PanelEvent::SetExpiry("06MAR26".to_string()));
    for _ in 0..15 {
        tokio::time::sleep(Duration::from_millis(200)).await;
        runtime.drain();
    }

    let state = runtime.state();
    assert_eq!(state.selection().expiry.as_deref(), Some("06MAR26"));
    assert_eq!(state.view().strikes, vec![dec!(22400), dec!(22500), dec!(22600)]);
    assert_eq!(state.selection().ce_strike, Some(dec!(22500)));
    assert_eq!(state.view().spot, Some(dec!(22510)));
}

// =============================================================================
// Order dispatch
// =============================================================================

#[tokio::test(start_paused = true)]
async fn test_disarmed_keys_send_nothing() {
    let (api, mut runtime) = started(RecordingApi::new()).await;

    for key in ALL_KEYS {
        runtime.dispatch(PanelEvent::Key(key));
    }
    runtime.dispatch(PanelEvent::PlaceOrder(Action::Buy, OptionType::Call));
    settle(&mut runtime).await;

    assert_eq!(api.trade_calls(), 0);
}

#[tokio::test(start_paused = true)]
async fn test_paper_mode_sends_no_orders() {
    let (api, mut runtime) = started(RecordingApi::new()).await;
    runtime.dispatch(PanelEvent::SetArmed(true));
    runtime.dispatch(PanelEvent::SetPaper(true));

    for key in ALL_KEYS {
        runtime.dispatch(PanelEvent::Key(key));
    }
    runtime.dispatch(PanelEvent::PanicClose);
    settle(&mut runtime).await;

    assert_eq!(api.trade_calls(), 0);
    // Up, Down, Left, Right and two legs of Reverse.
    let fills = runtime.state().paper_fills();
    assert_eq!(fills.len(), 6);
    assert_eq!(fills[0].fill_price, Some(dec!(101.5)));
    assert_eq!(fills[1].fill_price, Some(dec!(98.25)));
}

#[tokio::test(start_paused = true)]
async fn test_armed_keys_send_one_order_each() {
    let (api, mut runtime) = started(RecordingApi::new()).await;
    runtime.dispatch(PanelEvent::SetArmed(true));
    runtime.dispatch(PanelEvent::SetLots(3));

    runtime.dispatch(PanelEvent::Key(Key::Up));
    runtime.dispatch(PanelEvent::Key(Key::Up));
    runtime.dispatch(PanelEvent::Key(Key::Reverse));
    settle(&mut runtime).await;

    let orders = api.orders();
    assert_eq!(orders.len(), 4);
    assert!(orders.iter().all(|o| o.quantity == 195 && o.strategy == "OneClickTool"));
    assert_eq!(
        orders
            .iter()
            .map(|o| (o.action, o.option_type))
            .collect::<Vec<_>>(),
        vec![
            (Action::Buy, OptionType::Call),
            (Action::Buy, OptionType::Call),
            (Action::Sell, OptionType::Call),
            (Action::Sell, OptionType::Put),
        ]
    );
    assert_eq!(runtime.state().activity().len(), 4);
}

#[tokio::test(start_paused = true)]
async fn test_order_quantity_per_underlying() {
    let (api, mut runtime) = started(RecordingApi::new()).await;
    runtime.dispatch(PanelEvent::SetArmed(true));
    runtime.dispatch(PanelEvent::SetLots(2));

    let cases = [
        (Exchange::NseIndex, Underlying::BankNifty, 60),
        (Exchange::NseIndex, Underlying::FinNifty, 120),
        (Exchange::NseIndex, Underlying::MidcpNifty, 280),
        (Exchange::BseIndex, Underlying::Sensex, 40),
        (Exchange::BseIndex, Underlying::Bankex, 60),
    ];
    for (exchange, symbol, _) in cases {
        runtime.dispatch(PanelEvent::SetExchange(exchange));
        runtime.dispatch(PanelEvent::SetSymbol(symbol));
        settle(&mut runtime).await;
        runtime.dispatch(PanelEvent::PlaceOrder(Action::Buy, OptionType::Put));
        settle(&mut runtime).await;
    }

    let quantities: Vec<_> = api.orders().iter().map(|o| (o.underlying, o.quantity)).collect();
    assert_eq!(
        quantities,
        cases.iter().map(|(_, s, q)| (*s, *q)).collect::<Vec<_>>()
    );
}

#[tokio::test(start_paused = true)]
async fn test_panic_button_closes_all_even_disarmed() {
    let (api, mut runtime) = started(RecordingApi::new()).await;

    runtime.dispatch(PanelEvent::PanicClose);
    settle(&mut runtime).await;

    assert_eq!(
        api.calls().last(),
        Some(&Call::Close(ClosePositionRequest {
            strategy: "OneClickTool".to_string()
        }))
    );
    assert!(runtime
        .state()
        .activity()
        .last()
        .is_some_and(|a| a.message.contains("All positions closed")));
}

#[tokio::test(start_paused = true)]
async fn test_rejected_order_reaches_activity_log() {
    let (_api, mut runtime) = started(RecordingApi::new().rejecting_orders()).await;
    runtime.dispatch(PanelEvent::SetArmed(true));

    runtime.dispatch(PanelEvent::Key(Key::Right));
    settle(&mut runtime).await;

    let last = runtime.state().activity().last().cloned().unwrap();
    assert_eq!(last.level, ActivityLevel::Error);
    assert!(last.message.contains("margin exceeded"));
}

// =============================================================================
// Position polling
// =============================================================================

#[tokio::test(start_paused = true)]
async fn test_no_position_fetch_until_auto_refresh() {
    let (api, mut runtime) = started(RecordingApi::new()).await;

    tokio::time::sleep(Duration::from_secs(10)).await;
    runtime.drain();
    assert_eq!(api.position_calls(), 0);

    runtime.dispatch(PanelEvent::SetAutoRefresh(true));
    tokio::task::yield_now().await;
    tokio::task::yield_now().await;
    tokio::task::yield_now().await;
    assert_eq!(api.position_calls(), 1);
    runtime.drain();
    assert_eq!(runtime.state().total_mtm(), dec!(612.5));
    assert_eq!(runtime.state().positions().len(), 2);

    tokio::time::sleep(Duration::from_millis(2_050)).await;
    assert_eq!(api.position_calls(), 2);

    runtime.dispatch(PanelEvent::SetAutoRefresh(false));
    tokio::time::sleep(Duration::from_secs(10)).await;
    assert_eq!(api.position_calls(), 2);
}

#[tokio::test(start_paused = true)]
async fn test_non_json_positions_zero_the_book() {
    let (_api, mut runtime) =
        started(RecordingApi::new().with_positions(PositionsMode::NotJson)).await;

    runtime.dispatch(PanelEvent::SetAutoRefresh(true));
    settle(&mut runtime).await;

    assert!(runtime.state().positions().is_empty());
    assert_eq!(runtime.state().total_mtm(), Decimal::ZERO);
}

#[tokio::test(start_paused = true)]
async fn test_unauthorized_positions_zero_the_book() {
    let (_api, mut runtime) =
        started(RecordingApi::new().with_positions(PositionsMode::Unauthorized)).await;

    runtime.dispatch(PanelEvent::SetAutoRefresh(true));
    settle(&mut runtime).await;

    assert!(runtime.state().positions().is_empty());
    assert_eq!(runtime.state().total_mtm(), Decimal::ZERO);
}
