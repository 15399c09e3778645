use std::time::Duration;

use oneclick_core::error::ApiError;
use oneclick_core::instruments::{Action, Exchange, OptionType, Product, Underlying};
use oneclick_core::types::{
    ChainRequest, ClosePositionRequest, OptionChain, OptionQuote, OptionsOrderRequest, OrderAck,
    PositionBook,
};
use rust_decimal::Decimal;

/// Order hotkeys. Control keys (focus, toggles, quit) never reach the panel
/// state; the terminal front end handles them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Key {
    /// Buy CE.
    Up,
    /// Buy PE.
    Down,
    /// Sell CE.
    Left,
    /// Sell PE.
    Right,
    /// Sell CE and sell PE.
    Reverse,
    /// Close every position.
    Escape,
}

/// Which fetch a ticket belongs to. Quotes are fenced per leg.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FetchKind {
    Expiries,
    Chain,
    Quote(OptionType),
}

/// Generation tag attached to an outbound fetch. Only the latest ticket of
/// each kind is allowed to update state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct FetchTicket {
    pub kind: FetchKind,
    pub generation: u64,
}

/// Inputs to the panel state machine.
#[derive(Debug)]
pub enum PanelEvent {
    SetExchange(Exchange),
    SetSymbol(Underlying),
    SetExpiry(String),
    SetStrike(OptionType, Decimal),
    SetLots(u32),
    SetProduct(Product),

    SetArmed(bool),
    SetPaper(bool),
    SetAutoRefresh(bool),

    /// Order hotkey press or auto-repeat.
    Key(Key),
    /// Click-equivalent order button.
    PlaceOrder(Action, OptionType),
    /// Panic button.
    PanicClose,

    ExpiriesLoaded {
        ticket: FetchTicket,
        result: Result<OptionChain, ApiError>,
    },
    ChainLoaded {
        ticket: FetchTicket,
        result: Result<OptionChain, ApiError>,
    },
    QuoteLoaded {
        ticket: FetchTicket,
        contract: String,
        result: Result<OptionQuote, ApiError>,
    },
    PositionsLoaded {
        epoch: u64,
        result: Result<PositionBook, ApiError>,
    },
    OrderCompleted {
        order: OptionsOrderRequest,
        result: Result<OrderAck, ApiError>,
    },
    CloseCompleted {
        result: Result<OrderAck, ApiError>,
    },
}

/// Side effects requested by the state machine, executed by the runtime.
#[derive(Debug, Clone, PartialEq)]
pub enum Effect {
    FetchExpiries {
        ticket: FetchTicket,
        request: ChainRequest,
    },
    FetchChain {
        ticket: FetchTicket,
        request: ChainRequest,
    },
    FetchQuote {
        ticket: FetchTicket,
        contract: String,
        delay: Duration,
    },
    StartPositionPolling {
        epoch: u64,
    },
    StopPositionPolling,
    PlaceOrder(OptionsOrderRequest),
    ClosePositions(ClosePositionRequest),
}
