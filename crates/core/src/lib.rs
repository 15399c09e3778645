//! Core types for one-click index options trading.
//!
//! Holds the static instrument tables, the domain types exchanged with the
//! broker gateway, the `TradingApi` seam and layered configuration.

pub mod config;
pub mod config_loader;
pub mod error;
pub mod instruments;
pub mod traits;
pub mod types;

pub use config::{AppConfig, GatewayConfig, PanelConfig, DEFAULT_GATEWAY_URL, DEFAULT_STRATEGY_TAG};
pub use config_loader::{ConfigLoader, DEFAULT_CONFIG_PATH};
pub use error::{ApiError, Result};
pub use instruments::{is_lot_choice, Action, Exchange, OptionType, Product, Underlying, LOT_CHOICES};
pub use traits::TradingApi;
pub use types::{
    contract_symbol, ChainRequest, ChainRow, ClosePositionRequest, OptionChain, OptionQuote,
    OptionsOrderRequest, OrderAck, PaperFill, PositionBook, PositionRow, PositionSide, PriceType,
    QuoteRequest,
};
