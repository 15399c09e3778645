//! HTTP client for the local broker gateway.
//!
//! Implements [`oneclick_core::TradingApi`] over the gateway's JSON REST
//! endpoints. Responses are decoded into explicit wire schemas and converted
//! into core types before they leave this crate.

pub mod client;
mod wire;

pub use client::{
    GatewayClient, GatewayClientConfig, CLOSE_POSITION_PATH, DEFAULT_QUOTE_EXCHANGE,
    OPTIONS_ORDER_PATH, OPTION_CHAIN_PATH, POSITION_BOOK_PATH, QUOTES_PATH,
};
