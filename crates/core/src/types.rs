//! Domain types shared by the gateway client and the panel.
//!
//! All prices and strikes use `rust_decimal::Decimal`. Values here are
//! already validated; wire-level leniency lives in the gateway crate.

use std::collections::BTreeSet;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::instruments::{Action, Exchange, OptionType, Product, Underlying};

// =============================================================================
// Option chain
// =============================================================================

/// One row of an option chain response.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ChainRow {
    pub expiry_date: Option<String>,
    pub strike_price: Option<Decimal>,
    pub spot_price: Option<Decimal>,
}

/// Option chain snapshot. Replaced wholesale on every successful fetch.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct OptionChain {
    pub rows: Vec<ChainRow>,
}

impl OptionChain {
    #[must_use]
    pub fn new(rows: Vec<ChainRow>) -> Self {
        Self { rows }
    }

    /// Distinct non-empty expiries, sorted lexicographically.
    #[must_use]
    pub fn expiries(&self) -> Vec<String> {
        self.rows
            .iter()
            .filter_map(|row| row.expiry_date.as_deref())
            .filter(|expiry| !expiry.is_empty())
            .map(str::to_string)
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect()
    }

    /// Distinct non-zero strikes in ascending order.
    #[must_use]
    pub fn strikes(&self) -> Vec<Decimal> {
        self.rows
            .iter()
            .filter_map(|row| row.strike_price)
            .filter(|strike| !strike.is_zero())
            .map(|strike| strike.normalize())
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect()
    }

    /// Spot price reported on the first row, if present and non-zero.
    #[must_use]
    pub fn spot_price(&self) -> Option<Decimal> {
        self.rows
            .first()
            .and_then(|row| row.spot_price)
            .filter(|spot| !spot.is_zero())
    }
}

/// Body for `/api/optionchain`. Without an expiry the gateway returns every
/// expiry for the underlying.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChainRequest {
    pub symbol: Underlying,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expiry_date: Option<String>,
    pub exchange: Exchange,
}

impl ChainRequest {
    #[must_use]
    pub fn expiries(symbol: Underlying, exchange: Exchange) -> Self {
        Self {
            symbol,
            expiry_date: None,
            exchange,
        }
    }

    #[must_use]
    pub fn strikes(symbol: Underlying, expiry: impl Into<String>, exchange: Exchange) -> Self {
        Self {
            symbol,
            expiry_date: Some(expiry.into()),
            exchange,
        }
    }
}

// =============================================================================
// Quotes
// =============================================================================

/// Builds the contract identifier `{symbol}{expiry}{strike}{type}`,
/// e.g. `NIFTY28FEB2622500CE`.
#[must_use]
pub fn contract_symbol(
    underlying: Underlying,
    expiry: &str,
    strike: Decimal,
    option_type: OptionType,
) -> String {
    format!("{underlying}{expiry}{}{option_type}", strike.normalize())
}

/// Body for `/api/quotes`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct QuoteRequest {
    pub symbol: String,
    pub exchange: String,
}

/// Quote and greeks for one contract. Stale until the next fetch.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct OptionQuote {
    pub ltp: Option<Decimal>,
    pub iv: Option<f64>,
    pub open_interest: Option<i64>,
    pub delta: Option<f64>,
    pub theta: Option<f64>,
}

// =============================================================================
// Positions
// =============================================================================

/// Direction label derived from buy vs sell quantity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PositionSide {
    Long,
    Short,
}

impl PositionSide {
    #[must_use]
    pub fn label(self) -> &'static str {
        match self {
            Self::Long => "LONG",
            Self::Short => "SHORT",
        }
    }
}

/// An open position as reported by the position book.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PositionRow {
    pub symbol: String,
    pub buy_quantity: i64,
    pub sell_quantity: i64,
    pub net_quantity: i64,
    pub average_price: Decimal,
    pub ltp: Decimal,
    pub mtm: Decimal,
}

impl PositionRow {
    /// Long when something was bought and buys exceed sells; short otherwise.
    #[must_use]
    pub fn side(&self) -> PositionSide {
        if self.buy_quantity > 0 && self.buy_quantity > self.sell_quantity {
            PositionSide::Long
        } else {
            PositionSide::Short
        }
    }

    /// Absolute net quantity, as displayed.
    #[must_use]
    pub fn display_quantity(&self) -> u64 {
        self.net_quantity.unsigned_abs()
    }
}

/// All open positions for the session.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PositionBook {
    pub positions: Vec<PositionRow>,
}

impl PositionBook {
    #[must_use]
    pub fn new(positions: Vec<PositionRow>) -> Self {
        Self { positions }
    }

    /// Sum of every position's MTM, saturating at the `Decimal` range.
    #[must_use]
    pub fn total_mtm(&self) -> Decimal {
        self.positions
            .iter()
            .fold(Decimal::ZERO, |total, p| total.saturating_add(p.mtm))
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.positions.len()
    }
}

// =============================================================================
// Orders
// =============================================================================

/// Price type. The panel only sends market orders.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum PriceType {
    #[default]
    Market,
}

/// Body for `/api/optionsorder`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OptionsOrderRequest {
    /// Strategy tag identifying this tool as the order's origin.
    pub strategy: String,
    pub underlying: Underlying,
    pub exchange: Exchange,
    pub expiry_date: String,
    #[serde(with = "rust_decimal::serde::float")]
    pub strike_price: Decimal,
    pub option_type: OptionType,
    pub action: Action,
    pub quantity: u32,
    pub pricetype: PriceType,
    pub product: Product,
    pub splitsize: u32,
}

impl OptionsOrderRequest {
    /// Human-readable summary, e.g. "BUY 65 NIFTY 28FEB26 22500 CE".
    #[must_use]
    pub fn describe(&self) -> String {
        format!(
            "{} {} {} {} {} {}",
            self.action,
            self.quantity,
            self.underlying,
            self.expiry_date,
            self.strike_price.normalize(),
            self.option_type
        )
    }
}

/// Body for `/api/closeposition`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClosePositionRequest {
    pub strategy: String,
}

/// Gateway acknowledgement for an order or close-all request.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderAck {
    pub status: String,
    pub order_id: Option<String>,
    pub message: Option<String>,
}

impl OrderAck {
    #[must_use]
    pub fn is_success(&self) -> bool {
        self.status.eq_ignore_ascii_case("success")
    }
}

/// Locally simulated fill for a paper order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PaperFill {
    pub fill_id: String,
    pub order: OptionsOrderRequest,
    /// Last traded price of the contract when the fill was simulated, if a
    /// quote had been loaded.
    pub fill_price: Option<Decimal>,
    pub filled_at: DateTime<Utc>,
}
