//! Wire schemas for gateway responses.
//!
//! The gateway is loosely typed: numbers arrive as JSON numbers or numeric
//! strings, optional fields may be absent or null. Everything is decoded
//! here into the validated types from `oneclick-core`. A numeric field that
//! cannot be read is treated as absent; a `data` member of the wrong shape
//! is a `Malformed` error.

use std::str::FromStr;

use oneclick_core::error::{ApiError, Result};
use oneclick_core::types::{ChainRow, OptionChain, OptionQuote, OrderAck, PositionBook, PositionRow};
use rust_decimal::Decimal;
use serde::Deserialize;
use serde_json::Value;

// =============================================================================
// Envelope
// =============================================================================

/// Every gateway response is wrapped as `{status, message?, data?, ...}`.
#[derive(Debug, Clone, Default, Deserialize)]
pub(crate) struct RawEnvelope {
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub data: Option<Value>,
    #[serde(default, alias = "orderid")]
    pub order_id: Option<Value>,
}

impl RawEnvelope {
    pub(crate) fn from_value(value: Value) -> Result<Self> {
        if !value.is_object() {
            return Err(ApiError::malformed("response is not a JSON object"));
        }
        Ok(serde_json::from_value(value)?)
    }

    fn data_array(self, what: &str) -> Result<Vec<Value>> {
        match self.data {
            Some(Value::Array(rows)) => Ok(rows),
            Some(_) => Err(ApiError::malformed(format!("{what}: data is not an array"))),
            None => Err(ApiError::malformed(format!(
                "{what}: no data ({})",
                self.message.as_deref().unwrap_or("no message")
            ))),
        }
    }
}

// =============================================================================
// Lenient scalars
// =============================================================================

/// Reads a decimal from a JSON number or numeric string.
pub(crate) fn lenient_decimal(value: &Value) -> Option<Decimal> {
    let text = match value {
        Value::Number(n) => n.to_string(),
        Value::String(s) => s.trim().to_string(),
        _ => return None,
    };
    Decimal::from_str(&text)
        .or_else(|_| Decimal::from_scientific(&text))
        .ok()
}

pub(crate) fn lenient_f64(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok().filter(|v| v.is_finite()),
        _ => None,
    }
}

pub(crate) fn lenient_i64(value: &Value) -> Option<i64> {
    match value {
        Value::Number(n) => n.as_i64().or_else(|| n.as_f64().map(|v| v as i64)),
        Value::String(s) => {
            let s = s.trim();
            s.parse::<i64>()
                .ok()
                .or_else(|| s.parse::<f64>().ok().filter(|v| v.is_finite()).map(|v| v as i64))
        }
        _ => None,
    }
}

fn lenient_string(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

// =============================================================================
// Option chain
// =============================================================================

#[derive(Debug, Clone, Default, Deserialize)]
struct RawChainRow {
    #[serde(default)]
    expiry_date: Value,
    #[serde(default)]
    strike_price: Value,
    #[serde(default)]
    spot_price: Value,
}

impl From<RawChainRow> for ChainRow {
    fn from(raw: RawChainRow) -> Self {
        Self {
            expiry_date: match raw.expiry_date {
                Value::String(s) if !s.is_empty() => Some(s),
                _ => None,
            },
            strike_price: lenient_decimal(&raw.strike_price),
            spot_price: lenient_decimal(&raw.spot_price),
        }
    }
}

/// Decodes an option chain. Non-object rows keep their position (so the
/// first-row spot lookup stays faithful) but contribute nothing.
pub(crate) fn parse_chain(value: Value) -> Result<OptionChain> {
    let rows = RawEnvelope::from_value(value)?.data_array("option chain")?;

    Ok(OptionChain::new(
        rows.into_iter()
            .map(|row| {
                serde_json::from_value::<RawChainRow>(row)
                    .map(ChainRow::from)
                    .unwrap_or_default()
            })
            .collect(),
    ))
}

// =============================================================================
// Quotes
// =============================================================================

#[derive(Debug, Clone, Default, Deserialize)]
struct RawQuote {
    #[serde(default)]
    ltp: Value,
    #[serde(default)]
    iv: Value,
    #[serde(default)]
    open_interest: Value,
    #[serde(default)]
    delta: Value,
    #[serde(default)]
    theta: Value,
}

pub(crate) fn parse_quote(value: Value) -> Result<OptionQuote> {
    let envelope = RawEnvelope::from_value(value)?;
    let data = match envelope.data {
        Some(data @ Value::Object(_)) => data,
        Some(_) => return Err(ApiError::malformed("quote: data is not an object")),
        None => return Err(ApiError::malformed("quote: no data")),
    };
    let raw: RawQuote = serde_json::from_value(data)?;

    Ok(OptionQuote {
        ltp: lenient_decimal(&raw.ltp),
        iv: lenient_f64(&raw.iv),
        open_interest: lenient_i64(&raw.open_interest),
        delta: lenient_f64(&raw.delta),
        theta: lenient_f64(&raw.theta),
    })
}

// =============================================================================
// Positions
// =============================================================================

#[derive(Debug, Clone, Default, Deserialize)]
struct RawPosition {
    #[serde(default)]
    symbol: Value,
    #[serde(default)]
    buy_quantity: Value,
    #[serde(default)]
    sell_quantity: Value,
    #[serde(default)]
    net_quantity: Value,
    #[serde(default)]
    average_price: Value,
    #[serde(default)]
    ltp: Value,
    #[serde(default)]
    mtm: Value,
}

impl From<RawPosition> for PositionRow {
    fn from(raw: RawPosition) -> Self {
        Self {
            symbol: lenient_string(&raw.symbol).unwrap_or_default(),
            buy_quantity: lenient_i64(&raw.buy_quantity).unwrap_or(0),
            sell_quantity: lenient_i64(&raw.sell_quantity).unwrap_or(0),
            net_quantity: lenient_i64(&raw.net_quantity).unwrap_or(0),
            average_price: lenient_decimal(&raw.average_price).unwrap_or_default(),
            ltp: lenient_decimal(&raw.ltp).unwrap_or_default(),
            mtm: lenient_decimal(&raw.mtm).unwrap_or_default(),
        }
    }
}

/// Decodes the position book. Rows that are not objects are dropped.
pub(crate) fn parse_positions(value: Value) -> Result<PositionBook> {
    let rows = RawEnvelope::from_value(value)?.data_array("position book")?;

    Ok(PositionBook::new(
        rows.into_iter()
            .filter(Value::is_object)
            .filter_map(|row| serde_json::from_value::<RawPosition>(row).ok())
            .map(PositionRow::from)
            .collect(),
    ))
}

// =============================================================================
// Order acknowledgements
// =============================================================================

/// Decodes an order or close-all acknowledgement. An explicit
/// `status: "error"` is a rejection.
pub(crate) fn parse_ack(value: Value) -> Result<OrderAck> {
    let envelope = RawEnvelope::from_value(value)?;
    let status = envelope.status.unwrap_or_default();

    if status.eq_ignore_ascii_case("error") {
        return Err(ApiError::OrderRejected(
            envelope.message.unwrap_or_else(|| "no reason given".to_string()),
        ));
    }

    Ok(OrderAck {
        status,
        order_id: envelope.order_id.as_ref().and_then(lenient_string),
        message: envelope.message,
    })
}
