//! Static instrument tables: exchanges, index underlyings and lot sizes.
//!
//! These tables are fixed configuration. Lot sizes are exchange-mandated
//! contract multipliers and are never derived from market data.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::ApiError;

/// Lot counts offered by the panel.
pub const LOT_CHOICES: [u32; 8] = [1, 2, 3, 4, 5, 10, 15, 20];

/// Returns true if `lots` is one of the offered lot counts.
#[must_use]
pub fn is_lot_choice(lots: u32) -> bool {
    LOT_CHOICES.contains(&lots)
}

// =============================================================================
// Exchange
// =============================================================================

/// Index derivatives segment an underlying is listed on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Exchange {
    #[serde(rename = "NSE_INDEX")]
    NseIndex,
    #[serde(rename = "BSE_INDEX")]
    BseIndex,
}

impl Exchange {
    pub const ALL: [Exchange; 2] = [Exchange::NseIndex, Exchange::BseIndex];

    /// Underlyings tradeable on this exchange. The first entry is the fallback
    /// when the current symbol does not belong to the exchange.
    #[must_use]
    pub fn symbols(self) -> &'static [Underlying] {
        match self {
            Self::NseIndex => &[
                Underlying::Nifty,
                Underlying::BankNifty,
                Underlying::FinNifty,
                Underlying::MidcpNifty,
            ],
            Self::BseIndex => &[Underlying::Sensex, Underlying::Bankex],
        }
    }

    /// Returns true if `symbol` is listed on this exchange.
    #[must_use]
    pub fn lists(self, symbol: Underlying) -> bool {
        self.symbols().contains(&symbol)
    }

    /// Symbol used when the current one is not listed here.
    #[must_use]
    pub fn default_symbol(self) -> Underlying {
        self.symbols()[0]
    }

    #[must_use]
    pub fn as_api_str(self) -> &'static str {
        match self {
            Self::NseIndex => "NSE_INDEX",
            Self::BseIndex => "BSE_INDEX",
        }
    }

    /// Short label for display ("NSE", "BSE").
    #[must_use]
    pub fn label(self) -> &'static str {
        match self {
            Self::NseIndex => "NSE",
            Self::BseIndex => "BSE",
        }
    }
}

impl fmt::Display for Exchange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_api_str())
    }
}

impl FromStr for Exchange {
    type Err = ApiError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "NSE_INDEX" | "NSE" => Ok(Self::NseIndex),
            "BSE_INDEX" | "BSE" => Ok(Self::BseIndex),
            other => Err(ApiError::InvalidRequest(format!("unknown exchange: {other}"))),
        }
    }
}

// =============================================================================
// Underlying
// =============================================================================

/// Index underlying with a fixed contract multiplier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Underlying {
    Nifty,
    BankNifty,
    FinNifty,
    MidcpNifty,
    Sensex,
    Bankex,
}

impl Underlying {
    pub const ALL: [Underlying; 6] = [
        Underlying::Nifty,
        Underlying::BankNifty,
        Underlying::FinNifty,
        Underlying::MidcpNifty,
        Underlying::Sensex,
        Underlying::Bankex,
    ];

    /// Contract multiplier (units per lot).
    #[must_use]
    pub const fn lot_size(self) -> u32 {
        match self {
            Self::Nifty => 65,
            Self::BankNifty => 30,
            Self::FinNifty => 60,
            Self::MidcpNifty => 140,
            Self::Sensex => 20,
            Self::Bankex => 30,
        }
    }

    /// Order quantity for `lots` lots, or `None` if it does not fit in a `u32`.
    #[must_use]
    pub const fn quantity(self, lots: u32) -> Option<u32> {
        lots.checked_mul(self.lot_size())
    }

    #[must_use]
    pub fn as_api_str(self) -> &'static str {
        match self {
            Self::Nifty => "NIFTY",
            Self::BankNifty => "BANKNIFTY",
            Self::FinNifty => "FINNIFTY",
            Self::MidcpNifty => "MIDCPNIFTY",
            Self::Sensex => "SENSEX",
            Self::Bankex => "BANKEX",
        }
    }

    /// Exchange segment the underlying trades on.
    #[must_use]
    pub fn exchange(self) -> Exchange {
        match self {
            Self::Sensex | Self::Bankex => Exchange::BseIndex,
            _ => Exchange::NseIndex,
        }
    }
}

impl fmt::Display for Underlying {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_api_str())
    }
}

impl FromStr for Underlying {
    type Err = ApiError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_ascii_uppercase();
        Self::ALL
            .into_iter()
            .find(|u| u.as_api_str() == wanted)
            .ok_or_else(|| ApiError::InvalidRequest(format!("unknown underlying: {wanted}")))
    }
}

// =============================================================================
// Order enums
// =============================================================================

/// Call or put.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum OptionType {
    #[serde(rename = "CE")]
    Call,
    #[serde(rename = "PE")]
    Put,
}

impl OptionType {
    #[must_use]
    pub fn as_api_str(self) -> &'static str {
        match self {
            Self::Call => "CE",
            Self::Put => "PE",
        }
    }
}

impl fmt::Display for OptionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_api_str())
    }
}

/// Order action.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Action {
    Buy,
    Sell,
}

impl Action {
    #[must_use]
    pub fn as_api_str(self) -> &'static str {
        match self {
            Self::Buy => "BUY",
            Self::Sell => "SELL",
        }
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_api_str())
    }
}

/// Product mode: carry-forward (NRML) or intraday (MIS).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Product {
    #[default]
    Nrml,
    Mis,
}

impl Product {
    #[must_use]
    pub fn as_api_str(self) -> &'static str {
        match self {
            Self::Nrml => "NRML",
            Self::Mis => "MIS",
        }
    }

    #[must_use]
    pub fn toggled(self) -> Self {
        match self {
            Self::Nrml => Self::Mis,
            Self::Mis => Self::Nrml,
        }
    }
}

impl fmt::Display for Product {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_api_str())
    }
}
