//! Order dispatcher: guards, hotkey mapping and order construction.
//!
//! Every order path is gated by the armed toggle. Click-style orders need the
//! strike of their own leg; hotkeys need both strikes. Paper mode turns
//! orders into simulated fills and swallows the panic close entirely.

use oneclick_core::instruments::{Action, OptionType};
use oneclick_core::types::{ClosePositionRequest, OptionsOrderRequest, PriceType};
use tracing::debug;

use crate::event::Key;
use crate::selection::Selection;

/// Safety and polling switches. All start off.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Toggles {
    pub armed: bool,
    pub paper: bool,
    pub auto_refresh: bool,
}

/// What a hotkey asks for, before guards are applied.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Intent {
    Order(Action, OptionType),
    Panic,
}

impl Intent {
    /// Hotkey table. Reverse sells both legs as two independent orders.
    #[must_use]
    pub fn for_key(key: Key) -> Vec<Intent> {
        match key {
            Key::Up => vec![Intent::Order(Action::Buy, OptionType::Call)],
            Key::Down => vec![Intent::Order(Action::Buy, OptionType::Put)],
            Key::Left => vec![Intent::Order(Action::Sell, OptionType::Call)],
            Key::Right => vec![Intent::Order(Action::Sell, OptionType::Put)],
            Key::Reverse => vec![
                Intent::Order(Action::Sell, OptionType::Call),
                Intent::Order(Action::Sell, OptionType::Put),
            ],
            Key::Escape => vec![Intent::Panic],
        }
    }
}

/// Why an order path did nothing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BlockReason {
    Disarmed,
    MissingStrike(OptionType),
    MissingStrikes,
    MissingExpiry,
    QuantityOverflow,
}

impl std::fmt::Display for BlockReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Disarmed => f.write_str("hotkeys disarmed"),
            Self::MissingStrike(leg) => write!(f, "no {leg} strike selected"),
            Self::MissingStrikes => f.write_str("strikes not selected"),
            Self::MissingExpiry => f.write_str("no expiry selected"),
            Self::QuantityOverflow => f.write_str("order quantity out of range"),
        }
    }
}

/// Outcome of an order path after guards.
#[derive(Debug, Clone, PartialEq)]
pub enum Dispatch {
    Live(OptionsOrderRequest),
    Paper(OptionsOrderRequest),
    Close(ClosePositionRequest),
    /// Panic while in paper mode: nothing is sent or recorded.
    CloseSuppressed,
    Blocked(BlockReason),
}

#[derive(Debug, Clone)]
pub struct Dispatcher {
    strategy_tag: String,
}

impl Dispatcher {
    #[must_use]
    pub fn new(strategy_tag: impl Into<String>) -> Self {
        Self {
            strategy_tag: strategy_tag.into(),
        }
    }

    #[must_use]
    pub fn strategy_tag(&self) -> &str {
        &self.strategy_tag
    }

    /// Click path: armed plus a strike for this leg.
    #[must_use]
    pub fn click(
        &self,
        toggles: Toggles,
        selection: &Selection,
        action: Action,
        leg: OptionType,
    ) -> Dispatch {
        if !toggles.armed {
            debug!(%action, %leg, "order ignored, hotkeys disarmed");
            return Dispatch::Blocked(BlockReason::Disarmed);
        }
        match self.build_order(selection, action, leg) {
            Ok(order) if toggles.paper => Dispatch::Paper(order),
            Ok(order) => Dispatch::Live(order),
            Err(reason) => {
                debug!(%action, %leg, %reason, "order ignored");
                Dispatch::Blocked(reason)
            }
        }
    }

    /// Keyboard path: armed plus both strikes, then one dispatch per intent.
    #[must_use]
    pub fn key(&self, toggles: Toggles, selection: &Selection, key: Key) -> Vec<Dispatch> {
        if !toggles.armed {
            debug!(?key, "key ignored, hotkeys disarmed");
            return vec![Dispatch::Blocked(BlockReason::Disarmed)];
        }
        if !selection.has_both_strikes() {
            debug!(?key, "key ignored, strikes not selected");
            return vec![Dispatch::Blocked(BlockReason::MissingStrikes)];
        }

        debug!(?key, "processing order key");
        Intent::for_key(key)
            .into_iter()
            .map(|intent| match intent {
                Intent::Order(action, leg) => self.click(toggles, selection, action, leg),
                Intent::Panic => self.panic(toggles),
            })
            .collect()
    }

    /// Panic button. Not gated by the armed toggle.
    #[must_use]
    pub fn panic(&self, toggles: Toggles) -> Dispatch {
        if toggles.paper {
            debug!("panic close suppressed in paper mode");
            return Dispatch::CloseSuppressed;
        }
        Dispatch::Close(ClosePositionRequest {
            strategy: self.strategy_tag.clone(),
        })
    }

    fn build_order(
        &self,
        selection: &Selection,
        action: Action,
        leg: OptionType,
    ) -> Result<OptionsOrderRequest, BlockReason> {
        let strike = selection.strike(leg).ok_or(BlockReason::MissingStrike(leg))?;
        let expiry = selection.expiry.clone().ok_or(BlockReason::MissingExpiry)?;
        let quantity = selection.quantity().ok_or(BlockReason::QuantityOverflow)?;

        Ok(OptionsOrderRequest {
            strategy: self.strategy_tag.clone(),
            underlying: selection.symbol,
            exchange: selection.exchange,
            expiry_date: expiry,
            strike_price: strike,
            option_type: leg,
            action,
            quantity,
            pricetype: PriceType::Market,
            product: selection.product,
            splitsize: 0,
        })
    }
}
