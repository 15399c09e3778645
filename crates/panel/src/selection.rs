//! Instrument selection and the market lists it is validated against.
//!
//! The selection is the tuple the user trades: exchange, underlying, expiry,
//! one strike per leg, lot count and product. Expiry and strike lists come
//! from option chain fetches; the ATM rule always reselects both legs when a
//! new strike list arrives.

use oneclick_core::config::PanelConfig;
use oneclick_core::error::ApiError;
use oneclick_core::instruments::{is_lot_choice, Exchange, OptionType, Product, Underlying};
use oneclick_core::types::{contract_symbol, ChainRequest, OptionChain, OptionQuote};
use rust_decimal::Decimal;
use tracing::{debug, info};

/// Index of the ATM strike in an ascending list of `count` strikes.
#[must_use]
pub fn atm_index(count: usize) -> Option<usize> {
    (count > 0).then_some(count / 2)
}

/// Middle strike of an ascending strike list.
#[must_use]
pub fn atm_strike(strikes: &[Decimal]) -> Option<Decimal> {
    atm_index(strikes.len()).map(|i| strikes[i])
}

/// Steps to the neighbour of `current` in `items`, wrapping at both ends.
/// With no current value (or one not in the list) the first item is chosen.
#[must_use]
pub fn cycle<T: PartialEq + Clone>(items: &[T], current: Option<&T>, forward: bool) -> Option<T> {
    if items.is_empty() {
        return None;
    }
    let len = items.len();
    let next = match current.and_then(|c| items.iter().position(|item| item == c)) {
        Some(i) if forward => (i + 1) % len,
        Some(i) => (i + len - 1) % len,
        None => 0,
    };
    Some(items[next].clone())
}

// =============================================================================
// Selection
// =============================================================================

#[derive(Debug, Clone, PartialEq)]
pub struct Selection {
    pub exchange: Exchange,
    pub symbol: Underlying,
    pub expiry: Option<String>,
    pub ce_strike: Option<Decimal>,
    pub pe_strike: Option<Decimal>,
    pub lots: u32,
    pub product: Product,
}

impl Default for Selection {
    fn default() -> Self {
        Self::from_config(&PanelConfig::default())
    }
}

impl Selection {
    #[must_use]
    pub fn from_config(config: &PanelConfig) -> Self {
        let symbol = if config.exchange.lists(config.symbol) {
            config.symbol
        } else {
            config.exchange.default_symbol()
        };
        Self {
            exchange: config.exchange,
            symbol,
            expiry: config.expiry.clone().filter(|e| !e.is_empty()),
            ce_strike: None,
            pe_strike: None,
            lots: if is_lot_choice(config.lots) { config.lots } else { 1 },
            product: config.product,
        }
    }

    #[must_use]
    pub fn strike(&self, leg: OptionType) -> Option<Decimal> {
        match leg {
            OptionType::Call => self.ce_strike,
            OptionType::Put => self.pe_strike,
        }
    }

    fn strike_mut(&mut self, leg: OptionType) -> &mut Option<Decimal> {
        match leg {
            OptionType::Call => &mut self.ce_strike,
            OptionType::Put => &mut self.pe_strike,
        }
    }

    #[must_use]
    pub fn has_both_strikes(&self) -> bool {
        self.ce_strike.is_some() && self.pe_strike.is_some()
    }

    /// Order quantity: lots times the underlying's lot size. `None` when the
    /// product overflows.
    #[must_use]
    pub fn quantity(&self) -> Option<u32> {
        self.symbol.quantity(self.lots)
    }

    /// Contract identifier for a leg, once expiry and strike are known.
    #[must_use]
    pub fn contract(&self, leg: OptionType) -> Option<String> {
        let expiry = self.expiry.as_deref()?;
        let strike = self.strike(leg)?;
        Some(contract_symbol(self.symbol, expiry, strike, leg))
    }

    #[must_use]
    pub fn expiry_request(&self) -> ChainRequest {
        ChainRequest::expiries(self.symbol, self.exchange)
    }

    /// Strike-list request; `None` while no expiry is selected.
    #[must_use]
    pub fn chain_request(&self) -> Option<ChainRequest> {
        self.expiry
            .as_deref()
            .map(|expiry| ChainRequest::strikes(self.symbol, expiry, self.exchange))
    }

    /// Switches exchange, falling back to the exchange's first symbol when
    /// the current one is not listed there. Returns true if anything changed.
    pub fn set_exchange(&mut self, exchange: Exchange) -> bool {
        if exchange == self.exchange {
            return false;
        }
        self.exchange = exchange;
        if !exchange.lists(self.symbol) {
            let fallback = exchange.default_symbol();
            debug!(from = %self.symbol, to = %fallback, "symbol not listed on exchange, falling back");
            self.symbol = fallback;
        }
        true
    }

    /// Switches underlying within the current exchange.
    ///
    /// # Errors
    /// Returns `InvalidRequest` if the symbol is not listed on the exchange.
    pub fn set_symbol(&mut self, symbol: Underlying) -> Result<bool, ApiError> {
        if !self.exchange.lists(symbol) {
            return Err(ApiError::InvalidRequest(format!(
                "{symbol} is not listed on {}",
                self.exchange
            )));
        }
        let changed = symbol != self.symbol;
        self.symbol = symbol;
        Ok(changed)
    }

    pub fn set_expiry(&mut self, expiry: String) -> bool {
        let expiry = Some(expiry).filter(|e| !e.is_empty());
        if expiry == self.expiry {
            return false;
        }
        self.expiry = expiry;
        true
    }

    /// Sets one leg's strike. Only members of `strikes` are accepted.
    ///
    /// # Errors
    /// Returns `InvalidRequest` if the strike is not in the current list.
    pub fn set_strike(
        &mut self,
        leg: OptionType,
        strike: Decimal,
        strikes: &[Decimal],
    ) -> Result<bool, ApiError> {
        let strike = strike.normalize();
        if !strikes.contains(&strike) {
            return Err(ApiError::InvalidRequest(format!(
                "strike {strike} is not in the current {leg} strike list"
            )));
        }
        let slot = self.strike_mut(leg);
        let changed = *slot != Some(strike);
        *slot = Some(strike);
        Ok(changed)
    }
}

// =============================================================================
// Market view
// =============================================================================

/// Lists and snapshots fetched for the current selection.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MarketView {
    pub expiries: Vec<String>,
    pub strikes: Vec<Decimal>,
    pub spot: Option<Decimal>,
    pub ce_quote: Option<OptionQuote>,
    pub pe_quote: Option<OptionQuote>,
}

impl MarketView {
    #[must_use]
    pub fn quote(&self, leg: OptionType) -> Option<&OptionQuote> {
        match leg {
            OptionType::Call => self.ce_quote.as_ref(),
            OptionType::Put => self.pe_quote.as_ref(),
        }
    }

    pub fn set_quote(&mut self, leg: OptionType, quote: OptionQuote) {
        match leg {
            OptionType::Call => self.ce_quote = Some(quote),
            OptionType::Put => self.pe_quote = Some(quote),
        }
    }

    /// Last traded price of a leg, if quoted.
    #[must_use]
    pub fn ltp(&self, leg: OptionType) -> Option<Decimal> {
        self.quote(leg).and_then(|q| q.ltp)
    }
}

/// Applies an expiry-list response. Returns true if the selected expiry was
/// replaced (the first listed expiry is chosen when the current one is
/// missing from a non-empty list).
pub fn apply_expiries(selection: &mut Selection, view: &mut MarketView, chain: &OptionChain) -> bool {
    view.expiries = chain.expiries();

    let Some(first) = view.expiries.first() else {
        debug!(symbol = %selection.symbol, "no expiries in option chain");
        return false;
    };

    let current_listed = selection
        .expiry
        .as_ref()
        .is_some_and(|e| view.expiries.contains(e));
    if current_listed {
        return false;
    }

    info!(symbol = %selection.symbol, expiry = %first, "selecting first listed expiry");
    selection.expiry = Some(first.clone());
    true
}

/// Applies a strike-list response and reselects ATM on both legs. Returns
/// the ATM strike, or `None` when the chain carried no strikes.
pub fn apply_strikes(
    selection: &mut Selection,
    view: &mut MarketView,
    chain: &OptionChain,
) -> Option<Decimal> {
    view.strikes = chain.strikes();
    if let Some(spot) = chain.spot_price() {
        view.spot = Some(spot);
    }

    let Some(atm) = atm_strike(&view.strikes) else {
        debug!(symbol = %selection.symbol, "no strikes in option chain");
        return None;
    };

    info!(
        symbol = %selection.symbol,
        expiry = selection.expiry.as_deref().unwrap_or_default(),
        strikes = view.strikes.len(),
        atm = %atm,
        "selecting ATM strike for both legs"
    );
    selection.ce_strike = Some(atm);
    selection.pe_strike = Some(atm);
    Some(atm)
}

/// Clears the strike list after a malformed chain response. The selection
/// itself is left as it was.
pub fn clear_strikes(view: &mut MarketView) {
    view.strikes.clear();
}

#[cfg(test)]
mod tests {
    use super::*;
    use oneclick_core::types::ChainRow;
    use rust_decimal_macros::dec;

    fn chain(expiry: &str, strikes: &[Decimal], spot: Decimal) -> OptionChain {
        OptionChain::new(
            strikes
                .iter()
                .map(|s| ChainRow {
                    expiry_date: Some(expiry.to_string()),
                    strike_price: Some(*s),
                    spot_price: Some(spot),
                })
                .collect(),
        )
    }

    fn expiry_chain(expiries: &[&str]) -> OptionChain {
        OptionChain::new(
            expiries
                .iter()
                .map(|e| ChainRow {
                    expiry_date: Some((*e).to_string()),
                    ..ChainRow::default()
                })
                .collect(),
        )
    }

    // ==================== ATM Tests ====================

    #[test]
    fn test_atm_index_is_floor_half() {
        assert_eq!(atm_index(0), None);
        assert_eq!(atm_index(1), Some(0));
        assert_eq!(atm_index(2), Some(1));
        assert_eq!(atm_index(5), Some(2));
        assert_eq!(atm_index(6), Some(3));
    }

    #[test]
    fn test_apply_strikes_selects_middle_for_both_legs() {
        let mut selection = Selection {
            expiry: Some("28FEB26".to_string()),
            ..Selection::default()
        };
        let mut view = MarketView::default();
        let strikes = [dec!(100), dec!(200), dec!(300), dec!(400), dec!(500)];

        let atm = apply_strikes(&mut selection, &mut view, &chain("28FEB26", &strikes, dec!(305.5)));

        assert_eq!(atm, Some(dec!(300)));
        assert_eq!(selection.ce_strike, Some(dec!(300)));
        assert_eq!(selection.pe_strike, Some(dec!(300)));
        assert_eq!(view.spot, Some(dec!(305.5)));
    }

    #[test]
    fn test_apply_strikes_overwrites_manual_choice() {
        let mut selection = Selection {
            expiry: Some("28FEB26".to_string()),
            ce_strike: Some(dec!(100)),
            pe_strike: Some(dec!(500)),
            ..Selection::default()
        };
        let mut view = MarketView::default();
        let strikes = [dec!(100), dec!(200), dec!(300), dec!(400)];

        apply_strikes(&mut selection, &mut view, &chain("28FEB26", &strikes, dec!(0)));

        assert_eq!(selection.ce_strike, Some(dec!(300)));
        assert_eq!(selection.pe_strike, Some(dec!(300)));
    }

    #[test]
    fn test_apply_strikes_empty_keeps_selection_and_spot() {
        let mut selection = Selection {
            ce_strike: Some(dec!(22500)),
            pe_strike: Some(dec!(22500)),
            ..Selection::default()
        };
        let mut view = MarketView {
            spot: Some(dec!(22480)),
            ..MarketView::default()
        };

        assert_eq!(apply_strikes(&mut selection, &mut view, &OptionChain::default()), None);
        assert_eq!(selection.ce_strike, Some(dec!(22500)));
        assert_eq!(view.spot, Some(dec!(22480)));
        assert!(view.strikes.is_empty());
    }

    // ==================== Expiry Tests ====================

    #[test]
    fn test_apply_expiries_picks_first_when_current_missing() {
        let mut selection = Selection {
            expiry: Some("28FEB26".to_string()),
            ..Selection::default()
        };
        let mut view = MarketView::default();

        let changed = apply_expiries(&mut selection, &mut view, &expiry_chain(&["27MAR26", "06MAR26"]));

        assert!(changed);
        assert_eq!(view.expiries, vec!["06MAR26", "27MAR26"]);
        assert_eq!(selection.expiry.as_deref(), Some("06MAR26"));
    }

    #[test]
    fn test_apply_expiries_keeps_listed_current() {
        let mut selection = Selection {
            expiry: Some("27MAR26".to_string()),
            ..Selection::default()
        };
        let mut view = MarketView::default();

        let changed = apply_expiries(&mut selection, &mut view, &expiry_chain(&["06MAR26", "27MAR26"]));

        assert!(!changed);
        assert_eq!(selection.expiry.as_deref(), Some("27MAR26"));
    }

    #[test]
    fn test_apply_expiries_empty_list_keeps_current() {
        let mut selection = Selection {
            expiry: Some("28FEB26".to_string()),
            ..Selection::default()
        };
        let mut view = MarketView::default();

        assert!(!apply_expiries(&mut selection, &mut view, &OptionChain::default()));
        assert_eq!(selection.expiry.as_deref(), Some("28FEB26"));
    }

    // ==================== Exchange / Symbol Tests ====================

    #[test]
    fn test_set_exchange_falls_back_to_first_symbol() {
        let mut selection = Selection::default();
        selection.set_symbol(Underlying::MidcpNifty).unwrap();

        assert!(selection.set_exchange(Exchange::BseIndex));
        assert_eq!(selection.symbol, Underlying::Sensex);

        selection.set_symbol(Underlying::Bankex).unwrap();
        assert!(selection.set_exchange(Exchange::NseIndex));
        assert_eq!(selection.symbol, Underlying::Nifty);
    }

    #[test]
    fn test_symbol_always_in_exchange_set() {
        let mut selection = Selection::default();
        for exchange in [Exchange::BseIndex, Exchange::NseIndex, Exchange::BseIndex] {
            selection.set_exchange(exchange);
            assert!(exchange.symbols().contains(&selection.symbol));
        }
    }

    #[test]
    fn test_set_same_exchange_is_noop() {
        let mut selection = Selection::default();
        assert!(!selection.set_exchange(Exchange::NseIndex));
    }

    #[test]
    fn test_set_symbol_rejects_unlisted() {
        let mut selection = Selection::default();
        assert!(selection.set_symbol(Underlying::Sensex).is_err());
        assert_eq!(selection.symbol, Underlying::Nifty);
    }

    // ==================== Strike Tests ====================

    #[test]
    fn test_set_strike_requires_listed_strike() {
        let mut selection = Selection::default();
        let strikes = [dec!(22400), dec!(22500)];

        assert!(selection.set_strike(OptionType::Put, dec!(22450), &strikes).is_err());
        assert!(selection.set_strike(OptionType::Put, dec!(22400.00), &strikes).unwrap());
        assert_eq!(selection.pe_strike, Some(dec!(22400)));
        assert!(!selection.set_strike(OptionType::Put, dec!(22400), &strikes).unwrap());
        assert_eq!(selection.ce_strike, None);
    }

    #[test]
    fn test_contract_needs_expiry_and_strike() {
        let mut selection = Selection::default();
        assert_eq!(selection.contract(OptionType::Call), None);

        selection.expiry = Some("28FEB26".to_string());
        selection.ce_strike = Some(dec!(22500));
        assert_eq!(
            selection.contract(OptionType::Call).as_deref(),
            Some("NIFTY28FEB2622500CE")
        );
        assert_eq!(selection.contract(OptionType::Put), None);
    }

    #[test]
    fn test_chain_request_skipped_without_expiry() {
        let mut selection = Selection::default();
        assert!(selection.chain_request().is_none());
        selection.set_expiry("28FEB26".to_string());
        assert!(selection.chain_request().is_some());
        assert!(selection.set_expiry(String::new()));
        assert!(selection.chain_request().is_none());
    }

    #[test]
    fn test_quantity_tracks_symbol_and_lots() {
        let mut selection = Selection {
            lots: 3,
            ..Selection::default()
        };
        assert_eq!(selection.quantity(), Some(195));
        selection.set_symbol(Underlying::BankNifty).unwrap();
        assert_eq!(selection.quantity(), Some(90));

        selection.lots = u32::MAX;
        assert_eq!(selection.quantity(), None);
    }

    #[test]
    fn test_from_config_falls_back_to_one_lot() {
        let config = PanelConfig {
            lots: 70_000_000,
            ..PanelConfig::default()
        };
        assert_eq!(Selection::from_config(&config).lots, 1);
    }

    // ==================== Cycle Tests ====================

    #[test]
    fn test_cycle_wraps() {
        let items = [1, 2, 3];
        assert_eq!(cycle(&items, Some(&3), true), Some(1));
        assert_eq!(cycle(&items, Some(&1), false), Some(3));
        assert_eq!(cycle(&items, Some(&2), true), Some(3));
        assert_eq!(cycle(&items, None, true), Some(1));
        assert_eq!(cycle::<i32>(&[], None, true), None);
    }
}
