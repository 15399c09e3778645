use serde::{Deserialize, Serialize};

use crate::error::ApiError;
use crate::instruments::{is_lot_choice, Exchange, Product, Underlying, LOT_CHOICES};

/// Default broker gateway base URL.
pub const DEFAULT_GATEWAY_URL: &str = "http://127.0.0.1:5000";

/// Strategy tag attached to every order and close-all request.
pub const DEFAULT_STRATEGY_TAG: &str = "OneClickTool";

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub gateway: GatewayConfig,
    #[serde(default)]
    pub panel: PanelConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GatewayConfig {
    pub base_url: String,
    pub timeout_secs: u64,
    pub requests_per_second: u32,
    /// Exchange sent with every quote request.
    pub quote_exchange: String,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_GATEWAY_URL.to_string(),
            timeout_secs: 10,
            requests_per_second: 10,
            quote_exchange: "NFO".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PanelConfig {
    pub strategy_tag: String,
    pub position_poll_ms: u64,
    /// Delay before the quote fetches that follow an ATM reselection.
    pub quote_delay_ms: u64,
    pub exchange: Exchange,
    pub symbol: Underlying,
    pub expiry: Option<String>,
    pub lots: u32,
    pub product: Product,
    pub activity_log_len: usize,
}

impl Default for PanelConfig {
    fn default() -> Self {
        Self {
            strategy_tag: DEFAULT_STRATEGY_TAG.to_string(),
            position_poll_ms: 2000,
            quote_delay_ms: 100,
            exchange: Exchange::NseIndex,
            symbol: Underlying::Nifty,
            expiry: None,
            lots: 1,
            product: Product::Nrml,
            activity_log_len: 50,
        }
    }
}

impl AppConfig {
    /// Rejects settings the panel cannot run with.
    ///
    /// # Errors
    ///
    /// Returns a configuration error naming the first offending setting.
    pub fn validate(&self) -> Result<(), ApiError> {
        if self.gateway.base_url.trim().is_empty() {
            return Err(ApiError::Configuration("gateway.base_url is empty".to_string()));
        }
        if self.gateway.requests_per_second == 0 {
            return Err(ApiError::Configuration(
                "gateway.requests_per_second must be positive".to_string(),
            ));
        }
        if self.panel.position_poll_ms == 0 {
            return Err(ApiError::Configuration(
                "panel.position_poll_ms must be positive".to_string(),
            ));
        }
        if !is_lot_choice(self.panel.lots) {
            return Err(ApiError::Configuration(format!(
                "panel.lots must be one of {LOT_CHOICES:?}, got {}",
                self.panel.lots
            )));
        }
        if self.panel.strategy_tag.trim().is_empty() {
            return Err(ApiError::Configuration("panel.strategy_tag is empty".to_string()));
        }
        if !self.panel.exchange.lists(self.panel.symbol) {
            return Err(ApiError::Configuration(format!(
                "panel.symbol {} is not listed on {}",
                self.panel.symbol, self.panel.exchange
            )));
        }
        Ok(())
    }
}
