//! Broker gateway REST client with rate limiting.
//!
//! Every endpoint is a JSON `POST` relative to the configured base URL.
//! Requests wait on a `governor` limiter before they are sent, so a burst of
//! key presses is delayed rather than dropped.
//!
//! # Example
//!
//! ```ignore
//! use oneclick_gateway::{GatewayClient, GatewayClientConfig};
//! use oneclick_core::{ChainRequest, Exchange, TradingApi, Underlying};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let client = GatewayClient::new(GatewayClientConfig::default())?;
//!
//!     let chain = client
//!         .option_chain(&ChainRequest::expiries(Underlying::Nifty, Exchange::NseIndex))
//!         .await?;
//!     println!("expiries: {:?}", chain.expiries());
//!
//!     Ok(())
//! }
//! ```

use std::num::NonZeroU32;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use governor::{Quota, RateLimiter};
use nonzero_ext::nonzero;
use oneclick_core::config::GatewayConfig;
use oneclick_core::error::{ApiError, Result};
use oneclick_core::traits::TradingApi;
use oneclick_core::types::{
    ChainRequest, ClosePositionRequest, OptionChain, OptionQuote, OptionsOrderRequest, OrderAck,
    PositionBook, QuoteRequest,
};
use oneclick_core::DEFAULT_GATEWAY_URL;
use reqwest::header::CONTENT_TYPE;
use reqwest::Client;
use serde::Serialize;
use serde_json::Value;

use crate::wire;

// =============================================================================
// Constants
// =============================================================================

pub const OPTION_CHAIN_PATH: &str = "/api/optionchain";
pub const QUOTES_PATH: &str = "/api/quotes";
pub const POSITION_BOOK_PATH: &str = "/api/positionbook";
pub const OPTIONS_ORDER_PATH: &str = "/api/optionsorder";
pub const CLOSE_POSITION_PATH: &str = "/api/closeposition";

/// Exchange the gateway expects on quote requests for index options.
pub const DEFAULT_QUOTE_EXCHANGE: &str = "NFO";

// =============================================================================
// Configuration
// =============================================================================

/// Configuration for the gateway client.
#[derive(Debug, Clone)]
pub struct GatewayClientConfig {
    /// Base URL, without a trailing slash.
    pub base_url: String,

    /// Request timeout in seconds.
    pub timeout_secs: u64,

    /// Requests per second limit.
    pub requests_per_second: NonZeroU32,

    /// Exchange sent with every quote request.
    pub quote_exchange: String,
}

impl Default for GatewayClientConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_GATEWAY_URL.to_string(),
            timeout_secs: 10,
            requests_per_second: nonzero!(10u32),
            quote_exchange: DEFAULT_QUOTE_EXCHANGE.to_string(),
        }
    }
}

impl GatewayClientConfig {
    /// Sets the base URL. A trailing slash is dropped.
    #[must_use]
    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into().trim_end_matches('/').to_string();
        self
    }

    /// Sets the request timeout.
    #[must_use]
    pub fn with_timeout_secs(mut self, secs: u64) -> Self {
        self.timeout_secs = secs;
        self
    }

    /// Sets the rate limit.
    #[must_use]
    pub fn with_rate_limit(mut self, requests_per_second: NonZeroU32) -> Self {
        self.requests_per_second = requests_per_second;
        self
    }

    #[must_use]
    pub fn with_quote_exchange(mut self, exchange: impl Into<String>) -> Self {
        self.quote_exchange = exchange.into();
        self
    }
}

impl TryFrom<&GatewayConfig> for GatewayClientConfig {
    type Error = ApiError;

    fn try_from(config: &GatewayConfig) -> Result<Self> {
        let requests_per_second = NonZeroU32::new(config.requests_per_second).ok_or_else(|| {
            ApiError::Configuration("gateway.requests_per_second must be positive".to_string())
        })?;

        Ok(Self::default()
            .with_base_url(config.base_url.clone())
            .with_timeout_secs(config.timeout_secs)
            .with_rate_limit(requests_per_second)
            .with_quote_exchange(config.quote_exchange.clone()))
    }
}

// =============================================================================
// Client
// =============================================================================

type DirectLimiter = RateLimiter<
    governor::state::NotKeyed,
    governor::state::InMemoryState,
    governor::clock::DefaultClock,
>;

/// HTTP client for the broker gateway.
#[derive(Clone)]
pub struct GatewayClient {
    config: GatewayClientConfig,
    http: Client,
    rate_limiter: Arc<DirectLimiter>,
}

impl std::fmt::Debug for GatewayClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GatewayClient")
            .field("base_url", &self.config.base_url)
            .field("requests_per_second", &self.config.requests_per_second)
            .finish_non_exhaustive()
    }
}

impl GatewayClient {
    /// Creates a new client with the given configuration.
    ///
    /// # Errors
    /// Returns error if the HTTP client cannot be built.
    pub fn new(config: GatewayClientConfig) -> Result<Self> {
        let http = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| ApiError::Network(format!("failed to build HTTP client: {e}")))?;

        let quota = Quota::per_second(config.requests_per_second);
        let rate_limiter = Arc::new(RateLimiter::direct(quota));

        Ok(Self {
            config,
            http,
            rate_limiter,
        })
    }

    /// Creates a client from the `[gateway]` configuration section.
    ///
    /// # Errors
    /// Returns error if the section is invalid or the HTTP client cannot be built.
    pub fn from_config(config: &GatewayConfig) -> Result<Self> {
        Self::new(GatewayClientConfig::try_from(config)?)
    }

    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.config.base_url
    }

    /// Waits for the rate limiter and POSTs a JSON body.
    async fn post_json<B: Serialize + ?Sized>(&self, path: &str, body: &B) -> Result<Value> {
        self.rate_limiter.until_ready().await;

        let url = format!("{}{}", self.config.base_url, path);
        let body_json = serde_json::to_vec(body)?;

        tracing::debug!(url = %url, body_len = body_json.len(), "POST");

        let response = self
            .http
            .post(&url)
            .header("Accept", "application/json")
            .header(CONTENT_TYPE, "application/json")
            .body(body_json)
            .send()
            .await
            .map_err(map_transport_error)?;

        handle_response(response).await
    }
}

/// Checks status and content type, then parses the body as JSON.
async fn handle_response(response: reqwest::Response) -> Result<Value> {
    let status = response.status();

    if !status.is_success() {
        let text = response.text().await.unwrap_or_default();
        return Err(ApiError::api(status.as_u16(), text));
    }

    let content_type = response
        .headers()
        .get(CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default()
        .to_string();
    if !content_type.to_ascii_lowercase().contains("json") {
        return Err(ApiError::not_json(content_type));
    }

    let bytes = response.bytes().await.map_err(map_transport_error)?;
    serde_json::from_slice(&bytes).map_err(|e| ApiError::malformed(format!("invalid JSON: {e}")))
}

fn map_transport_error(err: reqwest::Error) -> ApiError {
    if err.is_timeout() {
        ApiError::Timeout(err.to_string())
    } else {
        ApiError::Network(err.to_string())
    }
}

// =============================================================================
// Endpoints
// =============================================================================

#[async_trait]
impl TradingApi for GatewayClient {
    async fn option_chain(&self, request: &ChainRequest) -> Result<OptionChain> {
        let value = self.post_json(OPTION_CHAIN_PATH, request).await?;
        wire::parse_chain(value)
    }

    async fn quote(&self, contract: &str) -> Result<OptionQuote> {
        let request = QuoteRequest {
            symbol: contract.to_string(),
            exchange: self.config.quote_exchange.clone(),
        };
        let value = self.post_json(QUOTES_PATH, &request).await?;
        wire::parse_quote(value)
    }

    async fn position_book(&self) -> Result<PositionBook> {
        let value = self
            .post_json(POSITION_BOOK_PATH, &serde_json::json!({}))
            .await?;
        wire::parse_positions(value)
    }

    async fn place_options_order(&self, order: &OptionsOrderRequest) -> Result<OrderAck> {
        if order.quantity == 0 {
            return Err(ApiError::InvalidRequest("order quantity is zero".to_string()));
        }
        let value = self.post_json(OPTIONS_ORDER_PATH, order).await?;
        wire::parse_ack(value)
    }

    async fn close_positions(&self, request: &ClosePositionRequest) -> Result<OrderAck> {
        let value = self.post_json(CLOSE_POSITION_PATH, request).await?;
        wire::parse_ack(value)
    }
}
