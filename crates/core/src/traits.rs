use async_trait::async_trait;

use crate::error::Result;
use crate::types::{
    ChainRequest, ClosePositionRequest, OptionChain, OptionQuote, OptionsOrderRequest, OrderAck,
    PositionBook,
};

/// Broker gateway operations the panel depends on.
///
/// Implemented over HTTP by `oneclick-gateway`; tests substitute an
/// in-memory recorder.
#[async_trait]
pub trait TradingApi: Send + Sync {
    async fn option_chain(&self, request: &ChainRequest) -> Result<OptionChain>;

    /// Quote for a contract identifier such as `NIFTY28FEB2622500CE`.
    async fn quote(&self, contract: &str) -> Result<OptionQuote>;

    async fn position_book(&self) -> Result<PositionBook>;

    async fn place_options_order(&self, order: &OptionsOrderRequest) -> Result<OrderAck>;

    async fn close_positions(&self, request: &ClosePositionRequest) -> Result<OrderAck>;
}
