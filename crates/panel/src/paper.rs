//! Paper trading fill simulation.
//!
//! Paper orders never leave the process. The fill is marked at the leg's
//! last traded price when a quote has been loaded.

use chrono::{DateTime, Utc};
use oneclick_core::types::{OptionsOrderRequest, PaperFill};
use rust_decimal::Decimal;
use tracing::info;

/// Simulates a fill for a paper order.
#[must_use]
pub fn simulate_fill(
    order: OptionsOrderRequest,
    fill_price: Option<Decimal>,
    now: DateTime<Utc>,
) -> PaperFill {
    let fill = PaperFill {
        fill_id: format!("PAPER-{}", now.timestamp_millis()),
        order,
        fill_price,
        filled_at: now,
    };

    info!(
        fill_id = %fill.fill_id,
        order = %fill.order.describe(),
        price = ?fill.fill_price,
        "Paper fill simulated"
    );

    fill
}
