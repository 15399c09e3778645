//! Positions CLI command.
//!
//! Fetches the position book once. As in the panel, an unauthenticated or
//! failed fetch is reported as an empty book.

use anyhow::Result;
use clap::Args;
use oneclick_core::{PositionBook, TradingApi, DEFAULT_CONFIG_PATH};
use oneclick_gateway::GatewayClient;

/// Arguments for the positions command.
#[derive(Args, Debug, Clone)]
pub struct PositionsArgs {
    /// Print the book as JSON
    #[arg(long)]
    pub json: bool,

    /// Config file path
    #[arg(short, long, default_value = DEFAULT_CONFIG_PATH)]
    pub config: String,
}

/// Runs the positions command.
///
/// # Errors
/// Returns an error if configuration cannot be loaded.
pub async fn run_positions(args: PositionsArgs) -> Result<()> {
    let config = super::load_config(&args.config)?;
    let client = GatewayClient::from_config(&config.gateway)?;

    let book = match client.position_book().await {
        Ok(book) => book,
        Err(e) => {
            tracing::warn!(error = %e, "position book unavailable, showing no positions");
            PositionBook::default()
        }
    };

    if args.json {
        println!("{}", serde_json::to_string_pretty(&book)?);
    } else {
        print!("{}", render(&book));
    }
    Ok(())
}

fn render(book: &PositionBook) -> String {
    let mut out = String::new();
    if book.is_empty() {
        out.push_str("No open positions\n");
    } else {
        out.push_str(&format!(
            "{:<28} {:>5} {:>8} {:>10} {:>10} {:>12}\n",
            "SYMBOL", "SIDE", "QTY", "AVG", "LTP", "MTM"
        ));
        for p in &book.positions {
            out.push_str(&format!(
                "{:<28} {:>5} {:>8} {:>10.2} {:>10.2} {:>12.2}\n",
                p.symbol,
                p.side().label(),
                p.display_quantity(),
                p.average_price,
                p.ltp,
                p.mtm
            ));
        }
    }
    out.push_str(&format!("Total MTM: {:.2}\n", book.total_mtm()));
    out
}
