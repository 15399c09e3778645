//! Chain CLI command.
//!
//! Without an expiry, lists the expiries the gateway reports for an
//! underlying. With one, lists its strikes along with the spot price and the
//! strike the panel would pick as ATM.

use anyhow::{bail, Result};
use clap::Args;
use oneclick_core::{ChainRequest, Exchange, OptionChain, TradingApi, Underlying, DEFAULT_CONFIG_PATH};
use oneclick_gateway::GatewayClient;
use oneclick_panel::atm_strike;

/// Arguments for the chain command.
#[derive(Args, Debug, Clone)]
pub struct ChainArgs {
    /// Index underlying (e.g., "NIFTY", "SENSEX")
    #[arg(long)]
    pub symbol: String,

    /// Exchange segment (NSE_INDEX or BSE_INDEX). Defaults to the symbol's own.
    #[arg(long)]
    pub exchange: Option<String>,

    /// Expiry (e.g., "28FEB26"). If not provided, lists expiries.
    #[arg(long)]
    pub expiry: Option<String>,

    /// Print the raw chain rows as JSON
    #[arg(long)]
    pub json: bool,

    /// Config file path
    #[arg(short, long, default_value = DEFAULT_CONFIG_PATH)]
    pub config: String,
}

impl ChainArgs {
    fn request(&self) -> Result<ChainRequest> {
        let symbol: Underlying = self.symbol.parse()?;
        let exchange = match &self.exchange {
            Some(raw) => raw.parse::<Exchange>()?,
            None => symbol.exchange(),
        };
        if !exchange.lists(symbol) {
            bail!("{symbol} is not listed on {exchange}");
        }

        Ok(match self.expiry.as_deref().filter(|e| !e.is_empty()) {
            Some(expiry) => ChainRequest::strikes(symbol, expiry, exchange),
            None => ChainRequest::expiries(symbol, exchange),
        })
    }
}

/// Runs the chain command.
///
/// # Errors
/// Returns an error if arguments are invalid or the gateway call fails.
pub async fn run_chain(args: ChainArgs) -> Result<()> {
    let request = args.request()?;
    let config = super::load_config(&args.config)?;
    let client = GatewayClient::from_config(&config.gateway)?;

    tracing::info!(symbol = %request.symbol, exchange = %request.exchange, "fetching option chain");
    let chain = client.option_chain(&request).await?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&chain)?);
        return Ok(());
    }

    println!("{}", render(&request, &chain));
    Ok(())
}

fn render(request: &ChainRequest, chain: &OptionChain) -> String {
    let mut out = String::new();

    let Some(expiry) = &request.expiry_date else {
        let expiries = chain.expiries();
        out.push_str(&format!(
            "{} ({}): {} expiries\n",
            request.symbol,
            request.exchange.label(),
            expiries.len()
        ));
        for expiry in expiries {
            out.push_str(&format!("  {expiry}\n"));
        }
        return out;
    };

    let strikes = chain.strikes();
    out.push_str(&format!(
        "{} {} ({}): {} strikes\n",
        request.symbol,
        expiry,
        request.exchange.label(),
        strikes.len()
    ));
    out.push_str(&format!(
        "Spot: {}\n",
        chain
            .spot_price()
            .map_or_else(|| "N/A".to_string(), |s| s.to_string())
    ));
    out.push_str(&format!(
        "ATM:  {}\n",
        atm_strike(&strikes).map_or_else(|| "N/A".to_string(), |s| s.to_string())
    ));
    out.push_str(&format!("Lot size: {}\n", request.symbol.lot_size()));
    let listed: Vec<String> = strikes.iter().map(ToString::to_string).collect();
    out.push_str(&format!("Strikes: {}\n", listed.join(" ")));
    out
}
