//! CLI commands for the one-click options tool.

pub mod chain;
pub mod panel;
pub mod positions;

pub use chain::{run_chain, ChainArgs};
pub use panel::PanelArgs;
pub use positions::{run_positions, PositionsArgs};

use anyhow::{Context, Result};
use oneclick_core::{AppConfig, ConfigLoader};

/// Loads layered configuration from `path`.
pub(crate) fn load_config(path: &str) -> Result<AppConfig> {
    let config = ConfigLoader::load_from(path)
        .with_context(|| format!("could not load configuration ({path})"))?;
    tracing::debug!(gateway = %config.gateway.base_url, "using gateway");
    Ok(config)
}
