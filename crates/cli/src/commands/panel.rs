use clap::Args;
use oneclick_core::DEFAULT_CONFIG_PATH;

/// Arguments for the panel command.
#[derive(Args, Debug, Clone)]
pub struct PanelArgs {
    /// Config file path
    #[arg(short, long, default_value = DEFAULT_CONFIG_PATH)]
    pub config: String,

    /// Optional log file path (logs to file instead of staying silent)
    #[arg(long)]
    pub log_file: Option<String>,

    /// Start with paper trading enabled
    #[arg(long)]
    pub paper: bool,
}
