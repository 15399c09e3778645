use clap::{Parser, Subcommand};

mod commands;
mod tui_panel;

use commands::{ChainArgs, PanelArgs, PositionsArgs};

#[derive(Parser)]
#[command(name = "oneclick")]
#[command(about = "One-click index options trading against a local broker gateway", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Interactive trading panel with hotkey order entry
    Panel(PanelArgs),
    /// Print expiries, or strikes and ATM for one expiry
    Chain(ChainArgs),
    /// Print the position book and total MTM once
    Positions(PositionsArgs),
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Initialize logging (disabled for the panel to prevent screen corruption, unless log_file is provided)
    match &cli.command {
        Commands::Panel(PanelArgs {
            log_file: Some(path),
            ..
        }) => {
            let file = std::fs::OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)?;
            tracing_subscriber::fmt()
                .with_env_filter(
                    tracing_subscriber::EnvFilter::try_from_default_env()
                        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
                )
                .with_ansi(false)
                .with_writer(std::sync::Mutex::new(file))
                .init();
        }
        Commands::Panel(_) => {
            // No logging for the panel (prevents screen corruption)
        }
        _ => {
            tracing_subscriber::fmt()
                .with_env_filter(
                    tracing_subscriber::EnvFilter::try_from_default_env()
                        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
                )
                .with_writer(std::io::stderr)
                .init();
        }
    }

    match cli.command {
        Commands::Panel(args) => tui_panel::run(args).await?,
        Commands::Chain(args) => commands::run_chain(args).await?,
        Commands::Positions(args) => commands::run_positions(args).await?,
    }

    Ok(())
}
