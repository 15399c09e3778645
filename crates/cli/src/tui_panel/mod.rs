mod app;
mod screens;

use std::io;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use crossterm::{
    event::{self, Event},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use oneclick_gateway::GatewayClient;
use oneclick_panel::{PanelEvent, PanelRuntime};
use ratatui::{
    backend::{Backend, CrosstermBackend},
    Terminal,
};

use crate::commands::PanelArgs;
use app::App;

const FRAME_INTERVAL: Duration = Duration::from_millis(100);

pub async fn run(args: PanelArgs) -> Result<()> {
    let config = crate::commands::load_config(&args.config)?;
    let client = Arc::new(GatewayClient::from_config(&config.gateway)?);

    let mut runtime = PanelRuntime::new(client, &config.panel);
    if args.paper {
        runtime.dispatch(PanelEvent::SetPaper(true));
    }
    runtime.start();

    // Setup terminal
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let mut app = App::default();
    let res = run_app(&mut terminal, &mut app, &mut runtime).await;

    runtime.shutdown();

    // Restore terminal
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    if let Err(err) = res {
        println!("Error: {err:?}");
    }

    Ok(())
}

async fn run_app<B: Backend>(
    terminal: &mut Terminal<B>,
    app: &mut App,
    runtime: &mut PanelRuntime<GatewayClient>,
) -> Result<()> {
    loop {
        runtime.drain();
        terminal.draw(|f| screens::render(f, app, runtime.state()))?;

        if event::poll(FRAME_INTERVAL)? {
            if let Event::Key(key) = event::read()? {
                if let Some(command) = App::command_for(&key) {
                    if let Some(event) = app.apply(command, runtime.state()) {
                        runtime.dispatch(event);
                    }
                }
            }
        } else {
            // Let spawned gateway calls make progress between frames.
            tokio::task::yield_now().await;
        }

        if app.should_quit {
            return Ok(());
        }
    }
}
