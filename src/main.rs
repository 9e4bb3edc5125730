pub mod api;
pub mod app;
pub mod chat;
pub mod cli;
pub mod config;
pub mod directory;
pub mod event;
pub mod form;
pub mod headless;
pub mod logging;
pub mod tui;
pub mod ui;

use std::env;
use std::io;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;
use crossterm::event::{Event as CrosstermEvent, EventStream};
use futures_util::StreamExt;
use log::info;

use api::{AgentApi, HttpAgentApi};
use app::App;
use cli::{Cli, Command};
use config::ConsoleSettings;
use event::Event;
use headless::Headless;
use tui::Tui;
use ui::render;

const TICK_RATE: Duration = Duration::from_millis(250);

#[tokio::main]
async fn main() -> Result<()> {
    let command = Cli::parse().into_command();
    let workspace_root = env::current_dir().context("failed to resolve working directory")?;

    match command {
        Command::Init => {
            logging::init_stderr_logging();
            headless::init_config(&workspace_root, &mut io::stdout())
        }
        Command::Tui => run_console(workspace_root).await,
        command => {
            logging::init_stderr_logging();
            let settings = ConsoleSettings::load(&workspace_root)?;
            let api = connect(&settings)?;
            let stdout = io::stdout();
            let mut out = stdout.lock();
            Headless::new(api, settings.form_options(), &mut out)
                .run(command)
                .await
        }
    }
}

fn connect(settings: &ConsoleSettings) -> Result<Arc<dyn AgentApi>> {
    let api = HttpAgentApi::new(settings).context("failed to build HTTP client")?;
    Ok(Arc::new(api))
}

async fn run_console(workspace_root: PathBuf) -> Result<()> {
    let log_target = logging::init_file_logging(&workspace_root)?;
    let settings = ConsoleSettings::load(&workspace_root)?;
    info!(
        "starting console against {} (logging to {})",
        settings.base_url,
        log_target.display()
    );
    let api = connect(&settings)?;
    let mut app = App::new(workspace_root, &settings, api);

    let mut tui = tui::init().context("failed to initialise terminal")?;
    let result = run_loop(&mut tui, &mut app).await;
    tui::restore().context("failed to restore terminal")?;
    result
}

async fn run_loop(tui: &mut Tui, app: &mut App) -> Result<()> {
    let mut stream = EventStream::new();
    let mut interval = tokio::time::interval(TICK_RATE);

    while !app.should_quit {
        tui.draw(|frame| render(frame, app))?;

        // Queued work runs after the frame so its status line is visible.
        if app.has_pending() {
            app.run_pending().await;
            continue;
        }

        let event = tokio::select! {
            _ = interval.tick() => Event::Tick,
            maybe_event = stream.next() => {
                match maybe_event {
                    Some(Ok(CrosstermEvent::Key(key))) => Event::Key(key),
                    Some(Ok(CrosstermEvent::Resize(_, _))) => Event::Resize,
                    Some(Ok(_)) => continue,
                    Some(Err(_)) | None => break,
                }
            }
        };

        match event {
            Event::Tick => app.on_tick(),
            Event::Key(key) => app.handle_key(key),
            Event::Resize => {}
        }
    }

    Ok(())
}
