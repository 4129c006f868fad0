mod app;
mod binding;
mod cli;
mod command;
mod config;
mod logging;
mod models;
mod parser;
mod store;
mod system;
mod ui;

use std::time::Duration;

use anyhow::Result;
use crossterm::event::{self, Event, KeyEventKind};
use ratatui::DefaultTerminal;

use crate::app::App;
use crate::cli::CliCommand;
use crate::ui::render_app;

fn main() {
    // The picker still works without a log file.
    if let Err(err) = logging::init_logging() {
        eprintln!("merlin: logging disabled: {err:#}");
    }

    if let Err(err) = CliCommand::run_from_args() {
        tracing::error!("{err:#}");
        eprintln!("merlin error: {err:#}");
        std::process::exit(1);
    }
}

/// Runs the picker until the user quits. Returns text to print, if any.
pub(crate) fn run_popup(app: App) -> Result<Option<String>> {
    let terminal = ratatui::init();
    if let Err(err) = system::enable_mouse() {
        ratatui::restore();
        return Err(err);
    }

    let result = run_app(terminal, app);

    let mouse = system::disable_mouse();
    ratatui::restore();
    let output = result?;
    mouse?;
    Ok(output)
}

fn run_app(mut terminal: DefaultTerminal, mut app: App) -> Result<Option<String>> {
    let tick_rate = Duration::from_millis(100);
    loop {
        terminal.draw(|frame| render_app(frame, &mut app))?;

        if app.should_quit {
            break;
        }

        if event::poll(tick_rate)? {
            match event::read()? {
                Event::Key(key) => {
                    if key.kind == KeyEventKind::Press {
                        app.on_key(key);
                    }
                }
                Event::Mouse(mouse) => app.on_mouse(mouse),
                _ => {}
            }
        }
    }
    Ok(app.take_output())
}
