use std::io::{self, Write};

use anyhow::{Context, Result};
use arboard::Clipboard;
use crossterm::event::{DisableMouseCapture, EnableMouseCapture};
use crossterm::execute;

pub(crate) fn set_clipboard(text: &str) -> Result<()> {
    Clipboard::new()
        .and_then(|mut cb| cb.set_text(text.to_string()))
        .context("copy to clipboard failed")
}

/// Writes filled template text to stdout without adding a newline.
pub(crate) fn write_stdout(text: &str) -> Result<()> {
    let mut stdout = io::stdout().lock();
    stdout.write_all(text.as_bytes())?;
    stdout.flush()?;
    Ok(())
}

pub(crate) fn enable_mouse() -> Result<()> {
    execute!(io::stdout(), EnableMouseCapture).context("enable mouse capture failed")
}

pub(crate) fn disable_mouse() -> Result<()> {
    execute!(io::stdout(), DisableMouseCapture).context("disable mouse capture failed")
}
