pub mod ai;
pub mod asset;
pub mod collaborator;
pub mod completions;
pub mod config;
pub mod dashboard;
pub mod export;
pub mod session;
pub mod setup;

use std::io::{self, IsTerminal, Write};

/// Ask for confirmation on an interactive terminal. `--yes` skips the
/// prompt; without a terminal the answer is no.
pub fn confirmed(yes: bool, prompt: &str) -> io::Result<bool> {
    if yes {
        return Ok(true);
    }
    if !io::stdin().is_terminal() {
        return Ok(false);
    }
    let mut err = io::stderr();
    write!(err, "{prompt} [y/N] ")?;
    err.flush()?;
    let mut answer = String::new();
    io::stdin().read_line(&mut answer)?;
    Ok(matches!(answer.trim().to_lowercase().as_str(), "y" | "yes"))
}
