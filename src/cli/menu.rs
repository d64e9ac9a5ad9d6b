//! Operator recovery menu
//!
//! Shown whenever a cycle ends without a position (abort) or hits a fatal
//! error. Trading never restarts on its own; an operator choice is required.

use anyhow::Result;
use dialoguer::{theme::ColorfulTheme, Select};

use crate::config::Config;

/// What the operator chose to do after a paused cycle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecoveryChoice {
    /// Start a fresh cycle
    Resume,
    /// Start a fresh cycle and buy on the next observation, band or no band
    ForceEntry,
    /// Shut the bot down
    Quit,
}

/// Block on the operator menu until a resume-or-quit decision is made.
/// Showing the configuration loops back to the menu.
pub fn recovery_menu(config: &Config, context: &str) -> Result<RecoveryChoice> {
    println!("\nTrading paused: {context}\n");

    loop {
        let selection = Select::with_theme(&ColorfulTheme::default())
            .with_prompt("Select an action")
            .items(&[
                "Resume monitoring",
                "Resume and enter immediately",
                "Show configuration",
                "Quit",
            ])
            .default(0)
            .interact()?;

        match selection {
            0 => return Ok(RecoveryChoice::Resume),
            1 => return Ok(RecoveryChoice::ForceEntry),
            2 => println!("{}", config.masked_display()),
            _ => return Ok(RecoveryChoice::Quit),
        }
    }
}
