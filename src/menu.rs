//! Interactive numbered menu.
//!
//! Reads one choice per line, prompting for a value where the choice needs
//! one. Unparseable answers are reported and the menu is shown again.

use std::io::Write;

use colored::Colorize;
use tokio::io::{AsyncBufRead, AsyncBufReadExt};
use tracing::debug;

use crate::config::{format_duration, parse_duration, Config};
use crate::error::{MksError, Result};
use crate::supervisor::Supervisor;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MenuChoice {
    SetMessage,
    ToggleRandomize,
    SetMessageDelay,
    SetKeyDelay,
    SetRepetitions,
    ToggleActivation,
    Quit,
}

impl MenuChoice {
    pub fn parse(input: &str) -> Result<Self> {
        let choice = match input.trim() {
            "0" => Self::SetMessage,
            "1" => Self::ToggleRandomize,
            "2" => Self::SetMessageDelay,
            "3" => Self::SetKeyDelay,
            "4" => Self::SetRepetitions,
            "5" => Self::ToggleActivation,
            "6" => Self::Quit,
            other => return Err(MksError::invalid_input(other, "choose an option from 0 to 6")),
        };
        Ok(choice)
    }
}

pub fn parse_repetitions(input: &str) -> Result<u32> {
    input
        .trim()
        .parse()
        .map_err(|e| MksError::invalid_input(input.trim(), format!("{e}")))
}

/// The option list, showing current values.
pub fn render(config: &Config, active: bool) -> String {
    let activation = if active {
        "Deactivate".red().to_string()
    } else {
        format!("{} (F2 to start, F4 to stop)", "Activate".green())
    };

    let lines = [
        "Choose option:".bold().to_string(),
        format!("  0: Set message (currently \"{}\")", config.message.cyan()),
        format!(
            "  1: Randomize message (currently {})",
            config.randomize.to_string().cyan()
        ),
        format!(
            "  2: Set wait per message (currently {})",
            format_duration(config.message_delay).cyan()
        ),
        format!(
            "  3: Set wait per key (currently {})",
            format_duration(config.key_delay).cyan()
        ),
        format!(
            "  4: Set repetitions (currently {})",
            config.repetitions.to_string().cyan()
        ),
        format!("  5: {activation}"),
        "  6: Quit".to_string(),
    ];

    let mut menu = lines.join("\n");
    menu.push('\n');
    menu
}

/// Drives `supervisor` from `input` until the user quits or input ends. The
/// supervisor is deactivated before returning.
pub async fn run<R, W>(supervisor: &mut Supervisor, input: R, output: &mut W) -> Result<()>
where
    R: AsyncBufRead + Unpin,
    W: Write,
{
    let mut lines = input.lines();

    loop {
        write!(
            output,
            "{}Your selection is: ",
            render(&supervisor.config().snapshot(), supervisor.is_active())
        )?;
        output.flush()?;

        let Some(line) = lines.next_line().await? else {
            break;
        };
        writeln!(output)?;

        let choice = match MenuChoice::parse(&line) {
            Ok(choice) => choice,
            Err(e) => {
                writeln!(output, "{}\n", e.to_string().yellow())?;
                continue;
            }
        };
        debug!(?choice, "menu selection");

        match choice {
            MenuChoice::SetMessage => {
                write!(output, "Enter string: ")?;
                output.flush()?;
                if let Some(message) = lines.next_line().await? {
                    supervisor.config().set_message(message);
                }
            }
            MenuChoice::ToggleRandomize => {
                supervisor.config().toggle_randomize();
            }
            MenuChoice::SetMessageDelay | MenuChoice::SetKeyDelay => {
                let prompt = if choice == MenuChoice::SetMessageDelay {
                    "Enter new msg delay: "
                } else {
                    "Enter new key delay: "
                };
                write!(output, "{prompt}")?;
                output.flush()?;
                let Some(answer) = lines.next_line().await? else {
                    break;
                };
                match parse_duration(&answer) {
                    Ok(delay) if choice == MenuChoice::SetMessageDelay => {
                        supervisor.config().set_message_delay(delay)
                    }
                    Ok(delay) => supervisor.config().set_key_delay(delay),
                    Err(e) => writeln!(output, "{}", e.to_string().yellow())?,
                }
            }
            MenuChoice::SetRepetitions => {
                write!(output, "Enter repetitions: ")?;
                output.flush()?;
                let Some(answer) = lines.next_line().await? else {
                    break;
                };
                match parse_repetitions(&answer) {
                    Ok(repetitions) => supervisor.config().set_repetitions(repetitions),
                    Err(e) => writeln!(output, "{}", e.to_string().yellow())?,
                }
            }
            MenuChoice::ToggleActivation => {
                if supervisor.is_active() {
                    supervisor.deactivate().await;
                } else {
                    supervisor.activate().await;
                }
            }
            MenuChoice::Quit => break,
        }
        writeln!(output)?;
    }

    supervisor.deactivate().await;
    Ok(())
}
