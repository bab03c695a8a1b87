//! `ezsh` - drive the shell from standard input.
//!
//! Each input line is either a key sequence (`<Control-q>`, `CTRL+SHIFT+P`)
//! routed through the key router, or `:command.id` to invoke a command
//! directly. `?query` searches commands. The loop ends at end of input or
//! when a command requests quit.

use std::io::{self, BufRead, Write};
use std::path::PathBuf;

use clap::Parser;
use ezsh::{KeyDisposition, Shell, ShellConfig, init_logging};
use ezsh_core::DEFAULT_SEARCH_LIMIT;

#[derive(Parser, Debug)]
#[command(name = "ezsh")]
#[command(about = "A headless command shell driven by key sequences")]
#[command(version)]
struct Cli {
    /// Config file (`.toml` or `.json`); defaults to the per-user config
    #[arg(long, short)]
    config: Option<PathBuf>,

    /// Print the effective configuration as TOML and exit
    #[arg(long)]
    print_config: bool,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let config = ShellConfig::load_or_default(cli.config.as_deref())?;

    if cli.print_config {
        print!("{}", config.to_toml_string()?);
        return Ok(());
    }

    init_logging(&config.log_filter)?;
    let shell = Shell::new(config)?;
    if let Err(err) = shell.apply_keymap() {
        tracing::warn!(target: ezsh::logging::targets::SHELL, error = %err, "some key bindings were not applied");
    }

    let stdin = io::stdin();
    let mut stdout = io::stdout().lock();
    for line in stdin.lock().lines() {
        let line = line?;
        let input = line.trim();
        if input.is_empty() {
            continue;
        }

        if let Some(id) = input.strip_prefix(':') {
            match shell.invoke(id.trim()) {
                Ok(value) => writeln!(stdout, "{id} -> {value}")?,
                Err(err) => writeln!(stdout, "error: {err}")?,
            }
        } else if let Some(query) = input.strip_prefix('?') {
            for command in shell.search(query, DEFAULT_SEARCH_LIMIT) {
                writeln!(stdout, "{:<24} {}", command.id(), command.label())?;
            }
        } else {
            match shell.handle_keyseq(input) {
                KeyDisposition::Handled => {
                    let status = shell.status().snapshot();
                    writeln!(stdout, "{input} -> {}", status.last_command_id)?;
                }
                KeyDisposition::Propagate => writeln!(stdout, "{input} unhandled")?,
            }
        }

        if shell.quit_requested() {
            break;
        }
    }

    Ok(())
}
