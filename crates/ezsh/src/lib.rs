//! ezsh - a headless application shell built on `ezsh-core`.
//!
//! The shell owns a command registry preloaded with About, Preferences and
//! Quit, a global key map with platform default bindings, a layered key
//! router, a status service, and a menu model. Native key events (winit) and
//! plain key sequence strings are routed the same way.
//!
//! # Example
//!
//! ```
//! use ezsh::{KeyDisposition, Shell, ShellConfig};
//! use ezsh_core::{Command, Platform, Value};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let shell = Shell::with_platform(ShellConfig::default(), Platform::Unix)?;
//! shell.register_command(Command::new("palette.open", "Command Palette", |_| Ok(Value::Null)))?;
//! shell.bind_key("<Control-p>", "palette.open")?;
//!
//! assert_eq!(shell.handle_keyseq("<Control-p>"), KeyDisposition::Handled);
//! assert_eq!(shell.handle_keyseq("<Control-q>"), KeyDisposition::Handled);
//! assert!(shell.quit_requested());
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod default_commands;
pub mod default_keys;
pub mod keyboard;
pub mod logging;
pub mod menu;
pub mod shell;
pub mod status;

pub use config::{ConfigError, ShellConfig};
pub use default_commands::register_default_commands;
pub use default_keys::build_default_keymap;
pub use keyboard::{keyseq_from_winit, modifiers_from_winit};
pub use logging::{LoggingError, init_logging};
pub use menu::{MenuBarModel, MenuDef, MenuEntry, MenuItem, ResolvedCommand, ResolvedMenu};
pub use shell::{KeyDisposition, Shell, ShellError, ShellHost};
pub use status::{StatusSection, StatusService, StatusSink, StatusSnapshot};

/// Re-export of the core crate.
pub use ezsh_core as core;
