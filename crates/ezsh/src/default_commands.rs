//! Built-in application commands.
//!
//! | Id                | Order | Shortcut (macOS / other) |
//! |-------------------|-------|--------------------------|
//! | `app.about`       | 10    | none                     |
//! | `app.preferences` | 15    | `CMD+,` / `CTRL+,`       |
//! | `app.quit`        | 20    | `CMD+Q` / `CTRL+Q`       |

use ezsh_core::{Command, CommandContext, CommandError, CommandRegistry, Platform, Value};
use serde_json::json;

use crate::config::ShellConfig;
use crate::shell::ShellHost;
use crate::status::{STATUS_SERVICE, StatusService};

/// Show application information.
pub const ABOUT: &str = "app.about";
/// Open application preferences.
pub const PREFERENCES: &str = "app.preferences";
/// Exit the application.
pub const QUIT: &str = "app.quit";

/// Commands that live in the macOS application menu.
pub const APP_MENU_COMMANDS: [&str; 3] = [ABOUT, PREFERENCES, QUIT];

/// Register the built-in commands.
///
/// Labels follow platform conventions: macOS names the application in About
/// and Quit and uses a real ellipsis.
pub fn register_default_commands(
    registry: &CommandRegistry,
    platform: Platform,
    app_name: &str,
) -> Result<(), CommandError> {
    let mac = platform.is_mac();

    let (about_label, quit_label, prefs_label) = if mac {
        (
            format!("About {app_name}"),
            format!("Quit {app_name}"),
            "Preferences…".to_string(),
        )
    } else {
        (
            "About".to_string(),
            "Quit".to_string(),
            "Preferences...".to_string(),
        )
    };
    let (quit_shortcut, prefs_shortcut) = if mac {
        ("CMD+Q", "CMD+,")
    } else {
        ("CTRL+Q", "CTRL+,")
    };

    let name = app_name.to_string();
    registry.register(
        Command::new(ABOUT, about_label, move |ctx| Ok(about(ctx, &name)))
            .with_description("Show application information.")
            .with_tags(["help", "version"])
            .with_order(10),
    )?;

    registry.register(
        Command::new(PREFERENCES, prefs_label, |ctx| Ok(preferences(ctx)))
            .with_description("Open application preferences.")
            .with_tags(["settings", "config"])
            .with_shortcut(prefs_shortcut)
            .with_order(15),
    )?;

    registry.register(
        Command::new(QUIT, quit_label, |ctx| Ok(quit(ctx)))
            .with_description(format!("Exit {app_name}."))
            .with_tags(["exit", "close"])
            .with_shortcut(quit_shortcut)
            .with_order(20),
    )?;

    Ok(())
}

fn status(ctx: &CommandContext) -> Option<std::sync::Arc<StatusService>> {
    ctx.service::<StatusService>(STATUS_SERVICE)
}

fn about(ctx: &CommandContext, app_name: &str) -> Value {
    let name = ctx
        .host::<ShellHost>()
        .map_or(app_name, |host| host.title());
    let version = env!("CARGO_PKG_VERSION");
    if let Some(status) = status(ctx) {
        status.set_middle(&format!("{name} {version}"));
    }
    json!({ "name": name, "version": version })
}

fn preferences(ctx: &CommandContext) -> Value {
    let path = ShellConfig::default_path().map(|path| path.display().to_string());
    if let Some(status) = status(ctx) {
        let message = match &path {
            Some(path) => format!("Preferences: {path}"),
            None => "Preferences: no config directory".to_string(),
        };
        status.set_middle(&message);
    }
    json!({ "config_path": path })
}

fn quit(ctx: &CommandContext) -> Value {
    match ctx.host::<ShellHost>() {
        Some(host) => {
            host.request_quit();
            Value::Bool(true)
        }
        None => Value::Bool(false),
    }
}
