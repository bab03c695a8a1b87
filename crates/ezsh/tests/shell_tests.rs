//! Integration tests for the shell host.

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use ezsh::core::{Command, CommandError, KeyMap, Platform, SinkKind, StateMap, Value};
use ezsh::{
    KeyDisposition, MenuDef, MenuItem, Shell, ShellConfig, ShellError, StatusSection, StatusSink,
};
use parking_lot::Mutex;
use serde_json::json;

fn config() -> ShellConfig {
    let mut config = ShellConfig::default();
    config.telemetry.enabled = true;
    config.telemetry.sink = SinkKind::Memory;
    config
}

fn shell() -> Shell {
    Shell::with_platform(config(), Platform::Unix).unwrap()
}

fn counting(id: &str, label: &str) -> (Command, Arc<AtomicUsize>) {
    let count = Arc::new(AtomicUsize::new(0));
    let hits = count.clone();
    let command = Command::new(id, label, move |_| {
        hits.fetch_add(1, Ordering::SeqCst);
        Ok(Value::Null)
    });
    (command, count)
}

// =============================================================================
// Configuration
// =============================================================================

#[test]
fn test_config_keys_route_before_apply() {
    let mut config = config();
    config.keys.bind("<Control-p>", "palette.open").unwrap();
    let shell = Shell::with_platform(config, Platform::Unix).unwrap();

    let (command, count) = counting("palette.open", "Command Palette");
    shell.register_command(command).unwrap();

    // Routed through the global key map straight away.
    assert_eq!(shell.handle_keyseq("<Control-p>"), KeyDisposition::Handled);
    assert_eq!(count.load(Ordering::SeqCst), 1);

    // Shortcut lookup needs the key map applied to the registry.
    assert!(shell.invoke_shortcut("ctrl+p").is_err());
    shell.apply_keymap().unwrap();
    shell.invoke_shortcut("ctrl+p").unwrap();
    assert_eq!(count.load(Ordering::SeqCst), 2);
}

#[test]
fn test_apply_keymap_reports_unknown_command() {
    let shell = shell();
    shell.bind_key("<Control-m>", "missing.command").unwrap();
    assert!(matches!(
        shell.apply_keymap(),
        Err(ShellError::Command(CommandError::CommandNotFound(_)))
    ));
}

#[test]
fn test_apply_keymap_collision_and_replace() {
    let shell = shell();
    let (command, _) = counting("app.exit_now", "Exit Now");
    shell.register_command(command).unwrap();
    shell.bind_key("<Control-q>", "app.exit_now").unwrap();
    shell.bind_key("<Control-KeyPress-q>", "app.exit_now").unwrap();

    assert!(matches!(
        shell.apply_keymap(),
        Err(ShellError::Command(CommandError::ShortcutAlreadyBound { .. }))
    ));

    shell.apply_keymap_replace().unwrap();
    assert_eq!(
        shell.registry().resolve_shortcut("CTRL+Q").unwrap().as_deref(),
        Some("app.exit_now")
    );
}

#[test]
fn test_try_bind_key_refuses_overwrite() {
    let shell = shell();
    assert!(matches!(
        shell.try_bind_key("<Control-q>", "other"),
        Err(ShellError::KeyMap(_))
    ));
    assert!(matches!(
        shell.bind_key("", "other"),
        Err(ShellError::KeyMap(_))
    ));
}

#[test]
fn test_load_from_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("ezsh.toml");
    std::fs::write(
        &path,
        "title = \"demo\"\n\n[keys]\n\"<Control-k>\" = \"app.about\"\n",
    )
    .unwrap();

    let shell = Shell::load(Some(path.as_path())).unwrap();
    assert_eq!(shell.host().title(), "demo");
    assert_eq!(shell.status().snapshot().right, "demo");
    assert_eq!(shell.handle_keyseq("<Control-k>"), KeyDisposition::Handled);

    assert!(matches!(
        Shell::load(Some(dir.path().join("ezsh.ini").as_path())),
        Err(ShellError::Config(_))
    ));
}

// =============================================================================
// Layered routing through the shell
// =============================================================================

#[test]
fn test_mode_and_component_layers() {
    let shell = shell();
    let (global, global_hits) = counting("edit.global", "Global");
    let (mode, mode_hits) = counting("edit.mode", "Mode");
    let (component, component_hits) = counting("edit.component", "Component");
    for command in [global, mode, component] {
        shell.register_command(command).unwrap();
    }

    shell.bind_key("<Control-e>", "edit.global").unwrap();
    shell
        .router()
        .register_mode_keymap("insert", KeyMap::new().with_binding("<Control-e>", "edit.mode"));
    shell.router().register_component_keymap(
        "editor",
        KeyMap::new().with_binding("<Control-e>", "edit.component"),
    );

    shell.handle_keyseq("<Control-e>");
    assert_eq!(global_hits.load(Ordering::SeqCst), 1);

    // Writing the state key directly is picked up on the next key.
    shell.state().set("mode", "insert");
    shell.handle_keyseq("<Control-e>");
    assert_eq!(mode_hits.load(Ordering::SeqCst), 1);

    shell.set_focus(Some("editor"));
    shell.handle_keyseq("<Control-e>");
    assert_eq!(component_hits.load(Ordering::SeqCst), 1);

    shell.set_focus(None);
    shell.set_mode(None);
    shell.handle_keyseq("<Control-e>");
    assert_eq!(global_hits.load(Ordering::SeqCst), 2);
}

#[test]
fn test_routing_error_is_reported_not_raised() {
    let shell = shell();
    shell
        .register_command(
            Command::new("edit.locked", "Locked", |_| Ok(Value::Null)).with_enabled(false),
        )
        .unwrap();
    shell.bind_key("<Control-l>", "edit.locked").unwrap();

    assert_eq!(shell.handle_keyseq("<Control-l>"), KeyDisposition::Propagate);

    let sink = shell.telemetry().memory_sink().unwrap();
    let errors = sink.events_named("keyrouter.error");
    assert_eq!(errors.len(), 1);
    assert_eq!(errors[0].attrs["keyseq"], json!("<Control-l>"));
    assert_eq!(errors[0].attrs["error"], json!("CommandNotEnabled"));
}

#[test]
fn test_handler_failure_is_reported() {
    let shell = shell();
    shell
        .register_command(Command::new("edit.fail", "Fail", |_| Err("disk full".into())))
        .unwrap();
    shell.bind_key("<Control-f>", "edit.fail").unwrap();

    assert_eq!(shell.handle_keyseq("<Control-f>"), KeyDisposition::Propagate);
    let sink = shell.telemetry().memory_sink().unwrap();
    assert_eq!(
        sink.events_named("keyrouter.error")[0].attrs["error"],
        json!("HandlerFailed")
    );

    assert!(matches!(
        shell.invoke("edit.fail"),
        Err(CommandError::HandlerFailed { .. })
    ));
}

// =============================================================================
// Invocation
// =============================================================================

#[test]
fn test_invoke_with_extras_and_visibility() {
    let shell = shell();
    shell
        .register_command(
            Command::new("debug.echo", "Echo", |ctx| {
                Ok(ctx.extra("payload").cloned().unwrap_or(Value::Null))
            })
            .with_visible(false),
        )
        .unwrap();

    assert!(matches!(
        shell.invoke("debug.echo"),
        Err(CommandError::CommandNotVisible(_))
    ));

    let mut extra = StateMap::new();
    extra.insert("payload".into(), json!(42));
    assert_eq!(shell.invoke_with("debug.echo", extra, false).unwrap(), json!(42));
    assert_eq!(shell.status().snapshot().last_command_id, "debug.echo");
}

#[test]
fn test_invocation_telemetry() {
    let shell = shell();
    shell.invoke("app.about").unwrap();
    shell.invoke_shortcut("<Control-q>").unwrap();

    let sink = shell.telemetry().memory_sink().unwrap();
    assert_eq!(
        sink.events_named("command.invoke")[0].attrs["command_id"],
        json!("app.about")
    );
    assert_eq!(
        sink.events_named("shortcut.invoke")[0].attrs["shortcut"],
        json!("CTRL+Q")
    );
    assert_eq!(sink.metrics_named("shortcut.duration").len(), 1);
    assert_eq!(sink.metrics_named("command.duration").len(), 2);
}

#[test]
fn test_search() {
    let shell = shell();
    let results = shell.search("quit", 5);
    assert_eq!(results[0].id(), "app.quit");
    assert!(shell.search("", 5).is_empty());
}

// =============================================================================
// Menus & Status
// =============================================================================

#[test]
fn test_menu_bar_and_selection() {
    let shell = shell();
    let (open, hits) = counting("file.open", "Open");
    shell.register_command(open.with_shortcut("ctrl+o")).unwrap();

    let bar = shell.menu_bar(&[MenuDef::new(
        "File",
        vec![
            MenuItem::command("file.open"),
            MenuItem::separator(),
            MenuItem::command("app.quit"),
        ],
    )]);
    let open = bar.find("file.open").unwrap();
    assert_eq!(open.accelerator, "Ctrl+O");

    shell.select_menu_item(&open.command_id, &open.menu_path).unwrap();
    assert_eq!(hits.load(Ordering::SeqCst), 1);

    let sink = shell.telemetry().memory_sink().unwrap();
    let selects = sink.events_named("menu.select");
    assert_eq!(selects[0].attrs["menu_path"], json!("File"));
}

#[test]
fn test_mac_menu_bar_uses_app_menu() {
    let shell = Shell::with_platform(config(), Platform::MacOs).unwrap();
    let bar = shell.menu_bar(&[MenuDef::new("File", vec![MenuItem::command("app.quit")])]);
    assert!(bar.menus.is_empty());
    assert_eq!(bar.app_menu.as_ref().unwrap().entries.len(), 5);
}

#[derive(Default)]
struct RecordingSink(Mutex<Vec<(StatusSection, String)>>);

impl StatusSink for RecordingSink {
    fn set_text(&self, section: StatusSection, text: &str) {
        self.0.lock().push((section, text.to_string()));
    }
}

#[test]
fn test_status_sink_receives_updates() {
    let shell = shell();
    let sink = Arc::new(RecordingSink::default());
    shell.status().attach_sink(Some(sink.clone()));

    // Initial sections pushed on attach.
    assert_eq!(sink.0.lock().len(), 2);

    shell.invoke("app.about").unwrap();
    let calls = sink.0.lock();
    let (section, text) = calls.last().unwrap();
    assert_eq!(*section, StatusSection::Middle);
    assert!(text.starts_with("ezsh "));
}
