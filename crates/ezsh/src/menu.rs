//! Menu bar model.
//!
//! Menus are declared as [`MenuDef`]s that reference commands by id.
//! [`MenuBarModel::build`] resolves them against a registry and a context into
//! a render-ready tree: labels, platform accelerators, and enabled state are
//! filled in, hidden or unknown commands are dropped, and separators are
//! tidied.
//!
//! On macOS the About, Preferences and Quit commands conventionally live in
//! the application menu. With `auto_app_menu` set, the model pulls them out of
//! the declared menus and builds that menu itself.

use ezsh_core::{CommandContext, CommandRegistry, Platform, Shortcut};
use serde::{Deserialize, Serialize};

use crate::default_commands::{ABOUT, APP_MENU_COMMANDS, PREFERENCES, QUIT};
use crate::logging::targets;

/// Label of the macOS application menu.
pub const APP_MENU_LABEL: &str = "Apple";

/// Separator between menu labels in a menu path.
pub const MENU_PATH_SEPARATOR: &str = " > ";

// =============================================================================
// Declarations
// =============================================================================

/// A declared menu item.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum MenuItem {
    /// Runs a registered command.
    Command {
        /// Command id.
        id: String,
        /// Label override.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        label: Option<String>,
        /// Accelerator override, shown verbatim.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        accelerator: Option<String>,
    },
    /// A separator line.
    Separator,
    /// A nested menu.
    Submenu {
        /// Submenu label.
        label: String,
        /// Submenu items.
        items: Vec<MenuItem>,
    },
}

impl MenuItem {
    /// A command item with no overrides.
    pub fn command(id: impl Into<String>) -> Self {
        Self::Command {
            id: id.into(),
            label: None,
            accelerator: None,
        }
    }

    /// A separator.
    pub fn separator() -> Self {
        Self::Separator
    }

    /// A submenu.
    pub fn submenu(label: impl Into<String>, items: Vec<MenuItem>) -> Self {
        Self::Submenu {
            label: label.into(),
            items,
        }
    }

    /// Override the label of a command item. No effect on other items.
    pub fn with_label(mut self, text: impl Into<String>) -> Self {
        if let Self::Command { label, .. } = &mut self {
            *label = Some(text.into());
        }
        self
    }

    /// Override the accelerator of a command item. No effect on other items.
    pub fn with_accelerator(mut self, text: impl Into<String>) -> Self {
        if let Self::Command { accelerator, .. } = &mut self {
            *accelerator = Some(text.into());
        }
        self
    }
}

/// A declared top-level menu.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MenuDef {
    /// Menu label.
    pub label: String,
    /// Menu items.
    pub items: Vec<MenuItem>,
}

impl MenuDef {
    /// Create a menu.
    pub fn new(label: impl Into<String>, items: Vec<MenuItem>) -> Self {
        Self {
            label: label.into(),
            items,
        }
    }
}

// =============================================================================
// Resolved model
// =============================================================================

/// A command item ready to render.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ResolvedCommand {
    /// Command id.
    pub command_id: String,
    /// Display label.
    pub label: String,
    /// Display accelerator, empty if none.
    pub accelerator: String,
    /// Whether the item is clickable.
    pub enabled: bool,
    /// Labels from the top-level menu down, e.g. `File > Open`.
    pub menu_path: String,
}

/// A resolved menu entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum MenuEntry {
    /// A command item.
    Command(ResolvedCommand),
    /// A separator.
    Separator,
    /// A non-empty submenu.
    Submenu {
        /// Submenu label.
        label: String,
        /// Submenu entries.
        entries: Vec<MenuEntry>,
    },
}

/// A resolved top-level menu.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ResolvedMenu {
    /// Menu label.
    pub label: String,
    /// Menu entries.
    pub entries: Vec<MenuEntry>,
}

/// A resolved menu bar.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct MenuBarModel {
    /// The macOS application menu, when built.
    pub app_menu: Option<ResolvedMenu>,
    /// Top-level menus in declaration order. Empty menus are dropped.
    pub menus: Vec<ResolvedMenu>,
}

impl MenuBarModel {
    /// Resolve menu declarations into a menu bar.
    pub fn build(
        defs: &[MenuDef],
        registry: &CommandRegistry,
        ctx: &CommandContext,
        platform: Platform,
        auto_app_menu: bool,
    ) -> Self {
        let resolver = Resolver {
            registry,
            ctx,
            platform,
        };
        let use_app_menu = platform.is_mac() && auto_app_menu;

        let menus: Vec<ResolvedMenu> = defs
            .iter()
            .filter_map(|def| {
                let items = if use_app_menu {
                    without_app_commands(&def.items)
                } else {
                    def.items.clone()
                };
                let entries = resolver.resolve_items(&items, &def.label);
                if entries.is_empty() {
                    tracing::trace!(target: targets::MENU, menu = %def.label, "dropping empty menu");
                    return None;
                }
                Some(ResolvedMenu {
                    label: def.label.clone(),
                    entries,
                })
            })
            .collect();

        let app_menu = use_app_menu
            .then(|| {
                let items = [
                    MenuItem::command(ABOUT),
                    MenuItem::separator(),
                    MenuItem::command(PREFERENCES),
                    MenuItem::separator(),
                    MenuItem::command(QUIT),
                ];
                resolver.resolve_items(&items, APP_MENU_LABEL)
            })
            .filter(|entries| !entries.is_empty())
            .map(|entries| ResolvedMenu {
                label: APP_MENU_LABEL.to_string(),
                entries,
            });

        tracing::debug!(
            target: targets::MENU,
            menus = menus.len(),
            app_menu = app_menu.is_some(),
            "built menu bar"
        );
        Self { app_menu, menus }
    }

    /// Find the resolved item for a command anywhere in the bar.
    pub fn find(&self, command_id: &str) -> Option<&ResolvedCommand> {
        self.app_menu
            .iter()
            .chain(self.menus.iter())
            .find_map(|menu| find_in(&menu.entries, command_id))
    }
}

fn find_in<'a>(entries: &'a [MenuEntry], command_id: &str) -> Option<&'a ResolvedCommand> {
    entries.iter().find_map(|entry| match entry {
        MenuEntry::Command(cmd) if cmd.command_id == command_id => Some(cmd),
        MenuEntry::Submenu { entries, .. } => find_in(entries, command_id),
        _ => None,
    })
}

fn without_app_commands(items: &[MenuItem]) -> Vec<MenuItem> {
    items
        .iter()
        .filter_map(|item| match item {
            MenuItem::Command { id, .. } if APP_MENU_COMMANDS.contains(&id.as_str()) => None,
            MenuItem::Submenu { label, items } => Some(MenuItem::Submenu {
                label: label.clone(),
                items: without_app_commands(items),
            }),
            other => Some(other.clone()),
        })
        .collect()
}

struct Resolver<'a> {
    registry: &'a CommandRegistry,
    ctx: &'a CommandContext,
    platform: Platform,
}

impl Resolver<'_> {
    fn resolve_items(&self, items: &[MenuItem], path: &str) -> Vec<MenuEntry> {
        let entries = items
            .iter()
            .filter_map(|item| self.resolve_item(item, path))
            .collect();
        clean_separators(entries)
    }

    fn resolve_item(&self, item: &MenuItem, path: &str) -> Option<MenuEntry> {
        match item {
            MenuItem::Separator => Some(MenuEntry::Separator),
            MenuItem::Submenu { label, items } => {
                let sub_path = format!("{path}{MENU_PATH_SEPARATOR}{label}");
                let entries = self.resolve_items(items, &sub_path);
                (!entries.is_empty()).then(|| MenuEntry::Submenu {
                    label: label.clone(),
                    entries,
                })
            }
            MenuItem::Command {
                id,
                label,
                accelerator,
            } => {
                let Ok(command) = self.registry.get(id) else {
                    tracing::debug!(target: targets::MENU, id = %id, "menu references unknown command");
                    return None;
                };
                if !command.is_visible(self.ctx) {
                    return None;
                }
                let accelerator = accelerator.clone().unwrap_or_else(|| {
                    command
                        .shortcut()
                        .and_then(|raw| Shortcut::parse(raw).ok())
                        .map(|shortcut| shortcut.accelerator(self.platform))
                        .unwrap_or_default()
                });
                Some(MenuEntry::Command(ResolvedCommand {
                    command_id: id.clone(),
                    label: label.clone().unwrap_or_else(|| command.label().to_string()),
                    accelerator,
                    enabled: command.is_enabled(self.ctx),
                    menu_path: path.to_string(),
                }))
            }
        }
    }
}

/// Remove leading, trailing, and repeated separators.
fn clean_separators(entries: Vec<MenuEntry>) -> Vec<MenuEntry> {
    let mut out: Vec<MenuEntry> = Vec::with_capacity(entries.len());
    for entry in entries {
        let is_sep = matches!(entry, MenuEntry::Separator);
        if is_sep && out.last().is_none_or(|last| matches!(last, MenuEntry::Separator)) {
            continue;
        }
        out.push(entry);
    }
    if matches!(out.last(), Some(MenuEntry::Separator)) {
        out.pop();
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::default_commands::register_default_commands;
    use ezsh_core::Command;
    use serde_json::Value;

    fn noop(_: &CommandContext) -> ezsh_core::HandlerResult {
        Ok(Value::Null)
    }

    fn registry(platform: Platform) -> CommandRegistry {
        let registry = CommandRegistry::new();
        register_default_commands(&registry, platform, "ezsh").unwrap();
        registry
            .register(Command::new("file.open", "Open", noop).with_shortcut("ctrl+o"))
            .unwrap();
        registry
            .register(Command::new("file.save", "Save", noop).with_enabled(false))
            .unwrap();
        registry
            .register(Command::new("file.secret", "Secret", noop).with_visible(false))
            .unwrap();
        registry
    }

    fn file_menu() -> MenuDef {
        MenuDef::new(
            "File",
            vec![
                MenuItem::separator(),
                MenuItem::command("file.open"),
                MenuItem::separator(),
                MenuItem::separator(),
                MenuItem::command("file.save").with_label("Save Now"),
                MenuItem::command("file.secret"),
                MenuItem::command("file.missing"),
                MenuItem::separator(),
                MenuItem::submenu("Recent", vec![MenuItem::command("file.missing")]),
                MenuItem::separator(),
                MenuItem::command(QUIT),
            ],
        )
    }

    fn labels(entries: &[MenuEntry]) -> Vec<String> {
        entries
            .iter()
            .map(|entry| match entry {
                MenuEntry::Command(cmd) => cmd.label.clone(),
                MenuEntry::Separator => "-".to_string(),
                MenuEntry::Submenu { label, .. } => format!("[{label}]"),
            })
            .collect()
    }

    // =========================================================================
    // Resolution
    // =========================================================================

    #[test]
    fn test_resolve_cleans_and_filters() {
        let registry = registry(Platform::Unix);
        let bar = MenuBarModel::build(
            &[file_menu()],
            &registry,
            &CommandContext::new(),
            Platform::Unix,
            true,
        );

        assert!(bar.app_menu.is_none());
        assert_eq!(bar.menus.len(), 1);
        assert_eq!(
            labels(&bar.menus[0].entries),
            vec!["Open", "-", "Save Now", "-", "Quit"]
        );
    }

    #[test]
    fn test_accelerators_and_enabled() {
        let registry = registry(Platform::Unix);
        let bar = MenuBarModel::build(
            &[file_menu()],
            &registry,
            &CommandContext::new(),
            Platform::Unix,
            false,
        );

        let open = bar.find("file.open").unwrap();
        assert_eq!(open.accelerator, "Ctrl+O");
        assert!(open.enabled);
        assert_eq!(open.menu_path, "File");

        let save = bar.find("file.save").unwrap();
        assert_eq!(save.accelerator, "");
        assert!(!save.enabled);

        assert_eq!(bar.find(QUIT).unwrap().accelerator, "Ctrl+Q");
        assert!(bar.find("file.secret").is_none());
    }

    #[test]
    fn test_accelerator_override() {
        let registry = registry(Platform::Unix);
        let def = MenuDef::new(
            "File",
            vec![MenuItem::command("file.open").with_accelerator("F3")],
        );
        let bar =
            MenuBarModel::build(&[def], &registry, &CommandContext::new(), Platform::Unix, false);
        assert_eq!(bar.find("file.open").unwrap().accelerator, "F3");
    }

    #[test]
    fn test_submenu_paths() {
        let registry = registry(Platform::Unix);
        let def = MenuDef::new(
            "File",
            vec![MenuItem::submenu(
                "Recent",
                vec![MenuItem::submenu("More", vec![MenuItem::command("file.open")])],
            )],
        );
        let bar =
            MenuBarModel::build(&[def], &registry, &CommandContext::new(), Platform::Unix, false);
        assert_eq!(bar.find("file.open").unwrap().menu_path, "File > Recent > More");
    }

    #[test]
    fn test_empty_menus_dropped() {
        let registry = registry(Platform::Unix);
        let defs = [
            MenuDef::new("Empty", vec![MenuItem::separator()]),
            MenuDef::new("Hidden", vec![MenuItem::command("file.secret")]),
        ];
        let bar =
            MenuBarModel::build(&defs, &registry, &CommandContext::new(), Platform::Unix, false);
        assert!(bar.menus.is_empty());
    }

    // =========================================================================
    // macOS application menu
    // =========================================================================

    #[test]
    fn test_mac_app_menu() {
        let registry = registry(Platform::MacOs);
        let bar = MenuBarModel::build(
            &[file_menu()],
            &registry,
            &CommandContext::new(),
            Platform::MacOs,
            true,
        );

        let app = bar.app_menu.as_ref().unwrap();
        assert_eq!(app.label, APP_MENU_LABEL);
        assert_eq!(
            labels(&app.entries),
            vec!["About ezsh", "-", "Preferences…", "-", "Quit ezsh"]
        );
        assert_eq!(bar.find(QUIT).unwrap().menu_path, APP_MENU_LABEL);
        assert_eq!(bar.find(QUIT).unwrap().accelerator, "⌘Q");

        // Quit moved out of File.
        assert_eq!(labels(&bar.menus[0].entries), vec!["Open", "-", "Save Now"]);
    }

    #[test]
    fn test_mac_without_auto_app_menu() {
        let registry = registry(Platform::MacOs);
        let bar = MenuBarModel::build(
            &[file_menu()],
            &registry,
            &CommandContext::new(),
            Platform::MacOs,
            false,
        );
        assert!(bar.app_menu.is_none());
        assert_eq!(bar.find(QUIT).unwrap().menu_path, "File");
    }

    #[test]
    fn test_menu_def_from_json() {
        let def: MenuDef = serde_json::from_str(
            r#"{"label": "File", "items": [
                {"type": "command", "id": "file.open"},
                {"type": "separator"},
                {"type": "submenu", "label": "Recent", "items": []}
            ]}"#,
        )
        .unwrap();
        assert_eq!(def.items[0], MenuItem::command("file.open"));
        assert_eq!(def.items[1], MenuItem::Separator);
    }
}
