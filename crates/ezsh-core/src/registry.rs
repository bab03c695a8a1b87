//! The command registry.
//!
//! [`CommandRegistry`] owns every [`Command`] and the canonical shortcut index.
//! Menus, keyboard routing and platform hooks all resolve to commands through
//! it, so enablement and visibility policy live in one place.
//!
//! # Invariants
//!
//! - Command ids are non-empty and unique.
//! - Every shortcut index entry points at a registered command. Unregistering
//!   or replacing a command drops its bindings.
//! - A canonical shortcut maps to at most one command.
//!
//! # Thread Safety
//!
//! All methods take `&self`; state lives behind a `parking_lot::RwLock`.
//! Handlers and predicates run with the lock released, so a handler may call
//! back into the registry.

use indexmap::IndexMap;
use parking_lot::RwLock;
use serde_json::json;

use crate::command::{Command, CommandId};
use crate::context::{CommandContext, Value};
use crate::error::{CommandError, Result};
use crate::keymap::ShortcutBinder;
use crate::logging::targets;
use crate::shortcut::normalize_shortcut;
use crate::telemetry::{Telemetry, attrs};

/// Default result limit for [`CommandRegistry::search`].
pub const DEFAULT_SEARCH_LIMIT: usize = 25;

#[derive(Default)]
struct RegistryState {
    commands: IndexMap<CommandId, Command>,
    shortcuts: IndexMap<String, CommandId>,
}

impl RegistryState {
    fn remove_bindings_for(&mut self, id: &str) {
        self.shortcuts.retain(|_, bound| bound != id);
    }

    /// Fail if `shortcut` is bound to a command other than `id`.
    fn check_collision(&self, shortcut: &str, id: &str) -> Result<()> {
        match self.shortcuts.get(shortcut) {
            Some(existing) if existing != id => Err(CommandError::ShortcutAlreadyBound {
                shortcut: shortcut.to_string(),
                existing: existing.clone(),
            }),
            _ => Ok(()),
        }
    }
}

/// Registry of commands and their shortcuts.
#[derive(Default)]
pub struct CommandRegistry {
    state: RwLock<RegistryState>,
    telemetry: Telemetry,
}

impl CommandRegistry {
    /// Create an empty registry with telemetry disabled.
    pub fn new() -> Self {
        Self::default()
    }

    /// Attach telemetry.
    pub fn with_telemetry(mut self, telemetry: Telemetry) -> Self {
        self.telemetry = telemetry;
        self
    }

    /// The attached telemetry.
    pub fn telemetry(&self) -> &Telemetry {
        &self.telemetry
    }

    // =========================================================================
    // Registration
    // =========================================================================

    /// Register a command.
    ///
    /// Fails with `DuplicateCommand` if the id is taken. A default shortcut is
    /// bound under the same rule as [`bind_shortcut`](Self::bind_shortcut).
    /// Nothing is changed when registration fails.
    pub fn register(&self, command: Command) -> Result<()> {
        self.register_inner(command, false)
    }

    /// Register a command, replacing any command with the same id.
    ///
    /// The old command's shortcut bindings are dropped first, and the default
    /// shortcut takes over from any other command holding it.
    pub fn register_replace(&self, command: Command) -> Result<()> {
        self.register_inner(command, true)
    }

    fn register_inner(&self, command: Command, replace: bool) -> Result<()> {
        if command.id().is_empty() {
            return Err(CommandError::EmptyCommandId);
        }
        let shortcut = command.shortcut().map(normalize_shortcut).transpose()?;

        let mut state = self.state.write();
        let exists = state.commands.contains_key(command.id());
        if exists && !replace {
            return Err(CommandError::DuplicateCommand(command.id().to_string()));
        }
        if let Some(shortcut) = &shortcut
            && !replace
        {
            state.check_collision(shortcut, command.id())?;
        }

        let id = command.id().to_string();
        if exists {
            state.remove_bindings_for(&id);
        }
        state.commands.insert(id.clone(), command);
        if let Some(shortcut) = shortcut {
            tracing::debug!(target: targets::REGISTRY, %id, %shortcut, "bound default shortcut");
            state.shortcuts.insert(shortcut, id.clone());
        }
        tracing::debug!(target: targets::REGISTRY, %id, replaced = exists, "registered command");
        Ok(())
    }

    /// Remove a command and every shortcut bound to it.
    pub fn unregister(&self, id: &str) -> Result<()> {
        let mut state = self.state.write();
        if state.commands.shift_remove(id).is_none() {
            return Err(CommandError::not_found(id));
        }
        state.remove_bindings_for(id);
        tracing::debug!(target: targets::REGISTRY, id, "unregistered command");
        Ok(())
    }

    // =========================================================================
    // Lookup
    // =========================================================================

    /// Check whether a command is registered.
    pub fn has(&self, id: &str) -> bool {
        self.state.read().commands.contains_key(id)
    }

    /// Get a copy of a registered command.
    pub fn get(&self, id: &str) -> Result<Command> {
        self.state
            .read()
            .commands
            .get(id)
            .cloned()
            .ok_or_else(|| CommandError::not_found(id))
    }

    /// Registered ids in registration order.
    pub fn ids(&self) -> Vec<CommandId> {
        self.state.read().commands.keys().cloned().collect()
    }

    /// All commands sorted by order, then lower-cased label, then id.
    pub fn all(&self) -> Vec<Command> {
        let mut commands: Vec<Command> = self.state.read().commands.values().cloned().collect();
        commands.sort_by_cached_key(|cmd| (cmd.order(), cmd.label().to_lowercase(), cmd.id().to_string()));
        commands
    }

    /// Number of registered commands.
    pub fn len(&self) -> usize {
        self.state.read().commands.len()
    }

    /// Check whether no command is registered.
    pub fn is_empty(&self) -> bool {
        self.state.read().commands.is_empty()
    }

    // =========================================================================
    // Shortcuts
    // =========================================================================

    /// Bind a shortcut to a registered command.
    ///
    /// Fails with `ShortcutAlreadyBound` if the canonical shortcut already
    /// maps to a different command.
    pub fn bind_shortcut(&self, shortcut: &str, id: &str) -> Result<()> {
        self.bind_inner(shortcut, id, false)
    }

    /// Bind a shortcut to a registered command, taking it over from any other
    /// command.
    pub fn bind_shortcut_replace(&self, shortcut: &str, id: &str) -> Result<()> {
        self.bind_inner(shortcut, id, true)
    }

    fn bind_inner(&self, shortcut: &str, id: &str, replace: bool) -> Result<()> {
        let mut state = self.state.write();
        if !state.commands.contains_key(id) {
            return Err(CommandError::not_found(id));
        }
        let canonical = normalize_shortcut(shortcut)?;
        if !replace {
            state.check_collision(&canonical, id)?;
        }
        tracing::debug!(target: targets::REGISTRY, shortcut = %canonical, id, "bound shortcut");
        state.shortcuts.insert(canonical, id.to_string());
        Ok(())
    }

    /// Remove a shortcut binding. Returns the id it was bound to.
    pub fn unbind_shortcut(&self, shortcut: &str) -> Result<Option<CommandId>> {
        let canonical = normalize_shortcut(shortcut)?;
        Ok(self.state.write().shortcuts.shift_remove(&canonical))
    }

    /// Resolve a shortcut to a command id.
    pub fn resolve_shortcut(&self, shortcut: &str) -> Result<Option<CommandId>> {
        let canonical = normalize_shortcut(shortcut)?;
        Ok(self.state.read().shortcuts.get(&canonical).cloned())
    }

    /// Canonical shortcuts bound to a command, in binding order.
    pub fn shortcuts_for(&self, id: &str) -> Vec<String> {
        self.state
            .read()
            .shortcuts
            .iter()
            .filter(|(_, bound)| bound.as_str() == id)
            .map(|(shortcut, _)| shortcut.clone())
            .collect()
    }

    // =========================================================================
    // Policy
    // =========================================================================

    /// Evaluate a command's visibility.
    pub fn is_visible(&self, id: &str, ctx: &CommandContext) -> Result<bool> {
        Ok(self.get(id)?.is_visible(ctx))
    }

    /// Evaluate a command's enablement.
    pub fn is_enabled(&self, id: &str, ctx: &CommandContext) -> Result<bool> {
        Ok(self.get(id)?.is_enabled(ctx))
    }

    /// Check whether a command is both visible and enabled.
    pub fn can_execute(&self, id: &str, ctx: &CommandContext) -> Result<bool> {
        let command = self.get(id)?;
        Ok(command.is_visible(ctx) && command.is_enabled(ctx))
    }

    // =========================================================================
    // Execution
    // =========================================================================

    /// Execute a command, requiring it to be visible and enabled.
    pub fn execute(&self, id: &str, ctx: &CommandContext) -> Result<Value> {
        self.execute_inner(id, ctx, true)
    }

    /// Execute a command, requiring it to be enabled but not visible.
    ///
    /// Platform hooks use this: a native Quit item must work even when the
    /// command is hidden from menus.
    pub fn execute_ignoring_visibility(&self, id: &str, ctx: &CommandContext) -> Result<Value> {
        self.execute_inner(id, ctx, false)
    }

    fn execute_inner(&self, id: &str, ctx: &CommandContext, require_visible: bool) -> Result<Value> {
        let command = self.get(id)?;

        if require_visible && !command.is_visible(ctx) {
            tracing::debug!(target: targets::REGISTRY, id, "refused: not visible");
            return Err(CommandError::CommandNotVisible(id.to_string()));
        }
        if !command.is_enabled(ctx) {
            tracing::debug!(target: targets::REGISTRY, id, "refused: not enabled");
            return Err(CommandError::CommandNotEnabled(id.to_string()));
        }

        tracing::trace!(target: targets::REGISTRY, id, "executing command");
        let _timer = self
            .telemetry
            .timer("command.duration", attrs([("command_id", json!(id))]));

        command.invoke(ctx).map_err(|source| CommandError::HandlerFailed {
            id: id.to_string(),
            source,
        })
    }

    /// Resolve a shortcut and execute the bound command (visibility required).
    pub fn execute_shortcut(&self, shortcut: &str, ctx: &CommandContext) -> Result<Value> {
        let canonical = normalize_shortcut(shortcut)?;
        let id = self
            .state
            .read()
            .shortcuts
            .get(&canonical)
            .cloned()
            .ok_or_else(|| CommandError::shortcut_not_bound(canonical.clone()))?;
        self.execute(&id, ctx)
    }

    // =========================================================================
    // UI Helpers
    // =========================================================================

    /// Filter `ids` down to the commands that are currently visible, keeping
    /// the input order. Unknown ids are an error.
    pub fn list_for_menu<S: AsRef<str>>(&self, ids: &[S], ctx: &CommandContext) -> Result<Vec<Command>> {
        let mut out = Vec::new();
        for id in ids {
            let command = self.get(id.as_ref())?;
            if command.is_visible(ctx) {
                out.push(command);
            }
        }
        Ok(out)
    }

    /// Fuzzy search over visible commands.
    ///
    /// Matching is case-insensitive and ranked:
    ///
    /// | Match                   | Score |
    /// |-------------------------|-------|
    /// | exact id                | 100   |
    /// | exact label             | 95    |
    /// | id prefix               | 85    |
    /// | label prefix            | 80    |
    /// | id substring            | 60    |
    /// | label substring         | 55    |
    /// | description substring   | 30    |
    /// | tag substring           | 25    |
    ///
    /// Ties break on order, then lower-cased label, then id. An empty query
    /// returns nothing.
    pub fn search(&self, query: &str, ctx: &CommandContext, limit: usize) -> Vec<Command> {
        let query = query.trim().to_lowercase();
        if query.is_empty() {
            return Vec::new();
        }

        let commands: Vec<Command> = self.state.read().commands.values().cloned().collect();
        let mut candidates: Vec<(u32, Command)> = commands
            .into_iter()
            .filter(|cmd| cmd.is_visible(ctx))
            .filter_map(|cmd| {
                let score = score(&cmd, &query);
                (score > 0).then_some((score, cmd))
            })
            .collect();

        candidates.sort_by_cached_key(|(score, cmd)| {
            (
                std::cmp::Reverse(*score),
                cmd.order(),
                cmd.label().to_lowercase(),
                cmd.id().to_string(),
            )
        });

        candidates.into_iter().take(limit).map(|(_, cmd)| cmd).collect()
    }
}

fn score(command: &Command, query: &str) -> u32 {
    let id = command.id().to_lowercase();
    let label = command.label().to_lowercase();

    if id == query {
        100
    } else if label == query {
        95
    } else if id.starts_with(query) {
        85
    } else if label.starts_with(query) {
        80
    } else if id.contains(query) {
        60
    } else if label.contains(query) {
        55
    } else if command.description().to_lowercase().contains(query) {
        30
    } else if command.tags().join(" ").to_lowercase().contains(query) {
        25
    } else {
        0
    }
}

impl ShortcutBinder for CommandRegistry {
    fn bind_shortcut(&self, shortcut: &str, id: &str, replace: bool) -> Result<()> {
        self.bind_inner(shortcut, id, replace)
    }
}

impl std::fmt::Debug for CommandRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = self.state.read();
        f.debug_struct("CommandRegistry")
            .field("commands", &state.commands.keys().collect::<Vec<_>>())
            .field("shortcuts", &state.shortcuts)
            .finish()
    }
}

static_assertions::assert_impl_all!(CommandRegistry: Send, Sync);

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use crate::shortcut::ShortcutError;

    fn cmd(id: &str, label: &str) -> Command {
        Command::new(id, label, |_| Ok(Value::Null))
    }

    fn counting(id: &str, calls: &Arc<AtomicUsize>) -> Command {
        let calls = calls.clone();
        Command::new(id, id, move |_| {
            calls.fetch_add(1, Ordering::SeqCst);
            Ok(Value::Null)
        })
    }

    // =========================================================================
    // Registration Tests
    // =========================================================================

    #[test]
    fn test_register_and_get() {
        let registry = CommandRegistry::new();
        registry.register(cmd("app.quit", "Quit")).unwrap();

        assert!(registry.has("app.quit"));
        assert_eq!(registry.get("app.quit").unwrap().label(), "Quit");
        assert_eq!(registry.len(), 1);
        assert!(!registry.is_empty());
    }

    #[test]
    fn test_register_empty_id() {
        let registry = CommandRegistry::new();
        assert!(matches!(
            registry.register(cmd("", "Nothing")),
            Err(CommandError::EmptyCommandId)
        ));
    }

    #[test]
    fn test_register_duplicate() {
        let registry = CommandRegistry::new();
        registry.register(cmd("a", "A")).unwrap();
        assert!(matches!(
            registry.register(cmd("a", "Again")),
            Err(CommandError::DuplicateCommand(id)) if id == "a"
        ));
        assert_eq!(registry.get("a").unwrap().label(), "A");
    }

    #[test]
    fn test_unregister_allows_reuse() {
        let registry = CommandRegistry::new();
        registry.register(cmd("a", "A").with_shortcut("ctrl+a")).unwrap();
        registry.unregister("a").unwrap();

        assert!(!registry.has("a"));
        assert_eq!(registry.resolve_shortcut("CTRL+A").unwrap(), None);
        registry.register(cmd("a", "A2")).unwrap();
        assert_eq!(registry.get("a").unwrap().label(), "A2");
    }

    #[test]
    fn test_unregister_unknown() {
        let registry = CommandRegistry::new();
        assert!(matches!(
            registry.unregister("nope"),
            Err(CommandError::CommandNotFound(_))
        ));
    }

    #[test]
    fn test_register_replace_drops_old_bindings() {
        let registry = CommandRegistry::new();
        registry.register(cmd("a", "A").with_shortcut("ctrl+a")).unwrap();
        registry.bind_shortcut("ctrl+shift+a", "a").unwrap();

        registry
            .register_replace(cmd("a", "A2").with_shortcut("ctrl+b"))
            .unwrap();

        assert_eq!(registry.resolve_shortcut("ctrl+a").unwrap(), None);
        assert_eq!(registry.resolve_shortcut("ctrl+shift+a").unwrap(), None);
        assert_eq!(registry.resolve_shortcut("ctrl+b").unwrap().as_deref(), Some("a"));
        assert_eq!(registry.get("a").unwrap().label(), "A2");
    }

    #[test]
    fn test_register_default_shortcut_collision() {
        let registry = CommandRegistry::new();
        registry.register(cmd("a", "A").with_shortcut("ctrl+k")).unwrap();

        let err = registry
            .register(cmd("b", "B").with_shortcut("Ctrl+K"))
            .unwrap_err();
        assert!(matches!(
            err,
            CommandError::ShortcutAlreadyBound { ref shortcut, ref existing }
                if shortcut == "CTRL+K" && existing == "a"
        ));
        // Failed registration leaves no trace.
        assert!(!registry.has("b"));
    }

    #[test]
    fn test_register_invalid_shortcut() {
        let registry = CommandRegistry::new();
        let err = registry
            .register(cmd("a", "A").with_shortcut("ctrl+"))
            .unwrap_err();
        assert!(matches!(
            err,
            CommandError::InvalidShortcut(ShortcutError::NoKey(_))
        ));
        assert!(!registry.has("a"));
    }

    #[test]
    fn test_ids_and_all_ordering() {
        let registry = CommandRegistry::new();
        registry.register(cmd("c", "charlie").with_order(2)).unwrap();
        registry.register(cmd("b", "Bravo").with_order(1)).unwrap();
        registry.register(cmd("a", "alpha").with_order(2)).unwrap();

        assert_eq!(registry.ids(), vec!["c", "b", "a"]);
        let all: Vec<String> = registry.all().iter().map(|c| c.id().to_string()).collect();
        assert_eq!(all, vec!["b", "a", "c"]);
    }

    // =========================================================================
    // Shortcut Tests
    // =========================================================================

    #[test]
    fn test_bind_and_resolve() {
        let registry = CommandRegistry::new();
        registry.register(cmd("file.open", "Open")).unwrap();
        registry.bind_shortcut("ctrl+o", "file.open").unwrap();

        assert_eq!(
            registry.resolve_shortcut("Ctrl + O").unwrap().as_deref(),
            Some("file.open")
        );
        assert_eq!(registry.resolve_shortcut("ctrl+p").unwrap(), None);
        assert_eq!(registry.shortcuts_for("file.open"), vec!["CTRL+O"]);
    }

    #[test]
    fn test_bind_unknown_command() {
        let registry = CommandRegistry::new();
        assert!(matches!(
            registry.bind_shortcut("ctrl+o", "nope"),
            Err(CommandError::CommandNotFound(_))
        ));
    }

    #[test]
    fn test_shortcut_exclusivity() {
        let registry = CommandRegistry::new();
        registry.register(cmd("a", "A")).unwrap();
        registry.register(cmd("b", "B")).unwrap();
        registry.bind_shortcut("ctrl+k", "a").unwrap();

        assert!(matches!(
            registry.bind_shortcut("CTRL+K", "b"),
            Err(CommandError::ShortcutAlreadyBound { .. })
        ));
        assert_eq!(registry.resolve_shortcut("ctrl+k").unwrap().as_deref(), Some("a"));

        registry.bind_shortcut_replace("ctrl+k", "b").unwrap();
        assert_eq!(registry.resolve_shortcut("ctrl+k").unwrap().as_deref(), Some("b"));
        assert!(registry.shortcuts_for("a").is_empty());
    }

    #[test]
    fn test_rebind_same_command_is_not_collision() {
        let registry = CommandRegistry::new();
        registry.register(cmd("a", "A")).unwrap();
        registry.bind_shortcut("ctrl+k", "a").unwrap();
        registry.bind_shortcut("Ctrl+K", "a").unwrap();
        assert_eq!(registry.shortcuts_for("a").len(), 1);
    }

    #[test]
    fn test_unbind_shortcut() {
        let registry = CommandRegistry::new();
        registry.register(cmd("a", "A").with_shortcut("alt+x")).unwrap();
        assert_eq!(registry.unbind_shortcut("Alt+X").unwrap().as_deref(), Some("a"));
        assert_eq!(registry.unbind_shortcut("Alt+X").unwrap(), None);
        assert!(registry.resolve_shortcut("alt+x").unwrap().is_none());
    }

    #[test]
    fn test_resolve_invalid_shortcut() {
        let registry = CommandRegistry::new();
        assert!(matches!(
            registry.resolve_shortcut("   "),
            Err(CommandError::InvalidShortcut(ShortcutError::Empty))
        ));
    }

    // =========================================================================
    // Execution Tests
    // =========================================================================

    #[test]
    fn test_execute_returns_handler_value() {
        let registry = CommandRegistry::new();
        registry
            .register(Command::new("answer", "Answer", |_| Ok(Value::from(42))))
            .unwrap();
        assert_eq!(
            registry.execute("answer", &CommandContext::new()).unwrap(),
            Value::from(42)
        );
    }

    #[test]
    fn test_execute_unknown() {
        let registry = CommandRegistry::new();
        assert!(matches!(
            registry.execute("nope", &CommandContext::new()),
            Err(CommandError::CommandNotFound(_))
        ));
    }

    #[test]
    fn test_disabled_never_runs_handler() {
        let calls = Arc::new(AtomicUsize::new(0));
        let registry = CommandRegistry::new();
        registry.register(counting("a", &calls).with_enabled(false)).unwrap();

        let ctx = CommandContext::new();
        assert!(matches!(
            registry.execute("a", &ctx),
            Err(CommandError::CommandNotEnabled(_))
        ));
        assert!(matches!(
            registry.execute_ignoring_visibility("a", &ctx),
            Err(CommandError::CommandNotEnabled(_))
        ));
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_invisible_fails_before_handler() {
        let calls = Arc::new(AtomicUsize::new(0));
        let registry = CommandRegistry::new();
        registry
            .register(counting("a", &calls).with_visible_when(|_| false))
            .unwrap();

        assert!(matches!(
            registry.execute("a", &CommandContext::new()),
            Err(CommandError::CommandNotVisible(_))
        ));
        assert_eq!(calls.load(Ordering::SeqCst), 0);

        registry
            .execute_ignoring_visibility("a", &CommandContext::new())
            .unwrap();
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_visibility_checked_before_enablement() {
        let registry = CommandRegistry::new();
        registry
            .register(cmd("a", "A").with_visible(false).with_enabled(false))
            .unwrap();
        assert!(matches!(
            registry.execute("a", &CommandContext::new()),
            Err(CommandError::CommandNotVisible(_))
        ));
    }

    #[test]
    fn test_handler_failure_is_surfaced() {
        let registry = CommandRegistry::new();
        registry
            .register(Command::new("save", "Save", |_| Err("disk full".into())))
            .unwrap();
        let err = registry.execute("save", &CommandContext::new()).unwrap_err();
        assert_eq!(err.kind(), "HandlerFailed");
        assert_eq!(err.to_string(), "command \"save\" failed: disk full");
    }

    #[test]
    fn test_execute_shortcut() {
        let calls = Arc::new(AtomicUsize::new(0));
        let registry = CommandRegistry::new();
        registry.register(counting("a", &calls).with_shortcut("ctrl+a")).unwrap();

        registry.execute_shortcut("Ctrl+A", &CommandContext::new()).unwrap();
        assert_eq!(calls.load(Ordering::SeqCst), 1);

        let err = registry
            .execute_shortcut("ctrl+b", &CommandContext::new())
            .unwrap_err();
        assert_eq!(err.to_string(), "command not found for shortcut CTRL+B");
    }

    #[test]
    fn test_policy_queries() {
        let registry = CommandRegistry::new();
        registry
            .register(cmd("a", "A").with_enabled_when(|ctx| ctx.state().contains("ready")))
            .unwrap();

        let ctx = CommandContext::new();
        assert!(registry.is_visible("a", &ctx).unwrap());
        assert!(!registry.is_enabled("a", &ctx).unwrap());
        assert!(!registry.can_execute("a", &ctx).unwrap());

        ctx.state().set("ready", true);
        assert!(registry.can_execute("a", &ctx).unwrap());
        assert!(registry.is_visible("missing", &ctx).is_err());
    }

    #[test]
    fn test_handler_can_reenter_registry() {
        let registry = Arc::new(CommandRegistry::new());
        let inner = registry.clone();
        registry
            .register(Command::new("outer", "Outer", move |ctx| {
                inner.execute("leaf", ctx).map_err(Into::into)
            }))
            .unwrap();
        registry
            .register(Command::new("leaf", "Leaf", |_| Ok(Value::from("leaf"))))
            .unwrap();

        assert_eq!(
            registry.execute("outer", &CommandContext::new()).unwrap(),
            Value::from("leaf")
        );
    }

    #[test]
    fn test_duration_telemetry() {
        let (telemetry, sink) = Telemetry::memory();
        let registry = CommandRegistry::new().with_telemetry(telemetry);
        registry.register(cmd("a", "A")).unwrap();
        registry.execute("a", &CommandContext::new()).unwrap();

        let metrics = sink.metrics_named("command.duration");
        assert_eq!(metrics.len(), 1);
        assert_eq!(metrics[0].attrs["command_id"], json!("a"));
    }

    // =========================================================================
    // Search & Menu Tests
    // =========================================================================

    #[test]
    fn test_search_ranking() {
        let registry = CommandRegistry::new();
        registry.register(cmd("open", "Launch")).unwrap();
        registry.register(cmd("file.open", "Open File")).unwrap();
        registry.register(cmd("file.reopen", "Reopen")).unwrap();
        registry
            .register(cmd("view.tree", "Tree").with_description("Open folders"))
            .unwrap();
        registry
            .register(cmd("misc", "Misc").with_tags(["reopening"]))
            .unwrap();

        let ids: Vec<String> = registry
            .search("open", &CommandContext::new(), DEFAULT_SEARCH_LIMIT)
            .iter()
            .map(|c| c.id().to_string())
            .collect();
        // exact id, label prefix, id substring, description, tag
        assert_eq!(ids, vec!["open", "file.open", "file.reopen", "view.tree", "misc"]);
    }

    #[test]
    fn test_search_tie_break_and_limit() {
        let registry = CommandRegistry::new();
        registry.register(cmd("x.b", "Go B").with_order(2)).unwrap();
        registry.register(cmd("x.a", "go A").with_order(2)).unwrap();
        registry.register(cmd("x.c", "Go C").with_order(1)).unwrap();

        let ctx = CommandContext::new();
        let ids: Vec<String> = registry
            .search("GO", &ctx, 10)
            .iter()
            .map(|c| c.id().to_string())
            .collect();
        assert_eq!(ids, vec!["x.c", "x.a", "x.b"]);

        assert_eq!(registry.search("go", &ctx, 1).len(), 1);
        assert!(registry.search("go", &ctx, 0).is_empty());
        assert!(registry.search("   ", &ctx, 10).is_empty());
    }

    #[test]
    fn test_search_skips_invisible() {
        let registry = CommandRegistry::new();
        registry.register(cmd("secret", "Secret").with_visible(false)).unwrap();
        assert!(registry.search("secret", &CommandContext::new(), 10).is_empty());
    }

    #[test]
    fn test_list_for_menu() {
        let registry = CommandRegistry::new();
        registry.register(cmd("a", "A")).unwrap();
        registry.register(cmd("b", "B").with_visible(false)).unwrap();
        registry.register(cmd("c", "C")).unwrap();

        let ctx = CommandContext::new();
        let ids: Vec<String> = registry
            .list_for_menu(&["c", "b", "a"], &ctx)
            .unwrap()
            .iter()
            .map(|c| c.id().to_string())
            .collect();
        assert_eq!(ids, vec!["c", "a"]);

        assert!(registry.list_for_menu(&["a", "zzz"], &ctx).is_err());
    }
}
