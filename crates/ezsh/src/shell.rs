//! The headless shell host.
//!
//! [`Shell`] wires the core pieces together: a command registry with the
//! default commands, a global key map with the platform defaults, a key router
//! over it, a status service, and telemetry built from configuration. It builds
//! the [`CommandContext`] handed to every command and is the single entry point
//! for key input, menu selection, and direct invocation.
//!
//! Key input never fails at this boundary. Routing errors are logged, reported
//! through telemetry, and turned into [`KeyDisposition::Propagate`] so the
//! caller can hand the event on to the focused widget.

use std::path::Path;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use ezsh_core::telemetry::attrs;
use ezsh_core::{
    Command, CommandContext, CommandError, CommandRegistry, KeyMap, KeyMapError, KeyRouter,
    Platform, Services, SharedState, StateMap, Telemetry, Value, translate_platform_keyseq,
};
use parking_lot::RwLock;
use serde_json::json;
use winit::keyboard::{Key, ModifiersState};

use crate::config::{ConfigError, ShellConfig};
use crate::default_commands::{QUIT, register_default_commands};
use crate::default_keys::build_default_keymap;
use crate::keyboard::keyseq_from_winit;
use crate::logging::targets;
use crate::menu::{MenuBarModel, MenuDef};
use crate::status::{STATUS_SERVICE, StatusService};

/// State key holding the current mode.
pub const MODE_KEY: &str = "mode";

/// State key holding the focused component id.
pub const FOCUS_KEY: &str = "focused_component_id";

/// Key sequence a native macOS Quit menu item reports.
pub const NATIVE_QUIT_KEYSEQ: &str = "<Command-q>";

/// Errors from building or configuring a [`Shell`].
#[derive(Debug, thiserror::Error)]
pub enum ShellError {
    /// Configuration could not be loaded.
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// A command or shortcut operation failed.
    #[error(transparent)]
    Command(#[from] CommandError),

    /// A key map edit failed.
    #[error(transparent)]
    KeyMap(#[from] KeyMapError),
}

/// What the caller should do with a key event after the shell saw it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyDisposition {
    /// A command ran; stop propagation.
    Handled,
    /// Nothing ran; pass the event on.
    Propagate,
}

impl KeyDisposition {
    /// Check whether a command ran.
    pub fn is_handled(self) -> bool {
        self == Self::Handled
    }
}

/// The host object placed in every command context.
///
/// Handlers reach it with `ctx.host::<ShellHost>()`.
#[derive(Debug)]
pub struct ShellHost {
    title: String,
    quit_requested: AtomicBool,
}

impl ShellHost {
    /// Create a host.
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            quit_requested: AtomicBool::new(false),
        }
    }

    /// Application title.
    pub fn title(&self) -> &str {
        &self.title
    }

    /// Ask the application to exit.
    pub fn request_quit(&self) {
        tracing::info!(target: targets::SHELL, "quit requested");
        self.quit_requested.store(true, Ordering::SeqCst);
    }

    /// Check whether a quit was requested.
    pub fn quit_requested(&self) -> bool {
        self.quit_requested.load(Ordering::SeqCst)
    }
}

/// The shell host.
pub struct Shell {
    config: ShellConfig,
    platform: Platform,
    host: Arc<ShellHost>,
    state: SharedState,
    services: Services,
    registry: Arc<CommandRegistry>,
    keymap: Arc<RwLock<KeyMap>>,
    router: KeyRouter,
    status: Arc<StatusService>,
    telemetry: Telemetry,
}

impl Shell {
    /// Build a shell for the current platform.
    pub fn new(config: ShellConfig) -> Result<Self, ShellError> {
        Self::with_platform(config, Platform::current())
    }

    /// Load configuration (see [`ShellConfig::load_or_default`]) and build a
    /// shell for the current platform.
    pub fn load(path: Option<&Path>) -> Result<Self, ShellError> {
        Self::new(ShellConfig::load_or_default(path)?)
    }

    /// Build a shell for a specific platform.
    ///
    /// The default key map is applied to the registry with replace. Key
    /// bindings from `config.keys` join the global key map immediately, but
    /// are only bound in the registry by [`apply_keymap`](Self::apply_keymap),
    /// since they may name commands registered later.
    pub fn with_platform(config: ShellConfig, platform: Platform) -> Result<Self, ShellError> {
        let telemetry = Telemetry::from_config(&config.telemetry);
        telemetry.event("app.init", attrs([("title", json!(config.title))]));

        let host = Arc::new(ShellHost::new(config.title.clone()));
        let state = SharedState::new();
        state.set(MODE_KEY, Value::Null);

        let status = Arc::new(StatusService::new());
        let services = Services::new();
        services.insert(STATUS_SERVICE, status.clone());

        let registry = Arc::new(CommandRegistry::new().with_telemetry(telemetry.clone()));
        register_default_commands(&registry, platform, &config.title)?;

        let mut keymap = build_default_keymap(platform);
        keymap.apply_replace(&*registry)?;
        keymap.extend_from(&config.keys);
        let keymap = Arc::new(RwLock::new(keymap));

        let router = KeyRouter::new(registry.clone(), keymap.clone())
            .with_shortcut_fallback(true)
            .with_telemetry(telemetry.clone());
        let focus_state = state.clone();
        router.set_focus_provider(Some(Arc::new(move || focus_state.get_str(FOCUS_KEY))));

        status.set_left("Ready");
        status.set_right(&config.title);

        tracing::debug!(
            target: targets::SHELL,
            title = %config.title,
            ?platform,
            commands = registry.len(),
            "shell initialized"
        );

        Ok(Self {
            config,
            platform,
            host,
            state,
            services,
            registry,
            keymap,
            router,
            status,
            telemetry,
        })
    }

    // =========================================================================
    // Accessors
    // =========================================================================

    /// The configuration the shell was built from.
    pub fn config(&self) -> &ShellConfig {
        &self.config
    }

    /// The platform conventions in use.
    pub fn platform(&self) -> Platform {
        self.platform
    }

    /// The host placed in every context.
    pub fn host(&self) -> &Arc<ShellHost> {
        &self.host
    }

    /// Shared state.
    pub fn state(&self) -> &SharedState {
        &self.state
    }

    /// Shared services.
    pub fn services(&self) -> &Services {
        &self.services
    }

    /// The command registry.
    pub fn registry(&self) -> &Arc<CommandRegistry> {
        &self.registry
    }

    /// The key router.
    pub fn router(&self) -> &KeyRouter {
        &self.router
    }

    /// The global key map.
    pub fn keymap(&self) -> &Arc<RwLock<KeyMap>> {
        &self.keymap
    }

    /// The status service.
    pub fn status(&self) -> &Arc<StatusService> {
        &self.status
    }

    /// Telemetry.
    pub fn telemetry(&self) -> &Telemetry {
        &self.telemetry
    }

    /// Check whether a command asked the application to exit.
    pub fn quit_requested(&self) -> bool {
        self.host.quit_requested()
    }

    // =========================================================================
    // Commands
    // =========================================================================

    /// Register a command.
    pub fn register_command(&self, command: Command) -> Result<(), CommandError> {
        self.registry.register(command)
    }

    /// Register a command, replacing any with the same id.
    pub fn register_command_replace(&self, command: Command) -> Result<(), CommandError> {
        self.registry.register_replace(command)
    }

    /// Build a context carrying the host, state, services, and `extra`.
    pub fn build_context(&self, extra: StateMap) -> CommandContext {
        CommandContext::new()
            .with_host(self.host.clone())
            .with_state(self.state.clone())
            .with_services(self.services.clone())
            .with_extras(extra)
    }

    /// Build a context with no extras.
    pub fn context(&self) -> CommandContext {
        self.build_context(StateMap::new())
    }

    /// Invoke a command by id, requiring it to be visible and enabled.
    pub fn invoke(&self, id: &str) -> Result<Value, CommandError> {
        self.invoke_with(id, StateMap::new(), true)
    }

    /// Invoke a command by id with extras.
    ///
    /// With `require_visible` false only the enabled predicate is checked.
    pub fn invoke_with(
        &self,
        id: &str,
        extra: StateMap,
        require_visible: bool,
    ) -> Result<Value, CommandError> {
        self.telemetry
            .event("command.invoke", attrs([("command_id", json!(id))]));
        let ctx = self.build_context(extra);
        let value = if require_visible {
            self.registry.execute(id, &ctx)?
        } else {
            self.registry.execute_ignoring_visibility(id, &ctx)?
        };
        self.status.set_last_command_id(id);
        Ok(value)
    }

    /// Invoke the command bound to a shortcut.
    ///
    /// Accepts human (`ctrl+q`), canonical (`CTRL+Q`), or platform (`<Control-q>`)
    /// forms.
    pub fn invoke_shortcut(&self, shortcut: &str) -> Result<Value, CommandError> {
        let translated = translate_platform_keyseq(shortcut);
        self.telemetry
            .event("shortcut.invoke", attrs([("shortcut", json!(translated))]));
        let _timer = self
            .telemetry
            .timer("shortcut.duration", attrs([("shortcut", json!(translated))]));
        self.registry.execute_shortcut(&translated, &self.context())
    }

    /// Fuzzy search over visible commands.
    pub fn search(&self, query: &str, limit: usize) -> Vec<Command> {
        self.registry.search(query, &self.context(), limit)
    }

    // =========================================================================
    // Key Bindings
    // =========================================================================

    /// Bind a key sequence in the global key map, overwriting.
    pub fn bind_key(&self, keyseq: &str, id: &str) -> Result<(), ShellError> {
        self.keymap.write().bind(keyseq, id)?;
        Ok(())
    }

    /// Bind a key sequence in the global key map, refusing to overwrite.
    pub fn try_bind_key(&self, keyseq: &str, id: &str) -> Result<(), ShellError> {
        self.keymap.write().try_bind(keyseq, id)?;
        Ok(())
    }

    /// Bind every global key map entry in the registry as a shortcut.
    pub fn apply_keymap(&self) -> Result<(), ShellError> {
        self.keymap.read().apply(&*self.registry)?;
        Ok(())
    }

    /// Like [`apply_keymap`](Self::apply_keymap), taking shortcuts over from
    /// other commands.
    pub fn apply_keymap_replace(&self) -> Result<(), ShellError> {
        self.keymap.read().apply_replace(&*self.registry)?;
        Ok(())
    }

    // =========================================================================
    // Mode & Focus
    // =========================================================================

    /// Set or clear the current mode.
    pub fn set_mode(&self, mode: Option<&str>) {
        let mode = mode.filter(|m| !m.is_empty());
        self.state
            .set(MODE_KEY, mode.map_or(Value::Null, |m| json!(m)));
        self.router.set_mode(mode);
    }

    /// The current mode.
    pub fn mode(&self) -> Option<String> {
        self.state.get_str(MODE_KEY)
    }

    /// Set or clear the focused component.
    pub fn set_focus(&self, component_id: Option<&str>) {
        match component_id.filter(|id| !id.is_empty()) {
            Some(id) => {
                self.state.set(FOCUS_KEY, id);
            }
            None => {
                self.state.remove(FOCUS_KEY);
            }
        }
    }

    /// The focused component.
    pub fn focus(&self) -> Option<String> {
        self.state.get_str(FOCUS_KEY)
    }

    // =========================================================================
    // Input
    // =========================================================================

    /// Route a key sequence.
    ///
    /// The router mode is synced from state first, so handlers that write
    /// `mode` directly take effect on the next key. When no key map layer
    /// matches, the router falls back to the registry's canonical shortcuts,
    /// so `CTRL+Q` from a native key event reaches the same command as
    /// `<Control-q>`.
    pub fn handle_keyseq(&self, keyseq: &str) -> KeyDisposition {
        match self.route_keyseq(keyseq) {
            Ok(Some(_)) => KeyDisposition::Handled,
            Ok(None) => KeyDisposition::Propagate,
            Err(err) => {
                self.report_route_error(keyseq, &err);
                KeyDisposition::Propagate
            }
        }
    }

    /// Route once. `Ok(None)` means nothing is bound; errors come from the
    /// command that was bound.
    fn route_keyseq(&self, keyseq: &str) -> Result<Option<String>, CommandError> {
        self.status.set_last_keyseq(keyseq);
        let mode = self.state.get_str(MODE_KEY);
        self.router.set_mode(mode.as_deref());

        let found = self.router.route(keyseq, &self.context())?;
        if let Some(found) = &found {
            self.status.set_last_command_id(&found.command_id);
        }
        Ok(found.map(|found| found.command_id))
    }

    fn report_route_error(&self, keyseq: &str, err: &CommandError) {
        tracing::warn!(target: targets::SHELL, keyseq, error = %err, "key routing failed");
        self.telemetry.event(
            "keyrouter.error",
            attrs([("keyseq", json!(keyseq)), ("error", json!(err.kind()))]),
        );
    }

    /// Route a winit key event.
    pub fn handle_winit_key(&self, key: &Key, modifiers: ModifiersState) -> KeyDisposition {
        match keyseq_from_winit(key, modifiers) {
            Some(keyseq) => self.handle_keyseq(&keyseq),
            None => KeyDisposition::Propagate,
        }
    }

    /// Handle the native Quit menu item.
    ///
    /// Routes [`NATIVE_QUIT_KEYSEQ`] so user bindings apply. Only when nothing
    /// is bound does it run the quit command directly, ignoring visibility. A
    /// bound command that fails is reported and not retried.
    pub fn handle_native_quit(&self) -> KeyDisposition {
        match self.route_keyseq(NATIVE_QUIT_KEYSEQ) {
            Ok(Some(_)) => KeyDisposition::Handled,
            Ok(None) => match self.invoke_with(QUIT, StateMap::new(), false) {
                Ok(_) => KeyDisposition::Handled,
                Err(err) => {
                    tracing::warn!(target: targets::SHELL, error = %err, "native quit failed");
                    KeyDisposition::Propagate
                }
            },
            Err(err) => {
                self.report_route_error(NATIVE_QUIT_KEYSEQ, &err);
                KeyDisposition::Propagate
            }
        }
    }

    // =========================================================================
    // Menus
    // =========================================================================

    /// Run a command chosen from a menu.
    pub fn select_menu_item(&self, command_id: &str, menu_path: &str) -> Result<Value, CommandError> {
        self.telemetry.event(
            "menu.select",
            attrs([
                ("command_id", json!(command_id)),
                ("menu_path", json!(menu_path)),
            ]),
        );
        self.invoke(command_id)
    }

    /// Resolve menu declarations against the current state.
    pub fn menu_bar(&self, menus: &[MenuDef]) -> MenuBarModel {
        MenuBarModel::build(
            menus,
            &self.registry,
            &self.context(),
            self.platform,
            self.config.auto_app_menu,
        )
    }
}

impl std::fmt::Debug for Shell {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Shell")
            .field("title", &self.config.title)
            .field("platform", &self.platform)
            .field("registry", &self.registry)
            .field("router", &self.router)
            .finish_non_exhaustive()
    }
}

static_assertions::assert_impl_all!(Shell: Send, Sync);
