//! Layered key routing.
//!
//! The [`KeyRouter`] resolves a key sequence to a command id through three
//! layers, highest priority first:
//!
//! 1. **Component**: the key map registered for the focused target, if a focus
//!    provider is installed and reports a target with a key map.
//! 2. **Mode**: the key map registered for the current mode, if any.
//! 3. **Global**: the key map given at construction.
//!
//! A router built [`with_shortcut_fallback`](KeyRouter::with_shortcut_fallback)
//! consults a fourth layer last: the registry's canonical shortcut table, so
//! `CTRL+Q` reaches a command bound as `<Control-q>` once that binding has
//! been applied to the registry.
//!
//! The first layer that yields a command id wins. A missing layer and a layer
//! with no binding for the sequence are treated the same way.
//!
//! Resolved commands run through the registry with visibility required.
//! Execution errors propagate to the caller; only "nothing bound" is reported
//! as a non-error outcome.

use std::fmt;
use std::sync::Arc;

use indexmap::IndexMap;
use parking_lot::RwLock;
use serde_json::json;

use crate::command::CommandId;
use crate::context::CommandContext;
use crate::error::Result;
use crate::keymap::KeyResolver;
use crate::logging::targets;
use crate::registry::CommandRegistry;
use crate::shortcut::translate_platform_keyseq;
use crate::telemetry::{Telemetry, attrs};

/// Returns the id of the focused target, if any.
pub type FocusProvider = Arc<dyn Fn() -> Option<String> + Send + Sync>;

/// A key map layer shared with the router.
pub type SharedResolver = Arc<dyn KeyResolver + Send + Sync>;

/// Which layer produced a match.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RouteLayer {
    /// The focused target's key map.
    Component,
    /// The current mode's key map.
    Mode,
    /// The global key map.
    Global,
    /// The registry's canonical shortcut table, consulted last when enabled.
    Shortcut,
}

impl RouteLayer {
    /// Lower-case name, used as a telemetry attribute.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Component => "component",
            Self::Mode => "mode",
            Self::Global => "global",
            Self::Shortcut => "shortcut",
        }
    }
}

impl fmt::Display for RouteLayer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A resolved command and the layer it came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RouteMatch {
    /// The resolved command id.
    pub command_id: CommandId,
    /// The layer that matched.
    pub layer: RouteLayer,
}

#[derive(Default)]
struct RouterState {
    mode: Option<String>,
    focus_provider: Option<FocusProvider>,
    mode_keymaps: IndexMap<String, SharedResolver>,
    component_keymaps: IndexMap<String, SharedResolver>,
}

/// Routes key sequences to commands through component, mode and global layers.
pub struct KeyRouter {
    registry: Arc<CommandRegistry>,
    global: SharedResolver,
    shortcut_fallback: bool,
    state: RwLock<RouterState>,
    telemetry: Telemetry,
}

impl KeyRouter {
    /// Create a router over a registry and a global key map.
    pub fn new<R>(registry: Arc<CommandRegistry>, global: R) -> Self
    where
        R: KeyResolver + Send + Sync + 'static,
    {
        Self {
            registry,
            global: Arc::new(global),
            shortcut_fallback: false,
            state: RwLock::new(RouterState::default()),
            telemetry: Telemetry::default(),
        }
    }

    /// Attach telemetry.
    pub fn with_telemetry(mut self, telemetry: Telemetry) -> Self {
        self.telemetry = telemetry;
        self
    }

    /// Resolve through the registry's shortcut table when no key map layer
    /// matches. The key sequence is translated to canonical form first.
    pub fn with_shortcut_fallback(mut self, enabled: bool) -> Self {
        self.shortcut_fallback = enabled;
        self
    }

    /// The registry commands execute through.
    pub fn registry(&self) -> &Arc<CommandRegistry> {
        &self.registry
    }

    // =========================================================================
    // Mode & Focus
    // =========================================================================

    /// Set or clear the current mode. An empty string clears it.
    pub fn set_mode(&self, mode: Option<&str>) {
        let mode = mode.filter(|m| !m.is_empty()).map(str::to_string);
        tracing::trace!(target: targets::ROUTER, ?mode, "mode changed");
        self.state.write().mode = mode;
    }

    /// The current mode.
    pub fn mode(&self) -> Option<String> {
        self.state.read().mode.clone()
    }

    /// Install or remove the focus provider.
    pub fn set_focus_provider(&self, provider: Option<FocusProvider>) {
        self.state.write().focus_provider = provider;
    }

    /// Ask the focus provider for the focused target. Empty ids count as none.
    pub fn focused_target(&self) -> Option<String> {
        let provider = self.state.read().focus_provider.clone()?;
        provider().filter(|id| !id.is_empty())
    }

    // =========================================================================
    // Layers
    // =========================================================================

    /// Register the key map used while `mode` is active, replacing any other.
    pub fn register_mode_keymap<R>(&self, mode: impl Into<String>, keymap: R)
    where
        R: KeyResolver + Send + Sync + 'static,
    {
        let mode = mode.into();
        tracing::debug!(target: targets::ROUTER, %mode, "registered mode key map");
        self.state.write().mode_keymaps.insert(mode, Arc::new(keymap));
    }

    /// Remove a mode key map. Returns whether one was registered.
    pub fn unregister_mode_keymap(&self, mode: &str) -> bool {
        self.state.write().mode_keymaps.shift_remove(mode).is_some()
    }

    /// Register the key map used while `target_id` has focus, replacing any other.
    pub fn register_component_keymap<R>(&self, target_id: impl Into<String>, keymap: R)
    where
        R: KeyResolver + Send + Sync + 'static,
    {
        let target_id = target_id.into();
        tracing::debug!(target: targets::ROUTER, %target_id, "registered component key map");
        self.state
            .write()
            .component_keymaps
            .insert(target_id, Arc::new(keymap));
    }

    /// Remove a component key map. Returns whether one was registered.
    pub fn unregister_component_keymap(&self, target_id: &str) -> bool {
        self.state
            .write()
            .component_keymaps
            .shift_remove(target_id)
            .is_some()
    }

    // =========================================================================
    // Resolution
    // =========================================================================

    /// Resolve a key sequence through the layers.
    pub fn resolve(&self, keyseq: &str) -> Option<RouteMatch> {
        // The focus provider and key maps run with the router lock released.
        if let Some(target) = self.focused_target() {
            let keymap = self.state.read().component_keymaps.get(&target).cloned();
            if let Some(id) = keymap.and_then(|map| map.resolve_keyseq(keyseq)) {
                return Some(RouteMatch {
                    command_id: id,
                    layer: RouteLayer::Component,
                });
            }
        }

        let mode_keymap = {
            let state = self.state.read();
            state
                .mode
                .as_ref()
                .and_then(|mode| state.mode_keymaps.get(mode).cloned())
        };
        if let Some(id) = mode_keymap.and_then(|map| map.resolve_keyseq(keyseq)) {
            return Some(RouteMatch {
                command_id: id,
                layer: RouteLayer::Mode,
            });
        }

        if let Some(id) = self.global.resolve_keyseq(keyseq) {
            return Some(RouteMatch {
                command_id: id,
                layer: RouteLayer::Global,
            });
        }

        if !self.shortcut_fallback {
            return None;
        }
        // Sequences that are not valid shortcuts have no binding.
        self.registry
            .resolve_shortcut(&translate_platform_keyseq(keyseq))
            .ok()
            .flatten()
            .map(|id| RouteMatch {
                command_id: id,
                layer: RouteLayer::Shortcut,
            })
    }

    /// Resolve a key sequence to a command id.
    pub fn resolve_command_id(&self, keyseq: &str) -> Option<CommandId> {
        self.resolve(keyseq).map(|found| found.command_id)
    }

    // =========================================================================
    // Routing
    // =========================================================================

    /// Resolve and execute. Returns the match that ran, or `None` if nothing
    /// is bound.
    pub fn route(&self, keyseq: &str, ctx: &CommandContext) -> Result<Option<RouteMatch>> {
        self.telemetry
            .counter("key.pressed", 1.0, attrs([("keyseq", json!(keyseq))]));

        let Some(found) = self.resolve(keyseq) else {
            tracing::trace!(target: targets::ROUTER, keyseq, "unhandled key sequence");
            self.telemetry
                .event("key.unhandled", attrs([("keyseq", json!(keyseq))]));
            return Ok(None);
        };

        tracing::debug!(
            target: targets::ROUTER,
            keyseq,
            command_id = %found.command_id,
            layer = %found.layer,
            "dispatching"
        );
        self.telemetry.event(
            "command.dispatched",
            attrs([
                ("command_id", json!(found.command_id)),
                ("keyseq", json!(keyseq)),
                ("layer", json!(found.layer.as_str())),
            ]),
        );

        self.registry.execute(&found.command_id, ctx)?;
        Ok(Some(found))
    }

    /// Resolve and execute. Returns `false` if nothing is bound.
    pub fn route_keyseq(&self, keyseq: &str, ctx: &CommandContext) -> Result<bool> {
        Ok(self.route(keyseq, ctx)?.is_some())
    }
}

impl fmt::Debug for KeyRouter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.state.read();
        f.debug_struct("KeyRouter")
            .field("mode", &state.mode)
            .field("has_focus_provider", &state.focus_provider.is_some())
            .field("shortcut_fallback", &self.shortcut_fallback)
            .field("mode_keymaps", &state.mode_keymaps.keys().collect::<Vec<_>>())
            .field(
                "component_keymaps",
                &state.component_keymaps.keys().collect::<Vec<_>>(),
            )
            .finish_non_exhaustive()
    }
}

static_assertions::assert_impl_all!(KeyRouter: Send, Sync);
