//! Command spine for ezsh.
//!
//! This crate provides the indirection layer that lets menu items, keyboard
//! shortcuts and platform hooks all resolve to the same named action:
//!
//! - **Shortcuts**: canonical `MOD+...+KEY` normalization and platform key
//!   sequence translation
//! - **Commands**: named actions with handlers and enablement/visibility policy
//! - **Registry**: command table, shortcut index, execution and fuzzy search
//! - **Key Maps**: raw key sequence → command id tables
//! - **Key Router**: component → mode → global layered resolution
//! - **Context**: the per-call bundle passed to handlers and predicates
//! - **Telemetry**: optional, injected event and metric recording
//!
//! # Registry Example
//!
//! ```
//! use ezsh_core::{Command, CommandContext, CommandRegistry, Value};
//!
//! let registry = CommandRegistry::new();
//! registry
//!     .register(Command::new("app.quit", "Quit", |_ctx| Ok(Value::Null)).with_shortcut("Ctrl+Q"))
//!     .unwrap();
//!
//! assert_eq!(registry.resolve_shortcut("ctrl+q").unwrap().as_deref(), Some("app.quit"));
//! registry.execute_shortcut("CTRL+Q", &CommandContext::new()).unwrap();
//! ```
//!
//! # Routing Example
//!
//! ```
//! use std::sync::Arc;
//! use ezsh_core::{Command, CommandContext, CommandRegistry, KeyMap, KeyRouter, RouteLayer, Value};
//!
//! let registry = Arc::new(CommandRegistry::new());
//! registry.register(Command::new("app.quit", "Quit", |_| Ok(Value::Null))).unwrap();
//! registry.register(Command::new("editor.close", "Close", |_| Ok(Value::Null))).unwrap();
//!
//! let global = KeyMap::new().with_binding("<Control-w>", "app.quit");
//! let router = KeyRouter::new(registry, global);
//! router.register_mode_keymap("editor", KeyMap::new().with_binding("CTRL+W", "editor.close"));
//!
//! assert_eq!(router.resolve("<Control-w>").unwrap().layer, RouteLayer::Global);
//!
//! router.set_mode(Some("editor"));
//! let routed = router.route("<Control-KeyPress-w>", &CommandContext::new()).unwrap();
//! assert_eq!(routed.unwrap().command_id, "editor.close");
//! ```

pub mod command;
pub mod context;
mod error;
pub mod keymap;
pub mod logging;
pub mod registry;
pub mod router;
pub mod shortcut;
pub mod telemetry;

pub use command::{Command, CommandId, DEFAULT_ORDER, Handler, HandlerResult, Predicate};
pub use context::{CommandContext, Services, SharedState, StateMap, Value};
pub use error::{CommandError, HandlerError, KeyMapError, Lookup, Result};
pub use keymap::{KeyMap, KeyResolver, ShortcutBinder};
pub use registry::{CommandRegistry, DEFAULT_SEARCH_LIMIT};
pub use router::{FocusProvider, KeyRouter, RouteLayer, RouteMatch};
pub use shortcut::{
    Modifier, Modifiers, Platform, Shortcut, ShortcutError, normalize_shortcut,
    translate_platform_keyseq,
};
pub use telemetry::{
    LogSink, MemorySink, NullSink, SinkKind, Telemetry, TelemetryConfig, TelemetryEvent,
    TelemetryMetric, TelemetrySink,
};
