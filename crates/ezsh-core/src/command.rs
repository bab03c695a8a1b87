//! The command model.
//!
//! A [`Command`] is a named action with a handler, enablement and visibility
//! policy, an optional default shortcut, and search/menu metadata.
//!
//! ```ignore
//! use ezsh_core::{Command, Predicate, Value};
//!
//! let save = Command::new("file.save", "Save", |_ctx| Ok(Value::Null))
//!     .with_shortcut("Ctrl+S")
//!     .with_tags(["file", "write"])
//!     .with_enabled_when(|ctx| ctx.state().get("dirty") == Some(Value::Bool(true)));
//! ```

use std::fmt;
use std::sync::Arc;

use crate::context::{CommandContext, Value};
use crate::error::HandlerError;

/// Command identifier, e.g. `"app.quit"`.
pub type CommandId = String;

/// What a handler returns.
pub type HandlerResult = std::result::Result<Value, HandlerError>;

/// A command handler.
pub type Handler = Arc<dyn Fn(&CommandContext) -> HandlerResult + Send + Sync>;

/// A dynamic enablement or visibility predicate.
pub type PredicateFn = Arc<dyn Fn(&CommandContext) -> bool + Send + Sync>;

/// Default sort order for commands that do not set one.
pub const DEFAULT_ORDER: i32 = 1000;

// =============================================================================
// Predicate
// =============================================================================

/// Enablement or visibility: a fixed flag or a function of the context.
#[derive(Clone)]
pub enum Predicate {
    /// Always this value.
    Static(bool),
    /// Evaluated against each context.
    Dynamic(PredicateFn),
}

impl Predicate {
    /// Create a dynamic predicate.
    pub fn when<F>(f: F) -> Self
    where
        F: Fn(&CommandContext) -> bool + Send + Sync + 'static,
    {
        Self::Dynamic(Arc::new(f))
    }

    /// Evaluate against a context.
    pub fn evaluate(&self, ctx: &CommandContext) -> bool {
        match self {
            Self::Static(value) => *value,
            Self::Dynamic(f) => f(ctx),
        }
    }

    /// Check whether this is a fixed flag.
    pub fn is_static(&self) -> bool {
        matches!(self, Self::Static(_))
    }
}

impl Default for Predicate {
    fn default() -> Self {
        Self::Static(true)
    }
}

impl From<bool> for Predicate {
    fn from(value: bool) -> Self {
        Self::Static(value)
    }
}

impl fmt::Debug for Predicate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Static(value) => f.debug_tuple("Static").field(value).finish(),
            Self::Dynamic(_) => f.write_str("Dynamic(..)"),
        }
    }
}

// =============================================================================
// Command
// =============================================================================

/// A named, describable action.
///
/// Commands are immutable once built. Changing a registered command means
/// registering a new one with replace.
#[derive(Clone)]
pub struct Command {
    id: CommandId,
    label: String,
    handler: Handler,
    description: String,
    tags: Vec<String>,
    shortcut: Option<String>,
    enabled: Predicate,
    visible: Predicate,
    order: i32,
}

impl Command {
    /// Create a command that is enabled and visible, with no shortcut.
    pub fn new<F>(id: impl Into<CommandId>, label: impl Into<String>, handler: F) -> Self
    where
        F: Fn(&CommandContext) -> HandlerResult + Send + Sync + 'static,
    {
        Self {
            id: id.into(),
            label: label.into(),
            handler: Arc::new(handler),
            description: String::new(),
            tags: Vec::new(),
            shortcut: None,
            enabled: Predicate::default(),
            visible: Predicate::default(),
            order: DEFAULT_ORDER,
        }
    }

    /// Set the description.
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    /// Set the search tags.
    pub fn with_tags<I, S>(mut self, tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.tags = tags.into_iter().map(Into::into).collect();
        self
    }

    /// Set the default shortcut. It is normalized when the command is registered.
    pub fn with_shortcut(mut self, shortcut: impl Into<String>) -> Self {
        self.shortcut = Some(shortcut.into());
        self
    }

    /// Set a fixed enablement flag.
    pub fn with_enabled(mut self, enabled: bool) -> Self {
        self.enabled = Predicate::Static(enabled);
        self
    }

    /// Set a dynamic enablement predicate.
    pub fn with_enabled_when<F>(mut self, f: F) -> Self
    where
        F: Fn(&CommandContext) -> bool + Send + Sync + 'static,
    {
        self.enabled = Predicate::when(f);
        self
    }

    /// Set a fixed visibility flag.
    pub fn with_visible(mut self, visible: bool) -> Self {
        self.visible = Predicate::Static(visible);
        self
    }

    /// Set a dynamic visibility predicate.
    pub fn with_visible_when<F>(mut self, f: F) -> Self
    where
        F: Fn(&CommandContext) -> bool + Send + Sync + 'static,
    {
        self.visible = Predicate::when(f);
        self
    }

    /// Set the menu/palette sort order.
    pub fn with_order(mut self, order: i32) -> Self {
        self.order = order;
        self
    }

    /// The command id.
    pub fn id(&self) -> &str {
        &self.id
    }

    /// The human label.
    pub fn label(&self) -> &str {
        &self.label
    }

    /// The description (may be empty).
    pub fn description(&self) -> &str {
        &self.description
    }

    /// The search tags.
    pub fn tags(&self) -> &[String] {
        &self.tags
    }

    /// The default shortcut as given, before normalization.
    pub fn shortcut(&self) -> Option<&str> {
        self.shortcut.as_deref()
    }

    /// The enablement policy.
    pub fn enabled(&self) -> &Predicate {
        &self.enabled
    }

    /// The visibility policy.
    pub fn visible(&self) -> &Predicate {
        &self.visible
    }

    /// The sort order.
    pub fn order(&self) -> i32 {
        self.order
    }

    /// Evaluate visibility.
    pub fn is_visible(&self, ctx: &CommandContext) -> bool {
        self.visible.evaluate(ctx)
    }

    /// Evaluate enablement.
    pub fn is_enabled(&self, ctx: &CommandContext) -> bool {
        self.enabled.evaluate(ctx)
    }

    /// Run the handler without any policy checks.
    pub(crate) fn invoke(&self, ctx: &CommandContext) -> HandlerResult {
        (self.handler)(ctx)
    }
}

impl fmt::Debug for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Command")
            .field("id", &self.id)
            .field("label", &self.label)
            .field("shortcut", &self.shortcut)
            .field("enabled", &self.enabled)
            .field("visible", &self.visible)
            .field("order", &self.order)
            .finish_non_exhaustive()
    }
}

static_assertions::assert_impl_all!(Command: Send, Sync);
