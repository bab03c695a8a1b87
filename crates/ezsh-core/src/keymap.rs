//! Key maps: raw key sequence → command id tables.
//!
//! A [`KeyMap`] stores bindings under the exact key sequence string it was given,
//! which may be platform-native (`<Control-q>`) or canonical (`CTRL+Q`). It is
//! either consulted directly by a [`KeyRouter`](crate::router::KeyRouter) layer
//! or applied in bulk to a [`CommandRegistry`](crate::registry::CommandRegistry).
//!
//! # Resolution
//!
//! [`KeyMap::resolve_keyseq`] tries the exact string first and only then the
//! platform-translated form. An explicit raw binding is never shadowed by a
//! canonical binding that happens to translate to the same shortcut.
//!
//! # Serialization
//!
//! A key map serializes as a plain ordered map:
//!
//! ```toml
//! "<Control-q>" = "app.quit"
//! "CTRL+SHIFT+P" = "palette.open"
//! ```

use std::sync::Arc;

use indexmap::IndexMap;
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};

use crate::command::CommandId;
use crate::error::{KeyMapError, Result};
use crate::logging::targets;
use crate::shortcut::translate_platform_keyseq;

// =============================================================================
// Traits
// =============================================================================

/// Something that resolves a key sequence to a command id.
///
/// This is all the key router needs from a layer.
pub trait KeyResolver {
    /// Resolve a key sequence, exact match first, then translated.
    fn resolve_keyseq(&self, keyseq: &str) -> Option<CommandId>;
}

/// Something that accepts canonical shortcut bindings.
///
/// This is all [`KeyMap::apply`] needs from a registry.
pub trait ShortcutBinder {
    /// Bind a shortcut to a command id.
    fn bind_shortcut(&self, shortcut: &str, id: &str, replace: bool) -> Result<()>;
}

// =============================================================================
// KeyMap
// =============================================================================

/// A table of key sequence → command id bindings.
///
/// Many key sequences may map to the same command. Each key sequence maps to
/// at most one command.
///
/// Serializes as a plain `keyseq = "command.id"` table. Deserialization goes
/// through [`bind`](Self::bind), so empty key sequences or command ids are
/// rejected.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(
    try_from = "IndexMap<String, CommandId>",
    into = "IndexMap<String, CommandId>"
)]
pub struct KeyMap {
    bindings: IndexMap<String, CommandId>,
}

impl KeyMap {
    /// Create an empty key map.
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder form of [`bind`](Self::bind).
    ///
    /// A binding with an empty key sequence or command id is skipped (with a
    /// `warn` log), since a builder cannot report it. Use [`bind`](Self::bind)
    /// or `KeyMap::try_from` to surface the error.
    pub fn with_binding(mut self, keyseq: impl Into<String>, id: impl Into<CommandId>) -> Self {
        if let Err(err) = self.bind(keyseq, id) {
            tracing::warn!(target: targets::KEYMAP, error = %err, "skipping invalid binding");
        }
        self
    }

    /// Bind a key sequence, overwriting any previous binding for it.
    pub fn bind(
        &mut self,
        keyseq: impl Into<String>,
        id: impl Into<CommandId>,
    ) -> std::result::Result<(), KeyMapError> {
        let (keyseq, id) = validate(keyseq.into(), id.into())?;
        self.bindings.insert(keyseq, id);
        Ok(())
    }

    /// Bind a key sequence, refusing to overwrite an existing binding.
    pub fn try_bind(
        &mut self,
        keyseq: impl Into<String>,
        id: impl Into<CommandId>,
    ) -> std::result::Result<(), KeyMapError> {
        let (keyseq, id) = validate(keyseq.into(), id.into())?;
        if let Some(existing) = self.bindings.get(&keyseq) {
            return Err(KeyMapError::BindingExists {
                keyseq,
                existing: existing.clone(),
            });
        }
        self.bindings.insert(keyseq, id);
        Ok(())
    }

    /// Remove a binding. Returns the command id it pointed at.
    pub fn unbind(&mut self, keyseq: &str) -> Option<CommandId> {
        self.bindings.shift_remove(keyseq)
    }

    /// Remove every binding.
    pub fn clear(&mut self) {
        self.bindings.clear();
    }

    /// Exact-match lookup, no translation.
    pub fn resolve(&self, keyseq: &str) -> Option<&str> {
        self.bindings.get(keyseq).map(String::as_str)
    }

    /// Exact match first; otherwise look up the platform-translated form.
    pub fn resolve_keyseq(&self, keyseq: &str) -> Option<CommandId> {
        if let Some(id) = self.bindings.get(keyseq) {
            return Some(id.clone());
        }
        let translated = translate_platform_keyseq(keyseq);
        if translated == keyseq {
            return None;
        }
        self.bindings.get(&translated).cloned()
    }

    /// Bound key sequences, in binding order.
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.bindings.keys().map(String::as_str)
    }

    /// `(keyseq, command id)` pairs, in binding order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.bindings
            .iter()
            .map(|(keyseq, id)| (keyseq.as_str(), id.as_str()))
    }

    /// Number of bindings.
    pub fn len(&self) -> usize {
        self.bindings.len()
    }

    /// Check whether the map has no bindings.
    pub fn is_empty(&self) -> bool {
        self.bindings.is_empty()
    }

    /// Copy every binding in `other` into this map, overwriting.
    pub fn extend_from(&mut self, other: &KeyMap) {
        for (keyseq, id) in other.iter() {
            self.bindings.insert(keyseq.to_string(), id.to_string());
        }
    }

    /// Bind every entry into `registry` as a canonical shortcut.
    ///
    /// Stops at the first failure; bindings applied before it stay applied.
    pub fn apply<B: ShortcutBinder + ?Sized>(&self, registry: &B) -> Result<()> {
        self.apply_inner(registry, false)
    }

    /// Like [`apply`](Self::apply), but each binding takes the shortcut over
    /// from any other command.
    pub fn apply_replace<B: ShortcutBinder + ?Sized>(&self, registry: &B) -> Result<()> {
        self.apply_inner(registry, true)
    }

    fn apply_inner<B: ShortcutBinder + ?Sized>(&self, registry: &B, replace: bool) -> Result<()> {
        for (keyseq, id) in &self.bindings {
            let canonical = translate_platform_keyseq(keyseq);
            tracing::trace!(target: targets::KEYMAP, %keyseq, %canonical, %id, replace, "applying binding");
            registry.bind_shortcut(&canonical, id, replace)?;
        }
        tracing::debug!(target: targets::KEYMAP, count = self.bindings.len(), "applied key map");
        Ok(())
    }
}

fn validate(keyseq: String, id: CommandId) -> std::result::Result<(String, CommandId), KeyMapError> {
    if keyseq.trim().is_empty() {
        return Err(KeyMapError::EmptyKeySequence);
    }
    if id.trim().is_empty() {
        return Err(KeyMapError::EmptyCommandId);
    }
    Ok((keyseq, id))
}

impl TryFrom<IndexMap<String, CommandId>> for KeyMap {
    type Error = KeyMapError;

    fn try_from(bindings: IndexMap<String, CommandId>) -> std::result::Result<Self, Self::Error> {
        let mut map = Self::new();
        for (keyseq, id) in bindings {
            map.bind(keyseq, id)?;
        }
        Ok(map)
    }
}

impl From<KeyMap> for IndexMap<String, CommandId> {
    fn from(map: KeyMap) -> Self {
        map.bindings
    }
}

impl<K, V> FromIterator<(K, V)> for KeyMap
where
    K: Into<String>,
    V: Into<CommandId>,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        iter.into_iter()
            .fold(Self::new(), |map, (keyseq, id)| map.with_binding(keyseq, id))
    }
}

impl KeyResolver for KeyMap {
    fn resolve_keyseq(&self, keyseq: &str) -> Option<CommandId> {
        KeyMap::resolve_keyseq(self, keyseq)
    }
}

impl KeyResolver for RwLock<KeyMap> {
    fn resolve_keyseq(&self, keyseq: &str) -> Option<CommandId> {
        self.read().resolve_keyseq(keyseq)
    }
}

impl<T: KeyResolver + ?Sized> KeyResolver for Arc<T> {
    fn resolve_keyseq(&self, keyseq: &str) -> Option<CommandId> {
        (**self).resolve_keyseq(keyseq)
    }
}
