//! Shortcut normalization for the command spine.
//!
//! This module provides:
//!
//! - [`Shortcut`]: a canonical `MOD+MOD+...+KEY` shortcut value
//! - [`normalize_shortcut`]: parse a human or canonical string into canonical form
//! - [`translate_platform_keyseq`]: translate bracketed platform key sequences
//!   such as `<Control-q>` or `<Command-KeyPress-comma>` into canonical form
//! - [`Shortcut::accelerator`]: platform-specific display text for menus
//!
//! # Canonical Form
//!
//! Modifiers are drawn from `CTRL`, `ALT`, `SHIFT`, `CMD` and always appear in
//! that order, deduplicated. Exactly one key token follows, uppercased.
//!
//! ```ignore
//! use ezsh_core::shortcut::{normalize_shortcut, translate_platform_keyseq};
//!
//! assert_eq!(normalize_shortcut("Shift+Ctrl+p")?, "CTRL+SHIFT+P");
//! assert_eq!(translate_platform_keyseq("<Command-comma>"), "CMD+,");
//! ```
//!
//! # Human Input vs Canonical Input
//!
//! Human input (`"ctrl + shift + p"`, `"Option+F4"`) is case-insensitive, accepts
//! modifier synonyms in any order, and requires an alphanumeric key token. A
//! literal symbol key such as `,` is accepted only when the whole string is
//! already exactly canonical (`"CMD+,"`), which is what
//! [`translate_platform_keyseq`] produces for named punctuation keys.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

// =============================================================================
// Modifiers
// =============================================================================

/// A single modifier key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Modifier {
    /// Control.
    Ctrl,
    /// Alt / Option.
    Alt,
    /// Shift.
    Shift,
    /// Command / Meta / Super.
    Cmd,
}

/// Canonical modifier order.
pub const MODIFIER_ORDER: [Modifier; 4] =
    [Modifier::Ctrl, Modifier::Alt, Modifier::Shift, Modifier::Cmd];

impl Modifier {
    /// The canonical upper-case name (`CTRL`, `ALT`, `SHIFT`, `CMD`).
    pub const fn canonical_name(self) -> &'static str {
        match self {
            Self::Ctrl => "CTRL",
            Self::Alt => "ALT",
            Self::Shift => "SHIFT",
            Self::Cmd => "CMD",
        }
    }

    /// Classify a modifier name, accepting common synonyms case-insensitively.
    pub fn from_name(name: &str) -> Option<Self> {
        match name.to_ascii_uppercase().as_str() {
            "CTRL" | "CONTROL" => Some(Self::Ctrl),
            "ALT" | "OPTION" => Some(Self::Alt),
            "SHIFT" => Some(Self::Shift),
            "CMD" | "COMMAND" | "META" => Some(Self::Cmd),
            _ => None,
        }
    }

    fn mac_symbol(self) -> &'static str {
        match self {
            Self::Ctrl => "⌃",
            Self::Alt => "⌥",
            Self::Shift => "⇧",
            Self::Cmd => "⌘",
        }
    }

    fn display_name(self) -> &'static str {
        match self {
            Self::Ctrl => "Ctrl",
            Self::Alt => "Alt",
            Self::Shift => "Shift",
            Self::Cmd => "Meta",
        }
    }
}

/// A set of held modifier keys.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Modifiers {
    /// Control key held.
    pub ctrl: bool,
    /// Alt / Option key held.
    pub alt: bool,
    /// Shift key held.
    pub shift: bool,
    /// Command / Meta key held.
    pub cmd: bool,
}

impl Modifiers {
    /// No modifiers.
    pub const NONE: Self = Self {
        ctrl: false,
        alt: false,
        shift: false,
        cmd: false,
    };

    /// Control only.
    pub const CTRL: Self = Self {
        ctrl: true,
        ..Self::NONE
    };

    /// Alt only.
    pub const ALT: Self = Self {
        alt: true,
        ..Self::NONE
    };

    /// Shift only.
    pub const SHIFT: Self = Self {
        shift: true,
        ..Self::NONE
    };

    /// Command only.
    pub const CMD: Self = Self {
        cmd: true,
        ..Self::NONE
    };

    /// Control and Shift.
    pub const CTRL_SHIFT: Self = Self {
        ctrl: true,
        shift: true,
        ..Self::NONE
    };

    /// Add a modifier to the set.
    pub fn insert(&mut self, modifier: Modifier) {
        match modifier {
            Modifier::Ctrl => self.ctrl = true,
            Modifier::Alt => self.alt = true,
            Modifier::Shift => self.shift = true,
            Modifier::Cmd => self.cmd = true,
        }
    }

    /// Builder form of [`insert`](Self::insert).
    pub fn with(mut self, modifier: Modifier) -> Self {
        self.insert(modifier);
        self
    }

    /// Check whether a modifier is in the set.
    pub fn contains(self, modifier: Modifier) -> bool {
        match modifier {
            Modifier::Ctrl => self.ctrl,
            Modifier::Alt => self.alt,
            Modifier::Shift => self.shift,
            Modifier::Cmd => self.cmd,
        }
    }

    /// Check if no modifier is held.
    pub fn is_empty(self) -> bool {
        self == Self::NONE
    }

    /// Iterate over the held modifiers in canonical order.
    pub fn iter(self) -> impl Iterator<Item = Modifier> {
        MODIFIER_ORDER
            .into_iter()
            .filter(move |modifier| self.contains(*modifier))
    }
}

// =============================================================================
// Platform
// =============================================================================

/// Platform family, used for default bindings and accelerator display.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Platform {
    /// macOS (Command-based shortcuts, symbol accelerators).
    MacOs,
    /// Windows.
    Windows,
    /// Linux and other Unix desktops.
    Unix,
}

impl Platform {
    /// The platform this binary was compiled for.
    pub fn current() -> Self {
        if cfg!(target_os = "macos") {
            Self::MacOs
        } else if cfg!(target_os = "windows") {
            Self::Windows
        } else {
            Self::Unix
        }
    }

    /// Check if this is macOS.
    pub fn is_mac(self) -> bool {
        matches!(self, Self::MacOs)
    }
}

// =============================================================================
// Errors
// =============================================================================

/// Error type for shortcut parsing (the `InvalidShortcut` failure kind).
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ShortcutError {
    /// The string is empty or whitespace.
    #[error("shortcut cannot be empty")]
    Empty,
    /// Only modifiers were given.
    #[error("shortcut {0:?} has no key")]
    NoKey(String),
    /// More than one non-modifier token was given.
    #[error("shortcut {shortcut:?} must include exactly one key, found {count}")]
    MultipleKeys { shortcut: String, count: usize },
    /// A symbol key written outside canonical form.
    #[error("key {0:?} is not a recognized key name")]
    UnsupportedKey(String),
}

// =============================================================================
// Shortcut
// =============================================================================

/// A shortcut in canonical `MOD+...+KEY` form.
///
/// Two shortcuts are equal iff their canonical strings are equal.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Shortcut {
    modifiers: Modifiers,
    key: String,
}

impl Shortcut {
    /// Parse a shortcut from human or canonical input.
    pub fn parse(raw: &str) -> Result<Self, ShortcutError> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Err(ShortcutError::Empty);
        }

        if let Some(shortcut) = parse_canonical(trimmed) {
            return Ok(shortcut);
        }

        parse_human(trimmed)
    }

    /// Build a shortcut from modifiers and a single key token.
    ///
    /// The key is uppercased. It must not be empty, contain whitespace or `+`,
    /// or name a modifier.
    pub fn new(modifiers: Modifiers, key: &str) -> Result<Self, ShortcutError> {
        let key = key.trim();
        if key.is_empty() || Modifier::from_name(key).is_some() {
            return Err(ShortcutError::NoKey(key.to_string()));
        }
        if key.contains('+') || key.chars().any(char::is_whitespace) {
            return Err(ShortcutError::UnsupportedKey(key.to_string()));
        }
        Ok(Self {
            modifiers,
            key: key.to_uppercase(),
        })
    }

    /// The held modifiers.
    pub fn modifiers(&self) -> Modifiers {
        self.modifiers
    }

    /// The key token.
    pub fn key(&self) -> &str {
        &self.key
    }

    /// Display text for a menu accelerator.
    ///
    /// macOS uses modifier symbols (`⇧⌘P`); other platforms spell them out
    /// (`Ctrl+Shift+P`).
    pub fn accelerator(&self, platform: Platform) -> String {
        let key = display_key(&self.key);
        if platform.is_mac() {
            let mut out: String = self.modifiers.iter().map(Modifier::mac_symbol).collect();
            out.push_str(&key);
            out
        } else {
            let mut parts: Vec<&str> = self.modifiers.iter().map(Modifier::display_name).collect();
            parts.push(&key);
            parts.join("+")
        }
    }
}

impl fmt::Display for Shortcut {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for modifier in self.modifiers.iter() {
            write!(f, "{}+", modifier.canonical_name())?;
        }
        f.write_str(&self.key)
    }
}

impl FromStr for Shortcut {
    type Err = ShortcutError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for Shortcut {
    type Error = ShortcutError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<Shortcut> for String {
    fn from(shortcut: Shortcut) -> Self {
        shortcut.to_string()
    }
}

/// Normalize a shortcut string to its canonical form.
///
/// # Examples
///
/// - `"ctrl+o"` -> `"CTRL+O"`
/// - `"Ctrl + Shift + p"` -> `"CTRL+SHIFT+P"`
/// - `"Shift+Ctrl+p"` -> `"CTRL+SHIFT+P"`
/// - `"cmd+k"` -> `"CMD+K"`
pub fn normalize_shortcut(raw: &str) -> Result<String, ShortcutError> {
    Shortcut::parse(raw).map(|shortcut| shortcut.to_string())
}

/// Accept the string only if it is already exactly canonical.
fn parse_canonical(s: &str) -> Option<Shortcut> {
    let mut parts: Vec<&str> = s.split('+').collect();
    let key = parts.pop()?;
    if !is_canonical_key(key) {
        return None;
    }

    let mut modifiers = Modifiers::NONE;
    let mut next = 0;
    for part in parts {
        let position = MODIFIER_ORDER
            .iter()
            .position(|modifier| modifier.canonical_name() == part)?;
        // Out of order or repeated.
        if position < next {
            return None;
        }
        modifiers.insert(MODIFIER_ORDER[position]);
        next = position + 1;
    }

    Some(Shortcut {
        modifiers,
        key: key.to_string(),
    })
}

fn is_canonical_key(key: &str) -> bool {
    !key.is_empty()
        && !key.chars().any(char::is_whitespace)
        && key.to_uppercase() == key
        && Modifier::from_name(key).is_none()
}

fn parse_human(s: &str) -> Result<Shortcut, ShortcutError> {
    let mut modifiers = Modifiers::NONE;
    let mut keys: Vec<&str> = Vec::new();

    for part in s.split('+').map(str::trim).filter(|part| !part.is_empty()) {
        match Modifier::from_name(part) {
            Some(modifier) => modifiers.insert(modifier),
            None => keys.push(part),
        }
    }

    match keys.as_slice() {
        [] => Err(ShortcutError::NoKey(s.to_string())),
        [key] => {
            if !key.chars().all(|ch| ch.is_ascii_alphanumeric()) {
                return Err(ShortcutError::UnsupportedKey((*key).to_string()));
            }
            Ok(Shortcut {
                modifiers,
                key: key.to_ascii_uppercase(),
            })
        }
        keys => Err(ShortcutError::MultipleKeys {
            shortcut: s.to_string(),
            count: keys.len(),
        }),
    }
}

fn display_key(key: &str) -> String {
    let mut chars = key.chars();
    match chars.next() {
        Some(first) if first.is_ascii_alphabetic() && key.len() > 1 && !is_function_key(key) => {
            let mut out = String::with_capacity(key.len());
            out.push(first);
            out.extend(chars.map(|ch| ch.to_ascii_lowercase()));
            out
        }
        _ => key.to_string(),
    }
}

fn is_function_key(key: &str) -> bool {
    key.strip_prefix('F')
        .is_some_and(|rest| !rest.is_empty() && rest.chars().all(|ch| ch.is_ascii_digit()))
}

// =============================================================================
// Platform Key Sequence Translation
// =============================================================================

/// Event-type markers that carry no key information.
const EVENT_NOISE: &[&str] = &["KEYPRESS", "KEYRELEASE", "KEY", "PRESS", "RELEASE"];

/// Named punctuation keys and the literal symbol they produce.
const NAMED_SYMBOLS: &[(&str, &str)] = &[
    ("comma", ","),
    ("period", "."),
    ("slash", "/"),
    ("backslash", "\\"),
    ("semicolon", ";"),
    ("colon", ":"),
    ("apostrophe", "'"),
    ("quoteright", "'"),
    ("quotedbl", "\""),
    ("grave", "`"),
    ("quoteleft", "`"),
    ("asciitilde", "~"),
    ("minus", "-"),
    ("underscore", "_"),
    ("equal", "="),
    ("bracketleft", "["),
    ("bracketright", "]"),
    ("braceleft", "{"),
    ("braceright", "}"),
    ("less", "<"),
    ("greater", ">"),
    ("question", "?"),
    ("bar", "|"),
    ("exclam", "!"),
];

/// Look up the literal symbol for a named punctuation key.
pub fn named_symbol(name: &str) -> Option<&'static str> {
    NAMED_SYMBOLS
        .iter()
        .find(|(named, _)| named.eq_ignore_ascii_case(name))
        .map(|(_, symbol)| *symbol)
}

/// Translate a bracketed platform key sequence into canonical shortcut form.
///
/// Input that is not in the `<...>` form, or that names no key, is returned
/// unchanged.
///
/// # Examples
///
/// - `"<Control-q>"` -> `"CTRL+Q"`
/// - `"<Control-Shift-p>"` -> `"CTRL+SHIFT+P"`
/// - `"<Command-KeyPress-q>"` -> `"CMD+Q"`
/// - `"<Command-comma>"` -> `"CMD+,"`
/// - `"Ctrl+Q"` -> `"Ctrl+Q"` (not bracketed)
pub fn translate_platform_keyseq(raw: &str) -> String {
    let Some(inner) = raw
        .trim()
        .strip_prefix('<')
        .and_then(|rest| rest.strip_suffix('>'))
    else {
        return raw.to_string();
    };

    let mut modifiers = Modifiers::NONE;
    let mut key: Option<&str> = None;

    for part in inner.split('-').map(str::trim).filter(|part| !part.is_empty()) {
        if EVENT_NOISE.contains(&part.to_ascii_uppercase().as_str()) {
            continue;
        }
        if let Some(modifier) = Modifier::from_name(part) {
            modifiers.insert(modifier);
            continue;
        }
        // The last non-modifier token is the key.
        key = Some(part);
    }

    let Some(key) = key else {
        return raw.to_string();
    };

    let key = match named_symbol(key) {
        Some(symbol) => symbol.to_string(),
        None => key.to_uppercase(),
    };

    let mut out = String::new();
    for modifier in modifiers.iter() {
        out.push_str(modifier.canonical_name());
        out.push('+');
    }
    out.push_str(&key);
    out
}
