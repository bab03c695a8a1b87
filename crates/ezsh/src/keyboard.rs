//! Conversion from winit keyboard input to canonical key sequences.
//!
//! Native window events arrive as a winit logical [`Key`] plus the current
//! [`ModifiersState`]. [`keyseq_from_winit`] turns that pair into a canonical
//! shortcut string (`CTRL+SHIFT+P`) that the key router resolves like any
//! other key sequence.

use ezsh_core::{Modifier, Modifiers, Shortcut};
use winit::keyboard::{Key, ModifiersState, NamedKey};

/// Converts winit modifier state to shortcut modifiers.
pub fn modifiers_from_winit(state: ModifiersState) -> Modifiers {
    let mut modifiers = Modifiers::NONE;
    if state.control_key() {
        modifiers.insert(Modifier::Ctrl);
    }
    if state.alt_key() {
        modifiers.insert(Modifier::Alt);
    }
    if state.shift_key() {
        modifiers.insert(Modifier::Shift);
    }
    if state.super_key() {
        modifiers.insert(Modifier::Cmd);
    }
    modifiers
}

/// Converts a winit logical key and modifier state to a canonical key sequence.
///
/// Returns `None` for bare modifier presses, dead keys, unidentified keys,
/// and named keys with no shortcut token.
pub fn keyseq_from_winit(key: &Key, modifiers: ModifiersState) -> Option<String> {
    let token = match key {
        Key::Named(named) => named_key_token(*named)?.to_string(),
        Key::Character(text) => character_token(text.as_str())?,
        Key::Unidentified(_) | Key::Dead(_) => return None,
    };
    Shortcut::new(modifiers_from_winit(modifiers), &token)
        .ok()
        .map(|shortcut| shortcut.to_string())
}

fn character_token(text: &str) -> Option<String> {
    let mut chars = text.chars();
    let ch = chars.next()?;
    if chars.next().is_some() || ch.is_whitespace() || ch.is_control() {
        return None;
    }
    if ch == '+' {
        return Some("PLUS".to_string());
    }
    Some(ch.to_uppercase().collect())
}

/// Shortcut token for a named key.
fn named_key_token(key: NamedKey) -> Option<&'static str> {
    let token = match key {
        // Navigation
        NamedKey::ArrowUp => "UP",
        NamedKey::ArrowDown => "DOWN",
        NamedKey::ArrowLeft => "LEFT",
        NamedKey::ArrowRight => "RIGHT",
        NamedKey::Home => "HOME",
        NamedKey::End => "END",
        NamedKey::PageUp => "PAGEUP",
        NamedKey::PageDown => "PAGEDOWN",

        // Editing
        NamedKey::Backspace => "BACKSPACE",
        NamedKey::Delete => "DELETE",
        NamedKey::Insert => "INSERT",
        NamedKey::Enter => "ENTER",
        NamedKey::Tab => "TAB",
        NamedKey::Space => "SPACE",
        NamedKey::Escape => "ESCAPE",

        // Function keys
        NamedKey::F1 => "F1",
        NamedKey::F2 => "F2",
        NamedKey::F3 => "F3",
        NamedKey::F4 => "F4",
        NamedKey::F5 => "F5",
        NamedKey::F6 => "F6",
        NamedKey::F7 => "F7",
        NamedKey::F8 => "F8",
        NamedKey::F9 => "F9",
        NamedKey::F10 => "F10",
        NamedKey::F11 => "F11",
        NamedKey::F12 => "F12",

        // Modifiers alone are not shortcuts
        NamedKey::Shift
        | NamedKey::Control
        | NamedKey::Alt
        | NamedKey::AltGraph
        | NamedKey::Super
        | NamedKey::Meta
        | NamedKey::Hyper => return None,

        _ => return None,
    };
    Some(token)
}
