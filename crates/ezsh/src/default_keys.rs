//! Platform default key bindings.
//!
//! Bindings are written in platform-native form so they match what native
//! window systems report. Each is applied to the registry as a canonical
//! shortcut and also consulted directly by the router's global layer.

use ezsh_core::{KeyMap, Platform};

use crate::default_commands::{PREFERENCES, QUIT};

/// Build the default global key map for a platform.
///
/// macOS binds the Command variants (including the `KeyPress` and `Meta`
/// spellings some toolkits report) and keeps the Control variants for
/// compatibility. Other platforms bind the Control variants only.
pub fn build_default_keymap(platform: Platform) -> KeyMap {
    let mut bindings: Vec<(&str, &str)> = Vec::new();

    if platform.is_mac() {
        bindings.extend([
            ("<Command-q>", QUIT),
            ("<Command-KeyPress-q>", QUIT),
            ("<Meta-KeyPress-q>", QUIT),
            ("<Command-comma>", PREFERENCES),
            ("<Command-KeyPress-comma>", PREFERENCES),
            ("<Meta-KeyPress-comma>", PREFERENCES),
        ]);
    }

    bindings.extend([
        ("<Control-q>", QUIT),
        ("<Control-KeyPress-q>", QUIT),
        ("<Control-comma>", PREFERENCES),
        ("<Control-KeyPress-comma>", PREFERENCES),
    ]);

    bindings.into_iter().collect()
}
