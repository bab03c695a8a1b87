//! Status bar state.
//!
//! [`StatusService`] owns the text of the three status bar sections plus the
//! last key sequence and command seen by the shell. A UI widget attaches as a
//! [`StatusSink`]; anything else can observe changes through a callback.
//!
//! The shell registers the service under [`STATUS_SERVICE`], so command
//! handlers reach it with `ctx.service::<StatusService>("status")`.

use std::fmt;
use std::sync::Arc;

use parking_lot::Mutex;
use serde::Serialize;

use crate::logging::targets;

/// Service name the shell registers the status service under.
pub const STATUS_SERVICE: &str = "status";

/// A status bar section.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum StatusSection {
    /// Left-aligned section.
    Left,
    /// Centre section.
    Middle,
    /// Right-aligned section.
    Right,
}

impl StatusSection {
    /// All sections, left to right.
    pub const ALL: [StatusSection; 3] = [Self::Left, Self::Middle, Self::Right];

    /// Lower-case name.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Left => "left",
            Self::Middle => "middle",
            Self::Right => "right",
        }
    }
}

/// Implemented by UI status widgets.
pub trait StatusSink: Send + Sync {
    /// Display `text` in `section`.
    fn set_text(&self, section: StatusSection, text: &str);
}

/// Immutable copy of the status state.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct StatusSnapshot {
    /// Left section text.
    pub left: String,
    /// Middle section text.
    pub middle: String,
    /// Right section text.
    pub right: String,
    /// Last key sequence the shell handled.
    pub last_keyseq: String,
    /// Last command id the shell ran.
    pub last_command_id: String,
}

impl StatusSnapshot {
    /// Text of one section.
    pub fn section(&self, section: StatusSection) -> &str {
        match section {
            StatusSection::Left => &self.left,
            StatusSection::Middle => &self.middle,
            StatusSection::Right => &self.right,
        }
    }

    fn section_mut(&mut self, section: StatusSection) -> &mut String {
        match section {
            StatusSection::Left => &mut self.left,
            StatusSection::Middle => &mut self.middle,
            StatusSection::Right => &mut self.right,
        }
    }
}

/// Change callback.
pub type StatusCallback = Arc<dyn Fn(&StatusSnapshot) + Send + Sync>;

#[derive(Default)]
struct StatusState {
    snapshot: StatusSnapshot,
    sink: Option<Arc<dyn StatusSink>>,
    on_change: Option<StatusCallback>,
}

/// Owns status state and publishes it to an optional sink.
#[derive(Default)]
pub struct StatusService {
    state: Mutex<StatusState>,
}

impl StatusService {
    /// Create a service with empty sections.
    pub fn new() -> Self {
        Self::default()
    }

    /// Attach or detach a sink.
    ///
    /// On attach, every non-empty section is pushed to the sink. Empty
    /// sections are skipped so the widget keeps its own defaults.
    pub fn attach_sink(&self, sink: Option<Arc<dyn StatusSink>>) {
        let snapshot = {
            let mut state = self.state.lock();
            state.sink = sink.clone();
            state.snapshot.clone()
        };
        let Some(sink) = sink else {
            return;
        };
        for section in StatusSection::ALL {
            let text = snapshot.section(section);
            if !text.is_empty() {
                sink.set_text(section, text);
            }
        }
    }

    /// Install or remove the change callback. A new callback is called once
    /// immediately with the current state.
    pub fn set_on_change(&self, callback: Option<StatusCallback>) {
        let snapshot = {
            let mut state = self.state.lock();
            state.on_change = callback.clone();
            state.snapshot.clone()
        };
        if let Some(callback) = callback {
            callback(&snapshot);
        }
    }

    /// Copy the current state.
    pub fn snapshot(&self) -> StatusSnapshot {
        self.state.lock().snapshot.clone()
    }

    /// Set a section's text.
    pub fn set(&self, section: StatusSection, message: &str) {
        tracing::trace!(target: targets::STATUS, section = section.as_str(), message, "status");
        let (sink, callback, snapshot) = {
            let mut state = self.state.lock();
            *state.snapshot.section_mut(section) = message.to_string();
            (state.sink.clone(), state.on_change.clone(), state.snapshot.clone())
        };
        if let Some(sink) = sink {
            sink.set_text(section, message);
        }
        if let Some(callback) = callback {
            callback(&snapshot);
        }
    }

    /// Clear a section.
    pub fn clear(&self, section: StatusSection) {
        self.set(section, "");
    }

    /// Set the left section.
    pub fn set_left(&self, message: &str) {
        self.set(StatusSection::Left, message);
    }

    /// Set the middle section.
    pub fn set_middle(&self, message: &str) {
        self.set(StatusSection::Middle, message);
    }

    /// Set the right section.
    pub fn set_right(&self, message: &str) {
        self.set(StatusSection::Right, message);
    }

    /// Record the last key sequence.
    pub fn set_last_keyseq(&self, keyseq: &str) {
        self.update(|snapshot| snapshot.last_keyseq = keyseq.to_string());
    }

    /// Record the last command id.
    pub fn set_last_command_id(&self, command_id: &str) {
        self.update(|snapshot| snapshot.last_command_id = command_id.to_string());
    }

    fn update(&self, f: impl FnOnce(&mut StatusSnapshot)) {
        let (callback, snapshot) = {
            let mut state = self.state.lock();
            f(&mut state.snapshot);
            (state.on_change.clone(), state.snapshot.clone())
        };
        if let Some(callback) = callback {
            callback(&snapshot);
        }
    }
}

impl fmt::Debug for StatusService {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("StatusService")
            .field(&self.state.lock().snapshot)
            .finish()
    }
}
