//! Logging facilities for the ezsh command spine.
//!
//! ezsh uses the `tracing` crate for instrumentation. The core never installs
//! a subscriber; applications do that (see `ezsh::logging::init_logging`).
//!
//! ```ignore
//! // Show every routing decision, but only warnings from everything else.
//! RUST_LOG=warn,ezsh_core::router=trace ezsh
//! ```

/// Target names for log filtering.
///
/// Use these with `tracing` directives to filter logs by subsystem.
pub mod targets {
    /// Core crate target.
    pub const CORE: &str = "ezsh_core";
    /// Command registry target.
    pub const REGISTRY: &str = "ezsh_core::registry";
    /// Key map target.
    pub const KEYMAP: &str = "ezsh_core::keymap";
    /// Key router target.
    pub const ROUTER: &str = "ezsh_core::router";
    /// Telemetry log sink target.
    pub const TELEMETRY: &str = "ezsh_core::telemetry";
}
