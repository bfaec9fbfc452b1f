//! Logging shim shared by the workspace crates.
//!
//! With the `telemetry` feature the calls go to `tracing`; without it,
//! warnings are printed to stderr and debug output is dropped.

/// Emits a warning, e.g. when a solver hits its iteration cap.
pub fn warn(message: &str) {
    #[cfg(feature = "telemetry")]
    tracing::warn!(target: "outfitplan", "{message}");
    #[cfg(not(feature = "telemetry"))]
    eprintln!("warning: {message}");
}

/// Emits a debug line. No-op without `telemetry`.
pub fn debug(message: &str) {
    #[cfg(feature = "telemetry")]
    tracing::debug!(target: "outfitplan", "{message}");
    #[cfg(not(feature = "telemetry"))]
    let _ = message;
}
