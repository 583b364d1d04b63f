//! Collaborators that present engine state to a user.

use licsync_codec::Record;
use std::fmt;

/// How prominent a notification is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Severity {
    /// Progress or neutral information.
    Info,
    /// An operation completed.
    Success,
    /// Degraded but usable.
    Warning,
    /// An operation failed.
    Error,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Severity::Info => "info",
            Severity::Success => "success",
            Severity::Warning => "warning",
            Severity::Error => "error",
        };
        f.write_str(s)
    }
}

/// Receives (severity, message) pairs from the engine.
pub trait Notifier: Send + Sync {
    /// Delivers one notification.
    fn notify(&self, severity: Severity, message: &str);
}

/// Redraws the record list.
pub trait RenderSurface: Send + Sync {
    /// Called with the full collection after every change.
    fn render(&self, records: &[Record]);
}

/// Forwards notifications to `tracing`.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingNotifier;

impl Notifier for TracingNotifier {
    fn notify(&self, severity: Severity, message: &str) {
        match severity {
            Severity::Info | Severity::Success => tracing::info!(%severity, "{message}"),
            Severity::Warning => tracing::warn!("{message}"),
            Severity::Error => tracing::error!("{message}"),
        }
    }
}

/// A surface that draws nothing.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullSurface;

impl RenderSurface for NullSurface {
    fn render(&self, _records: &[Record]) {}
}
