//! Diagnostics events for validation failures and consistency checks
//!
//! The store reports what happened; a [`DiagnosticSink`] decides where it
//! goes. The sink is injected per store instance.

use tokio::sync::mpsc::UnboundedSender;
use tracing::{error, info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Severity {
    Info,
    Warning,
    Fatal,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiagnosticEvent {
    pub severity: Severity,
    /// Store operation that produced the event (e.g., "add_child")
    pub operation: &'static str,
    pub message: String,
}

impl DiagnosticEvent {
    pub fn new(severity: Severity, operation: &'static str, message: impl Into<String>) -> Self {
        DiagnosticEvent {
            severity,
            operation,
            message: message.into(),
        }
    }
}

/// Receiver of diagnostics events
pub trait DiagnosticSink: std::fmt::Debug {
    fn emit(&self, event: DiagnosticEvent);
}

/// Default sink: forwards events to `tracing`
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingSink;

impl DiagnosticSink for TracingSink {
    fn emit(&self, event: DiagnosticEvent) {
        match event.severity {
            Severity::Info => info!(operation = event.operation, "{}", event.message),
            Severity::Warning => warn!(operation = event.operation, "{}", event.message),
            Severity::Fatal => error!(operation = event.operation, "{}", event.message),
        }
    }
}

/// Sink that queues events on an unbounded channel
#[derive(Debug, Clone)]
pub struct ChannelSink {
    sender: UnboundedSender<DiagnosticEvent>,
}

impl ChannelSink {
    pub fn new(sender: UnboundedSender<DiagnosticEvent>) -> Self {
        ChannelSink { sender }
    }
}

impl DiagnosticSink for ChannelSink {
    fn emit(&self, event: DiagnosticEvent) {
        // A dropped receiver just means nobody is listening any more
        let _ = self.sender.send(event);
    }
}

/// Sink that discards everything
#[derive(Debug, Default, Clone, Copy)]
pub struct NullSink;

impl DiagnosticSink for NullSink {
    fn emit(&self, _event: DiagnosticEvent) {}
}
