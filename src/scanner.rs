//! Scan event handling.
//!
//! A continuously scanning camera reports the same code many times per
//! second. Only a payload that differs from the pending one replaces it.

use tracing::debug;

use crate::capture::{DecodeEvent, Symbology};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScanMode {
    /// Camera is live, nothing pending.
    Scanning,
    /// A code is pending confirmation.
    Result,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScanTransition {
    Accepted,
    /// Same payload as the pending one.
    Duplicate,
    /// Not a QR code, or an empty payload.
    Filtered,
}

#[derive(Debug, Default)]
pub struct ScanSession {
    pending: Option<String>,
}

impl ScanSession {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn pending(&self) -> Option<&str> {
        self.pending.as_deref()
    }

    pub fn mode(&self) -> ScanMode {
        if self.pending.is_some() {
            ScanMode::Result
        } else {
            ScanMode::Scanning
        }
    }

    pub fn on_decode(&mut self, event: &DecodeEvent) -> ScanTransition {
        if event.symbology != Symbology::Qr || event.payload.is_empty() {
            debug!(symbology = %event.symbology, "ignoring decode event");
            return ScanTransition::Filtered;
        }

        if self.pending.as_deref() == Some(event.payload.as_str()) {
            return ScanTransition::Duplicate;
        }

        debug!(payload = %event.payload, "new pending scan");
        self.pending = Some(event.payload.clone());
        ScanTransition::Accepted
    }

    /// Drop the pending code and go back to scanning.
    pub fn clear(&mut self) {
        self.pending = None;
    }

    /// Clear only if `payload` is still the pending code.
    pub fn clear_if(&mut self, payload: &str) {
        if self.pending.as_deref() == Some(payload) {
            self.pending = None;
        }
    }
}
