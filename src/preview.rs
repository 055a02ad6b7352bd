//! Last-write-wins delivery for live previews.
//!
//! A form re-renders on every (debounced) edit. Each render takes a ticket; only the newest
//! ticket's result is ever delivered, so a slow render for stale input cannot overwrite the
//! preview of newer input.

use crate::error::Result;
use crate::generator::{generate_qr_code, QrCodeResult};
use crate::options::QrCodeOptions;
use std::sync::atomic::{AtomicU64, Ordering};
use tracing::debug;

/// Identifies one preview request. Newer tickets compare greater.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct PreviewTicket(u64);

#[derive(Debug, Default)]
pub struct PreviewScheduler {
    latest: AtomicU64,
}

impl PreviewScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Starts a new request, superseding every earlier ticket.
    pub fn begin(&self) -> PreviewTicket {
        PreviewTicket(self.latest.fetch_add(1, Ordering::AcqRel) + 1)
    }

    pub fn is_current(&self, ticket: PreviewTicket) -> bool {
        self.latest.load(Ordering::Acquire) == ticket.0
    }

    /// Hands `value` back only if `ticket` has not been superseded meanwhile.
    pub fn deliver<T>(&self, ticket: PreviewTicket, value: T) -> Option<T> {
        if self.is_current(ticket) {
            Some(value)
        } else {
            debug!(ticket = ticket.0, "Dropping superseded preview");
            None
        }
    }

    /// Renders a preview for `ticket`.
    ///
    /// Returns `None` when the ticket was superseded before or during rendering. Errors are
    /// delivered under the same rule as results.
    pub fn render(
        &self,
        ticket: PreviewTicket,
        text: &str,
        options: &QrCodeOptions,
    ) -> Option<Result<QrCodeResult>> {
        if !self.is_current(ticket) {
            debug!(ticket = ticket.0, "Skipping superseded preview");
            return None;
        }
        let result = generate_qr_code(text, options);
        self.deliver(ticket, result)
    }
}
