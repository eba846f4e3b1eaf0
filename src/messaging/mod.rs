//! Messaging: body composition and the outbound draft handed to transport.

pub mod composer;
pub mod transport;

use serde::Serialize;

pub use composer::{compose, MessageTemplate, DEFAULT_PREAMBLE, DEFAULT_SUBJECT};
pub use transport::{build_transport_address, MailTransport, StdoutTransport};

/// The editable outbound message.
///
/// `body` is regenerated on every selection change, so manual edits only
/// last until the selection changes again.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct OutboundMessage {
    /// Address the validation request goes to.
    pub recipient: String,
    /// Fixed copy address of the business.
    pub cc_address: String,
    /// Subject line.
    pub subject: String,
    /// Message body.
    pub body: String,
}

impl OutboundMessage {
    /// Whether the draft may be sent with `selected_count` selected records.
    ///
    /// Requires a recipient, a subject, a body and a non-empty selection.
    /// Blank means empty after trimming.
    pub fn can_send(&self, selected_count: usize) -> bool {
        selected_count > 0
            && !self.recipient.trim().is_empty()
            && !self.subject.trim().is_empty()
            && !self.body.trim().is_empty()
    }

    /// The transport address, or `None` while sending is disabled.
    pub fn transport_address(&self, selected_count: usize) -> Option<String> {
        if !self.can_send(selected_count) {
            return None;
        }
        Some(build_transport_address(
            self.recipient.trim(),
            &self.cc_address,
            &self.subject,
            &self.body,
        ))
    }
}
