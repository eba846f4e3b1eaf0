//! Hand-off to the mail transport.
//!
//! The composed message travels as a single `mailto:` address. Delivery is
//! fire-and-forget: the workflow never learns whether it succeeded.

use percent_encoding::{utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};
use tracing::{info, warn};

/// Bytes left unescaped in a URI component, besides ASCII alphanumerics.
const URI_COMPONENT: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'!')
    .remove(b'~')
    .remove(b'*')
    .remove(b'\'')
    .remove(b'(')
    .remove(b')');

/// Percent-encode `value` as a URI component (UTF-8, `%XX` escapes).
pub fn encode_component(value: &str) -> String {
    utf8_percent_encode(value, URI_COMPONENT).to_string()
}

/// Build the `mailto:` address handed to the transport.
///
/// The recipient is used verbatim; cc, subject and body are encoded.
/// Callers gate this behind the send guard.
pub fn build_transport_address(recipient: &str, cc_address: &str, subject: &str, body: &str) -> String {
    format!(
        "mailto:{recipient}?cc={cc}&subject={subject}&body={body}",
        cc = encode_component(cc_address),
        subject = encode_component(subject),
        body = encode_component(body),
    )
}

/// Collaborator that delivers a composed address.
pub trait MailTransport: Send + Sync {
    /// Deliver the message. Failures stay inside the transport.
    fn deliver(&self, address: &str);
}

/// Transport that prints the address on stdout for an external mail client.
#[derive(Debug, Default, Clone, Copy)]
pub struct StdoutTransport;

impl MailTransport for StdoutTransport {
    fn deliver(&self, address: &str) {
        use std::io::Write;

        let mut stdout = std::io::stdout().lock();
        match writeln!(stdout, "{address}") {
            Ok(()) => info!(len = address.len(), "message handed to transport"),
            Err(e) => warn!(error = %e, "failed to write transport address"),
        }
    }
}
