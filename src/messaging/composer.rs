//! Message body composition from the current selection.
//!
//! The body is a pure projection of the selection: preamble, a blank line,
//! one `"<name> - <identifier>"` line per selected record, a blank line, and
//! the business name as signature.

use crate::roster::CandidateRecord;

/// Opening lines of the validation request.
pub const DEFAULT_PREAMBLE: &str = "Saludos,\nNecesito validar status de los siguientes asegurados:";

/// Subject line used until the operator edits it.
pub const DEFAULT_SUBJECT: &str = "Saludos, necesito validar status de asegurados.";

/// Preamble and signature used to render message bodies.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MessageTemplate {
    preamble: String,
    business_name: String,
}

impl MessageTemplate {
    /// Create a template with a custom preamble.
    pub fn new(preamble: &str, business_name: &str) -> Self {
        Self {
            preamble: preamble.to_owned(),
            business_name: business_name.to_owned(),
        }
    }

    /// Create a template with [`DEFAULT_PREAMBLE`].
    pub fn with_default_preamble(business_name: &str) -> Self {
        Self::new(DEFAULT_PREAMBLE, business_name)
    }

    /// Business name used as signature.
    pub fn business_name(&self) -> &str {
        &self.business_name
    }

    /// Render the body for `selection`.
    pub fn body(&self, selection: &[CandidateRecord]) -> String {
        compose_with_preamble(&self.preamble, selection, &self.business_name)
    }
}

/// Compose a body with [`DEFAULT_PREAMBLE`].
pub fn compose(selection: &[CandidateRecord], business_name: &str) -> String {
    compose_with_preamble(DEFAULT_PREAMBLE, selection, business_name)
}

/// Compose a body with an explicit preamble.
///
/// An empty selection renders no record block at all, so the preamble is
/// followed directly by the signature.
pub fn compose_with_preamble(
    preamble: &str,
    selection: &[CandidateRecord],
    business_name: &str,
) -> String {
    let mut body = String::with_capacity(256);
    body.push_str(preamble);
    if !selection.is_empty() {
        body.push_str("\n\n");
        let lines: Vec<String> = selection.iter().map(record_line).collect();
        body.push_str(&lines.join("\n"));
    }
    body.push_str("\n\n");
    body.push_str(business_name);
    body
}

/// One body line for a selected record.
pub fn record_line(record: &CandidateRecord) -> String {
    format!("{} - {}", record.display_name, record.identifier_str())
}
