//! One invocation of the identity validation workflow.
//!
//! [`Workflow`] wraps a [`SelectionEngine`] with the outbound draft and the
//! external collaborators: the record editor, the mail transport and an
//! optional close observer. The body is recomposed after every transition
//! that changes the selection.

use std::sync::Arc;

use serde::Serialize;
use tracing::{debug, info};

use crate::config::Config;
use crate::messaging::{MailTransport, MessageTemplate, OutboundMessage};
use crate::roster::CandidateRecord;
use crate::selection::{EscrowMode, EscrowPolicy, SelectionEngine};

/// Collaborator that edits a record outside the workflow.
///
/// The outcome is only visible through the next roster snapshot.
pub trait RecordEditor: Send + Sync {
    /// Open an editor for `record`.
    fn request_edit(&self, record: &CandidateRecord);
}

/// Receives the close notification.
pub trait WorkflowObserver: Send + Sync {
    /// Called once when the workflow is dismissed or after a send.
    fn on_close(&self, selected_ids: &[String]);
}

/// Coarse workflow state, derived from the engine and the draft.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    /// Not opened yet.
    Idle,
    /// Opened, nothing selected.
    Populated,
    /// The escrow view is showing.
    EditingEscrow,
    /// Records are selected but the draft cannot be sent yet.
    Selecting,
    /// The draft can be sent.
    ReadyToSend,
    /// Dismissed. Terminal.
    Closed,
}

/// Settings a workflow is opened with.
#[derive(Debug, Clone)]
pub struct WorkflowOptions {
    /// Body template.
    pub template: MessageTemplate,
    /// Copy address added to every message.
    pub cc_address: String,
    /// Initial subject.
    pub subject: String,
    /// Initial recipient.
    pub recipient: String,
    /// Escrow merge policy.
    pub escrow_policy: EscrowPolicy,
}

impl WorkflowOptions {
    /// Derive options from the loaded configuration.
    pub fn from_config(config: &Config) -> Self {
        Self {
            template: MessageTemplate::new(&config.message.preamble, &config.business.name),
            cc_address: config.business.email.clone(),
            subject: config.message.subject.clone(),
            recipient: config.message.default_recipient.clone().unwrap_or_default(),
            escrow_policy: config.selection.escrow_policy,
        }
    }
}

/// Serializable view of a workflow for reports.
#[derive(Debug, Clone, Serialize)]
pub struct WorkflowSnapshot {
    /// Current phase.
    pub phase: Phase,
    /// Selected records in selection order.
    pub selected: Vec<CandidateRecord>,
    /// Records held in escrow.
    pub escrowed: Vec<CandidateRecord>,
    /// Escrow view mode while it is showing.
    pub escrow_mode: Option<EscrowMode>,
    /// Outbound draft.
    pub message: OutboundMessage,
    /// Transport address when sending is enabled.
    pub address: Option<String>,
}

/// The validation workflow.
pub struct Workflow {
    engine: SelectionEngine,
    template: MessageTemplate,
    draft: OutboundMessage,
    editor: Arc<dyn RecordEditor>,
    transport: Arc<dyn MailTransport>,
    observer: Option<Arc<dyn WorkflowObserver>>,
    opened: bool,
    closed: bool,
}

impl std::fmt::Debug for Workflow {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Workflow")
            .field("engine", &self.engine)
            .field("draft", &self.draft)
            .field("opened", &self.opened)
            .field("closed", &self.closed)
            .finish_non_exhaustive()
    }
}

impl Workflow {
    /// Create a workflow that has not been opened yet.
    pub fn new(
        options: WorkflowOptions,
        editor: Arc<dyn RecordEditor>,
        transport: Arc<dyn MailTransport>,
    ) -> Self {
        let draft = OutboundMessage {
            recipient: options.recipient,
            cc_address: options.cc_address,
            subject: options.subject,
            body: options.template.body(&[]),
        };
        Self {
            engine: SelectionEngine::new(options.escrow_policy),
            template: options.template,
            draft,
            editor,
            transport,
            observer: None,
            opened: false,
            closed: false,
        }
    }

    /// Register the close observer.
    pub fn set_observer(&mut self, observer: Arc<dyn WorkflowObserver>) {
        self.observer = Some(observer);
    }

    /// Open the workflow with a roster snapshot and a preselection hint.
    pub fn open(&mut self, candidates: Vec<CandidateRecord>, preselected_ids: &[String]) {
        if self.closed {
            debug!("open ignored on closed workflow");
            return;
        }
        self.engine.initialize(candidates, preselected_ids);
        self.opened = true;
        self.recompose();
        info!(
            candidates = self.engine.candidates().len(),
            selected = self.engine.selected().len(),
            escrowed = self.engine.escrowed().len(),
            policy = self.engine.policy().as_str(),
            "validation workflow opened"
        );
    }

    /// Replace the search text.
    pub fn set_filter(&mut self, text: &str) {
        if self.is_live() {
            self.engine.set_filter(text);
        }
    }

    /// Select every unselected record in the filtered view.
    pub fn select_all(&mut self) {
        self.change_selection(SelectionEngine::select_all);
    }

    /// Clear the selection.
    pub fn deselect_all(&mut self) {
        self.change_selection(SelectionEngine::deselect_all);
    }

    /// Use the select-all toggle: deselect all when every eligible record in
    /// the view is selected, select all otherwise.
    pub fn toggle_all(&mut self) {
        if self.engine.all_eligible_selected() {
            self.deselect_all();
        } else {
            self.select_all();
        }
    }

    /// Select one record (see [`SelectionEngine::toggle_one`]).
    pub fn toggle_one(&mut self, record: &CandidateRecord) {
        self.change_selection(|engine| engine.toggle_one(record));
    }

    /// Select the candidate with `id`. Returns `false` for unknown ids.
    pub fn toggle_id(&mut self, id: &str) -> bool {
        match self.engine.candidate(id).cloned() {
            Some(record) => {
                self.toggle_one(&record);
                true
            }
            None => false,
        }
    }

    /// Drop a record from the selection.
    pub fn remove(&mut self, id: &str) {
        self.change_selection(|engine| engine.remove(id));
    }

    /// Drop a record from escrow without fixing it.
    pub fn remove_from_escrow(&mut self, id: &str) {
        if self.is_live() {
            self.engine.remove_from_escrow(id);
        }
    }

    /// Hide the escrow view, keeping its contents.
    pub fn close_escrow_view(&mut self) {
        if self.is_live() {
            self.engine.close_escrow_view();
        }
    }

    /// Hand `record` to the editor and hide the escrow view meanwhile.
    pub fn request_remediation(&mut self, record: &CandidateRecord) {
        if !self.is_live() {
            return;
        }
        self.engine.request_remediation(record);
        self.editor.request_edit(record);
    }

    /// Hand the escrowed record with `id` to the editor. Returns `false` if
    /// `id` is not escrowed.
    pub fn request_remediation_id(&mut self, id: &str) -> bool {
        let held = self.engine.escrowed().iter().find(|c| c.id == id).cloned();
        match held {
            Some(record) => {
                self.request_remediation(&record);
                true
            }
            None => false,
        }
    }

    /// Feed a refreshed roster snapshot; escrow is reconciled against it.
    pub fn candidates_changed(&mut self, updated: Vec<CandidateRecord>) {
        self.change_selection(|engine| engine.reconcile(updated));
    }

    /// Set the recipient address.
    pub fn set_recipient(&mut self, recipient: &str) {
        if self.is_live() {
            recipient.clone_into(&mut self.draft.recipient);
        }
    }

    /// Set the subject line.
    pub fn set_subject(&mut self, subject: &str) {
        if self.is_live() {
            subject.clone_into(&mut self.draft.subject);
        }
    }

    /// Overwrite the body. The edit lasts until the selection changes.
    pub fn set_body(&mut self, body: &str) {
        if self.is_live() {
            body.clone_into(&mut self.draft.body);
        }
    }

    /// Whether the send affordance is enabled.
    pub fn can_send(&self) -> bool {
        self.is_live() && self.draft.can_send(self.engine.selected().len())
    }

    /// The transport address, or `None` while sending is disabled.
    pub fn transport_address(&self) -> Option<String> {
        if !self.is_live() {
            return None;
        }
        self.draft.transport_address(self.engine.selected().len())
    }

    /// Hand the message to the transport and close the workflow.
    ///
    /// Returns `false` without side effects while sending is disabled.
    pub fn send(&mut self) -> bool {
        let Some(address) = self.transport_address() else {
            debug!("send ignored, guard not satisfied");
            return false;
        };
        self.transport.deliver(&address);
        info!(selected = self.engine.selected().len(), "validation request sent");
        self.close();
        true
    }

    /// Dismiss the workflow. Repeated calls are ignored.
    pub fn close(&mut self) {
        if self.closed {
            return;
        }
        self.closed = true;
        let ids = self.engine.selected_ids();
        info!(selected = ids.len(), "validation workflow closed");
        if let Some(observer) = &self.observer {
            observer.on_close(&ids);
        }
    }

    /// Current phase.
    pub fn phase(&self) -> Phase {
        if self.closed {
            Phase::Closed
        } else if !self.opened {
            Phase::Idle
        } else if self.engine.escrow_shown() {
            Phase::EditingEscrow
        } else if self.can_send() {
            Phase::ReadyToSend
        } else if !self.engine.selected().is_empty() {
            Phase::Selecting
        } else {
            Phase::Populated
        }
    }

    /// Whether the workflow has been dismissed.
    pub fn is_closed(&self) -> bool {
        self.closed
    }

    /// Selected ids, for keeping a preselection hint in sync.
    pub fn selected_ids(&self) -> Vec<String> {
        self.engine.selected_ids()
    }

    /// The underlying selection engine.
    pub fn engine(&self) -> &SelectionEngine {
        &self.engine
    }

    /// The outbound draft.
    pub fn draft(&self) -> &OutboundMessage {
        &self.draft
    }

    /// Capture the current state for reporting.
    pub fn snapshot(&self) -> WorkflowSnapshot {
        WorkflowSnapshot {
            phase: self.phase(),
            selected: self.engine.selected().to_vec(),
            escrowed: self.engine.escrowed().to_vec(),
            escrow_mode: self
                .engine
                .escrow_shown()
                .then(|| self.engine.escrow_mode())
                .flatten(),
            message: self.draft.clone(),
            address: self.transport_address(),
        }
    }

    fn is_live(&self) -> bool {
        if self.closed {
            debug!("operation ignored on closed workflow");
        }
        !self.closed
    }

    /// Run `transition` and recompose the body if the selection changed.
    fn change_selection(&mut self, transition: impl FnOnce(&mut SelectionEngine)) {
        if !self.is_live() {
            return;
        }
        let before = self.engine.selected_ids();
        transition(&mut self.engine);
        if self.engine.selected_ids() != before {
            self.recompose();
        }
    }

    fn recompose(&mut self) {
        self.draft.body = self.template.body(self.engine.selected());
    }
}

/// Editor that only records the request in the log.
#[derive(Debug, Default, Clone, Copy)]
pub struct LoggingEditor;

impl RecordEditor for LoggingEditor {
    fn request_edit(&self, record: &CandidateRecord) {
        info!(id = %record.id, name = %record.display_name, "record needs an identifier");
    }
}
