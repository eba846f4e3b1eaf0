//! Selection engine for the identity validation workflow.
//!
//! Every candidate sits in exactly one of: unselected, selected, or escrow
//! (held back because it has no identifier). Escrowed records are promoted
//! into the selection by [`SelectionEngine::reconcile`] once a refreshed
//! roster shows their identifier.
//!
//! All transitions are synchronous and infallible. Unknown ids are ignored.

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::roster::CandidateRecord;

/// How a new batch of identifier-less records combines with the escrow set.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EscrowPolicy {
    /// The new batch replaces whatever was held.
    #[default]
    Replace,
    /// The new batch is added to what was held, skipping duplicate ids.
    Union,
}

impl EscrowPolicy {
    /// Returns the configuration string representation.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Replace => "replace",
            Self::Union => "union",
        }
    }

    /// Parse a configuration string into a policy.
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "replace" => Some(Self::Replace),
            "union" => Some(Self::Union),
            _ => None,
        }
    }
}

/// Presentation mode of the escrow view.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EscrowMode {
    /// A single record was held back.
    Single,
    /// Several records were held back at once.
    Multi,
}

impl EscrowMode {
    /// Heading shown above the escrow list.
    pub fn title(&self) -> &'static str {
        match self {
            Self::Single => "Cliente sin identificación",
            Self::Multi => "Clientes sin identificación",
        }
    }

    fn for_count(count: usize) -> Self {
        if count == 1 {
            Self::Single
        } else {
            Self::Multi
        }
    }
}

/// The filtered view split into its three display groups.
#[derive(Debug, Default, PartialEq, Eq)]
pub struct Listing<'a> {
    /// Unselected records without an identifier.
    pub needs_identifier: Vec<&'a CandidateRecord>,
    /// Unselected records with an identifier.
    pub eligible: Vec<&'a CandidateRecord>,
    /// Records in the filtered view that are already selected.
    pub selected: Vec<&'a CandidateRecord>,
}

impl Listing<'_> {
    /// Whether the filtered view is empty.
    pub fn is_empty(&self) -> bool {
        self.needs_identifier.is_empty() && self.eligible.is_empty() && self.selected.is_empty()
    }
}

/// State of one workflow invocation: candidates, filter, selection, escrow.
#[derive(Debug, Clone, Default)]
pub struct SelectionEngine {
    candidates: Vec<CandidateRecord>,
    filter: String,
    selected: Vec<CandidateRecord>,
    escrow: Vec<CandidateRecord>,
    escrow_visible: bool,
    escrow_mode: Option<EscrowMode>,
    policy: EscrowPolicy,
}

impl SelectionEngine {
    /// Create an empty engine using `policy` for escrow batches.
    pub fn new(policy: EscrowPolicy) -> Self {
        Self {
            policy,
            ..Self::default()
        }
    }

    /// Load the candidate list and apply the preselection hint.
    ///
    /// Preselected records with an identifier are selected, the rest are
    /// escrowed, both in candidate order. The escrow view is surfaced when
    /// anything was escrowed.
    pub fn initialize(&mut self, candidates: Vec<CandidateRecord>, preselected_ids: &[String]) {
        self.candidates = candidates;
        self.filter.clear();
        self.selected.clear();
        self.escrow.clear();
        self.escrow_visible = false;
        self.escrow_mode = None;

        let hinted: Vec<CandidateRecord> = self
            .candidates
            .iter()
            .filter(|c| preselected_ids.iter().any(|id| *id == c.id))
            .cloned()
            .collect();
        let (eligible, lacking): (Vec<_>, Vec<_>) =
            hinted.into_iter().partition(CandidateRecord::has_identifier);

        for record in eligible {
            self.push_selected(record);
        }
        if !lacking.is_empty() {
            let mode = EscrowMode::for_count(lacking.len());
            self.hold(lacking);
            self.surface_escrow(mode);
        }

        debug!(
            candidates = self.candidates.len(),
            selected = self.selected.len(),
            escrowed = self.escrow.len(),
            "selection initialized"
        );
    }

    /// Replace the search text. Selection and escrow are untouched.
    pub fn set_filter(&mut self, text: &str) {
        text.clone_into(&mut self.filter);
    }

    /// Current search text.
    pub fn filter(&self) -> &str {
        &self.filter
    }

    /// Candidates matching the filter, records without an identifier first.
    ///
    /// The sort is stable, so roster order is kept within each group.
    pub fn filtered_view(&self) -> Vec<&CandidateRecord> {
        let needle = self.filter.to_lowercase();
        let mut view: Vec<&CandidateRecord> = self
            .candidates
            .iter()
            .filter(|c| c.matches(&needle))
            .collect();
        view.sort_by_key(|c| c.has_identifier());
        view
    }

    /// The filtered view grouped for display.
    pub fn listing(&self) -> Listing<'_> {
        let mut listing = Listing::default();
        for record in self.filtered_view() {
            if self.is_selected(&record.id) {
                listing.selected.push(record);
            } else if record.has_identifier() {
                listing.eligible.push(record);
            } else {
                listing.needs_identifier.push(record);
            }
        }
        listing
    }

    /// Select every unselected record in the filtered view.
    ///
    /// Records without an identifier go to escrow instead, and the escrow
    /// view is surfaced in multi mode.
    pub fn select_all(&mut self) {
        let pending: Vec<CandidateRecord> = self
            .filtered_view()
            .into_iter()
            .filter(|c| !self.is_selected(&c.id))
            .cloned()
            .collect();
        let (eligible, lacking): (Vec<_>, Vec<_>) =
            pending.into_iter().partition(CandidateRecord::has_identifier);

        if !lacking.is_empty() {
            self.hold(lacking);
            self.surface_escrow(EscrowMode::Multi);
        }
        let added = eligible.len();
        for record in eligible {
            self.push_selected(record);
        }

        debug!(
            added,
            selected = self.selected.len(),
            escrowed = self.escrow.len(),
            "select all"
        );
    }

    /// Clear the selection. Escrow is untouched.
    pub fn deselect_all(&mut self) {
        self.selected.clear();
        debug!(escrowed = self.escrow.len(), "selection cleared");
    }

    /// Select one record.
    ///
    /// Already-selected records are left alone; removal goes through
    /// [`Self::remove`]. A record without an identifier is escrowed and the
    /// escrow view surfaced instead.
    pub fn toggle_one(&mut self, record: &CandidateRecord) {
        if self.is_selected(&record.id) {
            return;
        }
        if !record.has_identifier() {
            self.hold(vec![record.clone()]);
            self.surface_escrow(EscrowMode::for_count(self.escrow.len()));
            debug!(id = %record.id, escrowed = self.escrow.len(), "record escrowed");
            return;
        }
        self.push_selected(record.clone());
        debug!(id = %record.id, selected = self.selected.len(), "record selected");
    }

    /// Drop a record from the selection.
    pub fn remove(&mut self, id: &str) {
        self.selected.retain(|c| c.id != id);
    }

    /// Drop a record from escrow without fixing it.
    pub fn remove_from_escrow(&mut self, id: &str) {
        self.escrow.retain(|c| c.id != id);
    }

    /// Hide the escrow view while `record` is edited elsewhere.
    ///
    /// Escrow membership is kept so a later [`Self::reconcile`] can notice
    /// the fix.
    pub fn request_remediation(&mut self, record: &CandidateRecord) {
        self.escrow_visible = false;
        debug!(id = %record.id, "remediation requested");
    }

    /// Hide the escrow view without touching its contents.
    pub fn close_escrow_view(&mut self) {
        self.escrow_visible = false;
    }

    /// Take a refreshed roster and promote escrowed records that now carry
    /// an identifier.
    ///
    /// Promoted records are appended to the selection in their refreshed
    /// form. Records missing from the refreshed roster stay escrowed. The
    /// escrow view is surfaced again while anything remains held.
    pub fn reconcile(&mut self, updated_candidates: Vec<CandidateRecord>) {
        self.candidates = updated_candidates;
        if self.escrow.is_empty() {
            return;
        }

        let held = std::mem::take(&mut self.escrow);
        let mut promoted = 0_usize;
        for record in held {
            let latest = self.candidates.iter().find(|c| c.id == record.id).cloned();
            match latest {
                Some(latest) if latest.has_identifier() => {
                    self.push_selected(latest);
                    promoted = promoted.saturating_add(1);
                }
                Some(latest) => self.escrow.push(latest),
                None => self.escrow.push(record),
            }
        }

        if !self.escrow.is_empty() {
            self.escrow_visible = true;
        }

        debug!(
            promoted,
            selected = self.selected.len(),
            escrowed = self.escrow.len(),
            "escrow reconciled"
        );
    }

    /// Whether every eligible record in the filtered view is selected.
    ///
    /// Compares counts only, so selections outside the current filter count
    /// towards the total.
    pub fn all_eligible_selected(&self) -> bool {
        let eligible = self
            .filtered_view()
            .into_iter()
            .filter(|c| c.has_identifier())
            .count();
        self.selected.len() == eligible
    }

    /// Selected records in selection order.
    pub fn selected(&self) -> &[CandidateRecord] {
        &self.selected
    }

    /// Ids of the selected records in selection order.
    pub fn selected_ids(&self) -> Vec<String> {
        self.selected.iter().map(|c| c.id.clone()).collect()
    }

    /// Records currently held in escrow.
    pub fn escrowed(&self) -> &[CandidateRecord] {
        &self.escrow
    }

    /// The full candidate list last supplied.
    pub fn candidates(&self) -> &[CandidateRecord] {
        &self.candidates
    }

    /// Look a candidate up by id.
    pub fn candidate(&self, id: &str) -> Option<&CandidateRecord> {
        self.candidates.iter().find(|c| c.id == id)
    }

    /// Whether `id` is selected.
    pub fn is_selected(&self, id: &str) -> bool {
        self.selected.iter().any(|c| c.id == id)
    }

    /// Whether `id` is escrowed.
    pub fn is_escrowed(&self, id: &str) -> bool {
        self.escrow.iter().any(|c| c.id == id)
    }

    /// Whether the escrow view is showing. It never shows while empty.
    pub fn escrow_shown(&self) -> bool {
        self.escrow_visible && !self.escrow.is_empty()
    }

    /// Mode the escrow view was last surfaced in.
    pub fn escrow_mode(&self) -> Option<EscrowMode> {
        self.escrow_mode
    }

    /// Escrow policy in effect.
    pub fn policy(&self) -> EscrowPolicy {
        self.policy
    }

    /// Append to the selection, keeping ids unique and escrow disjoint.
    fn push_selected(&mut self, record: CandidateRecord) {
        self.escrow.retain(|c| c.id != record.id);
        if !self.is_selected(&record.id) {
            self.selected.push(record);
        }
    }

    fn hold(&mut self, batch: Vec<CandidateRecord>) {
        if self.policy == EscrowPolicy::Replace {
            self.escrow.clear();
        }
        for record in batch {
            if !self.is_escrowed(&record.id) {
                self.escrow.push(record);
            }
        }
    }

    fn surface_escrow(&mut self, mode: EscrowMode) {
        self.escrow_visible = true;
        self.escrow_mode = Some(mode);
    }
}
