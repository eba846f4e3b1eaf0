//! Tests for `SelectionEngine` transitions.

use rollcall::roster::CandidateRecord;
use rollcall::selection::{EscrowMode, EscrowPolicy, SelectionEngine};

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn ana() -> CandidateRecord {
    CandidateRecord::new("1", "Ana", Some("001"))
}

fn luis() -> CandidateRecord {
    CandidateRecord::new("2", "Luis", Some(""))
}

fn marta() -> CandidateRecord {
    CandidateRecord::new("3", "Marta", None)
}

fn pedro() -> CandidateRecord {
    CandidateRecord::new("4", "Pedro", Some("004"))
}

fn ids(records: &[CandidateRecord]) -> Vec<&str> {
    records.iter().map(|c| c.id.as_str()).collect()
}

fn engine_with(candidates: Vec<CandidateRecord>) -> SelectionEngine {
    let mut engine = SelectionEngine::new(EscrowPolicy::Replace);
    engine.initialize(candidates, &[]);
    engine
}

// ---------------------------------------------------------------------------
// initialize
// ---------------------------------------------------------------------------

#[test]
fn initialize_partitions_preselection() {
    let mut engine = SelectionEngine::new(EscrowPolicy::Replace);
    engine.initialize(vec![ana(), luis()], &["1".to_owned(), "2".to_owned()]);

    assert_eq!(ids(engine.selected()), vec!["1"]);
    assert_eq!(ids(engine.escrowed()), vec!["2"]);
    assert!(engine.escrow_shown());
    assert_eq!(engine.escrow_mode(), Some(EscrowMode::Single));
}

#[test]
fn initialize_with_several_missing_uses_multi_mode() {
    let mut engine = SelectionEngine::new(EscrowPolicy::Replace);
    engine.initialize(
        vec![ana(), luis(), marta()],
        &["2".to_owned(), "3".to_owned()],
    );

    assert!(engine.selected().is_empty());
    assert_eq!(ids(engine.escrowed()), vec!["2", "3"]);
    assert_eq!(engine.escrow_mode(), Some(EscrowMode::Multi));
}

#[test]
fn initialize_without_hint_leaves_sets_empty() {
    let engine = engine_with(vec![ana(), luis()]);
    assert!(engine.selected().is_empty());
    assert!(engine.escrowed().is_empty());
    assert!(!engine.escrow_shown());
    assert_eq!(engine.escrow_mode(), None);
}

#[test]
fn initialize_follows_candidate_order_and_ignores_unknown_ids() {
    let mut engine = SelectionEngine::new(EscrowPolicy::Replace);
    engine.initialize(
        vec![ana(), pedro()],
        &["4".to_owned(), "99".to_owned(), "1".to_owned()],
    );
    assert_eq!(ids(engine.selected()), vec!["1", "4"]);
}

#[test]
fn initialize_resets_previous_state() {
    let mut engine = engine_with(vec![ana(), luis()]);
    engine.set_filter("an");
    engine.toggle_one(&ana());
    engine.toggle_one(&luis());

    engine.initialize(vec![pedro()], &[]);

    assert_eq!(engine.filter(), "");
    assert!(engine.selected().is_empty());
    assert!(engine.escrowed().is_empty());
}

// ---------------------------------------------------------------------------
// filter and listing
// ---------------------------------------------------------------------------

#[test]
fn filtered_view_lists_missing_identifier_first_keeping_roster_order() {
    let engine = engine_with(vec![ana(), luis(), pedro(), marta()]);
    let view: Vec<&str> = engine.filtered_view().iter().map(|c| c.id.as_str()).collect();
    assert_eq!(view, vec!["2", "3", "1", "4"]);
}

#[test]
fn filter_is_case_insensitive_substring() {
    let mut engine = engine_with(vec![ana(), luis(), marta()]);
    engine.set_filter("AR");
    let view: Vec<&str> = engine.filtered_view().iter().map(|c| c.id.as_str()).collect();
    assert_eq!(view, vec!["3"]);
}

#[test]
fn filter_does_not_touch_selection() {
    let mut engine = engine_with(vec![ana(), luis()]);
    engine.toggle_one(&ana());
    engine.toggle_one(&luis());
    engine.set_filter("zzz");
    assert_eq!(ids(engine.selected()), vec!["1"]);
    assert_eq!(ids(engine.escrowed()), vec!["2"]);
}

#[test]
fn listing_groups_records() {
    let mut engine = engine_with(vec![ana(), luis(), pedro()]);
    engine.toggle_one(&pedro());

    let listing = engine.listing();
    let needs: Vec<&str> = listing.needs_identifier.iter().map(|c| c.id.as_str()).collect();
    let eligible: Vec<&str> = listing.eligible.iter().map(|c| c.id.as_str()).collect();
    let selected: Vec<&str> = listing.selected.iter().map(|c| c.id.as_str()).collect();

    assert_eq!(needs, vec!["2"]);
    assert_eq!(eligible, vec!["1"]);
    assert_eq!(selected, vec!["4"]);
}

#[test]
fn empty_roster_yields_empty_views() {
    let mut engine = engine_with(vec![]);
    engine.select_all();
    engine.deselect_all();
    engine.remove("1");
    engine.remove_from_escrow("1");
    engine.reconcile(vec![]);

    assert!(engine.filtered_view().is_empty());
    assert!(engine.listing().is_empty());
    assert!(engine.selected().is_empty());
    assert!(engine.escrowed().is_empty());
}

// ---------------------------------------------------------------------------
// select_all / deselect_all
// ---------------------------------------------------------------------------

#[test]
fn select_all_escrows_missing_and_selects_eligible() {
    let mut engine = engine_with(vec![luis(), ana()]);
    engine.select_all();

    assert_eq!(ids(engine.selected()), vec!["1"]);
    assert_eq!(ids(engine.escrowed()), vec!["2"]);
    assert!(engine.escrow_shown());
    assert_eq!(engine.escrow_mode(), Some(EscrowMode::Multi));
}

#[test]
fn select_all_respects_filter_and_skips_selected() {
    let andres = CandidateRecord::new("5", "Andrés", Some("005"));
    let mut engine = engine_with(vec![ana(), pedro(), andres.clone(), luis()]);
    engine.toggle_one(&andres);
    engine.set_filter("d");

    engine.select_all();

    assert_eq!(ids(engine.selected()), vec!["5", "4"]);
    assert!(!engine.is_selected("1"));
    assert!(engine.escrowed().is_empty());
    assert!(!engine.escrow_shown());
}

#[test]
fn select_all_with_only_eligible_leaves_escrow_alone() {
    let mut engine = engine_with(vec![ana(), luis(), pedro()]);
    engine.toggle_one(&luis());
    engine.set_filter("o");

    engine.select_all();

    assert_eq!(ids(engine.selected()), vec!["4"]);
    assert_eq!(ids(engine.escrowed()), vec!["2"]);
}

#[test]
fn select_all_replaces_escrow_under_replace_policy() {
    let mut engine = engine_with(vec![ana(), luis(), marta()]);
    engine.toggle_one(&luis());
    engine.set_filter("marta");

    engine.select_all();

    assert_eq!(ids(engine.escrowed()), vec!["3"]);
}

#[test]
fn select_all_merges_escrow_under_union_policy() {
    let mut engine = SelectionEngine::new(EscrowPolicy::Union);
    engine.initialize(vec![ana(), luis(), marta()], &[]);
    engine.toggle_one(&luis());
    engine.select_all();

    assert_eq!(ids(engine.escrowed()), vec!["2", "3"]);
    assert_eq!(ids(engine.selected()), vec!["1"]);
}

#[test]
fn deselect_all_keeps_escrow() {
    let mut engine = engine_with(vec![ana(), luis(), pedro()]);
    engine.select_all();
    engine.deselect_all();

    assert!(engine.selected().is_empty());
    assert_eq!(ids(engine.escrowed()), vec!["2"]);
}

#[test]
fn all_eligible_selected_tracks_view() {
    let mut engine = engine_with(vec![ana(), luis(), pedro()]);
    assert!(!engine.all_eligible_selected());

    engine.select_all();
    assert!(engine.all_eligible_selected());

    engine.remove("4");
    assert!(!engine.all_eligible_selected());
}

#[test]
fn all_eligible_selected_compares_counts_only() {
    let mut engine = engine_with(vec![ana(), pedro()]);
    engine.toggle_one(&pedro());
    engine.set_filter("ana");
    // One selected outside the view, one eligible inside it.
    assert!(engine.all_eligible_selected());
}

// ---------------------------------------------------------------------------
// toggle_one / remove
// ---------------------------------------------------------------------------

#[test]
fn toggle_selected_record_is_noop() {
    let mut engine = engine_with(vec![ana()]);
    engine.toggle_one(&ana());
    engine.toggle_one(&ana());
    assert_eq!(ids(engine.selected()), vec!["1"]);
}

#[test]
fn toggle_missing_identifier_escrows_alone_in_single_mode() {
    let mut engine = engine_with(vec![ana(), luis(), marta()]);
    engine.select_all();
    assert_eq!(ids(engine.escrowed()), vec!["2", "3"]);

    engine.close_escrow_view();
    engine.toggle_one(&marta());

    assert_eq!(ids(engine.escrowed()), vec!["3"]);
    assert!(engine.escrow_shown());
    assert_eq!(engine.escrow_mode(), Some(EscrowMode::Single));
    assert!(!engine.is_selected("3"));
}

#[test]
fn toggle_under_union_keeps_previous_escrow() {
    let mut engine = SelectionEngine::new(EscrowPolicy::Union);
    engine.initialize(vec![luis(), marta()], &[]);
    engine.toggle_one(&luis());
    engine.toggle_one(&marta());

    assert_eq!(ids(engine.escrowed()), vec!["2", "3"]);
    assert_eq!(engine.escrow_mode(), Some(EscrowMode::Multi));
}

#[test]
fn remove_only_touches_selection() {
    let mut engine = engine_with(vec![ana(), luis()]);
    engine.toggle_one(&ana());
    engine.toggle_one(&luis());

    engine.remove("2");
    engine.remove("1");
    engine.remove("unknown");

    assert!(engine.selected().is_empty());
    assert_eq!(ids(engine.escrowed()), vec!["2"]);
}

#[test]
fn remove_from_escrow_only_touches_escrow() {
    let mut engine = engine_with(vec![ana(), luis()]);
    engine.toggle_one(&ana());
    engine.toggle_one(&luis());

    engine.remove_from_escrow("1");
    engine.remove_from_escrow("2");

    assert_eq!(ids(engine.selected()), vec!["1"]);
    assert!(engine.escrowed().is_empty());
    assert!(!engine.escrow_shown());
}

// ---------------------------------------------------------------------------
// remediation and reconcile
// ---------------------------------------------------------------------------

#[test]
fn remediation_hides_view_and_keeps_membership() {
    let mut engine = engine_with(vec![luis()]);
    engine.toggle_one(&luis());
    engine.request_remediation(&luis());

    assert!(!engine.escrow_shown());
    assert!(engine.is_escrowed("2"));
}

#[test]
fn reconcile_promotes_fixed_records() {
    let a = CandidateRecord::new("a", "A", None);
    let b = CandidateRecord::new("b", "B", None);
    let mut engine = SelectionEngine::new(EscrowPolicy::Replace);
    engine.initialize(vec![a.clone(), b.clone()], &["a".to_owned(), "b".to_owned()]);
    engine.request_remediation(&a);

    engine.reconcile(vec![CandidateRecord::new("a", "A", Some("123")), b]);

    assert_eq!(ids(engine.selected()), vec!["a"]);
    assert_eq!(engine.selected()[0].identifier.as_deref(), Some("123"));
    assert_eq!(ids(engine.escrowed()), vec!["b"]);
    assert!(engine.escrow_shown(), "remaining escrow should resurface");
}

#[test]
fn reconcile_appends_after_existing_selection() {
    let mut engine = engine_with(vec![ana(), luis()]);
    engine.toggle_one(&ana());
    engine.toggle_one(&luis());

    engine.reconcile(vec![ana(), CandidateRecord::new("2", "Luis", Some("002"))]);

    assert_eq!(ids(engine.selected()), vec!["1", "2"]);
    assert!(engine.escrowed().is_empty());
    assert!(!engine.escrow_shown());
}

#[test]
fn reconcile_keeps_records_missing_from_update() {
    let mut engine = engine_with(vec![luis()]);
    engine.toggle_one(&luis());

    engine.reconcile(vec![ana()]);

    assert_eq!(ids(engine.escrowed()), vec!["2"]);
    assert!(engine.selected().is_empty());
    assert_eq!(ids(engine.candidates()), vec!["1"]);
}

#[test]
fn reconcile_without_escrow_only_refreshes_candidates() {
    let mut engine = engine_with(vec![ana()]);
    engine.reconcile(vec![ana(), pedro()]);
    assert!(engine.selected().is_empty());
    assert!(!engine.escrow_shown());
    assert_eq!(engine.candidates().len(), 2);
}

#[test]
fn reconcile_does_not_duplicate_selected_ids() {
    let mut engine = engine_with(vec![ana(), luis()]);
    engine.toggle_one(&ana());
    engine.toggle_one(&luis());

    let fixed = CandidateRecord::new("2", "Luis", Some("002"));
    engine.reconcile(vec![ana(), fixed.clone()]);
    engine.toggle_one(&fixed);

    assert_eq!(ids(engine.selected()), vec!["1", "2"]);
}
