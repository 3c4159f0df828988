//! Nested-history flattener.
//!
//! Walks the backend's tree-shaped payload (project → PPAP → phases →
//! outputs → documents, plus the parallel team → persons and user
//! branches) and emits one flat [`HistoryRecord`] per (entity, event)
//! pair. Context labels are assigned level by level; the fan-out of
//! multi-event records happens in exactly one place so every level shares
//! the same expansion rule.

use std::cmp::Reverse;

use chrono::{DateTime, Utc};

use crate::history::{
    EntityKind, HistoryEvent, HistoryRecord, NestedHistory, OutputNode, PhaseNode, RawRecord,
};

/// Source label for PPAP-level records; also the parent label of phases.
const PPAP_LABEL: &str = "PPAP";

/// Source label for team-level records; also the parent label of persons.
const TEAM_LABEL: &str = "Team";

// ---------------------------------------------------------------------------
// Fan-out
// ---------------------------------------------------------------------------

/// Labels applied to every record emitted for one node of the tree.
struct RecordContext<'a> {
    title: String,
    source_name: &'a str,
    parent_name: Option<&'a str>,
    grandparent_name: Option<&'a str>,
    table_name: EntityKind,
}

/// Fan a raw record out into flattened records.
///
/// A record with k ≥ 1 structured events yields k records, each wrapping
/// exactly one event, with ids `id`, `id-1`, ... `id-(k-1)` so list keys
/// stay unique. A record with no structured events yields exactly one
/// record with an empty event list.
fn fan_out(record: &RawRecord, ctx: &RecordContext<'_>, out: &mut Vec<HistoryRecord>) {
    let events = record.events.as_deref().unwrap_or_default();

    if events.is_empty() {
        out.push(contextualize(record, ctx, record.id.clone(), Vec::new(), 0));
        return;
    }

    for (index, event) in events.iter().enumerate() {
        let id = if index == 0 {
            record.id.clone()
        } else {
            format!("{}-{}", record.id, index)
        };
        out.push(contextualize(record, ctx, id, vec![event.clone()], events.len()));
    }
}

fn contextualize(
    record: &RawRecord,
    ctx: &RecordContext<'_>,
    id: String,
    events: Vec<HistoryEvent>,
    total_events: usize,
) -> HistoryRecord {
    HistoryRecord {
        id,
        title: ctx.title.clone(),
        source_name: ctx.source_name.to_string(),
        parent_name: ctx.parent_name.map(str::to_string),
        grandparent_name: ctx.grandparent_name.map(str::to_string),
        table_name: ctx.table_name,
        event: record.event.clone(),
        events,
        total_events,
        created_at: record.created_at.clone(),
        created_by: record.created_by.clone(),
        extra: record.extra.clone(),
    }
}

// ---------------------------------------------------------------------------
// Tree walk
// ---------------------------------------------------------------------------

/// Flatten one project's nested history into contextualized records.
///
/// Output order follows the tree walk (project, PPAP, phases with their
/// outputs and documents, team and persons, users). Callers that need
/// chronological order sort afterwards, see [`flatten_page`].
pub fn flatten_project(nested: &NestedHistory, project_name: &str) -> Vec<HistoryRecord> {
    let mut out = Vec::new();

    let ctx = RecordContext {
        title: project_name.to_string(),
        source_name: project_name,
        parent_name: None,
        grandparent_name: None,
        table_name: EntityKind::Project,
    };
    for record in &nested.project {
        fan_out(record, &ctx, &mut out);
    }

    if let Some(ppap) = &nested.ppap {
        let ctx = RecordContext {
            title: format!("PPAP for {project_name}"),
            source_name: PPAP_LABEL,
            parent_name: Some(project_name),
            grandparent_name: None,
            table_name: EntityKind::Ppap,
        };
        for record in &ppap.history {
            fan_out(record, &ctx, &mut out);
        }

        for phase in ppap.phases.values() {
            flatten_phase(phase, project_name, &mut out);
        }
    }

    if let Some(team) = &nested.team {
        let ctx = RecordContext {
            title: format!("Team for {project_name}"),
            source_name: TEAM_LABEL,
            parent_name: Some(project_name),
            grandparent_name: None,
            table_name: EntityKind::Team,
        };
        for record in &team.history {
            fan_out(record, &ctx, &mut out);
        }

        for person in team.persons.values() {
            let ctx = RecordContext {
                title: person.name.clone(),
                source_name: &person.name,
                parent_name: Some(TEAM_LABEL),
                grandparent_name: Some(project_name),
                table_name: EntityKind::Person,
            };
            for record in &person.history {
                fan_out(record, &ctx, &mut out);
            }
        }
    }

    for user in &nested.users {
        // Users hang directly off the project and carry no grandparent.
        let ctx = RecordContext {
            title: user.username.clone(),
            source_name: &user.username,
            parent_name: Some(project_name),
            grandparent_name: None,
            table_name: EntityKind::User,
        };
        for record in &user.history {
            fan_out(record, &ctx, &mut out);
        }
    }

    out
}

fn flatten_phase(phase: &PhaseNode, project_name: &str, out: &mut Vec<HistoryRecord>) {
    let ctx = RecordContext {
        title: phase.name.clone(),
        source_name: &phase.name,
        parent_name: Some(PPAP_LABEL),
        grandparent_name: Some(project_name),
        table_name: EntityKind::Phase,
    };
    for record in &phase.history {
        fan_out(record, &ctx, out);
    }

    for output in phase.outputs.values() {
        flatten_output(output, &phase.name, project_name, out);
    }
}

fn flatten_output(
    output: &OutputNode,
    phase_name: &str,
    project_name: &str,
    out: &mut Vec<HistoryRecord>,
) {
    let ctx = RecordContext {
        title: output.name.clone(),
        source_name: &output.name,
        parent_name: Some(phase_name),
        grandparent_name: Some(project_name),
        table_name: EntityKind::Output,
    };
    for record in &output.history {
        fan_out(record, &ctx, out);
    }

    for document in output.documents.values() {
        // Document ancestry is truncated to the two nearest levels: the
        // grandparent label is the phase, not the project.
        let ctx = RecordContext {
            title: document.name.clone(),
            source_name: &document.name,
            parent_name: Some(&output.name),
            grandparent_name: Some(phase_name),
            table_name: EntityKind::Document,
        };
        for record in &document.history {
            fan_out(record, &ctx, out);
        }
    }
}

// ---------------------------------------------------------------------------
// Page assembly
// ---------------------------------------------------------------------------

/// Flatten every project of a fetched page and sort the combined list by
/// `created_at`, most recent first.
pub fn flatten_page<'a, I>(projects: I) -> Vec<HistoryRecord>
where
    I: IntoIterator<Item = (&'a str, &'a NestedHistory)>,
{
    let mut records = Vec::new();
    for (project_name, nested) in projects {
        records.extend(flatten_project(nested, project_name));
    }
    sort_newest_first(&mut records);
    records
}

/// Stable descending sort by parsed `created_at`.
///
/// Ties keep their tree-walk order; records with unparsable timestamps
/// sort after everything else.
pub fn sort_newest_first(records: &mut [HistoryRecord]) {
    records.sort_by_cached_key(|record| {
        Reverse(record.parsed_created_at().unwrap_or(DateTime::<Utc>::MIN_UTC))
    });
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::history::{
        DocumentNode, HistoryEvent, PersonNode, PpapBranch, TeamBranch, UserNode,
    };
    use std::collections::BTreeMap;

    fn raw(id: &str, created_at: &str) -> RawRecord {
        RawRecord {
            id: id.into(),
            created_at: created_at.into(),
            ..RawRecord::default()
        }
    }

    fn event(event_type: &str, details: &str) -> HistoryEvent {
        HistoryEvent {
            event_type: event_type.into(),
            details: details.into(),
            timestamp: None,
            user: None,
        }
    }

    /// A project with one record at every level of the tree.
    fn full_tree() -> NestedHistory {
        let document = DocumentNode {
            name: "fmea-rev2.xlsx".into(),
            history: vec![raw("d1", "2023-03-01T00:00:00Z")],
        };
        let output = OutputNode {
            name: "FMEA".into(),
            history: vec![raw("o1", "2023-02-01T00:00:00Z")],
            documents: BTreeMap::from([("31".to_string(), document)]),
        };
        let phase = PhaseNode {
            name: "Planning".into(),
            history: vec![raw("ph1", "2023-01-15T00:00:00Z")],
            outputs: BTreeMap::from([("21".to_string(), output)]),
        };
        let team = TeamBranch {
            history: vec![raw("t1", "2023-01-10T00:00:00Z")],
            persons: BTreeMap::from([(
                "41".to_string(),
                PersonNode {
                    name: "Ada".into(),
                    history: vec![raw("pe1", "2023-01-11T00:00:00Z")],
                },
            )]),
        };

        NestedHistory {
            project: vec![raw("pr1", "2023-01-01T00:00:00Z")],
            ppap: Some(PpapBranch {
                history: vec![raw("pp1", "2023-01-05T00:00:00Z")],
                phases: BTreeMap::from([("11".to_string(), phase)]),
            }),
            team: Some(team),
            users: vec![UserNode {
                id: "51".into(),
                username: "ada".into(),
                history: vec![raw("u1", "2023-01-20T00:00:00Z")],
            }],
        }
    }

    fn find<'a>(records: &'a [HistoryRecord], id: &str) -> &'a HistoryRecord {
        records.iter().find(|r| r.id == id).unwrap()
    }

    // -- fan-out -------------------------------------------------------------

    #[test]
    fn record_with_k_events_yields_k_records() {
        let mut record = raw("R1", "2023-01-01T00:00:00Z");
        record.events = Some(vec![
            event("create", "created"),
            event("update", "renamed"),
            event("approve", "approved"),
        ]);

        let nested = NestedHistory {
            project: vec![record],
            ..NestedHistory::default()
        };
        let records = flatten_project(&nested, "Gearbox");

        assert_eq!(records.len(), 3);
        let ids: Vec<&str> = records.iter().map(|r| r.id.as_str()).collect();
        assert_eq!(ids, ["R1", "R1-1", "R1-2"]);
        for record in &records {
            assert_eq!(record.events.len(), 1);
            assert_eq!(record.total_events, 3);
        }
        assert_eq!(records[1].events[0].details, "renamed");
    }

    #[test]
    fn record_without_events_yields_single_record() {
        let nested = NestedHistory {
            project: vec![raw("R1", "2023-01-01T00:00:00Z")],
            ..NestedHistory::default()
        };
        let records = flatten_project(&nested, "Gearbox");

        assert_eq!(records.len(), 1);
        assert!(records[0].events.is_empty());
        assert_eq!(records[0].total_events, 0);
    }

    #[test]
    fn empty_events_list_treated_like_absent() {
        let mut record = raw("R1", "2023-01-01T00:00:00Z");
        record.events = Some(Vec::new());

        let nested = NestedHistory {
            project: vec![record],
            ..NestedHistory::default()
        };
        let records = flatten_project(&nested, "Gearbox");
        assert_eq!(records.len(), 1);
        assert!(records[0].events.is_empty());
    }

    // -- context labels ------------------------------------------------------

    #[test]
    fn project_records_use_project_name_for_title_and_source() {
        let records = flatten_project(&full_tree(), "Gearbox");
        let record = find(&records, "pr1");
        assert_eq!(record.title, "Gearbox");
        assert_eq!(record.source_name, "Gearbox");
        assert_eq!(record.parent_name, None);
        assert_eq!(record.grandparent_name, None);
        assert_eq!(record.table_name, EntityKind::Project);
    }

    #[test]
    fn ppap_records_are_parented_to_the_project() {
        let records = flatten_project(&full_tree(), "Gearbox");
        let record = find(&records, "pp1");
        assert_eq!(record.title, "PPAP for Gearbox");
        assert_eq!(record.source_name, "PPAP");
        assert_eq!(record.parent_name.as_deref(), Some("Gearbox"));
        assert_eq!(record.grandparent_name, None);
        assert_eq!(record.table_name, EntityKind::Ppap);
    }

    #[test]
    fn phase_records_carry_ppap_and_project_ancestry() {
        let records = flatten_project(&full_tree(), "Gearbox");
        let record = find(&records, "ph1");
        assert_eq!(record.title, "Planning");
        assert_eq!(record.parent_name.as_deref(), Some("PPAP"));
        assert_eq!(record.grandparent_name.as_deref(), Some("Gearbox"));
        assert_eq!(record.table_name, EntityKind::Phase);
    }

    #[test]
    fn output_records_carry_phase_and_project_ancestry() {
        let records = flatten_project(&full_tree(), "Gearbox");
        let record = find(&records, "o1");
        assert_eq!(record.parent_name.as_deref(), Some("Planning"));
        assert_eq!(record.grandparent_name.as_deref(), Some("Gearbox"));
        assert_eq!(record.table_name, EntityKind::Output);
    }

    #[test]
    fn document_grandparent_is_the_phase_not_the_project() {
        let records = flatten_project(&full_tree(), "Gearbox");
        let record = find(&records, "d1");
        assert_eq!(record.parent_name.as_deref(), Some("FMEA"));
        assert_eq!(record.grandparent_name.as_deref(), Some("Planning"));
        assert_eq!(record.table_name, EntityKind::Document);
    }

    #[test]
    fn team_and_person_records_carry_team_ancestry() {
        let records = flatten_project(&full_tree(), "Gearbox");

        let team = find(&records, "t1");
        assert_eq!(team.title, "Team for Gearbox");
        assert_eq!(team.source_name, "Team");
        assert_eq!(team.parent_name.as_deref(), Some("Gearbox"));
        assert_eq!(team.table_name, EntityKind::Team);

        let person = find(&records, "pe1");
        assert_eq!(person.title, "Ada");
        assert_eq!(person.parent_name.as_deref(), Some("Team"));
        assert_eq!(person.grandparent_name.as_deref(), Some("Gearbox"));
        assert_eq!(person.table_name, EntityKind::Person);
    }

    #[test]
    fn user_records_have_no_grandparent() {
        let records = flatten_project(&full_tree(), "Gearbox");
        let record = find(&records, "u1");
        assert_eq!(record.title, "ada");
        assert_eq!(record.source_name, "ada");
        assert_eq!(record.parent_name.as_deref(), Some("Gearbox"));
        assert_eq!(record.grandparent_name, None);
        assert_eq!(record.table_name, EntityKind::User);
    }

    // -- missing branches ----------------------------------------------------

    #[test]
    fn missing_team_branch_contributes_zero_records() {
        let mut nested = full_tree();
        nested.team = None;
        let records = flatten_project(&nested, "Gearbox");
        assert!(records
            .iter()
            .all(|r| r.table_name != EntityKind::Team && r.table_name != EntityKind::Person));
    }

    #[test]
    fn empty_payload_flattens_to_nothing() {
        let records = flatten_project(&NestedHistory::default(), "Gearbox");
        assert!(records.is_empty());
    }

    // -- page assembly -------------------------------------------------------

    #[test]
    fn page_sorts_newest_first() {
        let a = NestedHistory {
            project: vec![raw("a1", "2023-01-01"), raw("a2", "2023-03-01")],
            ..NestedHistory::default()
        };
        let b = NestedHistory {
            project: vec![raw("b1", "2023-02-01")],
            ..NestedHistory::default()
        };

        let records = flatten_page([("Alpha", &a), ("Beta", &b)]);
        let ids: Vec<&str> = records.iter().map(|r| r.id.as_str()).collect();
        assert_eq!(ids, ["a2", "b1", "a1"]);
    }

    #[test]
    fn sort_is_stable_for_equal_timestamps() {
        let nested = NestedHistory {
            project: vec![
                raw("first", "2023-01-01T00:00:00Z"),
                raw("second", "2023-01-01T00:00:00Z"),
            ],
            ..NestedHistory::default()
        };

        let records = flatten_page([("Alpha", &nested)]);
        let ids: Vec<&str> = records.iter().map(|r| r.id.as_str()).collect();
        assert_eq!(ids, ["first", "second"]);
    }

    #[test]
    fn unparsable_dates_sort_last() {
        let nested = NestedHistory {
            project: vec![raw("bad", "not-a-date"), raw("good", "2023-01-01")],
            ..NestedHistory::default()
        };

        let records = flatten_page([("Alpha", &nested)]);
        let ids: Vec<&str> = records.iter().map(|r| r.id.as_str()).collect();
        assert_eq!(ids, ["good", "bad"]);
    }
}
