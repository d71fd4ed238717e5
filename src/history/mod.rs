//! Reconstruction of session history from the turn log.
//!
//! [`filter_and_prune`] turns raw log records into the entries used to seed a
//! live session. It never fails: malformed records are skipped one by one and
//! reported in the [`PruneOutcome`] alongside a `tracing` warning.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};
use strum::Display;

use crate::types::{Content, Role, TurnRecord};

/// Which logged turns may seed a session.
///
/// Every rule is optional; the default keeps the whole log.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RetentionPolicy {
    /// Keep only the most recent N entries.
    pub max_turns: Option<usize>,
    /// Keep only entries whose tick is within this many ticks of the latest.
    pub tick_window: Option<u64>,
    /// Ticks explicitly removed from this agent's history.
    pub pruned_ticks: BTreeSet<u64>,
}

impl RetentionPolicy {
    pub fn keep_all() -> Self {
        Self::default()
    }

    pub fn with_max_turns(mut self, max_turns: usize) -> Self {
        self.max_turns = Some(max_turns);
        self
    }

    pub fn with_tick_window(mut self, ticks: u64) -> Self {
        self.tick_window = Some(ticks);
        self
    }

    pub fn with_pruned_ticks(mut self, ticks: impl IntoIterator<Item = u64>) -> Self {
        self.pruned_ticks.extend(ticks);
        self
    }
}

/// A logged turn that survived filtering.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HistoryEntry {
    pub tick: u64,
    pub role: Role,
    pub text_content: String,
    pub reasoning_content: Option<String>,
}

impl HistoryEntry {
    pub fn to_content(&self) -> Content {
        Content {
            role: Some(self.role),
            parts: vec![crate::types::Part::text(self.text_content.clone())],
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
#[strum(serialize_all = "snake_case")]
pub enum SkipReason {
    MissingTick,
    MissingRole,
    EmptyParts,
    EmptyText,
    /// Followed by another entry with the same role.
    RepeatedRole,
    /// A trailing prompt that never got a reply.
    UnpairedPrompt,
}

/// A record that was dropped for being malformed or out of sequence.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SkippedRecord {
    /// Position in the raw record sequence.
    pub index: usize,
    pub tick: Option<u64>,
    pub reason: SkipReason,
}

/// A record whose role was not `user` or `model` and was read as `user`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CoercedRole {
    pub index: usize,
    pub original: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PruneOutcome {
    pub entries: Vec<HistoryEntry>,
    pub skipped: Vec<SkippedRecord>,
    pub coerced: Vec<CoercedRole>,
    /// Well-formed entries removed by the retention policy.
    pub retention_dropped: usize,
}

impl PruneOutcome {
    pub fn has_warnings(&self) -> bool {
        !self.skipped.is_empty() || !self.coerced.is_empty()
    }

    pub fn to_contents(&self) -> Vec<Content> {
        self.entries.iter().map(HistoryEntry::to_content).collect()
    }
}

/// Filter raw turn records into session history under `policy`.
///
/// Order is preserved. Within a run of consecutive entries sharing a role,
/// only the last one is kept, so the result alternates between user and
/// model. A trailing prompt without a reply is dropped.
pub fn filter_and_prune(agent: &str, records: &[TurnRecord], policy: &RetentionPolicy) -> PruneOutcome {
    let mut outcome = PruneOutcome::default();

    let mut candidates: Vec<(usize, HistoryEntry)> = Vec::with_capacity(records.len());
    for (index, record) in records.iter().enumerate() {
        match parse_record(index, record) {
            Ok((entry, coerced)) => {
                if let Some(coerced) = coerced {
                    tracing::warn!(
                        agent,
                        index,
                        role = %coerced.original,
                        "invalid role in turn log, defaulting to 'user'"
                    );
                    outcome.coerced.push(coerced);
                }
                candidates.push((index, entry));
            }
            Err(reason) => skip(agent, &mut outcome, index, record.tick, reason),
        }
    }

    let before_retention = candidates.len();
    let latest_tick = candidates.iter().map(|(_, entry)| entry.tick).max();
    candidates.retain(|(_, entry)| {
        if policy.pruned_ticks.contains(&entry.tick) {
            return false;
        }
        match (policy.tick_window, latest_tick) {
            (Some(window), Some(latest)) => latest - entry.tick < window,
            _ => true,
        }
    });

    let mut alternating: Vec<(usize, HistoryEntry)> = Vec::with_capacity(candidates.len());
    for (index, entry) in candidates {
        if let Some((previous_index, previous)) = alternating.last() {
            if previous.role == entry.role {
                let (previous_index, previous_tick) = (*previous_index, previous.tick);
                alternating.pop();
                skip(agent, &mut outcome, previous_index, Some(previous_tick), SkipReason::RepeatedRole);
            }
        }
        alternating.push((index, entry));
    }
    if alternating.last().is_some_and(|(_, entry)| entry.role == Role::User) {
        if let Some((index, entry)) = alternating.pop() {
            skip(agent, &mut outcome, index, Some(entry.tick), SkipReason::UnpairedPrompt);
        }
    }
    outcome.skipped.sort_by_key(|skipped| skipped.index);

    let mut entries: Vec<HistoryEntry> = alternating.into_iter().map(|(_, entry)| entry).collect();
    if let Some(max_turns) = policy.max_turns {
        let excess = entries.len().saturating_sub(max_turns);
        entries.drain(..excess);
    }

    outcome.retention_dropped = before_retention - entries.len() - count_sequence_skips(&outcome);
    outcome.entries = entries;

    tracing::debug!(
        agent,
        kept = outcome.entries.len(),
        skipped = outcome.skipped.len(),
        retention_dropped = outcome.retention_dropped,
        "history filtered"
    );
    outcome
}

fn count_sequence_skips(outcome: &PruneOutcome) -> usize {
    outcome
        .skipped
        .iter()
        .filter(|skipped| {
            matches!(skipped.reason, SkipReason::RepeatedRole | SkipReason::UnpairedPrompt)
        })
        .count()
}

fn skip(agent: &str, outcome: &mut PruneOutcome, index: usize, tick: Option<u64>, reason: SkipReason) {
    tracing::warn!(agent, index, ?tick, %reason, "skipping turn log entry");
    outcome.skipped.push(SkippedRecord { index, tick, reason });
}

fn parse_record(
    index: usize,
    record: &TurnRecord,
) -> Result<(HistoryEntry, Option<CoercedRole>), SkipReason> {
    let tick = record.tick.ok_or(SkipReason::MissingTick)?;
    let raw_role = record.role.as_deref().ok_or(SkipReason::MissingRole)?;
    let parts = record
        .parts
        .as_deref()
        .filter(|parts| !parts.is_empty())
        .ok_or(SkipReason::EmptyParts)?;

    let text_content: String = parts.iter().filter_map(|part| part.text.as_deref()).collect();
    if text_content.is_empty() {
        return Err(SkipReason::EmptyText);
    }

    let (role, coerced) = match raw_role.parse::<Role>() {
        Ok(role) => (role, None),
        Err(_) => (
            Role::User,
            Some(CoercedRole {
                index,
                original: raw_role.to_string(),
            }),
        ),
    };

    Ok((
        HistoryEntry {
            tick,
            role,
            text_content,
            reasoning_content: record.thinking_content.clone(),
        },
        coerced,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::RecordPart;
    use pretty_assertions::assert_eq;

    fn record(tick: u64, role: &str, text: &str) -> TurnRecord {
        TurnRecord {
            tick: Some(tick),
            role: Some(role.to_string()),
            parts: Some(vec![RecordPart {
                text: Some(text.to_string()),
            }]),
            ..Default::default()
        }
    }

    fn conversation(exchanges: u64) -> Vec<TurnRecord> {
        (1..=exchanges)
            .flat_map(|tick| {
                [
                    record(tick, "user", &format!("prompt {tick}")),
                    record(tick, "model", &format!("reply {tick}")),
                ]
            })
            .collect()
    }

    fn ticks_and_roles(outcome: &PruneOutcome) -> Vec<(u64, Role)> {
        outcome.entries.iter().map(|e| (e.tick, e.role)).collect()
    }

    #[test]
    fn default_policy_keeps_everything_in_order() {
        let records = conversation(3);
        let outcome = filter_and_prune("ada", &records, &RetentionPolicy::default());
        assert_eq!(outcome.entries.len(), 6);
        assert!(!outcome.has_warnings());
        assert_eq!(outcome.retention_dropped, 0);
        let ticks: Vec<u64> = outcome.entries.iter().map(|e| e.tick).collect();
        assert_eq!(ticks, vec![1, 1, 2, 2, 3, 3]);
    }

    #[test]
    fn malformed_records_are_skipped_individually() {
        let mut missing_role = record(2, "user", "x");
        missing_role.role = None;
        let mut empty_parts = record(2, "user", "x");
        empty_parts.parts = Some(vec![]);
        let mut no_parts = record(2, "user", "x");
        no_parts.parts = None;
        let mut no_tick = record(2, "user", "x");
        no_tick.tick = None;

        let records = vec![
            record(1, "user", "hello"),
            missing_role,
            empty_parts,
            no_parts,
            no_tick,
            record(1, "model", "hi"),
        ];
        let outcome = filter_and_prune("ada", &records, &RetentionPolicy::default());

        assert_eq!(ticks_and_roles(&outcome), vec![(1, Role::User), (1, Role::Model)]);
        let reasons: Vec<SkipReason> = outcome.skipped.iter().map(|s| s.reason).collect();
        assert_eq!(
            reasons,
            vec![
                SkipReason::MissingRole,
                SkipReason::EmptyParts,
                SkipReason::EmptyParts,
                SkipReason::MissingTick,
            ]
        );
        assert!(outcome.has_warnings());
    }

    #[test]
    fn unknown_role_is_coerced_not_dropped() {
        let records = vec![record(1, "assistant", "odd"), record(1, "model", "reply")];
        let outcome = filter_and_prune("ada", &records, &RetentionPolicy::default());
        assert_eq!(ticks_and_roles(&outcome), vec![(1, Role::User), (1, Role::Model)]);
        assert_eq!(outcome.coerced, vec![CoercedRole { index: 0, original: "assistant".into() }]);
    }

    #[test]
    fn repeated_roles_keep_the_last_of_each_run() {
        let records = vec![
            record(1, "user", "orphan prompt"),
            record(2, "user", "prompt"),
            record(2, "model", "reply"),
        ];
        let outcome = filter_and_prune("ada", &records, &RetentionPolicy::default());
        assert_eq!(ticks_and_roles(&outcome), vec![(2, Role::User), (2, Role::Model)]);
        assert_eq!(
            outcome.skipped,
            vec![SkippedRecord { index: 0, tick: Some(1), reason: SkipReason::RepeatedRole }]
        );
        assert_eq!(outcome.retention_dropped, 0);
    }

    #[test]
    fn reasoning_only_model_turn_is_skipped_and_alternation_restored() {
        let mut reasoning_only = record(1, "model", "");
        reasoning_only.thinking_content = Some("pondering".into());
        let records = vec![
            record(1, "user", "first"),
            reasoning_only,
            record(2, "user", "second"),
            record(2, "model", "answer"),
        ];
        let outcome = filter_and_prune("ada", &records, &RetentionPolicy::default());
        assert_eq!(ticks_and_roles(&outcome), vec![(2, Role::User), (2, Role::Model)]);
        let reasons: Vec<SkipReason> = outcome.skipped.iter().map(|s| s.reason).collect();
        assert_eq!(reasons, vec![SkipReason::RepeatedRole, SkipReason::EmptyText]);
    }

    #[test]
    fn trailing_prompt_without_reply_is_skipped() {
        let mut reasoning_only = record(2, "model", "");
        reasoning_only.thinking_content = Some("pondering".into());
        let records = vec![
            record(1, "user", "first"),
            record(1, "model", "reply"),
            record(2, "user", "second"),
            reasoning_only,
        ];
        let outcome = filter_and_prune("ada", &records, &RetentionPolicy::default());
        assert_eq!(ticks_and_roles(&outcome), vec![(1, Role::User), (1, Role::Model)]);
        assert_eq!(
            outcome.skipped,
            vec![
                SkippedRecord { index: 2, tick: Some(2), reason: SkipReason::UnpairedPrompt },
                SkippedRecord { index: 3, tick: Some(2), reason: SkipReason::EmptyText },
            ]
        );
        assert_eq!(outcome.retention_dropped, 0);

        let lone = filter_and_prune("ada", &[record(1, "user", "hello")], &RetentionPolicy::default());
        assert!(lone.entries.is_empty());
    }

    #[test]
    fn max_turns_keeps_the_most_recent_entries() {
        let records = conversation(4);
        let policy = RetentionPolicy::default().with_max_turns(3);
        let outcome = filter_and_prune("ada", &records, &policy);
        assert_eq!(
            ticks_and_roles(&outcome),
            vec![(3, Role::Model), (4, Role::User), (4, Role::Model)]
        );
        assert_eq!(outcome.retention_dropped, 5);
        assert!(!outcome.has_warnings());
    }

    #[test]
    fn tick_window_is_relative_to_latest_tick() {
        let records = conversation(5);
        let policy = RetentionPolicy::default().with_tick_window(2);
        let outcome = filter_and_prune("ada", &records, &policy);
        let ticks: Vec<u64> = outcome.entries.iter().map(|e| e.tick).collect();
        assert_eq!(ticks, vec![4, 4, 5, 5]);
    }

    #[test]
    fn tick_window_handles_ticks_near_the_maximum() {
        let records = vec![
            record(u64::MAX - 1, "user", "late"),
            record(u64::MAX - 1, "model", "later"),
        ];
        let outcome = filter_and_prune("ada", &records, &RetentionPolicy::default().with_tick_window(10));
        assert_eq!(outcome.entries.len(), 2);

        let records = vec![
            record(1, "user", "early"),
            record(1, "model", "reply"),
            record(u64::MAX, "user", "late"),
            record(u64::MAX, "model", "reply"),
        ];
        let outcome = filter_and_prune("ada", &records, &RetentionPolicy::default().with_tick_window(u64::MAX));
        let ticks: Vec<u64> = outcome.entries.iter().map(|e| e.tick).collect();
        assert_eq!(ticks, vec![1, 1, u64::MAX, u64::MAX]);
    }

    #[test]
    fn pruned_ticks_are_removed() {
        let records = conversation(3);
        let policy = RetentionPolicy::default().with_pruned_ticks([2]);
        let outcome = filter_and_prune("ada", &records, &policy);
        let ticks: Vec<u64> = outcome.entries.iter().map(|e| e.tick).collect();
        assert_eq!(ticks, vec![1, 1, 3, 3]);
        assert_eq!(outcome.retention_dropped, 2);
    }

    #[test]
    fn output_never_reorders_surviving_entries() {
        let records = vec![
            record(5, "user", "a"),
            record(3, "model", "b"),
            record(9, "user", "c"),
            record(7, "model", "d"),
        ];
        let outcome = filter_and_prune("ada", &records, &RetentionPolicy::default());
        let ticks: Vec<u64> = outcome.entries.iter().map(|e| e.tick).collect();
        assert_eq!(ticks, vec![5, 3, 9, 7]);
    }

    #[test]
    fn text_parts_are_joined_and_reasoning_kept() {
        let mut multi = record(1, "model", "");
        multi.parts = Some(vec![
            RecordPart { text: Some("foo".into()) },
            RecordPart { text: None },
            RecordPart { text: Some("bar".into()) },
        ]);
        multi.thinking_content = Some("why".into());
        let outcome = filter_and_prune("ada", &[multi], &RetentionPolicy::default());
        assert_eq!(outcome.entries[0].text_content, "foobar");
        assert_eq!(outcome.entries[0].reasoning_content.as_deref(), Some("why"));
        assert_eq!(outcome.to_contents()[0].text(), "foobar");
    }

    #[test]
    fn policy_deserializes_from_partial_toml() {
        let policy: RetentionPolicy = toml::from_str("max_turns = 40\npruned_ticks = [3, 4]").unwrap();
        assert_eq!(policy.max_turns, Some(40));
        assert_eq!(policy.tick_window, None);
        assert_eq!(policy.pruned_ticks, BTreeSet::from([3, 4]));
    }
}
