use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;
use std::str::FromStr;

use crate::model::hanja::Chapter;
use crate::model::ids::{HanjaId, UserId};

/// Independent progress key spaces. A card may be known in one and unknown in the other.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Namespace {
    Study,
    Practice,
}

impl Namespace {
    pub const ALL: [Namespace; 2] = [Namespace::Study, Namespace::Practice];

    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Namespace::Study => "study",
            Namespace::Practice => "practice",
        }
    }
}

impl fmt::Display for Namespace {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Namespace {
    type Err = UnknownNamespace;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "study" => Ok(Namespace::Study),
            "practice" => Ok(Namespace::Practice),
            other => Err(UnknownNamespace(other.to_string())),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown progress namespace: {0}")]
pub struct UnknownNamespace(pub String);

/// Which slice of a user's progress to read.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ProgressScope {
    All,
    Chapter(Chapter),
}

impl ProgressScope {
    #[must_use]
    pub fn matches(&self, chapter: Chapter) -> bool {
        match self {
            ProgressScope::All => true,
            ProgressScope::Chapter(c) => *c == chapter,
        }
    }
}

/// Outcome of a single swipe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Classification {
    Known,
    Unknown,
}

impl Classification {
    #[must_use]
    pub fn is_known(&self) -> bool {
        matches!(self, Classification::Known)
    }

    #[must_use]
    pub fn from_known(is_known: bool) -> Self {
        if is_known {
            Classification::Known
        } else {
            Classification::Unknown
        }
    }
}

/// One (user, card) classification. Latest write wins per namespace.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProgressRecord {
    pub user_id: UserId,
    pub hanja_id: HanjaId,
    pub chapter: Chapter,
    pub is_known: bool,
    /// Stamped by the store on write; absent on records that have not been persisted yet.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
}

impl ProgressRecord {
    #[must_use]
    pub fn new(
        user_id: UserId,
        hanja_id: HanjaId,
        chapter: Chapter,
        classification: Classification,
    ) -> Self {
        Self {
            user_id,
            hanja_id,
            chapter,
            is_known: classification.is_known(),
            updated_at: None,
        }
    }

    #[must_use]
    pub fn classification(&self) -> Classification {
        Classification::from_known(self.is_known)
    }

    #[must_use]
    pub fn stamped(mut self, at: DateTime<Utc>) -> Self {
        self.updated_at = Some(at);
        self
    }
}

/// Known/unknown partition of a record list.
///
/// `unknown` keeps first-classification order and never holds duplicates;
/// an id is never in both halves.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProgressSnapshot {
    known: HashSet<HanjaId>,
    unknown: Vec<HanjaId>,
}

impl ProgressSnapshot {
    #[must_use]
    pub fn empty() -> Self {
        Self::default()
    }

    /// Build from store records; a later record for the same id overrides an earlier one.
    #[must_use]
    pub fn from_records<'a>(records: impl IntoIterator<Item = &'a ProgressRecord>) -> Self {
        let mut snapshot = Self::default();
        for record in records {
            snapshot.apply(&record.hanja_id, record.classification());
        }
        snapshot
    }

    /// Move `id` into the half named by `classification`.
    pub fn apply(&mut self, id: &HanjaId, classification: Classification) {
        match classification {
            Classification::Known => {
                self.unknown.retain(|u| u != id);
                self.known.insert(id.clone());
            }
            Classification::Unknown => {
                self.known.remove(id);
                if !self.unknown.contains(id) {
                    self.unknown.push(id.clone());
                }
            }
        }
    }

    #[must_use]
    pub fn known(&self) -> &HashSet<HanjaId> {
        &self.known
    }

    #[must_use]
    pub fn unknown(&self) -> &[HanjaId] {
        &self.unknown
    }

    #[must_use]
    pub fn is_known(&self, id: &HanjaId) -> bool {
        self.known.contains(id)
    }

    #[must_use]
    pub fn is_unknown(&self, id: &HanjaId) -> bool {
        self.unknown.contains(id)
    }

    #[must_use]
    pub fn contains(&self, id: &HanjaId) -> bool {
        self.is_known(id) || self.is_unknown(id)
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.known.is_empty() && self.unknown.is_empty()
    }

    /// Every id the user has classified either way.
    #[must_use]
    pub fn engaged_ids(&self) -> HashSet<HanjaId> {
        self.known
            .iter()
            .chain(self.unknown.iter())
            .cloned()
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(id: u64, is_known: bool) -> ProgressRecord {
        ProgressRecord::new(
            UserId::default(),
            HanjaId::from_number(id),
            Chapter::new(1).unwrap(),
            Classification::from_known(is_known),
        )
    }

    #[test]
    fn snapshot_partitions_records() {
        let records = vec![record(1, true), record(2, false), record(3, false)];
        let snapshot = ProgressSnapshot::from_records(&records);
        assert!(snapshot.is_known(&HanjaId::from_number(1)));
        assert_eq!(
            snapshot.unknown(),
            &[HanjaId::from_number(2), HanjaId::from_number(3)]
        );
        assert_eq!(snapshot.engaged_ids().len(), 3);
    }

    #[test]
    fn later_record_wins() {
        let records = vec![record(1, false), record(1, true)];
        let snapshot = ProgressSnapshot::from_records(&records);
        assert!(snapshot.is_known(&HanjaId::from_number(1)));
        assert!(snapshot.unknown().is_empty());
    }

    #[test]
    fn unknown_insert_is_idempotent() {
        let mut snapshot = ProgressSnapshot::empty();
        let id = HanjaId::from_number(5);
        snapshot.apply(&id, Classification::Unknown);
        snapshot.apply(&id, Classification::Unknown);
        assert_eq!(snapshot.unknown(), std::slice::from_ref(&id));
    }

    #[test]
    fn known_removes_from_unknown() {
        let mut snapshot = ProgressSnapshot::empty();
        let id = HanjaId::from_number(5);
        snapshot.apply(&id, Classification::Unknown);
        snapshot.apply(&id, Classification::Known);
        assert!(snapshot.is_known(&id));
        assert!(!snapshot.is_unknown(&id));
    }

    #[test]
    fn scope_matching() {
        let one = Chapter::new(1).unwrap();
        let two = Chapter::new(2).unwrap();
        assert!(ProgressScope::All.matches(two));
        assert!(ProgressScope::Chapter(one).matches(one));
        assert!(!ProgressScope::Chapter(one).matches(two));
    }

    #[test]
    fn namespace_parses() {
        assert_eq!("study".parse::<Namespace>().unwrap(), Namespace::Study);
        assert_eq!("practice".parse::<Namespace>().unwrap(), Namespace::Practice);
        assert!("quiz".parse::<Namespace>().is_err());
    }

    #[test]
    fn record_wire_shape_matches_api() {
        let json = serde_json::to_value(record(9, true)).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "user_id": "default",
                "hanja_id": "9",
                "chapter": 1,
                "is_known": true
            })
        );
    }
}
