//! Ranking maintenance: the update rule, the ordering and the size cap.
//!
//! Everything here is pure. Callers own the [`Ranking`] value, hand it in
//! with a candidate and get the next ranking back; loading and persisting
//! it is their business.

mod compare;

pub use compare::{compare, is_better};

use crate::models::leaderboard::Entry;
use serde::Serialize;
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

pub const DEFAULT_CAPACITY: usize = 10;

#[derive(Debug, Error, PartialEq)]
pub enum RankingError {
    #[error("{0}")]
    InvalidInput(String),
}

/// How a submission interacts with an existing entry of the same name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Policy {
    /// Every valid submission is added.
    #[default]
    Append,
    /// One entry per name; a resubmission replaces it only if better.
    DedupByName,
}

impl Policy {
    pub fn as_str(self) -> &'static str {
        match self {
            Policy::Append => "append",
            Policy::DedupByName => "dedup",
        }
    }
}

impl fmt::Display for Policy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Policy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "append" => Ok(Policy::Append),
            "dedup" | "dedup-by-name" | "dedup_by_name" => Ok(Policy::DedupByName),
            other => Err(format!("unknown policy {:?}, expected append or dedup", other)),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RejectReason {
    NotAnImprovement,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// `rank` is 1-based, `None` when the entry fell off the end.
    Accepted { rank: Option<usize> },
    Rejected(RejectReason),
}

impl Outcome {
    #[cfg(test)]
    pub fn is_accepted(&self) -> bool {
        matches!(self, Outcome::Accepted { .. })
    }
}

/// A sorted, capped entry list. Only the engine builds non-empty ones.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Ranking {
    entries: Vec<Entry>,
}

impl Ranking {
    pub fn empty() -> Self {
        Ranking::default()
    }

    pub fn entries(&self) -> &[Entry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[cfg(test)]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[derive(Debug, Clone, Copy)]
pub struct RankingEngine {
    policy: Policy,
    capacity: usize,
}

impl Default for RankingEngine {
    fn default() -> Self {
        RankingEngine::new(Policy::default(), DEFAULT_CAPACITY)
    }
}

impl RankingEngine {
    pub fn new(policy: Policy, capacity: usize) -> Self {
        RankingEngine {
            policy,
            capacity: capacity.max(1),
        }
    }

    pub fn policy(&self) -> Policy {
        self.policy
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Builds a ranking from whatever a store handed back: any order, any
    /// length, and under the dedup policy possibly repeated names.
    pub fn normalize(&self, entries: Vec<Entry>) -> Ranking {
        let entries = match self.policy {
            Policy::Append => entries,
            Policy::DedupByName => best_per_name(entries),
        };
        let mut entries = compare::merge_sort(entries);
        entries.truncate(self.capacity);
        Ranking { entries }
    }

    /// Applies one submission. A rejection is an `Ok` outcome with the input
    /// ranking returned as-is; only malformed candidates are errors.
    pub fn submit(
        &self,
        ranking: &Ranking,
        candidate: Entry,
    ) -> Result<(Ranking, Outcome), RankingError> {
        if candidate.name.trim().is_empty() {
            return Err(RankingError::InvalidInput(
                "name must be a non-empty string".into(),
            ));
        }
        if !candidate.score.is_finite() {
            return Err(RankingError::InvalidInput("score must be a number".into()));
        }

        let mut entries = ranking.entries.clone();
        let existing = match self.policy {
            Policy::Append => None,
            Policy::DedupByName => entries.iter().position(|e| e.name == candidate.name),
        };

        let slot = match existing {
            Some(idx) if !is_better(&candidate, &entries[idx]) => {
                return Ok((
                    ranking.clone(),
                    Outcome::Rejected(RejectReason::NotAnImprovement),
                ));
            }
            Some(idx) => {
                entries[idx] = candidate;
                idx
            }
            None => {
                entries.push(candidate);
                entries.len() - 1
            }
        };

        let position = compare::sort_tracking(&mut entries, Some(slot));
        entries.truncate(self.capacity);
        let rank = position.filter(|p| *p < self.capacity).map(|p| p + 1);

        Ok((Ranking { entries }, Outcome::Accepted { rank }))
    }

    pub fn query<'a>(&self, ranking: &'a Ranking) -> &'a [Entry] {
        ranking.entries()
    }

    pub fn reset(&self) -> Ranking {
        Ranking::empty()
    }
}

/// Keeps the best entry for each name, at the position its name first
/// appeared.
fn best_per_name(entries: Vec<Entry>) -> Vec<Entry> {
    let mut kept: Vec<Entry> = Vec::with_capacity(entries.len());
    let mut index: HashMap<String, usize> = HashMap::new();
    for entry in entries {
        match index.get(&entry.name) {
            Some(&idx) => {
                if compare(&entry, &kept[idx]) == std::cmp::Ordering::Less {
                    kept[idx] = entry;
                }
            }
            None => {
                index.insert(entry.name.clone(), kept.len());
                kept.push(entry);
            }
        }
    }
    kept
}
