//! Keep/discard classification over a set of model records.
//!
//! Classification is recomputed from scratch over the full set every time.
//! A record is only discarded when another record is provably at least as good,
//! so at least one record with scores always survives.

use crate::codec::{Accuracies, ModelRecord};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RetentionPolicy {
    /// Keep only the records with the highest combined accuracy.
    BestOnly,
    /// Keep the Pareto frontier over combined, train and validation accuracy.
    #[default]
    Pareto,
}

impl RetentionPolicy {
    /// Maps the `save_best_only` switch onto a policy.
    #[must_use]
    pub fn from_save_best_only(save_best_only: bool) -> Self {
        if save_best_only {
            Self::BestOnly
        } else {
            Self::Pareto
        }
    }

    /// `true` when `better` makes `other` redundant under this policy.
    #[must_use]
    pub fn dominates(self, better: &Accuracies, other: &Accuracies) -> bool {
        match self {
            Self::BestOnly => better.combined > other.combined,
            Self::Pareto => {
                let at_least = better.combined >= other.combined
                    && better.train >= other.train
                    && better.val >= other.val;
                let strictly = better.combined > other.combined
                    || better.train > other.train
                    || better.val > other.val;
                at_least && strictly
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Verdict {
    Keep,
    /// Indices (into the classified slice) of the records that dominate this one.
    Discard { dominated_by: Vec<usize> },
}

impl Verdict {
    #[must_use]
    pub fn is_keep(&self) -> bool {
        matches!(self, Self::Keep)
    }
}

/// Classify every record; the result is index-aligned with `records`.
///
/// Records without scores never take part: they are always kept and never
/// dominate anything.
#[must_use]
pub fn classify(records: &[ModelRecord], policy: RetentionPolicy) -> Vec<Verdict> {
    records
        .iter()
        .enumerate()
        .map(|(idx, record)| {
            if !record.has_scores() {
                return Verdict::Keep;
            }
            let acc = record.accuracies();
            let dominated_by: Vec<usize> = records
                .iter()
                .enumerate()
                .filter(|(other_idx, other)| {
                    *other_idx != idx
                        && other.path() != record.path()
                        && other.has_scores()
                        && policy.dominates(&other.accuracies(), &acc)
                })
                .map(|(other_idx, _)| other_idx)
                .collect();

            if dominated_by.is_empty() {
                Verdict::Keep
            } else {
                Verdict::Discard { dominated_by }
            }
        })
        .collect()
}

/// Record with the highest combined accuracy; ties go to the smallest file name.
#[must_use]
pub fn best_of<'a, I>(records: I) -> Option<&'a ModelRecord>
where
    I: IntoIterator<Item = &'a ModelRecord>,
{
    records.into_iter().max_by(|a, b| {
        a.accuracies()
            .combined
            .total_cmp(&b.accuracies().combined)
            .then_with(|| b.file_name().cmp(&a.file_name()))
    })
}

/// Orders records best first, using the same tie-break as [`best_of`].
pub fn sort_best_first(records: &mut [ModelRecord]) {
    records.sort_by(|a, b| {
        b.accuracies()
            .combined
            .total_cmp(&a.accuracies().combined)
            .then_with(|| a.file_name().cmp(&b.file_name()))
    });
}
