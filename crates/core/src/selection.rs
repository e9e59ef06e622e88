//! Weighted question selection.
//!
//! A test is drawn per category in quota-table order. Inside each category,
//! questions are sampled without replacement with a probability proportional
//! to [`question_weight`]. The weight favours questions that were never shown
//! or are often answered wrong. Any shortfall is backfilled from the rest of
//! the pool and the final list is shuffled.

use rand::Rng;
use rand::seq::SliceRandom;
use std::collections::HashSet;
use tracing::debug;

use crate::model::{Category, ProgressSnapshot, Question, QuestionId, QuotaTable};

/// Weight of a question that was never shown.
pub const MAX_WEIGHT: f64 = 10.0;

/// Weight of a fully mastered question before the exposure boost.
const MIN_BASE_WEIGHT: f64 = 1.0;

/// Spread between mastered and always-failed questions.
const ACCURACY_SPAN: f64 = MAX_WEIGHT - MIN_BASE_WEIGHT;

/// Boost for questions shown fewer than 3 times.
const FRESH_BOOST: f64 = 1.5;

/// Boost for questions shown 3 or 4 times.
const SETTLING_BOOST: f64 = 1.2;

//
// ─── WEIGHT ────────────────────────────────────────────────────────────────────
//

/// Sampling priority of one question given the progress snapshot.
///
/// Unseen questions get [`MAX_WEIGHT`]. Seen questions map accuracy linearly
/// from 10.0 (always wrong) down to 1.0 (always right), then get a boost
/// while they have few appearances. The result is always strictly positive.
///
/// # Examples
///
/// ```
/// # use quiz_core::model::{ProgressSnapshot, QuestionId};
/// # use quiz_core::selection::{question_weight, MAX_WEIGHT};
/// let progress = ProgressSnapshot::new();
/// assert_eq!(question_weight(QuestionId::new(1), &progress), MAX_WEIGHT);
/// ```
#[must_use]
pub fn question_weight(id: QuestionId, progress: &ProgressSnapshot) -> f64 {
    let Some(record) = progress.get(id) else {
        return MAX_WEIGHT;
    };
    let Some(accuracy) = record.accuracy() else {
        return MAX_WEIGHT;
    };

    let base = MIN_BASE_WEIGHT + (1.0 - accuracy) * ACCURACY_SPAN;
    let boost = match record.appearances() {
        0..=2 => FRESH_BOOST,
        3..=4 => SETTLING_BOOST,
        _ => 1.0,
    };
    base * boost
}

//
// ─── WEIGHTED DRAW ─────────────────────────────────────────────────────────────
//

/// Draw up to `count` items without replacement, proportionally to weight.
///
/// Each draw takes `r` uniformly in `[0, total)` and walks the remaining
/// candidates in order, subtracting weights until `r <= 0`. When rounding
/// leaves `r` positive after the walk, the last remaining candidate wins.
/// Candidates keep their relative order after a removal. If every remaining
/// weight is zero the draw falls back to a uniform pick.
pub fn draw_weighted<T, R>(candidates: Vec<(T, f64)>, count: usize, rng: &mut R) -> Vec<T>
where
    R: Rng + ?Sized,
{
    let mut remaining = candidates;
    let mut picked = Vec::with_capacity(count.min(remaining.len()));

    while picked.len() < count && !remaining.is_empty() {
        let total: f64 = remaining.iter().map(|(_, weight)| *weight).sum();

        let idx = if total > 0.0 {
            let mut r = rng.random::<f64>() * total;
            let mut chosen = remaining.len() - 1;
            for (i, (_, weight)) in remaining.iter().enumerate() {
                r -= *weight;
                if r <= 0.0 {
                    chosen = i;
                    break;
                }
            }
            chosen
        } else {
            rng.random_range(0..remaining.len())
        };

        picked.push(remaining.remove(idx).0);
    }

    picked
}

//
// ─── SELECTOR ──────────────────────────────────────────────────────────────────
//

/// Draws tests from a question pool according to a [`QuotaTable`].
///
/// The selector holds no mutable state. Every call works on the pool and
/// progress snapshot it is handed, so one selector can be shared freely.
#[derive(Debug, Clone, Default)]
pub struct QuestionSelector {
    quotas: QuotaTable,
}

impl QuestionSelector {
    #[must_use]
    pub fn new(quotas: QuotaTable) -> Self {
        Self { quotas }
    }

    #[must_use]
    pub fn quotas(&self) -> &QuotaTable {
        &self.quotas
    }

    /// Select up to `target` distinct questions from `pool`.
    ///
    /// The result never holds more than `target` questions, nor more than the
    /// number of distinct ids in the pool. An empty pool yields an empty
    /// result. Repeated ids in the pool are collapsed to their first
    /// occurrence.
    pub fn select<R>(
        &self,
        pool: &[Question],
        progress: &ProgressSnapshot,
        target: usize,
        rng: &mut R,
    ) -> Vec<Question>
    where
        R: Rng + ?Sized,
    {
        if pool.is_empty() || target == 0 {
            debug!(pool = pool.len(), target, "nothing to select");
            return Vec::new();
        }

        let mut seen = HashSet::with_capacity(pool.len());
        let unique: Vec<&Question> = pool.iter().filter(|q| seen.insert(q.id())).collect();

        let mut selected: Vec<&Question> = Vec::with_capacity(target.min(unique.len()));

        for &(category, quota) in self.quotas.entries() {
            let candidates: Vec<(&Question, f64)> = unique
                .iter()
                .filter(|q| self.quotas.bucket_for(q.category()) == category)
                .map(|q| (*q, question_weight(q.id(), progress)))
                .collect();

            if candidates.is_empty() {
                debug!(%category, "no questions available for category");
                continue;
            }

            let take = usize::try_from(quota)
                .unwrap_or(usize::MAX)
                .min(candidates.len());
            selected.extend(draw_weighted(candidates, take, rng));
        }

        if selected.len() < target {
            let chosen: HashSet<QuestionId> = selected.iter().map(|q| q.id()).collect();
            let leftovers: Vec<(&Question, f64)> = unique
                .iter()
                .filter(|q| !chosen.contains(&q.id()))
                .map(|q| (*q, question_weight(q.id(), progress)))
                .collect();
            let missing = target - selected.len();
            debug!(missing, available = leftovers.len(), "backfilling selection");
            selected.extend(draw_weighted(leftovers, missing, rng));
        }

        selected.shuffle(rng);
        selected.truncate(target);
        selected.into_iter().cloned().collect()
    }

    /// Pick one question not listed in `exclude`, weighted like a regular draw.
    ///
    /// Used to swap out a question flagged as invalid in the middle of a test.
    pub fn select_replacement<R>(
        &self,
        pool: &[Question],
        progress: &ProgressSnapshot,
        exclude: &HashSet<QuestionId>,
        rng: &mut R,
    ) -> Option<Question>
    where
        R: Rng + ?Sized,
    {
        let mut seen = HashSet::new();
        let candidates: Vec<(&Question, f64)> = pool
            .iter()
            .filter(|q| !exclude.contains(&q.id()) && seen.insert(q.id()))
            .map(|q| (q, question_weight(q.id(), progress)))
            .collect();
        draw_weighted(candidates, 1, rng).pop().cloned()
    }
}

/// Count how many questions of each bucket a selection holds, in table order.
#[must_use]
pub fn category_counts(quotas: &QuotaTable, questions: &[Question]) -> Vec<(Category, usize)> {
    quotas
        .entries()
        .iter()
        .map(|(category, _)| {
            let n = questions
                .iter()
                .filter(|q| quotas.bucket_for(q.category()) == *category)
                .count();
            (*category, n)
        })
        .collect()
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//
