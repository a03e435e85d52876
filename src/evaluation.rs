//! Ranking evaluation.
//!
//! A [`RankingRun`] owns the rankings computed for one evaluation: it is
//! created empty, filled once with one [`RankSplit`] per data split, read
//! by any number of rank metrics, and finally consumed. Every evaluation
//! gets its own run, so results from two evaluations never mix.
//!
//! ```text
//!   new() ──fill()──▶ Filled ──consume()──▶ Consumed
//!                       │
//!                  evaluate(metric)
//! ```

use std::collections::HashMap;

use crate::algorithm::{rank_result, Scores};
use crate::model::{Frame, Value};
use crate::{Error, Result};

// ============================================================================
// RankSplit
// ============================================================================

/// Rankings and ground truth for one split of the data.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RankSplit {
    /// Recommended items per user, best first.
    pub ranked: HashMap<Value, Vec<Value>>,
    /// Test ratings per user: item → true score.
    pub truth: HashMap<Value, HashMap<Value, f64>>,
}

impl RankSplit {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a user's ranking from recommender scores.
    pub fn add_ranking(&mut self, user: impl Into<Value>, scores: &Scores) {
        let items = rank_result(scores, None).into_iter().map(|(n, _)| n.into_value()).collect();
        self.ranked.insert(user.into(), items);
    }

    /// Build a split from a predictions frame and a truth frame, both with
    /// `from_id, to_id, score` columns. Predictions are ranked by
    /// descending score.
    pub fn from_frames(predictions: &Frame, truth: &Frame) -> Result<Self> {
        let mut split = Self::new();

        let mut scored: HashMap<Value, Vec<(Value, f64)>> = HashMap::new();
        for row in predictions.rating_rows()? {
            scored.entry(row.from_id).or_default().push((row.to_id, row.score));
        }
        for (user, mut items) in scored {
            items.sort_by(|a, b| b.1.total_cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
            split.ranked.insert(user, items.into_iter().map(|(item, _)| item).collect());
        }

        for row in truth.rating_rows()? {
            split.truth.entry(row.from_id).or_default().insert(row.to_id, row.score);
        }
        Ok(split)
    }

    fn relevant(&self, user: &Value, threshold: f64) -> Vec<&Value> {
        self.truth
            .get(user)
            .map(|items| items.iter().filter(|(_, s)| **s >= threshold).map(|(i, _)| i).collect())
            .unwrap_or_default()
    }
}

// ============================================================================
// RankingRun
// ============================================================================

/// Lifecycle stage of a [`RankingRun`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunStage {
    Created,
    Filled,
    Consumed,
}

#[derive(Debug, Clone, PartialEq)]
enum RunState {
    Created,
    Filled(Vec<RankSplit>),
    Consumed,
}

/// Rankings of one evaluation, with an explicit lifecycle.
#[derive(Debug, Clone, PartialEq)]
pub struct RankingRun {
    state: RunState,
}

impl Default for RankingRun {
    fn default() -> Self {
        Self::new()
    }
}

impl RankingRun {
    pub fn new() -> Self {
        Self { state: RunState::Created }
    }

    pub fn stage(&self) -> RunStage {
        match self.state {
            RunState::Created => RunStage::Created,
            RunState::Filled(_) => RunStage::Filled,
            RunState::Consumed => RunStage::Consumed,
        }
    }

    /// Store the rankings. A run can be filled once.
    pub fn fill(&mut self, splits: Vec<RankSplit>) -> Result<()> {
        match self.state {
            RunState::Created => {
                tracing::debug!(splits = splits.len(), "ranking run filled");
                self.state = RunState::Filled(splits);
                Ok(())
            }
            RunState::Filled(_) => Err(Error::RunState("rankings were already computed for this run".into())),
            RunState::Consumed => Err(Error::RunState("run was already consumed".into())),
        }
    }

    /// The stored rankings, while the run is filled.
    pub fn splits(&self) -> Result<&[RankSplit]> {
        match &self.state {
            RunState::Filled(splits) => Ok(splits),
            RunState::Created => Err(Error::RunState("run has not been filled".into())),
            RunState::Consumed => Err(Error::RunState("run was already consumed".into())),
        }
    }

    /// Score every split with `metric`.
    pub fn evaluate(&self, metric: &dyn RankMetric) -> Result<Vec<f64>> {
        Ok(self.splits()?.iter().map(|s| metric.perform(s)).collect())
    }

    /// Take the rankings out and end the run.
    pub fn consume(&mut self) -> Result<Vec<RankSplit>> {
        match std::mem::replace(&mut self.state, RunState::Consumed) {
            RunState::Filled(splits) => Ok(splits),
            RunState::Created => {
                self.state = RunState::Created;
                Err(Error::RunState("run has not been filled".into()))
            }
            RunState::Consumed => Err(Error::RunState("run was already consumed".into())),
        }
    }
}

// ============================================================================
// Rank metrics
// ============================================================================

/// A metric computed from one split's rankings.
pub trait RankMetric {
    fn name(&self) -> String;
    fn perform(&self, split: &RankSplit) -> f64;
}

/// Share of the top `k` recommendations that are relevant, averaged over
/// users. `k = None` looks at the whole ranking.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Precision {
    pub k: Option<usize>,
    pub relevant_threshold: f64,
}

/// Share of a user's relevant items found in the top `k` recommendations,
/// averaged over users that have relevant items.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Recall {
    pub k: Option<usize>,
    pub relevant_threshold: f64,
}

fn top_k(ranking: &[Value], k: Option<usize>) -> &[Value] {
    &ranking[..k.map_or(ranking.len(), |k| k.min(ranking.len()))]
}

#[allow(clippy::cast_precision_loss)]
fn mean(values: impl IntoIterator<Item = f64>) -> f64 {
    let (sum, n) = values.into_iter().fold((0.0, 0usize), |(s, n), v| (s + v, n + 1));
    if n == 0 { 0.0 } else { sum / n as f64 }
}

impl RankMetric for Precision {
    fn name(&self) -> String {
        match self.k {
            Some(k) => format!("Precision@{k}"),
            None => "Precision".to_owned(),
        }
    }

    #[allow(clippy::cast_precision_loss)]
    fn perform(&self, split: &RankSplit) -> f64 {
        mean(split.ranked.iter().filter_map(|(user, ranking)| {
            let top = top_k(ranking, self.k);
            if top.is_empty() {
                return None;
            }
            let relevant = split.relevant(user, self.relevant_threshold);
            let hits = top.iter().filter(|i| relevant.contains(i)).count();
            Some(hits as f64 / top.len() as f64)
        }))
    }
}

impl RankMetric for Recall {
    fn name(&self) -> String {
        match self.k {
            Some(k) => format!("Recall@{k}"),
            None => "Recall".to_owned(),
        }
    }

    #[allow(clippy::cast_precision_loss)]
    fn perform(&self, split: &RankSplit) -> f64 {
        mean(split.ranked.iter().filter_map(|(user, ranking)| {
            let relevant = split.relevant(user, self.relevant_threshold);
            if relevant.is_empty() {
                return None;
            }
            let hits = top_k(ranking, self.k).iter().filter(|i| relevant.contains(i)).count();
            Some(hits as f64 / relevant.len() as f64)
        }))
    }
}

/// Precision at `k` of every split in `run`.
pub fn precision_at(run: &RankingRun, k: usize, relevant_threshold: f64) -> Result<Vec<f64>> {
    run.evaluate(&Precision { k: Some(k), relevant_threshold })
}

/// Recall at `k` of every split in `run`.
pub fn recall_at(run: &RankingRun, k: usize, relevant_threshold: f64) -> Result<Vec<f64>> {
    run.evaluate(&Recall { k: Some(k), relevant_threshold })
}
