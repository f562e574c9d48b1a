//! Cross-experiment comparison
//!
//! Averages the feedback statistics attached to each experiment's stored runs
//! into a per-experiment, per-metric table, then offers the winner-selection
//! helpers both renderers share.

use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;

use anyhow::{Context, Result};
use tracing::warn;

use crate::store::RunStore;

/// Per-experiment, per-metric averaged scores.
///
/// A plain nested mapping, serializable without loss. A metric key absent for
/// one experiment means "no data for that metric", which is not the same as a
/// measured 0.
pub type Aggregation = BTreeMap<String, BTreeMap<String, f64>>;

/// Aggregates stored-run feedback across named experiments.
pub struct Comparator {
    store: Arc<dyn RunStore>,
}

impl Comparator {
    /// Create a comparator over an injected run store
    pub fn new(store: Arc<dyn RunStore>) -> Self {
        Self { store }
    }

    /// Compare experiments side by side.
    ///
    /// Experiments with no recorded runs are skipped with a warning and are
    /// absent from the result. A run without feedback stats contributes
    /// nothing; a run lacking one specific metric key is excluded from that
    /// metric's average only. Fetch transport faults propagate.
    pub async fn compare(
        &self,
        experiment_names: &[String],
        metrics: Option<&[String]>,
    ) -> Result<Aggregation> {
        let mut aggregation = Aggregation::new();

        for name in experiment_names {
            let runs = self
                .store
                .fetch_root_runs(name)
                .await
                .with_context(|| format!("Failed to fetch runs for experiment '{}'", name))?;

            if runs.is_empty() {
                warn!("No runs found for experiment '{}'", name);
                continue;
            }

            let mut samples: BTreeMap<String, Vec<f64>> = BTreeMap::new();
            for run in &runs {
                let Some(stats) = &run.feedback_stats else {
                    continue;
                };
                for (key, stat) in stats {
                    if let Some(filter) = metrics {
                        if !filter.iter().any(|m| m == key) {
                            continue;
                        }
                    }
                    samples.entry(key.clone()).or_default().push(stat.avg);
                }
            }

            let averaged = samples
                .into_iter()
                .map(|(key, values)| {
                    let avg = values.iter().sum::<f64>() / values.len() as f64;
                    (key, avg)
                })
                .collect();
            aggregation.insert(name.clone(), averaged);
        }

        Ok(aggregation)
    }
}

/// Union of metric keys across all experiments, sorted.
pub fn metric_keys(aggregation: &Aggregation) -> BTreeSet<String> {
    aggregation
        .values()
        .flat_map(|metrics| metrics.keys().cloned())
        .collect()
}

/// The experiment with the strictly best value for one metric.
///
/// Absent keys compare as 0, but a tie at the top between a measured value and
/// an absent-key 0 goes to the measured one. Returns `None` when every
/// experiment holds the identical value.
pub fn metric_winner<'a>(aggregation: &'a Aggregation, metric: &str) -> Option<&'a str> {
    let mut best: Option<(&str, f64, bool)> = None;
    let mut all_tied = true;

    for (name, metrics) in aggregation {
        let measured = metrics.get(metric);
        let value = measured.copied().unwrap_or(0.0);

        match &best {
            None => best = Some((name, value, measured.is_some())),
            Some((_, best_value, best_measured)) => {
                if value != *best_value {
                    all_tied = false;
                }
                if value > *best_value
                    || (value == *best_value && measured.is_some() && !*best_measured)
                {
                    best = Some((name, value, measured.is_some()));
                }
            }
        }
    }

    if all_tied {
        None
    } else {
        best.map(|(name, _, _)| name)
    }
}

/// The experiment with the greatest sum of its metric averages.
///
/// An unweighted total across differently-scaled metrics: a documented policy
/// choice, not a normalized ranking. Ties go to the first experiment in map
/// order.
pub fn overall_winner(aggregation: &Aggregation) -> Option<(&str, f64)> {
    let mut winner: Option<(&str, f64)> = None;

    for (name, metrics) in aggregation {
        let total: f64 = metrics.values().sum();
        match winner {
            Some((_, best)) if total <= best => {}
            _ => winner = Some((name.as_str(), total)),
        }
    }

    winner
}
