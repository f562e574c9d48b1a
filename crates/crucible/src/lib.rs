//! Crucible: evaluation harness for agent experiment runs
//!
//! Scores recorded runs against labeled test cases and compares the results
//! across named experiments.
//!
//! ## Pipeline
//!
//! - **Evaluators** score one run against one expectation record, grouped into
//!   cost tiers (deterministic, performance, model-judged) plus a human-review
//!   triage flag.
//! - The **harness** folds evaluator results into per-run feedback stats.
//! - The **comparator** averages stored feedback per experiment and metric.
//! - The **reporters** render the aggregation as a console table or a markdown
//!   document with an overall recommendation.
//!
//! Storage and the judge model are injected collaborators, so the whole
//! pipeline runs against in-memory substitutes in tests.

pub mod compare;
pub mod dataset;
pub mod evaluators;
pub mod harness;
pub mod judge;
pub mod loader;
pub mod report;
pub mod run;
pub mod store;

pub use compare::{metric_keys, metric_winner, overall_winner, Aggregation, Comparator};
pub use dataset::{builtin_cases, composition, Category, Expectation, TestCase};
pub use evaluators::{
    all_evaluators, automated_evaluators, judge_evaluators, performance_evaluators, EvalResult,
    Evaluator, INDETERMINATE_SCORE,
};
pub use harness::{evaluate_run, feedback_stats};
pub use judge::{Judge, Verdict};
pub use loader::{load_case, load_cases_from_dir};
pub use report::{generate_report, print_comparison};
pub use run::{FeedbackStats, MetricStats, RunOutcome, StoredRun};
pub use store::{DatasetStore, InMemoryBackend, RunStore};
