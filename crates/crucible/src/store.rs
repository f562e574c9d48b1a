//! Storage collaborators
//!
//! The comparator and dataset registration talk to the run-storage backend
//! through these traits. Production deployments implement them against their
//! tracking service; [`InMemoryBackend`] serves tests and local runs-file
//! workflows.

use std::collections::HashMap;

use async_trait::async_trait;
use common::{Error, Result};
use tokio::sync::Mutex;

use crate::dataset::TestCase;
use crate::run::StoredRun;

/// Read access to recorded experiment runs.
#[async_trait]
pub trait RunStore: Send + Sync {
    /// Fetch the root-level runs recorded under an experiment name.
    ///
    /// May return empty; transport faults surface as errors.
    async fn fetch_root_runs(&self, experiment: &str) -> Result<Vec<StoredRun>>;
}

/// Write access to evaluation datasets.
#[async_trait]
pub trait DatasetStore: Send + Sync {
    async fn dataset_exists(&self, name: &str) -> Result<bool>;

    async fn create_dataset(&self, name: &str, description: &str) -> Result<()>;

    async fn add_case(&self, dataset: &str, case: &TestCase) -> Result<()>;
}

#[derive(Debug, Default)]
struct BackendState {
    experiments: HashMap<String, Vec<StoredRun>>,
    datasets: HashMap<String, Dataset>,
}

#[derive(Debug, Default)]
struct Dataset {
    description: String,
    cases: Vec<TestCase>,
}

/// In-memory backend implementing both storage traits.
#[derive(Debug, Default)]
pub struct InMemoryBackend {
    state: Mutex<BackendState>,
}

impl InMemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a run under an experiment name.
    pub async fn record_run(&self, experiment: &str, run: StoredRun) {
        self.state
            .lock()
            .await
            .experiments
            .entry(experiment.to_string())
            .or_default()
            .push(run);
    }

    /// Names of all experiments with at least one recorded run, sorted.
    pub async fn experiment_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.state.lock().await.experiments.keys().cloned().collect();
        names.sort();
        names
    }

    /// Description of a registered dataset.
    pub async fn dataset_description(&self, name: &str) -> Option<String> {
        self.state
            .lock()
            .await
            .datasets
            .get(name)
            .map(|d| d.description.clone())
    }

    /// Cases registered under a dataset name.
    pub async fn dataset_cases(&self, name: &str) -> Vec<TestCase> {
        self.state
            .lock()
            .await
            .datasets
            .get(name)
            .map(|d| d.cases.clone())
            .unwrap_or_default()
    }
}

#[async_trait]
impl RunStore for InMemoryBackend {
    async fn fetch_root_runs(&self, experiment: &str) -> Result<Vec<StoredRun>> {
        Ok(self
            .state
            .lock()
            .await
            .experiments
            .get(experiment)
            .cloned()
            .unwrap_or_default())
    }
}

#[async_trait]
impl DatasetStore for InMemoryBackend {
    async fn dataset_exists(&self, name: &str) -> Result<bool> {
        Ok(self.state.lock().await.datasets.contains_key(name))
    }

    async fn create_dataset(&self, name: &str, description: &str) -> Result<()> {
        let mut state = self.state.lock().await;
        if state.datasets.contains_key(name) {
            return Err(Error::Storage(format!("Dataset already exists: {name}")));
        }
        state.datasets.insert(
            name.to_string(),
            Dataset {
                description: description.to_string(),
                cases: Vec::new(),
            },
        );
        Ok(())
    }

    async fn add_case(&self, dataset: &str, case: &TestCase) -> Result<()> {
        let mut state = self.state.lock().await;
        let entry = state
            .datasets
            .get_mut(dataset)
            .ok_or_else(|| Error::Storage(format!("Dataset not found: {dataset}")))?;
        entry.cases.push(case.clone());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_record_and_fetch_runs() {
        let backend = InMemoryBackend::new();
        backend.record_run("exp_a", StoredRun::default()).await;
        backend.record_run("exp_a", StoredRun::default()).await;

        let runs = backend.fetch_root_runs("exp_a").await.unwrap();
        assert_eq!(runs.len(), 2);

        let missing = backend.fetch_root_runs("ghost_exp").await.unwrap();
        assert!(missing.is_empty());
    }

    #[tokio::test]
    async fn test_dataset_lifecycle() {
        let backend = InMemoryBackend::new();
        assert!(!backend.dataset_exists("cases").await.unwrap());

        backend.create_dataset("cases", "test dataset").await.unwrap();
        assert!(backend.dataset_exists("cases").await.unwrap());
        assert_eq!(
            backend.dataset_description("cases").await.as_deref(),
            Some("test dataset")
        );

        let case = TestCase::new("basic", crate::dataset::Category::HappyPath);
        backend.add_case("cases", &case).await.unwrap();
        assert_eq!(backend.dataset_cases("cases").await.len(), 1);

        let dup = backend.create_dataset("cases", "again").await;
        assert!(dup.is_err());
    }

    #[tokio::test]
    async fn test_add_case_unknown_dataset() {
        let backend = InMemoryBackend::new();
        let case = TestCase::new("basic", crate::dataset::Category::HappyPath);
        assert!(backend.add_case("missing", &case).await.is_err());
    }
}
