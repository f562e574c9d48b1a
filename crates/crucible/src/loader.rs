//! TOML test-case loader
//!
//! Loads evaluation test cases from external TOML files, one case per file.

use std::path::Path;

use anyhow::{Context, Result};

use crate::dataset::TestCase;

/// Load a test case from a TOML file
pub fn load_case(path: &Path) -> Result<TestCase> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read case file: {}", path.display()))?;

    toml::from_str(&content).with_context(|| format!("Failed to parse case file: {}", path.display()))
}

/// Load all test cases from a directory
///
/// Files that fail to parse are skipped with a warning so one bad fixture
/// never blocks the rest of the suite.
pub fn load_cases_from_dir(dir: &Path) -> Result<Vec<TestCase>> {
    let mut cases = Vec::new();

    for entry in std::fs::read_dir(dir)
        .with_context(|| format!("Failed to read cases directory: {}", dir.display()))?
    {
        let entry = entry?;
        let path = entry.path();

        if path.extension().is_some_and(|ext| ext == "toml") {
            match load_case(&path) {
                Ok(case) => {
                    tracing::info!("Loaded case: {} from {}", case.name, path.display());
                    cases.push(case);
                }
                Err(e) => {
                    tracing::warn!("Failed to load {}: {}", path.display(), e);
                }
            }
        }
    }

    // Sort by name for consistent ordering
    cases.sort_by(|a, b| a.name.cmp(&b.name));

    Ok(cases)
}
