//! Comparison renderers
//!
//! Two views over one [`Aggregation`]: a console table with per-metric winner
//! lines, and a markdown document with emphasized row maxima and an overall
//! recommendation.

use std::path::Path;

use anyhow::{Context, Result};
use tracing::info;

use crate::compare::{metric_keys, metric_winner, overall_winner, Aggregation};

/// Print the comparison as a console table.
///
/// One row per metric (sorted), one right-aligned column per experiment,
/// 3-decimal precision, and a "Best" line under each row unless every
/// experiment holds the identical value.
pub fn print_comparison(aggregation: &Aggregation) {
    if aggregation.is_empty() {
        println!("No comparison data available");
        return;
    }

    let names: Vec<&String> = aggregation.keys().collect();

    let mut header = format!("{:<25} | ", "Metric");
    header.push_str(
        &names
            .iter()
            .map(|name| format!("{:<15}", name))
            .collect::<Vec<_>>()
            .join(" | "),
    );
    println!("{}", header);
    println!("{}", "-".repeat(header.chars().count()));

    for metric in metric_keys(aggregation) {
        let mut row = format!("{:<25} | ", metric);
        row.push_str(
            &names
                .iter()
                .map(|name| {
                    let value = aggregation[*name].get(&metric).copied().unwrap_or(0.0);
                    format!("{:>15.3}", value)
                })
                .collect::<Vec<_>>()
                .join(" | "),
        );
        println!("{}", row);

        if let Some(winner) = metric_winner(aggregation, &metric) {
            println!("  -> Best: {}", winner);
        }
    }
}

/// Render the comparison as a markdown report.
///
/// The summary table matches the console renderer's content with every cell
/// equal to the row maximum shown in bold. The recommendation names the
/// experiment with the greatest unweighted sum of its metric averages.
/// When `output` is given the report is also written there, overwriting any
/// existing content.
pub fn generate_report(aggregation: &Aggregation, output: Option<&Path>) -> Result<String> {
    let mut report = vec!["# Experiment Comparison Report".to_string(), String::new()];

    if aggregation.is_empty() {
        report.push("No comparison data available.".to_string());
    } else {
        let names: Vec<&String> = aggregation.keys().collect();

        report.push("## Summary".to_string());
        report.push(String::new());
        report.push(format!(
            "| Metric | {} |",
            names
                .iter()
                .map(|s| s.as_str())
                .collect::<Vec<_>>()
                .join(" | ")
        ));
        report.push(format!("|{}", "---|".repeat(names.len() + 1)));

        for metric in metric_keys(aggregation) {
            let values: Vec<f64> = names
                .iter()
                .map(|name| aggregation[*name].get(&metric).copied().unwrap_or(0.0))
                .collect();
            let row_max = values.iter().copied().fold(f64::NEG_INFINITY, f64::max);

            let mut row = format!("| {} |", metric);
            for value in values {
                if value == row_max {
                    row.push_str(&format!(" **{:.3}** |", value));
                } else {
                    row.push_str(&format!(" {:.3} |", value));
                }
            }
            report.push(row);
        }

        report.push(String::new());
        report.push("## Recommendations".to_string());
        report.push(String::new());

        if let Some((winner, _total)) = overall_winner(aggregation) {
            report.push(format!(
                "- **Overall Best**: {} (highest total score)",
                winner
            ));
        }
    }

    let text = report.join("\n");

    if let Some(path) = output {
        std::fs::write(path, &text)
            .with_context(|| format!("Failed to save report to {}", path.display()))?;
        info!("Report saved to: {}", path.display());
    }

    Ok(text)
}
