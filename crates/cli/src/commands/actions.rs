//! Show the remediation catalog

use anyhow::Result;
use colored::Colorize;
use scorer_lib::anomaly::{catalog, lookup, Remediation};
use serde_json::json;
use tabled::Tabled;

use crate::output::{print_json, print_table, OutputFormat};

/// Row for catalog table
#[derive(Tabled)]
struct CatalogRow {
    #[tabled(rename = "Family")]
    family: String,
    #[tabled(rename = "Keywords")]
    keywords: String,
    #[tabled(rename = "Likely Cause")]
    cause: String,
}

fn keywords(entry: &Remediation) -> String {
    if entry.keywords.is_empty() {
        "(any other metric)".to_string()
    } else {
        entry.keywords.join(", ")
    }
}

fn to_json(entry: &Remediation) -> serde_json::Value {
    json!({
        "family": entry.family,
        "keywords": entry.keywords,
        "cause": entry.cause,
        "actions": entry.actions,
        "impact": entry.impact,
        "critical_impact": entry.critical_impact,
        "revenue_per_unit": entry.revenue_per_unit,
    })
}

/// List the whole catalog, or the entry a metric name resolves to
pub fn run(metric: Option<String>, format: OutputFormat) -> Result<()> {
    let Some(metric) = metric else {
        return list(format);
    };

    let entry = lookup(&metric);
    match format {
        OutputFormat::Json => print_json(&to_json(entry))?,
        OutputFormat::Text | OutputFormat::Table => {
            println!("{}", "Remediation".bold());
            println!("{}", "=".repeat(50));
            println!("Metric:          {}", metric.cyan());
            println!("Family:          {}", entry.family);
            println!("Likely cause:    {}", entry.cause);
            println!("Impact:          {}", entry.impact);
            println!("Critical impact: {}", entry.critical_impact);
            println!();
            println!("{}", "Recommended Actions".bold());
            for (i, action) in entry.actions.iter().enumerate() {
                println!("{}. {}", i + 1, action);
            }
        }
    }

    Ok(())
}

fn list(format: OutputFormat) -> Result<()> {
    match format {
        OutputFormat::Json => {
            let entries: Vec<_> = catalog().iter().map(to_json).collect();
            print_json(&entries)?;
        }
        OutputFormat::Text | OutputFormat::Table => {
            let rows: Vec<CatalogRow> = catalog()
                .iter()
                .map(|entry| CatalogRow {
                    family: entry.family.to_string(),
                    keywords: keywords(entry),
                    cause: entry.cause.to_string(),
                })
                .collect();
            print_table(rows);
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fallback_keywords_label() {
        let fallback = catalog().last().unwrap();
        assert_eq!(keywords(fallback), "(any other metric)");
        assert_eq!(keywords(lookup("cpu_usage")), "cpu");
    }

    #[test]
    fn test_entry_json() {
        let value = to_json(lookup("error_rate"));
        assert_eq!(value["family"], "errors");
        assert_eq!(value["actions"].as_array().unwrap().len(), 4);
    }
}
