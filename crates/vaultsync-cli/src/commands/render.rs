//! Render command implementation
//!
//! Projects the vault export into target documents without touching the sink.

use std::collections::BTreeMap;

use colored::Colorize;
use serde::Serialize;

use vaultsync_core::{ConfigResolver, ItemSource, SyncPlan, TargetPlan};

use super::{ExitStatus, export_source};
use crate::error::Result;

const MASK: &str = "********";

#[derive(Debug, Serialize)]
struct RenderedTarget {
    namespace: String,
    name: String,
    item_ids: Vec<String>,
    data: BTreeMap<String, String>,
    annotations: BTreeMap<String, String>,
    labels: BTreeMap<String, String>,
}

impl From<&TargetPlan> for RenderedTarget {
    fn from(target: &TargetPlan) -> Self {
        Self {
            namespace: target.key.namespace.clone(),
            name: target.key.name.clone(),
            item_ids: target.item_ids.clone(),
            data: target
                .document
                .keys()
                .map(|k| (k.clone(), MASK.to_string()))
                .collect(),
            annotations: target.annotations.clone(),
            labels: target.labels.clone(),
        }
    }
}

#[derive(Debug, Serialize)]
struct Rendered {
    items: usize,
    untargeted_items: usize,
    targets: Vec<RenderedTarget>,
    failed_items: BTreeMap<String, String>,
    warnings: Vec<String>,
}

impl From<&SyncPlan> for Rendered {
    fn from(plan: &SyncPlan) -> Self {
        Self {
            items: plan.item_count,
            untargeted_items: plan.untargeted_items,
            targets: plan.targets.values().map(RenderedTarget::from).collect(),
            failed_items: plan.failed_items.iter().cloned().collect(),
            warnings: plan.warnings.clone(),
        }
    }
}

/// Run the render command
pub async fn run_render(resolver: &ConfigResolver, json: bool) -> Result<ExitStatus> {
    let config = resolver.resolve()?;
    let source = export_source(&config)?;
    let items = source.fetch_items().await?;
    let rendered = Rendered::from(&SyncPlan::build(&items));

    if json {
        println!("{}", serde_json::to_string_pretty(&rendered)?);
    } else {
        print_rendered(&rendered);
    }

    Ok(if rendered.failed_items.is_empty() {
        ExitStatus::Success
    } else {
        ExitStatus::Failures
    })
}

fn print_rendered(rendered: &Rendered) {
    for target in &rendered.targets {
        println!(
            "{}/{} {}",
            target.namespace,
            target.name.cyan().bold(),
            format!("(items: {})", target.item_ids.join(", ")).dimmed()
        );
        for (key, value) in &target.data {
            println!("   {} = {}", key, value.dimmed());
        }
        for (key, value) in &target.labels {
            println!("   {} {}={}", "label".dimmed(), key, value);
        }
        for (key, value) in &target.annotations {
            println!("   {} {}={}", "annotation".dimmed(), key, value);
        }
    }

    for (item, error) in &rendered.failed_items {
        println!("{} item {}: {}", "ERROR".red().bold(), item, error);
    }
    for warning in &rendered.warnings {
        println!("{} {}", "WARN".yellow().bold(), warning);
    }

    println!();
    println!(
        "{} items rendered into {} targets ({} untargeted)",
        rendered.items,
        rendered.targets.len(),
        rendered.untargeted_items
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use vaultsync_core::ExportSource;

    #[test]
    fn values_are_masked() {
        let items = ExportSource::parse(
            r#"[{"id": "1", "name": "db", "type": "login",
                 "login": {"username": "admin", "password": "hunter2"},
                 "fields": [{"name": "namespaces", "value": "default"}]}]"#,
        )
        .unwrap();

        let rendered = Rendered::from(&SyncPlan::build(&items));

        let output = serde_json::to_string(&rendered).unwrap();
        assert!(!output.contains("hunter2"));
        assert!(!output.contains("admin"));
        assert_eq!(rendered.targets.len(), 1);
        assert_eq!(rendered.targets[0].data.len(), 2);
        assert!(rendered.targets[0].data.values().all(|v| v == MASK));
    }
}
