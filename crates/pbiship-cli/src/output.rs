//! Terminal rendering for command reports.

use anyhow::Result;
use console::style;
use serde::Serialize;

use pbiship_core::commands::DiscoverReport;
use pbiship_core::config::{SETTINGS, Settings};
use pbiship_core::deploy::{ArtifactStatus, DeployReport};
use pbiship_core::error::DeployError;

pub fn print_deploy_table(report: &DeployReport) {
    println!(
        "Profile: {}  Environment: {}{}",
        report.profile,
        report.environment,
        if report.what_if { "  (what-if)" } else { "" }
    );

    if report.skipped {
        println!(
            "{} environment '{}' is disabled, nothing deployed",
            style("•").yellow(),
            report.environment
        );
        return;
    }

    for warning in &report.warnings {
        println!("  {} {}", style("⚠").yellow(), warning);
    }

    if report.outcomes.is_empty() {
        println!("No artifacts matched.");
        return;
    }

    println!();
    for outcome in &report.outcomes {
        match &outcome.status {
            ArtifactStatus::Deployed { import_id, reports } => println!(
                "  {} {:<30} -> {:<20} import {} ({} report(s))",
                style("✓").green(),
                truncate(&outcome.display_name, 30),
                truncate(&outcome.workspace, 20),
                import_id,
                reports.len()
            ),
            ArtifactStatus::Previewed => println!(
                "  {} {:<30} -> {:<20} {}",
                style("•").cyan(),
                truncate(&outcome.display_name, 30),
                truncate(&outcome.workspace, 20),
                outcome.source_path.display()
            ),
            ArtifactStatus::Failed { error } => println!(
                "  {} {:<30} -> {:<20} {}",
                style("✗").red(),
                truncate(&outcome.display_name, 30),
                truncate(&outcome.workspace, 20),
                error
            ),
        }
    }

    println!();
    if report.what_if {
        println!("Summary: {} artifact(s) would be deployed", report.outcomes.len());
    } else {
        println!(
            "Summary: {} deployed, {} failed, {} workspace lookup(s)",
            report.deployed(),
            report.failed().len(),
            report.workspace_lookups
        );
    }
}

pub fn print_discover_table(report: &DiscoverReport) {
    println!(
        "Profile: {}  Environment: {}  Base: {}",
        report.profile,
        report.environment,
        report.base_dir.display()
    );
    if report.disabled {
        println!(
            "{} environment is disabled; deploy would skip it",
            style("•").yellow()
        );
    }
    for warning in &report.warnings {
        println!("  {} {}", style("⚠").yellow(), warning);
    }
    println!();

    if report.artifacts.is_empty() {
        println!("No artifacts matched.");
        return;
    }

    println!("  {:<30} {:<20} {:<7} Source", "Name", "Workspace", "Kind");
    println!("  {}", "-".repeat(80));
    for artifact in &report.artifacts {
        println!(
            "  {:<30} {:<20} {:<7} {}",
            truncate(&artifact.display_name, 30),
            truncate(&artifact.workspace, 20),
            artifact.kind.to_string(),
            artifact.source_path.display()
        );
    }
}

pub fn print_info_table(settings: &Settings) {
    println!("pbiship {}", env!("CARGO_PKG_VERSION"));
    println!();
    println!("Environment variables:");
    for descriptor in SETTINGS {
        let value = Settings::raw_value(descriptor.name).unwrap_or_else(|| "-".to_string());
        println!(
            "  {:<26} {:<30} {}",
            descriptor.name,
            truncate(&value, 30),
            style(descriptor.description).dim()
        );
    }
    println!();
    println!("Effective:");
    println!("  API URL:        {}", settings.api_url);
    println!("  Authority URL:  {}", settings.authority_url);
    println!("  Compiler:       {}", settings.compiler);
    if let Some(dir) = &settings.temp_dir {
        println!("  Scratch root:   {}", dir.display());
    }
    if let Some(timeout) = settings.poll_timeout {
        println!("  Poll timeout:   {}s", timeout.as_secs());
    }
}

pub fn print_info_json(settings: &Settings) -> Result<()> {
    let variables: Vec<_> = SETTINGS
        .iter()
        .map(|d| {
            serde_json::json!({
                "name": d.name,
                "description": d.description,
                "value": Settings::raw_value(d.name),
            })
        })
        .collect();
    let output = serde_json::json!({
        "schema_version": 1,
        "version": env!("CARGO_PKG_VERSION"),
        "variables": variables,
        "effective": {
            "api_url": settings.api_url,
            "authority_url": settings.authority_url,
            "compiler": settings.compiler,
            "temp_dir": settings.temp_dir,
            "poll_timeout_secs": settings.poll_timeout.map(|t| t.as_secs()),
        },
    });
    println!("{}", serde_json::to_string_pretty(&output)?);
    Ok(())
}

pub fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

/// Print an error chain, plus the service diagnostic payload when present.
pub fn print_error(err: &anyhow::Error) {
    eprintln!("{} {:#}", style("error:").red().bold(), err);
    if let Some(detail) = err
        .downcast_ref::<DeployError>()
        .and_then(DeployError::remote_detail)
    {
        let rendered =
            serde_json::to_string_pretty(detail).unwrap_or_else(|_| detail.to_string());
        eprintln!("{}", style("service response:").dim());
        eprintln!("{}", rendered);
    }
}

fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        s.to_string()
    } else {
        let kept: String = s.chars().take(max.saturating_sub(3)).collect();
        format!("{}...", kept)
    }
}
