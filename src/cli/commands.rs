// ABOUTME: Command implementations for the stagehand CLI
// ABOUTME: Handles plan rendering, confirmation, execution wiring, and report output

use anyhow::Result;
use std::io::{BufRead, Read};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};

use super::config::Config;
use crate::engine::{ProcessRunner, WorkflowEngine, WorkflowEvent};
use crate::parser::{
    render_confirmation, render_simulation, simulate, WorkflowParser, WorkflowPlan,
};

/// Parse a description, confirm, and execute the resulting workflow.
pub async fn run_workflow(
    description: Option<String>,
    file: Option<PathBuf>,
    dry_run: bool,
    runner_override: Option<String>,
    output: Option<PathBuf>,
    yes: bool,
    config: &Config,
) -> Result<()> {
    let description = read_description(description, file)?;
    let runner_command = runner_override.unwrap_or_else(|| config.runner_command.clone());

    let plan = parse_description(&description, config);
    println!("{}", render_confirmation(&plan));

    if !plan.is_executable() {
        return Err(anyhow::anyhow!(
            "Plan is not executable: {}",
            plan.validation_errors.join("; ")
        ));
    }

    if dry_run {
        let simulated = simulate(&plan, &config.estimates, &runner_command);
        println!("{}", render_simulation(&simulated));
        return Ok(());
    }

    if !yes && !confirm_with_operator()? {
        println!("Aborted.");
        return Ok(());
    }

    let runner = ProcessRunner::from_command(
        &runner_command,
        Duration::from_secs(config.grace_seconds),
    )?;
    let engine = WorkflowEngine::new(Arc::new(runner));

    // Attach observers before execution starts so the stream is complete.
    let mut events = engine.subscribe();
    let printer = tokio::spawn(async move {
        while let Ok(event) = events.recv().await {
            match event {
                WorkflowEvent::Progress(progress) => {
                    println!("  [{}] {}", progress.item_id, progress.text_chunk);
                }
                WorkflowEvent::Conflict(alert) => {
                    warn!(
                        "Conflict alert: {} may impact {:?} ({})",
                        alert.source_item_id, alert.affected_item_ids, alert.reason
                    );
                }
            }
        }
    });

    // Ctrl-C requests cooperative cancellation.
    let cancel = engine.cancel_token();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("Cancellation requested; stopping workflow");
            cancel.cancel();
        }
    });

    let report = engine.execute(&plan).await?;
    printer.abort();

    println!("{}", report.render_summary());

    if let Some(output_path) = output {
        let json = serde_json::to_string_pretty(&report)?;
        std::fs::write(&output_path, json)?;
        info!("Report written to: {}", output_path.display());
    }

    if report.success {
        Ok(())
    } else {
        Err(anyhow::anyhow!(
            "Workflow finished with status: {}",
            report.status
        ))
    }
}

/// Parse a description and print the confirmation without executing.
pub async fn plan_workflow(
    description: Option<String>,
    file: Option<PathBuf>,
    config: &Config,
) -> Result<()> {
    let description = read_description(description, file)?;
    let plan = parse_description(&description, config);

    println!("{}", render_confirmation(&plan));

    if plan.is_executable() {
        println!("✓ Plan is executable");
        Ok(())
    } else {
        Err(anyhow::anyhow!(
            "Plan is not executable: {}",
            plan.validation_errors.join("; ")
        ))
    }
}

fn parse_description(description: &str, config: &Config) -> WorkflowPlan {
    WorkflowParser::new()
        .with_estimate_config(config.estimates.clone())
        .parse(description)
}

/// Resolve the description from the positional argument, a file, or stdin.
fn read_description(description: Option<String>, file: Option<PathBuf>) -> Result<String> {
    if let Some(description) = description {
        return Ok(description);
    }
    if let Some(path) = file {
        return Ok(std::fs::read_to_string(&path)?);
    }

    let mut buffer = String::new();
    std::io::stdin().read_to_string(&mut buffer)?;
    if buffer.trim().is_empty() {
        return Err(anyhow::anyhow!(
            "No description given (argument, --file, or stdin)"
        ));
    }
    Ok(buffer)
}

fn confirm_with_operator() -> Result<bool> {
    println!("Proceed with execution? [y/N]");
    let mut answer = String::new();
    std::io::stdin().lock().read_line(&mut answer)?;
    Ok(matches!(answer.trim(), "y" | "Y" | "yes"))
}
