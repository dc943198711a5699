mod cli;
mod core;
mod execution;
mod persistence;
mod proxy;

use anyhow::{Context, Result};
use cli::commands::{
    HistoryCommand, ListCommand, RenderCommand, ResolveCommand, RunCommand, ValidateCommand,
};
use cli::output::*;
use cli::{Cli, Command, RoutesCommand};
use crate::core::config::DeployConfig;
use execution::{PipelineRunner, RunEvent, ShellRunner};
use persistence::{create_summary, InMemoryPersistence, PersistenceBackend, SqliteRunStore};
use proxy::RouteTable;
use std::sync::Arc;
use tracing::{error, Level};
use tracing_subscriber::FmtSubscriber;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::from_args();

    // Initialize logging
    let log_level = if cli.verbose { Level::DEBUG } else { Level::INFO };
    let subscriber = FmtSubscriber::builder()
        .with_max_level(log_level)
        .finish();
    tracing::subscriber::set_global_default(subscriber)
        .context("Failed to set logging subscriber")?;

    // Execute command
    match &cli.command {
        Command::Run(cmd) => run_pipeline(cmd).await?,
        Command::Validate(cmd) => validate_descriptor(cmd)?,
        Command::Routes(RoutesCommand::Resolve(cmd)) => resolve_route(cmd)?,
        Command::Routes(RoutesCommand::Render(cmd)) => render_proxy(cmd)?,
        Command::List(cmd) => list_pipelines(cmd).await?,
        Command::History(cmd) => show_history(cmd).await?,
    }

    Ok(())
}

async fn run_pipeline(cmd: &RunCommand) -> Result<()> {
    let config = DeployConfig::from_file(&cmd.file).context("Failed to load descriptor")?;
    let pipeline_config = config
        .pipeline
        .context("Descriptor has no pipeline section")?;

    println!(
        "{} Loaded pipeline: {}",
        INFO,
        style(&pipeline_config.name).bold()
    );

    let mut pipeline = pipeline_config.to_pipeline();

    // Apply run-level environment overrides
    for (key, value) in &cmd.env {
        pipeline.env.insert(key.clone(), value.clone());
        println!(
            "{} Env override: {} = {}",
            INFO,
            style(key).cyan(),
            style(value).dim()
        );
    }

    // Set up persistence
    let store: Arc<dyn PersistenceBackend> = if cmd.no_history {
        Arc::new(InMemoryPersistence::new())
    } else {
        Arc::new(SqliteRunStore::with_default_path().await?)
    };

    let runner = PipelineRunner::new(ShellRunner::new());

    // Progress bar advances as steps reach a terminal state; event lines
    // are printed above it
    let progress = create_progress_bar(pipeline.steps.len());
    let bar = progress.clone();
    runner.add_event_handler(move |event| match &event {
        RunEvent::StepOutput { step_id, output } => {
            bar.println(format!("{} Output from {}:", INFO, style(step_id).dim()));
            bar.println(format_output(output, 5));
        }
        other => {
            bar.println(format_run_event(other));
            if matches!(
                other,
                RunEvent::StepCompleted { .. }
                    | RunEvent::StepFailed { .. }
                    | RunEvent::StepSkipped { .. }
            ) {
                bar.inc(1);
            }
        }
    });

    println!();
    let report = runner.execute(&mut pipeline).await;
    progress.finish_and_clear();

    println!();
    for step in &pipeline.steps {
        println!("  {} {}", format_step_state(&step.state), style(&step.id).bold());
    }

    // Save to history
    if !cmd.no_history {
        let summary = create_summary(&pipeline);
        store.save_run(&summary).await?;
        println!(
            "\n{} Run saved to history (ID: {})",
            INFO,
            style(&summary.run_id.to_string()[..8]).dim()
        );
    }

    // Print final status
    if report.exit_code == 0 {
        println!(
            "\n{} {} completed {}",
            CHECK,
            style(&pipeline.name).bold(),
            style("successfully").green()
        );
    } else {
        println!(
            "\n{} {} {}",
            CROSS,
            style(&pipeline.name).bold(),
            style("failed").red()
        );
        error!("Run failed with exit code {}", report.exit_code);
        std::process::exit(report.exit_code);
    }

    Ok(())
}

fn validate_descriptor(cmd: &ValidateCommand) -> Result<()> {
    println!("{} Validating descriptor...", INFO);

    let result = DeployConfig::from_file(&cmd.file);

    match result {
        Ok(config) => {
            println!("{} Descriptor is valid!", CHECK);
            if let Some(proxy) = &config.proxy {
                println!(
                    "  Proxy: {} routes, upstream {}",
                    style(proxy.routes.len()).cyan(),
                    style(&proxy.upstream.name).bold()
                );
            }
            if let Some(pipeline) = &config.pipeline {
                println!("  Pipeline: {}", style(&pipeline.name).bold());
                println!("  Steps: {}", style(pipeline.steps.len()).cyan());
                println!("  Services: {}", style(pipeline.services.len()).cyan());
            }

            if cmd.json {
                let json = serde_json::to_string_pretty(&config)?;
                println!("\n{}", json);
            }
            Ok(())
        }
        Err(e) => {
            println!("{} Validation failed:", CROSS);
            println!("  {}", style(e).red());
            std::process::exit(1);
        }
    }
}

fn resolve_route(cmd: &ResolveCommand) -> Result<()> {
    let config = DeployConfig::from_file(&cmd.file).context("Failed to load descriptor")?;
    let proxy = config.proxy.context("Descriptor has no proxy section")?;
    let table = RouteTable::from_config(&proxy)?;

    match table.route(&cmd.path, cmd.body_size) {
        Ok(route) => {
            println!("{}", format_route_match(&cmd.path, &route));
            Ok(())
        }
        Err(e) => {
            println!("{} {}", CROSS, style(&e).red());
            std::process::exit(1);
        }
    }
}

fn render_proxy(cmd: &RenderCommand) -> Result<()> {
    let config = DeployConfig::from_file(&cmd.file).context("Failed to load descriptor")?;
    let proxy = config.proxy.context("Descriptor has no proxy section")?;
    let rendered = proxy::nginx::render(&proxy);

    match &cmd.output {
        Some(path) => {
            std::fs::write(path, &rendered)
                .with_context(|| format!("Failed to write {}", path))?;
            println!("{} Wrote nginx config to {}", CHECK, style(path).bold());
        }
        None => print!("{}", rendered),
    }

    Ok(())
}

async fn list_pipelines(cmd: &ListCommand) -> Result<()> {
    let store = SqliteRunStore::with_default_path().await?;
    let pipelines = store.list_pipelines().await?;

    if pipelines.is_empty() {
        println!("{} No pipelines found in history", INFO);
        return Ok(());
    }

    println!("{} Pipelines in history:", INFO);

    for pipeline_name in &pipelines {
        let runs = store.list_runs(pipeline_name).await?;
        let completed = runs
            .iter()
            .filter(|r| r.status == persistence::RunStatus::Completed)
            .count();
        let failed = runs
            .iter()
            .filter(|r| r.status == persistence::RunStatus::Failed)
            .count();
        println!(
            "  {} ({} runs: {} succeeded, {} failed)",
            style(pipeline_name).bold(),
            style(runs.len()).cyan(),
            style(completed).green(),
            style(failed).red()
        );
    }

    if cmd.json {
        let mut json_data = Vec::new();
        for pipeline in &pipelines {
            let runs = store.list_runs(pipeline).await.ok();
            json_data.push(serde_json::json!({
                "name": pipeline,
                "run_count": runs.as_ref().map(|r| r.len()).unwrap_or(0)
            }));
        }
        let data = serde_json::json!({ "pipelines": json_data });
        println!("\n{}", serde_json::to_string_pretty(&data)?);
    }

    Ok(())
}

async fn show_history(cmd: &HistoryCommand) -> Result<()> {
    let store = SqliteRunStore::with_default_path().await?;

    let runs = if let Some(pipeline_name) = &cmd.pipeline {
        store.list_runs(pipeline_name).await?
    } else {
        let pipelines = store.list_pipelines().await?;
        let mut all_runs = Vec::new();
        for pipeline in &pipelines {
            all_runs.extend(store.list_runs(pipeline).await?);
        }
        all_runs.sort_by(|a, b| b.started_at.cmp(&a.started_at));
        all_runs
    };
    let runs: Vec<_> = runs.into_iter().take(cmd.limit).collect();

    if runs.is_empty() {
        println!("{} No runs found", INFO);
        return Ok(());
    }

    println!("{} Run history (showing latest {}):", INFO, cmd.limit);

    if cmd.json {
        let data = serde_json::json!({ "runs": runs });
        println!("{}", serde_json::to_string_pretty(&data)?);
    } else {
        for summary in &runs {
            println!("  {}", format_run_summary(summary));
        }
    }

    Ok(())
}
