//! jvmbudget - Main CLI Entry Point

use anyhow::{Context, Result};
use clap::Parser;
use colored::Colorize;
use jvmbudget::budget;
use jvmbudget::cli::{Args, BudgetArgs, ClassifyExitArgs, Commands, Config, HeapArgs, ReclaimArgs};
use jvmbudget::{reclaim, telemetry, BudgetError};

/// Compute and print the flags for one task attempt
fn run_budget(config: &Config, args: &BudgetArgs) -> Result<()> {
    let overrides = args.overrides(config)?;

    let report = budget::calculate_budget(args.memory, args.attempt, &overrides)?;
    report.log_advisories();
    tracing::info!(
        target: "jvmbudget",
        allocated_mb = report.budget.allocated_mb(),
        attempt = args.attempt,
        heap_mb = report.budget.heap_mb(),
        metaspace_mb = report.budget.metaspace_mb(),
        overhead_mb = report.budget.overhead_mb(),
        "computed memory budget"
    );

    if args.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        println!("{}", report.budget.jvm_flags());
    }
    Ok(())
}

fn run_heap(config: &Config, args: &HeapArgs) -> Result<()> {
    let heap_mb = budget::heap_size_with_overhead(args.memory, args.fixed_overhead(config))?;
    println!("{}", heap_mb);
    Ok(())
}

fn run_classify_exit(config: &Config, args: &ClassifyExitArgs) -> Result<()> {
    let mut classifier = config.oom_classifier();
    if let Some(code) = args.oom_exit_code {
        classifier = classifier.with_exit_code(code);
    }

    let result = classifier
        .classify_log(args.exit_code, &args.log)
        .with_context(|| format!("Failed to scan log {}", args.log.display()))?;
    println!("{}", result.exit_code);
    Ok(())
}

fn run_reclaim(config: &Config, args: &ReclaimArgs) -> Result<()> {
    let enabled = args.enabled || config.reclaim.enabled;
    let summary = reclaim::reclaim_inputs(enabled, args.exit_code, &args.paths)
        .context("Failed to reclaim task inputs")?;

    for missing in &summary.missing {
        tracing::warn!(target: "jvmbudget", path = %missing.display(), "input already gone");
    }
    Ok(())
}

fn show_config(config: &Config, args: &Args, path_only: bool) -> Result<()> {
    if path_only {
        let path = args.config.clone().or_else(Config::default_path);
        match path {
            Some(path) => println!("{}", path.display()),
            None => anyhow::bail!("Could not determine home directory"),
        }
        return Ok(());
    }

    print!("{}", config.to_toml()?);
    Ok(())
}

fn run(args: &Args) -> Result<()> {
    let config = Config::load(args.config.as_deref())?;
    telemetry::init(&config.logging.level, args.verbosity());

    match &args.command {
        Commands::Budget(budget_args) => run_budget(&config, budget_args),
        Commands::Heap(heap_args) => run_heap(&config, heap_args),
        Commands::ClassifyExit(classify_args) => run_classify_exit(&config, classify_args),
        Commands::Reclaim(reclaim_args) => run_reclaim(&config, reclaim_args),
        Commands::Config { path } => show_config(&config, args, *path),
    }
}

fn main() {
    let args = Args::parse();

    if let Err(e) = run(&args) {
        // Nothing has been written to stdout, so the task script never sees partial flags.
        eprintln!("{}: {:#}", "Error".red().bold(), e);
        if let Some(required_mb) = e.downcast_ref::<BudgetError>().and_then(BudgetError::required_mb) {
            eprintln!("  Request at least {}MB for this task.", required_mb);
        }
        std::process::exit(1);
    }
}
