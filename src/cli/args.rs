//! Command-line argument parsing for jvmbudget
//!
//! Provides clap-based CLI with subcommands and verbosity control.

use clap::{Args as ClapArgs, Parser, Subcommand};
use std::path::PathBuf;
use crate::budget::{BudgetOverrides, LEGACY_FIXED_OVERHEAD_MB};
use crate::cli::Config;
use crate::errors;

/// jvmbudget - Size JVM memory regions for a memory-capped pipeline task
#[derive(Parser, Debug)]
#[command(name = "jvmbudget")]
#[command(author = "Jerome (Kubashen) Naidoo")]
#[command(version)]
#[command(about = "Derive JVM heap, metaspace and overhead flags from a task's memory grant", long_about = None)]
pub struct Args {
    /// Configuration file path
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Verbosity level: -q (quiet), default (normal), -v (verbose), -vv (very verbose)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Quiet mode (errors only on stderr)
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Subcommand
    #[command(subcommand)]
    pub command: Commands,
}

/// Available subcommands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Print JVM flags for one task attempt
    Budget(BudgetArgs),

    /// Print the heap size left after a fixed overhead
    Heap(HeapArgs),

    /// Rewrite an exit code to the OOM code if the log shows an OutOfMemoryError
    ClassifyExit(ClassifyExitArgs),

    /// Delete task inputs and their link targets after a successful step
    Reclaim(ReclaimArgs),

    /// Display current configuration
    Config {
        /// Print the configuration file location instead
        #[arg(long)]
        path: bool,
    },
}

#[derive(ClapArgs, Debug)]
pub struct BudgetArgs {
    /// Memory granted to the task, in MB
    #[arg(short, long, allow_negative_numbers = true)]
    pub memory: i64,

    /// 1-based attempt number of the task
    #[arg(short, long, default_value_t = 1, allow_negative_numbers = true)]
    pub attempt: i64,

    /// Base misc overhead per attempt, in MB
    #[arg(long, allow_negative_numbers = true)]
    pub overhead_size: Option<i64>,

    /// Base metaspace per attempt, in MB
    #[arg(long, allow_negative_numbers = true)]
    pub metaspace_size: Option<i64>,

    /// Named override, e.g. `--set overhead_size=96` (repeatable)
    #[arg(long = "set", value_name = "NAME=VALUE", value_parser = parse_key_value)]
    pub settings: Vec<(String, String)>,

    /// Print the full budget report as JSON
    #[arg(long)]
    pub json: bool,
}

#[derive(ClapArgs, Debug)]
pub struct HeapArgs {
    /// Memory granted to the task, in MB
    #[arg(short, long, allow_negative_numbers = true)]
    pub memory: i64,

    /// Fixed overhead to subtract, in MB
    #[arg(long, conflicts_with = "legacy", allow_negative_numbers = true)]
    pub fixed_overhead: Option<i64>,

    /// Use the historical 64MB fixed overhead
    #[arg(long)]
    pub legacy: bool,
}

#[derive(ClapArgs, Debug)]
pub struct ClassifyExitArgs {
    /// Exit code of the finished process
    #[arg(short, long, allow_negative_numbers = true)]
    pub exit_code: i32,

    /// Log file to scan
    #[arg(short, long)]
    pub log: PathBuf,

    /// Exit code to report on out-of-memory (0-255)
    #[arg(long, value_parser = clap::value_parser!(i32).range(0..=255))]
    pub oom_exit_code: Option<i32>,
}

#[derive(ClapArgs, Debug)]
pub struct ReclaimArgs {
    /// Exit code of the preceding step
    #[arg(short, long, allow_negative_numbers = true)]
    pub exit_code: i32,

    /// Enable deletion (overrides `[reclaim] enabled`)
    #[arg(long)]
    pub enabled: bool,

    /// Inputs to delete, typically symlinks
    #[arg(value_name = "PATH")]
    pub paths: Vec<PathBuf>,
}

/// Verbosity level enum
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verbosity {
    Quiet,
    Normal,
    Verbose,
    VeryVerbose,
}

impl Args {
    /// Get verbosity level based on flags
    pub fn verbosity(&self) -> Verbosity {
        if self.quiet {
            Verbosity::Quiet
        } else {
            match self.verbose {
                0 => Verbosity::Normal,
                1 => Verbosity::Verbose,
                _ => Verbosity::VeryVerbose,
            }
        }
    }
}

impl BudgetArgs {
    /// Effective overrides: `--set` over explicit size flags over the config file
    pub fn overrides(&self, config: &Config) -> errors::Result<BudgetOverrides> {
        let flags = BudgetOverrides {
            overhead_size: self.overhead_size,
            metaspace_size: self.metaspace_size,
        };
        let named = BudgetOverrides::from_lookup(self.settings.iter().map(|(k, v)| (k, v)))?;
        Ok(config.budget_overrides().merge(flags).merge(named))
    }
}

impl HeapArgs {
    /// Fixed overhead: `--legacy`, then `--fixed-overhead`, then `[budget] fixed_overhead`
    pub fn fixed_overhead(&self, config: &Config) -> i64 {
        if self.legacy {
            LEGACY_FIXED_OVERHEAD_MB
        } else {
            self.fixed_overhead.unwrap_or(config.budget.fixed_overhead)
        }
    }
}

fn parse_key_value(raw: &str) -> Result<(String, String), String> {
    let (key, value) = raw
        .split_once('=')
        .ok_or_else(|| format!("expected NAME=VALUE, got '{}'", raw))?;
    if key.trim().is_empty() {
        return Err(format!("missing setting name in '{}'", raw));
    }
    Ok((key.trim().to_string(), value.trim().to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_verbosity_quiet() {
        let args = Args::parse_from(["jvmbudget", "-q", "heap", "--memory", "200"]);
        assert_eq!(args.verbosity(), Verbosity::Quiet);
    }

    #[test]
    fn test_verbosity_levels() {
        let args = Args::parse_from(["jvmbudget", "heap", "--memory", "200"]);
        assert_eq!(args.verbosity(), Verbosity::Normal);
        let args = Args::parse_from(["jvmbudget", "-v", "heap", "--memory", "200"]);
        assert_eq!(args.verbosity(), Verbosity::Verbose);
        let args = Args::parse_from(["jvmbudget", "-vv", "heap", "--memory", "200"]);
        assert_eq!(args.verbosity(), Verbosity::VeryVerbose);
    }

    #[test]
    fn test_budget_args() {
        let args = Args::parse_from([
            "jvmbudget", "budget", "--memory", "512", "--attempt", "2",
            "--set", "overhead_size=0", "--json",
        ]);
        match args.command {
            Commands::Budget(budget) => {
                assert_eq!(budget.memory, 512);
                assert_eq!(budget.attempt, 2);
                assert_eq!(budget.settings, vec![("overhead_size".to_string(), "0".to_string())]);
                assert!(budget.json);
            }
            other => panic!("Expected budget command, got {:?}", other),
        }
    }

    #[test]
    fn test_attempt_defaults_to_one() {
        let args = Args::parse_from(["jvmbudget", "budget", "--memory", "512"]);
        match args.command {
            Commands::Budget(budget) => assert_eq!(budget.attempt, 1),
            other => panic!("Expected budget command, got {:?}", other),
        }
    }

    #[test]
    fn test_negative_attempt_reaches_calculator() {
        let args = Args::try_parse_from(["jvmbudget", "budget", "--memory", "512", "--attempt", "-1"]);
        assert!(args.is_ok());
    }

    #[test]
    fn test_legacy_conflicts_with_fixed_overhead() {
        let args = Args::try_parse_from([
            "jvmbudget", "heap", "--memory", "200", "--legacy", "--fixed-overhead", "10",
        ]);
        assert!(args.is_err());
    }

    fn budget_args(argv: &[&str]) -> BudgetArgs {
        let mut full = vec!["jvmbudget", "budget", "--memory", "1024"];
        full.extend_from_slice(argv);
        match Args::parse_from(full).command {
            Commands::Budget(budget) => budget,
            other => panic!("Expected budget command, got {:?}", other),
        }
    }

    fn heap_args(argv: &[&str]) -> HeapArgs {
        let mut full = vec!["jvmbudget", "heap", "--memory", "200"];
        full.extend_from_slice(argv);
        match Args::parse_from(full).command {
            Commands::Heap(heap) => heap,
            other => panic!("Expected heap command, got {:?}", other),
        }
    }

    fn file_config() -> Config {
        let mut config = Config::default();
        config.budget.overhead_size = 10;
        config.budget.metaspace_size = 20;
        config.budget.fixed_overhead = 100;
        config
    }

    #[test]
    fn test_overrides_from_config_file() {
        let overrides = budget_args(&[]).overrides(&file_config()).unwrap();
        assert_eq!(overrides.overhead_size(), 10);
        assert_eq!(overrides.metaspace_size(), 20);
    }

    #[test]
    fn test_overrides_defaults_without_file() {
        let overrides = budget_args(&[]).overrides(&Config::default()).unwrap();
        assert_eq!(overrides.overhead_size(), 64);
        assert_eq!(overrides.metaspace_size(), 128);
    }

    #[test]
    fn test_size_flags_beat_config_file() {
        let overrides = budget_args(&["--overhead-size", "48"])
            .overrides(&file_config())
            .unwrap();
        assert_eq!(overrides.overhead_size(), 48);
        assert_eq!(overrides.metaspace_size(), 20);
    }

    #[test]
    fn test_set_beats_size_flags() {
        let overrides = budget_args(&[
            "--overhead-size", "48", "--metaspace-size", "96",
            "--set", "overhead_size=0",
        ])
        .overrides(&file_config())
        .unwrap();
        assert_eq!(overrides.overhead_size(), 0);
        assert_eq!(overrides.metaspace_size(), 96);
    }

    #[test]
    fn test_set_rejects_unknown_name() {
        let args = budget_args(&["--set", "heap_size=12"]);
        assert!(args.overrides(&Config::default()).is_err());
    }

    #[test]
    fn test_fixed_overhead_precedence() {
        let config = file_config();
        assert_eq!(heap_args(&[]).fixed_overhead(&config), 100);
        assert_eq!(heap_args(&[]).fixed_overhead(&Config::default()), 128);
        assert_eq!(heap_args(&["--fixed-overhead", "32"]).fixed_overhead(&config), 32);
        assert_eq!(heap_args(&["--legacy"]).fixed_overhead(&config), LEGACY_FIXED_OVERHEAD_MB);
    }

    #[test]
    fn test_oom_exit_code_range() {
        let base = ["jvmbudget", "classify-exit", "--exit-code", "1", "--log", "stderr"];
        let ok = Args::try_parse_from(base.iter().copied().chain(["--oom-exit-code", "255"]));
        assert!(ok.is_ok());
        let too_big = Args::try_parse_from(base.iter().copied().chain(["--oom-exit-code", "300"]));
        assert!(too_big.is_err());
    }

    #[test]
    fn test_parse_key_value() {
        assert_eq!(
            parse_key_value("metaspace_size = 256").unwrap(),
            ("metaspace_size".to_string(), "256".to_string())
        );
        assert!(parse_key_value("metaspace_size").is_err());
        assert!(parse_key_value("=1").is_err());
    }

    #[test]
    fn test_reclaim_args() {
        let args = Args::parse_from(["jvmbudget", "reclaim", "--exit-code", "0", "--enabled", "a.bam", "b.bam"]);
        match args.command {
            Commands::Reclaim(reclaim) => {
                assert!(reclaim.enabled);
                assert_eq!(reclaim.paths.len(), 2);
            }
            other => panic!("Expected reclaim command, got {:?}", other),
        }
    }
}
