//! plan-kb CLI: load a domain, ingest a problem, inspect the knowledge base.

use std::path::{Path, PathBuf};

use clap::{Args, Parser, Subcommand};
use miette::{IntoDiagnostic, Result};

use plan_kb::codec::ImportReport;
use plan_kb::config::PlanKbConfig;
use plan_kb::domain::{DomainContract, StaticDomain};
use plan_kb::kb::KnowledgeBase;

#[derive(Parser)]
#[command(name = "plan-kb", version, about = "Planning knowledge base for PDDL problems")]
struct Cli {
    /// Path to a TOML config file (problem name, case folding, indent).
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Args)]
struct ProblemArgs {
    /// Domain description (TOML).
    #[arg(long)]
    domain: PathBuf,

    /// Problem file (PDDL).
    #[arg(long)]
    problem: PathBuf,
}

#[derive(Subcommand)]
enum Commands {
    /// Ingest a problem and report what was imported or skipped.
    Check {
        #[command(flatten)]
        input: ProblemArgs,
    },

    /// Ingest a problem and print it back in canonical form.
    Normalize {
        #[command(flatten)]
        input: ProblemArgs,

        /// Write to this file instead of stdout.
        #[arg(long)]
        output: Option<PathBuf>,
    },

    /// Check whether the problem's initial state satisfies its goal.
    Goal {
        #[command(flatten)]
        input: ProblemArgs,
    },

    /// Export the ingested knowledge base as JSON.
    Export {
        #[command(flatten)]
        input: ProblemArgs,

        /// Pretty-print the JSON.
        #[arg(long)]
        pretty: bool,
    },

    /// Print the PDDL skeleton of a domain description.
    Domain {
        /// Domain description (TOML).
        #[arg(long)]
        domain: PathBuf,
    },
}

fn load_kb(input: &ProblemArgs) -> Result<(KnowledgeBase, ImportReport)> {
    Ok(KnowledgeBase::from_files(&input.domain, &input.problem)?)
}

fn load_config(path: Option<&Path>) -> Result<PlanKbConfig> {
    match path {
        Some(path) => Ok(PlanKbConfig::load(path)?),
        None => Ok(PlanKbConfig::default()),
    }
}

fn main() -> Result<()> {
    miette::set_hook(Box::new(|_| {
        Box::new(
            miette::MietteHandlerOpts::new()
                .terminal_links(true)
                .unicode(true)
                .context_lines(3)
                .build(),
        )
    }))
    .ok(); // Ignore error if hook already set (e.g., in tests)

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let config = load_config(cli.config.as_deref())?;

    match cli.command {
        Commands::Check { input } => {
            let (_kb, report) = load_kb(&input)?;
            print!("{report}");
        }

        Commands::Normalize { input, output } => {
            let (kb, _report) = load_kb(&input)?;
            let text = kb.get_problem_with(&config.emit_options());
            match output {
                Some(path) => {
                    std::fs::write(&path, text).into_diagnostic()?;
                    println!("Wrote {}", path.display());
                }
                None => print!("{text}"),
            }
        }

        Commands::Goal { input } => {
            let (kb, _report) = load_kb(&input)?;
            if kb.goal().is_empty() {
                println!("no goal");
            } else if kb.is_goal_satisfied(kb.goal()) {
                println!("satisfied: {}", kb.goal());
            } else {
                println!("not satisfied: {}", kb.goal());
                std::process::exit(1);
            }
        }

        Commands::Export { input, pretty } => {
            let (kb, _report) = load_kb(&input)?;
            let snapshot = kb.export();
            let json = if pretty {
                serde_json::to_string_pretty(&snapshot).into_diagnostic()?
            } else {
                serde_json::to_string(&snapshot).into_diagnostic()?
            };
            println!("{json}");
        }

        Commands::Domain { domain } => {
            let domain = StaticDomain::load(&domain)?;
            print!("{}", domain.domain());
        }
    }

    Ok(())
}
