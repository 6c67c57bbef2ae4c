use anyhow::Result;
use clap::{ArgAction, Parser};
use colored::Colorize;
use fastpy::runner::RunError;
use fastpy::transform::GuardOutcome;
use fastpy::{Method, OptimizeError, Outcome, menu, optimize_file, run_script};
use serde_json::json;
use std::io;
use std::path::PathBuf;
use std::process;
use tracing::Level;
use tracing_subscriber::FmtSubscriber;

#[derive(Parser)]
#[command(
    name = "fastpy",
    about = "Rewrite a Python file into a faster _FAST variant",
    version,
    long_about = "fastpy applies one of six optimization methods to a Python file and \
                  writes the result next to it as <name>_FAST.py.\n\n\
                  Run `fastpy` with no arguments for interactive mode, or \
                  `fastpy --list-methods` to see the methods."
)]
struct Cli {
    /// Python file to optimize.  Omit to be prompted for it.
    #[arg()]
    file: Option<PathBuf>,

    /// Method number (1-6) or name (e.g. numba, caching).
    /// Omit to choose from the menu.
    #[arg()]
    method: Option<String>,

    /// Execute the optimized file after writing it.
    #[arg(long)]
    run: bool,

    /// Interpreter used by --run.
    #[arg(long, default_value = "python3")]
    python: String,

    /// Emit a JSON report instead of the default text output.
    #[arg(long)]
    json: bool,

    /// Print the available methods and exit.
    #[arg(long)]
    list_methods: bool,

    /// Log what the transforms do (-v debug, -vv trace) to stderr.
    #[arg(short, long, action = ArgAction::Count)]
    verbose: u8,
}

fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    if let Err(err) = run(&cli) {
        let code = match err.downcast_ref::<OptimizeError>() {
            Some(e @ OptimizeError::Run(_)) => {
                eprintln!("{}: {e}", "warning".yellow().bold());
                e.exit_code()
            }
            Some(e) => {
                eprintln!("{}: {e}", "error".red().bold());
                e.exit_code()
            }
            None => {
                eprintln!("{}: {err:#}", "error".red().bold());
                2
            }
        };
        process::exit(code);
    }
}

fn init_tracing(verbose: u8) {
    let level = match verbose {
        0 => Level::WARN,
        1 => Level::DEBUG,
        _ => Level::TRACE,
    };
    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_writer(io::stderr)
        .finish();
    // Only fails if a subscriber is already installed.
    let _ = tracing::subscriber::set_global_default(subscriber);
}

fn run(cli: &Cli) -> Result<()> {
    if cli.list_methods {
        menu::print_methods();
        return Ok(());
    }

    let mut input = io::stdin().lock();
    let mut out = io::stdout();

    // ── inputs: command line first, prompts for whatever is missing ──────────
    let file = match &cli.file {
        Some(file) => file.clone(),
        None => menu::prompt_file(&mut input, &mut out)?,
    };
    let method = match &cli.method {
        Some(m) => m.parse::<Method>().map_err(OptimizeError::from)?,
        None => menu::prompt_method(&mut input, &mut out)?,
    };
    tracing::debug!(file = %file.display(), %method, "selected");

    // ── optimize ──────────────────────────────────────────────────────────────
    let outcome = optimize_file(&file, method)?;
    if !cli.json {
        println!("Optimized file saved as '{}'.", outcome.output.display());
        print_summary(&outcome);
    }

    // ── optional run ──────────────────────────────────────────────────────────
    let run_result = if cli.run {
        if !cli.json {
            println!("Executing the optimized file...");
        }
        Some(run_script(&cli.python, &outcome.output))
    } else {
        None
    };

    if cli.json {
        print_json(&outcome, run_result.as_ref())?;
    }
    match run_result {
        Some(Err(e)) => Err(OptimizeError::from(e).into()),
        _ => Ok(()),
    }
}

fn print_summary(outcome: &Outcome) {
    let r = &outcome.result;
    let mut parts = Vec::new();
    if r.functions_decorated > 0 {
        parts.push(format!("{} function(s) decorated", r.functions_decorated));
    }
    if r.import_added {
        parts.push("import added".to_string());
    }
    if let Some(GuardOutcome::Added { stub_main }) = r.guard {
        parts.push(if stub_main {
            "entry point and stub main() added".to_string()
        } else {
            "entry point added".to_string()
        });
    }
    if !parts.is_empty() {
        println!("{}", parts.join(", ").green());
    }
}

/// Emit the report as pretty JSON using serde_json.
fn print_json(outcome: &Outcome, run: Option<&Result<(), RunError>>) -> Result<()> {
    let mut report = serde_json::to_value(outcome)?;
    if let Some(result) = run {
        report["run"] = match result {
            Ok(()) => json!({ "success": true }),
            Err(e) => json!({ "success": false, "error": e.to_string() }),
        };
    }
    println!(
        "{}",
        serde_json::to_string_pretty(&report).expect("serde_json::Value is always serialisable")
    );
    Ok(())
}
