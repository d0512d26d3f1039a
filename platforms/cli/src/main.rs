use anyhow::{bail, Context, Result};
use clap::Parser;
use serde::Serialize;
use std::path::PathBuf;
use tracing::warn;
use tracing_subscriber::EnvFilter;
use tumasim::{
    analyze, check_input, evaluate, run_with, tape_symbols, Catalog, ExecutionResult, Machine,
    MachineLoader, RunConfig, Snapshot, Verdict,
};

#[derive(Parser)]
#[clap(author, version, about, long_about = None, arg_required_else_help = true)]
struct Cli {
    /// The machine description file to execute
    #[clap(short, long, conflicts_with = "builtin")]
    program: Option<PathBuf>,

    /// The built-in machine to execute (see --list)
    #[clap(short, long)]
    builtin: Option<String>,

    /// Input words, one run each. `_` stands for a blank cell
    input: Vec<String>,

    /// Give up after this many steps instead of running until the machine halts
    #[clap(short, long)]
    step_limit: Option<usize>,

    /// Print every configuration of the run (also enabled by `DEBUG 1`)
    #[clap(short = 'd', long)]
    trace: bool,

    /// Print a JSON report per input
    #[clap(long)]
    json: bool,

    /// Print static analysis findings before running
    #[clap(short, long)]
    analyze: bool,

    /// List the built-in machines and exit
    #[clap(short, long)]
    list: bool,
}

#[derive(Serialize)]
struct Report<'a> {
    input: &'a str,
    verdict: Verdict,
    #[serde(flatten)]
    result: ExecutionResult,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    if cli.list {
        return list_builtins();
    }

    let machine = load_machine(&cli)?;

    if cli.analyze {
        for finding in analyze(&machine) {
            println!("warning: {finding}");
        }
    }

    let words = if cli.input.is_empty() {
        vec![String::new()]
    } else {
        cli.input.clone()
    };

    for word in &words {
        run_word(&cli, &machine, word)?;
    }

    Ok(())
}

fn load_machine(cli: &Cli) -> Result<Machine> {
    match (&cli.program, &cli.builtin) {
        (Some(path), _) => MachineLoader::load_machine(path)
            .with_context(|| format!("failed to load {}", path.display())),
        (None, Some(name)) => Ok(Catalog::get(name)?.clone()),
        (None, None) => bail!("either --program or --builtin is required"),
    }
}

fn list_builtins() -> Result<()> {
    for name in Catalog::names() {
        let info = Catalog::info(name)?;
        println!(
            "{:<18} {} states, {} rules, init {}, accept {}",
            info.name,
            info.state_count,
            info.rule_count,
            info.initial_state,
            info.accepting_states.join(", ")
        );
    }

    Ok(())
}

fn run_word(cli: &Cli, machine: &Machine, word: &str) -> Result<()> {
    let symbols = tape_symbols(word);
    let show = (cli.trace || machine.debug()) && !cli.json;

    if let Some(finding) = check_input(machine, &symbols) {
        warn!(input = word, "{finding}");
    }

    if show {
        let codes: Vec<String> = word.chars().map(|c| (c as u32).to_string()).collect();
        println!("Input codes: {}\n", codes.join(" "));
    }

    let config = RunConfig {
        step_limit: cli.step_limit,
        record_trace: cli.json && cli.trace,
    };
    let mut printer = |snapshot: &Snapshot<'_>| {
        if show {
            println!("{snapshot}\n");
        }
    };

    let result = run_with(machine, &symbols, &config, &mut printer)
        .with_context(|| format!("run on input {word:?} did not halt"))?;
    let verdict = evaluate(machine, &result);

    if cli.json {
        let report = Report {
            input: word,
            verdict,
            result,
        };
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        println!("Final state: {}", result.final_state);
        println!("{verdict}");
    }

    Ok(())
}
