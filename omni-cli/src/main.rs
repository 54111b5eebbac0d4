//! # Omni Coder CLI
//!
//! Usage:
//!   omni solve <PROMPT>... [--language L] [--code FILE] [--preview FILE] [--run] [--json]
//!   omni run <FILE> [--language L] [--batch] [--max-turns N]
//!   omni serve [--host H] [--port P]
//!   omni languages
//!
//! Examples:
//!   omni solve "reverse a linked list" -l python --run
//!   omni solve "a todo list with local storage" --preview todo.html
//!   omni run sum.c
//!   omni --provider gemini run script.py --batch

mod render;

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use omni_coder::{
    find_language, Coder, RunRequest, SessionState, Solution, SolveRequest, RUN_LANGUAGES,
    SOLVE_LANGUAGES,
};
use omni_llm::{AnyProvider, LlmProvider};
use omni_server::{load_dotenv, ListenArgs, LlmArgs, ServerConfig};
use render::{explain, format_solution, prompt_padding, resolve_language, truncate, write_preview};
use std::io::{BufRead, Write};
use std::path::PathBuf;
use tracing::{debug, info, warn, Level};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "omni")]
#[command(
    author,
    version,
    about = "Omni Coder - solve coding prompts and simulate program runs with an LLM"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    #[command(flatten)]
    llm: LlmArgs,

    /// Enable verbose output (debug logs)
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Quiet mode - only print results
    #[arg(short, long, global = true)]
    quiet: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Generate a solution for a prompt
    Solve(SolveArgs),
    /// Simulate running a source file
    Run(RunArgs),
    /// Start the HTTP API
    Serve(ListenArgs),
    /// List supported languages
    Languages,
}

#[derive(Args)]
struct SolveArgs {
    /// What to build or solve
    #[arg(required = true, num_args = 1..)]
    prompt: Vec<String>,

    /// Target language (default: let the model decide)
    #[arg(short, long)]
    language: Option<String>,

    /// Existing code to include as context
    #[arg(short, long, value_name = "FILE")]
    code: Option<PathBuf>,

    /// Write a standalone HTML preview of a web solution
    #[arg(long, value_name = "FILE")]
    preview: Option<PathBuf>,

    /// Simulate running the generated code
    #[arg(long)]
    run: bool,

    /// Print the raw solution JSON
    #[arg(long)]
    json: bool,
}

#[derive(Args)]
struct RunArgs {
    /// Source file to run
    #[arg(value_name = "FILE")]
    file: PathBuf,

    /// Language ID (default: from the file extension)
    #[arg(short, long)]
    language: Option<String>,

    /// One-shot run; the model invents any input the program reads
    #[arg(long)]
    batch: bool,

    /// Maximum model calls in an interactive run
    #[arg(long)]
    max_turns: Option<usize>,
}

fn init_logging(verbose: bool, quiet: bool) {
    let level = if verbose {
        Level::DEBUG
    } else if quiet {
        Level::ERROR
    } else {
        Level::INFO
    };

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive(level.into()))
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

async fn solve(coder: &Coder<AnyProvider>, args: SolveArgs, quiet: bool) -> Result<()> {
    let prompt = args.prompt.join(" ");
    let mut request = SolveRequest::new(prompt.as_str());

    if let Some(language) = &args.language {
        if find_language(SOLVE_LANGUAGES, language).is_none() {
            warn!(%language, "not a listed language; passing it to the model as is");
        }
        request = request.with_language(language.as_str());
    }
    if let Some(path) = &args.code {
        let code = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read {}", path.display()))?;
        request = request.with_code(code);
    }

    if !quiet {
        info!(prompt = %truncate(&prompt, 60), language = request.language(), "solving");
    }
    let solution = coder.solve(&request).await.map_err(explain)?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&solution)?);
    } else {
        println!("{}", format_solution(&solution, quiet));
    }

    if let Some(path) = &args.preview {
        if write_preview(path, &solution)? {
            info!(path = %path.display(), "preview written");
        } else {
            warn!("logic solutions have no HTML preview");
        }
    }

    if args.run {
        match &solution {
            Solution::Logic(logic) if !logic.code.trim().is_empty() => {
                let request = RunRequest::new(logic.code.as_str(), logic.language.as_str());
                let output = coder.run(&request).await.map_err(explain)?;
                if !quiet {
                    println!("\n--- OUTPUT ---");
                }
                println!("{}", output.output);
            }
            Solution::Logic(_) => warn!("the solution has no code to run"),
            Solution::Web(_) => warn!("web solutions run in a browser; use --preview instead"),
        }
    }

    Ok(())
}

async fn run_file(coder: &Coder<AnyProvider>, args: RunArgs, quiet: bool) -> Result<()> {
    let code = std::fs::read_to_string(&args.file)
        .with_context(|| format!("failed to read {}", args.file.display()))?;
    let language = resolve_language(&args.file, args.language.as_deref());

    if find_language(RUN_LANGUAGES, &language).is_none() {
        warn!(%language, "the simulator is tuned for python, javascript, c, cpp, java and go");
    }
    debug!(file = %args.file.display(), %language, batch = args.batch, "running");

    if args.batch {
        let output = coder
            .run(&RunRequest::new(code, language))
            .await
            .map_err(explain)?;
        println!("{}", output.output);
        return Ok(());
    }

    let mut session = coder.session(code, language);
    if let Some(max_turns) = args.max_turns {
        session = session.with_max_turns(max_turns);
    }

    session.start(coder).await.map_err(explain)?;

    let stdin = std::io::stdin();
    let mut stdout = std::io::stdout();
    loop {
        let fresh = session.new_output();
        print!("{}", fresh);

        if session.state() != SessionState::Waiting {
            println!();
            break;
        }

        print!("{}", prompt_padding(&fresh));
        stdout.flush()?;

        let mut line = String::new();
        if stdin.lock().read_line(&mut line)? == 0 {
            println!();
            anyhow::bail!("stdin closed while the program was waiting for input");
        }
        let line = line.trim_end_matches(['\r', '\n']).to_string();
        session.provide(coder, line).await.map_err(explain)?;
    }

    if !quiet {
        info!(turns = session.turns(), inputs = session.stdin().len(), "program finished");
    }
    Ok(())
}

fn print_languages() {
    println!("Solve targets:");
    for lang in SOLVE_LANGUAGES {
        println!("  {:12} {}", lang.id, lang.name);
    }
    println!("\nRun simulator:");
    for lang in RUN_LANGUAGES {
        println!("  {:12} {}", lang.id, lang.name);
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let (loaded, failures) = load_dotenv();
    let cli = Cli::parse();

    init_logging(cli.verbose, cli.quiet);
    for path in &loaded {
        debug!(path = %path.display(), "loaded environment file");
    }
    for failure in &failures {
        warn!(%failure, "could not read environment file");
    }

    match cli.command {
        Commands::Languages => {
            print_languages();
            Ok(())
        }
        Commands::Serve(listen) => omni_server::serve(ServerConfig { llm: cli.llm, listen }).await,
        Commands::Solve(args) => {
            let coder = cli.llm.build_coder().map_err(explain)?;
            debug!(provider = coder.provider().name(), "using provider");
            solve(&coder, args, cli.quiet).await
        }
        Commands::Run(args) => {
            let coder = cli.llm.build_coder().map_err(explain)?;
            debug!(provider = coder.provider().name(), "using provider");
            run_file(&coder, args, cli.quiet).await
        }
    }
}
