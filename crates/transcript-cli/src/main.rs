//! `transcript` command line.
//!
//! Converts plain source into a REPL-style transcript by executing it
//! against a caller-supplied environment, or strips a transcript back to
//! plain source. The direction is detected from the first input line.

use std::fs::File;
use std::io::{self, BufRead, BufReader, BufWriter, Write};
use std::path::PathBuf;
use std::process;

use anyhow::Context as _;
use clap::Parser;
use tracing_subscriber::EnvFilter;

use transcript_eval::{InteractiveConsole, TracebackStyle};

mod context;

#[derive(Parser, Debug)]
#[command(name = "transcript")]
#[command(about = "Adds or removes \">>> \" prompt prefixes from input lines")]
#[command(version)]
struct Args {
    /// Script executed beforehand to populate the environment
    #[arg(value_name = "CONTEXT_FILE")]
    context_file: Option<PathBuf>,

    /// Extra bindings as a JSON object, e.g. '{"a": 1}'
    #[arg(short = 'c', long, value_name = "JSON")]
    context_json: Option<String>,

    /// Input file (defaults to stdin)
    #[arg(short, long, value_name = "FILE")]
    infile: Option<PathBuf>,

    /// Output file (defaults to stdout)
    #[arg(short, long, value_name = "FILE")]
    outfile: Option<PathBuf>,

    /// Output doctest-style tracebacks (frames elided with "...")
    #[arg(short = 'd', long)]
    doctest_tb: bool,
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(io::stderr)
        .init();

    let args = Args::parse();
    if let Err(e) = run(&args) {
        eprintln!("transcript: {:#}", e);
        process::exit(1);
    }
}

fn run(args: &Args) -> anyhow::Result<()> {
    let env = context::build_env(args.context_file.as_deref(), args.context_json.as_deref())?;
    let style = if args.doctest_tb {
        TracebackStyle::Doctest
    } else {
        TracebackStyle::Full
    };
    let mut console = InteractiveConsole::new(env, style);

    let input: Box<dyn BufRead> = match &args.infile {
        Some(path) => {
            let file = File::open(path)
                .with_context(|| format!("opening input {}", path.display()))?;
            Box::new(BufReader::new(file))
        }
        None => Box::new(BufReader::new(io::stdin())),
    };
    let mut output: Box<dyn Write> = match &args.outfile {
        Some(path) => {
            let file = File::create(path)
                .with_context(|| format!("creating output {}", path.display()))?;
            Box::new(BufWriter::new(file))
        }
        None => Box::new(io::stdout().lock()),
    };

    tracing::debug!(doctest_tb = args.doctest_tb, "starting conversion");
    transcript_core::process(input, &mut output, &mut console)?;
    output.flush()?;
    tracing::debug!("conversion finished");
    Ok(())
}
