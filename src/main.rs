//! Command-line front end: converts one or more `.trl` files to PGN,
//! reporting per-file success or failure and exiting non-zero if any
//! conversion failed.

use std::fs;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::Context;
use clap::Parser;
use log::{error, info};
use trl2pgn::Converter;

#[derive(Parser)]
#[command(name = "trl2pgn")]
#[command(about = "Convert Ludii chess trials (.trl) to PGN")]
#[command(version)]
struct Args {
    /// Input trial files.
    #[arg(value_name = "TRIAL", required = true)]
    inputs: Vec<PathBuf>,

    /// Output PGN file. Only valid with a single input; by default each
    /// output path is the input path with a .pgn extension.
    #[arg(short, long, value_name = "FILE")]
    output: Option<PathBuf>,

    /// Value of the Event tag. Defaults to the input file stem.
    #[arg(long)]
    event: Option<String>,

    /// Value of the Date tag, in YYYY.MM.DD form.
    #[arg(long, default_value = "????.??.??")]
    date: String,

    /// Name of the player of the white pieces.
    #[arg(long, default_value = "Player 1")]
    white: String,

    /// Name of the player of the black pieces.
    #[arg(long, default_value = "Player 2")]
    black: String,

    /// Write a parallel *.debug.txt trace next to each output.
    #[arg(long)]
    debug: bool,

    /// Swap the player names between successive inputs, for matches where
    /// the players alternate colors every round.
    #[arg(long)]
    swap_rounds: bool,

    /// Verbose logging.
    #[arg(short, long)]
    verbose: bool,
}

fn main() -> ExitCode {
    let args = Args::parse();

    if let Err(e) = init_logging(args.verbose) {
        eprintln!("cannot initialize logging: {e}");
        return ExitCode::FAILURE;
    }

    if args.output.is_some() && args.inputs.len() > 1 {
        error!("--output is only valid with a single input file");
        return ExitCode::FAILURE;
    }

    let mut failed = false;
    for (round, input) in args.inputs.iter().enumerate() {
        match convert_file(&args, round, input) {
            Ok(output) => info!("{} -> {}", input.display(), output.display()),
            Err(e) => {
                error!("{}: {e:#}", input.display());
                failed = true;
            },
        }
    }
    if failed {
        ExitCode::FAILURE
    } else {
        ExitCode::SUCCESS
    }
}

fn init_logging(verbose: bool) -> Result<(), log::SetLoggerError> {
    let level = if verbose {
        log::LevelFilter::Debug
    } else {
        log::LevelFilter::Info
    };
    fern::Dispatch::new()
        .format(|out, message, record| out.finish(format_args!("[{}] {message}", record.level())))
        .level(level)
        .chain(std::io::stdout())
        .apply()
}

fn convert_file(args: &Args, round: usize, input: &Path) -> anyhow::Result<PathBuf> {
    let content = fs::read_to_string(input)
        .with_context(|| format!("cannot read {}", input.display()))?;

    let event = match &args.event {
        Some(event) => event.clone(),
        None => input
            .file_stem()
            .map_or_else(|| "?".to_owned(), |stem| stem.to_string_lossy().into_owned()),
    };
    let (white, black) = if args.swap_rounds && round % 2 == 1 {
        (args.black.clone(), args.white.clone())
    } else {
        (args.white.clone(), args.black.clone())
    };

    let conversion = Converter::new()
        .with_event(event)
        .with_date(args.date.clone())
        .with_players(white, black)
        .with_debug(args.debug)
        .convert(&content)?;

    let output = match &args.output {
        Some(path) => path.clone(),
        None => input.with_extension("pgn"),
    };
    fs::write(&output, format!("{}\n", conversion.pgn))
        .with_context(|| format!("cannot write {}", output.display()))?;

    if let Some(debug) = conversion.debug {
        let trace_path = output.with_extension("debug.txt");
        fs::write(&trace_path, format!("{debug}\n"))
            .with_context(|| format!("cannot write {}", trace_path.display()))?;
    }

    Ok(output)
}
