use clap::{Parser, Subcommand};
use fieldchain::codegen::generate_values;
use fieldchain::config::load_config;
use fieldchain::date_format::translate;
use fieldchain::error::LoadError;
use fieldchain::from_json::elements_from_json;
use fieldchain::json::{diagnostics_to_json, resolution_to_json, JsonStyle};
use fieldchain::{resolve, ResolveError, ResolveOptions};
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::io::{self, Read};
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "fieldchain", version, about = "Resolve compound element ids into form fields")]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// Increase log verbosity (-v debug, -vv trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Config file (defaults to ./fieldchain.yaml when present)
    #[arg(long, global = true)]
    config: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Command {
    /// Resolve a JSON element list into field definitions
    Resolve {
        /// Element list file; reads stdin when omitted
        #[arg(short, long)]
        input: Option<PathBuf>,

        /// Fail on any diagnostic, warnings included
        #[arg(long)]
        strict: bool,

        /// Indent the JSON output
        #[arg(long)]
        pretty: bool,

        /// Seed for generated codes
        #[arg(long)]
        seed: Option<u64>,
    },
    /// Decode a date format and render a canonical value through it
    Date {
        /// Format as written after `date_`, e.g. MMMM_D,_YYYY
        #[arg(short, long)]
        format: String,

        /// Canonical value, e.g. 2025-01-10
        #[arg(long)]
        value: String,
    },
}

fn init_logging(verbose: u8) {
    let default_level = match verbose {
        0 => "warn",
        1 => "debug",
        _ => "trace",
    };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();
}

fn read_input(path: Option<&Path>) -> Result<String, LoadError> {
    match path {
        Some(path) => std::fs::read_to_string(path).map_err(|source| LoadError::Io {
            path: path.to_path_buf(),
            source,
        }),
        None => {
            let mut input = String::new();
            io::stdin()
                .read_to_string(&mut input)
                .map_err(LoadError::Stdin)?;
            Ok(input)
        }
    }
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    init_logging(cli.verbose);
    let config = load_config(cli.config.as_deref())?;

    match cli.command {
        Command::Resolve {
            input,
            strict,
            pretty,
            seed,
        } => {
            // CLI > config > default
            let options = ResolveOptions {
                strict: strict || config.strict.unwrap_or(false),
            };
            let style = if pretty || config.pretty.unwrap_or(false) {
                JsonStyle::Pretty
            } else {
                JsonStyle::Compact
            };
            let seed = seed.or(config.seed);

            let elements = elements_from_json(&read_input(input.as_deref())?)?;
            let resolution = match resolve(&elements, &options) {
                Ok(resolution) => resolution,
                Err(ResolveError::Strict { diagnostics }) => {
                    // The diagnostics array replaces the resolution on stdout.
                    println!("{}", diagnostics_to_json(&diagnostics)?);
                    for diag in &diagnostics {
                        eprintln!("{}", diag);
                    }
                    eprintln!("strict resolution failed with {} diagnostic(s)", diagnostics.len());
                    std::process::exit(1);
                }
            };

            let generated =
                seed.map(|seed| generate_values(&resolution.fields, &mut StdRng::seed_from_u64(seed)));
            println!(
                "{}",
                resolution_to_json(&resolution, generated.as_ref(), style)?
            );

            for diag in &resolution.diagnostics {
                eprintln!("{}", diag);
            }
            if resolution.has_errors() {
                std::process::exit(1);
            }
        }
        Command::Date { format, value } => {
            let format = translate(&format)?;
            println!("{}", format.template);
            println!("{}", format.render(&value)?);
        }
    }

    Ok(())
}
