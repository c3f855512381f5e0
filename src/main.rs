use clap::{Parser as ClapParser, Subcommand};
use sage_lang::Engine;
use sage_lang::cli::{self, CheckOptions, CheckResult, CliError};
use std::io::{self, Read};
use tracing_subscriber::EnvFilter;

#[derive(ClapParser)]
#[command(name = "sage")]
#[command(about = "Sage - An expression language for filters, conditionals and derived fields over JSON")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Evaluate an expression (against `null` when no input is given)
    Eval {
        /// The expression to evaluate
        expression: String,

        /// JSON context (reads from stdin if piped)
        #[arg(short, long)]
        input: Option<String>,

        /// Pretty-print the output
        #[arg(short, long)]
        pretty: bool,
    },

    /// Validate an expression and run it against JSON input
    Check {
        /// The expression to check
        expression: String,

        /// JSON context (reads from stdin if not provided)
        #[arg(short, long)]
        input: Option<String>,

        /// Pretty-print the output
        #[arg(short, long)]
        pretty: bool,

        /// Only validate syntax, don't evaluate
        #[arg(long)]
        syntax_only: bool,
    },

    /// List the operators of the default grammar
    Operators,
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_env("SAGE_LOG").unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(io::stderr)
        .init();

    let cli = Cli::parse();
    let engine = Engine::new();

    let result = match cli.command {
        Commands::Eval {
            expression,
            input,
            pretty,
        } => read_input(input).and_then(|input| {
            let options = CheckOptions {
                expression,
                input: Some(input.unwrap_or_else(|| "null".to_string())),
                syntax_only: false,
            };
            run_check(&engine, &options, pretty)
        }),
        Commands::Check {
            expression,
            input,
            pretty,
            syntax_only,
        } => read_input(input).and_then(|input| {
            let options = CheckOptions {
                expression,
                input,
                syntax_only,
            };
            run_check(&engine, &options, pretty)
        }),
        Commands::Operators => {
            print!("{}", cli::describe_grammar(&engine.grammar()));
            Ok(())
        }
    };

    if let Err(e) = result {
        eprintln!("{}", e);
        std::process::exit(1);
    }
}

/// The `--input` argument, or stdin when it is piped.
fn read_input(input: Option<String>) -> Result<Option<String>, CliError> {
    match input {
        Some(s) => Ok(Some(s)),
        None if !atty::is(atty::Stream::Stdin) => {
            let mut buffer = String::new();
            io::stdin().read_to_string(&mut buffer)?;
            Ok(Some(buffer))
        }
        None => Ok(None),
    }
}

fn run_check(engine: &Engine, options: &CheckOptions, pretty: bool) -> Result<(), CliError> {
    match cli::execute_check(engine, options)? {
        CheckResult::SyntaxValid => println!("Syntax is valid"),
        CheckResult::Success(output) => {
            let json = if pretty {
                serde_json::to_string_pretty(&output)
            } else {
                serde_json::to_string(&output)
            }?;
            println!("{}", json);
        }
    }
    Ok(())
}
