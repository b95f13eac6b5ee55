mod cli_args;
mod evaluator;
mod expression_wrapper;
mod pipeline;
mod stdio_printer;
mod usage;

use std::io::Write;

use cli_args::ProgramOptions;
use colored::Colorize;
use pipeline::Pipeline;
use rq_lang::Interpreter;
use stdio_printer::StdioPrinter;
use usage::{print_usage, print_version};

/// Environment variable holding the log filter, e.g. `RQ_LOG=debug`.
const LOG_ENV_VAR: &str = "RQ_LOG";

/// Sends logs to stderr, but only if `RQ_LOG` is set, since stdout is
/// reserved for the document.
fn init_tracing() {
    use tracing_subscriber::{fmt, prelude::*, EnvFilter};

    if std::env::var_os(LOG_ENV_VAR).is_some() {
        tracing_subscriber::registry()
            .with(fmt::layer().with_writer(std::io::stderr))
            .with(EnvFilter::from_env(LOG_ENV_VAR))
            .init();
    }
}

fn run() -> i32 {
    let options = match ProgramOptions::from_env() {
        Ok(options) => options,
        Err(err) => {
            tracing::debug!(token = %err.token, "invalid argument");
            let mut stderr = std::io::stderr();
            let _ = writeln!(stderr, "{}\n", format!("rq: {err}").red());
            let _ = print_usage(&mut stderr);
            return 1;
        }
    };
    tracing::debug!(?options, "parsed arguments");

    let mut stdout = std::io::stdout();
    if options.help {
        return match print_usage(&mut stdout) {
            Ok(()) => 0,
            Err(_) => 1,
        };
    }
    if options.version {
        return match print_version::<Interpreter>(&mut stdout) {
            Ok(()) => 0,
            Err(_) => 1,
        };
    }

    let mut pipeline = Pipeline::new(Interpreter::default(), StdioPrinter::new());
    match pipeline.run(&options.expressions) {
        Ok(()) => 0,
        Err(pipeline::PipelineError::Io(err)) => {
            eprintln!("{}", format!("rq: {err}").red());
            1
        }
        // Everything else has already been reported.
        Err(_) => 1,
    }
}

fn main() {
    init_tracing();
    let exit_code = run();
    std::process::exit(exit_code);
}
