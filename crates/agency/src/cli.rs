//! Helpers shared by the demo programs.

use std::error::Error as StdError;
use std::fmt::Display;
use std::process::ExitCode;
use std::time::Duration;

use agency_openai::{OpenAIConfigBuilder, OpenAIProvider};
use indicatif::{ProgressBar, ProgressStyle};
use owo_colors::OwoColorize;
use tracing_subscriber::EnvFilter;

/// The error type of the demo programs.
pub type CliError = Box<dyn StdError + Send + Sync + 'static>;

const BAR_CHAR: &str = "▎";

/// Installs a `tracing` subscriber configured by `RUST_LOG`.
///
/// Logs go to stderr so they never mix with the program output.
pub fn init_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();
}

/// Loads variables from a `.env` file in the current directory or its
/// parents, if there is one.
pub fn load_env() {
    match dotenvy::dotenv() {
        Ok(path) => debug!("loaded environment from {}", path.display()),
        Err(err) if err.not_found() => {}
        Err(err) => warn!("failed to load .env: {err}"),
    }
}

/// Creates an OpenAI provider from the `OPENAI_*` environment variables.
pub fn openai_from_env() -> Result<OpenAIProvider, CliError> {
    let Some(builder) = OpenAIConfigBuilder::from_env() else {
        return Err("OPENAI_API_KEY environment variable is not set".into());
    };
    let config = builder.build();
    debug!("using {config:?}");
    Ok(OpenAIProvider::new(config))
}

/// Returns the first command line argument, or `default` if there is none.
pub fn arg_or(default: &str) -> String {
    std::env::args().nth(1).unwrap_or_else(|| default.to_owned())
}

/// Shows a spinner until the returned bar is finished.
pub fn spinner(message: impl Into<String>) -> ProgressBar {
    let style = ProgressStyle::with_template("{spinner} {wide_msg}")
        .unwrap_or_else(|_| ProgressStyle::default_spinner())
        .tick_chars("⠋⠙⠹⠸⠼⠴⠦⠧⠇⠏");
    let progress_bar = ProgressBar::new_spinner();
    progress_bar.set_style(style);
    progress_bar.set_message(message.into());
    progress_bar.enable_steady_tick(Duration::from_millis(100));
    progress_bar
}

/// Prints an answer of the model.
pub fn print_answer(answer: impl Display) {
    println!("{}🤖 {}", BAR_CHAR.bright_cyan(), answer.bright_white());
}

/// Prints a step of a demo.
pub fn print_step(step: impl Display) {
    println!("{}{}", BAR_CHAR.bright_yellow(), step.bold());
}

/// Reports the outcome of a demo and turns it into the exit code.
pub fn report(result: Result<(), CliError>) -> ExitCode {
    let Err(err) = result else {
        return ExitCode::SUCCESS;
    };
    eprintln!("{} {err}", "error:".bright_red().bold());
    let mut source = err.source();
    while let Some(err) = source {
        eprintln!("  {} {err}", "caused by:".red());
        source = err.source();
    }
    ExitCode::FAILURE
}
