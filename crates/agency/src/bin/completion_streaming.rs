//! Streams a short text about a topic as it is generated.

use std::io::{self, Write as _};
use std::process::ExitCode;

use agency::cli::{self, CliError};
use agency::core::TextToStreamParams;
use agency::{Message, Provider};
use owo_colors::OwoColorize;

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    cli::load_env();
    cli::init_tracing();
    cli::report(run().await)
}

async fn run() -> Result<(), CliError> {
    let provider = Provider::new(cli::openai_from_env()?);

    let result = provider
        .text_to_stream(TextToStreamParams::new("gpt-3.5-turbo"), |delta: &str| {
            let mut stdout = io::stdout().lock();
            write!(stdout, "{}", delta.bright_white())?;
            stdout.flush()
        })
        .with_prompt("Write a few sentences about the topic.")
        .execute(Message::user(cli::arg_or("I love programming.")))
        .await?;

    println!();
    cli::print_step(format!("Final result: {} chars", result.content().len()));
    Ok(())
}
