//! Translates a sentence with a templated prompt.

use std::process::ExitCode;

use agency::cli::{self, CliError};
use agency::core::TextToTextParams;
use agency::{Message, PromptTemplate, Provider};

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    cli::load_env();
    cli::init_tracing();
    cli::report(run().await)
}

async fn run() -> Result<(), CliError> {
    let provider = Provider::new(cli::openai_from_env()?);

    let prompt = PromptTemplate::new(
        "You are a helpful assistant that translates {} to {}.",
    )
    .bind(["English", "French"]);
    let input = PromptTemplate::new("{}").bind([cli::arg_or("I love programming.")]);

    let result = provider
        .text_to_text(TextToTextParams::new("gpt-3.5-turbo"))
        .with_prompt(prompt)
        .execute(Message::user(input))
        .await?;

    cli::print_answer(result);
    Ok(())
}
