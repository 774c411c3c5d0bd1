//! Describes an image file, `example.png` by default.

use std::process::ExitCode;

use agency::cli::{self, CliError};
use agency::core::ImageToTextParams;
use agency::{Message, Provider};

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    cli::load_env();
    cli::init_tracing();
    cli::report(run().await)
}

async fn run() -> Result<(), CliError> {
    let path = cli::arg_or("example.png");
    let image = tokio::fs::read(&path)
        .await
        .map_err(|err| format!("failed to read {path}: {err}"))?;

    let provider = Provider::new(cli::openai_from_env()?);
    let operation = provider
        .image_to_text(ImageToTextParams {
            model: "gpt-4o".to_owned(),
            max_tokens: Some(300),
            ..Default::default()
        })
        .with_prompt("Describe what you see.");

    let progress_bar = cli::spinner("👀 Looking...");
    let result = operation.execute(Message::image(image)).await;
    progress_bar.finish_and_clear();

    cli::print_answer(result?);
    Ok(())
}
