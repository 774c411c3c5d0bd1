//! Chains operations: translate a text, then read the translation aloud.

use std::process::ExitCode;

use agency::cli::{self, CliError};
use agency::core::{TextToSpeechParams, TextToTextParams};
use agency::{Message, Operation, PromptTemplate, Provider};

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    cli::load_env();
    cli::init_tracing();
    cli::report(run().await)
}

async fn run() -> Result<(), CliError> {
    let provider = Provider::new(cli::openai_from_env()?);

    let translate = provider
        .text_to_text(TextToTextParams::new("gpt-4o-mini"))
        .with_prompt(
            PromptTemplate::new("Translate the text from {} to {}. Reply with the translation only.")
                .bind(["English", "German"]),
        );
    // Shows the intermediate result without changing it.
    let show = Operation::new(|msg: Message, _| async move {
        cli::print_answer(&msg);
        Ok(msg)
    })
    .named("show");
    let speak = provider.text_to_speech(TextToSpeechParams::default());

    let process = translate.then(show).then(speak);
    let progress_bar = cli::spinner("🔁 Translating and recording...");
    let result = process
        .execute(Message::user(cli::arg_or("The quick brown fox jumps over the lazy dog.")))
        .await;
    progress_bar.finish_and_clear();

    let audio = result?;
    tokio::fs::write("translation.mp3", audio.content()).await?;
    cli::print_step(format!("Saved {audio} to translation.mp3"));
    Ok(())
}
