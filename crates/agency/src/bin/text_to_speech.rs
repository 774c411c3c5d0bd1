//! Reads a quote aloud and saves it as `example.mp3`.

use std::process::ExitCode;

use agency::cli::{self, CliError};
use agency::core::TextToSpeechParams;
use agency::{Message, Provider};

const QUOTE: &str = "One does not simply walk into Mordor. \
    Its black gates are guarded by more than just Orcs. \
    There is evil there that does not sleep, and the Great Eye is ever watchful.";

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    cli::load_env();
    cli::init_tracing();
    cli::report(run().await)
}

async fn run() -> Result<(), CliError> {
    let provider = Provider::new(cli::openai_from_env()?);
    let operation = provider.text_to_speech(TextToSpeechParams {
        model: "tts-1".to_owned(),
        voice: "alloy".to_owned(),
        response_format: "mp3".to_owned(),
        speed: 1.0,
    });

    let progress_bar = cli::spinner("🎙️ Recording...");
    let result = operation.execute(Message::user(QUOTE)).await;
    progress_bar.finish_and_clear();

    let output = cli::arg_or("example.mp3");
    let audio = result?;
    tokio::fs::write(&output, audio.content()).await?;
    cli::print_step(format!("Saved {} to {output}", audio));
    Ok(())
}
