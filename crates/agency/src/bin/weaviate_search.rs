//! Imports a few records into Weaviate, searches them semantically and
//! lets the model answer a question from the matches.
//!
//! Expects a Weaviate server with the `text2vec-openai` module, reachable
//! at `WEAVIATE_HOST` (default `localhost:8080`).

use std::process::ExitCode;

use agency::cli::{self, CliError};
use agency::core::TextToTextParams;
use agency::weaviate::{
    Class, ErrorKind, NearTextQuery, WeaviateClient, WeaviateConfig,
    objects_from,
};
use agency::{Message, PromptTemplate, Provider};
use serde::{Deserialize, Serialize};
use serde_json::{Map, json};

const CLASS_NAME: &str = "Records";

#[derive(Debug, Serialize, Deserialize)]
struct Record {
    content: String,
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    cli::load_env();
    cli::init_tracing();
    cli::report(run().await)
}

async fn run() -> Result<(), CliError> {
    let config = WeaviateConfig::from_env().unwrap_or_else(|| {
        let config = WeaviateConfig::with_host("localhost:8080");
        match std::env::var("OPENAI_API_KEY") {
            Ok(api_key) => config.with_header("X-OpenAI-Api-Key", api_key),
            Err(_) => config,
        }
    });
    let client = WeaviateClient::new(config);

    let mut module_config = Map::new();
    module_config.insert("text2vec-openai".to_owned(), json!({}));
    module_config.insert("generative-openai".to_owned(), json!({}));
    let class = Class {
        class: CLASS_NAME.to_owned(),
        vectorizer: Some("text2vec-openai".to_owned()),
        module_config,
        properties: vec![],
    };
    match client.create_class(&class).await {
        Ok(_) => cli::print_step(format!("Created class {CLASS_NAME}")),
        Err(err) if err.kind() == ErrorKind::Status(422) => {
            cli::print_step(format!("Class {CLASS_NAME} exists, reusing it"));
        }
        Err(err) => return Err(err.into()),
    }

    let records: Vec<Record> =
        serde_json::from_str(include_str!("../../data/records.json"))?;
    let objects = objects_from(CLASS_NAME, &records)?;
    let results = client.batch_objects(&objects).await?;
    cli::print_step(format!("Imported {} records", results.len()));

    let question = cli::arg_or("What do you know about programming?");
    let query = NearTextQuery::new(CLASS_NAME, ["content"])
        .with_concept(question.as_str())
        .with_limit(3);
    let matches: Vec<Record> = client.near_text_as(&query).await?;
    for record in &matches {
        cli::print_step(format!("match: {}", record.content));
    }

    // The matches become the prior conversation of the answering step.
    let context: Vec<_> = matches
        .into_iter()
        .map(|record| Message::user(record.content))
        .collect();
    let provider = Provider::new(cli::openai_from_env()?);
    let answer = provider
        .text_to_text(TextToTextParams::new("gpt-4o-mini"))
        .with_prompt(
            PromptTemplate::new("Answer using only the {} notes the user shared.")
                .bind([context.len()]),
        )
        .with_messages(context)
        .execute(Message::user(question))
        .await?;

    cli::print_answer(answer);
    Ok(())
}
