//! Lets the model call local functions to answer a question.

use std::process::ExitCode;

use agency::cli::{self, CliError};
use agency::core::{BoxError, TextToTextParams};
use agency::{FuncDef, Message, Provider};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

#[derive(Deserialize, JsonSchema)]
struct SumInput {
    /// The numbers to add up.
    numbers: Vec<f64>,
}

#[derive(Deserialize, JsonSchema)]
struct ConvertInput {
    /// The amount of money.
    amount: f64,
    /// The ISO 4217 code of the source currency.
    from: String,
    /// The ISO 4217 code of the target currency.
    to: String,
}

#[derive(Serialize)]
struct Converted {
    amount: f64,
    currency: String,
}

fn rate_to_usd(currency: &str) -> Option<f64> {
    match currency {
        "USD" => Some(1.0),
        "EUR" => Some(1.08),
        "GBP" => Some(1.27),
        "JPY" => Some(0.0067),
        _ => None,
    }
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    cli::load_env();
    cli::init_tracing();
    cli::report(run().await)
}

async fn run() -> Result<(), CliError> {
    let sum = FuncDef::typed("sum", "Adds up numbers.", |input: SumInput| async move {
        cli::print_step(format!("sum({:?})", input.numbers));
        Ok::<_, BoxError>(input.numbers.iter().sum::<f64>())
    });
    let convert = FuncDef::typed(
        "convert_currency",
        "Converts an amount of money between currencies.",
        |input: ConvertInput| async move {
            cli::print_step(format!(
                "convert_currency({} {} -> {})",
                input.amount, input.from, input.to
            ));
            let (Some(from), Some(to)) = (rate_to_usd(&input.from), rate_to_usd(&input.to))
            else {
                return Err(BoxError::from(format!(
                    "unknown currency pair {}/{}",
                    input.from, input.to
                )));
            };
            Ok(Converted {
                amount: input.amount * from / to,
                currency: input.to,
            })
        },
    );

    let provider = Provider::new(cli::openai_from_env()?);
    let result = provider
        .text_to_text(
            TextToTextParams::new("gpt-4o-mini")
                .with_func_def(sum)
                .with_func_def(convert),
        )
        .with_prompt("Use the functions for any arithmetic or conversion.")
        .execute(Message::user(cli::arg_or(
            "I spent 12.5 EUR, 30 GBP and 1200 JPY. How much is that in USD?",
        )))
        .await?;

    cli::print_answer(result);
    Ok(())
}
