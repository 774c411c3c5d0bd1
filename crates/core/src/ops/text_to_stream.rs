use std::sync::Arc;

use agency_model::ModelMessage;

use super::{TextToTextParams, conversation, expect_text, leading_messages};
use crate::model_client::{DeltaCallback, ModelClient};
use crate::{BoxError, Operation};

/// Parameters of a streamed text completion.
pub type TextToStreamParams = TextToTextParams;

pub(crate) fn text_to_stream<F, E>(
    client: ModelClient,
    params: TextToStreamParams,
    on_delta: F,
) -> Operation
where
    F: Fn(&str) -> Result<(), E> + Send + Sync + 'static,
    E: Into<BoxError> + 'static,
{
    let params = Arc::new(params);
    let on_delta: DeltaCallback =
        Arc::new(move |delta: &str| on_delta(delta).map_err(Into::<BoxError>::into));
    Operation::new(move |msg, config| {
        let client = client.clone();
        let params = Arc::clone(&params);
        let on_delta = Arc::clone(&on_delta);
        async move {
            let mut messages = leading_messages(&config)?;
            messages.push(ModelMessage::User(expect_text(&msg)?));
            let req = params.create_request(messages, true);
            conversation::run(&client, req, &params.func_defs, Some(&on_delta))
                .await
        }
    })
    .named("text_to_stream")
}
