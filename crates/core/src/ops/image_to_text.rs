use agency_model::{ModelMessage, ModelRequest};

use super::{image_input, leading_messages, model_name};
use crate::model_client::ModelClient;
use crate::{Error, Message, Operation, OperationConfig};

/// Parameters of an image description.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ImageToTextParams {
    /// The model name, empty for the provider default.
    pub model: String,
    /// The upper bound of generated tokens.
    pub max_tokens: Option<u32>,
    /// The sampling temperature.
    pub temperature: Option<f32>,
}

pub(crate) fn image_to_text(
    client: ModelClient,
    params: ImageToTextParams,
) -> Operation {
    Operation::new(move |msg: Message, mut config: OperationConfig| {
        let client = client.clone();
        let params = params.clone();
        async move {
            if msg.content().is_empty() {
                return Err(Error::invalid_input("the image is empty"));
            }
            // The prompt goes along with the image instead of being a
            // system message.
            let prompt = std::mem::take(&mut config.prompt);
            let mut messages = leading_messages(&config)?;
            messages.push(ModelMessage::UserImage {
                text: (!prompt.is_empty()).then_some(prompt),
                image: image_input(msg.into_content()),
            });
            let req = ModelRequest {
                model: model_name(&params.model),
                messages,
                tools: vec![],
                temperature: params.temperature,
                max_tokens: params.max_tokens,
                stream: false,
            };
            let resp = client.send_request(req, None).await?;
            if resp.is_empty() {
                return Err(Error::no_choice());
            }
            Ok(Message::assistant(resp.content))
        }
    })
    .named("image_to_text")
}
