use std::sync::Arc;

use agency_model::{ModelMessage, ModelRequest};

use super::{conversation, expect_text, leading_messages, model_name};
use crate::model_client::ModelClient;
use crate::{FuncDef, Operation};

/// Parameters of a text completion.
#[derive(Clone, Debug, Default)]
pub struct TextToTextParams {
    /// The model name, empty for the provider default.
    pub model: String,
    /// The sampling temperature.
    pub temperature: Option<f32>,
    /// The upper bound of generated tokens.
    pub max_tokens: Option<u32>,
    /// Functions the model may call.
    pub func_defs: Vec<FuncDef>,
}

impl TextToTextParams {
    /// Creates parameters for the given model.
    #[inline]
    pub fn new(model: impl Into<String>) -> Self {
        Self {
            model: model.into(),
            ..Default::default()
        }
    }

    /// Sets the sampling temperature.
    #[inline]
    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = Some(temperature);
        self
    }

    /// Sets the upper bound of generated tokens.
    #[inline]
    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = Some(max_tokens);
        self
    }

    /// Registers a function the model may call.
    #[inline]
    pub fn with_func_def(mut self, func_def: FuncDef) -> Self {
        self.func_defs.push(func_def);
        self
    }

    pub(super) fn create_request(
        &self,
        messages: Vec<ModelMessage>,
        stream: bool,
    ) -> ModelRequest {
        ModelRequest {
            model: model_name(&self.model),
            messages,
            tools: vec![],
            temperature: self.temperature,
            max_tokens: self.max_tokens,
            stream,
        }
    }
}

pub(crate) fn text_to_text(
    client: ModelClient,
    params: TextToTextParams,
) -> Operation {
    let params = Arc::new(params);
    Operation::new(move |msg, config| {
        let client = client.clone();
        let params = Arc::clone(&params);
        async move {
            let mut messages = leading_messages(&config)?;
            messages.push(ModelMessage::User(expect_text(&msg)?));
            let req = params.create_request(messages, false);
            conversation::run(&client, req, &params.func_defs, None).await
        }
    })
    .named("text_to_text")
}
