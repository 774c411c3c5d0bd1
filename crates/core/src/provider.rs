use agency_model::{ModelProvider, SpeechProvider};

use crate::model_client::{ModelClient, SpeechClient};
use crate::ops::{self, ImageToTextParams, TextToSpeechParams, TextToStreamParams, TextToTextParams};
use crate::{BoxError, Operation};

/// A factory of operations backed by a model provider.
///
/// The provider is shared by every operation built from it, building an
/// operation doesn't send anything.
#[derive(Clone)]
pub struct Provider {
    model_client: ModelClient,
    speech_client: Option<SpeechClient>,
}

impl Provider {
    /// Creates a provider for backends that support both chat completions
    /// and speech synthesis.
    pub fn new<P>(provider: P) -> Self
    where
        P: ModelProvider + SpeechProvider + Clone + 'static,
    {
        Self::with_model_provider(provider.clone()).with_speech_provider(provider)
    }

    /// Creates a provider without speech synthesis.
    #[inline]
    pub fn with_model_provider<P: ModelProvider + 'static>(provider: P) -> Self {
        Self {
            model_client: ModelClient::new(provider),
            speech_client: None,
        }
    }

    /// Sets the backend of [`Provider::text_to_speech`].
    #[inline]
    pub fn with_speech_provider<S: SpeechProvider + 'static>(
        mut self,
        provider: S,
    ) -> Self {
        self.speech_client = Some(SpeechClient::new(provider));
        self
    }

    /// Returns an operation answering a text message, calling the given
    /// functions on the model's request.
    ///
    /// The prompt is sent as the system message, followed by the prior
    /// conversation and the input.
    pub fn text_to_text(&self, params: TextToTextParams) -> Operation {
        ops::text_to_text(self.model_client.clone(), params)
    }

    /// Like [`Provider::text_to_text`], but streams the answer.
    ///
    /// `on_delta` is called with every fragment before the next one is
    /// read, an error from it aborts the operation. The returned message
    /// still holds the full answer.
    pub fn text_to_stream<F, E>(
        &self,
        params: TextToStreamParams,
        on_delta: F,
    ) -> Operation
    where
        F: Fn(&str) -> Result<(), E> + Send + Sync + 'static,
        E: Into<BoxError> + 'static,
    {
        ops::text_to_stream(self.model_client.clone(), params, on_delta)
    }

    /// Returns an operation describing an image message.
    ///
    /// The prompt is sent along with the image.
    pub fn image_to_text(&self, params: ImageToTextParams) -> Operation {
        ops::image_to_text(self.model_client.clone(), params)
    }

    /// Returns an operation turning a text message into an audio message.
    pub fn text_to_speech(&self, params: TextToSpeechParams) -> Operation {
        ops::text_to_speech(self.speech_client.clone(), params)
    }
}

impl std::fmt::Debug for Provider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Provider")
            .field("speech", &self.speech_client.is_some())
            .finish_non_exhaustive()
    }
}
