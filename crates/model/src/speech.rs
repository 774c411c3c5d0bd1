use serde::{Deserialize, Serialize};

use crate::ModelProviderError;

/// A text-to-speech request.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SpeechRequest {
    /// The speech model to use.
    pub model: String,
    /// The text to synthesize.
    pub input: String,
    /// The voice preset.
    pub voice: String,
    /// The audio container, such as `mp3` or `wav`.
    pub response_format: String,
    /// Playback speed, `1.0` is the normal speed.
    pub speed: f32,
}

/// A type that can turn text into audio.
pub trait SpeechProvider: Send + Sync {
    /// The error type that may be returned by the provider.
    type Error: ModelProviderError;

    /// Synthesizes the input of `req` and returns the encoded audio.
    fn synthesize(
        &self,
        req: &SpeechRequest,
    ) -> impl Future<Output = Result<Vec<u8>, Self::Error>> + Send + 'static;
}
