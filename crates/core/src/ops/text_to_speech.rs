use agency_model::SpeechRequest;

use super::expect_text;
use crate::model_client::SpeechClient;
use crate::{Error, Message, Operation};

/// Parameters of a speech synthesis.
#[derive(Clone, Debug, PartialEq)]
pub struct TextToSpeechParams {
    /// The speech model.
    pub model: String,
    /// The voice to use.
    pub voice: String,
    /// The audio container, for example `mp3` or `wav`.
    pub response_format: String,
    /// The playback speed, `1.0` is normal.
    pub speed: f32,
}

impl Default for TextToSpeechParams {
    fn default() -> Self {
        Self {
            model: "tts-1".to_owned(),
            voice: "alloy".to_owned(),
            response_format: "mp3".to_owned(),
            speed: 1.0,
        }
    }
}

pub(crate) fn text_to_speech(
    client: Option<SpeechClient>,
    params: TextToSpeechParams,
) -> Operation {
    Operation::new(move |msg: Message, _| {
        let client = client.clone();
        let params = params.clone();
        async move {
            let Some(client) = client else {
                return Err(Error::invalid_input(
                    "the provider doesn't support speech synthesis",
                ));
            };
            let input = expect_text(&msg)?;
            if input.is_empty() {
                return Err(Error::invalid_input("nothing to synthesize"));
            }
            let req = SpeechRequest {
                model: params.model,
                input,
                voice: params.voice,
                response_format: params.response_format,
                speed: params.speed,
            };
            let audio = client.synthesize(req).await?;
            debug!("synthesized {} bytes of audio", audio.len());
            Ok(Message::audio(audio))
        }
    })
    .named("text_to_speech")
}
