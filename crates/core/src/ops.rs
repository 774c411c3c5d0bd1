//! Builders turning a provider into ready-to-use operations.

mod conversation;
mod image_to_text;
mod text_to_speech;
mod text_to_stream;
mod text_to_text;

#[cfg(test)]
mod tests;

use agency_model::{ImageInput, ModelMessage};

use crate::{Error, Kind, Message, OperationConfig, Role};

pub use image_to_text::ImageToTextParams;
pub(crate) use image_to_text::image_to_text;
pub use text_to_speech::TextToSpeechParams;
pub(crate) use text_to_speech::text_to_speech;
pub use text_to_stream::TextToStreamParams;
pub(crate) use text_to_stream::text_to_stream;
pub use text_to_text::TextToTextParams;
pub(crate) use text_to_text::text_to_text;

/// Builds the leading messages of a request: the prompt as a system
/// message, omitted when empty, followed by the prior conversation.
fn leading_messages(config: &OperationConfig) -> Result<Vec<ModelMessage>, Error> {
    let mut messages = Vec::with_capacity(config.messages.len() + 2);
    if !config.prompt.is_empty() {
        messages.push(ModelMessage::System(config.prompt.clone()));
    }
    for msg in &config.messages {
        messages.push(to_model_message(msg)?);
    }
    Ok(messages)
}

fn to_model_message(msg: &Message) -> Result<ModelMessage, Error> {
    let text = || msg.text().into_owned();
    match (msg.role(), msg.kind()) {
        (Role::System, Kind::Text) => Ok(ModelMessage::System(text())),
        (Role::User, Kind::Text) => Ok(ModelMessage::User(text())),
        (Role::Assistant, Kind::Text) => Ok(ModelMessage::Assistant {
            content: text(),
            tool_calls: vec![],
        }),
        (Role::User, Kind::Image) => Ok(ModelMessage::UserImage {
            text: None,
            image: image_input(msg.content().to_vec()),
        }),
        // Tool results can't be replayed without the id of their call.
        (Role::Tool, _) => Err(Error::invalid_input(
            "tool messages can't be used as prior conversation",
        )),
        (role, kind) => Err(Error::invalid_input(format!(
            "{kind:?} messages from {role} are not supported by chat models"
        ))),
    }
}

fn expect_text(msg: &Message) -> Result<String, Error> {
    if msg.kind() != Kind::Text {
        return Err(Error::invalid_input(format!(
            "expected a text message, got {:?}",
            msg.kind()
        )));
    }
    Ok(msg.text().into_owned())
}

fn image_input(data: Vec<u8>) -> ImageInput {
    ImageInput {
        mime_type: sniff_image_mime(&data).to_owned(),
        data,
    }
}

/// Guesses the MIME type of an encoded image from its magic bytes.
///
/// Unknown formats are reported as PNG.
pub fn sniff_image_mime(data: &[u8]) -> &'static str {
    if data.starts_with(b"\x89PNG\r\n\x1a\n") {
        "image/png"
    } else if data.starts_with(&[0xff, 0xd8, 0xff]) {
        "image/jpeg"
    } else if data.starts_with(b"GIF87a") || data.starts_with(b"GIF89a") {
        "image/gif"
    } else if data.len() >= 12 && &data[..4] == b"RIFF" && &data[8..12] == b"WEBP" {
        "image/webp"
    } else {
        "image/png"
    }
}

#[inline]
fn model_name(model: &str) -> Option<String> {
    (!model.is_empty()).then(|| model.to_owned())
}
