use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::ToolCallRequest;

/// A request to be sent to the model provider.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ModelRequest {
    /// The model to use. Providers fall back to their configured default
    /// model when this is `None`.
    pub model: Option<String>,
    /// The input messages.
    pub messages: Vec<ModelMessage>,
    /// Tools that are available to the model.
    pub tools: Vec<ModelTool>,
    /// Sampling temperature.
    pub temperature: Option<f32>,
    /// Upper bound of generated tokens.
    pub max_tokens: Option<u32>,
    /// Whether the response should be streamed incrementally.
    ///
    /// Providers may ignore this flag, the events they produce must be
    /// the same either way. Only the granularity of message deltas
    /// differs.
    pub stream: bool,
}

/// A complete message.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum ModelMessage {
    /// The system instructions.
    System(String),
    /// A user input text.
    User(String),
    /// A user input that carries an image, with optional accompanying
    /// text.
    UserImage {
        /// Text sent alongside the image.
        text: Option<String>,
        /// The image itself.
        image: ImageInput,
    },
    /// An assistant message, possibly requesting tool calls.
    Assistant {
        /// The text content.
        content: String,
        /// Tool calls requested by this message.
        tool_calls: Vec<ToolCallRequest>,
    },
    /// A tool call result.
    Tool(ToolCallResult),
}

/// Raw image data attached to a user message.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct ImageInput {
    /// The encoded image bytes.
    pub data: Vec<u8>,
    /// The MIME type of `data`, such as `image/png`.
    pub mime_type: String,
}

/// The result of calling a tool.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct ToolCallResult {
    /// The unique identifier for the tool call request.
    pub id: String,
    /// Name of the tool that produced the result.
    pub name: String,
    /// The serialized result of the tool call.
    pub content: String,
}

/// Describes a tool that can be used by the model.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ModelTool {
    /// Name of the tool.
    pub name: String,
    /// Description of the tool.
    pub description: String,
    /// Parameters definition of the tool.
    ///
    /// For most model providers, the parameters should typically be
    /// defined by a [JSON schema](https://json-schema.org/).
    pub parameters: Value,
}
