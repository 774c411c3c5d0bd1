use agency_model::{ErrorKind, ToolCallRequest};
use serde::{Deserialize, Serialize};

/// The events in a preset response.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "type", content = "data")]
pub enum PresetEvent {
    #[serde(rename = "message_delta")]
    MessageDelta(String),
    #[serde(rename = "tool_call")]
    ToolCall(ToolCallRequest),
}

/// The preset response for one request.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PresetResponse {
    /// Events in this response.
    pub events: Vec<PresetEvent>,
    /// If set, the response ends without a completion event, as if the
    /// provider returned no choice.
    #[serde(default)]
    pub no_choice: bool,
    /// If set, the request fails with an error of this kind.
    #[serde(skip)]
    pub failure: Option<ErrorKind>,
}

impl PresetResponse {
    /// Creates a `PresetResponse` with the specified events.
    #[inline]
    pub fn with_events(events: impl Into<Vec<PresetEvent>>) -> Self {
        Self {
            events: events.into(),
            ..Default::default()
        }
    }

    /// Creates a response with a single text message.
    #[inline]
    pub fn text<S: Into<String>>(text: S) -> Self {
        Self::with_events([PresetEvent::MessageDelta(text.into())])
    }

    /// Creates a response that carries no choice.
    #[inline]
    pub fn no_choice() -> Self {
        Self {
            no_choice: true,
            ..Default::default()
        }
    }

    /// Creates a response that fails the request with the given kind.
    #[inline]
    pub fn failure(kind: ErrorKind) -> Self {
        Self {
            failure: Some(kind),
            ..Default::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn test_serialize_deserialize() {
        let response = PresetResponse::with_events([
            PresetEvent::MessageDelta(
                "I have left a message for you.".to_string(),
            ),
            PresetEvent::ToolCall(ToolCallRequest {
                id: "1".to_string(),
                name: "write_file".to_string(),
                arguments: json!({
                    "filename": "message.txt",
                    "content": "Hello, world!"
                })
                .to_string(),
            }),
        ]);

        let serialized = serde_json::to_string(&response).unwrap();
        let deserialized: PresetResponse =
            serde_json::from_str(&serialized).unwrap();

        assert_eq!(response, deserialized);
    }

    #[test]
    fn test_deserialize_script_entry() {
        let response: PresetResponse = serde_json::from_value(json!({
            "events": [{ "type": "message_delta", "data": "Hi" }]
        }))
        .unwrap();
        assert_eq!(response, PresetResponse::text("Hi"));
    }
}
