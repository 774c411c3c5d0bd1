//! Messages flowing through operations.

use std::borrow::Cow;
use std::fmt::{self, Display};

use serde::{Deserialize, Serialize};

/// The author of a message.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// Instructions that steer the model.
    System,
    /// The end user.
    User,
    /// The model.
    Assistant,
    /// The result of a function call.
    Tool,
}

impl Role {
    /// Returns the wire name of the role.
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::System => "system",
            Role::User => "user",
            Role::Assistant => "assistant",
            Role::Tool => "tool",
        }
    }
}

impl Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The kind of payload a message carries.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Kind {
    /// UTF-8 text.
    Text,
    /// Encoded image bytes (PNG, JPEG, ...).
    Image,
    /// Encoded audio bytes.
    Audio,
}

/// A message with a role, a payload kind and raw content bytes.
///
/// Text messages keep their content as UTF-8 bytes, so every kind of
/// message can be passed between operations uniformly.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct Message {
    role: Role,
    kind: Kind,
    content: Vec<u8>,
}

impl Message {
    /// Creates a message from its parts.
    #[inline]
    pub fn new(role: Role, kind: Kind, content: impl Into<Vec<u8>>) -> Self {
        Self {
            role,
            kind,
            content: content.into(),
        }
    }

    /// Creates a system text message.
    #[inline]
    pub fn system(text: impl Into<String>) -> Self {
        Self::new(Role::System, Kind::Text, text.into())
    }

    /// Creates a user text message.
    #[inline]
    pub fn user(text: impl Into<String>) -> Self {
        Self::new(Role::User, Kind::Text, text.into())
    }

    /// Creates an assistant text message.
    #[inline]
    pub fn assistant(text: impl Into<String>) -> Self {
        Self::new(Role::Assistant, Kind::Text, text.into())
    }

    /// Creates a user message carrying an encoded image.
    #[inline]
    pub fn image(data: impl Into<Vec<u8>>) -> Self {
        Self::new(Role::User, Kind::Image, data)
    }

    /// Creates an assistant message carrying encoded audio.
    #[inline]
    pub fn audio(data: impl Into<Vec<u8>>) -> Self {
        Self::new(Role::Assistant, Kind::Audio, data)
    }

    /// Returns the role of the message.
    #[inline]
    pub fn role(&self) -> Role {
        self.role
    }

    /// Returns the payload kind of the message.
    #[inline]
    pub fn kind(&self) -> Kind {
        self.kind
    }

    /// Returns the raw content bytes.
    #[inline]
    pub fn content(&self) -> &[u8] {
        &self.content
    }

    /// Consumes the message and returns its content bytes.
    #[inline]
    pub fn into_content(self) -> Vec<u8> {
        self.content
    }

    /// Returns the content as text.
    ///
    /// Invalid UTF-8 sequences are replaced, which only happens for
    /// binary payloads.
    #[inline]
    pub fn text(&self) -> Cow<'_, str> {
        String::from_utf8_lossy(&self.content)
    }
}

impl Display for Message {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.kind {
            Kind::Text => f.write_str(&self.text()),
            Kind::Image => write!(f, "<image: {} bytes>", self.content.len()),
            Kind::Audio => write!(f, "<audio: {} bytes>", self.content.len()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_constructors() {
        let msg = Message::user("Hi");
        assert_eq!(msg.role(), Role::User);
        assert_eq!(msg.kind(), Kind::Text);
        assert_eq!(msg.content(), b"Hi");
        assert_eq!(format!("{msg}"), "Hi");

        let msg = Message::audio(vec![0u8; 16]);
        assert_eq!(msg.role(), Role::Assistant);
        assert_eq!(format!("{msg}"), "<audio: 16 bytes>");
        assert_eq!(Role::Tool.to_string(), "tool");
    }
}
