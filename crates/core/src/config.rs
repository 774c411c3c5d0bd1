//! Per-execution configuration of operations.

use crate::Message;

/// The configuration an operation handler receives on each execution.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct OperationConfig {
    /// The prompt, sent as the system message. Empty means none.
    pub prompt: String,
    /// Prior conversation inserted between the prompt and the input.
    pub messages: Vec<Message>,
}

impl OperationConfig {
    /// Builds a configuration by applying the options in order.
    pub fn from_options<'a, I>(options: I) -> Self
    where
        I: IntoIterator<Item = &'a OperationOption>,
    {
        let mut config = Self::default();
        for option in options {
            option.apply(&mut config);
        }
        config
    }
}

/// An option that modifies the configuration of an operation.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum OperationOption {
    /// Replaces the prompt.
    Prompt(String),
    /// Appends messages to the prior conversation.
    Messages(Vec<Message>),
}

impl OperationOption {
    fn apply(&self, config: &mut OperationConfig) {
        match self {
            OperationOption::Prompt(prompt) => {
                config.prompt.clone_from(prompt);
            }
            OperationOption::Messages(messages) => {
                config.messages.extend_from_slice(messages);
            }
        }
    }
}

/// Returns an option that sets the prompt.
#[inline]
pub fn prompt(text: impl Into<String>) -> OperationOption {
    OperationOption::Prompt(text.into())
}

/// Returns an option that appends prior messages.
#[inline]
pub fn messages(messages: impl Into<Vec<Message>>) -> OperationOption {
    OperationOption::Messages(messages.into())
}
